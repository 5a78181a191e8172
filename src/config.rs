use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub resend: ResendConfig,
    #[serde(default)]
    pub raffle: RaffleSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    /// bcrypt hash of the admin password
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendConfig {
    pub api_key: String,
    /// Sender mailbox; the display name comes from the page configuration
    pub from_address: String,
    #[serde(default = "default_resend_base_url")]
    pub base_url: String,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ResendConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            from_address: "noreply@example.com".to_string(),
            base_url: default_resend_base_url(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaffleSettings {
    /// Interval of the background page-config flush (milliseconds)
    #[serde(default = "default_config_flush_interval_ms")]
    pub config_flush_interval_ms: u64,
    /// Buffered events per realtime feed subscriber
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,
}

impl Default for RaffleSettings {
    fn default() -> Self {
        Self {
            config_flush_interval_ms: default_config_flush_interval_ms(),
            feed_capacity: default_feed_capacity(),
        }
    }
}

fn default_resend_base_url() -> String {
    "https://api.resend.com".to_string()
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_config_flush_interval_ms() -> u64 {
    500
}

fn default_feed_capacity() -> usize {
    256
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("Failed to parse config file: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 无配置文件时数据库 URL 与管理员密码哈希必须提供
                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and config.toml was not found")?;
                let password_hash = get_env("ADMIN_PASSWORD_HASH")
                    .ok_or("ADMIN_PASSWORD_HASH is not set and config.toml was not found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 43_200i64),
                    },
                    admin: AdminConfig {
                        username: get_env("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
                        password_hash,
                    },
                    resend: ResendConfig {
                        api_key: get_env("RESEND_API_KEY").unwrap_or_default(),
                        from_address: get_env("RESEND_FROM_ADDRESS")
                            .unwrap_or_else(|| ResendConfig::default().from_address),
                        base_url: get_env("RESEND_BASE_URL")
                            .unwrap_or_else(default_resend_base_url),
                        timeout_secs: get_env_parse(
                            "RESEND_TIMEOUT_SECS",
                            default_http_timeout_secs(),
                        ),
                    },
                    raffle: RaffleSettings {
                        config_flush_interval_ms: get_env_parse(
                            "CONFIG_FLUSH_INTERVAL_MS",
                            default_config_flush_interval_ms(),
                        ),
                        feed_capacity: get_env_parse("FEED_CAPACITY", default_feed_capacity()),
                    },
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("ADMIN_USERNAME") {
            config.admin.username = v;
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD_HASH") {
            config.admin.password_hash = v;
        }
        if let Ok(v) = env::var("RESEND_API_KEY") {
            config.resend.api_key = v;
        }
        if let Ok(v) = env::var("RESEND_FROM_ADDRESS") {
            config.resend.from_address = v;
        }
        if let Ok(v) = env::var("RESEND_BASE_URL") {
            config.resend.base_url = v;
        }
        if let Ok(v) = env::var("RESEND_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            config.resend.timeout_secs = n;
        }
        if let Ok(v) = env::var("CONFIG_FLUSH_INTERVAL_MS")
            && let Ok(n) = v.parse()
        {
            config.raffle.config_flush_interval_ms = n;
        }
        if let Ok(v) = env::var("FEED_CAPACITY")
            && let Ok(n) = v.parse()
        {
            config.raffle.feed_capacity = n;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_toml_uses_section_defaults() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [jwt]
            secret = "s"
            access_token_expires_in = 60

            [admin]
            username = "admin"
            password_hash = "$2b$12$abc"
        "#;
        let cfg: Config = toml::from_str(raw).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.resend.base_url, "https://api.resend.com");
        assert_eq!(cfg.resend.timeout_secs, 10);
        assert_eq!(cfg.raffle.config_flush_interval_ms, 500);
        assert_eq!(cfg.raffle.feed_capacity, 256);
    }
}
