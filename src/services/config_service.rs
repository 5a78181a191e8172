use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::entities::page_config_entity as page_configs;
use crate::error::{AppError, AppResult};
use crate::models::{PageConfig, PublicPageConfig};
use crate::utils::access_password_matches;

struct ConfigState {
    config: PageConfig,
    dirty: bool,
    /// 每次修改自增；flush 期间若又被修改则保持 dirty
    version: u64,
}

/// 页面配置
///
/// 内存中保存当前配置，修改只标记 dirty，由 `flush` 显式写库
/// （后台任务按 `raffle.config_flush_interval_ms` 周期调用，也可由管理员手动触发）。
#[derive(Clone)]
pub struct ConfigService {
    pool: DatabaseConnection,
    state: Arc<RwLock<ConfigState>>,
}

impl ConfigService {
    /// 从数据库加载；不存在或损坏时使用默认配置
    pub async fn load(pool: DatabaseConnection) -> AppResult<Self> {
        let row = page_configs::Entity::find_by_id(page_configs::SINGLETON_ID)
            .one(&pool)
            .await?;

        let config = match row {
            Some(row) => match serde_json::from_value::<PageConfig>(row.data) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::error!("Stored page config is unreadable, using defaults: {e}");
                    PageConfig::default()
                }
            },
            None => PageConfig::default(),
        };

        Ok(Self {
            pool,
            state: Arc::new(RwLock::new(ConfigState {
                config,
                dirty: false,
                version: 0,
            })),
        })
    }

    /// 当前配置的快照，抽奖与报名都以此为准
    pub async fn get(&self) -> PageConfig {
        self.state.read().await.config.clone()
    }

    pub async fn public(&self) -> PublicPageConfig {
        PublicPageConfig::from(&self.state.read().await.config)
    }

    /// 以 JSON 对象补丁覆盖当前配置
    pub async fn update(&self, patch: Value) -> AppResult<PageConfig> {
        let Value::Object(patch) = patch else {
            return Err(AppError::ValidationError(
                "Config patch must be a JSON object".to_string(),
            ));
        };

        let mut state = self.state.write().await;
        let mut merged = serde_json::to_value(&state.config)?;
        if let Value::Object(obj) = &mut merged {
            for (k, v) in patch {
                obj.insert(k, v);
            }
        }
        let config: PageConfig = serde_json::from_value(merged)
            .map_err(|e| AppError::ValidationError(format!("Invalid config: {e}")))?;
        validate(&config)?;

        state.config = config.clone();
        state.dirty = true;
        state.version += 1;
        Ok(config)
    }

    pub async fn reset(&self) -> PageConfig {
        let mut state = self.state.write().await;
        state.config = PageConfig::default();
        state.dirty = true;
        state.version += 1;
        state.config.clone()
    }

    pub async fn add_tip_value(&self, value: &str) -> AppResult<Vec<String>> {
        let value = value.trim();
        if value.is_empty() {
            return Err(AppError::ValidationError(
                "Tip value cannot be empty".to_string(),
            ));
        }
        let mut state = self.state.write().await;
        if state.config.tip_values.iter().any(|v| v == value) {
            return Err(AppError::ValidationError(format!(
                "Tip value already exists: {value}"
            )));
        }
        state.config.tip_values.push(value.to_string());
        state.dirty = true;
        state.version += 1;
        Ok(state.config.tip_values.clone())
    }

    pub async fn remove_tip_value(&self, value: &str) -> AppResult<Vec<String>> {
        let mut state = self.state.write().await;
        let before = state.config.tip_values.len();
        state.config.tip_values.retain(|v| v != value.trim());
        if state.config.tip_values.len() == before {
            return Err(AppError::NotFound(format!("Tip value not found: {value}")));
        }
        state.dirty = true;
        state.version += 1;
        Ok(state.config.tip_values.clone())
    }

    /// 访客访问密码（忽略首尾空格与大小写）；未开启时恒为 true
    pub async fn verify_access_password(&self, input: &str) -> bool {
        let state = self.state.read().await;
        !state.config.access_password_enabled
            || access_password_matches(input, &state.config.access_password)
    }

    pub async fn is_dirty(&self) -> bool {
        self.state.read().await.dirty
    }

    /// 有未保存修改时写库，返回是否写入
    pub async fn flush(&self) -> AppResult<bool> {
        let (data, version) = {
            let state = self.state.read().await;
            if !state.dirty {
                return Ok(false);
            }
            (serde_json::to_value(&state.config)?, state.version)
        };

        let row = page_configs::ActiveModel {
            id: Set(page_configs::SINGLETON_ID),
            data: Set(data),
            updated_at: Set(Utc::now()),
        };
        page_configs::Entity::insert(row)
            .on_conflict(
                OnConflict::column(page_configs::Column::Id)
                    .update_columns([page_configs::Column::Data, page_configs::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.pool)
            .await?;

        let mut state = self.state.write().await;
        if state.version == version {
            state.dirty = false;
        }
        log::debug!("Page config flushed (version {version})");
        Ok(true)
    }
}

fn validate(config: &PageConfig) -> AppResult<()> {
    if config.max_daily_wins < 1 || config.max_weekly_wins < 1 || config.max_monthly_wins < 1 {
        return Err(AppError::ValidationError(
            "Win caps must be at least 1".to_string(),
        ));
    }

    let mut ids = HashSet::new();
    for field in &config.fields {
        if field.id.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Field id cannot be empty".to_string(),
            ));
        }
        if !ids.insert(field.id.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Duplicate field id: {}",
                field.id
            )));
        }
    }

    if config.account_id_field.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Account id field cannot be empty".to_string(),
        ));
    }
    if !config.fields.is_empty() && config.field(&config.account_id_field).is_none() {
        return Err(AppError::ValidationError(format!(
            "Account id field is not a configured field: {}",
            config.account_id_field
        )));
    }

    if let Some(budget) = config.weekly_tip_budget
        && !(budget >= 0.0)
    {
        return Err(AppError::ValidationError(
            "Weekly tip budget must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}
