use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
    })
}

/// 邮箱格式校验（宽松，只排除明显错误）
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

/// 比较用的规范化: 去空白 + 小写
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("  ana.silva+raffle@mail.com.br "));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("ana example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("  Ana@Example.COM "), "ana@example.com");
        assert_eq!(normalize_identifier("AbC123"), "abc123");
    }
}
