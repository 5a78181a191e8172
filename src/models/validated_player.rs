use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 注册回调参数；平台可能用 query string、JSON 或表单提交，
/// 且部分平台使用 `playerid` / `registration` 这样的别名
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PostbackParams {
    #[serde(alias = "playerid")]
    pub player_id: Option<String>,
    pub currency: Option<String>,
    #[serde(alias = "registration")]
    pub registration_date: Option<String>,
    #[serde(rename = "type")]
    pub player_type: Option<String>,
}

impl PostbackParams {
    /// 以 `self` 为准，缺失的字段用 `other` 补齐
    pub fn or(self, other: PostbackParams) -> PostbackParams {
        fn pick(a: Option<String>, b: Option<String>) -> Option<String> {
            a.filter(|v| !v.trim().is_empty())
                .or(b.filter(|v| !v.trim().is_empty()))
        }
        PostbackParams {
            player_id: pick(self.player_id, other.player_id),
            currency: pick(self.currency, other.currency),
            registration_date: pick(self.registration_date, other.registration_date),
            player_type: pick(self.player_type, other.player_type),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostbackResponse {
    pub success: bool,
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidatedCountResponse {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_and_merge() {
        let query: PostbackParams =
            serde_json::from_value(serde_json::json!({ "playerid": "P1", "registration": "2024-03-01" }))
                .unwrap();
        let body = PostbackParams {
            player_id: Some("P2".into()),
            currency: Some("BRL".into()),
            ..Default::default()
        };
        let merged = query.or(body);
        assert_eq!(merged.player_id.as_deref(), Some("P1"));
        assert_eq!(merged.currency.as_deref(), Some("BRL"));
        assert_eq!(merged.registration_date.as_deref(), Some("2024-03-01"));
        assert!(merged.player_type.is_none());
    }
}
