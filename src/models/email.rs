use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 邮件中继请求（字段名与前端保持一致）
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WinnerEmailRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub from_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WinnerEmailResponse {
    pub success: bool,
    pub id: String,
}
