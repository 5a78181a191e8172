use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ResendConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct SendEmailRequest<'a> {
    pub from: String,
    pub to: [&'a str; 1],
    pub subject: &'a str,
    pub html: String,
}

#[derive(Debug, Deserialize)]
pub struct SendEmailResponse {
    pub id: String,
}

/// 发送失败的两类原因：服务商拒绝（带状态码与原始响应体）或网络/配置问题
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("provider returned {status}: {details}")]
    Provider { status: u16, details: Value },
    #[error("{0}")]
    Transport(String),
}

impl From<DeliveryError> for AppError {
    fn from(e: DeliveryError) -> Self {
        AppError::ExternalApiError(format!("Email sending failed: {e}"))
    }
}

/// 纯文本正文转 HTML，只保留换行
pub fn body_to_html(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\n', "<br>")
}

#[derive(Clone)]
pub struct ResendService {
    client: Client,
    config: ResendConfig,
}

impl ResendService {
    pub fn new(config: ResendConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Failed to build HTTP client with timeout, using default: {e}");
                Client::new()
            });
        Self { client, config }
    }

    /// 发送邮件，成功时返回服务商的消息 ID
    pub async fn deliver(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        from_name: &str,
    ) -> Result<String, DeliveryError> {
        if self.config.api_key.is_empty() {
            return Err(DeliveryError::Transport(
                "RESEND_API_KEY is not configured".to_string(),
            ));
        }

        let url = format!("{}/emails", self.config.base_url.trim_end_matches('/'));
        let payload = SendEmailRequest {
            from: format!("{} <{}>", from_name.trim(), self.config.from_address),
            to: [to],
            subject,
            html: body_to_html(body),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        let details: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            let parsed: SendEmailResponse = serde_json::from_value(details)
                .map_err(|e| DeliveryError::Transport(format!("Unexpected provider response: {e}")))?;
            log::info!("Winner email sent to {to}: {}", parsed.id);
            Ok(parsed.id)
        } else {
            log::error!("Resend API error for {to}: {status} {details}");
            Err(DeliveryError::Provider {
                status: status.as_u16(),
                details,
            })
        }
    }
}

/// 通知服务依赖的发送接口，测试中可替换
pub trait EmailSender: Send + Sync {
    fn send<'a>(
        &'a self,
        to: &'a str,
        subject: &'a str,
        body: &'a str,
        from_name: &'a str,
    ) -> futures_util::future::BoxFuture<'a, AppResult<String>>;
}

impl EmailSender for ResendService {
    fn send<'a>(
        &'a self,
        to: &'a str,
        subject: &'a str,
        body: &'a str,
        from_name: &'a str,
    ) -> futures_util::future::BoxFuture<'a, AppResult<String>> {
        Box::pin(async move { Ok(self.deliver(to, subject, body, from_name).await?) })
    }
}
