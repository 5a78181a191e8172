use std::sync::Arc;

use chrono::{DateTime, Local, Utc};

use crate::external::EmailSender;
use crate::models::{PageConfig, WinRecord};
use crate::services::feed::{EventFeed, FeedEvent, RaffleEvent};
use crate::utils::is_valid_email;

/// 一封待发送的中奖邮件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerEmail {
    pub win_id: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub from_name: String,
}

/// 替换 `{{fieldId}}`、`{{date}}`、`{{tipValue}}`；未知变量原样保留
pub fn render_template(template: &str, win: &WinRecord, config: &PageConfig) -> String {
    let mut out = template.to_string();
    for field in config.enabled_fields() {
        let value = win
            .submission_data
            .get(&field.id)
            .map(String::as_str)
            .unwrap_or("");
        out = out.replace(&format!("{{{{{}}}}}", field.id), value);
    }
    out.replace("{{date}}", &format_draw_date(&win.won_at))
        .replace("{{tipValue}}", win.tip_value.as_deref().unwrap_or(""))
}

/// dd/mm/YYYY（服务器本地日期）
pub fn format_draw_date(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d/%m/%Y").to_string()
}

#[derive(Clone)]
pub struct NotificationService {
    sender: Arc<dyn EmailSender>,
    feed: EventFeed,
}

impl NotificationService {
    pub fn new(sender: Arc<dyn EmailSender>, feed: EventFeed) -> Self {
        Self { sender, feed }
    }

    /// 生成邮件；未开启通知或快照里没有有效邮箱时返回 None
    pub fn compose(&self, win: &WinRecord, config: &PageConfig) -> Option<WinnerEmail> {
        if !config.email_notification_enabled {
            return None;
        }
        let to = win.submission_data.get(&config.email_field)?.trim();
        if !is_valid_email(to) {
            log::warn!("Win {} has no usable email, notification skipped", win.id);
            return None;
        }
        Some(WinnerEmail {
            win_id: win.id.clone(),
            to: to.to_string(),
            subject: render_template(&config.email_subject, win, config),
            body: render_template(&config.email_body, win, config),
            from_name: config.email_from_name.clone(),
        })
    }

    /// 发送一封邮件；失败只记录日志并推送警告
    pub async fn deliver(&self, email: WinnerEmail) -> bool {
        match self
            .sender
            .send(&email.to, &email.subject, &email.body, &email.from_name)
            .await
        {
            Ok(id) => {
                log::info!("Winner notification for {} delivered: {id}", email.win_id);
                true
            }
            Err(e) => {
                log::error!("Winner notification for {} failed: {e}", email.win_id);
                self.feed
                    .publish(FeedEvent::Raffle(RaffleEvent::NotificationFailed {
                        win_id: email.win_id,
                        recipient: email.to,
                        error: e.to_string(),
                    }));
                false
            }
        }
    }

    /// 每位中奖者一个独立任务，不等待结果
    pub fn dispatch(&self, wins: &[WinRecord], config: &PageConfig) {
        for win in wins {
            let Some(email) = self.compose(win, config) else {
                continue;
            };
            let svc = self.clone();
            tokio::spawn(async move {
                svc.deliver(email).await;
            });
        }
    }

    /// 邮件中继：直接转发
    pub async fn relay(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        from_name: &str,
    ) -> crate::error::AppResult<String> {
        self.sender.send(to, subject, body, from_name).await
    }
}
