use std::convert::Infallible;

use crate::services::{EventFeed, FeedEvent};
use actix_web::web::Bytes;
use actix_web::{HttpResponse, Result, http::header, web};
use futures_util::stream;
use tokio::sync::broadcast::{Receiver, error::RecvError};

/// 一条 SSE 帧
pub(crate) fn sse_frame(event: &FeedEvent) -> Option<Bytes> {
    match serde_json::to_string(event) {
        Ok(data) => Some(Bytes::from(format!(
            "event: {}\ndata: {data}\n\n",
            event.name()
        ))),
        Err(e) => {
            log::error!("Failed to serialize feed event: {e}");
            None
        }
    }
}

/// 等待下一条可发送的事件；落后太多时跳过丢失的部分，发送端关闭时结束
async fn next_frame(mut rx: Receiver<FeedEvent>) -> Option<(Result<Bytes, Infallible>, Receiver<FeedEvent>)> {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(frame) = sse_frame(&event) {
                    return Some((Ok(frame), rx));
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                log::warn!("Feed subscriber lagged, {skipped} events dropped");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

#[utoipa::path(
    get,
    path = "/admin/feed",
    tag = "feed",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "text/event-stream：submission / win / warning 事件")
    )
)]
pub async fn subscribe_feed(feed: web::Data<EventFeed>) -> Result<HttpResponse> {
    let rx = feed.subscribe();
    log::debug!("Feed subscriber connected");
    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(stream::unfold(rx, next_frame)))
}

pub fn feed_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/feed", web::get().to(subscribe_feed));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::SubmissionEvent;

    #[test]
    fn test_sse_frame() {
        let frame = sse_frame(&FeedEvent::Submission(SubmissionEvent::Deleted {
            id: "s1".into(),
        }))
        .unwrap();
        assert_eq!(
            std::str::from_utf8(&frame).unwrap(),
            "event: submission\ndata: {\"type\":\"submission\",\"payload\":{\"action\":\"deleted\",\"record\":{\"id\":\"s1\"}}}\n\n"
        );
    }

    #[tokio::test]
    async fn test_next_frame_ends_when_feed_dropped() {
        let feed = EventFeed::new(4);
        let rx = feed.subscribe();
        feed.publish(FeedEvent::Submission(SubmissionEvent::Cleared));
        drop(feed);

        let (frame, rx) = next_frame(rx).await.unwrap();
        assert!(frame.unwrap().starts_with(b"event: submission\n"));
        assert!(next_frame(rx).await.is_none());
    }
}
