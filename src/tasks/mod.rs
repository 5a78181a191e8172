//! Background tasks.
//!
//! Page-config edits stay in memory until the periodic flush writes them back.
//! Call `spawn_all` once during startup.

use std::time::Duration;

use crate::services::ConfigService;

/// Spawn all background tasks. Detached via `tokio::spawn`; does not block.
pub fn spawn_all(config_service: ConfigService, flush_interval_ms: u64) {
    // 定期写回配置修改
    {
        let svc = config_service.clone();
        let interval = Duration::from_millis(flush_interval_ms.max(50));
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match svc.flush().await {
                    Ok(true) => log::debug!("Page config flushed"),
                    Ok(false) => {}
                    Err(e) => log::error!("Failed to flush page config: {e:?}"),
                }
            }
        });
    }
}
