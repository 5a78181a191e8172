use actix_web::web;

use super::banned::banned_config;
use super::config::config_config;
use super::dashboard::dashboard_config;
use super::export::export_config;
use super::feed::feed_config;
use super::raffle::raffle_config;
use super::submission::submission_config;

/// 管理后台路由，全部需要管理员令牌
pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .configure(config_config)
            .configure(submission_config)
            .configure(banned_config)
            .configure(raffle_config)
            .configure(export_config)
            .configure(dashboard_config)
            .configure(feed_config),
    );
}
