use actix_web::{App, HttpServer, middleware::Logger, web};
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use chrono::Local;  // timestamp in log lines
use std::sync::Arc;

use tip_raffle_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::ResendService,
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建JWT服务
    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 创建外部服务
    let resend_service = ResendService::new(config.resend.clone());
    if config.resend.api_key.is_empty() {
        log::warn!("RESEND_API_KEY is not configured, winner emails will fail");
    }

    // 创建服务
    let feed = EventFeed::new(config.raffle.feed_capacity);
    let config_service = ConfigService::load(pool.clone())
        .await
        .expect("Failed to load page configuration");
    let ban_service = BanService::new(pool.clone());
    let validation_service = ValidationService::new(pool.clone());
    let notification_service =
        NotificationService::new(Arc::new(resend_service.clone()), feed.clone());

    let submission_service = SubmissionService::new(
        pool.clone(),
        config_service.clone(),
        ban_service.clone(),
        feed.clone(),
    );
    let primed = submission_service
        .prime()
        .await
        .expect("Failed to load submissions");
    log::info!("Loaded {primed} submissions into cache");

    let raffle_service = RaffleService::new(
        pool.clone(),
        config_service.clone(),
        validation_service.clone(),
        notification_service,
        feed.clone(),
    );
    let export_service = ExportService::new(
        raffle_service.clone(),
        submission_service.clone(),
        config_service.clone(),
    );
    let dashboard_service = DashboardService::new(
        config_service.clone(),
        submission_service.clone(),
        raffle_service.clone(),
    );
    let auth_service = AuthService::new(config.admin.clone(), jwt_service.clone());

    // 启动后台任务
    tasks::spawn_all(config_service.clone(), config.raffle.config_flush_interval_ms);

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let shutdown_config = config_service.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(config_service.clone()))
            .app_data(web::Data::new(ban_service.clone()))
            .app_data(web::Data::new(validation_service.clone()))
            .app_data(web::Data::new(submission_service.clone()))
            .app_data(web::Data::new(raffle_service.clone()))
            .app_data(web::Data::new(export_service.clone()))
            .app_data(web::Data::new(dashboard_service.clone()))
            .app_data(web::Data::new(resend_service.clone()))
            .app_data(web::Data::new(feed.clone()))
            .configure(swagger_config)
            .configure(handlers::webhook_config)
            .configure(handlers::relay_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::public_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    // 退出前写回未保存的配置
    if let Err(e) = shutdown_config.flush().await {
        log::error!("Failed to flush page config on shutdown: {e:?}");
    }
    Ok(())
}
