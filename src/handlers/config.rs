use crate::middlewares::{AdminIdentity, admin_name};
use crate::models::*;
use crate::services::ConfigService;
use actix_web::web::ReqData;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::{Value, json};

#[utoipa::path(
    get,
    path = "/admin/config",
    tag = "config",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "当前完整配置", body = PageConfig),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_config(service: web::Data<ConfigService>) -> Result<HttpResponse> {
    Ok(ApiResponse::success(service.get().await).into_response())
}

#[utoipa::path(
    patch,
    path = "/admin/config",
    tag = "config",
    security(("bearer_auth" = [])),
    request_body(content = Object, description = "部分配置（camelCase 键）"),
    responses(
        (status = 200, description = "合并后的配置", body = PageConfig),
        (status = 400, description = "配置不合法"),
        (status = 401, description = "未授权")
    )
)]
/// 以补丁方式修改配置；修改先保存在内存，由后台任务或 flush 接口写库
pub async fn update_config(
    service: web::Data<ConfigService>,
    patch: web::Json<Value>,
) -> Result<HttpResponse> {
    match service.update(patch.into_inner()).await {
        Ok(config) => Ok(ApiResponse::success(config).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/config/reset",
    tag = "config",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "已恢复默认配置", body = PageConfig)
    )
)]
pub async fn reset_config(
    service: web::Data<ConfigService>,
    identity: Option<ReqData<AdminIdentity>>,
) -> Result<HttpResponse> {
    let config = service.reset().await;
    log::warn!("Page config reset to defaults by {}", admin_name(identity));
    Ok(ApiResponse::success_with_message(config, "Config reset to defaults").into_response())
}

#[utoipa::path(
    post,
    path = "/admin/config/flush",
    tag = "config",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "写库结果（written=false 表示没有未保存修改）")
    )
)]
/// 立即保存未写库的配置修改
pub async fn flush_config(service: web::Data<ConfigService>) -> Result<HttpResponse> {
    match service.flush().await {
        Ok(written) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "written": written }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/config/tip-values",
    tag = "config",
    security(("bearer_auth" = [])),
    request_body = TipValueRequest,
    responses(
        (status = 200, description = "更新后的小费列表", body = [String]),
        (status = 400, description = "为空或已存在")
    )
)]
pub async fn add_tip_value(
    service: web::Data<ConfigService>,
    request: web::Json<TipValueRequest>,
) -> Result<HttpResponse> {
    match service.add_tip_value(&request.value).await {
        Ok(values) => Ok(ApiResponse::success(values).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/config/tip-values",
    tag = "config",
    security(("bearer_auth" = [])),
    request_body = TipValueRequest,
    responses(
        (status = 200, description = "更新后的小费列表", body = [String]),
        (status = 404, description = "不存在")
    )
)]
pub async fn remove_tip_value(
    service: web::Data<ConfigService>,
    request: web::Json<TipValueRequest>,
) -> Result<HttpResponse> {
    match service.remove_tip_value(&request.value).await {
        Ok(values) => Ok(ApiResponse::success(values).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn config_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/config")
            .route("", web::get().to(get_config))
            .route("", web::patch().to(update_config))
            .route("/reset", web::post().to(reset_config))
            .route("/flush", web::post().to(flush_config))
            .route("/tip-values", web::post().to(add_tip_value))
            .route("/tip-values", web::delete().to(remove_tip_value)),
    );
}
