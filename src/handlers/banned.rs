use crate::models::*;
use crate::services::BanService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/admin/bans",
    tag = "ban",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "黑名单", body = [BannedEntryResponse])
    )
)]
pub async fn list_bans(service: web::Data<BanService>) -> Result<HttpResponse> {
    match service.list().await {
        Ok(list) => Ok(ApiResponse::success(list).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/bans",
    tag = "ban",
    security(("bearer_auth" = [])),
    request_body = CreateBanRequest,
    responses(
        (status = 200, description = "已加入黑名单（已存在时返回原记录）", body = BannedEntryResponse),
        (status = 400, description = "值为空")
    )
)]
pub async fn add_ban(
    service: web::Data<BanService>,
    request: web::Json<CreateBanRequest>,
) -> Result<HttpResponse> {
    match service.add(request.into_inner()).await {
        Ok(entry) => Ok(ApiResponse::success(entry).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/bans/{id}",
    tag = "ban",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "黑名单记录 ID")),
    responses(
        (status = 200, description = "已移除"),
        (status = 404, description = "不存在")
    )
)]
pub async fn remove_ban(
    service: web::Data<BanService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.remove(&path.into_inner()).await {
        Ok(()) => Ok(ApiResponse::message("Ban removed").into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn banned_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bans")
            .route("", web::get().to(list_bans))
            .route("", web::post().to(add_ban))
            .route("/{id}", web::delete().to(remove_ban)),
    );
}
