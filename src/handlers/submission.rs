use crate::middlewares::{AdminIdentity, admin_name};
use crate::models::*;
use crate::services::SubmissionService;
use actix_web::web::ReqData;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/admin/submissions",
    tag = "submission",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "全部报名（按报名时间升序）", body = [Submission]),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_submissions(service: web::Data<SubmissionService>) -> Result<HttpResponse> {
    Ok(ApiResponse::success(service.list()).into_response())
}

#[utoipa::path(
    put,
    path = "/admin/submissions/{id}",
    tag = "submission",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "报名 ID")),
    request_body = UpdateSubmissionRequest,
    responses(
        (status = 200, description = "修改成功", body = Submission),
        (status = 404, description = "报名不存在"),
        (status = 409, description = "账号 ID 与其他报名重复")
    )
)]
/// 修改报名字段；已产生的中奖快照不受影响
pub async fn update_submission(
    service: web::Data<SubmissionService>,
    path: web::Path<String>,
    request: web::Json<UpdateSubmissionRequest>,
) -> Result<HttpResponse> {
    match service.update(&path.into_inner(), request.into_inner().data).await {
        Ok(submission) => Ok(ApiResponse::success(submission).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/submissions/{id}",
    tag = "submission",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "报名 ID")),
    responses(
        (status = 200, description = "删除成功"),
        (status = 404, description = "报名不存在")
    )
)]
pub async fn delete_submission(
    service: web::Data<SubmissionService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.delete(&path.into_inner()).await {
        Ok(()) => Ok(ApiResponse::message("Submission deleted").into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/submissions",
    tag = "submission",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "已清空报名（中奖记录保留）")
    )
)]
pub async fn clear_submissions(
    service: web::Data<SubmissionService>,
    identity: Option<ReqData<AdminIdentity>>,
) -> Result<HttpResponse> {
    log::warn!("Clear submissions requested by {}", admin_name(identity));
    match service.clear().await {
        Ok(count) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "deleted": count }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn submission_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/submissions")
            .route("", web::get().to(list_submissions))
            .route("", web::delete().to(clear_submissions))
            .route("/{id}", web::put().to(update_submission))
            .route("/{id}", web::delete().to(delete_submission)),
    );
}
