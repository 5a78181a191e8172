use crate::models::*;
use crate::services::{ConfigService, SubmissionService};
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/public/config",
    tag = "public",
    responses(
        (status = 200, description = "访客页面配置", body = PublicPageConfig)
    )
)]
/// 访客页面配置（只含启用的字段，不含访问密码与邮件模板）
pub async fn get_public_config(service: web::Data<ConfigService>) -> Result<HttpResponse> {
    Ok(ApiResponse::success(service.public().await).into_response())
}

#[utoipa::path(
    post,
    path = "/public/access",
    tag = "public",
    request_body = AccessRequest,
    responses(
        (status = 200, description = "校验结果", body = AccessResponse)
    )
)]
/// 校验访客访问密码
pub async fn check_access(
    service: web::Data<ConfigService>,
    request: web::Json<AccessRequest>,
) -> Result<HttpResponse> {
    let granted = service.verify_access_password(&request.password).await;
    if !granted {
        log::info!("Access password rejected");
    }
    Ok(ApiResponse::success(AccessResponse { granted }).into_response())
}

#[utoipa::path(
    post,
    path = "/public/submissions",
    tag = "public",
    request_body = CreateSubmissionRequest,
    responses(
        (status = 200, description = "报名成功", body = Submission),
        (status = 400, description = "缺少必填项 / 格式错误 / 未同意规则 / 活动已关闭"),
        (status = 403, description = "已被拉黑 / 访问密码错误"),
        (status = 409, description = "账号 ID 已报名")
    )
)]
/// 访客报名
pub async fn create_submission(
    service: web::Data<SubmissionService>,
    request: web::Json<CreateSubmissionRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    match service
        .submit(
            request.data,
            request.rules_accepted,
            request.access_password.as_deref(),
        )
        .await
    {
        Ok(submission) => Ok(ApiResponse::success(submission).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn public_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/public")
            .route("/config", web::get().to(get_public_config))
            .route("/access", web::post().to(check_access))
            .route("/submissions", web::post().to(create_submission)),
    );
}
