use crate::external::{DeliveryError, ResendService};
use crate::middlewares::{AdminIdentity, admin_name};
use crate::models::{WinnerEmailRequest, WinnerEmailResponse};
use actix_web::http::StatusCode;
use actix_web::web::ReqData;
use actix_web::{HttpResponse, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/functions/send-winner-email",
    tag = "relay",
    security(("bearer_auth" = [])),
    request_body = WinnerEmailRequest,
    responses(
        (status = 200, description = "邮件已提交给服务商", body = WinnerEmailResponse),
        (status = 400, description = "缺少 to / subject / body"),
        (status = 401, description = "未授权"),
        (status = 500, description = "邮件服务未配置或网络错误")
    )
)]
/// 中奖邮件中继：正文换行转为 `<br>` 后转发给 Resend，
/// 服务商返回错误时原样带回其状态码与响应体；需要管理员令牌
pub async fn send_winner_email(
    resend: web::Data<ResendService>,
    payload: web::Json<WinnerEmailRequest>,
    identity: Option<ReqData<AdminIdentity>>,
) -> Result<HttpResponse> {
    let req = payload.into_inner();
    if req.to.trim().is_empty() || req.subject.trim().is_empty() || req.body.trim().is_empty() {
        return Ok(HttpResponse::BadRequest()
            .json(json!({ "error": "Missing required fields: to, subject, body" })));
    }
    log::info!("Winner email to {} relayed for {}", req.to.trim(), admin_name(identity));

    match resend
        .deliver(req.to.trim(), &req.subject, &req.body, &req.from_name)
        .await
    {
        Ok(id) => Ok(HttpResponse::Ok().json(WinnerEmailResponse { success: true, id })),
        Err(DeliveryError::Provider { status, details }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            Ok(HttpResponse::build(status)
                .json(json!({ "error": "Failed to send email", "details": details })))
        }
        Err(DeliveryError::Transport(msg)) => {
            log::error!("Error sending email: {msg}");
            Ok(HttpResponse::InternalServerError().json(json!({ "error": msg })))
        }
    }
}

pub fn relay_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/functions").route("/send-winner-email", web::post().to(send_winner_email)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResendConfig;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn test_missing_fields_and_unconfigured_provider() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ResendService::new(ResendConfig::default())))
                .configure(relay_config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/functions/send-winner-email")
            .set_json(json!({ "to": "ana@example.com", "subject": "Oi" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // 未配置 API key
        let req = test::TestRequest::post()
            .uri("/functions/send-winner-email")
            .set_json(json!({ "to": "ana@example.com", "subject": "Oi", "body": "a\nb", "fromName": "X" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
