use crate::error::AppError;
use crate::models::{PostbackParams, PostbackResponse};
use crate::services::ValidationService;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, Result, web};
use log::{error, warn};
use serde_json::json;

/// 从请求体解析回调参数（JSON 或表单），无法解析时视为空
fn params_from_body(req: &HttpRequest, body: &[u8]) -> PostbackParams {
    if body.is_empty() {
        return PostbackParams::default();
    }
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let parsed = if content_type.starts_with("application/json") {
        serde_json::from_slice::<PostbackParams>(body).ok()
    } else {
        std::str::from_utf8(body)
            .ok()
            .and_then(|s| web::Query::<PostbackParams>::from_query(s).ok())
            .map(web::Query::into_inner)
    };
    parsed.unwrap_or_else(|| {
        warn!("Postback body could not be parsed ({content_type})");
        PostbackParams::default()
    })
}

#[utoipa::path(
    post,
    path = "/webhook/postback",
    tag = "webhook",
    params(
        ("player_id" = Option<String>, Query, description = "玩家 ID（别名 playerid）"),
        ("currency" = Option<String>, Query, description = "币种"),
        ("registration_date" = Option<String>, Query, description = "注册日期（别名 registration）"),
        ("type" = Option<String>, Query, description = "类型")
    ),
    responses(
        (status = 200, description = "玩家已记录", body = PostbackResponse),
        (status = 400, description = "缺少 player_id"),
        (status = 500, description = "写入失败")
    )
)]
/// 注册回调：参数可以在 query string 中，也可以在 JSON / 表单请求体中，
/// 两者都有时以 query 为准。按 player_id upsert。
pub async fn postback(
    req: HttpRequest,
    body: web::Bytes,
    service: web::Data<ValidationService>,
) -> Result<HttpResponse> {
    let from_query = web::Query::<PostbackParams>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default();
    let params = from_query.or(params_from_body(&req, &body));

    match service.upsert_player(params).await {
        Ok(player_id) => Ok(HttpResponse::Ok().json(PostbackResponse {
            success: true,
            player_id,
        })),
        Err(AppError::MissingField(_)) => {
            Ok(HttpResponse::BadRequest().json(json!({ "error": "player_id is required" })))
        }
        Err(e) => {
            error!("Failed to store validated player: {e}");
            Ok(HttpResponse::InternalServerError().json(json!({ "error": "Failed to store player" })))
        }
    }
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhook").service(
            web::resource("/postback")
                .route(web::get().to(postback))
                .route(web::post().to(postback)),
        ),
    );
}
