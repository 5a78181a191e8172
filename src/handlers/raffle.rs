use crate::error::AppError;
use crate::middlewares::{AdminIdentity, admin_name};
use crate::models::*;
use crate::services::{RaffleService, ValidationService};
use actix_web::web::ReqData;
use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::NaiveDate;
use serde_json::json;

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::ValidationError(format!("Invalid date '{raw}', expected YYYY-MM-DD")))
}

#[utoipa::path(
    get,
    path = "/admin/raffle/eligibility",
    tag = "raffle",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "每条报名当前的中奖资格与中奖次数", body = [EligibilityEntry])
    )
)]
pub async fn get_eligibility(service: web::Data<RaffleService>) -> Result<HttpResponse> {
    match service.eligibility_overview().await {
        Ok(list) => Ok(ApiResponse::success(list).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/raffle/draw",
    tag = "raffle",
    security(("bearer_auth" = [])),
    request_body = DrawRandomRequest,
    responses(
        (status = 200, description = "抽奖结果；没有符合条件的报名时 wins 为空并带 message", body = DrawResponse),
        (status = 400, description = "人数不合法")
    )
)]
/// 随机抽奖
pub async fn draw_random(
    service: web::Data<RaffleService>,
    request: web::Json<DrawRandomRequest>,
    identity: Option<ReqData<AdminIdentity>>,
) -> Result<HttpResponse> {
    if request.count == 0 {
        return Ok(AppError::ValidationError("count must be at least 1".to_string()).error_response());
    }
    log::info!("Random draw of {} requested by {}", request.count, admin_name(identity));
    match service.draw_random(request.count).await {
        Ok(result) => Ok(ApiResponse::success(result).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/raffle/draw-selected",
    tag = "raffle",
    security(("bearer_auth" = [])),
    request_body = DrawSelectedRequest,
    responses(
        (status = 200, description = "抽奖结果；不符合条件的 ID 被跳过", body = DrawResponse)
    )
)]
/// 手动指定中奖者
pub async fn draw_selected(
    service: web::Data<RaffleService>,
    request: web::Json<DrawSelectedRequest>,
    identity: Option<ReqData<AdminIdentity>>,
) -> Result<HttpResponse> {
    log::info!(
        "Manual draw of {} ids requested by {}",
        request.submission_ids.len(),
        admin_name(identity)
    );
    match service.draw_selected(&request.submission_ids).await {
        Ok(result) => Ok(ApiResponse::success(result).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/raffle/wins",
    tag = "raffle",
    security(("bearer_auth" = [])),
    params(
        ("page" = Option<u32>, Query, description = "页码，从 1 开始"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    responses(
        (status = 200, description = "中奖记录（最新在前）", body = PaginatedWinRecords)
    )
)]
pub async fn list_wins(
    service: web::Data<RaffleService>,
    query: web::Query<WinListQuery>,
) -> Result<HttpResponse> {
    match service.list_wins(&query).await {
        Ok(page) => Ok(ApiResponse::success(page).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/raffle/wins/by-date",
    tag = "raffle",
    security(("bearer_auth" = [])),
    params(("date" = String, Query, description = "YYYY-MM-DD，服务器本地日期")),
    responses(
        (status = 200, description = "当天的中奖记录", body = [WinRecord]),
        (status = 400, description = "日期格式错误")
    )
)]
pub async fn wins_by_date(
    service: web::Data<RaffleService>,
    query: web::Query<WinsByDateQuery>,
) -> Result<HttpResponse> {
    let date = match parse_date(&query.date) {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    match service.wins_by_date(date).await {
        Ok(list) => Ok(ApiResponse::success(list).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/raffle/wins/{id}/tip",
    tag = "raffle",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "中奖记录 ID")),
    request_body = AssignTipRequest,
    responses(
        (status = 200, description = "设置成功", body = WinRecord),
        (status = 400, description = "已设置过、不在列表中或超出本周预算"),
        (status = 404, description = "中奖记录不存在")
    )
)]
pub async fn assign_tip(
    service: web::Data<RaffleService>,
    path: web::Path<String>,
    request: web::Json<AssignTipRequest>,
    identity: Option<ReqData<AdminIdentity>>,
) -> Result<HttpResponse> {
    let win_id = path.into_inner();
    log::info!(
        "Tip {} on win {win_id} assigned by {}",
        request.tip_value,
        admin_name(identity)
    );
    match service.assign_tip(&win_id, &request.tip_value).await {
        Ok(win) => Ok(ApiResponse::success(win).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/raffle/tip-budget",
    tag = "raffle",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "本周小费预算使用情况", body = TipBudgetResponse)
    )
)]
pub async fn tip_budget(service: web::Data<RaffleService>) -> Result<HttpResponse> {
    match service.tip_budget().await {
        Ok(budget) => Ok(ApiResponse::success(budget).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/raffle/wins",
    tag = "raffle",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "已清空中奖记录")
    )
)]
pub async fn clear_wins(
    service: web::Data<RaffleService>,
    identity: Option<ReqData<AdminIdentity>>,
) -> Result<HttpResponse> {
    log::warn!("Clear wins requested by {}", admin_name(identity));
    match service.clear_wins().await {
        Ok(count) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "deleted": count }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/raffle/validated-count",
    tag = "raffle",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "已通过回传验证的玩家数量", body = ValidatedCountResponse)
    )
)]
pub async fn validated_count(service: web::Data<ValidationService>) -> Result<HttpResponse> {
    match service.count().await {
        Ok(count) => Ok(ApiResponse::success(ValidatedCountResponse { count }).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn raffle_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/raffle")
            .route("/eligibility", web::get().to(get_eligibility))
            .route("/draw", web::post().to(draw_random))
            .route("/draw-selected", web::post().to(draw_selected))
            .route("/wins", web::get().to(list_wins))
            .route("/wins", web::delete().to(clear_wins))
            .route("/wins/by-date", web::get().to(wins_by_date))
            .route("/wins/{id}/tip", web::put().to(assign_tip))
            .route("/tip-budget", web::get().to(tip_budget))
            .route("/validated-count", web::get().to(validated_count)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(" 2024-03-15 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert!(matches!(
            parse_date("15/03/2024"),
            Err(AppError::ValidationError(_))
        ));
    }
}
