use crate::models::*;
use crate::services::DashboardService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/admin/dashboard",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    params(("period" = Option<String>, Query, description = "day / week（默认）/ month")),
    responses(
        (status = 200, description = "统计数据", body = DashboardStats)
    )
)]
pub async fn get_dashboard(
    service: web::Data<DashboardService>,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse> {
    match service.stats(query.period).await {
        Ok(stats) => Ok(ApiResponse::success(stats).into_response()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn dashboard_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/dashboard", web::get().to(get_dashboard));
}
