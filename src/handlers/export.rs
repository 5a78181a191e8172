use crate::error::AppResult;
use crate::handlers::raffle::parse_date;
use crate::models::WinsByDateQuery;
use crate::services::{ExportService, Report, to_csv, to_pdf};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Pdf,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

fn attachment(report: AppResult<Report>, format: ExportFormat, stem: &str) -> HttpResponse {
    let rendered = report.and_then(|r| match format {
        ExportFormat::Csv => to_csv(&r),
        ExportFormat::Pdf => to_pdf(&r),
    });
    let bytes = match rendered {
        Ok(b) => b,
        Err(e) => return e.error_response(),
    };
    let (content_type, ext) = match format {
        ExportFormat::Csv => ("text/csv; charset=utf-8", "csv"),
        ExportFormat::Pdf => ("application/pdf", "pdf"),
    };
    HttpResponse::Ok()
        .content_type(content_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(format!("{stem}.{ext}"))],
        })
        .body(bytes)
}

#[utoipa::path(
    get,
    path = "/admin/export/wins",
    tag = "export",
    security(("bearer_auth" = [])),
    params(
        ("date" = String, Query, description = "YYYY-MM-DD"),
        ("format" = Option<String>, Query, description = "csv（默认）或 pdf")
    ),
    responses(
        (status = 200, description = "当天中奖名单文件"),
        (status = 400, description = "日期格式错误")
    )
)]
pub async fn export_wins(
    service: web::Data<ExportService>,
    date: web::Query<WinsByDateQuery>,
    query: web::Query<ExportQuery>,
) -> Result<HttpResponse> {
    let date = match parse_date(&date.date) {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    let stem = format!("sorteados-{}", date.format("%Y-%m-%d"));
    Ok(attachment(service.wins_on(date).await, query.format, &stem))
}

#[utoipa::path(
    get,
    path = "/admin/export/submissions",
    tag = "export",
    security(("bearer_auth" = [])),
    params(("format" = Option<String>, Query, description = "csv（默认）或 pdf")),
    responses(
        (status = 200, description = "全部报名文件")
    )
)]
pub async fn export_submissions(
    service: web::Data<ExportService>,
    query: web::Query<ExportQuery>,
) -> Result<HttpResponse> {
    Ok(attachment(
        service.all_submissions().await,
        query.format,
        "cadastros",
    ))
}

pub fn export_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/export")
            .route("/wins", web::get().to(export_wins))
            .route("/submissions", web::get().to(export_submissions)),
    );
}
