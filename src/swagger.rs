use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::BanType;
use crate::handlers;
use crate::handlers::export::ExportFormat;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::public::get_public_config,
        handlers::public::check_access,
        handlers::public::create_submission,
        handlers::config::get_config,
        handlers::config::update_config,
        handlers::config::reset_config,
        handlers::config::flush_config,
        handlers::config::add_tip_value,
        handlers::config::remove_tip_value,
        handlers::submission::list_submissions,
        handlers::submission::update_submission,
        handlers::submission::delete_submission,
        handlers::submission::clear_submissions,
        handlers::banned::list_bans,
        handlers::banned::add_ban,
        handlers::banned::remove_ban,
        handlers::raffle::get_eligibility,
        handlers::raffle::draw_random,
        handlers::raffle::draw_selected,
        handlers::raffle::list_wins,
        handlers::raffle::wins_by_date,
        handlers::raffle::assign_tip,
        handlers::raffle::tip_budget,
        handlers::raffle::clear_wins,
        handlers::raffle::validated_count,
        handlers::export::export_wins,
        handlers::export::export_submissions,
        handlers::dashboard::get_dashboard,
        handlers::feed::subscribe_feed,
        handlers::webhook::postback,
        handlers::relay::send_winner_email,
    ),
    components(
        schemas(
            LoginRequest,
            AuthResponse,
            FieldType,
            BackgroundType,
            FormField,
            PageConfig,
            PublicPageConfig,
            AccessRequest,
            AccessResponse,
            TipValueRequest,
            Submission,
            CreateSubmissionRequest,
            UpdateSubmissionRequest,
            BanType,
            CreateBanRequest,
            BannedEntryResponse,
            WinRecord,
            WinCounts,
            DrawRandomRequest,
            DrawSelectedRequest,
            DrawResponse,
            AssignTipRequest,
            TipBudgetResponse,
            EligibilityEntry,
            WinsByDateQuery,
            WinListQuery,
            PaginatedWinRecords,
            DashboardPeriod,
            DashboardStats,
            TopWinner,
            DailyWinCount,
            PostbackParams,
            PostbackResponse,
            ValidatedCountResponse,
            WinnerEmailRequest,
            WinnerEmailResponse,
            ExportFormat,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Admin authentication API"),
        (name = "public", description = "Visitor page API"),
        (name = "config", description = "Page configuration API"),
        (name = "submission", description = "Submission management API"),
        (name = "ban", description = "Blocklist API"),
        (name = "raffle", description = "Draw and win API"),
        (name = "export", description = "CSV / PDF export API"),
        (name = "dashboard", description = "Statistics API"),
        (name = "feed", description = "Realtime event stream"),
        (name = "webhook", description = "Player validation postback (served at /webhook)"),
        (name = "relay", description = "Winner email relay (served at /functions)"),
    ),
    info(
        title = "Tip Raffle Backend API",
        version = "1.0.0",
        description = "Tip raffle backend REST API documentation",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/admin/raffle/draw"));
        assert!(doc.paths.paths.contains_key("/public/submissions"));
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("PaginatedWinRecords"));
    }
}
