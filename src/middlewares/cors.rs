use actix_cors::Cors;

/// 访客页面与后台前端可能部署在任意域名上
pub fn create_cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|_, _req_head| true)
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allow_any_header()
        .expose_headers(vec!["content-disposition"])
        .max_age(3600)
}
