use actix_web::{web, HttpRequest, HttpResponse, Scope};

use crate::error::ApiError;

pub mod health;
pub mod tokenize;

/// `/api` scope: tokenize, health, and configuration check.
///
/// The caller wraps it with CORS and rate limiting.
pub fn api_scope() -> Scope {
    web::scope("/api")
        .service(
            web::resource("/tokenize")
                .route(web::post().to(tokenize::tokenize))
                .default_service(web::to(method_not_allowed)),
        )
        .route("/health", web::get().to(health::health))
        .route("/test-config", web::get().to(health::test_config))
}

/// Routes outside `/api`: the open `/tokenize` endpoint and `/metrics`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    tokenize::configure(cfg);
    cfg.route("/metrics", web::get().to(health::metrics));
}

pub async fn method_not_allowed() -> Result<HttpResponse, ApiError> {
    Err(ApiError::MethodNotAllowed)
}

/// Fallback for unknown paths.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let path = req
        .uri()
        .path_and_query()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string());
    Err(ApiError::NotFound(path))
}
