use actix_web::{web, HttpRequest, HttpResponse};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::metrics::metrics_output;
use crate::state::AppState;

/// GET /api/health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/test-config - reports missing credentials, echoes non-secret settings
pub async fn test_config(state: web::Data<AppState>) -> HttpResponse {
    let config = &state.config;
    let missing = config.missing_required();

    if !missing.is_empty() {
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Missing required environment variables",
            "missing": missing,
        }));
    }

    HttpResponse::Ok().json(serde_json::json!({
        "status": "Configuration valid",
        "environment": config.environment.as_str(),
        "merchantId": config.nuvei_merchant_id,
        "dialedInAccId": config.dialedin_accid,
    }))
}

/// Constant-time comparison that does not leak input lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let ha = Sha256::digest(a);
    let hb = Sha256::digest(b);
    ha.ct_eq(&hb).into()
}

/// GET /metrics - Prometheus metrics (bearer-gated when METRICS_TOKEN is set)
pub async fn metrics(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    if let Some(ref expected) = state.config.metrics_token {
        let authorized = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|token| constant_time_eq(token.as_bytes(), expected.as_bytes()))
            .unwrap_or(false);

        if !authorized {
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "unauthorized",
                "message": "Valid Bearer token required for /metrics"
            }));
        }
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics_output())
}
