use actix_web::http::Method;
use actix_web::{web, HttpResponse};
use payrelay::{TokenizationOutcome, TokenizationRequest, TokenizeBody};
use serde::Serialize;

use crate::cors::{open_origin_headers, PREFLIGHT_HEADERS};
use crate::error::ApiError;
use crate::metrics::{CRM_UPDATES, TOKENIZE_LATENCY, TOKENIZE_REQUESTS};
use crate::routes::method_not_allowed;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizeResponse {
    pub success: bool,
    pub token: String,
    pub message: String,
    pub test_mode: bool,
}

impl From<TokenizationOutcome> for TokenizeResponse {
    fn from(outcome: TokenizationOutcome) -> Self {
        Self {
            success: true,
            token: outcome.token,
            message: outcome.message,
            test_mode: outcome.test_mode,
        }
    }
}

/// POST /api/tokenize, POST /tokenize
pub async fn tokenize(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let timer = TOKENIZE_LATENCY.start_timer();
    let result = relay_request(&state, &body).await;
    timer.observe_duration();

    let label = match &result {
        Ok(_) => "success",
        Err(ApiError::Validation(_)) => "invalid",
        Err(ApiError::Tokenization(_)) => "rejected",
        Err(_) => "error",
    };
    TOKENIZE_REQUESTS.with_label_values(&[label]).inc();

    result
}

async fn relay_request(state: &AppState, body: &[u8]) -> Result<HttpResponse, ApiError> {
    let environment = state.config.environment;

    let body: TokenizeBody = if body.iter().all(u8::is_ascii_whitespace) {
        TokenizeBody::default()
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::internal(format!("invalid JSON body: {e}"), environment))?
    };
    let request =
        TokenizationRequest::try_from(body).map_err(|e| ApiError::from_relay(e, environment))?;

    // Detached so a client disconnect cannot cut the CRM update short.
    let relay = state.relay.clone();
    let outcome = actix_web::rt::spawn(async move { relay.tokenize(request).await })
        .await
        .map_err(|e| ApiError::internal(format!("tokenization task failed: {e}"), environment))?
        .map_err(|e| ApiError::from_relay(e, environment))?;

    CRM_UPDATES.with_label_values(&[outcome.crm.as_str()]).inc();

    Ok(HttpResponse::Ok().json(TokenizeResponse::from(outcome)))
}

/// OPTIONS /tokenize
pub async fn preflight() -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    for header in PREFLIGHT_HEADERS {
        builder.insert_header(header);
    }
    builder.finish()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/tokenize")
            .route(web::post().to(tokenize))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::to(method_not_allowed))
            .wrap(open_origin_headers()),
    );
}
