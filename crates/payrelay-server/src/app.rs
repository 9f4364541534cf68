//! Route table with the `/api` middleware stack, shared by the binary and tests.

use actix_governor::governor::middleware::NoOpMiddleware;
use actix_governor::{Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor};
use actix_web::web;

use crate::config::RateLimitConfig;
use crate::cors::build_cors;
use crate::routes;

/// Per-peer-IP limiter applied to `/api`.
pub type ApiRateLimit = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Token bucket holding `max_requests` slots, one refilled every
/// `window / max_requests`.
///
/// Returns `None` if the limits cannot form a quota.
pub fn rate_limiter(limit: &RateLimitConfig) -> Option<ApiRateLimit> {
    GovernorConfigBuilder::default()
        .period(limit.replenish_interval())
        .burst_size(limit.max_requests)
        .finish()
}

/// Full route table: `/api` behind rate limiting and CORS, the open routes,
/// and the JSON 404 fallback.
pub fn configure(
    allowed_origins: Vec<String>,
    rate_limit: ApiRateLimit,
) -> impl Fn(&mut web::ServiceConfig) + Clone + Send + 'static {
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(
            routes::api_scope()
                .wrap(Governor::new(&rate_limit))
                .wrap(build_cors(&allowed_origins)),
        );
        routes::configure(cfg);
        cfg.default_service(web::to(routes::not_found));
    }
}
