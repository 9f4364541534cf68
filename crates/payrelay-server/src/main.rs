use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payrelay_server::{app, config::RelayConfig, metrics::register_metrics, state::AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };
    tracing::debug!(?config, "configuration loaded");

    register_metrics();

    let port = config.port;
    let allowed_origins = config.allowed_origins.clone();
    let rate_limit = config.rate_limit;

    tracing::info!("Starting payrelay-server on port {}", port);
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Health check: http://localhost:{}/api/health", port);
    tracing::info!(
        "Rate limit: burst of {} requests per client, one more every {:?}",
        rate_limit.max_requests,
        rate_limit.replenish_interval()
    );

    let state = AppState::new(config).map_err(std::io::Error::other)?;
    let state_data = web::Data::new(state);

    let rate_limiter = app::rate_limiter(&rate_limit)
        .ok_or_else(|| std::io::Error::other("invalid rate limiter configuration"))?;
    let configure_app = app::configure(allowed_origins, rate_limiter);

    HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .app_data(web::PayloadConfig::new(64 * 1024))
            .wrap(Logger::default())
            .configure(configure_app.clone())
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    tracing::info!("payrelay-server shut down");
    Ok(())
}
