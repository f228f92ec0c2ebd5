use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tara_backend::api::router;
use tara_backend::config::Config;
use tara_backend::db;
use tara_backend::oauth::OAuthHttpClient;
use tara_backend::services::HttpCourseGenerator;
use tara_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tara_backend=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;

    let exchange = OAuthHttpClient::new(config.oauth.clone(), config.oauth_http_timeout)?;
    let generator = HttpCourseGenerator::new(config.ai_api_base_url.clone(), config.ai_api_timeout)?;

    let addr = config.addr;
    let state = AppState::new(pool, config, Arc::new(exchange), Arc::new(generator));

    let app = router(state);

    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
