//! Narrate Server - HTTP API for long-form text to audiobook narration

use narrate_core::{OpenAiSynthesizer, Synthesizer};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod error;
mod settings;
mod state;

use settings::Settings;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "narrate_server=debug,narrate_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Narrate Server");

    let settings = Settings::load()?;
    info!(
        "Speech endpoint: {}/audio/speech (model {}, {} calls/min)",
        settings.narrate.api_base_url, settings.narrate.model, settings.narrate.rate_limit_per_minute
    );

    let synthesizer: Arc<dyn Synthesizer> =
        Arc::new(OpenAiSynthesizer::from_config(&settings.narrate));
    let state = AppState::new(settings.narrate.clone(), synthesizer)?;

    let app = api::create_router(state, &settings.server);

    let addr = settings.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
