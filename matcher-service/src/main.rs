use std::sync::Arc;

use matcher::{GeminiClient, ModelConfig, PromptResponder};
use matcher_service::create_app;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing; `LOG_FORMAT=pretty` for development, JSON otherwise
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "matcher_service=debug,matcher=debug,tower_http=debug".into());

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // The model client is built once here and shared by every request
    let config = match ModelConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let options = config.options;
    let client = GeminiClient::new(config)?;
    let responder = PromptResponder::new(Arc::new(client)).with_options(options);
    info!(model = responder.model_name(), "Model client initialised");

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);

    let app = create_app(responder);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    let addr = listener.local_addr()?;

    info!("Matcher starting on {}", addr);
    info!("Filter options: GET http://{}/options", addr);
    info!("Searches: POST http://{}/search/{{media,books,custom}}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
