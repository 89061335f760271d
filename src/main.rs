use contentful_lambci_relay::api;
use contentful_lambci_relay::config::{DEFAULT_CONFIG_PATH, RelayConfig};
use contentful_lambci_relay::logging::{FileLogger, setup_logging};
use contentful_lambci_relay::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config_path = PathBuf::from(
        std::env::var("RELAY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
    );

    let config = match RelayConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let file_logger = config.log_dir.clone().map(FileLogger::new);
    let _log_guard = match setup_logging(file_logger.as_ref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up file logging: {}", e);
            std::process::exit(1);
        }
    };

    let bind_address = config.bind_address.clone();
    let state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!("Relaying to {}", state.lambci.webhook_url());
    info!("Using GitHub API at {}", state.config.github.api_url);
    let app = api::router(state);

    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", bind_address, e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", bind_address);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
