use order_packer::api;
use order_packer::config::AppConfig;
use order_packer::service::PackagingService;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "order_packer=info,tower_http=info";

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let service = PackagingService::new(app_config.catalog.build_catalog(), app_config.packing);

    info!("🚀 Order packing service starting...");
    if api::start_api_server(app_config.api, service).await.is_err() {
        std::process::exit(1);
    }
}
