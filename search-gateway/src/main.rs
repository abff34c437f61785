use search_gateway::config::GatewayConfig;
use search_gateway::services::metrics::init_metrics;
use search_gateway::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let otlp_endpoint =
        std::env::var("OTLP_ENDPOINT").unwrap_or_else(|_| "http://tempo:4317".to_string());
    init_tracing("search-gateway", "info", &otlp_endpoint);

    init_metrics();

    let config = GatewayConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    tracing::info!(
        project_id = config.discovery.project_id.as_deref().unwrap_or("-"),
        engine_id = config.discovery.engine_id.as_deref().unwrap_or("-"),
        serving_config_id = config.discovery.serving_config_id.as_deref().unwrap_or("-"),
        "Loaded search gateway configuration"
    );

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await
}
