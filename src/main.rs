use anyhow::Context;
use clap::Parser;
use ndvi_gateway::adapters::earth_engine::EarthEngineClient;
use ndvi_gateway::core::RemoteSensing;
use ndvi_gateway::utils::{logger, validation::Validate};
use ndvi_gateway::{create_router, AnalysisEngine, AppState, CachedRemote, ServiceConfig};
use std::sync::Arc;

const SERVICE_NAME: &str = "ndvi-gateway";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::parse();

    // 初始化日誌
    logger::init_logger(config.log_format, config.verbose);

    tracing::info!("Starting {} v{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    if config.verbose {
        tracing::debug!("Service config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 憑證缺失時仍啟動，/health 會回報未初始化
    let credentials = match config.credential_source().resolve() {
        Ok(credentials) => {
            tracing::info!("✅ Earth Engine credentials loaded for project {}", credentials.project);
            Some(credentials)
        }
        Err(e) => {
            tracing::warn!("🔶 Earth Engine not initialized: {}", e);
            None
        }
    };

    let client = EarthEngineClient::new(config.earth_engine_settings(), credentials)
        .context("failed to create Earth Engine client")?;

    let remote: Arc<dyn RemoteSensing> = match config.cache_ttl() {
        Some(ttl) => {
            tracing::info!("💾 Monthly result cache enabled (ttl {:?})", ttl);
            Arc::new(CachedRemote::new(client, ttl))
        }
        None => Arc::new(client),
    };

    let bind_address = config.bind_address();
    let engine = AnalysisEngine::new(remote, Arc::new(config));
    let app = create_router(AppState::new(engine, SERVICE_NAME));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!("🚀 Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Shutdown signal received");
}
