//! 單次月份查詢，用來檢查憑證與連線
use anyhow::Context;
use clap::Parser;
use ndvi_gateway::adapters::earth_engine::EarthEngineClient;
use ndvi_gateway::core::{AreaOfInterest, RemoteSensing, SpectralIndex, YearMonth};
use ndvi_gateway::utils::{logger, validation::Validate};
use ndvi_gateway::ServiceConfig;

#[derive(Debug, Parser)]
#[command(name = "ndvi-probe")]
#[command(about = "Query one monthly median index value from Earth Engine")]
struct ProbeArgs {
    #[arg(long, allow_hyphen_values = true)]
    latitude: f64,

    #[arg(long, allow_hyphen_values = true)]
    longitude: f64,

    #[arg(long, default_value_t = 5.0)]
    radius_km: f64,

    /// Month to query, formatted YYYY-MM
    #[arg(long)]
    month: YearMonth,

    #[arg(long, default_value = "ndvi", value_parser = parse_index)]
    index: SpectralIndex,

    #[command(flatten)]
    service: ServiceConfig,
}

fn parse_index(raw: &str) -> Result<SpectralIndex, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_lowercase()))
        .map_err(|_| format!("unknown index '{}', expected ndvi, ndwi or ndmi", raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ProbeArgs::parse();
    logger::init_logger(args.service.log_format, args.service.verbose);
    args.service.validate()?;

    let credentials = args
        .service
        .credential_source()
        .resolve()
        .context("Earth Engine credentials are not usable")?;
    tracing::info!("🔑 Project: {}", credentials.project);

    let client = EarthEngineClient::new(args.service.earth_engine_settings(), Some(credentials))?;
    let aoi = AreaOfInterest::new(args.latitude, args.longitude, args.radius_km)?;

    println!("📡 Querying {} for {} ...", args.index.band_name(), args.month);
    let value = client
        .median_index_for_month(
            &aoi,
            args.index,
            args.month,
            args.service.cloud_threshold_percent,
        )
        .await?;

    match value {
        Some(v) => println!("✅ {} {} = {:.4}", args.index.band_name(), args.month, v),
        None => println!("📭 No usable imagery for {}", args.month),
    }
    Ok(())
}
