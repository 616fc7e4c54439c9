use crate::adapters::earth_engine::client::DEFAULT_API_BASE;
use crate::adapters::earth_engine::expr::SENTINEL2_SR;
use crate::adapters::earth_engine::{CredentialSource, EarthEngineSettings};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_url, Validate,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// 所有設定都可由命令列參數或環境變數提供
#[derive(Debug, Clone, Parser)]
#[command(name = "ndvi-gateway")]
#[command(about = "HTTP gateway for remote-sensing vegetation index queries")]
pub struct ServiceConfig {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Path to the service account key JSON
    #[arg(long, env = "GEE_SERVICE_ACCOUNT_KEY")]
    pub service_account_key: Option<PathBuf>,

    #[arg(long, env = "GEE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[arg(long, env = "GEE_PROJECT")]
    pub project: Option<String>,

    #[arg(long, env = "GEE_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    #[arg(long, env = "GEE_TILE_BASE", default_value = DEFAULT_API_BASE)]
    pub tile_base: String,

    #[arg(long, env = "GEE_COLLECTION", default_value = SENTINEL2_SR)]
    pub collection: String,

    #[arg(long, env = "CLOUD_THRESHOLD_PERCENT", default_value_t = 20.0)]
    pub cloud_threshold_percent: f64,

    #[arg(long, env = "LOOKBACK_DAYS", default_value_t = 90)]
    pub lookback_days: u32,

    /// Concurrent per-month remote calls (1 = sequential)
    #[arg(long, env = "CONCURRENT_REQUESTS", default_value_t = 4)]
    pub concurrent_requests: usize,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 120)]
    pub request_timeout_secs: u64,

    /// Monthly result cache lifetime, 0 disables caching
    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = 0)]
    pub cache_ttl_secs: u64,

    #[arg(long, env = "MAX_RADIUS_KM", default_value_t = 50.0)]
    pub max_radius_km: f64,

    #[arg(long, env = "MIN_YEAR", default_value_t = 2015)]
    pub min_year: i32,

    #[arg(long, env = "MAX_YEAR_SPAN", default_value_t = 15)]
    pub max_year_span: i32,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ServiceConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn credential_source(&self) -> CredentialSource {
        CredentialSource {
            key_path: self.service_account_key.clone(),
            access_token: self.access_token.clone(),
            project: self.project.clone(),
        }
    }

    pub fn earth_engine_settings(&self) -> EarthEngineSettings {
        EarthEngineSettings {
            api_base: self.api_base.clone(),
            tile_base: self.tile_base.clone(),
            collection_id: self.collection.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}

impl ConfigProvider for ServiceConfig {
    fn cloud_threshold_percent(&self) -> f64 {
        self.cloud_threshold_percent
    }

    fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    fn max_radius_km(&self) -> f64 {
        self.max_radius_km
    }

    fn min_year(&self) -> i32 {
        self.min_year
    }

    fn max_year_span(&self) -> i32 {
        self.max_year_span
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api_base", &self.api_base)?;
        validate_url("tile_base", &self.tile_base)?;
        validate_non_empty_string("collection", &self.collection)?;

        validate_range("cloud_threshold_percent", self.cloud_threshold_percent, 0.0, 100.0)?;
        validate_range("lookback_days", self.lookback_days, 1, 365)?;

        validate_range("concurrent_requests", self.concurrent_requests, 1, 32)?;

        validate_range("request_timeout_secs", self.request_timeout_secs, 1, 3600)?;
        validate_range("max_radius_km", self.max_radius_km, 0.001, 500.0)?;
        validate_range("min_year", self.min_year, 1984, 2100)?;
        validate_range("max_year_span", self.max_year_span, 1, 50)?;

        tracing::debug!("✅ Service configuration validation passed");
        Ok(())
    }
}
