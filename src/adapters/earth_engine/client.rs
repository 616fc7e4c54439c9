use super::credentials::Credentials;
use super::expr::{self, Expr};
use crate::core::{AreaOfInterest, RemoteSensing, SpectralIndex, TileLayerConfig, ViewMode, YearMonth};
use crate::utils::error::{GatewayError, RemoteErrorKind, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://earthengine.googleapis.com";

#[derive(Debug, Clone)]
pub struct EarthEngineSettings {
    pub api_base: String,
    pub tile_base: String,
    pub collection_id: String,
    pub request_timeout: Duration,
}

impl Default for EarthEngineSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            tile_base: DEFAULT_API_BASE.to_string(),
            collection_id: expr::SENTINEL2_SR.to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MapResponse {
    name: String,
    #[serde(default)]
    token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Earth Engine REST API 用戶端，啟動時建立後注入各請求處理器
pub struct EarthEngineClient {
    http: Client,
    settings: EarthEngineSettings,
    credentials: Option<Credentials>,
}

impl EarthEngineClient {
    pub fn new(settings: EarthEngineSettings, credentials: Option<Credentials>) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| GatewayError::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        if credentials.is_none() {
            tracing::warn!("⚠️ Earth Engine credentials unavailable, remote calls will fail");
        }

        Ok(Self {
            http,
            settings,
            credentials,
        })
    }

    fn credentials(&self) -> Result<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            GatewayError::remote(RemoteErrorKind::NotInitialized, "client has no credentials")
        })
    }

    async fn post(&self, resource: &str, body: Value) -> Result<Value> {
        let credentials = self.credentials()?;
        let url = format!(
            "{}/v1/projects/{}/{}",
            self.settings.api_base.trim_end_matches('/'),
            credentials.project,
            resource
        );

        tracing::debug!("📡 POST {}", url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&credentials.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("📡 Remote response status: {}", status);

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            tracing::error!("❌ Remote platform returned {}: {}", status, detail);
            return Err(GatewayError::remote(
                RemoteErrorKind::from_status(status.as_u16()),
                format!("{}: {}", status, detail),
            ));
        }

        Ok(response.json().await?)
    }

    /// `value:compute`，回傳運算結果
    pub async fn compute_value(&self, expression: &Expr) -> Result<Value> {
        let body = json!({ "expression": expression.to_request() });
        let mut response = self.post("value:compute", body).await?;

        match response.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(malformed("value:compute response has no 'result'")),
        }
    }

    pub async fn create_map(&self, expression: &Expr, view: ViewMode) -> Result<TileLayerConfig> {
        let (min, max) = view.stretch();
        let body = json!({
            "expression": expression.to_request(),
            "fileFormat": "PNG",
            "visualizationOptions": {
                "ranges": [{ "min": min, "max": max }],
            },
        });

        let response = self.post("maps", body).await?;
        let map: MapResponse = serde_json::from_value(response)
            .map_err(|e| malformed(format!("maps response: {}", e)))?;

        let map_id = map
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| malformed(format!("map name '{}' has no id", map.name)))?
            .to_string();

        let url_template = format!(
            "{}/v1alpha/projects/earthengine-legacy/maps/{}/tiles/{{z}}/{{x}}/{{y}}?token={}",
            self.settings.tile_base.trim_end_matches('/'),
            map_id,
            map.token
        );

        Ok(TileLayerConfig {
            map_id,
            token: map.token,
            url_template,
        })
    }
}

fn malformed(detail: impl Into<String>) -> GatewayError {
    GatewayError::remote(RemoteErrorKind::MalformedResponse, detail)
}

#[async_trait]
impl RemoteSensing for EarthEngineClient {
    async fn median_index_for_month(
        &self,
        aoi: &AreaOfInterest,
        index: SpectralIndex,
        month: YearMonth,
        cloud_threshold_percent: f64,
    ) -> Result<Option<f64>> {
        let (start, end) = month.date_range();
        let expression = expr::median_index_value(
            &self.settings.collection_id,
            aoi,
            index,
            start,
            end,
            cloud_threshold_percent,
        );

        match self.compute_value(&expression).await? {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_f64()),
            other => Err(malformed(format!(
                "expected a number for {} {}, got {}",
                index.band_name(),
                month,
                other
            ))),
        }
    }

    async fn tile_layer_for_recent_composite(
        &self,
        aoi: &AreaOfInterest,
        view: ViewMode,
        lookback_days: u32,
        cloud_threshold_percent: f64,
    ) -> Result<TileLayerConfig> {
        let end = chrono::Utc::now().date_naive();
        let start = end - chrono::Duration::days(i64::from(lookback_days));

        let collection = expr::filtered_collection(
            &self.settings.collection_id,
            aoi,
            start,
            end,
            cloud_threshold_percent,
        );
        let size = self.compute_value(&expr::collection_size(collection)).await?;
        if size.as_u64().unwrap_or(0) == 0 {
            tracing::warn!("📭 No imagery between {} and {}", start, end);
            return Err(GatewayError::NoImageryError);
        }

        let image = expr::recent_view_image(
            &self.settings.collection_id,
            aoi,
            view,
            start,
            end,
            cloud_threshold_percent,
        );
        self.create_map(&image, view).await
    }

    fn is_initialized(&self) -> bool {
        self.credentials.is_some()
    }
}
