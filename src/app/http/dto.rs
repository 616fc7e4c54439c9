//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};

use crate::core::engine::NdviQuery;
use crate::core::{AreaOfInterest, NdviSeries, SpectralIndex, TileLayerConfig, ViewMode};
use crate::domain::model::round_to;
use crate::utils::error::Result;

/// POST /api/compute-ndvi
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeNdviRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub start_year: i32,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub index: SpectralIndex,
}

impl ComputeNdviRequest {
    pub fn into_query(self) -> Result<NdviQuery> {
        Ok(NdviQuery {
            aoi: AreaOfInterest::new(self.latitude, self.longitude, self.radius_km)?,
            start_year: self.start_year,
            end_year: self.end_year,
            index: self.index,
        })
    }
}

/// POST /api/generate-tiles
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTilesRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub view_type: ViewMode,
}

impl GenerateTilesRequest {
    pub fn area_of_interest(&self) -> Result<AreaOfInterest> {
        AreaOfInterest::new(self.latitude, self.longitude, self.radius_km)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyNdviDto {
    pub month: String,
    pub ndvi: f64,
    pub normalized: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdviResponse {
    pub baseline_ndvi: f64,
    pub current_ndvi: f64,
    pub ndvi_change: f64,
    pub vegetation_loss_percent: f64,
    pub monthly_ndvi: Vec<MonthlyNdviDto>,
}

impl From<&NdviSeries> for NdviResponse {
    fn from(series: &NdviSeries) -> Self {
        // 客戶端看到的 change 必須等於 current - baseline
        let rounded = series.rounded(3);
        let summary = rounded.summary();
        Self {
            baseline_ndvi: summary.baseline,
            current_ndvi: summary.current,
            ndvi_change: round_to(summary.change, 3),
            vegetation_loss_percent: round_to(summary.loss_percent, 1),
            monthly_ndvi: rounded
                .points()
                .iter()
                .map(|p| MonthlyNdviDto {
                    month: p.month.to_string(),
                    ndvi: p.ndvi,
                    normalized: p.normalized,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayerResponse {
    pub mapid: String,
    pub token: String,
    #[serde(rename = "urlTemplate")]
    pub url_template: String,
}

impl From<TileLayerConfig> for TileLayerResponse {
    fn from(layer: TileLayerConfig) -> Self {
        Self {
            mapid: layer.map_id,
            token: layer.token,
            url_template: layer.url_template,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub gee_initialized: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
