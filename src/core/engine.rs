use crate::core::seasonal::apply_seasonal_normalization;
use crate::core::series::MonthlySeriesBuilder;
use crate::core::{ConfigProvider, RemoteSensing};
use crate::domain::model::{AreaOfInterest, NdviSeries, SpectralIndex, TileLayerConfig, ViewMode};
use crate::utils::error::{GatewayError, Result};
use chrono::Datelike;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NdviQuery {
    pub aoi: AreaOfInterest,
    pub start_year: i32,
    /// 未指定時為今年
    pub end_year: Option<i32>,
    pub index: SpectralIndex,
}

/// 串接請求檢查、遠端查詢與本地彙整
#[derive(Clone)]
pub struct AnalysisEngine {
    remote: Arc<dyn RemoteSensing>,
    config: Arc<dyn ConfigProvider>,
}

impl AnalysisEngine {
    pub fn new(remote: Arc<dyn RemoteSensing>, config: Arc<dyn ConfigProvider>) -> Self {
        Self { remote, config }
    }

    pub fn remote_initialized(&self) -> bool {
        self.remote.is_initialized()
    }

    pub async fn compute_series(&self, query: NdviQuery) -> Result<NdviSeries> {
        self.check_radius(&query.aoi)?;
        let current_year = chrono::Utc::now().year();
        let end_year = query.end_year.unwrap_or(current_year);
        self.check_years(query.start_year, end_year, current_year)?;

        tracing::info!(
            "🛰️ Computing {} series at ({:.4}, {:.4}) r={}km for {}..={}",
            query.index.band_name(),
            query.aoi.latitude(),
            query.aoi.longitude(),
            query.aoi.radius_km(),
            query.start_year,
            end_year
        );

        let threshold = self.config.cloud_threshold_percent();
        let builder = MonthlySeriesBuilder::new(self.config.concurrent_requests());
        let remote = &self.remote;
        let aoi = &query.aoi;
        let index = query.index;

        let mut series = builder
            .build(query.start_year, end_year, move |month| {
                remote.median_index_for_month(aoi, index, month, threshold)
            })
            .await?;

        apply_seasonal_normalization(&mut series);
        Ok(series)
    }

    pub async fn tile_layer(&self, aoi: AreaOfInterest, view: ViewMode) -> Result<TileLayerConfig> {
        self.check_radius(&aoi)?;
        tracing::info!(
            "🗺️ Generating {} tiles at ({:.4}, {:.4}) r={}km",
            view,
            aoi.latitude(),
            aoi.longitude(),
            aoi.radius_km()
        );

        self.remote
            .tile_layer_for_recent_composite(
                &aoi,
                view,
                self.config.lookback_days(),
                self.config.cloud_threshold_percent(),
            )
            .await
    }

    fn check_radius(&self, aoi: &AreaOfInterest) -> Result<()> {
        let max = self.config.max_radius_km();
        if aoi.radius_km() > max {
            return Err(GatewayError::validation(
                "radiusKm",
                format!("{} exceeds the maximum of {} km", aoi.radius_km(), max),
            ));
        }
        Ok(())
    }

    fn check_years(&self, start_year: i32, end_year: i32, current_year: i32) -> Result<()> {
        let min_year = self.config.min_year();
        if start_year < min_year {
            return Err(GatewayError::validation(
                "startYear",
                format!("{} is before the first supported year {}", start_year, min_year),
            ));
        }
        if end_year > current_year {
            return Err(GatewayError::validation(
                "endYear",
                format!("{} is in the future", end_year),
            ));
        }
        if start_year > end_year {
            return Err(GatewayError::validation(
                "startYear",
                format!("{} is after endYear {}", start_year, end_year),
            ));
        }
        let span = end_year - start_year + 1;
        if span > self.config.max_year_span() {
            return Err(GatewayError::validation(
                "endYear",
                format!(
                    "range of {} years exceeds the maximum of {}",
                    span,
                    self.config.max_year_span()
                ),
            ));
        }
        Ok(())
    }
}
