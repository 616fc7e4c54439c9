use crate::domain::model::{AreaOfInterest, SpectralIndex, TileLayerConfig, ViewMode, YearMonth};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 遠端遙測平台的黑盒介面
#[async_trait]
pub trait RemoteSensing: Send + Sync {
    /// 該月份 AOI 內指數的中位數合成平均值；沒有符合條件的影像時回傳 None
    async fn median_index_for_month(
        &self,
        aoi: &AreaOfInterest,
        index: SpectralIndex,
        month: YearMonth,
        cloud_threshold_percent: f64,
    ) -> Result<Option<f64>>;

    async fn tile_layer_for_recent_composite(
        &self,
        aoi: &AreaOfInterest,
        view: ViewMode,
        lookback_days: u32,
        cloud_threshold_percent: f64,
    ) -> Result<TileLayerConfig>;

    fn is_initialized(&self) -> bool;
}

pub trait ConfigProvider: Send + Sync {
    fn cloud_threshold_percent(&self) -> f64;
    fn lookback_days(&self) -> u32;
    fn concurrent_requests(&self) -> usize;
    fn max_radius_km(&self) -> f64;
    fn min_year(&self) -> i32;
    fn max_year_span(&self) -> i32;
}
