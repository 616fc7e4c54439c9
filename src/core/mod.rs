pub mod engine;
pub mod seasonal;
pub mod series;

pub use crate::domain::model::{
    AreaOfInterest, MonthlyNdviPoint, NdviSeries, SpectralIndex, TileLayerConfig, ViewMode,
    YearMonth,
};
pub use crate::domain::ports::{ConfigProvider, RemoteSensing};
pub use crate::utils::error::Result;
