use crate::utils::error::{GatewayError, Result};
use crate::utils::validation::{check_finite, check_request_range};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 以點為圓心、指定半徑的圓形區域
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaOfInterest {
    latitude: f64,
    longitude: f64,
    radius_km: f64,
}

impl AreaOfInterest {
    pub fn new(latitude: f64, longitude: f64, radius_km: f64) -> Result<Self> {
        check_finite("latitude", latitude)?;
        check_finite("longitude", longitude)?;
        check_finite("radiusKm", radius_km)?;
        check_request_range("latitude", latitude, -90.0, 90.0)?;
        check_request_range("longitude", longitude, -180.0, 180.0)?;
        if radius_km <= 0.0 {
            return Err(GatewayError::validation("radiusKm", "must be greater than 0"));
        }

        Ok(Self {
            latitude,
            longitude,
            radius_km,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_km * 1000.0
    }
}

/// 日曆月份，依時間先後排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(GatewayError::validation(
                "month",
                format!("{} is not a calendar month", month),
            ));
        }
        // 讓 first_day() 永遠有效
        if NaiveDate::from_ymd_opt(year, month, 1).is_none()
            || NaiveDate::from_ymd_opt(year + 1, 1, 1).is_none()
        {
            return Err(GatewayError::validation(
                "year",
                format!("{} is outside the supported calendar", year),
            ));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn next(&self) -> YearMonth {
        if self.month == 12 {
            YearMonth {
                year: self.year + 1,
                month: 1,
            }
        } else {
            YearMonth {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// 半開區間 [本月1日, 下月1日)
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.first_day(), self.next().first_day())
    }

    pub fn of_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// 依年份再依月份 (1→12) 列出 [start_year, end_year] 內所有月份
pub fn months_in_years(start_year: i32, end_year: i32) -> Vec<YearMonth> {
    (start_year..=end_year)
        .flat_map(|year| (1..=12).map(move |month| YearMonth { year, month }))
        .collect()
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| GatewayError::validation("month", format!("'{}' is not YYYY-MM", s)))?;
        let year: i32 = year
            .parse()
            .map_err(|_| GatewayError::validation("month", format!("'{}' is not YYYY-MM", s)))?;
        let month: u32 = month
            .parse()
            .map_err(|_| GatewayError::validation("month", format!("'{}' is not YYYY-MM", s)))?;
        YearMonth::new(year, month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyNdviPoint {
    pub month: YearMonth,
    pub ndvi: f64,
    pub normalized: Option<f64>,
}

impl MonthlyNdviPoint {
    pub fn new(month: YearMonth, ndvi: f64) -> Self {
        Self {
            month,
            ndvi,
            normalized: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub baseline: f64,
    pub current: f64,
    pub change: f64,
    pub loss_percent: f64,
}

/// 依時間排序、月份不重複的月度指數序列，至少一筆
#[derive(Debug, Clone, PartialEq)]
pub struct NdviSeries {
    points: Vec<MonthlyNdviPoint>,
}

impl NdviSeries {
    pub fn new(points: Vec<MonthlyNdviPoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(GatewayError::NoDataError);
        }
        debug_assert!(points.windows(2).all(|w| w[0].month < w[1].month));
        Ok(Self { points })
    }

    pub fn points(&self) -> &[MonthlyNdviPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<MonthlyNdviPoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn baseline(&self) -> f64 {
        self.points[0].ndvi
    }

    pub fn current(&self) -> f64 {
        self.points[self.points.len() - 1].ndvi
    }

    pub fn change(&self) -> f64 {
        self.current() - self.baseline()
    }

    /// baseline <= 0 時定義為 0
    pub fn loss_percent(&self) -> f64 {
        let baseline = self.baseline();
        if baseline > 0.0 {
            (self.change() / baseline * 100.0).abs()
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> SeriesSummary {
        SeriesSummary {
            baseline: self.baseline(),
            current: self.current(),
            change: self.change(),
            loss_percent: self.loss_percent(),
        }
    }

    /// 輸出用：各點數值四捨五入，摘要由四捨五入後的數值推得
    pub fn rounded(&self, places: i32) -> NdviSeries {
        let points = self
            .points
            .iter()
            .map(|p| MonthlyNdviPoint {
                month: p.month,
                ndvi: round_to(p.ndvi, places),
                normalized: p.normalized.map(|v| round_to(v, places)),
            })
            .collect();
        NdviSeries { points }
    }

    pub fn attach_normalized(&mut self, normalized: &[f64]) {
        for (point, value) in self.points.iter_mut().zip(normalized) {
            point.normalized = Some(*value);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileLayerConfig {
    pub map_id: String,
    pub token: String,
    pub url_template: String,
}

/// 遠端計算的正規化差值指數
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectralIndex {
    #[default]
    Ndvi,
    Ndwi,
    Ndmi,
}

impl SpectralIndex {
    /// (第一波段, 第二波段)，指數 = (a - b) / (a + b)
    pub fn bands(&self) -> (&'static str, &'static str) {
        match self {
            SpectralIndex::Ndvi => ("B8", "B4"),
            SpectralIndex::Ndwi => ("B3", "B8"),
            SpectralIndex::Ndmi => ("B8", "B11"),
        }
    }

    pub fn band_name(&self) -> &'static str {
        match self {
            SpectralIndex::Ndvi => "NDVI",
            SpectralIndex::Ndwi => "NDWI",
            SpectralIndex::Ndmi => "NDMI",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    TrueColor,
    FalseColor,
    Ndvi,
}

impl ViewMode {
    pub fn stretch(&self) -> (f64, f64) {
        match self {
            ViewMode::TrueColor | ViewMode::FalseColor => (0.0, 0.3),
            ViewMode::Ndvi => (-1.0, 1.0),
        }
    }

    /// Ndvi 模式回傳 None，改由指數計算
    pub fn bands(&self) -> Option<[&'static str; 3]> {
        match self {
            ViewMode::TrueColor => Some(["B4", "B3", "B2"]),
            ViewMode::FalseColor => Some(["B8", "B4", "B3"]),
            ViewMode::Ndvi => None,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewMode::TrueColor => "true-color",
            ViewMode::FalseColor => "false-color",
            ViewMode::Ndvi => "ndvi",
        };
        f.write_str(name)
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
