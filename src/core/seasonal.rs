use crate::domain::model::{MonthlyNdviPoint, NdviSeries};

/// 計算月平均時每個日曆月最多採用的最近年數
pub const SEASONAL_WINDOW_YEARS: usize = 5;

/// 季節性正規化：以各日曆月最近五年的平均值扣除季節循環，再加回整體平均。
///
/// 回傳值與輸入一一對應、順序相同，保留完整精度（輸出時再四捨五入）。
pub fn seasonal_normalize(points: &[MonthlyNdviPoint]) -> Vec<f64> {
    if points.is_empty() {
        return Vec::new();
    }

    let mut groups: [Vec<f64>; 12] = Default::default();
    for point in points {
        groups[month_slot(point)].push(point.ndvi);
    }

    let monthly_means: Vec<Option<f64>> = groups
        .iter()
        .map(|values| {
            let recent = &values[values.len().saturating_sub(SEASONAL_WINDOW_YEARS)..];
            mean(recent)
        })
        .collect();

    let all: Vec<f64> = points.iter().map(|p| p.ndvi).collect();
    let overall_mean = mean(&all).unwrap_or(0.0);

    points
        .iter()
        .map(|point| {
            let monthly_mean = monthly_means[month_slot(point)].unwrap_or(point.ndvi);
            point.ndvi - monthly_mean + overall_mean
        })
        .collect()
}

/// 將正規化結果寫回序列
pub fn apply_seasonal_normalization(series: &mut NdviSeries) {
    let normalized = seasonal_normalize(series.points());
    series.attach_normalized(&normalized);
}

fn month_slot(point: &MonthlyNdviPoint) -> usize {
    (point.month.month() - 1) as usize
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
