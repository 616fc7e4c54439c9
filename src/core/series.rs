use crate::domain::model::{months_in_years, MonthlyNdviPoint, NdviSeries, YearMonth};
use crate::utils::error::{GatewayError, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;

/// 逐月向遠端查詢並組成月度序列
#[derive(Debug, Clone)]
pub struct MonthlySeriesBuilder {
    concurrent_requests: usize,
}

impl MonthlySeriesBuilder {
    pub fn new(concurrent_requests: usize) -> Self {
        Self {
            concurrent_requests: concurrent_requests.max(1),
        }
    }

    /// `fetch` 回傳該月的中位數值，None 表示該月無資料（略過，不記為 0）。
    /// 任一次查詢失敗即中止；全部月份皆無資料時回傳 `NoDataError`。
    pub async fn build<F, Fut>(&self, start_year: i32, end_year: i32, fetch: F) -> Result<NdviSeries>
    where
        F: Fn(YearMonth) -> Fut,
        Fut: Future<Output = Result<Option<f64>>>,
    {
        if start_year > end_year {
            return Err(GatewayError::validation(
                "startYear",
                format!("{} is after endYear {}", start_year, end_year),
            ));
        }

        let months = months_in_years(start_year, end_year);
        tracing::debug!(
            "📡 Querying {} months ({}..={}) with concurrency {}",
            months.len(),
            start_year,
            end_year,
            self.concurrent_requests
        );

        // buffered 依輸入順序回傳結果，完成順序不影響時間排序
        let results: Vec<(YearMonth, Option<f64>)> = stream::iter(months)
            .map(|month| {
                let pending = fetch(month);
                async move { pending.await.map(|value| (month, value)) }
            })
            .buffered(self.concurrent_requests)
            .try_collect()
            .await?;

        let points: Vec<MonthlyNdviPoint> = results
            .into_iter()
            .filter_map(|(month, value)| match value {
                Some(v) if v.is_finite() => Some(MonthlyNdviPoint::new(month, v)),
                Some(v) => {
                    tracing::warn!("🔶 Ignoring non-finite value {} for {}", v, month);
                    None
                }
                None => {
                    tracing::debug!("📭 No imagery for {}", month);
                    None
                }
            })
            .collect();

        tracing::info!("📈 Built monthly series with {} points", points.len());
        NdviSeries::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::RemoteErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_skips_empty_months() {
        let builder = MonthlySeriesBuilder::new(1);
        let series = builder
            .build(2020, 2020, |month| async move {
                if month.month() % 2 == 0 {
                    Ok(Some(0.5))
                } else {
                    Ok(None)
                }
            })
            .await
            .unwrap();

        assert_eq!(series.len(), 6);
        assert_eq!(series.points()[0].month.to_string(), "2020-02");
        assert_eq!(series.points()[5].month.to_string(), "2020-12");
        assert!(series.points().iter().all(|p| p.ndvi == 0.5));
    }

    #[tokio::test]
    async fn test_all_empty_is_no_data() {
        let builder = MonthlySeriesBuilder::new(4);
        let result = builder.build(2019, 2020, |_| async { Ok(None) }).await;
        assert!(matches!(result, Err(GatewayError::NoDataError)));
    }

    #[tokio::test]
    async fn test_point_count_bounded_and_strictly_increasing() {
        for (start, end) in [(2018, 2018), (2017, 2020), (2016, 2022)] {
            let builder = MonthlySeriesBuilder::new(3);
            let series = builder
                .build(start, end, |month| async move {
                    Ok(Some(month.month() as f64 / 100.0))
                })
                .await
                .unwrap();

            let max_points = ((end - start + 1) * 12) as usize;
            assert_eq!(series.len(), max_points);
            assert!(series
                .points()
                .windows(2)
                .all(|w| w[0].month < w[1].month));
        }
    }

    #[tokio::test]
    async fn test_out_of_order_completion_keeps_chronology() {
        let builder = MonthlySeriesBuilder::new(12);
        let series = builder
            .build(2021, 2021, |month| async move {
                // 較早的月份較晚完成
                tokio::time::sleep(Duration::from_millis((13 - month.month() as u64) * 5)).await;
                Ok(Some(month.month() as f64 / 10.0))
            })
            .await
            .unwrap();

        let months: Vec<String> = series.points().iter().map(|p| p.month.to_string()).collect();
        assert_eq!(months.first().unwrap(), "2021-01");
        assert_eq!(months.last().unwrap(), "2021-12");
        assert!(series.points().windows(2).all(|w| w[0].month < w[1].month));
    }

    #[tokio::test]
    async fn test_first_failure_aborts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let builder = MonthlySeriesBuilder::new(1);
        let counter = calls.clone();
        let result = builder
            .build(2020, 2020, move |month| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if month.month() == 3 {
                        Err(GatewayError::remote(RemoteErrorKind::QuotaExceeded, "429"))
                    } else {
                        Ok(Some(0.3))
                    }
                }
            })
            .await;

        assert!(matches!(result, Err(GatewayError::RemoteError { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_inverted_years_rejected() {
        let builder = MonthlySeriesBuilder::new(1);
        let result = builder.build(2021, 2020, |_| async { Ok(Some(0.1)) }).await;
        assert!(matches!(result, Err(GatewayError::ValidationError { .. })));
    }

    #[tokio::test]
    async fn test_non_finite_values_skipped() {
        let builder = MonthlySeriesBuilder::new(2);
        let series = builder
            .build(2020, 2020, |month| async move {
                if month.month() == 1 {
                    Ok(Some(f64::NAN))
                } else {
                    Ok(Some(0.2))
                }
            })
            .await
            .unwrap();
        assert_eq!(series.len(), 11);
        assert_eq!(series.points()[0].month.to_string(), "2020-02");
    }
}
