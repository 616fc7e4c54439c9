use crate::core::{AreaOfInterest, RemoteSensing, SpectralIndex, TileLayerConfig, ViewMode, YearMonth};
use crate::utils::error::Result;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MonthKey {
    latitude: u64,
    longitude: u64,
    radius_km: u64,
    index: SpectralIndex,
    month: YearMonth,
    cloud_threshold: u64,
}

impl MonthKey {
    fn new(aoi: &AreaOfInterest, index: SpectralIndex, month: YearMonth, threshold: f64) -> Self {
        Self {
            latitude: aoi.latitude().to_bits(),
            longitude: aoi.longitude().to_bits(),
            radius_km: aoi.radius_km().to_bits(),
            index,
            month,
            cloud_threshold: threshold.to_bits(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    value: Option<f64>,
    stored_at: Instant,
}

/// 以 (AOI, 指數, 月份, 雲量門檻) 為鍵暫存月中位數結果，滿了淘汰最久未用的項目。
/// 錯誤不快取；圖磚 token 會過期，所以圖磚請求直接轉給內層。
pub struct CachedRemote<R> {
    inner: R,
    ttl: Duration,
    entries: Mutex<LruCache<MonthKey, CacheEntry>>,
}

impl<R: RemoteSensing> CachedRemote<R> {
    pub fn new(inner: R, ttl: Duration) -> Self {
        Self::with_capacity(inner, ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: R, ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lookup(&self, key: &MonthKey) -> Option<Option<f64>> {
        let mut entries = self.entries.lock();
        let cached = entries.get(key).copied();
        match cached {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.value),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    fn store(&self, key: MonthKey, value: Option<f64>) {
        self.entries.lock().put(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl<R: RemoteSensing> RemoteSensing for CachedRemote<R> {
    async fn median_index_for_month(
        &self,
        aoi: &AreaOfInterest,
        index: SpectralIndex,
        month: YearMonth,
        cloud_threshold_percent: f64,
    ) -> Result<Option<f64>> {
        let key = MonthKey::new(aoi, index, month, cloud_threshold_percent);
        if let Some(value) = self.lookup(&key) {
            tracing::debug!("💾 Cache hit for {} {}", index.band_name(), month);
            return Ok(value);
        }

        let value = self
            .inner
            .median_index_for_month(aoi, index, month, cloud_threshold_percent)
            .await?;
        self.store(key, value);
        Ok(value)
    }

    async fn tile_layer_for_recent_composite(
        &self,
        aoi: &AreaOfInterest,
        view: ViewMode,
        lookback_days: u32,
        cloud_threshold_percent: f64,
    ) -> Result<TileLayerConfig> {
        self.inner
            .tile_layer_for_recent_composite(aoi, view, lookback_days, cloud_threshold_percent)
            .await
    }

    fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::{GatewayError, RemoteErrorKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRemote {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingRemote {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl RemoteSensing for CountingRemote {
        async fn median_index_for_month(
            &self,
            _aoi: &AreaOfInterest,
            _index: SpectralIndex,
            month: YearMonth,
            _cloud_threshold_percent: f64,
        ) -> Result<Option<f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GatewayError::remote(RemoteErrorKind::Unavailable, "503"));
            }
            Ok(if month.month() == 2 { None } else { Some(0.6) })
        }

        async fn tile_layer_for_recent_composite(
            &self,
            _aoi: &AreaOfInterest,
            _view: ViewMode,
            _lookback_days: u32,
            _cloud_threshold_percent: f64,
        ) -> Result<TileLayerConfig> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TileLayerConfig {
                map_id: "m".to_string(),
                token: "t".to_string(),
                url_template: "u".to_string(),
            })
        }

        fn is_initialized(&self) -> bool {
            true
        }
    }

    fn aoi() -> AreaOfInterest {
        AreaOfInterest::new(1.0, 2.0, 3.0).unwrap()
    }

    #[tokio::test]
    async fn test_repeated_month_hits_cache() {
        let cache = CachedRemote::new(CountingRemote::new(false), Duration::from_secs(60));
        let jan = YearMonth::new(2020, 1).unwrap();
        let feb = YearMonth::new(2020, 2).unwrap();

        for _ in 0..3 {
            assert_eq!(
                cache.median_index_for_month(&aoi(), SpectralIndex::Ndvi, jan, 20.0).await.unwrap(),
                Some(0.6)
            );
            // 無資料的結果也會被快取
            assert_eq!(
                cache.median_index_for_month(&aoi(), SpectralIndex::Ndvi, feb, 20.0).await.unwrap(),
                None
            );
        }
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);

        // 不同門檻是不同的鍵
        cache.median_index_for_month(&aoi(), SpectralIndex::Ndvi, jan, 10.0).await.unwrap();
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_errors_not_cached() {
        let cache = CachedRemote::new(CountingRemote::new(true), Duration::from_secs(60));
        let jan = YearMonth::new(2020, 1).unwrap();

        assert!(cache.median_index_for_month(&aoi(), SpectralIndex::Ndvi, jan, 20.0).await.is_err());
        assert!(cache.median_index_for_month(&aoi(), SpectralIndex::Ndvi, jan, 20.0).await.is_err());
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_entries_refetched() {
        let cache = CachedRemote::new(CountingRemote::new(false), Duration::from_millis(10));
        let jan = YearMonth::new(2020, 1).unwrap();

        cache.median_index_for_month(&aoi(), SpectralIndex::Ndvi, jan, 20.0).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.median_index_for_month(&aoi(), SpectralIndex::Ndvi, jan, 20.0).await.unwrap();
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_full_cache_evicts_only_least_recent() {
        let cache =
            CachedRemote::with_capacity(CountingRemote::new(false), Duration::from_secs(3600), 3);
        let months: Vec<YearMonth> = (1..=4).map(|m| YearMonth::new(2020, m).unwrap()).collect();

        for month in &months[..3] {
            cache.median_index_for_month(&aoi(), SpectralIndex::Ndvi, *month, 20.0).await.unwrap();
        }
        // 一月最近被讀過，滿了之後應淘汰二月
        cache.median_index_for_month(&aoi(), SpectralIndex::Ndvi, months[0], 20.0).await.unwrap();
        cache.median_index_for_month(&aoi(), SpectralIndex::Ndvi, months[3], 20.0).await.unwrap();
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 4);

        for month in [months[0], months[2], months[3]] {
            cache.median_index_for_month(&aoi(), SpectralIndex::Ndvi, month, 20.0).await.unwrap();
        }
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 4);

        cache.median_index_for_month(&aoi(), SpectralIndex::Ndvi, months[1], 20.0).await.unwrap();
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_live_entries_survive_insert_past_capacity() {
        let capacity = 10_000;
        let cache = CachedRemote::with_capacity(
            CountingRemote::new(false),
            Duration::from_secs(3600),
            capacity,
        );
        for i in 0..=capacity {
            let aoi = AreaOfInterest::new(0.0, 0.0, 1.0 + i as f64 * 0.001).unwrap();
            let month = YearMonth::new(2020, 1).unwrap();
            cache.median_index_for_month(&aoi, SpectralIndex::Ndvi, month, 20.0).await.unwrap();
        }
        assert_eq!(cache.len(), capacity);
    }

    #[tokio::test]
    async fn test_tiles_pass_through() {
        let cache = CachedRemote::new(CountingRemote::new(false), Duration::from_secs(60));
        cache.tile_layer_for_recent_composite(&aoi(), ViewMode::Ndvi, 90, 20.0).await.unwrap();
        cache.tile_layer_for_recent_composite(&aoi(), ViewMode::Ndvi, 90, 20.0).await.unwrap();
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);
    }
}
