use crate::core::errors::ExchangeError;
use crate::core::types::MarketInfo;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Trading rules keyed by readable pair (`BTC/USDT`)
pub type MarketMap = HashMap<String, MarketInfo>;

/// Memoized exchange trading rules with single-flight loading
///
/// Owned by one connector and shared by its components. At most one fetch runs
/// at a time; callers that arrive while it runs wait for it and reuse its
/// outcome. Once populated the map is served from memory until `refresh`.
#[derive(Debug, Default)]
pub struct MarketCache {
    markets: RwLock<Option<Arc<MarketMap>>>,
    loading_lock: Mutex<()>,
    in_flight: AtomicBool,
    /// Completed load attempts, successful or not
    attempts: AtomicU64,
}

/// Clears the in-flight flag however the load ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl MarketCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents without triggering a fetch
    pub async fn snapshot(&self) -> Option<Arc<MarketMap>> {
        self.markets.read().await.clone()
    }

    pub async fn get(&self, readable_pair: &str) -> Option<MarketInfo> {
        self.markets
            .read()
            .await
            .as_ref()
            .and_then(|markets| markets.get(readable_pair).cloned())
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Return the cached markets, running `loader` only if nothing is cached
    /// and no other load finished while this caller waited.
    pub async fn get_or_load<F, Fut>(&self, loader: F) -> Result<Arc<MarketMap>, ExchangeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MarketMap, ExchangeError>>,
    {
        if let Some(markets) = self.snapshot().await {
            return Ok(markets);
        }

        let seen_attempts = self.attempts.load(Ordering::SeqCst);
        let _loading_guard = self.loading_lock.lock().await;

        if let Some(markets) = self.snapshot().await {
            debug!("Markets were loaded by a concurrent caller ({} pairs)", markets.len());
            return Ok(markets);
        }
        if self.attempts.load(Ordering::SeqCst) != seen_attempts {
            return Err(ExchangeError::MarketDataUnavailable(
                "concurrent market fetch failed".to_string(),
            ));
        }

        self.run_loader(loader).await
    }

    /// Fetch again and replace the cached map. A failed refresh keeps the old map.
    pub async fn refresh<F, Fut>(&self, loader: F) -> Result<Arc<MarketMap>, ExchangeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MarketMap, ExchangeError>>,
    {
        let _loading_guard = self.loading_lock.lock().await;
        self.run_loader(loader).await
    }

    async fn run_loader<F, Fut>(&self, loader: F) -> Result<Arc<MarketMap>, ExchangeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MarketMap, ExchangeError>>,
    {
        let _in_flight = InFlightGuard::set(&self.in_flight);
        let outcome = loader().await;
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let markets = outcome.map_err(|e| {
            warn!("Failed to load LBank markets: {}", e);
            ExchangeError::MarketDataUnavailable(e.to_string())
        })?;
        if markets.is_empty() {
            return Err(ExchangeError::MarketDataUnavailable(
                "exchange returned no markets".to_string(),
            ));
        }

        info!("Received info about {} markets on LBank exchange", markets.len());
        let markets = Arc::new(markets);
        *self.markets.write().await = Some(Arc::clone(&markets));
        Ok(markets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::lbank::conversions::to_exchange_format;
    use rust_decimal::Decimal;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn sample_markets() -> MarketMap {
        let pair = to_exchange_format("CXS/USDT").unwrap();
        let info = MarketInfo {
            pair: pair.clone(),
            base_decimals: 2,
            quote_decimals: 6,
            base_precision: Decimal::new(1, 2),
            quote_precision: Decimal::new(1, 6),
            base_min_amount: Decimal::ZERO,
            quote_min_amount: Decimal::ZERO,
        };
        HashMap::from([(pair.readable, info)])
    }

    #[tokio::test]
    async fn test_concurrent_loads_fetch_once() {
        let cache = MarketCache::new();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let load = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(sample_markets())
        };

        let (a, b) = tokio::join!(cache.get_or_load(load), cache.get_or_load(load));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert!(!cache.is_loading());
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_empty_and_clears_flag() {
        let cache = MarketCache::new();
        let result = cache
            .get_or_load(|| async { Err(ExchangeError::NetworkError("timeout".to_string())) })
            .await;
        match result {
            Err(ExchangeError::MarketDataUnavailable(message)) => assert!(message.contains("timeout")),
            other => panic!("expected MarketDataUnavailable, got {:?}", other),
        }
        assert!(cache.snapshot().await.is_none());
        assert!(!cache.is_loading());

        let retried = cache.get_or_load(|| async { Ok(sample_markets()) }).await;
        assert!(retried.is_ok());
        assert!(cache.get("CXS/USDT").await.is_some());
    }

    #[tokio::test]
    async fn test_waiter_shares_failed_fetch() {
        let cache = MarketCache::new();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let failing = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err(ExchangeError::NetworkError("down".to_string()))
        };

        let (a, b) = tokio::join!(cache.get_or_load(failing), cache.get_or_load(failing));
        assert!(matches!(a, Err(ExchangeError::MarketDataUnavailable(_))));
        assert!(matches!(b, Err(ExchangeError::MarketDataUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_cached() {
        let cache = MarketCache::new();
        let result = cache.get_or_load(|| async { Ok(MarketMap::new()) }).await;
        assert!(matches!(result, Err(ExchangeError::MarketDataUnavailable(_))));
        assert!(cache.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_served_from_memory_after_first_load() {
        let cache = MarketCache::new();
        cache.get_or_load(|| async { Ok(sample_markets()) }).await.unwrap();

        // An empty map would fail the load, so success proves the loader was skipped
        let cached = cache
            .get_or_load(|| async { Ok(MarketMap::new()) })
            .await
            .unwrap();
        assert_eq!(cached.len(), 1);
    }
}
