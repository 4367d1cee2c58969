use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::MarketDataSource;
use crate::core::types::{MarketInfo, OrderBook, Rates, Trade};
use crate::exchanges::lbank::conversions::{
    convert_lbank_depth, convert_lbank_market, convert_lbank_rates, convert_lbank_trades,
    to_exchange_format, to_request_symbol,
};
use crate::exchanges::lbank::market_cache::{MarketCache, MarketMap};
use crate::exchanges::lbank::rest::{LbankRest, DEFAULT_DEPTH_SIZE, DEFAULT_TRADES_SIZE};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Market data operations for LBank
pub struct MarketData<R: RestClient> {
    rest: LbankRest<R>,
    markets: Arc<MarketCache>,
}

impl<R: RestClient> MarketData<R> {
    pub fn new(rest: LbankRest<R>, markets: Arc<MarketCache>) -> Self {
        Self { rest, markets }
    }
}

/// Fetch `/accuracy.do` and build the readable-pair map
pub(crate) async fn fetch_markets<R: RestClient>(
    rest: &LbankRest<R>,
) -> Result<MarketMap, ExchangeError> {
    let response = rest.get_markets().await?;
    if !response.is_ok() {
        return Err(ExchangeError::ApiError {
            code: response.error_code().to_string(),
            message: response
                .error_message
                .or(response.msg)
                .unwrap_or_else(|| "accuracy request failed".to_string()),
        });
    }

    let mut markets = HashMap::new();
    for row in response.data.unwrap_or_default() {
        match convert_lbank_market(&row) {
            Ok(info) => {
                markets.insert(info.pair.readable.clone(), info);
            }
            Err(e) => debug!("Skipping market {}: {}", row.symbol, e),
        }
    }
    Ok(markets)
}

/// Cached markets, loading them on first use
pub(crate) async fn load_markets<R: RestClient>(
    rest: &LbankRest<R>,
    cache: &MarketCache,
) -> Result<Arc<MarketMap>, ExchangeError> {
    cache.get_or_load(|| fetch_markets(rest)).await
}

/// Trading rules for a pair in any supported notation
pub(crate) async fn lookup_market<R: RestClient>(
    rest: &LbankRest<R>,
    cache: &MarketCache,
    pair: &str,
) -> Result<MarketInfo, ExchangeError> {
    let pair = to_exchange_format(pair)?;
    let markets = load_markets(rest, cache).await?;
    markets.get(&pair.readable).cloned().ok_or_else(|| {
        ExchangeError::MarketDataUnavailable(format!("no market info for {}", pair.readable))
    })
}

impl<R: RestClient> MarketData<R> {
    pub async fn load_markets(&self) -> Result<Arc<MarketMap>, ExchangeError> {
        load_markets(&self.rest, &self.markets).await
    }

    pub async fn refresh_markets(&self) -> Result<Arc<MarketMap>, ExchangeError> {
        self.markets.refresh(|| fetch_markets(&self.rest)).await
    }

    async fn fetch_rates(&self, symbol: &str) -> Result<Option<Rates>, ExchangeError> {
        let ticker = self.rest.get_ticker(symbol).await?;
        if !ticker.is_ok() {
            return Err(ExchangeError::ApiError {
                code: ticker.error_code().to_string(),
                message: "ticker request failed".to_string(),
            });
        }
        let Some(entry) = ticker.data.and_then(|entries| entries.into_iter().next()) else {
            return Err(ExchangeError::MarketDataUnavailable(
                "ticker list is void".to_string(),
            ));
        };

        let depth = self.rest.get_depth(symbol, DEFAULT_DEPTH_SIZE).await?;
        if !depth.is_ok() {
            return Err(ExchangeError::ApiError {
                code: depth.error_code().to_string(),
                message: "depth request failed".to_string(),
            });
        }
        Ok(depth
            .data
            .and_then(|book| convert_lbank_rates(&entry.ticker, &book)))
    }
}

#[async_trait]
impl<R: RestClient + 'static> MarketDataSource for MarketData<R> {
    async fn get_markets(&self) -> Option<HashMap<String, MarketInfo>> {
        match self.load_markets().await {
            Ok(markets) => Some(markets.as_ref().clone()),
            Err(e) => {
                warn!("API request getMarkets() of LBank module failed. {}", e);
                None
            }
        }
    }

    async fn market_info(&self, pair: &str) -> Option<MarketInfo> {
        match lookup_market(&self.rest, &self.markets, pair).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("API request marketInfo(pair: {}) of LBank module failed. {}", pair, e);
                None
            }
        }
    }

    async fn get_rates(&self, pair: &str) -> Option<Rates> {
        let symbol = match to_exchange_format(pair) {
            Ok(p) => to_request_symbol(&p),
            Err(e) => {
                warn!("API request getRates(pair: {}) of LBank module failed. {}", pair, e);
                return None;
            }
        };

        match self.fetch_rates(&symbol).await {
            Ok(Some(rates)) => Some(rates),
            Ok(None) => {
                warn!("Error while processing getRates(pair: {}) request: order book side is empty", pair);
                None
            }
            Err(e) => {
                warn!("API request getRates(pair: {}) of LBank module failed. {}", pair, e);
                None
            }
        }
    }

    async fn get_order_book(&self, pair: &str) -> Option<OrderBook> {
        let symbol = match to_exchange_format(pair) {
            Ok(p) => to_request_symbol(&p),
            Err(e) => {
                warn!("API request getOrderBook(pair: {}) of LBank module failed. {}", pair, e);
                return None;
            }
        };

        match self.rest.get_depth(&symbol, DEFAULT_DEPTH_SIZE).await {
            Ok(response) if response.is_ok() => response.data.as_ref().map(convert_lbank_depth),
            Ok(response) => {
                warn!(
                    "API request getOrderBook(pair: {}) of LBank module failed. error code: {}",
                    pair,
                    response.error_code()
                );
                None
            }
            Err(e) => {
                warn!("API request getOrderBook(pair: {}) of LBank module failed. {}", pair, e);
                None
            }
        }
    }

    async fn get_trades_history(&self, pair: &str, limit: Option<u32>) -> Option<Vec<Trade>> {
        let symbol = match to_exchange_format(pair) {
            Ok(p) => to_request_symbol(&p),
            Err(e) => {
                warn!("API request getTradesHistory(pair: {}) of LBank module failed. {}", pair, e);
                return None;
            }
        };
        let size = limit.unwrap_or(DEFAULT_TRADES_SIZE);

        match self.rest.get_trades(&symbol, size).await {
            Ok(response) if response.is_ok() => {
                Some(convert_lbank_trades(&response.data.unwrap_or_default()))
            }
            Ok(response) => {
                warn!(
                    "API request getTradesHistory(pair: {}) of LBank module failed. error code: {}",
                    pair,
                    response.error_code()
                );
                None
            }
            Err(e) => {
                warn!("API request getTradesHistory(pair: {}) of LBank module failed. {}", pair, e);
                None
            }
        }
    }
}
