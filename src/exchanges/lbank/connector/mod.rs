use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::{AccountInfo, ExchangeConnector, MarketDataSource, OrderPlacer};
use crate::core::types::{
    Balance, CancelBatchReport, DepositAddress, Features, MarketInfo, OpenOrder, OrderBook,
    OrderRequest, OrderResult, OrderSide, Rates, Trade,
};
use crate::exchanges::lbank::classifier::DEFAULT_NON_RESOLVABLE_ERRORS;
use crate::exchanges::lbank::market_cache::{MarketCache, MarketMap};
use crate::exchanges::lbank::rest::LbankRest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub mod account;
pub mod market_data;
pub mod trading;

pub use account::Account;
pub use market_data::MarketData;
pub use trading::{prepare_limit_order, PreparedOrder, Trading};

/// LBank connector that composes all sub-trait implementations
///
/// All components share one `MarketCache`, so trading rules are fetched at
/// most once per connector.
pub struct LbankConnector<R: RestClient> {
    pub market: MarketData<R>,
    pub trading: Trading<R>,
    pub account: Account<R>,
    markets: Arc<MarketCache>,
}

impl<R: RestClient + Clone> LbankConnector<R> {
    /// Connector with the default non-resolvable error list
    pub fn new(rest: R) -> Self {
        let non_resolvable = DEFAULT_NON_RESOLVABLE_ERRORS
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        Self::with_non_resolvable_errors(rest, non_resolvable)
    }

    pub fn with_non_resolvable_errors(rest: R, non_resolvable: Vec<String>) -> Self {
        let rest = LbankRest::new(rest, non_resolvable.into());
        let markets = Arc::new(MarketCache::new());

        Self {
            market: MarketData::new(rest.clone(), Arc::clone(&markets)),
            trading: Trading::new(rest.clone(), Arc::clone(&markets)),
            account: Account::new(rest),
            markets,
        }
    }
}

impl<R: RestClient> LbankConnector<R> {
    pub fn market_cache(&self) -> &Arc<MarketCache> {
        &self.markets
    }

    /// Fetch trading rules now instead of on first use
    pub async fn load_markets(&self) -> Result<Arc<MarketMap>, ExchangeError> {
        self.market.load_markets().await
    }

    /// Replace cached trading rules with a fresh fetch
    pub async fn refresh_markets(&self) -> Result<Arc<MarketMap>, ExchangeError> {
        self.market.refresh_markets().await
    }

    /// Strict variant of `cancel_all_orders` that surfaces per-order failures
    pub async fn cancel_all_orders_detailed(
        &self,
        pair: &str,
    ) -> Result<CancelBatchReport, ExchangeError> {
        self.trading.cancel_all_orders_detailed(pair).await
    }
}

// Implement traits for the connector by delegating to sub-components
#[async_trait]
impl<R: RestClient + 'static> MarketDataSource for LbankConnector<R> {
    async fn get_markets(&self) -> Option<HashMap<String, MarketInfo>> {
        self.market.get_markets().await
    }

    async fn market_info(&self, pair: &str) -> Option<MarketInfo> {
        self.market.market_info(pair).await
    }

    async fn get_rates(&self, pair: &str) -> Option<Rates> {
        self.market.get_rates(pair).await
    }

    async fn get_order_book(&self, pair: &str) -> Option<OrderBook> {
        self.market.get_order_book(pair).await
    }

    async fn get_trades_history(&self, pair: &str, limit: Option<u32>) -> Option<Vec<Trade>> {
        self.market.get_trades_history(pair, limit).await
    }
}

#[async_trait]
impl<R: RestClient + 'static> OrderPlacer for LbankConnector<R> {
    async fn get_open_orders(&self, pair: &str) -> Option<Vec<OpenOrder>> {
        self.trading.get_open_orders(pair).await
    }

    async fn place_order(&self, order: OrderRequest) -> OrderResult {
        self.trading.place_order(order).await
    }

    async fn cancel_order(
        &self,
        order_id: &str,
        side: Option<OrderSide>,
        pair: &str,
    ) -> Option<bool> {
        self.trading.cancel_order(order_id, side, pair).await
    }

    async fn cancel_all_orders(&self, pair: &str) -> Option<bool> {
        self.trading.cancel_all_orders(pair).await
    }
}

#[async_trait]
impl<R: RestClient + 'static> AccountInfo for LbankConnector<R> {
    async fn get_balances(&self, nonzero: bool) -> Option<Vec<Balance>> {
        self.account.get_balances(nonzero).await
    }

    async fn get_deposit_address(&self, coin: &str) -> Option<Vec<DepositAddress>> {
        self.account.get_deposit_address(coin).await
    }
}

impl<R: RestClient + 'static> ExchangeConnector for LbankConnector<R> {
    fn features(&self) -> Features {
        Features {
            get_markets: true,
            get_currencies: false,
            place_market_order: false,
            get_deposit_address: true,
            get_trading_fees: false,
            get_account_trade_volume: false,
            create_deposit_address_with_website_only: true,
            get_fund_history: false,
            support_coin_networks: false,
            allow_amount_for_market_buy: false,
            amount_for_market_order_necessary: true,
        }
    }
}
