use crate::core::types::{
    Balance, DepositAddress, Features, MarketInfo, OpenOrder, OrderBook, OrderRequest,
    OrderResult, OrderSide, Rates, Trade,
};
use async_trait::async_trait;
use std::collections::HashMap;

// Methods resolve to `None` when the outcome is unknown (transport failure,
// rejected request, unparseable payload). `None` never means "definitely failed".

#[async_trait]
pub trait MarketDataSource {
    /// Get trading rules for all markets, keyed by readable pair (`BTC/USDT`)
    async fn get_markets(&self) -> Option<HashMap<String, MarketInfo>>;

    /// Get trading rules for one pair in any supported notation
    async fn market_info(&self, pair: &str) -> Option<MarketInfo>;

    /// Best ask/bid plus 24h ticker statistics
    async fn get_rates(&self, pair: &str) -> Option<Rates>;

    async fn get_order_book(&self, pair: &str) -> Option<OrderBook>;

    /// Recent trades, oldest first
    async fn get_trades_history(&self, pair: &str, limit: Option<u32>) -> Option<Vec<Trade>>;
}

#[async_trait]
pub trait OrderPlacer {
    async fn get_open_orders(&self, pair: &str) -> Option<Vec<OpenOrder>>;

    /// Place a new order. Never fails by error: a rejected order has `order_id == None`.
    async fn place_order(&self, order: OrderRequest) -> OrderResult;

    /// Cancel one order. Resolves to `Some(true)` whenever the exchange answered,
    /// including "already cancelled or nonexistent".
    async fn cancel_order(
        &self,
        order_id: &str,
        side: Option<OrderSide>,
        pair: &str,
    ) -> Option<bool>;

    /// Cancel every open order on a pair. Partial failures are logged, not reported.
    async fn cancel_all_orders(&self, pair: &str) -> Option<bool>;
}

#[async_trait]
pub trait AccountInfo {
    async fn get_balances(&self, nonzero: bool) -> Option<Vec<Balance>>;

    async fn get_deposit_address(&self, coin: &str) -> Option<Vec<DepositAddress>>;
}

/// Composite trait for the full trading interface
pub trait ExchangeConnector: MarketDataSource + OrderPlacer + AccountInfo {
    fn features(&self) -> Features;
}
