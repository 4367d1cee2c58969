use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Typed errors for the types subsystem
#[derive(Error, Debug)]
pub enum TypesError {
    #[error("{0}")]
    MalformedPair(String),
    #[error("Invalid decimal: {0}")]
    InvalidDecimal(#[from] rust_decimal::Error),
}

/// A trading pair in both exchange-native and readable notation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    /// Exchange-native notation, e.g. `BTC_USDT`
    pub plain: String,
    /// Canonical notation, e.g. `BTC/USDT`
    pub readable: String,
    pub base: String,
    pub quote: String,
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.readable)
    }
}

/// Trading rules for a single pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub pair: Pair,
    pub base_decimals: u32,
    pub quote_decimals: u32,
    pub base_precision: Decimal,
    pub quote_precision: Decimal,
    pub base_min_amount: Decimal,
    pub quote_min_amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

/// Exchange-side order state as surfaced when listing orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    PartFilled,
    Filled,
    Cancelled,
}

/// A request to place an order.
///
/// Either `base_amount` or `quote_amount` is expected; the missing one is
/// derived from `price` for limit orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub side: OrderSide,
    /// Pair in any supported notation, e.g. `BTC/USDT` or `btc-usdt`
    pub pair: String,
    pub order_type: OrderType,
    pub price: Option<Decimal>,
    pub base_amount: Option<Decimal>,
    pub quote_amount: Option<Decimal>,
}

impl OrderRequest {
    pub fn limit(side: OrderSide, pair: impl Into<String>, price: Decimal) -> Self {
        Self {
            side,
            pair: pair.into(),
            order_type: OrderType::Limit,
            price: Some(price),
            base_amount: None,
            quote_amount: None,
        }
    }

    pub fn market(side: OrderSide, pair: impl Into<String>) -> Self {
        Self {
            side,
            pair: pair.into(),
            order_type: OrderType::Market,
            price: None,
            base_amount: None,
            quote_amount: None,
        }
    }

    pub fn with_base_amount(mut self, amount: Decimal) -> Self {
        self.base_amount = Some(amount);
        self
    }

    pub fn with_quote_amount(mut self, amount: Decimal) -> Self {
        self.quote_amount = Some(amount);
        self
    }
}

/// Outcome of an order placement. `order_id == None` means the order was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: Option<String>,
    pub message: String,
}

impl OrderResult {
    pub fn accepted(order_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            order_id: Some(order_id.into()),
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            order_id: None,
            message: message.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.order_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: String,
    /// Pair in readable notation
    pub pair: String,
    pub price: Decimal,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub timestamp: i64,
    pub amount: Decimal,
    pub amount_executed: Decimal,
    pub amount_left: Decimal,
    pub status: OrderStatus,
}

/// Per-order detail of a batch cancel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelBatchReport {
    pub requested: Vec<String>,
    pub cancelled: Vec<String>,
    pub failed: Vec<String>,
}

impl CancelBatchReport {
    pub fn is_confirmed(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub code: String,
    pub free: Decimal,
    pub freezed: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositAddress {
    pub network: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    pub ask: Decimal,
    pub bid: Decimal,
    pub volume: Decimal,
    pub volume_in_quote: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub last: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookEntry {
    pub price: Decimal,
    pub amount: Decimal,
    pub count: u32,
}

/// Asks sorted ascending by price, bids descending
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<OrderBookEntry>,
    pub asks: Vec<OrderBookEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub base_amount: Decimal,
    pub price: Decimal,
    pub quote_amount: Decimal,
    /// Milliseconds since epoch
    pub date: i64,
    pub side: String,
    pub trade_id: String,
}

/// Capabilities the adapter advertises to callers
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    pub get_markets: bool,
    pub get_currencies: bool,
    pub place_market_order: bool,
    pub get_deposit_address: bool,
    pub get_trading_fees: bool,
    pub get_account_trade_volume: bool,
    pub create_deposit_address_with_website_only: bool,
    pub get_fund_history: bool,
    pub support_coin_networks: bool,
    pub allow_amount_for_market_buy: bool,
    pub amount_for_market_order_necessary: bool,
}

/// Conversion helpers for decimal handling
pub mod conversion {
    use rust_decimal::{Decimal, RoundingStrategy};
    use std::str::FromStr;

    use super::TypesError;

    const MAX_SCALE: u32 = 28;

    /// `10^-decimals`
    #[inline]
    pub fn precision_from_decimals(decimals: u32) -> Decimal {
        Decimal::new(1, decimals.min(MAX_SCALE))
    }

    /// Round half away from zero to `decimals` places
    #[inline]
    pub fn round_to_decimals(value: Decimal, decimals: u32) -> Decimal {
        value.round_dp_with_strategy(decimals.min(MAX_SCALE), RoundingStrategy::MidpointAwayFromZero)
    }

    /// Parse a decimal that may be written in plain or scientific notation
    pub fn parse_decimal(s: &str) -> Result<Decimal, TypesError> {
        let trimmed = s.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(TypesError::from)
    }
}
