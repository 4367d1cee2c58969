use crate::core::types::conversion::precision_from_decimals;
use crate::core::types::{
    Balance, MarketInfo, OpenOrder, OrderBook, OrderBookEntry, OrderSide, OrderStatus, OrderType,
    Pair, Rates, Trade, TypesError,
};
use crate::exchanges::lbank::types::{
    LbankBalance, LbankDepth, LbankDepthLevel, LbankMarket, LbankOrder, LbankTicker, LbankTrade,
};
use rust_decimal::Decimal;

const EXCHANGE_SEPARATOR: char = '_';
const INPUT_SEPARATORS: [char; 3] = ['-', '/', '_'];

/// Parse a pair in `BASE/QUOTE`, `base-quote` or `base_quote` notation into LBank form
pub fn to_exchange_format(pair: &str) -> Result<Pair, TypesError> {
    let normalized = pair.trim().to_uppercase();
    if normalized.matches(&INPUT_SEPARATORS[..]).count() != 1 {
        return Err(TypesError::MalformedPair(format!(
            "expected exactly one of '-', '/' or '_' in {:?}",
            pair
        )));
    }

    let (base, quote) = normalized
        .split_once(&INPUT_SEPARATORS[..])
        .ok_or_else(|| TypesError::MalformedPair(pair.to_string()))?;
    build_pair(pair, base, quote)
}

/// Parse an LBank symbol (`btc_usdt`, `BTC_USDT`) into a canonical pair
pub fn to_canonical_format(exchange_pair: &str) -> Result<Pair, TypesError> {
    let normalized = exchange_pair.trim().to_uppercase();
    let mut parts = normalized.split(EXCHANGE_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(base), Some(quote), None) => build_pair(exchange_pair, base, quote),
        _ => Err(TypesError::MalformedPair(format!(
            "expected BASE_QUOTE, got {:?}",
            exchange_pair
        ))),
    }
}

fn build_pair(input: &str, base: &str, quote: &str) -> Result<Pair, TypesError> {
    if base.is_empty() || quote.is_empty() {
        return Err(TypesError::MalformedPair(format!(
            "empty base or quote in {:?}",
            input
        )));
    }
    Ok(Pair {
        plain: format!("{}{}{}", base, EXCHANGE_SEPARATOR, quote),
        readable: format!("{}/{}", base, quote),
        base: base.to_string(),
        quote: quote.to_string(),
    })
}

/// LBank endpoints expect lower-case symbols
pub fn to_request_symbol(pair: &Pair) -> String {
    pair.plain.to_lowercase()
}

/// Convert an `/accuracy.do` row into trading rules
pub fn convert_lbank_market(market: &LbankMarket) -> Result<MarketInfo, TypesError> {
    let pair = to_canonical_format(&market.symbol)?;
    Ok(MarketInfo {
        pair,
        base_decimals: market.quantity_accuracy,
        quote_decimals: market.price_accuracy,
        base_precision: precision_from_decimals(market.quantity_accuracy),
        quote_precision: precision_from_decimals(market.price_accuracy),
        base_min_amount: market.min_tran_qua.unwrap_or(Decimal::ZERO),
        quote_min_amount: Decimal::ZERO,
    })
}

pub fn convert_lbank_balance(balance: &LbankBalance) -> Balance {
    Balance {
        code: balance.asset.to_uppercase(),
        free: balance.free,
        freezed: balance.locked,
        total: balance.free + balance.locked,
    }
}

/// Map LBank order status codes
///
/// `-1` cancelled, `0` on trading, `1` partially filled, `2` filled,
/// `3` partially filled then cancelled, `4` cancelling
pub fn convert_order_status(status: i64) -> OrderStatus {
    match status {
        1 => OrderStatus::PartFilled,
        2 => OrderStatus::Filled,
        -1 | 3 | 4 => OrderStatus::Cancelled,
        _ => OrderStatus::New,
    }
}

/// Split LBank's compound order type (`buy_maker`, `sell_market`, ...) into side and type
pub fn convert_order_kind(kind: &str) -> (OrderSide, OrderType) {
    let kind = kind.to_lowercase();
    let side = if kind.starts_with("buy") {
        OrderSide::Buy
    } else {
        OrderSide::Sell
    };
    let order_type = if kind.ends_with("market") {
        OrderType::Market
    } else {
        OrderType::Limit
    };
    (side, order_type)
}

pub fn convert_lbank_order(order: &LbankOrder) -> Result<OpenOrder, TypesError> {
    let pair = to_canonical_format(&order.symbol)?;
    let (side, order_type) = convert_order_kind(&order.order_type);

    Ok(OpenOrder {
        order_id: order.order_id.clone(),
        pair: pair.readable,
        price: order.price,
        side,
        order_type,
        timestamp: order.create_time,
        amount: order.amount,
        amount_executed: order.deal_amount,
        amount_left: order.amount - order.deal_amount,
        status: convert_order_status(order.status),
    })
}

fn convert_depth_level(level: &LbankDepthLevel) -> OrderBookEntry {
    OrderBookEntry {
        price: level.0,
        amount: level.1,
        count: 1,
    }
}

/// Asks ascending, bids descending, whatever order LBank sent them in
pub fn convert_lbank_depth(depth: &LbankDepth) -> OrderBook {
    let mut asks: Vec<OrderBookEntry> = depth.asks.iter().map(convert_depth_level).collect();
    let mut bids: Vec<OrderBookEntry> = depth.bids.iter().map(convert_depth_level).collect();
    asks.sort_by(|a, b| a.price.cmp(&b.price));
    bids.sort_by(|a, b| b.price.cmp(&a.price));
    OrderBook { bids, asks }
}

/// `None` when either side of the book is empty
pub fn convert_lbank_rates(ticker: &LbankTicker, depth: &LbankDepth) -> Option<Rates> {
    let ask = depth.asks.iter().map(|level| level.0).min()?;
    let bid = depth.bids.iter().map(|level| level.0).max()?;

    Some(Rates {
        ask,
        bid,
        volume: ticker.vol,
        volume_in_quote: ticker.turnover,
        high: ticker.high,
        low: ticker.low,
        last: ticker.latest,
    })
}

pub fn convert_lbank_trade(trade: &LbankTrade) -> Trade {
    Trade {
        base_amount: trade.amount,
        price: trade.price,
        quote_amount: trade.amount * trade.price,
        date: trade.date_ms,
        side: trade.side.clone(),
        trade_id: trade.tid.clone(),
    }
}

/// Oldest first
pub fn convert_lbank_trades(trades: &[LbankTrade]) -> Vec<Trade> {
    let mut result: Vec<Trade> = trades.iter().map(convert_lbank_trade).collect();
    result.sort_by_key(|trade| trade.date);
    result
}
