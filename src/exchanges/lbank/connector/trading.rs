use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::OrderPlacer;
use crate::core::types::conversion::round_to_decimals;
use crate::core::types::{
    CancelBatchReport, MarketInfo, OpenOrder, OrderRequest, OrderResult, OrderSide, OrderType,
    Pair,
};
use crate::exchanges::lbank::classifier::describe_error_code;
use crate::exchanges::lbank::connector::market_data::lookup_market;
use crate::exchanges::lbank::conversions::{convert_lbank_order, to_exchange_format, to_request_symbol};
use crate::exchanges::lbank::market_cache::MarketCache;
use crate::exchanges::lbank::rest::{LbankRest, DEFAULT_ORDERS_PAGE_LENGTH, OPEN_ORDERS_STATUS};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

const EXCHANGE_NAME: &str = "LBank";

/// A limit order that passed local validation, rounded to the pair's precision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub price: Decimal,
    pub base_amount: Decimal,
    pub quote_amount: Decimal,
    /// `sell 10 CXS at 1 USDT`
    pub description: String,
}

/// Derive the missing amount, round to the pair's decimals and check minimums
///
/// Fails with a human-readable reason; nothing here touches the network.
pub fn prepare_limit_order(
    market: &MarketInfo,
    order: &OrderRequest,
) -> Result<PreparedOrder, String> {
    let non_zero = |value: &Decimal| !value.is_zero();
    let price = order.price.filter(non_zero);
    let mut base_amount = order.base_amount.filter(non_zero);
    let mut quote_amount = order.quote_amount.filter(non_zero);

    let out_of_range = || {
        format!(
            "Unable to place an order on {} exchange. Order amount or price is out of range on {} pair.",
            EXCHANGE_NAME, market.pair.readable
        )
    };
    if let (None, Some(quote), Some(price)) = (base_amount, quote_amount, price) {
        base_amount = Some(quote.checked_div(price).ok_or_else(out_of_range)?);
    }
    if let (None, Some(base), Some(price)) = (quote_amount, base_amount, price) {
        quote_amount = Some(base.checked_mul(price).ok_or_else(out_of_range)?);
    }

    let base_amount = base_amount.map(|v| round_to_decimals(v, market.base_decimals));
    let quote_amount = quote_amount.map(|v| round_to_decimals(v, market.quote_decimals));
    let price = price.map(|v| round_to_decimals(v, market.quote_decimals));

    let describe = |base: Option<Decimal>, price: Option<Decimal>| {
        format!(
            "{} {} {} at {} {}",
            order.side,
            base.map_or_else(|| "?".to_string(), |v| v.to_string()),
            market.pair.base,
            price.map_or_else(|| "?".to_string(), |v| v.to_string()),
            market.pair.quote
        )
    };

    if order.order_type != OrderType::Limit {
        return Err(format!(
            "Unable to place order to {}. {} doesn't support Market orders.",
            describe(base_amount, price),
            EXCHANGE_NAME
        ));
    }

    let Some(price) = price else {
        return Err(format!(
            "Unable to place an order on {} exchange. Limit order price is required on {} pair.",
            EXCHANGE_NAME, market.pair.readable
        ));
    };
    let Some(base_amount) = base_amount else {
        return Err(format!(
            "Unable to place an order on {} exchange. Provide either base or quote amount on {} pair.",
            EXCHANGE_NAME, market.pair.readable
        ));
    };

    if base_amount <= Decimal::ZERO || base_amount < market.base_min_amount {
        return Err(format!(
            "Unable to place an order on {} exchange. Order amount {} {} is less minimum {} {} on {} pair.",
            EXCHANGE_NAME,
            base_amount,
            market.pair.base,
            market.base_min_amount,
            market.pair.base,
            market.pair.readable
        ));
    }

    let quote_amount = quote_amount.unwrap_or_default();
    if quote_amount < market.quote_min_amount {
        return Err(format!(
            "Unable to place an order on {} exchange. Order volume {} {} is less minimum {} {} on {} pair.",
            EXCHANGE_NAME,
            quote_amount,
            market.pair.quote,
            market.quote_min_amount,
            market.pair.quote,
            market.pair.readable
        ));
    }

    Ok(PreparedOrder {
        symbol: to_request_symbol(&market.pair),
        side: order.side,
        price,
        base_amount,
        quote_amount,
        description: describe(Some(base_amount), Some(price)),
    })
}

fn describe_code(code: &str) -> String {
    describe_error_code(code).map_or_else(|| code.to_string(), |d| format!("{} ({})", code, d))
}

/// Order placement and cancellation for LBank
pub struct Trading<R: RestClient> {
    rest: LbankRest<R>,
    markets: Arc<MarketCache>,
}

impl<R: RestClient> Trading<R> {
    pub fn new(rest: LbankRest<R>, markets: Arc<MarketCache>) -> Self {
        Self { rest, markets }
    }

    /// Orders still on the book for `pair`
    pub async fn open_orders(&self, pair: &Pair) -> Result<Vec<OpenOrder>, ExchangeError> {
        let response = self
            .rest
            .get_orders(
                &to_request_symbol(pair),
                DEFAULT_ORDERS_PAGE_LENGTH,
                OPEN_ORDERS_STATUS,
            )
            .await?;

        if !response.is_ok() {
            return Err(ExchangeError::ApiError {
                code: response.error_code().to_string(),
                message: format!("open orders request for {} failed", pair),
            });
        }

        let orders = response.data.and_then(|page| page.orders).unwrap_or_default();
        orders
            .iter()
            .map(|order| convert_lbank_order(order).map_err(ExchangeError::from))
            .collect()
    }

    /// Cancel every open order on `pair` and report what the exchange said per order
    pub async fn cancel_all_orders_detailed(
        &self,
        pair: &str,
    ) -> Result<CancelBatchReport, ExchangeError> {
        let pair = to_exchange_format(pair)?;
        let requested: Vec<String> = self
            .open_orders(&pair)
            .await?
            .into_iter()
            .map(|order| order.order_id)
            .collect();

        if requested.is_empty() {
            return Ok(CancelBatchReport::default());
        }

        let response = self
            .rest
            .cancel_order(&requested.join(","), &to_request_symbol(&pair))
            .await?;

        if !response.is_ok() {
            info!(
                "Failed to cancel all orders on {} pair: {}.",
                pair,
                describe_code(response.error_code())
            );
            return Ok(CancelBatchReport {
                failed: requested.clone(),
                requested,
                cancelled: Vec::new(),
            });
        }

        let data = response.data.unwrap_or_default();
        // A singleton batch echoes order_id instead of success/error lists
        let (cancelled, failed) = if requested.len() == 1 {
            if data.order_id.as_deref().is_some_and(|id| !id.is_empty()) {
                (requested.clone(), Vec::new())
            } else {
                (Vec::new(), requested.clone())
            }
        } else {
            (data.succeeded_ids(), data.failed_ids())
        };

        Ok(CancelBatchReport {
            requested,
            cancelled,
            failed,
        })
    }
}

#[async_trait]
impl<R: RestClient + 'static> OrderPlacer for Trading<R> {
    async fn get_open_orders(&self, pair: &str) -> Option<Vec<OpenOrder>> {
        let result = match to_exchange_format(pair) {
            Ok(pair) => self.open_orders(&pair).await,
            Err(e) => Err(e.into()),
        };
        result
            .map_err(|e| warn!("API request getOpenOrders(pair: {}) of LBank module failed. {}", pair, e))
            .ok()
    }

    async fn place_order(&self, order: OrderRequest) -> OrderResult {
        let params = format!(
            "side: {}, pair: {}, price: {:?}, base_amount: {:?}, type: {:?}, quote_amount: {:?}",
            order.side,
            order.pair,
            order.price,
            order.base_amount,
            order.order_type,
            order.quote_amount
        );

        if order.order_type != OrderType::Limit {
            let message = format!(
                "Unable to place order to {} {} on {} pair. {} doesn't support Market orders.",
                order.side,
                order
                    .base_amount
                    .or(order.quote_amount)
                    .map_or_else(|| "?".to_string(), |v| v.to_string()),
                order.pair,
                EXCHANGE_NAME
            );
            warn!("{}", message);
            return OrderResult::rejected(message);
        }

        let market = match lookup_market(&self.rest, &self.markets, &order.pair).await {
            Ok(market) => market,
            Err(e) => {
                let message = format!(
                    "Unable to place an order on {} exchange. I don't have info about market {}.",
                    EXCHANGE_NAME, order.pair
                );
                warn!("{} {}", message, e);
                return OrderResult::rejected(message);
            }
        };

        let prepared = match prepare_limit_order(&market, &order) {
            Ok(prepared) => prepared,
            Err(message) => {
                warn!("{}", message);
                return OrderResult::rejected(message);
            }
        };

        let response = match self
            .rest
            .create_order(
                &prepared.symbol,
                prepared.side.as_str(),
                &prepared.price.to_string(),
                &prepared.base_amount.to_string(),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let message =
                    format!("API request addOrder({}) of LBank module failed. {}.", params, e);
                warn!("{}", message);
                return OrderResult::rejected(message);
            }
        };

        if !response.is_ok() {
            let message = format!(
                "API request addOrder({}) of LBank module failed. {}.",
                params,
                describe_code(response.error_code())
            );
            warn!("{}", message);
            return OrderResult::rejected(message);
        }

        match response.data.and_then(|data| data.order_id) {
            Some(order_id) => {
                let message = format!(
                    "Order placed to {}. Order Id: {}.",
                    prepared.description, order_id
                );
                info!("{}", message);
                OrderResult::accepted(order_id, message)
            }
            None => {
                let message = format!(
                    "Unable to place order to {}. {{ No details }}. Check parameters and balances.",
                    prepared.description
                );
                warn!("{}", message);
                OrderResult::rejected(message)
            }
        }
    }

    async fn cancel_order(
        &self,
        order_id: &str,
        _side: Option<OrderSide>,
        pair: &str,
    ) -> Option<bool> {
        let pair_ = match to_exchange_format(pair) {
            Ok(p) => p,
            Err(e) => {
                warn!("API request cancelOrder(orderId: {}, pair: {}) of LBank module failed. {}", order_id, pair, e);
                return None;
            }
        };

        let response = match self
            .rest
            .cancel_order(order_id, &to_request_symbol(&pair_))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "API request cancelOrder(orderId: {}, pair: {}) of LBank module failed. {}",
                    order_id, pair, e
                );
                return None;
            }
        };

        let echoed = response
            .data
            .as_ref()
            .and_then(|data| data.order_id.as_deref())
            .is_some_and(|id| id == order_id);

        if response.is_ok() && echoed {
            info!("Cancelling order {} on {} pair…", order_id, pair_);
        } else {
            info!(
                "Failed to cancel order {} on {} pair: {}. Assuming it doesn't exist or already cancelled.",
                order_id,
                pair_,
                describe_code(response.error_code())
            );
        }
        Some(true)
    }

    async fn cancel_all_orders(&self, pair: &str) -> Option<bool> {
        let report = match self.cancel_all_orders_detailed(pair).await {
            Ok(report) => report,
            Err(e) => {
                warn!("API request cancelAllOrders(pair: {}) of LBank module failed. {}", pair, e);
                return None;
            }
        };

        if report.requested.is_empty() {
            info!("No open orders to cancel on {} pair.", pair);
        } else if !report.failed.is_empty() {
            info!(
                "Failed to cancel {} of {} orders on {} pair, failed order ids: {}.",
                report.failed.len(),
                report.requested.len(),
                pair,
                report.failed.join(",")
            );
        } else {
            info!("Cancelling all {} orders on {} pair…", report.requested.len(), pair);
        }
        Some(true)
    }
}
