use async_trait::async_trait;
use lbankx::core::errors::ExchangeError;
use lbankx::core::kernel::{HttpResponse, RestClient};
use lbankx::core::traits::{AccountInfo, ExchangeConnector, MarketDataSource, OrderPlacer};
use lbankx::core::types::{OrderRequest, OrderSide};
use lbankx::exchanges::lbank::LbankConnector;
use reqwest::Method;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
enum Reply {
    Json(u16, Value),
    Transport(String),
}

#[derive(Debug, Clone)]
struct RecordedCall {
    endpoint: String,
    params: HashMap<String, String>,
    authenticated: bool,
}

/// Scripted transport: one sticky reply per endpoint, every call recorded
#[derive(Clone, Default)]
struct MockRest {
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    delay: Option<Duration>,
}

impl MockRest {
    fn new() -> Self {
        Self::default()
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn reply(&self, endpoint: &str, status: u16, body: Value) {
        self.replies
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), Reply::Json(status, body));
    }

    fn fail(&self, endpoint: &str, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), Reply::Transport(message.to_string()));
    }

    fn calls_to(&self, endpoint: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RestClient for MockRest {
    async fn request(
        &self,
        _method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<HttpResponse, ExchangeError> {
        self.calls.lock().unwrap().push(RecordedCall {
            endpoint: endpoint.to_string(),
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            authenticated,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.replies.lock().unwrap().get(endpoint).cloned();
        match reply {
            Some(Reply::Json(status, body)) => Ok(HttpResponse::new(status, Some(body))),
            Some(Reply::Transport(message)) => Err(ExchangeError::NetworkError(message)),
            None => Ok(HttpResponse::new(404, None)),
        }
    }
}

fn ok(data: Value) -> Value {
    json!({ "result": "true", "error_code": 0, "data": data, "ts": 1_700_000_000_000_i64 })
}

fn soft_error(code: u32) -> Value {
    json!({ "result": "false", "error_code": code, "ts": 1_700_000_000_000_i64 })
}

fn accuracy_body() -> Value {
    ok(json!([
        { "symbol": "cxs_usdt", "quantityAccuracy": "2", "priceAccuracy": "6", "minTranQua": "0.01" },
        { "symbol": "btc_usdt", "quantityAccuracy": "4", "priceAccuracy": "2", "minTranQua": "0.0001" }
    ]))
}

fn open_order(id: &str) -> Value {
    json!({
        "order_id": id,
        "symbol": "cxs_usdt",
        "price": "1",
        "type": "sell",
        "create_time": 1_700_000_000_000_i64,
        "amount": "10",
        "deal_amount": "0",
        "status": 0
    })
}

fn connector(mock: &MockRest) -> LbankConnector<MockRest> {
    LbankConnector::new(mock.clone())
}

fn param(call: &RecordedCall, key: &str) -> String {
    call.params.get(key).cloned().unwrap_or_default()
}

#[cfg(test)]
mod market_tests {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_markets_fetch() {
        let mock = MockRest::new().with_delay(Duration::from_millis(50));
        mock.reply("/accuracy.do", 200, accuracy_body());
        let lbank = connector(&mock);

        let results =
            futures::future::join_all((0..5).map(|_| lbank.get_markets())).await;

        assert!(results.iter().all(Option::is_some));
        assert_eq!(mock.calls_to("/accuracy.do").len(), 1);

        // Later callers hit the cache
        assert!(lbank.market_info("CXS/USDT").await.is_some());
        assert_eq!(mock.calls_to("/accuracy.do").len(), 1);
    }

    #[tokio::test]
    async fn test_market_info_accepts_any_separator() {
        let mock = MockRest::new();
        mock.reply("/accuracy.do", 200, accuracy_body());
        let lbank = connector(&mock);

        for pair in ["CXS/USDT", "cxs-usdt", "CXS_USDT"] {
            let info = lbank.market_info(pair).await.expect("market known");
            assert_eq!(info.pair.readable, "CXS/USDT");
            assert_eq!(info.base_decimals, 2);
            assert_eq!(info.quote_decimals, 6);
            assert_eq!(info.base_min_amount, dec!(0.01));
            assert_eq!(info.quote_min_amount, Decimal::ZERO);
        }
        assert!(lbank.market_info("CXSUSDT").await.is_none());
    }

    #[tokio::test]
    async fn test_failed_markets_fetch_is_retried_later() {
        let mock = MockRest::new();
        mock.fail("/accuracy.do", "connection reset");
        let lbank = connector(&mock);

        assert!(lbank.get_markets().await.is_none());

        mock.reply("/accuracy.do", 200, accuracy_body());
        let markets = lbank.get_markets().await.expect("markets after recovery");
        assert_eq!(markets.len(), 2);
        assert_eq!(mock.calls_to("/accuracy.do").len(), 2);
    }

    #[tokio::test]
    async fn test_rates_combine_ticker_and_depth() {
        let mock = MockRest::new();
        mock.reply(
            "/ticker.do",
            200,
            ok(json!([{
                "symbol": "cxs_usdt",
                "ticker": { "vol": "1000", "turnover": "950", "high": "1.1", "low": "0.9", "latest": "1.0" }
            }])),
        );
        mock.reply(
            "/depth.do",
            200,
            ok(json!({
                "asks": [["1.02", "5"], ["1.01", "3"]],
                "bids": [["0.98", "2"], ["0.99", "4"]]
            })),
        );
        let lbank = connector(&mock);

        let rates = lbank.get_rates("CXS/USDT").await.expect("rates");
        assert_eq!(rates.ask, dec!(1.01));
        assert_eq!(rates.bid, dec!(0.99));
        assert_eq!(rates.volume, dec!(1000));
        assert_eq!(rates.last, dec!(1.0));

        let ticker_call = &mock.calls_to("/ticker.do")[0];
        assert_eq!(param(ticker_call, "symbol"), "cxs_usdt");
        assert!(!ticker_call.authenticated);
    }
}

#[cfg(test)]
mod order_tests {
    use super::*;

    #[tokio::test]
    async fn test_buy_with_quote_amount_derives_base() {
        let mock = MockRest::new();
        mock.reply("/accuracy.do", 200, accuracy_body());
        mock.reply("/create_order.do", 200, ok(json!({ "order_id": "ord-1" })));
        let lbank = connector(&mock);

        let order = OrderRequest::limit(OrderSide::Buy, "CXS/USDT", dec!(0.00001))
            .with_quote_amount(dec!(10));
        let result = lbank.place_order(order).await;

        assert_eq!(result.order_id.as_deref(), Some("ord-1"));
        let call = &mock.calls_to("/create_order.do")[0];
        assert!(call.authenticated);
        assert_eq!(param(call, "symbol"), "cxs_usdt");
        assert_eq!(param(call, "type"), "buy");
        assert_eq!(
            Decimal::from_str(&param(call, "amount")).unwrap(),
            dec!(1000000)
        );
        assert_eq!(
            Decimal::from_str(&param(call, "price")).unwrap(),
            dec!(0.00001)
        );
    }

    #[tokio::test]
    async fn test_price_is_rounded_before_sending() {
        let mock = MockRest::new();
        mock.reply("/accuracy.do", 200, accuracy_body());
        mock.reply("/create_order.do", 200, ok(json!({ "order_id": "ord-2" })));
        let lbank = connector(&mock);

        let order = OrderRequest::limit(OrderSide::Sell, "CXS/USDT", dec!(0.0000012345))
            .with_base_amount(dec!(5));
        assert!(lbank.place_order(order).await.is_accepted());

        let call = &mock.calls_to("/create_order.do")[0];
        assert_eq!(
            Decimal::from_str(&param(call, "price")).unwrap(),
            dec!(0.000001)
        );
    }

    #[tokio::test]
    async fn test_market_order_rejected_without_network_call() {
        let mock = MockRest::new();
        mock.fail("/accuracy.do", "connection reset");
        let lbank = connector(&mock);

        let order = OrderRequest::market(OrderSide::Buy, "CXS/USDT").with_base_amount(dec!(10));
        let result = lbank.place_order(order).await;

        assert!(!result.is_accepted());
        assert!(result.message.contains("doesn't support Market orders"));
        assert!(mock.calls_to("/accuracy.do").is_empty());
        assert!(mock.calls_to("/create_order.do").is_empty());
    }

    #[tokio::test]
    async fn test_markets_failure_surfaces_as_unavailable() {
        let mock = MockRest::new();
        mock.fail("/accuracy.do", "connection reset");
        let lbank = connector(&mock);

        match lbank.load_markets().await {
            Err(ExchangeError::MarketDataUnavailable(message)) => {
                assert!(message.contains("connection reset"));
            }
            other => panic!("expected MarketDataUnavailable, got {:?}", other.map(|m| m.len())),
        }
    }

    #[tokio::test]
    async fn test_order_below_minimum_rejected() {
        let mock = MockRest::new();
        mock.reply("/accuracy.do", 200, accuracy_body());
        let lbank = connector(&mock);

        let order = OrderRequest::limit(OrderSide::Sell, "BTC/USDT", dec!(30000))
            .with_base_amount(dec!(0.00001));
        let result = lbank.place_order(order).await;

        assert!(!result.is_accepted());
        assert!(result.message.contains("less minimum"));
        assert!(mock.calls_to("/create_order.do").is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_amount_rejected_without_panic() {
        let mock = MockRest::new();
        mock.reply("/accuracy.do", 200, accuracy_body());
        let lbank = connector(&mock);

        let order = OrderRequest::limit(OrderSide::Buy, "CXS/USDT", dec!(0.000000000000001))
            .with_quote_amount(dec!(1000000000000000));
        let result = lbank.place_order(order).await;

        assert!(!result.is_accepted());
        assert!(result.message.contains("out of range"));
        assert!(mock.calls_to("/create_order.do").is_empty());
    }

    #[tokio::test]
    async fn test_unknown_market_rejected() {
        let mock = MockRest::new();
        mock.reply("/accuracy.do", 200, accuracy_body());
        let lbank = connector(&mock);

        let order =
            OrderRequest::limit(OrderSide::Buy, "DOGE/USDT", dec!(0.1)).with_base_amount(dec!(10));
        let result = lbank.place_order(order).await;

        assert!(!result.is_accepted());
        assert!(result.message.contains("I don't have info about market"));
    }

    #[tokio::test]
    async fn test_rejected_order_carries_error_description() {
        let mock = MockRest::new();
        mock.reply("/accuracy.do", 200, accuracy_body());
        mock.reply("/create_order.do", 200, soft_error(10016));
        let lbank = connector(&mock);

        let order =
            OrderRequest::limit(OrderSide::Buy, "CXS/USDT", dec!(1)).with_base_amount(dec!(10));
        let result = lbank.place_order(order).await;

        assert!(!result.is_accepted());
        assert!(result.message.contains("10016"));
    }

    #[tokio::test]
    async fn test_transport_failure_yields_rejection() {
        let mock = MockRest::new();
        mock.reply("/accuracy.do", 200, accuracy_body());
        mock.fail("/create_order.do", "timed out");
        let lbank = connector(&mock);

        let order =
            OrderRequest::limit(OrderSide::Buy, "CXS/USDT", dec!(1)).with_base_amount(dec!(10));
        let result = lbank.place_order(order).await;

        assert!(!result.is_accepted());
        assert!(result.message.contains("timed out"));
    }
}

#[cfg(test)]
mod cancel_tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_resolves_true_on_soft_error() {
        let mock = MockRest::new();
        mock.reply("/cancel_order.do", 200, soft_error(10025));
        let lbank = connector(&mock);

        assert_eq!(lbank.cancel_order("ord-1", None, "CXS/USDT").await, Some(true));
        let call = &mock.calls_to("/cancel_order.do")[0];
        assert_eq!(param(call, "order_id"), "ord-1");
        assert_eq!(param(call, "symbol"), "cxs_usdt");
    }

    #[tokio::test]
    async fn test_cancel_unknown_on_hard_error() {
        let mock = MockRest::new();
        mock.reply("/cancel_order.do", 500, json!({ "msg": "internal" }));
        let lbank = connector(&mock);
        assert_eq!(lbank.cancel_order("ord-1", None, "CXS/USDT").await, None);
    }

    #[tokio::test]
    async fn test_non_resolvable_message_is_hard_error() {
        let mock = MockRest::new();
        mock.reply(
            "/cancel_order.do",
            200,
            json!({ "result": "false", "error_code": 10010, "msg": "nonce expired" }),
        );
        let lbank = connector(&mock);
        assert_eq!(lbank.cancel_order("ord-1", None, "CXS/USDT").await, None);
    }

    #[tokio::test]
    async fn test_cancel_unknown_on_transport_failure() {
        let mock = MockRest::new();
        mock.fail("/cancel_order.do", "connection refused");
        let lbank = connector(&mock);
        assert_eq!(lbank.cancel_order("ord-1", None, "CXS/USDT").await, None);
    }

    #[tokio::test]
    async fn test_cancel_all_reports_batch_success() {
        let mock = MockRest::new();
        mock.reply(
            "/orders_info_history.do",
            200,
            ok(json!({ "orders": [open_order("id1"), open_order("id2")] })),
        );
        mock.reply(
            "/cancel_order.do",
            200,
            ok(json!({ "success": "id1,id2", "error": "" })),
        );
        let lbank = connector(&mock);

        assert_eq!(lbank.cancel_all_orders("CXS/USDT").await, Some(true));
        let call = &mock.calls_to("/cancel_order.do")[0];
        assert_eq!(param(call, "order_id"), "id1,id2");

        let report = lbank.cancel_all_orders_detailed("CXS/USDT").await.unwrap();
        assert_eq!(report.cancelled, vec!["id1", "id2"]);
        assert!(report.is_confirmed());
    }

    #[tokio::test]
    async fn test_cancel_all_partial_failure_still_resolves_true() {
        let mock = MockRest::new();
        mock.reply(
            "/orders_info_history.do",
            200,
            ok(json!({ "orders": [open_order("id1"), open_order("id2")] })),
        );
        mock.reply(
            "/cancel_order.do",
            200,
            ok(json!({ "success": "id2", "error": "id1" })),
        );
        let lbank = connector(&mock);

        assert_eq!(lbank.cancel_all_orders("CXS/USDT").await, Some(true));

        let report = lbank.cancel_all_orders_detailed("CXS/USDT").await.unwrap();
        assert_eq!(report.failed, vec!["id1"]);
        assert_eq!(report.cancelled, vec!["id2"]);
        assert!(!report.is_confirmed());
    }

    #[tokio::test]
    async fn test_cancel_all_singleton_batch() {
        let mock = MockRest::new();
        mock.reply(
            "/orders_info_history.do",
            200,
            ok(json!({ "orders": [open_order("id1")] })),
        );
        mock.reply("/cancel_order.do", 200, ok(json!({ "order_id": "id1" })));
        let lbank = connector(&mock);

        let report = lbank.cancel_all_orders_detailed("CXS/USDT").await.unwrap();
        assert_eq!(report.requested, vec!["id1"]);
        assert_eq!(report.cancelled, vec!["id1"]);
    }

    #[tokio::test]
    async fn test_cancel_all_without_open_orders_skips_cancel() {
        let mock = MockRest::new();
        mock.reply("/orders_info_history.do", 200, ok(json!({ "orders": null })));
        let lbank = connector(&mock);

        assert_eq!(lbank.cancel_all_orders("CXS/USDT").await, Some(true));
        assert!(mock.calls_to("/cancel_order.do").is_empty());

        let listing = &mock.calls_to("/orders_info_history.do")[0];
        assert_eq!(param(listing, "status"), "0");
        assert_eq!(param(listing, "page_length"), "100");
    }

    #[tokio::test]
    async fn test_cancel_all_unknown_when_listing_fails() {
        let mock = MockRest::new();
        mock.fail("/orders_info_history.do", "connection reset");
        let lbank = connector(&mock);

        assert_eq!(lbank.cancel_all_orders("CXS/USDT").await, None);
        assert!(mock.calls_to("/cancel_order.do").is_empty());
    }
}

#[cfg(test)]
mod account_tests {
    use super::*;

    #[tokio::test]
    async fn test_balances_filter_zero_rows() {
        let mock = MockRest::new();
        mock.reply(
            "/supplement/user_info_account.do",
            200,
            ok(json!({
                "balances": [
                    { "asset": "usdt", "free": "10.5", "locked": "1" },
                    { "asset": "cxs", "free": "0", "locked": "0" }
                ]
            })),
        );
        let lbank = connector(&mock);

        let all = lbank.get_balances(false).await.expect("balances");
        assert_eq!(all.len(), 2);

        let nonzero = lbank.get_balances(true).await.expect("balances");
        assert_eq!(nonzero.len(), 1);
        assert_eq!(nonzero[0].code, "USDT");
        assert_eq!(nonzero[0].total, dec!(11.5));
    }

    #[tokio::test]
    async fn test_deposit_address_uses_lowercase_asset() {
        let mock = MockRest::new();
        mock.reply(
            "/get_deposit_address.do",
            200,
            ok(json!({ "netWork": "erc20", "address": "0xabc" })),
        );
        let lbank = connector(&mock);

        let addresses = lbank.get_deposit_address("USDT").await.expect("address");
        assert_eq!(addresses[0].address, "0xabc");
        assert_eq!(addresses[0].network, "erc20");
        let call = &mock.calls_to("/get_deposit_address.do")[0];
        assert_eq!(param(call, "assetCode"), "usdt");
    }

    #[test]
    fn test_features_advertise_limit_only_trading() {
        let lbank = connector(&MockRest::new());
        let features = lbank.features();
        assert!(features.get_markets);
        assert!(!features.place_market_order);
        assert!(features.get_deposit_address);
    }
}

#[tokio::test]
async fn test_place_then_cancel_round_trip() {
    let mock = MockRest::new();
    mock.reply("/accuracy.do", 200, accuracy_body());
    mock.reply("/create_order.do", 200, ok(json!({ "order_id": "ord-42" })));
    mock.reply("/cancel_order.do", 200, soft_error(10025));
    let lbank = connector(&mock);

    let markets = lbank.get_markets().await.expect("markets");
    assert!(markets.contains_key("CXS/USDT"));

    let order =
        OrderRequest::limit(OrderSide::Sell, "CXS/USDT", dec!(1)).with_base_amount(dec!(10));
    let placed = lbank.place_order(order).await;
    let order_id = placed.order_id.expect("order accepted");
    assert!(placed.message.contains("sell 10"));

    // Already filled or cancelled on the exchange side still resolves to true
    assert_eq!(
        lbank.cancel_order(&order_id, Some(OrderSide::Sell), "CXS/USDT").await,
        Some(true)
    );
    assert_eq!(mock.calls_to("/accuracy.do").len(), 1);
}
