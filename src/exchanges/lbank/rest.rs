use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::exchanges::lbank::classifier::{classify, ClassifiedResponse};
use crate::exchanges::lbank::types::{
    LbankAccountInfo, LbankCancelResult, LbankCreatedOrder, LbankDepositAddress, LbankDepth,
    LbankMarket, LbankOrdersPage, LbankResponse, LbankTickerEntry, LbankTrade,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_DEPTH_SIZE: u32 = 200;
pub const DEFAULT_TRADES_SIZE: u32 = 100;
pub const DEFAULT_ORDERS_PAGE_LENGTH: u32 = 100;
/// `orders_info_history.do` status filter for orders still on the book
pub const OPEN_ORDERS_STATUS: &str = "0";

/// Typed wrapper around `RestClient` for the LBank v2 API
///
/// Every call goes through the response classifier: hard errors become
/// `Err(ExchangeError::HardError)`, soft errors keep their payload and carry
/// the annotation in `LbankResponse::error_message`.
#[derive(Debug, Clone)]
pub struct LbankRest<R: RestClient> {
    client: R,
    non_resolvable: Arc<[String]>,
}

impl<R: RestClient> LbankRest<R> {
    pub fn new(client: R, non_resolvable: Arc<[String]>) -> Self {
        Self {
            client,
            non_resolvable,
        }
    }

    fn describe_params(params: &[(&str, &str)]) -> String {
        if params.is_empty() {
            return "{ No parameters }".to_string();
        }
        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Issue a call and classify its outcome. Transport failures are `Err`.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        signed: bool,
    ) -> Result<ClassifiedResponse, ExchangeError> {
        let response = self
            .client
            .request(method, endpoint, params, signed)
            .await
            .map_err(|e| {
                warn!(
                    "Request to {} with data {} failed: {}",
                    endpoint,
                    Self::describe_params(params),
                    e
                );
                e
            })?;

        let classified = classify(&response, &self.non_resolvable);
        match &classified {
            ClassifiedResponse::Success(_) => {}
            ClassifiedResponse::SoftError { message, .. } => debug!(
                "LBank processed a request to {} with data {}, but with error: {}. Resolving",
                endpoint,
                Self::describe_params(params),
                message
            ),
            ClassifiedResponse::HardError(message) => warn!(
                "Request to {} with data {} failed: {}. Rejecting",
                endpoint,
                Self::describe_params(params),
                message
            ),
        }
        Ok(classified)
    }

    /// Issue a call and decode the envelope
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        signed: bool,
    ) -> Result<LbankResponse<T>, ExchangeError> {
        let (payload, error_message) = self
            .request(method, endpoint, params, signed)
            .await?
            .into_payload()?;

        let mut response: LbankResponse<T> = serde_json::from_value(payload).map_err(|e| {
            ExchangeError::DeserializationError(format!(
                "Unable to process data from {}: {}",
                endpoint, e
            ))
        })?;
        response.error_message = error_message;
        Ok(response)
    }

    /// Trading rules for every pair
    pub async fn get_markets(&self) -> Result<LbankResponse<Vec<LbankMarket>>, ExchangeError> {
        self.call(Method::GET, "/accuracy.do", &[], false).await
    }

    pub async fn get_ticker(
        &self,
        symbol: &str,
    ) -> Result<LbankResponse<Vec<LbankTickerEntry>>, ExchangeError> {
        self.call(Method::GET, "/ticker.do", &[("symbol", symbol)], false)
            .await
    }

    pub async fn get_depth(
        &self,
        symbol: &str,
        size: u32,
    ) -> Result<LbankResponse<LbankDepth>, ExchangeError> {
        let size = size.to_string();
        self.call(
            Method::GET,
            "/depth.do",
            &[("symbol", symbol), ("size", &size)],
            false,
        )
        .await
    }

    pub async fn get_trades(
        &self,
        symbol: &str,
        size: u32,
    ) -> Result<LbankResponse<Vec<LbankTrade>>, ExchangeError> {
        let size = size.to_string();
        self.call(
            Method::GET,
            "/trades.do",
            &[("symbol", symbol), ("size", &size)],
            false,
        )
        .await
    }

    /// Account balances (requires authentication)
    pub async fn get_user_info(&self) -> Result<LbankResponse<LbankAccountInfo>, ExchangeError> {
        self.call(Method::POST, "/supplement/user_info_account.do", &[], true)
            .await
    }

    pub async fn get_deposit_address(
        &self,
        asset_code: &str,
    ) -> Result<LbankResponse<LbankDepositAddress>, ExchangeError> {
        self.call(
            Method::POST,
            "/get_deposit_address.do",
            &[("assetCode", asset_code)],
            true,
        )
        .await
    }

    /// First page of orders with the given status filter
    pub async fn get_orders(
        &self,
        symbol: &str,
        page_length: u32,
        status: &str,
    ) -> Result<LbankResponse<LbankOrdersPage>, ExchangeError> {
        let page_length = page_length.to_string();
        self.call(
            Method::POST,
            "/orders_info_history.do",
            &[
                ("symbol", symbol),
                ("current_page", "1"),
                ("page_length", &page_length),
                ("status", status),
            ],
            true,
        )
        .await
    }

    /// Place a limit order; `side` is `buy` or `sell`
    pub async fn create_order(
        &self,
        symbol: &str,
        side: &str,
        price: &str,
        amount: &str,
    ) -> Result<LbankResponse<LbankCreatedOrder>, ExchangeError> {
        self.call(
            Method::POST,
            "/create_order.do",
            &[
                ("symbol", symbol),
                ("type", side),
                ("price", price),
                ("amount", amount),
            ],
            true,
        )
        .await
    }

    /// Cancel one order, or several with comma-joined ids
    pub async fn cancel_order(
        &self,
        order_ids: &str,
        symbol: &str,
    ) -> Result<LbankResponse<LbankCancelResult>, ExchangeError> {
        self.call(
            Method::POST,
            "/cancel_order.do",
            &[("order_id", order_ids), ("symbol", symbol)],
            true,
        )
        .await
    }
}
