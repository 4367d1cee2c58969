use crate::core::kernel::RestClient;
use crate::core::traits::AccountInfo;
use crate::core::types::{Balance, DepositAddress};
use crate::exchanges::lbank::conversions::convert_lbank_balance;
use crate::exchanges::lbank::rest::LbankRest;
use async_trait::async_trait;
use tracing::warn;

/// Account operations for LBank
pub struct Account<R: RestClient> {
    rest: LbankRest<R>,
}

impl<R: RestClient> Account<R> {
    pub fn new(rest: LbankRest<R>) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl<R: RestClient + 'static> AccountInfo for Account<R> {
    async fn get_balances(&self, nonzero: bool) -> Option<Vec<Balance>> {
        let response = match self.rest.get_user_info().await {
            Ok(response) => response,
            Err(e) => {
                warn!("API request getBalances(nonzero: {}) of LBank module failed. {}", nonzero, e);
                return None;
            }
        };

        if !response.is_ok() {
            warn!(
                "API request getBalances(nonzero: {}) of LBank module failed. error code: {}",
                nonzero,
                response.error_code()
            );
            return None;
        }

        let Some(info) = response.data else {
            warn!("Error while processing getBalances(nonzero: {}) request: no account data", nonzero);
            return None;
        };

        let balances = info
            .balances
            .iter()
            .map(convert_lbank_balance)
            .filter(|balance| !nonzero || !balance.free.is_zero() || !balance.freezed.is_zero())
            .collect();
        Some(balances)
    }

    async fn get_deposit_address(&self, coin: &str) -> Option<Vec<DepositAddress>> {
        let response = match self.rest.get_deposit_address(&coin.to_lowercase()).await {
            Ok(response) => response,
            Err(e) => {
                warn!("API request getDepositAddress(coin: {}) of LBank module failed. {}", coin, e);
                return None;
            }
        };

        if !response.is_ok() {
            warn!(
                "API request getDepositAddress(coin: {}) of LBank module failed. error code: {}",
                coin,
                response.error_code()
            );
            return None;
        }

        response.data.map(|data| {
            vec![DepositAddress {
                network: data.network.unwrap_or_default(),
                address: data.address,
            }]
        })
    }
}
