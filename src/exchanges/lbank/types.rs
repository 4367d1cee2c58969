use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// Envelope shared by every LBank v2 response
#[derive(Debug, Clone, Deserialize)]
pub struct LbankResponse<T> {
    #[serde(default, deserialize_with = "flexible::boolean")]
    pub result: bool,
    #[serde(default, deserialize_with = "flexible::optional_string")]
    pub error_code: Option<String>,
    pub data: Option<T>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default, deserialize_with = "flexible::optional_string")]
    pub ts: Option<String>,
    /// Set when the classifier resolved the call as a soft error
    #[serde(skip)]
    pub error_message: Option<String>,
}

impl<T> LbankResponse<T> {
    /// `result` set and error code absent or zero
    pub fn is_ok(&self) -> bool {
        self.result && self.error_code.as_deref().map_or(true, |code| code == "0")
    }

    pub fn error_code(&self) -> &str {
        self.error_code.as_deref().unwrap_or("none")
    }
}

/// Row of `/accuracy.do`
#[derive(Debug, Clone, Deserialize)]
pub struct LbankMarket {
    pub symbol: String,
    #[serde(rename = "quantityAccuracy", deserialize_with = "flexible::uint")]
    pub quantity_accuracy: u32,
    #[serde(rename = "priceAccuracy", deserialize_with = "flexible::uint")]
    pub price_accuracy: u32,
    #[serde(
        rename = "minTranQua",
        default,
        deserialize_with = "flexible::optional_decimal"
    )]
    pub min_tran_qua: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LbankAccountInfo {
    #[serde(default)]
    pub balances: Vec<LbankBalance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LbankBalance {
    pub asset: String,
    #[serde(deserialize_with = "flexible::decimal")]
    pub free: Decimal,
    #[serde(deserialize_with = "flexible::decimal")]
    pub locked: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LbankDepositAddress {
    #[serde(rename = "netWork", default)]
    pub network: Option<String>,
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LbankOrdersPage {
    /// Absent when there are no open orders
    #[serde(default)]
    pub orders: Option<Vec<LbankOrder>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LbankOrder {
    #[serde(deserialize_with = "flexible::string")]
    pub order_id: String,
    pub symbol: String,
    #[serde(deserialize_with = "flexible::decimal")]
    pub price: Decimal,
    /// Compound side/type, e.g. `buy`, `sell_maker`, `buy_market`
    #[serde(rename = "type")]
    pub order_type: String,
    #[serde(deserialize_with = "flexible::int")]
    pub create_time: i64,
    #[serde(deserialize_with = "flexible::decimal")]
    pub amount: Decimal,
    #[serde(deserialize_with = "flexible::decimal")]
    pub deal_amount: Decimal,
    #[serde(deserialize_with = "flexible::int")]
    pub status: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LbankCreatedOrder {
    #[serde(default, deserialize_with = "flexible::optional_string")]
    pub order_id: Option<String>,
}

/// `/cancel_order.do` data. A single-order cancel echoes `order_id`; a batch
/// reports comma-separated `success` and `error` lists instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LbankCancelResult {
    #[serde(default, deserialize_with = "flexible::optional_string")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "flexible::optional_string")]
    pub success: Option<String>,
    #[serde(default, deserialize_with = "flexible::optional_string")]
    pub error: Option<String>,
}

impl LbankCancelResult {
    pub fn succeeded_ids(&self) -> Vec<String> {
        split_ids(self.success.as_deref())
    }

    pub fn failed_ids(&self) -> Vec<String> {
        split_ids(self.error.as_deref())
    }
}

fn split_ids(list: Option<&str>) -> Vec<String> {
    list.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LbankDepth {
    #[serde(default)]
    pub asks: Vec<LbankDepthLevel>,
    #[serde(default)]
    pub bids: Vec<LbankDepthLevel>,
}

/// `[price, amount]`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LbankDepthLevel(
    #[serde(deserialize_with = "flexible::decimal")] pub Decimal,
    #[serde(deserialize_with = "flexible::decimal")] pub Decimal,
);

#[derive(Debug, Clone, Deserialize)]
pub struct LbankTrade {
    #[serde(deserialize_with = "flexible::decimal")]
    pub amount: Decimal,
    #[serde(deserialize_with = "flexible::decimal")]
    pub price: Decimal,
    #[serde(deserialize_with = "flexible::int")]
    pub date_ms: i64,
    #[serde(rename = "type")]
    pub side: String,
    #[serde(deserialize_with = "flexible::string")]
    pub tid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LbankTickerEntry {
    #[serde(default)]
    pub symbol: Option<String>,
    pub ticker: LbankTicker,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LbankTicker {
    #[serde(deserialize_with = "flexible::decimal")]
    pub vol: Decimal,
    #[serde(deserialize_with = "flexible::decimal")]
    pub turnover: Decimal,
    #[serde(deserialize_with = "flexible::decimal")]
    pub high: Decimal,
    #[serde(deserialize_with = "flexible::decimal")]
    pub low: Decimal,
    #[serde(deserialize_with = "flexible::decimal")]
    pub latest: Decimal,
}

/// Deserializers for fields LBank sends either as JSON strings or numbers
pub(crate) mod flexible {
    use super::{Decimal, Deserializer};
    use crate::core::types::conversion::parse_decimal;
    use serde::de::{self, Visitor};
    use std::fmt;

    struct StringOrNumber;

    impl<'de> Visitor<'de> for StringOrNumber {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or number")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
            Ok(value.to_owned())
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<String, E> {
            Ok(value.to_string())
        }
    }

    struct OptionalStringOrNumber;

    impl<'de> Visitor<'de> for OptionalStringOrNumber {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an optional string or number")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            string(deserializer).map(Some)
        }
    }

    struct FlexibleBool;

    impl<'de> Visitor<'de> for FlexibleBool {
        type Value = bool;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a boolean, \"true\"/\"false\" or 0/1")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<bool, E> {
            Ok(value.eq_ignore_ascii_case("true") || value == "1")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<bool, E> {
            Ok(value != 0)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<bool, E> {
            Ok(value != 0)
        }

        fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        deserializer.deserialize_any(StringOrNumber)
    }

    pub fn optional_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        deserializer.deserialize_option(OptionalStringOrNumber)
    }

    pub fn boolean<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        deserializer.deserialize_any(FlexibleBool)
    }

    pub fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let raw = string(deserializer)?;
        parse_decimal(&raw).map_err(de::Error::custom)
    }

    pub fn optional_decimal<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Decimal>, D::Error> {
        match optional_string(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => {
                parse_decimal(&raw).map(Some).map_err(de::Error::custom)
            }
            _ => Ok(None),
        }
    }

    pub fn uint<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let raw = string(deserializer)?;
        raw.trim().parse::<u32>().map_err(de::Error::custom)
    }

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let raw = string(deserializer)?;
        let trimmed = raw.trim();
        trimmed
            .parse::<i64>()
            .or_else(|_| trimmed.parse::<f64>().map(|v| v as i64))
            .map_err(de::Error::custom)
    }
}
