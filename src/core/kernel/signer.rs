use crate::core::errors::ExchangeError;
use std::collections::{BTreeMap, HashMap};

/// Result type for signing operations
pub type SignatureResult = Result<SignedRequest, ExchangeError>;

/// Signer trait for request authentication
///
/// Implementations inject whatever authentication fields the exchange requires,
/// canonicalize the full parameter set and produce a signature over it.
pub trait Signer: Send + Sync {
    /// Sign a request
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, etc.)
    /// * `endpoint` - API endpoint path
    /// * `params` - Caller parameters, before authentication fields are injected
    /// * `timestamp` - Request timestamp in milliseconds
    fn sign_request(
        &self,
        method: &str,
        endpoint: &str,
        params: &[(&str, &str)],
        timestamp: u64,
    ) -> SignatureResult;
}

/// A signed, ready-to-send parameter set. Built per call and never reused.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub path: String,
    /// Every signed parameter, injected fields included, sorted by key
    pub params: BTreeMap<String, String>,
    pub timestamp: u64,
    pub nonce: String,
    pub signature: String,
    /// Name of the query parameter carrying the signature
    pub signature_key: String,
    pub headers: HashMap<String, String>,
}

impl SignedRequest {
    /// The exact string the signature was computed over
    pub fn canonical_query(&self) -> String {
        canonical_query_string(&self.params)
    }

    /// Canonical string with the signature appended; the signature itself is never signed
    pub fn query_string(&self) -> String {
        let canonical = self.canonical_query();
        if canonical.is_empty() {
            format!("{}={}", self.signature_key, self.signature)
        } else {
            format!("{}&{}={}", canonical, self.signature_key, self.signature)
        }
    }
}

/// Join sorted parameters as `key=value` pairs with `&`
pub fn canonical_query_string(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_query_is_sorted() {
        let mut params = BTreeMap::new();
        params.insert("symbol".to_string(), "btc_usdt".to_string());
        params.insert("amount".to_string(), "1".to_string());
        params.insert("type".to_string(), "buy".to_string());
        assert_eq!(
            canonical_query_string(&params),
            "amount=1&symbol=btc_usdt&type=buy"
        );
    }

    #[test]
    fn test_signature_appended_after_canonical_string() {
        let mut params = BTreeMap::new();
        params.insert("a".to_string(), "1".to_string());
        let signed = SignedRequest {
            path: "/x".to_string(),
            params,
            timestamp: 0,
            nonce: String::new(),
            signature: "abc".to_string(),
            signature_key: "sign".to_string(),
            headers: HashMap::new(),
        };
        assert_eq!(signed.canonical_query(), "a=1");
        assert_eq!(signed.query_string(), "a=1&sign=abc");
    }
}
