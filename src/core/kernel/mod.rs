/// Kernel - transport layer shared by exchange adapters
///
/// The kernel contains only transport logic and generic interfaces. Anything
/// that depends on how a particular exchange encodes success or failure
/// lives with that exchange.
///
/// ## Transport
/// - `RestClient`: HTTP client interface returning the raw outcome (`HttpResponse`)
/// - `ReqwestRest`: reqwest-backed implementation with per-call timeouts
///
/// ## Authentication
/// - `Signer`: pluggable request signing producing a `SignedRequest`
///
/// # Basic REST-only usage
/// ```rust,no_run
/// use lbankx::core::kernel::*;
/// use lbankx::exchanges::lbank::signer::LbankSigner;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rest_config = RestClientConfig::new("https://api.lbkex.com/v2".to_string(), "lbank".to_string());
/// let signer = Arc::new(LbankSigner::new("api_key".to_string(), "secret_key".to_string()));
/// let rest = RestClientBuilder::new(rest_config)
///     .with_signer(signer)
///     .build()?;
///
/// let response = rest.get("/accuracy.do", &[], false).await?;
/// println!("HTTP {} {}", response.status, response.status_text);
/// # Ok(())
/// # }
/// ```
pub mod rest;
pub mod signer;

pub use rest::{HttpResponse, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{canonical_query_string, SignatureResult, SignedRequest, Signer};
