use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::Signer;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument, trace};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A completed HTTP exchange, whatever its status
///
/// Non-2xx statuses are not errors at this layer: exchanges put business
/// outcomes in the payload, so interpretation is left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    /// Parsed JSON payload, `None` when the body was empty or not JSON
    pub body: Option<Value>,
}

impl HttpResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// REST client trait for making HTTP requests
///
/// Implementations only deal with transport: building the URL or form body,
/// signing through the configured `Signer`, and returning the raw outcome.
/// A request that never produced a response is an `Err`.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Make a request with the given method
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `endpoint` - The API endpoint path
    /// * `params` - Parameters as key-value pairs
    /// * `authenticated` - Whether to sign the request
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<HttpResponse, ExchangeError>;

    /// Make a GET request
    async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<HttpResponse, ExchangeError> {
        self.request(Method::GET, endpoint, params, authenticated)
            .await
    }

    /// Make a POST request; parameters travel as a form-encoded body
    async fn post(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<HttpResponse, ExchangeError> {
        self.request(Method::POST, endpoint, params, authenticated)
            .await
    }

    /// Make a DELETE request
    async fn delete(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<HttpResponse, ExchangeError> {
        self.request(Method::DELETE, endpoint, params, authenticated)
            .await
    }
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Timeout for unauthenticated requests, in seconds
    pub timeout_seconds: u64,
    /// Timeout for signed requests, in seconds
    pub signed_timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    /// Create a new configuration
    ///
    /// Signed requests carry replay-sensitive nonces, so they get the shorter timeout.
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            timeout_seconds: 20,
            signed_timeout_seconds: 10,
            user_agent: concat!("lbankx/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set the timeout for unauthenticated requests
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the timeout for signed requests
    pub fn with_signed_timeout(mut self, timeout_seconds: u64) -> Self {
        self.signed_timeout_seconds = timeout_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Build the REST client
    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                ExchangeError::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            config: self.config,
            signer: self.signer,
        })
    }
}

/// Everything needed to send one call
#[derive(Debug)]
struct PreparedRequest {
    url: String,
    /// Form-encoded parameters; POST only
    body: Option<String>,
    headers: HashMap<String, String>,
    timeout: Duration,
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    /// Create a new `ReqwestRest` instance with default timeouts
    pub fn new(
        base_url: String,
        exchange_name: String,
        signer: Option<Arc<dyn Signer>>,
    ) -> Result<Self, ExchangeError> {
        let config = RestClientConfig::new(base_url, exchange_name);
        let mut builder = RestClientBuilder::new(config);
        if let Some(signer) = signer {
            builder = builder.with_signer(signer);
        }
        builder.build()
    }

    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    /// Get the current timestamp in milliseconds
    fn get_timestamp() -> Result<u64, ExchangeError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .map_err(|e| ExchangeError::Other(format!("Failed to get timestamp: {}", e)))
    }

    /// Build the full URL for an endpoint
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url, endpoint)
    }

    /// Create query string from parameters, keeping caller order
    fn create_query_string(params: &[(&str, &str)]) -> String {
        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Read the status and body; a body that is not JSON yields `None`
    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<HttpResponse, ExchangeError> {
        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            ExchangeError::NetworkError(format!("Failed to read response body: {}", e))
        })?;

        trace!("Response body: {}", response_text);

        let body = match serde_json::from_str::<Value>(&response_text) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(e) => {
                if !response_text.is_empty() {
                    debug!("Response body is not JSON: {}", e);
                }
                None
            }
        };

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }

    /// Resolve URL, body, headers and timeout. Signing happens here, so a
    /// missing signer fails before anything touches the network.
    fn prepare_request(
        &self,
        method: &Method,
        endpoint: &str,
        params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<PreparedRequest, ExchangeError> {
        let url = self.build_url(endpoint);

        let (query_string, mut headers, timeout) = if authenticated {
            let signer = self.signer.as_ref().ok_or_else(|| {
                ExchangeError::AuthError(
                    "Authentication required but no signer provided".to_string(),
                )
            })?;
            let timestamp = Self::get_timestamp()?;
            let signed = signer.sign_request(method.as_str(), endpoint, params, timestamp)?;
            (
                signed.query_string(),
                signed.headers,
                self.config.signed_timeout_seconds,
            )
        } else {
            (
                Self::create_query_string(params),
                HashMap::new(),
                self.config.timeout_seconds,
            )
        };

        if *method == Method::POST || authenticated {
            headers.insert(CONTENT_TYPE.as_str().to_string(), FORM_CONTENT_TYPE.to_string());
        }

        let (url, body) = if *method == Method::POST {
            (url, Some(query_string))
        } else if query_string.is_empty() {
            (url, None)
        } else {
            (format!("{}?{}", url, query_string), None)
        };

        Ok(PreparedRequest {
            url,
            body,
            headers,
            timeout: Duration::from_secs(timeout),
        })
    }

    #[instrument(skip(self, params), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint))]
    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<HttpResponse, ExchangeError> {
        let prepared = self.prepare_request(&method, endpoint, params, authenticated)?;

        let mut request = self.client.request(method, &prepared.url);
        for (key, value) in &prepared.headers {
            request = request.header(key, value);
        }
        if let Some(body) = prepared.body {
            request = request.body(body);
        }

        let response = request
            .timeout(prepared.timeout)
            .send()
            .await
            .map_err(|e| ExchangeError::NetworkError(format!("Request failed: {}", e)))?;

        self.handle_response(response).await
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<HttpResponse, ExchangeError> {
        self.make_request(method, endpoint, params, authenticated)
            .await
    }
}
