use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::exchanges::lbank::classifier::DEFAULT_NON_RESOLVABLE_ERRORS;
use crate::exchanges::lbank::connector::LbankConnector;
use crate::exchanges::lbank::signer::LbankSigner;
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "https://api.lbkex.com/v2";
pub const EXCHANGE_NAME: &str = "lbank";

/// Fluent builder for an LBank connector
#[derive(Clone)]
pub struct LbankBuilder {
    base_url: String,
    api_key: String,
    secret_key: String,
    public_only: bool,
    timeout_seconds: Option<u64>,
    signed_timeout_seconds: Option<u64>,
    user_agent: Option<String>,
    non_resolvable_errors: Vec<String>,
}

impl Default for LbankBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            secret_key: String::new(),
            public_only: false,
            timeout_seconds: None,
            signed_timeout_seconds: None,
            user_agent: None,
            non_resolvable_errors: DEFAULT_NON_RESOLVABLE_ERRORS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl LbankBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an `ExchangeConfig`; public-only configs never carry credentials
    pub fn from_config(config: &ExchangeConfig) -> Self {
        let mut builder = Self::new().public_only(config.public_only);
        if let Some(base_url) = &config.base_url {
            builder = builder.with_base_url(base_url.clone());
        }
        if config.has_credentials() {
            builder = builder.with_credentials(
                config.api_key().to_string(),
                config.secret_key().to_string(),
            );
        }
        builder
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_credentials(mut self, api_key: String, secret_key: String) -> Self {
        self.api_key = api_key;
        self.secret_key = secret_key;
        self
    }

    /// Restrict to unauthenticated endpoints and drop any stored credentials
    pub fn public_only(mut self, public_only: bool) -> Self {
        self.public_only = public_only;
        if public_only {
            self.api_key.clear();
            self.secret_key.clear();
        }
        self
    }

    /// Timeout for public calls, in seconds
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Timeout for signed calls, in seconds
    pub fn with_signed_timeout(mut self, seconds: u64) -> Self {
        self.signed_timeout_seconds = Some(seconds);
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    /// Replace the error substrings that are never resolved as soft errors
    pub fn with_non_resolvable_errors(mut self, errors: Vec<String>) -> Self {
        self.non_resolvable_errors = errors;
        self
    }

    pub fn add_non_resolvable_error(mut self, error: impl Into<String>) -> Self {
        self.non_resolvable_errors.push(error.into());
        self
    }

    fn rest_config(&self) -> RestClientConfig {
        let mut config = RestClientConfig::new(self.base_url.clone(), EXCHANGE_NAME.to_string());
        if let Some(seconds) = self.timeout_seconds {
            config = config.with_timeout(seconds);
        }
        if let Some(seconds) = self.signed_timeout_seconds {
            config = config.with_signed_timeout(seconds);
        }
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }
        config
    }

    fn signs_requests(&self) -> bool {
        !self.public_only && !self.api_key.is_empty() && !self.secret_key.is_empty()
    }

    /// Build the REST transport on its own
    pub fn build_rest(&self) -> Result<ReqwestRest, ExchangeError> {
        let mut rest_builder = RestClientBuilder::new(self.rest_config());
        if self.signs_requests() {
            let signer = Arc::new(LbankSigner::new(
                self.api_key.clone(),
                self.secret_key.clone(),
            ));
            rest_builder = rest_builder.with_signer(signer);
        }
        rest_builder.build()
    }

    pub fn build(self) -> Result<LbankConnector<ReqwestRest>, ExchangeError> {
        if self.base_url.is_empty() {
            return Err(ExchangeError::ConfigurationError(
                "LBank base URL must not be empty".to_string(),
            ));
        }
        let rest = self.build_rest()?;
        Ok(LbankConnector::with_non_resolvable_errors(
            rest,
            self.non_resolvable_errors,
        ))
    }
}

/// Create an LBank connector from configuration
pub fn build_connector(
    config: ExchangeConfig,
) -> Result<LbankConnector<ReqwestRest>, ExchangeError> {
    LbankBuilder::from_config(&config).build()
}
