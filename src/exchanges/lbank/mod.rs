pub mod builder;
pub mod classifier;
pub mod connector;
pub mod conversions;
pub mod market_cache;
pub mod rest;
pub mod signer;
pub mod types;

// Re-export main types for easier importing
pub use builder::{build_connector, LbankBuilder, DEFAULT_BASE_URL};
pub use classifier::{classify, ClassifiedResponse, DEFAULT_NON_RESOLVABLE_ERRORS};
pub use connector::LbankConnector;
pub use conversions::{to_canonical_format, to_exchange_format};
pub use market_cache::{MarketCache, MarketMap};
pub use rest::LbankRest;
pub use signer::LbankSigner;
