use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::{canonical_query_string, SignatureResult, SignedRequest, Signer};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use rand::RngCore;
use sha2::Sha256;
use std::collections::{BTreeMap, HashMap};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_METHOD: &str = "HmacSHA256";
pub const SIGNATURE_KEY: &str = "sign";

/// LBank signer: HMAC-SHA256 over the upper-cased MD5 digest of the sorted query
#[derive(Debug, Clone)]
pub struct LbankSigner {
    api_key: String,
    secret_key: String,
}

impl LbankSigner {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key,
            secret_key,
        }
    }

    /// 16 random bytes, hex encoded
    pub fn generate_echostr() -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Sign an already canonicalized query string
    pub fn sign_canonical(&self, canonical: &str) -> Result<String, ExchangeError> {
        let digest = hex::encode_upper(Md5::digest(canonical.as_bytes()));

        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|_| ExchangeError::AuthError("Invalid secret key".to_string()))?;
        mac.update(digest.as_bytes());

        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Inject the authentication fields and sign with a caller-supplied nonce
    pub fn sign_with_nonce(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        timestamp: u64,
        echostr: &str,
    ) -> SignatureResult {
        if self.api_key.is_empty() || self.secret_key.is_empty() {
            return Err(ExchangeError::AuthError(
                "API key and secret key are required for signed requests".to_string(),
            ));
        }

        let mut signed_params: BTreeMap<String, String> = params
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        signed_params.insert("api_key".to_string(), self.api_key.clone());
        signed_params.insert("timestamp".to_string(), timestamp.to_string());
        signed_params.insert("signature_method".to_string(), SIGNATURE_METHOD.to_string());
        signed_params.insert("echostr".to_string(), echostr.to_string());

        let signature = self.sign_canonical(&canonical_query_string(&signed_params))?;

        Ok(SignedRequest {
            path: endpoint.to_string(),
            params: signed_params,
            timestamp,
            nonce: echostr.to_string(),
            signature,
            signature_key: SIGNATURE_KEY.to_string(),
            headers: HashMap::new(),
        })
    }
}

impl Signer for LbankSigner {
    fn sign_request(
        &self,
        _method: &str,
        endpoint: &str,
        params: &[(&str, &str)],
        timestamp: u64,
    ) -> SignatureResult {
        self.sign_with_nonce(endpoint, params, timestamp, &Self::generate_echostr())
    }
}
