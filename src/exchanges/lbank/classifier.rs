use crate::core::errors::ExchangeError;
use crate::core::kernel::HttpResponse;
use serde_json::Value;

/// Error substrings that must never be resolved as soft errors: the exchange
/// reports a transient precondition (nonce replay, pending operation).
pub const DEFAULT_NON_RESOLVABLE_ERRORS: [&str; 2] = ["nonce", "pending"];

const NO_ERROR_CODE: &str = "0";

/// Outcome of an LBank call once status and payload have been inspected
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedResponse {
    /// No error code, or the "no error" sentinel
    Success(Value),
    /// Processed by the exchange but flagged; the payload is kept for the caller
    SoftError { payload: Value, message: String },
    /// Rejected; nothing in the payload may be trusted
    HardError(String),
}

impl ClassifiedResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Payload for success and soft errors, plus the soft error annotation
    pub fn into_payload(self) -> Result<(Value, Option<String>), ExchangeError> {
        match self {
            Self::Success(payload) => Ok((payload, None)),
            Self::SoftError { payload, message } => Ok((payload, Some(message))),
            Self::HardError(message) => Err(ExchangeError::HardError(message)),
        }
    }
}

/// Classify a completed HTTP call
///
/// Non-2xx statuses are hard errors whatever the payload says. Within 2xx the
/// payload's `error_code` decides, and a code matching one of `non_resolvable`
/// is escalated to a hard error.
pub fn classify(response: &HttpResponse, non_resolvable: &[String]) -> ClassifiedResponse {
    let error_code = response.body.as_ref().and_then(extract_error_code);
    let message = error_message(response, error_code.as_deref());

    if !response.is_success() {
        if response.status == 404 {
            return ClassifiedResponse::HardError(format!("{}. Not found", message));
        }
        return ClassifiedResponse::HardError(message);
    }

    let payload = response.body.clone();
    match (error_code, payload) {
        (None, payload) => ClassifiedResponse::Success(payload.unwrap_or(Value::Null)),
        (Some(code), Some(payload)) if code == NO_ERROR_CODE => {
            ClassifiedResponse::Success(payload)
        }
        (Some(code), Some(payload)) => {
            let exchange_msg = payload.get("msg").and_then(Value::as_str).unwrap_or_default();
            let blocked = non_resolvable
                .iter()
                .any(|needle| code.contains(needle.as_str()) || exchange_msg.contains(needle.as_str()));
            if blocked {
                ClassifiedResponse::HardError(message)
            } else {
                ClassifiedResponse::SoftError { payload, message }
            }
        }
        // An error code without a payload cannot occur; it was read from the payload
        (Some(_), None) => ClassifiedResponse::HardError(message),
    }
}

/// `error_code` as a string; absent, null or empty count as no code
fn extract_error_code(body: &Value) -> Option<String> {
    match body.get("error_code")? {
        Value::String(code) if !code.trim().is_empty() => Some(code.trim().to_string()),
        Value::Number(code) => Some(code.to_string()),
        _ => None,
    }
}

fn payload_flags_success(body: Option<&Value>) -> bool {
    body.and_then(|b| b.get("result").or_else(|| b.get("success")))
        .map_or(false, |flag| match flag {
            Value::Bool(flag) => *flag,
            Value::String(flag) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        })
}

/// `"{status} {reason}, [{code}]"`, with the code's description when known
fn error_message(response: &HttpResponse, error_code: Option<&str>) -> String {
    let code_info = match error_code {
        Some(code) if code != NO_ERROR_CODE && !payload_flags_success(response.body.as_ref()) => {
            match describe_error_code(code) {
                Some(description) => format!("[{}] {}", code, description),
                None => format!("[{}]", code),
            }
        }
        _ => "[No error code]".to_string(),
    };
    format!("{} {}, {}", response.status, response.status_text, code_info)
}

/// Descriptions for well-known LBank error codes
pub fn describe_error_code(code: &str) -> Option<&'static str> {
    let description = match code {
        "10000" => "Internal error",
        "10001" => "The required parameters can not be empty",
        "10002" => "Validation failed",
        "10003" => "Invalid parameter",
        "10004" => "Request too frequent",
        "10005" => "Secret key does not exist",
        "10006" => "User does not exist",
        "10007" => "Invalid signature",
        "10008" => "This currency pair is not supported",
        "10009" => "The limit order can not be missing the order price and order quantity",
        "10010" => "Order price or order quantity must be greater than 0",
        "10013" => "The minimum amount of sell quantity is not met",
        "10014" => "Insufficient amount of money in account",
        "10016" => "Insufficient balance",
        "10022" => "Insufficient key authority",
        "10025" => "Order has been filled",
        "10026" => "Order has been cancelled",
        _ => return None,
    };
    Some(description)
}
