//! Header names, endpoint paths and defaults of the CasPay backend.

/// Header carrying the merchant API key.
pub const API_KEY_HEADER: &str = "X-CasPay-Key";

/// Header carrying the SDK version.
pub const SDK_VERSION_HEADER: &str = "X-CasPay-SDK-Version";

/// Version of this SDK.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix of the `User-Agent` sent with every request.
pub const USER_AGENT_PREFIX: &str = "CasPay-SDK-Rust";

/// `POST` endpoint that records a payment.
pub const RECORD_PAYMENT_PATH: &str = "/v1/payments/record";

/// `GET` endpoint that checks subscription status.
pub const SUBSCRIPTION_CHECK_PATH: &str = "/v1/subscriptions/check";

/// `GET` endpoint that validates the API key.
pub const VALIDATE_KEY_PATH: &str = "/v1/validate-key";

/// `POST` endpoint that relays a signed deploy to a Casper node.
pub const RPC_RELAY_PATH: &str = "/rpc";

/// Currency recorded when a plain payment names none.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Currency recorded for wallet payments that name none.
pub const NATIVE_CURRENCY: &str = "CSPR";

/// Returns the `User-Agent` value, e.g. `CasPay-SDK-Rust/0.1.0`.
#[must_use]
pub fn user_agent() -> String {
    format!("{USER_AGENT_PREFIX}/{SDK_VERSION}")
}
