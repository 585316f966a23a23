//! Request and response types for the CasPay backend and the payment flows.
//!
//! Request types use `camelCase` field names on the caller side. The backend
//! speaks `snake_case`; the wire payloads are built by the resources in
//! `caspay-http`.

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};

use crate::error::CasPayError;
use crate::network::Network;

/// Parameters for recording a payment.
///
/// Exactly one of `product_id` / `subscription_plan_id` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentParams {
    /// Sender's Casper public key (hex).
    pub sender_address: String,

    /// Casper deploy hash. A `mock_tx_<millis>` placeholder is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,

    /// Product id for one-time payments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,

    /// Subscription plan id for recurring payments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_plan_id: Option<String>,

    /// Payment amount.
    pub amount: f64,

    /// Currency code. Defaults to `USD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl PaymentParams {
    /// Creates parameters for a one-time product payment.
    #[must_use]
    pub fn for_product(
        sender_address: impl Into<String>,
        product_id: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            sender_address: sender_address.into(),
            product_id: Some(product_id.into()),
            amount,
            ..Self::default()
        }
    }

    /// Creates parameters for a subscription payment.
    #[must_use]
    pub fn for_subscription(
        sender_address: impl Into<String>,
        subscription_plan_id: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            sender_address: sender_address.into(),
            subscription_plan_id: Some(subscription_plan_id.into()),
            amount,
            ..Self::default()
        }
    }

    /// Sets the on-chain transaction hash.
    #[must_use]
    pub fn with_transaction_hash(mut self, hash: impl Into<String>) -> Self {
        self.transaction_hash = Some(hash.into());
        self
    }

    /// Sets the currency code.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }
}

/// A recorded payment as returned by the backend.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentRecord {
    /// Payment id.
    #[serde_as(as = "DefaultOnNull")]
    pub id: String,
    /// Recorded transaction hash.
    #[serde_as(as = "DefaultOnNull")]
    pub transaction_hash: String,
    /// Amount.
    #[serde_as(as = "DefaultOnNull")]
    pub amount: f64,
    /// Token or currency symbol.
    #[serde_as(as = "DefaultOnNull")]
    pub token: String,
    /// Payment status.
    #[serde_as(as = "DefaultOnNull")]
    pub status: String,
    /// Invoice number.
    #[serde_as(as = "DefaultOnNull")]
    pub invoice_number: String,
    /// Creation time (RFC 3339).
    #[serde_as(as = "DefaultOnNull")]
    pub created_at: String,
    /// Subscription plan id, for subscription payments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_plan_id: Option<String>,
}

/// On-chain verification details attached to a recorded payment.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentVerification {
    /// Whether the backend verified the transaction on chain.
    #[serde_as(as = "DefaultOnNull")]
    pub verified: bool,
    /// Verified transaction hash.
    #[serde_as(as = "DefaultOnNull")]
    pub transaction_hash: String,
    /// Verified amount.
    #[serde_as(as = "DefaultOnNull")]
    pub amount: f64,
}

/// Response of `POST /v1/payments/record`.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentResponse {
    /// Whether the backend accepted the record.
    #[serde_as(as = "DefaultOnNull")]
    pub success: bool,
    /// The recorded payment.
    #[serde_as(as = "DefaultOnNull")]
    pub payment: PaymentRecord,
    /// Verification details, when the backend checked the chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<PaymentVerification>,
    /// Set when the transaction hash had already been recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,
    /// Id of the subscription created by a subscription payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    /// Backend processing time.
    #[serde(rename = "responseTime", skip_serializing_if = "Option::is_none")]
    pub response_time: Option<String>,
}

/// Parameters for a subscription status check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCheckParams {
    /// Subscriber's Casper public key (hex).
    pub subscriber_address: String,

    /// Restrict the check to a single plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,

    /// Network override. Falls back to the SDK configuration, then testnet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
}

impl SubscriptionCheckParams {
    /// Creates parameters for the given subscriber.
    #[must_use]
    pub fn new(subscriber_address: impl Into<String>) -> Self {
        Self {
            subscriber_address: subscriber_address.into(),
            ..Self::default()
        }
    }

    /// Restricts the check to one plan.
    #[must_use]
    pub fn with_plan_id(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = Some(plan_id.into());
        self
    }

    /// Overrides the network.
    #[must_use]
    pub const fn with_network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }
}

/// One subscription in a status check response.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionSummary {
    /// Subscription id.
    #[serde_as(as = "DefaultOnNull")]
    pub id: String,
    /// Plan id.
    #[serde_as(as = "DefaultOnNull")]
    pub plan_id: String,
    /// Subscription status (`active`, `expired`, ...).
    #[serde_as(as = "DefaultOnNull")]
    pub status: String,
    /// End of the current billing period, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<String>,
}

/// Response of `GET /v1/subscriptions/check`.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionCheckResponse {
    /// Whether the request succeeded.
    #[serde_as(as = "DefaultOnNull")]
    pub success: bool,
    /// Whether the subscriber holds an active subscription.
    #[serde_as(as = "DefaultOnNull")]
    pub active: bool,
    /// Matching subscriptions.
    #[serde_as(as = "DefaultOnNull")]
    pub subscriptions: Vec<SubscriptionSummary>,
    /// Optional backend message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response of `GET /v1/validate-key`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateKeyResponse {
    /// Whether the key is valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    /// Merchant the key belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,
}

/// Parameters for a native CSPR transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
    /// Recipient's Casper public key (hex).
    pub recipient_address: String,
    /// Amount in CSPR.
    pub amount: f64,
}

/// Outcome of a relayed transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    /// Deploy hash reported by the relay.
    pub deploy_hash: String,
    /// Sender public key.
    pub sender_address: String,
    /// Recipient public key.
    pub recipient_address: String,
    /// Amount in CSPR.
    pub amount: f64,
}

/// Parameters for the end-to-end wallet payment.
///
/// Exactly one of `product_id` / `subscription_plan_id` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakePaymentParams {
    /// Amount in CSPR.
    pub amount: f64,

    /// Product id for one-time payments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,

    /// Subscription plan id for recurring payments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_plan_id: Option<String>,

    /// Currency recorded with the payment. Defaults to `CSPR`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl MakePaymentParams {
    /// Creates parameters for a product payment.
    #[must_use]
    pub fn for_product(product_id: impl Into<String>, amount: f64) -> Self {
        Self {
            amount,
            product_id: Some(product_id.into()),
            ..Self::default()
        }
    }

    /// Creates parameters for a subscription payment.
    #[must_use]
    pub fn for_subscription(subscription_plan_id: impl Into<String>, amount: f64) -> Self {
        Self {
            amount,
            subscription_plan_id: Some(subscription_plan_id.into()),
            ..Self::default()
        }
    }
}

/// Outcome of `make_payment`. Failures are reported here instead of raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MakePaymentResult {
    /// Whether the transfer was executed and recorded.
    pub success: bool,
    /// Deploy hash of the transfer, empty if no transfer completed.
    pub transaction_hash: String,
    /// The recorded payment on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentResponse>,
    /// The failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CasPayError>,
}

impl MakePaymentResult {
    /// Creates a successful result.
    #[must_use]
    pub fn succeeded(transaction_hash: impl Into<String>, payment: PaymentResponse) -> Self {
        Self {
            success: true,
            transaction_hash: transaction_hash.into(),
            payment: Some(payment),
            error: None,
        }
    }

    /// Creates a failed result. The transaction hash is taken from the error
    /// when the transfer had already completed.
    #[must_use]
    pub fn failed(error: CasPayError) -> Self {
        Self {
            success: false,
            transaction_hash: error.transaction_hash().unwrap_or_default().to_owned(),
            payment: None,
            error: Some(error),
        }
    }
}
