//! Payment recording and the end-to-end wallet payment flow.

use caspay::error::CasPayError;
use caspay::timestamp::UnixMillis;
use caspay::types::{
    MakePaymentParams, MakePaymentResult, PaymentParams, PaymentResponse, TransferParams,
};
use caspay::wallet::Wallet;
use serde::Serialize;

use crate::client::HttpClient;
use crate::constants::{DEFAULT_CURRENCY, NATIVE_CURRENCY, RECORD_PAYMENT_PATH};
use crate::transfer::Transfer;

/// Wire body of `POST /v1/payments/record`.
#[derive(Debug, Serialize)]
struct RecordPaymentRequest<'a> {
    merchant_id: &'a str,
    sender_address: &'a str,
    transaction_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subscription_plan_id: Option<&'a str>,
    amount: f64,
    currency: &'a str,
}

/// Wallet and transfer wiring needed by [`Payments::make_payment`].
#[derive(Debug, Clone)]
pub(crate) struct WalletWiring {
    pub(crate) wallet: Wallet,
    pub(crate) transfer: Transfer,
}

/// Payments resource.
#[derive(Debug, Clone)]
pub struct Payments {
    client: HttpClient,
    wiring: Option<WalletWiring>,
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Checks the amount and that exactly one payment target is named.
fn validate_target(
    amount: f64,
    product_id: Option<&str>,
    subscription_plan_id: Option<&str>,
) -> Result<(), CasPayError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(CasPayError::invalid_params("amount must be greater than 0"));
    }
    match (is_present(product_id), is_present(subscription_plan_id)) {
        (true, false) | (false, true) => Ok(()),
        (false, false) => Err(CasPayError::invalid_params(
            "Either productId or subscriptionPlanId is required",
        )),
        (true, true) => Err(CasPayError::invalid_params(
            "Only one of productId or subscriptionPlanId may be set",
        )),
    }
}

impl Payments {
    /// Creates a record-only payments resource.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            wiring: None,
        }
    }

    pub(crate) fn with_wiring(client: HttpClient, wiring: Option<WalletWiring>) -> Self {
        Self { client, wiring }
    }

    /// Returns `true` if [`Payments::make_payment`] can move funds.
    #[must_use]
    pub const fn has_wallet(&self) -> bool {
        self.wiring.is_some()
    }

    /// Records a payment with the backend.
    ///
    /// Without a transaction hash a `mock_tx_<millis>` placeholder is sent;
    /// without a currency `USD` is sent.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_PARAMS` before any request when the sender is missing,
    /// the amount is not positive, or not exactly one of product and
    /// subscription plan is set. Backend and transport failures are returned
    /// as described on [`HttpClient::request`].
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(name = "caspay.payments.record", skip_all, err)
    )]
    pub async fn record_payment(
        &self,
        params: &PaymentParams,
    ) -> Result<PaymentResponse, CasPayError> {
        if params.sender_address.is_empty() {
            return Err(CasPayError::invalid_params("senderAddress is required"));
        }
        validate_target(
            params.amount,
            params.product_id.as_deref(),
            params.subscription_plan_id.as_deref(),
        )?;

        let transaction_hash = match params.transaction_hash.as_deref() {
            Some(hash) if !hash.is_empty() => hash.to_owned(),
            _ => format!("mock_tx_{}", UnixMillis::now()),
        };
        let body = RecordPaymentRequest {
            merchant_id: self.client.merchant_id(),
            sender_address: &params.sender_address,
            transaction_hash,
            product_id: params.product_id.as_deref().filter(|id| !id.is_empty()),
            subscription_plan_id: params
                .subscription_plan_id
                .as_deref()
                .filter(|id| !id.is_empty()),
            amount: params.amount,
            currency: params.currency.as_deref().unwrap_or(DEFAULT_CURRENCY),
        };
        self.client.post(RECORD_PAYMENT_PATH, &body).await
    }

    /// Records a subscription payment.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_PARAMS` if no subscription plan is set, otherwise as
    /// [`Payments::record_payment`].
    pub async fn record_subscription(
        &self,
        params: &PaymentParams,
    ) -> Result<PaymentResponse, CasPayError> {
        if !is_present(params.subscription_plan_id.as_deref()) {
            return Err(CasPayError::invalid_params(
                "subscriptionPlanId is required for subscription payments",
            ));
        }
        self.record_payment(params).await
    }

    /// Pays the merchant from the connected wallet and records the payment.
    ///
    /// Never fails: every error is reported in the returned result. When the
    /// transfer succeeded but recording did not, the result carries a
    /// `RECORDING_FAILED` error together with the deploy hash.
    pub async fn make_payment(&self, params: &MakePaymentParams) -> MakePaymentResult {
        match self.try_make_payment(params).await {
            Ok((hash, payment)) => MakePaymentResult::succeeded(hash, payment),
            Err(err) => MakePaymentResult::failed(err),
        }
    }

    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(name = "caspay.payments.make_payment", skip_all, err)
    )]
    async fn try_make_payment(
        &self,
        params: &MakePaymentParams,
    ) -> Result<(String, PaymentResponse), CasPayError> {
        let Some(wiring) = &self.wiring else {
            return Err(CasPayError::wallet_not_initialized(
                "Wallet payments require a merchant wallet address and a deploy builder.",
            ));
        };
        validate_target(
            params.amount,
            params.product_id.as_deref(),
            params.subscription_plan_id.as_deref(),
        )?;

        self.client.validate_api_key().await?;

        if !wiring.wallet.is_connected().await {
            wiring.wallet.connect().await?;
        }
        let sender = wiring
            .wallet
            .address()
            .await
            .ok_or_else(|| CasPayError::wallet("Failed to get wallet address."))?;
        let recipient = wiring
            .wallet
            .merchant_wallet_address()
            .ok_or_else(|| CasPayError::wallet("Merchant wallet address is not configured."))?;

        let transfer = wiring
            .transfer
            .execute(&TransferParams {
                recipient_address: recipient.to_owned(),
                amount: params.amount,
            })
            .await?;

        let record = PaymentParams {
            sender_address: sender,
            transaction_hash: Some(transfer.deploy_hash.clone()),
            product_id: params.product_id.clone(),
            subscription_plan_id: params.subscription_plan_id.clone(),
            amount: params.amount,
            currency: Some(
                params
                    .currency
                    .clone()
                    .unwrap_or_else(|| NATIVE_CURRENCY.to_owned()),
            ),
        };
        match self.record_payment(&record).await {
            Ok(payment) => Ok((transfer.deploy_hash, payment)),
            Err(err) => {
                #[cfg(feature = "telemetry")]
                tracing::error!(
                    deploy_hash = %transfer.deploy_hash,
                    error = %err,
                    "transfer succeeded but the payment was not recorded"
                );
                Err(CasPayError::recording_failed(
                    transfer.deploy_hash,
                    format!(
                        "Payment transferred but recording failed: {}",
                        err.message()
                    ),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use caspay::error::ErrorCode;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;
    use crate::test_support::{MERCHANT, MockProvider, SENDER, config, echo_builder};

    fn record_only(server: &MockServer) -> Payments {
        Payments::new(HttpClient::new(config(&server.uri())).unwrap())
    }

    fn wired(server: &MockServer, provider: &Arc<MockProvider>) -> Payments {
        let config = config(&server.uri());
        let client = HttpClient::new(config.clone()).unwrap();
        let wallet = Wallet::new(&config, Some(provider.host()));
        let transfer = Transfer::new(wallet.clone(), client.clone(), echo_builder());
        Payments::with_wiring(client, Some(WalletWiring { wallet, transfer }))
    }

    async fn mount_validate_key(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/validate-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valid": true })))
            .mount(server)
            .await;
    }

    async fn mount_relay(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deploy_hash": "0xHASH" })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_record_payment_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payments/record"))
            .and(body_partial_json(json!({
                "merchant_id": "MERCH_1",
                "sender_address": "01abc",
                "transaction_hash": "0xabc",
                "product_id": "prod_1",
                "amount": 100.0,
                "currency": "USD",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "payment": { "id": "pay_1", "transaction_hash": "0xabc", "amount": 100.0, "status": "completed" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let params = PaymentParams::for_product("01abc", "prod_1", 100.0).with_transaction_hash("0xabc");
        let response = record_only(&server).record_payment(&params).await.unwrap();
        assert!(response.success);
        assert_eq!(response.payment.id, "pay_1");
        assert_eq!(response.payment.status, "completed");
    }

    #[tokio::test]
    async fn test_record_payment_placeholder_hash() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payments/record"))
            .respond_with(|request: &Request| {
                let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
                ResponseTemplate::new(200).set_body_json(json!({
                    "success": true,
                    "payment": { "transaction_hash": body["transaction_hash"] },
                }))
            })
            .mount(&server)
            .await;

        let params = PaymentParams::for_subscription("01abc", "plan_1", 9.99);
        let response = record_only(&server)
            .record_subscription(&params)
            .await
            .unwrap();
        let hash = response.payment.transaction_hash;
        assert!(hash.starts_with("mock_tx_"), "{hash}");
        assert!(hash["mock_tx_".len()..].parse::<u64>().is_ok());
    }

    #[tokio::test]
    async fn test_record_payment_validates_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;
        let payments = record_only(&server);

        let cases = [
            (PaymentParams::for_product("", "p1", 1.0), "senderAddress is required"),
            (PaymentParams::for_product("01abc", "p1", 0.0), "amount must be greater than 0"),
            (PaymentParams::for_product("01abc", "p1", -5.0), "amount must be greater than 0"),
            (
                PaymentParams::for_product("01abc", "p1", f64::INFINITY),
                "amount must be greater than 0",
            ),
            (
                PaymentParams {
                    sender_address: "01abc".into(),
                    amount: 1.0,
                    ..PaymentParams::default()
                },
                "Either productId or subscriptionPlanId is required",
            ),
            (
                PaymentParams {
                    subscription_plan_id: Some("plan".into()),
                    ..PaymentParams::for_product("01abc", "p1", 1.0)
                },
                "Only one of productId or subscriptionPlanId may be set",
            ),
        ];
        for (params, message) in cases {
            let err = payments.record_payment(&params).await.unwrap_err();
            assert_eq!(err.error_code(), Some(ErrorCode::InvalidParams));
            assert_eq!(err.status(), Some(400));
            assert_eq!(err.message(), message);
        }

        let err = payments
            .record_subscription(&PaymentParams::for_product("01abc", "p1", 1.0))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), Some(ErrorCode::InvalidParams));
    }

    #[tokio::test]
    async fn test_make_payment_without_wallet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let result = record_only(&server)
            .make_payment(&MakePaymentParams::for_product("p1", 2.5))
            .await;
        assert!(!result.success);
        assert_eq!(result.transaction_hash, "");
        assert_eq!(
            result.error.unwrap().error_code(),
            Some(ErrorCode::WalletNotInitialized)
        );
    }

    #[tokio::test]
    async fn test_make_payment_end_to_end() {
        let server = MockServer::start().await;
        mount_validate_key(&server).await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(body_partial_json(json!({
                "deploy": { "session": { "amount": "2500000000", "target": MERCHANT } },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deploy_hash": "0xHASH" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/payments/record"))
            .and(body_partial_json(json!({
                "sender_address": SENDER,
                "transaction_hash": "0xHASH",
                "product_id": "p1",
                "amount": 2.5,
                "currency": "CSPR",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "payment": { "id": "pay_9", "transaction_hash": "0xHASH" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = MockProvider::approving();
        let result = wired(&server, &provider)
            .make_payment(&MakePaymentParams::for_product("p1", 2.5))
            .await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.transaction_hash, "0xHASH");
        assert_eq!(result.payment.unwrap().payment.id, "pay_9");
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_make_payment_accepts_null_fields_in_record() {
        let server = MockServer::start().await;
        mount_validate_key(&server).await;
        mount_relay(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/payments/record"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "payment": {
                    "id": "pay_1",
                    "transaction_hash": "0xHASH",
                    "amount": 2.5,
                    "invoice_number": null,
                    "created_at": null,
                },
                "verification": null,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = wired(&server, &MockProvider::approving())
            .make_payment(&MakePaymentParams::for_product("p1", 2.5))
            .await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.transaction_hash, "0xHASH");
        let payment = result.payment.unwrap().payment;
        assert_eq!(payment.id, "pay_1");
        assert_eq!(payment.invoice_number, "");
        assert_eq!(payment.created_at, "");
    }

    #[tokio::test]
    async fn test_make_payment_recording_failure_keeps_hash() {
        let server = MockServer::start().await;
        mount_validate_key(&server).await;
        mount_relay(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/payments/record"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({ "error": "db down", "code": "INTERNAL" })),
            )
            .mount(&server)
            .await;

        let result = wired(&server, &MockProvider::approving())
            .make_payment(&MakePaymentParams::for_subscription("plan_1", 1.0))
            .await;
        assert!(!result.success);
        assert_eq!(result.transaction_hash, "0xHASH");
        let err = result.error.unwrap();
        assert_eq!(err.error_code(), Some(ErrorCode::RecordingFailed));
        assert_eq!(err.transaction_hash(), Some("0xHASH"));
        assert!(err.message().contains("db down"));
    }

    #[tokio::test]
    async fn test_make_payment_rejected_transfer() {
        let server = MockServer::start().await;
        mount_validate_key(&server).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let provider = MockProvider::signing(Ok(caspay::wallet::SignResult::Cancelled));
        let result = wired(&server, &provider)
            .make_payment(&MakePaymentParams::for_product("p1", 1.0))
            .await;
        assert!(!result.success);
        assert_eq!(result.transaction_hash, "");
        assert_eq!(
            result.error.unwrap().error_code(),
            Some(ErrorCode::TransferRejected)
        );
    }

    #[tokio::test]
    async fn test_make_payment_invalid_key_stops_before_wallet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/validate-key"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "error": "Invalid API key", "code": "INVALID_API_KEY" })),
            )
            .mount(&server)
            .await;

        let provider = MockProvider::approving();
        let payments = wired(&server, &provider);
        let calls_before = provider.call_count();
        let result = payments
            .make_payment(&MakePaymentParams::for_product("p1", 1.0))
            .await;
        assert_eq!(
            result.error.unwrap().error_code(),
            Some(ErrorCode::InvalidApiKey)
        );
        assert_eq!(provider.call_count(), calls_before);
    }

    #[tokio::test]
    async fn test_make_payment_validates_params() {
        let server = MockServer::start().await;
        let provider = MockProvider::approving();
        let payments = wired(&server, &provider);

        let result = payments
            .make_payment(&MakePaymentParams::for_product("p1", 0.0))
            .await;
        assert_eq!(
            result.error.unwrap().error_code(),
            Some(ErrorCode::InvalidParams)
        );

        let result = payments
            .make_payment(&MakePaymentParams::for_product("p1", f64::INFINITY))
            .await;
        assert_eq!(
            result.error.unwrap().error_code(),
            Some(ErrorCode::InvalidParams)
        );

        let result = payments
            .make_payment(&MakePaymentParams {
                amount: 1.0,
                ..MakePaymentParams::default()
            })
            .await;
        assert_eq!(
            result.error.unwrap().error_code(),
            Some(ErrorCode::InvalidParams)
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
