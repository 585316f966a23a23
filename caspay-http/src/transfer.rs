//! Native CSPR transfers signed by the wallet and relayed through the backend.
//!
//! A transfer resolves the sender from the connected wallet, builds a
//! standard-payment native transfer deploy, has the wallet sign it, attaches
//! the tagged approval and relays the signed deploy via `POST /rpc`.

use std::fmt;
use std::sync::Arc;

use caspay::amount::{AmountError, Motes};
use caspay::deploy::{
    Approval, DEFAULT_PAYMENT_AMOUNT, DeployBuilder, DeployError, TransferDeployParams,
    attach_approval, tag_signature,
};
use caspay::error::CasPayError;
use caspay::network::Network;
use caspay::timestamp::UnixMillis;
use caspay::types::{TransferParams, TransferResult};
use caspay::wallet::{ProviderError, SignResult, Wallet, WalletProvider, is_cancellation_message};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::client::HttpClient;
use crate::constants::RPC_RELAY_PATH;

const RELAY_FAILED: &str = "RPC request failed";
const TRANSFER_FAILED: &str = "Failed to execute transfer.";
const TRANSFER_CANCELLED: &str = "Transfer was cancelled by the user.";

/// Body of `POST /rpc`.
#[derive(Serialize)]
struct RelayRequest<'a> {
    deploy: &'a Value,
    network: Network,
}

/// Internal failure of a transfer, mapped to a [`CasPayError`] at the top.
#[derive(Debug, thiserror::Error)]
enum TransferFailure {
    #[error("transfer was cancelled")]
    Cancelled,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error(transparent)]
    Deploy(#[from] DeployError),
    #[error("{0}")]
    Relay(String),
    #[error(transparent)]
    Http(#[from] CasPayError),
}

impl TransferFailure {
    fn into_error(self) -> CasPayError {
        let cancelled = match &self {
            Self::Cancelled => true,
            Self::Provider(err) => err.is_cancellation(),
            Self::Http(CasPayError::TransferRejected { .. }) => true,
            _ => false,
        };
        let message = self.to_string();
        if cancelled || is_cancellation_message(&message) {
            return CasPayError::transfer_rejected(TRANSFER_CANCELLED);
        }
        if message.is_empty() {
            CasPayError::network(TRANSFER_FAILED)
        } else {
            CasPayError::network(message)
        }
    }
}

/// Executes native CSPR transfers from the connected wallet.
#[derive(Clone)]
pub struct Transfer {
    wallet: Wallet,
    client: HttpClient,
    builder: Arc<dyn DeployBuilder>,
}

impl Transfer {
    /// Creates a transfer orchestrator.
    #[must_use]
    pub fn new(wallet: Wallet, client: HttpClient, builder: Arc<dyn DeployBuilder>) -> Self {
        Self {
            wallet,
            client,
            builder,
        }
    }

    /// Transfers `params.amount` CSPR to `params.recipient_address`.
    ///
    /// # Errors
    ///
    /// - `WALLET_NOT_FOUND` if no wallet is connected or no provider exists
    /// - `TRANSFER_REJECTED` if the user cancels signing
    /// - `NETWORK_ERROR` for any other failure, including relay errors
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(name = "caspay.transfer.execute", skip_all, err)
    )]
    pub async fn execute(&self, params: &TransferParams) -> Result<TransferResult, CasPayError> {
        let sender = self
            .wallet
            .address()
            .await
            .ok_or_else(|| CasPayError::wallet_not_found("Please connect your wallet first."))?;
        let provider = self
            .wallet
            .provider()
            .ok_or_else(|| CasPayError::wallet_not_found("Wallet provider not available."))?;

        let deploy_hash = self
            .sign_and_relay(provider.as_ref(), &sender, params)
            .await
            .map_err(TransferFailure::into_error)?;

        #[cfg(feature = "telemetry")]
        tracing::info!(deploy_hash = %deploy_hash, "transfer relayed");

        Ok(TransferResult {
            deploy_hash,
            sender_address: sender,
            recipient_address: params.recipient_address.clone(),
            amount: params.amount,
        })
    }

    async fn sign_and_relay(
        &self,
        provider: &dyn WalletProvider,
        sender: &str,
        params: &TransferParams,
    ) -> Result<String, TransferFailure> {
        let network = self.wallet.network_kind();
        let deploy_params = TransferDeployParams {
            chain_name: network.chain_name().to_owned(),
            sender: sender.to_owned(),
            recipient: params.recipient_address.clone(),
            amount: Motes::from_cspr(params.amount)?,
            transfer_id: UnixMillis::now().as_millis(),
            payment_amount: DEFAULT_PAYMENT_AMOUNT,
        };
        let mut deploy = self.builder.build_transfer(&deploy_params)?;

        let signature = match provider.sign(&deploy.to_string(), sender).await? {
            SignResult::Signed(signature) => signature,
            SignResult::Cancelled => return Err(TransferFailure::Cancelled),
        };
        attach_approval(
            &mut deploy,
            Approval {
                signer: sender.to_owned(),
                signature: tag_signature(sender, &signature),
            },
        )?;

        let request = RelayRequest {
            deploy: &deploy,
            network,
        };
        let (status, body) = self
            .client
            .send_raw(Method::POST, RPC_RELAY_PATH, Some(&request))
            .await?;

        if let Some(message) = relay_error(&body) {
            return Err(TransferFailure::Relay(message));
        }
        if !status.is_success() {
            return Err(TransferFailure::Relay(RELAY_FAILED.to_owned()));
        }
        body.get("deploy_hash")
            .and_then(Value::as_str)
            .filter(|hash| !hash.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| TransferFailure::Relay("RPC response is missing deploy_hash".to_owned()))
    }
}

/// Extracts the relay's `error` field, treating `null`, `false` and `""` as absent.
fn relay_error(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) if message.is_empty() => None,
        Value::String(message) => Some(message.clone()),
        Value::Object(object) => Some(
            object
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(RELAY_FAILED)
                .to_owned(),
        ),
        _ => Some(RELAY_FAILED.to_owned()),
    }
}

impl fmt::Debug for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transfer")
            .field("wallet", &self.wallet)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use caspay::error::ErrorCode;
    use caspay::wallet::SignatureBytes;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::test_support::{MERCHANT, MockProvider, SENDER, config, echo_builder};

    fn transfer_for(server: &MockServer, provider: &Arc<MockProvider>) -> Transfer {
        let config = config(&server.uri());
        let wallet = Wallet::new(&config, Some(provider.host()));
        Transfer::new(wallet, HttpClient::new(config).unwrap(), echo_builder())
    }

    fn params(amount: f64) -> TransferParams {
        TransferParams {
            recipient_address: MERCHANT.to_owned(),
            amount,
        }
    }

    #[tokio::test]
    async fn test_relays_signed_deploy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(body_partial_json(json!({
                "network": "testnet",
                "deploy": {
                    "header": { "account": SENDER, "chain_name": "casper-test" },
                    "payment": { "amount": "100000000" },
                    "session": { "amount": "2500000000", "target": MERCHANT },
                    "approvals": [{ "signer": SENDER, "signature": "01cafe" }],
                },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deploy_hash": "0xHASH" })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = MockProvider::approving();
        let result = transfer_for(&server, &provider)
            .execute(&params(2.5))
            .await
            .unwrap();
        assert_eq!(
            result,
            TransferResult {
                deploy_hash: "0xHASH".into(),
                sender_address: SENDER.into(),
                recipient_address: MERCHANT.into(),
                amount: 2.5,
            }
        );

        let signed = provider.signed_payloads();
        assert_eq!(signed.len(), 1);
        assert_eq!(signed[0].1, SENDER);
        let unsigned: Value = serde_json::from_str(&signed[0].0).unwrap();
        assert_eq!(unsigned["approvals"], json!([]));
    }

    #[tokio::test]
    async fn test_cancellation_signals_map_to_transfer_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deploy_hash": "0x" })))
            .expect(0)
            .mount(&server)
            .await;

        for result in [
            Ok(SignResult::Cancelled),
            Err(ProviderError::from_raw(Some(2), "declined")),
            Err(ProviderError::from_raw(None, "User rejected the request")),
            Err(ProviderError::from_raw(None, "operation cancelled")),
        ] {
            let provider = MockProvider::signing(result);
            let err = transfer_for(&server, &provider)
                .execute(&params(1.0))
                .await
                .unwrap_err();
            assert_eq!(err.error_code(), Some(ErrorCode::TransferRejected));
            assert_eq!(err.message(), "Transfer was cancelled by the user.");
        }
    }

    #[tokio::test]
    async fn test_relay_error_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "error": "deploy expired" })),
            )
            .mount(&server)
            .await;

        let err = transfer_for(&server, &MockProvider::approving())
            .execute(&params(1.0))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), Some(ErrorCode::NetworkError));
        assert_eq!(err.message(), "deploy expired");
    }

    #[tokio::test]
    async fn test_relay_status_without_error_uses_default_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = transfer_for(&server, &MockProvider::approving())
            .execute(&params(1.0))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), Some(ErrorCode::NetworkError));
        assert_eq!(err.message(), "RPC request failed");
    }

    #[tokio::test]
    async fn test_provider_failure_is_network_error() {
        let server = MockServer::start().await;
        let provider = MockProvider::signing(Err(ProviderError::from_raw(Some(9), "")));
        let err = transfer_for(&server, &provider)
            .execute(&params(1.0))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), Some(ErrorCode::NetworkError));
        assert_eq!(err.message(), "Failed to execute transfer.");
    }

    #[tokio::test]
    async fn test_requires_connected_wallet() {
        let server = MockServer::start().await;
        let config = config(&server.uri());
        let transfer = Transfer::new(
            Wallet::new(&config, None),
            HttpClient::new(config).unwrap(),
            echo_builder(),
        );
        let err = transfer.execute(&params(1.0)).await.unwrap_err();
        assert_eq!(err.error_code(), Some(ErrorCode::WalletNotFound));
        assert_eq!(err.message(), "Please connect your wallet first.");
    }

    #[test]
    fn test_relay_error_field() {
        assert_eq!(relay_error(&json!({ "deploy_hash": "0x" })), None);
        assert_eq!(relay_error(&json!({ "error": null })), None);
        assert_eq!(relay_error(&json!({ "error": "" })), None);
        assert_eq!(relay_error(&json!({ "error": "bad" })).as_deref(), Some("bad"));
        assert_eq!(
            relay_error(&json!({ "error": { "code": -32000, "message": "node down" } })).as_deref(),
            Some("node down")
        );
        assert_eq!(
            relay_error(&json!({ "error": 42 })).as_deref(),
            Some("RPC request failed")
        );
    }

    #[test]
    fn test_signature_uses_sender_tag() {
        let sig = SignatureBytes::Hex("CAFE".into());
        assert_eq!(tag_signature(SENDER, &sig), "01cafe");
    }
}
