//! The [`CasPay`] facade.

use std::fmt;
use std::sync::Arc;

use caspay::config::{CasPayConfig, ConfigError};
use caspay::deploy::DeployBuilder;
use caspay::wallet::{Wallet, WalletHost};

use crate::client::HttpClient;
use crate::constants::SDK_VERSION;
use crate::payments::{Payments, WalletWiring};
use crate::subscriptions::Subscriptions;
use crate::transfer::Transfer;

/// Entry point of the SDK.
///
/// ```no_run
/// use caspay::CasPayConfig;
/// use caspay::types::PaymentParams;
/// use caspay_http::CasPay;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let caspay = CasPay::new(CasPayConfig::new("cp_live_...", "MERCH_..."))?;
/// let payment = caspay
///     .payments()
///     .record_payment(&PaymentParams::for_product("01ab...", "prod_abc", 100.0))
///     .await?;
/// println!("recorded {}", payment.payment.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CasPay {
    client: HttpClient,
    payments: Payments,
    subscriptions: Subscriptions,
    wallet: Option<Wallet>,
}

impl CasPay {
    /// Version of the SDK.
    pub const VERSION: &'static str = SDK_VERSION;

    /// Creates a record-only SDK.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: CasPayConfig) -> Result<Self, ConfigError> {
        Self::builder(config).build()
    }

    /// Starts a builder for an SDK with wallet support.
    #[must_use]
    pub fn builder(config: CasPayConfig) -> CasPayBuilder {
        CasPayBuilder {
            config,
            wallet_host: None,
            deploy_builder: None,
            http_client: None,
        }
    }

    /// Returns the payments resource.
    #[must_use]
    pub const fn payments(&self) -> &Payments {
        &self.payments
    }

    /// Returns the subscriptions resource.
    #[must_use]
    pub const fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    /// Returns the wallet adapter, present when a merchant wallet address is configured.
    #[must_use]
    pub const fn wallet(&self) -> Option<&Wallet> {
        self.wallet.as_ref()
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn client(&self) -> &HttpClient {
        &self.client
    }
}

impl fmt::Debug for CasPay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CasPay")
            .field("client", &self.client)
            .field("wallet", &self.wallet)
            .field("wallet_payments", &self.payments.has_wallet())
            .finish_non_exhaustive()
    }
}

/// Builder for [`CasPay`].
#[must_use]
pub struct CasPayBuilder {
    config: CasPayConfig,
    wallet_host: Option<Arc<dyn WalletHost>>,
    deploy_builder: Option<Arc<dyn DeployBuilder>>,
    http_client: Option<reqwest::Client>,
}

impl CasPayBuilder {
    /// Sets the environment the wallet provider is discovered in.
    pub fn wallet_host(mut self, host: Arc<dyn WalletHost>) -> Self {
        self.wallet_host = Some(host);
        self
    }

    /// Sets the deploy builder used for native transfers.
    pub fn deploy_builder(mut self, builder: Arc<dyn DeployBuilder>) -> Self {
        self.deploy_builder = Some(builder);
        self
    }

    /// Uses a pre-configured `reqwest` client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the SDK.
    ///
    /// The wallet adapter exists whenever a merchant wallet address is
    /// configured. Wallet payments are wired only when a deploy builder is
    /// supplied as well.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn build(self) -> Result<CasPay, ConfigError> {
        let wallet = self
            .config
            .wallet_address
            .as_deref()
            .filter(|address| !address.is_empty())
            .map(|_| Wallet::new(&self.config, self.wallet_host.clone()));
        let client = match self.http_client {
            Some(http) => HttpClient::with_http_client(self.config, http)?,
            None => HttpClient::new(self.config)?,
        };

        let wiring = match (&wallet, self.deploy_builder) {
            (Some(wallet), Some(builder)) => Some(WalletWiring {
                wallet: wallet.clone(),
                transfer: Transfer::new(wallet.clone(), client.clone(), builder),
            }),
            _ => None,
        };

        #[cfg(feature = "telemetry")]
        tracing::debug!(
            merchant_id = client.merchant_id(),
            wallet = wallet.is_some(),
            wallet_payments = wiring.is_some(),
            "caspay sdk initialized"
        );

        Ok(CasPay {
            payments: Payments::with_wiring(client.clone(), wiring),
            subscriptions: Subscriptions::new(client.clone()),
            client,
            wallet,
        })
    }
}

impl fmt::Debug for CasPayBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CasPayBuilder")
            .field("config", &self.config)
            .field("wallet_host", &self.wallet_host.is_some())
            .field("deploy_builder", &self.deploy_builder.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use caspay::error::ErrorCode;
    use caspay::network::Network;
    use caspay::types::{MakePaymentParams, SubscriptionCheckParams};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::test_support::{MockProvider, SENDER, config, echo_builder};

    #[test]
    fn test_new_rejects_missing_credentials() {
        assert!(matches!(
            CasPay::new(CasPayConfig::new("", "MERCH_1")),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            CasPay::new(CasPayConfig::new("key", " ")),
            Err(ConfigError::MissingMerchantId)
        ));
        assert_eq!(CasPay::VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_record_only_sdk() {
        let sdk = CasPay::new(CasPayConfig::new("key", "MERCH_1")).unwrap();
        assert!(sdk.wallet().is_none());
        assert!(!sdk.payments().has_wallet());
        assert_eq!(sdk.client().base_url(), "https://api.caspay.link");

        let result = sdk
            .payments()
            .make_payment(&MakePaymentParams::for_product("p1", 1.0))
            .await;
        assert_eq!(
            result.error.unwrap().error_code(),
            Some(ErrorCode::WalletNotInitialized)
        );
    }

    #[tokio::test]
    async fn test_wallet_without_deploy_builder_is_not_wired() {
        let provider = MockProvider::approving();
        let sdk = CasPay::builder(config("https://api.test"))
            .wallet_host(provider.host())
            .build()
            .unwrap();
        assert!(sdk.wallet().is_some());
        assert!(!sdk.payments().has_wallet());
    }

    #[tokio::test]
    async fn test_full_payment_scenario() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/validate-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valid": true })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rpc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deploy_hash": "0xHASH" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/payments/record"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "payment": { "id": "pay_1", "transaction_hash": "0xHASH", "amount": 2.5 },
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/check"))
            .and(query_param("network", "mainnet"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "active": true })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = MockProvider::approving();
        let sdk = CasPay::builder(config(&server.uri()).with_network(Network::Mainnet))
            .wallet_host(provider.host())
            .deploy_builder(echo_builder())
            .http_client(reqwest::Client::new())
            .build()
            .unwrap();
        assert!(sdk.payments().has_wallet());
        assert_eq!(sdk.wallet().unwrap().network(), "casper");

        let result = sdk
            .payments()
            .make_payment(&MakePaymentParams::for_product("p1", 2.5))
            .await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.transaction_hash, "0xHASH");

        let (payload, signer) = provider.signed_payloads().remove(0);
        assert_eq!(signer, SENDER);
        let deploy: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(deploy["session"]["amount"], "2500000000");
        assert_eq!(deploy["header"]["chain_name"], "casper");

        let status = sdk
            .subscriptions()
            .check_status(&SubscriptionCheckParams::new("01abc"))
            .await
            .unwrap();
        assert!(status.active);
    }
}
