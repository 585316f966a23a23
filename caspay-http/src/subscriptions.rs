//! Subscription status checks.

use caspay::error::CasPayError;
use caspay::types::{SubscriptionCheckParams, SubscriptionCheckResponse};

use crate::client::HttpClient;
use crate::constants::SUBSCRIPTION_CHECK_PATH;

/// Subscriptions resource.
#[derive(Debug, Clone)]
pub struct Subscriptions {
    client: HttpClient,
}

impl Subscriptions {
    /// Creates the resource.
    #[must_use]
    pub const fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Checks whether a subscriber holds an active subscription.
    ///
    /// The network is taken from `params`, then from the SDK configuration,
    /// and defaults to testnet.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_PARAMS` if the subscriber address is missing, and
    /// backend or transport errors as described on [`HttpClient::request`].
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(name = "caspay.subscriptions.check_status", skip_all, err)
    )]
    pub async fn check_status(
        &self,
        params: &SubscriptionCheckParams,
    ) -> Result<SubscriptionCheckResponse, CasPayError> {
        if params.subscriber_address.is_empty() {
            return Err(CasPayError::invalid_params("subscriberAddress is required"));
        }
        let network = params
            .network
            .unwrap_or_else(|| self.client.config().network_or_default());

        let mut query = vec![
            ("merchant_id", self.client.merchant_id()),
            ("subscriber", params.subscriber_address.as_str()),
            ("network", network.as_str()),
        ];
        if let Some(plan_id) = params.plan_id.as_deref().filter(|id| !id.is_empty()) {
            query.push(("plan_id", plan_id));
        }
        self.client
            .get_with_query(SUBSCRIPTION_CHECK_PATH, &query)
            .await
    }
}
