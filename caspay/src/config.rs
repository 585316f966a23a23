//! SDK configuration.
//!
//! A [`CasPayConfig`] is validated eagerly: the SDK refuses to start without
//! an API key and a merchant id.
//!
//! # Environment Variables
//!
//! [`CasPayConfig::from_env`] reads:
//!
//! - `CASPAY_API_KEY` - API key (`cp_live_...` / `cp_test_...`)
//! - `CASPAY_MERCHANT_ID` - Merchant id (`MERCH_...`)
//! - `CASPAY_WALLET_ADDRESS` - Merchant receiving address (optional)
//! - `CASPAY_NETWORK` - `mainnet` or `testnet` (optional)
//! - `CASPAY_BASE_URL` - API base URL override (optional)

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::network::Network;

/// Production CasPay API.
pub const DEFAULT_BASE_URL: &str = "https://api.caspay.link";

/// Errors raised while building or validating a [`CasPayConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The API key is empty.
    #[error("CasPay SDK: apiKey is required")]
    MissingApiKey,

    /// The merchant id is empty.
    #[error("CasPay SDK: merchantId is required")]
    MissingMerchantId,

    /// A value cannot be sent as an HTTP header.
    #[error("CasPay SDK: {field} contains characters not allowed in an HTTP header")]
    InvalidHeaderValue {
        /// Name of the offending configuration field.
        field: &'static str,
    },

    /// The base URL does not parse.
    #[error("CasPay SDK: invalid baseUrl: {source}")]
    InvalidBaseUrl {
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The network name is neither `mainnet` nor `testnet`.
    #[error("CasPay SDK: unknown network '{0}', expected 'mainnet' or 'testnet'")]
    UnknownNetwork(String),
}

/// CasPay SDK configuration.
///
/// # Example
///
/// ```rust
/// use caspay::{CasPayConfig, Network};
///
/// let config = CasPayConfig::new("cp_test_123", "MERCH_abc")
///     .with_wallet_address("01abc")
///     .with_network(Network::Mainnet);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasPayConfig {
    /// CasPay API key.
    pub api_key: String,

    /// Merchant identifier.
    pub merchant_id: String,

    /// Merchant receiving address. Enables wallet payments when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,

    /// Target network. Defaults to testnet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,

    /// API base URL override. Defaults to [`DEFAULT_BASE_URL`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl CasPayConfig {
    /// Creates a configuration with the two required fields.
    #[must_use]
    pub fn new(api_key: impl Into<String>, merchant_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            merchant_id: merchant_id.into(),
            wallet_address: None,
            network: None,
            base_url: None,
        }
    }

    /// Sets the merchant receiving address.
    #[must_use]
    pub fn with_wallet_address(mut self, address: impl Into<String>) -> Self {
        self.wallet_address = Some(address.into());
        self
    }

    /// Sets the target network.
    #[must_use]
    pub const fn with_network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Loads the configuration from `CASPAY_*` environment variables and
    /// validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::new(
            var("CASPAY_API_KEY").unwrap_or_default(),
            var("CASPAY_MERCHANT_ID").unwrap_or_default(),
        );
        config.wallet_address = var("CASPAY_WALLET_ADDRESS");
        config.base_url = var("CASPAY_BASE_URL");
        if let Some(network) = var("CASPAY_NETWORK") {
            config.network = Some(network.parse()?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] or [`ConfigError::MissingMerchantId`]
    /// when a required field is blank, and [`ConfigError::InvalidBaseUrl`] when
    /// the base URL override does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.merchant_id.trim().is_empty() {
            return Err(ConfigError::MissingMerchantId);
        }
        self.parsed_base_url()?;
        Ok(())
    }

    /// Returns the effective base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// Parses the effective base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the URL does not parse.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(self.base_url()).map_err(|source| ConfigError::InvalidBaseUrl { source })
    }

    /// Returns the configured network, or testnet when none is set.
    #[must_use]
    pub fn network_or_default(&self) -> Network {
        self.network.unwrap_or_default()
    }
}

impl fmt::Debug for CasPayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CasPayConfig")
            .field("api_key", &"<redacted>")
            .field("merchant_id", &self.merchant_id)
            .field("wallet_address", &self.wallet_address)
            .field("network", &self.network)
            .field("base_url", &self.base_url)
            .finish()
    }
}
