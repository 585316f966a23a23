//! Logical network selection.
//!
//! CasPay talks about networks as `mainnet` / `testnet`, while the Casper
//! chain and wallet identify them by chain name (`casper` / `casper-test`).
//! [`Network`] maps between the two.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Chain name of Casper mainnet.
pub const MAINNET_CHAIN_NAME: &str = "casper";

/// Chain name of Casper testnet.
pub const TESTNET_CHAIN_NAME: &str = "casper-test";

/// The Casper network a CasPay integration targets.
///
/// Defaults to [`Network::Testnet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Casper mainnet.
    Mainnet,
    /// Casper testnet.
    #[default]
    Testnet,
}

impl Network {
    /// Returns the CasPay name of the network (`mainnet` / `testnet`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }

    /// Returns the Casper chain name used in deploy headers.
    #[must_use]
    pub const fn chain_name(self) -> &'static str {
        match self {
            Self::Mainnet => MAINNET_CHAIN_NAME,
            Self::Testnet => TESTNET_CHAIN_NAME,
        }
    }

    /// Resolves a Casper chain name. Anything other than `casper` is a testnet.
    #[must_use]
    pub fn from_chain_name(chain_name: &str) -> Self {
        if chain_name == MAINNET_CHAIN_NAME {
            Self::Mainnet
        } else {
            Self::Testnet
        }
    }

    /// Returns `true` for [`Network::Mainnet`].
    #[must_use]
    pub const fn is_mainnet(self) -> bool {
        matches!(self, Self::Mainnet)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            other => Err(ConfigError::UnknownNetwork(other.to_owned())),
        }
    }
}
