//! Error types for the CasPay SDK.
//!
//! Every SDK operation fails with a [`CasPayError`]. Its variants form a
//! closed taxonomy keyed by [`ErrorCode`]; the single open variant,
//! [`CasPayError::Api`], carries a well-formed backend error verbatim so that
//! backend-specific codes reach the caller unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Install page for the Casper Wallet browser extension.
pub const CASPER_WALLET_INSTALL_URL: &str = "https://www.casperwallet.io/";

/// Machine-readable error codes produced by the SDK itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No wallet provider is available in the host environment.
    WalletNotFound,
    /// The wallet is locked.
    WalletLocked,
    /// The user refused the connection request.
    ConnectionRejected,
    /// The user declined to sign the transfer.
    TransferRejected,
    /// The wallet could not provide what the flow needed.
    WalletError,
    /// The SDK was built without wallet support.
    WalletNotInitialized,
    /// The caller supplied invalid parameters.
    InvalidParams,
    /// Transport or decoding failure.
    NetworkError,
    /// The backend rejected the API key.
    InvalidApiKey,
    /// The API key could not be validated.
    ValidationError,
    /// The transfer succeeded but recording the payment failed.
    RecordingFailed,
    /// Anything else.
    UnknownError,
}

impl ErrorCode {
    /// Returns the wire representation of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WalletNotFound => "WALLET_NOT_FOUND",
            Self::WalletLocked => "WALLET_LOCKED",
            Self::ConnectionRejected => "CONNECTION_REJECTED",
            Self::TransferRejected => "TRANSFER_REJECTED",
            Self::WalletError => "WALLET_ERROR",
            Self::WalletNotInitialized => "WALLET_NOT_INITIALIZED",
            Self::InvalidParams => "INVALID_PARAMS",
            Self::NetworkError => "NETWORK_ERROR",
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::RecordingFailed => "RECORDING_FAILED",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = match s {
            "WALLET_NOT_FOUND" => Self::WalletNotFound,
            "WALLET_LOCKED" => Self::WalletLocked,
            "CONNECTION_REJECTED" => Self::ConnectionRejected,
            "TRANSFER_REJECTED" => Self::TransferRejected,
            "WALLET_ERROR" => Self::WalletError,
            "WALLET_NOT_INITIALIZED" => Self::WalletNotInitialized,
            "INVALID_PARAMS" => Self::InvalidParams,
            "NETWORK_ERROR" => Self::NetworkError,
            "INVALID_API_KEY" => Self::InvalidApiKey,
            "VALIDATION_ERROR" => Self::ValidationError,
            "RECORDING_FAILED" => Self::RecordingFailed,
            "UNKNOWN_ERROR" => Self::UnknownError,
            other => return Err(format!("unknown error code '{other}'")),
        };
        Ok(code)
    }
}

/// Error value surfaced by every CasPay operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CasPayError {
    /// No wallet provider is available.
    #[error("{message}")]
    WalletNotFound {
        /// Human-readable message.
        message: String,
        /// Where the user can install the wallet extension.
        install_url: String,
    },

    /// The wallet is locked.
    #[error("{message}")]
    WalletLocked {
        /// Human-readable message.
        message: String,
    },

    /// The user refused the connection request.
    #[error("{message}")]
    ConnectionRejected {
        /// Human-readable message.
        message: String,
    },

    /// The user declined to sign. Recoverable by asking again.
    #[error("{message}")]
    TransferRejected {
        /// Human-readable message.
        message: String,
    },

    /// The wallet could not provide what the flow needed.
    #[error("{message}")]
    Wallet {
        /// Human-readable message.
        message: String,
    },

    /// The SDK has no wallet or transfer wiring.
    #[error("{message}")]
    WalletNotInitialized {
        /// Human-readable message.
        message: String,
    },

    /// Invalid caller input, shaped like an HTTP 400.
    #[error("{message}")]
    InvalidParams {
        /// Human-readable message.
        message: String,
    },

    /// Transport or decoding failure. Reported with status 0.
    #[error("{message}")]
    Network {
        /// Human-readable message.
        message: String,
    },

    /// The backend answered the key validation with a rejection.
    #[error("{message}")]
    InvalidApiKey {
        /// Human-readable message.
        message: String,
        /// HTTP status of the rejection.
        status: u16,
    },

    /// The API key could not be validated at all.
    #[error("{message}")]
    Validation {
        /// Human-readable message.
        message: String,
    },

    /// Funds moved on chain but the payment was not recorded.
    ///
    /// Carries the completed deploy hash for manual reconciliation.
    #[error("{message}")]
    RecordingFailed {
        /// Human-readable message.
        message: String,
        /// Hash of the already-executed transfer.
        transaction_hash: String,
    },

    /// Error reported by the backend, passed through verbatim.
    #[error("{message}")]
    Api {
        /// Backend error code (`UNKNOWN_ERROR` when the body carried none).
        code: String,
        /// Backend error message.
        message: String,
        /// HTTP status of the response.
        status: u16,
    },

    /// Unclassified failure.
    #[error("{message}")]
    Unknown {
        /// Human-readable message.
        message: String,
    },
}

impl CasPayError {
    /// Creates a [`CasPayError::WalletNotFound`] pointing at the Casper Wallet install page.
    #[must_use]
    pub fn wallet_not_found(message: impl Into<String>) -> Self {
        Self::WalletNotFound {
            message: message.into(),
            install_url: CASPER_WALLET_INSTALL_URL.to_owned(),
        }
    }

    /// Creates a [`CasPayError::WalletLocked`].
    #[must_use]
    pub fn wallet_locked(message: impl Into<String>) -> Self {
        Self::WalletLocked {
            message: message.into(),
        }
    }

    /// Creates a [`CasPayError::ConnectionRejected`].
    #[must_use]
    pub fn connection_rejected(message: impl Into<String>) -> Self {
        Self::ConnectionRejected {
            message: message.into(),
        }
    }

    /// Creates a [`CasPayError::TransferRejected`].
    #[must_use]
    pub fn transfer_rejected(message: impl Into<String>) -> Self {
        Self::TransferRejected {
            message: message.into(),
        }
    }

    /// Creates a [`CasPayError::Wallet`].
    #[must_use]
    pub fn wallet(message: impl Into<String>) -> Self {
        Self::Wallet {
            message: message.into(),
        }
    }

    /// Creates a [`CasPayError::WalletNotInitialized`].
    #[must_use]
    pub fn wallet_not_initialized(message: impl Into<String>) -> Self {
        Self::WalletNotInitialized {
            message: message.into(),
        }
    }

    /// Creates a [`CasPayError::InvalidParams`].
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Creates a [`CasPayError::Network`].
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a [`CasPayError::InvalidApiKey`].
    #[must_use]
    pub fn invalid_api_key(message: impl Into<String>, status: u16) -> Self {
        Self::InvalidApiKey {
            message: message.into(),
            status,
        }
    }

    /// Creates a [`CasPayError::Validation`].
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a [`CasPayError::RecordingFailed`] for the given deploy hash.
    #[must_use]
    pub fn recording_failed(transaction_hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordingFailed {
            message: message.into(),
            transaction_hash: transaction_hash.into(),
        }
    }

    /// Creates a backend passthrough error.
    #[must_use]
    pub fn api(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
            status,
        }
    }

    /// Creates a [`CasPayError::Unknown`].
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Returns the wire error code.
    ///
    /// For [`CasPayError::Api`] this is whatever code the backend sent.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Api { code, .. } => code,
            other => other
                .error_code()
                .map_or(ErrorCode::UnknownError.as_str(), ErrorCode::as_str),
        }
    }

    /// Returns the SDK error code, if the code belongs to the closed taxonomy.
    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        let code = match self {
            Self::WalletNotFound { .. } => ErrorCode::WalletNotFound,
            Self::WalletLocked { .. } => ErrorCode::WalletLocked,
            Self::ConnectionRejected { .. } => ErrorCode::ConnectionRejected,
            Self::TransferRejected { .. } => ErrorCode::TransferRejected,
            Self::Wallet { .. } => ErrorCode::WalletError,
            Self::WalletNotInitialized { .. } => ErrorCode::WalletNotInitialized,
            Self::InvalidParams { .. } => ErrorCode::InvalidParams,
            Self::Network { .. } => ErrorCode::NetworkError,
            Self::InvalidApiKey { .. } => ErrorCode::InvalidApiKey,
            Self::Validation { .. } => ErrorCode::ValidationError,
            Self::RecordingFailed { .. } => ErrorCode::RecordingFailed,
            Self::Unknown { .. } => ErrorCode::UnknownError,
            Self::Api { code, .. } => return code.parse().ok(),
        };
        Some(code)
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::WalletNotFound { message, .. }
            | Self::WalletLocked { message }
            | Self::ConnectionRejected { message }
            | Self::TransferRejected { message }
            | Self::Wallet { message }
            | Self::WalletNotInitialized { message }
            | Self::InvalidParams { message }
            | Self::Network { message }
            | Self::InvalidApiKey { message, .. }
            | Self::Validation { message }
            | Self::RecordingFailed { message, .. }
            | Self::Api { message, .. }
            | Self::Unknown { message } => message,
        }
    }

    /// Returns the HTTP status associated with the error, if any.
    ///
    /// Parameter errors report 400 and transport errors report 0.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidParams { .. } => Some(400),
            Self::Network { .. } => Some(0),
            Self::InvalidApiKey { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the wallet install page for [`CasPayError::WalletNotFound`].
    #[must_use]
    pub fn install_url(&self) -> Option<&str> {
        match self {
            Self::WalletNotFound { install_url, .. } => Some(install_url),
            _ => None,
        }
    }

    /// Returns the completed deploy hash for [`CasPayError::RecordingFailed`].
    #[must_use]
    pub fn transaction_hash(&self) -> Option<&str> {
        match self {
            Self::RecordingFailed {
                transaction_hash, ..
            } => Some(transaction_hash),
            _ => None,
        }
    }

    /// Returns `true` if repeating the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::TransferRejected { .. } | Self::WalletLocked { .. }
        )
    }
}

/// Wire shape of an error: `{ error, code, status?, installUrl?, transactionHash? }`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    install_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_hash: Option<&'a str>,
}

impl Serialize for CasPayError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ErrorBody {
            error: self.message(),
            code: self.code(),
            status: self.status(),
            install_url: self.install_url(),
            transaction_hash: self.transaction_hash(),
        }
        .serialize(serializer)
    }
}
