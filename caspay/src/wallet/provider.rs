use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use super::events::WalletEvent;

/// Provider error code for a locked wallet.
pub const LOCKED_ERROR_CODE: i64 = 1;

/// Provider error code for a request the user rejected.
pub const REJECTED_ERROR_CODE: i64 = 2;

/// Failures reported by a [`WalletProvider`], classified at the boundary.
///
/// Providers report failures with a loose mix of numeric codes and free-form
/// messages. [`ProviderError::from_raw`] folds those into this closed set so
/// the rest of the SDK never inspects provider-specific shapes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The wallet is locked.
    #[error("wallet is locked")]
    Locked,

    /// The user rejected or cancelled the request.
    #[error("{0}")]
    Rejected(String),

    /// The provider does not implement the requested operation.
    #[error("operation not supported by the wallet provider")]
    Unsupported,

    /// Any other provider failure.
    #[error("{message}")]
    Other {
        /// Raw provider code, if one was reported.
        code: Option<i64>,
        /// Raw provider message.
        message: String,
    },
}

impl ProviderError {
    /// Classifies a raw provider failure.
    ///
    /// Code [`LOCKED_ERROR_CODE`] means locked; code [`REJECTED_ERROR_CODE`]
    /// or a message mentioning rejection/cancellation means the user declined.
    #[must_use]
    pub fn from_raw(code: Option<i64>, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            Some(LOCKED_ERROR_CODE) => Self::Locked,
            Some(REJECTED_ERROR_CODE) => Self::Rejected(message),
            _ if is_cancellation_message(&message) => Self::Rejected(message),
            _ => Self::Other { code, message },
        }
    }

    /// Returns `true` if the user declined the request.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Returns `true` if a failure message reads like a user rejection.
#[must_use]
pub fn is_cancellation_message(message: &str) -> bool {
    message.contains("rejected") || message.contains("cancel")
}

/// A signature as handed back by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureBytes {
    /// Hex-encoded signature.
    Hex(String),
    /// Raw signature bytes.
    Raw(Vec<u8>),
}

impl SignatureBytes {
    /// Returns the signature as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        match self {
            Self::Hex(hex) => hex.to_ascii_lowercase(),
            Self::Raw(bytes) => hex::encode(bytes),
        }
    }
}

/// Outcome of a signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignResult {
    /// The user closed the signing prompt.
    Cancelled,
    /// The payload was signed.
    Signed(SignatureBytes),
}

/// Capabilities of an injected Casper wallet provider.
///
/// Implemented by the hosting environment, e.g. a bridge to the Casper Wallet
/// browser extension. Errors must be classified with
/// [`ProviderError::from_raw`] or constructed directly.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Returns whether the site is connected to the wallet.
    async fn is_connected(&self) -> Result<bool, ProviderError>;

    /// Asks the user to connect. Returns `false` if the user refused.
    async fn request_connection(&self) -> Result<bool, ProviderError>;

    /// Returns the active public key (hex), if any.
    async fn get_active_public_key(&self) -> Result<Option<String>, ProviderError>;

    /// Asks the user to sign `payload_json` with the key of `address`.
    async fn sign(&self, payload_json: &str, address: &str) -> Result<SignResult, ProviderError>;

    /// Disconnects the site from the wallet.
    async fn disconnect_from_site(&self) -> Result<bool, ProviderError>;

    /// Returns the chain name the wallet is currently on.
    ///
    /// Optional; the default reports [`ProviderError::Unsupported`].
    async fn get_active_network(&self) -> Result<Option<String>, ProviderError> {
        Err(ProviderError::Unsupported)
    }
}

/// The host environment a [`Wallet`](super::Wallet) discovers its provider in.
pub trait WalletHost: Send + Sync {
    /// Returns `true` if the host exposes a provider factory at all.
    fn has_provider(&self) -> bool;

    /// Instantiates the provider. `None` if instantiation is not possible yet.
    fn create_provider(&self) -> Option<Arc<dyn WalletProvider>>;

    /// Hands out the provider's state-change notifications.
    ///
    /// Called each time a provider is instantiated. The default emits none.
    fn subscribe(&self) -> Option<UnboundedReceiver<WalletEvent>> {
        None
    }
}

/// [`WalletHost`] around an already-instantiated provider.
pub struct InjectedProvider {
    provider: Arc<dyn WalletProvider>,
    events: Mutex<Option<UnboundedReceiver<WalletEvent>>>,
}

impl InjectedProvider {
    /// Wraps a provider that emits no events.
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            provider,
            events: Mutex::new(None),
        }
    }

    /// Attaches the provider's event stream. It is handed out once.
    #[must_use]
    pub fn with_events(self, events: UnboundedReceiver<WalletEvent>) -> Self {
        Self {
            provider: self.provider,
            events: Mutex::new(Some(events)),
        }
    }
}

impl fmt::Debug for InjectedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectedProvider").finish_non_exhaustive()
    }
}

impl WalletHost for InjectedProvider {
    fn has_provider(&self) -> bool {
        true
    }

    fn create_provider(&self) -> Option<Arc<dyn WalletProvider>> {
        Some(Arc::clone(&self.provider))
    }

    fn subscribe(&self) -> Option<UnboundedReceiver<WalletEvent>> {
        self.events.lock().ok()?.take()
    }
}
