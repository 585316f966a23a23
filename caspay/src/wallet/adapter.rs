use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

use super::events::{WalletEvent, parse_active_key};
use super::provider::{ProviderError, SignResult, SignatureBytes, WalletHost, WalletProvider};
use crate::config::CasPayConfig;
use crate::error::CasPayError;
use crate::network::Network;

/// Cached connection info, read without touching the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    /// Last known connection flag.
    pub is_connected: bool,
    /// Last known active address.
    pub address: Option<String>,
}

/// Live wallet state as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalletState {
    /// Whether the site is connected.
    pub connected: bool,
    /// Active address, if connected.
    pub address: Option<String>,
    /// Set when a wallet is installed but not connected.
    pub locked: bool,
}

#[derive(Debug, Default)]
struct WalletSession {
    connected: bool,
    active_address: Option<String>,
}

struct WalletInner {
    host: Option<Arc<dyn WalletHost>>,
    merchant_address: Option<String>,
    network: Network,
    provider: Mutex<Option<Arc<dyn WalletProvider>>>,
    session: Mutex<WalletSession>,
    /// Serializes provider round-trips issued through the public API.
    op_lock: tokio::sync::Mutex<()>,
}

/// Adapter over an injected Casper Wallet provider.
///
/// Cloning is cheap and clones share one session. Operations that talk to
/// the provider run one at a time; provider events update the session
/// independently.
#[derive(Clone)]
pub struct Wallet {
    inner: Arc<WalletInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn wallet_not_found(message: &str) -> CasPayError {
    CasPayError::wallet_not_found(message)
}

impl Wallet {
    /// Creates the adapter and instantiates the provider if the host has one.
    ///
    /// Provider events are consumed on the current tokio runtime. Without a
    /// runtime, events can still be fed in through [`Wallet::apply_event`].
    #[must_use]
    pub fn new(config: &CasPayConfig, host: Option<Arc<dyn WalletHost>>) -> Self {
        let wallet = Self {
            inner: Arc::new(WalletInner {
                host,
                merchant_address: config.wallet_address.clone(),
                network: config.network_or_default(),
                provider: Mutex::new(None),
                session: Mutex::new(WalletSession::default()),
                op_lock: tokio::sync::Mutex::new(()),
            }),
        };
        wallet.init_provider();
        wallet
    }

    /// Instantiates the provider once and subscribes to its events.
    fn init_provider(&self) -> Option<Arc<dyn WalletProvider>> {
        let host = self.inner.host.as_ref()?;
        if !host.has_provider() {
            return None;
        }
        let mut slot = lock(&self.inner.provider);
        if let Some(provider) = slot.as_ref() {
            return Some(Arc::clone(provider));
        }
        let provider = host.create_provider()?;
        *slot = Some(Arc::clone(&provider));
        drop(slot);

        if let Some(events) = host.subscribe() {
            self.listen(events);
        }
        Some(provider)
    }

    fn listen(&self, mut events: UnboundedReceiver<WalletEvent>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            #[cfg(feature = "telemetry")]
            tracing::warn!("no tokio runtime, wallet events will not be consumed");
            return;
        };
        let weak: Weak<WalletInner> = Arc::downgrade(&self.inner);
        runtime.spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(inner) = weak.upgrade() else { break };
                Self { inner }.apply_event(event).await;
            }
        });
    }

    /// Returns `true` if the host exposes a wallet provider.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.inner
            .host
            .as_ref()
            .is_some_and(|host| host.has_provider())
    }

    /// Returns the instantiated provider, if any.
    #[must_use]
    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        lock(&self.inner.provider).clone()
    }

    /// Asks the provider whether the site is connected.
    ///
    /// Any provider failure counts as not connected.
    pub async fn is_connected(&self) -> bool {
        let _guard = self.inner.op_lock.lock().await;
        self.is_connected_inner().await
    }

    async fn is_connected_inner(&self) -> bool {
        let connected = match self.provider() {
            Some(provider) => provider.is_connected().await.unwrap_or(false),
            None => false,
        };
        lock(&self.inner.session).connected = connected;
        connected
    }

    /// Connects to the wallet and returns the active address.
    ///
    /// # Errors
    ///
    /// - `WALLET_NOT_FOUND` if no provider is installed or it cannot be instantiated
    /// - `CONNECTION_REJECTED` if the user refuses
    /// - `WALLET_LOCKED` if the wallet is locked
    /// - `UNKNOWN_ERROR` for any other provider failure
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(name = "caspay.wallet.connect", skip_all, err)
    )]
    pub async fn connect(&self) -> Result<String, CasPayError> {
        let _guard = self.inner.op_lock.lock().await;
        self.connect_inner().await
    }

    async fn connect_inner(&self) -> Result<String, CasPayError> {
        if !self.is_available() {
            return Err(wallet_not_found(
                "Casper Wallet extension not found. Please install it first.",
            ));
        }
        let provider = self
            .init_provider()
            .ok_or_else(|| wallet_not_found("Failed to initialize Casper Wallet provider."))?;

        let approved = provider.request_connection().await.map_err(connect_error)?;
        if !approved {
            return Err(CasPayError::connection_rejected(
                "Wallet connection was rejected by the user.",
            ));
        }
        lock(&self.inner.session).connected = true;

        let address = provider
            .get_active_public_key()
            .await
            .map_err(connect_error)?
            .filter(|key| !key.is_empty());
        lock(&self.inner.session).active_address.clone_from(&address);

        let address = address.ok_or_else(|| {
            CasPayError::unknown("Failed to get wallet address after connection.")
        })?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(address = %address, "wallet connected");

        Ok(address)
    }

    /// Disconnects from the wallet. Provider failures are ignored.
    pub async fn disconnect(&self) {
        let _guard = self.inner.op_lock.lock().await;
        if let Some(provider) = self.provider() {
            let _ = provider.disconnect_from_site().await;
        }
        let mut session = lock(&self.inner.session);
        session.connected = false;
        session.active_address = None;
    }

    /// Returns the active address if the site is connected.
    ///
    /// Provider failures yield `None`.
    pub async fn address(&self) -> Option<String> {
        let _guard = self.inner.op_lock.lock().await;
        self.address_inner().await
    }

    async fn address_inner(&self) -> Option<String> {
        let provider = self.provider()?;
        if !self.is_connected_inner().await {
            return None;
        }
        let address = provider.get_active_public_key().await.ok().flatten();
        lock(&self.inner.session).active_address.clone_from(&address);
        address
    }

    /// Returns the cached connection info.
    #[must_use]
    pub fn info(&self) -> WalletInfo {
        let session = lock(&self.inner.session);
        WalletInfo {
            is_connected: session.connected,
            address: session.active_address.clone(),
        }
    }

    /// Queries the provider for the current wallet state.
    pub async fn state(&self) -> WalletState {
        let _guard = self.inner.op_lock.lock().await;
        let connected = self.is_connected_inner().await;
        let address = if connected {
            self.address_inner().await
        } else {
            None
        };
        WalletState {
            connected,
            address,
            locked: !connected && self.is_available(),
        }
    }

    /// Returns the merchant's receiving address from the configuration.
    #[must_use]
    pub fn merchant_wallet_address(&self) -> Option<&str> {
        self.inner.merchant_address.as_deref()
    }

    /// Returns the configured network.
    #[must_use]
    pub fn network_kind(&self) -> Network {
        self.inner.network
    }

    /// Returns the Casper chain name of the configured network.
    #[must_use]
    pub fn network(&self) -> &'static str {
        self.inner.network.chain_name()
    }

    /// Returns the chain name the wallet is on, falling back to
    /// [`Wallet::network`] when the provider cannot tell.
    pub async fn active_network(&self) -> String {
        if let Some(provider) = self.provider()
            && let Ok(Some(network)) = provider.get_active_network().await
            && !network.is_empty()
        {
            return network;
        }
        self.network().to_owned()
    }

    /// Has the wallet sign a deploy, connecting first if needed.
    ///
    /// # Errors
    ///
    /// - `WALLET_NOT_FOUND` if no provider is instantiated
    /// - `TRANSFER_REJECTED` if the user declines
    /// - errors of [`Wallet::connect`] when auto-connecting
    /// - `UNKNOWN_ERROR` for any other provider failure
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(name = "caspay.wallet.sign_deploy", skip_all, err)
    )]
    pub async fn sign_deploy(&self, deploy: &Value) -> Result<SignatureBytes, CasPayError> {
        let _guard = self.inner.op_lock.lock().await;
        let provider = self
            .provider()
            .ok_or_else(|| wallet_not_found("Casper Wallet not available."))?;

        if !self.is_connected_inner().await {
            self.connect_inner().await?;
        }

        let address = lock(&self.inner.session)
            .active_address
            .clone()
            .unwrap_or_default();
        let payload = deploy.to_string();
        match provider.sign(&payload, &address).await {
            Ok(SignResult::Signed(signature)) => Ok(signature),
            Ok(SignResult::Cancelled) => Err(signature_rejected()),
            Err(err) if err.is_cancellation() => Err(signature_rejected()),
            Err(err) => Err(CasPayError::unknown(non_empty_or(
                err.to_string(),
                "Failed to sign deploy.",
            ))),
        }
    }

    /// Applies a provider event to the session.
    ///
    /// Malformed event details leave the session untouched. `Unlocked`
    /// re-queries the provider, ignoring failures.
    pub async fn apply_event(&self, event: WalletEvent) {
        #[cfg(feature = "telemetry")]
        tracing::trace!(event = event.name(), "wallet event");

        match event {
            WalletEvent::Connected(detail) => {
                if let Some(address) = parse_active_key(&detail) {
                    let mut session = lock(&self.inner.session);
                    session.connected = true;
                    session.active_address = address;
                }
            }
            WalletEvent::Disconnected => {
                let mut session = lock(&self.inner.session);
                session.connected = false;
                session.active_address = None;
            }
            WalletEvent::ActiveKeyChanged(detail) => {
                if let Some(address) = parse_active_key(&detail) {
                    lock(&self.inner.session).active_address = address;
                }
            }
            WalletEvent::Locked => lock(&self.inner.session).connected = false,
            WalletEvent::Unlocked => self.refresh_from_provider().await,
        }
    }

    async fn refresh_from_provider(&self) {
        let Some(provider) = self.provider() else {
            return;
        };
        let Ok(connected) = provider.is_connected().await else {
            return;
        };
        lock(&self.inner.session).connected = connected;
        if connected && let Ok(address) = provider.get_active_public_key().await {
            lock(&self.inner.session).active_address = address;
        }
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("available", &self.is_available())
            .field("network", &self.inner.network)
            .field("merchant_address", &self.inner.merchant_address)
            .field("session", &*lock(&self.inner.session))
            .finish_non_exhaustive()
    }
}

fn connect_error(err: ProviderError) -> CasPayError {
    match err {
        ProviderError::Locked => CasPayError::wallet_locked(
            "Wallet is locked. Please unlock your Casper Wallet and try again.",
        ),
        ProviderError::Rejected(_) => {
            CasPayError::connection_rejected("Wallet connection was rejected by the user.")
        }
        other => CasPayError::unknown(non_empty_or(
            other.to_string(),
            "Failed to connect to wallet.",
        )),
    }
}

fn signature_rejected() -> CasPayError {
    CasPayError::transfer_rejected("Transaction was rejected by the user.")
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_owned()
    } else {
        message
    }
}
