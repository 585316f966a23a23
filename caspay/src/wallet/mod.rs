//! Casper Wallet integration.
//!
//! The hosting environment supplies a [`WalletHost`], which in turn hands out
//! a [`WalletProvider`] and, optionally, a channel of [`WalletEvent`]s. The
//! [`Wallet`] adapter wraps both into a connection session used by the
//! transfer and payment flows.

mod adapter;
mod events;
mod provider;

pub use adapter::{Wallet, WalletInfo, WalletState};
pub use events::{
    ACTIVE_KEY_CHANGED_EVENT, CONNECTED_EVENT, DISCONNECTED_EVENT, LOCKED_EVENT, UNLOCKED_EVENT,
    WalletEvent,
};
pub use provider::{
    InjectedProvider, LOCKED_ERROR_CODE, ProviderError, REJECTED_ERROR_CODE, SignResult,
    SignatureBytes, WalletHost, WalletProvider, is_cancellation_message,
};
