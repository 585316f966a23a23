#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport and payment flows for the CasPay payment gateway.
//!
//! Builds on the core types of [`caspay`] to talk to the CasPay backend:
//! recording payments, checking subscriptions, validating API keys, and
//! relaying wallet-signed CSPR transfers.
//!
//! # Modules
//!
//! - [`client`] - Authenticated JSON client and error mapping
//! - [`constants`] - Header names, endpoint paths and defaults
//! - [`payments`] - Payment recording and the end-to-end wallet payment
//! - [`sdk`] - The [`CasPay`] facade and its builder
//! - [`subscriptions`] - Subscription status checks
//! - [`transfer`] - Wallet-signed native transfers relayed via `/rpc`
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod client;
pub mod constants;
pub mod payments;
pub mod sdk;
pub mod subscriptions;
pub mod transfer;

#[cfg(test)]
mod test_support;

pub use client::HttpClient;
pub use payments::Payments;
pub use sdk::{CasPay, CasPayBuilder};
pub use subscriptions::Subscriptions;
pub use transfer::Transfer;
