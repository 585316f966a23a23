#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the CasPay payment gateway SDK.
//!
//! This crate holds everything that does not need an HTTP stack: the
//! configuration surface, the closed error taxonomy, CSPR amount handling,
//! request/response types for the CasPay backend, and the wallet adapter that
//! drives an injected Casper wallet provider. The HTTP transport, resources
//! and the [`CasPay`](https://docs.rs/caspay-http) facade live in
//! `caspay-http`.
//!
//! # Modules
//!
//! - [`amount`] - CSPR to motes conversion
//! - [`config`] - SDK configuration and validation
//! - [`deploy`] - Deploy builder capability, approvals and signature tagging
//! - [`error`] - The [`CasPayError`] taxonomy
//! - [`network`] - Logical network selector and Casper chain names
//! - [`timestamp`] - Millisecond Unix timestamps for transfer ids
//! - [`types`] - Payment, subscription and transfer types
//! - [`wallet`] - Wallet provider capability and the [`Wallet`] adapter
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod amount;
pub mod config;
pub mod deploy;
pub mod error;
pub mod network;
pub mod timestamp;
pub mod types;
pub mod wallet;

pub use amount::Motes;
pub use config::{CasPayConfig, ConfigError};
pub use error::{CasPayError, ErrorCode};
pub use network::Network;
pub use wallet::Wallet;
