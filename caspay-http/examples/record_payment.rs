//! Records a payment and checks a subscription against the CasPay backend.
//!
//! # Usage
//!
//! ```bash
//! CASPAY_API_KEY=cp_test_... CASPAY_MERCHANT_ID=MERCH_... \
//!   cargo run -p caspay-http --example record_payment --features telemetry
//! ```
//!
//! # Environment Variables
//!
//! - `CASPAY_API_KEY` - Merchant API key (required)
//! - `CASPAY_MERCHANT_ID` - Merchant id (required)
//! - `CASPAY_NETWORK` - `mainnet` or `testnet` (default: `testnet`)
//! - `CASPAY_BASE_URL` - Backend override (default: `https://api.caspay.link`)
//! - `SENDER_ADDRESS` - Payer public key (default: a sample key)
//! - `PRODUCT_ID` - Product to record the payment for (default: `prod_demo`)
//! - `RUST_LOG` - Log level filter (default: `info`)
//!
//! Variables are also read from a `.env` file in the working directory.

use caspay::CasPayConfig;
use caspay::types::{PaymentParams, SubscriptionCheckParams};
use caspay_http::CasPay;
use tracing_subscriber::EnvFilter;

const SAMPLE_SENDER: &str = "0203b2f8c0613d2d866948c46e296f09faed9b029110d424d19d488a0c39a811ebbc";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = CasPayConfig::from_env()?;
    let sdk = CasPay::new(config)?;
    tracing::info!(version = CasPay::VERSION, base_url = sdk.client().base_url(), "SDK ready");

    let key = sdk.client().validate_api_key().await?;
    tracing::info!(merchant_id = ?key.merchant_id, "API key accepted");

    let sender = std::env::var("SENDER_ADDRESS").unwrap_or_else(|_| SAMPLE_SENDER.to_owned());
    let product = std::env::var("PRODUCT_ID").unwrap_or_else(|_| "prod_demo".to_owned());

    let payment = sdk
        .payments()
        .record_payment(&PaymentParams::for_product(&sender, product, 10.0))
        .await?;
    tracing::info!(
        id = %payment.payment.id,
        status = %payment.payment.status,
        transaction_hash = %payment.payment.transaction_hash,
        "Payment recorded"
    );

    let status = sdk
        .subscriptions()
        .check_status(&SubscriptionCheckParams::new(sender))
        .await?;
    tracing::info!(
        active = status.active,
        subscriptions = status.subscriptions.len(),
        "Subscription status"
    );

    Ok(())
}
