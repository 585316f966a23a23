//! Scriptable wallet provider and deploy builder shared by the flow tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use caspay::CasPayConfig;
use caspay::deploy::{DeployBuilder, DeployError, TransferDeployParams};
use caspay::wallet::{InjectedProvider, ProviderError, SignResult, SignatureBytes, WalletProvider};
use serde_json::{Value, json};

pub(crate) const SENDER: &str = "01deadbeef";
pub(crate) const MERCHANT: &str = "01abcmerchant";

/// Provider that is already connected as [`SENDER`].
pub(crate) struct MockProvider {
    pub(crate) sign_result: Mutex<Result<SignResult, ProviderError>>,
    pub(crate) signed: Mutex<Vec<(String, String)>>,
    pub(crate) calls: AtomicUsize,
}

impl MockProvider {
    pub(crate) fn signing(result: Result<SignResult, ProviderError>) -> Arc<Self> {
        Arc::new(Self {
            sign_result: Mutex::new(result),
            signed: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn approving() -> Arc<Self> {
        Self::signing(Ok(SignResult::Signed(SignatureBytes::Raw(vec![0xca, 0xfe]))))
    }

    pub(crate) fn host(self: &Arc<Self>) -> Arc<InjectedProvider> {
        let provider: Arc<dyn WalletProvider> = Arc::<MockProvider>::clone(self);
        Arc::new(InjectedProvider::new(provider))
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn signed_payloads(&self) -> Vec<(String, String)> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn is_connected(&self) -> Result<bool, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn request_connection(&self) -> Result<bool, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn get_active_public_key(&self) -> Result<Option<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(SENDER.to_owned()))
    }

    async fn sign(&self, payload: &str, address: &str) -> Result<SignResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.signed
            .lock()
            .unwrap()
            .push((payload.to_owned(), address.to_owned()));
        self.sign_result.lock().unwrap().clone()
    }

    async fn disconnect_from_site(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

/// Builds a minimal deploy echoing its inputs.
pub(crate) fn echo_builder() -> Arc<dyn DeployBuilder> {
    Arc::new(|params: &TransferDeployParams| -> Result<Value, DeployError> {
        Ok(json!({
            "hash": "deploy-hash",
            "header": { "account": params.sender, "chain_name": params.chain_name },
            "payment": { "amount": params.payment_amount },
            "session": {
                "amount": params.amount,
                "target": params.recipient,
                "id": params.transfer_id,
            },
            "approvals": [],
        }))
    })
}

pub(crate) fn config(base_url: &str) -> CasPayConfig {
    CasPayConfig::new("cp_test_key", "MERCH_1")
        .with_wallet_address(MERCHANT)
        .with_base_url(base_url)
}
