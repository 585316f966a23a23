//! Casper deploy construction seam, approvals and signature tagging.
//!
//! The SDK does not serialize Casper deploys itself. A [`DeployBuilder`]
//! produces the canonical deploy JSON for a standard payment plus native
//! transfer; the SDK then has it signed by the wallet, attaches the approval
//! and relays it through the CasPay backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::amount::Motes;
use crate::wallet::SignatureBytes;

/// Fixed standard payment attached to every native transfer (0.1 CSPR).
pub const DEFAULT_PAYMENT_AMOUNT: Motes = Motes::new(100_000_000);

/// Inputs for a standard-payment native transfer deploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDeployParams {
    /// Casper chain name (`casper` or `casper-test`).
    pub chain_name: String,
    /// Sender public key (hex).
    pub sender: String,
    /// Recipient public key (hex).
    pub recipient: String,
    /// Transferred amount.
    pub amount: Motes,
    /// Casper transfer id.
    pub transfer_id: u64,
    /// Gas payment amount.
    pub payment_amount: Motes,
}

/// Errors raised while building or finalizing a deploy.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The builder could not produce a deploy.
    #[error("failed to build deploy: {0}")]
    Build(String),

    /// Deploy JSON is not an object, so no approval can be attached.
    #[error("deploy JSON must be an object")]
    NotAnObject,

    /// Deploy JSON could not be (de)serialized.
    #[error("deploy JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Produces canonical Casper deploy JSON.
///
/// Implemented for any `Fn(&TransferDeployParams) -> Result<Value, DeployError>`
/// closure.
pub trait DeployBuilder: Send + Sync {
    /// Builds an unsigned standard-payment native transfer deploy.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError`] if the deploy cannot be built.
    fn build_transfer(&self, params: &TransferDeployParams) -> Result<Value, DeployError>;
}

impl<F> DeployBuilder for F
where
    F: Fn(&TransferDeployParams) -> Result<Value, DeployError> + Send + Sync,
{
    fn build_transfer(&self, params: &TransferDeployParams) -> Result<Value, DeployError> {
        self(params)
    }
}

/// A deploy approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    /// Signer public key (hex).
    pub signer: String,
    /// Algorithm-tagged signature (hex).
    pub signature: String,
}

/// Prefixes a signature with the signer's key algorithm tag.
///
/// Casper public keys start with a one-byte algorithm tag (`01` ed25519,
/// `02` secp256k1), which approvals repeat in front of the raw signature.
#[must_use]
pub fn tag_signature(sender: &str, signature: &SignatureBytes) -> String {
    let tag: String = sender.chars().take(2).collect();
    format!("{tag}{}", signature.to_hex())
}

/// Replaces the deploy's approvals with `approval`.
///
/// # Errors
///
/// Returns [`DeployError::NotAnObject`] if `deploy` is not a JSON object.
pub fn attach_approval(deploy: &mut Value, approval: Approval) -> Result<(), DeployError> {
    let object = deploy.as_object_mut().ok_or(DeployError::NotAnObject)?;
    object.insert(
        "approvals".to_owned(),
        Value::Array(vec![serde_json::to_value(approval)?]),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_tag_signature() {
        let sig = SignatureBytes::Raw(vec![0xde, 0xad]);
        assert_eq!(tag_signature("01deadbeef", &sig), "01dead");
        assert_eq!(
            tag_signature("02abc", &SignatureBytes::Hex("BEEF".into())),
            "02beef"
        );
        assert_eq!(tag_signature("", &sig), "dead");
    }

    #[test]
    fn test_attach_approval_replaces_existing() {
        let mut deploy = json!({ "hash": "h", "approvals": [{ "signer": "old", "signature": "old" }] });
        attach_approval(
            &mut deploy,
            Approval {
                signer: "01ab".into(),
                signature: "01ff".into(),
            },
        )
        .unwrap();
        assert_eq!(deploy["approvals"], json!([{ "signer": "01ab", "signature": "01ff" }]));
        assert_eq!(deploy["hash"], "h");
    }

    #[test]
    fn test_attach_approval_requires_object() {
        let mut deploy = json!("not a deploy");
        let approval = Approval {
            signer: "s".into(),
            signature: "x".into(),
        };
        assert!(matches!(
            attach_approval(&mut deploy, approval),
            Err(DeployError::NotAnObject)
        ));
    }

    #[test]
    fn test_closure_is_a_builder() {
        let builder = |params: &TransferDeployParams| -> Result<Value, DeployError> {
            Ok(json!({ "amount": params.amount, "chain": params.chain_name }))
        };
        let params = TransferDeployParams {
            chain_name: "casper-test".into(),
            sender: "01a".into(),
            recipient: "01b".into(),
            amount: Motes::new(5),
            transfer_id: 1,
            payment_amount: DEFAULT_PAYMENT_AMOUNT,
        };
        let deploy = builder.build_transfer(&params).unwrap();
        assert_eq!(deploy, json!({ "amount": "5", "chain": "casper-test" }));
    }
}
