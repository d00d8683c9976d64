//! Devnet accounts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip712::TypedData;
use ethers::types::Signature;
use ethers::utils::keccak256;
use tracing::info;

use primelaunch_core::{
    Address, LaunchpadCall, SignerError, TxHash, TxReceipt, WalletConnection, WalletSigner,
};

use crate::{Devnet, DevnetError};

/// A devnet account with a deterministic key.
pub struct DevnetSigner {
    devnet: Arc<Devnet>,
    wallet: LocalWallet,
    reject_signatures: AtomicBool,
}

impl DevnetSigner {
    /// Account number `index`; the same index always yields the same key.
    pub fn new(devnet: Arc<Devnet>, index: u32) -> Result<Self, DevnetError> {
        let mut seed = b"primelaunch-devnet account".to_vec();
        seed.extend_from_slice(&index.to_be_bytes());
        let wallet = LocalWallet::from_bytes(&keccak256(&seed))
            .map_err(|e| DevnetError::Key(e.to_string()))?
            .with_chain_id(devnet.chain_id());
        Ok(Self {
            devnet,
            wallet,
            reject_signatures: AtomicBool::new(false),
        })
    }

    /// Make the account decline every typed-data signature request.
    pub fn set_reject_signatures(&self, reject: bool) {
        self.reject_signatures.store(reject, Ordering::SeqCst);
    }

    /// Wallet connection backed by this account.
    pub fn connect(self: &Arc<Self>) -> WalletConnection {
        WalletConnection::connected(Arc::clone(self) as Arc<dyn WalletSigner>)
    }
}

#[async_trait]
impl WalletSigner for DevnetSigner {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature, SignerError> {
        if self.reject_signatures.load(Ordering::SeqCst) {
            return Err(SignerError::Rejected);
        }
        self.wallet
            .sign_typed_data(payload)
            .await
            .map_err(|e| SignerError::Signing(e.to_string()))
    }

    async fn send_call(&self, call: &LaunchpadCall) -> Result<TxHash, SignerError> {
        let tx_hash = self
            .devnet
            .send_transaction(self.address(), call.target(), call.calldata())
            .await
            .map_err(|e| match e {
                DevnetError::Offline => SignerError::Transport("connection refused".into()),
                other => SignerError::Reverted(other.to_string()),
            })?;
        info!("Transaction submitted: {:?}", tx_hash);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        _confirmations: usize,
    ) -> Result<TxReceipt, SignerError> {
        // Blocks are mined on submission.
        self.devnet
            .receipt(tx_hash)
            .await
            .ok_or_else(|| SignerError::Transport(format!("transaction {:?} dropped", tx_hash)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounts_are_deterministic_and_distinct() {
        let devnet = Arc::new(Devnet::new());
        let a = DevnetSigner::new(devnet.clone(), 0).unwrap();
        let b = DevnetSigner::new(devnet.clone(), 0).unwrap();
        let c = DevnetSigner::new(devnet, 1).unwrap();
        assert_eq!(a.address(), b.address());
        assert_ne!(a.address(), c.address());
    }

    #[tokio::test]
    async fn reverts_surface_as_reverted() {
        let devnet = Arc::new(Devnet::new());
        let signer = DevnetSigner::new(devnet, 0).unwrap();
        let call = LaunchpadCall::Freemint {
            token: Address::repeat_byte(0x42),
            amount: 1,
        };
        let err = signer.send_call(&call).await.unwrap_err();
        assert_eq!(
            err,
            SignerError::Reverted("execution reverted: function selector was not recognized".into())
        );
    }
}
