//! Wallet/signer adapter.
//!
//! A connection exposes the account address and an async accessor that
//! resolves to a signing capability, or `None` while no wallet is usable.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::transaction::eip712::TypedData;
use ethers::types::Signature;
use thiserror::Error;

use crate::contracts::LaunchpadCall;
use crate::types::{Address, TxHash, TxReceipt};

/// Errors raised by a signer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SignerError {
    /// The wallet holder declined the request.
    #[error("request rejected by user")]
    Rejected,

    /// The transaction was rejected on submission or reverted.
    #[error("{0}")]
    Reverted(String),

    /// Transport failure talking to the node or wallet.
    #[error("transport error: {0}")]
    Transport(String),

    /// Local signing failure.
    #[error("signing error: {0}")]
    Signing(String),
}

/// Transaction and typed-data signing capability of a connected wallet.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Account the signer acts for.
    fn address(&self) -> Address;

    /// Produce an EIP-712 signature over `payload`.
    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature, SignerError>;

    /// Sign and broadcast a launchpad call, returning its hash.
    async fn send_call(&self, call: &LaunchpadCall) -> Result<TxHash, SignerError>;

    /// Block until `tx_hash` has `confirmations` confirmations.
    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        confirmations: usize,
    ) -> Result<TxReceipt, SignerError>;
}

/// Current wallet connection.
#[derive(Clone, Default)]
pub struct WalletConnection {
    account: Option<Address>,
    signer: Option<Arc<dyn WalletSigner>>,
}

impl WalletConnection {
    /// No wallet connected.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Connected with a resolved signer.
    pub fn connected(signer: Arc<dyn WalletSigner>) -> Self {
        Self {
            account: Some(signer.address()),
            signer: Some(signer),
        }
    }

    /// Account known but the signer is not (yet) resolvable.
    pub fn account_only(account: Address) -> Self {
        Self {
            account: Some(account),
            signer: None,
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// Resolve the signing capability.
    pub async fn signer(&self) -> Option<Arc<dyn WalletSigner>> {
        self.signer.clone()
    }
}

impl fmt::Debug for WalletConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConnection")
            .field("account", &self.account)
            .field("has_signer", &self.signer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSigner;

    #[tokio::test]
    async fn connection_states() {
        let disconnected = WalletConnection::disconnected();
        assert!(!disconnected.is_connected());
        assert!(disconnected.signer().await.is_none());

        let account = Address::repeat_byte(0x42);
        let pending = WalletConnection::account_only(account);
        assert_eq!(pending.account(), Some(account));
        assert!(pending.signer().await.is_none());

        let signer = Arc::new(FakeSigner::new(account));
        let connected = WalletConnection::connected(signer);
        assert_eq!(connected.account(), Some(account));
        let resolved = connected.signer().await.expect("signer resolves");
        assert_eq!(resolved.address(), account);
    }
}
