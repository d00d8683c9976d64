//! Contract write layer: `createToken` and `freemint`.
//!
//! A write is two-phase. `submit_*` validates input, resolves the signer and
//! broadcasts; [`PendingWrite::confirm`] blocks until the transaction is
//! included. Nothing is retried automatically.

use std::sync::Arc;

use tracing::{info, warn};

use crate::contracts::LaunchpadCall;
use crate::error::LaunchpadError;
use crate::types::{Address, TxHash, TxReceipt};
use crate::validation::{parse_mint_amount, TokenDraft};
use crate::wallet::{SignerError, WalletConnection, WalletSigner};

/// A broadcast transaction awaiting inclusion.
pub struct PendingWrite {
    signer: Arc<dyn WalletSigner>,
    call: LaunchpadCall,
    tx_hash: TxHash,
    confirmations: usize,
}

impl PendingWrite {
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn call(&self) -> &LaunchpadCall {
        &self.call
    }

    /// Wait for the configured number of confirmations.
    pub async fn confirm(self) -> Result<TxReceipt, LaunchpadError> {
        let receipt = self
            .signer
            .wait_for_receipt(self.tx_hash, self.confirmations)
            .await
            .map_err(transaction_failure)?;
        info!(
            "{} confirmed in block {:?}: {:?}",
            self.call.describe(),
            receipt.block_number,
            receipt.tx_hash
        );
        Ok(receipt)
    }
}

/// Submits launchpad transactions through the connected wallet.
#[derive(Clone, Debug)]
pub struct LaunchpadWriter {
    factory: Address,
    confirmations: usize,
}

impl LaunchpadWriter {
    pub fn new(factory: Address, confirmations: usize) -> Self {
        Self {
            factory,
            confirmations: confirmations.max(1),
        }
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    /// Validate and broadcast `createToken(name, symbol)`.
    pub async fn submit_create_token(
        &self,
        wallet: &WalletConnection,
        name: &str,
        symbol: &str,
    ) -> Result<PendingWrite, LaunchpadError> {
        let draft = TokenDraft::new(name, symbol)?;
        let call = LaunchpadCall::CreateToken {
            factory: self.factory,
            name: draft.name().to_string(),
            symbol: draft.symbol().to_string(),
        };
        self.submit(wallet, call).await
    }

    /// Validate and broadcast `freemint(amount)` on `token`.
    pub async fn submit_freemint(
        &self,
        wallet: &WalletConnection,
        token: Address,
        amount: &str,
    ) -> Result<PendingWrite, LaunchpadError> {
        let amount = parse_mint_amount(amount)?;
        self.submit(wallet, LaunchpadCall::Freemint { token, amount })
            .await
    }

    /// Submit and wait for confirmation.
    pub async fn create_token(
        &self,
        wallet: &WalletConnection,
        name: &str,
        symbol: &str,
    ) -> Result<TxReceipt, LaunchpadError> {
        self.submit_create_token(wallet, name, symbol)
            .await?
            .confirm()
            .await
    }

    /// Submit and wait for confirmation.
    pub async fn freemint(
        &self,
        wallet: &WalletConnection,
        token: Address,
        amount: &str,
    ) -> Result<TxReceipt, LaunchpadError> {
        self.submit_freemint(wallet, token, amount)
            .await?
            .confirm()
            .await
    }

    async fn submit(
        &self,
        wallet: &WalletConnection,
        call: LaunchpadCall,
    ) -> Result<PendingWrite, LaunchpadError> {
        if !wallet.is_connected() {
            return Err(LaunchpadError::NoWalletConnected);
        }
        let signer = wallet
            .signer()
            .await
            .ok_or(LaunchpadError::NoSignerAvailable)?;

        let tx_hash = signer.send_call(&call).await.map_err(|e| {
            warn!("Failed to submit {}: {}", call.describe(), e);
            transaction_failure(e)
        })?;
        info!("Submitted {}: {:?}", call.describe(), tx_hash);

        Ok(PendingWrite {
            signer,
            call,
            tx_hash,
            confirmations: self.confirmations,
        })
    }
}

fn transaction_failure(err: SignerError) -> LaunchpadError {
    LaunchpadError::TransactionFailure(err.to_string())
}
