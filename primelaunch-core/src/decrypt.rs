//! User-authorised decryption of an encrypted balance.
//!
//! Each call builds a throwaway session: a fresh key pair, an EIP-712
//! authorization bound to (public key, contract, now, duration), the user's
//! signature over it, and one `user_decrypt` request. Nothing is cached, so a
//! key pair or signature is never reused.
//!
//! The handle passed in is a snapshot. If the balance changes between the
//! read and the decryption, the plaintext returned belongs to the snapshot.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::encryption::{EncryptionService, HandleContractPair, Keypair, UserDecryptRequest};
use crate::error::{DecryptFailure, LaunchpadError};
use crate::read::QueryState;
use crate::types::{Address, ClearValue, EncryptedHandle};
use crate::wallet::{SignerError, WalletConnection};

/// Plaintext of one handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptedBalance {
    pub handle: EncryptedHandle,
    pub value: ClearValue,
}

impl DecryptedBalance {
    /// Decimal string for numbers, display form otherwise.
    pub fn display(&self) -> String {
        self.value.to_string()
    }
}

struct DecryptionSession {
    keypair: Keypair,
    start_timestamp: u64,
    duration_days: u64,
    signature: String,
}

/// Runs the decrypt flow.
#[derive(Clone, Debug)]
pub struct DecryptOrchestrator {
    duration_days: u64,
}

impl Default for DecryptOrchestrator {
    fn default() -> Self {
        Self::new(crate::DECRYPT_DURATION_DAYS)
    }
}

impl DecryptOrchestrator {
    pub fn new(duration_days: u64) -> Self {
        Self { duration_days }
    }

    pub fn duration_days(&self) -> u64 {
        self.duration_days
    }

    /// Decrypt `balance` held on `contract` for the connected wallet.
    ///
    /// Preconditions are checked in order and the first failure wins: wallet
    /// connected, signer resolvable, encryption service ready, handle fetched.
    pub async fn decrypt(
        &self,
        wallet: &WalletConnection,
        encryption: &EncryptionService,
        contract: Address,
        balance: &QueryState<EncryptedHandle>,
    ) -> Result<DecryptedBalance, LaunchpadError> {
        self.decrypt_at(wallet, encryption, contract, balance, unix_now())
            .await
    }

    pub async fn decrypt_at(
        &self,
        wallet: &WalletConnection,
        encryption: &EncryptionService,
        contract: Address,
        balance: &QueryState<EncryptedHandle>,
        now: u64,
    ) -> Result<DecryptedBalance, LaunchpadError> {
        if !wallet.is_connected() {
            return Err(LaunchpadError::NoWalletConnected);
        }
        let signer = wallet
            .signer()
            .await
            .ok_or(LaunchpadError::NoSignerAvailable)?;
        let sdk = encryption
            .require()
            .map_err(LaunchpadError::EncryptionServiceUnavailable)?;
        let handle = *balance
            .ready()
            .ok_or(LaunchpadError::EncryptedValueUnavailable)?;

        let keypair = sdk.generate_keypair();
        let payload = sdk
            .create_eip712(&keypair.public_key, &[contract], now, self.duration_days)
            .map_err(|e| LaunchpadError::DecryptionFailure(DecryptFailure::Service(e.to_string())))?;

        debug!("Requesting decryption signature for {}", handle);
        let signature = signer.sign_typed_data(&payload).await.map_err(|e| {
            warn!("Decryption signature not obtained: {}", e);
            LaunchpadError::DecryptionFailure(match e {
                SignerError::Rejected => DecryptFailure::UserDeclined,
                other => DecryptFailure::Signer(other.to_string()),
            })
        })?;

        let session = DecryptionSession {
            keypair,
            start_timestamp: now,
            duration_days: self.duration_days,
            signature: hex::encode(signature.to_vec()),
        };

        let user_address = signer.address();
        let mut values = sdk
            .user_decrypt(UserDecryptRequest {
                handles: vec![HandleContractPair {
                    handle,
                    contract_address: contract,
                }],
                keypair: &session.keypair,
                signature: session.signature.clone(),
                contract_addresses: vec![contract],
                user_address,
                start_timestamp: session.start_timestamp,
                duration_days: session.duration_days,
            })
            .await
            .map_err(|e| {
                warn!("User decryption failed: {}", e);
                LaunchpadError::DecryptionFailure(DecryptFailure::Service(e.to_string()))
            })?;

        let value = values.remove(&handle).ok_or_else(|| {
            warn!("Decryption response has no value for {}", handle);
            LaunchpadError::DecryptionFailure(DecryptFailure::MissingValue(handle))
        })?;

        info!("Decrypted balance on {:?} for {:?}", contract, user_address);
        Ok(DecryptedBalance { handle, value })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
