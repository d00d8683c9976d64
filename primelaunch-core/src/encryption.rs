//! Encryption service adapter.
//!
//! The homomorphic encryption SDK is an external collaborator behind the
//! [`EncryptionSdk`] trait. [`EncryptionService`] initialises an instance in
//! the background and exposes its loading/error state, so callers can tell
//! "still initialising" apart from "failed".

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::transaction::eip712::TypedData;
use serde_json::json;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::error::ServiceUnavailable;
use crate::types::{Address, ClearValue, EncryptedHandle};

/// Primary type of the user decryption authorization.
pub const USER_DECRYPT_PRIMARY_TYPE: &str = "UserDecryptRequestVerification";

/// Errors raised by the encryption SDK.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SdkError {
    #[error("initialization failed: {0}")]
    Init(String),

    #[error("eip712 error: {0}")]
    Eip712(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("decryption error: {0}")]
    Decrypt(String),
}

/// Key pair generated for a single decryption request.
pub struct Keypair {
    /// `0x`-prefixed hex public key.
    pub public_key: String,
    /// `0x`-prefixed hex private key, wiped on drop.
    pub private_key: Zeroizing<String>,
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Ciphertext handle paired with the contract that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandleContractPair {
    pub handle: EncryptedHandle,
    pub contract_address: Address,
}

/// Arguments of a user decryption.
#[derive(Debug)]
pub struct UserDecryptRequest<'a> {
    pub handles: Vec<HandleContractPair>,
    pub keypair: &'a Keypair,
    /// Hex signature over the EIP-712 authorization, without `0x`.
    pub signature: String,
    pub contract_addresses: Vec<Address>,
    pub user_address: Address,
    pub start_timestamp: u64,
    pub duration_days: u64,
}

/// Client interface of the external encryption SDK.
#[async_trait]
pub trait EncryptionSdk: Send + Sync {
    /// Fresh key pair for one request.
    fn generate_keypair(&self) -> Keypair;

    /// Authorization payload the user signs to delegate decryption.
    fn create_eip712(
        &self,
        public_key: &str,
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> Result<TypedData, SdkError>;

    /// Decrypt `request.handles`, returning the plaintext per handle.
    async fn user_decrypt(
        &self,
        request: UserDecryptRequest<'_>,
    ) -> Result<HashMap<EncryptedHandle, ClearValue>, SdkError>;
}

/// EIP-712 domain of the decryption verifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecryptionDomain {
    pub chain_id: u64,
    pub verifying_contract: Address,
}

/// Build the `UserDecryptRequestVerification` typed data.
pub fn user_decrypt_eip712(
    domain: DecryptionDomain,
    public_key: &str,
    contract_addresses: &[Address],
    start_timestamp: u64,
    duration_days: u64,
) -> Result<TypedData, SdkError> {
    if !public_key.starts_with("0x") {
        return Err(SdkError::Eip712("public key must be 0x-prefixed hex".into()));
    }
    let contracts: Vec<String> = contract_addresses.iter().map(|a| format!("{:?}", a)).collect();

    let value = json!({
        "domain": {
            "name": "Decryption",
            "version": "1",
            "chainId": domain.chain_id,
            "verifyingContract": format!("{:?}", domain.verifying_contract),
        },
        "types": {
            "EIP712Domain": [
                { "name": "name", "type": "string" },
                { "name": "version", "type": "string" },
                { "name": "chainId", "type": "uint256" },
                { "name": "verifyingContract", "type": "address" },
            ],
            USER_DECRYPT_PRIMARY_TYPE: [
                { "name": "publicKey", "type": "bytes" },
                { "name": "contractAddresses", "type": "address[]" },
                { "name": "startTimestamp", "type": "uint256" },
                { "name": "durationDays", "type": "uint256" },
                { "name": "extraData", "type": "bytes" },
            ],
        },
        "primaryType": USER_DECRYPT_PRIMARY_TYPE,
        "message": {
            "publicKey": public_key,
            "contractAddresses": contracts,
            "startTimestamp": start_timestamp,
            "durationDays": duration_days,
            "extraData": "0x00",
        },
    });

    serde_json::from_value(value).map_err(|e| SdkError::Eip712(e.to_string()))
}

/// Initialisation state of the SDK instance.
#[derive(Clone)]
pub enum ServiceStatus {
    Loading,
    Ready(Arc<dyn EncryptionSdk>),
    Failed(String),
}

impl fmt::Debug for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Loading => f.write_str("Loading"),
            ServiceStatus::Ready(_) => f.write_str("Ready"),
            ServiceStatus::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
        }
    }
}

/// Shared handle on the (possibly still initialising) SDK instance.
#[derive(Clone, Debug)]
pub struct EncryptionService {
    status: watch::Receiver<ServiceStatus>,
}

impl EncryptionService {
    /// Start initialising the SDK in the background.
    pub fn spawn<F>(init: F) -> Self
    where
        F: Future<Output = Result<Arc<dyn EncryptionSdk>, SdkError>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(ServiceStatus::Loading);
        tokio::spawn(async move {
            let status = match init.await {
                Ok(instance) => {
                    info!("Encryption service ready");
                    ServiceStatus::Ready(instance)
                }
                Err(e) => {
                    warn!("Encryption service failed to initialize: {}", e);
                    ServiceStatus::Failed(e.to_string())
                }
            };
            let _ = tx.send(status);
        });
        Self { status: rx }
    }

    /// Already initialised instance.
    pub fn ready(instance: Arc<dyn EncryptionSdk>) -> Self {
        Self::fixed(ServiceStatus::Ready(instance))
    }

    /// Instance that failed to initialise.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::fixed(ServiceStatus::Failed(reason.into()))
    }

    /// Instance that never finishes loading.
    pub fn loading() -> Self {
        Self::fixed(ServiceStatus::Loading)
    }

    fn fixed(status: ServiceStatus) -> Self {
        let (_tx, rx) = watch::channel(status);
        Self { status: rx }
    }

    pub fn status(&self) -> ServiceStatus {
        self.status.borrow().clone()
    }

    pub fn instance(&self) -> Option<Arc<dyn EncryptionSdk>> {
        match &*self.status.borrow() {
            ServiceStatus::Ready(instance) => Some(Arc::clone(instance)),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(&*self.status.borrow(), ServiceStatus::Loading)
    }

    pub fn error(&self) -> Option<String> {
        match &*self.status.borrow() {
            ServiceStatus::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Instance, or why it cannot be used right now.
    pub fn require(&self) -> Result<Arc<dyn EncryptionSdk>, ServiceUnavailable> {
        match self.status() {
            ServiceStatus::Ready(instance) => Ok(instance),
            ServiceStatus::Loading => Err(ServiceUnavailable::Loading),
            ServiceStatus::Failed(reason) => Err(ServiceUnavailable::Failed(reason)),
        }
    }

    /// Wait for initialisation to settle.
    pub async fn wait_ready(&self) -> Result<Arc<dyn EncryptionSdk>, ServiceUnavailable> {
        let mut status = self.status.clone();
        loop {
            match self.require() {
                Err(ServiceUnavailable::Loading) => {}
                settled => return settled,
            }
            if status.changed().await.is_err() {
                // Initialiser gone without a result.
                return self.require();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSdk;
    use ethers::prelude::*;
    use ethers::types::transaction::eip712::Eip712;
    use ethers::types::H256;

    const HARDHAT_KEY_0: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn background_initialization_becomes_ready() {
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let service = EncryptionService::spawn(async move {
            let _ = release_rx.await;
            Ok(Arc::new(FakeSdk::default()) as Arc<dyn EncryptionSdk>)
        });

        assert!(service.is_loading());
        assert!(service.instance().is_none());
        assert_eq!(service.require().err(), Some(ServiceUnavailable::Loading));

        release_tx.send(()).unwrap();
        assert!(service.wait_ready().await.is_ok());
        assert!(service.instance().is_some());
        assert!(!service.is_loading());
    }

    #[tokio::test]
    async fn failed_initialization_reports_reason() {
        let service = EncryptionService::spawn(async {
            Err(SdkError::Init("relayer unreachable".into()))
        });
        let err = service.wait_ready().await.err().unwrap();
        assert_eq!(
            err,
            ServiceUnavailable::Failed("initialization failed: relayer unreachable".into())
        );
        assert_eq!(service.error().as_deref(), Some("initialization failed: relayer unreachable"));
    }

    #[tokio::test]
    async fn never_loading_service_stays_loading() {
        let service = EncryptionService::loading();
        assert_eq!(service.wait_ready().await.err(), Some(ServiceUnavailable::Loading));
    }

    #[tokio::test]
    async fn authorization_signature_recovers_signer() {
        let wallet: LocalWallet = HARDHAT_KEY_0.parse().unwrap();
        let domain = DecryptionDomain {
            chain_id: 11155111,
            verifying_contract: Address::repeat_byte(0xdd),
        };
        let contract = Address::repeat_byte(0x01);
        let payload =
            user_decrypt_eip712(domain, "0x1234", &[contract], 1_700_000_000, 10).unwrap();
        assert_eq!(payload.primary_type, USER_DECRYPT_PRIMARY_TYPE);

        let signature = wallet.sign_typed_data(&payload).await.unwrap();
        let digest = payload.encode_eip712().unwrap();
        assert_eq!(signature.recover(H256::from(digest)).unwrap(), wallet.address());

        // Any change to the bound window yields a different digest.
        let later = user_decrypt_eip712(domain, "0x1234", &[contract], 1_700_000_001, 10).unwrap();
        assert_ne!(later.encode_eip712().unwrap(), digest);
    }

    #[test]
    fn rejects_unprefixed_public_key() {
        let domain = DecryptionDomain {
            chain_id: 1,
            verifying_contract: Address::zero(),
        };
        assert!(matches!(
            user_decrypt_eip712(domain, "1234", &[], 0, 10),
            Err(SdkError::Eip712(_))
        ));
    }
}
