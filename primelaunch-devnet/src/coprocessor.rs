//! Decryption coprocessor.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use ethers::types::transaction::eip712::{Eip712, TypedData};
use ethers::types::{Signature, H256};
use ethers::utils::keccak256;
use rand::RngCore;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use primelaunch_core::{
    user_decrypt_eip712, Address, ClearValue, DecryptionDomain, EncryptedHandle, EncryptionSdk,
    EncryptionService, Keypair, SdkError, UserDecryptRequest, U256,
};

use crate::Devnet;

/// Longest validity window the coprocessor accepts.
pub const MAX_DURATION_DAYS: u64 = 365;

/// Tolerated clock drift between client and coprocessor.
const CLOCK_SKEW_SECS: u64 = 300;

const SECS_PER_DAY: u64 = 86_400;

/// Coprocessor that re-encrypts devnet balances for authorised users.
#[derive(Clone)]
pub struct DevnetEncryption {
    devnet: Arc<Devnet>,
}

impl DevnetEncryption {
    pub fn new(devnet: Arc<Devnet>) -> Self {
        Self { devnet }
    }

    /// Encryption service initialising this coprocessor in the background.
    pub fn service(devnet: Arc<Devnet>) -> EncryptionService {
        EncryptionService::spawn(async move {
            Ok(Arc::new(Self::new(devnet)) as Arc<dyn EncryptionSdk>)
        })
    }

    fn domain(&self) -> DecryptionDomain {
        DecryptionDomain {
            chain_id: self.devnet.chain_id(),
            verifying_contract: self.devnet.decryption_contract(),
        }
    }

    fn check_window(start: u64, days: u64, now: u64) -> Result<(), SdkError> {
        if days == 0 || days > MAX_DURATION_DAYS {
            return Err(SdkError::Unauthorized(format!(
                "duration of {} days is outside 1..={}",
                days, MAX_DURATION_DAYS
            )));
        }
        if start > now + CLOCK_SKEW_SECS {
            return Err(SdkError::Unauthorized("authorization is not yet valid".into()));
        }
        if now >= start + days * SECS_PER_DAY {
            return Err(SdkError::Unauthorized("authorization has expired".into()));
        }
        Ok(())
    }

    fn recover_signer(&self, request: &UserDecryptRequest<'_>) -> Result<Address, SdkError> {
        let payload = self.create_eip712(
            &request.keypair.public_key,
            &request.contract_addresses,
            request.start_timestamp,
            request.duration_days,
        )?;
        let digest = payload
            .encode_eip712()
            .map_err(|e| SdkError::Eip712(e.to_string()))?;
        let signature: Signature = request
            .signature
            .parse()
            .map_err(|e| SdkError::Unauthorized(format!("malformed signature: {}", e)))?;
        signature
            .recover(H256::from(digest))
            .map_err(|e| SdkError::Unauthorized(format!("unrecoverable signature: {}", e)))
    }
}

#[async_trait]
impl EncryptionSdk for DevnetEncryption {
    fn generate_keypair(&self) -> Keypair {
        let mut secret = Zeroizing::new([0u8; 32]);
        rand::thread_rng().fill_bytes(&mut secret[..]);
        Keypair {
            public_key: format!("0x{}", hex::encode(keccak256(&secret[..]))),
            private_key: Zeroizing::new(format!("0x{}", hex::encode(&secret[..]))),
        }
    }

    fn create_eip712(
        &self,
        public_key: &str,
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> Result<TypedData, SdkError> {
        user_decrypt_eip712(
            self.domain(),
            public_key,
            contract_addresses,
            start_timestamp,
            duration_days,
        )
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest<'_>,
    ) -> Result<HashMap<EncryptedHandle, ClearValue>, SdkError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self::check_window(request.start_timestamp, request.duration_days, now)?;

        let signer = self.recover_signer(&request)?;
        if signer != request.user_address {
            warn!(
                "Decryption signed by {:?} on behalf of {:?}",
                signer, request.user_address
            );
            return Err(SdkError::Unauthorized(
                "signature does not match the user address".into(),
            ));
        }

        let mut values = HashMap::with_capacity(request.handles.len());
        for pair in &request.handles {
            if !request.contract_addresses.contains(&pair.contract_address) {
                return Err(SdkError::Unauthorized(format!(
                    "contract {:?} is not covered by the authorization",
                    pair.contract_address
                )));
            }
            let ciphertext = self
                .devnet
                .ciphertext(pair.handle)
                .await
                .ok_or_else(|| SdkError::Decrypt(format!("unknown handle {}", pair.handle)))?;
            if ciphertext.contract != pair.contract_address {
                return Err(SdkError::Unauthorized(format!(
                    "handle {} does not belong to {:?}",
                    pair.handle, pair.contract_address
                )));
            }
            if !ciphertext.allowed.contains(&request.user_address) {
                return Err(SdkError::Unauthorized(format!(
                    "{:?} is not allowed to decrypt {}",
                    request.user_address, pair.handle
                )));
            }
            values.insert(pair.handle, ClearValue::Uint(U256::from(ciphertext.value)));
        }

        debug!("Decrypted {} handle(s) for {:?}", values.len(), request.user_address);
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = SECS_PER_DAY;

    #[test]
    fn validity_window() {
        let start = 1_700_000_000;
        assert!(DevnetEncryption::check_window(start, 10, start).is_ok());
        assert!(DevnetEncryption::check_window(start, 10, start + 10 * DAY - 1).is_ok());
        assert!(DevnetEncryption::check_window(start, 10, start + 10 * DAY).is_err());
        assert!(DevnetEncryption::check_window(start + 3600, 10, start).is_err());
        assert!(DevnetEncryption::check_window(start, 0, start).is_err());
        assert!(DevnetEncryption::check_window(start, 366, start).is_err());
    }

    #[test]
    fn keypairs_are_fresh() {
        let sdk = DevnetEncryption::new(Arc::new(Devnet::new()));
        let a = sdk.generate_keypair();
        let b = sdk.generate_keypair();
        assert_ne!(a.public_key, b.public_key);
        assert!(a.public_key.starts_with("0x"));
        assert_eq!(a.public_key.len(), 66);
    }
}
