//! In-crate fakes for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers::types::transaction::eip712::TypedData;
use ethers::types::{Signature, H256};
use tokio::sync::Notify;

use crate::contracts::{LaunchpadCall, LaunchpadReader, ReadError};
use crate::encryption::{
    user_decrypt_eip712, DecryptionDomain, EncryptionSdk, Keypair, SdkError, UserDecryptRequest,
};
use crate::types::{Address, ClearValue, EncryptedHandle, TokenRecord, TxHash, TxReceipt, U256};
use crate::wallet::{SignerError, WalletSigner};

pub struct FakeSigner {
    address: Address,
    pub reject_signatures: AtomicBool,
    pub revert_with: Mutex<Option<String>>,
    pub sent: Mutex<Vec<LaunchpadCall>>,
    pub signed: AtomicUsize,
    /// When set, receipts are held until the gate is notified.
    pub receipt_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeSigner {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            reject_signatures: AtomicBool::new(false),
            revert_with: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            signed: AtomicUsize::new(0),
            receipt_gate: Mutex::new(None),
        }
    }

    pub fn sent(&self) -> Vec<LaunchpadCall> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletSigner for FakeSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_typed_data(&self, _payload: &TypedData) -> Result<Signature, SignerError> {
        if self.reject_signatures.load(Ordering::SeqCst) {
            return Err(SignerError::Rejected);
        }
        self.signed.fetch_add(1, Ordering::SeqCst);
        Ok(Signature {
            r: U256::one(),
            s: U256::one(),
            v: 27,
        })
    }

    async fn send_call(&self, call: &LaunchpadCall) -> Result<TxHash, SignerError> {
        if let Some(reason) = self.revert_with.lock().unwrap().clone() {
            return Err(SignerError::Reverted(reason));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(call.clone());
        Ok(H256::from_low_u64_be(sent.len() as u64))
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        _confirmations: usize,
    ) -> Result<TxReceipt, SignerError> {
        let gate = self.receipt_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(TxReceipt {
            tx_hash,
            block_number: Some(1),
        })
    }
}

#[derive(Default)]
pub struct FakeSdk {
    pub values: Mutex<HashMap<EncryptedHandle, ClearValue>>,
    pub fail_with: Mutex<Option<String>>,
    pub public_keys: Mutex<Vec<String>>,
    pub requests: AtomicUsize,
}

impl FakeSdk {
    pub fn with_value(handle: EncryptedHandle, value: ClearValue) -> Self {
        let sdk = Self::default();
        sdk.values.lock().unwrap().insert(handle, value);
        sdk
    }
}

#[async_trait]
impl EncryptionSdk for FakeSdk {
    fn generate_keypair(&self) -> Keypair {
        let mut keys = self.public_keys.lock().unwrap();
        let public_key = format!("0x{:064x}", keys.len() + 1);
        keys.push(public_key.clone());
        Keypair {
            public_key,
            private_key: String::from("0x01").into(),
        }
    }

    fn create_eip712(
        &self,
        public_key: &str,
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> Result<TypedData, SdkError> {
        let domain = DecryptionDomain {
            chain_id: 31337,
            verifying_contract: Address::repeat_byte(0xdd),
        };
        user_decrypt_eip712(domain, public_key, contract_addresses, start_timestamp, duration_days)
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest<'_>,
    ) -> Result<HashMap<EncryptedHandle, ClearValue>, SdkError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.fail_with.lock().unwrap().clone() {
            return Err(SdkError::Decrypt(reason));
        }
        let values = self.values.lock().unwrap();
        Ok(request
            .handles
            .iter()
            .filter_map(|pair| values.get(&pair.handle).map(|v| (pair.handle, v.clone())))
            .collect())
    }
}

#[derive(Default)]
pub struct FakeReader {
    pub tokens: Mutex<Vec<TokenRecord>>,
    pub handles: Mutex<HashMap<(Address, Address), EncryptedHandle>>,
    pub offline: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeReader {
    fn check(&self) -> Result<(), ReadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            Err(ReadError::Rpc("connection refused".into()))
        } else {
            Ok(())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LaunchpadReader for FakeReader {
    async fn all_tokens(&self, _factory: Address) -> Result<Vec<TokenRecord>, ReadError> {
        self.check()?;
        Ok(self.tokens.lock().unwrap().clone())
    }

    async fn token_at(&self, _factory: Address, index: u64) -> Result<TokenRecord, ReadError> {
        self.check()?;
        self.tokens
            .lock()
            .unwrap()
            .get(index as usize)
            .cloned()
            .ok_or(ReadError::IndexOutOfRange(index))
    }

    async fn confidential_balance_of(
        &self,
        token: Address,
        owner: Address,
    ) -> Result<EncryptedHandle, ReadError> {
        self.check()?;
        Ok(self
            .handles
            .lock()
            .unwrap()
            .get(&(token, owner))
            .copied()
            .unwrap_or(EncryptedHandle::ZERO))
    }
}

pub fn record(token: u8, creator: Address, name: &str, symbol: &str) -> TokenRecord {
    TokenRecord {
        token_address: Address::repeat_byte(token),
        name: name.to_string(),
        symbol: symbol.to_string(),
        creator,
        initial_supply: U256::from(crate::DEFAULT_INITIAL_SUPPLY),
        created_at: 1_700_000_000,
    }
}
