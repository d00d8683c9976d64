//! Factory and token state machine.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use ethers::abi::{self as ethabi, ParamType, Token};
use ethers::types::{Bytes, H256};
use ethers::utils::{get_contract_address, keccak256};
use tokio::sync::RwLock;
use tracing::{debug, info};

use primelaunch_core::contracts::abi;
use primelaunch_core::{
    Address, EncryptedHandle, LaunchpadReader, ReadError, TokenRecord, TxHash, TxReceipt, U256,
    DEFAULT_INITIAL_SUPPLY,
};

use crate::DevnetError;

/// Hardhat's chain id.
pub const DEVNET_CHAIN_ID: u64 = 31337;

/// Seconds between mined blocks.
pub const BLOCK_TIME_SECS: u64 = 12;

/// Plaintext behind a handle plus its access list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ciphertext {
    pub value: u64,
    /// Token contract the handle belongs to.
    pub contract: Address,
    /// Accounts and contracts allowed to decrypt.
    pub allowed: HashSet<Address>,
}

#[derive(Default)]
struct ChainState {
    block_number: u64,
    timestamp: u64,
    factory_nonce: u64,
    tx_count: u64,
    handle_nonce: u64,
    tokens: Vec<TokenRecord>,
    balances: HashMap<(Address, Address), EncryptedHandle>,
    ciphertexts: HashMap<EncryptedHandle, Ciphertext>,
    receipts: HashMap<TxHash, TxReceipt>,
}

impl ChainState {
    fn is_token(&self, address: Address) -> bool {
        self.tokens.iter().any(|t| t.token_address == address)
    }

    fn balance(&self, token: Address, owner: Address) -> EncryptedHandle {
        self.balances
            .get(&(token, owner))
            .copied()
            .unwrap_or(EncryptedHandle::ZERO)
    }

    /// Add `amount` to `owner`'s balance, issuing a fresh handle.
    fn credit(&mut self, token: Address, owner: Address, amount: u64) -> Result<EncryptedHandle, DevnetError> {
        let current = self
            .ciphertexts
            .get(&self.balance(token, owner))
            .map(|c| c.value)
            .unwrap_or(0);
        let value = current
            .checked_add(amount)
            .ok_or_else(|| DevnetError::Revert("balance overflow".into()))?;

        self.handle_nonce += 1;
        let mut preimage = Vec::with_capacity(48);
        preimage.extend_from_slice(token.as_bytes());
        preimage.extend_from_slice(owner.as_bytes());
        preimage.extend_from_slice(&self.handle_nonce.to_be_bytes());
        let handle = EncryptedHandle(keccak256(&preimage));

        self.ciphertexts.insert(
            handle,
            Ciphertext {
                value,
                contract: token,
                allowed: HashSet::from([owner, token]),
            },
        );
        self.balances.insert((token, owner), handle);
        Ok(handle)
    }

    fn mine(&mut self) {
        self.block_number += 1;
        self.timestamp += BLOCK_TIME_SECS;
    }
}

/// An in-process chain hosting one `PrimeLaunchFactory`.
pub struct Devnet {
    factory: Address,
    decryption_contract: Address,
    offline: AtomicBool,
    state: RwLock<ChainState>,
}

impl Default for Devnet {
    fn default() -> Self {
        Self::new()
    }
}

impl Devnet {
    pub fn new() -> Self {
        let deployer = Address::from_slice(&keccak256(b"primelaunch-devnet deployer")[12..]);
        let factory = get_contract_address(deployer, 0u64);
        let decryption_contract = get_contract_address(deployer, 1u64);
        let genesis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        info!("Devnet factory at {:?}", factory);
        Self {
            factory,
            decryption_contract,
            offline: AtomicBool::new(false),
            state: RwLock::new(ChainState {
                timestamp: genesis,
                // Contract nonces start at 1 (EIP-161).
                factory_nonce: 1,
                ..ChainState::default()
            }),
        }
    }

    pub fn chain_id(&self) -> u64 {
        DEVNET_CHAIN_ID
    }

    /// Address of the `PrimeLaunchFactory`.
    pub fn factory(&self) -> Address {
        self.factory
    }

    /// Verifying contract of the user decryption EIP-712 domain.
    pub fn decryption_contract(&self) -> Address {
        self.decryption_contract
    }

    /// Simulate an unreachable node.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn block_number(&self) -> u64 {
        self.state.read().await.block_number
    }

    pub async fn receipt(&self, tx_hash: TxHash) -> Option<TxReceipt> {
        self.state.read().await.receipts.get(&tx_hash).cloned()
    }

    pub async fn ciphertext(&self, handle: EncryptedHandle) -> Option<Ciphertext> {
        self.state.read().await.ciphertexts.get(&handle).cloned()
    }

    fn ensure_online(&self) -> Result<(), DevnetError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(DevnetError::Offline)
        } else {
            Ok(())
        }
    }

    /// Execute a read-only call, returning ABI-encoded output.
    ///
    /// Calls to addresses without code return empty data, as a node does.
    pub async fn call(&self, to: Address, data: &[u8]) -> Result<Bytes, DevnetError> {
        self.ensure_online()?;
        let (selector, args) = split_selector(data)?;
        let state = self.state.read().await;

        let output = if to == self.factory {
            if selector == abi::selector(abi::GET_ALL_TOKENS) {
                let records = state.tokens.iter().map(abi::token_from_record).collect();
                ethabi::encode(&[Token::Array(records)])
            } else if selector == abi::selector(abi::GET_TOKEN) {
                let index = decode_args(&[ParamType::Uint(256)], args)?
                    .pop()
                    .and_then(Token::into_uint)
                    .ok_or_else(malformed)?;
                if index >= U256::from(state.tokens.len()) {
                    return Err(DevnetError::Revert("index out of bounds".into()));
                }
                let record = &state.tokens[index.as_usize()];
                ethabi::encode(&[abi::token_from_record(record)])
            } else {
                return Err(unknown_selector());
            }
        } else if state.is_token(to) {
            if selector == abi::selector(abi::CONFIDENTIAL_BALANCE_OF) {
                let owner = decode_args(&[ParamType::Address], args)?
                    .pop()
                    .and_then(Token::into_address)
                    .ok_or_else(malformed)?;
                let handle = state.balance(to, owner);
                ethabi::encode(&[Token::FixedBytes(handle.as_bytes().to_vec())])
            } else {
                return Err(unknown_selector());
            }
        } else {
            Vec::new()
        };
        Ok(output.into())
    }

    /// Execute a transaction from `from`, mining one block.
    ///
    /// A revert leaves the state untouched and produces no receipt.
    pub async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<TxHash, DevnetError> {
        self.ensure_online()?;
        let (selector, args) = split_selector(&data)?;
        let mut state = self.state.write().await;

        if to == self.factory && selector == abi::selector(abi::CREATE_TOKEN) {
            let mut decoded = decode_args(&[ParamType::String, ParamType::String], args)?.into_iter();
            let name = decoded.next().and_then(Token::into_string).ok_or_else(malformed)?;
            let symbol = decoded.next().and_then(Token::into_string).ok_or_else(malformed)?;

            state.mine();
            let token_address = get_contract_address(self.factory, state.factory_nonce);
            state.factory_nonce += 1;
            let record = TokenRecord {
                token_address,
                name,
                symbol,
                creator: from,
                initial_supply: U256::from(DEFAULT_INITIAL_SUPPLY),
                created_at: state.timestamp,
            };
            state.credit(token_address, from, DEFAULT_INITIAL_SUPPLY)?;
            info!(
                "Deployed {} ({}) at {:?} for {:?}",
                record.name, record.symbol, token_address, from
            );
            state.tokens.push(record);
        } else if state.is_token(to) && selector == abi::selector(abi::FREEMINT) {
            let amount = decode_args(&[ParamType::Uint(64)], args)?
                .pop()
                .and_then(Token::into_uint)
                .ok_or_else(malformed)?;
            let amount = u64::try_from(amount).map_err(|_| malformed())?;
            // Check before mining so a revert leaves no trace.
            let handle = state.credit(to, from, amount)?;
            state.mine();
            debug!("Freeminted {} on {:?} to {:?}: {}", amount, to, from, handle);
        } else {
            return Err(unknown_selector());
        }

        state.tx_count += 1;
        let mut preimage = from.as_bytes().to_vec();
        preimage.extend_from_slice(&state.tx_count.to_be_bytes());
        preimage.extend_from_slice(&data);
        let tx_hash = H256::from(keccak256(&preimage));
        let receipt = TxReceipt {
            tx_hash,
            block_number: Some(state.block_number),
        };
        state.receipts.insert(tx_hash, receipt);
        Ok(tx_hash)
    }
}

fn split_selector(data: &[u8]) -> Result<([u8; 4], &[u8]), DevnetError> {
    if data.len() < 4 {
        return Err(DevnetError::Revert("missing function selector".into()));
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&data[..4]);
    Ok((selector, &data[4..]))
}

fn decode_args(types: &[ParamType], args: &[u8]) -> Result<Vec<Token>, DevnetError> {
    ethabi::decode(types, args).map_err(|_| malformed())
}

fn malformed() -> DevnetError {
    DevnetError::Revert("malformed calldata".into())
}

fn unknown_selector() -> DevnetError {
    DevnetError::Revert("function selector was not recognized".into())
}

fn read_error(err: DevnetError) -> ReadError {
    match err {
        DevnetError::Offline => ReadError::Rpc("connection refused".into()),
        other => ReadError::Rpc(other.to_string()),
    }
}

#[async_trait]
impl LaunchpadReader for Devnet {
    async fn all_tokens(&self, factory: Address) -> Result<Vec<TokenRecord>, ReadError> {
        let data = self
            .call(factory, &abi::encode_get_all_tokens())
            .await
            .map_err(read_error)?;
        abi::decode_token_list(&data)
    }

    async fn token_at(&self, factory: Address, index: u64) -> Result<TokenRecord, ReadError> {
        let data = self
            .call(factory, &abi::encode_get_token(index))
            .await
            .map_err(|e| match e {
                DevnetError::Revert(_) => ReadError::IndexOutOfRange(index),
                other => read_error(other),
            })?;
        abi::decode_token(&data)
    }

    async fn confidential_balance_of(
        &self,
        token: Address,
        owner: Address,
    ) -> Result<EncryptedHandle, ReadError> {
        let data = self
            .call(token, &abi::encode_confidential_balance_of(owner))
            .await
            .map_err(read_error)?;
        abi::decode_handle(&data)
    }
}
