//! Core data types shared across the launchpad client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use ethers::types::{Address, TxHash, U256};

/// One deployed confidential token, as recorded by the factory registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Token contract address.
    pub token_address: Address,
    pub name: String,
    pub symbol: String,
    /// Account that called `createToken`.
    pub creator: Address,
    /// Supply minted to the creator at deployment.
    pub initial_supply: U256,
    /// Block timestamp of the deployment (seconds).
    pub created_at: u64,
}

impl TokenRecord {
    /// Whether `account` deployed this token.
    pub fn is_created_by(&self, account: Address) -> bool {
        self.creator == account
    }
}

/// Opaque reference to an on-chain ciphertext.
///
/// Handles are tied to a (token, owner) pair and change on every balance
/// mutation, so they must be re-read rather than cached across writes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct EncryptedHandle(pub [u8; 32]);

impl EncryptedHandle {
    /// Sentinel returned for balances that were never initialised.
    pub const ZERO: EncryptedHandle = EncryptedHandle([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for EncryptedHandle {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<ethers::types::H256> for EncryptedHandle {
    fn from(value: ethers::types::H256) -> Self {
        Self(value.0)
    }
}

impl fmt::Display for EncryptedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for EncryptedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedHandle({})", self.to_hex())
    }
}

impl FromStr for EncryptedHandle {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// Plaintext produced by a user decryption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearValue {
    Uint(U256),
    Bool(bool),
    Address(Address),
    Bytes(Vec<u8>),
}

impl ClearValue {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ClearValue::Uint(_))
    }
}

impl fmt::Display for ClearValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearValue::Uint(value) => write!(f, "{}", value),
            ClearValue::Bool(value) => write!(f, "{}", value),
            ClearValue::Address(value) => f.write_str(&ethers::utils::to_checksum(value, None)),
            ClearValue::Bytes(value) => write!(f, "0x{}", hex::encode(value)),
        }
    }
}

/// Summary of a confirmed transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}
