//! Factory and token contract boundary.
//!
//! Reads go through [`LaunchpadReader`]; writes are described as
//! [`LaunchpadCall`]s and handed to a [`crate::wallet::WalletSigner`].

pub mod abi;
pub mod evm;

use async_trait::async_trait;
use ethers::types::Bytes;
use thiserror::Error;

use crate::types::{Address, EncryptedHandle, TokenRecord};

/// Errors from on-chain queries.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("decoding error: {0}")]
    Decode(String),

    #[error("token index {0} out of range")]
    IndexOutOfRange(u64),
}

/// Read access to the factory registry and token balances.
#[async_trait]
pub trait LaunchpadReader: Send + Sync {
    /// Every token the factory deployed, in creation order.
    async fn all_tokens(&self, factory: Address) -> Result<Vec<TokenRecord>, ReadError>;

    /// Registry entry at `index`.
    async fn token_at(&self, factory: Address, index: u64) -> Result<TokenRecord, ReadError>;

    /// Encrypted balance handle of `owner` on `token`.
    async fn confidential_balance_of(
        &self,
        token: Address,
        owner: Address,
    ) -> Result<EncryptedHandle, ReadError>;
}

/// State-changing launchpad calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LaunchpadCall {
    /// `PrimeLaunchFactory.createToken(name, symbol)`.
    CreateToken {
        factory: Address,
        name: String,
        symbol: String,
    },
    /// `PrimeLaunchToken.freemint(amount)`.
    Freemint { token: Address, amount: u64 },
}

impl LaunchpadCall {
    /// Contract the call is sent to.
    pub fn target(&self) -> Address {
        match self {
            LaunchpadCall::CreateToken { factory, .. } => *factory,
            LaunchpadCall::Freemint { token, .. } => *token,
        }
    }

    /// ABI-encoded calldata.
    pub fn calldata(&self) -> Bytes {
        match self {
            LaunchpadCall::CreateToken { name, symbol, .. } => abi::encode_create_token(name, symbol),
            LaunchpadCall::Freemint { amount, .. } => abi::encode_freemint(*amount),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            LaunchpadCall::CreateToken { .. } => "createToken",
            LaunchpadCall::Freemint { .. } => "freemint",
        }
    }
}
