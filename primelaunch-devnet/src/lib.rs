//! primelaunch-devnet
//!
//! A deterministic, in-process stand-in for a PrimeLaunch deployment:
//!
//! - [`Devnet`]: the factory and every token it deploys, answering ABI
//!   calldata exactly like the on-chain contracts
//! - [`DevnetSigner`]: funded accounts that sign and submit through the devnet
//! - [`DevnetEncryption`]: the decryption coprocessor, which checks the
//!   EIP-712 authorization, the ACL and the validity window before revealing
//!   a balance
//!
//! Balances are "encrypted" only in the sense that readers see opaque
//! handles. The plaintext lives in the devnet's ciphertext table.

mod chain;
mod coprocessor;
mod signer;

pub use chain::{Ciphertext, Devnet, BLOCK_TIME_SECS, DEVNET_CHAIN_ID};
pub use coprocessor::{DevnetEncryption, MAX_DURATION_DAYS};
pub use signer::DevnetSigner;

use thiserror::Error;

/// Errors raised by the devnet.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DevnetError {
    #[error("devnet is offline")]
    Offline,

    #[error("execution reverted: {0}")]
    Revert(String),

    #[error("invalid account key: {0}")]
    Key(String),
}
