//! primelaunch-core
//!
//! Client library for the PrimeLaunch confidential token launchpad.
//!
//! A wallet holder deploys ERC7984 confidential tokens through the
//! `PrimeLaunchFactory` contract, lists the registry, freemints more supply
//! and decrypts their own encrypted balance through an external encryption
//! SDK. The library is layered leaf-first:
//!
//! - [`wallet`]: connected account and optional signing capability
//! - [`encryption`]: lazily initialised encryption SDK instance
//! - [`contracts`]: factory/token calldata and the EVM reader/signer
//! - [`read`]: polling read model (interval + refresh signal)
//! - [`write`]: `createToken` / `freemint` submission and confirmation
//! - [`decrypt`]: user-authorised balance decryption
//! - [`view`]: form, list and card view models rendered as text
//! - [`app`]: wiring of all of the above

pub mod app;
pub mod config;
pub mod contracts;
pub mod decrypt;
pub mod encryption;
pub mod error;
pub mod read;
pub mod types;
pub mod validation;
pub mod view;
pub mod wallet;
pub mod write;

#[cfg(test)]
pub(crate) mod testing;

pub use app::LaunchpadApp;
pub use config::{ConfigError, Deployment, LaunchpadConfig};
pub use contracts::{evm::EvmLaunchpad, evm::EvmSigner, LaunchpadCall, LaunchpadReader, ReadError};
pub use decrypt::{DecryptOrchestrator, DecryptedBalance};
pub use encryption::{
    user_decrypt_eip712, DecryptionDomain, EncryptionSdk, EncryptionService, HandleContractPair,
    Keypair, SdkError, ServiceStatus, UserDecryptRequest,
};
pub use error::{Action, DecryptFailure, InputError, LaunchpadError, ServiceUnavailable};
pub use read::{BalanceQuery, Poller, Query, QueryState, RefreshSignal, RegistryQuery};
pub use types::{Address, ClearValue, EncryptedHandle, TokenRecord, TxHash, TxReceipt, U256};
pub use validation::{parse_mint_amount, TokenDraft};
pub use wallet::{SignerError, WalletConnection, WalletSigner};
pub use write::{LaunchpadWriter, PendingWrite};

/// Supply minted to the creator by every factory deployment.
pub const DEFAULT_INITIAL_SUPPLY: u64 = 10_000_000_000;

/// Maximum token symbol length accepted by the creation form.
pub const MAX_SYMBOL_LEN: usize = 8;

/// Validity window of a user decryption authorization.
pub const DECRYPT_DURATION_DAYS: u64 = 10;

/// Registry and balance polling interval (seconds).
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 20;

/// Lifetime of the mint-success notice (seconds).
pub const MINT_NOTICE_SECS: u64 = 6;

/// Value the freemint field resets to.
pub const DEFAULT_MINT_AMOUNT: &str = "1000";
