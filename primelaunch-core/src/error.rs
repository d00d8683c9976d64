//! Error taxonomy for the launchpad client.
//!
//! Every failure is caught at the boundary where it happens and turned into a
//! short user-facing line with [`LaunchpadError::user_message`]. Nothing here
//! is fatal to the application.

use std::fmt;

use thiserror::Error;

use crate::types::{Address, EncryptedHandle};

/// Aggregated error type for launchpad operations.
#[derive(Debug, Error)]
pub enum LaunchpadError {
    /// No account is connected.
    #[error("no wallet connected")]
    NoWalletConnected,

    /// An account is connected but no signer could be resolved.
    #[error("no signer available")]
    NoSignerAvailable,

    /// Form or amount validation failed before submission.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// The encryption SDK is still loading or failed to initialise.
    #[error("encryption service unavailable: {0}")]
    EncryptionServiceUnavailable(ServiceUnavailable),

    /// The encrypted balance handle has not been fetched yet.
    #[error("encrypted value unavailable")]
    EncryptedValueUnavailable,

    /// Submission was rejected or the transaction reverted.
    #[error("transaction failed: {0}")]
    TransactionFailure(String),

    /// Signature declined or service-side decryption error.
    #[error("decryption failed: {0}")]
    DecryptionFailure(DecryptFailure),
}

/// Validation failures on user input.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("token name is empty")]
    EmptyName,

    #[error("token symbol is empty")]
    EmptySymbol,

    #[error("symbol has {len} characters, at most {max} allowed")]
    SymbolTooLong { len: usize, max: usize },

    #[error("'{0}' is not a whole number")]
    InvalidAmount(String),

    #[error("token {0:?} is not in the registry")]
    UnknownToken(Address),
}

/// Why the encryption service cannot be used yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceUnavailable {
    Loading,
    Failed(String),
}

impl fmt::Display for ServiceUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceUnavailable::Loading => f.write_str("still initializing"),
            ServiceUnavailable::Failed(reason) => write!(f, "initialization failed: {}", reason),
        }
    }
}

/// Failure modes of the decrypt flow after all preconditions passed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecryptFailure {
    /// The wallet holder declined the typed-data signature request.
    UserDeclined,
    /// The signer failed for another reason.
    Signer(String),
    /// The encryption service rejected or failed the request.
    Service(String),
    /// The service answered without a value for the requested handle.
    MissingValue(EncryptedHandle),
}

impl fmt::Display for DecryptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecryptFailure::UserDeclined => f.write_str("signature request declined"),
            DecryptFailure::Signer(reason) => write!(f, "signer error: {}", reason),
            DecryptFailure::Service(reason) => write!(f, "service error: {}", reason),
            DecryptFailure::MissingValue(handle) => write!(f, "no value returned for {}", handle),
        }
    }
}

/// User action an error is reported for; selects the wording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Deploy,
    Mint,
    Decrypt,
}

impl Action {
    fn connect_prompt(self) -> &'static str {
        match self {
            Action::Deploy => "Connect your wallet to deploy a token.",
            Action::Mint => "Connect your wallet to mint.",
            Action::Decrypt => "Connect your wallet to decrypt.",
        }
    }

    fn signer_prompt(self) -> &'static str {
        match self {
            Action::Deploy => "Wallet signer is not available yet. Try deploying again shortly.",
            Action::Mint => "Wallet signer is not available yet. Try minting again shortly.",
            Action::Decrypt => "Wallet signer is not available yet. Try decrypting again shortly.",
        }
    }

    fn fallback(self) -> &'static str {
        match self {
            Action::Deploy => "Failed to deploy the confidential token.",
            Action::Mint => "Mint failed",
            Action::Decrypt => "Failed to decrypt balance",
        }
    }
}

impl LaunchpadError {
    /// Short line shown to the user for this failure.
    pub fn user_message(&self, action: Action) -> String {
        match self {
            LaunchpadError::NoWalletConnected => action.connect_prompt().to_string(),
            LaunchpadError::NoSignerAvailable => action.signer_prompt().to_string(),
            LaunchpadError::InvalidInput(input) => match input {
                InputError::EmptyName => "Enter a token name.".to_string(),
                InputError::EmptySymbol => "Enter a token symbol.".to_string(),
                InputError::SymbolTooLong { max, .. } => {
                    format!("Symbol must be at most {} characters.", max)
                }
                InputError::InvalidAmount(_) => "Enter a valid whole number.".to_string(),
                InputError::UnknownToken(_) => "Token not found in the registry.".to_string(),
            },
            LaunchpadError::EncryptionServiceUnavailable(ServiceUnavailable::Loading) => {
                "Initializing encryption service...".to_string()
            }
            LaunchpadError::EncryptionServiceUnavailable(ServiceUnavailable::Failed(reason)) => {
                if reason.is_empty() {
                    "Encryption unavailable".to_string()
                } else {
                    reason.clone()
                }
            }
            LaunchpadError::EncryptedValueUnavailable => {
                "Encrypted balance is not available yet.".to_string()
            }
            LaunchpadError::TransactionFailure(reason) => non_empty_or(reason, action),
            LaunchpadError::DecryptionFailure(failure) => match failure {
                DecryptFailure::UserDeclined => "Signature request was declined.".to_string(),
                DecryptFailure::Signer(reason) | DecryptFailure::Service(reason) => {
                    non_empty_or(reason, action)
                }
                DecryptFailure::MissingValue(_) => action.fallback().to_string(),
            },
        }
    }
}

fn non_empty_or(reason: &str, action: Action) -> String {
    if reason.trim().is_empty() {
        action.fallback().to_string()
    } else {
        reason.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_prompts_depend_on_action() {
        let err = LaunchpadError::NoWalletConnected;
        assert_eq!(err.user_message(Action::Deploy), "Connect your wallet to deploy a token.");
        assert_eq!(err.user_message(Action::Mint), "Connect your wallet to mint.");
        assert_eq!(err.user_message(Action::Decrypt), "Connect your wallet to decrypt.");
        assert_eq!(
            LaunchpadError::NoSignerAvailable.user_message(Action::Decrypt),
            "Wallet signer is not available yet. Try decrypting again shortly."
        );
    }

    #[test]
    fn missing_wallet_and_missing_signer_read_differently() {
        for action in [Action::Deploy, Action::Mint, Action::Decrypt] {
            assert_ne!(
                LaunchpadError::NoWalletConnected.user_message(action),
                LaunchpadError::NoSignerAvailable.user_message(action)
            );
        }
    }

    #[test]
    fn service_state_messages() {
        let loading = LaunchpadError::EncryptionServiceUnavailable(ServiceUnavailable::Loading);
        assert_eq!(loading.user_message(Action::Decrypt), "Initializing encryption service...");

        let failed = LaunchpadError::EncryptionServiceUnavailable(ServiceUnavailable::Failed(
            "relayer unreachable".into(),
        ));
        assert_eq!(failed.user_message(Action::Decrypt), "relayer unreachable");

        let blank = LaunchpadError::EncryptionServiceUnavailable(ServiceUnavailable::Failed(String::new()));
        assert_eq!(blank.user_message(Action::Decrypt), "Encryption unavailable");
    }

    #[test]
    fn transaction_failures_surface_the_revert_reason() {
        let err = LaunchpadError::TransactionFailure("execution reverted".into());
        assert_eq!(err.user_message(Action::Mint), "execution reverted");

        let blank = LaunchpadError::TransactionFailure(" ".into());
        assert_eq!(blank.user_message(Action::Deploy), "Failed to deploy the confidential token.");
    }

    #[test]
    fn invalid_amount_message() {
        let err: LaunchpadError = InputError::InvalidAmount("12.5".into()).into();
        assert_eq!(err.user_message(Action::Mint), "Enter a valid whole number.");
    }
}
