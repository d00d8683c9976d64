//! Per-token card: metadata, encrypted balance, decrypt and freemint.

use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use super::format::{format_amount, format_created_at, short_address};
use super::notice::NoticeBoard;
use crate::contracts::LaunchpadReader;
use crate::decrypt::{DecryptOrchestrator, DecryptedBalance};
use crate::encryption::EncryptionService;
use crate::error::{Action, LaunchpadError};
use crate::read::{BalanceQuery, Poller, QueryState};
use crate::types::{Address, EncryptedHandle, TokenRecord, TxReceipt};
use crate::wallet::WalletConnection;
use crate::write::LaunchpadWriter;
use crate::DEFAULT_MINT_AMOUNT;

pub struct TokenCard {
    record: TokenRecord,
    balance: Option<Poller<BalanceQuery>>,
    mint_amount: String,
    minting: bool,
    mint_status: Option<String>,
    error: Option<String>,
    decrypted: Option<DecryptedBalance>,
    decrypt_error: Option<String>,
    decrypting: bool,
}

impl TokenCard {
    /// Build a card; the balance is polled only when a viewer is known.
    pub fn new(
        record: TokenRecord,
        reader: Arc<dyn LaunchpadReader>,
        viewer: Option<Address>,
        interval: Duration,
    ) -> Self {
        let balance = viewer.map(|viewer| {
            Poller::spawn(
                BalanceQuery::new(reader, record.token_address, viewer),
                interval,
            )
        });
        Self {
            record,
            balance,
            mint_amount: DEFAULT_MINT_AMOUNT.to_string(),
            minting: false,
            mint_status: None,
            error: None,
            decrypted: None,
            decrypt_error: None,
            decrypting: false,
        }
    }

    pub fn record(&self) -> &TokenRecord {
        &self.record
    }

    pub fn balance(&self) -> QueryState<EncryptedHandle> {
        self.balance
            .as_ref()
            .map(Poller::state)
            .unwrap_or(QueryState::Pending)
    }

    pub fn mint_amount(&self) -> &str {
        &self.mint_amount
    }

    pub fn set_mint_amount(&mut self, value: &str) {
        self.mint_amount = value.to_string();
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Plaintext of the balance, shown only while it matches the current handle.
    pub fn decrypted(&self) -> Option<String> {
        let decrypted = self.decrypted.as_ref()?;
        match self.balance() {
            QueryState::Ready(handle) if handle == decrypted.handle => Some(decrypted.display()),
            _ => None,
        }
    }

    pub fn decrypt_error(&self) -> Option<&str> {
        self.decrypt_error.as_deref()
    }

    pub fn is_minting(&self) -> bool {
        self.minting
    }

    pub fn mint_status(&self) -> Option<&str> {
        self.mint_status.as_deref()
    }

    pub fn is_decrypting(&self) -> bool {
        self.decrypting
    }

    /// Re-read the encrypted balance now.
    pub async fn refresh_balance(&self) -> QueryState<EncryptedHandle> {
        match &self.balance {
            Some(poller) => poller.refetch().await,
            None => QueryState::Pending,
        }
    }

    pub fn balance_label(&self) -> String {
        match &self.balance {
            None => "Connect wallet".to_string(),
            Some(poller) => match poller.state() {
                QueryState::Ready(handle) => handle.to_hex(),
                QueryState::Pending => "Fetching...".to_string(),
                QueryState::Unavailable(_) => "Unavailable".to_string(),
            },
        }
    }

    /// Whether the decrypt button is enabled.
    pub fn can_decrypt(&self) -> bool {
        !self.decrypting && matches!(self.balance(), QueryState::Ready(_))
    }

    /// Freemint `mint_amount` to the connected wallet.
    pub async fn mint(
        &mut self,
        writer: &LaunchpadWriter,
        wallet: &WalletConnection,
        notices: &mut NoticeBoard,
    ) -> Result<TxReceipt, LaunchpadError> {
        self.minting = true;
        self.error = None;
        let result = self.freemint(writer, wallet).await;
        self.minting = false;
        self.mint_status = None;

        match &result {
            Ok(_) => {
                notices.post(format!(
                    "Minted {} {} to your wallet.",
                    self.mint_amount.trim(),
                    self.record.symbol
                ));
                self.mint_amount = DEFAULT_MINT_AMOUNT.to_string();
                self.decrypted = None;
                self.refresh_balance().await;
            }
            Err(e) => {
                error!("Failed to mint {}: {}", self.record.symbol, e);
                self.error = Some(e.user_message(Action::Mint));
            }
        }
        result
    }

    async fn freemint(
        &mut self,
        writer: &LaunchpadWriter,
        wallet: &WalletConnection,
    ) -> Result<TxReceipt, LaunchpadError> {
        let pending = writer
            .submit_freemint(wallet, self.record.token_address, &self.mint_amount)
            .await?;
        self.mint_status = Some("Waiting for confirmation...".into());
        pending.confirm().await
    }

    /// Decrypt the current balance handle.
    pub async fn decrypt(
        &mut self,
        orchestrator: &DecryptOrchestrator,
        wallet: &WalletConnection,
        encryption: &EncryptionService,
    ) -> Result<String, LaunchpadError> {
        self.decrypting = true;
        self.decrypt_error = None;
        let balance = self.balance();
        let result = orchestrator
            .decrypt(wallet, encryption, self.record.token_address, &balance)
            .await;
        self.decrypting = false;

        match result {
            Ok(decrypted) => {
                let value = decrypted.display();
                self.decrypted = Some(decrypted);
                Ok(value)
            }
            Err(e) => {
                error!("Failed to decrypt {}: {}", self.record.symbol, e);
                self.decrypt_error = Some(e.user_message(Action::Decrypt));
                Err(e)
            }
        }
    }

    pub fn render(&self) -> String {
        let record = &self.record;
        let mut out = format!("-- {} ({}) --\n", record.name, record.symbol);
        out.push_str(&format!("Creator: {}\n", short_address(&record.creator)));
        out.push_str(&format!("Address: {}\n", super::format::checksum(&record.token_address)));
        out.push_str(&format!("Initial supply: {}\n", format_amount(&record.initial_supply)));
        out.push_str(&format!("Deployed: {}\n", format_created_at(record.created_at)));
        out.push_str(&format!("Encrypted balance: {}\n", self.balance_label()));
        if let Some(value) = self.decrypted() {
            out.push_str(&format!("Decrypted balance: {}\n", value));
        }
        if let Some(message) = &self.decrypt_error {
            out.push_str(&format!("{}\n", message));
        }
        out.push_str(&format!("Freemint amount: {}\n", self.mint_amount));
        if self.minting {
            out.push_str("[Minting...]\n");
        }
        if let Some(status) = &self.mint_status {
            out.push_str(&format!("{}\n", status));
        }
        if let Some(message) = &self.error {
            out.push_str(&format!("{}\n", message));
        }
        out
    }
}
