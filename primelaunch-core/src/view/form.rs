//! Token creation form.

use tracing::error;

use super::format::format_amount;
use crate::error::{Action, LaunchpadError};
use crate::read::RefreshSignal;
use crate::types::{TxReceipt, U256};
use crate::wallet::WalletConnection;
use crate::write::LaunchpadWriter;
use crate::{DEFAULT_INITIAL_SUPPLY, MAX_SYMBOL_LEN};

/// Status line under the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormStatus {
    Idle,
    Waiting(String),
    Success(String),
    Error(String),
}

impl FormStatus {
    pub fn message(&self) -> Option<&str> {
        match self {
            FormStatus::Idle => None,
            FormStatus::Waiting(m) | FormStatus::Success(m) | FormStatus::Error(m) => Some(m),
        }
    }
}

/// State of the "Generate a token" form.
#[derive(Clone, Debug)]
pub struct TokenCreationForm {
    name: String,
    symbol: String,
    deploying: bool,
    status: FormStatus,
}

impl Default for TokenCreationForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCreationForm {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            symbol: String::new(),
            deploying: false,
            status: FormStatus::Idle,
        }
    }

    pub fn set_name(&mut self, value: &str) {
        self.name = value.to_string();
    }

    /// Symbol input is uppercased and capped as it is typed.
    pub fn set_symbol(&mut self, value: &str) {
        self.symbol = value
            .trim_start()
            .to_uppercase()
            .chars()
            .take(MAX_SYMBOL_LEN)
            .collect();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn is_deploying(&self) -> bool {
        self.deploying
    }

    /// Whether the deploy button is enabled.
    pub fn can_submit(&self, wallet: &WalletConnection) -> bool {
        wallet.is_connected()
            && !self.name.trim().is_empty()
            && !self.symbol.trim().is_empty()
            && !self.deploying
    }

    /// `10,000,000,000 (fixed)`.
    pub fn supply_label(&self) -> String {
        format!("{} (fixed)", format_amount(&U256::from(DEFAULT_INITIAL_SUPPLY)))
    }

    /// Deploy the token; on success clear the fields and fire `on_created`.
    pub async fn submit(
        &mut self,
        writer: &LaunchpadWriter,
        wallet: &WalletConnection,
        on_created: &RefreshSignal,
    ) -> Result<TxReceipt, LaunchpadError> {
        self.deploying = true;
        self.status = FormStatus::Idle;
        let result = self.deploy(writer, wallet).await;
        self.deploying = false;

        match &result {
            Ok(_) => {
                self.status =
                    FormStatus::Success("Token deployed! It now appears in the list below.".into());
                self.name.clear();
                self.symbol.clear();
                on_created.fire();
            }
            Err(e) => {
                error!("Failed to deploy token: {}", e);
                self.status = FormStatus::Error(e.user_message(Action::Deploy));
            }
        }
        result
    }

    async fn deploy(
        &mut self,
        writer: &LaunchpadWriter,
        wallet: &WalletConnection,
    ) -> Result<TxReceipt, LaunchpadError> {
        let pending = writer
            .submit_create_token(wallet, &self.name, &self.symbol)
            .await?;
        self.status = FormStatus::Waiting("Waiting for confirmation...".into());
        pending.confirm().await
    }

    pub fn render(&self) -> String {
        let mut out = String::from("== Generate a token ==\n");
        out.push_str(&format!("Token name:     {}\n", self.name));
        out.push_str(&format!("Symbol:         {}\n", self.symbol));
        out.push_str(&format!("Initial supply: {}\n", self.supply_label()));
        if self.deploying {
            out.push_str("[Deploying...]\n");
        }
        if let Some(message) = self.status.message() {
            out.push_str(&format!("{}\n", message));
        }
        out
    }
}
