//! Application wiring.
//!
//! [`LaunchpadApp`] owns the registry poller, the creation form, the notice
//! board and one [`TokenCard`] per registry entry. Cards are rebuilt when the
//! connected account changes, since their balance queries are per viewer.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::LaunchpadConfig;
use crate::contracts::LaunchpadReader;
use crate::decrypt::DecryptOrchestrator;
use crate::encryption::{EncryptionService, ServiceStatus};
use crate::error::{InputError, LaunchpadError};
use crate::read::{Poller, QueryState, RegistryQuery};
use crate::types::{Address, EncryptedHandle, TokenRecord, TxReceipt};
use crate::view::{NoticeBoard, TokenCard, TokenCreationForm, TokenListView};
use crate::wallet::WalletConnection;
use crate::write::LaunchpadWriter;

pub struct LaunchpadApp {
    config: LaunchpadConfig,
    reader: Arc<dyn LaunchpadReader>,
    wallet: WalletConnection,
    encryption: EncryptionService,
    writer: LaunchpadWriter,
    orchestrator: DecryptOrchestrator,
    registry: Poller<RegistryQuery>,
    form: TokenCreationForm,
    notices: NoticeBoard,
    cards: HashMap<Address, TokenCard>,
    card_viewer: Option<Address>,
}

impl LaunchpadApp {
    /// Wire the layers and start polling the registry. Must run inside a
    /// Tokio runtime.
    pub fn new(
        config: LaunchpadConfig,
        reader: Arc<dyn LaunchpadReader>,
        wallet: WalletConnection,
        encryption: EncryptionService,
    ) -> Self {
        let registry = Poller::spawn(
            RegistryQuery::new(Arc::clone(&reader), config.factory_address),
            config.refresh_interval,
        );
        info!(
            "PrimeLaunch client started (factory {:?}, account {:?})",
            config.factory_address,
            wallet.account()
        );

        Self {
            writer: LaunchpadWriter::new(config.factory_address, config.confirmations),
            orchestrator: DecryptOrchestrator::new(config.decrypt_duration_days),
            notices: NoticeBoard::new(config.notice_ttl),
            card_viewer: wallet.account(),
            form: TokenCreationForm::new(),
            cards: HashMap::new(),
            config,
            reader,
            wallet,
            encryption,
            registry,
        }
    }

    pub fn config(&self) -> &LaunchpadConfig {
        &self.config
    }

    pub fn wallet(&self) -> &WalletConnection {
        &self.wallet
    }

    pub fn encryption(&self) -> &EncryptionService {
        &self.encryption
    }

    pub fn registry(&self) -> QueryState<Vec<TokenRecord>> {
        self.registry.state()
    }

    pub fn form(&self) -> &TokenCreationForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut TokenCreationForm {
        &mut self.form
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn card(&self, token: Address) -> Option<&TokenCard> {
        self.cards.get(&token)
    }

    /// Switch the connected wallet.
    pub fn connect(&mut self, wallet: WalletConnection) {
        info!("Wallet changed to {:?}", wallet.account());
        self.wallet = wallet;
        self.sync_cards();
    }

    /// Re-read the registry now and reconcile cards.
    pub async fn refresh(&mut self) -> QueryState<Vec<TokenRecord>> {
        let state = self.registry.refetch().await;
        self.sync_cards();
        state
    }

    /// Reconcile cards with the latest registry snapshot.
    pub fn sync_cards(&mut self) {
        let viewer = self.wallet.account();
        if viewer != self.card_viewer {
            self.cards.clear();
            self.card_viewer = viewer;
        }

        let tokens = match self.registry.state() {
            QueryState::Ready(tokens) => tokens,
            _ => return,
        };
        self.cards
            .retain(|address, _| tokens.iter().any(|t| t.token_address == *address));
        for record in tokens {
            if self.cards.contains_key(&record.token_address) {
                continue;
            }
            debug!("Adding card for {} ({})", record.name, record.symbol);
            let card = TokenCard::new(
                record.clone(),
                Arc::clone(&self.reader),
                viewer,
                self.config.refresh_interval,
            );
            self.cards.insert(record.token_address, card);
        }
    }

    /// Fill the form and deploy a token.
    pub async fn create_token(
        &mut self,
        name: &str,
        symbol: &str,
    ) -> Result<TxReceipt, LaunchpadError> {
        self.form.set_name(name);
        self.form.set_symbol(symbol);
        let on_created = self.registry.refresh_signal();
        let receipt = self
            .form
            .submit(&self.writer, &self.wallet, &on_created)
            .await?;
        self.refresh().await;
        Ok(receipt)
    }

    /// Freemint `amount` of `token` to the connected wallet.
    pub async fn mint(&mut self, token: Address, amount: &str) -> Result<TxReceipt, LaunchpadError> {
        self.ensure_card(token).await?;
        let card = self
            .cards
            .get_mut(&token)
            .ok_or(InputError::UnknownToken(token))?;
        card.set_mint_amount(amount);
        card.mint(&self.writer, &self.wallet, &mut self.notices).await
    }

    /// Re-read one card's encrypted balance.
    pub async fn refresh_balance(
        &mut self,
        token: Address,
    ) -> Result<QueryState<EncryptedHandle>, LaunchpadError> {
        self.ensure_card(token).await?;
        let card = self.cards.get(&token).ok_or(InputError::UnknownToken(token))?;
        Ok(card.refresh_balance().await)
    }

    /// Decrypt the displayed balance of `token`.
    pub async fn decrypt(&mut self, token: Address) -> Result<String, LaunchpadError> {
        self.ensure_card(token).await?;
        let card = self
            .cards
            .get_mut(&token)
            .ok_or(InputError::UnknownToken(token))?;
        card.decrypt(&self.orchestrator, &self.wallet, &self.encryption)
            .await
    }

    async fn ensure_card(&mut self, token: Address) -> Result<(), LaunchpadError> {
        if !self.cards.contains_key(&token) {
            self.refresh().await;
        }
        if self.cards.contains_key(&token) {
            Ok(())
        } else {
            Err(InputError::UnknownToken(token).into())
        }
    }

    /// Reconcile cards with the polled registry, then draw the page.
    pub fn render(&mut self) -> String {
        self.sync_cards();
        let mut out = self.form.render();
        out.push_str(&format!("Encryption: {}\n", encryption_label(&self.encryption)));

        let registry = self.registry.state();
        let list = TokenListView::new(&registry, self.wallet.account());
        out.push_str(&list.render());
        for record in list.mine() {
            if let Some(card) = self.cards.get(&record.token_address) {
                out.push_str(&card.render());
            }
        }
        if let Some(notice) = self.notices.active() {
            out.push_str(&format!("* {}\n", notice));
        }
        out
    }
}

fn encryption_label(service: &EncryptionService) -> String {
    match service.status() {
        ServiceStatus::Loading => "Initializing encryption service...".to_string(),
        ServiceStatus::Ready(_) => "ready".to_string(),
        ServiceStatus::Failed(reason) => reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{record, FakeReader, FakeSigner};
    use std::time::Duration;

    fn config() -> LaunchpadConfig {
        let mut config = LaunchpadConfig::new(Address::repeat_byte(0xfa));
        config.refresh_interval = Duration::from_secs(3600);
        config
    }

    #[tokio::test]
    async fn refresh_builds_one_card_per_token() {
        let alice = Address::repeat_byte(0xa1);
        let reader = Arc::new(FakeReader::default());
        reader.tokens.lock().unwrap().extend([
            record(1, alice, "Prime USDT", "pUSDT"),
            record(2, Address::repeat_byte(0xb0), "Bob Coin", "BOB"),
        ]);
        let signer = Arc::new(FakeSigner::new(alice));
        let mut app = LaunchpadApp::new(
            config(),
            reader.clone(),
            WalletConnection::connected(signer),
            EncryptionService::loading(),
        );

        app.refresh().await;
        assert!(app.card(Address::repeat_byte(1)).is_some());
        assert!(app.card(Address::repeat_byte(2)).is_some());

        let rendered = app.render();
        assert!(rendered.contains("Initializing encryption service..."));
        assert!(rendered.contains("-- Prime USDT (pUSDT) --"));
        assert!(!rendered.contains("-- Bob Coin (BOB) --"));

        reader.tokens.lock().unwrap().remove(1);
        app.refresh().await;
        assert!(app.card(Address::repeat_byte(2)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn render_picks_up_tokens_from_background_polls() {
        let alice = Address::repeat_byte(0xa1);
        let reader = Arc::new(FakeReader::default());
        reader
            .tokens
            .lock()
            .unwrap()
            .push(record(1, alice, "Prime USDT", "pUSDT"));
        let mut app = LaunchpadApp::new(
            config(),
            reader,
            WalletConnection::connected(Arc::new(FakeSigner::new(alice))),
            EncryptionService::loading(),
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(app.registry(), QueryState::Ready(_)));
        assert!(app.card(Address::repeat_byte(1)).is_none());

        assert!(app.render().contains("-- Prime USDT (pUSDT) --"));
        assert!(app.card(Address::repeat_byte(1)).is_some());
    }

    #[tokio::test]
    async fn disconnecting_resets_cards() {
        let reader = Arc::new(FakeReader::default());
        reader
            .tokens
            .lock()
            .unwrap()
            .push(record(1, Address::repeat_byte(0xa1), "Prime USDT", "pUSDT"));
        let signer = Arc::new(FakeSigner::new(Address::repeat_byte(0xa1)));
        let mut app = LaunchpadApp::new(
            config(),
            reader,
            WalletConnection::connected(signer),
            EncryptionService::loading(),
        );
        app.refresh().await;

        app.connect(WalletConnection::disconnected());
        let card = app.card(Address::repeat_byte(1)).unwrap();
        assert_eq!(card.balance_label(), "Connect wallet");
    }

    #[tokio::test]
    async fn mint_on_unknown_token_is_rejected() {
        let signer = Arc::new(FakeSigner::new(Address::repeat_byte(0xa1)));
        let mut app = LaunchpadApp::new(
            config(),
            Arc::new(FakeReader::default()),
            WalletConnection::connected(signer.clone()),
            EncryptionService::loading(),
        );

        let err = app.mint(Address::repeat_byte(9), "5000").await.unwrap_err();
        assert!(matches!(
            err,
            LaunchpadError::InvalidInput(InputError::UnknownToken(_))
        ));
        assert!(signer.sent().is_empty());
    }

    #[tokio::test]
    async fn create_token_goes_through_the_form() {
        let signer = Arc::new(FakeSigner::new(Address::repeat_byte(0xa1)));
        let mut app = LaunchpadApp::new(
            config(),
            Arc::new(FakeReader::default()),
            WalletConnection::connected(signer.clone()),
            EncryptionService::loading(),
        );

        app.create_token("Prime USDT", "pusdt").await.unwrap();
        assert_eq!(app.form().name(), "");
        match &signer.sent()[0] {
            crate::contracts::LaunchpadCall::CreateToken { symbol, .. } => {
                assert_eq!(symbol, "PUSDT")
            }
            other => panic!("unexpected call {:?}", other),
        }
    }
}
