//! Registry views: "All tokens" and "My tokens".

use super::format::{format_amount, format_created_at, short_address};
use crate::read::QueryState;
use crate::types::{Address, TokenRecord};

/// Registry snapshot filtered for display.
#[derive(Clone, Debug)]
pub struct TokenListView<'a> {
    tokens: &'a QueryState<Vec<TokenRecord>>,
    account: Option<Address>,
}

impl<'a> TokenListView<'a> {
    pub fn new(tokens: &'a QueryState<Vec<TokenRecord>>, account: Option<Address>) -> Self {
        Self { tokens, account }
    }

    /// Every record, in registry order.
    pub fn all(&self) -> Vec<&'a TokenRecord> {
        self.tokens.ready().map(|t| t.iter().collect()).unwrap_or_default()
    }

    /// Records created by the connected account; empty when disconnected.
    pub fn mine(&self) -> Vec<&'a TokenRecord> {
        match self.account {
            Some(account) => self
                .all()
                .into_iter()
                .filter(|t| t.is_created_by(account))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Text shown in place of the "My tokens" list, if it is empty.
    pub fn mine_placeholder(&self) -> Option<&'static str> {
        if self.account.is_none() {
            return Some("Connect a wallet to see tokens you deployed.");
        }
        if self.tokens.is_pending() {
            return Some("Loading token list...");
        }
        if self.mine().is_empty() {
            return Some("No tokens yet. Deploy one above!");
        }
        None
    }

    /// Text shown in place of the "All tokens" list, if it is empty.
    pub fn all_placeholder(&self) -> Option<String> {
        match self.tokens {
            QueryState::Pending => Some("Loading token list...".to_string()),
            QueryState::Unavailable(reason) => Some(format!("Unable to load tokens: {}", reason)),
            QueryState::Ready(tokens) if tokens.is_empty() => {
                Some("No confidential tokens have been deployed yet.".to_string())
            }
            QueryState::Ready(_) => None,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("== My tokens ==\n");
        match self.mine_placeholder() {
            Some(text) => out.push_str(&format!("{}\n", text)),
            None => {
                for record in self.mine() {
                    out.push_str(&render_row(record));
                }
            }
        }

        out.push_str("== All tokens ==\n");
        match self.all_placeholder() {
            Some(text) => out.push_str(&format!("{}\n", text)),
            None => {
                for record in self.all() {
                    out.push_str(&render_row(record));
                }
            }
        }
        out
    }
}

fn render_row(record: &TokenRecord) -> String {
    format!(
        "{} ({}) {} | supply {} | creator {} | {}\n",
        record.name,
        record.symbol,
        short_address(&record.token_address),
        format_amount(&record.initial_supply),
        short_address(&record.creator),
        format_created_at(record.created_at),
    )
}
