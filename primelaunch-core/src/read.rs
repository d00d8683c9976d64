//! Polling read model.
//!
//! A [`Poller`] re-runs its query on a fixed interval and whenever its
//! [`RefreshSignal`] fires. Writes fire the signal after confirmation, so the
//! read model converges on the chain within one interval at worst.
//! Overlapping fetches are harmless because every query is a pure read.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::contracts::{LaunchpadReader, ReadError};
use crate::types::{Address, EncryptedHandle, TokenRecord};

/// Display state of a polled value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryState<T> {
    /// No answer yet.
    Pending,
    Ready(T),
    /// The last attempt failed and no earlier value exists.
    Unavailable(String),
}

impl<T> QueryState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            QueryState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, QueryState::Pending)
    }
}

/// A repeatable on-chain read.
#[async_trait]
pub trait Query: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    /// Short label for logs.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Self::Output, ReadError>;
}

/// Full factory registry.
pub struct RegistryQuery {
    reader: Arc<dyn LaunchpadReader>,
    factory: Address,
}

impl RegistryQuery {
    pub fn new(reader: Arc<dyn LaunchpadReader>, factory: Address) -> Self {
        Self { reader, factory }
    }
}

#[async_trait]
impl Query for RegistryQuery {
    type Output = Vec<TokenRecord>;

    fn describe(&self) -> String {
        format!("getAllTokens@{:?}", self.factory)
    }

    async fn fetch(&self) -> Result<Vec<TokenRecord>, ReadError> {
        self.reader.all_tokens(self.factory).await
    }
}

/// Encrypted balance of one viewer on one token.
pub struct BalanceQuery {
    reader: Arc<dyn LaunchpadReader>,
    token: Address,
    viewer: Address,
}

impl BalanceQuery {
    pub fn new(reader: Arc<dyn LaunchpadReader>, token: Address, viewer: Address) -> Self {
        Self {
            reader,
            token,
            viewer,
        }
    }
}

#[async_trait]
impl Query for BalanceQuery {
    type Output = EncryptedHandle;

    fn describe(&self) -> String {
        format!("confidentialBalanceOf({:?})@{:?}", self.viewer, self.token)
    }

    async fn fetch(&self) -> Result<EncryptedHandle, ReadError> {
        self.reader
            .confidential_balance_of(self.token, self.viewer)
            .await
    }
}

/// Cloneable trigger for an immediate re-query.
#[derive(Clone, Debug, Default)]
pub struct RefreshSignal(Arc<Notify>);

impl RefreshSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a refresh; coalesces with any refresh already pending.
    pub fn fire(&self) {
        self.0.notify_one();
    }

    pub(crate) async fn fired(&self) {
        self.0.notified().await
    }
}

/// Background poller publishing the latest [`QueryState`].
///
/// Dropping the poller stops it; results of an in-flight fetch are discarded.
pub struct Poller<Q: Query> {
    query: Arc<Q>,
    state: Arc<watch::Sender<QueryState<Q::Output>>>,
    refresh: RefreshSignal,
    task: JoinHandle<()>,
}

impl<Q: Query> Poller<Q> {
    /// Start polling `query` every `interval`, beginning immediately.
    pub fn spawn(query: Q, interval: Duration) -> Self {
        let query = Arc::new(query);
        let (tx, _rx) = watch::channel(QueryState::Pending);
        let state = Arc::new(tx);
        let refresh = RefreshSignal::new();

        let task = tokio::spawn(poll_loop(
            Arc::clone(&query),
            Arc::clone(&state),
            refresh.clone(),
            interval,
        ));

        Self {
            query,
            state,
            refresh,
            task,
        }
    }

    pub fn state(&self) -> QueryState<Q::Output> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<Q::Output>> {
        self.state.subscribe()
    }

    /// Signal that triggers an out-of-band poll.
    pub fn refresh_signal(&self) -> RefreshSignal {
        self.refresh.clone()
    }

    pub fn refresh(&self) {
        self.refresh.fire();
    }

    /// Fetch now, publish and return the new state.
    pub async fn refetch(&self) -> QueryState<Q::Output> {
        run_once(self.query.as_ref(), &self.state).await;
        self.state()
    }
}

impl<Q: Query> Drop for Poller<Q> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll_loop<Q: Query>(
    query: Arc<Q>,
    state: Arc<watch::Sender<QueryState<Q::Output>>>,
    refresh: RefreshSignal,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = refresh.fired() => {
                debug!("Refresh requested for {}", query.describe());
                ticker.reset();
            }
        }
        run_once(query.as_ref(), &state).await;
    }
}

async fn run_once<Q: Query>(query: &Q, state: &watch::Sender<QueryState<Q::Output>>) {
    match query.fetch().await {
        Ok(value) => {
            state.send_replace(QueryState::Ready(value));
        }
        Err(e) => {
            warn!("Query {} failed: {}", query.describe(), e);
            // Keep serving the last good value; the next tick retries.
            state.send_if_modified(|current| match current {
                QueryState::Ready(_) => false,
                _ => {
                    *current = QueryState::Unavailable(e.to_string());
                    true
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{record, FakeReader};
    use std::sync::atomic::Ordering;

    const INTERVAL: Duration = Duration::from_secs(20);

    async fn settle() {
        // Let the poll task run on the paused clock.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_immediately_then_on_interval() {
        let reader = Arc::new(FakeReader::default());
        let poller = Poller::spawn(RegistryQuery::new(reader.clone(), Address::zero()), INTERVAL);

        settle().await;
        assert_eq!(poller.state(), QueryState::Ready(vec![]));
        assert_eq!(reader.calls(), 1);

        reader
            .tokens
            .lock()
            .unwrap()
            .push(record(1, Address::repeat_byte(9), "Prime USDT", "pUSDT"));

        tokio::time::sleep(Duration::from_secs(19)).await;
        settle().await;
        assert_eq!(reader.calls(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(reader.calls(), 2);
        assert_eq!(poller.state().ready().map(Vec::len), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_signal_triggers_poll_before_interval() {
        let reader = Arc::new(FakeReader::default());
        let poller = Poller::spawn(RegistryQuery::new(reader.clone(), Address::zero()), INTERVAL);
        settle().await;
        assert_eq!(reader.calls(), 1);

        poller.refresh_signal().fire();
        settle().await;
        assert_eq!(reader.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_without_data_is_unavailable_and_retried() {
        let reader = Arc::new(FakeReader::default());
        reader.offline.store(true, Ordering::SeqCst);
        let poller = Poller::spawn(RegistryQuery::new(reader.clone(), Address::zero()), INTERVAL);
        settle().await;
        assert!(matches!(poller.state(), QueryState::Unavailable(_)));

        reader.offline.store(false, Ordering::SeqCst);
        tokio::time::sleep(INTERVAL).await;
        settle().await;
        assert_eq!(poller.state(), QueryState::Ready(vec![]));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_after_success_keeps_last_value() {
        let reader = Arc::new(FakeReader::default());
        let token = Address::repeat_byte(1);
        let viewer = Address::repeat_byte(2);
        reader
            .handles
            .lock()
            .unwrap()
            .insert((token, viewer), EncryptedHandle([7u8; 32]));

        let poller = Poller::spawn(BalanceQuery::new(reader.clone(), token, viewer), INTERVAL);
        settle().await;
        assert_eq!(poller.state(), QueryState::Ready(EncryptedHandle([7u8; 32])));

        reader.offline.store(true, Ordering::SeqCst);
        assert_eq!(poller.refetch().await, QueryState::Ready(EncryptedHandle([7u8; 32])));
    }

    #[tokio::test]
    async fn refetch_publishes_to_subscribers() {
        let reader = Arc::new(FakeReader::default());
        let token = Address::repeat_byte(1);
        let viewer = Address::repeat_byte(2);
        let poller = Poller::spawn(
            BalanceQuery::new(reader.clone(), token, viewer),
            Duration::from_secs(3600),
        );
        let mut rx = poller.subscribe();

        reader
            .handles
            .lock()
            .unwrap()
            .insert((token, viewer), EncryptedHandle([3u8; 32]));
        poller.refetch().await;

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), QueryState::Ready(EncryptedHandle([3u8; 32])));
    }
}
