use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use serde::Serialize;
use tokio::{
    runtime::Handle,
    sync::{watch, Mutex},
};

use crate::{
    log_debug, log_info, log_warn,
    models::{CategoryFilter, Fact, FactId, VoteField},
    store::{FactStore, StoreError, FACT_LIST_LIMIT},
    validation::{validate_submission, ValidationError},
};

use super::{BusySignals, FeedState};

const ENABLE_LOGS: bool = true;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("remote store request failed: {0}")]
    Remote(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedOptions {
    /// Drop a listing that arrives after a newer refresh was issued.
    pub discard_stale_refreshes: bool,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            discard_stale_refreshes: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The feed now holds this many facts.
    Applied(usize),
    /// A newer refresh was issued while this one was in flight; nothing changed.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    Applied(Fact),
    /// The store counted the vote but the fact has left the local feed.
    NotInFeed(Fact),
}

impl VoteOutcome {
    pub fn fact(&self) -> &Fact {
        match self {
            VoteOutcome::Applied(fact) | VoteOutcome::NotInFeed(fact) => fact,
        }
    }
}

struct Inner {
    view: FeedState,
    latest_refresh: u64,
}

/// One in-flight refresh. Dropping it before `settle` (a cancelled or
/// timed-out refresh) still releases its share of `loading`.
struct RefreshGuard {
    in_flight: Arc<AtomicUsize>,
    inner: Arc<Mutex<Inner>>,
    updates: Arc<watch::Sender<FeedState>>,
    settled: bool,
}

impl RefreshGuard {
    /// Call with the state lock held; `loading` stays on while other refreshes are pending.
    fn settle(mut self, view: &mut FeedState) {
        self.settled = true;
        let remaining = self.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        view.loading = remaining > 0;
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        log_debug!("Refresh dropped before completing");

        match self.inner.try_lock() {
            Ok(mut inner) => {
                inner.view.loading = self.in_flight.load(Ordering::SeqCst) > 0;
                self.updates.send_replace(inner.view.clone());
            }
            Err(_) => {
                let in_flight = self.in_flight.clone();
                let inner = self.inner.clone();
                let updates = self.updates.clone();
                match Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            let mut inner = inner.lock().await;
                            inner.view.loading = in_flight.load(Ordering::SeqCst) > 0;
                            updates.send_replace(inner.view.clone());
                        });
                    }
                    Err(_) => {
                        log_warn!("No runtime to clear the loading flag of a dropped refresh");
                    }
                }
            }
        }
    }
}

/// Owns the canonical feed and reconciles store responses into it.
///
/// Store calls are made without holding the state lock, so refreshes, votes
/// and submissions can overlap; each one commits its own result once its
/// call returns.
#[derive(Clone)]
pub struct FeedController {
    inner: Arc<Mutex<Inner>>,
    store: Arc<dyn FactStore>,
    busy: BusySignals,
    updates: Arc<watch::Sender<FeedState>>,
    refreshes_in_flight: Arc<AtomicUsize>,
    options: FeedOptions,
}

impl FeedController {
    pub fn new(store: Arc<dyn FactStore>, options: FeedOptions) -> Self {
        let (updates, _) = watch::channel(FeedState::new());
        Self {
            inner: Arc::new(Mutex::new(Inner {
                view: FeedState::new(),
                latest_refresh: 0,
            })),
            store,
            busy: BusySignals::new(),
            updates: Arc::new(updates),
            refreshes_in_flight: Arc::new(AtomicUsize::new(0)),
            options,
        }
    }

    /// Builds the controller and loads the unfiltered feed once. A failed
    /// initial load still yields a usable controller.
    pub async fn start(
        store: Arc<dyn FactStore>,
        options: FeedOptions,
    ) -> (Self, Result<RefreshOutcome, FeedError>) {
        let controller = Self::new(store, options);
        let initial = controller.refresh(CategoryFilter::All).await;
        (controller, initial)
    }

    pub async fn snapshot(&self) -> FeedState {
        self.inner.lock().await.view.clone()
    }

    /// Receives every committed state, starting from the current one.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.updates.subscribe()
    }

    pub fn busy(&self) -> &BusySignals {
        &self.busy
    }

    pub async fn refresh(&self, category: CategoryFilter) -> Result<RefreshOutcome, FeedError> {
        let (ticket, guard) = {
            let mut inner = self.inner.lock().await;
            inner.latest_refresh += 1;
            self.refreshes_in_flight.fetch_add(1, Ordering::SeqCst);
            let guard = RefreshGuard {
                in_flight: self.refreshes_in_flight.clone(),
                inner: self.inner.clone(),
                updates: self.updates.clone(),
                settled: false,
            };
            inner.view.loading = true;
            self.publish(&inner.view);
            (inner.latest_refresh, guard)
        };

        log_debug!("Refreshing feed for '{}' (request {})", category, ticket);
        let result = self.store.list_facts(category, FACT_LIST_LIMIT).await;

        let mut inner = self.inner.lock().await;
        let outcome = match result {
            Ok(_) if self.options.discard_stale_refreshes && ticket != inner.latest_refresh => {
                log_info!(
                    "Discarding listing for '{}' (request {} superseded by {})",
                    category,
                    ticket,
                    inner.latest_refresh
                );
                Ok(RefreshOutcome::Superseded)
            }
            Ok(mut facts) => {
                facts.truncate(FACT_LIST_LIMIT);
                inner.view.replace_facts(category, facts);
                let count = inner.view.facts.len();
                log_info!("Loaded {} facts for '{}'", count, category);
                Ok(RefreshOutcome::Applied(count))
            }
            Err(err) => {
                log_warn!("Failed to load facts for '{}': {}", category, err);
                Err(FeedError::Remote(err))
            }
        };

        guard.settle(&mut inner.view);
        self.publish(&inner.view);

        outcome
    }

    pub async fn submit_fact(
        &self,
        text: &str,
        source: &str,
        category: &str,
    ) -> Result<Fact, FeedError> {
        let draft = validate_submission(text, source, category).map_err(|err| {
            log_debug!("Rejected submission: {}", err);
            err
        })?;

        let _uploading = self.busy.begin_submit();
        let fact = self.store.insert_fact(draft).await.map_err(|err| {
            log_warn!("Failed to submit fact: {}", err);
            FeedError::Remote(err)
        })?;

        let mut inner = self.inner.lock().await;
        inner.view.prepend_fact(fact.clone());
        self.publish(&inner.view);
        log_info!("Submitted fact {} in '{}'", fact.id, fact.category);

        Ok(fact)
    }

    pub async fn cast_vote(&self, fact_id: FactId, field: VoteField) -> Result<VoteOutcome, FeedError> {
        let _voting = self.busy.begin_vote(fact_id);
        let updated = self
            .store
            .increment_vote(fact_id, field)
            .await
            .map_err(|err| {
                log_warn!("Failed to record {} on fact {}: {}", field, fact_id, err);
                FeedError::Remote(err)
            })?;

        if updated.id != fact_id {
            return Err(FeedError::Remote(StoreError::Decode(format!(
                "vote on fact {fact_id} returned fact {}",
                updated.id
            ))));
        }

        let mut inner = self.inner.lock().await;
        if inner.view.replace_fact(fact_id, updated.clone()) {
            self.publish(&inner.view);
            Ok(VoteOutcome::Applied(updated))
        } else {
            log_debug!("Fact {} left the feed before its vote landed", fact_id);
            Ok(VoteOutcome::NotInFeed(updated))
        }
    }

    fn publish(&self, view: &FeedState) {
        self.updates.send_replace(view.clone());
    }
}
