//! In-flight markers for submissions and votes.
//!
//! Kept apart from `FeedState` so a pending vote or upload never shows up as
//! the feed loading. Guards clear their mark on drop, whatever the outcome.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use crate::models::FactId;

#[derive(Clone, Default)]
pub struct BusySignals {
    submitting: Arc<AtomicUsize>,
    voting: Arc<Mutex<HashMap<FactId, usize>>>,
}

impl BusySignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst) > 0
    }

    pub fn is_voting(&self, fact_id: FactId) -> bool {
        self.votes().contains_key(&fact_id)
    }

    pub fn voting_ids(&self) -> Vec<FactId> {
        let mut ids: Vec<FactId> = self.votes().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub(crate) fn begin_submit(&self) -> SubmitGuard {
        self.submitting.fetch_add(1, Ordering::SeqCst);
        SubmitGuard {
            submitting: self.submitting.clone(),
        }
    }

    pub(crate) fn begin_vote(&self, fact_id: FactId) -> VoteGuard {
        *self.votes().entry(fact_id).or_insert(0) += 1;
        VoteGuard {
            signals: self.clone(),
            fact_id,
        }
    }

    fn votes(&self) -> MutexGuard<'_, HashMap<FactId, usize>> {
        match self.voting.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

pub(crate) struct SubmitGuard {
    submitting: Arc<AtomicUsize>,
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.submitting.fetch_sub(1, Ordering::SeqCst);
    }
}

pub(crate) struct VoteGuard {
    signals: BusySignals,
    fact_id: FactId,
}

impl Drop for VoteGuard {
    fn drop(&mut self) {
        let mut votes = self.signals.votes();
        if let Some(count) = votes.get_mut(&self.fact_id) {
            *count -= 1;
            if *count == 0 {
                votes.remove(&self.fact_id);
            }
        }
    }
}
