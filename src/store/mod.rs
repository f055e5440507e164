//! Contract the feed controller uses to reach wherever facts are persisted.

pub mod supabase;

use async_trait::async_trait;

use crate::models::{CategoryFilter, Fact, FactId, NewFact, VoteField};

pub use supabase::{SupabaseConfig, SupabaseStore};

/// Hard cap on rows returned by a single listing.
pub const FACT_LIST_LIMIT: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode store response: {0}")]
    Decode(String),

    #[error("fact {0} does not exist")]
    NotFound(FactId),

    #[error("vote on fact {id} kept conflicting after {attempts} attempts")]
    Conflict { id: FactId, attempts: u32 },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait FactStore: Send + Sync {
    /// At most `limit` facts matching `filter`, most interesting first.
    async fn list_facts(&self, filter: CategoryFilter, limit: usize)
        -> Result<Vec<Fact>, StoreError>;

    /// Creates the fact; the store assigns the id, zeroed counters and `created_in`.
    async fn insert_fact(&self, draft: NewFact) -> Result<Fact, StoreError>;

    /// Bumps `field` by one against the stored value and returns the updated record.
    async fn increment_vote(&self, id: FactId, field: VoteField) -> Result<Fact, StoreError>;
}
