use serde::{Deserialize, Serialize};

use crate::models::{CategoryFilter, Fact, FactId};

/// Everything the presentation layer renders from. Only the controller mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeedState {
    pub facts: Vec<Fact>,
    pub current_category: CategoryFilter,
    pub loading: bool,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fact(&self, fact_id: FactId) -> Option<&Fact> {
        self.facts.iter().find(|fact| fact.id == fact_id)
    }

    /// Takes the listing as-is, keeping the first occurrence of any repeated id.
    pub fn replace_facts(&mut self, category: CategoryFilter, facts: Vec<Fact>) {
        let mut deduped: Vec<Fact> = Vec::with_capacity(facts.len());
        for fact in facts {
            if !deduped.iter().any(|existing| existing.id == fact.id) {
                deduped.push(fact);
            }
        }
        self.facts = deduped;
        self.current_category = category;
    }

    /// Newest first. An older copy with the same id is dropped.
    pub fn prepend_fact(&mut self, fact: Fact) {
        self.facts.retain(|existing| existing.id != fact.id);
        self.facts.insert(0, fact);
    }

    /// Swaps in the server's record for `fact_id`. Returns false when the id
    /// is no longer in the feed.
    pub fn replace_fact(&mut self, fact_id: FactId, updated: Fact) -> bool {
        match self.facts.iter_mut().find(|fact| fact.id == fact_id) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        }
    }
}
