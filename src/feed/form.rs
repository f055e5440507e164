use serde::{Deserialize, Serialize};

use crate::{
    models::Fact,
    validation::{is_submittable, remaining_chars},
};

use super::{FeedController, FeedError};

/// State behind the "Share a fact" form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FactForm {
    pub open: bool,
    pub text: String,
    pub source: String,
    pub category: String,
}

impl FactForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens or closes the form, returning the new state.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn toggle_label(&self) -> &'static str {
        if self.open {
            "Close"
        } else {
            "Share a fact"
        }
    }

    pub fn remaining_chars(&self) -> i64 {
        remaining_chars(&self.text)
    }

    pub fn is_submittable(&self) -> bool {
        is_submittable(&self.text, &self.source, &self.category)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Clears and closes the form once the store accepted the fact; on any
    /// error the input stays put so the user can retry.
    pub async fn submit(&mut self, controller: &FeedController) -> Result<Fact, FeedError> {
        let fact = controller
            .submit_fact(&self.text, &self.source, &self.category)
            .await?;
        self.reset();
        Ok(fact)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{db::Database, feed::FeedOptions};

    fn filled() -> FactForm {
        FactForm {
            open: true,
            text: "Octopuses have three hearts".into(),
            source: "https://oceanservice.noaa.gov/".into(),
            category: "science".into(),
        }
    }

    #[test]
    fn toggles_between_labels() {
        let mut form = FactForm::new();
        assert_eq!(form.toggle_label(), "Share a fact");
        assert!(form.toggle());
        assert_eq!(form.toggle_label(), "Close");
        assert!(!form.toggle());
    }

    #[test]
    fn tracks_remaining_characters() {
        let mut form = FactForm::new();
        assert_eq!(form.remaining_chars(), 200);
        form.text = "a".repeat(180);
        assert_eq!(form.remaining_chars(), 20);
        assert!(!form.is_submittable());
        assert!(filled().is_submittable());
    }

    #[tokio::test]
    async fn resets_after_successful_submit() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("form.sqlite3")).unwrap();
        let controller = FeedController::new(Arc::new(db), FeedOptions::default());

        let mut form = filled();
        let fact = form.submit(&controller).await.unwrap();
        assert_eq!(fact.text, "Octopuses have three hearts");
        assert_eq!(form, FactForm::default());
        assert_eq!(controller.snapshot().await.facts[0].id, fact.id);
    }

    #[tokio::test]
    async fn stays_open_when_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("form.sqlite3")).unwrap();
        let controller = FeedController::new(Arc::new(db), FeedOptions::default());

        let mut form = FactForm {
            source: "not-a-url".into(),
            ..filled()
        };
        assert!(matches!(
            form.submit(&controller).await,
            Err(FeedError::Validation(_))
        ));
        assert!(form.open);
        assert_eq!(form.source, "not-a-url");
    }
}
