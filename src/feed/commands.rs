//! Entry points for the presentation layer. Errors come back as display strings.

use serde::{Deserialize, Serialize};

use crate::models::{Category, CategoryFilter, CategoryInfo, Fact, FactId, VoteField};

use super::{FeedController, FeedState};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FactView {
    #[serde(flatten)]
    pub fact: Fact,
    pub is_disputed: bool,
    pub category_color: &'static str,
    pub voting: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedView {
    pub facts: Vec<FactView>,
    pub current_category: CategoryFilter,
    pub loading: bool,
    pub submitting: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactInput {
    pub text: String,
    pub source: String,
    pub category: String,
}

fn fact_view(controller: &FeedController, fact: Fact) -> FactView {
    FactView {
        is_disputed: fact.is_disputed(),
        category_color: fact.category.color(),
        voting: controller.busy().is_voting(fact.id),
        fact,
    }
}

fn feed_view(controller: &FeedController, state: FeedState) -> FeedView {
    FeedView {
        facts: state
            .facts
            .into_iter()
            .map(|fact| fact_view(controller, fact))
            .collect(),
        current_category: state.current_category,
        loading: state.loading,
        submitting: controller.busy().is_submitting(),
    }
}

pub async fn get_feed_state(controller: &FeedController) -> FeedView {
    feed_view(controller, controller.snapshot().await)
}

/// `name` is `"all"` or a category name.
pub async fn select_category(controller: &FeedController, name: &str) -> Result<FeedView, String> {
    let filter: CategoryFilter = name.parse().map_err(|e: anyhow::Error| e.to_string())?;
    controller.refresh(filter).await.map_err(|e| e.to_string())?;
    Ok(get_feed_state(controller).await)
}

pub async fn submit_fact(controller: &FeedController, input: FactInput) -> Result<FactView, String> {
    let fact = controller
        .submit_fact(&input.text, &input.source, &input.category)
        .await
        .map_err(|e| e.to_string())?;
    Ok(fact_view(controller, fact))
}

/// `field` accepts `interesting`, `mindblowing`, `false` or the column names.
pub async fn cast_vote(
    controller: &FeedController,
    fact_id: FactId,
    field: &str,
) -> Result<FactView, String> {
    let field: VoteField = field.parse().map_err(|e: anyhow::Error| e.to_string())?;
    let outcome = controller
        .cast_vote(fact_id, field)
        .await
        .map_err(|e| e.to_string())?;
    Ok(fact_view(controller, outcome.fact().clone()))
}

pub fn list_categories() -> Vec<CategoryInfo> {
    Category::ALL.iter().map(|category| *category.info()).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{db::Database, feed::FeedOptions};

    fn open() -> (tempfile::TempDir, FeedController) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("commands.sqlite3")).unwrap();
        (dir, FeedController::new(Arc::new(db), FeedOptions::default()))
    }

    fn input(text: &str, category: &str) -> FactInput {
        FactInput {
            text: text.into(),
            source: "https://example.com".into(),
            category: category.into(),
        }
    }

    #[tokio::test]
    async fn vote_view_flags_disputed_facts() {
        let (_dir, controller) = open();
        let created = submit_fact(&controller, input("Bulls hate red", "society"))
            .await
            .unwrap();
        assert!(!created.is_disputed);
        assert_eq!(created.category_color, "#eab308");

        let voted = cast_vote(&controller, created.fact.id, "false").await.unwrap();
        assert!(voted.is_disputed);
        assert!(!voted.voting);

        let feed = get_feed_state(&controller).await;
        assert!(feed.facts[0].is_disputed);
        assert!(!feed.submitting);
    }

    #[tokio::test]
    async fn select_category_switches_filter() {
        let (_dir, controller) = open();
        submit_fact(&controller, input("Fact one", "news")).await.unwrap();
        submit_fact(&controller, input("Fact two", "health")).await.unwrap();

        let feed = select_category(&controller, "news").await.unwrap();
        assert_eq!(feed.current_category, CategoryFilter::Only(Category::News));
        assert_eq!(feed.facts.len(), 1);

        assert!(select_category(&controller, "sports").await.is_err());
        let feed = get_feed_state(&controller).await;
        assert_eq!(feed.current_category, CategoryFilter::Only(Category::News));
    }

    #[tokio::test]
    async fn errors_become_messages() {
        let (_dir, controller) = open();
        let err = submit_fact(&controller, input("", "news")).await.unwrap_err();
        assert!(err.contains("text is empty"));

        let err = cast_vote(&controller, 1, "likes").await.unwrap_err();
        assert!(err.contains("likes"));

        let err = cast_vote(&controller, 404, "interesting").await.unwrap_err();
        assert!(err.contains("404"));
    }

    #[test]
    fn view_serializes_flat() {
        let view = FactView {
            fact: Fact {
                id: 1,
                text: "t".into(),
                source: "https://example.com".into(),
                category: Category::News,
                votes_interesting: 0,
                votes_mindblowing: 0,
                votes_false: 1,
                created_in: 2024,
            },
            is_disputed: true,
            category_color: Category::News.color(),
            voting: false,
        };
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["votesFalse"], 1);
        assert_eq!(json["isDisputed"], true);
        assert_eq!(json["categoryColor"], "#8b5cf6");
        let categories = list_categories();
        assert_eq!(categories.len(), 8);
        assert_eq!(categories[0].name, "technology");
        assert_eq!(categories[7].color, "#8b5cf6");
    }
}
