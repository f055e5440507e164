use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use rusqlite::{params, Connection, Row};

use crate::{
    db::{
        connection::Database,
        helpers::{parse_category, to_u32},
    },
    models::{CategoryFilter, Fact, FactId, NewFact, VoteField},
    store::{FactStore, StoreError},
};

const FACT_COLUMNS: &str =
    "id, text, source, category, votesInteresting, votesMindblowing, votesFalse, createdIn";

fn row_to_fact(row: &Row) -> Result<Fact> {
    let category: String = row.get("category")?;
    let votes_interesting: i64 = row.get("votesInteresting")?;
    let votes_mindblowing: i64 = row.get("votesMindblowing")?;
    let votes_false: i64 = row.get("votesFalse")?;

    Ok(Fact {
        id: row.get("id")?,
        text: row.get("text")?,
        source: row.get("source")?,
        category: parse_category(&category)?,
        votes_interesting: to_u32(votes_interesting, "votesInteresting")?,
        votes_mindblowing: to_u32(votes_mindblowing, "votesMindblowing")?,
        votes_false: to_u32(votes_false, "votesFalse")?,
        created_in: row.get("createdIn")?,
    })
}

fn load_fact(conn: &Connection, fact_id: FactId) -> Result<Option<Fact>> {
    let mut stmt = conn.prepare(&format!("SELECT {FACT_COLUMNS} FROM facts WHERE id = ?1"))?;
    let mut rows = stmt.query(params![fact_id])?;
    match rows.next()? {
        Some(row) => row_to_fact(row).map(Some),
        None => Ok(None),
    }
}

impl Database {
    /// Facts matching `filter`, most interesting first, capped at `limit`.
    pub async fn query_facts(&self, filter: CategoryFilter, limit: usize) -> Result<Vec<Fact>> {
        let limit = i64::try_from(limit).map_err(|_| anyhow!("limit {limit} out of range"))?;
        self.execute(move |conn| {
            let mut facts = Vec::new();
            match filter {
                CategoryFilter::All => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {FACT_COLUMNS} FROM facts
                         ORDER BY votesInteresting DESC, id ASC
                         LIMIT ?1"
                    ))?;
                    let mut rows = stmt.query(params![limit])?;
                    while let Some(row) = rows.next()? {
                        facts.push(row_to_fact(row)?);
                    }
                }
                CategoryFilter::Only(category) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {FACT_COLUMNS} FROM facts
                         WHERE category = ?1
                         ORDER BY votesInteresting DESC, id ASC
                         LIMIT ?2"
                    ))?;
                    let mut rows = stmt.query(params![category.as_str(), limit])?;
                    while let Some(row) = rows.next()? {
                        facts.push(row_to_fact(row)?);
                    }
                }
            }
            Ok(facts)
        })
        .await
    }

    pub async fn create_fact(&self, draft: NewFact) -> Result<Fact> {
        self.execute(move |conn| {
            let created_in = Utc::now().year();

            conn.execute(
                "INSERT INTO facts (text, source, category, votesInteresting, votesMindblowing, votesFalse, createdIn)
                 VALUES (?1, ?2, ?3, 0, 0, 0, ?4)",
                params![draft.text, draft.source, draft.category.as_str(), created_in],
            )
            .with_context(|| "failed to insert fact")?;

            let fact_id = conn.last_insert_rowid();
            load_fact(conn, fact_id)?.ok_or_else(|| anyhow!("Fact not found after insert"))
        })
        .await
    }

    /// Returns `None` when no fact has `fact_id`.
    pub async fn bump_vote(&self, fact_id: FactId, field: VoteField) -> Result<Option<Fact>> {
        self.execute(move |conn| {
            let column = field.column();
            let rows_affected = conn
                .execute(
                    &format!("UPDATE facts SET {column} = {column} + 1 WHERE id = ?1"),
                    params![fact_id],
                )
                .with_context(|| format!("failed to increment {column}"))?;

            if rows_affected == 0 {
                return Ok(None);
            }

            load_fact(conn, fact_id)
        })
        .await
    }
}

#[async_trait]
impl FactStore for Database {
    async fn list_facts(
        &self,
        filter: CategoryFilter,
        limit: usize,
    ) -> Result<Vec<Fact>, StoreError> {
        Ok(self.query_facts(filter, limit).await?)
    }

    async fn insert_fact(&self, draft: NewFact) -> Result<Fact, StoreError> {
        Ok(self.create_fact(draft).await?)
    }

    async fn increment_vote(&self, id: FactId, field: VoteField) -> Result<Fact, StoreError> {
        self.bump_vote(id, field)
            .await?
            .ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn open() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("facts.sqlite3")).unwrap();
        (dir, db)
    }

    fn draft(text: &str, category: Category) -> NewFact {
        NewFact {
            text: text.into(),
            source: "https://example.com".into(),
            category,
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_zeroes_votes() {
        let (_dir, db) = open();
        let first = db.insert_fact(draft("first", Category::Science)).await.unwrap();
        let second = db.insert_fact(draft("second", Category::News)).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.votes_interesting, 0);
        assert_eq!(first.votes_mindblowing, 0);
        assert_eq!(first.votes_false, 0);
        assert_eq!(first.created_in, Utc::now().year());
        assert_eq!(db.list_facts(CategoryFilter::All, 100).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn increment_returns_server_value() {
        let (_dir, db) = open();
        let fact = db.insert_fact(draft("votes", Category::Health)).await.unwrap();

        db.increment_vote(fact.id, VoteField::False).await.unwrap();
        let updated = db.increment_vote(fact.id, VoteField::False).await.unwrap();

        assert_eq!(updated.votes_false, 2);
        assert_eq!(updated.votes_interesting, 0);
        assert!(updated.is_disputed());
    }

    #[tokio::test]
    async fn increment_unknown_fact_is_not_found() {
        let (_dir, db) = open();
        let err = db.increment_vote(42, VoteField::Interesting).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(42)));
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let (_dir, db) = open();
        let fact_id = db.insert_fact(draft("race", Category::Society)).await.unwrap().id;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.increment_vote(fact_id, VoteField::Mindblowing).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let facts = db.list_facts(CategoryFilter::All, 100).await.unwrap();
        assert_eq!(facts[0].votes_mindblowing, 10);
    }

    #[tokio::test]
    async fn list_filters_sorts_and_caps() {
        let (_dir, db) = open();
        let mut history_ids = Vec::new();
        for index in 0..4 {
            let fact = db
                .insert_fact(draft(&format!("history {index}"), Category::History))
                .await
                .unwrap();
            for _ in 0..index {
                db.increment_vote(fact.id, VoteField::Interesting).await.unwrap();
            }
            history_ids.push(fact.id);
        }
        db.insert_fact(draft("tech", Category::Technology)).await.unwrap();

        let history = db
            .list_facts(CategoryFilter::Only(Category::History), 100)
            .await
            .unwrap();
        assert_eq!(history.len(), 4);
        assert!(history.iter().all(|fact| fact.category == Category::History));
        assert!(history
            .windows(2)
            .all(|pair| pair[0].votes_interesting >= pair[1].votes_interesting));
        assert_eq!(history[0].id, history_ids[3]);

        let all = db.list_facts(CategoryFilter::All, 100).await.unwrap();
        assert_eq!(all.len(), 5);

        let capped = db.list_facts(CategoryFilter::All, 2).await.unwrap();
        assert_eq!(capped.len(), 2);
    }
}
