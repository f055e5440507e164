//! Hosted store: a PostgREST table (Supabase) reached over HTTPS.
//!
//! Listing and insertion map directly onto PostgREST verbs. PostgREST has no
//! increment operator, so votes use a compare-and-swap PATCH that only matches
//! the row while the counter still holds the value we read; a lost race is
//! retried with a fresh read.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{header, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use async_trait::async_trait;

use crate::{
    log_debug, log_warn,
    models::{CategoryFilter, Fact, FactId, NewFact, VoteField},
};

use super::{FactStore, StoreError};

const ENABLE_LOGS: bool = true;

const REST_PREFIX: &str = "rest/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupabaseConfig {
    pub url: String,
    pub api_key: String,
    pub table: String,
    pub timeout_secs: u64,
    pub max_vote_retries: u32,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: "facts".into(),
            timeout_secs: 10,
            max_vote_retries: 5,
        }
    }
}

pub struct SupabaseStore {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    max_vote_retries: u32,
}

impl SupabaseStore {
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(anyhow!("supabase url is not configured"));
        }
        if config.api_key.is_empty() {
            return Err(anyhow!("supabase api key is not configured"));
        }

        let endpoint = table_endpoint(&config.url, &config.table)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("til-feed/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key.clone(),
            max_vote_retries: config.max_vote_retries.max(1),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    async fn send_rows(&self, request: RequestBuilder) -> Result<Vec<Fact>, StoreError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|err| StoreError::Network(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| StoreError::Network(err.to_string()))?;

        if !status.is_success() {
            log_warn!("Store request failed with HTTP {}: {}", status, body);
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        decode_rows(&body)
    }

    async fn fetch_fact(&self, id: FactId) -> Result<Fact, StoreError> {
        let rows = self.send_rows(self.http.get(row_url(&self.endpoint, id))).await?;
        rows.into_iter().next().ok_or(StoreError::NotFound(id))
    }
}

#[async_trait]
impl FactStore for SupabaseStore {
    async fn list_facts(
        &self,
        filter: CategoryFilter,
        limit: usize,
    ) -> Result<Vec<Fact>, StoreError> {
        let url = list_url(&self.endpoint, filter, limit);
        log_debug!("Listing facts: {}", url);
        self.send_rows(self.http.get(url)).await
    }

    async fn insert_fact(&self, draft: NewFact) -> Result<Fact, StoreError> {
        let request = self
            .http
            .post(self.endpoint.clone())
            .header("Prefer", "return=representation")
            .json(&[&draft]);

        let rows = self.send_rows(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".into()))
    }

    async fn increment_vote(&self, id: FactId, field: VoteField) -> Result<Fact, StoreError> {
        for attempt in 1..=self.max_vote_retries {
            let current = self.fetch_fact(id).await?;
            let seen = current.votes(field);
            let next = seen
                .checked_add(1)
                .ok_or_else(|| StoreError::Backend(anyhow!("{field} overflow on fact {id}")))?;

            let request = self
                .http
                .patch(cas_url(&self.endpoint, id, field, seen))
                .header("Prefer", "return=representation")
                .json(&vote_patch_body(field, next));

            if let Some(updated) = self.send_rows(request).await?.into_iter().next() {
                return Ok(updated);
            }

            log_debug!(
                "Vote on fact {} lost a race at {}={} (attempt {})",
                id,
                field,
                seen,
                attempt
            );
        }

        Err(StoreError::Conflict {
            id,
            attempts: self.max_vote_retries,
        })
    }
}

fn table_endpoint(base: &str, table: &str) -> Result<Url> {
    let mut base = Url::parse(base).with_context(|| format!("invalid supabase url '{base}'"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&format!("{REST_PREFIX}/{table}"))
        .with_context(|| format!("invalid table name '{table}'"))
}

fn list_url(endpoint: &Url, filter: CategoryFilter, limit: usize) -> Url {
    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("select", "*");
        if let CategoryFilter::Only(category) = filter {
            query.append_pair("category", &format!("eq.{category}"));
        }
        query.append_pair("order", &format!("{}.desc", VoteField::Interesting.column()));
        query.append_pair("limit", &limit.to_string());
    }
    url
}

fn row_url(endpoint: &Url, id: FactId) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("select", "*")
        .append_pair("id", &format!("eq.{id}"));
    url
}

fn cas_url(endpoint: &Url, id: FactId, field: VoteField, seen: u32) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("id", &format!("eq.{id}"))
        .append_pair(field.column(), &format!("eq.{seen}"))
        .append_pair("select", "*");
    url
}

fn vote_patch_body(field: VoteField, value: u32) -> Value {
    let mut body = Map::new();
    body.insert(field.column().to_string(), Value::from(value));
    Value::Object(body)
}

fn decode_rows(body: &str) -> Result<Vec<Fact>, StoreError> {
    serde_json::from_str(body).map_err(|err| StoreError::Decode(err.to_string()))
}
