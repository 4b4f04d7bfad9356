use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use utoipa::ToSchema;

/// Cached outcome of converting one distinct upload, keyed by its SHA-256
/// content hash. Created at most once per hash within a session and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConversionRecord {
    /// Client-supplied filename, untrusted
    pub original_name: String,
    /// Converter output; empty when nothing was extracted or the
    /// conversion failed
    pub markdown: String,
    /// Plain-text artifact, present only when the export was requested at
    /// conversion time
    pub plain_text: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Exact byte count streamed from the upload
    pub original_bytes: u64,
    /// UTF-8 byte length of the reduced plain text, computed at conversion
    /// time whether or not the `.txt` export was requested
    pub derived_bytes: u64,
}

/// One interactive session's conversion results. Discarded with the
/// session; no expiry policy.
#[derive(Default)]
pub struct SessionCache {
    records: RwLock<HashMap<String, ConversionRecord>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, hash: &str) -> Option<ConversionRecord> {
        self.records.read().await.get(hash).cloned()
    }

    /// Stores a record for `hash` unless one already exists. Returns the
    /// record now in the cache, so concurrent requests for the same bytes
    /// converge on a single record.
    pub async fn insert_if_absent(
        &self,
        hash: String,
        record: ConversionRecord,
    ) -> ConversionRecord {
        let mut records = self.records.write().await;
        records.entry(hash).or_insert(record).clone()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// All records with their hashes, newest first
    pub async fn snapshot(&self) -> Vec<(String, ConversionRecord)> {
        let records = self.records.read().await;
        let mut all: Vec<_> = records
            .iter()
            .map(|(hash, record)| (hash.clone(), record.clone()))
            .collect();
        all.sort_by(|a, b| b.1.created_at.cmp(&a.1.created_at));
        all
    }
}

/// Holds every live session's cache, keyed by the opaque session id. Each
/// session gets its own isolated [`SessionCache`]; nothing is shared or
/// leaked across sessions.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, Arc<SessionCache>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, session_id: &str) -> Arc<SessionCache> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(SessionCache::new()))
            .clone()
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<SessionCache>> {
        self.sessions.get(session_id).map(|s| s.clone())
    }
}
