//! Typed access to voter and candidate documents
//!
//! No business rules live here: the adapter only maps documents to
//! [`Voter`]/[`Candidate`] records and forwards transactions to the store.

use crate::store::{Collection, DocRef, Document, DocumentStore, TransactionView};
use crate::types::{Candidate, Voter};
use crate::{Result, store_error};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Typed wrapper over a [`DocumentStore`]
pub struct StoreAdapter<S> {
    store: Arc<S>,
}

impl<S> Clone for StoreAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> StoreAdapter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn get_voter(&self, voter_id: &str) -> Result<Option<Voter>> {
        self.store
            .get(&DocRef::voter(voter_id))
            .await?
            .map(|data| decode(voter_id, data))
            .transpose()
    }

    pub async fn get_candidate(&self, candidate_id: &str) -> Result<Option<Candidate>> {
        self.store
            .get(&DocRef::candidate(candidate_id))
            .await?
            .map(|data| decode(candidate_id, data))
            .transpose()
    }

    /// All candidates in store order
    pub async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        self.store
            .list(Collection::Candidates)
            .await?
            .into_iter()
            .map(|(id, data)| decode(&id, data))
            .collect()
    }

    pub async fn put_voter(&self, voter: &Voter) -> Result<()> {
        self.store.put(&DocRef::voter(&voter.id), encode(voter)?).await
    }

    pub async fn put_candidate(&self, candidate: &Candidate) -> Result<()> {
        self.store
            .put(&DocRef::candidate(&candidate.id), encode(candidate)?)
            .await
    }

    /// Run `body` atomically, re-executing it on write conflicts
    pub async fn run_atomic<T, F>(&self, body: F) -> Result<T>
    where
        T: Send,
        F: FnMut(&mut dyn TransactionView) -> Result<T> + Send,
    {
        self.store.run_atomic(body).await
    }
}

/// Read a voter inside a transaction
pub fn read_voter(tx: &mut dyn TransactionView, voter_id: &str) -> Result<Option<Voter>> {
    tx.read(&DocRef::voter(voter_id))?
        .map(|data| decode(voter_id, data))
        .transpose()
}

/// Read a candidate inside a transaction
pub fn read_candidate(
    tx: &mut dyn TransactionView,
    candidate_id: &str,
) -> Result<Option<Candidate>> {
    tx.read(&DocRef::candidate(candidate_id))?
        .map(|data| decode(candidate_id, data))
        .transpose()
}

/// Buffer `hasVoted = true` for a voter
pub fn mark_voted(tx: &mut dyn TransactionView, voter_id: &str) -> Result<()> {
    let mut patch = Document::new();
    patch.insert("hasVoted".to_string(), Value::Bool(true));
    tx.write(&DocRef::voter(voter_id), patch)
}

/// Buffer a new `voteCount` for a candidate
///
/// Also drops the older `votes` field so the document keeps one counter.
pub fn set_vote_count(
    tx: &mut dyn TransactionView,
    candidate_id: &str,
    count: u64,
) -> Result<()> {
    let mut patch = Document::new();
    patch.insert("voteCount".to_string(), Value::from(count));
    patch.insert("votes".to_string(), Value::Null);
    tx.write(&DocRef::candidate(candidate_id), patch)
}

/// Decode a document, taking the id from its key when the body lacks one
fn decode<T: DeserializeOwned>(id: &str, mut data: Document) -> Result<T> {
    data.entry("id")
        .or_insert_with(|| Value::String(id.to_string()));
    Ok(serde_json::from_value(Value::Object(data))?)
}

fn encode<T: Serialize>(record: &T) -> Result<Document> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(store_error!("Record encoded to {} instead of a document", other)),
    }
}
