//! Document store boundary for voters and candidates
//!
//! The voting core sees the database as two keyed collections of JSON
//! documents plus one transaction primitive. Everything above this module
//! talks to [`StoreAdapter`]; everything below it is a [`DocumentStore`].

pub mod adapter;
pub mod memory;
pub mod seed;

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use adapter::StoreAdapter;
pub use memory::{MemoryStore, MemoryTransaction, StoreStats};
pub use seed::SeedData;

/// A stored document, or a patch of fields to merge into one
pub type Document = serde_json::Map<String, serde_json::Value>;

/// The two collections the voting core knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Voters,
    Candidates,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Voters => "voters",
            Collection::Candidates => "candidates",
        }
    }
}

/// Reference to a single document: collection plus key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocRef {
    pub collection: Collection,
    pub id: String,
}

impl DocRef {
    pub fn voter(id: impl Into<String>) -> Self {
        Self {
            collection: Collection::Voters,
            id: id.into(),
        }
    }

    pub fn candidate(id: impl Into<String>) -> Self {
        Self {
            collection: Collection::Candidates,
            id: id.into(),
        }
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection.as_str(), self.id)
    }
}

/// View handed to a transaction body
///
/// All reads must happen before the first write. Writes are buffered and
/// only become visible if the whole transaction commits.
pub trait TransactionView {
    /// Read a document as of this attempt, recording it for conflict checks
    fn read(&mut self, doc: &DocRef) -> Result<Option<Document>>;

    /// Merge `patch` into the document on commit, creating it if absent
    ///
    /// A `null` value in the patch removes that field.
    fn write(&mut self, doc: &DocRef, patch: Document) -> Result<()>;
}

/// Transactional document database
///
/// `run_atomic` re-executes `body` whenever its commit detects that a
/// document it read was changed by someone else. If `body` returns an error
/// the attempt is discarded, nothing is written, and the error is returned
/// without retrying.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, doc: &DocRef) -> Result<Option<Document>>;

    /// Replace a whole document
    async fn put(&self, doc: &DocRef, data: Document) -> Result<()>;

    /// All documents of a collection as `(key, document)`, in store order
    async fn list(&self, collection: Collection) -> Result<Vec<(String, Document)>>;

    async fn run_atomic<T, F>(&self, body: F) -> Result<T>
    where
        T: Send,
        F: FnMut(&mut dyn TransactionView) -> Result<T> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_ref_display_and_order() {
        let voter = DocRef::voter("VOTE-1");
        let candidate = DocRef::candidate("rocket");

        assert_eq!(voter.to_string(), "voters/VOTE-1");
        assert_eq!(candidate.to_string(), "candidates/rocket");
        assert!(voter < candidate);
        assert!(DocRef::candidate("a") < DocRef::candidate("b"));
    }
}
