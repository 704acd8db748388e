//! In-process document store with optimistic transactions
//!
//! Every document carries a version. A transaction remembers the version of
//! each document it read (an absent document reads as version 0) and buffers
//! its writes. Commit takes the write lock once, compares every remembered
//! version against the current one, and either applies all buffered patches
//! or none of them.
//!
//! The lock is never held across an await point, so a caller that drops a
//! `run_atomic` future before its commit step leaves the store untouched.

use crate::config::StoreConfig;
use crate::store::{Collection, DocRef, Document, DocumentStore, TransactionView};
use crate::{Error, Result, store_error};
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Entry {
    version: u64,
    data: Document,
}

/// Counters for store activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub documents: usize,
    pub commits: u64,
    pub conflicts: u64,
}

/// Versioned in-memory document store
pub struct MemoryStore {
    documents: RwLock<BTreeMap<DocRef, Entry>>,
    config: StoreConfig,
    commits: AtomicU64,
    conflicts: AtomicU64,
}

impl MemoryStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            config,
            commits: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(StoreConfig::default())
    }

    /// Create for testing with a generous retry budget
    pub fn for_testing() -> Self {
        Self::new(StoreConfig::for_testing())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Replace a document outside of any transaction
    ///
    /// Bumps the version, so in-flight transactions that read the document
    /// will conflict on commit.
    pub fn insert(&self, doc: &DocRef, data: Document) -> Result<()> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| store_error!("Document map write error"))?;

        let version = documents.get(doc).map_or(0, |entry| entry.version);
        documents.insert(
            doc.clone(),
            Entry {
                version: version + 1,
                data,
            },
        );
        Ok(())
    }

    /// Current committed state of a document
    pub fn load(&self, doc: &DocRef) -> Result<Option<Document>> {
        Ok(self.read_versioned(doc)?.1)
    }

    fn read_versioned(&self, doc: &DocRef) -> Result<(u64, Option<Document>)> {
        let documents = self
            .documents
            .read()
            .map_err(|_| store_error!("Document map read error"))?;

        Ok(match documents.get(doc) {
            Some(entry) => (entry.version, Some(entry.data.clone())),
            None => (0, None),
        })
    }

    /// Start a transaction attempt
    pub fn begin(&self) -> MemoryTransaction<'_> {
        MemoryTransaction {
            store: self,
            id: Uuid::new_v4(),
            reads: HashMap::new(),
            writes: Vec::new(),
        }
    }

    /// Validate the attempt's reads and apply its writes in one step
    ///
    /// Returns [`Error::TransactionConflict`] if any document the attempt read
    /// has changed since; in that case nothing is written.
    pub fn commit(&self, tx: MemoryTransaction<'_>) -> Result<()> {
        if !std::ptr::eq(tx.store, self) {
            return Err(store_error!("Transaction {} belongs to another store", tx.id));
        }

        let mut documents = self
            .documents
            .write()
            .map_err(|_| store_error!("Document map write error"))?;

        for (doc, seen) in &tx.reads {
            let current = documents.get(doc).map_or(0, |entry| entry.version);
            if current != *seen {
                self.conflicts.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    "Transaction {} conflicts on {}: read v{}, now v{}",
                    tx.id,
                    doc,
                    seen,
                    current
                );
                return Err(Error::TransactionConflict { attempts: 1 });
            }
        }

        for (doc, patch) in tx.writes {
            let entry = documents.entry(doc).or_insert_with(|| Entry {
                version: 0,
                data: Document::new(),
            });
            for (field, value) in patch {
                if value.is_null() {
                    entry.data.remove(&field);
                } else {
                    entry.data.insert(field, value);
                }
            }
            entry.version += 1;
        }

        self.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let documents = self
            .documents
            .read()
            .map_err(|_| store_error!("Document map read error"))?;

        Ok(StoreStats {
            documents: documents.len(),
            commits: self.commits.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
        })
    }

    /// Linear backoff with up to one extra base delay of jitter
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.retry_backoff();
        let jitter_cap = base.as_micros() as u64;
        let jitter = if jitter_cap == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_cap)
        };
        base * attempt + Duration::from_micros(jitter)
    }
}

/// One attempt of a transaction against a [`MemoryStore`]
pub struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    id: Uuid,
    reads: HashMap<DocRef, u64>,
    writes: Vec<(DocRef, Document)>,
}

impl MemoryTransaction<'_> {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl TransactionView for MemoryTransaction<'_> {
    fn read(&mut self, doc: &DocRef) -> Result<Option<Document>> {
        if !self.writes.is_empty() {
            return Err(store_error!(
                "Transaction {} read {} after a write; all reads must come first",
                self.id,
                doc
            ));
        }

        let (version, data) = self.store.read_versioned(doc)?;
        // the first observed version is the one validated at commit
        self.reads.entry(doc.clone()).or_insert(version);
        Ok(data)
    }

    fn write(&mut self, doc: &DocRef, patch: Document) -> Result<()> {
        self.writes.push((doc.clone(), patch));
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, doc: &DocRef) -> Result<Option<Document>> {
        self.load(doc)
    }

    async fn put(&self, doc: &DocRef, data: Document) -> Result<()> {
        self.insert(doc, data)
    }

    async fn list(&self, collection: Collection) -> Result<Vec<(String, Document)>> {
        let documents = self
            .documents
            .read()
            .map_err(|_| store_error!("Document map read error"))?;

        Ok(documents
            .iter()
            .filter(|(doc, _)| doc.collection == collection)
            .map(|(doc, entry)| (doc.id.clone(), entry.data.clone()))
            .collect())
    }

    async fn run_atomic<T, F>(&self, mut body: F) -> Result<T>
    where
        T: Send,
        F: FnMut(&mut dyn TransactionView) -> Result<T> + Send,
    {
        let max_attempts = self.config.max_transaction_attempts.max(1);

        for attempt in 1..=max_attempts {
            let mut tx = self.begin();
            let tx_id = tx.id;

            let value = {
                let view: &mut dyn TransactionView = &mut tx;
                body(view)?
            };

            // commit is its own round trip; other writers may land first
            tokio::task::yield_now().await;

            match self.commit(tx) {
                Ok(()) => {
                    tracing::debug!("Transaction {} committed on attempt {}", tx_id, attempt);
                    return Ok(value);
                }
                Err(Error::TransactionConflict { .. }) if attempt < max_attempts => {
                    let delay = self.backoff(attempt);
                    tracing::debug!(
                        "🔁 Transaction {} retrying after conflict (attempt {}/{}, backoff {:?})",
                        tx_id,
                        attempt,
                        max_attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(Error::TransactionConflict { .. }) => break,
                Err(e) => return Err(e),
            }
        }

        tracing::warn!("⚠️ Transaction gave up after {} conflicting attempts", max_attempts);
        Err(Error::TransactionConflict {
            attempts: max_attempts,
        })
    }
}
