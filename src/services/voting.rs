//! Vote casting
//!
//! A vote is one optimistic transaction over two documents: the voter's
//! `hasVoted` flag and the chosen candidate's `voteCount`. Both checks run
//! before any write is buffered, so a rejected vote changes nothing. Conflict
//! retries are the store's job; a retried attempt re-reads both documents,
//! which is what turns a racing second ballot for the same voter into
//! [`Error::AlreadyVoted`] instead of a double count.

use crate::config::StoreConfig;
use crate::store::adapter::{mark_voted, read_candidate, read_voter, set_vote_count};
use crate::store::{DocumentStore, StoreAdapter};
use crate::types::VoteReceipt;
use crate::{Error, Result, store_error};
use chrono::Utc;
use std::time::Duration;

/// Applies single votes against the store
pub struct VotingService<S> {
    adapter: StoreAdapter<S>,
    timeout: Duration,
}

impl<S: DocumentStore> VotingService<S> {
    pub fn new(adapter: StoreAdapter<S>, config: &StoreConfig) -> Self {
        Self {
            adapter,
            timeout: config.transaction_timeout(),
        }
    }

    /// Cast `voter_id`'s one vote for `candidate_id`
    ///
    /// Fails with [`Error::VoterNotFound`], [`Error::AlreadyVoted`] or
    /// [`Error::CandidateNotFound`] without writing anything. Not idempotent:
    /// repeating a successful call fails with `AlreadyVoted`.
    pub async fn cast_vote(&self, voter_id: &str, candidate_id: &str) -> Result<VoteReceipt> {
        let voter_id = voter_id.trim();
        let candidate_id = candidate_id.trim();
        if voter_id.is_empty() {
            return Err(Error::validation("voter_id"));
        }
        if candidate_id.is_empty() {
            return Err(Error::validation("candidate_id"));
        }

        let transaction = self.adapter.run_atomic(|tx| {
            let voter = read_voter(tx, voter_id)?.ok_or_else(|| Error::voter_not_found(voter_id))?;
            if voter.has_voted {
                return Err(Error::already_voted(voter_id));
            }

            let candidate = read_candidate(tx, candidate_id)?
                .ok_or_else(|| Error::candidate_not_found(candidate_id))?;
            let vote_count = candidate
                .votes()
                .checked_add(1)
                .ok_or_else(|| store_error!("Vote counter overflow for {}", candidate_id))?;

            mark_voted(tx, voter_id)?;
            set_vote_count(tx, candidate_id, vote_count)?;
            Ok(vote_count)
        });

        let outcome = match tokio::time::timeout(self.timeout, transaction).await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::internal(format!(
                "Vote transaction did not resolve within {:?}",
                self.timeout
            ))),
        };

        match outcome {
            Ok(vote_count) => {
                tracing::info!(
                    "🗳️ Vote recorded: voter={}, candidate={}, count={}",
                    voter_id,
                    candidate_id,
                    vote_count
                );
                Ok(VoteReceipt {
                    voter_id: voter_id.to_string(),
                    candidate_id: candidate_id.to_string(),
                    vote_count,
                    cast_at: Utc::now(),
                })
            }
            Err(e) if e.is_business_outcome() => {
                tracing::warn!("🚫 Vote rejected: voter={}, reason={}", voter_id, e);
                Err(e)
            }
            Err(e) => {
                tracing::error!("❌ Vote failed: voter={}, error={}", voter_id, e);
                Err(e)
            }
        }
    }
}
