//! Logical calls exposed to a client
//!
//! [`VoteChain`] wires the services to one store and resolver and answers the
//! three client calls with plain serialisable responses. Business outcomes
//! come back as user-readable messages; internal failures are logged here and
//! reduced to a generic message.

use crate::config::Config;
use crate::services::{
    IdentityInput, IdentityResolver, PlaceholderResolver, ResultsAggregator, ResultsPoller,
    Verification, VerificationService, VotingService,
};
use crate::session::VotingSession;
use crate::store::{DocumentStore, MemoryStore, SeedData, StoreAdapter};
use crate::types::{Candidate, ElectionResults, Voter};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteResponse {
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub voter: Option<Voter>,
    pub candidates: Option<Vec<Candidate>>,
    pub error: Option<String>,
}

impl From<Verification> for VerifyResponse {
    fn from(verification: Verification) -> Self {
        match verification {
            Verification::Verified { voter, candidates } => Self {
                voter: Some(voter),
                candidates: Some(candidates),
                error: None,
            },
            Verification::NotFound => Self::failed(&Error::voter_not_found("")),
            Verification::AlreadyVoted { voter_id } => {
                Self::failed(&Error::already_voted(voter_id))
            }
        }
    }
}

impl VerifyResponse {
    fn failed(error: &Error) -> Self {
        Self {
            voter: None,
            candidates: None,
            error: Some(error.user_message().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    pub candidates: Vec<Candidate>,
    pub total_votes: u64,
}

impl From<ElectionResults> for ResultsResponse {
    fn from(results: ElectionResults) -> Self {
        Self {
            candidates: results.candidates,
            total_votes: results.total_votes,
        }
    }
}

/// The voting system bound to one store and identity resolver
pub struct VoteChain<S, R> {
    config: Config,
    adapter: StoreAdapter<S>,
    verification: Arc<VerificationService<S, R>>,
    voting: Arc<VotingService<S>>,
    results: Arc<ResultsAggregator<S>>,
}

impl<S: DocumentStore, R: IdentityResolver> VoteChain<S, R> {
    pub fn new(store: Arc<S>, resolver: R, config: Config) -> Self {
        let adapter = StoreAdapter::new(store);

        Self {
            verification: Arc::new(VerificationService::new(adapter.clone(), resolver)),
            voting: Arc::new(VotingService::new(adapter.clone(), &config.store)),
            results: Arc::new(ResultsAggregator::new(adapter.clone())),
            adapter,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn adapter(&self) -> &StoreAdapter<S> {
        &self.adapter
    }

    /// Start a fresh session at the Start state
    pub fn session(&self) -> VotingSession<S, R> {
        VotingSession::new(
            Arc::clone(&self.verification),
            Arc::clone(&self.voting),
            Arc::clone(&self.results),
        )
    }

    /// Results poller on the configured refresh interval
    pub fn results_poller(
        &self,
        stop_signal: mpsc::Receiver<()>,
    ) -> (ResultsPoller<S>, watch::Receiver<Option<ElectionResults>>) {
        ResultsPoller::new(
            Arc::clone(&self.results),
            self.config.results.refresh_interval(),
            stop_signal,
        )
    }

    pub async fn verify(&self, input: &IdentityInput) -> VerifyResponse {
        match self.verification.verify(input).await {
            Ok(verification) => verification.into(),
            Err(e) => {
                tracing::error!("❌ Verification failed: {}", e);
                VerifyResponse::failed(&e)
            }
        }
    }

    pub async fn cast_vote(&self, voter_id: &str, candidate_id: &str) -> CastVoteResponse {
        // the service already logs both rejections and failures
        match self.voting.cast_vote(voter_id, candidate_id).await {
            Ok(_) => CastVoteResponse {
                success: true,
                error: None,
            },
            Err(e) => CastVoteResponse {
                success: false,
                error: Some(e.user_message().to_string()),
            },
        }
    }

    pub async fn get_results(&self) -> Result<ResultsResponse> {
        self.results.get_results().await.map(Into::into).inspect_err(|e| {
            tracing::error!("❌ Results query failed: {}", e);
        })
    }
}

impl VoteChain<MemoryStore, PlaceholderResolver> {
    /// In-memory deployment with the placeholder resolver
    ///
    /// Seeds from `config.results.seed_file` when set, otherwise from
    /// [`SeedData::demo`].
    pub async fn in_memory(config: Config) -> Result<Self> {
        let seed = match &config.results.seed_file {
            Some(path) => SeedData::from_file(path)?,
            None => SeedData::demo(),
        };

        let store = Arc::new(MemoryStore::new(config.store.clone()));
        let resolver = PlaceholderResolver::from_config(&config.verification);
        let chain = Self::new(store, resolver, config);
        seed.apply(chain.adapter()).await?;

        Ok(chain)
    }
}
