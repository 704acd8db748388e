//! Voting session flow
//!
//! One session walks a single voter from the start screen to a committed
//! vote:
//!
//! ```text
//! Start -> Verifying -> Verified -> Voting -> Voted -> (Results)
//! ```
//!
//! [`transition`] is a pure function over [`SessionState`] and
//! [`SessionEvent`]. [`VotingSession`] owns the current state and performs
//! the service call behind each step. Once a session reaches `Voted` it can
//! only move on to `Results` or be reset; there is no path back to `Voting`
//! for the same voter.

use crate::services::{
    IdentityInput, IdentityResolver, ResultsAggregator, Verification, VerificationService,
    VotingService,
};
use crate::store::DocumentStore;
use crate::types::{Candidate, ElectionResults, VoteReceipt, Voter};
use crate::{Error, Result, session_error};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Waiting for identity input; `notice` explains why a previous attempt ended
    Start { notice: Option<String> },
    Verifying,
    Verified {
        voter: Voter,
        candidates: Vec<Candidate>,
        selection: Option<String>,
        notice: Option<String>,
    },
    /// Vote submission in flight
    Voting {
        voter: Voter,
        candidates: Vec<Candidate>,
        candidate_id: String,
    },
    Voted {
        voter: Voter,
        voted_for: Candidate,
        receipt: VoteReceipt,
    },
    Results { results: ElectionResults },
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Start { notice: None }
    }
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "Start",
            Self::Verifying => "Verifying",
            Self::Verified { .. } => "Verified",
            Self::Voting { .. } => "Voting",
            Self::Voted { .. } => "Voted",
            Self::Results { .. } => "Results",
        }
    }

    /// Message to show the user, if the last step produced one
    pub fn notice(&self) -> Option<&str> {
        match self {
            Self::Start { notice } | Self::Verified { notice, .. } => notice.as_deref(),
            _ => None,
        }
    }
}

/// Why a submitted vote was not recorded, as far as the flow is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Voter missing or already voted; the session cannot continue
    VoterIneligible,
    /// The chosen candidate is gone; another choice may be made
    CandidateUnavailable,
    /// Anything else; the same voter may try again
    Failed,
}

impl Rejection {
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::VoterNotFound { .. } | Error::AlreadyVoted { .. } => Self::VoterIneligible,
            Error::CandidateNotFound { .. } => Self::CandidateUnavailable,
            _ => Self::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    BeginVerification,
    VerificationCompleted(Verification),
    VerificationFailed { message: String },
    SelectCandidate(String),
    ConfirmVote,
    VoteRecorded(VoteReceipt),
    VoteRejected { reason: Rejection, message: String },
    ResultsLoaded(ElectionResults),
    Reset,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeginVerification => "BeginVerification",
            Self::VerificationCompleted(_) => "VerificationCompleted",
            Self::VerificationFailed { .. } => "VerificationFailed",
            Self::SelectCandidate(_) => "SelectCandidate",
            Self::ConfirmVote => "ConfirmVote",
            Self::VoteRecorded(_) => "VoteRecorded",
            Self::VoteRejected { .. } => "VoteRejected",
            Self::ResultsLoaded(_) => "ResultsLoaded",
            Self::Reset => "Reset",
        }
    }
}

/// Compute the state that follows `state` on `event`
///
/// Pairs that make no sense for the flow are rejected with a session error.
/// `Reset` is accepted from every state and discards everything.
pub fn transition(state: &SessionState, event: SessionEvent) -> Result<SessionState> {
    use SessionEvent as E;
    use SessionState as S;

    match (state, event) {
        (_, E::Reset) => Ok(S::default()),

        (S::Start { .. }, E::BeginVerification) => Ok(S::Verifying),

        (S::Verifying, E::VerificationCompleted(verification)) => Ok(match verification {
            Verification::Verified { voter, candidates } => S::Verified {
                voter,
                candidates,
                selection: None,
                notice: None,
            },
            Verification::NotFound => S::Start {
                notice: Some(Error::voter_not_found("").user_message().to_string()),
            },
            Verification::AlreadyVoted { voter_id } => S::Start {
                notice: Some(Error::already_voted(voter_id).user_message().to_string()),
            },
        }),

        (S::Verifying, E::VerificationFailed { message }) => Ok(S::Start {
            notice: Some(message),
        }),

        (
            S::Verified {
                voter, candidates, ..
            },
            E::SelectCandidate(candidate_id),
        ) => {
            if !candidates.iter().any(|c| c.id == candidate_id) {
                return Err(session_error!("Candidate {} is not on the ballot", candidate_id));
            }
            Ok(S::Verified {
                voter: voter.clone(),
                candidates: candidates.clone(),
                selection: Some(candidate_id),
                notice: None,
            })
        }

        (
            S::Verified {
                voter,
                candidates,
                selection: Some(candidate_id),
                ..
            },
            E::ConfirmVote,
        ) => Ok(S::Voting {
            voter: voter.clone(),
            candidates: candidates.clone(),
            candidate_id: candidate_id.clone(),
        }),

        (S::Verified { selection: None, .. }, E::ConfirmVote) => {
            Err(session_error!("No candidate selected"))
        }

        (
            S::Voting {
                voter,
                candidates,
                candidate_id,
            },
            E::VoteRecorded(receipt),
        ) => {
            if receipt.voter_id != voter.id || receipt.candidate_id != *candidate_id {
                return Err(session_error!(
                    "Receipt for {}/{} does not match the submitted vote",
                    receipt.voter_id,
                    receipt.candidate_id
                ));
            }
            let voted_for = candidates
                .iter()
                .find(|c| c.id == *candidate_id)
                .cloned()
                .ok_or_else(|| session_error!("Candidate {} is not on the ballot", candidate_id))?;

            Ok(S::Voted {
                voter: voter.clone(),
                voted_for,
                receipt,
            })
        }

        (
            S::Voting {
                voter, candidates, ..
            },
            E::VoteRejected { reason, message },
        ) => Ok(match reason {
            Rejection::VoterIneligible => S::Start {
                notice: Some(message),
            },
            Rejection::CandidateUnavailable | Rejection::Failed => S::Verified {
                voter: voter.clone(),
                candidates: candidates.clone(),
                selection: None,
                notice: Some(message),
            },
        }),

        (S::Voted { .. } | S::Results { .. }, E::ResultsLoaded(results)) => {
            Ok(S::Results { results })
        }

        (state, event) => Err(session_error!(
            "{} cannot handle {}",
            state.name(),
            event.name()
        )),
    }
}

/// One voter's pass through the flow
///
/// Owns the session state; every mutation goes through [`transition`].
pub struct VotingSession<S, R> {
    id: Uuid,
    state: SessionState,
    verification: Arc<VerificationService<S, R>>,
    voting: Arc<VotingService<S>>,
    results: Arc<ResultsAggregator<S>>,
}

impl<S: DocumentStore, R: IdentityResolver> VotingSession<S, R> {
    pub fn new(
        verification: Arc<VerificationService<S, R>>,
        voting: Arc<VotingService<S>>,
        results: Arc<ResultsAggregator<S>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::default(),
            verification,
            voting,
            results,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn apply(&mut self, event: SessionEvent) -> Result<&SessionState> {
        let event_name = event.name();
        let next = transition(&self.state, event)?;
        tracing::debug!(
            "Session {}: {} --{}--> {}",
            self.id,
            self.state.name(),
            event_name,
            next.name()
        );
        self.state = next;
        Ok(&self.state)
    }

    /// Start → Verifying → Verified (or back to Start with a notice)
    pub async fn verify(&mut self, input: &IdentityInput) -> Result<&SessionState> {
        self.apply(SessionEvent::BeginVerification)?;

        match self.verification.verify(input).await {
            Ok(verification) => self.apply(SessionEvent::VerificationCompleted(verification)),
            Err(e) => {
                tracing::error!("❌ Session {} verification failed: {}", self.id, e);
                self.apply(SessionEvent::VerificationFailed {
                    message: e.user_message().to_string(),
                })?;
                Err(e)
            }
        }
    }

    pub fn select(&mut self, candidate_id: &str) -> Result<&SessionState> {
        self.apply(SessionEvent::SelectCandidate(candidate_id.to_string()))
    }

    /// Submit the selected candidate; calls the voting service exactly once
    pub async fn confirm_vote(&mut self) -> Result<VoteReceipt> {
        self.apply(SessionEvent::ConfirmVote)?;

        let (voter_id, candidate_id) = match &self.state {
            SessionState::Voting {
                voter,
                candidate_id,
                ..
            } => (voter.id.clone(), candidate_id.clone()),
            other => return Err(session_error!("Expected Voting, found {}", other.name())),
        };

        match self.voting.cast_vote(&voter_id, &candidate_id).await {
            Ok(receipt) => {
                self.apply(SessionEvent::VoteRecorded(receipt.clone()))?;
                Ok(receipt)
            }
            Err(e) => {
                self.apply(SessionEvent::VoteRejected {
                    reason: Rejection::from_error(&e),
                    message: e.user_message().to_string(),
                })?;
                Err(e)
            }
        }
    }

    /// Voted/Results → Results with a fresh snapshot
    pub async fn show_results(&mut self) -> Result<&SessionState> {
        if !matches!(
            self.state,
            SessionState::Voted { .. } | SessionState::Results { .. }
        ) {
            return Err(session_error!("{} cannot show results", self.state.name()));
        }

        let results = self.results.get_results().await?;
        self.apply(SessionEvent::ResultsLoaded(results))
    }

    /// Discard voter, ballot and selection and return to Start
    pub fn reset(&mut self) -> Result<&SessionState> {
        self.apply(SessionEvent::Reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ballot() -> (Voter, Vec<Candidate>) {
        (
            Voter::new("V-1", "Pat Reyes", "11"),
            vec![
                Candidate::new("c1", "Ada", "", "User"),
                Candidate::new("c2", "Grace", "", "Rocket"),
            ],
        )
    }

    fn verified() -> SessionState {
        let (voter, candidates) = ballot();
        let verifying =
            transition(&SessionState::default(), SessionEvent::BeginVerification).unwrap();
        transition(
            &verifying,
            SessionEvent::VerificationCompleted(Verification::Verified { voter, candidates }),
        )
        .unwrap()
    }

    fn receipt(candidate_id: &str) -> VoteReceipt {
        VoteReceipt {
            voter_id: "V-1".to_string(),
            candidate_id: candidate_id.to_string(),
            vote_count: 1,
            cast_at: Utc::now(),
        }
    }

    #[test]
    fn test_happy_path() {
        let state = verified();
        assert_eq!(state.name(), "Verified");

        let state = transition(&state, SessionEvent::SelectCandidate("c2".into())).unwrap();
        let state = transition(&state, SessionEvent::ConfirmVote).unwrap();
        assert_eq!(state.name(), "Voting");

        let state = transition(&state, SessionEvent::VoteRecorded(receipt("c2"))).unwrap();
        match &state {
            SessionState::Voted { voted_for, .. } => assert_eq!(voted_for.id, "c2"),
            other => panic!("expected Voted, got {other:?}"),
        }

        let results = ElectionResults::from_candidates(ballot().1);
        let state = transition(&state, SessionEvent::ResultsLoaded(results.clone())).unwrap();
        let state = transition(&state, SessionEvent::ResultsLoaded(results)).unwrap();
        assert_eq!(state.name(), "Results");
    }

    #[test]
    fn test_voted_is_terminal_until_reset() {
        let state = transition(&verified(), SessionEvent::SelectCandidate("c1".into())).unwrap();
        let state = transition(&state, SessionEvent::ConfirmVote).unwrap();
        let voted = transition(&state, SessionEvent::VoteRecorded(receipt("c1"))).unwrap();

        for event in [
            SessionEvent::ConfirmVote,
            SessionEvent::SelectCandidate("c2".into()),
            SessionEvent::BeginVerification,
        ] {
            assert!(matches!(transition(&voted, event), Err(Error::Session { .. })));
        }

        assert_eq!(
            transition(&voted, SessionEvent::Reset).unwrap(),
            SessionState::default()
        );
    }

    #[test]
    fn test_selection_rules() {
        let state = verified();
        assert!(transition(&state, SessionEvent::ConfirmVote).is_err());
        assert!(transition(&state, SessionEvent::SelectCandidate("c9".into())).is_err());

        let state = transition(&state, SessionEvent::SelectCandidate("c1".into())).unwrap();
        let state = transition(&state, SessionEvent::SelectCandidate("c2".into())).unwrap();
        match state {
            SessionState::Verified { selection, .. } => {
                assert_eq!(selection.as_deref(), Some("c2"))
            }
            other => panic!("expected Verified, got {other:?}"),
        }
    }

    #[test]
    fn test_verification_outcomes() {
        let verifying = SessionState::Verifying;

        let not_found = transition(
            &verifying,
            SessionEvent::VerificationCompleted(Verification::NotFound),
        )
        .unwrap();
        assert_eq!(not_found.notice(), Some("Voter not found."));

        let voted = transition(
            &verifying,
            SessionEvent::VerificationCompleted(Verification::AlreadyVoted {
                voter_id: "V-1".into(),
            }),
        )
        .unwrap();
        assert_eq!(voted.notice(), Some("This voter has already cast their vote."));

        let failed = transition(
            &verifying,
            SessionEvent::VerificationFailed {
                message: "An internal error occurred.".into(),
            },
        )
        .unwrap();
        assert_eq!(failed.name(), "Start");
    }

    #[test]
    fn test_rejections() {
        let voting = transition(&verified(), SessionEvent::SelectCandidate("c1".into()))
            .and_then(|s| transition(&s, SessionEvent::ConfirmVote))
            .unwrap();

        let ineligible = transition(
            &voting,
            SessionEvent::VoteRejected {
                reason: Rejection::VoterIneligible,
                message: "This voter has already cast their vote.".into(),
            },
        )
        .unwrap();
        assert_eq!(ineligible.name(), "Start");

        let retry = transition(
            &voting,
            SessionEvent::VoteRejected {
                reason: Rejection::Failed,
                message: "An internal error occurred.".into(),
            },
        )
        .unwrap();
        match retry {
            SessionState::Verified {
                selection, notice, ..
            } => {
                assert!(selection.is_none());
                assert!(notice.is_some());
            }
            other => panic!("expected Verified, got {other:?}"),
        }

        assert_eq!(
            Rejection::from_error(&Error::candidate_not_found("c1")),
            Rejection::CandidateUnavailable
        );
        assert_eq!(
            Rejection::from_error(&Error::TransactionConflict { attempts: 5 }),
            Rejection::Failed
        );
    }

    #[test]
    fn test_mismatched_receipt_rejected() {
        let voting = transition(&verified(), SessionEvent::SelectCandidate("c1".into()))
            .and_then(|s| transition(&s, SessionEvent::ConfirmVote))
            .unwrap();

        assert!(transition(&voting, SessionEvent::VoteRecorded(receipt("c2"))).is_err());
    }
}
