//! # Core Types for the Voting System
//!
//! This module defines the records the voting core reads from and writes to
//! the document store, plus the value types handed back to callers.
//!
//! ## Type Categories
//!
//! ### Stored Records
//! - [`Voter`]: a registered voter and their `hasVoted` flag
//! - [`Candidate`]: an electable option and its running `voteCount`
//!
//! ### Outcomes
//! - [`VoteReceipt`]: confirmation of one committed vote
//! - [`ElectionResults`]: a tally snapshot across all candidates
//! - [`VoteResult`]: one ranked row of a results display
//!
//! ## Field Naming
//!
//! Records are stored as JSON documents with camelCase field names
//! (`hasVoted`, `voteCount`). Older candidate documents that use `votes`
//! for the counter are still read correctly.
//!
//! ```rust
//! use votechain::types::Candidate;
//!
//! let legacy: Candidate = serde_json::from_str(
//!     r#"{"id": "c1", "name": "Ada", "description": "", "icon": "Rocket", "votes": 3}"#,
//! ).unwrap();
//! assert_eq!(legacy.votes(), 3);
//!
//! let fresh: Candidate = serde_json::from_str(r#"{"id": "c2", "name": "Grace"}"#).unwrap();
//! assert_eq!(fresh.votes(), 0);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered voter
///
/// Voters are created by an external registration process. The voting core
/// only ever flips `has_voted` from `false` to `true`, exactly once, as part
/// of a successful vote transaction. Voters are never deleted here.
///
/// The classification fields (`grade`, `section`, `track`, `strand`) are
/// opaque strings carried for display; only `id` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voter {
    /// Unique voter identifier, also the document key in `voters`
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub grade: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strand: Option<String>,

    /// Whether this voter's single vote has been committed
    ///
    /// Missing in the stored document means `false`.
    #[serde(default)]
    pub has_voted: bool,
}

impl Voter {
    /// Create an unvoted voter with only the required fields set
    pub fn new(id: impl Into<String>, name: impl Into<String>, grade: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            grade: grade.into(),
            section: None,
            track: None,
            strand: None,
            has_voted: false,
        }
    }

    /// Whether the voter may still cast a vote
    pub fn is_eligible(&self) -> bool {
        !self.has_voted
    }
}

/// An electable option accumulating a vote counter
///
/// Candidates are created by an external seeding process. `vote_count` is
/// only ever incremented by the vote transaction; an absent counter behaves
/// exactly like zero everywhere (see [`Candidate::votes`]).
///
/// # Examples
///
/// ```rust
/// use votechain::types::Candidate;
///
/// let candidate = Candidate::new("c-rocket", "Team Rocket", "Faster lunch lines", "Rocket");
/// assert_eq!(candidate.vote_count, None);
/// assert_eq!(candidate.votes(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CandidateDocument")]
pub struct Candidate {
    /// Unique candidate identifier, also the document key in `candidates`
    pub id: String,

    pub name: String,

    pub description: String,

    /// Icon key resolved by the presentation layer
    ///
    /// See [`crate::display::CandidateIcon`] for the known keys.
    pub icon: String,

    /// Running vote total; `None` until the first vote lands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u64>,
}

/// Stored candidate shape, accepting either counter field
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateDocument {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    vote_count: Option<u64>,
    #[serde(default)]
    votes: Option<u64>,
}

impl From<CandidateDocument> for Candidate {
    fn from(doc: CandidateDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            description: doc.description,
            icon: doc.icon,
            // voteCount wins when a document carries both
            vote_count: doc.vote_count.or(doc.votes),
        }
    }
}

impl Candidate {
    /// Create a candidate without a vote counter
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            icon: icon.into(),
            vote_count: None,
        }
    }

    /// Current vote total, treating an absent counter as zero
    pub fn votes(&self) -> u64 {
        self.vote_count.unwrap_or(0)
    }
}

/// Confirmation of a committed vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub voter_id: String,
    pub candidate_id: String,

    /// The candidate's counter after this vote was applied
    pub vote_count: u64,

    /// When the transaction committed
    pub cast_at: DateTime<Utc>,
}

/// Tally snapshot across all candidates
///
/// Candidates keep the order the store returned them in and always carry an
/// explicit `vote_count`. Display ordering is a presentation concern; use
/// [`ElectionResults::ranked`] for a sorted view.
///
/// # Examples
///
/// ```rust
/// use votechain::types::{Candidate, ElectionResults};
///
/// let mut ada = Candidate::new("ada", "Ada", "", "User");
/// ada.vote_count = Some(3);
/// let grace = Candidate::new("grace", "Grace", "", "Vote");
///
/// let results = ElectionResults::from_candidates(vec![grace, ada]);
/// assert_eq!(results.total_votes, 3);
/// assert_eq!(results.candidates[0].vote_count, Some(0));
///
/// let ranked = results.ranked();
/// assert_eq!(ranked[0].candidate_id, "ada");
/// assert_eq!(ranked[0].percentage, 100.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResults {
    pub candidates: Vec<Candidate>,

    /// Sum of every candidate's `vote_count`
    pub total_votes: u64,

    /// When the snapshot was read
    pub fetched_at: DateTime<Utc>,
}

impl ElectionResults {
    /// Build a snapshot, normalising missing counters to zero
    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        let candidates: Vec<Candidate> = candidates
            .into_iter()
            .map(|mut candidate| {
                candidate.vote_count = Some(candidate.votes());
                candidate
            })
            .collect();

        let total_votes = candidates.iter().map(Candidate::votes).sum();

        Self {
            candidates,
            total_votes,
            fetched_at: Utc::now(),
        }
    }

    /// Candidates sorted by descending vote count, with rank and share
    ///
    /// The sort is stable, so tied candidates keep their store order and
    /// receive consecutive ranks.
    pub fn ranked(&self) -> Vec<VoteResult> {
        let mut sorted: Vec<&Candidate> = self.candidates.iter().collect();
        sorted.sort_by(|a, b| b.votes().cmp(&a.votes()));

        sorted
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| VoteResult {
                rank: index + 1,
                candidate_id: candidate.id.clone(),
                candidate_name: candidate.name.clone(),
                vote_count: candidate.votes(),
                percentage: percentage(candidate.votes(), self.total_votes),
            })
            .collect()
    }
}

fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        votes as f64 / total as f64 * 100.0
    }
}

/// One ranked row of an election results display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    /// 1-based position after sorting
    pub rank: usize,
    pub candidate_id: String,
    pub candidate_name: String,
    pub vote_count: u64,

    /// Share of all votes, `0.0` when nothing has been cast yet
    pub percentage: f64,
}
