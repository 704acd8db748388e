//! Presentation helpers for screens built on top of the voting core

use crate::types::{Candidate, ElectionResults, Voter};
use serde::{Deserialize, Serialize};

/// Icons a candidate can be shown with
///
/// Candidates store the icon as a string key; unknown or empty keys fall
/// back to [`CandidateIcon::User`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CandidateIcon {
    #[default]
    User,
    Vote,
    ShieldCheck,
    Rocket,
}

impl CandidateIcon {
    pub const ALL: [CandidateIcon; 4] = [
        CandidateIcon::User,
        CandidateIcon::Vote,
        CandidateIcon::ShieldCheck,
        CandidateIcon::Rocket,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            CandidateIcon::User => "User",
            CandidateIcon::Vote => "Vote",
            CandidateIcon::ShieldCheck => "ShieldCheck",
            CandidateIcon::Rocket => "Rocket",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|icon| icon.key() == key)
    }

    pub fn for_candidate(candidate: &Candidate) -> Self {
        Self::from_key(&candidate.icon).unwrap_or_default()
    }
}

/// First word of the voter's name, for the ballot heading
pub fn greeting_name(voter: &Voter) -> &str {
    voter
        .name
        .split_whitespace()
        .next()
        .unwrap_or(voter.id.as_str())
}

/// One line per candidate, highest count first
pub fn results_lines(results: &ElectionResults) -> Vec<String> {
    results
        .ranked()
        .iter()
        .map(|row| {
            format!(
                "{}. {} - {} votes ({:.1}%)",
                row.rank, row.candidate_name, row.vote_count, row.percentage
            )
        })
        .collect()
}
