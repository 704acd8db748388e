//! Seed data for demo and test stores
//!
//! Registration and candidate management happen outside this crate. Seed
//! files let an in-memory store start from the same state a real database
//! would already hold.

use crate::config::DEFAULT_PLACEHOLDER_VOTER_ID;
use crate::store::{DocumentStore, StoreAdapter};
use crate::types::{Candidate, Voter};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Voters and candidates to load into a store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub voters: Vec<Voter>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl SeedData {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let seed: Self = serde_json::from_str(json)?;
        seed.validate()?;
        Ok(seed)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::internal(format!("Cannot read seed file {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// A small ballot whose only voter is the placeholder identity
    pub fn demo() -> Self {
        let mut voter = Voter::new(DEFAULT_PLACEHOLDER_VOTER_ID, "Alex Rivera", "12");
        voter.section = Some("Mabini".to_string());
        voter.strand = Some("STEM".to_string());

        Self {
            voters: vec![voter],
            candidates: vec![
                Candidate::new(
                    "candidate-1",
                    "Jordan Lee",
                    "Longer library hours and a student tutoring network.",
                    "User",
                ),
                Candidate::new(
                    "candidate-2",
                    "Sam Cruz",
                    "A student voice in every school policy decision.",
                    "Vote",
                ),
                Candidate::new(
                    "candidate-3",
                    "Riley Tan",
                    "Safer campus grounds and a clear anti-bullying process.",
                    "ShieldCheck",
                ),
                Candidate::new(
                    "candidate-4",
                    "Casey Lim",
                    "New clubs, competitions and a yearly innovation fair.",
                    "Rocket",
                ),
            ],
        }
    }

    /// Identifiers must be present and unique within each collection
    pub fn validate(&self) -> Result<()> {
        check_ids("voter", self.voters.iter().map(|v| v.id.as_str()))?;
        check_ids("candidate", self.candidates.iter().map(|c| c.id.as_str()))
    }

    /// Write every record through the adapter, replacing existing documents
    pub async fn apply<S: DocumentStore>(&self, adapter: &StoreAdapter<S>) -> Result<()> {
        self.validate()?;

        for voter in &self.voters {
            adapter.put_voter(voter).await?;
        }
        for candidate in &self.candidates {
            adapter.put_candidate(candidate).await?;
        }

        tracing::info!(
            "🌱 Seeded store with {} voters and {} candidates",
            self.voters.len(),
            self.candidates.len()
        );
        Ok(())
    }
}

fn check_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(Error::validation(format!("{kind} id must not be empty")));
        }
        if !seen.insert(id) {
            return Err(Error::validation(format!("duplicate {kind} id {id}")));
        }
    }
    Ok(())
}
