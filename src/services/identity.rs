//! Voter identity verification
//!
//! Turning a photo or card scan into a voter identifier is delegated to an
//! [`IdentityResolver`]. The crate ships two: [`PlaceholderResolver`], which
//! stands in for recognition by always answering with one configured
//! identifier, and [`EnteredIdResolver`], which trusts a typed or scanned id.

use crate::config::VerificationConfig;
use crate::store::{DocumentStore, StoreAdapter};
use crate::types::{Candidate, Voter};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Whatever the voter presented at the start screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IdentityInput {
    /// Camera capture as a base64 `data:` URI
    #[serde(rename_all = "camelCase")]
    Photo { data_uri: String },
    /// Text read from an ID card barcode or chip
    CardScan { value: String },
    /// Identifier typed in by the voter or an election officer
    Manual { value: String },
}

/// A decoded camera capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoCapture {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoCapture {
    /// Parse `data:image/<type>;base64,<payload>`
    pub fn from_data_uri(data_uri: &str) -> Result<Self> {
        let rest = data_uri
            .strip_prefix("data:")
            .ok_or_else(|| Error::validation("photo must be a data URI"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::validation("photo data URI has no payload"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| Error::validation("photo data URI must be base64 encoded"))?;

        if !mime_type.starts_with("image/") {
            return Err(Error::validation(format!(
                "photo MIME type {mime_type} is not an image"
            )));
        }

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|_| Error::validation("photo payload is not valid base64"))?;
        if bytes.is_empty() {
            return Err(Error::validation("photo payload is empty"));
        }

        Ok(Self {
            mime_type: mime_type.to_string(),
            bytes,
        })
    }
}

/// Maps presented identity to a voter identifier
///
/// `Ok(None)` means the input could not be resolved to anyone.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, input: &IdentityInput) -> Result<Option<String>>;
}

/// Resolves every input to a single configured voter
///
/// Photo inputs are still checked to be well-formed captures.
#[derive(Debug, Clone)]
pub struct PlaceholderResolver {
    voter_id: String,
}

impl PlaceholderResolver {
    pub fn new(voter_id: impl Into<String>) -> Self {
        Self {
            voter_id: voter_id.into(),
        }
    }

    pub fn from_config(config: &VerificationConfig) -> Self {
        Self::new(config.placeholder_voter_id.clone())
    }
}

#[async_trait]
impl IdentityResolver for PlaceholderResolver {
    async fn resolve(&self, input: &IdentityInput) -> Result<Option<String>> {
        if let IdentityInput::Photo { data_uri } = input {
            let capture = PhotoCapture::from_data_uri(data_uri)?;
            tracing::debug!(
                "📷 Placeholder resolver accepted {} capture ({} bytes)",
                capture.mime_type,
                capture.bytes.len()
            );
        }
        Ok(Some(self.voter_id.clone()))
    }
}

/// Uses the identifier the voter typed or scanned
#[derive(Debug, Clone, Default)]
pub struct EnteredIdResolver;

#[async_trait]
impl IdentityResolver for EnteredIdResolver {
    async fn resolve(&self, input: &IdentityInput) -> Result<Option<String>> {
        match input {
            IdentityInput::Manual { value } | IdentityInput::CardScan { value } => {
                let id = value.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            IdentityInput::Photo { .. } => {
                tracing::debug!("Entered-id resolver cannot read photos");
                Ok(None)
            }
        }
    }
}

/// Outcome of a verification attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// Eligible voter, with the ballot to present
    Verified {
        voter: Voter,
        candidates: Vec<Candidate>,
    },
    NotFound,
    AlreadyVoted { voter_id: String },
}

/// Resolves identity input and checks the voter's eligibility
pub struct VerificationService<S, R> {
    adapter: StoreAdapter<S>,
    resolver: R,
}

impl<S: DocumentStore, R: IdentityResolver> VerificationService<S, R> {
    pub fn new(adapter: StoreAdapter<S>, resolver: R) -> Self {
        Self { adapter, resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Resolve `input` and load the voter and, if eligible, the candidates
    pub async fn verify(&self, input: &IdentityInput) -> Result<Verification> {
        let Some(voter_id) = self.resolver.resolve(input).await? else {
            tracing::warn!("🔍 Identity input did not resolve to a voter");
            return Ok(Verification::NotFound);
        };

        let Some(voter) = self.adapter.get_voter(&voter_id).await? else {
            tracing::warn!("🔍 Voter {} not found", voter_id);
            return Ok(Verification::NotFound);
        };

        if voter.has_voted {
            tracing::warn!("🚫 Voter {} has already voted", voter_id);
            return Ok(Verification::AlreadyVoted { voter_id });
        }

        let candidates = self.adapter.list_candidates().await?;
        tracing::info!(
            "✅ Voter {} verified, {} candidates on the ballot",
            voter.id,
            candidates.len()
        );

        Ok(Verification::Verified { voter, candidates })
    }
}
