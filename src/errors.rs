//! Error handling for the voting system

/// Result type alias for the voting system
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to users for any failure that is not a business outcome
pub const GENERIC_USER_MESSAGE: &str = "An internal error occurred.";

/// Main error type for the voting system
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No voter document exists for the identifier
    #[error("Voter not found: {voter_id}")]
    VoterNotFound { voter_id: String },

    /// No candidate document exists for the identifier
    #[error("Candidate not found: {candidate_id}")]
    CandidateNotFound { candidate_id: String },

    /// The voter's `hasVoted` flag is already set
    #[error("Voter has already voted: {voter_id}")]
    AlreadyVoted { voter_id: String },

    /// Optimistic commit kept failing until the retry budget ran out
    #[error("Transaction conflict after {attempts} attempts")]
    TransactionConflict { attempts: u32 },

    /// Validation errors
    #[error("Validation failed: {field}")]
    Validation { field: String },

    /// Event not valid for the current session state
    #[error("Session error: {message}")]
    Session { message: String },

    /// Store-level failures (poisoned locks, malformed documents, misuse)
    #[error("Store error: {message}")]
    Store { message: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Error {
    pub fn voter_not_found(voter_id: impl Into<String>) -> Self {
        Self::VoterNotFound {
            voter_id: voter_id.into(),
        }
    }

    pub fn candidate_not_found(candidate_id: impl Into<String>) -> Self {
        Self::CandidateNotFound {
            candidate_id: candidate_id.into(),
        }
    }

    pub fn already_voted(voter_id: impl Into<String>) -> Self {
        Self::AlreadyVoted {
            voter_id: voter_id.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
        }
    }

    /// Create a new session error
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Expected outcomes of a vote or verification attempt.
    ///
    /// These are returned to the caller as structured results; everything
    /// else is logged and collapsed into [`GENERIC_USER_MESSAGE`].
    pub fn is_business_outcome(&self) -> bool {
        matches!(
            self,
            Self::VoterNotFound { .. } | Self::CandidateNotFound { .. } | Self::AlreadyVoted { .. }
        )
    }

    /// User-readable text for this error. Never exposes internal details.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::VoterNotFound { .. } => "Voter not found.",
            Self::CandidateNotFound { .. } => "The selected candidate does not exist.",
            Self::AlreadyVoted { .. } => "This voter has already cast their vote.",
            Self::Validation { .. } => "Some required information is missing or invalid.",
            _ => GENERIC_USER_MESSAGE,
        }
    }
}

/// Convenience macros for creating specific error types
#[macro_export]
macro_rules! store_error {
    ($msg:expr) => {
        $crate::Error::store($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::store(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! session_error {
    ($msg:expr) => {
        $crate::Error::session($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::session(format!($fmt, $($arg)*))
    };
}
