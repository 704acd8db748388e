//! Voting core services: verification, vote casting, results

pub mod identity;
pub mod results;
pub mod voting;

pub use identity::{
    EnteredIdResolver, IdentityInput, IdentityResolver, PhotoCapture, PlaceholderResolver,
    Verification, VerificationService,
};
pub use results::{ResultsAggregator, ResultsPoller};
pub use voting::VotingService;
