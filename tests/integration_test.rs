//! Integration tests for the vote transaction, results and session flow

use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use votechain::{
    Error, Result, VoteChain,
    config::Config,
    services::{EnteredIdResolver, IdentityInput, ResultsAggregator, VotingService},
    session::SessionState,
    store::{DocRef, Document, MemoryStore, StoreAdapter},
    types::{Candidate, Voter},
};

struct Election {
    adapter: StoreAdapter<MemoryStore>,
    voting: VotingService<MemoryStore>,
    results: ResultsAggregator<MemoryStore>,
}

fn voter_id(n: usize) -> String {
    format!("VOTER-{n:03}")
}

async fn election(voters: usize) -> Result<Election> {
    let config = Config::for_testing();
    let adapter = StoreAdapter::new(Arc::new(MemoryStore::new(config.store.clone())));

    for n in 0..voters {
        adapter
            .put_voter(&Voter::new(voter_id(n), format!("Voter {n}"), "12"))
            .await?;
    }
    adapter
        .put_candidate(&Candidate::new("alpha", "Alpha", "Student council", "User"))
        .await?;
    adapter
        .put_candidate(&Candidate::new("bravo", "Bravo", "Sports programme", "Rocket"))
        .await?;

    Ok(Election {
        voting: VotingService::new(adapter.clone(), &config.store),
        results: ResultsAggregator::new(adapter.clone()),
        adapter,
    })
}

async fn count(election: &Election, candidate_id: &str) -> Result<u64> {
    Ok(election
        .adapter
        .get_candidate(candidate_id)
        .await?
        .map(|c| c.votes())
        .unwrap_or(0))
}

#[tokio::test]
async fn test_repeat_vote_is_rejected_and_counted_once() -> Result<()> {
    println!("🗳️ Testing repeat vote rejection...");
    let election = election(1).await?;

    let receipt = assert_ok!(election.voting.cast_vote(&voter_id(0), "alpha").await);
    assert_eq!(receipt.vote_count, 1);
    println!("✅ First vote recorded");

    let err = assert_err!(election.voting.cast_vote(&voter_id(0), "alpha").await);
    assert!(matches!(err, Error::AlreadyVoted { .. }));
    let err = assert_err!(election.voting.cast_vote(&voter_id(0), "bravo").await);
    assert!(matches!(err, Error::AlreadyVoted { .. }));
    println!("✅ Repeat votes rejected");

    assert_eq!(count(&election, "alpha").await?, 1);
    assert_eq!(count(&election, "bravo").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_missing_voter_writes_nothing() -> Result<()> {
    let election = election(1).await?;
    let before = election.results.get_results().await?;

    let err = assert_err!(election.voting.cast_vote("missing-voter", "alpha").await);
    assert!(matches!(err, Error::VoterNotFound { .. }));

    let after = election.results.get_results().await?;
    assert_eq!(before.candidates, after.candidates);
    assert_eq!(after.total_votes, 0);
    assert_eq!(election.adapter.store().stats()?.commits, 0);
    Ok(())
}

#[tokio::test]
async fn test_missing_candidate_keeps_voter_unvoted() -> Result<()> {
    let election = election(1).await?;

    let err = assert_err!(election.voting.cast_vote(&voter_id(0), "missing-candidate").await);
    assert!(matches!(err, Error::CandidateNotFound { .. }));

    let voter = election.adapter.get_voter(&voter_id(0)).await?.expect("voter seeded");
    assert!(!voter.has_voted);

    // the voter can still vote afterwards
    assert_ok!(election.voting.cast_vote(&voter_id(0), "bravo").await);
    Ok(())
}

#[tokio::test]
async fn test_results_total_matches_successful_votes() -> Result<()> {
    println!("📊 Testing result totals...");
    let voters = 7;
    let election = election(voters).await?;

    for n in 0..voters {
        let candidate = if n % 3 == 0 { "bravo" } else { "alpha" };
        election.voting.cast_vote(&voter_id(n), candidate).await?;
    }
    // rejected attempts must not show up in the totals
    let err = assert_err!(election.voting.cast_vote(&voter_id(0), "alpha").await);
    assert!(matches!(err, Error::AlreadyVoted { .. }));
    let err = assert_err!(election.voting.cast_vote("nobody", "alpha").await);
    assert!(matches!(err, Error::VoterNotFound { .. }));

    let results = election.results.get_results().await?;
    let sum: u64 = results.candidates.iter().map(|c| c.votes()).sum();
    assert_eq!(results.total_votes, voters as u64);
    assert_eq!(sum, results.total_votes);

    let mut voted = 0;
    for n in 0..voters {
        if election.adapter.get_voter(&voter_id(n)).await?.is_some_and(|v| v.has_voted) {
            voted += 1;
        }
    }
    assert_eq!(voted, voters);

    let ranked = results.ranked();
    assert_eq!(ranked[0].candidate_id, "alpha");
    assert_eq!(ranked[0].vote_count, 4);
    println!("✅ {} votes tallied", results.total_votes);
    Ok(())
}

#[tokio::test]
async fn test_absent_count_behaves_like_zero() -> Result<()> {
    let election = election(2).await?;
    let mut zeroed = Candidate::new("charlie", "Charlie", "", "Vote");
    zeroed.vote_count = Some(0);
    election.adapter.put_candidate(&zeroed).await?;

    let before = election.results.get_results().await?;
    let alpha = before.candidates.iter().find(|c| c.id == "alpha").expect("alpha listed");
    let charlie = before.candidates.iter().find(|c| c.id == "charlie").expect("charlie listed");
    assert_eq!(alpha.vote_count, charlie.vote_count);

    let a = election.voting.cast_vote(&voter_id(0), "alpha").await?;
    let c = election.voting.cast_vote(&voter_id(1), "charlie").await?;
    assert_eq!(a.vote_count, 1);
    assert_eq!(c.vote_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_older_votes_field_survives_repeated_votes() -> Result<()> {
    println!("🗂️ Testing candidates stored with the older votes field...");
    let election = election(2).await?;
    let key = DocRef::candidate("legacy");
    let mut data = Document::new();
    data.insert("name".to_string(), "Legacy".into());
    data.insert("votes".to_string(), 3.into());
    election.adapter.store().insert(&key, data)?;

    let first = election.voting.cast_vote(&voter_id(0), "legacy").await?;
    assert_eq!(first.vote_count, 4);

    let stored = election.adapter.store().load(&key)?.expect("candidate stored");
    assert_eq!(stored["voteCount"], 4);
    assert!(stored.get("votes").is_none());

    let results = assert_ok!(election.results.get_results().await);
    assert_eq!(results.total_votes, 4);

    let second = election.voting.cast_vote(&voter_id(1), "legacy").await?;
    assert_eq!(second.vote_count, 5);
    assert_eq!(count(&election, "legacy").await?, 5);

    let results = election.results.get_results().await?;
    assert_eq!(results.ranked()[0].candidate_id, "legacy");
    println!("✅ Older counter migrated on first vote");
    Ok(())
}

#[tokio::test]
async fn test_session_flow_end_to_end() -> Result<()> {
    println!("🧭 Testing session flow...");
    let election = election(1).await?;
    let chain = VoteChain::new(
        Arc::clone(election.adapter.store()),
        EnteredIdResolver,
        Config::for_testing(),
    );
    let input = IdentityInput::Manual { value: voter_id(0) };

    let mut session = chain.session();
    let state = session.verify(&input).await?;
    match state {
        SessionState::Verified { voter, candidates, .. } => {
            assert_eq!(voter.id, voter_id(0));
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("expected Verified, got {other:?}"),
    }

    session.select("bravo")?;
    let receipt = session.confirm_vote().await?;
    assert_eq!(receipt.candidate_id, "bravo");
    assert_eq!(session.state().name(), "Voted");
    println!("✅ Vote confirmed");

    // no path from Voted back to Voting
    let err = assert_err!(session.confirm_vote().await);
    assert!(matches!(err, Error::Session { .. }));
    assert_eq!(session.state().name(), "Voted");

    match session.show_results().await? {
        SessionState::Results { results } => assert_eq!(results.total_votes, 1),
        other => panic!("expected Results, got {other:?}"),
    }

    assert_eq!(session.reset()?, &SessionState::default());
    assert_eq!(session.reset()?, &SessionState::default());

    // a new session for the same voter stops at Start
    let mut second = chain.session();
    let state = second.verify(&input).await?;
    assert_eq!(state.name(), "Start");
    assert_eq!(state.notice(), Some("This voter has already cast their vote."));

    assert_eq!(chain.get_results().await?.total_votes, 1);
    Ok(())
}

#[tokio::test]
async fn test_session_unknown_voter_and_results_guard() -> Result<()> {
    let election = election(1).await?;
    let chain = VoteChain::new(
        Arc::clone(election.adapter.store()),
        EnteredIdResolver,
        Config::for_testing(),
    );

    let mut session = chain.session();
    let err = assert_err!(session.show_results().await);
    assert!(matches!(err, Error::Session { .. }));

    let state = session
        .verify(&IdentityInput::CardScan {
            value: "NOT-REGISTERED".to_string(),
        })
        .await?;
    assert_eq!(state.notice(), Some("Voter not found."));

    let response = chain.cast_vote("NOT-REGISTERED", "alpha").await;
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("Voter not found."));
    Ok(())
}
