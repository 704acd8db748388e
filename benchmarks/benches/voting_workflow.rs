use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use serde::Serialize;
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;
use votechain::{
    config::StoreConfig,
    services::{ResultsAggregator, VotingService},
    store::{DocRef, Document, MemoryStore, StoreAdapter},
    types::{Candidate, Voter},
};

const CANDIDATES: [&str; 4] = ["candidate-1", "candidate-2", "candidate-3", "candidate-4"];

fn document<T: Serialize>(record: &T) -> Document {
    match serde_json::to_value(record).unwrap() {
        serde_json::Value::Object(map) => map,
        _ => panic!("record must encode to an object"),
    }
}

fn voter_id(n: usize) -> String {
    format!("VOTER-{n:05}")
}

/// Store with `voters` unvoted voters and four candidates, seeded synchronously
fn seeded(
    voters: usize,
    config: StoreConfig,
) -> (VotingService<MemoryStore>, StoreAdapter<MemoryStore>) {
    let store = Arc::new(MemoryStore::new(config.clone()));
    for n in 0..voters {
        let voter = Voter::new(voter_id(n), format!("Voter {n}"), "12");
        store.insert(&DocRef::voter(&voter.id), document(&voter)).unwrap();
    }
    for id in CANDIDATES {
        let candidate = Candidate::new(id, id, "", "User");
        store.insert(&DocRef::candidate(id), document(&candidate)).unwrap();
    }

    let adapter = StoreAdapter::new(store);
    (VotingService::new(adapter.clone(), &config), adapter)
}

/// Vote casting latency, uncontended and under contention
fn bench_cast_vote(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("cast_vote");
    group.warm_up_time(Duration::from_millis(100));

    group.bench_function("single_vote", |b| {
        b.iter_batched(
            || seeded(1, StoreConfig::default()),
            |(voting, _)| {
                rt.block_on(async {
                    black_box(voting.cast_vote(&voter_id(0), "candidate-1").await.unwrap())
                })
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("rejected_repeat_vote", |b| {
        let (voting, _) = seeded(1, StoreConfig::default());
        rt.block_on(voting.cast_vote(&voter_id(0), "candidate-1")).unwrap();

        b.iter(|| {
            rt.block_on(async {
                black_box(voting.cast_vote(&voter_id(0), "candidate-2").await.is_err())
            })
        })
    });

    for contenders in [4usize, 16, 64] {
        group.bench_with_input(
            BenchmarkId::new("concurrent_same_candidate", contenders),
            &contenders,
            |b, &contenders| {
                let config = StoreConfig {
                    max_transaction_attempts: contenders as u32 + 1,
                    retry_backoff_ms: 0,
                    ..StoreConfig::default()
                };
                b.iter_batched(
                    || Arc::new(seeded(contenders, config.clone()).0),
                    |voting| {
                        rt.block_on(async {
                            let handles: Vec<_> = (0..contenders)
                                .map(|n| {
                                    let voting = Arc::clone(&voting);
                                    tokio::spawn(async move {
                                        voting.cast_vote(&voter_id(n), "candidate-3").await
                                    })
                                })
                                .collect();
                            for handle in handles {
                                handle.await.unwrap().unwrap();
                            }
                        })
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

/// Results aggregation across a filled ballot
fn bench_results(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("results");

    for voters in [100usize, 1000] {
        let (voting, adapter) = seeded(voters, StoreConfig::default());
        rt.block_on(async {
            for n in 0..voters {
                voting
                    .cast_vote(&voter_id(n), CANDIDATES[n % CANDIDATES.len()])
                    .await
                    .unwrap();
            }
        });
        let aggregator = ResultsAggregator::new(adapter);

        group.bench_with_input(BenchmarkId::new("get_results", voters), &voters, |b, _| {
            b.iter(|| rt.block_on(async { black_box(aggregator.get_results().await.unwrap()) }))
        });

        group.bench_with_input(BenchmarkId::new("ranked", voters), &voters, |b, _| {
            let results = rt.block_on(aggregator.get_results()).unwrap();
            b.iter(|| black_box(results.ranked()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cast_vote, bench_results);
criterion_main!(benches);
