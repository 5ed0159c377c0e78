//! # ShardMail Dispatch Benchmarks
//!
//! | Path | Operation | Target |
//! |------|-----------|--------|
//! | sm-02 | shard selection, one lap worst case | < 1µs |
//! | sm-02 | inbox merge of 3 shard batches | < 1ms for 3k messages |
//! | sm-01 | content digest | < 10µs for 4 KiB |

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sm_01_shard_store::{content_hash, NewMessage, ShardId, StoredMessage};
use sm_02_dispatch::{merge_inbox, select_shard, HealthState};

fn shard_ids(count: usize) -> Vec<ShardId> {
    (1..=count).map(|i| ShardId::new(format!("S{i}"))).collect()
}

// ============================================================================
// SM-02: Shard selection
// ============================================================================

fn bench_select_shard(c: &mut Criterion) {
    let mut group = c.benchmark_group("sm-02-select-shard");

    for size in [3usize, 16, 128] {
        let rotation = shard_ids(size);
        // Only the last shard is UP: every call scans a full lap.
        let health: BTreeMap<ShardId, HealthState> = rotation
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let state = if i + 1 == size {
                    HealthState::Up
                } else {
                    HealthState::Down
                };
                (id.clone(), state)
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("worst_case_lap", size), &size, |b, _| {
            let mut cursor = 0usize;
            b.iter(|| {
                cursor = 0;
                black_box(select_shard(&rotation, &health, &mut cursor).is_ok())
            })
        });
    }

    group.finish();
}

// ============================================================================
// SM-02: Inbox merge
// ============================================================================

fn bench_merge_inbox(c: &mut Criterion) {
    let mut group = c.benchmark_group("sm-02-merge-inbox");
    let epoch = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

    for per_shard in [10u64, 100, 1_000] {
        let batches: Vec<(ShardId, Vec<StoredMessage>)> = shard_ids(3)
            .into_iter()
            .enumerate()
            .map(|(s, shard)| {
                let messages = (0..per_shard)
                    .map(|i| {
                        let id = i * 3 + s as u64;
                        StoredMessage::from_new(
                            NewMessage::new(id, "alice", "bob", "payload"),
                            shard.clone(),
                            epoch + chrono::Duration::seconds(id as i64),
                        )
                    })
                    .collect();
                (shard, messages)
            })
            .collect();

        group.throughput(Throughput::Elements(per_shard * 3));
        group.bench_with_input(
            BenchmarkId::new("three_shards", per_shard),
            &batches,
            |b, batches| b.iter(|| black_box(merge_inbox(batches.clone()).len())),
        );
    }

    group.finish();
}

// ============================================================================
// SM-01: Integrity digest
// ============================================================================

fn bench_content_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("sm-01-content-hash");

    for size in [64usize, 1_024, 4_096] {
        let content = "x".repeat(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("sha256_hex", size), &content, |b, content| {
            b.iter(|| black_box(content_hash(content)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_select_shard, bench_merge_inbox, bench_content_hash);
criterion_main!(benches);
