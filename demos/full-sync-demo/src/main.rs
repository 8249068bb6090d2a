//! Local two-peer full-sync demo: spins up a pair of [`SyncEngine`]s over
//! the in-memory transport from `psync_core::testkit`, has each publish a
//! handful of names under its own prefix, and logs what each side learns
//! from the other as the IBLT exchange converges.
//!
//! Mirrors the shape of the teacher's top-level `main.rs`: `clap::Parser`
//! for arguments, a `tracing_subscriber` bootstrap, then drive the thing
//! and report what happened. Not part of the reconciliation core itself —
//! out of scope per the core's own spec, same as the original CLI.

use bytes::Bytes;
use clap::Parser;
use psync_config::SyncConfig;
use psync_core::testkit::{InMemoryNetwork, InMemorySegmentStore};
use psync_core::{MissingDataInfo, SyncEngine};
use psync_types::Name;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Two-peer psync full-set sync demo")]
struct Args {
    /// How many names each peer publishes under its own prefix.
    #[arg(long, default_value_t = 5)]
    updates: u64,

    /// How long to let the engines run after publishing before reporting.
    #[arg(long, default_value_t = 3000)]
    settle_ms: u64,
}

fn demo_config() -> SyncConfig {
    SyncConfig {
        expected_entries: 80,
        request_lifetime_ms: 200,
        reply_freshness_ms: 1600,
        low_freshness_ms: 10,
        threshold: 0,
        jitter_range_ms: (100, 500),
        ..SyncConfig::default()
    }
}

#[tokio::main]
async fn main() {
    psync_common::init_tracing();
    let args = Args::parse();

    let network = InMemoryNetwork::new();
    let sync_prefix = Name::from_uri("/psync/demo");

    let (engine_a, handle_a) = SyncEngine::new(
        sync_prefix.clone(),
        demo_config(),
        Arc::new(network.new_face()),
        Arc::new(InMemorySegmentStore::new()),
        |updates: &[MissingDataInfo]| log_updates("peer-a", updates),
    );
    let (engine_b, handle_b) = SyncEngine::new(
        sync_prefix,
        demo_config(),
        Arc::new(network.new_face()),
        Arc::new(InMemorySegmentStore::new()),
        |updates: &[MissingDataInfo]| log_updates("peer-b", updates),
    );

    tokio::spawn(engine_a.run());
    tokio::spawn(engine_b.run());

    let prefix_a = Name::from_uri("/demo/peer-a");
    let prefix_b = Name::from_uri("/demo/peer-b");
    handle_a.add_user_prefix(prefix_a.clone()).await.unwrap();
    handle_b.add_user_prefix(prefix_b.clone()).await.unwrap();

    for seq in 1..=args.updates {
        let block = Bytes::from(format!("peer-a update #{seq}"));
        handle_a
            .publish_name_and_data(prefix_a.clone(), block, Some(seq))
            .await
            .unwrap();
        info!(prefix = %prefix_a, seq, "published");

        let block = Bytes::from(format!("peer-b update #{seq}"));
        handle_b
            .publish_name_and_data(prefix_b.clone(), block, Some(seq))
            .await
            .unwrap();
        info!(prefix = %prefix_b, seq, "published");
    }

    tokio::time::sleep(Duration::from_millis(args.settle_ms)).await;

    let a_sees_b = handle_a.current_seq(prefix_b.clone()).await.unwrap();
    let b_sees_a = handle_b.current_seq(prefix_a.clone()).await.unwrap();
    info!(?a_sees_b, ?b_sees_a, "final cross-peer sequence state");

    if a_sees_b == Some(args.updates) && b_sees_a == Some(args.updates) {
        info!("peers converged");
    } else {
        info!("peers have not fully converged yet; try a longer --settle-ms");
    }
}

fn log_updates(peer: &str, updates: &[MissingDataInfo]) {
    for update in updates {
        info!(
            peer,
            prefix = %update.prefix,
            low_seq = update.low_seq,
            high_seq = update.high_seq,
            has_block = update.block.is_some(),
            "learned update"
        );
    }
}
