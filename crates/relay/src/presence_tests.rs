// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::*;

#[tokio::test(start_paused = true)]
async fn touched_host_is_in_immediate_snapshot() {
    let registry = PresenceRegistry::new();
    registry.touch("host-a");

    assert!(registry.snapshot(Duration::ZERO).contains_key("host-a"));
    assert!(registry.snapshot(DEFAULT_TTL).contains_key("host-a"));
}

#[tokio::test]
async fn touched_host_is_in_snapshot_on_real_clock() {
    let registry = PresenceRegistry::new();
    registry.touch("host-a");
    assert!(registry.snapshot(Duration::from_secs(1)).contains_key("host-a"));
}

#[tokio::test(start_paused = true)]
async fn stale_host_is_evicted_permanently() {
    let registry = PresenceRegistry::new();
    registry.touch("host-a");
    registry.touch("host-b");

    tokio::time::advance(Duration::from_secs(20)).await;
    registry.touch("host-b");
    tokio::time::advance(Duration::from_secs(11)).await;

    let snap = registry.snapshot(DEFAULT_TTL);
    assert!(!snap.contains_key("host-a"));
    assert!(snap.contains_key("host-b"));
    assert_eq!(registry.len(), 1);

    // Gone even under a wider window now.
    let wide = registry.snapshot(Duration::from_secs(3600));
    assert!(!wide.contains_key("host-a"));
}

#[tokio::test(start_paused = true)]
async fn entry_at_exact_ttl_is_still_online() {
    let registry = PresenceRegistry::new();
    registry.touch("host-a");
    tokio::time::advance(DEFAULT_TTL).await;
    assert!(registry.snapshot(DEFAULT_TTL).contains_key("host-a"));
}

#[tokio::test(start_paused = true)]
async fn stale_entries_linger_until_snapshot() {
    let registry = PresenceRegistry::new();
    registry.touch("host-a");
    tokio::time::advance(Duration::from_secs(60)).await;
    assert_eq!(registry.len(), 1);
    assert!(registry.snapshot(DEFAULT_TTL).is_empty());
    assert!(registry.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_touches_are_all_kept() -> anyhow::Result<()> {
    let registry = Arc::new(PresenceRegistry::new());
    let mut handles = Vec::new();
    for i in 0..64 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            for _ in 0..10 {
                registry.touch(&format!("host-{i}"));
                let _ = registry.snapshot(DEFAULT_TTL);
            }
        }));
    }
    for h in handles {
        h.await?;
    }

    let snap = registry.snapshot(DEFAULT_TTL);
    assert_eq!(snap.len(), 64);
    for i in 0..64 {
        assert!(snap.contains_key(&format!("host-{i}")));
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn online_count_ignores_stale_without_evicting() {
    let registry = PresenceRegistry::new();
    registry.touch("host-a");
    tokio::time::advance(Duration::from_secs(20)).await;
    registry.touch("host-b");
    assert_eq!(registry.online_count(DEFAULT_TTL), 2);

    tokio::time::advance(Duration::from_secs(15)).await;
    assert_eq!(registry.online_count(DEFAULT_TTL), 1);
    assert_eq!(registry.len(), 2);

    // Agrees with the snapshot taken right after.
    assert_eq!(registry.snapshot(DEFAULT_TTL).len(), 1);
}
