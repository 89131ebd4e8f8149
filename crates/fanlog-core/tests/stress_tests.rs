//! Stress tests for concurrent logging
//!
//! These tests hammer one engine from many threads and verify that the
//! dispatch lock keeps every sink consistent.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use fanlog_core::{Engine, LogStore, Severity, SinkConfig, SinkMask};
use tempfile::tempdir;

// ============================================================================
// Ring Buffer Under Contention
// ============================================================================

/// N threads each emitting M events leave exactly N×M distinct entries.
#[test]
fn test_concurrent_emits_are_all_recorded() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 250;

    let engine = Arc::new(Engine::new());
    engine
        .change(
            SinkMask::MEMORY,
            &SinkConfig::default().with_ring_capacity(THREADS * PER_THREAD),
        )
        .unwrap();

    let start = Instant::now();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = engine.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    assert!(engine.info(&format!("{}-{}", t, i)));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let duration = start.elapsed();

    let held = engine.all();
    assert_eq!(held.len(), THREADS * PER_THREAD);

    let unique: HashSet<_> = held
        .iter()
        .map(|event| event.message().unwrap().to_string())
        .collect();
    assert_eq!(unique.len(), THREADS * PER_THREAD);

    // Each thread's own events keep their relative order.
    for t in 0..THREADS {
        let prefix = format!("{}-", t);
        let order: Vec<usize> = held
            .iter()
            .filter_map(|event| event.message()?.strip_prefix(&prefix)?.parse().ok())
            .collect();
        assert_eq!(order, (0..PER_THREAD).collect::<Vec<_>>());
    }

    println!(
        "Recorded {} events from {} threads in {:?}",
        THREADS * PER_THREAD,
        THREADS,
        duration
    );
}

/// A small ring under contention stays full and bounded.
#[test]
fn test_concurrent_eviction_keeps_capacity() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 500;
    const CAPACITY: usize = 64;

    let engine = Arc::new(Engine::new());
    engine
        .change(
            SinkMask::MEMORY,
            &SinkConfig::default().with_ring_capacity(CAPACITY),
        )
        .unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = engine.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    engine.warn(&format!("{}:{}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let held = engine.all();
    assert_eq!(held.len(), CAPACITY);

    // Each thread's surviving messages keep the order it wrote them in.
    let mut last_seen: Vec<Option<usize>> = vec![None; THREADS];
    for event in &held {
        let (t, i) = event.message().unwrap().split_once(':').unwrap();
        let (t, i): (usize, usize) = (t.parse().unwrap(), i.parse().unwrap());
        if let Some(prev) = last_seen[t] {
            assert!(prev < i, "thread {} wrote {} before {}", t, prev, i);
        }
        last_seen[t] = Some(i);
    }
}

/// Sink-set changes racing with emits never panic or lose the lock.
#[test]
fn test_change_while_emitting() {
    let engine = Arc::new(Engine::new());
    engine
        .change(SinkMask::MEMORY, &SinkConfig::default())
        .unwrap();

    let writer = {
        let engine = engine.clone();
        thread::spawn(move || {
            for i in 0..1_000 {
                engine.debug(&format!("tick {}", i));
            }
        })
    };

    for capacity in 1..=50 {
        engine
            .change(
                SinkMask::MEMORY,
                &SinkConfig::default().with_ring_capacity(capacity),
            )
            .unwrap();
        let _ = engine.all();
    }

    writer.join().unwrap();
    assert!(engine.all().len() <= 50);
}

// ============================================================================
// Store Under Contention
// ============================================================================

#[test]
fn test_concurrent_store_writes() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 25;

    let dir = tempdir().unwrap();
    let store_path = dir.path().join("logs.redb");
    let engine = Arc::new(Engine::new());
    engine
        .change(
            SinkMask::RELATIONAL,
            &SinkConfig::default().with_store_path(&store_path),
        )
        .unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = engine.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    assert!(engine.error(&format!("{}/{}", t, i)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    engine.disable();

    let rows = LogStore::open(&store_path)
        .unwrap()
        .logs_for_session(&engine.session_id().to_string())
        .unwrap();
    assert_eq!(rows.len(), THREADS * PER_THREAD);
    assert!(rows.iter().all(|row| row.severity == Severity::Error.as_str()));

    let ids: HashSet<_> = rows.iter().map(|row| row.id).collect();
    assert_eq!(ids.len(), rows.len());
}
