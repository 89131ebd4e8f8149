//! Property-based tests for filtering and the ring buffer
//!
//! Uses proptest to verify the threshold and eviction invariants for
//! arbitrary severity sequences and capacities.

use proptest::prelude::*;

use fanlog_core::sink::RingBufferSink;
use fanlog_core::{Engine, Event, Severity, SinkConfig, SinkMask};

// ============================================================================
// Strategy Generators
// ============================================================================

fn severity_strategy() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Debug),
        Just(Severity::Info),
        Just(Severity::Warn),
        Just(Severity::Error),
        Just(Severity::Fatal),
    ]
}

/// Operations that can be performed on a ring
#[derive(Debug, Clone)]
enum RingOp {
    Write(Severity),
    Clear,
}

fn ring_ops_strategy(max_ops: usize) -> impl Strategy<Value = Vec<RingOp>> {
    prop::collection::vec(
        prop_oneof![
            8 => severity_strategy().prop_map(RingOp::Write),
            1 => Just(RingOp::Clear),
        ],
        0..max_ops,
    )
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Through the engine, a ring keeps exactly the events at or above its
    /// level, newest `capacity` of them, in emit order.
    #[test]
    fn engine_keeps_newest_events_at_or_above_level(
        level in severity_strategy(),
        capacity in 1usize..16,
        severities in prop::collection::vec(severity_strategy(), 0..64),
    ) {
        let engine = Engine::new();
        engine
            .change(
                SinkMask::MEMORY,
                &SinkConfig::default().with_level(level).with_ring_capacity(capacity),
            )
            .unwrap();

        let mut expected = Vec::new();
        for (i, severity) in severities.iter().enumerate() {
            let message = i.to_string();
            let accepted = match severity {
                Severity::Debug => engine.debug(&message),
                Severity::Info => engine.info(&message),
                Severity::Warn => engine.warn(&message),
                Severity::Error => engine.error(&message),
                Severity::Fatal => engine.fatal(&message),
            };
            prop_assert_eq!(accepted, *severity >= level);
            if accepted {
                expected.push(message);
            }
        }

        let skip = expected.len().saturating_sub(capacity);
        let expected: Vec<_> = expected.into_iter().skip(skip).collect();
        let held: Vec<_> = engine
            .all()
            .iter()
            .map(|event| event.message().unwrap().to_string())
            .collect();
        prop_assert_eq!(held, expected);
    }

    /// Len never exceeds capacity, and after C writes since the last clear
    /// the ring reports full.
    #[test]
    fn ring_len_bounded_and_full_after_capacity(
        capacity in 1usize..10,
        ops in ring_ops_strategy(60),
    ) {
        let ring = RingBufferSink::new(Severity::Debug, capacity).unwrap();
        let mut since_clear = 0usize;

        for op in ops {
            match op {
                RingOp::Write(severity) => {
                    prop_assert!(ring.accept(&Event::new(severity, "x")));
                    since_clear += 1;
                }
                RingOp::Clear => {
                    ring.clear();
                    since_clear = 0;
                }
            }

            prop_assert!(ring.len() <= capacity);
            prop_assert_eq!(ring.len(), since_clear.min(capacity));
            prop_assert_eq!(ring.is_full(), since_clear >= capacity);
        }
    }

    /// Filtering by severity partitions the snapshot.
    #[test]
    fn severity_filters_partition_snapshot(
        severities in prop::collection::vec(severity_strategy(), 0..40),
    ) {
        let ring = RingBufferSink::new(Severity::Debug, 16).unwrap();
        for severity in &severities {
            ring.accept(&Event::new(*severity, "x"));
        }

        let total: usize = Severity::ALL
            .iter()
            .map(|severity| ring.filter_by_severity(*severity).len())
            .sum();
        prop_assert_eq!(total, ring.snapshot().len());
    }
}
