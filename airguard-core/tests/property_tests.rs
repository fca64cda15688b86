//! Property-based tests for the decoder, pipeline and history
//!
//! Uses proptest to throw arbitrary serial noise and value sequences at the
//! components and check the guarantees that must hold for every input.

#![cfg(test)]

mod common;

use proptest::prelude::*;

use airguard_core::buffer::RingBuffer;
use airguard_core::constants::{FRAME_LEN, MAX_BATCH_FRAMES};
use airguard_core::frame::decode;
use airguard_core::pipeline::{reduce, select, ConditioningPipeline, Reading};
use airguard_core::smoothing::{Adjustment, Smoothing};

use common::frames;

proptest! {
    #[test]
    fn decoder_accounts_for_every_stride(bytes in prop::collection::vec(any::<u8>(), 0..1024)) {
        let batch = decode(&bytes);
        let report = &batch.report;

        prop_assert_eq!(
            batch.values.len() + report.overflowed + report.bad_magic + report.bad_checksum,
            bytes.len() / FRAME_LEN
        );
        prop_assert_eq!(report.partial_at.is_some(), bytes.len() % FRAME_LEN != 0);
    }

    #[test]
    fn decoder_keeps_most_recent_frames(values in prop::collection::vec(any::<u16>(), 0..64)) {
        let batch = decode(&frames(&values));

        let kept = values.len().min(MAX_BATCH_FRAMES);
        prop_assert_eq!(batch.values.as_slice(), &values[values.len() - kept..]);
        prop_assert!(batch.report.is_clean());
    }

    #[test]
    fn reduction_stays_within_retained_range(values in prop::collection::vec(any::<u16>(), 3..40)) {
        let retained = select(&values);
        let reduced = reduce(&retained).unwrap();

        prop_assert!(retained.len() <= 6);
        prop_assert!(reduced >= f32::from(retained[0]));
        prop_assert!(reduced <= f32::from(retained[retained.len() - 1]));
    }

    #[test]
    fn readings_are_never_negative(
        bursts in prop::collection::vec(prop::collection::vec(0u16..200, 0..8), 1..30),
        add in -50.0f32..50.0,
        mul in 0.0f32..2.0,
        alpha in 0.0f32..0.99,
    ) {
        let mut pipeline = ConditioningPipeline::new(
            Adjustment::new(Some(add), Some(mul)),
            Smoothing::Exponential(alpha),
        );

        for burst in &bursts {
            match pipeline.process(burst) {
                Reading::Value(v) => prop_assert!(v >= 0.0 && v.is_finite()),
                Reading::Absent(_) => prop_assert_eq!(pipeline.last_adjusted(), None),
            }
        }
    }

    #[test]
    fn ring_buffer_holds_last_n(inserts in prop::collection::vec(any::<u32>(), 0..300)) {
        let mut buffer: RingBuffer<u32, 120> = RingBuffer::new();
        for &v in &inserts {
            buffer.push(v);
        }

        let kept = inserts.len().min(120);
        let held: Vec<u32> = buffer.iter().copied().collect();
        prop_assert_eq!(held.as_slice(), &inserts[inserts.len() - kept..]);
        prop_assert_eq!(buffer.last().copied(), inserts.last().copied());
    }
}
