//! Property-based tests for the framer and field update codec.
//!
//! The central property: however the transport chops a stream into chunks,
//! the framer produces the same frames in the same order.

use boardsync_core::{Cell, Square};
use boardsync_protocol::{FieldUpdate, FrameQueue, decode_piece, encode_piece};
use proptest::prelude::*;

/// Strategy for a list of expected frame lengths (zero allowed).
fn frame_lengths() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..80, 1..12)
}

/// Strategy for chunk split points, as fractions of the stream length.
fn split_points() -> impl Strategy<Value = Vec<prop::sample::Index>> {
    prop::collection::vec(any::<prop::sample::Index>(), 0..20)
}

fn run_framer(lengths: &[usize], stream: &[u8], cuts: &[usize]) -> Vec<(usize, Vec<u8>)> {
    let mut queue = FrameQueue::new();
    for (i, len) in lengths.iter().enumerate() {
        queue.enqueue(*len, i);
    }

    let mut frames = Vec::new();
    let mut start = 0;
    for &cut in cuts.iter().chain(std::iter::once(&stream.len())) {
        queue.feed(&stream[start..cut]);
        start = cut;
        frames.extend(queue.drain_frames().map(|f| (f.tag, f.payload.to_vec())));
    }
    frames
}

proptest! {
    /// Property: chunking never changes the frames or their payloads.
    #[test]
    fn prop_chunking_invariance(
        lengths in frame_lengths(),
        seed in any::<u8>(),
        splits in split_points(),
    ) {
        let total: usize = lengths.iter().sum();
        let stream: Vec<u8> = (0..total).map(|i| (i as u8).wrapping_add(seed)).collect();

        let mut cuts: Vec<usize> = splits.iter().map(|ix| ix.index(total + 1)).collect();
        cuts.sort_unstable();

        let whole = run_framer(&lengths, &stream, &[]);
        let chunked = run_framer(&lengths, &stream, &cuts);

        prop_assert_eq!(&whole, &chunked);
        prop_assert_eq!(whole.len(), lengths.len());

        // Non-empty frames complete in FIFO order with exactly their length.
        let nonempty: Vec<_> = whole.iter().filter(|(_, p)| !p.is_empty()).collect();
        for pair in nonempty.windows(2) {
            prop_assert!(pair[0].0 < pair[1].0);
        }
        for (tag, payload) in &whole {
            prop_assert_eq!(payload.len(), lengths[*tag]);
        }
    }

    /// Property: every field update survives encoding.
    #[test]
    fn prop_field_update_roundtrip(index in 0u8..64, code in 0u8..13) {
        let update = FieldUpdate::new(Square::new(index).unwrap(), decode_piece(code));
        let decoded = FieldUpdate::decode(&update.encode()).unwrap();
        prop_assert_eq!(decoded, update);
    }

    /// Property: the piece table is total; unknown codes are empty.
    #[test]
    fn prop_piece_codes_total(code in any::<u8>()) {
        let cell = decode_piece(code);
        if code <= 12 {
            prop_assert_eq!(encode_piece(cell), code);
        } else {
            prop_assert_eq!(cell, Cell::Empty);
        }
    }
}
