//! Length-counting framer for the board's byte stream.
//!
//! The board protocol has no delimiters: the host knows how long each
//! response will be because it knows which command it sent. The framer keeps
//! a FIFO of expectations, each an expected length plus a caller-chosen tag,
//! and cuts the incoming byte stream into frames of exactly those lengths.
//!
//! # Framing
//!
//! ```text
//! pending: [(8, Serial), (5, Version), (67, Dump)]
//!
//!  backlog ──► take 8 ──► Frame(Serial)
//!          ──► take 5 ──► Frame(Version)
//!          ──► take 67 ─► Frame(Dump)
//! ```
//!
//! Frames complete strictly in the order their expectations were queued.
//! Zero-length expectations complete at once, without waiting for the ones
//! ahead of them. Bytes that arrive with nothing pending stay in the backlog
//! until an expectation claims them.
//!
//! # Usage
//!
//! ```
//! use boardsync_protocol::FrameQueue;
//!
//! let mut queue = FrameQueue::new();
//! queue.enqueue(2, "first");
//! queue.enqueue(3, "second");
//!
//! queue.feed(&[1, 2, 3]);
//! let frame = queue.next_frame().unwrap();
//! assert_eq!(frame.tag, "first");
//! assert_eq!(&frame.payload[..], &[1, 2]);
//!
//! queue.feed(&[4, 5]);
//! let frame = queue.next_frame().unwrap();
//! assert_eq!(frame.tag, "second");
//! assert_eq!(&frame.payload[..], &[3, 4, 5]);
//! ```

use bytes::{Bytes, BytesMut};
use std::collections::VecDeque;
use tracing::trace;

/// Initial backlog capacity; a full board dump fits without reallocation.
const INITIAL_BUFFER_CAPACITY: usize = 128;

/// Initial capacity of the expectation and ready queues.
const INITIAL_QUEUE_CAPACITY: usize = 4;

/// A complete frame and the tag of the expectation it satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<T> {
    pub tag: T,
    pub payload: Bytes,
}

#[derive(Debug)]
struct Expectation<T> {
    len: usize,
    tag: T,
}

/// FIFO of expected frame lengths over a byte backlog.
#[derive(Debug)]
pub struct FrameQueue<T> {
    /// Bytes received but not yet claimed by an expectation.
    backlog: BytesMut,

    /// Expectations waiting for bytes, oldest first.
    pending: VecDeque<Expectation<T>>,

    /// Completed frames not yet taken by the caller.
    ready: VecDeque<Frame<T>>,
}

impl<T> FrameQueue<T> {
    pub fn new() -> Self {
        Self {
            backlog: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            pending: VecDeque::with_capacity(INITIAL_QUEUE_CAPACITY),
            ready: VecDeque::with_capacity(INITIAL_QUEUE_CAPACITY),
        }
    }

    /// Expect a frame of `len` bytes, tagged with `tag`.
    ///
    /// A zero-length expectation completes immediately with an empty
    /// payload. Otherwise the expectation is queued behind any already
    /// pending ones, and may complete at once if the backlog already holds
    /// enough bytes.
    pub fn enqueue(&mut self, len: usize, tag: T) {
        if len == 0 {
            self.ready.push_back(Frame {
                tag,
                payload: Bytes::new(),
            });
            return;
        }

        self.pending.push_back(Expectation { len, tag });
        self.drain_backlog();
    }

    /// Append bytes from the transport and cut any frames they complete.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.backlog.extend_from_slice(bytes);
        self.drain_backlog();
    }

    /// Take the oldest completed frame.
    pub fn next_frame(&mut self) -> Option<Frame<T>> {
        self.ready.pop_front()
    }

    /// Iterator over all completed frames, oldest first.
    pub fn drain_frames(&mut self) -> DrainFrames<'_, T> {
        DrainFrames { queue: self }
    }

    pub fn frames_available(&self) -> usize {
        self.ready.len()
    }

    /// Number of expectations still waiting for bytes.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Bytes received but not yet claimed.
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Drop the backlog, all expectations and all completed frames.
    pub fn clear(&mut self) {
        self.backlog.clear();
        self.pending.clear();
        self.ready.clear();
    }

    fn drain_backlog(&mut self) {
        while let Some(head) = self.pending.front() {
            if self.backlog.len() < head.len {
                break;
            }
            let len = head.len;
            let payload = self.backlog.split_to(len).freeze();
            if let Some(Expectation { tag, .. }) = self.pending.pop_front() {
                trace!(len, remaining = self.backlog.len(), "Frame complete");
                self.ready.push_back(Frame { tag, payload });
            }
        }
    }
}

impl<T> Default for FrameQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`FrameQueue::drain_frames`].
pub struct DrainFrames<'a, T> {
    queue: &'a mut FrameQueue<T>,
}

impl<T> Iterator for DrainFrames<'_, T> {
    type Item = Frame<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.next_frame()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.queue.frames_available();
        (len, Some(len))
    }
}

impl<T> ExactSizeIterator for DrainFrames<'_, T> {
    fn len(&self) -> usize {
        self.queue.frames_available()
    }
}
