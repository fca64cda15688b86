//! Fixed-Size Ring Buffer for Reading History
//!
//! ## Overview
//!
//! The conditioning pipeline keeps the last hour of adjusted readings for
//! rolling-average reporting, and the history aggregator keeps a parallel,
//! gap-aware history for its windows. Both are fixed-capacity ring buffers:
//! once full, each insertion overwrites the oldest slot.
//!
//! ### Memory Layout
//!
//! ```text
//! RingBuffer<f32, 5> after 7 pushes (values 1..=7):
//! ┌─────┬─────┬─────┬─────┬─────┐
//! │  6  │  7  │  3  │  4  │  5  │  ← physical slots
//! └─────┴─────┴─────┴─────┴─────┘
//!              ↑
//!              └── write_pos = 2, also the oldest entry
//!
//! Logical view (index 0 = oldest): [3, 4, 5, 6, 7]
//! ```
//!
//! Indices passed to [`RingBuffer::get`] are logical, so index 0 is always
//! the oldest value still held.
//!
//! ## Usage Example
//!
//! ```rust
//! use airguard_core::buffer::RingBuffer;
//!
//! let mut history: RingBuffer<f32, 3> = RingBuffer::new();
//! for v in [1.0, 2.0, 3.0, 4.0] {
//!     history.push(v);
//! }
//!
//! assert_eq!(history.get(0), Some(&2.0));
//! assert_eq!(history.last(), Some(&4.0));
//! assert_eq!(history.mean(), Some(3.0));
//! ```

/// Fixed-size circular buffer
///
/// ## Internal Invariants
///
/// - `write_pos < N` (next write position is always valid)
/// - `len <= N`
/// - iteration yields items oldest to newest
///
/// Not thread-safe; the node has a single control thread.
#[derive(Debug, Clone)]
pub struct RingBuffer<T: Copy, const N: usize> {
    /// Storage; `None` marks slots never written
    data: [Option<T>; N],

    /// Index where the next write will occur
    write_pos: usize,

    /// Current number of valid entries
    len: usize,
}

impl<T: Copy, const N: usize> RingBuffer<T, N> {
    /// Creates a new empty ring buffer
    pub const fn new() -> Self {
        Self {
            data: [None; N],
            write_pos: 0,
            len: 0,
        }
    }

    /// Adds a value, overwriting the oldest when full
    pub fn push(&mut self, value: T) {
        self.data[self.write_pos] = Some(value);
        self.write_pos = (self.write_pos + 1) % N;

        if self.len < N {
            self.len += 1;
        }
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Fixed capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// The most recent value
    pub fn last(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }

        let idx = if self.write_pos == 0 { N - 1 } else { self.write_pos - 1 };
        self.data[idx].as_ref()
    }

    /// Value by logical index (0 = oldest, len-1 = newest)
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }

        let actual_index = if self.len < N {
            index
        } else {
            // Full: the oldest value sits at write_pos
            (self.write_pos + index) % N
        };

        self.data[actual_index].as_ref()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> RingBufferIter<'_, T, N> {
        RingBufferIter {
            buffer: self,
            index: 0,
            end: self.len,
        }
    }

    /// Iterate over the newest `count` values, oldest of those first
    ///
    /// Asking for more than `len()` yields everything held.
    pub fn recent(&self, count: usize) -> RingBufferIter<'_, T, N> {
        RingBufferIter {
            buffer: self,
            index: self.len.saturating_sub(count),
            end: self.len,
        }
    }

    /// Clear all values
    pub fn clear(&mut self) {
        self.data = [None; N];
        self.write_pos = 0;
        self.len = 0;
    }
}

impl<const N: usize> RingBuffer<f32, N> {
    /// Arithmetic mean of everything held
    pub fn mean(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        Some(self.iter().sum::<f32>() / self.len as f32)
    }
}

/// Iterator over ring buffer contents
pub struct RingBufferIter<'a, T: Copy, const N: usize> {
    buffer: &'a RingBuffer<T, N>,
    index: usize,
    end: usize,
}

impl<'a, T: Copy, const N: usize> Iterator for RingBufferIter<'a, T, N> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.end {
            return None;
        }

        let item = self.buffer.get(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<'a, T: Copy, const N: usize> ExactSizeIterator for RingBufferIter<'a, T, N> {}

impl<T: Copy, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        let buffer: RingBuffer<f32, 5> = RingBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert!(buffer.last().is_none());
        assert!(buffer.mean().is_none());
    }

    #[test]
    fn wraps_after_capacity() {
        let mut buffer = RingBuffer::<f32, 120>::new();

        for i in 1..=130 {
            buffer.push(i as f32);
        }

        assert_eq!(buffer.len(), 120);
        assert!(buffer.is_full());
        // Slot 0 holds the 11th inserted value
        assert_eq!(buffer.get(0), Some(&11.0));
        assert_eq!(buffer.last(), Some(&130.0));

        let values: std::vec::Vec<f32> = buffer.iter().copied().collect();
        let expected: std::vec::Vec<f32> = (11..=130).map(|i| i as f32).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn recent_takes_suffix() {
        let mut buffer = RingBuffer::<u16, 4>::new();
        for i in 0..6 {
            buffer.push(i);
        }

        let last_two: std::vec::Vec<u16> = buffer.recent(2).copied().collect();
        assert_eq!(last_two, vec![4, 5]);

        let all: std::vec::Vec<u16> = buffer.recent(10).copied().collect();
        assert_eq!(all, vec![2, 3, 4, 5]);
    }

    #[test]
    fn mean_of_contents() {
        let mut buffer = RingBuffer::<f32, 4>::new();
        buffer.push(10.0);
        buffer.push(20.0);
        assert_eq!(buffer.mean(), Some(15.0));
    }

    #[test]
    fn clear_resets() {
        let mut buffer = RingBuffer::<f32, 3>::new();
        buffer.push(1.0);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.get(0), None);
    }
}
