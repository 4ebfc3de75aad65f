//! Rolling per-channel sample storage.
//!
//! Each channel keeps the most recent `W` samples. Once a buffer is full,
//! every append evicts the oldest sample so the window slides forward one
//! reading at a time.

use crate::core::channel::{Channel, CHANNEL_COUNT};
use std::collections::VecDeque;

/// Default window size (3 seconds at 50 Hz).
pub const DEFAULT_WINDOW_SIZE: usize = 150;

/// Fixed-capacity FIFO window over a single channel.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SampleBuffer {
    /// Create an empty buffer holding at most `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "sample buffer capacity must be non-zero");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append the newest sample, evicting the oldest one if the buffer is full.
    pub fn append(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recently appended sample.
    pub fn last(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Current contents, oldest to newest.
    ///
    /// Before the buffer is full this is the shorter, partially-filled
    /// sequence.
    pub fn snapshot(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// One [`SampleBuffer`] per channel, all sharing the same window size.
#[derive(Debug, Clone)]
pub struct ChannelBuffers {
    buffers: [SampleBuffer; CHANNEL_COUNT],
}

impl ChannelBuffers {
    pub fn new(window_size: usize) -> Self {
        Self {
            buffers: std::array::from_fn(|_| SampleBuffer::new(window_size)),
        }
    }

    /// Append an accelerometer reading, deriving the norm channel.
    pub fn push_acceleration(&mut self, x: f64, y: f64, z: f64) {
        let norm = x.hypot(y).hypot(z);
        self.buffers[Channel::AccelX.index()].append(x);
        self.buffers[Channel::AccelY.index()].append(y);
        self.buffers[Channel::AccelZ.index()].append(z);
        self.buffers[Channel::AccelNorm.index()].append(norm);
    }

    /// Append a gyroscope reading.
    pub fn push_rotation(&mut self, x: f64, y: f64, z: f64) {
        self.buffers[Channel::GyroX.index()].append(x);
        self.buffers[Channel::GyroY.index()].append(y);
        self.buffers[Channel::GyroZ.index()].append(z);
    }

    /// True once every channel holds a full window.
    pub fn all_full(&self) -> bool {
        self.buffers.iter().all(SampleBuffer::is_full)
    }

    pub fn get(&self, channel: Channel) -> &SampleBuffer {
        &self.buffers[channel.index()]
    }

    pub fn window_size(&self) -> usize {
        self.buffers[0].capacity()
    }

    /// Buffers paired with their channel, in feature-vector order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &SampleBuffer)> {
        Channel::ALL.iter().copied().zip(self.buffers.iter())
    }

    pub fn clear(&mut self) {
        for buffer in &mut self.buffers {
            buffer.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_grows_until_full() {
        let mut buffer = SampleBuffer::new(5);
        for i in 0..12 {
            buffer.append(i as f64);
            assert_eq!(buffer.len(), (i + 1).min(5));
            assert_eq!(buffer.snapshot().len(), (i + 1).min(5));
            assert_eq!(buffer.is_full(), i + 1 >= 5);
        }
    }

    #[test]
    fn test_buffer_evicts_oldest_first() {
        let mut buffer = SampleBuffer::new(3);
        buffer.append(1.0);
        buffer.append(2.0);
        buffer.append(3.0);
        assert_eq!(buffer.snapshot(), vec![1.0, 2.0, 3.0]);

        buffer.append(4.0);
        assert_eq!(buffer.snapshot(), vec![2.0, 3.0, 4.0]);

        buffer.append(5.0);
        assert_eq!(buffer.snapshot(), vec![3.0, 4.0, 5.0]);
        assert_eq!(buffer.last(), Some(5.0));
    }

    #[test]
    fn test_fifo_over_long_stream() {
        let mut buffer = SampleBuffer::new(150);
        for i in 0..1000 {
            buffer.append(i as f64);
        }
        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.len(), 150);
        let expected: Vec<f64> = (850..1000).map(|i| i as f64).collect();
        assert_eq!(snapshot, expected);
    }

    #[test]
    fn test_partial_snapshot() {
        let mut buffer = SampleBuffer::new(4);
        buffer.append(7.0);
        buffer.append(8.0);
        assert!(!buffer.is_full());
        assert_eq!(buffer.snapshot(), vec![7.0, 8.0]);
    }

    #[test]
    #[should_panic]
    fn test_zero_capacity_rejected() {
        let _ = SampleBuffer::new(0);
    }

    #[test]
    fn test_acceleration_derives_norm() {
        let mut buffers = ChannelBuffers::new(2);
        buffers.push_acceleration(3.0, 4.0, 0.0);
        assert_eq!(buffers.get(Channel::AccelNorm).last(), Some(5.0));
        assert!(buffers.get(Channel::GyroX).is_empty());
    }

    #[test]
    fn test_norm_of_huge_components_stays_finite() {
        let mut buffers = ChannelBuffers::new(1);
        buffers.push_acceleration(3e200, 4e200, 0.0);
        let norm = buffers.get(Channel::AccelNorm).last().unwrap();
        assert!(norm.is_finite());
        assert!((norm / 5e200 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_full_requires_both_sensors() {
        let mut buffers = ChannelBuffers::new(2);
        buffers.push_acceleration(0.0, 0.0, 1.0);
        buffers.push_acceleration(0.0, 0.0, 1.0);
        assert!(!buffers.all_full());

        buffers.push_rotation(0.1, 0.2, 0.3);
        assert!(!buffers.all_full());
        buffers.push_rotation(0.1, 0.2, 0.3);
        assert!(buffers.all_full());

        buffers.clear();
        assert!(!buffers.all_full());
    }
}
