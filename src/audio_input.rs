// src/audio_input.rs

//! The audio input seam the actuator reads from, plus the sample history
//! every backend keeps its recent samples in.
use crate::error::AudioResult;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one running capture on an [`AudioInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamHandle(u64);

impl StreamHandle {
    /// Hands out a handle that no other capture in this process has used.
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        StreamHandle(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A capture device enumerator and latest-samples reader.
///
/// Implementations hold at most one running capture. Starting a second one
/// fails with [`AudioError::DeviceBusy`](crate::error::AudioError::DeviceBusy).
pub trait AudioInput {
    /// Names of the devices a capture can be started on.
    fn list_devices(&self) -> AudioResult<Vec<String>>;

    fn start_capture(&mut self, device: &str) -> AudioResult<StreamHandle>;

    /// The `count` most recent mono samples, oldest first, or `None` while
    /// the capture has not produced enough of them yet.
    fn read_latest_samples(&mut self, handle: StreamHandle, count: usize) -> Option<Vec<f32>>;

    /// Stops the capture and releases the device. Unknown or already
    /// stopped handles are ignored.
    fn stop_capture(&mut self, handle: StreamHandle);
}

impl<T: AudioInput + ?Sized> AudioInput for Box<T> {
    fn list_devices(&self) -> AudioResult<Vec<String>> {
        (**self).list_devices()
    }

    fn start_capture(&mut self, device: &str) -> AudioResult<StreamHandle> {
        (**self).start_capture(device)
    }

    fn read_latest_samples(&mut self, handle: StreamHandle, count: usize) -> Option<Vec<f32>> {
        (**self).read_latest_samples(handle, count)
    }

    fn stop_capture(&mut self, handle: StreamHandle) {
        (**self).stop_capture(handle)
    }
}

/// Fixed-size circular store of the most recent mono samples.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    buffer: Vec<f32>,
    write_pos: usize,
    written: u64,
}

impl SampleHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write_pos: 0,
            written: 0,
        }
    }

    /// Total samples pushed since creation.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn push(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        self.written += 1;
    }

    pub fn push_slice(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.push(sample);
        }
    }

    /// The `count` samples written just before the newest one.
    ///
    /// The newest sample is skipped because a backend may still be writing
    /// its block. Until `count + 1` samples exist this returns `None`.
    pub fn latest(&self, count: usize) -> Option<Vec<f32>> {
        let cap = self.buffer.len();
        if count + 1 > cap || self.written < count as u64 + 1 {
            return None;
        }
        let start = (self.write_pos + cap - 1 - count) % cap;
        Some((0..count).map(|i| self.buffer[(start + i) % cap]).collect())
    }
}
