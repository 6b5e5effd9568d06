// src/replay.rs

//! A WAV file standing in for the microphone.
//!
//! The file is played back in a loop against wall-clock time, so the frame
//! loop sees the same "latest samples" view it would get from a live
//! capture.
use crate::audio_input::{AudioInput, StreamHandle};
use crate::error::{AudioError, AudioResult};
use hound::{SampleFormat, WavReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// Decoded mono audio.
#[derive(Debug, Clone, PartialEq)]
pub struct MonoClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl MonoClip {
    /// Number of samples the clip has played after `elapsed`.
    pub fn playhead(&self, elapsed: Duration) -> u64 {
        (elapsed.as_secs_f64() * self.sample_rate as f64) as u64
    }

    /// The `count` samples before the one under `playhead`, looping over
    /// the clip. `None` until `count + 1` samples have played.
    pub fn window_at(&self, playhead: u64, count: usize) -> Option<Vec<f32>> {
        if self.samples.is_empty() || playhead < count as u64 + 1 {
            return None;
        }
        let len = self.samples.len() as u64;
        let start = playhead - count as u64 - 1;
        Some(
            (0..count as u64)
                .map(|i| self.samples[((start + i) % len) as usize])
                .collect(),
        )
    }
}

/// Reads a WAV file, mixes it down to mono and normalises integer formats
/// to `[-1.0, 1.0]`.
pub fn decode_wav(path: &Path) -> AudioResult<MonoClip> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };
    let channels = spec.channels.max(1) as usize;
    let samples = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok(MonoClip {
        samples,
        sample_rate: spec.sample_rate,
    })
}

struct Playback {
    handle: StreamHandle,
    clip: MonoClip,
    started: Instant,
}

/// [`AudioInput`] exposing a single device: the WAV file.
pub struct WavReplayInput {
    path: PathBuf,
    active: Option<Playback>,
}

impl WavReplayInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            active: None,
        }
    }

    /// Device name the file is listed under.
    pub fn device_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl AudioInput for WavReplayInput {
    fn list_devices(&self) -> AudioResult<Vec<String>> {
        if self.path.is_file() {
            Ok(vec![self.device_name()])
        } else {
            Ok(Vec::new())
        }
    }

    fn start_capture(&mut self, device: &str) -> AudioResult<StreamHandle> {
        if self.active.is_some() {
            return Err(AudioError::DeviceBusy);
        }
        if device != self.device_name() {
            return Err(AudioError::DeviceNotFound(device.to_string()));
        }
        let clip = decode_wav(&self.path)?;
        info!(
            file = %self.path.display(),
            samples = clip.samples.len(),
            sample_rate = clip.sample_rate,
            "replaying WAV file as audio input"
        );
        let handle = StreamHandle::next();
        self.active = Some(Playback {
            handle,
            clip,
            started: Instant::now(),
        });
        Ok(handle)
    }

    fn read_latest_samples(&mut self, handle: StreamHandle, count: usize) -> Option<Vec<f32>> {
        let playback = self.active.as_ref().filter(|p| p.handle == handle)?;
        let playhead = playback.clip.playhead(playback.started.elapsed());
        playback.clip.window_at(playhead, count)
    }

    fn stop_capture(&mut self, handle: StreamHandle) {
        if self.active.as_ref().map(|p| p.handle) == Some(handle) {
            self.active = None;
            info!("stopped WAV replay");
        }
    }
}
