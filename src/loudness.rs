// src/loudness.rs

//! Instantaneous loudness of a sample window.

/// Number of samples the actuator looks at every frame.
pub const WINDOW_SIZE: usize = 128;

/// Mean absolute amplitude of `window`. An empty window is silent.
#[inline]
pub fn mean_abs(window: &[f32]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let sum: f32 = window.iter().map(|s| s.abs()).sum();
    sum / window.len() as f32
}

/// Loudness as the gate sees it: mean absolute amplitude times the
/// sensitivity gain.
///
/// `None` means the input could not provide a full window yet (the capture
/// ring has not filled up); that reads as silence.
#[inline]
pub fn loudness(window: Option<&[f32]>, sensitivity: f32) -> f32 {
    match window {
        Some(samples) => mean_abs(samples) * sensitivity,
        None => 0.0,
    }
}
