// src/error.rs

//! Error types shared by the audio input and the actuator.
use thiserror::Error;

/// Failures raised by an [`AudioInput`](crate::audio_input::AudioInput) backend.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("input device not found: {0}")]
    DeviceNotFound(String),

    /// A capture is already running on this input.
    #[error("audio input is already capturing")]
    DeviceBusy,

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Anything the host audio API itself complained about.
    #[error("audio backend error: {0}")]
    Backend(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

/// Failures raised while setting up a
/// [`VolumeGatedActuator`](crate::actuator::VolumeGatedActuator).
///
/// None of these stop the host: the actuator logs them and stays inert.
#[derive(Error, Debug)]
pub enum ActuatorError {
    #[error("no audio capture device available")]
    DeviceUnavailable,

    #[error("invalid actuator configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Audio(#[from] AudioError),
}

pub type AudioResult<T> = Result<T, AudioError>;
pub type ActuatorResult<T> = Result<T, ActuatorError>;

macro_rules! backend_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for AudioError {
                fn from(err: $ty) -> Self {
                    AudioError::Backend(err.to_string())
                }
            }
        )*
    };
}

backend_error!(
    cpal::DevicesError,
    cpal::DeviceNameError,
    cpal::DefaultStreamConfigError,
    cpal::BuildStreamError,
    cpal::PlayStreamError,
    cpal::HostUnavailable,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_errors_convert_into_actuator_errors() {
        let err: ActuatorError = AudioError::DeviceBusy.into();
        assert!(matches!(err, ActuatorError::Audio(AudioError::DeviceBusy)));
        assert_eq!(err.to_string(), "audio input is already capturing");
    }

    #[test]
    fn backend_errors_keep_their_message() {
        let err: AudioError = cpal::HostUnavailable.into();
        assert!(matches!(err, AudioError::Backend(_)));
        assert!(err.to_string().starts_with("audio backend error:"));
    }
}
