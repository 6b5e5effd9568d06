// src/audio_io.rs

//! Microphone capture through cpal.
use crate::audio_device;
use crate::audio_input::{AudioInput, SampleHistory, StreamHandle};
use crate::error::{AudioError, AudioResult};
use crate::loudness::WINDOW_SIZE;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize, FromSample, HostId, Sample, SampleFormat, Stream, StreamConfig};
use ringbuf::{HeapConsumer, HeapProducer, HeapRb};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// How a capture stream is opened.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub host_id: HostId,
    pub sample_rate: Option<u32>,
    pub buffer_size: Option<u32>,
    /// Length of the sample history kept for reads, in seconds.
    pub history_seconds: f32,
}

struct ActiveCapture {
    handle: StreamHandle,
    stream: Stream,
    consumer: HeapConsumer<f32>,
    history: SampleHistory,
}

impl ActiveCapture {
    /// Moves everything the callback produced since the last read into the
    /// history.
    fn drain(&mut self) {
        let mut scratch = [0.0_f32; 1024];
        loop {
            let read = self.consumer.pop_slice(&mut scratch);
            if read == 0 {
                break;
            }
            self.history.push_slice(&scratch[..read]);
        }
    }
}

/// [`AudioInput`] backed by a real capture device.
pub struct CpalInput {
    options: CaptureOptions,
    active: Option<ActiveCapture>,
    /// Stream errors reported by the backend, logged on release.
    xrun_count: Arc<AtomicUsize>,
}

impl CpalInput {
    pub fn new(options: CaptureOptions) -> Self {
        Self {
            options,
            active: None,
            xrun_count: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl AudioInput for CpalInput {
    fn list_devices(&self) -> AudioResult<Vec<String>> {
        Ok(audio_device::get_input_devices(self.options.host_id)?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    fn start_capture(&mut self, device_name: &str) -> AudioResult<StreamHandle> {
        if self.active.is_some() {
            return Err(AudioError::DeviceBusy);
        }
        let device = audio_device::find_input_device(self.options.host_id, device_name)?;
        let default_config = device.default_input_config()?;
        let sample_format = default_config.sample_format();

        let mut config: StreamConfig = default_config.into();
        if let Some(sr) = self.options.sample_rate {
            config.sample_rate = cpal::SampleRate(sr);
        }
        if let Some(bs) = self.options.buffer_size {
            config.buffer_size = BufferSize::Fixed(bs);
        }
        let sample_rate = config.sample_rate.0;

        // One second of slack between the callback and the frame loop.
        let rb = HeapRb::<f32>::new(sample_rate.max(1) as usize);
        let (producer, consumer) = rb.split();
        let xrun_count = self.xrun_count.clone();

        let stream = match sample_format {
            SampleFormat::F32 => build_input_stream::<f32>(&device, &config, producer, xrun_count)?,
            SampleFormat::I16 => build_input_stream::<i16>(&device, &config, producer, xrun_count)?,
            SampleFormat::U16 => build_input_stream::<u16>(&device, &config, producer, xrun_count)?,
            format => return Err(AudioError::UnsupportedFormat(format.to_string())),
        };
        stream.play()?;

        let history_len =
            ((self.options.history_seconds.max(0.0) * sample_rate as f32) as usize).max(WINDOW_SIZE + 1);
        let handle = StreamHandle::next();
        info!(
            device = device_name,
            sample_rate,
            channels = config.channels,
            "started microphone capture"
        );
        self.active = Some(ActiveCapture {
            handle,
            stream,
            consumer,
            history: SampleHistory::new(history_len),
        });
        Ok(handle)
    }

    fn read_latest_samples(&mut self, handle: StreamHandle, count: usize) -> Option<Vec<f32>> {
        let capture = self.active.as_mut().filter(|a| a.handle == handle)?;
        capture.drain();
        capture.history.latest(count)
    }

    fn stop_capture(&mut self, handle: StreamHandle) {
        if self.active.as_ref().map(|a| a.handle) != Some(handle) {
            return;
        }
        if let Some(capture) = self.active.take() {
            if let Err(e) = capture.stream.pause() {
                debug!("pausing input stream before release failed: {}", e);
            }
            info!(
                stream_errors = self.xrun_count.load(Ordering::Relaxed),
                "stopped microphone capture"
            );
        }
    }
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut producer: HeapProducer<f32>,
    xrun_count: Arc<AtomicUsize>,
) -> AudioResult<Stream>
where
    T: Sample + cpal::SizedSample,
    f32: FromSample<T>,
{
    let err_fn = move |err| {
        error!("an error occurred on input stream: {}", err);
        xrun_count.fetch_add(1, Ordering::Relaxed);
    };
    let channels = config.channels.max(1) as usize;

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            for frame in data.chunks(channels) {
                let mono_sample =
                    frame.iter().map(|s| f32::from_sample(*s)).sum::<f32>() / (channels as f32);
                if producer.push(mono_sample).is_err() {
                    // buffer full, drop sample
                }
            }
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}
