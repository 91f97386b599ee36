//! Oboe-based audio backend for Android (AAudio/OpenSL ES)
//!
//! Opens a low-latency mono f32 output stream and forwards each
//! `on_audio_ready` to the engine's render callback.

use ::oboe::{
    AudioOutputCallback, AudioOutputStreamSafe, AudioStream, AudioStreamAsync,
    AudioStreamBuilder, DataCallbackResult, Mono, Output, PerformanceMode, SharingMode,
};

use super::{OutputBackend, OutputStream};
use crate::audio::{RenderCallback, StreamFormat};
use crate::error::AudioError;

/// Android backend that opens Oboe output streams.
#[derive(Debug, Default)]
pub struct OboeBackend {
    _unit: (),
}

impl OboeBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Adapts the engine render callback to Oboe's callback trait
///
/// Runs on the Oboe real-time thread: no allocations, no locks.
struct RenderAdapter {
    render: RenderCallback,
}

impl AudioOutputCallback for RenderAdapter {
    type FrameType = (f32, Mono);

    fn on_audio_ready(
        &mut self,
        _stream: &mut dyn AudioOutputStreamSafe,
        frames: &mut [f32],
    ) -> DataCallbackResult {
        (self.render)(frames);
        DataCallbackResult::Continue
    }
}

impl OutputBackend for OboeBackend {
    fn name(&self) -> &'static str {
        "oboe"
    }

    fn open_output(
        &self,
        format: &StreamFormat,
        buffer_frames: Option<u32>,
        render: RenderCallback,
    ) -> Result<Box<dyn OutputStream>, AudioError> {
        let sample_rate = i32::try_from(format.sample_rate_hz()).map_err(|_| {
            AudioError::InvalidSampleRate {
                sample_rate: format.sample_rate(),
            }
        })?;

        let mut builder = AudioStreamBuilder::default()
            .set_performance_mode(PerformanceMode::LowLatency)
            .set_sharing_mode(SharingMode::Shared)
            .set_direction::<Output>()
            .set_sample_rate(sample_rate)
            .set_channel_count::<Mono>()
            .set_format::<f32>();

        if let Some(frames) = buffer_frames {
            let frames = i32::try_from(frames)
                .map_err(|_| AudioError::StreamOpenFailed {
                    reason: format!("Frames per callback {} exceeds Oboe's range", frames),
                })?;
            builder = builder.set_frames_per_callback(frames);
        }

        let stream = builder
            .set_callback(RenderAdapter { render })
            .open_stream()
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("Output stream: {:?}", e),
            })?;

        log::info!(
            "[oboe] Output stream ready: {} Hz mono f32",
            format.sample_rate_hz()
        );

        Ok(Box::new(OboeOutputStream { stream }))
    }
}

struct OboeOutputStream {
    stream: AudioStreamAsync<Output, RenderAdapter>,
}

impl OutputStream for OboeOutputStream {
    fn play(&mut self) -> Result<(), AudioError> {
        self.stream.start().map_err(|e| AudioError::HardwareError {
            details: format!("Failed to start output stream: {:?}", e),
        })
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.stream.stop().map_err(|e| AudioError::HardwareError {
            details: format!("Failed to stop output stream: {:?}", e),
        })
    }
}
