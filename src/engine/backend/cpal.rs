//! CPAL-based audio backend for desktop platforms (Linux, macOS, Windows)
//!
//! On macOS CPAL drives a CoreAudio output unit, on Windows WASAPI and on
//! Linux ALSA. Most hosts only expose the device's own channel layout
//! (usually stereo), so the backend opens the stream with the device's
//! channel count at the requested rate, lets the engine render channel 0
//! into the front of the interleaved buffer and then copies it to every
//! channel in place.

use std::time::Duration;

use ::cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::{OutputBackend, OutputStream};
use crate::audio::{RenderCallback, StreamFormat};
use crate::error::AudioError;

/// How long CPAL may block while building a stream before giving up
const BUILD_TIMEOUT: Duration = Duration::from_secs(2);

/// What the default output device reports for the requested format
#[derive(Debug, Clone, PartialEq)]
pub struct OutputProbe {
    pub host: String,
    pub device: String,
    /// Channel count the engine would open at the requested rate, `None`
    /// when no f32 config covers it
    pub stream_channels: Option<u16>,
    /// Channel count of the device's default output config, if it has one
    pub default_channels: Option<u16>,
    /// Sample rate of the device's default output config, if it has one
    pub default_sample_rate: Option<u32>,
}

/// CPAL output backend using the default host
#[derive(Debug, Default)]
pub struct CpalBackend {
    _unit: (),
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn default_output_device() -> Result<(::cpal::Host, ::cpal::Device), AudioError> {
    let host = ::cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::DeviceUnavailable {
            reason: format!("No default output device found on host {:?}", host.id()),
        })?;
    Ok((host, device))
}

/// Pick the channel layout that carries the mono render buffer
///
/// Prefers the device's default channel count, then the narrowest f32
/// layout whose rate range covers `rate`. `None` when there is none.
fn select_output_channels(device: &::cpal::Device, rate: u32) -> Result<Option<u16>, AudioError> {
    let ranges: Vec<::cpal::SupportedStreamConfigRange> = device
        .supported_output_configs()
        .map_err(|e| AudioError::DeviceUnavailable {
            reason: format!("Failed to query supported output configs: {}", e),
        })?
        .filter(|range| {
            range.channels() > 0
                && range.sample_format() == ::cpal::SampleFormat::F32
                && range.min_sample_rate().0 <= rate
                && rate <= range.max_sample_rate().0
        })
        .collect();

    let preferred = device.default_output_config().ok().map(|c| c.channels());
    if let Some(channels) = preferred {
        if ranges.iter().any(|range| range.channels() == channels) {
            return Ok(Some(channels));
        }
    }

    Ok(ranges.iter().map(|range| range.channels()).min())
}

/// Copy the mono samples at the front of `data` to every channel
///
/// `data` is an interleaved buffer of `data.len() / channels` frames, one
/// sample per frame of which sits at the front of the buffer. Walks from the last frame back so
/// no sample is overwritten before it is read. Trailing samples that do not
/// make up a whole frame are zeroed.
fn spread_mono(data: &mut [f32], channels: usize) {
    if channels <= 1 {
        return;
    }

    let frames = data.len() / channels;
    for frame in (0..frames).rev() {
        let sample = data[frame];
        data[frame * channels..(frame + 1) * channels].fill(sample);
    }
    data[frames * channels..].fill(0.0);
}

/// Inspect the default output device without opening a stream
pub fn probe_default_output(format: &StreamFormat) -> Result<OutputProbe, AudioError> {
    let (host, device) = default_output_device()?;
    let device_name = device.name().unwrap_or_else(|_| "<unknown>".to_string());
    let stream_channels = select_output_channels(&device, format.sample_rate_hz())?;
    let default_config = device.default_output_config().ok();

    Ok(OutputProbe {
        host: format!("{:?}", host.id()),
        device: device_name,
        stream_channels,
        default_channels: default_config.as_ref().map(|c| c.channels()),
        default_sample_rate: default_config.as_ref().map(|c| c.sample_rate().0),
    })
}

impl OutputBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn open_output(
        &self,
        format: &StreamFormat,
        buffer_frames: Option<u32>,
        render: RenderCallback,
    ) -> Result<Box<dyn OutputStream>, AudioError> {
        let (host, device) = default_output_device()?;
        let rate = format.sample_rate_hz();

        log::debug!(
            "[cpal] Default output device on {:?}: {}",
            host.id(),
            device.name().unwrap_or_else(|_| "<unknown>".to_string())
        );

        if format.sample_rate().fract() != 0.0 {
            log::debug!(
                "[cpal] Rounding sample rate {} Hz to {} Hz",
                format.sample_rate(),
                rate
            );
        }

        let channels = select_output_channels(&device, rate)?.ok_or_else(|| {
            AudioError::UnsupportedFormat {
                reason: format!("Default output device has no f32 config at {} Hz", rate),
            }
        })?;

        let stream_config = ::cpal::StreamConfig {
            channels,
            sample_rate: ::cpal::SampleRate(rate),
            buffer_size: match buffer_frames {
                Some(frames) => ::cpal::BufferSize::Fixed(frames),
                None => ::cpal::BufferSize::Default,
            },
        };

        let mut render = render;
        let width = usize::from(channels);
        let err_fn = |err: ::cpal::StreamError| {
            log::error!("[cpal] Output stream error: {}", err);
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &::cpal::OutputCallbackInfo| {
                    // data.len() = frames * channels
                    let frames = data.len() / width;
                    render(&mut data[..frames]);
                    spread_mono(data, width);
                },
                err_fn,
                Some(BUILD_TIMEOUT),
            )
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("{}", e),
            })?;

        // Some hosts start a stream as soon as it is built.
        if let Err(e) = stream.pause() {
            log::warn!(
                "[cpal] Could not pause freshly built stream ({}); render gate keeps it silent",
                e
            );
        }

        log::info!(
            "[cpal] Output stream ready: {} Hz, mono rendered to {} device channel(s), buffer {:?}",
            rate,
            channels,
            stream_config.buffer_size
        );

        Ok(Box::new(CpalOutputStream { stream }))
    }
}

/// Opened CPAL stream; dropping it closes the device
struct CpalOutputStream {
    stream: ::cpal::Stream,
}

impl OutputStream for CpalOutputStream {
    fn play(&mut self) -> Result<(), AudioError> {
        self.stream.play().map_err(|e| AudioError::HardwareError {
            details: format!("Output start failed: {}", e),
        })
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.stream.pause().map_err(|e| AudioError::HardwareError {
            details: format!("Output stop failed: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spread_mono_fills_every_channel() {
        let mut data = vec![1.0, 2.0, 3.0, -9.0, -9.0, -9.0];
        spread_mono(&mut data, 2);
        assert_eq!(data, vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_spread_mono_wide_layout() {
        let mut data = vec![0.5, -0.25, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0];
        spread_mono(&mut data, 4);
        assert_eq!(data, vec![0.5, 0.5, 0.5, 0.5, -0.25, -0.25, -0.25, -0.25]);
    }

    #[test]
    fn test_spread_mono_leaves_mono_untouched() {
        let mut data = vec![0.1, 0.2, 0.3];
        spread_mono(&mut data, 1);
        assert_eq!(data, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_spread_mono_zeroes_partial_frame() {
        let mut data = vec![0.75, 0.5, 9.0, 9.0, 9.0];
        spread_mono(&mut data, 2);
        assert_eq!(data, vec![0.75, 0.75, 0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_spread_mono_empty_buffer() {
        let mut data: Vec<f32> = Vec::new();
        spread_mono(&mut data, 2);
        assert!(data.is_empty());
    }
}
