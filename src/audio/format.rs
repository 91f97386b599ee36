//! Stream format negotiated with the output device
//!
//! The engine only ever asks for one layout: linear PCM, 32-bit IEEE float,
//! one channel, non-interleaved, packed. The sample rate is the only free
//! parameter.

use crate::error::AudioError;

/// Size of one sample in bytes
pub const BYTES_PER_SAMPLE: u32 = std::mem::size_of::<f32>() as u32;

/// Highest whole-Hz rate every host API can carry (they take `i32` or `u32`)
pub const MAX_SAMPLE_RATE_HZ: u32 = i32::MAX as u32;

/// Description of the output stream format
///
/// Mirrors the fields an audio framework expects in a stream description.
/// Construct it with [`StreamFormat::mono_f32`]; there is no way to build a
/// multi-channel or integer format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamFormat {
    sample_rate: f64,
    channels: u16,
    bits_per_sample: u32,
    interleaved: bool,
    packed: bool,
}

impl StreamFormat {
    /// Mono 32-bit float format at `sample_rate` Hz
    ///
    /// # Errors
    /// Returns [`AudioError::InvalidSampleRate`] if the rate is not finite or
    /// does not round to `1..=MAX_SAMPLE_RATE_HZ`.
    pub fn mono_f32(sample_rate: f64) -> Result<Self, AudioError> {
        let rounded = sample_rate.round();
        if !sample_rate.is_finite() || rounded < 1.0 || rounded > f64::from(MAX_SAMPLE_RATE_HZ) {
            return Err(AudioError::InvalidSampleRate { sample_rate });
        }

        Ok(Self {
            sample_rate,
            channels: 1,
            bits_per_sample: BYTES_PER_SAMPLE * 8,
            interleaved: false,
            packed: true,
        })
    }

    /// Build the format for a requested channel count
    ///
    /// Mono is the only layout the engine renders, so any other count is
    /// rejected up front instead of silently dropping channels.
    pub fn for_channels(sample_rate: f64, channels: u16) -> Result<Self, AudioError> {
        if channels != 1 {
            return Err(AudioError::UnsupportedChannelCount { channels });
        }
        Self::mono_f32(sample_rate)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Sample rate rounded to whole Hz, for hosts that only take integers
    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate.round() as u32
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn bits_per_sample(&self) -> u32 {
        self.bits_per_sample
    }

    pub fn is_interleaved(&self) -> bool {
        self.interleaved
    }

    pub fn is_packed(&self) -> bool {
        self.packed
    }

    pub fn is_float(&self) -> bool {
        true
    }

    pub fn frames_per_packet(&self) -> u32 {
        1
    }

    /// Bytes per frame of one channel buffer (non-interleaved layout)
    pub fn bytes_per_frame(&self) -> u32 {
        BYTES_PER_SAMPLE
    }

    pub fn bytes_per_packet(&self) -> u32 {
        self.bytes_per_frame() * self.frames_per_packet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_f32_layout() {
        let format = StreamFormat::mono_f32(44_100.0).unwrap();
        assert_eq!(format.sample_rate(), 44_100.0);
        assert_eq!(format.channels(), 1);
        assert_eq!(format.bits_per_sample(), 32);
        assert!(format.is_float());
        assert!(format.is_packed());
        assert!(!format.is_interleaved());
        assert_eq!(format.frames_per_packet(), 1);
        assert_eq!(format.bytes_per_frame(), 4);
        assert_eq!(format.bytes_per_packet(), 4);
    }

    #[test]
    fn test_invalid_sample_rates_rejected() {
        for rate in [0.0, -44_100.0, f64::NAN, f64::INFINITY] {
            let err = StreamFormat::mono_f32(rate).unwrap_err();
            assert!(matches!(err, AudioError::InvalidSampleRate { .. }));
        }
    }

    #[test]
    fn test_rates_outside_whole_hz_range_rejected() {
        for rate in [0.4, 1e-9, 5e9, f64::from(MAX_SAMPLE_RATE_HZ) + 1.0] {
            let err = StreamFormat::mono_f32(rate).unwrap_err();
            assert!(
                matches!(err, AudioError::InvalidSampleRate { .. }),
                "rate {rate} accepted"
            );
        }

        assert_eq!(StreamFormat::mono_f32(0.5).unwrap().sample_rate_hz(), 1);
        assert_eq!(
            StreamFormat::mono_f32(f64::from(MAX_SAMPLE_RATE_HZ))
                .unwrap()
                .sample_rate_hz(),
            MAX_SAMPLE_RATE_HZ
        );
    }

    #[test]
    fn test_fractional_rate_rounds_to_nearest_hz() {
        let format = StreamFormat::mono_f32(22_050.6).unwrap();
        assert_eq!(format.sample_rate_hz(), 22_051);
    }

    #[test]
    fn test_stereo_rejected() {
        assert_eq!(
            StreamFormat::for_channels(48_000.0, 2),
            Err(AudioError::UnsupportedChannelCount { channels: 2 })
        );
        assert!(StreamFormat::for_channels(48_000.0, 1).is_ok());
    }
}
