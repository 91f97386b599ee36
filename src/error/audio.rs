// Audio error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants
///
/// Single source of truth for the numeric codes returned by
/// [`AudioError::code`].
///
/// Error code range: 1001-1009
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// No default output device could be found or instantiated
    pub const DEVICE_UNAVAILABLE: i32 = 1001;

    /// The device refused the mono 32-bit float stream format
    pub const UNSUPPORTED_FORMAT: i32 = 1002;

    /// Failed to open the output stream / register the render callback
    pub const STREAM_OPEN_FAILED: i32 = 1003;

    /// The platform failed to initialize, start or stop the stream
    pub const HARDWARE_ERROR: i32 = 1004;

    /// Sample rate is not a finite positive number
    pub const INVALID_SAMPLE_RATE: i32 = 1005;

    /// Channel count other than mono was requested
    pub const UNSUPPORTED_CHANNEL_COUNT: i32 = 1006;

    /// Audio stream failed after it was opened
    pub const STREAM_FAILURE: i32 = 1007;

    /// Fake engine was configured to deliver zero ticks
    pub const INVALID_TICK_COUNT: i32 = 1008;

    /// Buffer size hint of zero frames
    pub const INVALID_BUFFER_SIZE: i32 = 1009;
}

/// Log an audio error with structured context
///
/// This function logs audio errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=Engine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These errors cover engine construction (device discovery, format
/// negotiation, callback registration) and playback state changes.
///
/// Error code range: 1001-1009
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// No default output device could be found or instantiated
    DeviceUnavailable { reason: String },

    /// The device refused the mono 32-bit float stream format
    UnsupportedFormat { reason: String },

    /// Failed to open the output stream / register the render callback
    StreamOpenFailed { reason: String },

    /// The platform failed to initialize, start or stop the stream
    HardwareError { details: String },

    /// Sample rate is not finite or does not round to a usable whole Hz value
    InvalidSampleRate { sample_rate: f64 },

    /// Only mono output is supported
    UnsupportedChannelCount { channels: u16 },

    /// Audio stream failed after it was opened
    StreamFailure { reason: String },

    /// Fake engine needs at least one tick
    InvalidTickCount { ticks: u32 },

    /// Buffer size hint must be at least one frame
    InvalidBufferSize { frames: u32 },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::DeviceUnavailable { .. } => AudioErrorCodes::DEVICE_UNAVAILABLE,
            AudioError::UnsupportedFormat { .. } => AudioErrorCodes::UNSUPPORTED_FORMAT,
            AudioError::StreamOpenFailed { .. } => AudioErrorCodes::STREAM_OPEN_FAILED,
            AudioError::HardwareError { .. } => AudioErrorCodes::HARDWARE_ERROR,
            AudioError::InvalidSampleRate { .. } => AudioErrorCodes::INVALID_SAMPLE_RATE,
            AudioError::UnsupportedChannelCount { .. } => {
                AudioErrorCodes::UNSUPPORTED_CHANNEL_COUNT
            }
            AudioError::StreamFailure { .. } => AudioErrorCodes::STREAM_FAILURE,
            AudioError::InvalidTickCount { .. } => AudioErrorCodes::INVALID_TICK_COUNT,
            AudioError::InvalidBufferSize { .. } => AudioErrorCodes::INVALID_BUFFER_SIZE,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::DeviceUnavailable { reason } => {
                format!("No output device available: {}", reason)
            }
            AudioError::UnsupportedFormat { reason } => {
                format!("Stream format not supported: {}", reason)
            }
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AudioError::HardwareError { details } => {
                format!("Hardware error: {}", details)
            }
            AudioError::InvalidSampleRate { sample_rate } => {
                format!(
                    "Sample rate must round to 1..={} Hz (got {})",
                    i32::MAX,
                    sample_rate
                )
            }
            AudioError::UnsupportedChannelCount { channels } => {
                format!("Only mono output is supported (got {} channels)", channels)
            }
            AudioError::StreamFailure { reason } => {
                format!("Audio stream failed: {}", reason)
            }
            AudioError::InvalidTickCount { ticks } => {
                format!("Fake engine tick count must be greater than 0 (got {})", ticks)
            }
            AudioError::InvalidBufferSize { frames } => {
                format!("Buffer size must be greater than 0 frames (got {})", frames)
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AudioError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::HardwareError {
            details: err.to_string(),
        }
    }
}
