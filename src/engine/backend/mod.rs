//! Backend abstractions for the output engine.
//!
//! A backend is the narrow adapter between [`crate::engine::Engine`] and a
//! native audio framework: find the default output device, open a stream
//! with the negotiated format, register the render callback and toggle
//! playback. Nothing above this module touches platform types.

use crate::audio::{RenderCallback, StreamFormat};
use crate::error::AudioError;

/// Trait implemented by platform-specific audio backends.
///
/// `open_output` covers the whole construction sequence of the native
/// framework (discover, instantiate, set format, set render callback,
/// initialize). Any failure must release whatever was partially created
/// before returning the error. On success the stream must be paused.
pub trait OutputBackend {
    /// Short backend name used in logs (e.g. "cpal", "oboe")
    fn name(&self) -> &'static str;

    fn open_output(
        &self,
        format: &StreamFormat,
        buffer_frames: Option<u32>,
        render: RenderCallback,
    ) -> Result<Box<dyn OutputStream>, AudioError>;
}

/// An opened, initialized output stream.
///
/// Dropping the stream uninitializes and disposes of the platform handle.
pub trait OutputStream {
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self) -> Result<(), AudioError>;
}

#[cfg(target_os = "android")]
mod oboe;
#[cfg(target_os = "android")]
pub use self::oboe::OboeBackend;

#[cfg(not(target_os = "android"))]
mod cpal;
#[cfg(not(target_os = "android"))]
pub use self::cpal::{probe_default_output, CpalBackend, OutputProbe};

cfg_if::cfg_if! {
    if #[cfg(target_os = "android")] {
        /// Backend for the platform this crate was compiled for
        pub fn default_backend() -> Box<dyn OutputBackend> {
            Box::new(OboeBackend::new())
        }
    } else {
        /// Backend for the platform this crate was compiled for
        pub fn default_backend() -> Box<dyn OutputBackend> {
            Box::new(CpalBackend::new())
        }
    }
}
