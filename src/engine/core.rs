//! Engine - one real-time audio output session
//!
//! Lifecycle: `new → start → (platform renders) → stop → destroy`.
//!
//! Construction negotiates a single stream format (32-bit float, mono,
//! non-interleaved, packed) at the caller's sample rate, registers the render
//! callback with the platform backend and leaves the stream paused. `start`
//! and `stop` only toggle playback; the callback never changes.
//!
//! # Real-Time Safety
//! The user callback runs on the platform's audio thread. It receives channel
//! 0 of each output buffer and must fill every sample without blocking or
//! allocating. Whatever state it needs is captured by the closure; the engine
//! never looks at it.
//!
//! # Example
//! ```no_run
//! use synth::Engine;
//!
//! let mut phase = 0.0f64;
//! let mut engine = Engine::new(44_100.0, move |buf: &mut [f32]| {
//!     for sample in buf {
//!         *sample = (0.5 * phase.sin()) as f32;
//!         phase += 440.0 * std::f64::consts::TAU / 44_100.0;
//!     }
//! })?;
//!
//! engine.start()?;
//! std::thread::sleep(std::time::Duration::from_secs(2));
//! engine.stop()?;
//! engine.destroy();
//! # Ok::<(), synth::error::AudioError>(())
//! ```

use std::sync::Arc;

use log::{debug, info, warn};

use super::backend::{default_backend, OutputBackend, OutputStream};
use crate::audio::{RenderCallback, RenderGate, RenderStats, StreamFormat};
use crate::config::EngineConfig;
use crate::error::{log_audio_error, AudioError};

/// Playback state of an [`Engine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed or stopped; the callback is not invoked
    Paused,
    /// Started; the platform drives the callback
    Running,
}

/// Real-time audio output engine
///
/// Owns the platform output stream exclusively. Dropping the engine (or
/// calling [`Engine::destroy`]) stops playback if needed, then disposes of
/// the stream.
pub struct Engine {
    stream: Option<Box<dyn OutputStream>>,
    gate: Arc<RenderGate>,
    format: StreamFormat,
    backend: &'static str,
}

impl Engine {
    /// Open the default output device at `sample_rate` Hz
    ///
    /// # Errors
    /// - [`AudioError::InvalidSampleRate`] for a rate that is not finite or
    ///   does not round to a positive whole Hz value that fits in `i32`
    /// - [`AudioError::DeviceUnavailable`] when there is no output device
    /// - [`AudioError::UnsupportedFormat`] when the device has no f32 layout at
    ///   the rate
    /// - [`AudioError::StreamOpenFailed`] when the stream cannot be created
    pub fn new<F>(sample_rate: f64, callback: F) -> Result<Self, AudioError>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        Self::with_config(&EngineConfig::with_sample_rate(sample_rate), callback)
    }

    /// Open the default output device with an explicit configuration
    pub fn with_config<F>(config: &EngineConfig, callback: F) -> Result<Self, AudioError>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        let backend = default_backend();
        Self::with_backend(backend.as_ref(), config, callback)
    }

    /// Open an output stream through a specific backend
    pub fn with_backend<F>(
        backend: &dyn OutputBackend,
        config: &EngineConfig,
        callback: F,
    ) -> Result<Self, AudioError>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        let format = StreamFormat::for_channels(config.sample_rate, config.channels)
            .inspect_err(|e| log_audio_error(e, "Engine::new"))?;

        if let Some(frames @ 0) = config.buffer_frames {
            let err = AudioError::InvalidBufferSize { frames };
            log_audio_error(&err, "Engine::new");
            return Err(err);
        }

        let gate = Arc::new(RenderGate::new());
        let render: RenderCallback = {
            let gate = Arc::clone(&gate);
            let mut callback = callback;
            Box::new(move |buffer: &mut [f32]| gate.render(buffer, &mut callback))
        };

        let stream = backend
            .open_output(&format, config.buffer_frames, render)
            .inspect_err(|e| log_audio_error(e, "Engine::new"))?;

        info!(
            "[Engine] New engine: backend={}, sample_rate={} Hz, channels=1, format=f32 non-interleaved packed",
            backend.name(),
            format.sample_rate()
        );

        Ok(Self {
            stream: Some(stream),
            gate,
            format,
            backend: backend.name(),
        })
    }

    /// Begin playback
    ///
    /// From here on the platform invokes the callback on its audio thread
    /// until [`Engine::stop`]. Starting a running engine does nothing.
    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.gate.is_open() {
            debug!("[Engine] start() ignored: already running");
            return Ok(());
        }

        let Some(stream) = self.stream.as_mut() else {
            return Err(AudioError::StreamFailure {
                reason: "Output stream already released".to_string(),
            });
        };

        self.gate.open();
        if let Err(err) = stream.play() {
            self.gate.close();
            log_audio_error(&err, "Engine::start");
            return Err(err);
        }

        info!("[Engine] Start engine");
        Ok(())
    }

    /// Halt playback
    ///
    /// When this returns the callback is not executing and will not be called
    /// again until the next [`Engine::start`], even if the platform keeps
    /// asking for buffers while it winds down. Stopping a paused engine does
    /// nothing.
    pub fn stop(&mut self) -> Result<(), AudioError> {
        if !self.gate.is_open() {
            debug!("[Engine] stop() ignored: not running");
            return Ok(());
        }

        self.gate.close();
        info!("[Engine] Stop engine");

        match self.stream.as_mut() {
            Some(stream) => stream.pause().inspect_err(|e| log_audio_error(e, "Engine::stop")),
            None => Ok(()),
        }
    }

    /// Tear down the device and release the engine
    ///
    /// Same as dropping the engine; spelled out for call sites that want the
    /// teardown to be explicit.
    pub fn destroy(self) {
        drop(self);
    }

    pub fn state(&self) -> EngineState {
        if self.gate.is_open() {
            EngineState::Running
        } else {
            EngineState::Paused
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    /// The negotiated stream format
    pub fn format(&self) -> &StreamFormat {
        &self.format
    }

    pub fn sample_rate(&self) -> f64 {
        self.format.sample_rate()
    }

    /// Name of the backend that opened the stream
    pub fn backend_name(&self) -> &'static str {
        self.backend
    }

    /// Render counters since construction
    pub fn stats(&self) -> RenderStats {
        self.gate.stats()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.gate.is_open() {
            warn!("[Engine] Destroyed while running; stopping first");
            if let Err(err) = self.stop() {
                log_audio_error(&err, "Engine::drop");
            }
        }

        // Dropping the stream uninitializes and disposes of the device.
        self.stream.take();
        info!("[Engine] Free engine");
    }
}
