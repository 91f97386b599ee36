//! In-process output backend driven by the test itself.
//!
//! `ManualBackend` plays the role of the platform audio framework: it keeps
//! the render callback the engine registers and only invokes it when the
//! test asks for a buffer. Handles are cheap clones sharing one state, so a
//! test can pass one clone to [`crate::engine::Engine::with_backend`] and
//! keep another to drive rendering and inspect what the engine did.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::audio::{RenderCallback, StreamFormat};
use crate::engine::backend::{OutputBackend, OutputStream};
use crate::error::AudioError;

#[derive(Default)]
struct ManualState {
    render: Option<RenderCallback>,
    playing: bool,
    format: Option<StreamFormat>,
    buffer_frames: Option<u32>,
    opened: u64,
    closed: u64,
    play_calls: u64,
    pause_calls: u64,
    fail_open: Option<AudioError>,
    fail_play: Option<AudioError>,
    fail_pause: Option<AudioError>,
}

/// Scripted backend for hardware-free tests
#[derive(Clone, Default)]
pub struct ManualBackend {
    shared: Arc<Mutex<ManualState>>,
}

impl ManualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make the next `open_output` fail with `err`
    pub fn fail_next_open(&self, err: AudioError) {
        self.state().fail_open = Some(err);
    }

    /// Make the next `play` fail with `err`
    pub fn fail_next_play(&self, err: AudioError) {
        self.state().fail_play = Some(err);
    }

    /// Make the next `pause` fail with `err`
    pub fn fail_next_pause(&self, err: AudioError) {
        self.state().fail_pause = Some(err);
    }

    /// Request one buffer of `frames` samples the way a playing device would
    ///
    /// Returns `None` when no stream is open or the stream is paused.
    pub fn render(&self, frames: usize) -> Option<Vec<f32>> {
        let mut state = self.state();
        if !state.playing {
            return None;
        }
        let render = state.render.as_mut()?;
        let mut buffer = vec![0.0f32; frames];
        render(buffer.as_mut_slice());
        Some(buffer)
    }

    /// Request a buffer even if the stream is paused
    ///
    /// Simulates a platform that delivers a trailing buffer after pause.
    pub fn force_render(&self, frames: usize) -> Option<Vec<f32>> {
        let mut state = self.state();
        let render = state.render.as_mut()?;
        let mut buffer = vec![f32::NAN; frames];
        render(buffer.as_mut_slice());
        Some(buffer)
    }

    pub fn is_playing(&self) -> bool {
        self.state().playing
    }

    /// Format of the most recently opened stream
    pub fn negotiated_format(&self) -> Option<StreamFormat> {
        self.state().format
    }

    /// Buffer size hint of the most recently opened stream
    pub fn requested_buffer_frames(&self) -> Option<u32> {
        self.state().buffer_frames
    }

    pub fn streams_opened(&self) -> u64 {
        self.state().opened
    }

    pub fn streams_closed(&self) -> u64 {
        self.state().closed
    }

    /// Streams opened and not yet disposed of
    pub fn live_streams(&self) -> u64 {
        let state = self.state();
        state.opened - state.closed
    }

    pub fn play_calls(&self) -> u64 {
        self.state().play_calls
    }

    pub fn pause_calls(&self) -> u64 {
        self.state().pause_calls
    }
}

impl OutputBackend for ManualBackend {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn open_output(
        &self,
        format: &StreamFormat,
        buffer_frames: Option<u32>,
        render: RenderCallback,
    ) -> Result<Box<dyn OutputStream>, AudioError> {
        let mut state = self.state();
        if let Some(err) = state.fail_open.take() {
            return Err(err);
        }

        state.render = Some(render);
        state.playing = false;
        state.format = Some(*format);
        state.buffer_frames = buffer_frames;
        state.opened += 1;

        Ok(Box::new(ManualOutputStream {
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct ManualOutputStream {
    shared: Arc<Mutex<ManualState>>,
}

impl ManualOutputStream {
    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl OutputStream for ManualOutputStream {
    fn play(&mut self) -> Result<(), AudioError> {
        let mut state = self.state();
        state.play_calls += 1;
        if let Some(err) = state.fail_play.take() {
            return Err(err);
        }
        state.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        let mut state = self.state();
        state.pause_calls += 1;
        if let Some(err) = state.fail_pause.take() {
            return Err(err);
        }
        state.playing = false;
        Ok(())
    }
}

impl Drop for ManualOutputStream {
    fn drop(&mut self) {
        let mut state = self.state();
        state.playing = false;
        state.render = None;
        state.closed += 1;
    }
}
