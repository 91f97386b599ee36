//! Fake engine for exercising the calling convention without hardware
//!
//! `FakeEngine` has the same lifecycle as [`crate::engine::Engine`]
//! (new / start / stop / destroy) but opens no device. Instead of a
//! platform render thread, `start` drives the callback itself on the calling
//! thread: a fixed number of ticks with a fixed real-time delay between
//! them, passing a counter that starts at 0. It returns once the last tick
//! has been delivered.
//!
//! With the default [`FakeConfig`] that is three ticks (0, 1, 2) one second
//! apart, so `start` blocks for about two seconds.

use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::config::FakeConfig;
use crate::error::{log_audio_error, AudioError};

/// Hardware-free stand-in for the output engine
pub struct FakeEngine<F>
where
    F: FnMut(u32),
{
    callback: F,
    ticks: u32,
    interval: Duration,
    delivered: u64,
}

impl<F> FakeEngine<F>
where
    F: FnMut(u32),
{
    /// Fake engine with the default cadence (3 ticks, 1 s apart)
    pub fn new(callback: F) -> Self {
        let defaults = FakeConfig::default();
        Self {
            callback,
            ticks: defaults.ticks,
            interval: Duration::from_millis(defaults.interval_ms),
            delivered: 0,
        }
    }

    /// Fake engine with a custom cadence
    ///
    /// # Errors
    /// Returns [`AudioError::InvalidTickCount`] when `config.ticks` is 0.
    pub fn with_config(config: &FakeConfig, callback: F) -> Result<Self, AudioError> {
        if config.ticks == 0 {
            let err = AudioError::InvalidTickCount { ticks: 0 };
            log_audio_error(&err, "FakeEngine::new");
            return Err(err);
        }

        Ok(Self {
            callback,
            ticks: config.ticks,
            interval: Duration::from_millis(config.interval_ms),
            delivered: 0,
        })
    }

    /// Deliver every tick on the calling thread, then return
    pub fn start(&mut self) -> Result<(), AudioError> {
        info!("[FakeEngine] Start engine");

        for count in 0..self.ticks {
            if count > 0 {
                thread::sleep(self.interval);
            }
            debug!("[FakeEngine] tick {}", count);
            (self.callback)(count);
            self.delivered += 1;
        }

        Ok(())
    }

    /// Nothing to halt: `start` has already returned
    pub fn stop(&mut self) -> Result<(), AudioError> {
        info!("[FakeEngine] Stop engine");
        Ok(())
    }

    pub fn destroy(self) {
        info!("[FakeEngine] Free engine");
    }

    /// Ticks per `start`
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Callback invocations across all `start` calls
    pub fn ticks_delivered(&self) -> u64 {
        self.delivered
    }
}
