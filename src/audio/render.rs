//! Render gate - the real-time side of the engine
//!
//! Every buffer request coming from the platform goes through a
//! [`RenderGate`] before it reaches the user callback. The gate decides
//! whether the engine is running, keeps render statistics and lets `stop`
//! wait out a callback that is already executing.
//!
//! # Real-Time Safety
//! `RenderGate::render` only touches atomics:
//! - No heap allocations
//! - No mutex locks
//! - Bounded execution time apart from the user callback itself
//!
//! # Stop guarantee
//! ```text
//! render thread                      control thread (stop)
//! in_flight += 1                     running = false
//! if running { user callback }       while in_flight != 0 { yield }
//! in_flight -= 1
//! ```
//! All four operations are `SeqCst`, so either `stop` observes the increment
//! and waits, or the render thread observes `running == false` and never
//! calls the user callback.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::thread;

/// Boxed render callback handed to a platform backend
///
/// Receives channel 0 of one output buffer; the slice length is the frame
/// count the platform requested.
pub type RenderCallback = Box<dyn FnMut(&mut [f32]) + Send + 'static>;

/// Snapshot of render counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// User callback invocations
    pub callbacks: u64,
    /// Frames produced by the user callback
    pub frames: u64,
    /// Frame count of the most recent user callback
    pub last_frame_count: u32,
    /// Buffers filled with silence because the engine was paused
    pub silenced: u64,
}

/// Marks one render call in progress; leaving it (normally or by
/// unwinding out of the user callback) releases the mark
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Shared state between the control thread and the render thread
#[derive(Debug, Default)]
pub struct RenderGate {
    running: AtomicBool,
    in_flight: AtomicUsize,
    callbacks: AtomicU64,
    frames: AtomicU64,
    last_frame_count: AtomicU32,
    silenced: AtomicU64,
}

impl RenderGate {
    /// New gate, closed (engine paused)
    pub fn new() -> Self {
        Self::default()
    }

    /// Let buffer requests through to the user callback
    pub fn open(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    /// Stop forwarding buffer requests and wait for a callback in progress
    ///
    /// After this returns the user callback is not running and will not be
    /// called again until [`RenderGate::open`].
    pub fn close(&self) {
        self.running.store(false, Ordering::SeqCst);
        while self.in_flight.load(Ordering::SeqCst) != 0 {
            thread::yield_now();
        }
    }

    pub fn is_open(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Handle one platform buffer request
    ///
    /// Called on the real-time thread. Calls `callback` with the buffer when
    /// the gate is open, otherwise writes silence.
    #[inline]
    pub fn render<F>(&self, buffer: &mut [f32], callback: &mut F)
    where
        F: FnMut(&mut [f32]) + ?Sized,
    {
        let _in_flight = InFlight::enter(&self.in_flight);

        if self.running.load(Ordering::SeqCst) {
            callback(buffer);
            let frames = buffer.len();
            self.callbacks.fetch_add(1, Ordering::Relaxed);
            self.frames.fetch_add(frames as u64, Ordering::Relaxed);
            self.last_frame_count.store(frames as u32, Ordering::Relaxed);
        } else {
            buffer.fill(0.0);
            self.silenced.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> RenderStats {
        RenderStats {
            callbacks: self.callbacks.load(Ordering::Relaxed),
            frames: self.frames.load(Ordering::Relaxed),
            last_frame_count: self.last_frame_count.load(Ordering::Relaxed),
            silenced: self.silenced.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_closed_gate_writes_silence() {
        let gate = RenderGate::new();
        let mut calls = 0;
        let mut buffer = vec![1.0f32; 64];

        gate.render(&mut buffer, &mut |_: &mut [f32]| calls += 1);

        assert_eq!(calls, 0);
        assert!(buffer.iter().all(|&s| s == 0.0));
        assert_eq!(gate.stats().silenced, 1);
        assert_eq!(gate.stats().callbacks, 0);
    }

    #[test]
    fn test_open_gate_forwards_buffer() {
        let gate = RenderGate::new();
        gate.open();
        let mut buffer = vec![0.0f32; 128];

        gate.render(&mut buffer, &mut |buf: &mut [f32]| buf.fill(0.25));

        assert!(buffer.iter().all(|&s| s == 0.25));
        let stats = gate.stats();
        assert_eq!(stats.callbacks, 1);
        assert_eq!(stats.frames, 128);
        assert_eq!(stats.last_frame_count, 128);
    }

    #[test]
    fn test_counters_accumulate_across_buffers() {
        let gate = RenderGate::new();
        gate.open();

        for frames in [256usize, 512, 128] {
            let mut buffer = vec![0.0f32; frames];
            gate.render(&mut buffer, &mut |_: &mut [f32]| {});
        }

        let stats = gate.stats();
        assert_eq!(stats.callbacks, 3);
        assert_eq!(stats.frames, 896);
        assert_eq!(stats.last_frame_count, 128);
    }

    #[test]
    fn test_close_waits_for_callback_in_flight() {
        let gate = Arc::new(RenderGate::new());
        gate.open();

        let entered = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let render_thread = {
            let gate = Arc::clone(&gate);
            let entered = Arc::clone(&entered);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                let mut buffer = vec![0.0f32; 32];
                gate.render(&mut buffer, &mut |_: &mut [f32]| {
                    entered.store(true, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(50));
                    finished.store(true, Ordering::SeqCst);
                });
            })
        };

        while !entered.load(Ordering::SeqCst) {
            thread::yield_now();
        }
        gate.close();

        assert!(finished.load(Ordering::SeqCst));
        assert!(!gate.is_open());
        render_thread.join().unwrap();
    }

    #[test]
    fn test_close_returns_after_callback_panics() {
        let gate = Arc::new(RenderGate::new());
        gate.open();

        let render_thread = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let mut buffer = vec![0.0f32; 32];
                gate.render(&mut buffer, &mut |_: &mut [f32]| panic!("render failed"));
            })
        };
        assert!(render_thread.join().is_err());

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                gate.close();
                let _ = done_tx.send(());
            });
        }

        assert!(
            done_rx.recv_timeout(Duration::from_secs(2)).is_ok(),
            "close() still waiting on a callback that unwound"
        );
        assert_eq!(gate.stats().callbacks, 0);

        // The gate keeps working after the failed buffer
        gate.open();
        let mut buffer = vec![0.0f32; 16];
        gate.render(&mut buffer, &mut |buf: &mut [f32]| buf.fill(0.5));
        assert_eq!(gate.stats().callbacks, 1);
    }
}
