//! Tests against the real default output device
//!
//! Ignored by default; run with `cargo test -- --ignored` on a machine with a
//! working sound card.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use synth::Engine;

#[test]
#[ignore = "requires an audio output device"]
fn test_default_device_renders_and_stops() {
    let calls = Arc::new(AtomicU64::new(0));
    let max_frames = Arc::new(AtomicU32::new(0));
    let (counted, largest) = (Arc::clone(&calls), Arc::clone(&max_frames));

    let mut engine = Engine::new(44_100.0, move |buf: &mut [f32]| {
        counted.fetch_add(1, Ordering::SeqCst);
        largest.fetch_max(buf.len() as u32, Ordering::SeqCst);
        buf.fill(0.0);
    })
    .expect("default output device");

    engine.start().expect("start");
    thread::sleep(Duration::from_millis(300));
    engine.stop().expect("stop");

    let at_stop = calls.load(Ordering::SeqCst);
    assert!(at_stop >= 1, "device never requested a buffer");
    assert!(max_frames.load(Ordering::SeqCst) > 0);

    thread::sleep(Duration::from_millis(200));
    assert_eq!(calls.load(Ordering::SeqCst), at_stop);

    engine.destroy();
}
