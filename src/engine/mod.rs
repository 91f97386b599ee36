//! Engine module housing the output engine and its backends.
//!
//! `core` holds the real [`Engine`], `backend` the platform adapters it opens
//! streams through, and `fake` the hardware-free [`FakeEngine`].

pub mod backend;
pub mod core;
pub mod fake;

#[cfg(target_os = "android")]
pub use backend::OboeBackend;
#[cfg(not(target_os = "android"))]
pub use backend::{probe_default_output, CpalBackend, OutputProbe};
pub use backend::{default_backend, OutputBackend, OutputStream};
pub use self::core::{Engine, EngineState};
pub use fake::FakeEngine;
