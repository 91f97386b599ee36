//! Testability harness utilities.
//!
//! Backends and helpers that let embedders exercise their render callbacks
//! and the engine lifecycle without live audio hardware.

pub mod manual_backend;

pub use manual_backend::ManualBackend;
