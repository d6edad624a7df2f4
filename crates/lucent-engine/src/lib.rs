//! Lucent engine crate.
//!
//! Platform + GPU runtime (window, device, input, timing, logging) and the
//! deferred renderer built on top of it.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod render;
