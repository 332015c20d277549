//! DocScan capture screen - GTK4 + GStreamer camera capture for a
//! document-scanning plugin.
//!
//! Architecture:
//! - `state` module: GTK-free state machine with business logic (testable)
//! - `app` module: Bridges state machine to GTK and async operations
//! - `camera` module: GStreamer pipeline for preview and still grabs
//! - `orientation` module: sensor subscription and orientation-driven layout
//! - `session` / `encode` modules: captured images and the final batch
//! - `host` module: entry point and completion callback boundary
//! - `ui` module: GTK4 widgets and the capture window

pub mod app;
pub mod camera;
pub mod config;
pub mod encode;
pub mod host;
pub mod orientation;
pub mod session;
pub mod state;
pub mod ui;

pub use config::{CancelBehavior, CaptureOptions, FlashMode};
pub use encode::{EncodedBatch, PhotoResult};
pub use host::{open, CaptureOutcome};
