//! Configuration constants for the capture screen.

/// JPEG quality for the final encoded batch (0-100)
pub const JPEG_QUALITY: u8 = 80;

/// Filmstrip thumbnail edge length in pixels
pub const THUMBNAIL_SIZE: i32 = 100;

/// Filmstrip strip height in pixels (thumbnails plus padding)
pub const FILMSTRIP_HEIGHT: i32 = 120;

/// Shutter button diameter in pixels
pub const SHUTTER_SIZE: i32 = 88;

/// Fraction of screen height given to the camera preview in portrait
pub const PREVIEW_HEIGHT_FRACTION: f32 = 0.65;

/// Top bar height (Done / Cancel buttons) in pixels
pub const TOP_BAR_HEIGHT: i32 = 50;

/// Timeout when pulling a still frame from the appsink, in milliseconds
pub const CAPTURE_TIMEOUT_MS: u64 = 2000;

/// Error banner display duration in milliseconds
pub const ERROR_DISPLAY_DURATION_MS: u64 = 4000;

/// Interval for draining the app message channel into the GTK main loop
pub const MESSAGE_POLL_INTERVAL_MS: u64 = 16;

/// What `cancel()` delivers to the host application.
///
/// The two upstream variants of this screen disagreed on whether cancel
/// fires the completion callback at all, so the choice is an explicit
/// per-invocation option rather than a hardcoded behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancelBehavior {
    /// Exit without invoking the host callback.
    #[default]
    Discard,
    /// Invoke the host callback with whatever was captured so far.
    DeliverPartial,
}

/// Flash policy for single-shot captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashMode {
    #[default]
    Auto,
    On,
    Off,
}

/// Runtime options supplied by the host when opening the capture screen.
#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    pub cancel_behavior: CancelBehavior,
    pub flash_mode: FlashMode,
    /// When false the orientation sensor is not claimed and the screen
    /// stays in portrait layout.
    pub track_orientation: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            cancel_behavior: CancelBehavior::Discard,
            flash_mode: FlashMode::Auto,
            track_orientation: true,
        }
    }
}
