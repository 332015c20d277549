//! UI components for the capture screen.

pub mod review;
pub mod screen;
pub mod widgets;
pub mod window;

pub use window::CaptureWindow;
