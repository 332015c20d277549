//! Device orientation tracking and orientation-driven layout.
//!
//! The layout is a pure function of (screen size, orientation) so the widget
//! layer never hand-computes rectangles per orientation branch.

pub mod sensor;

pub use sensor::{watch, OrientationWatch, SensorError};

use crate::config;

/// Physical device orientation, as last reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    /// Device rotated 90 degrees clockwise from portrait
    LandscapeClockwise,
    /// Device rotated 90 degrees counterclockwise from portrait
    LandscapeCounterclockwise,
}

/// Rotation needed to bring a captured frame upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl DeviceOrientation {
    /// Parse a `net.hadess.SensorProxy` AccelerometerOrientation value.
    /// Returns `None` for "undefined" (device flat or indeterminate), in
    /// which case the last valid orientation stays in effect.
    pub fn from_sensor(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(Self::Portrait),
            "bottom-up" => Some(Self::PortraitUpsideDown),
            "left-up" => Some(Self::LandscapeClockwise),
            "right-up" => Some(Self::LandscapeCounterclockwise),
            _ => None,
        }
    }

    /// Rotation that brings a frame captured at this orientation upright.
    /// The sensor is landscape-native: a frame grabbed while the device is
    /// held counterclockwise-landscape is already upright.
    pub fn upright_rotation(self) -> Rotation {
        match self {
            Self::Portrait => Rotation::Cw90,
            Self::PortraitUpsideDown => Rotation::Cw270,
            Self::LandscapeCounterclockwise => Rotation::None,
            Self::LandscapeClockwise => Rotation::Cw180,
        }
    }
}

/// Integer pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

/// Which way the filmstrip scrolls in a given layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripDirection {
    Horizontal,
    Vertical,
}

/// Positions of every screen element for one orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub cancel_button: Rect,
    pub done_button: Rect,
    pub preview: Rect,
    pub filmstrip: Rect,
    pub strip_direction: StripDirection,
    pub shutter: Rect,
}

const BUTTON_WIDTH: i32 = 100;
const GAP: i32 = 8;

/// Compute the screen layout for the given screen size and orientation.
///
/// Three fixed layouts exist: portrait, landscape-clockwise and
/// landscape-counterclockwise (mirror images of each other).
/// Upside-down portrait reuses the portrait layout; only image tagging
/// distinguishes it.
pub fn layout(width: i32, height: i32, orientation: DeviceOrientation) -> ScreenLayout {
    let top = config::TOP_BAR_HEIGHT;
    let cancel_button = Rect::new(0, 0, BUTTON_WIDTH, top);
    let done_button = Rect::new(width - BUTTON_WIDTH, 0, BUTTON_WIDTH, top);

    match orientation {
        DeviceOrientation::Portrait | DeviceOrientation::PortraitUpsideDown => {
            let preview_h = (height as f32 * config::PREVIEW_HEIGHT_FRACTION) as i32;
            let preview = Rect::new(0, top, width, preview_h);
            let filmstrip =
                Rect::new(0, preview.bottom() + GAP, width, config::FILMSTRIP_HEIGHT);
            let shutter = Rect::new(
                (width - config::SHUTTER_SIZE) / 2,
                filmstrip.bottom() + GAP,
                config::SHUTTER_SIZE,
                config::SHUTTER_SIZE,
            );
            ScreenLayout {
                cancel_button,
                done_button,
                preview,
                filmstrip,
                strip_direction: StripDirection::Horizontal,
                shutter,
            }
        }
        DeviceOrientation::LandscapeClockwise => {
            let filmstrip = Rect::new(0, top, config::FILMSTRIP_HEIGHT, height - top);
            let shutter_x = width - config::SHUTTER_SIZE - 3 * GAP;
            let preview = Rect::new(
                filmstrip.width + GAP,
                top,
                shutter_x - filmstrip.width - 2 * GAP,
                height - top,
            );
            let shutter = Rect::new(
                shutter_x,
                (height - config::SHUTTER_SIZE) / 2,
                config::SHUTTER_SIZE,
                config::SHUTTER_SIZE,
            );
            ScreenLayout {
                cancel_button,
                done_button,
                preview,
                filmstrip,
                strip_direction: StripDirection::Vertical,
                shutter,
            }
        }
        DeviceOrientation::LandscapeCounterclockwise => {
            let filmstrip = Rect::new(
                width - config::FILMSTRIP_HEIGHT,
                top,
                config::FILMSTRIP_HEIGHT,
                height - top,
            );
            let shutter_x = 3 * GAP;
            let preview = Rect::new(
                shutter_x + config::SHUTTER_SIZE + GAP,
                top,
                filmstrip.x - shutter_x - config::SHUTTER_SIZE - 2 * GAP,
                height - top,
            );
            let shutter = Rect::new(
                shutter_x,
                (height - config::SHUTTER_SIZE) / 2,
                config::SHUTTER_SIZE,
                config::SHUTTER_SIZE,
            );
            ScreenLayout {
                cancel_button,
                done_button,
                preview,
                filmstrip,
                strip_direction: StripDirection::Vertical,
                shutter,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_parsing() {
        assert_eq!(
            DeviceOrientation::from_sensor("normal"),
            Some(DeviceOrientation::Portrait)
        );
        assert_eq!(
            DeviceOrientation::from_sensor("bottom-up"),
            Some(DeviceOrientation::PortraitUpsideDown)
        );
        assert_eq!(
            DeviceOrientation::from_sensor("left-up"),
            Some(DeviceOrientation::LandscapeClockwise)
        );
        assert_eq!(
            DeviceOrientation::from_sensor("right-up"),
            Some(DeviceOrientation::LandscapeCounterclockwise)
        );
        assert_eq!(DeviceOrientation::from_sensor("undefined"), None);
        assert_eq!(DeviceOrientation::from_sensor(""), None);
    }

    #[test]
    fn test_portrait_layout_stacks_vertically() {
        let l = layout(1080, 1920, DeviceOrientation::Portrait);
        assert_eq!(l.strip_direction, StripDirection::Horizontal);
        assert_eq!(l.preview.width, 1080);
        assert_eq!(l.preview.y, config::TOP_BAR_HEIGHT);
        assert!(l.filmstrip.y > l.preview.bottom() - 1);
        assert!(l.shutter.y > l.filmstrip.bottom() - 1);
        // Shutter is horizontally centered
        assert_eq!(l.shutter.x, (1080 - config::SHUTTER_SIZE) / 2);
    }

    #[test]
    fn test_landscape_layouts_mirror() {
        let cw = layout(1920, 1080, DeviceOrientation::LandscapeClockwise);
        let ccw = layout(1920, 1080, DeviceOrientation::LandscapeCounterclockwise);
        assert_eq!(cw.strip_direction, StripDirection::Vertical);
        assert_eq!(ccw.strip_direction, StripDirection::Vertical);
        // Clockwise: strip left, shutter right. Counterclockwise: reversed.
        assert!(cw.filmstrip.x < cw.shutter.x);
        assert!(ccw.filmstrip.x > ccw.shutter.x);
        // Shutter vertically centered in both
        assert_eq!(cw.shutter.y, ccw.shutter.y);
    }

    #[test]
    fn test_upside_down_reuses_portrait_layout() {
        let p = layout(1080, 1920, DeviceOrientation::Portrait);
        let u = layout(1080, 1920, DeviceOrientation::PortraitUpsideDown);
        assert_eq!(p, u);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let a = layout(800, 600, DeviceOrientation::LandscapeClockwise);
        let b = layout(800, 600, DeviceOrientation::LandscapeClockwise);
        assert_eq!(a, b);
    }

    #[test]
    fn test_upright_rotation_mapping() {
        assert_eq!(DeviceOrientation::Portrait.upright_rotation(), Rotation::Cw90);
        assert_eq!(
            DeviceOrientation::PortraitUpsideDown.upright_rotation(),
            Rotation::Cw270
        );
        assert_eq!(
            DeviceOrientation::LandscapeCounterclockwise.upright_rotation(),
            Rotation::None
        );
        assert_eq!(
            DeviceOrientation::LandscapeClockwise.upright_rotation(),
            Rotation::Cw180
        );
    }
}
