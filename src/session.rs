//! In-memory capture session data.
//!
//! The session is an ordered list of captured images owned exclusively by the
//! capture screen for its lifetime. Insertion order is capture order; nothing
//! is ever persisted.

use image::RgbImage;

use crate::orientation::DeviceOrientation;

/// A captured still frame plus the device orientation at acquisition time.
#[derive(Clone)]
pub struct CapturedImage {
    pub pixels: RgbImage,
    pub orientation: DeviceOrientation,
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("width", &self.pixels.width())
            .field("height", &self.pixels.height())
            .field("orientation", &self.orientation)
            .finish()
    }
}

/// Ordered sequence of captured images, mutable by deletion.
///
/// Invariant: the filmstrip always shows exactly `len()` thumbnails in the
/// same order.
#[derive(Debug, Clone, Default)]
pub struct CaptureSession {
    images: Vec<CapturedImage>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self { images: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn push(&mut self, image: CapturedImage) {
        self.images.push(image);
    }

    /// Remove the image at `index`. Out-of-range indices are ignored and
    /// return false.
    pub fn remove(&mut self, index: usize) -> bool {
        if index < self.images.len() {
            self.images.remove(index);
            true
        } else {
            false
        }
    }

    pub fn get(&self, index: usize) -> Option<&CapturedImage> {
        self.images.get(index)
    }

    pub fn images(&self) -> &[CapturedImage] {
        &self.images
    }
}
