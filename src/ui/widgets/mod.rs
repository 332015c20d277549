//! Reusable UI widgets.

pub mod filmstrip;
pub mod shutter_button;

pub use filmstrip::{create_filmstrip, update_filmstrip};
pub use shutter_button::create_shutter_button;

use gtk4 as gtk;
use image::RgbImage;

/// Wrap in-memory RGB pixels in a GPU texture for display.
pub fn texture_for_pixels(pixels: &RgbImage) -> gtk::gdk::MemoryTexture {
    let width = pixels.width() as i32;
    let height = pixels.height() as i32;
    let stride = pixels.width() as usize * 3;
    let bytes = glib::Bytes::from(pixels.as_raw().as_slice());
    gtk::gdk::MemoryTexture::new(
        width,
        height,
        gtk::gdk::MemoryFormat::R8g8b8,
        &bytes,
        stride,
    )
}
