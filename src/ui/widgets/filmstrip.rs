//! Scrollable filmstrip of captured-image thumbnails.
//!
//! Horizontal beneath the preview in portrait, vertical along the screen
//! edge in landscape. One thumbnail per session image, always in capture
//! order.

use gtk4 as gtk;
use gtk4::prelude::*;
use image::imageops;

use crate::config;
use crate::encode;
use crate::orientation::StripDirection;
use crate::session::CapturedImage;

/// Create the filmstrip
pub fn create_filmstrip<F>(
    images: &[CapturedImage],
    direction: StripDirection,
    on_select: F,
) -> gtk::ScrolledWindow
where
    F: Fn(usize) + Clone + 'static,
{
    let scroll = gtk::ScrolledWindow::new();
    scroll.add_css_class("filmstrip");
    rebuild(&scroll, images, direction, on_select);
    scroll
}

/// Refresh the filmstrip after a capture, delete or orientation change
pub fn update_filmstrip<F>(
    strip: &gtk::ScrolledWindow,
    images: &[CapturedImage],
    direction: StripDirection,
    on_select: F,
) where
    F: Fn(usize) + Clone + 'static,
{
    rebuild(strip, images, direction, on_select);

    // Scroll to the end so the newest capture is visible
    match direction {
        StripDirection::Horizontal => {
            let adj = strip.hadjustment();
            glib::idle_add_local_once(move || {
                adj.set_value(adj.upper() - adj.page_size());
            });
        }
        StripDirection::Vertical => {
            let adj = strip.vadjustment();
            glib::idle_add_local_once(move || {
                adj.set_value(adj.upper() - adj.page_size());
            });
        }
    }
}

fn rebuild<F>(
    strip: &gtk::ScrolledWindow,
    images: &[CapturedImage],
    direction: StripDirection,
    on_select: F,
) where
    F: Fn(usize) + Clone + 'static,
{
    let (box_orientation, hpolicy, vpolicy) = match direction {
        StripDirection::Horizontal => (
            gtk::Orientation::Horizontal,
            gtk::PolicyType::Automatic,
            gtk::PolicyType::Never,
        ),
        StripDirection::Vertical => (
            gtk::Orientation::Vertical,
            gtk::PolicyType::Never,
            gtk::PolicyType::Automatic,
        ),
    };
    strip.set_policy(hpolicy, vpolicy);

    let inner = gtk::Box::new(box_orientation, 8);
    inner.add_css_class("filmstrip-inner");
    inner.set_margin_start(8);
    inner.set_margin_end(8);
    inner.set_margin_top(8);
    inner.set_margin_bottom(8);

    for (idx, image) in images.iter().enumerate() {
        let thumb = create_thumbnail(image, {
            let on_select = on_select.clone();
            move || on_select(idx)
        });
        inner.append(&thumb);
    }

    strip.set_child(Some(&inner));
}

/// Create a single thumbnail button
fn create_thumbnail<F>(image: &CapturedImage, on_click: F) -> gtk::Button
where
    F: Fn() + 'static,
{
    let button = gtk::Button::new();
    button.add_css_class("photo-thumbnail");
    button.set_size_request(config::THUMBNAIL_SIZE, config::THUMBNAIL_SIZE);

    // Downscale before rotating; the strip never needs full resolution
    let (w, h) = (image.pixels.width(), image.pixels.height());
    let edge = config::THUMBNAIL_SIZE as u32;
    let scale = edge as f32 / w.min(h).max(1) as f32;
    let small = imageops::thumbnail(
        &image.pixels,
        ((w as f32 * scale) as u32).max(1),
        ((h as f32 * scale) as u32).max(1),
    );
    let upright = encode::rotate_upright(&small, image.orientation);

    let picture = gtk::Picture::for_paintable(&super::texture_for_pixels(&upright));
    picture.set_size_request(config::THUMBNAIL_SIZE, config::THUMBNAIL_SIZE);
    picture.set_content_fit(gtk::ContentFit::Cover);

    button.set_child(Some(&picture));
    button.connect_clicked(move |_| on_click());

    button
}
