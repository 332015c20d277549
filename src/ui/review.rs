//! Full-screen review overlay for one captured image.
//!
//! Constructed with direct callbacks back to the owning screen's close and
//! delete operations; the overlay never searches any widget hierarchy for
//! its owner.

use gtk4 as gtk;
use gtk4::prelude::*;

use crate::encode;
use crate::session::CapturedImage;
use crate::ui::widgets;

/// Create the review overlay for the image at `index`.
pub fn create_review_overlay(
    image: &CapturedImage,
    index: usize,
    on_close: impl Fn() + Clone + 'static,
    on_delete: impl Fn(usize) + Clone + 'static,
) -> gtk::Box {
    let overlay = gtk::Box::new(gtk::Orientation::Vertical, 0);
    overlay.add_css_class("review-overlay");
    overlay.set_hexpand(true);
    overlay.set_vexpand(true);

    // Top bar: Cancel left, Delete right
    let top_bar = gtk::Box::new(gtk::Orientation::Horizontal, 12);
    top_bar.add_css_class("review-top-bar");
    top_bar.set_margin_start(16);
    top_bar.set_margin_end(16);
    top_bar.set_margin_top(12);

    let on_close_button = on_close.clone();
    let cancel_button = gtk::Button::with_label("Cancel");
    cancel_button.add_css_class("review-cancel");
    cancel_button.connect_clicked(move |_| on_close_button());

    let spacer = gtk::Box::new(gtk::Orientation::Horizontal, 0);
    spacer.set_hexpand(true);

    let on_delete_button = on_delete.clone();
    let delete_button = gtk::Button::with_label("Delete");
    delete_button.add_css_class("review-delete");
    delete_button.add_css_class("destructive-action");
    delete_button.connect_clicked(move |_| on_delete_button(index));

    top_bar.append(&cancel_button);
    top_bar.append(&spacer);
    top_bar.append(&delete_button);

    // The image, shown upright regardless of capture-time orientation
    let upright = encode::normalize(image);
    let picture = gtk::Picture::for_paintable(&widgets::texture_for_pixels(&upright));
    picture.set_content_fit(gtk::ContentFit::Contain);
    picture.set_hexpand(true);
    picture.set_vexpand(true);
    picture.add_css_class("review-image");

    overlay.append(&top_bar);
    overlay.append(&picture);

    // Escape closes, Delete deletes
    let key_controller = gtk::EventControllerKey::new();
    key_controller.connect_key_pressed(move |_, key, _, _| match key {
        gtk::gdk::Key::Escape => {
            on_close();
            glib::Propagation::Stop
        }
        gtk::gdk::Key::Delete => {
            on_delete(index);
            glib::Propagation::Stop
        }
        _ => glib::Propagation::Proceed,
    });
    overlay.add_controller(key_controller);

    overlay
}
