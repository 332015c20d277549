//! Capture screen widget tree.
//!
//! Widgets live in a `gtk::Fixed` so positions come straight from the
//! [`ScreenLayout`] computed by `orientation::layout`; no widget code does
//! its own per-orientation geometry.

use std::cell::RefCell;

use gtk4 as gtk;
use gtk4::prelude::*;

use crate::orientation::{Rect, ScreenLayout, StripDirection};
use crate::session::CapturedImage;
use crate::ui::review;
use crate::ui::widgets;

/// References to the updateable widgets of the capture screen
pub struct CaptureWidgets {
    pub root: gtk::Overlay,
    fixed: gtk::Fixed,
    preview: gtk::Picture,
    filmstrip: gtk::ScrolledWindow,
    shutter: gtk::Button,
    cancel_button: gtk::Button,
    done_button: gtk::Button,
    error_label: gtk::Label,
    unavailable_box: gtk::Box,
    unavailable_label: gtk::Label,
    review: RefCell<Option<gtk::Box>>,
}

/// Create the capture screen
pub fn create_capture_screen(
    paintable: Option<&gtk::gdk::Paintable>,
    on_shutter: impl Fn() + 'static,
    on_done: impl Fn() + 'static,
    on_cancel: impl Fn() + 'static,
) -> CaptureWidgets {
    let fixed = gtk::Fixed::new();
    fixed.add_css_class("capture-screen");

    // Live preview
    let preview = gtk::Picture::new();
    preview.set_paintable(paintable);
    preview.set_content_fit(gtk::ContentFit::Cover);
    preview.add_css_class("camera-preview");
    fixed.put(&preview, 0.0, 0.0);

    // Filmstrip starts empty; refreshed by the window on every change
    let filmstrip = widgets::create_filmstrip(&[], StripDirection::Horizontal, |_| {});
    fixed.put(&filmstrip, 0.0, 0.0);

    let shutter = widgets::create_shutter_button(on_shutter);
    fixed.put(&shutter, 0.0, 0.0);

    let cancel_button = gtk::Button::with_label("Cancel");
    cancel_button.add_css_class("top-bar-button");
    cancel_button.connect_clicked(move |_| on_cancel());
    fixed.put(&cancel_button, 0.0, 0.0);

    let done_button = gtk::Button::with_label("Done");
    done_button.add_css_class("top-bar-button");
    done_button.add_css_class("suggested-action");
    done_button.connect_clicked(move |_| on_done());
    fixed.put(&done_button, 0.0, 0.0);

    let root = gtk::Overlay::new();
    root.set_child(Some(&fixed));

    // Recoverable-error banner, auto-cleared by the state machine
    let error_label = gtk::Label::new(None);
    error_label.add_css_class("error-banner");
    error_label.set_halign(gtk::Align::Center);
    error_label.set_valign(gtk::Align::Start);
    error_label.set_margin_top(60);
    error_label.set_visible(false);
    root.add_overlay(&error_label);

    // Terminal camera-unavailable message
    let unavailable_box = gtk::Box::new(gtk::Orientation::Vertical, 12);
    unavailable_box.add_css_class("unavailable-box");
    unavailable_box.set_halign(gtk::Align::Center);
    unavailable_box.set_valign(gtk::Align::Center);
    let unavailable_icon = gtk::Image::from_icon_name("camera-disabled-symbolic");
    unavailable_icon.set_pixel_size(64);
    let unavailable_label = gtk::Label::new(Some("Camera unavailable"));
    unavailable_label.add_css_class("unavailable-label");
    unavailable_box.append(&unavailable_icon);
    unavailable_box.append(&unavailable_label);
    unavailable_box.set_visible(false);
    root.add_overlay(&unavailable_box);

    CaptureWidgets {
        root,
        fixed,
        preview,
        filmstrip,
        shutter,
        cancel_button,
        done_button,
        error_label,
        unavailable_box,
        unavailable_label,
        review: RefCell::new(None),
    }
}

impl CaptureWidgets {
    fn place(&self, widget: &impl IsA<gtk::Widget>, rect: &Rect) {
        self.fixed.move_(widget, rect.x as f64, rect.y as f64);
        widget.set_size_request(rect.width, rect.height);
    }

    /// Position every element per the computed layout
    pub fn apply_layout(&self, layout: &ScreenLayout) {
        self.place(&self.preview, &layout.preview);
        self.place(&self.filmstrip, &layout.filmstrip);
        self.place(&self.shutter, &layout.shutter);
        self.place(&self.cancel_button, &layout.cancel_button);
        self.place(&self.done_button, &layout.done_button);
    }

    /// Disable the shutter while a capture is in flight
    pub fn set_capture_pending(&self, pending: bool) {
        self.shutter.set_sensitive(!pending);
    }

    /// Disable all input while the batch is encoding
    pub fn set_finishing(&self, finishing: bool) {
        self.shutter.set_sensitive(!finishing);
        self.done_button.set_sensitive(!finishing);
        self.cancel_button.set_sensitive(!finishing);
    }

    pub fn set_error(&self, error: Option<&str>) {
        match error {
            Some(message) => {
                self.error_label.set_text(message);
                self.error_label.set_visible(true);
            }
            None => self.error_label.set_visible(false),
        }
    }

    /// Rebuild the filmstrip from the current session
    pub fn update_filmstrip<F>(
        &self,
        images: &[CapturedImage],
        direction: StripDirection,
        on_select: F,
    ) where
        F: Fn(usize) + Clone + 'static,
    {
        widgets::update_filmstrip(&self.filmstrip, images, direction, on_select);
    }

    /// Show the review overlay for one image, replacing any existing one
    pub fn show_review(
        &self,
        image: &CapturedImage,
        index: usize,
        on_close: impl Fn() + Clone + 'static,
        on_delete: impl Fn(usize) + Clone + 'static,
    ) {
        self.close_review();
        let overlay = review::create_review_overlay(image, index, on_close, on_delete);
        self.root.add_overlay(&overlay);
        overlay.grab_focus();
        *self.review.borrow_mut() = Some(overlay);
    }

    pub fn close_review(&self) {
        if let Some(overlay) = self.review.borrow_mut().take() {
            self.root.remove_overlay(&overlay);
        }
    }

    /// Switch the whole screen into the terminal camera-unavailable state
    pub fn show_unavailable(&self, message: &str) {
        self.close_review();
        self.preview.set_visible(false);
        self.filmstrip.set_visible(false);
        self.shutter.set_visible(false);
        self.done_button.set_visible(false);
        self.unavailable_label.set_text(message);
        self.unavailable_box.set_visible(true);
    }
}
