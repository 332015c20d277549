//! Round shutter button.

use gtk4 as gtk;
use gtk4::prelude::*;

use crate::config;

/// Create the shutter button
pub fn create_shutter_button<F>(on_click: F) -> gtk::Button
where
    F: Fn() + 'static,
{
    let button = gtk::Button::new();
    button.add_css_class("shutter-button");
    button.set_size_request(config::SHUTTER_SIZE, config::SHUTTER_SIZE);

    let icon = gtk::Image::from_icon_name("camera-photo-symbolic");
    icon.set_pixel_size(36);
    icon.add_css_class("shutter-icon");
    button.set_child(Some(&icon));

    button.connect_clicked(move |_| on_click());

    button
}
