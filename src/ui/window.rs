//! Capture window - owns the widget tree and reacts to state changes.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use gtk4 as gtk;
use gtk4::prelude::*;
use libadwaita as adw;
use libadwaita::prelude::*;
use tokio::sync::mpsc;

use crate::app::{AppContext, AppMessage};
use crate::config;
use crate::orientation;
use crate::state::{CaptureCommand, CaptureEvent, ScreenState};
use crate::ui::screen::{self, CaptureWidgets};

const DEFAULT_WIDTH: i32 = 480;
const DEFAULT_HEIGHT: i32 = 800;

/// The capture screen window
pub struct CaptureWindow {
    pub window: adw::ApplicationWindow,
    ctx: Rc<AppContext>,
    widgets: CaptureWidgets,
    /// Set once the screen is done; stops the message pump, which holds the
    /// last strong reference to this struct.
    closed: Cell<bool>,
}

impl CaptureWindow {
    /// Build the window, start the camera and the message pump, present.
    pub fn open(
        app: &adw::Application,
        ctx: Rc<AppContext>,
        mut rx: mpsc::UnboundedReceiver<AppMessage>,
    ) -> Rc<Self> {
        let window = adw::ApplicationWindow::builder()
            .application(app)
            .title("Scan documents")
            .default_width(DEFAULT_WIDTH)
            .default_height(DEFAULT_HEIGHT)
            .build();

        // A failed start queues CameraFailed; the pump routes it into the
        // camera-unavailable state after the window is up.
        let paintable = ctx.init_camera();

        let widgets = {
            let ctx_shutter = ctx.clone();
            let ctx_done = ctx.clone();
            let ctx_cancel = ctx.clone();
            screen::create_capture_screen(
                paintable.as_ref(),
                move || ctx_shutter.send_event(CaptureEvent::Shutter),
                move || ctx_done.send_event(CaptureEvent::Finish),
                move || ctx_cancel.send_event(CaptureEvent::Cancel),
            )
        };
        window.set_content(Some(&widgets.root));

        let capture_window = Rc::new(Self {
            window,
            ctx,
            widgets,
            closed: Cell::new(false),
        });

        // The camera and sensor must be released even on forced dismissal
        let on_close = Rc::downgrade(&capture_window);
        capture_window.window.connect_close_request(move |_| {
            if let Some(window) = on_close.upgrade() {
                window.ctx.release_resources();
                window.closed.set(true);
            }
            glib::Propagation::Proceed
        });

        capture_window.load_css();
        capture_window.update_ui();

        // Drain the tokio channel from the GTK main loop. The pump keeps the
        // window alive until the screen exits.
        let pump = capture_window.clone();
        glib::timeout_add_local(
            Duration::from_millis(config::MESSAGE_POLL_INTERVAL_MS),
            move || {
                while let Ok(msg) = rx.try_recv() {
                    pump.handle_message(msg);
                }
                if pump.closed.get() {
                    glib::ControlFlow::Break
                } else {
                    glib::ControlFlow::Continue
                }
            },
        );

        capture_window.window.present();
        capture_window
    }

    fn load_css(&self) {
        let provider = gtk::CssProvider::new();
        provider.load_from_string(include_str!("../../resources/style.css"));

        gtk::style_context_add_provider_for_display(
            &gtk::gdk::Display::default().expect("No display"),
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }

    /// Handle app messages - main entry point for state updates
    pub fn handle_message(self: &Rc<Self>, msg: AppMessage) {
        match msg {
            AppMessage::Event(event) => {
                let commands = self.ctx.process_event(event);

                if commands.iter().any(|c| matches!(c, CaptureCommand::Exit)) {
                    self.closed.set(true);
                    self.window.close();
                    return;
                }
                if commands
                    .iter()
                    .any(|c| matches!(c, CaptureCommand::UpdateUi))
                {
                    self.update_ui();
                }
            }
        }
    }

    fn screen_size(&self) -> (i32, i32) {
        let width = self.window.width();
        let height = self.window.height();
        if width > 0 && height > 0 {
            (width, height)
        } else {
            (DEFAULT_WIDTH, DEFAULT_HEIGHT)
        }
    }

    /// Update the UI to reflect current state
    fn update_ui(self: &Rc<Self>) {
        let sm = self.ctx.state_machine.borrow();

        let (width, height) = self.screen_size();
        let layout = orientation::layout(width, height, sm.orientation);
        self.widgets.apply_layout(&layout);

        let ctx = self.ctx.clone();
        self.widgets.update_filmstrip(
            sm.session.images(),
            layout.strip_direction,
            move |idx| ctx.send_event(CaptureEvent::SelectThumbnail(idx)),
        );

        self.widgets.set_error(sm.error.as_deref());

        match sm.state {
            ScreenState::Live => {
                self.widgets.close_review();
                self.widgets.set_finishing(false);
                self.widgets.set_capture_pending(sm.capture_pending);
            }
            ScreenState::Reviewing(index) => {
                if let Some(image) = sm.session.get(index) {
                    let ctx_close = self.ctx.clone();
                    let ctx_delete = self.ctx.clone();
                    self.widgets.show_review(
                        image,
                        index,
                        move || ctx_close.send_event(CaptureEvent::CloseReview),
                        move |idx| ctx_delete.send_event(CaptureEvent::DeleteImage(idx)),
                    );
                }
            }
            ScreenState::Finishing { .. } => {
                self.widgets.close_review();
                self.widgets.set_finishing(true);
            }
            ScreenState::CameraUnavailable => {
                self.widgets.show_unavailable("Camera unavailable");
            }
        }
    }
}
