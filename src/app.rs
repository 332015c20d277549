//! Application context - bridges the GTK-free state machine with GTK.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use gtk4 as gtk;
use tokio::sync::mpsc;

use crate::camera::{self, CameraPipeline};
use crate::config::{self, CaptureOptions, FlashMode};
use crate::host::{CaptureOutcome, CompletionHandler};
use crate::orientation::{self, OrientationWatch};
use crate::state::{CaptureCommand, CaptureEvent, CaptureStateMachine};

/// Messages sent from async tasks to the GTK main loop
pub enum AppMessage {
    /// Process a capture event through the state machine
    Event(CaptureEvent),
}

/// Sender that can dispatch messages to the GTK main loop from any thread
#[derive(Clone)]
pub struct MessageSender {
    /// tokio channel drained from a glib timeout for thread-safe dispatch
    tx: mpsc::UnboundedSender<AppMessage>,
}

impl MessageSender {
    pub fn send(&self, msg: AppMessage) {
        let _ = self.tx.send(msg);
    }
}

/// Application context - holds state and executes state machine commands
pub struct AppContext {
    /// The GTK-free state machine
    pub state_machine: RefCell<CaptureStateMachine>,
    /// GStreamer camera pipeline; present while the screen owns the device
    pub camera: RefCell<Option<CameraPipeline>>,
    /// Tokio runtime for capture, encoding and sensor tasks
    pub runtime: Arc<tokio::runtime::Runtime>,
    /// Sender for dispatching messages to the GTK main loop
    pub message_tx: MessageSender,
    /// Accelerometer subscription; dropping it releases the claim
    orientation_watch: RefCell<Option<OrientationWatch>>,
    /// Host completion callback, consumed on first delivery
    on_complete: RefCell<Option<CompletionHandler>>,
}

impl AppContext {
    pub fn new(
        runtime: Arc<tokio::runtime::Runtime>,
        options: CaptureOptions,
        on_complete: CompletionHandler,
    ) -> (Rc<Self>, mpsc::UnboundedReceiver<AppMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let ctx = Rc::new(Self {
            state_machine: RefCell::new(CaptureStateMachine::new(options)),
            camera: RefCell::new(None),
            runtime,
            message_tx: MessageSender { tx },
            orientation_watch: RefCell::new(None),
            on_complete: RefCell::new(Some(on_complete)),
        });

        if options.track_orientation {
            let tx = ctx.message_tx.clone();
            let watch = orientation::watch(&ctx.runtime, move |o| {
                tx.send(AppMessage::Event(CaptureEvent::OrientationChanged(o)));
            });
            *ctx.orientation_watch.borrow_mut() = Some(watch);
        }

        (ctx, rx)
    }

    /// Start the camera and return the preview paintable.
    ///
    /// On failure a `CameraFailed` event is queued so the screen lands in
    /// the camera-unavailable state instead of failing silently.
    pub fn init_camera(&self) -> Option<gtk::gdk::Paintable> {
        let pipeline = match CameraPipeline::new().and_then(|p| {
            p.play()?;
            Ok(p)
        }) {
            Ok(p) => p,
            Err(e) => {
                self.send_event(CaptureEvent::CameraFailed {
                    error: e.to_string(),
                });
                return None;
            }
        };

        let paintable = pipeline.paintable().clone();

        // Surface pipeline errors (device unplugged, stream stall) as a
        // camera failure
        let tx = self.message_tx.clone();
        pipeline.setup_bus_watch(move |_bus, msg| {
            if let gstreamer::MessageView::Error(err) = msg.view() {
                tx.send(AppMessage::Event(CaptureEvent::CameraFailed {
                    error: err.error().to_string(),
                }));
            }
            glib::ControlFlow::Continue
        });

        *self.camera.borrow_mut() = Some(pipeline);
        Some(paintable)
    }

    /// Send an event to the state machine (from any thread)
    pub fn send_event(&self, event: CaptureEvent) {
        self.message_tx.send(AppMessage::Event(event));
    }

    /// Process an event and execute resulting commands.
    /// Must be called from the GTK main loop.
    pub fn process_event(self: &Rc<Self>, event: CaptureEvent) -> Vec<CaptureCommand> {
        let commands = self.state_machine.borrow_mut().process(event);

        for cmd in &commands {
            self.execute_command(cmd.clone());
        }

        commands
    }

    /// Execute a command from the state machine
    fn execute_command(self: &Rc<Self>, cmd: CaptureCommand) {
        match cmd {
            CaptureCommand::RequestCapture { flash } => {
                self.request_capture(flash);
            }

            CaptureCommand::EncodeBatch { images } => {
                let tx = self.message_tx.clone();
                self.runtime.spawn(async move {
                    let batch = crate::encode::encode_batch(&images);
                    tx.send(AppMessage::Event(CaptureEvent::BatchEncoded { batch }));
                });
            }

            CaptureCommand::Deliver { outcome } => {
                self.deliver(outcome);
            }

            CaptureCommand::Exit => {
                self.release_resources();
                // Window close is handled by the window layer
            }

            CaptureCommand::ScheduleErrorClear => {
                let tx = self.message_tx.clone();
                glib::timeout_add_once(
                    Duration::from_millis(config::ERROR_DISPLAY_DURATION_MS),
                    move || {
                        tx.send(AppMessage::Event(CaptureEvent::ClearError));
                    },
                );
            }

            CaptureCommand::UpdateUi => {
                // Handled by the window after processing events
            }
        }
    }

    fn request_capture(&self, flash: FlashMode) {
        let Some(appsink) = self.camera.borrow().as_ref().map(|c| c.appsink()) else {
            self.send_event(CaptureEvent::CaptureErrored {
                error: "camera not running".into(),
            });
            return;
        };

        let tx = self.message_tx.clone();
        self.runtime.spawn_blocking(move || {
            let timeout = Duration::from_millis(config::CAPTURE_TIMEOUT_MS);
            let event = match camera::pull_frame(&appsink, flash, timeout) {
                Ok(pixels) => CaptureEvent::CaptureFinished { pixels },
                Err(e) => CaptureEvent::CaptureErrored {
                    error: e.to_string(),
                },
            };
            tx.send(AppMessage::Event(event));
        });
    }

    /// Invoke the host callback. The callback is taken so it can never fire
    /// twice.
    fn deliver(&self, outcome: CaptureOutcome) {
        match self.on_complete.borrow_mut().take() {
            Some(callback) => {
                log::info!(
                    "Delivering {} photos to host",
                    outcome.batch().len()
                );
                callback(outcome);
            }
            None => log::warn!("Completion callback already consumed"),
        }
    }

    /// Stop the camera and release the orientation claim. Safe to call more
    /// than once; runs on every exit path.
    pub fn release_resources(&self) {
        if let Some(camera) = self.camera.borrow_mut().take() {
            if let Err(e) = camera.stop() {
                log::warn!("Failed to stop camera pipeline: {}", e);
            }
        }
        self.orientation_watch.borrow_mut().take();
    }
}
