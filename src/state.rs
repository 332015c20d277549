//! GTK-free state machine for the capture screen.
//!
//! All business logic lives here so it can be tested without GTK or a
//! camera. The UI layer feeds [`CaptureEvent`]s in and executes the
//! [`CaptureCommand`]s that come back.

use image::RgbImage;

use crate::config::{CancelBehavior, CaptureOptions, FlashMode};
use crate::encode::EncodedBatch;
use crate::host::CaptureOutcome;
use crate::orientation::DeviceOrientation;
use crate::session::{CaptureSession, CapturedImage};

/// Capture screen states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    /// Camera streaming, filmstrip visible, shutter active
    Live,
    /// Full-screen review of the image at this session index
    Reviewing(usize),
    /// Encoding the batch; input is ignored until the batch lands
    Finishing { cancelled: bool },
    /// No camera device or permission denied; only cancel exits
    CameraUnavailable,
}

/// Events that drive the state machine
#[derive(Clone)]
pub enum CaptureEvent {
    // Camera lifecycle
    CameraFailed { error: String },

    // User actions
    Shutter,
    SelectThumbnail(usize),
    CloseReview,
    DeleteImage(usize),
    Finish,
    Cancel,

    // Async completions, already marshalled onto the UI thread
    CaptureFinished { pixels: RgbImage },
    CaptureErrored { error: String },
    BatchEncoded { batch: EncodedBatch },

    // Sensor
    OrientationChanged(DeviceOrientation),

    // Internal
    ClearError,
}

/// Commands emitted for the app/UI layer to execute
#[derive(Debug, Clone)]
pub enum CaptureCommand {
    /// Issue a single-shot capture on the camera pipeline
    RequestCapture { flash: FlashMode },
    /// Encode the batch off the main loop; completion returns as
    /// `CaptureEvent::BatchEncoded`
    EncodeBatch { images: Vec<CapturedImage> },
    /// Invoke the host completion callback
    Deliver { outcome: CaptureOutcome },
    /// Release the camera and sensor and close the window
    Exit,
    /// Schedule error clear after timeout
    ScheduleErrorClear,
    /// Update UI to reflect new state
    UpdateUi,
}

/// The capture screen state machine
#[derive(Debug)]
pub struct CaptureStateMachine {
    pub state: ScreenState,
    pub session: CaptureSession,
    pub orientation: DeviceOrientation,
    /// A capture request is in flight; further shutter presses are ignored
    /// until it completes, so completions always land in capture order.
    pub capture_pending: bool,
    pub error: Option<String>,
    options: CaptureOptions,
}

impl CaptureStateMachine {
    pub fn new(options: CaptureOptions) -> Self {
        Self {
            state: ScreenState::Live,
            session: CaptureSession::new(),
            orientation: DeviceOrientation::Portrait,
            capture_pending: false,
            error: None,
            options,
        }
    }

    /// Process an event and return commands to execute
    pub fn process(&mut self, event: CaptureEvent) -> Vec<CaptureCommand> {
        let mut commands = Vec::new();

        // Once encoding has started the screen only waits for the batch.
        if let ScreenState::Finishing { cancelled } = self.state {
            if let CaptureEvent::BatchEncoded { batch } = event {
                let outcome = if cancelled {
                    CaptureOutcome::Cancelled { batch }
                } else {
                    CaptureOutcome::Finished { batch }
                };
                commands.push(CaptureCommand::Deliver { outcome });
                commands.push(CaptureCommand::Exit);
            }
            return commands;
        }

        match event {
            CaptureEvent::CameraFailed { error } => {
                log::error!("Camera unavailable: {}", error);
                self.state = ScreenState::CameraUnavailable;
                self.capture_pending = false;
                commands.push(CaptureCommand::UpdateUi);
            }

            CaptureEvent::Shutter => {
                if self.state != ScreenState::Live {
                    return commands;
                }
                if self.capture_pending {
                    log::debug!("Shutter ignored, capture already in flight");
                    return commands;
                }
                self.capture_pending = true;
                commands.push(CaptureCommand::RequestCapture {
                    flash: self.options.flash_mode,
                });
                commands.push(CaptureCommand::UpdateUi);
            }

            CaptureEvent::CaptureFinished { pixels } => {
                self.capture_pending = false;
                if self.state == ScreenState::CameraUnavailable {
                    return commands;
                }
                self.session.push(CapturedImage {
                    pixels,
                    orientation: self.orientation,
                });
                commands.push(CaptureCommand::UpdateUi);
            }

            CaptureEvent::CaptureErrored { error } => {
                log::warn!("Capture failed: {}", error);
                self.capture_pending = false;
                self.error = Some("Capture failed, try again".into());
                commands.push(CaptureCommand::ScheduleErrorClear);
                commands.push(CaptureCommand::UpdateUi);
            }

            CaptureEvent::SelectThumbnail(index) => {
                if self.state == ScreenState::Live && index < self.session.len() {
                    self.state = ScreenState::Reviewing(index);
                    commands.push(CaptureCommand::UpdateUi);
                }
            }

            CaptureEvent::CloseReview => {
                if matches!(self.state, ScreenState::Reviewing(_)) {
                    self.state = ScreenState::Live;
                    commands.push(CaptureCommand::UpdateUi);
                }
            }

            CaptureEvent::DeleteImage(index) => {
                if !self.session.remove(index) {
                    return commands;
                }
                if let ScreenState::Reviewing(reviewing) = self.state {
                    if reviewing == index {
                        self.state = ScreenState::Live;
                    } else if reviewing > index {
                        self.state = ScreenState::Reviewing(reviewing - 1);
                    }
                }
                commands.push(CaptureCommand::UpdateUi);
            }

            CaptureEvent::Finish => {
                if self.state == ScreenState::CameraUnavailable {
                    return commands;
                }
                self.state = ScreenState::Finishing { cancelled: false };
                commands.push(CaptureCommand::EncodeBatch {
                    images: self.session.images().to_vec(),
                });
                commands.push(CaptureCommand::UpdateUi);
            }

            CaptureEvent::Cancel => match self.options.cancel_behavior {
                CancelBehavior::Discard => {
                    commands.push(CaptureCommand::Exit);
                }
                CancelBehavior::DeliverPartial => {
                    self.state = ScreenState::Finishing { cancelled: true };
                    commands.push(CaptureCommand::EncodeBatch {
                        images: self.session.images().to_vec(),
                    });
                    commands.push(CaptureCommand::UpdateUi);
                }
            },

            CaptureEvent::OrientationChanged(orientation) => {
                // Last write wins; the same value twice is a no-op so
                // repeated notifications never trigger extra layout passes.
                if self.orientation != orientation {
                    self.orientation = orientation;
                    commands.push(CaptureCommand::UpdateUi);
                }
            }

            CaptureEvent::BatchEncoded { .. } => {
                // Only meaningful in Finishing, handled above.
            }

            CaptureEvent::ClearError => {
                if self.error.take().is_some() {
                    commands.push(CaptureCommand::UpdateUi);
                }
            }
        }

        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> CaptureStateMachine {
        CaptureStateMachine::new(CaptureOptions::default())
    }

    fn machine_with_cancel(cancel_behavior: CancelBehavior) -> CaptureStateMachine {
        CaptureStateMachine::new(CaptureOptions {
            cancel_behavior,
            ..CaptureOptions::default()
        })
    }

    fn frame(width: u32) -> RgbImage {
        RgbImage::new(width, 2)
    }

    fn capture_one(sm: &mut CaptureStateMachine, width: u32) {
        let cmds = sm.process(CaptureEvent::Shutter);
        assert!(cmds
            .iter()
            .any(|c| matches!(c, CaptureCommand::RequestCapture { .. })));
        sm.process(CaptureEvent::CaptureFinished { pixels: frame(width) });
    }

    #[test]
    fn test_initial_state() {
        let sm = machine();
        assert_eq!(sm.state, ScreenState::Live);
        assert!(sm.session.is_empty());
        assert!(!sm.capture_pending);
        assert_eq!(sm.orientation, DeviceOrientation::Portrait);
    }

    #[test]
    fn test_capture_appends_in_order() {
        let mut sm = machine();
        for w in 1..=3 {
            capture_one(&mut sm, w);
        }
        assert_eq!(sm.session.len(), 3);
        let widths: Vec<u32> = sm
            .session
            .images()
            .iter()
            .map(|i| i.pixels.width())
            .collect();
        assert_eq!(widths, vec![1, 2, 3]);
        assert_eq!(sm.state, ScreenState::Live);
    }

    #[test]
    fn test_shutter_serialized_while_pending() {
        let mut sm = machine();
        let cmds = sm.process(CaptureEvent::Shutter);
        assert!(cmds
            .iter()
            .any(|c| matches!(c, CaptureCommand::RequestCapture { .. })));
        assert!(sm.capture_pending);

        // Second press while in flight issues no second capture
        let cmds = sm.process(CaptureEvent::Shutter);
        assert!(cmds.is_empty());

        sm.process(CaptureEvent::CaptureFinished { pixels: frame(4) });
        assert!(!sm.capture_pending);
        assert_eq!(sm.session.len(), 1);
    }

    #[test]
    fn test_capture_failure_is_recoverable() {
        let mut sm = machine();
        capture_one(&mut sm, 1);

        sm.process(CaptureEvent::Shutter);
        let cmds = sm.process(CaptureEvent::CaptureErrored {
            error: "pipeline stalled".into(),
        });
        assert!(cmds
            .iter()
            .any(|c| matches!(c, CaptureCommand::ScheduleErrorClear)));
        assert!(sm.error.is_some());
        // Prior images untouched, shutter usable again
        assert_eq!(sm.session.len(), 1);
        assert!(!sm.capture_pending);

        let cmds = sm.process(CaptureEvent::ClearError);
        assert!(sm.error.is_none());
        assert!(cmds.iter().any(|c| matches!(c, CaptureCommand::UpdateUi)));
        // Clearing an already-clear error changes nothing
        assert!(sm.process(CaptureEvent::ClearError).is_empty());
    }

    #[test]
    fn test_review_open_and_close() {
        let mut sm = machine();
        capture_one(&mut sm, 1);
        capture_one(&mut sm, 2);

        sm.process(CaptureEvent::SelectThumbnail(1));
        assert_eq!(sm.state, ScreenState::Reviewing(1));

        sm.process(CaptureEvent::CloseReview);
        assert_eq!(sm.state, ScreenState::Live);

        // Out-of-bounds selection is a no-op
        let cmds = sm.process(CaptureEvent::SelectThumbnail(5));
        assert!(cmds.is_empty());
        assert_eq!(sm.state, ScreenState::Live);
    }

    #[test]
    fn test_shutter_ignored_while_reviewing() {
        let mut sm = machine();
        capture_one(&mut sm, 1);
        sm.process(CaptureEvent::SelectThumbnail(0));

        let cmds = sm.process(CaptureEvent::Shutter);
        assert!(cmds.is_empty());
        assert!(!sm.capture_pending);
    }

    #[test]
    fn test_delete_reindexes_and_closes_review() {
        let mut sm = machine();
        for w in 1..=3 {
            capture_one(&mut sm, w);
        }

        // Deleting the reviewed image closes the overlay
        sm.process(CaptureEvent::SelectThumbnail(1));
        sm.process(CaptureEvent::DeleteImage(1));
        assert_eq!(sm.state, ScreenState::Live);
        assert_eq!(sm.session.len(), 2);
        assert_eq!(sm.session.get(1).unwrap().pixels.width(), 3);

        // Deleting an earlier image shifts the reviewed index
        sm.process(CaptureEvent::SelectThumbnail(1));
        sm.process(CaptureEvent::DeleteImage(0));
        assert_eq!(sm.state, ScreenState::Reviewing(0));
        assert_eq!(sm.session.len(), 1);
    }

    #[test]
    fn test_delete_out_of_range_is_noop() {
        let mut sm = machine();
        capture_one(&mut sm, 1);

        let cmds = sm.process(CaptureEvent::DeleteImage(7));
        assert!(cmds.is_empty());
        assert_eq!(sm.session.len(), 1);
    }

    #[test]
    fn test_finish_encodes_and_delivers_once() {
        let mut sm = machine();
        capture_one(&mut sm, 1);
        capture_one(&mut sm, 2);

        let cmds = sm.process(CaptureEvent::Finish);
        let images = cmds
            .iter()
            .find_map(|c| match c {
                CaptureCommand::EncodeBatch { images } => Some(images.clone()),
                _ => None,
            })
            .expect("finish must request encoding");
        assert_eq!(images.len(), 2);
        assert_eq!(sm.state, ScreenState::Finishing { cancelled: false });

        // Input is ignored while finishing
        assert!(sm.process(CaptureEvent::Shutter).is_empty());
        assert!(sm.process(CaptureEvent::DeleteImage(0)).is_empty());

        let cmds = sm.process(CaptureEvent::BatchEncoded {
            batch: crate::encode::encode_batch(&images),
        });
        let delivered = cmds
            .iter()
            .find_map(|c| match c {
                CaptureCommand::Deliver { outcome } => Some(outcome.clone()),
                _ => None,
            })
            .expect("batch must be delivered");
        match delivered {
            CaptureOutcome::Finished { batch } => {
                assert_eq!(batch.len(), 2);
                assert_eq!(batch.encoded_count(), 2);
            }
            CaptureOutcome::Cancelled { .. } => panic!("finish delivered as cancel"),
        }
        assert!(cmds.iter().any(|c| matches!(c, CaptureCommand::Exit)));
    }

    #[test]
    fn test_finish_empty_session_delivers_empty_batch() {
        let mut sm = machine();
        sm.process(CaptureEvent::Finish);
        let cmds = sm.process(CaptureEvent::BatchEncoded {
            batch: EncodedBatch::default(),
        });
        let delivered = cmds.iter().find_map(|c| match c {
            CaptureCommand::Deliver { outcome } => Some(outcome.clone()),
            _ => None,
        });
        match delivered {
            Some(CaptureOutcome::Finished { batch }) => assert!(batch.is_empty()),
            other => panic!("expected empty finished batch, got {:?}", other),
        }
    }

    #[test]
    fn test_cancel_discard_exits_without_delivery() {
        let mut sm = machine_with_cancel(CancelBehavior::Discard);
        capture_one(&mut sm, 1);

        let cmds = sm.process(CaptureEvent::Cancel);
        assert!(cmds.iter().any(|c| matches!(c, CaptureCommand::Exit)));
        assert!(!cmds
            .iter()
            .any(|c| matches!(c, CaptureCommand::Deliver { .. })));
        assert!(!cmds
            .iter()
            .any(|c| matches!(c, CaptureCommand::EncodeBatch { .. })));
    }

    #[test]
    fn test_cancel_deliver_partial_encodes_batch() {
        let mut sm = machine_with_cancel(CancelBehavior::DeliverPartial);
        capture_one(&mut sm, 1);

        let cmds = sm.process(CaptureEvent::Cancel);
        let images = cmds
            .iter()
            .find_map(|c| match c {
                CaptureCommand::EncodeBatch { images } => Some(images.clone()),
                _ => None,
            })
            .expect("partial cancel must encode");
        assert_eq!(sm.state, ScreenState::Finishing { cancelled: true });

        let cmds = sm.process(CaptureEvent::BatchEncoded {
            batch: crate::encode::encode_batch(&images),
        });
        assert!(cmds.iter().any(|c| matches!(
            c,
            CaptureCommand::Deliver {
                outcome: CaptureOutcome::Cancelled { .. }
            }
        )));
    }

    #[test]
    fn test_orientation_tagging_and_idempotence() {
        let mut sm = machine();

        let cmds = sm.process(CaptureEvent::OrientationChanged(
            DeviceOrientation::LandscapeClockwise,
        ));
        assert!(cmds.iter().any(|c| matches!(c, CaptureCommand::UpdateUi)));

        // Same orientation again: no layout pass
        let cmds = sm.process(CaptureEvent::OrientationChanged(
            DeviceOrientation::LandscapeClockwise,
        ));
        assert!(cmds.is_empty());

        capture_one(&mut sm, 4);
        assert_eq!(
            sm.session.get(0).unwrap().orientation,
            DeviceOrientation::LandscapeClockwise
        );

        // Rotating after a capture never retags existing images
        sm.process(CaptureEvent::OrientationChanged(DeviceOrientation::Portrait));
        assert_eq!(
            sm.session.get(0).unwrap().orientation,
            DeviceOrientation::LandscapeClockwise
        );
    }

    #[test]
    fn test_camera_unavailable_is_terminal() {
        let mut sm = machine();
        sm.process(CaptureEvent::CameraFailed {
            error: "no device".into(),
        });
        assert_eq!(sm.state, ScreenState::CameraUnavailable);

        assert!(sm.process(CaptureEvent::Shutter).is_empty());
        assert!(sm.process(CaptureEvent::SelectThumbnail(0)).is_empty());

        // Cancel still exits
        let cmds = sm.process(CaptureEvent::Cancel);
        assert!(cmds.iter().any(|c| matches!(c, CaptureCommand::Exit)));
    }

    #[test]
    fn test_late_capture_dropped_after_camera_failure() {
        let mut sm = machine();
        sm.process(CaptureEvent::Shutter);
        sm.process(CaptureEvent::CameraFailed {
            error: "device removed".into(),
        });

        let cmds = sm.process(CaptureEvent::CaptureFinished { pixels: frame(2) });
        assert!(cmds.is_empty());
        assert!(sm.session.is_empty());
    }
}
