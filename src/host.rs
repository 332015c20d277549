//! Host application boundary.
//!
//! One entry point opens the capture screen with a completion callback; the
//! callback is invoked on the GTK main loop with the final encoded batch.

use std::rc::Rc;
use std::sync::Arc;

use libadwaita as adw;
use serde::{Deserialize, Serialize};

use crate::app::AppContext;
use crate::config::CaptureOptions;
use crate::encode::EncodedBatch;
use crate::ui::CaptureWindow;

/// What the host receives when the capture screen exits.
///
/// Whether `Cancelled` is delivered at all depends on the configured
/// [`crate::config::CancelBehavior`]: with `Discard` the callback simply
/// never fires on cancel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaptureOutcome {
    /// User confirmed; batch holds every remaining image in capture order.
    Finished { batch: EncodedBatch },
    /// User cancelled with `DeliverPartial` configured.
    Cancelled { batch: EncodedBatch },
}

impl CaptureOutcome {
    pub fn batch(&self) -> &EncodedBatch {
        match self {
            Self::Finished { batch } | Self::Cancelled { batch } => batch,
        }
    }
}

/// Completion callback type. Invoked at most once, on the GTK main loop.
pub type CompletionHandler = Box<dyn Fn(CaptureOutcome) + 'static>;

/// Open the capture screen on the given application.
///
/// Owns its own tokio runtime so the host needs no async machinery of its
/// own. The returned window is already presented.
pub fn open<F>(app: &adw::Application, options: CaptureOptions, on_complete: F) -> Rc<CaptureWindow>
where
    F: Fn(CaptureOutcome) + 'static,
{
    let runtime = Arc::new(
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime"),
    );

    let (ctx, rx) = AppContext::new(runtime, options, Box::new(on_complete));
    CaptureWindow::open(app, ctx, rx)
}
