//! Demo host application for the capture screen.
//!
//! Opens the capture screen and prints the delivered batch as JSON, the way
//! a plugin host would receive it.

use libadwaita as adw;
use libadwaita::prelude::*;

use docscan_capture::{CancelBehavior, CaptureOptions, CaptureOutcome};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting DocScan capture demo");

    let options = CaptureOptions {
        cancel_behavior: if std::env::args().any(|a| a == "--deliver-on-cancel") {
            CancelBehavior::DeliverPartial
        } else {
            CancelBehavior::Discard
        },
        ..CaptureOptions::default()
    };

    let app = adw::Application::builder()
        .application_id("com.docscan.capture.demo")
        .build();

    app.connect_activate(move |app| {
        docscan_capture::open(app, options, |outcome: CaptureOutcome| {
            let batch = outcome.batch();
            log::info!(
                "Host received {} photos ({} encoded)",
                batch.len(),
                batch.encoded_count()
            );
            match serde_json::to_string(&outcome) {
                Ok(json) => println!("{}", json),
                Err(e) => log::error!("Failed to serialize outcome: {}", e),
            }
        });
    });

    app.run();

    log::info!("DocScan capture demo shutting down");
}
