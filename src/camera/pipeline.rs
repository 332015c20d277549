//! GStreamer pipeline for the live camera preview and still captures.
//!
//! Topology: default video source -> videoconvert -> tee, with one branch
//! feeding the GTK4 paintable sink for the preview and the other feeding an
//! RGB appsink kept at one buffer (newest frame wins) for single-shot grabs.

use std::time::Duration;

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use gtk4 as gtk;
use image::RgbImage;
use thiserror::Error;

use crate::config::FlashMode;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("GStreamer error: {0}")]
    Gstreamer(#[from] glib::Error),
    #[error("GStreamer bool error: {0}")]
    GstreamerBool(#[from] glib::BoolError),
    #[error("Failed to create element: {0}")]
    ElementCreation(String),
    #[error("State change failed")]
    StateChange,
    #[error("Timed out waiting for a frame")]
    CaptureTimeout,
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

/// Camera pipeline owning the preview paintable and the capture appsink.
///
/// The capture screen is the sole owner; the pipeline is stopped on every
/// exit path, with `Drop` as a backstop for abnormal dismissal.
pub struct CameraPipeline {
    pipeline: gst::Pipeline,
    paintable: gtk::gdk::Paintable,
    appsink: gst_app::AppSink,
    // Held so the bus watch stays alive for the pipeline's lifetime
    bus_watch: std::cell::RefCell<Option<gst::bus::BusWatchGuard>>,
}

impl CameraPipeline {
    /// Build the pipeline against the default video capture device.
    pub fn new() -> Result<Self, PipelineError> {
        gst::init()?;

        let pipeline = gst::Pipeline::new();

        // Default device selection is delegated to autovideosrc
        let source = gst::ElementFactory::make("autovideosrc")
            .build()
            .map_err(|_| PipelineError::ElementCreation("autovideosrc".into()))?;

        let convert = gst::ElementFactory::make("videoconvert")
            .build()
            .map_err(|_| PipelineError::ElementCreation("videoconvert".into()))?;

        let tee = gst::ElementFactory::make("tee")
            .build()
            .map_err(|_| PipelineError::ElementCreation("tee".into()))?;

        // Preview branch
        let preview_queue = gst::ElementFactory::make("queue")
            .build()
            .map_err(|_| PipelineError::ElementCreation("queue".into()))?;

        let preview_convert = gst::ElementFactory::make("videoconvert")
            .build()
            .map_err(|_| PipelineError::ElementCreation("videoconvert".into()))?;

        let preview_sink = gst::ElementFactory::make("gtk4paintablesink")
            .build()
            .map_err(|_| PipelineError::ElementCreation("gtk4paintablesink".into()))?;

        let paintable = preview_sink.property::<gtk::gdk::Paintable>("paintable");

        // Capture branch: drop stale frames so a grab always sees the newest
        let capture_queue = gst::ElementFactory::make("queue")
            .property("max-size-buffers", 1u32)
            .property_from_str("leaky", "downstream")
            .build()
            .map_err(|_| PipelineError::ElementCreation("queue".into()))?;

        let capture_convert = gst::ElementFactory::make("videoconvert")
            .build()
            .map_err(|_| PipelineError::ElementCreation("videoconvert".into()))?;

        let appsink = gst_app::AppSink::builder()
            .caps(
                &gst_video::VideoCapsBuilder::new()
                    .format(gst_video::VideoFormat::Rgb)
                    .build(),
            )
            .max_buffers(1)
            .drop(true)
            .sync(false)
            .build();

        pipeline.add_many([
            &source,
            &convert,
            &tee,
            &preview_queue,
            &preview_convert,
            &preview_sink,
            &capture_queue,
            &capture_convert,
            appsink.upcast_ref::<gst::Element>(),
        ])?;

        gst::Element::link_many([&source, &convert, &tee])?;
        gst::Element::link_many([&tee, &preview_queue, &preview_convert, &preview_sink])?;
        gst::Element::link_many([&tee, &capture_queue, &capture_convert])?;
        capture_convert.link(&appsink)?;

        Ok(Self {
            pipeline,
            paintable,
            appsink,
            bus_watch: std::cell::RefCell::new(None),
        })
    }

    /// Get the paintable for use in GTK widgets
    pub fn paintable(&self) -> &gtk::gdk::Paintable {
        &self.paintable
    }

    /// Appsink handle for capture tasks; the element is Send so a grab can
    /// run off the main loop.
    pub fn appsink(&self) -> gst_app::AppSink {
        self.appsink.clone()
    }

    /// Start streaming
    pub fn play(&self) -> Result<(), PipelineError> {
        log::info!("Starting camera pipeline");
        self.pipeline
            .set_state(gst::State::Playing)
            .map_err(|_| PipelineError::StateChange)?;
        Ok(())
    }

    /// Stop streaming and release the device
    pub fn stop(&self) -> Result<(), PipelineError> {
        log::info!("Stopping camera pipeline");
        self.pipeline
            .set_state(gst::State::Null)
            .map_err(|_| PipelineError::StateChange)?;
        Ok(())
    }

    /// Set up bus message handling
    pub fn setup_bus_watch<F>(&self, callback: F)
    where
        F: Fn(&gst::Bus, &gst::Message) -> glib::ControlFlow + Send + Sync + 'static,
    {
        if let Some(bus) = self.pipeline.bus() {
            match bus.add_watch(move |bus, msg| callback(bus, msg)) {
                Ok(guard) => *self.bus_watch.borrow_mut() = Some(guard),
                Err(e) => log::warn!("Failed to install bus watch: {}", e),
            }
        }
    }
}

impl Drop for CameraPipeline {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Pull one frame from the capture appsink and decode it.
///
/// Blocking; run on a worker thread, never on the GTK main loop. The flash
/// policy is part of the capture request contract, but this backend has no
/// flash control, so it is only logged.
pub fn pull_frame(
    appsink: &gst_app::AppSink,
    flash: FlashMode,
    timeout: Duration,
) -> Result<RgbImage, PipelineError> {
    log::debug!("Capture requested (flash {:?})", flash);

    let sample = appsink
        .try_pull_sample(gst::ClockTime::from_mseconds(timeout.as_millis() as u64))
        .ok_or(PipelineError::CaptureTimeout)?;

    let buffer = sample
        .buffer()
        .ok_or_else(|| PipelineError::InvalidFrame("no buffer in sample".into()))?;
    let caps = sample
        .caps()
        .ok_or_else(|| PipelineError::InvalidFrame("no caps in sample".into()))?;
    let info = gst_video::VideoInfo::from_caps(caps)?;
    let map = buffer
        .map_readable()
        .map_err(|_| PipelineError::InvalidFrame("failed to map buffer".into()))?;

    let width = info.width();
    let height = info.height();
    let stride = info.stride()[0] as usize;
    let row_bytes = width as usize * 3;

    if map.len() < stride * (height as usize - 1) + row_bytes {
        return Err(PipelineError::InvalidFrame(format!(
            "buffer too small: {} bytes for {}x{} stride {}",
            map.len(),
            width,
            height,
            stride
        )));
    }

    // Rows may be padded; copy them out stride-aware
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&map[start..start + row_bytes]);
    }

    RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| PipelineError::InvalidFrame("pixel buffer size mismatch".into()))
}
