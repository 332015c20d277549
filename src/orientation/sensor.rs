//! Orientation sensor subscription over D-Bus.
//!
//! Talks to `net.hadess.SensorProxy` (iio-sensor-proxy). The accelerometer is
//! claimed when the watch starts and released when the [`OrientationWatch`]
//! guard is dropped, so the observer can never outlive the capture screen.

use futures_util::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;

use super::DeviceOrientation;

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),
    #[error("no accelerometer available")]
    NoAccelerometer,
}

#[zbus::proxy(
    interface = "net.hadess.SensorProxy",
    default_service = "net.hadess.SensorProxy",
    default_path = "/net/hadess/SensorProxy"
)]
trait Sensors {
    fn claim_accelerometer(&self) -> zbus::Result<()>;

    fn release_accelerometer(&self) -> zbus::Result<()>;

    #[zbus(property)]
    fn has_accelerometer(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn accelerometer_orientation(&self) -> zbus::Result<String>;
}

/// Handle for the running orientation subscription.
///
/// Dropping the handle stops the watcher task, which releases the
/// accelerometer claim before exiting.
pub struct OrientationWatch {
    shutdown_tx: mpsc::Sender<()>,
}

impl OrientationWatch {
    /// Stop the subscription explicitly.
    pub fn close(&self) {
        let _ = self.shutdown_tx.try_send(());
    }
}

impl Drop for OrientationWatch {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.try_send(());
    }
}

/// Claim the accelerometer and spawn a task forwarding orientation changes.
///
/// The callback fires on the tokio runtime; callers must marshal back onto
/// the UI thread themselves (the app context routes through its message
/// channel). Indeterminate readings ("undefined", device flat) are dropped
/// so the last valid orientation stays in effect.
pub fn watch<F>(runtime: &tokio::runtime::Runtime, callback: F) -> OrientationWatch
where
    F: Fn(DeviceOrientation) + Send + Sync + 'static,
{
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

    runtime.spawn(async move {
        if let Err(e) = run(callback, shutdown_rx).await {
            log::warn!("Orientation sensor unavailable: {}", e);
        }
    });

    OrientationWatch { shutdown_tx }
}

async fn run<F>(callback: F, mut shutdown_rx: mpsc::Receiver<()>) -> Result<(), SensorError>
where
    F: Fn(DeviceOrientation) + Send + Sync + 'static,
{
    let connection = zbus::Connection::system().await?;
    let proxy = SensorsProxy::new(&connection).await?;

    if !proxy.has_accelerometer().await? {
        return Err(SensorError::NoAccelerometer);
    }

    proxy.claim_accelerometer().await?;
    log::info!("Accelerometer claimed");

    // Report the current orientation immediately so the first layout pass
    // does not wait for the device to move.
    if let Ok(value) = proxy.accelerometer_orientation().await {
        if let Some(orientation) = DeviceOrientation::from_sensor(&value) {
            callback(orientation);
        }
    }

    let mut changes = proxy.receive_accelerometer_orientation_changed().await;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                log::info!("Orientation watch shutdown requested");
                break;
            }
            change = changes.next() => {
                match change {
                    Some(change) => match change.get().await {
                        Ok(value) => {
                            match DeviceOrientation::from_sensor(&value) {
                                Some(orientation) => callback(orientation),
                                None => log::debug!("Ignoring orientation reading: {}", value),
                            }
                        }
                        Err(e) => log::warn!("Failed to read orientation change: {}", e),
                    },
                    None => {
                        log::warn!("Orientation property stream ended");
                        break;
                    }
                }
            }
        }
    }

    if let Err(e) = proxy.release_accelerometer().await {
        log::warn!("Failed to release accelerometer: {}", e);
    } else {
        log::info!("Accelerometer released");
    }

    Ok(())
}
