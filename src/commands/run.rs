use super::load_config;
use crate::logging;
use crate::monitor::{
    CancellationSignal, ChangeMonitor, Collaborators, LoopSettings, MonitorService, StopOutcome,
};
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use tracing::info;

const WAIT_SLICE: Duration = Duration::from_millis(500);

/// Run the monitor until Ctrl+C or until it gives up on its own.
pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    logging::init(&config.logging)?;

    let settings = LoopSettings::from_config(&config)?;
    let collab = Collaborators::from_config(&config)?;
    let monitor = ChangeMonitor::new(settings, collab, CancellationSignal::new());
    let mut service = MonitorService::new(monitor, config.stop_timeout());

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("Failed to install Ctrl+C handler")?;

    service.start();

    loop {
        match rx.recv_timeout(WAIT_SLICE) {
            Ok(()) => {
                info!("interrupt received, stopping monitor");
                break;
            }
            Err(RecvTimeoutError::Timeout) if service.is_running() => continue,
            Err(_) => break,
        }
    }

    if service.stop() == StopOutcome::TimedOut {
        bail!("Monitor did not stop within {:?}", config.stop_timeout());
    }
    if service.monitor().is_some_and(|m| m.failure_ceiling_reached()) {
        bail!("Monitor stopped after repeated failures reading the club page");
    }
    Ok(())
}
