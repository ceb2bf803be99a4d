use super::change_loop::ChangeMonitor;
use super::signal::CancellationSignal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

const JOIN_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// How a call to `MonitorService::stop` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    NotRunning,
    Stopped,
    TimedOut,
}

/// Runs a `ChangeMonitor` on its own thread.
///
/// The monitor moves into the worker on `start` and comes back through the
/// join handle once the loop exits, so the service can be restarted.
pub struct MonitorService {
    running: Arc<AtomicBool>,
    signal: CancellationSignal,
    stop_timeout: Duration,
    idle: Option<ChangeMonitor>,
    worker: Option<JoinHandle<ChangeMonitor>>,
}

impl MonitorService {
    pub fn new(monitor: ChangeMonitor, stop_timeout: Duration) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            signal: monitor.signal().clone(),
            stop_timeout,
            idle: Some(monitor),
            worker: None,
        }
    }

    /// Handle for the concurrent producer.
    pub fn signal(&self) -> CancellationSignal {
        self.signal.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The monitor, when no worker currently owns it.
    pub fn monitor(&self) -> Option<&ChangeMonitor> {
        self.idle.as_ref()
    }

    /// Launch the polling loop. Returns false if nothing was started.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            warn!("monitor is already running");
            return false;
        }

        self.reclaim_finished_worker();
        let Some(mut monitor) = self.idle.take() else {
            warn!("previous monitor thread has not exited yet");
            return false;
        };

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        self.worker = Some(thread::spawn(move || {
            monitor.run(&running);
            monitor
        }));

        info!("monitor started");
        true
    }

    /// Clear `running` and wait up to the stop timeout for the loop to exit.
    ///
    /// If the loop already stopped itself (failure ceiling), its thread is
    /// still collected with the same bounded wait so the monitor can be
    /// inspected afterwards.
    pub fn stop(&mut self) -> StopOutcome {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        if !was_running {
            warn!("stop requested but monitor is not running");
        }

        let Some(handle) = self.worker.take() else {
            return StopOutcome::NotRunning;
        };

        let start = Instant::now();
        while !handle.is_finished() && start.elapsed() < self.stop_timeout {
            thread::sleep(JOIN_CHECK_INTERVAL);
        }

        if !handle.is_finished() {
            warn!(
                timeout_secs = self.stop_timeout.as_secs_f64(),
                "monitor thread did not terminate within timeout"
            );
            self.worker = Some(handle);
            return StopOutcome::TimedOut;
        }

        self.join(handle);
        if was_running {
            info!("monitor stopped");
            StopOutcome::Stopped
        } else {
            StopOutcome::NotRunning
        }
    }

    fn reclaim_finished_worker(&mut self) {
        if let Some(handle) = self.worker.take_if(|h| h.is_finished()) {
            self.join(handle);
        }
    }

    fn join(&mut self, handle: JoinHandle<ChangeMonitor>) {
        match handle.join() {
            Ok(monitor) => self.idle = Some(monitor),
            Err(_) => error!("monitor thread panicked"),
        }
    }
}

impl Drop for MonitorService {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}
