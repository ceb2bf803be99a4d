use super::collaborators::Collaborators;
use super::config::LoopSettings;
use super::events::TickOutcome;
use super::pipeline::ContributionPipeline;
use super::signal::CancellationSignal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Mutable bookkeeping owned by the monitor.
#[derive(Debug, Default)]
pub(crate) struct MonitorState {
    pub(crate) last_known_item_id: Option<String>,
    pub(crate) checks: u64,
    pub(crate) consecutive_failures: u32,
}

/// Watches the club page and reacts to boosts and item changes.
pub struct ChangeMonitor {
    pub(crate) settings: LoopSettings,
    pub(crate) collab: Collaborators,
    pub(crate) signal: CancellationSignal,
    pub(crate) state: MonitorState,
}

impl ChangeMonitor {
    pub fn new(settings: LoopSettings, collab: Collaborators, signal: CancellationSignal) -> Self {
        Self {
            settings,
            collab,
            signal,
            state: MonitorState::default(),
        }
    }

    pub fn signal(&self) -> &CancellationSignal {
        &self.signal
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    pub fn last_known_item_id(&self) -> Option<&str> {
        self.state.last_known_item_id.as_deref()
    }

    pub fn checks(&self) -> u64 {
        self.state.checks
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.state.consecutive_failures
    }

    /// True once the failed-read ceiling is configured and reached.
    pub fn failure_ceiling_reached(&self) -> bool {
        let max = self.settings.max_consecutive_failures;
        max > 0 && self.state.consecutive_failures >= max
    }

    /// One poll of the club page.
    ///
    /// Item changes are checked before boost availability; when the item
    /// changed the boost check is skipped until the next tick.
    pub fn tick(&mut self) -> TickOutcome {
        self.state.checks += 1;
        let check = self.state.checks;
        let url = self.settings.resource_url.clone();

        match self.collab.remote.fetch_item_descriptor(&url) {
            Some(observed) => {
                self.state.consecutive_failures = 0;
                match self.state.last_known_item_id.clone() {
                    Some(previous) if previous != observed.item_id => {
                        let current = observed.item_id.clone();
                        let handled = self.handle_identity_change(&previous, &observed);
                        return TickOutcome::IdentityChanged {
                            previous,
                            current,
                            handled,
                        };
                    }
                    Some(_) => {}
                    None => {
                        debug!(item_id = %observed.item_id, "first observation of club item");
                        self.state.last_known_item_id = Some(observed.item_id);
                    }
                }
            }
            None => {
                self.state.consecutive_failures += 1;
                debug!(
                    failures = self.state.consecutive_failures,
                    "club item could not be read this tick"
                );
            }
        }

        let Some(target) = self.collab.remote.fetch_opportunity(&url) else {
            let heartbeat = heartbeat_due(check, self.settings.heartbeat_interval);
            if heartbeat {
                info!(check, "monitoring, no boost available");
            }
            return TickOutcome::Quiet { heartbeat };
        };

        // Producer must stop before anything else touches the network.
        self.signal.raise();
        info!(check, target = %target, "boost available");

        if !self.collab.quota.can_proceed(true) {
            self.signal.clear();
            warn!("boost available but the daily contribution limit is reached");
            self.collab.quota.display();
            return TickOutcome::QuotaExhausted;
        }

        let report = ContributionPipeline::new(
            &self.collab,
            &self.settings.resource_url,
            self.settings.contribution_settle_delay,
        )
        .attempt(&target);

        if report.succeeded() {
            if let Some(id) = report.new_item_id.clone().or_else(|| report.previous_item_id.clone()) {
                self.state.last_known_item_id = Some(id);
            }
            info!(outcome = ?report.outcome, "contribution finished, continuing to monitor");
        } else {
            self.signal.clear();
            warn!(outcome = ?report.outcome, "contribution failed");
        }

        TickOutcome::Contributed(report)
    }

    /// Poll until `running` is cleared or the failure ceiling is hit.
    pub fn run(&mut self, running: &AtomicBool) {
        self.log_startup();

        while running.load(Ordering::SeqCst) {
            self.tick();

            if self.failure_ceiling_reached() {
                error!(
                    failures = self.state.consecutive_failures,
                    "club page unreachable for too many consecutive checks, stopping"
                );
                running.store(false, Ordering::SeqCst);
                break;
            }

            sleep_while_running(self.settings.poll_interval, running);
        }

        info!(checks = self.state.checks, "monitor loop exited");
    }

    fn log_startup(&self) {
        info!(url = %self.settings.resource_url, "club boost monitor starting");
        info!(
            interval_ms = self.settings.poll_interval.as_millis() as u64,
            "poll interval"
        );
        info!("tracking: boost availability and club item changes");
        if self.collab.notifications_enabled() {
            info!("change notifications enabled");
        } else {
            info!("change notifications disabled");
        }
        self.collab.quota.refresh();
        self.collab.quota.display();
    }
}

/// Status line on the first check and every `interval` checks after that.
pub(crate) fn heartbeat_due(check: u64, interval: u64) -> bool {
    check == 1 || check % interval.max(1) == 0
}

/// Sleep for `duration`, waking early once `running` is cleared.
fn sleep_while_running(duration: Duration, running: &AtomicBool) {
    let start = Instant::now();
    while running.load(Ordering::SeqCst) {
        let elapsed = start.elapsed();
        if elapsed >= duration {
            break;
        }
        thread::sleep(SLEEP_SLICE.min(duration - elapsed));
    }
}
