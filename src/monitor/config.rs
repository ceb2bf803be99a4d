use crate::config::MonitorConfig;
use anyhow::Result;
use std::time::Duration;

/// Timing and target of the polling loop.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Club page that is polled every tick.
    pub resource_url: String,
    pub poll_interval: Duration,
    /// Ticks between idle status lines.
    pub heartbeat_interval: u64,
    /// Pause between a submitted contribution and the verifying re-read.
    pub contribution_settle_delay: Duration,
    /// Pause between an unprompted item change and the re-read.
    pub speculative_settle_delay: Duration,
    /// Consecutive failed identity reads before the loop stops. 0 disables.
    pub max_consecutive_failures: u32,
}

impl LoopSettings {
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        Ok(Self {
            resource_url: config.require_club_url()?.to_string(),
            poll_interval: config.poll_interval(),
            heartbeat_interval: config.heartbeat_interval.max(1),
            contribution_settle_delay: config.contribution_settle_delay(),
            speculative_settle_delay: config.speculative_settle_delay(),
            max_consecutive_failures: config.max_consecutive_failures,
        })
    }
}
