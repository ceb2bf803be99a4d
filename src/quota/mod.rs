//! Daily contribution quota.
//!
//! The monitor treats the quota as an oracle and always asks it fresh: the
//! backing file is shared with other tools, so nothing is cached across
//! checks.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// Admission control consulted before every contribution.
pub trait QuotaGate: Send + Sync {
    /// Whether another contribution fits in the current window.
    fn can_proceed(&self, force_refresh: bool) -> bool;

    /// Count a contribution that was just made. Best-effort.
    fn record_contribution(&self);

    /// Reload the snapshot from its source.
    fn refresh(&self);

    /// Log the current snapshot.
    fn display(&self);
}

/// Contributions made in one local day against that day's limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    pub date: NaiveDate,
    pub count: u32,
    pub limit: u32,
}

impl QuotaSnapshot {
    pub fn new(date: NaiveDate, limit: u32) -> Self {
        Self { date, count: 0, limit }
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }

    pub fn allows_more(&self) -> bool {
        self.count < self.limit
    }

    /// Same snapshot carried into `today`: a new day starts from zero.
    pub fn rolled_over(self, today: NaiveDate) -> Self {
        if self.date == today {
            self
        } else {
            Self::new(today, self.limit)
        }
    }
}

/// File-backed `QuotaGate` with a per-day limit.
pub struct DailyQuota {
    path: PathBuf,
    limit: u32,
    snapshot: Mutex<QuotaSnapshot>,
}

impl DailyQuota {
    /// Open the quota file, starting a fresh snapshot if it does not exist
    /// or cannot be read.
    pub fn open(path: impl Into<PathBuf>, limit: u32) -> Self {
        let path = path.into();
        let snapshot = load_or_fresh(&path, limit);
        Self {
            path,
            limit,
            snapshot: Mutex::new(snapshot),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current in-memory snapshot, rolled over to today.
    pub fn snapshot(&self) -> QuotaSnapshot {
        let today = Local::now().date_naive();
        match self.snapshot.lock() {
            Ok(guard) => guard.clone().rolled_over(today),
            Err(poisoned) => poisoned.into_inner().clone().rolled_over(today),
        }
    }

    fn reload(&self) -> QuotaSnapshot {
        let fresh = load_or_fresh(&self.path, self.limit);
        self.replace(fresh.clone());
        fresh
    }

    fn replace(&self, snapshot: QuotaSnapshot) {
        match self.snapshot.lock() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }
}

fn load_or_fresh(path: &Path, limit: u32) -> QuotaSnapshot {
    let today = Local::now().date_naive();
    match load_snapshot(path) {
        Ok(Some(mut snapshot)) => {
            // The configured limit wins over whatever was stored.
            snapshot.limit = limit;
            snapshot.rolled_over(today)
        }
        Ok(None) => QuotaSnapshot::new(today, limit),
        Err(e) => {
            warn!(path = %path.display(), error = %format!("{e:#}"), "quota file unreadable, starting fresh");
            QuotaSnapshot::new(today, limit)
        }
    }
}

/// Read a snapshot; `Ok(None)` if the file does not exist.
pub fn load_snapshot(path: &Path) -> Result<Option<QuotaSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read quota file: {}", path.display()))?;
    let snapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse quota file: {}", path.display()))?;
    Ok(Some(snapshot))
}

pub fn save_snapshot(path: &Path, snapshot: &QuotaSnapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(snapshot).context("Failed to serialize quota")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write quota file: {}", path.display()))?;
    Ok(())
}

impl QuotaGate for DailyQuota {
    fn can_proceed(&self, force_refresh: bool) -> bool {
        let snapshot = if force_refresh {
            self.reload()
        } else {
            self.snapshot()
        };
        snapshot.allows_more()
    }

    fn record_contribution(&self) {
        let mut snapshot = self.reload();
        snapshot.count = snapshot.count.saturating_add(1);
        self.replace(snapshot.clone());

        if let Err(e) = save_snapshot(&self.path, &snapshot) {
            warn!(error = %format!("{e:#}"), "failed to persist quota, continuing");
        }
    }

    fn refresh(&self) {
        self.reload();
    }

    fn display(&self) {
        let snapshot = self.snapshot();
        info!(
            count = snapshot.count,
            limit = snapshot.limit,
            remaining = snapshot.remaining(),
            "Contributions today: {}/{}",
            snapshot.count,
            snapshot.limit
        );
    }
}
