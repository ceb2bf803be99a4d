use super::load_config;
use crate::quota::DailyQuota;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

/// Print today's contribution count against the daily limit.
pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let quota = DailyQuota::open(config.quota_path(), config.quota.daily_limit);
    let snapshot = quota.snapshot();

    println!("{}", "Daily Contributions".bold().blue());
    println!("{}", "=".repeat(50));
    println!("  Date:      {}", snapshot.date);
    println!("  Used:      {}/{}", snapshot.count, snapshot.limit);

    let remaining = format!("{}", snapshot.remaining());
    if snapshot.allows_more() {
        println!("  Remaining: {}", remaining.green().bold());
    } else {
        println!("  Remaining: {}", remaining.red().bold());
        println!("  {} Limit reached for today", "Note:".yellow());
    }
    println!("  {}", quota.path().display().to_string().dimmed());

    println!();
    Ok(())
}
