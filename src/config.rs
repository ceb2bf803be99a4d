//! Monitor configuration loaded from `config.toml`.
//!
//! Every field has a default so an empty file parses; `validate()` catches
//! values the monitor cannot run with.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.toml";
const APP_DIR: &str = "clubwatch";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub base_url: String,
    pub club_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout: u64,
    /// Milliseconds between ticks.
    pub poll_interval: u64,
    /// Ticks between idle status lines.
    pub heartbeat_interval: u64,
    /// Milliseconds to wait after a submitted contribution before re-reading.
    pub contribution_settle_delay: u64,
    /// Milliseconds to wait after an unprompted item change before re-reading.
    pub speculative_settle_delay: u64,
    /// Consecutive ticks whose club item read failed before the loop gives
    /// up. 0 disables.
    pub max_consecutive_failures: u32,
    /// Seconds `stop()` waits for the worker thread.
    pub stop_timeout: u64,
    pub output_dir: PathBuf,
    pub descriptor_file: String,
    pub session: SessionConfig,
    pub quota: QuotaConfig,
    pub telegram: TelegramConfig,
    pub exchanges: ExchangesConfig,
    pub logging: LoggingConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mangabuff.ru".to_string(),
            club_url: String::new(),
            request_timeout: 10,
            poll_interval: 3000,
            heartbeat_interval: 20,
            contribution_settle_delay: 1000,
            speculative_settle_delay: 2000,
            max_consecutive_failures: 0,
            stop_timeout: 5,
            output_dir: PathBuf::from("created_files"),
            descriptor_file: "boost_card.json".to_string(),
            session: SessionConfig::default(),
            quota: QuotaConfig::default(),
            telegram: TelegramConfig::default(),
            exchanges: ExchangesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie: String,
    pub csrf_token: String,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    pub daily_limit: u32,
    /// Relative paths resolve against `output_dir`.
    pub file: PathBuf,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_limit: 50,
            file: PathBuf::from("daily_stats.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub thread_id: Option<i64>,
    /// Users registry written by the companion bot. Relative paths resolve
    /// against `output_dir`.
    pub users_file: PathBuf,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            thread_id: None,
            users_file: PathBuf::from("telegram_users.json"),
        }
    }
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangesConfig {
    pub cancel_path: String,
}

impl Default for ExchangesConfig {
    fn default() -> Self {
        Self {
            cancel_path: "/trades/cancel-all".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

impl MonitorConfig {
    /// Default location: `<config dir>/clubwatch/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: MonitorConfig = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval == 0 {
            bail!("poll_interval must be greater than zero");
        }
        if self.heartbeat_interval == 0 {
            bail!("heartbeat_interval must be greater than zero");
        }
        if self.contribution_settle_delay >= self.speculative_settle_delay {
            bail!(
                "contribution_settle_delay ({}ms) must be shorter than speculative_settle_delay ({}ms)",
                self.contribution_settle_delay,
                self.speculative_settle_delay
            );
        }
        if self.request_timeout == 0 {
            bail!("request_timeout must be greater than zero");
        }
        if self.stop_timeout == 0 {
            bail!("stop_timeout must be greater than zero");
        }
        if self.quota.daily_limit == 0 {
            bail!("quota.daily_limit must be greater than zero");
        }
        if self.descriptor_file.trim().is_empty() {
            bail!("descriptor_file cannot be empty");
        }
        Ok(())
    }

    /// Fails when no club page is configured. Only commands that talk to
    /// the site need this.
    pub fn require_club_url(&self) -> Result<&str> {
        let url = self.club_url.trim();
        if url.is_empty() {
            bail!("club_url is not set. Add it to the config file.");
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }

    pub fn contribution_settle_delay(&self) -> Duration {
        Duration::from_millis(self.contribution_settle_delay)
    }

    pub fn speculative_settle_delay(&self) -> Duration {
        Duration::from_millis(self.speculative_settle_delay)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout)
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.output_dir.join(&self.descriptor_file)
    }

    pub fn quota_path(&self) -> PathBuf {
        self.resolve(&self.quota.file)
    }

    pub fn users_path(&self) -> PathBuf {
        self.resolve(&self.telegram.users_file)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.output_dir.join(path)
        }
    }
}
