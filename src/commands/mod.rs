pub mod check;
pub mod quota;
pub mod run;

use crate::config::MonitorConfig;
use anyhow::{bail, Result};
use std::path::Path;

/// Load the config from `path`, or from the default location.
pub(crate) fn load_config(path: Option<&Path>) -> Result<MonitorConfig> {
    if let Some(path) = path {
        return MonitorConfig::load(path);
    }

    let Some(default) = MonitorConfig::default_path() else {
        bail!("Could not determine the config directory. Pass --config explicitly.");
    };
    if !default.exists() {
        bail!(
            "No config file at {}. Create one or pass --config.",
            default.display()
        );
    }
    MonitorConfig::load(&default)
}
