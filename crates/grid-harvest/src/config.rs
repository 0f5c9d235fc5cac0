//! Harvest configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::locator::{default_locators, ControlLocator};
use crate::types::{HarvestError, HarvestResult};

/// Generation table on the utility portal.
pub const DEFAULT_URL: &str = "https://erp.powergrid.gov.bd/w/generations/view_generations_bn";

/// Hard ceiling on harvested pages.
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Browser launch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// When false Chromium runs with `--no-sandbox`.
    pub sandbox: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub chromium_path: Option<PathBuf>,
    pub extra_args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: false,
            window_width: 1920,
            window_height: 1080,
            chromium_path: None,
            extra_args: vec!["--disable-dev-shm-usage".to_string()],
        }
    }
}

/// Everything one harvest run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub url: String,
    pub max_pages: usize,
    pub navigation_timeout_ms: u64,
    pub initial_settle_ms: u64,
    pub table_wait_ms: u64,
    pub table_poll_ms: u64,
    pub scroll_pause_ms: u64,
    pub settle_pause_ms: u64,
    pub sample_rows: usize,
    pub output_dir: PathBuf,
    pub browser: BrowserSettings,
    pub next_controls: Vec<ControlLocator>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            navigation_timeout_ms: 30_000,
            initial_settle_ms: 5_000,
            table_wait_ms: 10_000,
            table_poll_ms: 250,
            scroll_pause_ms: 1_000,
            settle_pause_ms: 3_000,
            sample_rows: 10,
            output_dir: PathBuf::from("."),
            browser: BrowserSettings::default(),
            next_controls: default_locators(),
        }
    }
}

impl HarvestConfig {
    /// Read a JSON config file.
    ///
    /// Not validated here: callers layer their own overrides first, then call `validate`.
    pub fn load(path: &Path) -> HarvestResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            HarvestError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Reject settings that would make a run meaningless.
    pub fn validate(&self) -> HarvestResult<()> {
        if self.url.trim().is_empty() {
            return Err(HarvestError::Config("url must not be empty".into()));
        }
        if self.max_pages == 0 {
            return Err(HarvestError::Config("max_pages must be at least 1".into()));
        }
        if self.sample_rows == 0 {
            return Err(HarvestError::Config("sample_rows must be at least 1".into()));
        }
        if self.next_controls.is_empty() {
            return Err(HarvestError::Config(
                "next_controls must list at least one locator".into(),
            ));
        }
        Ok(())
    }

    /// Zero every wait and pause. Used by tests against scripted sessions.
    pub fn without_delays(mut self) -> Self {
        self.initial_settle_ms = 0;
        self.table_wait_ms = 0;
        self.table_poll_ms = 0;
        self.scroll_pause_ms = 0;
        self.settle_pause_ms = 0;
        self
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn initial_settle(&self) -> Duration {
        Duration::from_millis(self.initial_settle_ms)
    }

    pub fn table_wait(&self) -> Duration {
        Duration::from_millis(self.table_wait_ms)
    }

    pub fn table_poll(&self) -> Duration {
        Duration::from_millis(self.table_poll_ms)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn settle_pause(&self) -> Duration {
        Duration::from_millis(self.settle_pause_ms)
    }
}
