//! Configuration loading and resolution.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use grid_harvest::HarvestConfig;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "GRID_HARVEST_CONFIG";

/// Config file picked up from the working directory.
pub const LOCAL_CONFIG: &str = "grid-harvest.json";

/// Values given on the command line. They win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub max_pages: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub headful: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut HarvestConfig) {
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.headful {
            config.browser.headless = false;
        }
    }
}

/// Resolve the config file path. `None` means built-in defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    resolve_in(explicit, std::env::var_os(CONFIG_ENV), Path::new("."))
}

fn resolve_in(explicit: Option<&Path>, env_path: Option<OsString>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_path.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }

    let local = cwd.join(LOCAL_CONFIG);
    local.exists().then_some(local)
}

/// Load the effective config: file (if any), then command-line overrides, then validation.
pub fn load_config(explicit: Option<&Path>, overrides: &Overrides) -> anyhow::Result<HarvestConfig> {
    let mut config = match resolve_config_path(explicit) {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            HarvestConfig::load(&path)
                .with_context(|| format!("invalid config file {}", path.display()))?
        }
        None => HarvestConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}
