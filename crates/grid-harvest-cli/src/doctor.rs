//! Environment readiness check.

use std::path::{Path, PathBuf};

use grid_harvest::{find_chromium, HarvestConfig};

use crate::config::{load_config, resolve_config_path, Overrides};

/// Check Chromium availability, the config file, and the output directory.
///
/// Returns whether a harvest could start.
pub fn run(explicit: Option<&Path>, overrides: &Overrides) -> anyhow::Result<bool> {
    println!("grid-harvest doctor");
    println!("===================");
    println!();

    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    // Config
    match resolve_config_path(explicit) {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: none (built-in defaults)"),
    }
    let config = match load_config(explicit, overrides) {
        Ok(config) => {
            println!("[OK] Config is valid");
            config
        }
        Err(e) => {
            println!("[!!] Config is invalid: {e:#}");
            let mut fallback = HarvestConfig::default();
            overrides.apply(&mut fallback);
            fallback
        }
    };

    // Chromium
    let chromium = find_chromium(config.browser.chromium_path.as_deref());
    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install Chrome or Chromium, or set GRID_HARVEST_CHROMIUM_PATH."
        ),
    }

    // Output directory
    match output_dir_status(&config.output_dir) {
        OutputDir::Exists => println!(
            "[OK] Output directory exists: {}",
            config.output_dir.display()
        ),
        OutputDir::Creatable(parent) => println!(
            "[OK] Output directory will be created under {}",
            parent.display()
        ),
        OutputDir::Unavailable => println!(
            "[!!] Output directory cannot be created: {}",
            config.output_dir.display()
        ),
    }

    println!();
    let ready = chromium.is_some();
    if ready {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
    Ok(ready)
}

#[derive(Debug, PartialEq, Eq)]
enum OutputDir {
    Exists,
    /// Missing, but the nearest existing ancestor is a directory.
    Creatable(PathBuf),
    Unavailable,
}

fn output_dir_status(dir: &Path) -> OutputDir {
    if dir.is_dir() {
        return OutputDir::Exists;
    }
    if dir.exists() {
        return OutputDir::Unavailable;
    }
    let ancestor = dir
        .ancestors()
        .skip(1)
        .find(|p| p.as_os_str().is_empty() || p.exists());
    match ancestor {
        Some(p) if p.as_os_str().is_empty() => OutputDir::Creatable(PathBuf::from(".")),
        Some(p) if p.is_dir() => OutputDir::Creatable(p.to_path_buf()),
        _ => OutputDir::Unavailable,
    }
}
