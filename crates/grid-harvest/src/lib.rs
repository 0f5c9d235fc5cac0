//! grid-harvest: pull a paginated generation table out of a browser session into CSV.

pub mod config;
pub mod harvester;
pub mod locator;
pub mod normalize;
pub mod session;
pub mod storage;
pub mod types;

pub use config::{BrowserSettings, HarvestConfig};
pub use harvester::{PageHarvest, PageHarvester, RunState};
pub use locator::{default_locators, ControlLocator};
pub use session::chromium::{find_chromium, ChromiumLauncher};
pub use session::{ControlHandle, PageInfo, PageSession, SessionLauncher, SourceRow, TableSnapshot};
pub use storage::{CsvReader, CsvWriter};
pub use types::*;
