//! Browser session abstraction.
//!
//! Defines the `SessionLauncher` and `PageSession` traits that abstract over
//! the rendering engine (currently Chromium via chromiumoxide), plus the
//! plain snapshot types the harvester works with.

pub mod chromium;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::BrowserSettings;
use crate::types::{HarvestError, HarvestResult};

/// Page metadata read after navigation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInfo {
    pub title: Option<String>,
    pub url: Option<String>,
}

/// Raw text of one `tr`: its `th` and `td` children, untrimmed, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRow {
    #[serde(default)]
    pub header_cells: Vec<String>,
    #[serde(default)]
    pub data_cells: Vec<String>,
}

/// Every row of the first table on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub rows: Vec<SourceRow>,
}

/// A DOM element found by a locator probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlHandle {
    /// Session-specific reference used to address the element again.
    pub token: String,
    /// Label of the locator that found it.
    pub locator: String,
    pub text: String,
    pub enabled: bool,
    pub visible: bool,
}

impl ControlHandle {
    /// Whether the control can be activated.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.visible
    }
}

/// Something that can start a rendering session.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Start the engine and open one page.
    async fn launch(&self, settings: &BrowserSettings) -> HarvestResult<Box<dyn PageSession>>;
}

/// A single open page in a rendering engine.
#[async_trait]
pub trait PageSession: Send {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> HarvestResult<PageInfo>;
    /// Check once whether a `table` element is present.
    ///
    /// Fails while the page has no usable script context, e.g. mid-navigation.
    async fn table_present(&mut self) -> HarvestResult<bool>;
    /// Read the first table on the page, `None` if there is none.
    async fn read_table(&mut self) -> HarvestResult<Option<TableSnapshot>>;
    /// Evaluate an XPath and return the first matching element, usable or not.
    /// `label` names the locator and is carried on the returned handle.
    async fn probe_control(
        &mut self,
        label: &str,
        xpath: &str,
    ) -> HarvestResult<Option<ControlHandle>>;
    /// Scroll a previously probed control into the viewport.
    async fn scroll_into_view(&mut self, control: &ControlHandle) -> HarvestResult<()>;
    /// Click a previously probed control.
    async fn click(&mut self, control: &ControlHandle) -> HarvestResult<()>;
    /// Release the page and the engine behind it.
    async fn close(self: Box<Self>) -> HarvestResult<()>;
}

/// A launcher used when no browser is available.
pub struct NoopLauncher;

#[async_trait]
impl SessionLauncher for NoopLauncher {
    async fn launch(&self, _settings: &BrowserSettings) -> HarvestResult<Box<dyn PageSession>> {
        Err(HarvestError::Session("browser not available".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_usable_requires_enabled_and_visible() {
        let mut c = ControlHandle {
            token: "1".into(),
            locator: "rel-next".into(),
            text: "Next".into(),
            enabled: true,
            visible: true,
        };
        assert!(c.is_usable());
        c.visible = false;
        assert!(!c.is_usable());
        c.visible = true;
        c.enabled = false;
        assert!(!c.is_usable());
    }

    #[test]
    fn test_snapshot_deserializes_missing_cells() {
        let json = r#"{"rows":[{"header_cells":["A"]},{"data_cells":["1","2"]}]}"#;
        let snap: TableSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.rows.len(), 2);
        assert!(snap.rows[0].data_cells.is_empty());
        assert_eq!(snap.rows[1].data_cells, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_noop_launcher_fails() {
        let result = NoopLauncher.launch(&BrowserSettings::default()).await;
        assert!(matches!(result, Err(HarvestError::Session(_))));
    }
}
