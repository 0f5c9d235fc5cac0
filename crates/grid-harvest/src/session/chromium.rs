//! Chromium-backed session using chromiumoxide.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{ControlHandle, PageInfo, PageSession, SessionLauncher, TableSnapshot};
use crate::config::BrowserSettings;
use crate::types::{HarvestError, HarvestResult};

/// Environment variable naming an explicit Chromium binary.
pub const CHROMIUM_PATH_ENV: &str = "GRID_HARVEST_CHROMIUM_PATH";

/// Attribute stamped on probed controls so they can be found again.
const CONTROL_ATTR: &str = "data-grid-harvest";

const TABLE_PRESENT_JS: &str = "document.querySelector('table') !== null";

const READ_TABLE_JS: &str = r#"
(() => {
    const table = document.querySelector('table');
    if (!table) return JSON.stringify(null);
    const text = (el) => el.innerText ?? el.textContent ?? '';
    const rows = Array.from(table.querySelectorAll('tr')).map(tr => ({
        header_cells: Array.from(tr.querySelectorAll('th')).map(text),
        data_cells: Array.from(tr.querySelectorAll('td')).map(text),
    }));
    return JSON.stringify({ rows });
})()
"#;

const PROBE_CONTROL_JS: &str = r#"
(xpath, attr, token) => {
    const el = document.evaluate(
        xpath, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null
    ).singleNodeValue;
    if (!el || el.nodeType !== Node.ELEMENT_NODE) return JSON.stringify(null);
    el.setAttribute(attr, token);
    const style = window.getComputedStyle(el);
    const visible = style.display !== 'none'
        && style.visibility !== 'hidden'
        && el.getClientRects().length > 0;
    return JSON.stringify({
        text: el.innerText ?? el.textContent ?? '',
        enabled: !el.disabled,
        visible,
    });
}
"#;

#[derive(Deserialize)]
struct ProbeResult {
    text: String,
    enabled: bool,
    visible: bool,
}

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    // 1. Configured path
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    // 2. GRID_HARVEST_CHROMIUM_PATH env
    if let Ok(p) = std::env::var(CHROMIUM_PATH_ENV) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Launches Chromium with the configured window and sandbox flags.
pub struct ChromiumLauncher;

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self, settings: &BrowserSettings) -> HarvestResult<Box<dyn PageSession>> {
        let mut builder =
            BrowserConfig::builder().window_size(settings.window_width, settings.window_height);

        match find_chromium(settings.chromium_path.as_deref()) {
            Some(path) => {
                debug!("Using Chromium at {}", path.display());
                builder = builder.chrome_executable(path);
            }
            None => debug!("No Chromium found on known paths, using chromiumoxide detection"),
        }
        if !settings.headless {
            builder = builder.with_head();
        }
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        for arg in &settings.extra_args {
            builder = builder.arg(arg.as_str());
        }

        let config = builder
            .build()
            .map_err(|e| HarvestError::Session(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| HarvestError::Session(format!("failed to launch Chromium: {e}")))?;

        // The CDP handler must be polled for the browser to make progress.
        let pump = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                pump.abort();
                return Err(HarvestError::Session(format!("failed to open page: {e}")));
            }
        };

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            pump,
            next_token: 0,
        }))
    }
}

/// One Chromium process with a single page.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    pump: JoinHandle<()>,
    next_token: u64,
}

impl ChromiumSession {
    async fn eval_json<T: DeserializeOwned>(&self, script: String) -> HarvestResult<T> {
        let raw: String = self
            .page
            .evaluate_expression(script)
            .await
            .map_err(|e| HarvestError::Browser(format!("script failed: {e}")))?
            .into_value()
            .map_err(|e| HarvestError::Browser(format!("failed to convert script result: {e:?}")))?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn control_selector(control: &ControlHandle) -> String {
        format!("[{CONTROL_ATTR}=\"{}\"]", control.token)
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> HarvestResult<PageInfo> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(HarvestError::Session(format!("navigation failed: {e}"))),
            Err(_) => {
                return Err(HarvestError::Session(format!(
                    "navigation timed out after {}ms",
                    timeout.as_millis()
                )))
            }
        }

        let title = self.page.get_title().await.unwrap_or_default();
        let url = self
            .page
            .url()
            .await
            .unwrap_or_default()
            .map(|u| u.to_string());
        Ok(PageInfo { title, url })
    }

    async fn table_present(&mut self) -> HarvestResult<bool> {
        self.page
            .evaluate_expression(TABLE_PRESENT_JS)
            .await
            .map_err(|e| HarvestError::Browser(format!("table probe failed: {e}")))?
            .into_value()
            .map_err(|e| HarvestError::Browser(format!("table probe result: {e:?}")))
    }

    async fn read_table(&mut self) -> HarvestResult<Option<TableSnapshot>> {
        self.eval_json(READ_TABLE_JS.to_string()).await
    }

    async fn probe_control(
        &mut self,
        label: &str,
        xpath: &str,
    ) -> HarvestResult<Option<ControlHandle>> {
        self.next_token += 1;
        let token = self.next_token.to_string();
        let script = format!(
            "({})({}, {}, {})",
            PROBE_CONTROL_JS,
            serde_json::to_string(xpath)?,
            serde_json::to_string(CONTROL_ATTR)?,
            serde_json::to_string(&token)?,
        );
        let probe: Option<ProbeResult> = self.eval_json(script).await?;
        Ok(probe.map(|p| ControlHandle {
            token,
            locator: label.to_string(),
            text: p.text,
            enabled: p.enabled,
            visible: p.visible,
        }))
    }

    async fn scroll_into_view(&mut self, control: &ControlHandle) -> HarvestResult<()> {
        let element = self
            .page
            .find_element(Self::control_selector(control))
            .await
            .map_err(|e| HarvestError::Browser(format!("control vanished: {e}")))?;
        element
            .scroll_into_view()
            .await
            .map_err(|e| HarvestError::Browser(format!("scroll failed: {e}")))?;
        Ok(())
    }

    async fn click(&mut self, control: &ControlHandle) -> HarvestResult<()> {
        let element = self
            .page
            .find_element(Self::control_selector(control))
            .await
            .map_err(|e| HarvestError::Browser(format!("control vanished: {e}")))?;
        element
            .click()
            .await
            .map_err(|e| HarvestError::Browser(format!("click failed: {e}")))?;
        Ok(())
    }

    async fn close(mut self: Box<Self>) -> HarvestResult<()> {
        let _ = self.page.clone().close().await;
        let closed = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.pump.abort();
        closed
            .map(|_| ())
            .map_err(|e| HarvestError::Session(format!("failed to close Chromium: {e}")))
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_chromium_prefers_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("chrome");
        std::fs::write(&fake, b"").unwrap();
        assert_eq!(find_chromium(Some(&fake)), Some(fake));
    }

    #[test]
    fn test_control_selector() {
        let control = ControlHandle {
            token: "7".into(),
            locator: "rel-next".into(),
            text: "Next".into(),
            enabled: true,
            visible: true,
        };
        assert_eq!(
            ChromiumSession::control_selector(&control),
            "[data-grid-harvest=\"7\"]"
        );
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_reads_table_and_probes_control() {
        let mut session = ChromiumLauncher
            .launch(&BrowserSettings::default())
            .await
            .expect("failed to launch");

        let html = "data:text/html,<table><tr><th>A</th></tr><tr><td> 1 </td></tr></table>\
                    <a rel='next' href='#'>Next</a>";
        session
            .navigate(html, Duration::from_secs(10))
            .await
            .expect("navigation failed");

        assert!(session.table_present().await.unwrap());

        let table = session.read_table().await.unwrap().expect("table missing");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].header_cells, vec!["A"]);

        let control = session
            .probe_control("rel-next", "//a[@rel='next']")
            .await
            .unwrap()
            .expect("control missing");
        assert!(control.is_usable());
        session.click(&control).await.expect("click failed");

        session.close().await.expect("close failed");
    }
}
