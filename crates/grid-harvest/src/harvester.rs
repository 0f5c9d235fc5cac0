//! The pagination loop: read the table, follow the next-page control, write CSV.
//!
//! A run owns one browser session and one `Dataset`. The session is closed on
//! every exit path before `run` or `run_sample` returns; errors never escape
//! past the run boundary and are reported through `RunResult`.

use std::fmt;
use std::path::PathBuf;

use chrono::Local;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::HarvestConfig;
use crate::normalize::{extract_headers, extract_rows};
use crate::session::chromium::ChromiumLauncher;
use crate::session::{ControlHandle, PageSession, SessionLauncher};
use crate::storage::{timestamped_file_name, CsvWriter, SAMPLE_FILE_NAME};
use crate::types::{Dataset, HarvestError, HarvestResult, HeaderSet, Row, RunResult};

/// Rows shown per page in progress logs.
const SAMPLE_LOG_ROWS: usize = 3;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    SessionStarting,
    HeadersLoaded,
    HarvestingPage(usize),
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::SessionStarting => write!(f, "SessionStarting"),
            Self::HeadersLoaded => write!(f, "HeadersLoaded"),
            Self::HarvestingPage(n) => write!(f, "HarvestingPage({n})"),
            Self::Finalizing => write!(f, "Finalizing"),
            Self::Done => write!(f, "Done"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Rows read from one page.
#[derive(Debug, Clone, Default)]
pub struct PageHarvest {
    pub rows: Vec<Row>,
    /// The first few rows, for progress output.
    pub sample: Vec<Row>,
}

impl PageHarvest {
    fn new(rows: Vec<Row>) -> Self {
        let sample = rows.iter().take(SAMPLE_LOG_ROWS).cloned().collect();
        Self { rows, sample }
    }
}

/// Drives one browser session through the paginated table.
pub struct PageHarvester {
    config: HarvestConfig,
    launcher: Box<dyn SessionLauncher>,
}

impl PageHarvester {
    pub fn new(config: HarvestConfig, launcher: impl SessionLauncher + 'static) -> Self {
        Self {
            config,
            launcher: Box::new(launcher),
        }
    }

    /// A harvester backed by a local Chromium.
    pub fn chromium(config: HarvestConfig) -> Self {
        Self::new(config, ChromiumLauncher)
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Start the browser, open the source URL and let it settle.
    pub async fn initialize_session(&self) -> HarvestResult<Box<dyn PageSession>> {
        info!("Starting browser...");
        let mut session = self.launcher.launch(&self.config.browser).await?;

        info!("Navigating to: {}", self.config.url);
        let page = match session
            .navigate(&self.config.url, self.config.navigation_timeout())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = session.close().await {
                    warn!("Failed to release browser session: {close_err}");
                }
                return Err(e);
            }
        };

        tokio::time::sleep(self.config.initial_settle()).await;
        info!(
            "Page title: {}",
            page.title.as_deref().unwrap_or("<untitled>")
        );
        info!("Current URL: {}", page.url.as_deref().unwrap_or("<unknown>"));
        Ok(session)
    }

    /// Wait for the table and read up to 11 header labels from its first row.
    ///
    /// A missing table is fatal. Anything that goes wrong after the table
    /// has appeared falls back to synthetic labels.
    pub async fn load_headers(&self, session: &mut dyn PageSession) -> HarvestResult<HeaderSet> {
        if !self.await_table(session).await {
            return Err(HarvestError::Timeout {
                waited_ms: self.config.table_wait_ms,
            });
        }
        info!("Table found");

        let headers = match session.read_table().await {
            Ok(Some(snapshot)) => extract_headers(&snapshot),
            Ok(None) => None,
            Err(e) => {
                warn!("Could not extract headers: {e}");
                None
            }
        };
        let headers = headers.unwrap_or_else(|| {
            warn!("Using synthetic column labels");
            HeaderSet::synthetic()
        });

        info!("Headers: {:?}", headers.labels());
        Ok(headers)
    }

    /// Read every qualifying data row on the current page.
    ///
    /// `Ok(None)` means the table is gone and there are no more pages.
    pub async fn harvest_page(
        &self,
        session: &mut dyn PageSession,
    ) -> HarvestResult<Option<PageHarvest>> {
        self.read_rows(session, None).await
    }

    /// Probe the configured locators in order and return the first usable control.
    pub async fn find_next_control(
        &self,
        session: &mut dyn PageSession,
        current_page: usize,
    ) -> Option<ControlHandle> {
        for locator in &self.config.next_controls {
            let xpath = locator.resolve(current_page);
            match session.probe_control(&locator.label, &xpath).await {
                Ok(Some(control)) if control.is_usable() => {
                    info!(
                        "Found next button: '{}' (via {})",
                        control.text.trim(),
                        control.locator
                    );
                    return Some(control);
                }
                Ok(Some(control)) => debug!(
                    "Locator {} matched an unusable control (enabled={}, visible={})",
                    locator.label, control.enabled, control.visible
                ),
                Ok(None) => debug!("Locator {} matched nothing", locator.label),
                Err(e) => debug!("Locator {} failed: {e}", locator.label),
            }
        }
        None
    }

    /// Scroll to the control, click it, and give the page time to re-render.
    pub async fn advance(
        &self,
        session: &mut dyn PageSession,
        control: &ControlHandle,
    ) -> HarvestResult<()> {
        session.scroll_into_view(control).await?;
        tokio::time::sleep(self.config.scroll_pause()).await;
        session.click(control).await?;
        tokio::time::sleep(self.config.settle_pause()).await;
        info!("Clicked next button, waiting for new page...");
        Ok(())
    }

    /// Harvest every page and write the timestamped CSV file.
    pub async fn run(&self) -> RunResult {
        let mut state = RunState::Idle;
        enter(&mut state, RunState::SessionStarting);

        let mut session = match self.initialize_session().await {
            Ok(session) => session,
            Err(e) => {
                error!("Critical error: {e}");
                enter(&mut state, RunState::Failed);
                return RunResult::failed(&e, 0);
            }
        };

        let mut pages_visited = 0;
        let outcome = self
            .harvest_all(session.as_mut(), &mut state, &mut pages_visited)
            .await;

        info!("Closing browser...");
        if let Err(e) = session.close().await {
            warn!("Failed to release browser session: {e}");
        }

        conclude(outcome, &mut state, pages_visited)
    }

    /// Read the first rows of the first page only and write the sample CSV file.
    pub async fn run_sample(&self) -> RunResult {
        let mut state = RunState::Idle;
        enter(&mut state, RunState::SessionStarting);

        let mut session = match self.initialize_session().await {
            Ok(session) => session,
            Err(e) => {
                error!("Sample run failed: {e}");
                enter(&mut state, RunState::Failed);
                return RunResult::failed(&e, 0);
            }
        };

        let outcome = self.harvest_sample(session.as_mut(), &mut state).await;

        if let Err(e) = session.close().await {
            warn!("Failed to release browser session: {e}");
        }

        let pages_visited = match outcome {
            Ok(_) | Err(HarvestError::NoData) => 1,
            Err(_) => 0,
        };
        conclude(outcome, &mut state, pages_visited)
    }

    async fn harvest_all(
        &self,
        session: &mut dyn PageSession,
        state: &mut RunState,
        pages_visited: &mut usize,
    ) -> HarvestResult<(PathBuf, usize)> {
        let headers = self.load_headers(session).await?;
        enter(state, RunState::HeadersLoaded);

        let mut dataset = Dataset::new();
        let mut page = 0;
        while page < self.config.max_pages {
            page += 1;
            enter(state, RunState::HarvestingPage(page));
            info!("--- Processing page {page} ---");

            let Some(harvest) = self.harvest_page(session).await? else {
                info!("Table not found on this page, stopping");
                break;
            };
            *pages_visited = page;
            let found = harvest.rows.len();
            dataset.extend(harvest.rows);
            info!("Extracted {found} rows from page {page}");
            info!("Total rows collected so far: {}", dataset.len());
            log_sample(&harvest.sample);

            if page == self.config.max_pages {
                info!("Reached the {page}-page limit");
                break;
            }

            let Some(control) = self.find_next_control(session, page).await else {
                info!("No more pages found or next button not available");
                break;
            };
            if let Err(e) = self.advance(session, &control).await {
                warn!("Could not click next button: {e}");
                break;
            }
        }

        enter(state, RunState::Finalizing);
        let path = self
            .config
            .output_dir
            .join(timestamped_file_name(&Local::now()));
        finalize(&headers, &dataset, path)
    }

    async fn harvest_sample(
        &self,
        session: &mut dyn PageSession,
        state: &mut RunState,
    ) -> HarvestResult<(PathBuf, usize)> {
        let headers = self.load_headers(session).await?;
        enter(state, RunState::HeadersLoaded);
        enter(state, RunState::HarvestingPage(1));

        let harvest = self
            .read_rows(session, Some(self.config.sample_rows))
            .await?
            .ok_or(HarvestError::NoData)?;
        for (i, row) in harvest.rows.iter().enumerate() {
            info!("Row {}: {:?}", i + 1, row.cells());
        }
        let dataset: Dataset = harvest.rows.into_iter().collect();

        enter(state, RunState::Finalizing);
        let path = self.config.output_dir.join(SAMPLE_FILE_NAME);
        finalize(&headers, &dataset, path)
    }

    /// Poll for the table until it appears or `table_wait` runs out.
    ///
    /// A failed probe counts as "not there yet": the page may still be
    /// re-rendering after a click.
    pub async fn await_table(&self, session: &mut dyn PageSession) -> bool {
        let deadline = Instant::now() + self.config.table_wait();
        loop {
            match session.table_present().await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => debug!("Table probe failed, retrying: {e}"),
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(self.config.table_poll()).await;
        }
    }

    async fn read_rows(
        &self,
        session: &mut dyn PageSession,
        limit: Option<usize>,
    ) -> HarvestResult<Option<PageHarvest>> {
        if !self.await_table(session).await {
            return Ok(None);
        }

        let Some(snapshot) = session.read_table().await? else {
            return Ok(None);
        };
        Ok(Some(PageHarvest::new(extract_rows(&snapshot, limit))))
    }
}

fn finalize(
    headers: &HeaderSet,
    dataset: &Dataset,
    path: PathBuf,
) -> HarvestResult<(PathBuf, usize)> {
    if dataset.is_empty() {
        return Err(HarvestError::NoData);
    }
    CsvWriter::write_to_file(headers, dataset, &path)?;
    info!("Data saved to: {}", path.display());
    Ok((path, dataset.len()))
}

fn conclude(
    outcome: HarvestResult<(PathBuf, usize)>,
    state: &mut RunState,
    pages_visited: usize,
) -> RunResult {
    match outcome {
        Ok((path, rows)) => {
            enter(state, RunState::Done);
            info!("Total pages processed: {pages_visited}");
            info!("Total rows extracted: {rows}");
            RunResult::written(path, rows, pages_visited)
        }
        Err(HarvestError::NoData) => {
            enter(state, RunState::Failed);
            warn!("No data extracted");
            RunResult::failed(&HarvestError::NoData, pages_visited)
        }
        Err(e) => {
            enter(state, RunState::Failed);
            error!("Critical error: {e}");
            RunResult::failed(&e, pages_visited)
        }
    }
}

fn enter(state: &mut RunState, next: RunState) {
    debug!("Run state {state} -> {next}");
    *state = next;
}

fn log_sample(sample: &[Row]) {
    if sample.is_empty() {
        return;
    }
    info!("Sample rows from this page:");
    for (i, row) in sample.iter().enumerate() {
        info!("  Row {}: {:?}", i + 1, row.cells());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::COLUMN_COUNT;

    #[test]
    fn test_page_harvest_sample_is_first_three() {
        let rows: Vec<Row> = (0..5)
            .map(|i| Row::new(vec![i.to_string(); COLUMN_COUNT]))
            .collect();
        let harvest = PageHarvest::new(rows);
        assert_eq!(harvest.rows.len(), 5);
        assert_eq!(harvest.sample.len(), 3);
        assert_eq!(harvest.sample[2].cells()[0], "2");
    }

    #[test]
    fn test_run_state_display() {
        assert_eq!(RunState::HarvestingPage(4).to_string(), "HarvestingPage(4)");
        assert_eq!(RunState::Finalizing.to_string(), "Finalizing");
    }

    #[test]
    fn test_enter_updates_state() {
        let mut state = RunState::Idle;
        enter(&mut state, RunState::SessionStarting);
        assert_eq!(state, RunState::SessionStarting);
    }
}
