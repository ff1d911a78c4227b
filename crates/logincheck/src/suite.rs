//! One full run: data file in, results CSV and run log out

use tracing::{info, warn};

use crate::case::TestCase;
use crate::config::RunConfig;
use crate::error::CheckResult;
use crate::logging::{RUN_FINISHED, RUN_LOG, RUN_STARTED};
use crate::report;
use crate::runner::{CaseRunner, RunReport};
use crate::webdriver::WebDriverSession;

/// Load the cases, run them through one browser session and write the outputs.
///
/// Input and session errors abort the run before anything is written.
pub async fn run_suite(config: &RunConfig) -> CheckResult<RunReport> {
    let page_url = config.page_url()?;
    let cases = TestCase::load_csv(&config.input)?;
    info!("Loaded {} case(s) from {}", cases.len(), config.input.display());

    let mut session = WebDriverSession::acquire(&config.driver).await?;

    info!(target: RUN_LOG, "{}", RUN_STARTED);

    let report = CaseRunner::with_contract(&mut session, page_url, config.contract.clone())
        .run_all(&cases)
        .await;

    if let Err(e) = session.quit().await {
        warn!("Browser session did not close cleanly: {}", e);
    }

    info!(target: RUN_LOG, "{}", RUN_FINISHED);

    report::write_results_csv(&config.output, &report.records)?;
    if let Some(summary) = &config.summary {
        report::write_summary_json(summary, &report)?;
    }

    Ok(report)
}
