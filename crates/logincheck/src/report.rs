//! Persisting run results

use std::path::Path;
use tracing::info;

use crate::case::ResultRecord;
use crate::error::CheckResult;
use crate::runner::RunReport;

/// Output columns, in file order
pub const RESULT_COLUMNS: [&str; 6] = [
    "username",
    "password",
    "expected_result",
    "purpose",
    "status",
    "details",
];

/// Write result records as CSV to any sink
pub fn write_records<W: std::io::Write>(sink: W, records: &[ResultRecord]) -> CheckResult<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(sink);

    // Written explicitly so an empty run still gets a header row
    wtr.write_record(RESULT_COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the results CSV, replacing any previous file
pub fn write_results_csv(path: &Path, records: &[ResultRecord]) -> CheckResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_records(file, records)?;

    info!("Results written to: {}", path.display());
    Ok(())
}

/// Write the whole run report as pretty JSON
pub fn write_summary_json(path: &Path, report: &RunReport) -> CheckResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;

    info!("Summary written to: {}", path.display());
    Ok(())
}
