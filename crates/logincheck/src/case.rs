//! Test cases read from the CSV data file, and the records they produce

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{CheckError, CheckResult};

/// One login attempt to simulate, as read from the data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub username: String,
    pub password: String,

    /// Normalized `expected_result` token (trimmed, lowercase). Kept raw so an
    /// unrecognized token still reaches the runner and is reported there.
    pub expected_result: String,

    /// Free-text label, empty when the column is absent
    #[serde(default)]
    pub purpose: String,
}

/// Row layout of the input CSV
#[derive(Debug, Deserialize)]
struct CaseRow {
    username: String,
    password: String,
    expected_result: String,
    #[serde(default)]
    purpose: Option<String>,
}

impl TestCase {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        expected_result: &str,
        purpose: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            expected_result: expected_result.trim().to_lowercase(),
            purpose: purpose.into(),
        }
    }

    fn from_row(row: CaseRow) -> Self {
        Self {
            username: row.username,
            password: row.password,
            expected_result: row.expected_result.trim().to_lowercase(),
            purpose: row.purpose.unwrap_or_default().trim().to_string(),
        }
    }

    /// Parse the expected outcome token
    pub fn expected_outcome(&self) -> CheckResult<ExpectedOutcome> {
        self.expected_result.parse()
    }

    /// Read all cases from any CSV source, in file order
    pub fn from_reader<R: std::io::Read>(reader: R) -> CheckResult<Vec<Self>> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let mut cases = Vec::new();
        for row in rdr.deserialize::<CaseRow>() {
            cases.push(TestCase::from_row(row?));
        }
        Ok(cases)
    }

    /// Read all cases from a CSV file
    pub fn load_csv(path: &Path) -> CheckResult<Vec<Self>> {
        let file = std::fs::File::open(path).map_err(|e| {
            CheckError::Input(format!("cannot open {}: {}", path.display(), e))
        })?;
        Self::from_reader(file)
            .map_err(|e| CheckError::Input(format!("{}: {}", path.display(), e)))
    }
}

/// Outcome a case expects from the login page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedOutcome {
    Success,
    Failure,
}

impl FromStr for ExpectedOutcome {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "success" => Ok(ExpectedOutcome::Success),
            "failure" => Ok(ExpectedOutcome::Failure),
            _ => Err(CheckError::InvalidExpectation(s.to_string())),
        }
    }
}

impl fmt::Display for ExpectedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedOutcome::Success => f.write_str("SUCCESS"),
            ExpectedOutcome::Failure => f.write_str("FAILURE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => f.write_str("PASS"),
            Verdict::Fail => f.write_str("FAIL"),
        }
    }
}

/// A case together with its verdict, in output column order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub username: String,
    pub password: String,
    pub expected_result: String,
    pub purpose: String,
    pub status: Verdict,
    pub details: String,
}

impl ResultRecord {
    pub fn new(case: &TestCase, status: Verdict, details: String) -> Self {
        Self {
            username: case.username.clone(),
            password: case.password.clone(),
            expected_result: case.expected_result.clone(),
            purpose: case.purpose.clone(),
            status,
            details,
        }
    }

    /// The run-log line for this record
    pub fn log_line(&self) -> String {
        format!(
            "[{}] User='{}', Password='{}', Expected={}, Purpose='{}'. Details: {}",
            self.status,
            self.username,
            self.password,
            self.expected_result.to_uppercase(),
            self.purpose,
            self.details
        )
    }
}
