//! Error types for login checks

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("WebDriver failed to start: {0}")]
    DriverStartup(String),

    #[error("WebDriver status check failed after {0} attempts")]
    DriverHealthCheck(usize),

    #[error("Browser session error: {0}")]
    Session(String),

    #[error("no such element '{id}': {message}")]
    NoSuchElement { id: String, message: String },

    #[error("WebDriver error ({error}): {message}")]
    WebDriver { error: String, message: String },

    #[error("Invalid expected_result: '{0}'")]
    InvalidExpectation(String),

    #[error("Test data error: {0}")]
    Input(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CheckError {
    /// True when the page under test lacks an element the runner needs.
    pub fn is_missing_element(&self) -> bool {
        matches!(self, CheckError::NoSuchElement { .. })
    }
}

pub type CheckResult<T> = Result<T, CheckError>;
