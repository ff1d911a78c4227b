//! Run configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::driver::DriverConfig;
use crate::error::{CheckError, CheckResult};
use crate::page::PageContract;

/// Everything a run needs, with defaults matching the stock file layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Page under test: a local HTML path or an `http(s)://` / `file://` URL
    pub page: String,

    /// Test data CSV
    pub input: PathBuf,

    /// Results CSV
    pub output: PathBuf,

    /// Append-mode run log
    pub log_file: PathBuf,

    /// Optional JSON run summary
    pub summary: Option<PathBuf>,

    /// Element identifiers and status markers of the page
    #[serde(rename = "page_contract")]
    pub contract: PageContract,

    pub driver: DriverConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            page: "login.html".to_string(),
            input: PathBuf::from("login_test_data.csv"),
            output: PathBuf::from("login_test_results.csv"),
            log_file: PathBuf::from("login_test_log.txt"),
            summary: None,
            contract: PageContract::default(),
            driver: DriverConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> CheckResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> CheckResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Fully resolved location of the page under test
    pub fn page_url(&self) -> CheckResult<String> {
        resolve_page_url(&self.page, &std::env::current_dir()?)
    }
}

/// Turn a page setting into a URL. Web and file URLs pass through; anything
/// else is a filesystem path resolved against `base_dir`.
pub fn resolve_page_url(page: &str, base_dir: &Path) -> CheckResult<String> {
    let page = page.trim();
    if page.is_empty() {
        return Err(CheckError::Config("page location is empty".to_string()));
    }

    let lower = page.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("file://") {
        return Ok(page.to_string());
    }

    let path = Path::new(page);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };

    let url = url::Url::from_file_path(&absolute).map_err(|_| {
        CheckError::Config(format!("cannot express {} as a file URL", absolute.display()))
    })?;
    Ok(url.to_string())
}
