//! logincheck - data-driven login page verification
//!
//! This crate drives a login page through a WebDriver browser session:
//! - Reads credential/outcome pairs from a CSV data file
//! - Submits each pair through one shared browser session, in order
//! - Classifies the page's status message as PASS/FAIL
//! - Writes a results CSV and an append-mode run log
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        logincheck                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestCase::load_csv(input) -> Vec<TestCase>                 │
//! │  WebDriverSession::acquire(driver) -> session (once)        │
//! │    └── DriverProcess::spawn() -> chromedriver/geckodriver   │
//! │  CaseRunner::run_all(&cases) -> RunReport                   │
//! │    └── run_case(user, pass, expected) -> (Verdict, details) │
//! │          navigate → clear/fill → click → read #message      │
//! │  session.quit() (once)                                      │
//! │  report::write_results_csv(output, &records)                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod case;
pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod page;
pub mod report;
pub mod runner;
pub mod suite;
pub mod webdriver;

pub use case::{ExpectedOutcome, ResultRecord, TestCase, Verdict};
pub use error::{CheckError, CheckResult};
pub use page::{PageContract, PageDriver};
pub use runner::{CaseRunner, RunReport};
pub use suite::run_suite;
pub use webdriver::WebDriverSession;
