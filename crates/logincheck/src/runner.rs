//! Case runner: one login attempt per test case, classified against its expectation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::case::{ExpectedOutcome, ResultRecord, TestCase, Verdict};
use crate::error::{CheckError, CheckResult};
use crate::logging::RUN_LOG;
use crate::page::{PageContract, PageDriver};

/// Result of running all cases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub records: Vec<ResultRecord>,
}

impl RunReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Drives login attempts through a borrowed browser session
pub struct CaseRunner<'a, D: PageDriver + ?Sized> {
    driver: &'a mut D,
    page_url: String,
    contract: PageContract,
}

impl<'a, D: PageDriver + ?Sized> CaseRunner<'a, D> {
    pub fn new(driver: &'a mut D, page_url: impl Into<String>) -> Self {
        Self::with_contract(driver, page_url, PageContract::default())
    }

    pub fn with_contract(driver: &'a mut D, page_url: impl Into<String>, contract: PageContract) -> Self {
        Self {
            driver,
            page_url: page_url.into(),
            contract,
        }
    }

    /// Run one login attempt and classify it. Never fails: every error
    /// becomes a FAIL verdict whose details carry the error text.
    pub async fn run_case(&mut self, username: &str, password: &str, expected: &str) -> (Verdict, String) {
        match self.attempt_login(username, password).await {
            Ok(message) => classify(&self.contract, expected, username, &message),
            Err(e) if e.is_missing_element() => (
                Verdict::Fail,
                format!("Element not found on page. Error: {}", e),
            ),
            Err(e) => (
                Verdict::Fail,
                format!("Unexpected error during test. Error: {}", e),
            ),
        }
    }

    /// Load the page, submit the credentials and return the trimmed status message
    async fn attempt_login(&mut self, username: &str, password: &str) -> CheckResult<String> {
        let contract = &self.contract;
        let driver = &mut *self.driver;

        driver.navigate(&self.page_url).await?;

        let username_input = driver.find_by_id(&contract.username_id).await?;
        let password_input = driver.find_by_id(&contract.password_id).await?;
        let login_button = driver.find_by_id(&contract.submit_id).await?;

        driver.clear(&username_input).await?;
        driver.clear(&password_input).await?;
        driver.send_keys(&username_input, username).await?;
        driver.send_keys(&password_input, password).await?;
        driver.click(&login_button).await?;

        let message = driver.find_by_id(&contract.message_id).await?;
        let text = driver.text(&message).await?;
        Ok(text.trim().to_string())
    }

    /// Run every case in order, one at a time, logging each record
    pub async fn run_all(&mut self, cases: &[TestCase]) -> RunReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut records = Vec::with_capacity(cases.len());
        let mut passed = 0;
        let mut failed = 0;

        info!("Running {} case(s) against {}", cases.len(), self.page_url);

        for case in cases {
            debug!("Running case for user '{}'", case.username);
            let (verdict, details) = self
                .run_case(&case.username, &case.password, &case.expected_result)
                .await;

            let record = ResultRecord::new(case, verdict, details);
            if verdict.is_pass() {
                passed += 1;
                info!(target: RUN_LOG, "{}", record.log_line());
            } else {
                failed += 1;
                error!(target: RUN_LOG, "{}", record.log_line());
            }
            records.push(record);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Case results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        RunReport {
            started_at,
            total: cases.len(),
            passed,
            failed,
            duration_ms,
            records,
        }
    }
}

/// Classify a status message against the expected outcome token
pub fn classify(contract: &PageContract, expected: &str, username: &str, message: &str) -> (Verdict, String) {
    let outcome = match expected.parse::<ExpectedOutcome>() {
        Ok(outcome) => outcome,
        Err(CheckError::InvalidExpectation(token)) => {
            return (
                Verdict::Fail,
                format!("Invalid expected_result in CSV: '{}'", token),
            );
        }
        Err(e) => return (Verdict::Fail, e.to_string()),
    };

    match outcome {
        ExpectedOutcome::Success if message.contains(&contract.success_marker) => (
            Verdict::Pass,
            format!(
                "Login SUCCESS as expected for user '{}'. Page message: '{}'",
                username, message
            ),
        ),
        ExpectedOutcome::Failure if message.contains(&contract.failure_marker) => (
            Verdict::Pass,
            format!(
                "Login FAILED as expected for user '{}'. Page message: '{}'",
                username, message
            ),
        ),
        _ => (
            Verdict::Fail,
            format!(
                "Expected {} for user '{}', but page message was: '{}'",
                outcome, username, message
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::ElementRef;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use test_case::test_case;

    const SUCCESS_MSG: &str = "Login successful. Welcome, admin!";
    const FAILURE_MSG: &str = "Invalid username or password.";

    /// In-memory login page accepting admin / correct-pw
    #[derive(Default)]
    struct FakePage {
        loaded: bool,
        fields: HashMap<String, String>,
        message: String,
        missing: Option<&'static str>,
        fail_navigation: bool,
        calls: Vec<String>,
    }

    #[async_trait]
    impl PageDriver for FakePage {
        async fn navigate(&mut self, url: &str) -> CheckResult<()> {
            self.calls.push(format!("navigate:{}", url));
            if self.fail_navigation {
                return Err(CheckError::Session("invalid session id".to_string()));
            }
            self.loaded = true;
            self.message.clear();
            Ok(())
        }

        async fn find_by_id(&mut self, id: &str) -> CheckResult<ElementRef> {
            if !self.loaded || self.missing == Some(id) {
                return Err(CheckError::NoSuchElement {
                    id: id.to_string(),
                    message: format!("Unable to locate element: #{}", id),
                });
            }
            Ok(ElementRef(id.to_string()))
        }

        async fn clear(&mut self, element: &ElementRef) -> CheckResult<()> {
            self.calls.push(format!("clear:{}", element.as_str()));
            self.fields.insert(element.as_str().to_string(), String::new());
            Ok(())
        }

        async fn send_keys(&mut self, element: &ElementRef, text: &str) -> CheckResult<()> {
            self.calls.push(format!("type:{}={}", element.as_str(), text));
            self.fields
                .entry(element.as_str().to_string())
                .or_default()
                .push_str(text);
            Ok(())
        }

        async fn click(&mut self, element: &ElementRef) -> CheckResult<()> {
            self.calls.push(format!("click:{}", element.as_str()));
            let user = self.fields.get("username").cloned().unwrap_or_default();
            let pass = self.fields.get("password").cloned().unwrap_or_default();
            self.message = if user == "admin" && pass == "correct-pw" {
                format!("  Login successful. Welcome, {}!\n", user)
            } else {
                FAILURE_MSG.to_string()
            };
            Ok(())
        }

        async fn text(&mut self, element: &ElementRef) -> CheckResult<String> {
            assert_eq!(element.as_str(), "message");
            Ok(self.message.clone())
        }
    }

    fn run<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }

    #[test_case("success", SUCCESS_MSG, Verdict::Pass ; "success expected and seen")]
    #[test_case("success", FAILURE_MSG, Verdict::Fail ; "success expected failure seen")]
    #[test_case("failure", FAILURE_MSG, Verdict::Pass ; "failure expected and seen")]
    #[test_case("failure", SUCCESS_MSG, Verdict::Fail ; "failure expected success seen")]
    #[test_case("maybe", SUCCESS_MSG, Verdict::Fail ; "unknown token")]
    #[test_case("", FAILURE_MSG, Verdict::Fail ; "empty token")]
    fn test_classification_table(expected: &str, message: &str, verdict: Verdict) {
        let (got, _) = classify(&PageContract::default(), expected, "admin", message);
        assert_eq!(got, verdict);
    }

    #[test]
    fn test_classify_uses_containment() {
        let contract = PageContract::default();
        let (verdict, details) = classify(&contract, "success", "eve", "Login successful. Welcome, eve!");
        assert_eq!(verdict, Verdict::Pass);
        assert_eq!(
            details,
            "Login SUCCESS as expected for user 'eve'. Page message: 'Login successful. Welcome, eve!'"
        );
    }

    #[test]
    fn test_unknown_token_is_named_in_details() {
        let (verdict, details) = classify(&PageContract::default(), "maybe", "admin", SUCCESS_MSG);
        assert_eq!(verdict, Verdict::Fail);
        assert_eq!(details, "Invalid expected_result in CSV: 'maybe'");
    }

    #[test]
    fn test_scenario_valid_login_passes() {
        let mut page = FakePage::default();
        let (verdict, details) = run(async {
            CaseRunner::new(&mut page, "file:///login.html")
                .run_case("admin", "correct-pw", "success")
                .await
        });
        assert_eq!(verdict, Verdict::Pass);
        assert!(details.contains("Page message: 'Login successful. Welcome, admin!'"));
    }

    #[test]
    fn test_scenario_rejected_login_passes_when_failure_expected() {
        let mut page = FakePage::default();
        let (verdict, details) = run(async {
            CaseRunner::new(&mut page, "file:///login.html")
                .run_case("admin", "wrong-pw", "failure")
                .await
        });
        assert_eq!(verdict, Verdict::Pass);
        assert_eq!(
            details,
            "Login FAILED as expected for user 'admin'. Page message: 'Invalid username or password.'"
        );
    }

    #[test]
    fn test_scenario_mismatch_quotes_observed_message() {
        let mut page = FakePage::default();
        let (verdict, details) = run(async {
            CaseRunner::new(&mut page, "file:///login.html")
                .run_case("admin", "wrong-pw", "success")
                .await
        });
        assert_eq!(verdict, Verdict::Fail);
        assert_eq!(
            details,
            "Expected SUCCESS for user 'admin', but page message was: 'Invalid username or password.'"
        );
    }

    #[test]
    fn test_scenario_malformed_token_still_interacts() {
        let mut page = FakePage::default();
        let (verdict, details) = run(async {
            CaseRunner::new(&mut page, "file:///login.html")
                .run_case("admin", "correct-pw", "maybe")
                .await
        });
        assert_eq!(verdict, Verdict::Fail);
        assert!(details.contains("'maybe'"));
        assert!(page.calls.iter().any(|c| c == "click:loginBtn"));
    }

    #[test]
    fn test_empty_credentials_are_submitted_unchanged() {
        let mut page = FakePage::default();
        let (verdict, _) = run(async {
            CaseRunner::new(&mut page, "file:///login.html")
                .run_case("", "", "failure")
                .await
        });
        assert_eq!(verdict, Verdict::Pass);
        assert!(page.calls.contains(&"type:username=".to_string()));
        assert!(page.calls.contains(&"type:password=".to_string()));
    }

    #[test]
    fn test_fields_are_cleared_before_typing() {
        let mut page = FakePage::default();
        run(async {
            CaseRunner::new(&mut page, "file:///login.html")
                .run_case("admin", "correct-pw", "success")
                .await
        });
        let pos = |call: &str| page.calls.iter().position(|c| c == call).unwrap();
        assert!(pos("clear:username") < pos("type:username=admin"));
        assert!(pos("clear:password") < pos("type:password=correct-pw"));
        assert!(pos("type:password=correct-pw") < pos("click:loginBtn"));
    }

    #[test]
    fn test_missing_element_is_a_fail_verdict() {
        let mut page = FakePage {
            missing: Some("loginBtn"),
            ..Default::default()
        };
        let (verdict, details) = run(async {
            CaseRunner::new(&mut page, "file:///login.html")
                .run_case("admin", "correct-pw", "success")
                .await
        });
        assert_eq!(verdict, Verdict::Fail);
        assert!(details.starts_with("Element not found on page. Error:"));
        assert!(details.contains("loginBtn"));
    }

    #[test]
    fn test_navigation_error_is_a_fail_verdict() {
        let mut page = FakePage {
            fail_navigation: true,
            ..Default::default()
        };
        let (verdict, details) = run(async {
            CaseRunner::new(&mut page, "file:///login.html")
                .run_case("admin", "correct-pw", "success")
                .await
        });
        assert_eq!(verdict, Verdict::Fail);
        assert!(details.starts_with("Unexpected error during test. Error:"));
        assert!(details.contains("invalid session id"));
    }

    #[test]
    fn test_run_all_preserves_order_and_count() {
        let cases = vec![
            TestCase::new("admin", "correct-pw", "success", "valid"),
            TestCase::new("admin", "wrong-pw", "success", "should fail"),
            TestCase::new("admin", "wrong-pw", "maybe", "bad token"),
            TestCase::new("", "", "failure", "empty"),
        ];
        let mut page = FakePage::default();
        let report = run(async {
            CaseRunner::new(&mut page, "file:///login.html")
                .run_all(&cases)
                .await
        });

        assert_eq!(report.total, 4);
        assert_eq!(report.records.len(), 4);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, 2);
        assert!(!report.all_passed());
        for (case, record) in cases.iter().zip(&report.records) {
            assert_eq!(record.username, case.username);
            assert_eq!(record.purpose, case.purpose);
        }
        let statuses: Vec<_> = report.records.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![Verdict::Pass, Verdict::Fail, Verdict::Fail, Verdict::Pass]);
    }

    #[test]
    fn test_same_case_twice_gives_same_verdict() {
        let case = TestCase::new("admin", "correct-pw", "success", "");
        let mut page = FakePage::default();
        let report = run(async {
            CaseRunner::new(&mut page, "file:///login.html")
                .run_all(&[case.clone(), case])
                .await
        });
        assert_eq!(report.records[0].status, report.records[1].status);
    }

    #[test]
    fn test_custom_contract_markers() {
        let contract = PageContract {
            success_marker: "Welcome".to_string(),
            failure_marker: "Denied".to_string(),
            ..Default::default()
        };
        assert_eq!(classify(&contract, "success", "u", "Welcome back").0, Verdict::Pass);
        assert_eq!(classify(&contract, "failure", "u", "Access Denied").0, Verdict::Pass);
        assert_eq!(classify(&contract, "failure", "u", FAILURE_MSG).0, Verdict::Fail);
    }
}
