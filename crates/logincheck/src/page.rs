//! The page-driving seam between the case runner and a browser backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CheckResult;

/// Opaque handle to an element located on the current page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Operations the case runner needs from a browser session.
///
/// Implementations own one browser context; every call acts on its current
/// page, so callers must not interleave cases on the same driver.
#[async_trait]
pub trait PageDriver: Send {
    /// Load `url` in the current browsing context
    async fn navigate(&mut self, url: &str) -> CheckResult<()>;

    /// Locate an element by its `id` attribute.
    ///
    /// Returns `CheckError::NoSuchElement` when the page has no such element.
    async fn find_by_id(&mut self, id: &str) -> CheckResult<ElementRef>;

    /// Clear an input element's value
    async fn clear(&mut self, element: &ElementRef) -> CheckResult<()>;

    /// Type `text` into an element
    async fn send_keys(&mut self, element: &ElementRef, text: &str) -> CheckResult<()>;

    async fn click(&mut self, element: &ElementRef) -> CheckResult<()>;

    /// Rendered text of an element
    async fn text(&mut self, element: &ElementRef) -> CheckResult<String>;
}

/// Element identifiers and status markers the login page is expected to expose
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageContract {
    pub username_id: String,
    pub password_id: String,
    pub submit_id: String,
    pub message_id: String,

    /// Substring present in the status message after a successful login
    pub success_marker: String,

    /// Substring present in the status message after a rejected login
    pub failure_marker: String,
}

impl Default for PageContract {
    fn default() -> Self {
        Self {
            username_id: "username".to_string(),
            password_id: "password".to_string(),
            submit_id: "loginBtn".to_string(),
            message_id: "message".to_string(),
            success_marker: "Login successful".to_string(),
            failure_marker: "Invalid username or password".to_string(),
        }
    }
}
