//! W3C WebDriver session over HTTP

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::driver::{Browser, DriverConfig, DriverProcess};
use crate::error::{CheckError, CheckResult};
use crate::page::{ElementRef, PageDriver};

/// Key under which W3C WebDriver returns element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Error body returned by a WebDriver endpoint
#[derive(Debug, Deserialize)]
struct ErrorValue {
    error: String,
    #[serde(default)]
    message: String,
}

/// A live browser session, acquired once and reused for every case
pub struct WebDriverSession {
    http: reqwest::Client,
    base_url: String,
    session_id: String,

    /// Locally spawned driver, if this session owns one
    process: Option<DriverProcess>,
}

impl WebDriverSession {
    /// Start (or connect to) a WebDriver endpoint and open a new session
    pub async fn acquire(config: &DriverConfig) -> CheckResult<Self> {
        let (base_url, process) = match &config.url {
            Some(url) => (url.trim_end_matches('/').to_string(), None),
            None => {
                let process = DriverProcess::spawn(config).await?;
                (process.base_url.clone(), Some(process))
            }
        };

        let http = reqwest::Client::new();
        let capabilities = capabilities(config.browser, config.headless);

        let resp = http
            .post(format!("{}/session", base_url))
            .json(&json!({ "capabilities": capabilities }))
            .send()
            .await
            .map_err(|e| CheckError::Session(format!("cannot reach {}: {}", base_url, e)))?;

        let value = read_value(resp)
            .await
            .map_err(|e| CheckError::Session(format!("new session refused: {}", e)))?;

        let session_id = value["sessionId"]
            .as_str()
            .ok_or_else(|| CheckError::Session("response carried no sessionId".to_string()))?
            .to_string();

        info!("Opened {} session {}", config.browser.as_str(), session_id);

        let session = Self {
            http,
            base_url,
            session_id,
            process,
        };

        if config.maximize {
            if let Err(e) = session.command(Method::POST, "window/maximize", json!({})).await {
                warn!("Could not maximize window: {}", e);
            }
        }

        Ok(session)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Delete the session and stop the driver process, if one was spawned
    pub async fn quit(mut self) -> CheckResult<()> {
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        let result = match self.http.delete(&url).send().await {
            Ok(resp) => read_value(resp).await.map(|_| ()),
            Err(e) => Err(e.into()),
        };

        info!("Closed session {}", self.session_id);

        if let Some(mut process) = self.process.take() {
            process.shutdown().await?;
        }
        result
    }

    /// Send a session-scoped command and return its `value`
    async fn command(&self, method: Method, path: &str, body: Value) -> CheckResult<Value> {
        let url = format!("{}/session/{}/{}", self.base_url, self.session_id, path);
        debug!("{} {}", method, url);

        let request = self.http.request(method.clone(), &url);
        let request = if method == Method::GET {
            request
        } else {
            request.json(&body)
        };

        read_value(request.send().await?).await
    }
}

/// Unwrap the `value` member of a WebDriver response, mapping error bodies
async fn read_value(resp: reqwest::Response) -> CheckResult<Value> {
    let status = resp.status();
    let body: Value = resp.json().await?;
    let value = match body {
        Value::Object(mut map) => map.remove("value").unwrap_or(Value::Null),
        _ => {
            return Err(CheckError::WebDriver {
                error: status.to_string(),
                message: "malformed response".to_string(),
            })
        }
    };

    if status.is_success() {
        return Ok(value);
    }

    match serde_json::from_value::<ErrorValue>(value) {
        Ok(err) => Err(CheckError::WebDriver {
            error: err.error,
            message: err.message,
        }),
        Err(_) => Err(CheckError::WebDriver {
            error: status.to_string(),
            message: "malformed error response".to_string(),
        }),
    }
}

/// New-session capabilities for the configured browser
fn capabilities(browser: Browser, headless: bool) -> Value {
    let mut always_match = json!({ "browserName": browser.as_str() });
    if headless {
        match browser {
            Browser::Chrome => {
                always_match["goog:chromeOptions"] = json!({ "args": ["--headless=new"] });
            }
            Browser::Firefox => {
                always_match["moz:firefoxOptions"] = json!({ "args": ["-headless"] });
            }
        }
    }
    json!({ "alwaysMatch": always_match })
}

/// CSS selector matching an element by exact `id` attribute
pub fn id_selector(id: &str) -> String {
    let escaped = id.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[id=\"{}\"]", escaped)
}

fn element_path(element: &ElementRef, action: &str) -> String {
    format!("element/{}/{}", element.as_str(), action)
}

#[async_trait]
impl PageDriver for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> CheckResult<()> {
        self.command(Method::POST, "url", json!({ "url": url })).await?;
        Ok(())
    }

    async fn find_by_id(&mut self, id: &str) -> CheckResult<ElementRef> {
        let body = json!({ "using": "css selector", "value": id_selector(id) });
        let value = match self.command(Method::POST, "element", body).await {
            Ok(value) => value,
            Err(CheckError::WebDriver { error, message }) if error == "no such element" => {
                return Err(CheckError::NoSuchElement {
                    id: id.to_string(),
                    message,
                });
            }
            Err(e) => return Err(e),
        };

        value[ELEMENT_KEY]
            .as_str()
            .map(|r| ElementRef(r.to_string()))
            .ok_or_else(|| CheckError::Session(format!("malformed element reference for '{}'", id)))
    }

    async fn clear(&mut self, element: &ElementRef) -> CheckResult<()> {
        self.command(Method::POST, &element_path(element, "clear"), json!({}))
            .await?;
        Ok(())
    }

    async fn send_keys(&mut self, element: &ElementRef, text: &str) -> CheckResult<()> {
        self.command(Method::POST, &element_path(element, "value"), json!({ "text": text }))
            .await?;
        Ok(())
    }

    async fn click(&mut self, element: &ElementRef) -> CheckResult<()> {
        self.command(Method::POST, &element_path(element, "click"), json!({}))
            .await?;
        Ok(())
    }

    async fn text(&mut self, element: &ElementRef) -> CheckResult<String> {
        let value = self
            .command(Method::GET, &element_path(element, "text"), Value::Null)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_selector_escapes_quotes() {
        assert_eq!(id_selector("loginBtn"), "[id=\"loginBtn\"]");
        assert_eq!(id_selector("a\"b"), "[id=\"a\\\"b\"]");
        assert_eq!(id_selector("a\\b"), "[id=\"a\\\\b\"]");
    }

    #[test]
    fn test_headless_capabilities() {
        let caps = capabilities(Browser::Chrome, true);
        assert_eq!(caps["alwaysMatch"]["browserName"], "chrome");
        assert_eq!(caps["alwaysMatch"]["goog:chromeOptions"]["args"][0], "--headless=new");

        let caps = capabilities(Browser::Firefox, false);
        assert_eq!(caps["alwaysMatch"]["browserName"], "firefox");
        assert!(caps["alwaysMatch"].get("moz:firefoxOptions").is_none());
    }
}
