//! Driver management - spawning and health checking the local WebDriver binary

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{CheckError, CheckResult};

/// Time a driver gets to exit after SIGTERM before it is killed
const STOP_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chrome,
    Firefox,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
        }
    }

    /// WebDriver binary used when none is configured
    pub fn default_binary(&self) -> &'static str {
        match self {
            Browser::Chrome => "chromedriver",
            Browser::Firefox => "geckodriver",
        }
    }

    fn port_args(&self, port: u16) -> Vec<String> {
        match self {
            Browser::Chrome => vec![format!("--port={}", port)],
            Browser::Firefox => vec!["--port".to_string(), port.to_string()],
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Browser::Chrome),
            "firefox" => Ok(Browser::Firefox),
            other => Err(CheckError::Config(format!("unsupported browser: {}", other))),
        }
    }
}

/// Handle to a running WebDriver process
pub struct DriverProcess {
    child: Child,
    pub base_url: String,
    pub port: u16,
}

impl DriverProcess {
    /// Spawn the WebDriver binary and wait until it reports ready
    pub async fn spawn(config: &DriverConfig) -> CheckResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let base_url = format!("http://127.0.0.1:{}", port);
        let binary = config.binary_path();

        info!("Spawning {} on port {}", binary.display(), port);

        let child = Command::new(&binary)
            .args(config.browser.port_args(port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                CheckError::DriverStartup(format!("Failed to spawn {}: {}", binary.display(), e))
            })?;

        let mut handle = DriverProcess {
            child,
            base_url,
            port,
        };

        // Dropping the handle on failure stops the half-started process
        handle.wait_for_ready(config.startup_timeout()).await?;

        info!("WebDriver is ready at {}", handle.base_url);
        Ok(handle)
    }

    /// Poll `/status` until the driver accepts new sessions
    async fn wait_for_ready(&mut self, timeout_duration: Duration) -> CheckResult<()> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            if let Ok(Some(status)) = self.child.try_wait() {
                return Err(CheckError::DriverStartup(format!(
                    "WebDriver exited during startup with {}",
                    status
                )));
            }

            match wait_ready_once(&client, &self.base_url).await {
                Ok(true) => return Ok(()),
                Ok(false) => debug!("WebDriver not ready yet"),
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for WebDriver to start...");
                    }
                    // Connection refused is expected while the driver is starting
                    if !e.is_connect() {
                        warn!("Status check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(CheckError::DriverHealthCheck(attempts))
    }

    /// Stop the driver process from async code: SIGTERM, a grace period, then kill
    pub async fn shutdown(&mut self) -> CheckResult<()> {
        if self.exited() {
            return Ok(());
        }
        if self.terminate() {
            sleep(STOP_GRACE).await;
        }
        self.reap()
    }

    /// Blocking variant of [`shutdown`](Self::shutdown), used on drop
    pub fn stop(&mut self) -> CheckResult<()> {
        if self.exited() {
            return Ok(());
        }
        if self.terminate() {
            std::thread::sleep(STOP_GRACE);
        }
        self.reap()
    }

    fn exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }

    /// Send SIGTERM; returns whether the signal was delivered
    fn terminate(&self) -> bool {
        info!("Stopping WebDriver (pid: {})", self.child.id());
        send_sigterm(self.child.id())
    }

    fn reap(&mut self) -> CheckResult<()> {
        let _ = self.child.kill();
        self.child.wait()?;
        Ok(())
    }
}

#[cfg(unix)]
fn send_sigterm(pid: u32) -> bool {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
}

#[cfg(not(unix))]
fn send_sigterm(_pid: u32) -> bool {
    false
}

impl Drop for DriverProcess {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Ask a WebDriver endpoint whether it is ready for a new session
async fn wait_ready_once(client: &reqwest::Client, base_url: &str) -> Result<bool, reqwest::Error> {
    let resp = client.get(format!("{}/status", base_url)).send().await?;
    if !resp.status().is_success() {
        return Ok(false);
    }
    let body: serde_json::Value = resp.json().await?;
    Ok(body["value"]["ready"].as_bool().unwrap_or(true))
}

/// How to reach a WebDriver endpoint and which browser to start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub browser: Browser,

    /// WebDriver binary (None = chromedriver/geckodriver from PATH)
    pub binary: Option<PathBuf>,

    /// Existing WebDriver endpoint; when set no process is spawned
    pub url: Option<String>,

    /// Port for the spawned driver (None = find free port)
    pub port: Option<u16>,

    pub headless: bool,

    /// Maximize the browser window once the session is open
    pub maximize: bool,

    pub startup_timeout_secs: u64,
}

impl DriverConfig {
    pub fn binary_path(&self) -> PathBuf {
        self.binary
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.browser.default_binary()))
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chrome,
            binary: None,
            url: None,
            port: None,
            headless: false,
            maximize: true,
            startup_timeout_secs: 30,
        }
    }
}

/// Find a free port to use
pub fn find_free_port() -> CheckResult<u16> {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
