//! logincheck - run the login test data through a browser and record verdicts

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use logincheck::config::RunConfig;
use logincheck::driver::Browser;
use logincheck::logging;
use logincheck::{run_suite, RunReport};

#[derive(Parser, Debug)]
#[command(name = "logincheck")]
#[command(about = "Data-driven login page verification over WebDriver")]
#[command(version)]
struct Args {
    /// Configuration file path (missing file = defaults)
    #[arg(short, long, default_value = "logincheck.toml")]
    config: PathBuf,

    /// Page under test (local HTML path or URL)
    #[arg(long)]
    page: Option<String>,

    /// Test data CSV
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Results CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run log file (appended)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Also write a JSON run summary here
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Browser to drive (chrome, firefox)
    #[arg(long)]
    browser: Option<Browser>,

    /// Connect to a running WebDriver endpoint instead of spawning one
    #[arg(long, env = "LOGINCHECK_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Path to the WebDriver binary
    #[arg(long)]
    driver_binary: Option<PathBuf>,

    /// Port for the spawned WebDriver
    #[arg(long)]
    driver_port: Option<u16>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Exit with status 1 when any case fails
    #[arg(long)]
    strict: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<RunConfig> {
        let mut config = RunConfig::load(&self.config)
            .with_context(|| format!("failed to load {}", self.config.display()))?;

        if let Some(page) = self.page {
            config.page = page;
        }
        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = log_file;
        }
        if self.summary.is_some() {
            config.summary = self.summary;
        }
        if let Some(browser) = self.browser {
            config.driver.browser = browser;
        }
        if self.webdriver_url.is_some() {
            config.driver.url = self.webdriver_url;
        }
        if self.driver_binary.is_some() {
            config.driver.binary = self.driver_binary;
        }
        if self.driver_port.is_some() {
            config.driver.port = self.driver_port;
        }
        if self.headless {
            config.driver.headless = true;
        }
        Ok(config)
    }
}

fn main() {
    let args = Args::parse();
    let strict = args.strict;
    let verbose = args.verbose;

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = logging::init(&config.log_file, verbose) {
        eprintln!("Error: failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(run(config)) {
        Ok(report) if strict && !report.all_passed() => std::process::exit(1),
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

async fn run(config: RunConfig) -> anyhow::Result<RunReport> {
    let report = run_suite(&config).await.context("run aborted")?;

    println!(
        "✅ All tests finished: {} passed, {} failed",
        report.passed, report.failed
    );
    println!("📄 Results saved to: {}", config.output.display());
    println!("🧾 Log saved to: {}", config.log_file.display());
    if let Some(summary) = &config.summary {
        println!("📊 Summary saved to: {}", summary.display());
    }

    Ok(report)
}
