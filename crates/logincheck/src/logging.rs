//! Tracing setup: console output plus the append-mode run log

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{Level, Subscriber};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

/// Target carrying per-case lines and the run markers into the log file
pub const RUN_LOG: &str = "run_log";

pub const RUN_STARTED: &str = "===== LOGIN TEST RUN STARTED =====";
pub const RUN_FINISHED: &str = "===== LOGIN TEST RUN FINISHED =====";

/// Append-mode log file opened on the first write.
///
/// Nothing touches the filesystem until a run-log event is emitted, so a run
/// that aborts during browser startup leaves no log file behind.
pub struct RunLogWriter {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl RunLogWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub struct RunLogHandle<'a> {
    writer: &'a RunLogWriter,
}

impl Write for RunLogHandle<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .writer
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "run log lock poisoned"))?;

        if guard.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.writer.path)?;
            *guard = Some(file);
        }

        match guard.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(0),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.file.lock() {
            Ok(mut guard) => match guard.as_mut() {
                Some(file) => file.flush(),
                None => Ok(()),
            },
            Err(_) => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RunLogWriter {
    type Writer = RunLogHandle<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RunLogHandle { writer: self }
    }
}

/// Layer writing `run_log` events at INFO and above to `log_file`
pub fn run_log_layer<S>(log_file: &Path) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(RunLogWriter::new(log_file))
        .with_filter(Targets::new().with_target(RUN_LOG, Level::INFO))
}

/// Install the global subscriber.
///
/// The console layer honours `RUST_LOG` (default `info`, or `debug` when
/// `verbose`); the file layer only records the `run_log` target.
pub fn init(log_file: &Path, verbose: bool) -> anyhow::Result<()> {
    let console_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let console = fmt::layer().with_target(false).with_filter(console_filter);

    tracing_subscriber::registry()
        .with(console)
        .with(run_log_layer(log_file))
        .try_init()?;
    Ok(())
}
