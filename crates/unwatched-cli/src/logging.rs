use anyhow::Result;
use std::io;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// Filter directive for the given verbosity.
///
/// 0 = info, 1 = debug with hyper connection noise suppressed, 2+ = trace.
pub fn filter_directive(verbose_level: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose_level {
        0 => "info",
        1 => "debug,hyper::proto::h1=warn,hyper::client::pool=warn",
        _ => "trace",
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub fn init_logging_with_file(verbose_level: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let directive = filter_directive(verbose_level, quiet);
    let filter = if quiet {
        EnvFilter::new(directive)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
    };

    let json = std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or_else(|_| !io::stdout().is_terminal());

    let file_appender = match log_file {
        Some(log_path) => {
            let (log_dir, log_prefix) = rotation_parts(&log_path)?;
            std::fs::create_dir_all(&log_dir)?;
            // unwatched.log, unwatched.log.2026-10-18, ...
            Some(RollingFileAppender::new(Rotation::DAILY, log_dir, log_prefix))
        }
        None => None,
    };

    Registry::default()
        .with(output_layers(json, file_appender))
        .with(filter)
        .init();

    Ok(())
}

/// Stderr always gets a layer; a log file, when given, gets a second one.
fn output_layers(json: bool, file_appender: Option<RollingFileAppender>) -> Vec<BoxedLayer> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(io::stderr)
                .boxed(),
        );
    } else {
        layers.push(fmt::layer().with_timer(ChronoUtc::rfc_3339()).with_writer(io::stderr).boxed());
    }

    if let Some(appender) = file_appender {
        if json {
            layers.push(
                fmt::layer()
                    .json()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(appender)
                    .boxed(),
            );
        } else {
            layers.push(
                fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(appender)
                    .boxed(),
            );
        }
    }

    layers
}

/// Split a log file path into its directory and the prefix used for rotated
/// files. The full file name is the prefix, so rotation appends the date to it.
fn rotation_parts(log_path: &Path) -> Result<(PathBuf, String)> {
    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename: {}", log_path.display()))?;

    let log_dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((log_dir, log_filename.to_string()))
}

/// `--log-file` alone means the default log file under the config directory.
pub fn resolve_log_file(flag: Option<Option<PathBuf>>, default: &Path) -> Option<PathBuf> {
    flag.map(|path| path.unwrap_or_else(|| default.to_path_buf()))
}
