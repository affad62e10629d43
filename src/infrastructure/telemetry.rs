use std::io::IsTerminal;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Mantiene vivo el writer del archivo de log hasta el final del proceso.
#[derive(Debug)]
pub struct TelemetryGuard {
    _guard: Option<WorkerGuard>,
}

impl TelemetryGuard {
    fn disabled() -> Self {
        Self { _guard: None }
    }
}

/// Configura `tracing` hacia stderr y, opcionalmente, hacia `log_file`.
///
/// `RUST_LOG` tiene prioridad sobre `default_level`.
pub fn init_tracing(default_level: &str, log_file: Option<&Path>) -> TelemetryGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_file {
        Some(path) => match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                let layer = fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(non_blocking);
                (Some(layer), Some(guard))
            }
            Err(err) => {
                eprintln!(
                    "Warning: failed to open log file {}: {}",
                    path.display(),
                    err
                );
                (None, None)
            }
        },
        None => (None, None),
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if result.is_err() {
        return TelemetryGuard::disabled();
    }

    TelemetryGuard { _guard: guard }
}
