use std::env;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use bytelog::{
    bridge, info, tee, warn, ConsoleEncoder, Core, Field, Flags, JsonEncoder, Level, Locked,
    LogConfig, Logger, WriteCore,
};
use tracing_subscriber::EnvFilter;

/// Builds the demo logger: from the TOML file named on the command line if there is one,
/// otherwise console lines on stdout plus JSON lines on stderr.
fn build_logger() -> bytelog::Result<Logger> {
    if let Some(path) = env::args().nth(1) {
        return LogConfig::from_file(path)?.build();
    }

    let console = WriteCore::new(
        ConsoleEncoder::new(Flags::STD | Flags::MICROSECONDS | Flags::SHORT_FILE),
        Locked::new(io::stdout()),
        Level::DEBUG,
    );
    let json = WriteCore::new(
        JsonEncoder::new(Flags::SHORT_FILE | Flags::UTC),
        Locked::new(io::stderr()),
        Level::WARN,
    );
    let cores: Vec<Arc<dyn Core>> = vec![Arc::new(console), Arc::new(json)];
    Ok(Logger::new(tee(cores)).named("demo").with_caller(true))
}

fn main() -> ExitCode {
    // Diagnostics from the library itself, e.g. RUST_LOG=bytelog=debug
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let logger = match build_logger() {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("bytelog: {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = bridge::install(logger.clone().named("log"), log::LevelFilter::Debug) {
        eprintln!("bytelog: {}", err);
    }

    let requests = logger.clone().with_fields(vec![Field::new("component", "http")]);
    info!(requests, "listening on {}", "127.0.0.1:8080"; "tls" => false);
    requests.debug(
        "request",
        &[
            Field::new("method", "GET"),
            Field::new("path", "/health"),
            Field::new("latency", std::time::Duration::from_micros(1250)),
        ],
    );
    warn!(requests, "slow request"; "path" => "/search", "elapsed_ms" => 812.5);
    log::info!(target: "deps", "message from the log crate");

    match logger.sync() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("bytelog: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
