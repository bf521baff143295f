//! `guia track`: follow positions read from stdin.
//!
//! Input is one JSON position reading per line, in the same shape the
//! library deserializes:
//!
//! ```text
//! {"latitude": -23.5505, "longitude": -46.6333, "accuracy": 8, "timestampMs": 1700000000000}
//! ```
//!
//! Tracking stops on Ctrl-C, or once input has ended and the last reading
//! has been processed.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use guia::app::{AppConfig, GuiaApp};
use guia::notify::{Subscriber, SubscriberError};
use guia::position::PositionReading;
use guia::tracking::{CycleOutcome, PositionFeed, TrackingError};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CliError;
use crate::output::{self, AddressPrinter, ErrorPrinter, PositionPrinter};

/// Arguments for the track command.
#[derive(Debug, Args)]
pub struct TrackArgs {
    /// Seconds between tracking cycles [default: from config]
    #[arg(long)]
    pub interval: Option<u64>,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
}

/// Run the track command.
pub fn run(args: TrackArgs, config: AppConfig, verbose: bool) -> Result<(), CliError> {
    let config = match args.interval {
        Some(0) => {
            return Err(CliError::InvalidArgument(
                "--interval must be at least 1 second".to_string(),
            ))
        }
        Some(secs) => config.with_tracking_interval(Duration::from_secs(secs)),
        None => config,
    };

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    ctrlc::set_handler(move || token.cancel()).map_err(|e| CliError::Signal(e.to_string()))?;

    let runtime = super::common::runtime()?;
    let result = runtime.block_on(track(config, args.once, verbose, shutdown));
    // The stdin reader may still be parked in a blocking read
    runtime.shutdown_background();
    result
}

async fn track(
    config: AppConfig,
    once: bool,
    verbose: bool,
    shutdown: CancellationToken,
) -> Result<(), CliError> {
    let (feed, source) = PositionFeed::channel();
    let app = GuiaApp::new(config, source)?;

    let positions = Arc::new(PositionPrinter::new(verbose));
    let addresses = Arc::new(AddressPrinter::new());
    let errors = Arc::new(ErrorPrinter);
    let input_end = Arc::new(InputEndWatcher::new(shutdown.clone()));
    app.tracker().subscribe(&positions);
    app.controller().subscribe_addresses(&addresses);
    app.controller().subscribe_errors(&errors);
    app.controller().subscribe_errors(&input_end);

    let reader = tokio::spawn(forward_readings(tokio::io::stdin(), feed));

    if once {
        tokio::select! {
            outcome = app.controller().single_update() => report_outcome(&outcome),
            _ = shutdown.cancelled() => info!("Interrupted before a position arrived"),
        }
    } else {
        let handle = app.start_tracking();
        shutdown.cancelled().await;
        handle.shutdown().await;
    }

    reader.abort();
    match reader.await {
        Ok(Err(e)) => return Err(CliError::Input(e)),
        Ok(Ok(count)) => info!(readings = count, "Position input finished"),
        Err(_) => {}
    }

    eprintln!(
        "{}",
        output::format_stats(addresses.printed(), &app.geocoder().stats())
    );
    Ok(())
}

fn report_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Published(_) | CycleOutcome::Failed(_) => {}
        CycleOutcome::Rejected(reason) => eprintln!("Reading not used: {}", reason),
        CycleOutcome::Discarded => eprintln!("Tracking stopped before the address arrived"),
    }
}

/// Copies JSON position lines from `input` into `feed`.
///
/// Blank lines are ignored and malformed lines are logged and skipped. The
/// feed is closed when input ends; returns the number of readings pushed.
pub async fn forward_readings<R>(input: R, feed: PositionFeed) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    let mut forwarded = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<PositionReading>(line) {
            Ok(reading) => {
                feed.push(reading);
                forwarded += 1;
            }
            Err(e) => warn!(error = %e, line, "Skipping malformed position line"),
        }
    }

    feed.close();
    Ok(forwarded)
}

/// Ends the session once the closed input feed has nothing left to deliver.
///
/// A `FeedLocationSource` only reports `Unavailable` after its feed is
/// closed and every pushed reading has been handed out.
struct InputEndWatcher {
    shutdown: CancellationToken,
}

impl InputEndWatcher {
    fn new(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }
}

impl Subscriber<TrackingError> for InputEndWatcher {
    fn update(&self, event: &TrackingError) -> Result<(), SubscriberError> {
        if matches!(event, TrackingError::LocationUnavailable(_)) {
            info!("Position input exhausted, stopping");
            self.shutdown.cancel();
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "input end watcher"
    }
}
