//! Terminal rendering of tracking events.
//!
//! Positions and addresses go to stdout; tracking errors go to stderr so the
//! address stream can be piped on its own.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use console::style;
use guia::address::{AddressKind, NormalizedAddress};
use guia::geocode::FetchStats;
use guia::notify::{Subscriber, SubscriberError};
use guia::position::{AcceptanceResult, TrackedPosition};
use guia::tracking::{AddressEvent, TrackingError};

/// An accepted position as display lines: coordinate and accuracy first,
/// then whatever motion data the fix carries, then map links.
pub fn format_position(position: &TrackedPosition) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {}  ±{:.0} m ({})",
        style("Position").cyan().bold(),
        position.coordinate,
        position.accuracy,
        position.accuracy_quality
    )];

    let mut vertical = Vec::new();
    if let Some(altitude) = position.altitude {
        vertical.push(format!("Altitude {:.2} m", altitude));
    }
    if let Some(accuracy) = position.altitude_accuracy {
        vertical.push(format!("±{:.0} m", accuracy));
    }
    if !vertical.is_empty() {
        lines.push(format!("  {}", vertical.join(" ")));
    }

    let mut motion = Vec::new();
    if let Some(heading) = position.heading {
        motion.push(format!("Heading {:.2}°", heading));
    }
    if let Some(speed) = position.speed {
        motion.push(format!("Speed {:.2} m/s", speed));
    }
    if !motion.is_empty() {
        lines.push(format!("  {}", motion.join("  ")));
    }

    let lat_lon = format!(
        "{:.6},{:.6}",
        position.coordinate.latitude, position.coordinate.longitude
    );
    lines.push(
        style(format!("  Map https://www.google.com/maps?q={}", lat_lon))
            .dim()
            .to_string(),
    );
    lines.push(
        style(format!(
            "  Street View https://www.google.com/maps/@?api=1&map_action=pano&viewpoint={}",
            lat_lon
        ))
        .dim()
        .to_string(),
    );

    lines
}

/// The address as display lines, most specific first.
pub fn format_address(address: &NormalizedAddress, kind: AddressKind) -> Vec<String> {
    if address.is_empty() {
        return vec![style("(unknown address)").dim().to_string()];
    }

    let mut lines = Vec::new();
    if let Some(street) = address.street_line() {
        lines.push(style(street).bold().to_string());
    }
    if let Some(neighborhood) = address.neighborhood_line() {
        lines.push(neighborhood);
    }

    let locality: Vec<&str> = [address.municipality.as_deref(), address.state()]
        .into_iter()
        .flatten()
        .collect();
    if !locality.is_empty() {
        lines.push(locality.join(" - "));
    }
    if let Some(postal_code) = &address.postal_code {
        lines.push(format!("CEP {}", postal_code));
    }
    if let Some(country) = &address.country {
        lines.push(country.clone());
    }
    if kind != AddressKind::Unclassified {
        lines.push(style(format!("[{}]", kind)).yellow().to_string());
    }

    lines
}

/// Summary of geocoder activity printed when tracking ends.
pub fn format_stats(addresses: usize, stats: &FetchStats) -> String {
    format!(
        "{} address(es) published; {} lookups, {} from cache, {} network requests, {} failed",
        addresses, stats.requests, stats.cache_hits, stats.network_fetches, stats.failures
    )
}

/// Prints accepted positions and, when verbose, filtered readings.
pub struct PositionPrinter {
    show_rejections: bool,
}

impl PositionPrinter {
    pub fn new(show_rejections: bool) -> Self {
        Self { show_rejections }
    }
}

impl Subscriber<AcceptanceResult> for PositionPrinter {
    fn update(&self, event: &AcceptanceResult) -> Result<(), SubscriberError> {
        let mut out = io::stdout().lock();
        match event {
            AcceptanceResult::Accepted(position) => {
                for line in format_position(position) {
                    writeln!(out, "{}", line)?;
                }
            }
            AcceptanceResult::Rejected(reason) if self.show_rejections => {
                writeln!(out, "{}", style(format!("  reading skipped: {}", reason)).dim())?;
            }
            AcceptanceResult::Rejected(_) => {}
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "position printer"
    }
}

/// Prints each resolved address as an indented block.
#[derive(Default)]
pub struct AddressPrinter {
    printed: AtomicUsize,
}

impl AddressPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of addresses printed so far.
    pub fn printed(&self) -> usize {
        self.printed.load(Ordering::Relaxed)
    }
}

impl Subscriber<AddressEvent> for AddressPrinter {
    fn update(&self, event: &AddressEvent) -> Result<(), SubscriberError> {
        let mut out = io::stdout().lock();
        for line in format_address(&event.address, event.kind) {
            writeln!(out, "    {}", line)?;
        }
        writeln!(out)?;
        self.printed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &str {
        "address printer"
    }
}

/// Prints tracking failures to stderr.
pub struct ErrorPrinter;

impl Subscriber<TrackingError> for ErrorPrinter {
    fn update(&self, event: &TrackingError) -> Result<(), SubscriberError> {
        writeln!(io::stderr().lock(), "{} {}", style("!").red().bold(), event)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "error printer"
    }
}
