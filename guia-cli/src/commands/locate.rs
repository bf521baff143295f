//! `guia locate`: resolve one coordinate to an address.

use clap::Args;
use guia::address::{AddressKind, AddressNormalizer};
use guia::app::{build_geocoder, AppConfig};
use guia::geo::Coordinate;
use tracing::debug;

use crate::error::CliError;
use crate::output;

/// Arguments for the locate command.
#[derive(Debug, Args)]
pub struct LocateArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Print the normalized address as JSON
    #[arg(long, conflicts_with = "raw")]
    pub json: bool,

    /// Print the provider's response unchanged
    #[arg(long)]
    pub raw: bool,
}

/// Run the locate command.
pub fn run(args: LocateArgs, config: &AppConfig) -> Result<(), CliError> {
    let coordinate = Coordinate::new(args.lat, args.lon)
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    let geocoder = build_geocoder(config)?;
    debug!(url = %geocoder.request_url(&coordinate), "Resolving coordinate");

    let runtime = super::common::runtime()?;
    let payload = runtime.block_on(geocoder.resolve(coordinate))?;

    if args.raw {
        println!("{:#}", payload.as_value());
        return Ok(());
    }

    let address = AddressNormalizer::new().normalize(&payload);
    if args.json {
        let value = serde_json::to_value(&address).map_err(CliError::Render)?;
        println!("{:#}", value);
        return Ok(());
    }

    println!("{}", coordinate);
    for line in output::format_address(&address, AddressKind::classify(&payload)) {
        println!("    {}", line);
    }
    Ok(())
}
