//! Provider payload → stable address shape.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::geocode::RawAddressPayload;

/// Address component holding the ISO 3166-2 subdivision code (e.g. `BR-SP`).
const SUBDIVISION_FIELD: &str = "ISO3166-2-lvl4";

/// Placeholder used for a street without a house number ("sem número").
pub const NO_NUMBER: &str = "s/n";

static SUBDIVISION_REGEX: OnceLock<Regex> = OnceLock::new();

fn subdivision_regex() -> &'static Regex {
    SUBDIVISION_REGEX.get_or_init(|| {
        // Country code, dash, two-letter region: "BR-SP"
        Regex::new(r"^[A-Z]{2}-([A-Z]{2})$").expect("valid regex")
    })
}

/// A postal address in a provider-independent shape.
///
/// Every field is optional; a payload without an `address` object yields an
/// address with every field absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct NormalizedAddress {
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub neighborhood: Option<String>,
    /// Larger city region, only set when the provider gives both a
    /// neighbourhood and a suburb.
    pub district: Option<String>,
    pub municipality: Option<String>,
    pub state_name: Option<String>,
    /// Regional part of the ISO 3166-2 code (`SP` for `BR-SP`).
    pub state_code: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

impl NormalizedAddress {
    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `"Street, 123"`, or `"Street, s/n"` without a house number.
    pub fn street_line(&self) -> Option<String> {
        let street = self.street.as_deref()?;
        let number = self.house_number.as_deref().unwrap_or(NO_NUMBER);
        Some(format!("{}, {}", street, number))
    }

    /// `"Neighborhood, District"`, or just the neighborhood.
    pub fn neighborhood_line(&self) -> Option<String> {
        let neighborhood = self.neighborhood.as_deref()?;
        Some(match self.district.as_deref() {
            Some(district) => format!("{}, {}", neighborhood, district),
            None => neighborhood.to_string(),
        })
    }

    /// State code when known, else the state name.
    pub fn state(&self) -> Option<&str> {
        self.state_code.as_deref().or(self.state_name.as_deref())
    }
}

impl fmt::Display for NormalizedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            self.street_line(),
            self.neighborhood_line(),
            self.municipality.clone(),
            self.state().map(str::to_string),
            self.postal_code.clone(),
            self.country.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            f.write_str("(unknown address)")
        } else {
            f.write_str(&parts.join(" - "))
        }
    }
}

/// Maps provider payloads to [`NormalizedAddress`].
///
/// Total and deterministic: every payload shape produces an address, and the
/// same payload always produces the same address.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressNormalizer;

impl AddressNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, payload: &RawAddressPayload) -> NormalizedAddress {
        if payload.address().is_none() {
            return NormalizedAddress::default();
        }

        let field = |name: &str| payload.address_field(name);
        let first = |names: &[&str]| names.iter().find_map(|name| field(*name));

        let neighbourhood = field("neighbourhood");
        let suburb = field("suburb");
        let district = match (&neighbourhood, &suburb) {
            (Some(_), Some(suburb)) => Some(suburb.clone()),
            _ => None,
        };

        NormalizedAddress {
            street: first(&["street", "road"]),
            house_number: field("house_number"),
            neighborhood: neighbourhood.or(suburb),
            district,
            municipality: first(&["city", "town", "municipality", "county"]),
            state_name: field("state"),
            state_code: field(SUBDIVISION_FIELD).and_then(|code| state_code(&code)),
            postal_code: field("postcode"),
            country: field("country"),
            country_code: field("country_code"),
        }
    }
}

fn state_code(subdivision: &str) -> Option<String> {
    subdivision_regex()
        .captures(subdivision.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
