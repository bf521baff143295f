//! Coarse classification of a resolved place.

use std::fmt;

use serde::Serialize;

use crate::geocode::RawAddressPayload;

/// What kind of place a payload describes, from its OSM `class`/`type` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    /// `class=place, type=house`
    Residential,
    /// `class=shop, type=mall`
    ShoppingCenter,
    Unclassified,
}

impl AddressKind {
    pub fn classify(payload: &RawAddressPayload) -> Self {
        match (payload.class(), payload.kind()) {
            (Some("place"), Some("house")) => Self::Residential,
            (Some("shop"), Some("mall")) => Self::ShoppingCenter,
            _ => Self::Unclassified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::ShoppingCenter => "shopping center",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
