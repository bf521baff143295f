//! Address normalization.
//!
//! Turns the untyped [`RawAddressPayload`](crate::geocode::RawAddressPayload)
//! into a [`NormalizedAddress`] and an [`AddressKind`].

mod kind;
mod normalizer;

pub use kind::AddressKind;
pub use normalizer::{AddressNormalizer, NormalizedAddress, NO_NUMBER};
