//! Reverse geocoding over HTTP.
//!
//! # Components
//!
//! - [`AsyncHttpClient`] - transport seam, [`AsyncReqwestClient`] in production
//! - [`CachedFetcher`] - memoizing, coalescing fetch driven by a [`FetchSpec`]
//! - [`ReverseGeocodeClient`] - the fetcher specialised for `/reverse` lookups
//! - [`RawAddressPayload`] - untyped provider response
//!
//! # Example
//!
//! ```ignore
//! use guia::geocode::{GeocoderConfig, ReverseGeocodeClient};
//!
//! let client = ReverseGeocodeClient::from_config(GeocoderConfig::default())?;
//! let payload = client.resolve(coordinate).await?;
//! ```

mod client;
mod error;
mod fetcher;
pub(crate) mod http;
mod payload;

pub use client::{
    GeocoderConfig, ReverseGeocodeClient, ReverseGeocodeSpec, DEFAULT_BASE_URL, DEFAULT_ZOOM,
    MAX_ZOOM,
};
pub use error::GeocodeError;
pub use fetcher::{CachedFetcher, FetchResult, FetchSpec, FetchStats};
pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_HTTP_TIMEOUT, DEFAULT_USER_AGENT};
pub use payload::RawAddressPayload;
