//! Reverse-geocoding client for Nominatim-compatible services.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tracing::{debug, info, warn};

use super::error::GeocodeError;
use super::fetcher::{CachedFetcher, FetchSpec, FetchStats};
use super::http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_HTTP_TIMEOUT, DEFAULT_USER_AGENT};
use super::payload::RawAddressPayload;
use crate::cache::{AddressCacheConfig, CacheKey, CacheStats, DEFAULT_KEY_PRECISION};
use crate::geo::Coordinate;

/// Public OpenStreetMap Nominatim reverse endpoint.
pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Nominatim zoom level 18 resolves down to building/house level.
pub const DEFAULT_ZOOM: u8 = 18;

/// Highest zoom level Nominatim understands.
pub const MAX_ZOOM: u8 = 18;

/// Settings for [`ReverseGeocodeClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeocoderConfig {
    /// Reverse endpoint; query parameters are appended to it.
    pub base_url: String,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Detail level requested from the service (0-18).
    pub zoom: u8,
    /// Decimal digits kept in cache keys.
    pub key_precision: u8,
    pub cache: AddressCacheConfig,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
            zoom: DEFAULT_ZOOM,
            key_precision: DEFAULT_KEY_PRECISION,
            cache: AddressCacheConfig::default(),
        }
    }
}

impl GeocoderConfig {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_key_precision(mut self, precision: u8) -> Self {
        self.key_precision = precision;
        self
    }

    pub fn with_cache(mut self, cache: AddressCacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

/// Maps coordinates to cache keys and `/reverse` URLs.
#[derive(Debug, Clone)]
pub struct ReverseGeocodeSpec {
    base: Url,
    zoom: u8,
    key_precision: u8,
}

impl ReverseGeocodeSpec {
    pub fn new(base_url: &str, zoom: u8, key_precision: u8) -> Result<Self, GeocodeError> {
        let invalid = |reason: &str| GeocodeError::InvalidUrl {
            url: base_url.to_string(),
            reason: reason.to_string(),
        };

        let base = Url::parse(base_url).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if base.cannot_be_a_base() {
            return Err(invalid("not a base URL"));
        }

        Ok(Self {
            base,
            zoom: zoom.min(MAX_ZOOM),
            key_precision,
        })
    }
}

impl FetchSpec for ReverseGeocodeSpec {
    type Request = Coordinate;

    fn cache_key(&self, request: &Coordinate) -> CacheKey {
        CacheKey::from_coordinate(request, self.key_precision)
    }

    fn url(&self, request: &Coordinate) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &request.latitude.to_string())
            .append_pair("lon", &request.longitude.to_string())
            .append_pair("zoom", &self.zoom.to_string())
            .append_pair("addressdetails", "1");
        url.into()
    }
}

/// Resolves coordinates to provider address payloads.
///
/// Owns the response cache. Repeated and concurrent lookups for the same
/// rounded coordinate are served by a single HTTP request.
///
/// # Example
///
/// ```ignore
/// let client = ReverseGeocodeClient::from_config(GeocoderConfig::default())?;
/// let payload = client.resolve(Coordinate::new(-23.5505, -46.6333)?).await?;
/// println!("{:?}", payload.display_name());
/// ```
pub struct ReverseGeocodeClient<C = AsyncReqwestClient> {
    fetcher: CachedFetcher<C, ReverseGeocodeSpec>,
}

impl ReverseGeocodeClient<AsyncReqwestClient> {
    /// Creates a client backed by reqwest using the configured User-Agent and timeout.
    pub fn from_config(config: GeocoderConfig) -> Result<Self, GeocodeError> {
        let http = AsyncReqwestClient::with_options(&config.user_agent, config.timeout)?;
        Self::new(http, config)
    }
}

impl<C: AsyncHttpClient> ReverseGeocodeClient<C> {
    /// Creates a client over a custom HTTP transport.
    pub fn new(http: C, config: GeocoderConfig) -> Result<Self, GeocodeError> {
        let spec = ReverseGeocodeSpec::new(&config.base_url, config.zoom, config.key_precision)?;
        debug!(
            base_url = %config.base_url,
            zoom = spec.zoom,
            key_precision = spec.key_precision,
            max_entries = config.cache.max_entries,
            "Reverse geocoder created"
        );
        Ok(Self {
            fetcher: CachedFetcher::new(http, spec, config.cache),
        })
    }

    /// Returns the provider payload for a coordinate.
    ///
    /// Successful responses are cached under the rounded coordinate; transport
    /// and HTTP failures are never cached. A reply carrying an `error` message
    /// is cached like any other and yields [`GeocodeError::NoAddress`].
    pub async fn resolve(
        &self,
        coordinate: Coordinate,
    ) -> Result<Arc<RawAddressPayload>, GeocodeError> {
        coordinate.validate()?;
        let payload = self.fetcher.fetch(&coordinate).await?;
        if let Some(message) = payload.error_message() {
            warn!(
                latitude = coordinate.latitude,
                longitude = coordinate.longitude,
                message,
                "Geocoding service found no address"
            );
            return Err(GeocodeError::NoAddress(message.to_string()));
        }
        info!(
            latitude = coordinate.latitude,
            longitude = coordinate.longitude,
            display_name = payload.display_name().unwrap_or(""),
            "Address resolved"
        );
        Ok(payload)
    }

    /// Cache key a coordinate resolves under.
    pub fn cache_key(&self, coordinate: &Coordinate) -> CacheKey {
        self.fetcher.spec().cache_key(coordinate)
    }

    /// Request URL for a coordinate.
    pub fn request_url(&self, coordinate: &Coordinate) -> String {
        self.fetcher.spec().url(coordinate)
    }

    pub fn is_cached(&self, coordinate: &Coordinate) -> bool {
        self.fetcher.cache().contains(&self.cache_key(coordinate))
    }

    pub fn stats(&self) -> FetchStats {
        self.fetcher.stats()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.fetcher.cache_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::http::tests::MockAsyncHttpClient;

    const SE_BODY: &[u8] = r#"{
        "class": "place",
        "type": "house",
        "display_name": "Praça da Sé, Sé, São Paulo",
        "address": {
            "road": "Praça da Sé",
            "suburb": "Sé",
            "city": "São Paulo",
            "state": "São Paulo",
            "ISO3166-2-lvl4": "BR-SP",
            "postcode": "01001-000",
            "country": "Brasil",
            "country_code": "br"
        }
    }"#
    .as_bytes();

    fn client(mock: &MockAsyncHttpClient) -> ReverseGeocodeClient<MockAsyncHttpClient> {
        ReverseGeocodeClient::new(mock.clone(), GeocoderConfig::default()).unwrap()
    }

    fn se() -> Coordinate {
        Coordinate::new(-23.5505, -46.6333).unwrap()
    }

    #[test]
    fn test_request_url() {
        let mock = MockAsyncHttpClient::ok(SE_BODY.to_vec());
        let client = client(&mock);

        assert_eq!(
            client.request_url(&se()),
            "https://nominatim.openstreetmap.org/reverse?format=json&lat=-23.5505&lon=-46.6333&zoom=18&addressdetails=1"
        );
    }

    #[test]
    fn test_cache_key_rounds() {
        let mock = MockAsyncHttpClient::ok(SE_BODY.to_vec());
        let client = client(&mock);

        assert_eq!(client.cache_key(&se()).as_str(), "-23.55050,-46.63330");
    }

    #[test]
    fn test_invalid_base_url() {
        let mock = MockAsyncHttpClient::ok(SE_BODY.to_vec());
        let config = GeocoderConfig::default().with_base_url("ftp://example.com/reverse");
        let result = ReverseGeocodeClient::new(mock.clone(), config);
        assert!(matches!(result, Err(GeocodeError::InvalidUrl { .. })));

        let config = GeocoderConfig::default().with_base_url("not a url");
        assert!(ReverseGeocodeClient::new(mock, config).is_err());
    }

    #[test]
    fn test_zoom_clamped() {
        let spec = ReverseGeocodeSpec::new(DEFAULT_BASE_URL, 30, 5).unwrap();
        assert!(spec.url(&se()).contains("zoom=18"));
    }

    #[tokio::test]
    async fn test_repeated_resolve_single_request() {
        let mock = MockAsyncHttpClient::ok(SE_BODY.to_vec());
        let client = client(&mock);

        let first = client.resolve(se()).await.unwrap();
        // Within rounding distance of the first coordinate
        let nearby = Coordinate::new(-23.550501, -46.633302).unwrap();
        let second = client.resolve(nearby).await.unwrap();

        assert_eq!(mock.call_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.display_name(), Some("Praça da Sé, Sé, São Paulo"));
        assert!(client.is_cached(&se()));
    }

    #[tokio::test]
    async fn test_concurrent_resolves_coalesce() {
        let mock = MockAsyncHttpClient::ok(SE_BODY.to_vec())
            .with_delay(Duration::from_millis(30));
        let client = client(&mock);

        let (a, b) = tokio::join!(client.resolve(se()), client.resolve(se()));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_http_error_not_cached() {
        let mock = MockAsyncHttpClient::failing(GeocodeError::Http { status_code: 503 });
        let client = client(&mock);

        assert_eq!(
            client.resolve(se()).await.unwrap_err(),
            GeocodeError::Http { status_code: 503 }
        );
        assert!(!client.is_cached(&se()));

        let _ = client.resolve(se()).await;
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_network_error() {
        let mock = MockAsyncHttpClient::failing(GeocodeError::Network("offline".into()));
        let client = client(&mock);

        assert!(matches!(
            client.resolve(se()).await,
            Err(GeocodeError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_parse_error() {
        let mock = MockAsyncHttpClient::ok(b"<html>busy</html>".to_vec());
        let client = client(&mock);

        assert!(matches!(
            client.resolve(se()).await,
            Err(GeocodeError::Parse(_))
        ));
        assert!(!client.is_cached(&se()));
    }

    #[tokio::test]
    async fn test_service_error_reply() {
        let mock = MockAsyncHttpClient::ok(br#"{"error": "Unable to geocode"}"#.to_vec());
        let client = client(&mock);

        assert_eq!(
            client.resolve(se()).await.unwrap_err(),
            GeocodeError::NoAddress("Unable to geocode".into())
        );
        // The reply is a definite answer, so it is not requested again
        assert!(client.is_cached(&se()));
        assert!(client.resolve(se()).await.is_err());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_coordinate_not_requested() {
        let mock = MockAsyncHttpClient::ok(SE_BODY.to_vec());
        let client = client(&mock);

        let result = client
            .resolve(Coordinate {
                latitude: 91.0,
                longitude: 0.0,
            })
            .await;
        assert!(matches!(result, Err(GeocodeError::InvalidCoordinate(_))));
        assert_eq!(mock.call_count(), 0);
    }
}
