use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::errors::ApiError;
use crate::models::suggestion::{Coordinates, DestinationSuggestion};

const DEFAULT_BASE_URL: &str = "https://api.geoapify.com";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct GeocodeHit {
    pub coordinates: Coordinates,
    pub address: String,
}

/// Seam between enrichment and the geocoding provider; tests substitute a
/// stub implementation.
pub trait GeocodeLookup {
    async fn geocode(&self, query: &str) -> Result<GeocodeHit, ApiError>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    geometry: GeocodeGeometry,
    properties: GeocodeProperties,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    coordinates: Vec<f64>, // [lng, lat]
}

#[derive(Debug, Deserialize)]
struct GeocodeProperties {
    formatted: Option<String>,
}

#[derive(Clone)]
pub struct GeoapifyClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeoapifyClient {
    pub fn new() -> Result<Self, ApiError> {
        let api_key = env::var("GEOAPIFY_API_KEY")
            .map_err(|_| ApiError::Validation("GEOAPIFY_API_KEY not set".to_string()))?;
        let base_url =
            env::var("GEOAPIFY_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::Upstream { status: 0, body: e.to_string() })?;

        Ok(Self { client, api_key, base_url })
    }
}

impl GeocodeLookup for GeoapifyClient {
    async fn geocode(&self, query: &str) -> Result<GeocodeHit, ApiError> {
        let url = format!("{}/v1/geocode/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("text", query),
                ("apiKey", self.api_key.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::Upstream { status: status.as_u16(), body });
        }

        let geocoded: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream { status: 0, body: e.to_string() })?;

        let feature = geocoded
            .features
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("no geocode result for '{}'", query)))?;

        if feature.geometry.coordinates.len() < 2 {
            return Err(ApiError::Upstream {
                status: 0,
                body: "geocode result missing coordinates".to_string(),
            });
        }

        Ok(GeocodeHit {
            coordinates: Coordinates {
                lng: feature.geometry.coordinates[0],
                lat: feature.geometry.coordinates[1],
            },
            address: feature.properties.formatted.unwrap_or_else(|| query.to_string()),
        })
    }
}

/// Best-effort enrichment: walk the suggestions in order and merge
/// coordinates/address where the lookup succeeds. A failed lookup logs and
/// leaves that item unchanged; the parent request never fails here. Output
/// length and ordering always match the input.
pub async fn enrich_destinations<G: GeocodeLookup>(
    geocoder: &G,
    mut suggestions: Vec<DestinationSuggestion>,
) -> Vec<DestinationSuggestion> {
    for suggestion in suggestions.iter_mut() {
        let name = match suggestion.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => continue,
        };
        let query = match suggestion.country.as_deref() {
            Some(country) if !country.is_empty() => format!("{}, {}", name, country),
            _ => name.to_string(),
        };

        match geocoder.geocode(&query).await {
            Ok(hit) => {
                suggestion.coordinates = Some(hit.coordinates);
                suggestion.address = Some(hit.address);
            }
            Err(err) => {
                eprintln!("Geocode lookup failed for '{}': {}", query, err);
            }
        }
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubGeocoder {
        // queries containing this substring fail with a network-style error
        fail_on: &'static str,
    }

    impl GeocodeLookup for StubGeocoder {
        async fn geocode(&self, query: &str) -> Result<GeocodeHit, ApiError> {
            if query.contains(self.fail_on) {
                return Err(ApiError::Upstream {
                    status: 0,
                    body: "connection reset".to_string(),
                });
            }
            Ok(GeocodeHit {
                coordinates: Coordinates { lat: 48.8566, lng: 2.3522 },
                address: format!("{} (formatted)", query),
            })
        }
    }

    fn suggestion(name: &str, country: &str) -> DestinationSuggestion {
        DestinationSuggestion {
            name: Some(name.to_string()),
            country: Some(country.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn enrichment_preserves_length_and_order_under_failure() {
        let geocoder = StubGeocoder { fail_on: "Lisbon" };
        let input = vec![
            suggestion("Paris", "France"),
            suggestion("Lisbon", "Portugal"),
            suggestion("Kyoto", "Japan"),
        ];

        let enriched = tokio_test::block_on(enrich_destinations(&geocoder, input));

        assert_eq!(enriched.len(), 3);
        assert_eq!(enriched[0].name.as_deref(), Some("Paris"));
        assert_eq!(enriched[1].name.as_deref(), Some("Lisbon"));
        assert_eq!(enriched[2].name.as_deref(), Some("Kyoto"));

        // The failed item is returned unenriched; the other two are populated
        assert!(enriched[0].coordinates.is_some());
        assert!(enriched[0].address.is_some());
        assert!(enriched[1].coordinates.is_none());
        assert!(enriched[1].address.is_none());
        assert!(enriched[2].coordinates.is_some());
    }

    #[test]
    fn nameless_suggestions_are_skipped_not_dropped() {
        let geocoder = StubGeocoder { fail_on: "\u{0}" };
        let input = vec![DestinationSuggestion::default(), suggestion("Oslo", "Norway")];

        let enriched = tokio_test::block_on(enrich_destinations(&geocoder, input));

        assert_eq!(enriched.len(), 2);
        assert!(enriched[0].coordinates.is_none());
        assert_eq!(
            enriched[1].address.as_deref(),
            Some("Oslo, Norway (formatted)")
        );
    }
}
