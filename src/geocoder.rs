use crate::cache::GeocodeCache;
use crate::config::{self, GeocoderConfig};
use crate::error::{CpError, Result};
use crate::resolver::{Geocoder, SearchOrigin};

use async_trait::async_trait;
use serde::Deserialize;

const SERVICE: &str = "Geocoder";

// Nominatim returns coordinates as strings
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Geocoder backed by a Nominatim search endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    search_url: String,
    cache: GeocodeCache,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config::timeout(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CpError::upstream(SERVICE, e))?;
        Ok(Self {
            client,
            search_url: format!("{}/search", config.url.trim_end_matches('/')),
            cache: GeocodeCache::new(config.cache_size),
        })
    }

    async fn lookup(&self, address: &str) -> Result<Option<SearchOrigin>> {
        let places: Vec<NominatimPlace> = self
            .client
            .get(&self.search_url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| CpError::upstream(SERVICE, e))?
            .error_for_status()
            .map_err(|e| CpError::upstream(SERVICE, e))?
            .json()
            .await
            .map_err(|e| CpError::upstream(SERVICE, e))?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };
        let parse = |value: &str| {
            value
                .parse::<f64>()
                .map_err(|e| CpError::upstream(SERVICE, format!("bad coordinate '{}': {}", value, e)))
        };
        Ok(Some(SearchOrigin {
            latitude: parse(&place.lat)?,
            longitude: parse(&place.lon)?,
        }))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<SearchOrigin>> {
        if let Some(origin) = self.cache.check_cache(address) {
            tracing::debug!("Cache hit for geocode: {}", address);
            return Ok(Some(origin));
        }

        tracing::debug!("Cache miss for geocode: {}", address);
        let origin = self.lookup(address).await?;
        if let Some(origin) = origin {
            self.cache.insert_into_cache(address.to_string(), origin);
        }
        Ok(origin)
    }
}
