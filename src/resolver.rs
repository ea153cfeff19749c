use crate::error::{CpError, Result};

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // "lat, long" in decimal degrees, latitude within ±90 and longitude within ±180
    static ref LAT_LONG: Regex = Regex::new(
        r"^[-+]?([1-8]?\d(\.\d+)?|90(\.0+)?),\s*[-+]?(180(\.0+)?|((1[0-7]\d)|([1-9]?\d))(\.\d+)?)$"
    )
    .expect("valid lat/long pattern");
}

/// Last known position of the missing person.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchOrigin {
    pub latitude: f64,
    pub longitude: f64,
}

/// Free-text address lookup.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the address is unknown.
    async fn geocode(&self, address: &str) -> Result<Option<SearchOrigin>>;
}

/// True when `input` is a decimal-degree "lat, long" pair within range.
pub fn match_lat_long_input(input: &str) -> bool {
    LAT_LONG.is_match(input)
}

/// Parse a "lat, long" pair; `None` when it does not match the strict pattern.
pub fn parse_lat_long(input: &str) -> Option<SearchOrigin> {
    let input = input.trim();
    if !match_lat_long_input(input) {
        return None;
    }
    let (lat, long) = input.split_once(',')?;
    Some(SearchOrigin {
        latitude: lat.trim().parse().ok()?,
        longitude: long.trim().parse().ok()?,
    })
}

/// Turns what the user typed into a search origin.
pub struct CoordinateResolver<G> {
    geocoder: G,
}

impl<G: Geocoder> CoordinateResolver<G> {
    pub fn new(geocoder: G) -> Self {
        Self { geocoder }
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Coordinates are parsed locally; anything else goes to the geocoder.
    pub async fn resolve(&self, input: &str) -> Result<SearchOrigin> {
        if let Some(origin) = parse_lat_long(input) {
            tracing::debug!("Parsed '{}' as coordinates", input.trim());
            return Ok(origin);
        }

        let address = input.trim();
        if address.is_empty() {
            return Err(CpError::Resolution {
                input: input.to_string(),
                reason: "no address or coordinates given".to_string(),
            });
        }

        match self.geocoder.geocode(address).await {
            Ok(Some(origin)) => {
                tracing::info!(
                    "Geocoded '{}' to ({}, {})",
                    address,
                    origin.latitude,
                    origin.longitude
                );
                Ok(origin)
            }
            Ok(None) => Err(CpError::Resolution {
                input: address.to_string(),
                reason: "address not found".to_string(),
            }),
            Err(e) => Err(CpError::Resolution {
                input: address.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
