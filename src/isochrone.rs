use crate::bbox::NativeBox;
use crate::config::{self, IsochroneConfig};
use crate::error::{CpError, Result};
use crate::resolver::SearchOrigin;
use crate::utils;

use geo::{BoundingRect, MultiPolygon, Polygon};
use geojson::{FeatureCollection, GeoJson};
use serde::Serialize;

const SERVICE: &str = "Isochrone";

/// One reachable-area polygon and the distance it was drawn for.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchmentRing {
    pub range_m: u32,
    pub polygon: Polygon<f64>,
}

/// Area reachable on foot from the origin, with the service's own bbox.
#[derive(Debug, Clone, PartialEq)]
pub struct Catchment {
    pub rings: Vec<CatchmentRing>,
    /// `[west, south, east, north]`
    pub native_bbox: NativeBox,
}

impl Catchment {
    pub fn to_geojson(&self) -> GeoJson {
        let features = self
            .rings
            .iter()
            .map(|ring| {
                let mut properties = serde_json::Map::new();
                properties.insert("value".to_string(), ring.range_m.into());
                utils::polygon_to_feature(&ring.polygon, properties)
            })
            .collect();

        GeoJson::FeatureCollection(FeatureCollection {
            bbox: Some(self.native_bbox.to_vec()),
            features,
            foreign_members: None,
        })
    }
}

#[derive(Debug, Serialize)]
struct IsochroneRequest<'a> {
    locations: [[f64; 2]; 1],
    range: &'a [u32],
    range_type: &'static str,
    units: &'static str,
    smoothing: f64,
}

// Function to parse an isochrone response into rings and a bbox
pub fn parse_isochrones(body: &str) -> Result<Catchment> {
    let geojson: GeoJson = body
        .parse()
        .map_err(|e| CpError::upstream(SERVICE, format!("unreadable response: {}", e)))?;
    let collection = match geojson {
        GeoJson::FeatureCollection(collection) => collection,
        _ => {
            return Err(CpError::upstream(
                SERVICE,
                "response is not a feature collection",
            ))
        }
    };

    let mut rings = Vec::new();
    for feature in &collection.features {
        let range_m = feature
            .property("value")
            .and_then(|v| v.as_f64())
            .map(|v| v.round() as u32)
            .unwrap_or_default();
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        let polygon = Polygon::<f64>::try_from(geometry.value.clone())
            .map_err(|e| CpError::upstream(SERVICE, format!("ring is not a polygon: {}", e)))?;
        rings.push(CatchmentRing { range_m, polygon });
    }

    if rings.is_empty() {
        return Err(CpError::upstream(SERVICE, "response contains no isochrone"));
    }

    let native_bbox = match collection.bbox.as_deref() {
        Some([west, south, east, north]) => [*west, *south, *east, *north],
        _ => {
            tracing::debug!("Isochrone response has no bbox, deriving it from the rings");
            let rect = MultiPolygon::new(rings.iter().map(|r| r.polygon.clone()).collect())
                .bounding_rect()
                .ok_or_else(|| CpError::upstream(SERVICE, "isochrone has no extent"))?;
            [rect.min().x, rect.min().y, rect.max().x, rect.max().y]
        }
    };

    Ok(Catchment { rings, native_bbox })
}

/// Client for the OpenRouteService isochrone endpoint.
#[derive(Debug, Clone)]
pub struct IsochroneClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    smoothing: f64,
}

impl IsochroneClient {
    pub fn new(config: &IsochroneConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config::timeout(config.timeout_secs))
            .build()
            .map_err(|e| CpError::upstream(SERVICE, e))?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/v2/isochrones/{}",
                config.url.trim_end_matches('/'),
                config.profile
            ),
            api_key: config.api_key.clone(),
            smoothing: config.smoothing,
        })
    }

    /// Walking-distance isochrones around `origin`, one per entry of `ranges_m`.
    pub async fn fetch_catchment(&self, origin: &SearchOrigin, ranges_m: &[u32]) -> Result<Catchment> {
        let request = IsochroneRequest {
            locations: [[origin.longitude, origin.latitude]],
            range: ranges_m,
            range_type: "distance",
            units: "m",
            smoothing: self.smoothing,
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CpError::upstream(SERVICE, e))?
            .error_for_status()
            .map_err(|e| CpError::upstream(SERVICE, e))?;
        let body = response
            .text()
            .await
            .map_err(|e| CpError::upstream(SERVICE, e))?;

        let catchment = parse_isochrones(&body)?;
        tracing::info!(
            "Catchment has {} ring(s), bbox {:?}",
            catchment.rings.len(),
            catchment.native_bbox
        );
        Ok(catchment)
    }
}
