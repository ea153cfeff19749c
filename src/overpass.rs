use crate::bbox::BoundingBox;
use crate::config::{self, OverpassConfig};
use crate::error::{CpError, Result};
use crate::feature::{FeatureGeometry, RawFeature};

use geo::Coord;
use serde::Deserialize;

const SERVICE: &str = "Overpass";

// Only parkings mapped as surface lots and stored as ways
pub const PARKING_FILTER: &str = "[\"parking\"=\"surface\"]";

#[derive(Debug, Deserialize)]
pub struct XmlData {
    #[serde(rename = "way", default)]
    pub ways: Vec<XmlWay>,
    // Overpass reports timeouts and memory exhaustion here, still with HTTP 200
    #[serde(default)]
    pub remark: Option<String>,
}

impl XmlData {
    /// The server-side error text, if the query was aborted.
    pub fn runtime_error(&self) -> Option<&str> {
        self.remark
            .as_deref()
            .map(str::trim)
            .filter(|remark| remark.contains("runtime error"))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct XmlWay {
    #[serde(rename = "@id")]
    pub id: i64,
    #[serde(rename = "nd", default)]
    pub nodes: Vec<XmlNodeRef>,
    #[serde(rename = "tag", default)]
    pub tags: Vec<XmlTag>,
}

// With `out geom` every node reference carries its position, unless the node was clipped
#[derive(Debug, Deserialize, Clone)]
pub struct XmlNodeRef {
    #[serde(rename = "@ref")]
    pub node_id: i64,
    #[serde(rename = "@lat", default)]
    pub lat: Option<f64>,
    #[serde(rename = "@lon", default)]
    pub lon: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct XmlTag {
    #[serde(rename = "@k")]
    pub key: String,
    #[serde(rename = "@v")]
    pub value: String,
}

impl XmlWay {
    fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }

    pub fn into_raw_feature(self) -> RawFeature {
        let coords = self
            .nodes
            .iter()
            .map(|nd| match (nd.lat, nd.lon) {
                (Some(lat), Some(lon)) => Some(Coord { x: lon, y: lat }),
                _ => None,
            })
            .collect::<Vec<_>>();

        let capacity = self.tag("capacity").and_then(|value| {
            let parsed = value.trim().parse::<u32>().ok();
            if parsed.is_none() {
                tracing::debug!("Way {} has non-numeric capacity '{}'", self.id, value);
            }
            parsed
        });

        RawFeature {
            id: self.id,
            geometry: FeatureGeometry::from_way_nodes(&coords),
            capacity,
            access: self.tag("access").map(str::to_string),
        }
    }
}

// Function to parse the XML response
pub fn parse_xml(xml_data: &str) -> std::result::Result<XmlData, quick_xml::DeError> {
    let root: XmlData = quick_xml::de::from_str(xml_data)?;
    Ok(root)
}

// Function to create the Overpass query string
pub fn create_overpass_query(bbox: &BoundingBox, timeout_secs: u64) -> String {
    format!(
        "[out:xml][timeout:{}];way{}({});out geom;",
        timeout_secs,
        PARKING_FILTER,
        bbox.to_query_string()
    )
}

/// Client for the Overpass feature query service.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl OverpassClient {
    pub fn new(config: &OverpassConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config::timeout(config.timeout_secs))
            .build()
            .map_err(|e| CpError::upstream(SERVICE, e))?;
        Ok(Self {
            client,
            url: config.url.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    // Function to make request to Overpass API
    pub async fn make_request(&self, query: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(query.to_string())
            .send()
            .await
            .map_err(|e| CpError::upstream(SERVICE, e))?;

        let response = response
            .error_for_status()
            .map_err(|e| CpError::upstream(SERVICE, e))?;
        response
            .text()
            .await
            .map_err(|e| CpError::upstream(SERVICE, e))
    }

    /// Fetch every surface parking way inside `bbox`.
    pub async fn fetch_parkings(&self, bbox: &BoundingBox) -> Result<Vec<RawFeature>> {
        let query = create_overpass_query(bbox, self.timeout_secs);
        tracing::debug!("Overpass query: {}", query);

        let response = self.make_request(&query).await?;
        let parsed = parse_xml(&response)
            .map_err(|e| CpError::upstream(SERVICE, format!("unreadable response: {}", e)))?;
        // A partial answer would silently hide parkings
        if let Some(remark) = parsed.runtime_error() {
            return Err(CpError::upstream(SERVICE, remark));
        }

        let features = parsed
            .ways
            .into_iter()
            .map(XmlWay::into_raw_feature)
            .collect::<Vec<_>>();
        tracing::info!("Overpass returned {} parking ways", features.len());
        Ok(features)
    }
}
