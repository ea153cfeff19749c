use crate::candidates::{LatLon, ParkingCandidate};
use crate::error::{CpError, Result};
use crate::utils;

use geo::Centroid;
use geojson::{FeatureCollection, GeoJson, JsonObject};

/// Candidates ranked by descending area, at most the requested count.
/// An empty set is a valid outcome: no parking within reach.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    candidates: Vec<ParkingCandidate>,
}

/// Rank candidates by area, largest first, and keep the first `max_count`.
/// Equal areas keep their input order.
pub fn select(mut candidates: Vec<ParkingCandidate>, max_count: usize) -> CandidateSet {
    candidates.sort_by(|a, b| b.area_m2.total_cmp(&a.area_m2));
    candidates.truncate(max_count);
    CandidateSet { candidates }
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParkingCandidate> {
        self.candidates.iter()
    }

    pub fn as_slice(&self) -> &[ParkingCandidate] {
        &self.candidates
    }

    pub fn into_inner(self) -> Vec<ParkingCandidate> {
        self.candidates
    }

    pub fn total_capacity(&self) -> u64 {
        self.candidates.iter().map(|c| u64::from(c.capacity)).sum()
    }

    /// FeatureCollection of the candidate hulls, as offered for download.
    pub fn to_geojson(&self) -> GeoJson {
        let features = self
            .candidates
            .iter()
            .map(|candidate| {
                let mut properties = JsonObject::new();
                properties.insert("osm_id".to_string(), candidate.osm_id.into());
                properties.insert("area_m2".to_string(), candidate.area_m2.into());
                properties.insert("area".to_string(), candidate.area_label().into());
                properties.insert("capacity".to_string(), candidate.capacity.into());
                properties.insert(
                    "capacity_estimated".to_string(),
                    candidate.capacity_estimated.into(),
                );
                properties.insert("access".to_string(), candidate.access.clone().into());
                properties.insert(
                    "center".to_string(),
                    serde_json::json!([candidate.centroid.lat, candidate.centroid.lon]),
                );
                properties.insert("maps_url".to_string(), candidate.maps_link().into());
                utils::polygon_to_feature(&candidate.hull, properties)
            })
            .collect();

        GeoJson::FeatureCollection(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    pub fn to_geojson_string(&self) -> String {
        self.to_geojson().to_string()
    }

    /// Read back a collection written by [`CandidateSet::to_geojson`].
    pub fn from_geojson(geojson: &GeoJson) -> Result<Self> {
        let collection = match geojson {
            GeoJson::FeatureCollection(collection) => collection,
            _ => return Err(CpError::Export("expected a FeatureCollection".to_string())),
        };

        let mut candidates = Vec::with_capacity(collection.features.len());
        for (index, feature) in collection.features.iter().enumerate() {
            let missing = |field: &str| CpError::Export(format!("feature {}: missing {}", index, field));

            let hull = feature
                .geometry
                .as_ref()
                .and_then(utils::polygon_from_geometry)
                .ok_or_else(|| missing("polygon geometry"))?;
            let area_m2 = feature
                .property("area_m2")
                .and_then(|v| v.as_f64())
                .ok_or_else(|| missing("area_m2"))?;
            let capacity = feature
                .property("capacity")
                .and_then(|v| v.as_u64())
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| missing("capacity"))?;
            let access = feature
                .property("access")
                .and_then(|v| v.as_str())
                .ok_or_else(|| missing("access"))?
                .to_string();
            let osm_id = feature
                .property("osm_id")
                .and_then(|v| v.as_i64())
                .ok_or_else(|| missing("osm_id"))?;
            let capacity_estimated = feature
                .property("capacity_estimated")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            let centroid = match feature.property("center").and_then(|v| v.as_array()) {
                Some(pair) if pair.len() == 2 => LatLon {
                    lat: pair[0].as_f64().ok_or_else(|| missing("center"))?,
                    lon: pair[1].as_f64().ok_or_else(|| missing("center"))?,
                },
                _ => {
                    let centre = hull.centroid().ok_or_else(|| missing("center"))?;
                    LatLon {
                        lat: centre.y(),
                        lon: centre.x(),
                    }
                }
            };

            candidates.push(ParkingCandidate {
                osm_id,
                hull,
                area_m2,
                capacity,
                capacity_estimated,
                access,
                centroid,
            });
        }

        Ok(CandidateSet { candidates })
    }

    pub fn from_geojson_str(json: &str) -> Result<Self> {
        let geojson: GeoJson = json
            .parse()
            .map_err(|e: geojson::Error| CpError::Export(e.to_string()))?;
        Self::from_geojson(&geojson)
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a ParkingCandidate;
    type IntoIter = std::slice::Iter<'a, ParkingCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}
