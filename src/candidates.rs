use crate::feature::RawFeature;
use crate::projection::Projector;
use crate::utils;

use geo::{Area, Centroid, Polygon};
use serde::{Deserialize, Serialize};

/// Area per parked vehicle used when no parking in the batch states a capacity.
pub const DEFAULT_AREA_PER_SLOT_M2: f64 = 30.0;

/// Access value for parkings without an `access` tag.
pub const UNKNOWN_ACCESS: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// A surface parking suggested as command post location.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingCandidate {
    pub osm_id: i64,
    /// Convex hull of the parking, in lon/lat.
    pub hull: Polygon<f64>,
    pub area_m2: f64,
    pub capacity: u32,
    /// True when `capacity` was imputed from the area.
    pub capacity_estimated: bool,
    pub access: String,
    pub centroid: LatLon,
}

impl ParkingCandidate {
    pub fn area_label(&self) -> String {
        utils::format_area(self.area_m2)
    }

    pub fn maps_link(&self) -> String {
        utils::maps_link(self.centroid.lat, self.centroid.lon)
    }
}

/// Average parking area per vehicle over parkings with a known capacity,
/// given as `(area_m2, capacity)` pairs.
///
/// This is the mean area divided by the mean capacity, not the mean of the
/// per-parking ratios. Falls back to [`DEFAULT_AREA_PER_SLOT_M2`] when there
/// is nothing to average or the capacities sum to zero.
pub fn average_area_per_slot(known: &[(f64, u32)]) -> f64 {
    if known.is_empty() {
        return DEFAULT_AREA_PER_SLOT_M2;
    }
    let n = known.len() as f64;
    let mean_area = known.iter().map(|(area, _)| area).sum::<f64>() / n;
    let mean_capacity = known.iter().map(|(_, cap)| f64::from(*cap)).sum::<f64>() / n;

    let per_slot = mean_area / mean_capacity;
    if per_slot.is_finite() && per_slot > 0.0 {
        per_slot
    } else {
        DEFAULT_AREA_PER_SLOT_M2
    }
}

/// Estimated number of vehicles fitting on `area_m2`.
pub fn impute_capacity(area_m2: f64, area_per_slot_m2: f64) -> u32 {
    let estimate = (area_m2 / area_per_slot_m2).round();
    if estimate.is_finite() && estimate > 0.0 {
        estimate as u32
    } else {
        0
    }
}

// A hull reduced to a point or a segment cannot hold a parking
fn has_area(hull: &Polygon<f64>) -> bool {
    let mut vertices = hull.exterior().0.clone();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices.dedup();
    vertices.len() >= 3 && hull.unsigned_area() > 0.0
}

struct SizedFeature {
    osm_id: i64,
    hull: Polygon<f64>,
    area_m2: f64,
    centroid: LatLon,
    capacity: Option<u32>,
    access: Option<String>,
}

fn size_feature(feature: &RawFeature, projector: &Projector) -> Option<SizedFeature> {
    if !feature.geometry.is_supported() {
        tracing::debug!(
            "Dropping way {}: {} has no single boundary",
            feature.id,
            feature.geometry.kind()
        );
        return None;
    }

    let hull = feature.geometry.convex_hull()?;
    if !has_area(&hull) {
        tracing::debug!("Dropping way {}: degenerate hull", feature.id);
        return None;
    }

    let area_m2 = match projector.planar_area(&hull) {
        Ok(area) if area.is_finite() && area > 0.0 => area,
        Ok(area) => {
            tracing::debug!("Dropping way {}: projected area {}", feature.id, area);
            return None;
        }
        Err(e) => {
            tracing::debug!("Dropping way {}: {}", feature.id, e);
            return None;
        }
    };

    let centre = hull.centroid()?;
    Some(SizedFeature {
        osm_id: feature.id,
        area_m2,
        centroid: LatLon {
            lat: centre.y(),
            lon: centre.x(),
        },
        hull,
        capacity: feature.capacity,
        access: feature.access.clone(),
    })
}

/// Turn raw parking features into sized candidates, in input order.
///
/// Features without a usable hull are dropped. Missing capacities are filled
/// from one area-per-slot average over every retained feature that has a
/// capacity.
pub fn process(features: &[RawFeature], projector: &Projector) -> Vec<ParkingCandidate> {
    let sized = features
        .iter()
        .filter_map(|feature| size_feature(feature, projector))
        .collect::<Vec<_>>();

    let known = sized
        .iter()
        .filter_map(|s| s.capacity.map(|cap| (s.area_m2, cap)))
        .collect::<Vec<_>>();
    let per_slot = average_area_per_slot(&known);

    tracing::debug!(
        "Sized {} of {} parking ways, {} with known capacity, {:.1} m\u{b2} per slot",
        sized.len(),
        features.len(),
        known.len(),
        per_slot
    );

    sized
        .into_iter()
        .map(|s| {
            let (capacity, capacity_estimated) = match s.capacity {
                Some(capacity) => (capacity, false),
                None => (impute_capacity(s.area_m2, per_slot), true),
            };
            ParkingCandidate {
                osm_id: s.osm_id,
                hull: s.hull,
                area_m2: s.area_m2,
                capacity,
                capacity_estimated,
                access: s.access.unwrap_or_else(|| UNKNOWN_ACCESS.to_string()),
                centroid: s.centroid,
            }
        })
        .collect()
}
