use geo::{Area, Centroid, Coord, MapCoords, Polygon};
use thiserror::Error;

/// Mean earth radius in meters (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("polygon has no centroid")]
    NoCentroid,

    #[error("point ({lon}, {lat}) is antipodal to the projection centre")]
    Antipodal { lon: f64, lat: f64 },

    #[error("unknown planar CRS EPSG:{code}: {reason}")]
    UnknownCrs { code: u32, reason: String },

    #[error("reprojection failed: {0}")]
    Transform(String),
}

/// Planar coordinate reference system used to measure hull areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaProjection {
    /// Spherical Lambert azimuthal equal-area projection centred on each polygon.
    LocalEqualArea,
    /// A projected EPSG CRS reached from EPSG:4326 through PROJ, e.g. 28992 (RD New).
    Epsg(u32),
}

impl AreaProjection {
    pub fn projector(&self) -> Result<Projector, ProjectionError> {
        match *self {
            AreaProjection::LocalEqualArea => Ok(Projector::LocalEqualArea),
            #[cfg(feature = "proj")]
            AreaProjection::Epsg(code) => {
                let proj = proj::Proj::new_known_crs("EPSG:4326", &format!("EPSG:{}", code), None)
                    .map_err(|e| ProjectionError::UnknownCrs {
                        code,
                        reason: e.to_string(),
                    })?;
                Ok(Projector::Proj(proj))
            }
            #[cfg(not(feature = "proj"))]
            AreaProjection::Epsg(code) => Err(ProjectionError::UnknownCrs {
                code,
                reason: "built without the `proj` feature".to_string(),
            }),
        }
    }
}

/// Ready-to-use transformation, built once per candidate batch.
pub enum Projector {
    LocalEqualArea,
    #[cfg(feature = "proj")]
    Proj(proj::Proj),
}

impl Projector {
    /// Reproject a lon/lat polygon into planar meters.
    pub fn project(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>, ProjectionError> {
        match self {
            Projector::LocalEqualArea => {
                let centre = polygon.centroid().ok_or(ProjectionError::NoCentroid)?;
                let (lon0, lat0) = (centre.x().to_radians(), centre.y().to_radians());
                polygon.try_map_coords(|c| lambert_azimuthal(c, lon0, lat0))
            }
            #[cfg(feature = "proj")]
            Projector::Proj(proj) => polygon.try_map_coords(|c| {
                proj.convert((c.x, c.y))
                    .map(|(x, y)| Coord { x, y })
                    .map_err(|e| ProjectionError::Transform(e.to_string()))
            }),
        }
    }

    /// Area in square meters of a lon/lat polygon.
    pub fn planar_area(&self, polygon: &Polygon<f64>) -> Result<f64, ProjectionError> {
        Ok(self.project(polygon)?.unsigned_area())
    }
}

fn lambert_azimuthal(c: Coord<f64>, lon0: f64, lat0: f64) -> Result<Coord<f64>, ProjectionError> {
    let (lon, lat) = (c.x.to_radians(), c.y.to_radians());
    let dlon = lon - lon0;
    let denom = 1.0 + lat0.sin() * lat.sin() + lat0.cos() * lat.cos() * dlon.cos();
    if denom <= f64::EPSILON {
        return Err(ProjectionError::Antipodal { lon: c.x, lat: c.y });
    }
    let k = (2.0 / denom).sqrt();

    Ok(Coord {
        x: EARTH_RADIUS_M * k * lat.cos() * dlon.sin(),
        y: EARTH_RADIUS_M * k * (lat0.cos() * lat.sin() - lat0.sin() * lat.cos() * dlon.cos()),
    })
}
