use geo::{ConvexHull, Coord, LineString, Polygon};

/// Shape of a feature returned by the feature query.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    /// A closed way.
    Polygon(Polygon<f64>),
    /// An open way.
    LineString(LineString<f64>),
    /// Disjoint pieces without one boundary, e.g. a way with gaps in its node list.
    Collection(Vec<LineString<f64>>),
    /// No coordinates at all.
    Empty,
}

impl FeatureGeometry {
    /// Build the geometry of a way from its node coordinates, where `None`
    /// marks a node whose position was not delivered.
    pub fn from_way_nodes(nodes: &[Option<Coord<f64>>]) -> Self {
        let mut pieces: Vec<Vec<Coord<f64>>> = Vec::new();
        let mut current = Vec::new();
        for node in nodes {
            match node {
                Some(coord) => current.push(*coord),
                None if !current.is_empty() => pieces.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            pieces.push(current);
        }

        match pieces.len() {
            0 => FeatureGeometry::Empty,
            1 => {
                let coords = pieces.remove(0);
                let closed = coords.len() >= 4 && coords.first() == coords.last();
                if closed {
                    FeatureGeometry::Polygon(Polygon::new(LineString::from(coords), vec![]))
                } else {
                    FeatureGeometry::LineString(LineString::from(coords))
                }
            }
            _ => FeatureGeometry::Collection(pieces.into_iter().map(LineString::from).collect()),
        }
    }

    /// Geometries that can be sized and centred; the others are dropped.
    pub fn is_supported(&self) -> bool {
        matches!(self, FeatureGeometry::Polygon(_) | FeatureGeometry::LineString(_))
    }

    pub fn convex_hull(&self) -> Option<Polygon<f64>> {
        match self {
            FeatureGeometry::Polygon(polygon) => Some(polygon.convex_hull()),
            FeatureGeometry::LineString(line) => Some(line.convex_hull()),
            FeatureGeometry::Collection(_) | FeatureGeometry::Empty => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FeatureGeometry::Polygon(_) => "Polygon",
            FeatureGeometry::LineString(_) => "LineString",
            FeatureGeometry::Collection(_) => "GeometryCollection",
            FeatureGeometry::Empty => "Empty",
        }
    }
}

/// A surface parking as delivered by the feature query.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    pub id: i64,
    pub geometry: FeatureGeometry,
    pub capacity: Option<u32>,
    pub access: Option<String>,
}

impl RawFeature {
    pub fn new(id: i64, geometry: FeatureGeometry) -> Self {
        Self {
            id,
            geometry,
            capacity: None,
            access: None,
        }
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_access(mut self, access: impl Into<String>) -> Self {
        self.access = Some(access.into());
        self
    }
}
