use serde::{Deserialize, Serialize};

/// Index order turning an isochrone bbox (W, S, E, N) into an Overpass bbox (S, W, N, E).
const REORDER_BBOX: [usize; 4] = [1, 0, 3, 2];

/// Bounding box as returned by the isochrone service: `[west, south, east, north]`.
pub type NativeBox = [f64; 4];

/// Bounding box in the feature query's (south, west, north, east) order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

/// Reorder an isochrone bbox for the feature query. Values are neither checked
/// nor changed, an inverted box comes out just as inverted.
pub fn to_query_box(native: NativeBox) -> BoundingBox {
    let [south, west, north, east] = REORDER_BBOX.map(|i| native[i]);
    BoundingBox {
        south,
        west,
        north,
        east,
    }
}

impl BoundingBox {
    pub fn as_array(&self) -> [f64; 4] {
        [self.south, self.west, self.north, self.east]
    }

    /// "south, west, north, east", the textual form Overpass filters take.
    pub fn to_query_string(&self) -> String {
        self.as_array()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
