use geo::Polygon;
use geojson::{Feature, GeoJson, Geometry, JsonObject, Value};

pub fn polygon_to_geometry(polygon: &Polygon<f64>) -> Geometry {
    // GeoJSON positions are [longitude, latitude], i.e. [x, y]
    Geometry::new(Value::from(polygon))
}

pub fn polygon_to_geojson(polygon: &Polygon<f64>) -> GeoJson {
    GeoJson::Geometry(polygon_to_geometry(polygon))
}

// Convert polygon to GeoJSON string
pub fn polygon_to_geojson_string(polygon: &Polygon<f64>) -> String {
    let geojson = polygon_to_geojson(polygon);
    geojson.to_string()
}

pub fn polygon_to_feature(polygon: &Polygon<f64>, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(polygon_to_geometry(polygon)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn polygon_from_geometry(geometry: &Geometry) -> Option<Polygon<f64>> {
    Polygon::<f64>::try_from(geometry.value.clone()).ok()
}

/// Area rounded to whole square meters, e.g. "1250 m²".
pub fn format_area(area_m2: f64) -> String {
    format!("{} m\u{b2}", area_m2.round())
}

/// Link opening a position in Google Maps.
pub fn maps_link(lat: f64, lon: f64) -> String {
    format!("http://maps.google.com/maps?z=12&t=m&q=loc:{}+{}", lat, lon)
}
