use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ViewerError;
use crate::ids::normalize_id;

// One GeoJSON feature as the viewer sees it: an optional top-level id, the
// property bag, and the geometry converted to geo-types (None when missing or
// unreadable).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feature {
    pub id: Option<Value>,
    pub properties: Map<String, Value>,
    pub geometry: Option<Geometry<f64>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

// Key/value row for the feature property panel
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PropertyRow {
    pub key: String,
    pub value: String,
}

impl Feature {
    /// Build a feature from a GeoJSON object. Anything that isn't an object is not
    /// a feature; missing or non-object `properties` become an empty bag.
    pub fn from_value(value: &Value) -> Option<Feature> {
        let obj = value.as_object()?;
        Some(Feature {
            id: obj.get("id").filter(|v| !v.is_null()).cloned(),
            properties: obj
                .get("properties")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default(),
            geometry: obj.get("geometry").and_then(parse_geometry),
        })
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Asset identifier: the first property in `fields` that normalizes to a
    /// value, then the feature's own `id`.
    pub fn asset_id(&self, fields: &[String]) -> Option<String> {
        fields
            .iter()
            .find_map(|key| normalize_id(self.properties.get(key)))
            .or_else(|| normalize_id(self.id.as_ref()))
    }

    /// Popup title, same fallback rules as `asset_id` over a different field list.
    pub fn title(&self, fields: &[String]) -> Option<String> {
        self.asset_id(fields)
    }

    pub fn is_point(&self) -> bool {
        matches!(
            self.geometry,
            Some(Geometry::Point(_)) | Some(Geometry::MultiPoint(_))
        )
    }

    /// Properties sorted by key, values rendered as plain text.
    pub fn property_rows(&self) -> Vec<PropertyRow> {
        let mut rows: Vec<PropertyRow> = self
            .properties
            .iter()
            .map(|(key, value)| PropertyRow {
                key: key.clone(),
                value: match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            })
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        rows
    }
}

impl FeatureCollection {
    /// Read a GeoJSON FeatureCollection. The payload itself must carry a
    /// `features` array; individual entries that are not objects are skipped.
    pub fn from_value(value: &Value) -> Result<FeatureCollection, ViewerError> {
        let features = value
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                ViewerError::InvalidShape("expected a FeatureCollection with a 'features' list".to_string())
            })?;

        Ok(FeatureCollection {
            features: features.iter().filter_map(Feature::from_value).collect(),
        })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<FeatureCollection, ViewerError> {
        let value: Value = serde_json::from_slice(bytes)?;
        FeatureCollection::from_value(&value)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

// Convert a GeoJSON geometry object into geo-types, dropping positions with fewer
// than two numeric ordinates.
pub fn parse_geometry(value: &Value) -> Option<Geometry<f64>> {
    let kind = value.get("type")?.as_str()?;
    if kind == "GeometryCollection" {
        let members = value
            .get("geometries")?
            .as_array()?
            .iter()
            .filter_map(parse_geometry)
            .collect();
        return Some(Geometry::GeometryCollection(GeometryCollection(members)));
    }

    let coords = value.get("coordinates")?;
    let geometry = match kind {
        "Point" => Geometry::Point(Point(position(coords)?)),
        "MultiPoint" => {
            Geometry::MultiPoint(MultiPoint(positions(coords)?.into_iter().map(Point).collect()))
        }
        "LineString" => Geometry::LineString(LineString(positions(coords)?)),
        "MultiLineString" => Geometry::MultiLineString(MultiLineString(
            rings(coords)?.into_iter().map(LineString).collect(),
        )),
        "Polygon" => Geometry::Polygon(polygon(coords)?),
        "MultiPolygon" => Geometry::MultiPolygon(MultiPolygon(
            coords
                .as_array()?
                .iter()
                .filter_map(polygon)
                .collect(),
        )),
        _ => return None,
    };
    Some(geometry)
}

fn position(value: &Value) -> Option<Coord<f64>> {
    let pair = value.as_array()?;
    if pair.len() < 2 {
        return None;
    }
    let x = pair[0].as_f64().filter(|v| v.is_finite())?;
    let y = pair[1].as_f64().filter(|v| v.is_finite())?;
    Some(Coord { x, y })
}

fn positions(value: &Value) -> Option<Vec<Coord<f64>>> {
    Some(value.as_array()?.iter().filter_map(position).collect())
}

fn rings(value: &Value) -> Option<Vec<Vec<Coord<f64>>>> {
    Some(value.as_array()?.iter().filter_map(positions).collect())
}

fn polygon(value: &Value) -> Option<Polygon<f64>> {
    let mut rings = rings(value)?.into_iter().map(LineString);
    let exterior = rings.next()?;
    Some(Polygon::new(exterior, rings.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> Vec<String> {
        crate::config::ViewerConfig::default().asset_id_properties
    }

    #[test]
    fn asset_id_follows_property_priority() {
        let feature = Feature::from_value(&json!({
            "type": "Feature",
            "id": 99,
            "properties": {"ASSET_ID": "  ", "ASSETID": null, "ASSET_NAME": "SWP-17", "ID": "x"},
            "geometry": null
        }))
        .expect("feature");
        assert_eq!(feature.asset_id(&fields()), Some("SWP-17".to_string()));
    }

    #[test]
    fn asset_id_falls_back_to_feature_id() {
        let feature = Feature::from_value(&json!({"type": "Feature", "id": 1234, "properties": {}}))
            .expect("feature");
        assert_eq!(feature.asset_id(&fields()), Some("1234".to_string()));

        let anonymous = Feature::from_value(&json!({"type": "Feature"})).expect("feature");
        assert_eq!(anonymous.asset_id(&fields()), None);
    }

    #[test]
    fn collection_requires_feature_list() {
        assert!(FeatureCollection::from_value(&json!({"type": "FeatureCollection"})).is_err());
        let fc = FeatureCollection::from_value(&json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "properties": {}}, 7, "junk"]
        }))
        .expect("collection");
        assert_eq!(fc.len(), 1);
    }

    #[test]
    fn geometry_types_are_converted() {
        let point = parse_geometry(&json!({"type": "Point", "coordinates": [149.13, -35.28]}));
        assert!(matches!(point, Some(Geometry::Point(_))));

        let line = parse_geometry(&json!({
            "type": "LineString",
            "coordinates": [[149.0, -35.0], [149.1, -35.1], ["bad"]]
        }));
        match line {
            Some(Geometry::LineString(ls)) => assert_eq!(ls.0.len(), 2),
            other => panic!("unexpected geometry: {:?}", other),
        }

        let poly = parse_geometry(&json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
        }));
        assert!(matches!(poly, Some(Geometry::Polygon(_))));

        assert!(parse_geometry(&json!({"type": "Circle", "coordinates": [0, 0]})).is_none());
    }

    #[test]
    fn point_shape_detection() {
        let point = Feature::from_value(&json!({
            "type": "Feature",
            "geometry": {"type": "MultiPoint", "coordinates": [[1.0, 2.0]]}
        }))
        .expect("feature");
        assert!(point.is_point());

        let line = Feature::from_value(&json!({
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": [[1.0, 2.0], [3.0, 4.0]]}
        }))
        .expect("feature");
        assert!(!line.is_point());
    }

    #[test]
    fn property_rows_are_sorted() {
        let feature = Feature::from_value(&json!({
            "type": "Feature",
            "properties": {"b": 2, "a": "one", "c": null}
        }))
        .expect("feature");
        let rows = feature.property_rows();
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(rows[0].value, "one");
        assert_eq!(rows[2].value, "null");
    }
}
