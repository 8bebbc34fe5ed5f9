// Structure catalog: named groupings of assets with a display color, point
// annotations and a free-text description. A catalog is loaded as a whole and
// replaced as a whole; nothing here mutates a structure after parsing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::ids::{normalize_id, normalize_str, to_finite_number};

pub const DEFAULT_STRUCTURE_COLOR: &str = "#64748b";

/// One entry of a structure's `members` list: either a bare asset id or a record
/// carrying an `assetId` alongside arbitrary metadata.
#[derive(Clone, Debug, PartialEq)]
pub enum Member {
    Id(String),
    Record(Map<String, Value>),
    Other(Value),
}

impl Member {
    pub fn from_value(value: &Value) -> Member {
        match value {
            Value::String(s) => Member::Id(s.clone()),
            Value::Object(map) => Member::Record(map.clone()),
            other => Member::Other(other.clone()),
        }
    }

    pub fn asset_id(&self) -> Option<String> {
        match self {
            Member::Id(s) => normalize_str(s),
            Member::Record(map) => normalize_id(map.get("assetId")),
            Member::Other(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub label: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Annotation {
    pub fn from_value(value: &Value) -> Annotation {
        Annotation {
            label: normalize_id(value.get("label")),
            lat: to_finite_number(value.get("lat")),
            lng: to_finite_number(value.get("lng")),
        }
    }

    pub fn coords(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lng?))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Structure {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Display color; `None` means features keep their emphasis color.
    pub color: Option<String>,
    pub members: Vec<Member>,
    pub annotations: Vec<Annotation>,
    pub description: Option<String>,
}

impl Structure {
    pub fn from_value(value: &Value) -> Option<Structure> {
        let obj = value.as_object()?;
        let list = |key: &str| obj.get(key).and_then(|v| v.as_array());

        Some(Structure {
            id: normalize_id(obj.get("id")),
            name: normalize_id(obj.get("name")),
            color: normalize_id(obj.get("color")),
            members: list("members")
                .map(|items| items.iter().map(Member::from_value).collect())
                .unwrap_or_default(),
            annotations: list("annotations")
                .map(|items| items.iter().map(Annotation::from_value).collect())
                .unwrap_or_default(),
            description: normalize_id(obj.get("description")),
        })
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("Untitled")
    }

    pub fn display_color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_STRUCTURE_COLOR)
    }

    pub fn asset_count(&self) -> usize {
        self.members.len()
    }

    pub fn label_count(&self) -> usize {
        self.annotations.len()
    }

    /// Normalized asset ids of every member, malformed entries skipped.
    pub fn member_ids(&self) -> HashSet<String> {
        self.members.iter().filter_map(Member::asset_id).collect()
    }

    /// Description split into trimmed, non-empty paragraphs.
    pub fn paragraphs(&self) -> Vec<String> {
        self.description
            .as_deref()
            .map(|text| {
                text.split('\n')
                    .filter_map(normalize_str)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is(&self, structure_id: &str) -> bool {
        self.id.as_deref() == Some(structure_id)
    }
}

/// Immutable snapshot of the loaded catalog.
#[derive(Clone, Debug, Default)]
pub struct StructureCatalog {
    structures: Vec<Arc<Structure>>,
    by_id: HashMap<String, usize>,
}

impl StructureCatalog {
    pub fn new(structures: Vec<Structure>) -> Self {
        let structures: Vec<Arc<Structure>> = structures.into_iter().map(Arc::new).collect();
        let mut by_id = HashMap::new();
        for (pos, structure) in structures.iter().enumerate() {
            if let Some(id) = &structure.id {
                // Duplicate ids: the later registration replaces the earlier one.
                by_id.insert(id.clone(), pos);
            }
        }
        StructureCatalog { structures, by_id }
    }

    /// Parse a `{ "structures": [...] }` document. Any other shape is an empty
    /// catalog; entries that are not objects are skipped.
    pub fn from_value(value: &Value) -> Self {
        let structures = value
            .get("structures")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(Structure::from_value).collect())
            .unwrap_or_default();
        StructureCatalog::new(structures)
    }

    pub fn structures(&self) -> &[Arc<Structure>] {
        &self.structures
    }

    pub fn get(&self, structure_id: &str) -> Option<&Arc<Structure>> {
        self.by_id
            .get(structure_id)
            .and_then(|&pos| self.structures.get(pos))
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_parses_mixed_member_forms() {
        let catalog = StructureCatalog::from_value(&json!({
            "structures": [{
                "id": " S1 ",
                "name": "Northbourne trunk",
                "color": "#f97316",
                "members": ["A1", {"assetId": " A2 ", "note": "inlet"}, {"note": "no id"}, 17, "  "],
                "annotations": [{"label": "P1", "lat": "-35.2809", "lng": 149.13}],
                "description": "First line\n\n  Second line  "
            }]
        }));
        assert_eq!(catalog.len(), 1);
        let s = catalog.get("S1").expect("structure");
        assert_eq!(s.asset_count(), 5);
        let ids = s.member_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("A1") && ids.contains("A2"));
        assert_eq!(s.annotations[0].coords(), Some((-35.2809, 149.13)));
        assert_eq!(s.paragraphs(), vec!["First line", "Second line"]);
    }

    #[test]
    fn malformed_catalog_is_empty() {
        assert!(StructureCatalog::from_value(&json!({"structures": "nope"})).is_empty());
        assert!(StructureCatalog::from_value(&json!([1, 2, 3])).is_empty());
        assert!(StructureCatalog::from_value(&Value::Null).is_empty());
    }

    #[test]
    fn duplicate_ids_resolve_to_last_registration() {
        let catalog = StructureCatalog::from_value(&json!({
            "structures": [
                {"id": "S1", "name": "first"},
                {"id": "S1", "name": "second"}
            ]
        }));
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("S1").and_then(|s| s.name.as_deref()), Some("second"));
    }

    #[test]
    fn display_fallbacks() {
        let unnamed = Structure {
            id: Some("S9".to_string()),
            ..Structure::default()
        };
        assert_eq!(unnamed.display_name(), "S9");
        assert_eq!(unnamed.display_color(), DEFAULT_STRUCTURE_COLOR);
        assert_eq!(Structure::default().display_name(), "Untitled");
    }
}
