use serde::{Deserialize, Serialize};

/// Runtime configuration handed over from the page. Every field has a default so
/// the host may pass a partial object (or nothing at all).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    pub structures_url: String,
    pub geometry_url: String,
    /// Feature property holding the pipe diameter in millimetres.
    pub diameter_property: String,
    /// Property names tried in order for the asset identifier. The feature's
    /// top-level `id` is always tried last.
    pub asset_id_properties: Vec<String>,
    /// Property names tried in order for a feature popup title.
    pub title_properties: Vec<String>,
    pub default_min_diameter_m: f64,
    pub label_min_zoom: f64,
    pub max_structure_results: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            structures_url: "./structures.json".to_string(),
            geometry_url: "./filtered_data.geojson".to_string(),
            diameter_property: "PIPE_DIAMETER".to_string(),
            asset_id_properties: vec![
                "ASSET_ID".to_string(),
                "ASSETID".to_string(),
                "ASSET_NAME".to_string(),
                "ID".to_string(),
            ],
            title_properties: vec!["ASSET_ID".to_string(), "ASSET_NAME".to_string()],
            default_min_diameter_m: crate::diameter::DEFAULT_MIN_DIAMETER_M,
            label_min_zoom: 16.0,
            max_structure_results: 25,
        }
    }
}
