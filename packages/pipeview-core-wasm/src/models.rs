// This is the models module containing the records handed back to the page
use serde::{Deserialize, Serialize};

use crate::annotations::{AnnotationCluster, AnnotationEntry, AnnotationMarkerStyle};
use crate::diameter::SliderRange;
use crate::geojson_features::PropertyRow;
use crate::style::StyleDescriptor;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmphasisSummary {
    pub emphasized_count: usize,
    pub total_count: usize,
    pub min_diameter_m: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdReport {
    pub min_diameter_m: f64,
    /// Absent until geometry has loaded.
    pub summary: Option<EmphasisSummary>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionReport {
    pub selected_structure_id: Option<String>,
    /// False when an id is selected but no loaded structure carries it.
    pub found: bool,
    pub asset_count: usize,
    pub label_count: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationMarker {
    pub structure_id: Option<String>,
    #[serde(flatten)]
    pub cluster: AnnotationCluster,
    pub style: AnnotationMarkerStyle,
    pub labels_visible: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructureSummary {
    pub id: Option<String>,
    pub name: String,
    pub color: String,
    pub asset_count: usize,
    pub label_count: usize,
    pub meta: String,
    pub selected: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedStructure {
    pub id: String,
    pub name: String,
    pub color: String,
    pub meta: String,
    pub asset_count: usize,
    pub label_count: usize,
    pub paragraphs: Vec<String>,
    pub annotations: Vec<AnnotationEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum StructureDetails {
    NoSelection,
    NotFound { id: String },
    Selected(SelectedStructure),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDetails {
    pub index: usize,
    pub title: Option<String>,
    pub asset_id: Option<String>,
    pub diameter_m: Option<f64>,
    /// Display names of every structure claiming the feature, primary first.
    pub structures: Vec<String>,
    pub properties: Vec<PropertyRow>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogReport {
    pub structure_count: usize,
    pub indexed_asset_count: usize,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeometryReport {
    pub feature_count: usize,
    pub slider: Option<SliderRange>,
    pub summary: Option<EmphasisSummary>,
}

/// Everything the rendering layer needs after a refresh.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    /// One entry per feature, in collection order. Empty until geometry loads.
    pub feature_styles: Vec<StyleDescriptor>,
    pub annotation_markers: Vec<AnnotationMarker>,
    pub summary: Option<EmphasisSummary>,
    pub results: Vec<StructureSummary>,
    pub details: StructureDetails,
    pub slider: Option<SliderRange>,
    pub status: String,
}

impl Default for RenderSnapshot {
    fn default() -> Self {
        RenderSnapshot {
            feature_styles: Vec::new(),
            annotation_markers: Vec::new(),
            summary: None,
            results: Vec::new(),
            details: StructureDetails::NoSelection,
            slider: None,
            status: String::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub catalog: CatalogReport,
    pub geometry: GeometryReport,
}
