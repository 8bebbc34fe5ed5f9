// Selection state and the refresh cascade.
//
// The engine owns the catalog, its member index, the geometry collection and
// the selection. Every mutation replaces whole values and then recomputes the
// full `RenderSnapshot` before returning, so readers never see a half-applied
// state.

use crate::annotations;
use crate::bounds::{self, LatLngBounds};
use crate::config::ViewerConfig;
use crate::diameter::{self, clamp_threshold, DiameterStats, SliderRange};
use crate::error::ViewerError;
use crate::geojson_features::FeatureCollection;
use crate::ids::normalize_str;
use crate::member_index::MemberIndex;
use crate::models::{
    AnnotationMarker, CatalogReport, EmphasisSummary, FeatureDetails, GeometryReport,
    RenderSnapshot, SelectedStructure, SelectionReport, StructureDetails, StructureSummary,
    ThresholdReport,
};
use crate::structures::{Structure, StructureCatalog};
use crate::style::{resolve_style, StyleContext};
use crate::{console_log, console_warn};

#[derive(Clone, Debug, PartialEq)]
pub struct SelectionState {
    pub selected_structure_id: Option<String>,
    pub min_diameter_m: f64,
}

#[derive(Clone, Debug, PartialEq)]
enum LoadStatus {
    Pending,
    Loaded,
    Failed(String),
}

pub struct ViewerEngine {
    config: ViewerConfig,
    catalog: StructureCatalog,
    index: MemberIndex,
    geometry: Option<FeatureCollection>,
    selection: SelectionState,
    zoom: Option<f64>,
    slider: Option<SliderRange>,
    catalog_status: LoadStatus,
    geometry_status: LoadStatus,
    snapshot: RenderSnapshot,
}

impl Default for ViewerEngine {
    fn default() -> Self {
        ViewerEngine::new(ViewerConfig::default())
    }
}

impl ViewerEngine {
    pub fn new(config: ViewerConfig) -> Self {
        let mut engine = ViewerEngine {
            selection: SelectionState {
                selected_structure_id: None,
                min_diameter_m: clamp_threshold(config.default_min_diameter_m),
            },
            config,
            catalog: StructureCatalog::default(),
            index: MemberIndex::default(),
            geometry: None,
            zoom: None,
            slider: None,
            catalog_status: LoadStatus::Pending,
            geometry_status: LoadStatus::Pending,
            snapshot: RenderSnapshot::default(),
        };
        engine.refresh();
        engine
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn snapshot(&self) -> &RenderSnapshot {
        &self.snapshot
    }

    pub fn catalog(&self) -> &StructureCatalog {
        &self.catalog
    }

    pub fn geometry(&self) -> Option<&FeatureCollection> {
        self.geometry.as_ref()
    }

    /// Swap the configuration. With geometry loaded the slider range and the
    /// threshold are derived again, since the diameter property may have changed.
    pub fn configure(&mut self, config: ViewerConfig) {
        self.config = config;
        if let Some(collection) = self.geometry.take() {
            self.fit_slider(&collection);
            self.geometry = Some(collection);
        }
        self.refresh();
    }

    // ========== Loads ==========

    /// Replace the catalog and rebuild the member index from scratch. A selection
    /// pointing at a structure the new catalog no longer has is cleared.
    pub fn apply_catalog(&mut self, catalog: StructureCatalog) -> CatalogReport {
        self.replace_catalog(catalog);
        self.catalog_status = LoadStatus::Loaded;
        console_log!(
            "Structure catalog applied: {} structures, {} indexed assets",
            self.catalog.len(),
            self.index.len()
        );
        self.refresh();
        self.catalog_report(None)
    }

    /// A failed catalog load leaves the viewer with an empty catalog, never the
    /// previous one.
    pub fn catalog_failed(&mut self, err: &ViewerError) -> CatalogReport {
        console_warn!("Structure catalog unavailable: {}", err);
        self.replace_catalog(StructureCatalog::default());
        self.catalog_status = LoadStatus::Failed(err.to_string());
        self.refresh();
        self.catalog_report(Some(err.to_string()))
    }

    fn replace_catalog(&mut self, catalog: StructureCatalog) {
        self.index = MemberIndex::build(catalog.structures());
        self.catalog = catalog;

        if let Some(id) = self.selection.selected_structure_id.as_deref() {
            if self.catalog.get(id).is_none() {
                console_log!("Selected structure '{}' is gone after reload; clearing selection", id);
                self.selection.selected_structure_id = None;
            }
        }
    }

    fn catalog_report(&self, error: Option<String>) -> CatalogReport {
        CatalogReport {
            structure_count: self.catalog.len(),
            indexed_asset_count: self.index.len(),
            error,
        }
    }

    /// Replace the geometry collection. The slider range is derived from the new
    /// data and the current threshold is pulled into it.
    pub fn apply_geometry(&mut self, collection: FeatureCollection) -> GeometryReport {
        let stats = self.fit_slider(&collection);

        console_log!(
            "Geometry applied: {} features, {} with a diameter",
            collection.len(),
            stats.count
        );
        self.geometry = Some(collection);
        self.geometry_status = LoadStatus::Loaded;
        self.refresh();

        GeometryReport {
            feature_count: self.geometry.as_ref().map_or(0, FeatureCollection::len),
            slider: self.slider,
            summary: self.snapshot.summary,
        }
    }

    /// Derive the slider range from `collection` and pull the threshold into it.
    fn fit_slider(&mut self, collection: &FeatureCollection) -> DiameterStats {
        let stats = diameter::compute_stats(collection, &self.config.diameter_property);
        self.slider = diameter::slider_range(&stats);
        if let Some(range) = self.slider {
            self.selection.min_diameter_m = clamp_threshold(range.max.min(self.selection.min_diameter_m));
        }
        stats
    }

    pub fn geometry_failed(&mut self, err: &ViewerError) {
        console_warn!("Geometry unavailable: {}", err);
        self.geometry = None;
        self.slider = None;
        self.geometry_status = LoadStatus::Failed(err.to_string());
        self.refresh();
    }

    // ========== Selection state ==========

    /// Select one structure (or none). Any previous selection is replaced.
    pub fn select_structure(&mut self, structure_id: Option<&str>) -> SelectionReport {
        self.selection.selected_structure_id = structure_id.and_then(normalize_str);
        self.refresh();
        self.selection_report()
    }

    /// Select `structure_id`, or clear the selection when it is already selected.
    /// A blank id leaves the selection alone.
    pub fn toggle_structure(&mut self, structure_id: &str) -> SelectionReport {
        let Some(id) = normalize_str(structure_id) else {
            return self.selection_report();
        };
        if self.selection.selected_structure_id.as_deref() == Some(id.as_str()) {
            self.select_structure(None)
        } else {
            self.select_structure(Some(&id))
        }
    }

    pub fn set_diameter_threshold(&mut self, value_m: f64) -> ThresholdReport {
        self.selection.min_diameter_m = clamp_threshold(value_m);
        self.refresh();
        ThresholdReport {
            min_diameter_m: self.selection.min_diameter_m,
            summary: self.snapshot.summary,
        }
    }

    /// Zoom only affects label visibility; nothing else is recomputed.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = Some(zoom);
        let selected = self.selection.selected_structure_id.as_deref();
        let (zoom, min_zoom) = (self.zoom, self.config.label_min_zoom);
        for marker in &mut self.snapshot.annotation_markers {
            let is_selected = selected.is_some() && marker.structure_id.as_deref() == selected;
            marker.labels_visible = annotations::labels_visible(zoom, min_zoom, is_selected);
        }
    }

    fn selected_structure(&self) -> Option<&Structure> {
        let id = self.selection.selected_structure_id.as_deref()?;
        self.catalog.get(id).map(|s| s.as_ref())
    }

    fn selection_report(&self) -> SelectionReport {
        let structure = self.selected_structure();
        SelectionReport {
            selected_structure_id: self.selection.selected_structure_id.clone(),
            found: structure.is_some(),
            asset_count: structure.map_or(0, Structure::asset_count),
            label_count: structure.map_or(0, Structure::label_count),
        }
    }

    // ========== Refresh cascade ==========

    /// Recompute every derived view from the current state.
    pub fn refresh(&mut self) {
        let threshold = self.selection.min_diameter_m;
        let selected = self.selection.selected_structure_id.clone();

        let (feature_styles, summary) = match &self.geometry {
            Some(collection) => {
                let ctx = StyleContext {
                    index: &self.index,
                    id_fields: &self.config.asset_id_properties,
                    diameter_property: &self.config.diameter_property,
                };
                let styles: Vec<_> = collection
                    .features
                    .iter()
                    .map(|f| resolve_style(&ctx, f, threshold, selected.as_deref()))
                    .collect();
                let summary = EmphasisSummary {
                    emphasized_count: styles.iter().filter(|s| s.emphasized).count(),
                    total_count: collection.len(),
                    min_diameter_m: threshold,
                };
                (styles, Some(summary))
            }
            None => (Vec::new(), None),
        };

        self.snapshot = RenderSnapshot {
            feature_styles,
            annotation_markers: self.annotation_markers(selected.as_deref()),
            summary,
            results: self.structure_results(selected.as_deref()),
            details: self.structure_details(),
            slider: self.slider,
            status: self.status_line(summary),
        };
    }

    fn annotation_markers(&self, selected: Option<&str>) -> Vec<AnnotationMarker> {
        let mut markers = Vec::new();
        for structure in self.catalog.structures() {
            let is_selected = selected.map_or(false, |id| structure.is(id));
            let style = annotations::marker_style(structure, is_selected);
            let labels_visible =
                annotations::labels_visible(self.zoom, self.config.label_min_zoom, is_selected);
            for cluster in annotations::cluster(structure) {
                markers.push(AnnotationMarker {
                    structure_id: structure.id.clone(),
                    cluster,
                    style: style.clone(),
                    labels_visible,
                });
            }
        }
        markers
    }

    fn structure_results(&self, selected: Option<&str>) -> Vec<StructureSummary> {
        let mut list: Vec<&Structure> = self.catalog.structures().iter().map(|s| s.as_ref()).collect();
        list.sort_by(|a, b| {
            let (a, b) = (a.display_name(), b.display_name());
            a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
        });
        list.into_iter()
            .take(self.config.max_structure_results)
            .map(|s| StructureSummary {
                id: s.id.clone(),
                name: s.display_name().to_string(),
                color: s.display_color().to_string(),
                asset_count: s.asset_count(),
                label_count: s.label_count(),
                meta: structure_meta(s),
                selected: selected.map_or(false, |id| s.is(id)),
            })
            .collect()
    }

    fn structure_details(&self) -> StructureDetails {
        let Some(id) = self.selection.selected_structure_id.as_deref() else {
            return StructureDetails::NoSelection;
        };
        let Some(s) = self.catalog.get(id) else {
            return StructureDetails::NotFound { id: id.to_string() };
        };
        StructureDetails::Selected(SelectedStructure {
            id: id.to_string(),
            name: s.display_name().to_string(),
            color: s.display_color().to_string(),
            meta: structure_meta(s),
            asset_count: s.asset_count(),
            label_count: s.label_count(),
            paragraphs: s.paragraphs(),
            annotations: annotations::entries(s),
        })
    }

    fn status_line(&self, summary: Option<EmphasisSummary>) -> String {
        match (&self.geometry_status, summary) {
            (LoadStatus::Failed(_), _) => "Failed to load data".to_string(),
            (_, Some(s)) => format!(
                "Showing {} / {} features (≥ {:.2} m)",
                s.emphasized_count, s.total_count, s.min_diameter_m
            ),
            (LoadStatus::Pending, None) => format!("Loading {}…", self.config.geometry_url),
            (LoadStatus::Loaded, None) => "No features loaded".to_string(),
        }
    }

    // ========== Per-feature and per-structure queries ==========

    pub fn feature_details(&self, index: usize) -> Option<FeatureDetails> {
        let feature = self.geometry.as_ref()?.features.get(index)?;
        let fields = &self.config.asset_id_properties;
        Some(FeatureDetails {
            index,
            title: feature.title(&self.config.title_properties),
            asset_id: feature.asset_id(fields),
            diameter_m: diameter::diameter_m(feature, &self.config.diameter_property),
            structures: self
                .index
                .matches(feature, fields)
                .iter()
                .map(|m| m.structure.display_name().to_string())
                .collect(),
            properties: feature.property_rows(),
        })
    }

    fn structure(&self, structure_id: &str) -> Result<&Structure, ViewerError> {
        self.catalog
            .get(structure_id.trim())
            .map(|s| s.as_ref())
            .ok_or_else(|| ViewerError::UnknownStructure(structure_id.to_string()))
    }

    pub fn structure_bounds(&self, structure_id: &str) -> Result<Option<LatLngBounds>, ViewerError> {
        let structure = self.structure(structure_id)?;
        Ok(bounds::structure_bounds(
            structure,
            self.geometry.as_ref(),
            &self.config.asset_id_properties,
        ))
    }

    pub fn dataset_bounds(&self) -> Option<LatLngBounds> {
        bounds::dataset_bounds(self.geometry.as_ref()?)
    }

    pub fn labels_text(&self, structure_id: &str) -> Result<String, ViewerError> {
        Ok(annotations::labels_text(self.structure(structure_id)?))
    }
}

fn plural(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, if count == 1 { "" } else { "s" })
}

/// "3 assets • 1 label"; the label part is left out when there are none.
pub fn structure_meta(structure: &Structure) -> String {
    let assets = plural(structure.asset_count(), "asset");
    match structure.label_count() {
        0 => assets,
        n => format!("{} • {}", assets, plural(n, "label")),
    }
}
