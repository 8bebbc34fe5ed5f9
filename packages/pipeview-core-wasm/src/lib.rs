use wasm_bindgen::prelude::*;
use serde_wasm_bindgen::{from_value, to_value};

// Create a console module for logging
pub mod console;
// Loose value normalization shared by all parsers
pub mod ids;
pub mod config;
pub mod error;
// Import our geojson features module
pub mod geojson_features;
pub mod structures;
pub mod member_index;
pub mod diameter;
pub mod annotations;
pub mod style;
pub mod bounds;
// Import our models
pub mod models;
pub mod engine;
// Import our module state management
mod module_state;
// Fetching and decoding of the catalog and geometry payloads
mod loader;

use config::ViewerConfig;
use module_state::ModuleState;

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

#[wasm_bindgen]
extern "C" {
    // JavaScript function to fetch data from URL, resolving to a Uint8Array
    #[wasm_bindgen(js_namespace = wasmJsHelpers, catch)]
    pub fn fetch(url: &str) -> Result<js_sys::Promise, JsValue>;
}

// Use the macros from our console module
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => (crate::console::log(&format!($($t)*)))
}

#[macro_export]
macro_rules! console_warn {
    ($($t:tt)*) => (crate::console::warn(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("Pipe viewer core initialized");
    });
}

/// Replace the configuration (partial objects are filled with defaults) and
/// refresh every derived view.
#[wasm_bindgen]
pub fn configure(config_js: JsValue) -> Result<(), JsValue> {
    let config: ViewerConfig = if config_js.is_undefined() || config_js.is_null() {
        ViewerConfig::default()
    } else {
        from_value(config_js)?
    };
    ModuleState::with_mut(|engine| engine.configure(config));
    Ok(())
}

/// Drop all loaded data and selection, keeping nothing but the given config.
#[wasm_bindgen]
pub fn reset_viewer(config_js: JsValue) -> Result<(), JsValue> {
    let config: ViewerConfig = if config_js.is_undefined() || config_js.is_null() {
        ViewerConfig::default()
    } else {
        from_value(config_js)?
    };
    ModuleState::reset(config);
    Ok(())
}

// ========== Loads ==========

#[wasm_bindgen]
pub async fn load_structures(url: Option<String>) -> Result<JsValue, JsValue> {
    let url = url.unwrap_or_else(|| ModuleState::with(|e| e.config().structures_url.clone()));
    let report = loader::load_structures(&url).await;
    Ok(to_value(&report)?)
}

#[wasm_bindgen]
pub async fn load_geometry(url: Option<String>) -> Result<JsValue, JsValue> {
    let url = url.unwrap_or_else(|| ModuleState::with(|e| e.config().geometry_url.clone()));
    let report = loader::load_geometry(&url).await?;
    Ok(to_value(&report)?)
}

/// Load catalog and geometry concurrently from the configured URLs. Resolves
/// with both reports; rejects only when the geometry could not be loaded.
#[wasm_bindgen]
pub async fn load_all() -> Result<JsValue, JsValue> {
    let (structures_url, geometry_url) = ModuleState::with(|e| {
        (e.config().structures_url.clone(), e.config().geometry_url.clone())
    });
    let (catalog, geometry) = loader::load_all(&structures_url, &geometry_url).await;
    let report = models::LoadReport {
        catalog,
        geometry: geometry?,
    };
    Ok(to_value(&report)?)
}

/// Apply a catalog payload the page fetched itself.
#[wasm_bindgen]
pub fn load_structures_bytes(data: &[u8]) -> Result<JsValue, JsValue> {
    Ok(to_value(&loader::apply_catalog_bytes(data))?)
}

/// Apply a GeoJSON payload the page fetched itself.
#[wasm_bindgen]
pub fn load_geometry_bytes(data: &[u8]) -> Result<JsValue, JsValue> {
    let report = loader::apply_geometry_bytes(data)?;
    Ok(to_value(&report)?)
}

// ========== Selection state ==========

#[wasm_bindgen]
pub fn select_structure(structure_id: Option<String>) -> Result<JsValue, JsValue> {
    let report = ModuleState::with_mut(|engine| engine.select_structure(structure_id.as_deref()));
    Ok(to_value(&report)?)
}

#[wasm_bindgen]
pub fn toggle_structure(structure_id: &str) -> Result<JsValue, JsValue> {
    let report = ModuleState::with_mut(|engine| engine.toggle_structure(structure_id));
    Ok(to_value(&report)?)
}

#[wasm_bindgen]
pub fn set_diameter_threshold(value_m: f64) -> Result<JsValue, JsValue> {
    let report = ModuleState::with_mut(|engine| engine.set_diameter_threshold(value_m));
    console_log!("Diameter threshold set to {:.2} m", report.min_diameter_m);
    Ok(to_value(&report)?)
}

#[wasm_bindgen]
pub fn set_zoom(zoom: f64) {
    ModuleState::with_mut(|engine| engine.set_zoom(zoom));
}

// ========== Derived views ==========

#[wasm_bindgen]
pub fn get_render_snapshot() -> Result<JsValue, JsValue> {
    let value = ModuleState::with(|engine| to_value(engine.snapshot()))?;
    Ok(value)
}

#[wasm_bindgen]
pub fn get_feature_style(index: usize) -> Result<JsValue, JsValue> {
    let value = ModuleState::with(|engine| to_value(&engine.snapshot().feature_styles.get(index)))?;
    Ok(value)
}

#[wasm_bindgen]
pub fn get_feature_details(index: usize) -> Result<JsValue, JsValue> {
    let value = ModuleState::with(|engine| to_value(&engine.feature_details(index)))?;
    Ok(value)
}

#[wasm_bindgen]
pub fn get_structure_bounds(structure_id: &str) -> Result<JsValue, JsValue> {
    let bounds = ModuleState::with(|engine| engine.structure_bounds(structure_id))?;
    Ok(to_value(&bounds)?)
}

#[wasm_bindgen]
pub fn get_dataset_bounds() -> Result<JsValue, JsValue> {
    let value = ModuleState::with(|engine| to_value(&engine.dataset_bounds()))?;
    Ok(value)
}

/// Text for the "copy labels" action of a structure.
#[wasm_bindgen]
pub fn get_structure_labels_text(structure_id: &str) -> Result<String, JsValue> {
    Ok(ModuleState::with(|engine| engine.labels_text(structure_id))?)
}

// ========== Offline tooling ==========

/// Filter a FeatureCollection down to pipes at least `min_diameter_m` wide.
/// `property` defaults to the configured diameter property.
#[wasm_bindgen]
pub fn filter_geojson_by_diameter(
    geojson: &str,
    min_diameter_m: f64,
    property: Option<String>,
) -> Result<String, JsValue> {
    let property = property
        .unwrap_or_else(|| ModuleState::with(|e| e.config().diameter_property.clone()));
    let data: serde_json::Value = serde_json::from_str(geojson).map_err(error::ViewerError::from)?;
    let filtered = diameter::filter_by_diameter(&data, min_diameter_m, &property)?;
    console_log!(
        "Filtered {} -> {} features (min {} m via {})",
        data["features"].as_array().map_or(0, |f| f.len()),
        filtered["features"].as_array().map_or(0, |f| f.len()),
        min_diameter_m,
        property
    );
    Ok(filtered.to_string())
}
