//! Exercises the wasm exports against the shared engine in a JS host
//! (`wasm-pack test --headless --chrome`).
#![cfg(target_arch = "wasm32")]

use pipeview_core_wasm::{
    get_structure_labels_text, load_geometry_bytes, load_structures_bytes, reset_viewer,
    select_structure, set_diameter_threshold,
};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const CATALOG: &str = r##"{"structures": [
    {"id": "S1", "name": "Sullivans Creek", "color": "#ef4444", "members": ["P-1"],
     "annotations": [{"label": "Outfall", "lat": -35.2809, "lng": 149.13}]}
]}"##;

const GEOMETRY: &str = r##"{"type": "FeatureCollection", "features": [
    {"type": "Feature", "properties": {"ASSET_ID": "P-1", "PIPE_DIAMETER": 1800},
     "geometry": {"type": "LineString", "coordinates": [[149.0, -35.0], [149.1, -35.1]]}},
    {"type": "Feature", "properties": {"ASSET_ID": "P-2", "PIPE_DIAMETER": "450"},
     "geometry": {"type": "Point", "coordinates": [149.2, -35.2]}}
]}"##;

fn field(value: &JsValue, key: &str) -> JsValue {
    js_sys::Reflect::get(value, &JsValue::from_str(key)).expect("field")
}

#[wasm_bindgen_test]
fn threshold_report_crosses_the_boundary() {
    reset_viewer(JsValue::UNDEFINED).expect("reset");
    load_structures_bytes(CATALOG.as_bytes()).expect("catalog");
    load_geometry_bytes(GEOMETRY.as_bytes()).expect("geometry");

    let report = set_diameter_threshold(0.2).expect("threshold");
    assert_eq!(field(&report, "minDiameterM").as_f64(), Some(0.6));
    let summary = field(&report, "summary");
    assert_eq!(field(&summary, "emphasizedCount").as_f64(), Some(1.0));
    assert_eq!(field(&summary, "totalCount").as_f64(), Some(2.0));
}

#[wasm_bindgen_test]
fn selection_and_label_export() {
    reset_viewer(JsValue::UNDEFINED).expect("reset");
    load_structures_bytes(CATALOG.as_bytes()).expect("catalog");

    let report = select_structure(Some("S1".to_string())).expect("select");
    assert_eq!(field(&report, "found").as_bool(), Some(true));
    assert_eq!(field(&report, "assetCount").as_f64(), Some(1.0));

    let text = get_structure_labels_text("S1").expect("labels");
    assert_eq!(text, "Outfall: -35.280900, 149.130000");
    assert!(get_structure_labels_text("missing").is_err());
}

#[wasm_bindgen_test]
fn broken_geometry_rejects() {
    reset_viewer(JsValue::UNDEFINED).expect("reset");
    assert!(load_geometry_bytes(b"{\"features\": 3}").is_err());
}
