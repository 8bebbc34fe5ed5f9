use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ViewerError;
use crate::geojson_features::{Feature, FeatureCollection};
use crate::ids::to_finite_number;

/// Smallest diameter threshold that means anything for this network (metres).
pub const MIN_DIAMETER_FLOOR_M: f64 = 0.6;
/// Threshold used when the requested value is not a finite number (metres).
pub const DEFAULT_MIN_DIAMETER_M: f64 = 1.5;
pub const SLIDER_STEP_M: f64 = 0.05;

const MM_PER_M: f64 = 1000.0;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiameterStats {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Convert a raw millimetre property value to metres. Negative values are
/// treated as unreadable, like any other non-diameter.
pub fn mm_to_m(raw: Option<&Value>) -> Option<f64> {
    let mm = to_finite_number(raw)?;
    if mm < 0.0 {
        return None;
    }
    Some(mm / MM_PER_M)
}

pub fn diameter_m(feature: &Feature, property: &str) -> Option<f64> {
    mm_to_m(feature.property(property))
}

/// Emphasis is inclusive at the threshold; an unknown diameter is never emphasized.
pub fn is_emphasized(feature: &Feature, property: &str, threshold_m: f64) -> bool {
    matches!(diameter_m(feature, property), Some(d) if d >= threshold_m)
}

/// Apply the domain floor to a threshold from any source (slider, saved state,
/// script). Non-finite input falls back to the default threshold.
pub fn clamp_threshold(value_m: f64) -> f64 {
    if !value_m.is_finite() {
        return DEFAULT_MIN_DIAMETER_M;
    }
    value_m.max(MIN_DIAMETER_FLOOR_M)
}

pub fn compute_stats(collection: &FeatureCollection, property: &str) -> DiameterStats {
    let mut stats = DiameterStats { count: 0, min: None, max: None };
    for d in collection.features.iter().filter_map(|f| diameter_m(f, property)) {
        stats.count += 1;
        stats.min = Some(stats.min.map_or(d, |m| m.min(d)));
        stats.max = Some(stats.max.map_or(d, |m| m.max(d)));
    }
    stats
}

/// Slider bounds for a dataset: the largest diameter rounded up to the slider
/// step, never below 1 m. `None` when no feature has a diameter.
pub fn slider_range(stats: &DiameterStats) -> Option<SliderRange> {
    let max_d = stats.max?;
    let nice_max = MIN_DIAMETER_FLOOR_M.max((max_d * 20.0).ceil() / 20.0);
    Some(SliderRange {
        min: MIN_DIAMETER_FLOOR_M,
        max: nice_max.max(1.0),
        step: SLIDER_STEP_M,
    })
}

/// Keep only the features whose diameter meets `min_diameter_m`. Other members of
/// the collection object are preserved untouched.
pub fn filter_by_diameter(
    data: &Value,
    min_diameter_m: f64,
    property: &str,
) -> Result<Value, ViewerError> {
    if !(min_diameter_m >= 0.0) {
        return Err(ViewerError::InvalidShape(format!(
            "minimum diameter must be >= 0, got {}",
            min_diameter_m
        )));
    }
    let features = data
        .get("features")
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            ViewerError::InvalidShape("expected a FeatureCollection with a 'features' list".to_string())
        })?;

    let kept: Vec<Value> = features
        .iter()
        .filter(|feature| {
            let Some(props) = feature.get("properties").and_then(|p| p.as_object()) else {
                return false;
            };
            matches!(mm_to_m(props.get(property)), Some(d) if d >= min_diameter_m)
        })
        .cloned()
        .collect();

    let mut filtered = data.clone();
    filtered["features"] = Value::Array(kept);
    Ok(filtered)
}
