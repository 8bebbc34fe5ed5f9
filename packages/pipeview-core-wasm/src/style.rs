// Per-feature rendering style from diameter emphasis, structure membership and
// the current selection. Pure: the member index and id fields come in through
// `StyleContext`, the threshold and selection as arguments.

use serde::{Deserialize, Serialize};

use crate::diameter::is_emphasized;
use crate::geojson_features::Feature;
use crate::member_index::MemberIndex;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokePreset {
    pub color: &'static str,
    pub weight: f64,
    pub opacity: f64,
}

pub const EMPHASIZED_PRESET: StrokePreset = StrokePreset {
    color: "#22d3ee",
    weight: 4.5,
    opacity: 1.0,
};

pub const DIM_PRESET: StrokePreset = StrokePreset {
    color: "#9ca3af",
    weight: 2.0,
    opacity: 0.75,
};

/// Added to the stroke weight of every feature in the selected structure.
pub const SELECTION_WEIGHT_BOOST: f64 = 1.5;

const EMPHASIZED_FILL: &str = "#22d3ee";
const DIM_FILL: &str = "#0b1220";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DrawOrder {
    Front,
    Back,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PointStyle {
    pub radius: f64,
    pub fill_color: String,
    pub fill_opacity: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StyleDescriptor {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub emphasized: bool,
    pub selected: bool,
    /// Id of the primary structure, if any claims this feature.
    pub structure_id: Option<String>,
    pub draw_order: DrawOrder,
    /// Only set for point-shaped features.
    pub point: Option<PointStyle>,
}

/// Read-only inputs shared by every style resolution within one refresh.
#[derive(Clone, Copy)]
pub struct StyleContext<'a> {
    pub index: &'a MemberIndex,
    pub id_fields: &'a [String],
    pub diameter_property: &'a str,
}

pub fn resolve_style(
    ctx: &StyleContext<'_>,
    feature: &Feature,
    threshold_m: f64,
    selected_structure_id: Option<&str>,
) -> StyleDescriptor {
    let emphasized = is_emphasized(feature, ctx.diameter_property, threshold_m);
    let base = if emphasized { EMPHASIZED_PRESET } else { DIM_PRESET };

    let primary = ctx.index.primary_match(feature, ctx.id_fields);
    let structure_color = primary.and_then(|m| m.structure.color.clone());
    let selected = selected_structure_id
        .map(|id| ctx.index.is_member_of(feature, ctx.id_fields, id))
        .unwrap_or(false);

    let mut style = StyleDescriptor {
        color: structure_color
            .clone()
            .unwrap_or_else(|| base.color.to_string()),
        weight: base.weight,
        opacity: base.opacity,
        emphasized,
        selected,
        structure_id: primary.and_then(|m| m.structure.id.clone()),
        draw_order: if emphasized { DrawOrder::Front } else { DrawOrder::Back },
        point: None,
    };

    if selected {
        style.weight += SELECTION_WEIGHT_BOOST;
        style.opacity = 1.0;
    }

    if feature.is_point() {
        style.point = Some(point_style(structure_color, emphasized, selected));
    }

    style
}

fn point_style(structure_color: Option<String>, emphasized: bool, selected: bool) -> PointStyle {
    let radius = match (selected, emphasized) {
        (true, true) => 7.0,
        (true, false) => 5.0,
        (false, true) => 6.0,
        (false, false) => 3.0,
    };
    let fill_opacity = match (structure_color.is_some(), emphasized) {
        (true, true) => 0.55,
        (true, false) => 0.25,
        (false, true) => 0.45,
        (false, false) => 0.15,
    };
    let fill_color = structure_color.unwrap_or_else(|| {
        if emphasized { EMPHASIZED_FILL } else { DIM_FILL }.to_string()
    });
    PointStyle {
        radius,
        fill_color,
        fill_opacity,
    }
}
