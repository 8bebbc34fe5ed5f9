use geo::BoundingRect;
use geo_types::{coord, Rect};
use serde::{Deserialize, Serialize};

use crate::geojson_features::FeatureCollection;
use crate::structures::Structure;

/// Padding ratio applied when fitting the whole dataset.
pub const DATASET_PAD: f64 = 0.08;
/// Padding ratio applied when zooming to a structure.
pub const STRUCTURE_PAD: f64 = 0.25;

/// Geographic extent in degrees, ready for a map widget `fitBounds`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl From<Rect<f64>> for LatLngBounds {
    fn from(rect: Rect<f64>) -> Self {
        // GeoJSON positions are [lng, lat]
        LatLngBounds {
            south: rect.min().y,
            west: rect.min().x,
            north: rect.max().y,
            east: rect.max().x,
        }
    }
}

fn union(acc: Option<Rect<f64>>, next: Rect<f64>) -> Option<Rect<f64>> {
    Some(match acc {
        None => next,
        Some(r) => Rect::new(
            coord! { x: r.min().x.min(next.min().x), y: r.min().y.min(next.min().y) },
            coord! { x: r.max().x.max(next.max().x), y: r.max().y.max(next.max().y) },
        ),
    })
}

/// Grow each side by `ratio` times the extent along that axis.
pub fn pad(rect: Rect<f64>, ratio: f64) -> Rect<f64> {
    let dx = rect.width() * ratio;
    let dy = rect.height() * ratio;
    Rect::new(
        coord! { x: rect.min().x - dx, y: rect.min().y - dy },
        coord! { x: rect.max().x + dx, y: rect.max().y + dy },
    )
}

pub fn dataset_bounds(collection: &FeatureCollection) -> Option<LatLngBounds> {
    collection
        .features
        .iter()
        .filter_map(|f| f.geometry.as_ref()?.bounding_rect())
        .fold(None, union)
        .map(|rect| pad(rect, DATASET_PAD).into())
}

/// Extent of the structure's member features; when none of them has geometry,
/// the extent of its annotation coordinates instead.
pub fn structure_bounds(
    structure: &Structure,
    collection: Option<&FeatureCollection>,
    id_fields: &[String],
) -> Option<LatLngBounds> {
    let members = structure.member_ids();
    let from_members = if members.is_empty() {
        None
    } else {
        collection.and_then(|fc| {
            fc.features
                .iter()
                .filter(|f| {
                    f.asset_id(id_fields)
                        .map(|id| members.contains(&id))
                        .unwrap_or(false)
                })
                .filter_map(|f| f.geometry.as_ref()?.bounding_rect())
                .fold(None, union)
        })
    };

    let rect = from_members.or_else(|| {
        structure
            .annotations
            .iter()
            .filter_map(|a| a.coords())
            .map(|(lat, lng)| Rect::new(coord! { x: lng, y: lat }, coord! { x: lng, y: lat }))
            .fold(None, union)
    })?;

    Some(pad(rect, STRUCTURE_PAD).into())
}
