use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::structures::Structure;

/// Decimal places used to decide that two annotations share a position (about 11 cm).
pub const COORD_DECIMALS: usize = 6;

const LABEL_PLACEHOLDER: &str = "Label";

/// Labels of one structure that sit on the same rounded coordinate.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationCluster {
    pub key: String,
    pub lat: f64,
    pub lng: f64,
    pub labels: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationMarkerStyle {
    pub radius: f64,
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub fill_color: String,
    pub fill_opacity: f64,
}

/// Annotation row for the structure detail panel.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationEntry {
    pub label: String,
    pub key: String,
    pub lat: f64,
    pub lng: f64,
    pub coord_text: String,
}

pub fn format_coord(value: f64) -> String {
    // `-0.0 + 0.0` is `+0.0`, so an exact negative zero keys like zero.
    format!("{:.*}", COORD_DECIMALS, value + 0.0)
}

pub fn coord_key(lat: f64, lng: f64) -> String {
    format!("{},{}", format_coord(lat), format_coord(lng))
}

/// Group a structure's annotations by rounded coordinate.
///
/// Annotations without both coordinates or without a label are dropped. Clusters
/// come out in the order their key was first seen, labels in encounter order, and
/// the cluster position is the rounded coordinate.
pub fn cluster(structure: &Structure) -> Vec<AnnotationCluster> {
    let mut clusters: Vec<AnnotationCluster> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for annotation in &structure.annotations {
        let (Some((lat, lng)), Some(label)) = (annotation.coords(), annotation.label.as_ref()) else {
            continue;
        };
        let key = coord_key(lat, lng);
        match slots.get(&key) {
            Some(&slot) => clusters[slot].labels.push(label.clone()),
            None => {
                let (Ok(lat), Ok(lng)) = (format_coord(lat).parse::<f64>(), format_coord(lng).parse::<f64>())
                else {
                    continue;
                };
                slots.insert(key.clone(), clusters.len());
                clusters.push(AnnotationCluster {
                    key,
                    lat,
                    lng,
                    labels: vec![label.clone()],
                });
            }
        }
    }

    clusters
}

pub fn marker_style(structure: &Structure, selected: bool) -> AnnotationMarkerStyle {
    let color = structure.display_color().to_string();
    AnnotationMarkerStyle {
        radius: if selected { 7.0 } else { 5.0 },
        weight: if selected { 3.5 } else { 2.5 },
        opacity: 1.0,
        fill_opacity: if selected { 0.55 } else { 0.35 },
        fill_color: color.clone(),
        color,
    }
}

/// Labels are shown when zoomed in far enough, or always for the selected structure.
pub fn labels_visible(zoom: Option<f64>, label_min_zoom: f64, structure_selected: bool) -> bool {
    if matches!(zoom, Some(z) if z.is_finite() && z >= label_min_zoom) {
        return true;
    }
    structure_selected
}

/// Annotations with coordinates, for the detail panel. Missing labels get a placeholder.
pub fn entries(structure: &Structure) -> Vec<AnnotationEntry> {
    structure
        .annotations
        .iter()
        .filter_map(|a| {
            let (lat, lng) = a.coords()?;
            Some(AnnotationEntry {
                label: a.label.clone().unwrap_or_else(|| LABEL_PLACEHOLDER.to_string()),
                key: coord_key(lat, lng),
                lat,
                lng,
                coord_text: format!("{}, {}", format_coord(lat), format_coord(lng)),
            })
        })
        .collect()
}

/// Plain-text export of a structure's labels, one `label: lat, lng` line per
/// annotation with coordinates.
pub fn labels_text(structure: &Structure) -> String {
    structure
        .annotations
        .iter()
        .filter_map(|a| {
            let (lat, lng) = a.coords()?;
            let coords = format!("{}, {}", format_coord(lat), format_coord(lng));
            Some(match &a.label {
                Some(label) => format!("{}: {}", label, coords),
                None => coords,
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::Annotation;

    fn annotation(label: Option<&str>, lat: Option<f64>, lng: Option<f64>) -> Annotation {
        Annotation {
            label: label.map(str::to_string),
            lat,
            lng,
        }
    }

    fn structure(annotations: Vec<Annotation>) -> Structure {
        Structure {
            id: Some("S1".to_string()),
            annotations,
            ..Structure::default()
        }
    }

    #[test]
    fn identical_coordinates_share_a_cluster() {
        let s = structure(vec![
            annotation(Some("P1"), Some(-35.2809), Some(149.13)),
            annotation(Some("P2"), Some(-35.280900), Some(149.130000)),
        ]);
        let clusters = cluster(&s);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].labels, vec!["P1", "P2"]);
        assert_eq!(clusters[0].key, "-35.280900,149.130000");
    }

    #[test]
    fn negative_zero_shares_a_cluster_with_zero() {
        let s = structure(vec![
            annotation(Some("A"), Some(0.0), Some(-0.0)),
            annotation(Some("B"), Some(-0.0), Some(0.0)),
        ]);
        let clusters = cluster(&s);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].key, "0.000000,0.000000");
        assert_eq!(format_coord(-1e-7), "-0.000000");
    }

    #[test]
    fn rounding_boundary_is_the_sixth_decimal() {
        let s = structure(vec![
            annotation(Some("P1"), Some(-35.2809), Some(149.13)),
            // Rounds to the same six decimals.
            annotation(Some("P2"), Some(-35.2809001), Some(149.13)),
            // Differs in the sixth decimal.
            annotation(Some("P3"), Some(-35.280901), Some(149.13)),
        ]);
        let clusters = cluster(&s);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].labels, vec!["P1", "P2"]);
        assert_eq!(clusters[1].labels, vec!["P3"]);
        assert!((clusters[1].lat - -35.280901).abs() < 1e-12);
    }

    #[test]
    fn incomplete_annotations_are_dropped() {
        let s = structure(vec![
            annotation(None, Some(1.0), Some(2.0)),
            annotation(Some("no lat"), None, Some(2.0)),
            annotation(Some("no lng"), Some(1.0), None),
            annotation(Some("ok"), Some(1.0), Some(2.0)),
        ]);
        let clusters = cluster(&s);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].labels, vec!["ok"]);
    }

    #[test]
    fn clusters_follow_first_encounter_order() {
        let s = structure(vec![
            annotation(Some("B1"), Some(2.0), Some(2.0)),
            annotation(Some("A1"), Some(1.0), Some(1.0)),
            annotation(Some("B2"), Some(2.0), Some(2.0)),
        ]);
        let keys: Vec<String> = cluster(&s).into_iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["2.000000,2.000000", "1.000000,1.000000"]);
    }

    #[test]
    fn label_visibility_rule() {
        assert!(labels_visible(Some(16.0), 16.0, false));
        assert!(!labels_visible(Some(15.5), 16.0, false));
        assert!(labels_visible(Some(11.0), 16.0, true));
        assert!(!labels_visible(None, 16.0, false));
        assert!(!labels_visible(Some(f64::NAN), 16.0, false));
    }

    #[test]
    fn marker_style_tracks_selection() {
        let s = structure(vec![]);
        let idle = marker_style(&s, false);
        let picked = marker_style(&s, true);
        assert_eq!(idle.color, "#64748b");
        assert!(picked.radius > idle.radius);
        assert!(picked.weight > idle.weight);
        assert!(picked.fill_opacity > idle.fill_opacity);
    }

    #[test]
    fn label_export_and_entries() {
        let s = structure(vec![
            annotation(Some("Inlet"), Some(-35.5), Some(149.25)),
            annotation(None, Some(-35.0), Some(149.0)),
            annotation(Some("lost"), None, None),
        ]);
        assert_eq!(
            labels_text(&s),
            "Inlet: -35.500000, 149.250000\n-35.000000, 149.000000"
        );
        let rows = entries(&s);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].label, "Label");
        assert_eq!(rows[0].coord_text, "-35.500000, 149.250000");
    }
}
