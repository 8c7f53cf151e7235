//! Repair of polygons that cross the ±180° meridian.
//!
//! Source data stores such polygons with longitudes jumping from about +180
//! to about -180, which every flat projection renders as a band spanning the
//! whole world. Two repairs are offered: cutting the rings at the dateline
//! into separate features, or shifting the negative half by +360° so the
//! polygon stays in one piece past 180.

use crate::data::geojson::{GeoJsonFeature, GeoJsonGeometry, Position};
use serde::{Deserialize, Serialize};

/// Longitude span on each side beyond which a feature is shifted
const SHIFT_THRESHOLD_LNG: f64 = 170.0;

/// Property carrying the 1-based part number of a split feature
pub const PART_PROPERTY: &str = "_part";

/// Maps any longitude into [-180, 180]
pub fn normalize_longitude(lng: f64) -> f64 {
    if !lng.is_finite() || (-180.0..=180.0).contains(&lng) {
        return lng;
    }
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    // keep +180 rather than folding it onto -180
    if wrapped == -180.0 && lng > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// True when two consecutive longitudes of the ring jump by more than 180°
pub fn ring_crosses_dateline(ring: &[Position]) -> bool {
    ring.windows(2).any(|pair| (pair[1][0] - pair[0][0]).abs() > 180.0)
}

/// Meridian edge and interpolated latitude where the segment `a -> b`
/// crosses the dateline
fn crossing(a: Position, b: Position) -> (f64, f64) {
    let [lng1, lat1] = a;
    let [lng2, lat2] = b;
    let (edge, unwrapped) = if lng1 > 0.0 {
        (180.0, lng2 + 360.0)
    } else {
        (-180.0, lng2 - 360.0)
    };
    let span = unwrapped - lng1;
    let ratio = if span == 0.0 { 0.0 } else { (edge - lng1) / span };
    (edge, lat1 + ratio * (lat2 - lat1))
}

/// Cuts a ring at the dateline.
///
/// Each crossing closes the current part on one edge and opens the next on
/// the opposite edge, at the interpolated latitude. The part running past the
/// last vertex joins the first one. Every returned part is closed; parts too
/// small to form a ring are dropped. A ring that does not cross comes back
/// unchanged.
pub fn split_ring_at_dateline(ring: &[Position]) -> Vec<Vec<Position>> {
    if !ring_crosses_dateline(ring) {
        return vec![ring.to_vec()];
    }

    let mut open = ring.to_vec();
    if open.len() > 1 && open.first() == open.last() {
        open.pop();
    }
    let n = open.len();

    let mut parts: Vec<Vec<Position>> = vec![vec![open[0]]];
    for i in 0..n {
        let a = open[i];
        let b = open[(i + 1) % n];
        if (b[0] - a[0]).abs() > 180.0 {
            let (edge, lat) = crossing(a, b);
            if let Some(current) = parts.last_mut() {
                current.push([edge, lat]);
            }
            parts.push(vec![[-edge, lat]]);
        }
        if i + 1 < n {
            if let Some(current) = parts.last_mut() {
                current.push(b);
            }
        }
    }

    if parts.len() > 1 {
        if let Some(mut tail) = parts.pop() {
            tail.extend_from_slice(&parts[0]);
            parts[0] = tail;
        }
    }

    parts
        .into_iter()
        .map(|mut part| {
            if part.first() != part.last() {
                if let Some(first) = part.first().copied() {
                    part.push(first);
                }
            }
            part
        })
        .filter(|part| part.len() >= 4)
        .collect()
}

/// Which side of the dateline a ring lies on; true for the eastern hemisphere
fn is_east(ring: &[Position]) -> bool {
    ring.iter().map(|p| p[0]).sum::<f64>() >= 0.0
}

/// Splits one polygon (exterior plus holes) into polygons that do not cross
fn split_polygon(polygon: &[Vec<Position>]) -> Vec<Vec<Vec<Position>>> {
    let Some((exterior, holes)) = polygon.split_first() else {
        return Vec::new();
    };
    if !ring_crosses_dateline(exterior) {
        return vec![polygon.to_vec()];
    }

    let mut pieces: Vec<Vec<Vec<Position>>> = split_ring_at_dateline(exterior)
        .into_iter()
        .map(|ring| vec![ring])
        .collect();

    for hole in holes {
        let Some(first) = hole.first() else { continue };
        let hole_east = first[0] >= 0.0;
        if let Some(piece) = pieces.iter_mut().find(|p| is_east(&p[0]) == hole_east) {
            piece.push(hole.clone());
        }
    }
    pieces
}

/// Splits a Polygon or MultiPolygon feature whose rings cross the dateline
/// into one feature per resulting polygon.
///
/// With more than one part, each carries `_part` = 1..n. Features that do not
/// cross, and non-polygonal features, come back as a single unchanged copy.
pub fn split_feature_at_dateline(feature: &GeoJsonFeature) -> Vec<GeoJsonFeature> {
    let geometries: Vec<GeoJsonGeometry> = match &feature.geometry {
        Some(GeoJsonGeometry::Polygon { coordinates }) => {
            if !coordinates.first().is_some_and(|r| ring_crosses_dateline(r)) {
                return vec![feature.clone()];
            }
            split_polygon(coordinates)
                .into_iter()
                .map(|coordinates| GeoJsonGeometry::Polygon { coordinates })
                .collect()
        }
        Some(GeoJsonGeometry::MultiPolygon { coordinates }) => {
            let crosses = coordinates
                .iter()
                .any(|polygon| polygon.first().is_some_and(|r| ring_crosses_dateline(r)));
            if !crosses {
                return vec![feature.clone()];
            }
            coordinates
                .iter()
                .flat_map(|polygon| split_polygon(polygon))
                .map(|polygon| GeoJsonGeometry::MultiPolygon {
                    coordinates: vec![polygon],
                })
                .collect()
        }
        _ => return vec![feature.clone()],
    };

    let tag_parts = geometries.len() > 1;
    geometries
        .into_iter()
        .enumerate()
        .map(|(index, geometry)| {
            let mut part = feature.with_geometry(Some(geometry));
            if tag_parts {
                part.set_property(PART_PROPERTY, index + 1);
            }
            part
        })
        .collect()
}

fn polygon_rings_mut(geometry: &mut GeoJsonGeometry) -> Vec<&mut Vec<Position>> {
    match geometry {
        GeoJsonGeometry::Polygon { coordinates } => coordinates.iter_mut().collect(),
        GeoJsonGeometry::MultiPolygon { coordinates } => {
            coordinates.iter_mut().flatten().collect()
        }
        _ => Vec::new(),
    }
}

/// Moves a polygonal feature spanning both sides of the dateline onto one
/// side by adding 360° to its negative longitudes.
///
/// Returns whether the feature was changed.
pub fn shift_feature_across_dateline(feature: &mut GeoJsonFeature) -> bool {
    let Some(geometry) = feature.geometry.as_mut() else {
        return false;
    };
    if !matches!(
        geometry,
        GeoJsonGeometry::Polygon { .. } | GeoJsonGeometry::MultiPolygon { .. }
    ) {
        return false;
    }
    let Some((min, max)) = geometry.x_range() else {
        return false;
    };
    if !(min < -SHIFT_THRESHOLD_LNG && max > SHIFT_THRESHOLD_LNG) {
        return false;
    }

    for ring in polygon_rings_mut(geometry) {
        for position in ring.iter_mut().filter(|p| p[0] < 0.0) {
            position[0] += 360.0;
        }
    }
    true
}

/// How [`repair_collection`] treats crossing features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatelineMode {
    Split,
    Shift,
}

/// Outcome of a collection repair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatelineReport {
    pub features_in: usize,
    pub features_out: usize,
    pub split: usize,
    pub shifted: usize,
}

/// Repairs every feature of a collection
pub fn repair_collection(
    features: Vec<GeoJsonFeature>,
    mode: DatelineMode,
) -> (Vec<GeoJsonFeature>, DatelineReport) {
    let mut report = DatelineReport {
        features_in: features.len(),
        ..Default::default()
    };

    let repaired: Vec<GeoJsonFeature> = match mode {
        DatelineMode::Split => features
            .iter()
            .flat_map(|feature| {
                let parts = split_feature_at_dateline(feature);
                if parts.len() != 1 || parts[0] != *feature {
                    report.split += 1;
                }
                parts
            })
            .collect(),
        DatelineMode::Shift => features
            .into_iter()
            .map(|mut feature| {
                if shift_feature_across_dateline(&mut feature) {
                    report.shifted += 1;
                }
                feature
            })
            .collect(),
    };

    report.features_out = repaired.len();
    log::info!(
        "dateline repair: {} features in, {} out ({} split, {} shifted)",
        report.features_in,
        report.features_out,
        report.split,
        report.shifted
    );
    (repaired, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Box from 175°E to 175°W between 10°S and 10°N, stored the wrapped way
    fn crossing_ring() -> Vec<Position> {
        vec![
            [175.0, -10.0],
            [-175.0, -10.0],
            [-175.0, 10.0],
            [175.0, 10.0],
            [175.0, -10.0],
        ]
    }

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(540.0), 180.0);
        assert_eq!(normalize_longitude(-180.0), -180.0);
        assert_eq!(normalize_longitude(45.0), 45.0);
    }

    #[test]
    fn test_crossing_detection() {
        assert!(ring_crosses_dateline(&crossing_ring()));
        assert!(!ring_crosses_dateline(&[
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [0.0, 0.0]
        ]));
    }

    #[test]
    fn test_interpolated_crossing() {
        let (edge, lat) = crossing([170.0, 0.0], [-170.0, 10.0]);
        assert_eq!(edge, 180.0);
        assert!((lat - 5.0).abs() < 1e-12);

        let (edge, lat) = crossing([-175.0, 0.0], [175.0, 4.0]);
        assert_eq!(edge, -180.0);
        assert!((lat - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_split_ring() {
        let parts = split_ring_at_dateline(&crossing_ring());
        assert_eq!(parts.len(), 2);

        for part in &parts {
            assert_eq!(part.first(), part.last());
            assert!(!ring_crosses_dateline(part));
        }
        let east = parts.iter().find(|p| is_east(p)).unwrap();
        let west = parts.iter().find(|p| !is_east(p)).unwrap();
        assert!(east.iter().all(|p| p[0] >= 175.0));
        assert!(west.iter().all(|p| p[0] <= -175.0));
        assert!(east.contains(&[180.0, -10.0]) && east.contains(&[180.0, 10.0]));
        assert!(west.contains(&[-180.0, -10.0]) && west.contains(&[-180.0, 10.0]));
    }

    #[test]
    fn test_non_crossing_ring_unchanged() {
        let ring = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 0.0]];
        assert_eq!(split_ring_at_dateline(&ring), vec![ring]);
    }

    #[test]
    fn test_split_feature_tags_parts() {
        let hole = vec![
            [-178.0, -1.0],
            [-177.0, -1.0],
            [-177.0, 1.0],
            [-178.0, -1.0],
        ];
        let feature = GeoJsonFeature::new(GeoJsonGeometry::Polygon {
            coordinates: vec![crossing_ring(), hole.clone()],
        })
        .with_property("id", "fiji");

        let parts = split_feature_at_dateline(&feature);
        assert_eq!(parts.len(), 2);
        for (i, part) in parts.iter().enumerate() {
            assert_eq!(part.property(PART_PROPERTY), Some(&serde_json::json!(i + 1)));
            assert_eq!(part.property("id"), Some(&serde_json::json!("fiji")));
        }

        let with_hole = parts
            .iter()
            .filter_map(|p| match p.geometry.as_ref() {
                Some(GeoJsonGeometry::Polygon { coordinates }) if coordinates.len() == 2 => {
                    Some(coordinates)
                }
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(with_hole.len(), 1);
        assert!(!is_east(&with_hole[0][0]));
        assert_eq!(with_hole[0][1], hole);
    }

    #[test]
    fn test_split_multipolygon_keeps_other_polygons() {
        let island = vec![[10.0, 0.0], [11.0, 0.0], [11.0, 1.0], [10.0, 0.0]];
        let feature = GeoJsonFeature::new(GeoJsonGeometry::MultiPolygon {
            coordinates: vec![vec![crossing_ring()], vec![island.clone()]],
        });

        let parts = split_feature_at_dateline(&feature);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| matches!(
            p.geometry,
            Some(GeoJsonGeometry::MultiPolygon { ref coordinates }) if coordinates.len() == 1
        )));
        assert_eq!(
            parts[2].geometry,
            Some(GeoJsonGeometry::MultiPolygon {
                coordinates: vec![vec![island]]
            })
        );
    }

    #[test]
    fn test_shift_feature() {
        let mut feature = GeoJsonFeature::new(GeoJsonGeometry::MultiPolygon {
            coordinates: vec![vec![crossing_ring()]],
        });
        assert!(shift_feature_across_dateline(&mut feature));
        let (min, max) = feature.geometry.as_ref().unwrap().x_range().unwrap();
        assert_eq!((min, max), (175.0, 185.0));

        // already shifted
        assert!(!shift_feature_across_dateline(&mut feature));

        let mut line = GeoJsonFeature::new(GeoJsonGeometry::LineString {
            coordinates: vec![[175.0, 0.0], [-175.0, 0.0]],
        });
        assert!(!shift_feature_across_dateline(&mut line));
    }

    #[test]
    fn test_repair_collection_report() {
        let crossing = GeoJsonFeature::new(GeoJsonGeometry::Polygon {
            coordinates: vec![crossing_ring()],
        });
        let plain = GeoJsonFeature::new(GeoJsonGeometry::Point {
            coordinates: [0.0, 0.0],
        });

        let (out, report) =
            repair_collection(vec![crossing.clone(), plain.clone()], DatelineMode::Split);
        assert_eq!(out.len(), 3);
        assert_eq!(
            report,
            DatelineReport {
                features_in: 2,
                features_out: 3,
                split: 1,
                shifted: 0
            }
        );

        let (out, report) = repair_collection(vec![crossing, plain], DatelineMode::Shift);
        assert_eq!(out.len(), 2);
        assert_eq!(report.shifted, 1);
    }
}
