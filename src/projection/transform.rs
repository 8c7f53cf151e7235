//! Runs GeoJSON geometries through a [`Projection`]
//!
//! Output geometries keep their GeoJSON shape but carry pixel positions.
//! Positions the projection cannot place are dropped; parts left without
//! enough positions to stay meaningful are dropped with them.

use crate::core::geo::LatLng;
use crate::data::geojson::{GeoJsonFeature, GeoJsonGeometry, Position};
use crate::projection::Projection;

fn project_position(projection: &dyn Projection, position: &Position) -> Option<Position> {
    projection
        .project(LatLng::from_position(*position))
        .map(|p| [p.x, p.y])
}

fn project_line(projection: &dyn Projection, line: &[Position]) -> Vec<Position> {
    line.iter()
        .filter_map(|p| project_position(projection, p))
        .collect()
}

/// Exterior ring first; `None` when the exterior does not survive
fn project_polygon(
    projection: &dyn Projection,
    rings: &[Vec<Position>],
) -> Option<Vec<Vec<Position>>> {
    let (exterior, holes) = rings.split_first()?;
    let exterior = project_line(projection, exterior);
    if exterior.len() < 4 {
        return None;
    }
    let mut projected = vec![exterior];
    projected.extend(
        holes
            .iter()
            .map(|ring| project_line(projection, ring))
            .filter(|ring| ring.len() >= 4),
    );
    Some(projected)
}

/// Projects every position of `geometry`; `None` when nothing survives
pub fn project_geometry(
    projection: &dyn Projection,
    geometry: &GeoJsonGeometry,
) -> Option<GeoJsonGeometry> {
    let projected = match geometry {
        GeoJsonGeometry::Point { coordinates } => GeoJsonGeometry::Point {
            coordinates: project_position(projection, coordinates)?,
        },
        GeoJsonGeometry::MultiPoint { coordinates } => GeoJsonGeometry::MultiPoint {
            coordinates: project_line(projection, coordinates),
        },
        GeoJsonGeometry::LineString { coordinates } => {
            let line = project_line(projection, coordinates);
            if line.len() < 2 {
                return None;
            }
            GeoJsonGeometry::LineString { coordinates: line }
        }
        GeoJsonGeometry::MultiLineString { coordinates } => GeoJsonGeometry::MultiLineString {
            coordinates: coordinates
                .iter()
                .map(|line| project_line(projection, line))
                .filter(|line| line.len() >= 2)
                .collect(),
        },
        GeoJsonGeometry::Polygon { coordinates } => GeoJsonGeometry::Polygon {
            coordinates: project_polygon(projection, coordinates)?,
        },
        GeoJsonGeometry::MultiPolygon { coordinates } => GeoJsonGeometry::MultiPolygon {
            coordinates: coordinates
                .iter()
                .filter_map(|polygon| project_polygon(projection, polygon))
                .collect(),
        },
        GeoJsonGeometry::GeometryCollection { geometries } => {
            GeoJsonGeometry::GeometryCollection {
                geometries: geometries
                    .iter()
                    .filter_map(|g| project_geometry(projection, g))
                    .collect(),
            }
        }
    };

    (projected.position_count() > 0).then_some(projected)
}

/// Projects a feature, keeping its id and properties
pub fn project_feature(projection: &dyn Projection, feature: &GeoJsonFeature) -> GeoJsonFeature {
    let geometry = feature
        .geometry
        .as_ref()
        .and_then(|g| project_geometry(projection, g));
    feature.with_geometry(geometry)
}

/// Projects a list of features
pub fn project_features(
    projection: &dyn Projection,
    features: &[GeoJsonFeature],
) -> Vec<GeoJsonFeature> {
    features
        .iter()
        .map(|f| project_feature(projection, f))
        .collect()
}
