use crate::core::constants::IXEARTH_SCALE_FACTOR;
use crate::core::geo::LatLng;
use crate::data::geojson::Position;
use crate::{MapError, Result};
use geo::{ChamberlainDuquetteArea, HaversineDistance};
use geo_types::{LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

/// Great-circle distance and spherical area, rescaled to IxEarth.
///
/// Distances are haversine on the mean Earth radius; areas use the
/// Chamberlain-Duquette spherical formula on the equatorial radius.
/// Positions are GeoJSON order, `[lng, lat]`. Results are kilometers and
/// square kilometers of the fictional world: Earth values multiplied by
/// `scale_factor` (and its square for areas).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodesicMeasure {
    pub scale_factor: f64,
}

impl GeodesicMeasure {
    pub fn new(scale_factor: f64) -> Self {
        Self { scale_factor }
    }

    /// Distance between two positions in kilometers
    pub fn try_distance(&self, from: Position, to: Position) -> Result<f64> {
        let from = validated(from)?;
        let to = validated(to)?;
        let meters = from.haversine_distance(&to);
        finite(meters / 1000.0 * self.scale_factor, "distance")
    }

    /// Like [`Self::try_distance`] but logs and yields 0 on failure.
    ///
    /// A 0 here can mean "unknown"; callers that need to tell the two apart
    /// use `try_distance`.
    pub fn distance(&self, from: Position, to: Position) -> f64 {
        self.try_distance(from, to).unwrap_or_else(|e| {
            log::warn!("distance calculation failed: {}", e);
            0.0
        })
    }

    /// Sum of consecutive segment distances; 0 for fewer than two positions
    pub fn try_polyline_distance(&self, positions: &[Position]) -> Result<f64> {
        positions
            .windows(2)
            .map(|pair| self.try_distance(pair[0], pair[1]))
            .sum()
    }

    pub fn polyline_distance(&self, positions: &[Position]) -> f64 {
        self.try_polyline_distance(positions).unwrap_or_else(|e| {
            log::warn!("polyline distance calculation failed: {}", e);
            0.0
        })
    }

    /// Area of the ring in square kilometers; an open ring is closed first
    pub fn try_polygon_area(&self, ring: &[Position]) -> Result<f64> {
        let Some(polygon) = polygon(ring)? else {
            return Ok(0.0);
        };
        let square_meters = polygon.chamberlain_duquette_unsigned_area();
        finite(
            square_meters / 1_000_000.0 * self.scale_factor * self.scale_factor,
            "area",
        )
    }

    pub fn polygon_area(&self, ring: &[Position]) -> f64 {
        self.try_polygon_area(ring).unwrap_or_else(|e| {
            log::warn!("area calculation failed: {}", e);
            0.0
        })
    }

    /// Perimeter of the closed ring in kilometers
    pub fn try_polygon_perimeter(&self, ring: &[Position]) -> Result<f64> {
        let Some(polygon) = polygon(ring)? else {
            return Ok(0.0);
        };
        let meters: f64 = polygon
            .exterior()
            .lines()
            .map(|line| Point::from(line.start).haversine_distance(&Point::from(line.end)))
            .sum();
        finite(meters / 1000.0 * self.scale_factor, "perimeter")
    }

    pub fn polygon_perimeter(&self, ring: &[Position]) -> f64 {
        self.try_polygon_perimeter(ring).unwrap_or_else(|e| {
            log::warn!("perimeter calculation failed: {}", e);
            0.0
        })
    }
}

impl Default for GeodesicMeasure {
    fn default() -> Self {
        Self::new(IXEARTH_SCALE_FACTOR)
    }
}

fn validated(position: Position) -> Result<Point<f64>> {
    let lat_lng = LatLng::from_position(position);
    if !(lat_lng.lat.is_finite() && lat_lng.lng.is_finite()) || !lat_lng.is_valid() {
        return Err(MapError::InvalidCoordinates(format!(
            "[{}, {}] is not a valid [lng, lat] position",
            position[0], position[1]
        )));
    }
    Ok(Point::new(lat_lng.lng, lat_lng.lat))
}

fn finite(value: f64, what: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MapError::InvalidCoordinates(format!("{} is not finite", what)))
    }
}

/// Closed polygon for the ring, or `None` with fewer than three distinct positions
fn polygon(ring: &[Position]) -> Result<Option<Polygon<f64>>> {
    let mut points = ring
        .iter()
        .map(|p| validated(*p).map(|p| (p.x(), p.y())))
        .collect::<Result<Vec<_>>>()?;

    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    let mut distinct = points.clone();
    distinct.dedup();
    if distinct.len() < 3 {
        return Ok(None);
    }

    if let Some(first) = points.first().copied() {
        points.push(first);
    }
    Ok(Some(Polygon::new(LineString::from(points), vec![])))
}

/// Distance in IxEarth kilometers between two `[lng, lat]` positions
pub fn calculate_distance_from_lng_lat(from: Position, to: Position) -> f64 {
    GeodesicMeasure::default().distance(from, to)
}

/// Length in IxEarth kilometers of a polyline
pub fn calculate_polyline_distance(positions: &[Position]) -> f64 {
    GeodesicMeasure::default().polyline_distance(positions)
}

/// Area in IxEarth square kilometers of a ring
pub fn calculate_polygon_area(ring: &[Position]) -> f64 {
    GeodesicMeasure::default().polygon_area(ring)
}
