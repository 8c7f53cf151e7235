//! Map projections behind one interface
//!
//! Standard world projections (Mercator, Equal Earth, Natural Earth) follow the
//! d3-geo conventions for `scale` (pixels per radian), `center` and `translate`.
//! The IxMaps projection wraps the linear IxMaps canvas transform and is built
//! through its own constructor, see [`factory::create_ixmaps_projection`].

pub mod factory;
pub mod ixmaps;
pub mod raw;
pub mod transform;

use crate::core::geo::{LatLng, Point};
use crate::MapError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectionType {
    Mercator,
    Globe,
    EqualEarth,
    NaturalEarth,
    #[serde(rename = "ixmaps")]
    IxMaps,
}

impl ProjectionType {
    pub const ALL: [ProjectionType; 5] = [
        ProjectionType::Mercator,
        ProjectionType::Globe,
        ProjectionType::EqualEarth,
        ProjectionType::NaturalEarth,
        ProjectionType::IxMaps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionType::Mercator => "mercator",
            ProjectionType::Globe => "globe",
            ProjectionType::EqualEarth => "equalEarth",
            ProjectionType::NaturalEarth => "naturalEarth",
            ProjectionType::IxMaps => "ixmaps",
        }
    }

    /// Whether the projection can be expressed as a flat forward/inverse pair
    pub fn is_flat(&self) -> bool {
        !matches!(self, ProjectionType::Globe)
    }
}

impl fmt::Display for ProjectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectionType {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectionType::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| MapError::UnsupportedProjection(format!("unknown projection '{}'", s)))
    }
}

/// Uniform construction options shared by every projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionOptions {
    pub width: f64,
    pub height: f64,
    /// Pixels per radian; defaults to the recommended fit for the viewport
    #[serde(default)]
    pub scale: Option<f64>,
    /// Geographic point shown at `translate`
    #[serde(default)]
    pub center: Option<LatLng>,
    /// Pixel position of `center`; defaults to the viewport midpoint
    #[serde(default)]
    pub translate: Option<Point>,
}

impl ProjectionOptions {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scale: None,
            center: None,
            translate: None,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_center(mut self, center: LatLng) -> Self {
        self.center = Some(center);
        self
    }

    pub fn with_translate(mut self, translate: Point) -> Self {
        self.translate = Some(translate);
        self
    }
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self::new(960.0, 500.0)
    }
}

/// A configured flat projection
pub trait Projection: Send + Sync {
    fn projection_type(&self) -> ProjectionType;

    /// Geographic coordinate to pixel; `None` when the point has no image
    fn project(&self, lat_lng: LatLng) -> Option<Point>;

    /// Pixel to geographic coordinate; `None` outside the projection's domain
    fn invert(&self, point: Point) -> Option<LatLng>;

    fn scale(&self) -> f64;
    fn set_scale(&mut self, scale: f64);

    fn center(&self) -> LatLng;
    fn set_center(&mut self, center: LatLng);

    fn translate(&self) -> Point;
    fn set_translate(&mut self, translate: Point);
}
