use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// A GeoJSON position, `[lng, lat]` or projected `[x, y]`
pub type Position = [f64; 2];

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: Position,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

impl GeoJsonGeometry {
    /// GeoJSON type name of this geometry
    pub fn type_name(&self) -> &'static str {
        match self {
            GeoJsonGeometry::Point { .. } => "Point",
            GeoJsonGeometry::LineString { .. } => "LineString",
            GeoJsonGeometry::Polygon { .. } => "Polygon",
            GeoJsonGeometry::MultiPoint { .. } => "MultiPoint",
            GeoJsonGeometry::MultiLineString { .. } => "MultiLineString",
            GeoJsonGeometry::MultiPolygon { .. } => "MultiPolygon",
            GeoJsonGeometry::GeometryCollection { .. } => "GeometryCollection",
        }
    }

    /// Visits every position of the geometry, depth first
    pub fn for_each_position<F: FnMut(&Position)>(&self, f: &mut F) {
        match self {
            GeoJsonGeometry::Point { coordinates } => f(coordinates),
            GeoJsonGeometry::LineString { coordinates }
            | GeoJsonGeometry::MultiPoint { coordinates } => coordinates.iter().for_each(f),
            GeoJsonGeometry::Polygon { coordinates }
            | GeoJsonGeometry::MultiLineString { coordinates } => {
                coordinates.iter().flatten().for_each(f)
            }
            GeoJsonGeometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().for_each(f)
            }
            GeoJsonGeometry::GeometryCollection { geometries } => {
                for geometry in geometries {
                    geometry.for_each_position(&mut *f);
                }
            }
        }
    }

    /// Number of positions in the geometry
    pub fn position_count(&self) -> usize {
        let mut count = 0;
        self.for_each_position(&mut |_| count += 1);
        count
    }

    /// Longitude (x) range as `(min, max)`; `None` for empty geometries
    pub fn x_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        self.for_each_position(&mut |p| {
            range = Some(match range {
                Some((min, max)) => (min.min(p[0]), max.max(p[0])),
                None => (p[0], p[0]),
            });
        });
        range
    }
}

/// Marker for the `"type": "Feature"` member
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
enum FeatureTag {
    #[default]
    Feature,
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(rename = "type", default)]
    tag: FeatureTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<HashMap<String, serde_json::Value>>,
}

impl GeoJsonFeature {
    pub fn new(geometry: GeoJsonGeometry) -> Self {
        Self {
            tag: FeatureTag::Feature,
            id: None,
            geometry: Some(geometry),
            properties: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<serde_json::Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn set_property(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.properties
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.into());
    }

    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.as_ref()?.get(key)
    }

    /// Same feature carrying a different geometry
    pub fn with_geometry(&self, geometry: Option<GeoJsonGeometry>) -> Self {
        Self {
            tag: FeatureTag::Feature,
            id: self.id.clone(),
            geometry,
            properties: self.properties.clone(),
        }
    }
}

/// Root GeoJSON object
#[derive(Debug, Clone, PartialEq)]
pub enum GeoJson {
    Feature(GeoJsonFeature),
    FeatureCollection { features: Vec<GeoJsonFeature> },
    Geometry(GeoJsonGeometry),
}

impl GeoJson {
    /// Parses a GeoJSON document
    pub fn from_str(geojson_str: &str) -> crate::Result<Self> {
        serde_json::from_str(geojson_str)
            .map_err(|e| crate::Error::ParseError(format!("Invalid GeoJSON: {}", e)))
    }

    pub fn to_string(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Flattens the document into its features; a bare geometry becomes a
    /// property-less feature
    pub fn into_features(self) -> Vec<GeoJsonFeature> {
        match self {
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::FeatureCollection { features } => features,
            GeoJson::Geometry(geometry) => vec![GeoJsonFeature::new(geometry)],
        }
    }
}

impl Serialize for GeoJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GeoJson::Feature(feature) => feature.serialize(serializer),
            GeoJson::Geometry(geometry) => geometry.serialize(serializer),
            GeoJson::FeatureCollection { features } => {
                let mut state = serializer.serialize_struct("FeatureCollection", 2)?;
                state.serialize_field("type", "FeatureCollection")?;
                state.serialize_field("features", features)?;
                state.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for GeoJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Collection {
            features: Vec<GeoJsonFeature>,
        }

        let value = serde_json::Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| D::Error::custom("missing GeoJSON \"type\" member"))?;

        match kind {
            "FeatureCollection" => serde_json::from_value::<Collection>(value)
                .map(|c| GeoJson::FeatureCollection {
                    features: c.features,
                })
                .map_err(D::Error::custom),
            "Feature" => serde_json::from_value(value)
                .map(GeoJson::Feature)
                .map_err(D::Error::custom),
            _ => serde_json::from_value(value)
                .map(GeoJson::Geometry)
                .map_err(D::Error::custom),
        }
    }
}

/// Normalised list of features, accepted wherever callers may hand over
/// either a raw feature list or a GeoJSON document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet(pub Vec<GeoJsonFeature>);

impl FeatureSet {
    pub fn into_inner(self) -> Vec<GeoJsonFeature> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<GeoJsonFeature>> for FeatureSet {
    fn from(features: Vec<GeoJsonFeature>) -> Self {
        Self(features)
    }
}

impl From<&[GeoJsonFeature]> for FeatureSet {
    fn from(features: &[GeoJsonFeature]) -> Self {
        Self(features.to_vec())
    }
}

impl From<GeoJsonFeature> for FeatureSet {
    fn from(feature: GeoJsonFeature) -> Self {
        Self(vec![feature])
    }
}

impl From<GeoJson> for FeatureSet {
    fn from(geojson: GeoJson) -> Self {
        Self(geojson.into_features())
    }
}
