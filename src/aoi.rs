//! Area-of-interest loading and reduction to a single WKT bounding rectangle.
//!
//! The catalogue receives the area of interest inside a URL query string, so
//! whatever the GeoJSON holds is collapsed to the envelope of the union of all
//! its geometries. Coordinates are taken as WGS84 longitude/latitude and are
//! never reprojected.
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

type Position = Vec<f64>;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    fn positions(&self) -> Vec<&Position> {
        match self {
            Self::Point { coordinates } => vec![coordinates],
            Self::MultiPoint { coordinates } | Self::LineString { coordinates } => {
                coordinates.iter().collect()
            }
            Self::MultiLineString { coordinates } | Self::Polygon { coordinates } => {
                coordinates.iter().flatten().collect()
            }
            Self::MultiPolygon { coordinates } => coordinates.iter().flatten().flatten().collect(),
            Self::GeometryCollection { geometries } => {
                geometries.iter().flat_map(|g| g.positions()).collect()
            }
        }
    }
}

#[derive(Deserialize, Debug)]
struct Feature {
    geometry: Option<Geometry>,
}

#[derive(Deserialize, Debug)]
struct FeatureCollection {
    features: Vec<Feature>,
}

/// Minimal axis-aligned rectangle in longitude/latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    fn from_position(position: &Position) -> Result<Self> {
        let (x, y) = match position.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => (*x, *y),
            _ => {
                return Err(Error::MalformedInput(format!(
                    "invalid position {position:?}"
                )))
            }
        };
        Ok(Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        })
    }

    fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Closed five-vertex ring starting at the min corner.
    pub fn ring(&self) -> [(f64, f64); 5] {
        [
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
            (self.min_x, self.min_y),
        ]
    }

    /// WKT polygon with no space after the `POLYGON` keyword; the catalogue's
    /// parser rejects `POLYGON ((`.
    pub fn to_wkt(&self) -> String {
        let vertices = self
            .ring()
            .iter()
            .map(|(x, y)| format!("{x} {y}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("POLYGON(({vertices}))")
    }
}

#[derive(Debug, Clone)]
pub struct AreaOfInterest {
    geometries: Vec<Geometry>,
}

impl AreaOfInterest {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::MalformedInput(format!("unable to read {}: {e}", path.display()))
        })?;
        Self::from_geojson(&content)
    }

    pub fn from_geojson(content: &str) -> Result<Self> {
        let doc: Value =
            serde_json::from_str(content).map_err(|e| Error::MalformedInput(e.to_string()))?;

        let geometries = match doc.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => {
                let collection: FeatureCollection = from_value(doc)?;
                collection
                    .features
                    .into_iter()
                    .filter_map(|f| f.geometry)
                    .collect()
            }
            Some("Feature") => {
                let feature: Feature = from_value(doc)?;
                feature.geometry.into_iter().collect()
            }
            Some(_) => vec![from_value::<Geometry>(doc)?],
            None => {
                return Err(Error::MalformedInput(
                    "missing 'type' member at top level".to_string(),
                ))
            }
        };

        Ok(Self { geometries })
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Envelope of the union of every geometry.
    ///
    /// The envelope of a union is the envelope of all member coordinates, so
    /// this never needs to build the union itself.
    pub fn envelope(&self) -> Result<BoundingBox> {
        let mut envelope: Option<BoundingBox> = None;
        for position in self.geometries.iter().flat_map(Geometry::positions) {
            let bbox = BoundingBox::from_position(position)?;
            envelope = Some(match envelope {
                Some(acc) => acc.union(bbox),
                None => bbox,
            });
        }
        envelope.ok_or_else(|| Error::MalformedInput("no coordinates found".to_string()))
    }
}

fn from_value<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::MalformedInput(e.to_string()))
}

/// Reads a GeoJSON file and returns its bounding rectangle as WKT.
pub fn load_aoi_wkt<P: AsRef<Path>>(path: P) -> Result<String> {
    let aoi = AreaOfInterest::read(path)?;
    Ok(aoi.envelope()?.to_wkt())
}
