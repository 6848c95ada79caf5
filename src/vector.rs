//! Vector layer handling: GeoJSON features, containment tests and CRS
//!
//! Region and municipality boundaries arrive as GeoJSON FeatureCollections:
//! an ordered list of features, each a Point/Polygon/MultiPolygon geometry
//! plus a property map. The legacy `crs` member is honored; a layer without
//! one is WGS84 per the GeoJSON spec. Web Mercator layers can be
//! reprojected to WGS84 (and back) with the spherical-mercator transform;
//! any other CRS is rejected.

use crate::errors::{ClimaPrepError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::path::Path;

/// Spherical earth radius used by Web Mercator (EPSG:3857), in meters
const MERCATOR_RADIUS: f64 = 6_378_137.0;

/// Coordinate reference systems this crate can transform between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    /// Geographic lon/lat on WGS84 (EPSG:4326, OGC:CRS84)
    Wgs84,
    /// Spherical Web Mercator (EPSG:3857)
    WebMercator,
}

impl Crs {
    /// Parse a CRS identifier. Accepts the usual aliases for WGS84 and
    /// Web Mercator; anything else is `UnsupportedCrs`.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_uppercase().as_str() {
            "EPSG:4326" | "OGC:CRS84" | "CRS84" | "WGS84" | "URN:OGC:DEF:CRS:OGC:1.3:CRS84"
            | "URN:OGC:DEF:CRS:EPSG::4326" => Ok(Crs::Wgs84),
            "EPSG:3857" | "EPSG:900913" | "URN:OGC:DEF:CRS:EPSG::3857" => Ok(Crs::WebMercator),
            other => Err(ClimaPrepError::UnsupportedCrs {
                crs: other.to_string(),
            }),
        }
    }
}

/// A GeoJSON FeatureCollection as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection")
    #[serde(rename = "type")]
    pub type_: String,

    /// Legacy named-CRS member; absent means WGS84
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crs: Option<NamedCrs>,

    /// Features in file order
    pub features: Vec<Feature>,
}

/// The legacy GeoJSON `crs` member: `{"type": "name", "properties": {"name": ...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedCrs {
    #[serde(rename = "type")]
    pub type_: String,
    pub properties: NamedCrsProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedCrsProperties {
    pub name: String,
}

/// A single vector record: geometry plus attribute columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    /// Type identifier (always "Feature")
    #[serde(rename = "type")]
    pub type_: String,

    pub geometry: Geometry,

    /// Attribute columns (region names, municipality names, ...)
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
}

impl Feature {
    /// Read a named attribute as a string. Numeric attribute values are
    /// formatted; missing or non-scalar values are an error because the
    /// callers use these as display labels.
    pub fn property_string(&self, name: &str) -> Result<String> {
        match self.properties.get(name) {
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
            Some(other) => Err(ClimaPrepError::VectorLayer(format!(
                "attribute '{}' is not a scalar: {}",
                name, other
            ))),
            None => Err(ClimaPrepError::VectorLayer(format!(
                "attribute '{}' missing from feature",
                name
            ))),
        }
    }
}

/// Geometry types a layer record may carry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A point, [longitude, latitude]
    Point { coordinates: [f64; 2] },

    /// A polygon: exterior ring first, then holes
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },

    /// Several polygons
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl Geometry {
    /// Even-odd containment test at a point.
    ///
    /// Ray casting per ring; crossing a hole ring flips the state back out,
    /// so holes are honored. Points never contain anything.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        match self {
            Geometry::Point { .. } => false,
            Geometry::Polygon { coordinates } => polygon_contains(coordinates, lon, lat),
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .any(|poly| polygon_contains(poly, lon, lat)),
        }
    }

    /// Centroid of the geometry: the point itself for points, the signed-
    /// area centroid of the exterior ring(s) for polygons, falling back to
    /// the vertex average for degenerate rings.
    pub fn centroid(&self) -> (f64, f64) {
        match self {
            Geometry::Point { coordinates } => (coordinates[0], coordinates[1]),
            Geometry::Polygon { coordinates } => ring_centroid(&coordinates[0]),
            Geometry::MultiPolygon { coordinates } => {
                // Area-weighted centroid over the exterior rings
                let mut total_area = 0.0;
                let mut cx = 0.0;
                let mut cy = 0.0;
                for poly in coordinates {
                    let area = ring_area(&poly[0]).abs();
                    let (x, y) = ring_centroid(&poly[0]);
                    total_area += area;
                    cx += x * area;
                    cy += y * area;
                }
                if total_area > 0.0 {
                    (cx / total_area, cy / total_area)
                } else {
                    (0.0, 0.0)
                }
            }
        }
    }

    fn map_coords(&mut self, f: impl Fn(f64, f64) -> (f64, f64) + Copy) {
        match self {
            Geometry::Point { coordinates } => {
                let (x, y) = f(coordinates[0], coordinates[1]);
                coordinates[0] = x;
                coordinates[1] = y;
            }
            Geometry::Polygon { coordinates } => {
                for ring in coordinates {
                    for c in ring {
                        let (x, y) = f(c[0], c[1]);
                        c[0] = x;
                        c[1] = y;
                    }
                }
            }
            Geometry::MultiPolygon { coordinates } => {
                for poly in coordinates {
                    for ring in poly {
                        for c in ring {
                            let (x, y) = f(c[0], c[1]);
                            c[0] = x;
                            c[1] = y;
                        }
                    }
                }
            }
        }
    }
}

/// A vector layer loaded into memory with a resolved CRS
#[derive(Debug, Clone)]
pub struct VectorLayer {
    pub features: Vec<Feature>,
    pub crs: Crs,
}

impl VectorLayer {
    /// Read a GeoJSON FeatureCollection from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let collection: FeatureCollection = serde_json::from_str(&text)?;
        if collection.type_ != "FeatureCollection" {
            return Err(ClimaPrepError::VectorLayer(format!(
                "expected a FeatureCollection, got '{}'",
                collection.type_
            )));
        }
        let crs = match &collection.crs {
            Some(named) => Crs::parse(&named.properties.name)?,
            None => Crs::Wgs84,
        };
        Ok(Self {
            features: collection.features,
            crs,
        })
    }

    /// Reproject the layer in place so its CRS matches `target`.
    ///
    /// A no-op when the CRS already matches.
    pub fn reproject_to(&mut self, target: Crs) {
        if self.crs == target {
            return;
        }
        let transform = match (self.crs, target) {
            (Crs::WebMercator, Crs::Wgs84) => mercator_to_wgs84,
            (Crs::Wgs84, Crs::WebMercator) => wgs84_to_mercator,
            _ => unreachable!("identical CRS handled above"),
        };
        for feature in &mut self.features {
            feature.geometry.map_coords(transform);
        }
        self.crs = target;
    }
}

/// Ray-casting point-in-ring test
fn ring_contains(ring: &[[f64; 2]], lon: f64, lat: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];

        if ((yi > lat) != (yj > lat)) && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Inside the exterior ring and outside every hole
fn polygon_contains(rings: &[Vec<[f64; 2]>], lon: f64, lat: f64) -> bool {
    let mut inside = false;
    for ring in rings {
        if ring_contains(ring, lon, lat) {
            inside = !inside;
        }
    }
    inside
}

/// Signed shoelace area of a ring
fn ring_area(ring: &[[f64; 2]]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    let mut j = n - 1;
    for i in 0..n {
        area += ring[j][0] * ring[i][1] - ring[i][0] * ring[j][1];
        j = i;
    }
    area / 2.0
}

/// Signed-area centroid of a ring, vertex average when degenerate
fn ring_centroid(ring: &[[f64; 2]]) -> (f64, f64) {
    let area = ring_area(ring);
    if area.abs() < f64::EPSILON {
        let n = ring.len().max(1) as f64;
        let (sx, sy) = ring
            .iter()
            .fold((0.0, 0.0), |(sx, sy), c| (sx + c[0], sy + c[1]));
        return (sx / n, sy / n);
    }

    let n = ring.len();
    let mut cx = 0.0;
    let mut cy = 0.0;
    let mut j = n - 1;
    for i in 0..n {
        let cross = ring[j][0] * ring[i][1] - ring[i][0] * ring[j][1];
        cx += (ring[j][0] + ring[i][0]) * cross;
        cy += (ring[j][1] + ring[i][1]) * cross;
        j = i;
    }
    (cx / (6.0 * area), cy / (6.0 * area))
}

fn mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / MERCATOR_RADIUS).to_degrees();
    let lat = (2.0 * (y / MERCATOR_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

fn wgs84_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = MERCATOR_RADIUS * lon.to_radians();
    let y = MERCATOR_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Geometry {
        Geometry::Polygon {
            coordinates: vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]],
        }
    }

    #[test]
    fn polygon_containment() {
        let square = unit_square();
        assert!(square.contains(0.5, 0.5));
        assert!(!square.contains(1.5, 0.5));
        assert!(!square.contains(-0.1, 0.5));
    }

    #[test]
    fn holes_are_outside() {
        let donut = Geometry::Polygon {
            coordinates: vec![
                vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
                vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0], [1.0, 1.0]],
            ],
        };
        assert!(donut.contains(0.5, 0.5));
        assert!(!donut.contains(2.0, 2.0));
    }

    #[test]
    fn square_centroid() {
        let (x, y) = unit_square().centroid();
        assert!((x - 0.5).abs() < 1e-9);
        assert!((y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn point_centroid_is_itself() {
        let p = Geometry::Point {
            coordinates: [-87.2, 14.1],
        };
        assert_eq!(p.centroid(), (-87.2, 14.1));
    }

    #[test]
    fn crs_aliases() {
        assert_eq!(Crs::parse("EPSG:4326").unwrap(), Crs::Wgs84);
        assert_eq!(Crs::parse("epsg:4326").unwrap(), Crs::Wgs84);
        assert_eq!(Crs::parse("CRS84").unwrap(), Crs::Wgs84);
        assert_eq!(Crs::parse("EPSG:3857").unwrap(), Crs::WebMercator);
        assert!(Crs::parse("EPSG:32616").is_err());
    }

    #[test]
    fn mercator_round_trip() {
        let (x, y) = wgs84_to_mercator(-87.2, 14.1);
        let (lon, lat) = mercator_to_wgs84(x, y);
        assert!((lon - -87.2).abs() < 1e-9);
        assert!((lat - 14.1).abs() < 1e-9);
    }

    #[test]
    fn mercator_layer_reprojects_to_wgs84() {
        let (x0, y0) = wgs84_to_mercator(-88.0, 14.0);
        let (x1, y1) = wgs84_to_mercator(-86.0, 16.0);
        let mut layer = VectorLayer {
            features: vec![Feature {
                type_: "Feature".to_string(),
                geometry: Geometry::Polygon {
                    coordinates: vec![vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]],
                },
                properties: HashMap::new(),
            }],
            crs: Crs::WebMercator,
        };

        layer.reproject_to(Crs::Wgs84);
        assert_eq!(layer.crs, Crs::Wgs84);
        assert!(layer.features[0].geometry.contains(-87.0, 15.0));
        assert!(!layer.features[0].geometry.contains(-85.0, 15.0));
    }
}
