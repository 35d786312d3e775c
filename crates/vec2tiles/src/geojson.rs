//! GeoJSON-backed geometry source.
//!
//! Features are parsed once at startup: geometry is converted from
//! lon/lat degrees into the working frame (ECEF or spherical Mercator
//! depending on the srid), while the degree-space centroid is kept for
//! tile membership tests. Features with unsupported geometry kinds or
//! unparsable colors are skipped with a warning.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use glam::DVec3;
use log::warn;
use serde_json::Value;

use tilemesh::{
    AttributeTable, AttributeValue, Geometry, GeometryRecord, Polygon, ShaderColors,
};
use tiletree::{
    geodetic_to_ecef, wgs84_to_spherical_mercator, BoundingBox, FeatureSet, GeometrySource,
    TreeError, SRID_ECEF,
};

#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    /// Property names copied into the per-feature attribute table.
    pub attribute_columns: Vec<String>,
    /// Property holding hex colors: one string per sub-geometry, or an
    /// array sized to the sub-geometry (or triangle) count.
    pub color_column: Option<String>,
    /// Property holding the tube radius for line features, meters.
    pub radius_column: Option<String>,
    /// Property holding the detail level of a feature.
    pub lod_column: Option<String>,
    pub srid: i32,
}

#[derive(Debug, serde::Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, serde::Deserialize)]
struct Feature {
    geometry: GeoJsonGeometry,
    #[serde(default)]
    properties: serde_json::Map<String, Value>,
}

#[derive(Debug, serde::Deserialize)]
struct GeoJsonGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Value,
}

struct SourceFeature {
    /// Geometry in the working frame, ready for triangulation.
    geometry: Geometry,
    /// Degree-space centroid, used for tile membership.
    centroid: (f64, f64),
    lod: Option<i64>,
    shader: Option<ShaderColors>,
    radius: Option<f64>,
    attributes: BTreeMap<String, AttributeValue>,
}

pub struct FileSource {
    features: Vec<SourceFeature>,
    extent_deg: Option<BoundingBox>,
    height_range: (f64, f64),
}

impl FileSource {
    pub fn open(path: &Path, opts: &SourceOptions) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("cannot open input {}", path.display()))?;
        let collection: FeatureCollection = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("{} is not a GeoJSON FeatureCollection", path.display()))?;
        Self::from_collection(collection, opts)
    }

    pub fn from_json(value: Value, opts: &SourceOptions) -> Result<Self> {
        let collection: FeatureCollection = serde_json::from_value(value)
            .context("not a GeoJSON FeatureCollection")?;
        Self::from_collection(collection, opts)
    }

    fn from_collection(collection: FeatureCollection, opts: &SourceOptions) -> Result<Self> {
        let mut features = Vec::with_capacity(collection.features.len());
        let mut extent: Option<BoundingBox> = None;
        let mut h_min = f64::INFINITY;
        let mut h_max = f64::NEG_INFINITY;

        for (idx, feature) in collection.features.into_iter().enumerate() {
            let Some(geometry_deg) = parse_geometry(&feature.geometry) else {
                warn!(
                    "feature {idx}: unsupported geometry type {:?}, skipped",
                    feature.geometry.kind
                );
                continue;
            };

            let shader = match shader_for(
                opts.color_column
                    .as_ref()
                    .and_then(|c| feature.properties.get(c)),
                &geometry_deg,
            ) {
                Ok(shader) => shader,
                Err(err) => {
                    warn!("feature {idx}: {err}, skipped");
                    continue;
                }
            };

            let mut attributes = BTreeMap::new();
            for column in &opts.attribute_columns {
                let value = feature.properties.get(column);
                let Some(converted) = value.and_then(attribute_value) else {
                    bail!("feature {idx}: attribute column {column:?} is missing or unsupported");
                };
                attributes.insert(column.clone(), converted);
            }

            let (bbox, heights) = degree_bounds(&geometry_deg);
            extent = Some(match extent {
                Some(e) => e.union(&bbox),
                None => bbox,
            });
            h_min = h_min.min(heights.0);
            h_max = h_max.max(heights.1);

            features.push(SourceFeature {
                centroid: bbox.center(),
                lod: opts
                    .lod_column
                    .as_ref()
                    .and_then(|c| feature.properties.get(c))
                    .and_then(Value::as_i64),
                shader,
                radius: opts
                    .radius_column
                    .as_ref()
                    .and_then(|c| feature.properties.get(c))
                    .and_then(Value::as_f64),
                geometry: map_points(&geometry_deg, |p| to_working_frame(p, opts.srid)),
                attributes,
            });
        }

        Ok(Self {
            features,
            extent_deg: extent,
            height_range: if h_min <= h_max { (h_min, h_max) } else { (0.0, 0.0) },
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Dataset extent in degrees, padded so the half-open tile membership
    /// test keeps features sitting exactly on the maximum edge.
    pub fn extent(&self) -> Option<BoundingBox> {
        const PAD: f64 = 1e-9;
        self.extent_deg
            .map(|e| BoundingBox::new(e.x_min, e.y_min, e.x_max + PAD, e.y_max + PAD))
    }

    pub fn height_range(&self) -> (f64, f64) {
        self.height_range
    }

    /// Distinct detail levels present in the dataset, ascending.
    pub fn lod_levels(&self) -> Vec<i64> {
        let mut levels: Vec<i64> = self.features.iter().filter_map(|f| f.lod).collect();
        levels.sort_unstable();
        levels.dedup();
        levels
    }

    fn matching<'a>(
        &'a self,
        bbox: &'a BoundingBox,
        lod: Option<i64>,
    ) -> impl Iterator<Item = &'a SourceFeature> + 'a {
        self.features.iter().filter(move |f| {
            let (cx, cy) = f.centroid;
            let inside =
                cx >= bbox.x_min && cx < bbox.x_max && cy >= bbox.y_min && cy < bbox.y_max;
            inside && lod.map_or(true, |l| f.lod == Some(l))
        })
    }
}

impl GeometrySource for FileSource {
    fn feature_count(&self, bbox: &BoundingBox, lod: Option<i64>) -> Result<u64, TreeError> {
        Ok(self.matching(bbox, lod).count() as u64)
    }

    fn load_features(&self, bbox: &BoundingBox, lod: Option<i64>) -> Result<FeatureSet, TreeError> {
        let selected: Vec<&SourceFeature> = self.matching(bbox, lod).collect();

        let mut attributes = AttributeTable::default();
        if let Some(first) = selected.first() {
            for column in first.attributes.keys() {
                let values = selected
                    .iter()
                    .map(|f| f.attributes[column].clone())
                    .collect();
                attributes.insert(column.clone(), values);
            }
        }

        let records = selected
            .iter()
            .enumerate()
            .map(|(i, f)| GeometryRecord {
                batch_id: i as u32,
                geometry: f.geometry.clone(),
                shader: f.shader.clone(),
                radius: f.radius,
            })
            .collect();

        Ok(FeatureSet { records, attributes })
    }
}

/// Lon/lat degrees (+ height) to the working frame: ECEF meters for the
/// earth-centered srid, spherical Mercator meters otherwise.
fn to_working_frame(p: DVec3, srid: i32) -> DVec3 {
    if srid == SRID_ECEF {
        geodetic_to_ecef(p.x, p.y, p.z)
    } else {
        let (x, y) = wgs84_to_spherical_mercator(p.x, p.y);
        DVec3::new(x, y, p.z)
    }
}

fn position(v: &Value) -> Option<DVec3> {
    let arr = v.as_array()?;
    let x = arr.first()?.as_f64()?;
    let y = arr.get(1)?.as_f64()?;
    let z = arr.get(2).and_then(Value::as_f64).unwrap_or(0.0);
    Some(DVec3::new(x, y, z))
}

fn line(v: &Value) -> Option<Vec<DVec3>> {
    v.as_array()?.iter().map(position).collect()
}

fn polygon(v: &Value) -> Option<Polygon> {
    let rings: Vec<Vec<DVec3>> = v.as_array()?.iter().map(line).collect::<Option<_>>()?;
    let mut rings = rings.into_iter();
    Some(Polygon::with_holes(rings.next()?, rings.collect()))
}

fn parse_geometry(geometry: &GeoJsonGeometry) -> Option<Geometry> {
    let c = &geometry.coordinates;
    match geometry.kind.as_str() {
        "Polygon" => Some(Geometry::Polygon(polygon(c)?)),
        "MultiPolygon" => Some(Geometry::MultiPolygon(
            c.as_array()?.iter().map(polygon).collect::<Option<_>>()?,
        )),
        "LineString" => Some(Geometry::LineString(line(c)?)),
        "MultiLineString" => Some(Geometry::MultiLineString(
            c.as_array()?.iter().map(line).collect::<Option<_>>()?,
        )),
        _ => None,
    }
}

fn shader_for(value: Option<&Value>, geometry: &Geometry) -> Result<Option<ShaderColors>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value {
        Value::String(color) if geometry.is_multi() => {
            let repeated = vec![color.clone(); geometry.sub_count()];
            Ok(Some(ShaderColors::from_base_hex(&repeated)?))
        }
        Value::String(_) => {
            // A single color cannot be sized to the triangle count of a
            // simple geometry ahead of triangulation.
            warn!("single color on a non-multi geometry, ignored");
            Ok(None)
        }
        Value::Array(items) => {
            let colors: Vec<String> = items
                .iter()
                .map(|v| v.as_str().map(str::to_owned))
                .collect::<Option<_>>()
                .context("color array must contain strings")?;
            Ok(Some(ShaderColors::from_base_hex(&colors)?))
        }
        other => bail!("unsupported color value: {other}"),
    }
}

fn attribute_value(value: &Value) -> Option<AttributeValue> {
    match value {
        Value::Bool(b) => Some(AttributeValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(AttributeValue::I64(i))
            } else {
                n.as_f64().map(AttributeValue::F64)
            }
        }
        Value::String(s) => Some(AttributeValue::String(s.clone())),
        Value::Array(items) => {
            if items.iter().all(Value::is_number) {
                Some(AttributeValue::DoubleList(
                    items.iter().filter_map(Value::as_f64).collect(),
                ))
            } else if items.iter().all(Value::is_string) {
                Some(AttributeValue::StringList(
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_owned))
                        .collect(),
                ))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Extent of the degree-space geometry plus its height range.
fn degree_bounds(geometry: &Geometry) -> (BoundingBox, (f64, f64)) {
    let mut bbox = BoundingBox::new(
        f64::INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NEG_INFINITY,
    );
    let mut h_min = f64::INFINITY;
    let mut h_max = f64::NEG_INFINITY;

    let mut visit = |p: &DVec3| {
        bbox.x_min = bbox.x_min.min(p.x);
        bbox.y_min = bbox.y_min.min(p.y);
        bbox.x_max = bbox.x_max.max(p.x);
        bbox.y_max = bbox.y_max.max(p.y);
        h_min = h_min.min(p.z);
        h_max = h_max.max(p.z);
    };

    for_each_point(geometry, &mut visit);
    (bbox, (h_min, h_max))
}

fn for_each_point(geometry: &Geometry, f: &mut impl FnMut(&DVec3)) {
    let poly_points = |poly: &Polygon, f: &mut dyn FnMut(&DVec3)| {
        poly.exterior.iter().for_each(&mut *f);
        for ring in &poly.interiors {
            ring.iter().for_each(&mut *f);
        }
    };
    match geometry {
        Geometry::Polygon(poly) => poly_points(poly, f),
        Geometry::MultiPolygon(polys) | Geometry::PolyhedralSurface(polys) => {
            polys.iter().for_each(|p| poly_points(p, &mut *f))
        }
        Geometry::LineString(points) => points.iter().for_each(f),
        Geometry::MultiLineString(lines) => {
            lines.iter().for_each(|l| l.iter().for_each(&mut *f))
        }
    }
}

fn map_points(geometry: &Geometry, f: impl Fn(DVec3) -> DVec3 + Copy) -> Geometry {
    let map_ring = |ring: &[DVec3]| ring.iter().map(|&p| f(p)).collect::<Vec<_>>();
    let map_poly = |poly: &Polygon| Polygon {
        exterior: map_ring(&poly.exterior),
        interiors: poly.interiors.iter().map(|r| map_ring(r)).collect(),
    };
    match geometry {
        Geometry::Polygon(poly) => Geometry::Polygon(map_poly(poly)),
        Geometry::MultiPolygon(polys) => {
            Geometry::MultiPolygon(polys.iter().map(map_poly).collect())
        }
        Geometry::PolyhedralSurface(polys) => {
            Geometry::PolyhedralSurface(polys.iter().map(map_poly).collect())
        }
        Geometry::LineString(points) => Geometry::LineString(map_ring(points)),
        Geometry::MultiLineString(lines) => {
            Geometry::MultiLineString(lines.iter().map(|l| map_ring(l)).collect())
        }
    }
}
