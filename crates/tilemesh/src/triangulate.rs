//! Geometry → triangle batches in tile-local coordinates.
//!
//! Polygons and surfaces go through planar ear clipping (holes are merged
//! into the outer ring via bridge edges first); lines are swept into tube
//! meshes. Rings of exactly 4 points are already triangles and skip
//! re-triangulation. Degenerate triangles are *not* filtered here, the
//! content encoder drops and counts them.

use glam::{DVec2, DVec3};

use crate::error::MeshError;
use crate::geometry::{Geometry, GeometryRecord, Polygon, Ring};
use crate::shader::ShaderColors;
use crate::triangle::Triangle;

/// Tube sweep parameters for line geometries.
#[derive(Debug, Clone, Copy)]
pub struct TubeParams {
    /// Tube radius in working units.
    pub radius: f64,
    /// Vertices per ring.
    pub radial_segments: usize,
    /// Rings along the resampled centerline.
    pub tubular_segments: usize,
}

impl Default for TubeParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            radial_segments: 8,
            tubular_segments: 64,
        }
    }
}

/// Explicit processing configuration instead of optional positional
/// arguments: translation is subtracted, scale (if any) applied after.
#[derive(Debug, Clone, Copy)]
pub struct ProcessorConfig {
    pub translation: DVec3,
    pub scale: Option<DVec3>,
    pub tube: TubeParams,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            translation: DVec3::ZERO,
            scale: None,
            tube: TubeParams::default(),
        }
    }
}

impl ProcessorConfig {
    #[inline]
    fn to_local(&self, p: DVec3) -> DVec3 {
        let shifted = p - self.translation;
        match self.scale {
            Some(s) => shifted * s,
            None => shifted,
        }
    }
}

/// Triangulate one feature. The per-feature radius overrides the
/// configured tube radius for line geometries.
///
/// When the record carries shader colors and the geometry is a multi
/// kind, the color table must match the sub-geometry count and colors
/// attach per sub-geometry, even for a multi of one. For simple
/// geometries the table must match the produced triangle count. Either
/// mismatch fails fast naming the channel.
pub fn triangles_for(record: &GeometryRecord, cfg: &ProcessorConfig) -> Result<Vec<Triangle>, MeshError> {
    let mut tube = cfg.tube;
    if let Some(r) = record.radius {
        tube.radius = r;
    }

    if let Some(shader) = &record.shader {
        if record.geometry.is_multi() {
            shader.validate(record.geometry.sub_count())?;
            return per_subgeometry(record, shader, cfg, tube);
        }
    }

    let raw = dispatch(&record.geometry, cfg, tube)?;

    if let Some(shader) = &record.shader {
        shader.validate(raw.len())?;
        let triangles = raw
            .into_iter()
            .enumerate()
            .map(|(i, (p0, p1, p2))| {
                Triangle::new(p0, p1, p2, record.batch_id).with_color(shader.color_at(i))
            })
            .collect();
        return Ok(triangles);
    }

    Ok(raw
        .into_iter()
        .map(|(p0, p1, p2)| Triangle::new(p0, p1, p2, record.batch_id))
        .collect())
}

fn per_subgeometry(
    record: &GeometryRecord,
    shader: &ShaderColors,
    cfg: &ProcessorConfig,
    tube: TubeParams,
) -> Result<Vec<Triangle>, MeshError> {
    let mut out = Vec::new();

    let mut push_sub = |i: usize, sub: Geometry| -> Result<(), MeshError> {
        let color = shader.color_at(i);
        for (p0, p1, p2) in dispatch(&sub, cfg, tube)? {
            out.push(Triangle::new(p0, p1, p2, record.batch_id).with_color(color));
        }
        Ok(())
    };

    match &record.geometry {
        Geometry::MultiPolygon(polys) | Geometry::PolyhedralSurface(polys) => {
            for (i, poly) in polys.iter().enumerate() {
                push_sub(i, Geometry::Polygon(poly.clone()))?;
            }
        }
        Geometry::MultiLineString(lines) => {
            for (i, line) in lines.iter().enumerate() {
                push_sub(i, Geometry::LineString(line.clone()))?;
            }
        }
        other => return Err(MeshError::UnsupportedGeometry(other.kind())),
    }

    Ok(out)
}

type RawTriangle = (DVec3, DVec3, DVec3);

fn dispatch(
    geometry: &Geometry,
    cfg: &ProcessorConfig,
    tube: TubeParams,
) -> Result<Vec<RawTriangle>, MeshError> {
    match geometry {
        Geometry::LineString(line) => {
            let local: Vec<DVec3> = line.iter().map(|&p| cfg.to_local(p)).collect();
            tube_triangles(&local, tube)
        }
        Geometry::MultiLineString(lines) => {
            let mut out = Vec::new();
            for line in lines {
                let local: Vec<DVec3> = line.iter().map(|&p| cfg.to_local(p)).collect();
                out.extend(tube_triangles(&local, tube)?);
            }
            Ok(out)
        }
        Geometry::Polygon(poly) => polygons_to_triangles(std::slice::from_ref(poly), cfg),
        Geometry::MultiPolygon(polys) | Geometry::PolyhedralSurface(polys) => {
            polygons_to_triangles(polys, cfg)
        }
    }
}

fn polygons_to_triangles(
    polygons: &[Polygon],
    cfg: &ProcessorConfig,
) -> Result<Vec<RawTriangle>, MeshError> {
    let mut out = Vec::new();

    for poly in polygons {
        let local = Polygon {
            exterior: poly.exterior.iter().map(|&p| cfg.to_local(p)).collect(),
            interiors: poly
                .interiors
                .iter()
                .map(|ring| ring.iter().map(|&p| cfg.to_local(p)).collect())
                .collect(),
        };

        if local.is_triangle() {
            // Pre-triangulated input, emit as-is.
            out.push((local.exterior[0], local.exterior[1], local.exterior[2]));
        } else {
            out.extend(ear_clip_polygon(&local)?);
        }
    }

    Ok(out)
}

// --- planar ear clipping -------------------------------------------------

/// Ring vertex projected to the polygon plane, keeping its 3D original.
#[derive(Clone, Copy)]
struct PlanarVertex {
    uv: DVec2,
    world: DVec3,
}

fn ear_clip_polygon(poly: &Polygon) -> Result<Vec<RawTriangle>, MeshError> {
    let exterior = open_ring(&poly.exterior);
    if exterior.len() < 3 {
        return Err(MeshError::DegenerateRing(poly.exterior.len()));
    }

    // Newell's method over the exterior gives the plane normal.
    let normal = newell_normal(&exterior);
    let (u_axis, v_axis) = plane_basis(normal);
    let project = |p: DVec3| PlanarVertex {
        uv: DVec2::new(p.dot(u_axis), p.dot(v_axis)),
        world: p,
    };

    let mut outer: Vec<PlanarVertex> = exterior.iter().map(|&p| project(p)).collect();
    if signed_area(&outer) < 0.0 {
        outer.reverse();
    }

    let mut holes: Vec<Vec<PlanarVertex>> = Vec::new();
    for ring in &poly.interiors {
        let open = open_ring(ring);
        if open.len() < 3 {
            continue;
        }
        let mut hole: Vec<PlanarVertex> = open.iter().map(|&p| project(p)).collect();
        if signed_area(&hole) > 0.0 {
            hole.reverse();
        }
        holes.push(hole);
    }

    let merged = merge_holes(outer, holes);
    Ok(ear_clip_ring(&merged))
}

/// Drop the closing duplicate point, if present.
fn open_ring(ring: &Ring) -> Vec<DVec3> {
    let mut pts: Vec<DVec3> = ring.clone();
    while pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    pts
}

fn newell_normal(points: &[DVec3]) -> DVec3 {
    let mut n = DVec3::ZERO;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n.try_normalize().unwrap_or(DVec3::Z)
}

fn plane_basis(normal: DVec3) -> (DVec3, DVec3) {
    let helper = if normal.x.abs() > 0.9 { DVec3::Y } else { DVec3::X };
    let u = helper.cross(normal).normalize();
    let v = normal.cross(u);
    (u, v)
}

fn signed_area(ring: &[PlanarVertex]) -> f64 {
    let mut area = 0.0;
    for i in 0..ring.len() {
        let a = ring[i].uv;
        let b = ring[(i + 1) % ring.len()].uv;
        area += a.x * b.y - b.x * a.y;
    }
    area * 0.5
}

/// Merge each hole into the outer ring via the shortest mutually visible
/// bridge edge, duplicating the two bridge endpoints.
fn merge_holes(mut outer: Vec<PlanarVertex>, holes: Vec<Vec<PlanarVertex>>) -> Vec<PlanarVertex> {
    for hole in holes {
        let mut best: Option<(usize, usize, f64)> = None;

        for (oi, ov) in outer.iter().enumerate() {
            for (hi, hv) in hole.iter().enumerate() {
                let d2 = (ov.uv - hv.uv).length_squared();
                if best.map_or(true, |(_, _, bd)| d2 < bd)
                    && bridge_is_clear(ov.uv, hv.uv, &outer, &hole)
                {
                    best = Some((oi, hi, d2));
                }
            }
        }

        // Without a clear bridge fall back to the closest pair outright;
        // the ear clipper tolerates the resulting self-touch.
        let (oi, hi, _) = best.unwrap_or_else(|| {
            let mut fallback = (0, 0, f64::INFINITY);
            for (oi, ov) in outer.iter().enumerate() {
                for (hi, hv) in hole.iter().enumerate() {
                    let d2 = (ov.uv - hv.uv).length_squared();
                    if d2 < fallback.2 {
                        fallback = (oi, hi, d2);
                    }
                }
            }
            fallback
        });

        // outer[..=oi] + hole[hi..] + hole[..=hi] + outer[oi..]
        let mut merged = Vec::with_capacity(outer.len() + hole.len() + 2);
        merged.extend_from_slice(&outer[..=oi]);
        merged.extend_from_slice(&hole[hi..]);
        merged.extend_from_slice(&hole[..=hi]);
        merged.extend_from_slice(&outer[oi..]);
        outer = merged;
    }
    outer
}

fn bridge_is_clear(a: DVec2, b: DVec2, outer: &[PlanarVertex], hole: &[PlanarVertex]) -> bool {
    !crosses_ring(a, b, outer) && !crosses_ring(a, b, hole)
}

fn crosses_ring(a: DVec2, b: DVec2, ring: &[PlanarVertex]) -> bool {
    for i in 0..ring.len() {
        let c = ring[i].uv;
        let d = ring[(i + 1) % ring.len()].uv;
        if c == a || c == b || d == a || d == b {
            continue; // edges sharing a bridge endpoint never block it
        }
        if segments_intersect(a, b, c, d) {
            return true;
        }
    }
    false
}

fn segments_intersect(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> bool {
    let d1 = cross2(d - c, a - c);
    let d2 = cross2(d - c, b - c);
    let d3 = cross2(b - a, c - a);
    let d4 = cross2(b - a, d - a);
    ((d1 > 0.0) != (d2 > 0.0)) && ((d3 > 0.0) != (d4 > 0.0))
}

#[inline]
fn cross2(a: DVec2, b: DVec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Classic O(n^2) ear clipping over a CCW ring. A convex ring therefore
/// decomposes into exactly n-2 triangles.
fn ear_clip_ring(ring: &[PlanarVertex]) -> Vec<RawTriangle> {
    let mut indices: Vec<usize> = (0..ring.len()).collect();
    let mut out = Vec::with_capacity(ring.len().saturating_sub(2));

    while indices.len() > 3 {
        let n = indices.len();
        let mut clipped = false;

        for i in 0..n {
            let prev = ring[indices[(i + n - 1) % n]];
            let cur = ring[indices[i]];
            let next = ring[indices[(i + 1) % n]];

            if cross2(cur.uv - prev.uv, next.uv - cur.uv) <= 0.0 {
                continue; // reflex corner
            }

            let mut blocked = false;
            for &j in &indices {
                let p = ring[j].uv;
                if p == prev.uv || p == cur.uv || p == next.uv {
                    continue;
                }
                if point_in_triangle(p, prev.uv, cur.uv, next.uv) {
                    blocked = true;
                    break;
                }
            }

            if !blocked {
                out.push((prev.world, cur.world, next.world));
                indices.remove(i);
                clipped = true;
                break;
            }
        }

        if !clipped {
            // Numerically stuck ring: clip the first convex corner anyway
            // so the loop terminates; the leftovers degenerate and are
            // filtered at encoding.
            let fallback = (0..indices.len()).find(|&i| {
                let n = indices.len();
                let prev = ring[indices[(i + n - 1) % n]].uv;
                let cur = ring[indices[i]].uv;
                let next = ring[indices[(i + 1) % n]].uv;
                cross2(cur - prev, next - cur) > 0.0
            });
            match fallback {
                Some(i) => {
                    let n = indices.len();
                    let prev = ring[indices[(i + n - 1) % n]];
                    let cur = ring[indices[i]];
                    let next = ring[indices[(i + 1) % n]];
                    out.push((prev.world, cur.world, next.world));
                    indices.remove(i);
                }
                None => break,
            }
        }
    }

    if indices.len() == 3 {
        out.push((
            ring[indices[0]].world,
            ring[indices[1]].world,
            ring[indices[2]].world,
        ));
    }

    out
}

fn point_in_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> bool {
    let d1 = cross2(b - a, p - a);
    let d2 = cross2(c - b, p - b);
    let d3 = cross2(a - c, p - c);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

// --- tube sweep ----------------------------------------------------------

/// Sweep a polyline into a tube: the centerline is resampled by arc
/// length into `tubular_segments + 1` rings of `radial_segments` vertices
/// carried by parallel-transport frames, then stitched with quads.
fn tube_triangles(line: &[DVec3], params: TubeParams) -> Result<Vec<RawTriangle>, MeshError> {
    if line.len() < 2 {
        return Err(MeshError::DegenerateRing(line.len()));
    }

    let centers = resample_polyline(line, params.tubular_segments + 1);

    // Parallel-transport frames along the centerline.
    let mut tangents = Vec::with_capacity(centers.len());
    for i in 0..centers.len() {
        let t = if i + 1 < centers.len() {
            centers[i + 1] - centers[i]
        } else {
            centers[i] - centers[i - 1]
        };
        tangents.push(t.try_normalize().unwrap_or(DVec3::X));
    }

    let mut normals = Vec::with_capacity(centers.len());
    let helper = if tangents[0].z.abs() < 0.9 { DVec3::Z } else { DVec3::Y };
    let mut normal = tangents[0].cross(helper).normalize();
    for &tangent in &tangents {
        normal = (normal - tangent * normal.dot(tangent))
            .try_normalize()
            .unwrap_or_else(|| tangent.cross(helper).normalize());
        normals.push(normal);
    }

    let radial = params.radial_segments.max(3);
    let mut rings: Vec<Vec<DVec3>> = Vec::with_capacity(centers.len());
    for i in 0..centers.len() {
        let binormal = tangents[i].cross(normals[i]);
        let ring: Vec<DVec3> = (0..radial)
            .map(|j| {
                let theta = std::f64::consts::TAU * j as f64 / radial as f64;
                centers[i] + (normals[i] * theta.cos() + binormal * theta.sin()) * params.radius
            })
            .collect();
        rings.push(ring);
    }

    let mut out = Vec::with_capacity((rings.len() - 1) * radial * 2);
    for i in 0..rings.len() - 1 {
        for j in 0..radial {
            let j1 = (j + 1) % radial;
            let a = rings[i][j];
            let b = rings[i + 1][j];
            let c = rings[i + 1][j1];
            let d = rings[i][j1];
            out.push((a, b, c));
            out.push((a, c, d));
        }
    }

    Ok(out)
}

fn resample_polyline(line: &[DVec3], samples: usize) -> Vec<DVec3> {
    let mut cumulative = Vec::with_capacity(line.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for pair in line.windows(2) {
        total += (pair[1] - pair[0]).length();
        cumulative.push(total);
    }

    if total <= f64::EPSILON {
        return vec![line[0]; samples];
    }

    let mut out = Vec::with_capacity(samples);
    let mut seg = 0usize;
    for i in 0..samples {
        let target = total * i as f64 / (samples - 1) as f64;
        while seg + 1 < cumulative.len() - 1 && cumulative[seg + 1] < target {
            seg += 1;
        }
        let span = (cumulative[seg + 1] - cumulative[seg]).max(f64::EPSILON);
        let t = (target - cumulative[seg]) / span;
        out.push(line[seg].lerp(line[seg + 1], t));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_ring() -> Ring {
        vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_quadrilateral_yields_two_triangles() {
        let record = GeometryRecord::new(0, Geometry::Polygon(Polygon::new(quad_ring())));
        let triangles = triangles_for(&record, &ProcessorConfig::default()).unwrap();
        assert_eq!(triangles.len(), 2);
        for t in &triangles {
            assert!(!t.is_degenerate());
        }
    }

    #[test]
    fn test_convex_ring_fan_count() {
        // Regular convex octagon: 8 vertices -> 6 triangles.
        let ring: Ring = (0..8)
            .map(|i| {
                let a = std::f64::consts::TAU * i as f64 / 8.0;
                DVec3::new(a.cos(), a.sin(), 0.0)
            })
            .chain(std::iter::once(DVec3::new(1.0, 0.0, 0.0)))
            .collect();
        let record = GeometryRecord::new(1, Geometry::Polygon(Polygon::new(ring)));
        let triangles = triangles_for(&record, &ProcessorConfig::default()).unwrap();
        assert_eq!(triangles.len(), 6);
    }

    #[test]
    fn test_polygon_with_hole() {
        let outer: Ring = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(4.0, 0.0, 0.0),
            DVec3::new(4.0, 4.0, 0.0),
            DVec3::new(0.0, 4.0, 0.0),
            DVec3::new(0.0, 0.0, 0.0),
        ];
        let hole: Ring = vec![
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(3.0, 1.0, 0.0),
            DVec3::new(3.0, 3.0, 0.0),
            DVec3::new(1.0, 3.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
        ];
        let poly = Polygon::with_holes(outer, vec![hole]);
        let record = GeometryRecord::new(2, Geometry::Polygon(poly));
        let triangles = triangles_for(&record, &ProcessorConfig::default()).unwrap();

        // A square with a square hole triangulates to 8 triangles with a
        // combined area of 16 - 4 = 12.
        let area: f64 = triangles
            .iter()
            .map(|t| 0.5 * (t.p1 - t.p0).cross(t.p2 - t.p0).length())
            .sum();
        assert!((area - 12.0).abs() < 1e-9, "area was {area}");
        assert!(triangles.len() >= 8);
    }

    #[test]
    fn test_pretriangulated_surface_skips_retriangulation() {
        // Unit cube as 6 quad faces -> 12 triangles after triangulation.
        let faces = cube_faces();
        let record = GeometryRecord::new(3, Geometry::PolyhedralSurface(faces));
        let triangles = triangles_for(&record, &ProcessorConfig::default()).unwrap();
        assert_eq!(triangles.len(), 12);

        // Already-triangular rings pass through untouched.
        let tri_ring: Ring = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 0.0),
        ];
        let record = GeometryRecord::new(4, Geometry::Polygon(Polygon::new(tri_ring.clone())));
        let triangles = triangles_for(&record, &ProcessorConfig::default()).unwrap();
        assert_eq!(triangles.len(), 1);
        assert_eq!(triangles[0].p0, tri_ring[0]);
        assert_eq!(triangles[0].p1, tri_ring[1]);
        assert_eq!(triangles[0].p2, tri_ring[2]);
    }

    #[test]
    fn test_translation_is_subtracted() {
        let record = GeometryRecord::new(0, Geometry::Polygon(Polygon::new(quad_ring())));
        let cfg = ProcessorConfig {
            translation: DVec3::new(10.0, 20.0, 0.0),
            ..Default::default()
        };
        let triangles = triangles_for(&record, &cfg).unwrap();
        for t in &triangles {
            for p in [t.p0, t.p1, t.p2] {
                assert!(p.x <= -9.0 && p.y <= -19.0);
            }
        }
    }

    #[test]
    fn test_tube_triangle_count() {
        let line = vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(10.0, 0.0, 0.0)];
        let mut record = GeometryRecord::new(5, Geometry::LineString(line));
        record.radius = Some(0.5);
        let cfg = ProcessorConfig {
            tube: TubeParams {
                radius: 1.0,
                radial_segments: 8,
                tubular_segments: 4,
            },
            ..Default::default()
        };
        let triangles = triangles_for(&record, &cfg).unwrap();
        assert_eq!(triangles.len(), 4 * 8 * 2);

        // Every vertex sits on the tube surface of the overridden radius.
        for t in &triangles {
            for p in [t.p0, t.p1, t.p2] {
                let r = (p.y * p.y + p.z * p.z).sqrt();
                assert!((r - 0.5).abs() < 1e-9, "radius was {r}");
            }
        }
    }

    #[test]
    fn test_multipolygon_shader_per_subgeometry() {
        let faces = cube_faces();
        let shader = ShaderColors::from_base_hex(
            &(0..6).map(|i| format!("#0000{:02X}", i * 10)).collect::<Vec<_>>(),
        )
        .unwrap();
        let mut record = GeometryRecord::new(7, Geometry::PolyhedralSurface(faces));
        record.shader = Some(shader);

        let triangles = triangles_for(&record, &ProcessorConfig::default()).unwrap();
        assert_eq!(triangles.len(), 12);
        // Both triangles of one face share that face's color.
        assert_eq!(triangles[0].color, triangles[1].color);
        assert_ne!(triangles[0].color, triangles[2].color);
    }

    #[test]
    fn test_single_element_multipolygon_color() {
        // A multi of one validates against the sub-geometry count, not
        // the triangle count.
        let shader = ShaderColors::from_base_hex(&["#336699".to_owned()]).unwrap();
        let mut record = GeometryRecord::new(6, Geometry::MultiPolygon(vec![Polygon::new(quad_ring())]));
        record.shader = Some(shader);

        let triangles = triangles_for(&record, &ProcessorConfig::default()).unwrap();
        assert_eq!(triangles.len(), 2);
        let expected = crate::shader::parse_hex_color("#336699").unwrap();
        for t in &triangles {
            assert_eq!(t.color, Some(expected));
        }
    }

    #[test]
    fn test_shader_count_mismatch_fails_fast() {
        let faces = cube_faces();
        let shader =
            ShaderColors::from_base_hex(&["#FF0000".to_owned(), "#00FF00".to_owned()]).unwrap();
        let mut record = GeometryRecord::new(8, Geometry::PolyhedralSurface(faces));
        record.shader = Some(shader);

        let err = triangles_for(&record, &ProcessorConfig::default()).unwrap_err();
        assert!(matches!(err, MeshError::ShaderCountMismatch { .. }));
        assert!(err.to_string().contains("BaseColor"));
    }

    #[test]
    fn test_line_too_short() {
        let record = GeometryRecord::new(9, Geometry::LineString(vec![DVec3::ZERO]));
        assert!(triangles_for(&record, &ProcessorConfig::default()).is_err());
    }

    fn cube_faces() -> Vec<Polygon> {
        let corner = |x: f64, y: f64, z: f64| DVec3::new(x, y, z);
        let quad = |a: DVec3, b: DVec3, c: DVec3, d: DVec3| Polygon::new(vec![a, b, c, d, a]);
        vec![
            quad(corner(0., 0., 0.), corner(0., 1., 0.), corner(1., 1., 0.), corner(1., 0., 0.)),
            quad(corner(0., 0., 1.), corner(1., 0., 1.), corner(1., 1., 1.), corner(0., 1., 1.)),
            quad(corner(0., 0., 0.), corner(1., 0., 0.), corner(1., 0., 1.), corner(0., 0., 1.)),
            quad(corner(0., 1., 0.), corner(0., 1., 1.), corner(1., 1., 1.), corner(1., 1., 0.)),
            quad(corner(0., 0., 0.), corner(0., 0., 1.), corner(0., 1., 1.), corner(0., 1., 0.)),
            quad(corner(1., 0., 0.), corner(1., 1., 0.), corner(1., 1., 1.), corner(1., 0., 1.)),
        ]
    }
}
