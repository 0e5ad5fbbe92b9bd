//! Geometric predicates on planar convex polygons in R^3.
//!
//! Purpose
//! - Provide the small set of predicates the adjacency oracle and the complex
//!   model rely on: planarity of a vertex set, winding-ordered normal and
//!   centroid, random interior sampling, and ray-polygon intersection.
//!
//! Assumptions and conventions
//! - Polygons are convex and given as ordered vertex lists; the winding order
//!   determines the normal sign (right-hand rule on the first three vertices).
//! - Equality tests use the tolerances in `GeomCfg`; none of the predicates
//!   normalize their inputs beyond what is stated.
//! - Interior sampling draws independent weights and normalizes them, so the
//!   sample is almost surely off every edge.

use nalgebra::Vector3;
use rand::Rng;

/// Geometry configuration (tolerances).
#[derive(Clone, Copy, Debug)]
pub struct GeomCfg {
    /// Max point-to-plane distance for a vertex set to count as planar.
    pub eps_planar: f64,
    /// Below this, a ray direction counts as parallel to a plane.
    pub eps_parallel: f64,
    /// Slack for the convex-polygon containment test (edge inclusive).
    pub eps_inside: f64,
    /// Minimum forward ray parameter for a hit to count.
    pub eps_forward: f64,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self {
            eps_planar: 1e-9,
            eps_parallel: 1e-12,
            eps_inside: 1e-9,
            eps_forward: 1e-12,
        }
    }
}

/// Unit normal of the plane spanned by the first three points, oriented by
/// winding order. `None` if the first three points are (near) collinear.
pub fn polygon_normal(points: &[Vector3<f64>]) -> Option<Vector3<f64>> {
    if points.len() < 3 {
        return None;
    }
    let n = (points[1] - points[0]).cross(&(points[2] - points[0]));
    let len = n.norm();
    if len < 1e-12 {
        return None;
    }
    Some(n / len)
}

/// Vertex mean of the polygon. Coincides with the area centroid for the
/// regular fixtures used here; callers only need an interior reference point.
pub fn polygon_centroid(points: &[Vector3<f64>]) -> Vector3<f64> {
    let mut c = Vector3::zeros();
    for p in points {
        c += p;
    }
    c / (points.len() as f64)
}

/// Planarity test: every point's distance from the plane of the first three
/// points stays below `eps`. Returns the maximum deviation alongside the
/// verdict so construction errors can report it.
pub fn planarity(points: &[Vector3<f64>], eps: f64) -> (bool, f64) {
    let Some(n) = polygon_normal(points) else {
        // Collinear leading vertices span no plane; report as non-planar.
        return (false, f64::INFINITY);
    };
    let mut max_dev: f64 = 0.0;
    for p in points {
        let d = (p - points[0]).dot(&n).abs();
        max_dev = max_dev.max(d);
    }
    (max_dev <= eps, max_dev)
}

/// Random interior point of a convex polygon: a convex combination with
/// independently drawn weights, normalized to sum to 1.
pub fn sample_interior_point<R: Rng>(points: &[Vector3<f64>], rng: &mut R) -> Vector3<f64> {
    loop {
        let weights: Vec<f64> = (0..points.len()).map(|_| rng.gen::<f64>()).collect();
        let sum: f64 = weights.iter().sum();
        if sum < 1e-12 {
            continue; // all-zero draw; resample
        }
        let mut p = Vector3::zeros();
        for (w, v) in weights.iter().zip(points) {
            p += v * (w / sum);
        }
        return p;
    }
}

/// Ray-polygon intersection: ray-plane intersection restricted to the convex
/// polygon's extent. Returns the ray parameter and the hit point.
///
/// `None` when the ray is parallel to the plane, the intersection lies behind
/// the origin, or the point falls outside the polygon. Edge and vertex hits
/// are inclusive (within `eps_inside`); disambiguating grazes between two
/// faces is the adjacency oracle's job, not this predicate's.
pub fn ray_polygon_intersection(
    origin: Vector3<f64>,
    dir: Vector3<f64>,
    points: &[Vector3<f64>],
    cfg: GeomCfg,
) -> Option<(f64, Vector3<f64>)> {
    let n = polygon_normal(points)?;
    let denom = dir.dot(&n);
    if denom.abs() < cfg.eps_parallel {
        return None;
    }
    let t = (points[0] - origin).dot(&n) / denom;
    if t < cfg.eps_forward {
        return None;
    }
    let hit = origin + dir * t;
    if point_in_convex_polygon(hit, points, n, cfg.eps_inside) {
        Some((t, hit))
    } else {
        None
    }
}

/// Containment in a convex polygon with winding normal `n`: the point stays
/// on the inner side of every directed edge, with `eps` of slack.
fn point_in_convex_polygon(
    p: Vector3<f64>,
    points: &[Vector3<f64>],
    n: Vector3<f64>,
    eps: f64,
) -> bool {
    let k = points.len();
    for i in 0..k {
        let a = points[i];
        let b = points[(i + 1) % k];
        let side = (b - a).cross(&(p - a)).dot(&n);
        if side < -eps {
            return false;
        }
    }
    true
}
