//! Adjacency oracle: face neighbours discovered by directional ray casting.
//!
//! Purpose
//! - Recover the complex's face graph from geometric queries instead of
//!   stored topology: cast a ray from a random interior point of a face and
//!   report the nearest other face it strikes, or "none" when it exits the
//!   complex.
//!
//! Why this design
//! - No separate adjacency structure has to be kept consistent while the
//!   solver runs; the geometry is the single source of truth.
//! - Rays that graze an edge or vertex shared by two faces produce two hits
//!   at indistinguishable distances; such attempts are discarded and retried
//!   with a fresh interior sample. Retries are bounded, and exhaustion is a
//!   fatal, diagnosable error rather than a spin.
//! - Discovered adjacencies are memoized keyed by (face, quantized direction)
//!   to avoid redundant ray casts across routes.

use std::collections::HashMap;

use nalgebra::Vector3;
use rand::Rng;
use tracing::trace;

use crate::complex::Complex;
use crate::error::{Error, Result};
use crate::geom::{ray_polygon_intersection, sample_interior_point};

/// Oracle configuration.
#[derive(Clone, Copy, Debug)]
pub struct OracleCfg {
    /// Resample attempts before an ambiguous neighbour search is fatal.
    pub max_retries: usize,
    /// Two hit distances closer than this count as a degenerate edge graze.
    pub eps_tie: f64,
}

impl Default for OracleCfg {
    fn default() -> Self {
        Self {
            max_retries: 32,
            eps_tie: 1e-9,
        }
    }
}

/// Ray-casting neighbour oracle over a fixed complex.
///
/// Owns the RNG used for interior sampling and the memo cache; the complex's
/// geometry itself is never mutated.
pub struct AdjacencyOracle<'a, R: Rng> {
    complex: &'a Complex,
    cfg: OracleCfg,
    rng: R,
    cache: HashMap<(usize, (i64, i64, i64)), Option<usize>>,
}

impl<'a, R: Rng> AdjacencyOracle<'a, R> {
    pub fn new(complex: &'a Complex, cfg: OracleCfg, rng: R) -> Self {
        Self {
            complex,
            cfg,
            rng,
            cache: HashMap::new(),
        }
    }

    #[inline]
    pub fn complex(&self) -> &'a Complex {
        self.complex
    }

    /// Index of the nearest other face struck by a ray from `from_face` along
    /// `direction`, or `None` when the ray exits the complex.
    ///
    /// The direction is first oriented to the face's positive-normal side, so
    /// callers may pass either sign; one general direction then serves a whole
    /// multi-face walk regardless of each face's winding. For a query whose
    /// sign matters (for example "which face lies directly behind"), use
    /// [`Self::find_neighbour_along`].
    pub fn find_neighbour(
        &mut self,
        from_face: usize,
        direction: Vector3<f64>,
    ) -> Result<Option<usize>> {
        let normal = self.complex.face_normal(from_face);
        let mut dir = direction;
        if dir.dot(&normal) < 0.0 {
            dir = -dir;
        }
        self.find_neighbour_along(from_face, dir)
    }

    /// Like [`Self::find_neighbour`], but casts along `direction` exactly as
    /// given, without re-orienting it against the face normal.
    pub fn find_neighbour_along(
        &mut self,
        from_face: usize,
        direction: Vector3<f64>,
    ) -> Result<Option<usize>> {
        let dir = direction.normalize();
        let key = (from_face, quantize_dir(dir, 1e-9));
        if let Some(&hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let from_points = self.complex.face_points(from_face);
        let geom_cfg = self.complex.cfg();
        for attempt in 0..self.cfg.max_retries {
            let origin = sample_interior_point(&from_points, &mut self.rng);
            let mut best: Option<(f64, usize)> = None;
            let mut second: f64 = f64::INFINITY;
            for other in 0..self.complex.num_faces() {
                if other == from_face {
                    continue;
                }
                let pts = self.complex.face_points(other);
                if let Some((t, _)) = ray_polygon_intersection(origin, dir, &pts, geom_cfg) {
                    match best {
                        Some((t_best, _)) if t >= t_best => second = second.min(t),
                        Some((t_best, _)) => {
                            second = t_best;
                            best = Some((t, other));
                        }
                        None => best = Some((t, other)),
                    }
                }
            }
            let Some((t_best, face)) = best else {
                self.cache.insert(key, None);
                return Ok(None);
            };
            if second - t_best < self.cfg.eps_tie {
                // Edge-on degenerate hit: ordering of the two nearest faces
                // is ambiguous; resample the origin.
                trace!(from_face, attempt, t_best, "degenerate ray hit, resampling");
                continue;
            }
            self.cache.insert(key, Some(face));
            return Ok(Some(face));
        }
        Err(Error::AdjacencyAmbiguous {
            face: from_face,
            attempts: self.cfg.max_retries,
        })
    }
}

fn quantize_dir(v: Vector3<f64>, tol: f64) -> (i64, i64, i64) {
    let s = 1.0 / tol;
    (
        (v.x * s).round() as i64,
        (v.y * s).round() as i64,
        (v.z * s).round() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::GeomCfg;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Two triangles sharing edge AB, no third face. Windings chosen so each
    /// face's normal points toward the other face's side.
    fn two_triangles() -> Complex {
        let physical = vec![
            Vector3::new(0.0, 0.0, 0.0),  // A
            Vector3::new(1.0, 0.0, 0.0),  // B
            Vector3::new(0.5, 1.0, 0.0),  // C
            Vector3::new(0.5, -1.0, 0.2), // D
        ];
        let em = physical.clone();
        Complex::new(
            physical,
            em,
            vec![vec![0, 1, 2], vec![1, 0, 3]],
            GeomCfg::default(),
        )
        .unwrap()
    }

    fn oracle(complex: &Complex, seed: u64) -> AdjacencyOracle<'_, StdRng> {
        AdjacencyOracle::new(complex, OracleCfg::default(), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn shared_edge_neighbours_see_each_other() {
        let c = two_triangles();
        let mut o = oracle(&c, 3);
        // From ABC toward ABD and back; direction signs are canonicalized
        // against each face's normal, so the same vector works for both.
        let toward = Vector3::new(0.0, -1.0, 0.1);
        assert_eq!(o.find_neighbour(0, toward).unwrap(), Some(1));
        assert_eq!(o.find_neighbour(1, -toward).unwrap(), Some(0));
    }

    #[test]
    fn outward_direction_reaches_exterior() {
        let c = two_triangles();
        let mut o = oracle(&c, 5);
        // Straight along ABC's normal: nothing above the triangle.
        assert_eq!(o.find_neighbour(0, Vector3::new(0.0, 0.0, 1.0)).unwrap(), None);
    }

    #[test]
    fn adjacency_is_stable_across_samples() {
        let c = two_triangles();
        let toward = Vector3::new(0.0, -1.0, 0.1);
        for seed in 0..32 {
            let mut o = oracle(&c, seed);
            assert_eq!(o.find_neighbour(0, toward).unwrap(), Some(1));
        }
    }

    #[test]
    fn directed_query_keeps_its_sign() {
        // Two parallel triangles above a base; the canonical query flips
        // toward +z, the directed one casts where it is told.
        let physical = vec![
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(0.5, 1.0, 1.0),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.5, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::new(1.0, 0.0, 2.0),
            Vector3::new(0.5, 1.0, 2.0),
        ];
        let em = physical.clone();
        let c = Complex::new(
            physical,
            em,
            vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]],
            GeomCfg::default(),
        )
        .unwrap();
        let down = Vector3::new(0.0, 0.0, -1.0);
        let mut o = oracle(&c, 7);
        assert_eq!(o.find_neighbour_along(0, down).unwrap(), Some(1));
        assert_eq!(o.find_neighbour(0, down).unwrap(), Some(2));
    }

    #[test]
    fn coincident_faces_exhaust_retries() {
        // Two identical faces at z = 1: every ray from the base hits both at
        // exactly the same distance, so the search can never disambiguate.
        let physical = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.5, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(0.5, 1.0, 1.0),
        ];
        let em = physical.clone();
        let c = Complex::new(
            physical,
            em,
            vec![vec![0, 1, 2], vec![3, 4, 5], vec![3, 4, 5]],
            GeomCfg::default(),
        )
        .unwrap();
        let mut o = oracle(&c, 11);
        let err = o.find_neighbour(0, Vector3::new(0.0, 0.0, 1.0)).unwrap_err();
        assert!(matches!(err, Error::AdjacencyAmbiguous { face: 0, .. }));
    }
}
