//! Directional routes from a face to the exterior of the complex.
//!
//! A route is the sequence of faces a ray-like walk crosses when it leaves a
//! start face along a fixed general direction and keeps asking the adjacency
//! oracle for the next face until none remains. Route length is bounded by
//! the caller: a complex has finitely many faces, so a walk that revisits
//! faces indefinitely indicates degenerate geometry and is reported as an
//! error instead of looping.

use nalgebra::Vector3;
use rand::Rng;
use tracing::trace;

use crate::adjacency::AdjacencyOracle;
use crate::error::{Error, Result};

/// Faces crossed from `start` (inclusive) until the walk exits the complex,
/// in crossing order. The general direction is re-oriented against each
/// intermediate face's normal by the oracle, so one direction vector serves
/// the whole walk.
///
/// Fails with [`Error::ExteriorNotReachable`] when the walk exceeds
/// `max_len` faces.
pub fn route_to_exterior<R: Rng>(
    oracle: &mut AdjacencyOracle<'_, R>,
    start: usize,
    direction: Vector3<f64>,
    max_len: usize,
) -> Result<Vec<usize>> {
    let mut route = vec![start];
    loop {
        let here = *route.last().expect("route starts non-empty");
        match oracle.find_neighbour(here, direction)? {
            None => {
                trace!(start, len = route.len(), "route reached exterior");
                return Ok(route);
            }
            Some(next) => {
                if route.len() >= max_len {
                    return Err(Error::ExteriorNotReachable {
                        face: start,
                        limit: max_len,
                    });
                }
                route.push(next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::OracleCfg;
    use crate::complex::Complex;
    use crate::geom::GeomCfg;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Three parallel triangles stacked along z, all wound counter-clockwise
    /// seen from +z.
    fn triangle_stack() -> Complex {
        let tri = |z: f64| {
            [
                Vector3::new(0.0, 0.0, z),
                Vector3::new(1.0, 0.0, z),
                Vector3::new(0.5, 1.0, z),
            ]
        };
        let mut physical = Vec::new();
        for z in [0.0, 1.0, 2.0] {
            physical.extend(tri(z));
        }
        let em = physical.clone();
        Complex::new(
            physical,
            em,
            vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]],
            GeomCfg::default(),
        )
        .unwrap()
    }

    fn oracle(complex: &Complex, seed: u64) -> AdjacencyOracle<'_, StdRng> {
        AdjacencyOracle::new(complex, OracleCfg::default(), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn stack_routes_through_every_layer() {
        let c = triangle_stack();
        let mut o = oracle(&c, 1);
        let up = Vector3::new(0.0, 0.0, 1.0);
        let route = route_to_exterior(&mut o, 0, up, c.num_faces()).unwrap();
        assert_eq!(route, vec![0, 1, 2]);
        // The top layer exits immediately.
        let route = route_to_exterior(&mut o, 2, up, c.num_faces()).unwrap();
        assert_eq!(route, vec![2]);
    }

    #[test]
    fn middle_face_sees_one_neighbour_per_side() {
        let c = triangle_stack();
        let mut o = oracle(&c, 2);
        let up = Vector3::new(0.0, 0.0, 1.0);
        assert_eq!(o.find_neighbour(1, up).unwrap(), Some(2));
        let route = route_to_exterior(&mut o, 1, up, c.num_faces()).unwrap();
        assert_eq!(route, vec![1, 2]);
    }

    #[test]
    fn length_bound_is_enforced() {
        let c = triangle_stack();
        let mut o = oracle(&c, 3);
        let err = route_to_exterior(&mut o, 0, Vector3::new(0.0, 0.0, 1.0), 2).unwrap_err();
        assert!(matches!(
            err,
            Error::ExteriorNotReachable { face: 0, limit: 2 }
        ));
    }

    proptest! {
        /// The discovered route does not depend on which interior points the
        /// oracle happens to sample.
        #[test]
        fn route_is_seed_independent(seed in any::<u64>()) {
            let c = triangle_stack();
            let mut o = oracle(&c, seed);
            let route =
                route_to_exterior(&mut o, 0, Vector3::new(0.0, 0.0, 1.0), c.num_faces())
                    .unwrap();
            prop_assert_eq!(route, vec![0, 1, 2]);
        }
    }
}
