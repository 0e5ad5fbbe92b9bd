//! Scene emission: renderable primitives for a solved complex.
//!
//! Every face becomes one glens polygon carrying its transformation and a
//! shared transmission coefficient; an optional wire frame adds one sphere
//! per vertex and one cylinder per distinct edge. Appearance stays a caller
//! token: this crate decides geometry, not materials.

use std::collections::BTreeSet;

use nalgebra::Vector3;

use crate::complex::Complex;
use crate::error::{Error, Result};
use crate::glens::Glens;
use crate::solver::Solution;

/// Wire-frame parameters; `appearance` is an opaque caller token cloned onto
/// every frame primitive.
#[derive(Clone, Debug)]
pub struct FrameCfg<A> {
    pub radius: f64,
    pub appearance: A,
}

/// Emission parameters. Leaving `frame` unset omits the wire frame.
#[derive(Clone, Debug)]
pub struct SceneCfg<A> {
    /// Transmission coefficient applied to every glens polygon, in [0, 1].
    pub transmission: f64,
    pub frame: Option<FrameCfg<A>>,
}

impl<A> SceneCfg<A> {
    pub fn new(transmission: f64) -> Self {
        Self {
            transmission,
            frame: None,
        }
    }

    pub fn with_frame(mut self, radius: f64, appearance: A) -> Self {
        self.frame = Some(FrameCfg { radius, appearance });
        self
    }
}

/// One face of the complex as a renderable surface.
#[derive(Clone, Debug)]
pub struct GlensPolygon {
    pub face: usize,
    /// Physical vertex positions in winding order.
    pub vertices: Vec<Vector3<f64>>,
    pub glens: Glens,
    pub transmission: f64,
}

/// Wire-frame marker at one vertex.
#[derive(Clone, Debug)]
pub struct FrameSphere<A> {
    pub vertex: usize,
    pub centre: Vector3<f64>,
    pub radius: f64,
    pub appearance: A,
}

/// Wire-frame edge between two vertices; each undirected edge appears once.
#[derive(Clone, Debug)]
pub struct FrameCylinder<A> {
    pub edge: (usize, usize),
    pub start: Vector3<f64>,
    pub end: Vector3<f64>,
    pub radius: f64,
    pub appearance: A,
}

/// The emitted scene.
#[derive(Clone, Debug)]
pub struct Scene<A> {
    pub polygons: Vec<GlensPolygon>,
    pub spheres: Vec<FrameSphere<A>>,
    pub cylinders: Vec<FrameCylinder<A>>,
}

/// Emit the renderable scene for a solved complex.
///
/// Fails when the transmission coefficient is outside [0, 1].
pub fn emit<A: Clone>(
    complex: &Complex,
    solution: &Solution,
    cfg: &SceneCfg<A>,
) -> Result<Scene<A>> {
    if !(0.0..=1.0).contains(&cfg.transmission) {
        return Err(Error::InvalidTransmission {
            value: cfg.transmission,
        });
    }

    let polygons = (0..complex.num_faces())
        .map(|f| GlensPolygon {
            face: f,
            vertices: complex.face_points(f),
            glens: *solution.glens(f),
            transmission: cfg.transmission,
        })
        .collect();

    let mut spheres = Vec::new();
    let mut cylinders = Vec::new();
    if let Some(frame) = &cfg.frame {
        for v in 0..complex.num_vertices() {
            spheres.push(FrameSphere {
                vertex: v,
                centre: complex.physical(v),
                radius: frame.radius,
                appearance: frame.appearance.clone(),
            });
        }
        // Shared edges are emitted once, keyed by the sorted vertex pair.
        let mut seen: BTreeSet<(usize, usize)> = BTreeSet::new();
        for f in 0..complex.num_faces() {
            let verts = complex.face(f).vertices();
            let k = verts.len();
            for i in 0..k {
                let a = verts[i];
                let b = verts[(i + 1) % k];
                let key = (a.min(b), a.max(b));
                if !seen.insert(key) {
                    continue;
                }
                cylinders.push(FrameCylinder {
                    edge: key,
                    start: complex.physical(key.0),
                    end: complex.physical(key.1),
                    radius: frame.radius,
                    appearance: frame.appearance.clone(),
                });
            }
        }
    }

    Ok(Scene {
        polygons,
        spheres,
        cylinders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::GeomCfg;
    use crate::solver::{solve, SolveCfg};

    fn square_pair() -> (Complex, Solution) {
        // Two unit squares sharing an edge, folded along it.
        let physical = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(1.0, 1.0, 1.0),
        ];
        let em = physical.clone();
        let complex = Complex::new(
            physical,
            em,
            vec![vec![0, 1, 2, 3], vec![1, 4, 5, 2]],
            GeomCfg::default(),
        )
        .unwrap();
        let solution = solve(&complex, SolveCfg::default()).unwrap();
        (complex, solution)
    }

    #[test]
    fn polygons_carry_faces_and_transmission() {
        let (complex, solution) = square_pair();
        let scene = emit(&complex, &solution, &SceneCfg::<()>::new(0.75)).unwrap();
        assert_eq!(scene.polygons.len(), 2);
        assert!(scene.spheres.is_empty());
        assert!(scene.cylinders.is_empty());
        for (f, poly) in scene.polygons.iter().enumerate() {
            assert_eq!(poly.face, f);
            assert_eq!(poly.vertices.len(), 4);
            assert!((poly.transmission - 0.75).abs() < 1e-15);
        }
    }

    #[test]
    fn frame_dedups_the_shared_edge() {
        let (complex, solution) = square_pair();
        let cfg = SceneCfg::new(1.0).with_frame(0.01, "wire");
        let scene = emit(&complex, &solution, &cfg).unwrap();
        assert_eq!(scene.spheres.len(), 6);
        // 4 + 4 face edges, minus the shared edge (1, 2).
        assert_eq!(scene.cylinders.len(), 7);
        let shared: Vec<_> = scene
            .cylinders
            .iter()
            .filter(|c| c.edge == (1, 2))
            .collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(scene.cylinders[0].appearance, "wire");
    }

    #[test]
    fn out_of_range_transmission_is_rejected() {
        let (complex, solution) = square_pair();
        for bad in [-0.1, 1.5, f64::NAN] {
            let err = emit(&complex, &solution, &SceneCfg::<()>::new(bad)).unwrap_err();
            assert!(matches!(err, Error::InvalidTransmission { .. }));
        }
    }
}
