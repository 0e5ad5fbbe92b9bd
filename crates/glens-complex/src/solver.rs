//! Network solver: one imaging transformation per face of the complex.
//!
//! Purpose
//! - Determine, for every face, the glens that maps the optical space behind
//!   it onto the space in front of it, such that the electromagnetic-space
//!   vertex positions are what an exterior observer sees through the stack of
//!   faces in between.
//!
//! Method
//! - Faces are resolved along exterior routes. For an unresolved face, walk
//!   along its normal until the complex is exited, then resolve the walk from
//!   the outermost face inward: each face contributes one conjugate pair,
//!   taken from a reference vertex of its inner neighbour (physical position
//!   as object, electromagnetic position as image) with the image pulled
//!   inward through the already-resolved faces further out. A face with no
//!   inner neighbour gets a synthetic self-conjugate anchor displaced from
//!   its centroid, which pins exterior space to itself.
//! - A worklist over unresolved faces drives the outer loop; routes usually
//!   resolve several faces at once.
//! - After all faces are resolved, every constructed conjugate pair is
//!   re-checked through the network and any violation aborts the solve.

use std::collections::VecDeque;

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::adjacency::{AdjacencyOracle, OracleCfg};
use crate::complex::Complex;
use crate::error::{Error, GlensError, Result};
use crate::glens::Glens;
use crate::route::route_to_exterior;

/// Solver configuration.
#[derive(Clone, Copy, Debug)]
pub struct SolveCfg {
    /// Adjacency-oracle retry and tie tolerances.
    pub adjacency: OracleCfg,
    /// Route length bound; defaults to the number of faces.
    pub max_route_len: Option<usize>,
    /// RNG seed for interior sampling; a fixed seed replays the exact solve.
    pub seed: u64,
    /// Synthetic-anchor displacement, in units of the face's mean radius.
    pub anchor_offset: f64,
    /// Tolerance for the post-solve conjugate-pair verification.
    pub verify_tol: f64,
}

impl Default for SolveCfg {
    fn default() -> Self {
        Self {
            adjacency: OracleCfg::default(),
            max_route_len: None,
            seed: 0,
            anchor_offset: 1.0,
            verify_tol: 1e-6,
        }
    }
}

/// One step of a pull chain: the outer face crossed and whether pulling
/// inward through it applies the inverse map (the face's axis agrees with the
/// route's outward direction there).
#[derive(Clone, Copy, Debug)]
pub struct ChainLink {
    pub face: usize,
    pub inverted: bool,
}

/// The conjugate pair a face was resolved from, kept for verification.
///
/// `object` images onto `image` under the face's own glens; pushing `image`
/// back out through `chain` (innermost link last in the pull order, so the
/// push iterates in reverse) must reproduce `raw_image`, the reference
/// vertex's electromagnetic position as seen from true exterior space.
#[derive(Clone, Debug)]
pub struct Anchor {
    pub object: Vector3<f64>,
    pub image: Vector3<f64>,
    pub raw_image: Vector3<f64>,
    /// Faces between this one and the exterior, outermost first.
    pub chain: Vec<ChainLink>,
}

/// A fully resolved complex: one glens per face.
#[derive(Clone, Debug)]
pub struct Solution {
    glenses: Vec<Glens>,
    anchors: Vec<Option<Anchor>>,
}

impl Solution {
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.glenses.len()
    }

    #[inline]
    pub fn glens(&self, face: usize) -> &Glens {
        &self.glenses[face]
    }

    #[inline]
    pub fn glenses(&self) -> &[Glens] {
        &self.glenses
    }

    /// The conjugate pair `face` was resolved from; `None` for faces whose
    /// transformation was supplied up front.
    #[inline]
    pub fn anchor(&self, face: usize) -> Option<&Anchor> {
        self.anchors[face].as_ref()
    }

    /// Re-check the solution against the complex: every face must fix its own
    /// physical vertices (they lie on its surface), reproduce its anchor pair
    /// locally, and reproduce the anchor's exterior image through the whole
    /// chain of outer faces.
    pub fn verify(&self, complex: &Complex, tol: f64) -> Result<()> {
        for f in 0..self.glenses.len() {
            let g = &self.glenses[f];
            for &v in complex.face(f).vertices() {
                let p = complex.physical(v);
                let dev = deviation(g.image(p), p);
                if dev > tol {
                    return Err(Error::InconsistentSolve { face: f, deviation: dev });
                }
            }
            let Some(anchor) = &self.anchors[f] else {
                continue;
            };
            let Some(mut y) = g.image(anchor.object) else {
                return Err(Error::InconsistentSolve {
                    face: f,
                    deviation: f64::INFINITY,
                });
            };
            let dev = (y - anchor.image).norm();
            if dev > tol {
                return Err(Error::InconsistentSolve { face: f, deviation: dev });
            }
            // Push the image back out to exterior space, innermost face first.
            for link in anchor.chain.iter().rev() {
                let outer = &self.glenses[link.face];
                let next = if link.inverted {
                    outer.image(y)
                } else {
                    outer.preimage(y)
                };
                match next {
                    Some(p) => y = p,
                    None => {
                        return Err(Error::InconsistentSolve {
                            face: f,
                            deviation: f64::INFINITY,
                        })
                    }
                }
            }
            let dev = (y - anchor.raw_image).norm();
            if dev > tol {
                return Err(Error::InconsistentSolve { face: f, deviation: dev });
            }
        }
        Ok(())
    }
}

fn deviation(image: Option<Vector3<f64>>, want: Vector3<f64>) -> f64 {
    match image {
        Some(y) => (y - want).norm(),
        None => f64::INFINITY,
    }
}

/// Incremental solver; faces with transformations known up front can be
/// seeded before [`Solver::solve`] runs.
pub struct Solver<'a> {
    complex: &'a Complex,
    cfg: SolveCfg,
    glenses: Vec<Option<Glens>>,
    anchors: Vec<Option<Anchor>>,
}

impl<'a> Solver<'a> {
    pub fn new(complex: &'a Complex, cfg: SolveCfg) -> Self {
        Self {
            complex,
            cfg,
            glenses: vec![None; complex.num_faces()],
            anchors: vec![None; complex.num_faces()],
        }
    }

    /// Seed a face whose transformation is already known; it will not be
    /// re-derived, and routes through it use it as-is.
    pub fn insert_known(&mut self, face: usize, glens: Glens) {
        self.glenses[face] = Some(glens);
    }

    /// Resolve every remaining face and verify the result.
    pub fn solve(mut self) -> Result<Solution> {
        let rng = StdRng::seed_from_u64(self.cfg.seed);
        let mut oracle = AdjacencyOracle::new(self.complex, self.cfg.adjacency, rng);
        let limit = self.cfg.max_route_len.unwrap_or(self.complex.num_faces());

        let mut worklist: VecDeque<usize> = (0..self.complex.num_faces()).collect();
        while let Some(start) = worklist.pop_front() {
            if self.glenses[start].is_some() {
                continue;
            }
            self.resolve_route(start, &mut oracle, limit)?;
        }

        let solution = Solution {
            glenses: self
                .glenses
                .into_iter()
                .map(|g| g.expect("worklist drained only once every face resolved"))
                .collect(),
            anchors: self.anchors,
        };
        solution.verify(self.complex, self.cfg.verify_tol)?;
        Ok(solution)
    }

    /// Walk from `start` to the exterior along the face normal and resolve
    /// every still-unresolved face on the walk, outermost first.
    fn resolve_route(
        &mut self,
        start: usize,
        oracle: &mut AdjacencyOracle<'_, StdRng>,
        limit: usize,
    ) -> Result<()> {
        let general = self.complex.face_normal(start);
        // The face directly behind the start, if any; it only lends a
        // reference vertex, its own glens is not needed here.
        let back = oracle.find_neighbour_along(start, -general)?;
        let walk = route_to_exterior(oracle, start, general, limit)?;
        debug!(start, len = walk.len(), back, "resolving route");

        for i in (0..walk.len()).rev() {
            let f = walk[i];
            if self.glenses[f].is_some() {
                continue;
            }
            let inner = if i > 0 { Some(walk[i - 1]) } else { back };
            let chain = self.pull_chain(&walk, i, general);

            let (raw_object, raw_image) = match inner {
                Some(g) => {
                    let face_f = self.complex.face(f);
                    let w = self
                        .complex
                        .face(g)
                        .vertices()
                        .iter()
                        .copied()
                        .find(|&v| !face_f.contains_vertex(v))
                        .ok_or(Error::NoReferenceVertex { face: f, neighbour: g })?;
                    (self.complex.physical(w), self.complex.em(w))
                }
                None => {
                    // Nothing behind: exterior space on both sides of the
                    // route at this face. Pin it with a point that must look
                    // unshifted from outside.
                    let centroid = self.complex.face_centroid(f);
                    let offset = self.cfg.anchor_offset * mean_radius(self.complex, f);
                    let x = centroid - self.complex.face_normal(f) * offset;
                    (x, x)
                }
            };

            let mut image = raw_image;
            for link in &chain {
                let outer = self.glenses[link.face]
                    .expect("outer walk faces are resolved before inner ones");
                let next = if link.inverted {
                    outer.preimage(image)
                } else {
                    outer.image(image)
                };
                image =
                    next.ok_or_else(|| Error::glens(f, GlensError::ConjugateAtInfinity))?;
            }

            let glens = Glens::from_conjugate_pair(
                self.complex.face_centroid(f),
                self.complex.face_normal(f),
                raw_object,
                image,
            )
            .map_err(|e| Error::glens(f, e))?;
            debug!(face = f, window = glens.is_window(), "face resolved");
            self.glenses[f] = Some(glens);
            self.anchors[f] = Some(Anchor {
                object: raw_object,
                image,
                raw_image,
                chain,
            });
        }
        Ok(())
    }

    /// Chain links for the faces outside `walk[i]`, outermost first. Each
    /// link records whether the stored axis agrees with the route's outward
    /// direction at that face, which decides forward vs inverse application.
    fn pull_chain(&self, walk: &[usize], i: usize, general: Vector3<f64>) -> Vec<ChainLink> {
        let mut chain = Vec::with_capacity(walk.len() - i - 1);
        for &outer in walk[i + 1..].iter().rev() {
            let glens = self.glenses[outer]
                .expect("outer walk faces are resolved before inner ones");
            let inverted = match glens.params() {
                Some(p) => {
                    let n = self.complex.face_normal(outer);
                    let outward = if general.dot(&n) < 0.0 { -general } else { general };
                    p.axis.dot(&outward) >= 0.0
                }
                None => true,
            };
            chain.push(ChainLink { face: outer, inverted });
        }
        chain
    }
}

/// Mean distance from a face's centroid to its vertices.
fn mean_radius(complex: &Complex, face: usize) -> f64 {
    let centroid = complex.face_centroid(face);
    let pts = complex.face_points(face);
    pts.iter().map(|p| (p - centroid).norm()).sum::<f64>() / (pts.len() as f64)
}

/// Resolve every face of the complex with the given configuration.
pub fn solve(complex: &Complex, cfg: SolveCfg) -> Result<Solution> {
    Solver::new(complex, cfg).solve()
}
