//! Polyhedral complex model: shared vertices in two spaces, faces by index.
//!
//! Purpose
//! - Own the per-vertex physical and electromagnetic positions and the face
//!   list, and derive per-face geometry (normal, centroid, vertex positions)
//!   on demand so nothing can desynchronize.
//!
//! Invariants (checked at construction, violations are fatal)
//! - The two vertex arrays are parallel (same length, same indexing).
//! - Every face has >= 3 valid vertex indices.
//! - Every face's physical vertices are coplanar within `GeomCfg::eps_planar`.

use nalgebra::Vector3;

use crate::error::{Error, Result};
use crate::geom::{self, GeomCfg};

/// One face: an ordered, winding-significant sequence of vertex indices.
#[derive(Clone, Debug)]
pub struct Face {
    vertices: Vec<usize>,
}

impl Face {
    /// Vertex indices in winding order.
    #[inline]
    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// Whether `vertex` is one of this face's vertices.
    #[inline]
    pub fn contains_vertex(&self, vertex: usize) -> bool {
        self.vertices.contains(&vertex)
    }
}

/// The polyhedral complex: immutable once constructed.
#[derive(Clone, Debug)]
pub struct Complex {
    physical: Vec<Vector3<f64>>,
    em: Vec<Vector3<f64>>,
    faces: Vec<Face>,
    cfg: GeomCfg,
}

impl Complex {
    /// Build and validate a complex from parallel vertex arrays and faces.
    ///
    /// A single planarity failure aborts the whole build; there is no partial
    /// or degraded mode.
    pub fn new(
        physical: Vec<Vector3<f64>>,
        em: Vec<Vector3<f64>>,
        faces: Vec<Vec<usize>>,
        cfg: GeomCfg,
    ) -> Result<Self> {
        if physical.len() != em.len() {
            return Err(Error::VertexArrayMismatch {
                physical: physical.len(),
                em: em.len(),
            });
        }
        let n_vertices = physical.len();
        for (fi, verts) in faces.iter().enumerate() {
            if verts.len() < 3 {
                return Err(Error::TooFewVertices {
                    face: fi,
                    count: verts.len(),
                });
            }
            for &v in verts {
                if v >= n_vertices {
                    return Err(Error::VertexIndexOutOfRange {
                        face: fi,
                        vertex: v,
                        vertices: n_vertices,
                    });
                }
            }
            let pts: Vec<Vector3<f64>> = verts.iter().map(|&v| physical[v]).collect();
            let (planar, deviation) = geom::planarity(&pts, cfg.eps_planar);
            if !planar {
                return Err(Error::NonPlanarFace {
                    face: fi,
                    deviation,
                });
            }
        }
        Ok(Self {
            physical,
            em,
            faces: faces
                .into_iter()
                .map(|vertices| Face { vertices })
                .collect(),
            cfg,
        })
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.physical.len()
    }

    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    #[inline]
    pub fn face(&self, face: usize) -> &Face {
        &self.faces[face]
    }

    /// Physical position of a vertex.
    #[inline]
    pub fn physical(&self, vertex: usize) -> Vector3<f64> {
        self.physical[vertex]
    }

    /// Electromagnetic-space position of a vertex.
    #[inline]
    pub fn em(&self, vertex: usize) -> Vector3<f64> {
        self.em[vertex]
    }

    /// Physical positions of a face's vertices, in winding order.
    pub fn face_points(&self, face: usize) -> Vec<Vector3<f64>> {
        self.faces[face]
            .vertices
            .iter()
            .map(|&v| self.physical[v])
            .collect()
    }

    /// Winding-oriented unit normal of a face's plane.
    ///
    /// Construction guarantees the leading vertices span a plane, so this
    /// never fails for a valid face index.
    pub fn face_normal(&self, face: usize) -> Vector3<f64> {
        let pts = self.face_points(face);
        geom::polygon_normal(&pts).expect("validated face spans a plane")
    }

    /// Vertex mean of a face.
    pub fn face_centroid(&self, face: usize) -> Vector3<f64> {
        geom::polygon_centroid(&self.face_points(face))
    }

    #[inline]
    pub fn cfg(&self) -> GeomCfg {
        self.cfg
    }
}
