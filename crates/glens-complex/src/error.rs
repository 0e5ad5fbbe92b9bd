//! Error types for complex construction, adjacency discovery, and solving.
//!
//! All errors are fatal for the operation that raised them: a complex either
//! constructs completely or not at all, and a solve either resolves every
//! face or fails outright. Messages carry the face/vertex indices needed to
//! diagnose the offending geometry.

use thiserror::Error;

/// Parameter-level failures when determining a single imaging transformation.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GlensError {
    /// A focal length of (near) zero collapses all of space onto the nodal point.
    #[error("focal length is degenerate (|f| below tolerance)")]
    DegenerateFocalLength,

    /// The optical-axis direction has (near) zero length.
    #[error("optical-axis direction is degenerate")]
    DegenerateAxis,

    /// Object-image displacement parallel to the surface: the nodal line never
    /// meets the glens plane, so no finite-focal-length glens exists.
    #[error("conjugate pair displacement is parallel to the surface")]
    PairParallelToSurface,

    /// The two object-image lines of a two-pair construction do not meet.
    #[error("conjugate-pair nodal lines are skew (miss distance {distance:.3e})")]
    SkewNodalLines { distance: f64 },

    /// Both nodal lines are parallel; the nodal point is not determined.
    #[error("conjugate-pair nodal lines are parallel; nodal point undetermined")]
    ParallelNodalLines,

    /// An object point lies on a focal plane and images to infinity.
    #[error("conjugate point images to infinity (object on a focal plane)")]
    ConjugateAtInfinity,

    /// The constructed transformation fails to reproduce a supplied pair.
    #[error("constructed transformation violates a conjugate pair (error {deviation:.3e})")]
    PairViolation { deviation: f64 },
}

/// Crate-level error for construction, adjacency, solving, and emission.
#[derive(Error, Debug)]
pub enum Error {
    /// Physical and electromagnetic vertex arrays must be parallel.
    #[error("physical and electromagnetic vertex arrays differ in length ({physical} vs {em})")]
    VertexArrayMismatch { physical: usize, em: usize },

    /// A face needs at least three vertices to span a plane.
    #[error("face {face}: fewer than three vertices ({count})")]
    TooFewVertices { face: usize, count: usize },

    /// A face references a vertex index outside the vertex arrays.
    #[error("face {face}: vertex index {vertex} out of range ({vertices} vertices)")]
    VertexIndexOutOfRange {
        face: usize,
        vertex: usize,
        vertices: usize,
    },

    /// A face's physical vertices fail the coplanarity tolerance.
    #[error("face {face}: non-planar surface (max deviation {deviation:.3e})")]
    NonPlanarFace { face: usize, deviation: f64 },

    /// The ray-cast neighbour search kept grazing shared edges.
    #[error("face {face}: adjacency search failed to converge after {attempts} attempts")]
    AdjacencyAmbiguous { face: usize, attempts: usize },

    /// A directional walk never left the complex within the route bound.
    #[error("face {face}: exterior not reachable within {limit} route steps")]
    ExteriorNotReachable { face: usize, limit: usize },

    /// Route degenerated to coincident faces: every vertex of the inner
    /// neighbour is shared with the face being resolved.
    #[error("face {face}: unable to disambiguate adjacent face {neighbour} (all vertices shared)")]
    NoReferenceVertex { face: usize, neighbour: usize },

    /// Determining one face's transformation failed.
    #[error("face {face}: {source}")]
    Glens {
        face: usize,
        #[source]
        source: GlensError,
    },

    /// Post-solve verification found a violated conjugate pair.
    #[error("face {face}: solved transformation violates a conjugate pair (error {deviation:.3e})")]
    InconsistentSolve { face: usize, deviation: f64 },

    /// Transmission coefficients are physical only in [0, 1].
    #[error("transmission coefficient {value} outside [0, 1]")]
    InvalidTransmission { value: f64 },
}

impl Error {
    /// Attach face context to a transformation-level failure.
    #[inline]
    pub(crate) fn glens(face: usize, source: GlensError) -> Self {
        Self::Glens { face, source }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
