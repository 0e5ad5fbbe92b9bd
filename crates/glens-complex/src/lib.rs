//! Glens complexes: polyhedral arrangements of imaging surfaces.
//!
//! A complex is a set of planar faces over shared vertices, each vertex
//! carrying a physical position and the electromagnetic position at which an
//! exterior observer should see it. The solver assigns every face a glens (a
//! generalized ideal lens, a projective imaging map) so that the complex as a
//! whole produces exactly that appearance, and the scene module turns the
//! result into renderable primitives.
//!
//! Pipeline: [`complex::Complex::new`] validates the geometry,
//! [`solver::solve`] resolves the transformations along ray-cast routes to
//! the exterior, [`scene::emit`] emits the scene.

pub mod adjacency;
pub mod complex;
pub mod error;
pub mod geom;
pub mod glens;
pub mod route;
pub mod scene;
pub mod solver;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::complex::{Complex, Face};
    pub use crate::error::{Error, GlensError, Result};
    pub use crate::geom::GeomCfg;
    pub use crate::glens::{Glens, GlensParams};
    pub use crate::scene::{emit, Scene, SceneCfg};
    pub use crate::solver::{solve, SolveCfg, Solution, Solver};
    pub use nalgebra::{Matrix4 as Mat4, Vector3 as Vec3};
}
