//! Glens: a projective imaging transformation attached to one planar face.
//!
//! Purpose
//! - Model the linear-fractional map a generalized ideal lens performs between
//!   the optical spaces on its two sides, parameterized by the optical-axis
//!   direction `a` (pointing into the "+" side), the principal point `P` on
//!   the surface, and the two focal lengths `f_neg`, `f_pos`.
//!
//! Conventions
//! - Nodal point `N = P + (f_neg + f_pos) a`; rays through `N` are undeviated,
//!   so every object, its image, and `N` are collinear.
//! - Axial imaging equation `f_neg/o + f_pos/i = 1` with axial coordinates
//!   `o = (Q - P)·a`, `i = (Q' - P)·a`. Eliminating `i` gives the closed form
//!   `Q' = N - f_neg (Q - N) / (o - f_neg)`, and symmetrically for the
//!   inverse direction with `f_pos`.
//! - Points on the glens plane are fixed; an object on a focal plane images
//!   to infinity (`None`).
//! - `Window` is the transparent identity surface (both focal lengths at
//!   infinity); it arises when a conjugate pair degenerates to a fixed point.

use nalgebra::{Matrix4, Vector3};

use crate::error::GlensError;

const EPS: f64 = 1e-9;
/// Tolerance for verifying that a redundant conjugate pair is reproduced.
const PAIR_TOL: f64 = 1e-6;

/// Finite-focal-length glens parameters.
#[derive(Clone, Copy, Debug)]
pub struct GlensParams {
    /// Unit optical-axis direction; points into the "+" side.
    pub axis: Vector3<f64>,
    /// Principal point: where the axis meets the surface.
    pub principal: Vector3<f64>,
    /// Focal length of the "-" side.
    pub f_neg: f64,
    /// Focal length of the "+" side.
    pub f_pos: f64,
}

/// Imaging transformation of one face.
#[derive(Clone, Copy, Debug)]
pub enum Glens {
    /// Transparent window: identity imaging in both directions.
    Window,
    /// Proper glens with finite focal lengths.
    Imaging(GlensParams),
}

impl Glens {
    /// Glens from explicit parameters. The axis is normalized here; focal
    /// lengths of (near) zero are rejected as degenerate.
    pub fn from_parameters(
        axis: Vector3<f64>,
        principal: Vector3<f64>,
        f_neg: f64,
        f_pos: f64,
    ) -> Result<Self, GlensError> {
        let len = axis.norm();
        if len < EPS {
            return Err(GlensError::DegenerateAxis);
        }
        if f_neg.abs() < EPS || f_pos.abs() < EPS {
            return Err(GlensError::DegenerateFocalLength);
        }
        Ok(Self::Imaging(GlensParams {
            axis: axis / len,
            principal,
            f_neg,
            f_pos,
        }))
    }

    /// Thin-closure glens from the surface plane plus one conjugate pair:
    /// the nodal point is placed where the object-image line meets the plane
    /// (so `f_pos = -f_neg`, the ideal-thin-lens condition), which determines
    /// the transformation completely.
    ///
    /// A self-conjugate pair (object == image) yields a `Window`.
    pub fn from_conjugate_pair(
        plane_point: Vector3<f64>,
        axis: Vector3<f64>,
        object: Vector3<f64>,
        image: Vector3<f64>,
    ) -> Result<Self, GlensError> {
        let len = axis.norm();
        if len < EPS {
            return Err(GlensError::DegenerateAxis);
        }
        let a = axis / len;
        let d = image - object;
        if d.norm() < EPS {
            return Ok(Self::Window);
        }
        let dn = d.dot(&a);
        if dn.abs() < EPS * d.norm().max(1.0) {
            return Err(GlensError::PairParallelToSurface);
        }
        // Nodal point: object-image line meets the surface plane.
        let t = (plane_point - object).dot(&a) / dn;
        let nodal = object + d * t;
        let o = (object - nodal).dot(&a);
        let i = (image - nodal).dot(&a);
        // i - o = d·a = dn, nonzero by the parallel check above.
        let f_neg = o * i / dn;
        if f_neg.abs() < EPS {
            // Object or image on the surface with a distinct partner.
            return Err(GlensError::DegenerateFocalLength);
        }
        Ok(Self::Imaging(GlensParams {
            axis: a,
            principal: nodal,
            f_neg,
            f_pos: -f_neg,
        }))
    }

    /// General glens from the surface plane plus two conjugate pairs: the
    /// nodal point is the intersection of the two object-image lines, which
    /// then fixes the principal point and both focal lengths. The second pair
    /// is re-verified against the constructed transformation.
    pub fn from_two_conjugate_pairs(
        plane_point: Vector3<f64>,
        axis: Vector3<f64>,
        pair1: (Vector3<f64>, Vector3<f64>),
        pair2: (Vector3<f64>, Vector3<f64>),
    ) -> Result<Self, GlensError> {
        let len = axis.norm();
        if len < EPS {
            return Err(GlensError::DegenerateAxis);
        }
        let a = axis / len;
        let (o1, i1) = pair1;
        let (o2, i2) = pair2;
        let d1 = i1 - o1;
        let d2 = i2 - o2;
        let fixed1 = d1.norm() < EPS;
        let fixed2 = d2.norm() < EPS;
        if fixed1 && fixed2 {
            return Ok(Self::Window);
        }
        // A fixed point off the surface can only be the nodal point.
        let nodal = if fixed1 {
            o1
        } else if fixed2 {
            o2
        } else {
            closest_point_between_lines(o1, d1, o2, d2)?
        };
        let n = (nodal - plane_point).dot(&a);
        let principal = nodal - a * n;

        let (o, i) = if fixed1 { (o2, i2) } else { (o1, i1) };
        let oa = (o - principal).dot(&a);
        let ia = (i - principal).dot(&a);
        if (ia - oa).abs() < EPS {
            return Err(GlensError::PairParallelToSurface);
        }
        let f_neg = oa * (ia - n) / (ia - oa);
        let f_pos = n - f_neg;
        if f_neg.abs() < EPS || f_pos.abs() < EPS {
            return Err(GlensError::DegenerateFocalLength);
        }
        let glens = Self::Imaging(GlensParams {
            axis: a,
            principal,
            f_neg,
            f_pos,
        });
        // The construction used one pair's axial data; the other pair must
        // come out consistent or the input was not a single projective map.
        let (co, ci) = if fixed1 { (o1, i1) } else { (o2, i2) };
        match glens.image(co) {
            Some(img) if (img - ci).norm() <= PAIR_TOL => Ok(glens),
            Some(img) => Err(GlensError::PairViolation {
                deviation: (img - ci).norm(),
            }),
            None => Err(GlensError::ConjugateAtInfinity),
        }
    }

    /// Transparent identity surface.
    #[inline]
    pub fn window() -> Self {
        Self::Window
    }

    #[inline]
    pub fn is_window(&self) -> bool {
        matches!(self, Self::Window)
    }

    /// Finite parameters, if this is not a window.
    #[inline]
    pub fn params(&self) -> Option<&GlensParams> {
        match self {
            Self::Window => None,
            Self::Imaging(p) => Some(p),
        }
    }

    /// Nodal point `P + (f_neg + f_pos) a` (undeviated-ray point).
    pub fn nodal_point(&self) -> Option<Vector3<f64>> {
        self.params()
            .map(|p| p.principal + p.axis * (p.f_neg + p.f_pos))
    }

    /// Image of an object on the "-" side mapped into the "+" side.
    ///
    /// `None` when the object lies on the "-" focal plane (image at infinity).
    pub fn image(&self, object: Vector3<f64>) -> Option<Vector3<f64>> {
        match self {
            Self::Window => Some(object),
            Self::Imaging(p) => {
                let nodal = p.principal + p.axis * (p.f_neg + p.f_pos);
                let o = (object - p.principal).dot(&p.axis);
                let denom = o - p.f_neg;
                if denom.abs() < EPS {
                    return None;
                }
                Some(nodal - (object - nodal) * (p.f_neg / denom))
            }
        }
    }

    /// Inverse imaging: a point of the "+" side mapped back into the "-" side.
    pub fn preimage(&self, image: Vector3<f64>) -> Option<Vector3<f64>> {
        match self {
            Self::Window => Some(image),
            Self::Imaging(p) => {
                let nodal = p.principal + p.axis * (p.f_neg + p.f_pos);
                let i = (image - p.principal).dot(&p.axis);
                let denom = i - p.f_pos;
                if denom.abs() < EPS {
                    return None;
                }
                Some(nodal - (image - nodal) * (p.f_pos / denom))
            }
        }
    }

    /// Whether `object` images onto `image` within `tol`.
    pub fn maps_pair(&self, object: Vector3<f64>, image: Vector3<f64>, tol: f64) -> bool {
        match self.image(object) {
            Some(img) => (img - image).norm() <= tol,
            None => false,
        }
    }

    /// The "-" to "+" map as a homogeneous 4x4 projective matrix
    /// (last row is the denominator; divide by `w` after application).
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        match self {
            Self::Window => Matrix4::identity(),
            Self::Imaging(p) => {
                let nodal = p.principal + p.axis * (p.f_neg + p.f_pos);
                let ap = p.axis.dot(&p.principal);
                // Numerator: N (a·Q) - (a·P) N - f_neg Q; denominator: a·Q - a·P - f_neg.
                let mut m = Matrix4::zeros();
                for r in 0..3 {
                    for c in 0..3 {
                        m[(r, c)] = nodal[r] * p.axis[c];
                    }
                    m[(r, r)] -= p.f_neg;
                    m[(r, 3)] = -ap * nodal[r];
                    m[(3, r)] = p.axis[r];
                }
                m[(3, 3)] = -(ap + p.f_neg);
                m
            }
        }
    }
}

/// Midpoint of the shortest segment between two lines, failing when the lines
/// are parallel or miss each other by more than `PAIR_TOL`.
fn closest_point_between_lines(
    o1: Vector3<f64>,
    d1: Vector3<f64>,
    o2: Vector3<f64>,
    d2: Vector3<f64>,
) -> Result<Vector3<f64>, GlensError> {
    let a = d1.dot(&d1);
    let b = d1.dot(&d2);
    let c = d2.dot(&d2);
    let w = o1 - o2;
    let d = d1.dot(&w);
    let e = d2.dot(&w);
    let denom = a * c - b * b;
    if denom.abs() < EPS * a * c {
        return Err(GlensError::ParallelNodalLines);
    }
    let s = (b * e - c * d) / denom;
    let t = (a * e - b * d) / denom;
    let p1 = o1 + d1 * s;
    let p2 = o2 + d2 * t;
    let miss = (p1 - p2).norm();
    if miss > PAIR_TOL {
        return Err(GlensError::SkewNodalLines { distance: miss });
    }
    Ok((p1 + p2) * 0.5)
}
