//! C1 — primitive Gaussian evaluator.
//!
//! Closed-form value / gradient / Hessian of a Cartesian Gaussian primitive
//! `f(r) = c * P_tau(r - R) * exp(-alpha |r - R|^2)`, generalized from the
//! teacher's `basis/primitive.rs` (which hard-codes a single `(lx,ly,lz)`
//! triple per primitive) to the full s..f angular-type table the spec names.

use crate::error::Error;

/// One of the 20 fixed Cartesian angular types, s through f.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum AngularType {
    S = 1,
    Px = 2,
    Py = 3,
    Pz = 4,
    Dxx = 5,
    Dyy = 6,
    Dzz = 7,
    Dxy = 8,
    Dxz = 9,
    Dyz = 10,
    Fxxx = 11,
    Fyyy = 12,
    Fzzz = 13,
    Fxxy = 14,
    Fxxz = 15,
    Fyyz = 16,
    Fxyy = 17,
    Fxzz = 18,
    Fyzz = 19,
    Fxyz = 20,
}

impl AngularType {
    /// Resolves a wire/file angular-type code.
    ///
    /// Per the redesign flag on spec.md's open question, an out-of-range
    /// code is a hard `InvalidChemistry` error rather than a silent
    /// fallback to s-type: that fallback was flagged as likely to mask
    /// data corruption (e.g. an unsupported g-type scored as spherical).
    pub fn from_code(code: i32) -> Result<Self, Error> {
        use AngularType::*;
        Ok(match code {
            1 => S,
            2 => Px,
            3 => Py,
            4 => Pz,
            5 => Dxx,
            6 => Dyy,
            7 => Dzz,
            8 => Dxy,
            9 => Dxz,
            10 => Dyz,
            11 => Fxxx,
            12 => Fyyy,
            13 => Fzzz,
            14 => Fxxy,
            15 => Fxxz,
            16 => Fyyz,
            17 => Fxyy,
            18 => Fxzz,
            19 => Fyzz,
            20 => Fxyz,
            other => {
                return Err(Error::InvalidChemistry {
                    component: "AngularType",
                    what: "angular type code outside 1..20",
                    value: other.to_string(),
                })
            }
        })
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    /// Cartesian monomial exponents `(lx, ly, lz)`.
    pub fn powers(self) -> [i32; 3] {
        use AngularType::*;
        match self {
            S => [0, 0, 0],
            Px => [1, 0, 0],
            Py => [0, 1, 0],
            Pz => [0, 0, 1],
            Dxx => [2, 0, 0],
            Dyy => [0, 2, 0],
            Dzz => [0, 0, 2],
            Dxy => [1, 1, 0],
            Dxz => [1, 0, 1],
            Dyz => [0, 1, 1],
            Fxxx => [3, 0, 0],
            Fyyy => [0, 3, 0],
            Fzzz => [0, 0, 3],
            Fxxy => [2, 1, 0],
            Fxxz => [2, 0, 1],
            Fyyz => [0, 2, 1],
            Fxyy => [1, 2, 0],
            Fxzz => [1, 0, 2],
            Fyzz => [0, 1, 2],
            Fxyz => [1, 1, 1],
        }
    }

    pub fn total_degree(self) -> i32 {
        let p = self.powers();
        p[0] + p[1] + p[2]
    }
}

/// Partial derivative of the monomial `d^lx * d^ly * d^lz` with respect to
/// the multi-index `order`, evaluated at local (nucleus-relative)
/// coordinates `d`. Returns zero once `order` exceeds `powers` on any axis —
/// this single routine is what lets the evaluator cover value, gradient and
/// Hessian for every angular type up to f with no per-type special-casing.
fn monomial_partial(d: [f64; 3], powers: [i32; 3], order: [i32; 3]) -> f64 {
    let mut coeff = 1.0;
    let mut value = 1.0;
    for k in 0..3 {
        let (l, o) = (powers[k], order[k]);
        if o > l {
            return 0.0;
        }
        let mut falling = 1.0;
        for m in 0..o {
            falling *= (l - m) as f64;
        }
        coeff *= falling;
        value *= d[k].powi(l - o);
    }
    coeff * value
}

/// Value of the bare Cartesian monomial `(x-A)^lx * (y-A)^ly * (z-A)^lz` at
/// local coordinates `d`, with no Gaussian factor. Exposed for the overlap
/// engine (C7), which evaluates primitive products against a fused Gaussian
/// exponential rather than each primitive's own.
pub fn monomial_value(powers: [i32; 3], d: [f64; 3]) -> f64 {
    monomial_partial(d, powers, [0, 0, 0])
}

/// A single primitive Cartesian Gaussian, referencing its owning nucleus by
/// index into `ChemicalSystem::nuclei` (spec.md §3: `Primitive` is
/// `(nucleus_ref, angular_type, exponent, coefficient)`).
#[derive(Clone, Copy, Debug)]
pub struct Primitive {
    pub nucleus_ref: usize,
    pub angular_type: AngularType,
    pub exponent: f64,
    pub coefficient: f64,
}

impl Primitive {
    pub fn new(
        nucleus_ref: usize,
        angular_type: AngularType,
        exponent: f64,
        coefficient: f64,
    ) -> Result<Self, Error> {
        if !(exponent > 0.0) {
            return Err(Error::NumericalError {
                component: "Primitive",
                what: "non-positive Gaussian exponent",
                value: exponent.to_string(),
            });
        }
        Ok(Self {
            nucleus_ref,
            angular_type,
            exponent,
            coefficient,
        })
    }

    /// Evaluates this primitive at `point`, relative to `center` (the owning
    /// nucleus position), accumulating into caller-owned `grad` and `hess`
    /// buffers (Hessian stored as `[xx, yy, zz, xy, xz, yz]`). Buffers must
    /// be zeroed by the caller before the first primitive is accumulated.
    /// Returns the primitive's own scalar value (not accumulated into
    /// anything — only gradient/Hessian are accumulator outputs).
    pub fn eval_accumulate(
        &self,
        center: [f64; 3],
        point: [f64; 3],
        grad: &mut [f64; 3],
        hess: &mut [f64; 6],
    ) -> f64 {
        if self.coefficient == 0.0 {
            return 0.0;
        }

        let d = [
            point[0] - center[0],
            point[1] - center[1],
            point[2] - center[2],
        ];
        let r2 = d[0] * d[0] + d[1] * d[1] + d[2] * d[2];
        let alpha = self.exponent;
        let e = (-alpha * r2).exp();
        let c = self.coefficient;
        let l = self.angular_type.powers();

        let p = monomial_partial(d, l, [0, 0, 0]);
        let value = c * p * e;

        let axes = [[1, 0, 0], [0, 1, 0], [0, 0, 1]];
        let mut p_axis = [0.0; 3];
        for k in 0..3 {
            p_axis[k] = monomial_partial(d, l, axes[k]);
        }
        for k in 0..3 {
            // d/da f = c * E * (Pa - 2*alpha*a*P)
            grad[k] += c * e * (p_axis[k] - 2.0 * alpha * d[k] * p);
        }

        // Hessian, 3x3 symmetric stored as [xx,yy,zz,xy,xz,yz].
        // H_ab = c*E*[ Pab - 2*alpha*(a*Pb + b*Pa) + 4*alpha^2*a*b*P - 2*alpha*delta_ab*P ]
        let second_order = [
            ([2, 0, 0], 0, 0),
            ([0, 2, 0], 1, 1),
            ([0, 0, 2], 2, 2),
            ([1, 1, 0], 0, 1),
            ([1, 0, 1], 0, 2),
            ([0, 1, 1], 1, 2),
        ];
        for (idx, (order, a, b)) in second_order.iter().enumerate() {
            let p_ab = monomial_partial(d, l, *order);
            let delta = if a == b { 1.0 } else { 0.0 };
            let h = c
                * e
                * (p_ab
                    - 2.0 * alpha * (d[*a] * p_axis[*b] + d[*b] * p_axis[*a])
                    + 4.0 * alpha * alpha * d[*a] * d[*b] * p
                    - 2.0 * alpha * delta * p);
            hess[idx] += h;
        }

        value
    }

    /// The primitive's scalar value alone, without accumulating gradient or
    /// Hessian. Cheaper than `eval_accumulate` for call sites (the overlap
    /// engine's quadrature loop) that only need the value.
    pub fn value_only(&self, center: [f64; 3], point: [f64; 3]) -> f64 {
        if self.coefficient == 0.0 {
            return 0.0;
        }
        let d = [
            point[0] - center[0],
            point[1] - center[1],
            point[2] - center[2],
        ];
        let r2 = d[0] * d[0] + d[1] * d[1] + d[2] * d[2];
        let e = (-self.exponent * r2).exp();
        self.coefficient * monomial_value(self.angular_type.powers(), d) * e
    }
}
