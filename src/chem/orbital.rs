//! C2 — orbital and orbital-product evaluator.

use crate::chem::nucleus::Nucleus;
use crate::chem::primitive::Primitive;
use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Spin {
    Alpha,
    Beta,
}

impl Spin {
    pub fn from_raw(raw: i32) -> Result<Self, Error> {
        match raw {
            1 => Ok(Spin::Alpha),
            -1 => Ok(Spin::Beta),
            other => Err(Error::InvalidChemistry {
                component: "Spin",
                what: "spin must be +1 or -1",
                value: other.to_string(),
            }),
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            Spin::Alpha => 1,
            Spin::Beta => -1,
        }
    }
}

/// A molecular orbital: a linear combination of Gaussian primitives.
///
/// `pgauss` is the sparse index of non-zero-coefficient primitives (spec.md
/// §3): an optimization over iterating `primitives` directly, since real
/// basis sets routinely carry zero contraction coefficients for a given
/// shell/nucleus combination.
#[derive(Clone, Debug)]
pub struct MolecularOrbital {
    pub primitives: Vec<Primitive>,
    pub spin: Spin,
    pgauss: Vec<usize>,
}

impl MolecularOrbital {
    pub fn new(primitives: Vec<Primitive>, spin: Spin) -> Result<Self, Error> {
        let pgauss: Vec<usize> = primitives
            .iter()
            .enumerate()
            .filter(|(_, p)| p.coefficient != 0.0)
            .map(|(i, _)| i)
            .collect();
        if pgauss.is_empty() {
            return Err(Error::InvalidChemistry {
                component: "MolecularOrbital",
                what: "orbital is identically zero (ngauss must be >= 1)",
                value: primitives.len().to_string(),
            });
        }
        Ok(Self {
            primitives,
            spin,
            pgauss,
        })
    }

    pub fn ngauss(&self) -> usize {
        self.pgauss.len()
    }

    /// The non-zero-coefficient primitives, in storage order.
    pub fn active_primitives(&self) -> impl Iterator<Item = &Primitive> + '_ {
        self.pgauss.iter().map(move |&idx| &self.primitives[idx])
    }

    /// Value, gradient and Hessian of this orbital at `point`, given the
    /// nuclei array it references primitives into.
    pub fn eval(&self, nuclei: &[Nucleus], point: [f64; 3]) -> (f64, [f64; 3], [f64; 6]) {
        let mut value = 0.0;
        let mut grad = [0.0; 3];
        let mut hess = [0.0; 6];
        for &idx in &self.pgauss {
            let prim = &self.primitives[idx];
            let center = nuclei[prim.nucleus_ref].position;
            value += prim.eval_accumulate(center, point, &mut grad, &mut hess);
        }
        (value, grad, hess)
    }
}

/// Exact Hessian of the orbital product `psi = phi_i * phi_j` at a point,
/// given each orbital's own (value, gradient, Hessian) triple there:
///
/// H_ab(psi) = H_ab(phi_i)*phi_j + d_a phi_i * d_b phi_j
///             + d_b phi_i * d_a phi_j + phi_i * H_ab(phi_j)
pub fn product_hessian(
    (vi, gi, hi): (f64, [f64; 3], [f64; 6]),
    (vj, gj, hj): (f64, [f64; 3], [f64; 6]),
) -> [f64; 6] {
    // index -> (a,b) axis pair matching the [xx,yy,zz,xy,xz,yz] layout
    const PAIRS: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (0, 1), (0, 2), (1, 2)];
    let mut out = [0.0; 6];
    for (k, (a, b)) in PAIRS.into_iter().enumerate() {
        out[k] = hi[k] * vj + gi[a] * gj[b] + gi[b] * gj[a] + vi * hj[k];
    }
    out
}

/// Value of the orbital product `psi = phi_i * phi_j` at a point.
pub fn product_value(vi: f64, vj: f64) -> f64 {
    vi * vj
}

/// Gradient of the orbital product via the ordinary product rule.
pub fn product_gradient(vi: f64, gi: [f64; 3], vj: f64, gj: [f64; 3]) -> [f64; 3] {
    [
        gi[0] * vj + vi * gj[0],
        gi[1] * vj + vi * gj[1],
        gi[2] * vj + vi * gj[2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::primitive::AngularType;

    fn h1s(exp: f64, coeff: f64) -> MolecularOrbital {
        let prim = Primitive::new(0, AngularType::S, exp, coeff).unwrap();
        MolecularOrbital::new(vec![prim], Spin::Alpha).unwrap()
    }

    #[test]
    fn orbital_linear_in_coefficients() {
        let nuclei = [Nucleus::new([0.0; 3], 1.0).unwrap()];
        let orb_a = h1s(1.0, 1.0);
        let orb_b = h1s(1.0, 3.0);
        let point = [0.3, 0.1, -0.2];
        let (va, _, _) = orb_a.eval(&nuclei, point);
        let (vb, _, _) = orb_b.eval(&nuclei, point);
        assert!((3.0 * va - vb).abs() < 1e-12);
    }

    #[test]
    fn empty_orbital_is_rejected() {
        let zero_prim = Primitive::new(0, AngularType::S, 1.0, 0.0).unwrap();
        assert!(MolecularOrbital::new(vec![zero_prim], Spin::Alpha).is_err());
    }

    #[test]
    fn product_hessian_matches_finite_difference() {
        let nuclei = [
            Nucleus::new([0.0, 0.0, 0.0], 1.0).unwrap(),
            Nucleus::new([0.7, 0.0, 0.0], 1.0).unwrap(),
        ];
        let prim_i = Primitive::new(0, AngularType::Px, 1.1, 1.0).unwrap();
        let prim_j = Primitive::new(1, AngularType::S, 0.9, 1.0).unwrap();
        let orb_i = MolecularOrbital::new(vec![prim_i], Spin::Alpha).unwrap();
        let orb_j = MolecularOrbital::new(vec![prim_j], Spin::Alpha).unwrap();

        let point = [0.2, 0.1, -0.1];
        let h = 1e-4;

        let analytic = product_hessian(orb_i.eval(&nuclei, point), orb_j.eval(&nuclei, point));

        // Numeric d^2(psi)/dx^2
        let psi = |p: [f64; 3]| -> f64 {
            let (vi, _, _) = orb_i.eval(&nuclei, p);
            let (vj, _, _) = orb_j.eval(&nuclei, p);
            vi * vj
        };
        let mut px = point;
        px[0] += h;
        let mut mx = point;
        mx[0] -= h;
        let numeric_xx = (psi(px) - 2.0 * psi(point) + psi(mx)) / (h * h);
        assert!((analytic[0] - numeric_xx).abs() < 1e-2);
    }

    #[test]
    fn spin_round_trips() {
        assert_eq!(Spin::from_raw(1).unwrap(), Spin::Alpha);
        assert_eq!(Spin::from_raw(-1).unwrap(), Spin::Beta);
        assert!(Spin::from_raw(0).is_err());
    }
}
