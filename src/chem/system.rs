//! `ChemicalSystem` — the mapping bundle of nuclei, molecular orbitals and
//! determinants, plus their derived counts (spec.md §3).

use crate::chem::determinant::Determinant;
use crate::chem::nucleus::Nucleus;
use crate::chem::orbital::{MolecularOrbital, Spin};
use crate::error::Error;

#[derive(Clone, Debug)]
pub struct ChemicalSystem {
    pub nuclei: Vec<Nucleus>,
    pub orbitals: Vec<MolecularOrbital>,
    pub determinants: Vec<Determinant>,
}

impl ChemicalSystem {
    pub fn new(
        nuclei: Vec<Nucleus>,
        orbitals: Vec<MolecularOrbital>,
        determinants: Vec<Determinant>,
    ) -> Result<Self, Error> {
        let system = Self {
            nuclei,
            orbitals,
            determinants,
        };
        system.validate()?;
        Ok(system)
    }

    fn validate(&self) -> Result<(), Error> {
        for prim in self.orbitals.iter().flat_map(|o| o.primitives.iter()) {
            if prim.nucleus_ref >= self.nuclei.len() {
                return Err(Error::InvalidChemistry {
                    component: "ChemicalSystem",
                    what: "primitive references an out-of-range nucleus",
                    value: prim.nucleus_ref.to_string(),
                });
            }
        }
        for det in &self.determinants {
            for &orb_ref in &det.orbitals {
                if orb_ref >= self.orbitals.len() {
                    return Err(Error::InvalidChemistry {
                        component: "ChemicalSystem",
                        what: "determinant references an out-of-range orbital",
                        value: orb_ref.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn nnucl(&self) -> usize {
        self.nuclei.len()
    }

    pub fn nmorb(&self) -> usize {
        self.orbitals.len()
    }

    pub fn nprim(&self) -> usize {
        self.orbitals.iter().map(|o| o.primitives.len()).sum()
    }

    pub fn ndet(&self) -> usize {
        self.determinants.len()
    }

    /// Number of electrons: the (common, for a valid system) orbital count
    /// per determinant.
    pub fn ne(&self) -> usize {
        self.determinants.first().map_or(0, |d| d.orbitals.len())
    }

    /// Whether the chemistry is a restricted-Hartree-Fock spin-pair layout:
    /// every determinant agrees, and each orbital referenced under RHF has
    /// a spin-paired twin at the same spatial part, per
    /// `original_source/loadChemistry.h`'s documented restricted/
    /// unrestricted distinction.
    pub fn is_rhf(&self) -> bool {
        !self.determinants.is_empty() && self.determinants.iter().all(|d| d.rhf)
    }

    /// Orbitals matching `spin`, optionally restricted to the positive-spin
    /// half under RHF pairing (spec.md §4.5 metric-builder rule).
    pub fn orbitals_for_metric_pairs(&self) -> Vec<usize> {
        if self.is_rhf() {
            (0..self.orbitals.len())
                .filter(|&i| self.orbitals[i].spin == Spin::Alpha)
                .collect()
        } else {
            (0..self.orbitals.len()).collect()
        }
    }
}
