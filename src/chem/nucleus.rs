//! Nucleus data container — immutable once loaded (spec.md §3).

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nucleus {
    pub position: [f64; 3],
    pub charge: f64,
}

impl Nucleus {
    pub fn new(position: [f64; 3], charge: f64) -> Result<Self, Error> {
        if !(1.0..=100.0).contains(&charge) {
            return Err(Error::InvalidChemistry {
                component: "Nucleus",
                what: "charge outside [1,100]",
                value: charge.to_string(),
            });
        }
        Ok(Self { position, charge })
    }
}
