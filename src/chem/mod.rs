//! Chemistry data model and evaluators (C1, C2 of the specification).

pub mod determinant;
pub mod nucleus;
pub mod orbital;
pub mod primitive;
pub mod system;

pub use determinant::Determinant;
pub use nucleus::Nucleus;
pub use orbital::{MolecularOrbital, Spin};
pub use primitive::{AngularType, Primitive};
pub use system::ChemicalSystem;
