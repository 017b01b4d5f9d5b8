//! `Point` — a 3D coordinate plus a scalar `value` field reused for either a
//! level-set sample or a metric size (spec.md §3).

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub position: [f64; 3],
    pub value: f64,
}

impl Point {
    pub fn new(position: [f64; 3]) -> Self {
        Self {
            position,
            value: 0.0,
        }
    }

    pub fn with_value(position: [f64; 3], value: f64) -> Self {
        Self { position, value }
    }
}
