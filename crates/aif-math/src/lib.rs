//! Active inference math utilities.

pub mod math;

pub use math::categorical::*;
pub use math::dirichlet;
pub use math::stable::*;
