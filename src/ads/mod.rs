//! Promotional ad selection, rotation and in-article placement.

mod placement;
mod rotation;
mod targeting;

pub use placement::*;
pub use rotation::*;
pub use targeting::*;
