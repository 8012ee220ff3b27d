//! Core types for spoor.

mod classification;
mod detection;

pub use classification::*;
pub use detection::*;
