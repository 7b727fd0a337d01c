//! World module - scenes and the solids they are built from
//!
//! - Built-in solid generators (triangle, square, cube, axis, grid, icosphere, points)
//! - Scene container with RON load/save

mod scene;
pub mod solids;

pub use scene::*;
