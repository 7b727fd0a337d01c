//! Vis Engine: configurable CPU software rasterizer
//!
//! Every stage between the model matrix and the pixel write can be swapped
//! or disabled per primitive type:
//! - Fast reject and near-plane clipping in clip space
//! - Position-only or perspective-correct dehomogenization
//! - Sutherland-Hodgman frustum clipping in NDC
//! - Scanline triangles, DDA lines, points
//! - Depth-tested, overwrite, depth-as-gray and checkerboard pixel writes

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod rasterizer;
pub mod world;
