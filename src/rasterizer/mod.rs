//! Configurable software rasterizer
//!
//! Stages, in order:
//! - Transform by the combined projection/view/model matrix
//! - Fast reject against the clip volume
//! - Near-plane clip in clip space
//! - Perspective divide (position only or every attribute)
//! - Frustum clip in NDC
//! - Viewport mapping, rasterization, pixel write

mod camera;
mod clip;
mod image;
mod pipeline;
mod pixel;
mod raster;
mod render;
mod types;

pub use self::camera::*;
pub use self::clip::*;
pub use self::image::*;
pub use self::pipeline::*;
pub use self::pixel::*;
pub use self::raster::*;
pub use self::render::*;
pub use self::types::*;
