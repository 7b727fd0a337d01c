//! Configurable per-topology stage sequence.
//!
//! A primitive goes through transform, fast reject, clip before the divide,
//! dehomogenization, clip after the divide, viewport mapping and
//! rasterization. Each stage is a small enum chosen in `Pipeline`, and
//! every one has a `None` variant so the pipeline can be cut short for
//! inspection.

use glam::{DMat4, DVec4};
use serde::{Deserialize, Serialize};

use super::clip;
use super::image::{DepthBuffer, Framebuffer};
use super::pixel::PixelWrite;
use super::raster;
use super::types::{Topology, Vertex};

/// Next entry of `all` after `current`, wrapping around
pub fn cycle<T: Copy + PartialEq>(all: &[T], current: T) -> T {
    let i = all.iter().position(|&v| v == current).unwrap_or(0);
    all[(i + 1) % all.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transform {
    /// Multiply positions by the combined matrix
    Matrix,
    None,
}

impl Transform {
    pub const ALL: [Transform; 2] = [Transform::Matrix, Transform::None];

    pub fn label(self) -> &'static str {
        match self {
            Transform::Matrix => "Matrix",
            Transform::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FastReject {
    /// Discard when every vertex is outside one clip plane
    Planes,
    None,
}

impl FastReject {
    pub const ALL: [FastReject; 2] = [FastReject::Planes, FastReject::None];

    pub fn label(self) -> &'static str {
        match self {
            FastReject::Planes => "Planes",
            FastReject::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipBeforeDehomog {
    /// Clip against z = 0 in clip space
    Near,
    None,
}

impl ClipBeforeDehomog {
    pub const ALL: [ClipBeforeDehomog; 2] = [ClipBeforeDehomog::Near, ClipBeforeDehomog::None];

    pub fn label(self) -> &'static str {
        match self {
            ClipBeforeDehomog::Near => "Near plane",
            ClipBeforeDehomog::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dehomogenize {
    /// Divide x, y, z by w
    Position,
    /// Divide the whole vertex by w (perspective-correct attributes)
    All,
    None,
}

impl Dehomogenize {
    pub const ALL: [Dehomogenize; 3] = [Dehomogenize::Position, Dehomogenize::All, Dehomogenize::None];

    pub fn label(self) -> &'static str {
        match self {
            Dehomogenize::Position => "Position",
            Dehomogenize::All => "All attributes",
            Dehomogenize::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipAfterDehomog {
    /// Clip against x = ±1, y = ±1, z = 1 in NDC
    Frustum,
    None,
}

impl ClipAfterDehomog {
    pub const ALL: [ClipAfterDehomog; 2] = [ClipAfterDehomog::Frustum, ClipAfterDehomog::None];

    pub fn label(self) -> &'static str {
        match self {
            ClipAfterDehomog::Frustum => "Frustum",
            ClipAfterDehomog::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Viewport {
    /// NDC to pixel coordinates
    Map,
    None,
}

impl Viewport {
    pub const ALL: [Viewport; 2] = [Viewport::Map, Viewport::None];

    pub fn label(self) -> &'static str {
        match self {
            Viewport::Map => "Map",
            Viewport::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rasterization {
    Points,
    LineDda,
    TriangleFill,
    /// Triangle outlines through the line rasterizer
    TriangleEdges,
    None,
}

impl Rasterization {
    pub const ALL: [Rasterization; 5] = [
        Rasterization::Points,
        Rasterization::LineDda,
        Rasterization::TriangleFill,
        Rasterization::TriangleEdges,
        Rasterization::None,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Rasterization::Points => "Points",
            Rasterization::LineDda => "Line DDA",
            Rasterization::TriangleFill => "Triangle fill",
            Rasterization::TriangleEdges => "Triangle edges",
            Rasterization::None => "None",
        }
    }

    fn draw(self, vertices: &[Vertex], width: usize, height: usize, plot: &mut impl FnMut(Vertex)) {
        match self {
            Rasterization::Points => raster::draw_points(vertices, plot),
            Rasterization::LineDda => {
                for line in vertices.chunks_exact(2) {
                    raster::draw_line(&line[0], &line[1], width, height, plot);
                }
            }
            Rasterization::TriangleFill => {
                for tri in vertices.chunks_exact(3) {
                    raster::fill_triangle(&tri[0], &tri[1], &tri[2], width, height, plot);
                }
            }
            Rasterization::TriangleEdges => {
                for tri in vertices.chunks_exact(3) {
                    raster::draw_triangle_edges(&tri[0], &tri[1], &tri[2], width, height, plot);
                }
            }
            Rasterization::None => {}
        }
    }
}

/// What happened to a primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Wrong vertex count for the topology
    Malformed,
    /// Discarded by the fast reject stage
    Rejected,
    /// Nothing left after clipping or the divide
    Clipped,
    /// Reached rasterization
    Drawn,
}

/// Stage selection for one topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub topology: Topology,
    pub transform: Transform,
    pub fast_reject: FastReject,
    pub clip_before_dehomog: ClipBeforeDehomog,
    pub dehomogenize: Dehomogenize,
    pub clip_after_dehomog: ClipAfterDehomog,
    pub viewport: Viewport,
    pub rasterization: Rasterization,
    pub pixel_write: PixelWrite,
}

impl Pipeline {
    /// Full render pipeline for a topology
    pub fn for_topology(topology: Topology) -> Self {
        let rasterization = match topology {
            Topology::Point => Rasterization::Points,
            Topology::Line => Rasterization::LineDda,
            Topology::Triangle => Rasterization::TriangleFill,
        };

        Self {
            topology,
            transform: Transform::Matrix,
            fast_reject: FastReject::Planes,
            clip_before_dehomog: ClipBeforeDehomog::Near,
            dehomogenize: Dehomogenize::All,
            clip_after_dehomog: ClipAfterDehomog::Frustum,
            viewport: Viewport::Map,
            rasterization,
            pixel_write: PixelWrite::DepthTested,
        }
    }

    pub fn points() -> Self {
        Self::for_topology(Topology::Point)
    }

    pub fn lines() -> Self {
        Self::for_topology(Topology::Line)
    }

    pub fn triangles() -> Self {
        Self::for_topology(Topology::Triangle)
    }

    /// Pipeline without any clipping, drawn over everything. Shows geometry
    /// exactly as the projection produces it.
    pub fn inspection(topology: Topology) -> Self {
        Self {
            fast_reject: FastReject::None,
            clip_before_dehomog: ClipBeforeDehomog::None,
            clip_after_dehomog: ClipAfterDehomog::None,
            pixel_write: PixelWrite::Overwrite,
            ..Self::for_topology(topology)
        }
    }

    /// Run one primitive through every stage. `vertices` is used as scratch
    /// space and holds the rasterized vertices afterwards.
    pub fn render(&self, vertices: &mut Vec<Vertex>, matrix: &DMat4, fb: &mut Framebuffer) -> Outcome {
        if vertices.len() != self.topology.vertices_per() {
            return Outcome::Malformed;
        }

        if self.transform == Transform::Matrix {
            for vertex in vertices.iter_mut() {
                vertex.pos = *matrix * vertex.pos;
            }
        }

        if self.fast_reject == FastReject::Planes && clip::fast_reject(vertices) {
            return Outcome::Rejected;
        }

        if self.clip_before_dehomog == ClipBeforeDehomog::Near {
            clip::clip_near(vertices, self.topology);
        }

        match self.dehomogenize {
            Dehomogenize::Position => vertices.iter_mut().for_each(Vertex::dehomogenize_position),
            Dehomogenize::All => vertices.iter_mut().for_each(Vertex::dehomogenize_all),
            Dehomogenize::None => {}
        }
        clip::retain_finite(vertices, self.topology);

        if self.clip_after_dehomog == ClipAfterDehomog::Frustum {
            clip::clip_ndc(vertices, self.topology);
        }

        if vertices.is_empty() {
            return Outcome::Clipped;
        }

        let (width, height) = (fb.width(), fb.height());
        if self.viewport == Viewport::Map {
            raster::map_to_viewport(vertices, width, height);
        }

        let pixel_write = self.pixel_write;
        self.rasterization.draw(vertices, width, height, &mut |v| {
            pixel_write.apply(&v, fb);
        });

        Outcome::Drawn
    }
}

/// Explicit pipeline selection handed to the renderer every frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub point: Pipeline,
    pub line: Pipeline,
    pub triangle: Pipeline,
    pub clear_color: DVec4,
    pub clear_depth: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            point: Pipeline::points(),
            line: Pipeline::lines(),
            triangle: Pipeline::triangles(),
            clear_color: DVec4::new(0.02, 0.02, 0.02, 1.0),
            clear_depth: DepthBuffer::FAR,
        }
    }
}

impl PipelineConfig {
    /// Every topology through `Pipeline::inspection`
    pub fn inspection() -> Self {
        Self {
            point: Pipeline::inspection(Topology::Point),
            line: Pipeline::inspection(Topology::Line),
            triangle: Pipeline::inspection(Topology::Triangle),
            ..Self::default()
        }
    }

    pub fn pipeline(&self, topology: Topology) -> &Pipeline {
        match topology {
            Topology::Point => &self.point,
            Topology::Line => &self.line,
            Topology::Triangle => &self.triangle,
        }
    }

    pub fn pipeline_mut(&mut self, topology: Topology) -> &mut Pipeline {
        match topology {
            Topology::Point => &mut self.point,
            Topology::Line => &mut self.line,
            Topology::Triangle => &mut self.triangle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::types::Color;

    const RED: DVec4 = DVec4::new(1.0, 0.0, 0.0, 1.0);
    const GREEN: DVec4 = DVec4::new(0.0, 1.0, 0.0, 1.0);
    const BLUE: DVec4 = DVec4::new(0.0, 0.0, 1.0, 1.0);

    fn ndc(x: f64, y: f64, z: f64, color: DVec4) -> Vertex {
        Vertex::new(DVec4::new(x, y, z, 1.0), color, Default::default())
    }

    fn cleared(width: usize, height: usize) -> Framebuffer {
        let mut fb = Framebuffer::new(width, height).expect("framebuffer");
        fb.clear(DVec4::new(0.0, 0.0, 0.0, 1.0), 1.0);
        fb
    }

    #[test]
    fn test_red_triangle_scenario() {
        let mut fb = cleared(10, 10);
        let mut vertices = vec![ndc(-1.0, -1.0, 0.5, RED), ndc(1.0, -1.0, 0.5, RED), ndc(0.0, 1.0, 0.5, RED)];

        let outcome = Pipeline::triangles().render(&mut vertices, &DMat4::IDENTITY, &mut fb);
        assert_eq!(outcome, Outcome::Drawn);

        // Interior
        for (x, y) in [(4, 5), (5, 5), (4, 2), (1, 9), (8, 9)] {
            assert_eq!(fb.image.get_color(x, y), Some(Color::RED), "pixel ({x}, {y})");
            assert_eq!(fb.depth.get_depth(x, y), Some(0.5));
        }

        // Outside the footprint
        for (x, y) in [(0, 0), (9, 0), (0, 4), (9, 4), (0, 1)] {
            assert_eq!(fb.image.get_color(x, y), Some(Color::BLACK), "pixel ({x}, {y})");
            assert_eq!(fb.depth.get_depth(x, y), Some(1.0));
        }
    }

    #[test]
    fn test_pixel_write_runs_once_per_covered_pixel() {
        let mut fb = cleared(9, 9);
        let mut pipeline = Pipeline::triangles();
        pipeline.pixel_write = PixelWrite::Overwrite;

        let mut vertices = vec![ndc(-1.0, -1.0, 0.5, RED), ndc(1.0, 0.0, 0.5, RED), ndc(-1.0, 1.0, 0.5, RED)];
        assert_eq!(pipeline.render(&mut vertices, &DMat4::IDENTITY, &mut fb), Outcome::Drawn);

        let covered = (0..9)
            .flat_map(|y| (0..9).map(move |x| (x, y)))
            .filter(|&(x, y)| fb.image.get_color(x, y) == Some(Color::RED))
            .count();
        assert!(covered > 0);
        assert_eq!(fb.pixels_written(), covered);
    }

    #[test]
    fn test_depth_test_either_order() {
        let near = [ndc(-1.0, -1.0, 0.25, GREEN), ndc(1.0, -1.0, 0.25, GREEN), ndc(0.0, 1.0, 0.25, GREEN)];
        let far = [ndc(-1.0, 1.0, 0.75, BLUE), ndc(1.0, 1.0, 0.75, BLUE), ndc(0.0, -1.0, 0.75, BLUE)];

        for order in [[near, far], [far, near]] {
            let mut fb = cleared(16, 16);
            for tri in order {
                let mut vertices = tri.to_vec();
                Pipeline::triangles().render(&mut vertices, &DMat4::IDENTITY, &mut fb);
            }
            assert_eq!(fb.image.get_color(8, 8), Some(Color::GREEN));
            assert_eq!(fb.depth.get_depth(8, 8), Some(0.25));
        }
    }

    #[test]
    fn test_fast_reject_writes_nothing() {
        let mut fb = cleared(8, 8);
        let mut vertices = vec![ndc(1.5, 0.0, 0.5, RED), ndc(3.0, 0.5, 0.5, RED), ndc(2.0, -0.5, 0.5, RED)];
        let outcome = Pipeline::triangles().render(&mut vertices, &DMat4::IDENTITY, &mut fb);

        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(fb.pixels_written(), 0);
    }

    #[test]
    fn test_line_behind_near_plane() {
        let mut full = Pipeline::lines();
        let mut fb = cleared(8, 8);
        let behind = [ndc(-0.5, 0.0, -0.5, RED), ndc(0.5, 0.0, 0.0, RED)];

        let mut vertices = behind.to_vec();
        assert_eq!(full.render(&mut vertices, &DMat4::IDENTITY, &mut fb), Outcome::Clipped);

        // Without the fast reject the near clip still drops it
        full.fast_reject = FastReject::None;
        let mut vertices = behind.to_vec();
        assert_eq!(full.render(&mut vertices, &DMat4::IDENTITY, &mut fb), Outcome::Clipped);

        let mut vertices = vec![ndc(-0.5, 0.0, -0.5, RED), ndc(0.5, 0.0, -0.2, RED)];
        assert_eq!(Pipeline::lines().render(&mut vertices, &DMat4::IDENTITY, &mut fb), Outcome::Rejected);

        assert_eq!(fb.pixels_written(), 0);
    }

    #[test]
    fn test_viewport_corner_round_trip() {
        let mut fb = cleared(6, 4);
        let mut points = Pipeline::points();
        points.pixel_write = PixelWrite::Overwrite;

        let mut low = vec![ndc(-1.0, -1.0, 0.5, RED)];
        points.render(&mut low, &DMat4::IDENTITY, &mut fb);
        let mut high = vec![ndc(1.0, 1.0, 0.5, BLUE)];
        points.render(&mut high, &DMat4::IDENTITY, &mut fb);

        assert_eq!(fb.image.get_color(0, 3), Some(Color::RED));
        assert_eq!(fb.image.get_color(5, 0), Some(Color::BLUE));
        assert_eq!(fb.pixels_written(), 2);
    }

    #[test]
    fn test_malformed_primitive() {
        let mut fb = cleared(4, 4);
        let mut vertices = vec![ndc(0.0, 0.0, 0.5, RED)];
        assert_eq!(Pipeline::triangles().render(&mut vertices, &DMat4::IDENTITY, &mut fb), Outcome::Malformed);
    }

    #[test]
    fn test_zero_w_is_dropped() {
        let mut fb = cleared(4, 4);
        let mut pipeline = Pipeline::lines();
        pipeline.fast_reject = FastReject::None;
        pipeline.clip_before_dehomog = ClipBeforeDehomog::None;

        let mut vertices = vec![
            Vertex::new(DVec4::new(0.0, 0.0, 0.0, 0.0), RED, Default::default()),
            ndc(0.5, 0.5, 0.5, RED),
        ];
        assert_eq!(pipeline.render(&mut vertices, &DMat4::IDENTITY, &mut fb), Outcome::Clipped);
        assert_eq!(fb.pixels_written(), 0);
    }

    #[test]
    fn test_none_stages_stop_early() {
        let mut fb = cleared(8, 8);
        let mut pipeline = Pipeline::triangles();
        pipeline.rasterization = Rasterization::None;

        let mut vertices = vec![ndc(-1.0, -1.0, 0.5, RED), ndc(1.0, -1.0, 0.5, RED), ndc(0.0, 1.0, 0.5, RED)];
        assert_eq!(pipeline.render(&mut vertices, &DMat4::IDENTITY, &mut fb), Outcome::Drawn);
        assert_eq!(fb.pixels_written(), 0);

        // Viewport mapping ran, so the vertices are in pixel space now
        assert_eq!(vertices[1].pos.x, 7.0);
    }

    #[test]
    fn test_partially_visible_triangle_is_clipped_and_drawn() {
        let mut fb = cleared(8, 8);
        let mut vertices = vec![ndc(-3.0, -3.0, 0.5, RED), ndc(3.0, -3.0, 0.5, RED), ndc(0.0, 3.0, 0.5, RED)];
        assert_eq!(Pipeline::triangles().render(&mut vertices, &DMat4::IDENTITY, &mut fb), Outcome::Drawn);

        assert!(vertices.len() > 3);
        assert!(vertices.iter().all(|v| v.pos.x >= -1e-9 && v.pos.x <= 7.0 + 1e-9));
        assert_eq!(fb.image.get_color(4, 4), Some(Color::RED));
    }

    #[test]
    fn test_perspective_correct_color() {
        // One edge at w = 1, the other at w = 3. Halfway across the screen
        // the perspective-correct color leans towards the near endpoint.
        let mut fb = cleared(9, 1);
        let mut pipeline = Pipeline::lines();
        pipeline.pixel_write = PixelWrite::Overwrite;

        let mut vertices = vec![
            Vertex::new(DVec4::new(-1.0, 0.0, 0.5, 1.0), RED, Default::default()),
            Vertex::new(DVec4::new(3.0, 0.0, 1.5, 3.0), BLUE, Default::default()),
        ];
        pipeline.render(&mut vertices, &DMat4::IDENTITY, &mut fb);

        let mid = fb.image.get_pixel(4, 0).unwrap_or_default();
        assert!(mid.x > 0.7, "red channel {}", mid.x);
        assert!(mid.z < 0.3, "blue channel {}", mid.z);
    }

    #[test]
    fn test_cycle_wraps() {
        assert_eq!(cycle(&PixelWrite::ALL, PixelWrite::None), PixelWrite::DepthTested);
        assert_eq!(cycle(&Dehomogenize::ALL, Dehomogenize::Position), Dehomogenize::All);
    }

    #[test]
    fn test_config_lookup() {
        let mut config = PipelineConfig::default();
        assert_eq!(config.pipeline(Topology::Line).rasterization, Rasterization::LineDda);
        config.pipeline_mut(Topology::Triangle).pixel_write = PixelWrite::Checkerboard;
        assert_eq!(config.triangle.pixel_write, PixelWrite::Checkerboard);

        let inspection = PipelineConfig::inspection();
        assert_eq!(inspection.point.clip_after_dehomog, ClipAfterDehomog::None);
        assert_eq!(inspection.triangle.pixel_write, PixelWrite::Overwrite);
    }
}
