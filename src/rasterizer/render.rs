//! Scene driver
//! Walks every solid's layout and feeds primitives through the pipeline
//! selected for their topology.

use std::time::{Duration, Instant};

use glam::DMat4;

use super::camera::Camera;
use super::image::Framebuffer;
use super::pipeline::{Outcome, PipelineConfig};
use super::types::{Solid, Vertex};
use crate::world::Scene;

/// Counters from the last rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Primitives handed to a pipeline
    pub primitives: usize,
    pub rejected: usize,
    pub clipped: usize,
    /// Primitives skipped for bad indices
    pub malformed: usize,
    pub pixels_written: usize,
    pub last_render: Duration,
}

impl RenderStats {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Malformed => self.malformed += 1,
            Outcome::Rejected => self.rejected += 1,
            Outcome::Clipped => self.clipped += 1,
            Outcome::Drawn => {}
        }
    }
}

/// Owns the framebuffer between frames and reallocates it on resize
pub struct Renderer {
    pub config: PipelineConfig,
    framebuffer: Option<Framebuffer>,
    stats: RenderStats,
    scratch: Vec<Vertex>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Renderer {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            framebuffer: None,
            stats: RenderStats::default(),
            scratch: Vec::with_capacity(16),
        }
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Framebuffer of the last frame, if one was rendered
    pub fn framebuffer(&self) -> Option<&Framebuffer> {
        self.framebuffer.as_ref()
    }

    /// Render `scene` as seen by `camera` into a `width` x `height` RGBA
    /// image. The camera's aspect ratio is taken from the requested size.
    /// Returns None for an empty image or one too large to allocate.
    pub fn render_image(&mut self, scene: &Scene, camera: &Camera, width: usize, height: usize) -> Option<&[u8]> {
        let mut camera = camera.clone();
        camera.set_viewport(width, height);
        self.render_with_matrices(scene, &camera.get_view(), &camera.get_projection(), width, height)
    }

    /// Same as `render_image` with the view and projection already built
    pub fn render_with_matrices(
        &mut self,
        scene: &Scene,
        view: &DMat4,
        projection: &DMat4,
        width: usize,
        height: usize,
    ) -> Option<&[u8]> {
        if width == 0 || height == 0 {
            return None;
        }

        let start = Instant::now();

        let resized = self
            .framebuffer
            .as_ref()
            .map_or(true, |fb| fb.width() != width || fb.height() != height);
        if resized {
            log::debug!("Allocating {width}x{height} framebuffer");
            self.framebuffer = Framebuffer::new(width, height);
            if self.framebuffer.is_none() {
                log::warn!("Could not allocate a {width}x{height} framebuffer, skipping frame");
            }
        }
        let fb = self.framebuffer.as_mut()?;
        fb.clear(self.config.clear_color, self.config.clear_depth);

        self.stats = RenderStats::default();
        let base = *projection * *view * scene.model_matrix;
        for solid in &scene.solids {
            draw_solid(solid, &(base * solid.matrix), &self.config, fb, &mut self.scratch, &mut self.stats);
        }

        self.stats.pixels_written = fb.pixels_written();
        self.stats.last_render = start.elapsed();
        log::trace!("Frame stats: {:?}", self.stats);

        Some(fb.image.get_image_data())
    }
}

/// Run every primitive of `solid` through its topology's pipeline
pub fn draw_solid(
    solid: &Solid,
    matrix: &DMat4,
    config: &PipelineConfig,
    fb: &mut Framebuffer,
    scratch: &mut Vec<Vertex>,
    stats: &mut RenderStats,
) {
    for run in &solid.layout {
        let pipeline = config.pipeline(run.topology);
        for i in 0..run.count {
            if !solid.gather_primitive(run, i, scratch) {
                stats.malformed += 1;
                continue;
            }
            stats.primitives += 1;
            stats.record(pipeline.render(scratch, matrix, fb));
        }
    }
}
