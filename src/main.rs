//! Vis Engine viewer
//!
//! Renders the default scene with the CPU pipeline every frame and shows the
//! result in a macroquad window.
//!
//! Controls:
//! - WASD / QE: move, arrow keys: rotate
//! - F1-F6: cycle triangle pixel write, rasterizer, frustum clip, near clip,
//!   dehomogenization and fast reject
//! - P: save a PNG snapshot

use std::path::PathBuf;

use ::glam::{DMat4, DVec3};
use macroquad::prelude::*;
use vis_engine::config;
use vis_engine::rasterizer::{
    cycle, Camera as SceneCamera, ClipAfterDehomog, ClipBeforeDehomog, Dehomogenize, FastReject, PixelWrite,
    Rasterization, Renderer,
};
use vis_engine::world::{default_scene, Scene};
use vis_engine::VERSION;

const MOVE_SPEED: f64 = 3.0;
const TURN_SPEED: f64 = 1.5;
const TEXT_COLOR: Color = Color::new(0.85, 0.85, 0.85, 1.0);

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Vis Engine v{}", VERSION),
        window_width: 960,
        window_height: 720,
        window_resizable: true,
        ..Default::default()
    }
}

/// Per-frame keyboard handling for the camera
fn update_camera(camera: &mut SceneCamera, delta: f64) {
    let step = MOVE_SPEED * delta;
    let turn = TURN_SPEED * delta;

    if is_key_down(KeyCode::W) {
        camera.move_forward(step);
    }
    if is_key_down(KeyCode::S) {
        camera.move_backward(step);
    }
    if is_key_down(KeyCode::A) {
        camera.move_left(step);
    }
    if is_key_down(KeyCode::D) {
        camera.move_right(step);
    }
    if is_key_down(KeyCode::E) {
        camera.move_up(step);
    }
    if is_key_down(KeyCode::Q) {
        camera.move_down(step);
    }
    if is_key_down(KeyCode::Left) {
        camera.rotate_left(turn);
    }
    if is_key_down(KeyCode::Right) {
        camera.rotate_right(turn);
    }
    if is_key_down(KeyCode::Up) {
        camera.rotate_up(turn);
    }
    if is_key_down(KeyCode::Down) {
        camera.rotate_down(turn);
    }
}

/// Stage cycling for the triangle pipeline
fn update_stages(renderer: &mut Renderer) {
    let triangle = &mut renderer.config.triangle;

    if is_key_pressed(KeyCode::F1) {
        triangle.pixel_write = cycle(&PixelWrite::ALL, triangle.pixel_write);
    }
    if is_key_pressed(KeyCode::F2) {
        triangle.rasterization = cycle(&Rasterization::ALL, triangle.rasterization);
    }
    if is_key_pressed(KeyCode::F3) {
        triangle.clip_after_dehomog = cycle(&ClipAfterDehomog::ALL, triangle.clip_after_dehomog);
    }
    if is_key_pressed(KeyCode::F4) {
        triangle.clip_before_dehomog = cycle(&ClipBeforeDehomog::ALL, triangle.clip_before_dehomog);
    }
    if is_key_pressed(KeyCode::F5) {
        triangle.dehomogenize = cycle(&Dehomogenize::ALL, triangle.dehomogenize);
    }
    if is_key_pressed(KeyCode::F6) {
        triangle.fast_reject = cycle(&FastReject::ALL, triangle.fast_reject);
    }
}

/// Bob the first cube up and down
fn animate(scene: &mut Scene, time: f64) {
    if let Some(cube) = scene.solid_mut("Cube") {
        let offset = DVec3::new(0.0, 0.0, 2.0 + 0.5 * time.sin());
        cube.matrix = DMat4::from_translation(offset);
    }
}

fn draw_overlay(renderer: &Renderer, camera: &SceneCamera) {
    let triangle = &renderer.config.triangle;
    let stats = renderer.stats();

    let lines = [
        format!("[F1] Pixel write: {}", triangle.pixel_write.label()),
        format!("[F2] Rasterizer: {}", triangle.rasterization.label()),
        format!("[F3] Frustum clip: {}", triangle.clip_after_dehomog.label()),
        format!("[F4] Near clip: {}", triangle.clip_before_dehomog.label()),
        format!("[F5] Dehomogenize: {}", triangle.dehomogenize.label()),
        format!("[F6] Fast reject: {}", triangle.fast_reject.label()),
        format!(
            "{} primitives, {} rejected, {} clipped, {} pixels",
            stats.primitives, stats.rejected, stats.clipped, stats.pixels_written
        ),
        format!("Render: {:.2} ms", stats.last_render.as_secs_f64() * 1000.0),
        format!(
            "Camera: ({:.2}, {:.2}, {:.2})",
            camera.position.x, camera.position.y, camera.position.z
        ),
    ];

    for (i, line) in lines.iter().enumerate() {
        draw_text(line, 10.0, 20.0 + i as f32 * 18.0, 16.0, TEXT_COLOR);
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let mut renderer = Renderer::new(config::load_or_default(config_path.as_deref()));
    let mut scene = default_scene();
    let mut camera = SceneCamera::default();
    let mut snapshots = 0usize;

    log::info!("Vis Engine v{} started", VERSION);

    loop {
        let delta = get_frame_time() as f64;
        update_camera(&mut camera, delta);
        update_stages(&mut renderer);
        animate(&mut scene, get_time());

        let width = screen_width().max(0.0) as usize;
        let height = screen_height().max(0.0) as usize;

        clear_background(BLACK);

        if let Some(pixels) = renderer.render_image(&scene, &camera, width, height) {
            let texture = Texture2D::from_rgba8(width as u16, height as u16, pixels);
            texture.set_filter(FilterMode::Nearest);

            draw_texture_ex(
                &texture,
                0.0,
                0.0,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(vec2(width as f32, height as f32)),
                    ..Default::default()
                },
            );
        }

        if is_key_pressed(KeyCode::P) {
            if let Some(fb) = renderer.framebuffer() {
                let path = format!("snapshot_{snapshots:03}.png");
                match fb.image.save_png(&path) {
                    Ok(()) => snapshots += 1,
                    Err(e) => log::warn!("Failed to save snapshot {}: {}", path, e),
                }
            }
        }

        draw_overlay(&renderer, &camera);

        next_frame().await;
    }
}
