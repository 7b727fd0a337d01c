//! Scenes and their RON persistence

use std::fs;
use std::path::Path;

use glam::{DMat4, DVec3, DVec4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::solids;
use crate::rasterizer::{Camera, Solid, SolidError};

/// Solids rendered together under one model matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    #[serde(default)]
    pub model_matrix: DMat4,
    pub solids: Vec<Solid>,
}

impl Scene {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            model_matrix: DMat4::IDENTITY,
            solids: Vec::new(),
        }
    }

    pub fn add_solid(&mut self, solid: Solid) -> usize {
        let id = self.solids.len();
        self.solids.push(solid);
        id
    }

    pub fn solid(&self, name: &str) -> Option<&Solid> {
        self.solids.iter().find(|s| s.name == name)
    }

    pub fn solid_mut(&mut self, name: &str) -> Option<&mut Solid> {
        self.solids.iter_mut().find(|s| s.name == name)
    }

    /// Check every solid's layout and indices
    pub fn validate(&self) -> Result<(), SceneError> {
        for solid in &self.solids {
            solid.validate().map_err(|source| SceneError::Invalid {
                solid: solid.name.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Ground grid, two overlapping cubes and the outline of a short probe
/// camera at the origin
pub fn default_scene() -> Scene {
    let mut scene = Scene::new("Default");
    scene.add_solid(solids::grid("Grid", 10, 1.0));
    scene.add_solid(solids::cube("Cube", 1.0).with_matrix(DMat4::from_translation(DVec3::new(0.0, 0.0, 2.0))));
    scene.add_solid(solids::cube("Cube 2", 1.0).with_matrix(DMat4::from_translation(DVec3::new(0.5, 0.5, 2.5))));

    let probe = Camera {
        position: DVec3::ZERO,
        near_plane: 1.0,
        far_plane: 5.0,
        ..Camera::default()
    };
    scene.add_solid(probe.frustum_solid("Probe", DVec4::new(1.0, 1.0, 0.0, 1.0)));
    scene
}

/// Error type for scene loading and saving
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Invalid solid '{solid}': {source}")]
    Invalid { solid: String, source: SolidError },
}

/// Load a scene from a RON file
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, SceneError> {
    let contents = fs::read_to_string(path.as_ref())?;
    let scene = load_scene_from_str(&contents)?;
    log::info!("Loaded scene '{}' from {}", scene.name, path.as_ref().display());
    Ok(scene)
}

/// Save a scene to a RON file
pub fn save_scene<P: AsRef<Path>>(scene: &Scene, path: P) -> Result<(), SceneError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(scene, config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load a scene from a RON string, rejecting solids with broken layouts
pub fn load_scene_from_str(s: &str) -> Result<Scene, SceneError> {
    let scene: Scene = ron::from_str(s)?;
    scene.validate()?;
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{Layout, Topology};

    #[test]
    fn test_default_scene_is_valid() {
        let scene = default_scene();
        assert!(scene.validate().is_ok());
        assert!(scene.solid("Grid").is_some());
        assert!(scene.solid("Probe").is_some());
        assert_eq!(scene.model_matrix, DMat4::IDENTITY);
    }

    #[test]
    fn test_ron_round_trip() {
        let mut scene = Scene::new("Round trip");
        scene.add_solid(solids::triangle("Triangle"));
        scene.add_solid(solids::axis("Axis").with_matrix(DMat4::from_scale(DVec3::splat(2.0))));

        let config = ron::ser::PrettyConfig::new().depth_limit(4);
        let text = ron::ser::to_string_pretty(&scene, config).expect("serialize");
        let loaded = load_scene_from_str(&text).expect("parse");
        assert_eq!(loaded, scene);
    }

    #[test]
    fn test_invalid_solid_rejected() {
        let mut scene = Scene::new("Broken");
        let mut solid = solids::triangle("Triangle");
        solid.layout.push(Layout::new(Topology::Line, 2, 4));
        scene.add_solid(solid);

        let text = ron::to_string(&scene).expect("serialize");
        match load_scene_from_str(&text) {
            Err(SceneError::Invalid { solid, source }) => {
                assert_eq!(solid, "Triangle");
                assert!(matches!(source, SolidError::LayoutOutOfRange { .. }));
            }
            other => panic!("expected invalid solid, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(load_scene_from_str("not a scene"), Err(SceneError::Parse(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("vis_engine_scene_{}.ron", std::process::id()));
        let scene = default_scene();
        save_scene(&scene, &path).expect("save");
        let loaded = load_scene(&path).expect("load");
        let _ = fs::remove_file(&path);
        assert_eq!(loaded.solids.len(), scene.solids.len());
    }
}
