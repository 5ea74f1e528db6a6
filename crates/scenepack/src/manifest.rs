//! Schema of `scene.toml`, the manifest at the root of every scene pack.
//!
//! A pack names one color source and the depth map that goes with it,
//! either as still images or as frame sequences, plus optional hints the
//! player applies when the pack is selected.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ScenePackManifest {
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub depth: Option<PathBuf>,
    #[serde(default)]
    pub video: Option<PathBuf>,
    #[serde(default)]
    pub video_depth: Option<PathBuf>,
    /// Preferred pointer sensitivity for this scene.
    #[serde(default)]
    pub sensitivity: Option<f32>,
}

impl ScenePackManifest {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.image.is_none() && self.video.is_none() {
            issues.push("manifest must declare an image or a video".to_string());
        }
        if self.image.is_some() && self.depth.is_none() {
            issues.push("image declared without a matching depth map".to_string());
        }
        if self.video.is_some() && self.video_depth.is_none() {
            issues.push("video declared without a matching video_depth".to_string());
        }
        for (field, path) in self.declared_paths() {
            if path.is_absolute() {
                issues.push(format!(
                    "{field} must be relative to the pack, got {}",
                    path.display()
                ));
            }
        }
        if let Some(sensitivity) = self.sensitivity {
            if !(sensitivity.is_finite() && sensitivity > 0.0) {
                issues.push(format!("sensitivity must be positive, got {sensitivity}"));
            }
        }
        issues
    }

    /// Every source path the manifest names, keyed by field name.
    pub fn declared_paths(&self) -> impl Iterator<Item = (&'static str, &PathBuf)> {
        [
            ("image", self.image.as_ref()),
            ("depth", self.depth.as_ref()),
            ("video", self.video.as_ref()),
            ("video_depth", self.video_depth.as_ref()),
        ]
        .into_iter()
        .filter_map(|(field, path)| path.map(|path| (field, path)))
    }
}
