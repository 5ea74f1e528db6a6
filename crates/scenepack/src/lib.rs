mod manifest;
mod pack;
mod repository;

pub use manifest::ScenePackManifest;
pub use pack::{ensure_sources, LocalPack, PackError, PackSources, MANIFEST_FILE};
pub use repository::SceneRepository;

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneHandle {
    /// `scene://<name>`, looked up under the scene roots.
    Named(String),
    Path(PathBuf),
}

impl SceneHandle {
    pub fn from_input(input: &str) -> Self {
        if let Some(name) = input.strip_prefix("scene://") {
            Self::Named(name.trim().to_string())
        } else {
            Self::Path(PathBuf::from(input))
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path.as_path()),
            Self::Named(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scene_scheme() {
        assert_eq!(
            SceneHandle::from_input("scene://lake"),
            SceneHandle::Named("lake".into())
        );
    }

    #[test]
    fn parses_local_path() {
        assert!(matches!(
            SceneHandle::from_input("packs/demo"),
            SceneHandle::Path(path) if path == PathBuf::from("packs/demo")
        ));
        assert!(SceneHandle::from_input("/tmp/x").as_path().is_some());
    }
}
