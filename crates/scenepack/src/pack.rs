use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::manifest::ScenePackManifest;

pub const MANIFEST_FILE: &str = "scene.toml";

#[derive(Debug, Error)]
pub enum PackError {
    #[error("manifest not found at {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("failed to parse manifest: {0}")]
    ManifestParse(#[from] toml::de::Error),

    #[error("manifest validation failed: {0:?}")]
    ManifestValidation(Vec<String>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Source paths of a pack, already joined onto the pack root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackSources {
    pub image: Option<PathBuf>,
    pub depth: Option<PathBuf>,
    pub video: Option<PathBuf>,
    pub video_depth: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct LocalPack {
    root: PathBuf,
    manifest: ScenePackManifest,
}

impl LocalPack {
    pub fn load(root: impl AsRef<Path>) -> Result<Self, PackError> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(PackError::ManifestMissing(manifest_path));
        }

        let manifest_raw = fs::read_to_string(&manifest_path)?;
        let manifest: ScenePackManifest = toml::from_str(&manifest_raw)?;
        let issues = manifest.validate();
        if !issues.is_empty() {
            return Err(PackError::ManifestValidation(issues));
        }

        Ok(Self { root, manifest })
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn manifest(&self) -> &ScenePackManifest {
        &self.manifest
    }

    /// Display name, falling back to the directory name.
    pub fn name(&self) -> String {
        self.manifest.name.clone().unwrap_or_else(|| {
            self.root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.root.display().to_string())
        })
    }

    pub fn sources(&self) -> PackSources {
        let join = |path: &Option<PathBuf>| path.as_ref().map(|path| self.root.join(path));
        PackSources {
            image: join(&self.manifest.image),
            depth: join(&self.manifest.depth),
            video: join(&self.manifest.video),
            video_depth: join(&self.manifest.video_depth),
        }
    }
}

/// Confirms every declared source exists so load failures later point at
/// decoding problems rather than typos in the manifest.
pub fn ensure_sources(pack: &LocalPack) -> Result<Vec<PathBuf>, PackError> {
    let mut missing = Vec::new();
    let mut resolved = Vec::new();
    for (_, path) in pack.manifest().declared_paths() {
        let full_path = pack.root().join(path);
        if full_path.exists() {
            resolved.push(full_path);
        } else {
            missing.push(full_path);
        }
    }
    if !missing.is_empty() {
        return Err(PackError::ManifestValidation(
            missing
                .into_iter()
                .map(|p| format!("missing scene source: {}", p.display()))
                .collect(),
        ));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pack(dir: &Path, manifest: &ScenePackManifest, extra_files: &[&str]) {
        let manifest_str = toml::to_string(manifest).expect("serialize manifest");
        fs::write(dir.join(MANIFEST_FILE), manifest_str).expect("write manifest");
        for path in extra_files {
            let full_path = dir.join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).expect("create dirs");
            }
            fs::write(full_path, "fake").expect("write file");
        }
    }

    fn demo_manifest() -> ScenePackManifest {
        ScenePackManifest {
            name: Some("Demo".into()),
            image: Some(PathBuf::from("image.png")),
            depth: Some(PathBuf::from("depth/image.png")),
            ..ScenePackManifest::default()
        }
    }

    #[test]
    fn loads_valid_pack() {
        let temp = tempfile::tempdir().unwrap();
        write_pack(
            temp.path(),
            &demo_manifest(),
            &["image.png", "depth/image.png"],
        );

        let pack = LocalPack::load(temp.path()).expect("load pack");
        assert_eq!(pack.name(), "Demo");
        let sources = pack.sources();
        assert_eq!(sources.image, Some(temp.path().join("image.png")));
        assert_eq!(sources.depth, Some(temp.path().join("depth/image.png")));
        assert_eq!(sources.video, None);
        assert_eq!(ensure_sources(&pack).expect("sources exist").len(), 2);
    }

    #[test]
    fn detects_missing_source() {
        let temp = tempfile::tempdir().unwrap();
        write_pack(temp.path(), &demo_manifest(), &["image.png"]);

        let pack = LocalPack::load(temp.path()).expect("load pack");
        let err = ensure_sources(&pack).unwrap_err();
        assert!(matches!(err, PackError::ManifestValidation(items) if items.len() == 1));
    }

    #[test]
    fn rejects_invalid_manifest() {
        let temp = tempfile::tempdir().unwrap();
        let manifest = ScenePackManifest {
            image: Some(PathBuf::from("image.png")),
            ..ScenePackManifest::default()
        };
        write_pack(temp.path(), &manifest, &[]);
        let err = LocalPack::load(temp.path()).unwrap_err();
        assert!(matches!(err, PackError::ManifestValidation(_)));
    }

    #[test]
    fn missing_manifest_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let err = LocalPack::load(temp.path()).unwrap_err();
        assert!(matches!(err, PackError::ManifestMissing(_)));
    }
}
