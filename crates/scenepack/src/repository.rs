//! Turns `SceneHandle`s into loaded packs by searching the configured scene
//! roots. Named handles are looked up under each root in order; path
//! handles are tried as given first and then relative to each root.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::pack::{ensure_sources, LocalPack, PackError, MANIFEST_FILE};
use crate::SceneHandle;

#[derive(Debug, Clone)]
pub struct SceneRepository {
    roots: Vec<PathBuf>,
}

impl SceneRepository {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn resolve(&self, handle: &SceneHandle) -> Result<LocalPack> {
        match handle {
            SceneHandle::Named(name) => {
                if name.trim().is_empty() {
                    return Err(anyhow!("scene name must not be empty"));
                }
                let candidates = self.roots.iter().map(|root| root.join(name)).collect();
                self.load_first(Path::new(name), candidates)
            }
            SceneHandle::Path(path) => {
                if path.as_os_str().is_empty() {
                    return Err(anyhow!("scene pack path must not be empty"));
                }
                let candidates = if path.is_absolute() || path.exists() {
                    vec![path.clone()]
                } else {
                    self.roots.iter().map(|root| root.join(path)).collect()
                };
                self.load_first(path, candidates)
            }
        }
    }

    /// Names of every pack directory found directly under the roots.
    pub fn list(&self) -> Vec<String> {
        let mut names = Vec::new();
        for root in &self.roots {
            let Ok(entries) = fs::read_dir(root) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.join(MANIFEST_FILE).is_file() {
                    if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names.sort();
        names.dedup();
        names
    }

    fn load_first(&self, requested: &Path, candidates: Vec<PathBuf>) -> Result<LocalPack> {
        debug!(requested = %requested.display(), roots = ?self.roots, "resolving scene pack");
        for candidate in candidates {
            debug!(candidate = %candidate.display(), "checking scene pack candidate");
            if !candidate.exists() {
                continue;
            }
            return match LocalPack::load(&candidate) {
                Ok(pack) => {
                    ensure_sources(&pack).map_err(|err| match err {
                        PackError::ManifestValidation(items) => anyhow!(
                            "scene pack '{}' failed validation: {:?}",
                            candidate.display(),
                            items
                        ),
                        other => anyhow!(other),
                    })?;
                    debug!(path = %candidate.display(), "loaded scene pack");
                    Ok(pack)
                }
                Err(err) => {
                    warn!(path = %candidate.display(), error = %err, "failed to load scene pack");
                    Err(anyhow!(err))
                }
            };
        }

        warn!(requested = %requested.display(), roots = ?self.roots, "scene pack missing");
        Err(anyhow!(
            "unable to locate scene pack '{}'. searched roots: {:?}",
            requested.display(),
            self.roots
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ScenePackManifest;

    fn create_pack(dir: &Path) {
        let manifest = ScenePackManifest {
            name: Some("Demo".into()),
            image: Some(PathBuf::from("image.png")),
            depth: Some(PathBuf::from("imageDepth.png")),
            ..ScenePackManifest::default()
        };
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), toml::to_string(&manifest).unwrap()).unwrap();
        fs::write(dir.join("image.png"), "fake").unwrap();
        fs::write(dir.join("imageDepth.png"), "fake").unwrap();
    }

    #[test]
    fn resolves_named_pack_under_roots() {
        let temp = tempfile::tempdir().unwrap();
        let first = temp.path().join("user");
        let second = temp.path().join("share");
        create_pack(&second.join("lake"));

        let repo = SceneRepository::new(vec![first, second.clone()]);
        let pack = repo
            .resolve(&SceneHandle::Named("lake".into()))
            .expect("resolve named pack");
        assert_eq!(pack.root(), second.join("lake"));
        assert_eq!(repo.list(), vec!["lake".to_string()]);
    }

    #[test]
    fn resolves_absolute_path() {
        let temp = tempfile::tempdir().unwrap();
        let pack_dir = temp.path().join("anywhere/forest");
        create_pack(&pack_dir);

        let repo = SceneRepository::new(Vec::new());
        let pack = repo
            .resolve(&SceneHandle::Path(pack_dir.clone()))
            .expect("resolve path");
        assert_eq!(pack.name(), "Demo");
    }

    #[test]
    fn reports_missing_pack() {
        let temp = tempfile::tempdir().unwrap();
        let repo = SceneRepository::new(vec![temp.path().to_path_buf()]);
        let err = repo
            .resolve(&SceneHandle::Named("nowhere".into()))
            .unwrap_err();
        assert!(err.to_string().contains("unable to locate scene pack"));
    }

    #[test]
    fn surfaces_missing_sources() {
        let temp = tempfile::tempdir().unwrap();
        let pack_dir = temp.path().join("broken");
        create_pack(&pack_dir);
        fs::remove_file(pack_dir.join("imageDepth.png")).unwrap();

        let repo = SceneRepository::new(vec![temp.path().to_path_buf()]);
        let err = repo
            .resolve(&SceneHandle::Named("broken".into()))
            .unwrap_err();
        assert!(err.to_string().contains("failed validation"));
    }
}
