//! Config, data and share roots. Each comes from its `DEPTHWALL_*_DIR`
//! variable when that is set and non-empty, otherwise from the platform
//! directories.
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    Config,
    Data,
    Share,
}

impl Root {
    pub fn env_var(self) -> &'static str {
        match self {
            Root::Config => "DEPTHWALL_CONFIG_DIR",
            Root::Data => "DEPTHWALL_DATA_DIR",
            Root::Share => "DEPTHWALL_SHARE_DIR",
        }
    }

    fn platform_dir(self, project: &ProjectDirs) -> PathBuf {
        match self {
            Root::Config => project.config_dir().to_path_buf(),
            Root::Data => project.data_dir().to_path_buf(),
            Root::Share if cfg!(unix) => PathBuf::from("/usr/share/depthwall"),
            Root::Share => project.data_dir().to_path_buf(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
    share_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let project = ProjectDirs::from("org", "Depthwall", "depthwall")
            .ok_or_else(|| anyhow!("no home directory to place depthwall files under"))?;
        Ok(Self::from_lookup(
            |name| env::var_os(name),
            |root| root.platform_dir(&project),
        ))
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<OsString>,
        fallback: impl Fn(Root) -> PathBuf,
    ) -> Self {
        let pick = |root: Root| match lookup(root.env_var()) {
            Some(value) if !value.is_empty() => {
                debug!(var = root.env_var(), dir = ?value, "directory taken from environment");
                PathBuf::from(value)
            }
            _ => fallback(root),
        };
        Self {
            config_dir: pick(Root::Config),
            data_dir: pick(Root::Data),
            share_dir: pick(Root::Share),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn share_dir(&self) -> &Path {
        &self.share_dir
    }

    /// Scene file read when `--config` is not given and the file exists.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("depthwall.toml")
    }

    /// Bundled fallback sources (`image.png`, `imageDepth.png`, ...).
    pub fn defaults_dir(&self) -> PathBuf {
        self.share_dir.join("defaults")
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.data_dir.join("frames")
    }

    /// `scenes/` under every root, user directories first.
    pub fn scene_roots(&self) -> Vec<PathBuf> {
        [&self.config_dir, &self.data_dir, &self.share_dir]
            .into_iter()
            .map(|dir| dir.join("scenes"))
            .collect()
    }
}
