//! Color and depth sources: still images, looping frame sequences, and the
//! fallback-to-default loading policy.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage};
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::texture::{ColorImage, DepthImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Image,
    Video,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Image => "image",
            SourceKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Color,
    Depth,
}

impl Slot {
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Color => "color",
            Slot::Depth => "depth",
        }
    }
}

/// A request to (re)load one texture slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    pub slot: Slot,
    pub kind: SourceKind,
    pub path: PathBuf,
}

impl SourceRequest {
    pub fn new(slot: Slot, kind: SourceKind, path: impl Into<PathBuf>) -> Self {
        Self {
            slot,
            kind,
            path: path.into(),
        }
    }
}

/// One or more frames. Still images hold a single frame; sequences loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Source<T> {
    frames: Vec<T>,
}

pub type ColorSource = Source<ColorImage>;
pub type DepthSource = Source<DepthImage>;

impl<T> Source<T> {
    pub fn still(frame: T) -> Self {
        Self {
            frames: vec![frame],
        }
    }

    pub fn sequence(frames: Vec<T>) -> Option<Self> {
        if frames.is_empty() {
            None
        } else {
            Some(Self { frames })
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    /// Frame shown at driver frame `index`, looping.
    pub fn frame(&self, index: u64) -> &T {
        &self.frames[(index % self.frames.len() as u64) as usize]
    }
}

impl ColorSource {
    pub fn placeholder() -> Self {
        Self::still(ColorImage::placeholder())
    }
}

impl DepthSource {
    pub fn placeholder() -> Self {
        Self::still(DepthImage::placeholder())
    }
}

/// Decodes sources from some backing store.
pub trait TextureLoader: Send + Sync {
    fn load_color(&self, kind: SourceKind, path: &Path) -> Result<ColorSource, LoadError>;
    fn load_depth(&self, kind: SourceKind, path: &Path) -> Result<DepthSource, LoadError>;
}

/// Loads images and frame sequences from the local filesystem.
///
/// A video is either an animated GIF or a directory of still frames played
/// in file-name order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl FsLoader {
    fn frames(&self, kind: SourceKind, path: &Path) -> Result<Vec<DynamicImage>, LoadError> {
        if !path.exists() {
            return Err(LoadError::Missing(path.to_path_buf()));
        }
        let frames = match kind {
            SourceKind::Image => vec![decode_still(path)?],
            SourceKind::Video if path.is_dir() => decode_directory(path)?,
            SourceKind::Video => decode_animation(path)?,
        };
        if frames.is_empty()
            || frames
                .iter()
                .any(|frame| frame.width() == 0 || frame.height() == 0)
        {
            return Err(LoadError::Empty(path.to_path_buf()));
        }
        debug!(
            path = %path.display(),
            kind = kind.as_str(),
            frames = frames.len(),
            "decoded source"
        );
        Ok(frames)
    }
}

impl TextureLoader for FsLoader {
    fn load_color(&self, kind: SourceKind, path: &Path) -> Result<ColorSource, LoadError> {
        let frames = self.frames(kind, path)?;
        Source::sequence(frames.iter().map(ColorImage::from_dynamic).collect())
            .ok_or_else(|| LoadError::Empty(path.to_path_buf()))
    }

    fn load_depth(&self, kind: SourceKind, path: &Path) -> Result<DepthSource, LoadError> {
        let frames = self.frames(kind, path)?;
        Source::sequence(frames.iter().map(DepthImage::from_dynamic).collect())
            .ok_or_else(|| LoadError::Empty(path.to_path_buf()))
    }
}

fn decode_still(path: &Path) -> Result<DynamicImage, LoadError> {
    image::open(path).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn decode_animation(path: &Path) -> Result<Vec<DynamicImage>, LoadError> {
    let is_gif = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gif"));
    if !is_gif {
        return Err(LoadError::UnsupportedVideo(path.to_path_buf()));
    }

    let decode_err = |source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(path)?);
    let decoder = GifDecoder::new(reader).map_err(decode_err)?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(decode_err)?;
    Ok(frames
        .into_iter()
        .map(|frame| DynamicImage::ImageRgba8(frame.into_buffer()))
        .collect())
}

fn decode_directory(path: &Path) -> Result<Vec<DynamicImage>, LoadError> {
    let mut entries = fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|entry| entry.is_file())
        .filter(|entry| image::ImageFormat::from_path(entry).is_ok())
        .collect::<Vec<_>>();
    entries.sort();
    entries.iter().map(|entry| decode_still(entry)).collect()
}

/// Loads `primary`, falling back to `default` when it cannot be decoded.
///
/// A missing default is reported as [`LoadError::NoDefault`] after the
/// primary failure has been logged.
pub fn load_with_fallback<T>(
    primary: &Path,
    default: Option<&Path>,
    slot: Slot,
    mut load: impl FnMut(&Path) -> Result<T, LoadError>,
) -> Result<T, LoadError> {
    match load(primary) {
        Ok(source) => Ok(source),
        Err(err) => {
            let file = primary
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| primary.display().to_string());
            warn!(error = %err, slot = slot.as_str(), "'{file}' fail to load, load default instead");
            match default {
                Some(default) if default != primary => load(default),
                Some(_) => Err(err),
                None => Err(LoadError::NoDefault(slot.as_str())),
            }
        }
    }
}

/// Bundled stand-ins used when a configured source fails to load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultSources {
    pub image: Option<PathBuf>,
    pub image_depth: Option<PathBuf>,
    pub video: Option<PathBuf>,
    pub video_depth: Option<PathBuf>,
}

impl DefaultSources {
    /// Resolves the conventional layout under a `defaults/` directory.
    pub fn from_dir(dir: &Path) -> Self {
        let existing = |name: &str| {
            let path = dir.join(name);
            path.exists().then_some(path)
        };
        Self {
            image: existing("image.png"),
            image_depth: existing("imageDepth.png"),
            video: existing("video.gif"),
            video_depth: existing("videoDepth.gif"),
        }
    }

    pub fn for_request(&self, slot: Slot, kind: SourceKind) -> Option<&Path> {
        let path = match (slot, kind) {
            (Slot::Color, SourceKind::Image) => &self.image,
            (Slot::Depth, SourceKind::Image) => &self.image_depth,
            (Slot::Color, SourceKind::Video) => &self.video,
            (Slot::Depth, SourceKind::Video) => &self.video_depth,
        };
        path.as_deref()
    }
}

/// Host-supplied property changes. Every field is optional; absent fields
/// leave the driver's current state alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneProperties {
    pub video: Option<PathBuf>,
    pub video_depth: Option<PathBuf>,
    pub image: Option<PathBuf>,
    pub image_depth: Option<PathBuf>,
    pub sensitivity: Option<f32>,
}

impl SceneProperties {
    /// Texture requests in application order: video slots before image slots.
    pub fn requests(&self) -> Vec<SourceRequest> {
        [
            (&self.video, Slot::Color, SourceKind::Video),
            (&self.video_depth, Slot::Depth, SourceKind::Video),
            (&self.image, Slot::Color, SourceKind::Image),
            (&self.image_depth, Slot::Depth, SourceKind::Image),
        ]
        .into_iter()
        .filter_map(|(path, slot, kind)| {
            path.as_ref()
                .map(|path| SourceRequest::new(slot, kind, path.clone()))
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn write_png(path: &Path, rgba: [u8; 4]) {
        RgbaImage::from_pixel(2, 2, Rgba(rgba))
            .save(path)
            .expect("write png");
    }

    #[test]
    fn frames_loop_by_index() {
        let source = Source::sequence(vec![1, 2, 3]).expect("non-empty");
        assert_eq!(*source.frame(0), 1);
        assert_eq!(*source.frame(4), 2);
        assert!(source.is_animated());
        assert!(Source::<u8>::sequence(Vec::new()).is_none());
    }

    #[test]
    fn loads_still_png() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("red.png");
        write_png(&path, [255, 0, 0, 255]);

        let source = FsLoader
            .load_color(SourceKind::Image, &path)
            .expect("load png");
        assert_eq!(source.len(), 1);
        assert_eq!(source.frame(0).texel(1, 1), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn loads_directory_as_sorted_sequence() {
        let dir = tempdir().expect("tempdir");
        write_png(&dir.path().join("002.png"), [0, 0, 255, 255]);
        write_png(&dir.path().join("001.png"), [255, 0, 0, 255]);
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write txt");

        let source = FsLoader
            .load_depth(SourceKind::Video, dir.path())
            .expect("load frames");
        assert_eq!(source.len(), 2);
        assert_eq!(source.frame(0).texel(0, 0), 1.0);
        assert_eq!(source.frame(1).texel(0, 0), 0.0);
    }

    #[test]
    fn rejects_non_gif_video_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("clip.png");
        write_png(&path, [0, 0, 0, 255]);
        let err = FsLoader
            .load_color(SourceKind::Video, &path)
            .expect_err("png is not a video");
        assert!(matches!(err, LoadError::UnsupportedVideo(_)));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = FsLoader
            .load_color(SourceKind::Image, Path::new("/nonexistent/depthwall.png"))
            .expect_err("missing file");
        assert!(matches!(err, LoadError::Missing(_)));
    }

    #[test]
    fn falls_back_to_default() {
        let dir = tempdir().expect("tempdir");
        let broken = dir.path().join("broken.png");
        fs::write(&broken, b"not an image").expect("write broken");
        let default = dir.path().join("default.png");
        write_png(&default, [0, 255, 0, 255]);

        let source = load_with_fallback(&broken, Some(&default), Slot::Color, |path| {
            FsLoader.load_color(SourceKind::Image, path)
        })
        .expect("default loads");
        assert_eq!(source.frame(0).texel(0, 0), [0.0, 1.0, 0.0, 1.0]);

        let err = load_with_fallback(&broken, None, Slot::Depth, |path| {
            FsLoader.load_depth(SourceKind::Image, path)
        })
        .expect_err("no default");
        assert!(matches!(err, LoadError::NoDefault("depth")));
    }

    #[test]
    fn defaults_resolve_existing_files_only() {
        let dir = tempdir().expect("tempdir");
        write_png(&dir.path().join("image.png"), [0, 0, 0, 255]);
        let defaults = DefaultSources::from_dir(dir.path());
        assert!(defaults
            .for_request(Slot::Color, SourceKind::Image)
            .is_some());
        assert!(defaults
            .for_request(Slot::Depth, SourceKind::Image)
            .is_none());
        assert!(defaults.video.is_none());
    }

    #[test]
    fn property_requests_put_video_first() {
        let props = SceneProperties {
            image: Some("a.png".into()),
            video_depth: Some("d.gif".into()),
            ..SceneProperties::default()
        };
        let requests = props.requests();
        assert_eq!(
            requests,
            vec![
                SourceRequest::new(Slot::Depth, SourceKind::Video, "d.gif"),
                SourceRequest::new(Slot::Color, SourceKind::Image, "a.png"),
            ]
        );
    }
}
