use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::texture::FrameBuffer;

/// Consumer of rendered frames.
pub trait FrameSink {
    fn consume(&mut self, frame: &FrameBuffer) -> Result<()>;
}

/// Writes `frame.png` into `path`, creating parent directories as needed.
pub fn export_png(frame: &FrameBuffer, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    frame
        .image()
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write frame to {}", path.display()))?;
    Ok(())
}

/// Writes every frame as `<dir>/<index>.png` with an unpadded decimal index.
#[derive(Debug, Clone)]
pub struct PngSequenceSink {
    dir: PathBuf,
    written: usize,
}

impl PngSequenceSink {
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        Ok(Self { dir, written: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("{index}.png"))
    }
}

impl FrameSink for PngSequenceSink {
    fn consume(&mut self, frame: &FrameBuffer) -> Result<()> {
        let path = self.frame_path(frame.index());
        export_png(frame, &path)?;
        self.written += 1;
        debug!(path = %path.display(), "wrote frame");
        Ok(())
    }
}

/// Keeps frames in memory; handy for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    frames: Vec<FrameBuffer>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[FrameBuffer] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<FrameBuffer> {
        self.frames
    }
}

impl FrameSink for MemorySink {
    fn consume(&mut self, frame: &FrameBuffer) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn frame(index: u64) -> FrameBuffer {
        FrameBuffer::new(index, RgbaImage::from_pixel(3, 2, Rgba([9, 8, 7, 255])), 0)
    }

    #[test]
    fn sequence_sink_names_frames_by_index() {
        let dir = tempdir().expect("tempdir");
        let mut sink = PngSequenceSink::create(dir.path().join("frames")).expect("sink");
        sink.consume(&frame(0)).expect("frame 0");
        sink.consume(&frame(12)).expect("frame 12");

        assert_eq!(sink.written(), 2);
        assert_eq!(sink.frame_path(12), sink.dir().join("12.png"));
        let reloaded = image::open(sink.dir().join("12.png"))
            .expect("decode")
            .to_rgba8();
        assert_eq!(reloaded.dimensions(), (3, 2));
        assert_eq!(reloaded.get_pixel(2, 1).0, [9, 8, 7, 255]);
        assert!(sink.dir().join("0.png").exists());
        assert!(!sink.dir().join("000012.png").exists());
    }

    #[test]
    fn export_creates_parent_directories() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested/still.png");
        export_png(&frame(0), &path).expect("export");
        assert!(path.exists());
    }

    #[test]
    fn memory_sink_keeps_frames() {
        let mut sink = MemorySink::new();
        sink.consume(&frame(4)).expect("consume");
        assert_eq!(sink.frames().len(), 1);
        assert_eq!(sink.into_frames()[0].index(), 4);
    }
}
