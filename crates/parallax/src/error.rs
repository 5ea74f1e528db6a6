use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("compression must be in (0, 1], got {0}")]
    Compression(f32),

    #[error("steps must be at least 2, got {0}")]
    Steps(u32),

    #[error("max_steps must be in 1..=16, got {0}")]
    MaxSteps(u32),

    #[error("confidence_max must be positive, got {0}")]
    ConfidenceMax(f32),

    #[error("correct_power must be positive, got {0}")]
    CorrectPower(f32),

    #[error("upscale must be positive, got {0}")]
    Upscale(f32),

    #[error("perspective must be finite, got {0}")]
    Perspective(f32),

    #[error("output size must be non-zero, got {0}x{1}")]
    Size(u32, u32),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source not found at {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("no frames found in {}", .0.display())]
    Empty(PathBuf),

    #[error(
        "unsupported video source {}; expected an animated GIF or a frame directory",
        .0.display()
    )]
    UnsupportedVideo(PathBuf),

    #[error("no bundled default configured for the {0} slot")]
    NoDefault(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
