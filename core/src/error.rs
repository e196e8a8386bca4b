use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Failed to load image: {0}")]
    ImageLoadError(#[from] image::ImageError),

    #[error("Failed to save image: {0}")]
    ImageSaveError(image::ImageError),

    #[cfg(feature = "camera")]
    #[error("FFmpeg error: {0}")]
    FFmpegError(#[from] ffmpeg_next::Error),

    #[cfg(feature = "camera")]
    #[error("Video error: {0}")]
    Video(String),

    #[error("Video stream not found on {0}")]
    StreamNotFound(PathBuf),

    #[error("Camera {0} produced no frame")]
    NoFrameCaptured(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Thread pool creation failed: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid {channel} channel: must be between 0 and 255, got {value}")]
    InvalidRgbChannel { channel: &'static str, value: i64 },

    #[error("Unsupported Delta E method '{0}': expected CIE76 or CIE2000")]
    InvalidDeltaEMethod(String),

    #[error("Invalid tolerance: must be a finite non-negative number, got {0}")]
    InvalidTolerance(f64),

    #[error("Invalid sample region: {0}")]
    InvalidSampleRegion(String),

    #[error("Sample region contains no pixels ({width}x{height} frame)")]
    EmptyRegion { width: u32, height: u32 },

    #[error(
        "Invalid thread count: must be between 1 and the number of available CPU cores ({0})"
    )]
    InvalidThreadCount(usize),

    #[error("'{0}' not found in master samples")]
    MasterNotFound(String),

    #[error("Master sample '{name}' has an invalid tolerance ({tolerance})")]
    InvalidMasterTolerance { name: String, tolerance: f64 },

    #[error("Master sample store not found at {0}")]
    MasterStoreNotFound(PathBuf),

    #[error("Master sample '{0}' already exists")]
    MasterExists(String),

    #[error("Frame image not found: {0}")]
    FrameNotFound(PathBuf),

    #[error("Log file is empty: {0}")]
    EmptyLog(PathBuf),

    #[error("No camera matches {0}")]
    CameraNotFound(String),

    #[error("Camera capture is not available in this build")]
    CameraUnavailable,

    #[error("Invalid camera choice: {0}")]
    InvalidCameraChoice(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Logger error: {0}")]
    LoggerError(String),
}

/// Result type of the core library
pub type Result<T> = core::result::Result<T, Error>;
