mod color;
mod config;
mod delta_e;
mod master;
mod record;

pub mod discovery;
pub mod error;
pub mod frame;
pub mod inspection;

pub use color::{format_rgb, lab_to_rgb, rgb_from_channels, rgb_to_lab, ConvertToLab, Lab};
pub use config::{Config, DEFAULT_DATA_DIR};
pub use delta_e::{compare, delta_e, evaluate, ComparisonResult, DeltaEMethod, Verdict};
pub use error::{Error, Result};
pub use frame::{Frame, FrameSource, ImageFileSource, SampleRegion, DEFAULT_WARMUP_FRAMES};
pub use master::{MasterSample, MasterStore, DEFAULT_MASTERS_PATH};
pub use record::{sanitize_id, CaptureMode, CaptureRecord, RecordLog, TIMESTAMP_FORMAT};

pub use image::Rgb;
