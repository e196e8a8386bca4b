mod file;

#[cfg(feature = "camera")]
mod camera;

pub use file::ImageFileSource;

#[cfg(feature = "camera")]
pub use camera::CameraSource;

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use image::{imageops, ImageFormat, Rgb, RgbImage};
use rayon::{prelude::*, ThreadPoolBuilder};

use crate::color::{ConvertToLab, Lab};
use crate::error::{Error, Result};

/// Frames decoded the first time a camera is ready are often dark or
/// unbalanced while exposure settles.
pub const DEFAULT_WARMUP_FRAMES: usize = 10;

/// Produces one RGB frame on demand.
pub trait FrameSource {
    fn grab(&mut self) -> Result<Frame>;

    /// Identifier written to the capture log's camera column.
    fn source_id(&self) -> String;
}

/// Part of a frame that is averaged into a single color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleRegion {
    Full,
    /// Centered rectangle covering this fraction of the width and of the height.
    CenterFraction(f32),
    /// Centered square with this side in pixels, shrunk to fit the frame.
    CenterBox(u32),
}

impl Default for SampleRegion {
    fn default() -> Self {
        SampleRegion::CenterFraction(0.5)
    }
}

impl SampleRegion {
    pub fn validate(&self) -> Result<()> {
        match *self {
            SampleRegion::Full => Ok(()),
            SampleRegion::CenterFraction(f) if f.is_finite() && f > 0.0 && f <= 1.0 => Ok(()),
            SampleRegion::CenterFraction(f) => Err(Error::InvalidSampleRegion(format!(
                "fraction must be in (0, 1], got {f}"
            ))),
            SampleRegion::CenterBox(0) => Err(Error::InvalidSampleRegion(
                "box size must be positive".to_string(),
            )),
            SampleRegion::CenterBox(_) => Ok(()),
        }
    }

    /// `(x, y, width, height)` of the region inside a `width` x `height` frame.
    pub fn rect(&self, width: u32, height: u32) -> Result<(u32, u32, u32, u32)> {
        self.validate()?;
        let (x, y, w, h) = match *self {
            SampleRegion::Full => (0, 0, width, height),
            SampleRegion::CenterFraction(f) => {
                let span = |len: u32| {
                    let start = (len as f32 * (1.0 - f) / 2.0).floor() as u32;
                    let end = ((len as f32 * (1.0 + f) / 2.0).floor() as u32).min(len);
                    (start, end.saturating_sub(start))
                };
                let (x, w) = span(width);
                let (y, h) = span(height);
                (x, y, w, h)
            }
            SampleRegion::CenterBox(side) => {
                let w = side.min(width);
                let h = side.min(height);
                ((width - w) / 2, (height - h) / 2, w, h)
            }
        };
        if w == 0 || h == 0 {
            return Err(Error::EmptyRegion { width, height });
        }
        Ok((x, y, w, h))
    }
}

#[derive(Clone, Debug)]
pub struct Frame {
    pub buffer: RgbImage,
}

impl Frame {
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let format = ImageFormat::from_path(&path)?;
        let dynamic_image = image::load(BufReader::new(file), format)?;
        Ok(Self::new(dynamic_image.into_rgb8()))
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.buffer
            .save_with_format(path, ImageFormat::Png)
            .map_err(Error::ImageSaveError)?;
        log::debug!("Saved frame to {}", path.display());
        Ok(())
    }

    fn crop(&self, region: SampleRegion) -> Result<RgbImage> {
        let (x, y, w, h) = region.rect(self.width(), self.height())?;
        log::debug!(
            "Sampling {}x{} at ({}, {}) of a {}x{} frame",
            w,
            h,
            x,
            y,
            self.width(),
            self.height()
        );
        Ok(imageops::crop_imm(&self.buffer, x, y, w, h).to_image())
    }

    /// Mean of the per-pixel LAB values inside `region`.
    pub fn average_lab(&self, region: SampleRegion, num_threads: usize) -> Result<Lab> {
        let crop = self.crop(region)?;
        let count = crop.width() as f64 * crop.height() as f64;
        let pool = ThreadPoolBuilder::new().num_threads(num_threads).build()?;

        let [l, a, b] = pool.install(|| {
            crop.as_raw()
                .par_chunks_exact(3)
                .map(|p| Rgb([p[0], p[1], p[2]]).to_lab().to_array())
                .reduce(|| [0.0; 3], sum3)
        });

        Ok(Lab::new(l / count, a / count, b / count))
    }

    /// Per-channel mean RGB inside `region`, rounded to the nearest level.
    pub fn average_rgb(&self, region: SampleRegion, num_threads: usize) -> Result<Rgb<u8>> {
        let crop = self.crop(region)?;
        let count = crop.width() as f64 * crop.height() as f64;
        let pool = ThreadPoolBuilder::new().num_threads(num_threads).build()?;

        let [r, g, b] = pool.install(|| {
            crop.as_raw()
                .par_chunks_exact(3)
                .map(|p| [p[0] as f64, p[1] as f64, p[2] as f64])
                .reduce(|| [0.0; 3], sum3)
        });

        let mean = |v: f64| (v / count).round().clamp(0.0, 255.0) as u8;
        Ok(Rgb([mean(r), mean(g), mean(b)]))
    }
}

#[inline]
fn sum3(x: [f64; 3], y: [f64; 3]) -> [f64; 3] {
    [x[0] + y[0], x[1] + y[1], x[2] + y[2]]
}
