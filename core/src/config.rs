use bon::Builder;
use std::fmt;
use std::path::PathBuf;

use crate::{
    delta_e::DeltaEMethod,
    error::{Error, Result},
    frame::SampleRegion,
    master::validate_tolerance,
    record::{sanitize_id, CaptureMode},
};

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, Builder)]
pub struct Config {
    #[builder(default)]
    pub method: DeltaEMethod,

    /// Used where no master tolerance applies (log and image comparisons).
    #[builder(default = 1.0)]
    pub tolerance: f64,

    #[builder(default)]
    pub region: SampleRegion,

    #[builder(into, default = PathBuf::from(DEFAULT_DATA_DIR))]
    pub data_dir: PathBuf,

    #[builder(default = num_cpus::get())]
    pub num_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ method: {}, tolerance: {}, region: {:?}, data_dir: {}, num_threads: {} }}",
            self.method,
            self.tolerance,
            self.region,
            self.data_dir.display(),
            self.num_threads,
        )
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        validate_tolerance(self.tolerance)?;
        self.region.validate()?;

        if self.num_threads == 0 || self.num_threads > num_cpus::get() {
            return Err(Error::InvalidThreadCount(num_cpus::get()));
        }

        Ok(())
    }

    pub fn validated(config: Self) -> Result<Self> {
        config.validate()?;
        Ok(config)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn log_path(&self, mode: CaptureMode) -> PathBuf {
        self.logs_dir().join(format!("{}_log.csv", mode))
    }

    pub fn frames_dir(&self, mode: CaptureMode) -> PathBuf {
        match mode {
            CaptureMode::Master => self.data_dir.join("masters"),
            CaptureMode::Sample => self.data_dir.join("samples"),
        }
    }

    /// Where the frame captured for `sample_id` is stored.
    pub fn frame_path(&self, mode: CaptureMode, sample_id: &str) -> PathBuf {
        self.frames_dir(mode)
            .join(format!("{}.png", sanitize_id(sample_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.method, DeltaEMethod::Ciede2000);
        assert_eq!(config.tolerance, 1.0);
        assert_eq!(config.region, SampleRegion::CenterFraction(0.5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let negative = Config::builder().tolerance(-1.0).build();
        assert!(matches!(negative.validate(), Err(Error::InvalidTolerance(_))));

        let no_threads = Config::builder().num_threads(0).build();
        assert!(matches!(
            Config::validated(no_threads),
            Err(Error::InvalidThreadCount(_))
        ));

        let empty_box = Config::builder().region(SampleRegion::CenterBox(0)).build();
        assert!(matches!(
            empty_box.validate(),
            Err(Error::InvalidSampleRegion(_))
        ));
    }

    #[test]
    fn derives_data_layout() {
        let config = Config::builder().data_dir("/tmp/aeye").build();
        assert_eq!(
            config.log_path(CaptureMode::Sample),
            Path::new("/tmp/aeye/logs/sample_log.csv")
        );
        assert_eq!(
            config.frame_path(CaptureMode::Master, "Paradise Dream"),
            Path::new("/tmp/aeye/masters/paradise_dream.png")
        );
    }
}
