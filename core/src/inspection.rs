//! End-to-end inspection steps built from the conversion, comparison,
//! frame and logging pieces.

use image::Rgb;

use crate::{
    color::{ConvertToLab, Lab},
    config::Config,
    delta_e::{compare, ComparisonResult, DeltaEMethod},
    error::{Error, Result},
    frame::{Frame, FrameSource, SampleRegion},
    master::{MasterSample, MasterStore},
    record::{CaptureMode, CaptureRecord, RecordLog},
};

/// Outcome of comparing a measured color with a master sample.
#[derive(Debug, Clone)]
pub struct MasterComparison {
    pub measured: Lab,
    pub master: MasterSample,
    pub result: ComparisonResult,
}

/// Outcome of comparing two logged or stored measurements.
#[derive(Debug, Clone)]
pub struct LoggedComparison {
    pub sample_id: String,
    pub reference: String,
    pub sample_lab: Lab,
    pub reference_lab: Lab,
    pub result: ComparisonResult,
    pub rows_updated: usize,
}

pub fn compare_rgb_to_master(
    rgb: Rgb<u8>,
    store: &MasterStore,
    name: &str,
    method: DeltaEMethod,
) -> Result<MasterComparison> {
    let master = store.get(name)?;
    let measured = rgb.to_lab();
    let result = compare(&measured, &master.lab, master.tolerance, method);
    Ok(MasterComparison {
        measured,
        master,
        result,
    })
}

/// Grabs one frame, stores it, and logs its averaged color.
pub fn capture(
    mode: CaptureMode,
    sample_id: &str,
    source: &mut dyn FrameSource,
    config: &Config,
) -> Result<CaptureRecord> {
    config.validate()?;

    let frame = source.grab()?;
    frame.save_png(config.frame_path(mode, sample_id))?;

    let lab = frame.average_lab(config.region, config.num_threads)?;
    let record = CaptureRecord::new(sample_id, source.source_id(), lab);
    RecordLog::new(config.log_path(mode)).append(&record)?;

    log::debug!("{mode} '{sample_id}' captured at {}", record.lab());
    Ok(record)
}

/// Compares the newest sample-log entry with the newest master-log entry and
/// records the verdict in the sample log.
pub fn compare_latest(reference: &str, config: &Config) -> Result<LoggedComparison> {
    config.validate()?;

    let master = RecordLog::new(config.log_path(CaptureMode::Master)).latest()?;
    let sample_log = RecordLog::new(config.log_path(CaptureMode::Sample));
    let sample = sample_log.latest()?;

    if master.sample_id != reference {
        log::debug!(
            "Latest master entry is '{}', comparing it as '{}'",
            master.sample_id,
            reference
        );
    }

    let sample_lab = sample.lab();
    finish_logged_comparison(
        &sample_log,
        sample.sample_id,
        reference,
        sample_lab,
        master.lab(),
        config,
    )
}

/// Compares the stored frames of a sample and a master, averaged over the
/// whole image, and records the verdict in the sample log.
pub fn compare_images(
    sample_id: &str,
    reference: &str,
    config: &Config,
) -> Result<LoggedComparison> {
    config.validate()?;

    let sample_path = config.frame_path(CaptureMode::Sample, sample_id);
    let master_path = config.frame_path(CaptureMode::Master, reference);
    for path in [&sample_path, &master_path] {
        if !path.is_file() {
            return Err(Error::FrameNotFound(path.clone()));
        }
    }

    let sample_lab =
        Frame::from_file(&sample_path)?.average_lab(SampleRegion::Full, config.num_threads)?;
    let master_lab =
        Frame::from_file(&master_path)?.average_lab(SampleRegion::Full, config.num_threads)?;

    finish_logged_comparison(
        &RecordLog::new(config.log_path(CaptureMode::Sample)),
        sample_id.to_string(),
        reference,
        sample_lab,
        master_lab,
        config,
    )
}

fn finish_logged_comparison(
    sample_log: &RecordLog,
    sample_id: String,
    reference: &str,
    sample_lab: Lab,
    reference_lab: Lab,
    config: &Config,
) -> Result<LoggedComparison> {
    let result = compare(&sample_lab, &reference_lab, config.tolerance, config.method);

    let rows_updated = if sample_log.path().is_file() {
        sample_log.update_verdict(&sample_id, reference, result.distance, result.verdict)?
    } else {
        log::warn!(
            "Log file {} not found. Skipping log update.",
            sample_log.path().display()
        );
        0
    };

    Ok(LoggedComparison {
        sample_id,
        reference: reference.to_string(),
        sample_lab,
        reference_lab,
        result,
        rows_updated,
    })
}
