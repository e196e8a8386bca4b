use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::color::{round2, Lab};
use crate::delta_e::Verdict;
use crate::error::{Error, Result};

#[cfg(feature = "cli")]
use clap::ValueEnum;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
pub enum CaptureMode {
    Master,
    Sample,
}

/// One row of a capture log.
///
/// Master rows leave the comparison columns empty; sample rows fill them once
/// compared against a reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub timestamp: String,
    pub sample_id: String,
    pub camera_id: String,
    pub l: f64,
    pub a: f64,
    pub b: f64,
    pub reference: Option<String>,
    pub delta_e: Option<f64>,
    pub result: Option<Verdict>,
}

impl CaptureRecord {
    /// A fresh, uncompared record stamped with the current local time.
    pub fn new(sample_id: impl Into<String>, camera_id: impl Into<String>, lab: Lab) -> Self {
        let lab = lab.rounded();
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            sample_id: sample_id.into(),
            camera_id: camera_id.into(),
            l: lab.l,
            a: lab.a,
            b: lab.b,
            reference: None,
            delta_e: None,
            result: None,
        }
    }

    pub fn lab(&self) -> Lab {
        Lab::new(self.l, self.a, self.b)
    }
}

/// Lower-cased, space-free form of a sample id, used for frame file names.
pub fn sanitize_id(sample_id: &str) -> String {
    sample_id.trim().to_lowercase().replace(' ', "_")
}

/// Append-only CSV log of capture records.
#[derive(Debug, Clone)]
pub struct RecordLog {
    path: PathBuf,
}

impl RecordLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &CaptureRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let needs_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;

        log::debug!(
            "Logged '{}' to {}",
            record.sample_id,
            self.path.display()
        );
        Ok(())
    }

    pub fn records(&self) -> Result<Vec<CaptureRecord>> {
        let file = File::open(&self.path)?;
        let mut reader = csv::Reader::from_reader(file);
        let records = reader
            .deserialize()
            .collect::<std::result::Result<Vec<CaptureRecord>, _>>()?;
        Ok(records)
    }

    pub fn latest(&self) -> Result<CaptureRecord> {
        self.records()?
            .pop()
            .ok_or_else(|| Error::EmptyLog(self.path.clone()))
    }

    /// Writes the comparison outcome into every row for `sample_id`.
    ///
    /// Returns the number of rows updated; zero leaves the file untouched.
    pub fn update_verdict(
        &self,
        sample_id: &str,
        reference: &str,
        delta_e: f64,
        verdict: Verdict,
    ) -> Result<usize> {
        let mut records = self.records()?;
        let mut updated = 0;
        for record in records.iter_mut().filter(|r| r.sample_id == sample_id) {
            record.reference = Some(reference.to_string());
            record.delta_e = Some(round2(delta_e));
            record.result = Some(verdict);
            updated += 1;
        }

        if updated == 0 {
            log::warn!(
                "Sample '{}' not found in {}. Skipping log update.",
                sample_id,
                self.path.display()
            );
            return Ok(0);
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        for record in &records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        log::debug!("Updated {updated} rows in {}", self.path.display());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_log(dir: &TempDir, name: &str) -> RecordLog {
        RecordLog::new(dir.path().join("logs").join(name))
    }

    #[test]
    fn append_writes_header_once_and_rounds() {
        let dir = TempDir::new().unwrap();
        let log = temp_log(&dir, "sample_log.csv");
        log.append(&CaptureRecord::new("board 1", "0", Lab::new(55.2049, 9.3, -18.7151)))
            .unwrap();
        log.append(&CaptureRecord::new("board 2", "0", Lab::new(60.0, 1.0, 2.0)))
            .unwrap();

        let text = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "timestamp,sample_id,camera_id,l,a,b,reference,delta_e,result"
        );
        assert!(lines[1].ends_with(",board 1,0,55.2,9.3,-18.72,,,"));

        let latest = log.latest().unwrap();
        assert_eq!(latest.sample_id, "board 2");
        assert_eq!(latest.result, None);
    }

    #[test]
    fn empty_and_missing_logs_fail() {
        let dir = TempDir::new().unwrap();
        let log = temp_log(&dir, "master_log.csv");
        assert!(matches!(log.latest(), Err(Error::Io(_))));
        fs::create_dir_all(log.path().parent().unwrap()).unwrap();
        fs::write(log.path(), "").unwrap();
        assert!(matches!(log.latest(), Err(Error::EmptyLog(_))));
    }

    #[test]
    fn update_verdict_rewrites_matching_rows() {
        let dir = TempDir::new().unwrap();
        let log = temp_log(&dir, "sample_log.csv");
        log.append(&CaptureRecord::new("a", "0", Lab::new(50.0, 0.0, 0.0)))
            .unwrap();
        log.append(&CaptureRecord::new("b", "1", Lab::new(52.0, 0.0, 0.0)))
            .unwrap();

        assert_eq!(
            log.update_verdict("b", "oak_stain", 1.23456, Verdict::OutOfRange)
                .unwrap(),
            1
        );
        assert_eq!(
            log.update_verdict("zzz", "oak_stain", 0.1, Verdict::InRange)
                .unwrap(),
            0
        );

        let records = log.records().unwrap();
        assert_eq!(records[0].reference, None);
        assert_eq!(records[1].reference.as_deref(), Some("oak_stain"));
        assert_eq!(records[1].delta_e, Some(1.23));
        assert_eq!(records[1].result, Some(Verdict::OutOfRange));
        assert!(fs::read_to_string(log.path()).unwrap().contains(",oak_stain,1.23,FAIL"));
    }

    #[test]
    fn ids_are_sanitized_for_file_names() {
        assert_eq!(sanitize_id("Paradise Dream"), "paradise_dream");
        assert_eq!(sanitize_id(" oak_stain "), "oak_stain");
    }
}
