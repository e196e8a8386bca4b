use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::Lab;
use crate::error::{Error, Result};

#[cfg(feature = "cli")]
use tabled::Tabled;

pub const DEFAULT_MASTERS_PATH: &str = "comparison/master_samples.json";

/// A named reference color with its accept/reject tolerance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(Tabled))]
pub struct MasterSample {
    #[cfg_attr(feature = "cli", tabled(rename = "Name"))]
    pub name: String,
    #[cfg_attr(feature = "cli", tabled(rename = "LAB"))]
    pub lab: Lab,
    #[cfg_attr(feature = "cli", tabled(rename = "Tolerance"))]
    pub tolerance: f64,
}

impl MasterSample {
    pub fn new(name: impl Into<String>, lab: Lab, tolerance: f64) -> Result<Self> {
        validate_tolerance(tolerance)?;
        Ok(Self {
            name: name.into(),
            lab,
            tolerance,
        })
    }
}

pub(crate) fn validate_tolerance(tolerance: f64) -> Result<()> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(Error::InvalidTolerance(tolerance));
    }
    Ok(())
}

// On-disk shape: { "<name>": { "lab": [L, a, b], "tolerance": t } }
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MasterEntry {
    lab: [f64; 3],
    tolerance: f64,
}

/// Master samples keyed by exact name, backed by a JSON file.
#[derive(Debug, Clone)]
pub struct MasterStore {
    path: PathBuf,
    entries: BTreeMap<String, MasterEntry>,
}

impl MasterStore {
    /// An empty store that will be written to `path` on [`MasterStore::save`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MasterStoreNotFound(path.to_path_buf()));
        }
        let s = fs::read_to_string(path)?;
        let entries: BTreeMap<String, MasterEntry> = serde_json::from_str(&s)?;
        if let Some((name, entry)) = entries
            .iter()
            .find(|(_, entry)| validate_tolerance(entry.tolerance).is_err())
        {
            return Err(Error::InvalidMasterTolerance {
                name: name.clone(),
                tolerance: entry.tolerance,
            });
        }
        log::debug!(
            "Loaded {} master samples from {}",
            entries.len(),
            path.display()
        );
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Loads the store, or starts an empty one if the file does not exist yet.
    pub fn load_or_new(path: impl AsRef<Path>) -> Result<Self> {
        match Self::load(&path) {
            Err(Error::MasterStoreNotFound(p)) => Ok(Self::new(p)),
            other => other,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<MasterSample> {
        let sample = self.entries.get(name).map(|entry| MasterSample {
            name: name.to_string(),
            lab: Lab::from_array(entry.lab),
            tolerance: entry.tolerance,
        });
        if sample.is_none() {
            log::debug!("Master sample '{name}' not found.");
        }
        sample
    }

    pub fn get(&self, name: &str) -> Result<MasterSample> {
        self.find(name)
            .ok_or_else(|| Error::MasterNotFound(name.to_string()))
    }

    /// All samples, ordered by name.
    pub fn samples(&self) -> Vec<MasterSample> {
        self.entries
            .iter()
            .map(|(name, entry)| MasterSample {
                name: name.clone(),
                lab: Lab::from_array(entry.lab),
                tolerance: entry.tolerance,
            })
            .collect()
    }

    pub fn insert(&mut self, sample: MasterSample, force: bool) -> Result<()> {
        validate_tolerance(sample.tolerance)?;
        if !force && self.entries.contains_key(&sample.name) {
            return Err(Error::MasterExists(sample.name));
        }
        self.entries.insert(
            sample.name,
            MasterEntry {
                lab: sample.lab.to_array(),
                tolerance: sample.tolerance,
            },
        );
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<MasterSample> {
        let sample = self.get(name)?;
        self.entries.remove(name);
        Ok(sample)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json_string = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json_string)?;
        log::debug!(
            "Saved {} master samples to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}
