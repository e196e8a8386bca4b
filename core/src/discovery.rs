//! Locating the camera to capture from.
//!
//! Devices are read from the V4L2 sysfs class directory; serial numbers come
//! from the udev `by-id` symlinks, whose names follow
//! `<bus>-<vendor>_<model>_<serial>-video-index<N>`. On systems without
//! those directories enumeration returns an empty list and only a fixed
//! index can be selected.

use std::fmt;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[cfg(feature = "cli")]
use tabled::Tabled;

const SYS_CLASS_DIR: &str = "/sys/class/video4linux";
const BY_ID_DIR: &str = "/dev/v4l/by-id";
const DEV_DIR: &str = "/dev";

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(Tabled))]
pub struct DeviceInfo {
    #[cfg_attr(feature = "cli", tabled(rename = "Index"))]
    pub index: u32,
    #[cfg_attr(feature = "cli", tabled(rename = "Device", display = "display_path"))]
    pub path: PathBuf,
    #[cfg_attr(feature = "cli", tabled(rename = "Name"))]
    pub name: String,
    #[cfg_attr(feature = "cli", tabled(rename = "Serial", display = "display_serial"))]
    pub serial: Option<String>,
}

#[cfg(feature = "cli")]
fn display_path(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(feature = "cli")]
fn display_serial(serial: &Option<String>) -> String {
    serial.clone().unwrap_or_else(|| "n/a".to_string())
}

impl DeviceInfo {
    /// A device known only by its index, at the conventional `/dev/videoN` path.
    pub fn from_index(index: u32) -> Self {
        Self {
            index,
            path: Path::new(DEV_DIR).join(format!("video{index}")),
            name: "n/a".to_string(),
            serial: None,
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path.display(), self.name)?;
        if let Some(serial) = &self.serial {
            write!(f, " (serial {serial})")?;
        }
        Ok(())
    }
}

pub fn enumerate_devices() -> Result<Vec<DeviceInfo>> {
    enumerate_devices_in(
        Path::new(SYS_CLASS_DIR),
        Path::new(BY_ID_DIR),
        Path::new(DEV_DIR),
    )
}

pub fn enumerate_devices_in(
    sys_class_dir: &Path,
    by_id_dir: &Path,
    dev_dir: &Path,
) -> Result<Vec<DeviceInfo>> {
    if !sys_class_dir.is_dir() {
        log::debug!(
            "{} not present; no cameras enumerated",
            sys_class_dir.display()
        );
        return Ok(Vec::new());
    }

    let serials = serials_by_node(by_id_dir)?;

    let mut devices = Vec::new();
    for entry in fs::read_dir(sys_class_dir)? {
        let entry = entry?;
        let node = entry.file_name().to_string_lossy().into_owned();
        let Some(index) = video_index(&node) else {
            continue;
        };
        let name = fs::read_to_string(entry.path().join("name"))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "n/a".to_string());
        devices.push(DeviceInfo {
            index,
            path: dev_dir.join(&node),
            name,
            serial: serials
                .iter()
                .find(|(n, _)| *n == node)
                .map(|(_, s)| s.clone()),
        });
    }
    devices.sort_by_key(|d| d.index);
    log::debug!("Enumerated {} video devices", devices.len());
    Ok(devices)
}

// (node name, serial) pairs resolved from the by-id symlinks.
fn serials_by_node(by_id_dir: &Path) -> Result<Vec<(String, String)>> {
    if !by_id_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut pairs = Vec::new();
    for entry in fs::read_dir(by_id_dir)? {
        let entry = entry?;
        let link_name = entry.file_name().to_string_lossy().into_owned();
        let Some(serial) = serial_from_by_id(&link_name) else {
            continue;
        };
        let Ok(target) = fs::read_link(entry.path()) else {
            continue;
        };
        if let Some(node) = target.file_name() {
            pairs.push((node.to_string_lossy().into_owned(), serial));
        }
    }
    Ok(pairs)
}

fn video_index(node: &str) -> Option<u32> {
    node.strip_prefix("video")?.parse().ok()
}

/// Extracts the serial from a udev by-id link name, if it carries one.
///
/// The serial is the last `_`-separated field of `<vendor>_<model>_<serial>`
/// and must be alphanumeric with at least one digit. Link names carry no
/// marker for a missing serial, so a device without one whose model ends in
/// such a token (`..._C920`) still reports that token.
pub fn serial_from_by_id(link_name: &str) -> Option<String> {
    let (id, _) = link_name.split_once("-video-index")?;
    let (_, id) = id.split_once('-')?;
    let (_, serial) = id.rsplit_once('_')?;
    let looks_like_serial = !serial.is_empty()
        && serial.chars().all(|c| c.is_ascii_alphanumeric())
        && serial.chars().any(|c| c.is_ascii_digit());
    looks_like_serial.then(|| serial.to_string())
}

/// Picks one device out of an enumerated list.
pub trait DeviceChooser {
    fn choose(&mut self, devices: &[DeviceInfo]) -> Result<usize>;
}

/// Lists devices on `output` and reads a list position from `input`.
pub struct TerminalChooser<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalChooser<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> DeviceChooser for TerminalChooser<R, W> {
    fn choose(&mut self, devices: &[DeviceInfo]) -> Result<usize> {
        if devices.is_empty() {
            return Err(Error::CameraNotFound(CameraSelector::Interactive.to_string()));
        }
        writeln!(self.output, "Available cameras:")?;
        for (i, device) in devices.iter().enumerate() {
            writeln!(self.output, "  [{i}] {device}")?;
        }
        write!(self.output, "Select camera [0-{}]: ", devices.len() - 1)?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let choice = line.trim();
        match choice.parse::<usize>() {
            Ok(i) if i < devices.len() => Ok(i),
            _ => Err(Error::InvalidCameraChoice(choice.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraSelector {
    Index(u32),
    Serial(String),
    Interactive,
}

impl fmt::Display for CameraSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraSelector::Index(i) => write!(f, "index {i}"),
            CameraSelector::Serial(s) => write!(f, "serial {s}"),
            CameraSelector::Interactive => write!(f, "interactive choice"),
        }
    }
}

impl CameraSelector {
    pub fn resolve(
        &self,
        devices: &[DeviceInfo],
        chooser: &mut dyn DeviceChooser,
    ) -> Result<DeviceInfo> {
        let device = match self {
            CameraSelector::Index(index) => devices
                .iter()
                .find(|d| d.index == *index)
                .cloned()
                .unwrap_or_else(|| DeviceInfo::from_index(*index)),
            CameraSelector::Serial(serial) => devices
                .iter()
                .find(|d| {
                    d.serial
                        .as_deref()
                        .is_some_and(|s| s.eq_ignore_ascii_case(serial))
                })
                .cloned()
                .ok_or_else(|| Error::CameraNotFound(self.to_string()))?,
            CameraSelector::Interactive => {
                if devices.is_empty() {
                    return Err(Error::CameraNotFound(self.to_string()));
                }
                devices[chooser.choose(devices)?].clone()
            }
        };
        log::debug!("Camera {self} resolved to {device}");
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct FixedChooser(usize);

    impl DeviceChooser for FixedChooser {
        fn choose(&mut self, _devices: &[DeviceInfo]) -> Result<usize> {
            Ok(self.0)
        }
    }

    fn devices() -> Vec<DeviceInfo> {
        vec![
            DeviceInfo {
                index: 0,
                path: PathBuf::from("/dev/video0"),
                name: "Integrated Camera".into(),
                serial: None,
            },
            DeviceInfo {
                index: 2,
                path: PathBuf::from("/dev/video2"),
                name: "HD Pro Webcam C920".into(),
                serial: Some("8A5C3F1E".into()),
            },
        ]
    }

    #[test]
    fn parses_serial_from_by_id_names() {
        assert_eq!(
            serial_from_by_id("usb-046d_HD_Pro_Webcam_C920_8A5C3F1E-video-index0").as_deref(),
            Some("8A5C3F1E")
        );
        assert_eq!(serial_from_by_id("usb-Chicony-video-index0"), None);
        assert_eq!(serial_from_by_id("not-a-video-link"), None);
        assert_eq!(
            serial_from_by_id("usb-Microsoft_LifeCam_HD-3000-video-index0"),
            None
        );
        assert_eq!(
            serial_from_by_id("usb-Sonix_Technology_Co._Ltd._USB_2.0_Camera_SN0001-video-index0")
                .as_deref(),
            Some("SN0001")
        );
        assert_eq!(serial_from_by_id("usb-Generic_USB_Camera-video-index0"), None);
    }

    #[test]
    fn terminal_chooser_rejects_empty_list() {
        let mut out = Vec::new();
        let mut chooser = TerminalChooser::new(Cursor::new("0\n"), &mut out);
        assert!(matches!(
            chooser.choose(&[]),
            Err(Error::CameraNotFound(_))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn index_selection_falls_back_to_dev_path() {
        let mut chooser = FixedChooser(0);
        let found = CameraSelector::Index(2)
            .resolve(&devices(), &mut chooser)
            .unwrap();
        assert_eq!(found.name, "HD Pro Webcam C920");

        let fallback = CameraSelector::Index(5).resolve(&[], &mut chooser).unwrap();
        assert_eq!(fallback.path, Path::new("/dev/video5"));
    }

    #[test]
    fn serial_selection_must_match() {
        let mut chooser = FixedChooser(0);
        let found = CameraSelector::Serial("8a5c3f1e".into())
            .resolve(&devices(), &mut chooser)
            .unwrap();
        assert_eq!(found.index, 2);
        assert!(matches!(
            CameraSelector::Serial("nope".into()).resolve(&devices(), &mut chooser),
            Err(Error::CameraNotFound(_))
        ));
    }

    #[test]
    fn terminal_chooser_reads_position() {
        let mut out = Vec::new();
        let mut chooser = TerminalChooser::new(Cursor::new("1\n"), &mut out);
        let found = CameraSelector::Interactive
            .resolve(&devices(), &mut chooser)
            .unwrap();
        assert_eq!(found.index, 2);
        let listing = String::from_utf8(out).unwrap();
        assert!(listing.contains("[1] /dev/video2 HD Pro Webcam C920 (serial 8A5C3F1E)"));

        let mut chooser = TerminalChooser::new(Cursor::new("7\n"), Vec::new());
        assert!(matches!(
            CameraSelector::Interactive.resolve(&devices(), &mut chooser),
            Err(Error::InvalidCameraChoice(c)) if c == "7"
        ));
        assert!(CameraSelector::Interactive
            .resolve(&[], &mut FixedChooser(0))
            .is_err());
    }

    #[cfg(unix)]
    #[test]
    fn enumerates_fake_sysfs() {
        use std::os::unix::fs::symlink;
        use tempfile::TempDir;

        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let sys = root.join("sys");
        let by_id = root.join("by-id");
        for (node, name) in [("video2", "HD Pro Webcam C920\n"), ("video0", "Integrated\n")] {
            fs::create_dir_all(sys.join(node)).unwrap();
            fs::write(sys.join(node).join("name"), name).unwrap();
        }
        fs::create_dir_all(sys.join("v4l-subdev0")).unwrap();
        fs::create_dir_all(&by_id).unwrap();
        symlink(
            "../../video2",
            by_id.join("usb-046d_HD_Pro_Webcam_C920_8A5C3F1E-video-index0"),
        )
        .unwrap();

        let found = enumerate_devices_in(&sys, &by_id, Path::new("/dev")).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].index, 0);
        assert_eq!(found[0].name, "Integrated");
        assert_eq!(found[0].serial, None);
        assert_eq!(found[1].path, Path::new("/dev/video2"));
        assert_eq!(found[1].serial.as_deref(), Some("8A5C3F1E"));

        assert!(enumerate_devices_in(&root.join("missing"), &by_id, Path::new("/dev"))
            .unwrap()
            .is_empty());
    }
}
