use std::io::{self, BufRead, Write};
use std::path::Path;

use super::args::{CaptureArgs, Cli, Commands, ComparisonOptions};
use crate::style;
use aeye::{
    discovery::{enumerate_devices, CameraSelector},
    error::{Error, Result},
    format_rgb,
    inspection::{self, LoggedComparison},
    rgb_from_channels, CaptureMode, Config, ConvertToLab, FrameSource, ImageFileSource, Lab,
    MasterSample, MasterStore, SampleRegion,
};
use clap::ValueEnum;
use log::info;

/// Process exit status for a finished command. Failures are logged.
pub fn exit_code(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{}", e);
            1
        }
    }
}

pub fn run_cli(cli: Cli) -> Result<()> {
    let Cli {
        masters,
        data_dir,
        command,
        ..
    } = cli;

    match command {
        Commands::Compare(args) => {
            let store = MasterStore::load(&masters)?;
            let rgb = rgb_triple(&args.rgb)?;
            let outcome = inspection::compare_rgb_to_master(rgb, &store, &args.sample, args.method)?;
            let s = style::theme();

            info!(
                "Sample: {}\n Input RGB: {}\n Converted LAB: {}\n Reference LAB: {}\n Delta E ({}): {}\n Result: {}",
                s.highlight.apply_to(&outcome.master.name),
                s.primary.apply_to(format_rgb(&rgb)),
                s.primary.apply_to(outcome.measured.rounded()),
                s.secondary.apply_to(outcome.master.lab),
                outcome.result.method,
                s.emphasis.apply_to(format!("{:.2}", outcome.result.distance)),
                s.verdict(outcome.result.verdict).apply_to(outcome.result.verdict),
            );
            Ok(())
        }

        Commands::Convert(args) => {
            let s = style::theme();
            if let Some(values) = args.rgb {
                let rgb = rgb_triple(&values)?;
                let lab = rgb.to_lab();
                info!(
                    "RGB {} → LAB {}\n Round trip: RGB {}",
                    s.primary.apply_to(format_rgb(&rgb)),
                    s.secondary.apply_to(lab),
                    s.subtle.apply_to(format_rgb(&lab.to_rgb())),
                );
            } else if let Some(values) = args.lab {
                let lab = lab_triple(&values)?;
                let rgb = lab.to_rgb();
                info!(
                    "LAB {} → RGB {}\n Round trip: LAB {}",
                    s.secondary.apply_to(lab),
                    s.primary.apply_to(format_rgb(&rgb)),
                    s.subtle.apply_to(rgb.to_lab()),
                );
            }
            Ok(())
        }

        Commands::List => {
            let store = MasterStore::load_or_new(&masters)?;
            let samples = store.samples();
            let s = style::theme();
            if samples.is_empty() {
                info!(
                    "No master samples in {}",
                    s.secondary.apply_to(masters.display())
                );
                return Ok(());
            }
            info!(
                "Master Samples ({})\n{}",
                s.highlight.apply_to(samples.len()),
                style::listing(&samples)
            );
            Ok(())
        }

        Commands::Register(args) => {
            let lab = match (&args.lab, &args.rgb) {
                (Some(values), _) => lab_triple(values)?,
                (None, Some(values)) => rgb_triple(values)?.to_lab().rounded(),
                (None, None) => {
                    return Err(Error::ParseError(
                        "register needs --lab or --rgb".to_string(),
                    ))
                }
            };
            let sample = MasterSample::new(&args.name, lab, args.tolerance)?;

            let mut store = MasterStore::load_or_new(&masters)?;
            store.insert(sample, args.force)?;
            store.save()?;

            let s = style::theme();
            info!(
                "{} {} (tolerance {}) saved to: {}",
                s.highlight.apply_to(&args.name),
                s.primary.apply_to(lab),
                args.tolerance,
                s.secondary.apply_to(masters.display())
            );
            Ok(())
        }

        Commands::Devices => {
            let devices = enumerate_devices()?;
            let s = style::theme();
            if devices.is_empty() {
                info!("No cameras found");
                return Ok(());
            }
            info!(
                "Cameras ({})\n{}",
                s.highlight.apply_to(devices.len()),
                style::listing(&devices)
            );
            Ok(())
        }

        Commands::Capture(args) => run_capture(args, &data_dir),

        Commands::CompareLatest(args) => {
            let config = comparison_config(&data_dir, &args.comparison)?;
            let outcome = inspection::compare_latest(&args.reference, &config)?;
            report_logged(&outcome, &config);
            Ok(())
        }

        Commands::CompareImages(args) => {
            let config = comparison_config(&data_dir, &args.comparison)?;
            let outcome = inspection::compare_images(&args.sample, &args.reference, &config)?;
            report_logged(&outcome, &config);
            Ok(())
        }
    }
}

fn run_capture(args: CaptureArgs, data_dir: &Path) -> Result<()> {
    let region = match (args.box_size, args.fraction) {
        (Some(px), _) => SampleRegion::CenterBox(px),
        (None, Some(fraction)) => SampleRegion::CenterFraction(fraction),
        (None, None) => SampleRegion::default(),
    };
    let config = Config::validated(
        Config::builder()
            .data_dir(data_dir)
            .region(region)
            .maybe_num_threads(args.threads)
            .build(),
    )?;

    let mode = match args.mode {
        Some(mode) => mode,
        None => prompt_mode()?,
    };
    let sample_id = match &args.id {
        Some(id) => id.clone(),
        None => prompt("Enter sample ID: ")?,
    };
    if sample_id.trim().is_empty() {
        return Err(Error::ParseError("sample id must not be empty".to_string()));
    }

    let mut source: Box<dyn FrameSource> = match &args.frame {
        Some(path) => Box::new(ImageFileSource::new(path)),
        None => open_camera(camera_selector(&args), args.warmup)?,
    };

    let record = inspection::capture(mode, &sample_id, source.as_mut(), &config)?;

    let s = style::theme();
    info!(
        "Captured {} {} from camera {}\n LAB: {}\n Frame: {}\n Log: {}",
        mode,
        s.highlight.apply_to(&record.sample_id),
        s.subtle.apply_to(&record.camera_id),
        s.primary.apply_to(record.lab()),
        s.secondary.apply_to(config.frame_path(mode, &sample_id).display()),
        s.secondary.apply_to(config.log_path(mode).display()),
    );
    Ok(())
}

fn camera_selector(args: &CaptureArgs) -> CameraSelector {
    match (&args.camera_index, &args.camera_serial) {
        (Some(index), _) => CameraSelector::Index(*index),
        (None, Some(serial)) => CameraSelector::Serial(serial.clone()),
        (None, None) => CameraSelector::Interactive,
    }
}

#[cfg(feature = "camera")]
fn open_camera(selector: CameraSelector, warmup: usize) -> Result<Box<dyn FrameSource>> {
    use aeye::discovery::TerminalChooser;
    use aeye::frame::CameraSource;

    let devices = enumerate_devices()?;
    let mut chooser = TerminalChooser::new(io::stdin().lock(), io::stdout());
    let device = selector.resolve(&devices, &mut chooser)?;
    info!("Using camera {}", style::theme().highlight.apply_to(&device));
    Ok(Box::new(CameraSource::new(device, warmup)))
}

#[cfg(not(feature = "camera"))]
fn open_camera(selector: CameraSelector, _warmup: usize) -> Result<Box<dyn FrameSource>> {
    log::debug!("Camera {selector} requested without camera support");
    Err(Error::CameraUnavailable)
}

fn comparison_config(data_dir: &Path, options: &ComparisonOptions) -> Result<Config> {
    Config::validated(
        Config::builder()
            .data_dir(data_dir)
            .tolerance(options.tolerance)
            .method(options.method)
            .build(),
    )
}

fn report_logged(outcome: &LoggedComparison, config: &Config) {
    let s = style::theme();
    info!(
        "Sample: {} {}\n Reference: {} {}\n Delta E ({}): {} (tolerance {})\n Result: {}",
        s.highlight.apply_to(&outcome.sample_id),
        s.primary.apply_to(outcome.sample_lab.rounded()),
        s.highlight.apply_to(&outcome.reference),
        s.secondary.apply_to(outcome.reference_lab.rounded()),
        outcome.result.method,
        s.emphasis.apply_to(format!("{:.2}", outcome.result.distance)),
        outcome.result.tolerance,
        s.verdict(outcome.result.verdict).apply_to(outcome.result.verdict),
    );
    if outcome.rows_updated > 0 {
        info!(
            "Updated {} rows in {}",
            outcome.rows_updated,
            s.secondary
                .apply_to(config.log_path(CaptureMode::Sample).display())
        );
    }
}

fn rgb_triple(values: &[i64]) -> Result<aeye::Rgb<u8>> {
    match values {
        [r, g, b] => rgb_from_channels(*r, *g, *b),
        _ => Err(Error::ParseError(format!(
            "expected three RGB values, got {}",
            values.len()
        ))),
    }
}

fn lab_triple(values: &[f64]) -> Result<Lab> {
    match values {
        [l, a, b] => Ok(Lab::new(*l, *a, *b)),
        _ => Err(Error::ParseError(format!(
            "expected three LAB values, got {}",
            values.len()
        ))),
    }
}

fn prompt(message: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", style::theme().emphasis.apply_to(message))?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_mode() -> Result<CaptureMode> {
    let answer = prompt("Capture mode [master/sample]: ")?;
    CaptureMode::from_str(&answer, true)
        .map_err(|_| Error::ParseError(format!("unknown capture mode '{answer}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triples_need_exactly_three_values() {
        assert_eq!(rgb_triple(&[1, 2, 3]).unwrap(), aeye::Rgb([1, 2, 3]));
        assert!(matches!(
            rgb_triple(&[1, 2, 300]),
            Err(Error::InvalidRgbChannel { channel: "blue", value: 300 })
        ));
        assert!(matches!(rgb_triple(&[1, 2]), Err(Error::ParseError(_))));
        assert_eq!(lab_triple(&[50.0, -3.0, 4.0]).unwrap(), Lab::new(50.0, -3.0, 4.0));
    }

    #[test]
    fn camera_flags_map_to_selectors() {
        use clap::Parser;

        let cli = Cli::try_parse_from(["aeye", "capture", "--camera-serial", "8A5C3F1E"]).unwrap();
        let Commands::Capture(args) = cli.command else {
            panic!("expected capture");
        };
        assert_eq!(
            camera_selector(&args),
            CameraSelector::Serial("8A5C3F1E".into())
        );

        let cli = Cli::try_parse_from(["aeye", "capture", "--choose-camera"]).unwrap();
        let Commands::Capture(args) = cli.command else {
            panic!("expected capture");
        };
        assert_eq!(camera_selector(&args), CameraSelector::Interactive);
    }

    #[test]
    fn capture_requires_one_source() {
        use clap::Parser;

        assert!(Cli::try_parse_from(["aeye", "capture"]).is_err());
        assert!(Cli::try_parse_from([
            "aeye",
            "capture",
            "--frame",
            "a.png",
            "--camera-index",
            "0"
        ])
        .is_err());
    }

    #[test]
    fn missing_master_sample_exits_with_one() {
        use clap::Parser;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let masters = dir.path().join("master_samples.json");
        let mut store = MasterStore::new(&masters);
        store
            .insert(
                MasterSample::new("oak", Lab::new(50.0, 10.0, 20.0), 2.0).unwrap(),
                false,
            )
            .unwrap();
        store.save().unwrap();
        let masters = masters.to_str().unwrap();

        let run = |sample: &str| {
            let cli = Cli::try_parse_from([
                "aeye", "--masters", masters, "compare", "--sample", sample, "--rgb", "120",
                "80", "50",
            ])
            .unwrap();
            run_cli(cli)
        };

        let missing = run("missing");
        assert!(matches!(&missing, Err(Error::MasterNotFound(n)) if n == "missing"));
        assert_eq!(exit_code(&missing), 1);
        assert_eq!(exit_code(&run("oak")), 0);

        let absent = dir.path().join("absent.json");
        let cli = Cli::try_parse_from([
            "aeye", "--masters", absent.to_str().unwrap(), "compare", "--sample", "oak", "--rgb",
            "1", "2", "3",
        ])
        .unwrap();
        assert_eq!(exit_code(&run_cli(cli)), 1);
    }

    #[test]
    fn compare_parses_rgb_and_method() {
        use aeye::DeltaEMethod;
        use clap::Parser;

        let cli = Cli::try_parse_from([
            "aeye", "compare", "--sample", "oak", "--rgb", "120", "80", "50", "-m", "cie76",
        ])
        .unwrap();
        let Commands::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.rgb, vec![120, 80, 50]);
        assert_eq!(args.method, DeltaEMethod::Cie76);
        assert_eq!(cli.masters, Path::new(aeye::DEFAULT_MASTERS_PATH));
    }
}
