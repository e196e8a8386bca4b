use aeye::{CaptureMode, DeltaEMethod, DEFAULT_DATA_DIR, DEFAULT_MASTERS_PATH, DEFAULT_WARMUP_FRAMES};
use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};

const SUBCOMMAND_TEMPLATE: &str = "\
{before-help}
{about-with-newline}
{usage-heading}
  {usage}

{all-args}{after-help}
";

#[derive(Debug, Parser)]
#[command(
    name = "aeye",
    version,
    about = "Compares captured color samples against master references using CIE Delta E",
    help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading}
  {usage}

{all-args}{after-help}
",
    override_usage = "aeye \x1b[3m\x1b[38;5;137m[COMMAND] [OPTIONS] [FLAGS]\x1b[0m",
    disable_help_flag = true,
    disable_version_flag = true,
    styles(crate::style::clap_styles()),
    subcommand_help_heading = "COMMANDS"
)]
pub struct Cli {
    #[arg(
        short,
        long,
        action = ArgAction::Help,
        global = true,
        help = "Prints help information",
        help_heading = "FLAGS"
    )]
    pub help: Option<bool>,

    #[arg(
        short = 'V',
        long,
        action = ArgAction::Version,
        help = "Prints version information",
        help_heading = "FLAGS"
    )]
    pub version: Option<bool>,

    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increases logging verbosity (repeatable)",
        help_heading = "FLAGS"
    )]
    pub verbose: u8,

    /// Master sample store (JSON)
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        default_value = DEFAULT_MASTERS_PATH,
        help_heading = "GLOBAL OPTIONS"
    )]
    pub masters: PathBuf,

    /// Directory holding captured frames and logs
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        default_value = DEFAULT_DATA_DIR,
        help_heading = "GLOBAL OPTIONS"
    )]
    pub data_dir: PathBuf,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare an RGB color against a stored master sample
    #[command(
        override_usage = "aeye compare --sample \x1b[3m\x1b[38;5;137m<NAME>\x1b[0m --rgb \x1b[3m\x1b[38;5;137m<R> <G> <B>\x1b[0m",
        help_template = SUBCOMMAND_TEMPLATE
    )]
    Compare(CompareArgs),

    /// Convert between RGB and LAB
    #[command(help_template = SUBCOMMAND_TEMPLATE)]
    Convert(ConvertArgs),

    /// List stored master samples
    #[command(override_usage = "aeye list")]
    List,

    /// Add a master sample to the store
    #[command(
        override_usage = "aeye register \x1b[3m\x1b[38;5;137m<NAME>\x1b[0m (--lab | --rgb) --tolerance \x1b[3m\x1b[38;5;137m<T>\x1b[0m",
        help_template = SUBCOMMAND_TEMPLATE
    )]
    Register(RegisterArgs),

    /// List connected cameras
    #[command(override_usage = "aeye devices")]
    Devices,

    /// Capture a frame and log its averaged LAB color
    #[command(help_template = SUBCOMMAND_TEMPLATE)]
    Capture(CaptureArgs),

    /// Compare the latest sample capture with the latest master capture
    #[command(help_template = SUBCOMMAND_TEMPLATE)]
    CompareLatest(CompareLatestArgs),

    /// Compare stored sample and master frames over the whole image
    #[command(help_template = SUBCOMMAND_TEMPLATE)]
    CompareImages(CompareImagesArgs),
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Name of the master sample
    #[arg(long, value_name = "NAME", help_heading = "REQUIRED OPTIONS")]
    pub sample: String,

    /// Measured color
    #[arg(
        long,
        num_args = 3,
        value_names = ["R", "G", "B"],
        required = true,
        allow_negative_numbers = true,
        help_heading = "REQUIRED OPTIONS"
    )]
    pub rgb: Vec<i64>,

    /// Delta E formula
    #[arg(
        short,
        long,
        value_enum,
        value_name = "METHOD",
        default_value = "cie2000",
        help_heading = "MISC OPTIONS"
    )]
    pub method: DeltaEMethod,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("color").required(true).args(["rgb", "lab"])))]
pub struct ConvertArgs {
    /// RGB color to convert to LAB
    #[arg(long, num_args = 3, value_names = ["R", "G", "B"], allow_negative_numbers = true)]
    pub rgb: Option<Vec<i64>>,

    /// LAB color to convert to RGB
    #[arg(long, num_args = 3, value_names = ["L", "A", "B"], allow_negative_numbers = true)]
    pub lab: Option<Vec<f64>>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("color").required(true).args(["rgb", "lab"])))]
pub struct RegisterArgs {
    /// Name to store the master sample under
    #[arg(value_name = "NAME", required = true, help_heading = "REQUIRED OPTIONS")]
    pub name: String,

    /// Reference LAB color
    #[arg(long, num_args = 3, value_names = ["L", "A", "B"], allow_negative_numbers = true)]
    pub lab: Option<Vec<f64>>,

    /// Reference RGB color, converted to LAB before storing
    #[arg(long, num_args = 3, value_names = ["R", "G", "B"], allow_negative_numbers = true)]
    pub rgb: Option<Vec<i64>>,

    /// Largest Delta E still accepted
    #[arg(
        short,
        long,
        value_name = "T",
        required = true,
        help_heading = "REQUIRED OPTIONS"
    )]
    pub tolerance: f64,

    /// Overwrite an existing master sample of the same name
    #[arg(short, long, default_value_t = false, help_heading = "FLAGS")]
    pub force: bool,
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["frame", "camera_index", "camera_serial", "choose_camera"])
))]
pub struct CaptureArgs {
    /// Log to the master or the sample log (prompted when omitted)
    #[arg(long, value_enum, value_name = "MODE")]
    pub mode: Option<CaptureMode>,

    /// Sample id (prompted when omitted)
    #[arg(long, value_name = "ID")]
    pub id: Option<String>,

    /// Use a stored image instead of a camera
    #[arg(long, value_name = "PATH", help_heading = "SOURCE")]
    pub frame: Option<PathBuf>,

    /// Camera by V4L2 index
    #[arg(long, value_name = "N", help_heading = "SOURCE")]
    pub camera_index: Option<u32>,

    /// Camera by serial number
    #[arg(long, value_name = "SERIAL", help_heading = "SOURCE")]
    pub camera_serial: Option<String>,

    /// Pick the camera from a list
    #[arg(long, default_value_t = false, help_heading = "SOURCE")]
    pub choose_camera: bool,

    /// Average a centered square of this many pixels per side
    #[arg(
        long,
        value_name = "PIXELS",
        conflicts_with = "fraction",
        help_heading = "REGION OPTIONS"
    )]
    pub box_size: Option<u32>,

    /// Average the centered part of the frame covering this fraction of each side
    #[arg(long, value_name = "FRACTION", help_heading = "REGION OPTIONS")]
    pub fraction: Option<f32>,

    /// Frames discarded before capturing
    #[arg(
        long,
        value_name = "COUNT",
        default_value_t = DEFAULT_WARMUP_FRAMES,
        help_heading = "CAMERA OPTIONS"
    )]
    pub warmup: usize,

    /// Number of averaging threads
    #[arg(short, long, value_name = "COUNT", help_heading = "PERFORMANCE OPTIONS")]
    pub threads: Option<usize>,
}

#[derive(Args, Debug)]
pub struct CompareLatestArgs {
    /// Reference name recorded with the verdict
    #[arg(long, value_name = "NAME", help_heading = "REQUIRED OPTIONS")]
    pub reference: String,

    #[command(flatten)]
    pub comparison: ComparisonOptions,
}

#[derive(Args, Debug)]
pub struct CompareImagesArgs {
    /// Id of the stored sample frame
    #[arg(long, value_name = "ID", help_heading = "REQUIRED OPTIONS")]
    pub sample: String,

    /// Id of the stored master frame
    #[arg(long, value_name = "NAME", help_heading = "REQUIRED OPTIONS")]
    pub reference: String,

    #[command(flatten)]
    pub comparison: ComparisonOptions,
}

#[derive(Args, Debug)]
pub struct ComparisonOptions {
    /// Largest Delta E still accepted
    #[arg(
        short,
        long,
        value_name = "T",
        default_value_t = 1.0,
        help_heading = "MISC OPTIONS"
    )]
    pub tolerance: f64,

    /// Delta E formula
    #[arg(
        short,
        long,
        value_enum,
        value_name = "METHOD",
        default_value = "cie2000",
        help_heading = "MISC OPTIONS"
    )]
    pub method: DeltaEMethod,
}
