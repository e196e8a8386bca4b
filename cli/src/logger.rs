use std::io::Write;

use crate::style;
use aeye::error::{Error, Result};
use env_logger::{Builder, Env, Target};
use log::{Level, LevelFilter};

/// Installs the themed logger. `-v` raises the level to debug, `-vv` to
/// trace; otherwise `RUST_LOG` applies, falling back to info.
pub fn init(verbosity: u8) -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    match verbosity {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }

    builder.target(Target::Stdout).format(|buf, record| {
        let level = record.level();
        let s = style::theme();

        let (level_text, style_ref) = match level {
            Level::Error => ("ERROR ", &s.error),
            Level::Warn => ("WARN  ", &s.warning),
            Level::Info => ("", &s.info),
            Level::Debug => ("DEBUG ", &s.highlight),
            Level::Trace => ("TRACE ", &s.subtle),
        };

        write!(buf, "{}", style_ref.apply_to(level_text))?;

        if level != Level::Info {
            write!(buf, "[{}] ", record.target())?;
        }

        writeln!(buf, "{}", record.args())
    });

    builder
        .try_init()
        .map_err(|e| Error::LoggerError(format!("Failed to initialize env_logger: {}", e)))
}
