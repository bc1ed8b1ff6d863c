//! Logger setup
//!
//! Lines look like `2026-10-19 14:03:12 | INFO  | message`. The level
//! defaults to `info` and `RUST_LOG` overrides it.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;

/// Writes every log line to the file and, unless silenced, to stderr
struct TeeWriter {
    file: File,
    console: bool,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.console {
            io::stderr().write_all(buf)?;
        }
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Install the global logger
///
/// # Arguments
/// * `log_file` - Optional file receiving a copy of every log line
/// * `silent` - Suppress logging to stderr
pub fn init_logging(log_file: Option<&Path>, silent: bool) -> Result<()> {
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Info).parse_default_env();
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} | {:<5} | {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.args()
        )
    });

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            builder.target(Target::Pipe(Box::new(TeeWriter {
                file,
                console: !silent,
            })));
        }
        None if silent => {
            builder.filter_level(LevelFilter::Off);
        }
        None => {
            builder.target(Target::Stderr);
        }
    }

    builder.try_init().context("Failed to initialize logger")?;
    Ok(())
}
