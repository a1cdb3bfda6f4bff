use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Log levels accepted by `--log-level`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "rig")]
#[command(about = "Ray trace a jointed skeleton scene to an image")]
pub struct Args {
    /// JSON scene description
    pub scene: PathBuf,

    /// Output image; the format follows the extension
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Image width in pixels, overrides the scene file
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels, overrides the scene file
    #[arg(long)]
    pub height: Option<u32>,

    /// Worker threads for bucket rendering (defaults to one per core)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Render on the calling thread only
    #[arg(long)]
    pub serial: bool,

    /// Write the loaded skeleton back out as a script and exit
    #[arg(long, value_name = "PATH")]
    pub export_skeleton: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,
}
