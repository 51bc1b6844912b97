use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;

use crate::media::capture::{CaptureConstraints, Quality};
use crate::session::SessionSettings;

#[derive(Parser, Debug)]
#[command(name = "mirrorshift", version, about = "TUI time-shifted mirror")]
pub struct CliArgs {
    /// Camera to record from ("user" or "environment")
    #[arg(short, long, default_value = "user")]
    pub camera: String,

    /// Recording quality
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = Quality::High)]
    pub quality: Quality,

    /// Delay change per keypress, in seconds
    #[arg(short, long, default_value_t = 5)]
    pub step_seconds: u32,

    /// How often the recorder flushes a chunk, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub chunk_interval_ms: u64,

    /// Behave as if camera access was refused
    #[arg(long)]
    pub deny_permission: bool,

    /// Write logs to this file (the terminal is taken by the UI)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    pub fn session_settings(&self) -> Result<SessionSettings> {
        if self.step_seconds == 0 {
            bail!("step must be at least one second");
        }
        if self.chunk_interval_ms == 0 {
            bail!("chunk interval must be positive");
        }
        Ok(SessionSettings {
            step_ms: i64::from(self.step_seconds) * 1000,
            chunk_interval: Duration::from_millis(self.chunk_interval_ms),
            constraints: CaptureConstraints {
                camera: self.camera.clone(),
                quality: self.quality,
            },
        })
    }
}
