mod clock;
mod config;
mod media;
mod playback;
mod session;
mod tui;

use std::fs::File;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{DisableFocusChange, EnableFocusChange};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::clock::{Clock, SystemClock};
use crate::config::CliArgs;
use crate::media::buffer::MediaBuffer;
use crate::media::surface::VirtualSurface;
use crate::media::synthetic::SyntheticCamera;
use crate::playback::executor::Surfaces;
use crate::session::Session;
use crate::tui::app::App;

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(&args)?;
    let settings = args.session_settings()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut camera = SyntheticCamera::new(clock.clone());
    if args.deny_permission {
        camera = camera.denying_permission();
    }
    let surfaces = Surfaces {
        live: Box::new(VirtualSurface::live(clock.clone())),
        delayed: Box::new(VirtualSurface::buffered(clock.clone())),
        preview: Box::new(VirtualSurface::live(clock.clone())),
    };
    let mut session = Session::new(
        settings,
        clock,
        Box::new(camera),
        Box::new(MediaBuffer::new()),
        surfaces,
    );

    // A failed start is shown on screen; the user can retry from there.
    if let Err(err) = session.init() {
        warn!(error = %err, "camera unavailable");
    }

    // Set up panic hook to restore terminal
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::execute!(std::io::stdout(), DisableFocusChange);
        ratatui::restore();
        default_hook(info);
    }));

    let mut terminal = ratatui::init();
    crossterm::execute!(std::io::stdout(), EnableFocusChange)?;

    let mut app = App::new(session);
    let result = app.run(&mut terminal);

    crossterm::execute!(std::io::stdout(), DisableFocusChange)?;
    ratatui::restore();

    result
}

/// Logs go to `--log-file` when given; otherwise nothing is installed so
/// the UI keeps the terminal to itself.
fn init_logging(args: &CliArgs) -> Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
