use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};

use crate::playback::state::{Mode, Status};
use crate::tui::app::App;
use crate::tui::seek_bar::SeekBar;

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.session.status().is_error() {
        draw_error(frame, area, app.session.status());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status
            Constraint::Length(4), // Seek bar
            Constraint::Length(4), // Screen
            Constraint::Length(3), // Recording info
            Constraint::Length(3), // Keys
            Constraint::Min(0),    // Spacer
        ])
        .split(area);

    draw_status(frame, chunks[0], app);
    draw_seek_bar(frame, chunks[1], app);
    draw_screen(frame, chunks[2], app);
    draw_recording_info(frame, chunks[3], app);
    draw_keys(frame, chunks[4]);

    if app.show_help {
        draw_help_overlay(frame, area, app.session.step_seconds());
    } else if app.session.show_wizard() && app.session.is_running() {
        draw_wizard(frame, area, app.session.step_seconds());
    }
}

fn mode_style(mode: Mode) -> Style {
    let color = match mode {
        Mode::Live => Color::Green,
        Mode::Delayed => Color::Cyan,
        Mode::WaitingBeforeStart => Color::Yellow,
        Mode::Ended => Color::Gray,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let mode = session.mode();

    let delay = if session.is_live() {
        format!("{:>7}", "live")
    } else if session.is_waiting() {
        format!("{:>6}s", format!("-{}", session.wait_periods_remaining()))
    } else {
        format!("{:>6.1}s", session.displayed_delay_seconds())
    };

    let line = Line::from(vec![
        Span::raw("  State: "),
        Span::styled(format!("{} {}", mode.symbol(), mode.label()), mode_style(mode)),
        Span::raw(format!(
            "{:width$}Delay: {delay}",
            "",
            width = 10usize.saturating_sub(mode.label().len())
        )),
        Span::raw(format!("   Target: {:>5.0}s", session.target_delay_seconds())),
        Span::raw(format!("   Recorded: {:>6.1}s", session.total_time_s())),
    ]);

    let block = Block::default().borders(Borders::ALL).title(" Mirror ");
    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}

fn draw_seek_bar(frame: &mut Frame, area: Rect, app: &App) {
    let bar = SeekBar::from_session(&app.session);

    let color = if bar.is_ended {
        Color::Gray
    } else {
        Color::Blue
    };
    let label = if bar.is_ended {
        format!("{:.1}s / {:.1}s", bar.current_time_s, bar.total_time_s)
    } else {
        format!("-{:.1}s  (window {:.0}s)", bar.time_to_end_s(), bar.width_s())
    };

    let block = Block::default().borders(Borders::ALL).title(" Timeline ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color).bg(Color::DarkGray))
        .ratio(bar.knob_ratio())
        .label(label);
    frame.render_widget(gauge, rows[0]);

    let recorded = Gauge::default()
        .gauge_style(Style::default().fg(Color::DarkGray).bg(Color::Black))
        .ratio(bar.buffer_ratio())
        .label(format!("recorded {:.1}s", bar.total_time_s));
    frame.render_widget(recorded, rows[1]);
}

fn draw_screen(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let headline = match session.mode() {
        Mode::Live => Line::from(Span::styled("  Showing the live camera", bold)),
        Mode::Delayed => Line::from(vec![
            Span::styled("  Showing the recording ", bold),
            Span::raw(format!("at {:.1}s", session.current_time_s())),
        ]),
        Mode::WaitingBeforeStart => Line::from(vec![
            Span::styled("  Starting in ", bold),
            Span::styled(
                format!("{}s", session.wait_periods_remaining()),
                mode_style(Mode::WaitingBeforeStart),
            ),
            Span::raw(" ... waiting for the recording to catch up"),
        ]),
        Mode::Ended if session.is_stopped() => {
            Line::from(Span::styled("  Playback finished. R to record again", bold))
        }
        Mode::Ended => Line::from(vec![
            Span::styled("  Recording stopped ", bold),
            Span::raw(format!("- replaying at {:.1}s", session.current_time_s())),
        ]),
    };

    let preview = if session.show_preview() {
        Line::from("  Preview: on (live camera in the corner)")
    } else {
        Line::from("  Preview: off")
    };

    let block = Block::default().borders(Borders::ALL).title(" Screen ");
    let paragraph = Paragraph::new(vec![headline, preview]).block(block);
    frame.render_widget(paragraph, area);
}

fn draw_recording_info(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let line = if session.is_initialized() {
        Line::from(format!(
            "  Format: {}    Session: {:.0}s",
            session.format().unwrap_or("-"),
            session.elapsed().as_secs_f64(),
        ))
    } else {
        Line::from("  Starting camera...")
    };

    let block = Block::default().borders(Borders::ALL).title(" Recording ");
    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}

fn draw_keys(frame: &mut Frame, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let line = Line::from(vec![
        Span::raw("  "),
        Span::styled("\u{2192}", bold),
        Span::raw(":more  "),
        Span::styled("\u{2190}", bold),
        Span::raw(":less  "),
        Span::styled("S", bold),
        Span::raw(":stop  "),
        Span::styled("P", bold),
        Span::raw(":preview  "),
        Span::styled("H", bold),
        Span::raw(":help  "),
        Span::styled("Q", bold),
        Span::raw(":quit"),
    ]);

    let block = Block::default().borders(Borders::ALL).title(" Keys ");
    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn draw_wizard(frame: &mut Frame, area: Rect, step_s: f64) {
    let lines = vec![
        Line::from(""),
        Line::from(format!(
            "  Press \u{2192} to watch yourself {step_s:.0} seconds ago."
        )),
        Line::from("  Press it again to go further back, \u{2190} to come closer."),
        Line::from("  Press S when you are done to replay the whole recording."),
        Line::from(""),
        Line::from("  Enter to dismiss"),
    ];

    let popup = centered(area, 66, lines.len() as u16 + 2);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Getting started ")
        .border_style(Style::default().fg(Color::Green));
    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, popup);
}

fn draw_error(frame: &mut Frame, area: Rect, status: Status) {
    let message = match status {
        Status::PermissionDenied => {
            "Camera access was denied. Allow access to the camera and press R to try again."
        }
        Status::NotFound => "No camera was found. Connect one and press R to try again.",
        Status::Unsupported => "The camera cannot record in a supported format.",
        Status::UnknownError => "Something went wrong starting the camera. Press R to try again.",
        Status::Ok => "",
    };

    let popup = centered(area, 60, 6);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Camera error ")
        .border_style(Style::default().fg(Color::Red));
    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(format!("  {message}")),
        Line::from(""),
        Line::from("  Q to quit"),
    ])
    .wrap(Wrap { trim: false })
    .block(block);
    frame.render_widget(paragraph, popup);
}

fn draw_help_overlay(frame: &mut Frame, area: Rect, step_s: f64) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  \u{2192} / +       ", bold),
            Span::raw(format!("{step_s:.0}s more delay")),
        ]),
        Line::from(vec![
            Span::styled("  \u{2190} / -       ", bold),
            Span::raw(format!("{step_s:.0}s less delay (back to live at zero)")),
        ]),
        Line::from(vec![
            Span::styled("  S           ", bold),
            Span::raw("Stop recording and replay"),
        ]),
        Line::from(vec![
            Span::styled("  E / End     ", bold),
            Span::raw("Jump to the end of a stopped recording"),
        ]),
        Line::from(vec![
            Span::styled("  P           ", bold),
            Span::raw("Toggle the live preview"),
        ]),
        Line::from(vec![
            Span::styled("  F           ", bold),
            Span::raw("Resync the delay with the clock"),
        ]),
        Line::from(vec![
            Span::styled("  R           ", bold),
            Span::raw("Record again (after stop or error)"),
        ]),
        Line::from(vec![
            Span::styled("  H           ", bold),
            Span::raw("Toggle this help"),
        ]),
        Line::from(vec![
            Span::styled("  Q           ", bold),
            Span::raw("Quit"),
        ]),
        Line::from(""),
    ];

    let popup = centered(area, 64, lines.len() as u16 + 2);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .border_style(Style::default().fg(Color::Cyan));
    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, popup);
}
