use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use tracing::warn;

use crate::session::Session;
use crate::tui::ui;

pub struct App {
    pub session: Session,
    pub should_quit: bool,
    /// Whether the help overlay is shown.
    pub show_help: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            should_quit: false,
            show_help: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| ui::draw(frame, self))?;

            // Poll at ~30 FPS; the session's timers run off this loop
            if event::poll(Duration::from_millis(33))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key.code, key.modifiers);
                    }
                    Event::FocusGained => self.session.foregrounded(),
                    _ => {}
                }
            }
            self.session.tick();
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => {
                self.session.more();
            }
            KeyCode::Left | KeyCode::Char('-') => {
                self.session.less();
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.session.stop_record();
            }
            KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::End => {
                self.session.go_to_end();
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                self.session.toggle_preview();
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.session.foregrounded();
            }
            KeyCode::Enter => {
                self.session.dismiss_wizard();
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if self.session.is_ended() || self.session.status().is_error() {
                    if let Err(err) = self.session.init() {
                        warn!(error = %err, "restart failed");
                    }
                }
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                self.show_help = !self.show_help;
            }
            _ => {}
        }
    }
}
