/// Which helper panels are on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub show_preview: bool,
    pub show_wizard: bool,
    /// The user toggled the preview by hand; stop showing it automatically.
    pub preview_dismissed: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            show_preview: false,
            show_wizard: true,
            preview_dismissed: false,
        }
    }
}

impl ViewState {
    pub fn toggle_preview(&mut self) {
        self.show_preview = !self.show_preview;
        self.preview_dismissed = true;
    }

    /// First "more" pops the preview up so the user can still see
    /// themselves while the delayed view catches up.
    pub fn on_more(&mut self, ended: bool) {
        self.show_preview = (!self.preview_dismissed && !ended) || self.show_preview;
        self.show_wizard = false;
    }

    pub fn on_stop(&mut self) {
        self.show_preview = false;
        self.show_wizard = false;
    }

    pub fn dismiss_wizard(&mut self) {
        self.show_wizard = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn more_shows_preview_until_dismissed() {
        let mut view = ViewState::default();
        view.on_more(false);
        assert!(view.show_preview);
        assert!(!view.show_wizard);

        view.toggle_preview();
        assert!(!view.show_preview);
        view.on_more(false);
        assert!(!view.show_preview);
    }

    #[test]
    fn more_after_end_does_not_pop_preview() {
        let mut view = ViewState::default();
        view.on_more(true);
        assert!(!view.show_preview);
    }

    #[test]
    fn stop_hides_everything() {
        let mut view = ViewState::default();
        view.on_more(false);
        view.on_stop();
        assert_eq!(
            view,
            ViewState {
                show_preview: false,
                show_wizard: false,
                preview_dismissed: false,
            }
        );
    }
}
