use crate::catalog::ProviderCatalog;
use crate::model::{Control, OutputState, ProviderOption, Severity, UiEvent};
use ratatui::style::{Color, Modifier, Style};
use unicode_width::UnicodeWidthChar;

pub const RUN_LABEL: &str = "Run";
pub const RUNNING_LABEL: &str = "Running...";
const SPINNER: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub struct UiState {
    pub tab: usize,
    pub focus: Control,
    pub prompt: String,
    pub static_options: Vec<ProviderOption>,
    pub dynamic_options: Vec<ProviderOption>,
    /// Index into `options()` of the row under the cursor.
    pub highlighted: usize,
    /// Value the selector shows as chosen.
    pub selected: Option<String>,
    pub busy: bool,
    pub output: OutputState,
    /// Footer status text (clipboard feedback and similar).
    pub info: String,
    pub tick: usize,
}

impl UiState {
    pub fn new(catalog: &ProviderCatalog) -> Self {
        Self {
            tab: 0,
            focus: Control::Prompt,
            prompt: String::new(),
            static_options: catalog.static_options().to_vec(),
            dynamic_options: catalog.dynamic_options().to_vec(),
            highlighted: 0,
            selected: None,
            busy: false,
            output: OutputState::Placeholder,
            info: String::new(),
            tick: 0,
        }
    }

    pub fn options(&self) -> impl Iterator<Item = &ProviderOption> {
        self.static_options.iter().chain(self.dynamic_options.iter())
    }

    pub fn option_count(&self) -> usize {
        self.static_options.len() + self.dynamic_options.len()
    }

    pub fn highlighted_option(&self) -> Option<&ProviderOption> {
        self.options().nth(self.highlighted)
    }

    pub fn move_highlight(&mut self, delta: isize) {
        let max = self.option_count().saturating_sub(1) as isize;
        self.highlighted = (self.highlighted as isize + delta).clamp(0, max) as usize;
    }

    /// Apply an update pushed by the controller.
    pub fn apply(&mut self, ev: UiEvent) {
        match ev {
            UiEvent::Output(output) => self.output = output,
            UiEvent::Busy(busy) => self.busy = busy,
            UiEvent::DynamicGroup(options) => {
                self.dynamic_options = options;
                self.move_highlight(0);
            }
            UiEvent::Focus(control) => {
                self.tab = 0;
                self.focus = control;
            }
            UiEvent::SelectionCleared => self.selected = None,
        }
    }

    /// Label of the run control, with a spinner frame while running.
    pub fn run_label(&self) -> String {
        if self.busy {
            format!("{} {RUNNING_LABEL}", SPINNER[self.tick % SPINNER.len()])
        } else {
            RUN_LABEL.to_string()
        }
    }
}

pub fn severity_style(output: &OutputState) -> Style {
    match output {
        OutputState::Placeholder => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
        OutputState::Message { severity, .. } => match severity {
            Severity::Info => Style::default().fg(Color::Cyan),
            Severity::Success => Style::default().fg(Color::Green),
            Severity::Error => Style::default().fg(Color::Red),
            Severity::Normal => Style::default(),
        },
    }
}

/// Hard-wrap `text` to `width` terminal columns, keeping explicit line breaks.
/// Wide glyphs (emoji, CJK) count as two columns.
pub fn wrap_text(text: &str, width: u16) -> Vec<String> {
    let width = width.max(1) as usize;
    let mut out = Vec::new();
    for line in text.split('\n') {
        let mut current = String::new();
        let mut used = 0;
        for c in line.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > width && !current.is_empty() {
                out.push(std::mem::take(&mut current));
                used = 0;
            }
            current.push(c);
            used += w;
        }
        out.push(current);
    }
    out
}

/// First line to show so the end of `line_count` lines fits in `height` rows.
pub fn scroll_to_bottom(line_count: usize, height: u16) -> u16 {
    line_count.saturating_sub(height as usize).min(u16::MAX as usize) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::dynamic_options;

    fn state() -> UiState {
        UiState::new(&ProviderCatalog::new())
    }

    #[test]
    fn starts_idle_with_loading_entry_last() {
        let s = state();
        assert_eq!(s.focus, Control::Prompt);
        assert_eq!(s.run_label(), RUN_LABEL);
        assert_eq!(
            s.options().last().map(|o| o.id.as_str()),
            Some(crate::catalog::LOADING_PLACEHOLDER_ID)
        );
    }

    #[test]
    fn highlight_is_clamped_to_options() {
        let mut s = state();
        s.move_highlight(-3);
        assert_eq!(s.highlighted, 0);
        s.move_highlight(1000);
        assert_eq!(s.highlighted, s.option_count() - 1);
    }

    #[test]
    fn shrinking_dynamic_group_pulls_highlight_back() {
        let mut s = state();
        s.apply(UiEvent::DynamicGroup(dynamic_options(Ok(vec![
            "a".into(),
            "b".into(),
            "c".into(),
        ]))));
        s.move_highlight(1000);
        s.apply(UiEvent::DynamicGroup(dynamic_options(Ok(vec![]))));
        assert_eq!(s.highlighted, s.option_count() - 1);
        assert_eq!(
            s.highlighted_option().map(|o| o.selectable),
            Some(false)
        );
    }

    #[test]
    fn controller_events_update_controls() {
        let mut s = state();
        s.selected = Some("loading-ollama".into());
        s.tab = 1;
        s.apply(UiEvent::SelectionCleared);
        s.apply(UiEvent::Focus(Control::Provider));
        s.apply(UiEvent::Busy(true));
        assert_eq!(s.selected, None);
        assert_eq!(s.tab, 0);
        assert_eq!(s.focus, Control::Provider);
        assert!(s.run_label().ends_with(RUNNING_LABEL));

        s.apply(UiEvent::Busy(false));
        assert_eq!(s.run_label(), RUN_LABEL);
    }

    #[test]
    fn wrap_splits_long_lines_and_keeps_blank_ones() {
        assert_eq!(wrap_text("abcdef\n\ngh", 4), vec!["abcd", "ef", "", "gh"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn wrap_counts_wide_glyphs_as_two_columns() {
        assert_eq!(wrap_text("日本語です", 4), vec!["日本", "語で", "す"]);
        assert_eq!(wrap_text("✅ ok", 3), vec!["✅ ", "ok"]);
        assert_eq!(wrap_text("✅ ok", 4), vec!["✅ ok"]);
    }

    #[test]
    fn scroll_shows_latest_lines() {
        assert_eq!(scroll_to_bottom(3, 10), 0);
        assert_eq!(scroll_to_bottom(25, 10), 15);
    }
}
