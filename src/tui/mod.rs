mod help;
mod state;

use crate::backend::Backend;
use crate::catalog::{ProviderCatalog, LOADING_PLACEHOLDER_ID};
use crate::model::{Control, OutputState, ProviderOption, UiEvent};
use crate::orchestrator::{self, InvocationController, PresentationPort, Timings, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Terminal,
};
use state::UiState;
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Presentation port that forwards controller updates to the UI thread.
struct ChannelPort {
    tx: UnboundedSender<UiEvent>,
}

impl ChannelPort {
    fn send(&self, ev: UiEvent) {
        // The UI thread is gone only while quitting.
        let _ = self.tx.send(ev);
    }
}

impl PresentationPort for ChannelPort {
    fn render_output(&mut self, output: &OutputState) {
        self.send(UiEvent::Output(output.clone()));
    }

    fn set_busy(&mut self, busy: bool) {
        self.send(UiEvent::Busy(busy));
    }

    fn populate_group(&mut self, options: &[ProviderOption]) {
        self.send(UiEvent::DynamicGroup(options.to_vec()));
    }

    fn focus_control(&mut self, control: Control) {
        self.send(UiEvent::Focus(control));
    }

    fn clear_selection(&mut self) {
        self.send(UiEvent::SelectionCleared);
    }
}

pub async fn run(backend: Arc<dyn Backend>, timings: Timings) -> Result<()> {
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let catalog = ProviderCatalog::new();
    let ui_handle = std::thread::spawn(move || run_threaded(&catalog, ui_rx, cmd_tx));

    let controller = InvocationController::new(ChannelPort { tx: ui_tx }, timings);
    orchestrator::run_controller(backend, controller, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    Ok(())
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    catalog: &ProviderCatalog,
    mut event_rx: UnboundedReceiver<UiEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();
    // Ctrl+Enter is only distinguishable from Enter with the enhanced protocol.
    let enhanced_keys = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced_keys {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .ok();
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; the controller reaches it through events.
    let mut state = UiState::new(catalog);

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        let mut dirty = false;
        while let Ok(ev) = event_rx.try_recv() {
            state.apply(ev);
            dirty = true;
        }

        if dirty || last_tick.elapsed() >= tick_rate {
            if last_tick.elapsed() >= tick_rate {
                state.tick = state.tick.wrapping_add(1);
                last_tick = Instant::now();
            }
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if !handle_key(&mut state, k, &cmd_tx) {
                    let _ = cmd_tx.send(UiCommand::Quit);
                    break Ok(());
                }
            }
        }
    };

    if enhanced_keys {
        execute!(io::stdout(), PopKeyboardEnhancementFlags).ok();
    }
    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn is_run_chord(k: &KeyEvent) -> bool {
    let chord = k
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER);
    // Terminals without the enhanced protocol report Ctrl+Enter as Ctrl+J.
    (chord && k.code == KeyCode::Enter)
        || (k.modifiers == KeyModifiers::CONTROL && k.code == KeyCode::Char('j'))
}

/// Handle one key press. Returns false when the user asked to quit.
fn handle_key(state: &mut UiState, k: KeyEvent, cmd_tx: &UnboundedSender<UiCommand>) -> bool {
    match (k.modifiers, k.code) {
        (_, KeyCode::Esc) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => return false,
        (_, KeyCode::F(1)) => {
            state.tab = if state.tab == 0 { 1 } else { 0 };
        }
        (_, KeyCode::Tab) => state.focus = state.focus.next(),
        (_, KeyCode::BackTab) => state.focus = state.focus.prev(),
        (KeyModifiers::CONTROL, KeyCode::Char('y')) => copy_output(state),
        _ if state.tab != 0 => {}
        _ if state.focus == Control::Prompt && is_run_chord(&k) => {
            let _ = cmd_tx.send(UiCommand::Run(state.prompt.clone()));
        }
        _ => match state.focus {
            Control::Prompt => edit_prompt(state, k),
            Control::Provider => match k.code {
                KeyCode::Up | KeyCode::Char('k') => state.move_highlight(-1),
                KeyCode::Down | KeyCode::Char('j') => state.move_highlight(1),
                KeyCode::PageUp => state.move_highlight(-10),
                KeyCode::PageDown => state.move_highlight(10),
                KeyCode::Home => state.highlighted = 0,
                KeyCode::End => state.move_highlight(isize::MAX / 2),
                KeyCode::Enter | KeyCode::Char(' ') => {
                    // Disabled placeholders cannot be chosen. The loading entry still goes
                    // through so the controller resets the selector.
                    let choice = state
                        .highlighted_option()
                        .filter(|o| o.selectable || o.id == LOADING_PLACEHOLDER_ID)
                        .map(|o| o.id.clone());
                    if let Some(value) = choice {
                        state.selected = Some(value.clone());
                        let _ = cmd_tx.send(UiCommand::Select(value));
                    }
                }
                _ => {}
            },
            Control::Run => {
                // A disabled run control ignores activation.
                if matches!(k.code, KeyCode::Enter | KeyCode::Char(' ')) && !state.busy {
                    let _ = cmd_tx.send(UiCommand::Run(state.prompt.clone()));
                }
            }
        },
    }
    true
}

fn edit_prompt(state: &mut UiState, k: KeyEvent) {
    match k.code {
        KeyCode::Char(c) if !k.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            state.prompt.push(c);
        }
        KeyCode::Enter => state.prompt.push('\n'),
        KeyCode::Backspace => {
            state.prompt.pop();
        }
        _ => {}
    }
}

fn copy_output(state: &mut UiState) {
    if !state.output.is_message() {
        state.info = "Nothing to copy yet.".into();
        return;
    }
    match copy_to_clipboard(state.output.text()) {
        Ok(()) => state.info = "✓ Copied message to clipboard".into(),
        Err(e) => state.info = format!("Clipboard copy failed: {e:#}"),
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Shell"), Line::from("Help")])
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title("odk-shell"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_shell(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }

    let footer = if state.info.is_empty() {
        "Tab: switch control  Ctrl-Enter: run  F1: help  Esc: quit"
    } else {
        state.info.as_str()
    };
    f.render_widget(
        Paragraph::new(footer).style(Style::default().fg(Color::Gray)),
        chunks[2],
    );
}

fn focus_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
}

fn draw_shell(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(0)].as_ref())
        .split(area);
    draw_providers(cols[0], f, state);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(7),
                Constraint::Length(3),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(cols[1]);
    draw_prompt(rows[0], f, state);
    draw_run_button(rows[1], f, state);
    draw_output(rows[2], f, state);
}

/// Selector rows with section headings; returns the row of the highlighted option.
fn provider_lines(state: &UiState) -> (Vec<Line<'static>>, usize) {
    let mut lines = Vec::new();
    let mut highlighted_row = 0;
    let mut section: Option<&str> = None;
    for (idx, option) in state.options().enumerate() {
        if section != Some(option.section.as_str()) {
            lines.push(Line::from(Span::styled(
                option.section.clone(),
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::BOLD),
            )));
            section = Some(option.section.as_str());
        }

        let chosen =
            !option.id.is_empty() && state.selected.as_deref() == Some(option.id.as_str());
        let marker = if chosen { "● " } else { "  " };
        let mut style = if option.selectable {
            Style::default()
        } else {
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC)
        };
        if chosen {
            style = style.fg(Color::Green);
        }
        if idx == state.highlighted && state.focus == Control::Provider {
            style = style.add_modifier(Modifier::REVERSED);
        }
        if idx == state.highlighted {
            highlighted_row = lines.len();
        }
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(option.display_name.clone(), style),
        ]));
    }
    (lines, highlighted_row)
}

fn draw_providers(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let (lines, highlighted_row) = provider_lines(state);
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = highlighted_row.saturating_sub(visible.saturating_sub(1));
    let p = Paragraph::new(lines)
        .scroll((scroll.min(u16::MAX as usize) as u16, 0))
        .block(focus_block("Provider", state.focus == Control::Provider));
    f.render_widget(p, area);
}

fn draw_prompt(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let focused = state.focus == Control::Prompt;
    let mut text = state.prompt.clone();
    if focused {
        text.push('▏');
    }
    let inner_width = area.width.saturating_sub(2);
    let lines = state::wrap_text(&text, inner_width);
    let scroll = state::scroll_to_bottom(lines.len(), area.height.saturating_sub(2));
    let p = Paragraph::new(lines.into_iter().map(Line::from).collect::<Vec<_>>())
        .scroll((scroll, 0))
        .block(focus_block("Prompt (Ctrl-Enter to run)", focused));
    f.render_widget(p, area);
}

fn draw_run_button(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let style = if state.busy {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::SLOW_BLINK)
    } else if state.focus == Control::Run {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let p = Paragraph::new(Line::from(Span::styled(format!(" {} ", state.run_label()), style)))
        .alignment(Alignment::Center)
        .block(focus_block("", state.focus == Control::Run));
    f.render_widget(p, area);
}

fn draw_output(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let style = state::severity_style(&state.output);
    let inner_width = area.width.saturating_sub(2);
    let lines = state::wrap_text(state.output.text(), inner_width);
    let scroll = state::scroll_to_bottom(lines.len(), area.height.saturating_sub(2));
    let p = Paragraph::new(
        lines
            .into_iter()
            .map(|l| Line::from(Span::styled(l, style)))
            .collect::<Vec<_>>(),
    )
    .scroll((scroll, 0))
    .block(Block::default().borders(Borders::ALL).title("Output"));
    f.render_widget(p, area);
}

// Global clipboard manager channel - initialized once on first use
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;

static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Initialize the clipboard manager thread if not already initialized.
/// Each copy keeps its clipboard instance alive for a while so clipboard
/// managers on Linux can read the contents.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Queue `text` for the clipboard thread without blocking the UI.
fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::discovery::dynamic_options;

    fn key(modifiers: KeyModifiers, code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn setup() -> (UiState, UnboundedSender<UiCommand>, UnboundedReceiver<UiCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (UiState::new(&ProviderCatalog::new()), tx, rx)
    }

    fn type_text(state: &mut UiState, tx: &UnboundedSender<UiCommand>, text: &str) {
        for c in text.chars() {
            handle_key(state, key(KeyModifiers::NONE, KeyCode::Char(c)), tx);
        }
    }

    #[test]
    fn ctrl_enter_in_prompt_sends_run() {
        let (mut state, tx, mut rx) = setup();
        type_text(&mut state, &tx, "Hello");
        handle_key(&mut state, key(KeyModifiers::NONE, KeyCode::Enter), &tx);
        assert_eq!(state.prompt, "Hello\n");
        assert!(rx.try_recv().is_err());

        handle_key(&mut state, key(KeyModifiers::CONTROL, KeyCode::Enter), &tx);
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Run(p)) if p == "Hello\n"));
    }

    #[test]
    fn shortcut_is_not_blocked_by_busy_state() {
        let (mut state, tx, mut rx) = setup();
        state.busy = true;
        handle_key(&mut state, key(KeyModifiers::CONTROL, KeyCode::Char('j')), &tx);
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Run(_))));
    }

    #[test]
    fn busy_run_button_ignores_activation() {
        let (mut state, tx, mut rx) = setup();
        state.focus = Control::Run;
        state.busy = true;
        handle_key(&mut state, key(KeyModifiers::NONE, KeyCode::Enter), &tx);
        assert!(rx.try_recv().is_err());

        state.busy = false;
        handle_key(&mut state, key(KeyModifiers::NONE, KeyCode::Char(' ')), &tx);
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Run(_))));
    }

    #[test]
    fn enter_on_provider_sends_selection() {
        let (mut state, tx, mut rx) = setup();
        state.focus = Control::Provider;
        handle_key(&mut state, key(KeyModifiers::NONE, KeyCode::Down), &tx);
        handle_key(&mut state, key(KeyModifiers::NONE, KeyCode::Enter), &tx);
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Select(id)) if id == "openai-gpt4-turbo"));
        assert_eq!(state.selected.as_deref(), Some("openai-gpt4-turbo"));
    }

    #[test]
    fn loading_entry_is_sent_as_is() {
        let (mut state, tx, mut rx) = setup();
        state.focus = Control::Provider;
        handle_key(&mut state, key(KeyModifiers::NONE, KeyCode::End), &tx);
        handle_key(&mut state, key(KeyModifiers::NONE, KeyCode::Enter), &tx);
        assert!(
            matches!(rx.try_recv(), Ok(UiCommand::Select(id)) if id == LOADING_PLACEHOLDER_ID)
        );
    }

    #[test]
    fn disabled_placeholder_keeps_current_choice() {
        let (mut state, tx, mut rx) = setup();
        state.focus = Control::Provider;
        handle_key(&mut state, key(KeyModifiers::NONE, KeyCode::Enter), &tx);
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Select(id)) if id == "openai-gpt4"));

        for found in [Ok(vec![]), Err(BackendError::Unavailable("ollama".into()))] {
            state.apply(UiEvent::DynamicGroup(dynamic_options(found)));
            handle_key(&mut state, key(KeyModifiers::NONE, KeyCode::End), &tx);
            handle_key(&mut state, key(KeyModifiers::NONE, KeyCode::Enter), &tx);
            handle_key(&mut state, key(KeyModifiers::NONE, KeyCode::Char(' ')), &tx);
            assert!(rx.try_recv().is_err());
            assert_eq!(state.selected.as_deref(), Some("openai-gpt4"));
        }
    }

    #[test]
    fn escape_quits() {
        let (mut state, tx, _rx) = setup();
        assert!(!handle_key(&mut state, key(KeyModifiers::NONE, KeyCode::Esc), &tx));
        assert!(handle_key(&mut state, key(KeyModifiers::NONE, KeyCode::Tab), &tx));
        assert_eq!(state.focus, Control::Provider);
    }

    #[test]
    fn provider_rows_include_section_headings() {
        let (state, _tx, _rx) = setup();
        let (lines, row) = provider_lines(&state);
        // 5 headings + 13 static options + loading entry.
        assert_eq!(lines.len(), 19);
        assert_eq!(row, 1);
    }
}
