use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &str, pad: usize, action: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key.to_string(), Style::default().fg(Color::Magenta)),
        Span::raw(format!("{:pad$}{action}", "")),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("Esc", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("    Quit"),
        ]),
        key_line("Tab", 14, "Next control"),
        key_line("Shift-Tab", 8, "Previous control"),
        key_line("Ctrl-Y", 11, "Copy the shown message"),
        key_line("F1", 15, "Toggle this help"),
        Line::from(""),
        Line::from("Prompt:"),
        key_line("Ctrl-Enter", 7, "Run the prompt"),
        key_line("Enter", 12, "New line"),
        Line::from(""),
        Line::from("Providers:"),
        key_line("↑/↓", 14, "Move"),
        key_line("Enter", 12, "Choose the highlighted provider"),
        Line::from(""),
        Line::from("Run button:"),
        key_line("Enter / Space", 4, "Run the prompt"),
        Line::from(""),
        Line::from(vec![
            Span::raw("Local models are listed under "),
            Span::styled("Ollama", Style::default().fg(Color::Cyan)),
            Span::raw(" once discovery finishes."),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
