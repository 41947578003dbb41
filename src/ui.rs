use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::App;

/// Colours used by every render call. Built once from config and passed down.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Theme {
    pub bg: Color,
    pub panel: Color,
    pub accent: Color,
    pub muted: Color,
    pub warn: Color,
    pub error: Color,
    pub highlight: Color,
    pub selection: Color,
    pub text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bg: Color::Rgb(9, 15, 25),
            panel: Color::Rgb(16, 27, 44),
            accent: Color::Rgb(52, 211, 153),
            muted: Color::Rgb(140, 156, 178),
            warn: Color::Rgb(251, 191, 36),
            error: Color::Rgb(248, 113, 113),
            highlight: Color::Rgb(147, 197, 253),
            selection: Color::Rgb(24, 36, 58),
            text: Color::White,
        }
    }
}

/// Parses `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub fn render(frame: &mut Frame, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    app.render_current(frame, root[1]);
    render_footer(frame, root[2], app);

    if app.show_help() {
        render_help_modal(frame, app);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let theme = app.theme();
    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " kdeck ", theme.bg, theme.accent, theme.panel);
    push_powerline_segment(
        &mut spans,
        format!(" ctx {} ", app.context_name()),
        theme.text,
        theme.panel,
        theme.bg,
    );
    spans.push(Span::raw(" "));
    spans.push(Span::styled(
        app.trail().join(" › "),
        Style::default().fg(theme.muted),
    ));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        app.current_title(),
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
    ));

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.bg)),
        area,
    );
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let theme = app.theme();
    let mut spans = Vec::new();
    if let Some(status) = app.status() {
        spans.push(Span::styled(
            format!("{status}  "),
            Style::default().fg(theme.error),
        ));
    }

    let mut hints = app.current_help();
    hints.push((app.keys().help.hint().to_string(), "help".to_string()));
    hints.push((app.keys().quit.hint().to_string(), "quit".to_string()));
    for (index, (key, description)) in hints.into_iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(" · ", Style::default().fg(theme.muted)));
        }
        spans.push(Span::styled(key, Style::default().fg(theme.accent)));
        spans.push(Span::styled(
            format!(" {description}"),
            Style::default().fg(theme.muted),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.bg)),
        area,
    );
}

fn render_help_modal(frame: &mut Frame, app: &App) {
    let theme = app.theme();
    let area = centered_rect(70, 60, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled(
            format!("kdeck help  screen:{}", app.current_title()),
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    let keys = app.keys();
    let mut entries = app.current_help();
    entries.push((keys.back.hint().to_string(), keys.back.description().to_string()));
    entries.push((keys.help.hint().to_string(), keys.help.description().to_string()));
    entries.push((keys.quit.hint().to_string(), "quit (ctrl+c always quits)".to_string()));
    let key_width = entries
        .iter()
        .map(|(key, _)| key.chars().count())
        .max()
        .unwrap_or(0);
    for (key, description) in entries {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{key:<key_width$}  "),
                Style::default().fg(theme.accent),
            ),
            Span::styled(description, Style::default().fg(theme.text)),
        ]));
    }

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent))
                .style(Style::default().bg(theme.panel)),
        );
    frame.render_widget(modal, area);
}

/// Panel used by screens while their first result is pending or after it failed.
pub fn render_notice(frame: &mut Frame, area: Rect, title: &str, message: &str, color: Color, theme: &Theme) {
    let panel = Paragraph::new(message.to_string())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .style(Style::default().bg(theme.panel)),
        )
        .style(Style::default().fg(color));
    frame.render_widget(panel, area);
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{centered_rect, parse_hex_color};
    use ratatui::layout::Rect;
    use ratatui::style::Color;

    #[test]
    fn hex_colors_parse_with_or_without_hash() {
        assert_eq!(parse_hex_color("#34d399"), Some(Color::Rgb(52, 211, 153)));
        assert_eq!(parse_hex_color("ffffff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 50, area);
        assert!(popup.x >= 20 && popup.right() <= 80);
        assert!(popup.y >= 10 && popup.bottom() <= 30);
    }
}
