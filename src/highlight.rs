use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use serde_json::Value;

use crate::ui::Theme;

const JSON_KEY: Color = Color::Rgb(103, 232, 249);
const JSON_STRING: Color = Color::Rgb(125, 211, 252);
const JSON_NUMBER: Color = Color::Rgb(251, 146, 60);

/// Colours container log output. Lines holding a JSON object are pretty-printed
/// and highlighted; other lines are coloured by their log level keyword.
pub fn highlight_log_text(input: &str, theme: &Theme) -> Text<'static> {
    let mut lines = Vec::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('{')
            && let Ok(value) = serde_json::from_str::<Value>(trimmed)
        {
            let pretty =
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| trimmed.to_string());
            lines.extend(pretty.lines().map(|line| highlight_json_line(line, theme)));
            continue;
        }
        lines.push(highlight_plain_line(line, theme));
    }
    Text::from(lines)
}

fn highlight_plain_line(line: &str, theme: &Theme) -> Line<'static> {
    let color = match log_level(line) {
        Some(LogLevel::Error) => theme.error,
        Some(LogLevel::Warn) => theme.warn,
        Some(LogLevel::Info) => theme.text,
        Some(LogLevel::Debug) | None => theme.muted,
    };
    Line::from(Span::styled(line.to_string(), Style::default().fg(color)))
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

fn log_level(line: &str) -> Option<LogLevel> {
    let upper = line.to_ascii_uppercase();
    let has_word = |word: &str| {
        upper
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|token| token == word)
    };

    if has_word("ERROR") || has_word("FATAL") || has_word("PANIC") {
        Some(LogLevel::Error)
    } else if has_word("WARN") || has_word("WARNING") {
        Some(LogLevel::Warn)
    } else if has_word("INFO") {
        Some(LogLevel::Info)
    } else if has_word("DEBUG") || has_word("TRACE") {
        Some(LogLevel::Debug)
    } else {
        None
    }
}

fn highlight_json_line(line: &str, theme: &Theme) -> Line<'static> {
    let chars = line.chars().collect::<Vec<_>>();
    let mut index = 0usize;
    let mut spans = Vec::new();

    while index < chars.len() {
        let ch = chars[index];
        if ch.is_ascii_whitespace() {
            spans.push(Span::raw(ch.to_string()));
            index += 1;
            continue;
        }

        if matches!(ch, '{' | '}' | '[' | ']' | ':' | ',') {
            spans.push(Span::styled(ch.to_string(), Style::default().fg(theme.muted)));
            index += 1;
            continue;
        }

        if ch == '"' {
            let (token, next_index) = read_json_string(&chars, index);
            let mut look_ahead = next_index;
            while look_ahead < chars.len() && chars[look_ahead].is_ascii_whitespace() {
                look_ahead += 1;
            }
            let style = if look_ahead < chars.len() && chars[look_ahead] == ':' {
                Style::default().fg(JSON_KEY).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(JSON_STRING)
            };
            spans.push(Span::styled(token, style));
            index = next_index;
            continue;
        }

        if ch.is_ascii_digit() || ch == '-' {
            let start = index;
            while index < chars.len()
                && (chars[index].is_ascii_digit()
                    || matches!(chars[index], '-' | '+' | '.' | 'e' | 'E'))
            {
                index += 1;
            }
            spans.push(Span::styled(
                chars[start..index].iter().collect::<String>(),
                Style::default().fg(JSON_NUMBER),
            ));
            continue;
        }

        if ch.is_ascii_alphabetic() {
            let start = index;
            while index < chars.len() && chars[index].is_ascii_alphabetic() {
                index += 1;
            }
            spans.push(Span::styled(
                chars[start..index].iter().collect::<String>(),
                Style::default().fg(theme.warn),
            ));
            continue;
        }

        spans.push(Span::styled(ch.to_string(), Style::default().fg(theme.text)));
        index += 1;
    }

    Line::from(spans)
}

fn read_json_string(chars: &[char], start: usize) -> (String, usize) {
    let mut index = start;
    let mut escaped = false;
    let mut token = String::new();
    while index < chars.len() {
        let ch = chars[index];
        token.push(ch);
        if index > start {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                return (token, index + 1);
            }
        }
        index += 1;
    }
    (token, chars.len())
}
