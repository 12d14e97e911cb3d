//! Source pane rendering with syntax highlighting
//!
//! Shows the unit exactly as written, directives included. Lines carrying a
//! diagnostic get a marker in the gutter; the selected diagnostic's line is
//! drawn on a red background.
//!
//! # Rendering
//!
//! Highlighting is a per-line character scan using the lexer's keyword table.
//! It does not run the lexer, so a line is coloured the same before and after
//! substitution.

use super::{clamp_scroll, pane_block, visible_height};
use crate::parser::lexer::keyword;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Syntax highlighting for a single klang line
fn highlight_source_code(line: &str) -> Line<'_> {
    if line.split_whitespace().next() == Some("replace") {
        return Line::from(Span::styled(
            line,
            Style::default().fg(DEFAULT_THEME.directive),
        ));
    }

    let mut spans = Vec::new();
    let mut current_word = String::new();

    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Handle comments
        if c == '/' && chars.get(i + 1) == Some(&'/') {
            flush_word(&mut spans, &mut current_word, false);
            spans.push(Span::styled(
                chars[i..].iter().collect::<String>(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            break;
        }

        // Handle strings
        if c == '"' {
            flush_word(&mut spans, &mut current_word, false);
            let mut end = i + 1;
            while end < chars.len() && chars[end] != '"' {
                end += if chars[end] == '\\' { 2 } else { 1 };
            }
            let end = (end + 1).min(chars.len());
            spans.push(Span::styled(
                chars[i..end].iter().collect::<String>(),
                Style::default().fg(DEFAULT_THEME.string),
            ));
            i = end;
            continue;
        }

        // Handle delimiters and operators
        if !c.is_alphanumeric() && c != '_' {
            flush_word(&mut spans, &mut current_word, c == '(');

            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.accent),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }

    flush_word(&mut spans, &mut current_word, false);
    Line::from(spans)
}

fn flush_word(spans: &mut Vec<Span<'_>>, word: &mut String, is_call: bool) {
    if word.is_empty() {
        return;
    }
    let style = word_style(word, is_call);
    spans.push(Span::styled(std::mem::take(word), style));
}

fn word_style(word: &str, is_call: bool) -> Style {
    if keyword(word).is_some() {
        return Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD);
    }
    if word.starts_with(|c: char| c.is_ascii_digit()) {
        return Style::default().fg(DEFAULT_THEME.number);
    }
    if is_call {
        Style::default().fg(DEFAULT_THEME.name)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    }
}

/// Scroll state for the source pane
#[derive(Debug, Default)]
pub struct SourceScrollState {
    pub offset: usize,
    /// Line to bring to the middle of the pane on the next draw
    pub reveal_line: Option<usize>,
}

/// Render the source pane.
///
/// `diagnostic_lines` are 1-based line numbers with at least one error;
/// `selected_line` is the line of the diagnostic currently selected.
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source_code: &str,
    diagnostic_lines: &[usize],
    selected_line: Option<usize>,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let block = pane_block(" Source ", is_focused);

    let lines: Vec<&str> = source_code.lines().collect();
    let visible = visible_height(area);

    if let Some(line) = scroll_state.reveal_line.take() {
        scroll_state.offset = line.saturating_sub(1).saturating_sub(visible / 2);
    }
    clamp_scroll(&mut scroll_state.offset, lines.len(), visible);

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let has_error = diagnostic_lines.contains(&line_num);
            let is_selected = selected_line == Some(line_num);

            let (marker, num_style) = if has_error {
                (
                    "●",
                    Style::default()
                        .fg(DEFAULT_THEME.error)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                (" ", Style::default().fg(DEFAULT_THEME.comment))
            };

            let mut content_line = highlight_source_code(line);
            if is_selected {
                let error_style = Style::default()
                    .bg(DEFAULT_THEME.error)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD);
                for span in &mut content_line.spans {
                    span.style = error_style;
                }
            }

            let mut final_spans = vec![Span::styled(format!("{}{:4} ", marker, line_num), num_style)];
            final_spans.extend(content_line.spans);
            Line::from(final_spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &Line<'_>) -> Vec<String> {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_highlight_splits_words_and_comments() {
        let line = highlight_source_code("fun main() // entry");
        assert_eq!(texts(&line), vec!["fun", " ", "main", "(", ")", " ", "// entry"]);
        assert_eq!(line.spans[0].style.fg, Some(DEFAULT_THEME.keyword));
        assert_eq!(line.spans[2].style.fg, Some(DEFAULT_THEME.name));
        assert_eq!(line.spans[6].style.fg, Some(DEFAULT_THEME.comment));
    }

    #[test]
    fn test_highlight_strings_with_escapes() {
        let line = highlight_source_code(r#"s = "a\"b" + 1"#);
        let rendered = texts(&line);
        assert!(rendered.contains(&r#""a\"b""#.to_string()), "{:?}", rendered);
        assert_eq!(line.spans.last().map(|s| s.style.fg), Some(Some(DEFAULT_THEME.number)));
    }

    #[test]
    fn test_directive_line_is_one_span() {
        let line = highlight_source_code("replace fn -> fun");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].style.fg, Some(DEFAULT_THEME.directive));
    }
}
