//! Token stream pane

use super::{clamp_scroll, pane_block, visible_height};
use crate::parser::lexer::{Token, TokenKind};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// One row per token: location, kind, text, and the pre-substitution
/// spelling when it differs.
pub fn token_line(token: &Token) -> Line<'static> {
    let kind_style = match token.kind {
        TokenKind::Invalid => Style::default().fg(DEFAULT_THEME.error),
        TokenKind::Ident => Style::default().fg(DEFAULT_THEME.fg),
        TokenKind::Int | TokenKind::Float | TokenKind::Bool | TokenKind::Nil => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        TokenKind::String => Style::default().fg(DEFAULT_THEME.string),
        kind if kind.is_keyword() => Style::default().fg(DEFAULT_THEME.keyword),
        _ => Style::default().fg(DEFAULT_THEME.accent),
    };

    let mut spans = vec![
        Span::styled(
            format!("{:>7} ", token.location.to_string()),
            Style::default().fg(DEFAULT_THEME.comment),
        ),
        Span::styled(format!("{:<18}", format!("{:?}", token.kind)), kind_style),
        Span::raw(token.spelling().to_string()),
    ];

    if let Some(original) = &token.original {
        spans.push(Span::styled(
            format!("  ← {}", original),
            Style::default().fg(DEFAULT_THEME.directive),
        ));
    }
    if let Some(error) = token.error {
        spans.push(Span::styled(
            format!("  {}", error),
            Style::default().fg(DEFAULT_THEME.error),
        ));
    }

    Line::from(spans)
}

pub fn render_tokens_pane(
    frame: &mut Frame,
    area: Rect,
    tokens: &[Token],
    is_focused: bool,
    scroll: &mut usize,
) {
    let title = format!(" Tokens ({}) ", tokens.len());
    let block = pane_block(&title, is_focused);

    let visible = visible_height(area);
    clamp_scroll(scroll, tokens.len(), visible);

    let lines: Vec<Line> = tokens
        .iter()
        .skip(*scroll)
        .take(visible)
        .map(token_line)
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
