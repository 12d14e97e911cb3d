//! Syntax tree pane
//!
//! Shows the program outline when the unit parsed cleanly, otherwise the
//! list of diagnostics with the selected one highlighted.

use super::{clamp_scroll, pane_block, visible_height};
use crate::parser::outline::OutlineNode;
use crate::parser::unit::Diagnostic;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub fn render_tree_pane(
    frame: &mut Frame,
    area: Rect,
    outline: &[OutlineNode],
    diagnostics: &[Diagnostic],
    selected: Option<usize>,
    is_focused: bool,
    scroll: &mut usize,
) {
    let visible = visible_height(area);

    let (title, lines) = if diagnostics.is_empty() {
        (" Syntax Tree ".to_string(), outline_lines(outline))
    } else {
        (
            format!(" Diagnostics ({}) ", diagnostics.len()),
            diagnostic_lines(diagnostics, selected),
        )
    };

    clamp_scroll(scroll, lines.len(), visible);
    let lines: Vec<Line> = lines.into_iter().skip(*scroll).take(visible).collect();

    let block = pane_block(&title, is_focused);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn outline_lines(outline: &[OutlineNode]) -> Vec<Line<'static>> {
    outline
        .iter()
        .map(|node| {
            let label_style = if node.depth == 0 {
                Style::default()
                    .fg(DEFAULT_THEME.name)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            };
            Line::from(vec![
                Span::raw("  ".repeat(node.depth)),
                Span::styled(node.label.clone(), label_style),
                Span::styled(
                    format!("  {}", node.location),
                    Style::default().fg(DEFAULT_THEME.comment),
                ),
            ])
        })
        .collect()
}

fn diagnostic_lines(diagnostics: &[Diagnostic], selected: Option<usize>) -> Vec<Line<'static>> {
    diagnostics
        .iter()
        .enumerate()
        .map(|(idx, diagnostic)| {
            let style = if selected == Some(idx) {
                Style::default()
                    .bg(DEFAULT_THEME.error)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.error)
            };
            Line::from(vec![
                Span::styled(
                    format!("{:>7} ", diagnostic.location.to_string()),
                    Style::default().fg(DEFAULT_THEME.comment),
                ),
                Span::styled(diagnostic.message.clone(), style),
            ])
        })
        .collect()
}
