//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Source text with syntax highlighting and diagnostic markers
//! - [`tokens`]: The token stream after substitution
//! - [`tree`]: Outline of the parsed program, or the diagnostic list
//! - [`status`]: Status bar with keybindings and parse result
//!
//! Each pane module exports a primary `render_*` function. Scrolling panes
//! take their offset by `&mut` and clamp it to the content they draw.

pub mod source;
pub mod status;
pub mod tokens;
pub mod tree;

pub use source::{render_source_pane, SourceScrollState};
pub use status::render_status_bar;
pub use tokens::render_tokens_pane;
pub use tree::render_tree_pane;

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders},
};

fn pane_block(title: &str, is_focused: bool) -> Block<'_> {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Rows available inside a bordered pane
fn visible_height(area: Rect) -> usize {
    area.height.saturating_sub(2).max(1) as usize
}

/// Keep `offset` within `[0, total - visible]`.
fn clamp_scroll(offset: &mut usize, total: usize, visible: usize) {
    *offset = (*offset).min(total.saturating_sub(visible));
}
