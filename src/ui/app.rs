//! Inspector application state and event loop

use crate::parser::lexer::Token;
use crate::parser::outline::{outline, OutlineNode};
use crate::parser::unit::{CompilationUnit, Diagnostic};
use crate::ui::panes::{self, SourceScrollState};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Tokens,
    Tree,
}

impl FocusedPane {
    /// Move focus to the next pane (source -> tokens -> tree)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Tokens,
            FocusedPane::Tokens => FocusedPane::Tree,
            FocusedPane::Tree => FocusedPane::Source,
        }
    }

    /// Move focus to the previous pane
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Tree,
            FocusedPane::Tokens => FocusedPane::Source,
            FocusedPane::Tree => FocusedPane::Tokens,
        }
    }
}

/// The main application state
pub struct App {
    pub unit_name: String,
    pub source_code: String,

    /// Empty when preprocessing failed
    pub tokens: Vec<Token>,
    /// Empty when parsing failed
    pub outline: Vec<OutlineNode>,
    pub diagnostics: Vec<Diagnostic>,

    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub source_scroll: SourceScrollState,
    pub token_scroll: usize,
    pub tree_scroll: usize,

    /// Index into `diagnostics`
    pub selected_diagnostic: Option<usize>,

    pub should_quit: bool,
    pub status_message: String,
}

impl App {
    /// Run the front end over `unit` and set up the views.
    pub fn new(unit: &CompilationUnit) -> Self {
        let mut diagnostics = Vec::new();

        let tokens = match unit.tokens() {
            Ok(tokens) => tokens,
            Err(diagnostic) => {
                diagnostics.push(diagnostic);
                Vec::new()
            }
        };

        let outline = if diagnostics.is_empty() {
            match unit.parse() {
                Ok(program) => outline(&program),
                Err(errors) => {
                    diagnostics = errors;
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let mut app = App {
            unit_name: unit.name.clone(),
            source_code: unit.source.clone(),
            tokens,
            outline,
            diagnostics,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState::default(),
            token_scroll: 0,
            tree_scroll: 0,
            selected_diagnostic: None,
            should_quit: false,
            status_message: String::new(),
        };

        if app.diagnostics.is_empty() {
            app.status_message = format!("{} declaration(s)", app.top_level_count());
        } else {
            app.select_diagnostic(0);
        }
        app
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        // Left: source. Right: tokens (top) | tree (bottom)
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[0]);

        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(columns[1]);

        let diagnostic_lines: Vec<usize> =
            self.diagnostics.iter().map(|d| d.location.line).collect();
        let selected_line = self
            .selected_diagnostic
            .and_then(|idx| self.diagnostics.get(idx))
            .map(|d| d.location.line);

        panes::render_source_pane(
            frame,
            columns[0],
            &self.source_code,
            &diagnostic_lines,
            selected_line,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        panes::render_tokens_pane(
            frame,
            right_rows[0],
            &self.tokens,
            self.focused_pane == FocusedPane::Tokens,
            &mut self.token_scroll,
        );

        panes::render_tree_pane(
            frame,
            right_rows[1],
            &self.outline,
            &self.diagnostics,
            self.selected_diagnostic,
            self.focused_pane == FocusedPane::Tree,
            &mut self.tree_scroll,
        );

        panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.unit_name,
            &self.status_message,
            self.diagnostics.len(),
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Up => {
                let offset = self.focused_scroll();
                *offset = offset.saturating_sub(1);
            }
            KeyCode::Down => {
                // Clamped against the content on the next draw
                let offset = self.focused_scroll();
                *offset = offset.saturating_add(1);
            }
            KeyCode::Char('n') => self.step_diagnostic(true),
            KeyCode::Char('p') => self.step_diagnostic(false),
            _ => {}
        }
    }

    fn focused_scroll(&mut self) -> &mut usize {
        match self.focused_pane {
            FocusedPane::Source => &mut self.source_scroll.offset,
            FocusedPane::Tokens => &mut self.token_scroll,
            FocusedPane::Tree => &mut self.tree_scroll,
        }
    }

    /// Move the diagnostic selection, wrapping at either end.
    fn step_diagnostic(&mut self, forward: bool) {
        let count = self.diagnostics.len();
        if count == 0 {
            self.status_message = "No diagnostics".to_string();
            return;
        }

        let current = self.selected_diagnostic.unwrap_or(0);
        let next = if forward {
            (current + 1) % count
        } else {
            (current + count - 1) % count
        };
        self.select_diagnostic(next);
    }

    fn select_diagnostic(&mut self, idx: usize) {
        let Some(diagnostic) = self.diagnostics.get(idx) else {
            return;
        };
        self.source_scroll.reveal_line = Some(diagnostic.location.line);
        self.status_message = format!(
            "[{}/{}] {}",
            idx + 1,
            self.diagnostics.len(),
            diagnostic
        );
        self.selected_diagnostic = Some(idx);
    }

    fn top_level_count(&self) -> usize {
        self.outline.iter().filter(|node| node.depth == 0).count()
    }
}
