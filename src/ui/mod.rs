//! Terminal inspector built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: application state, keyboard event loop, pane focus, diagnostic navigation
//! - **[`panes`]**: stateless render functions for each visible pane (source, tokens,
//!   tree, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it from a
//! [`CompilationUnit`] and call [`App::run`] to start the event loop.
//!
//! [`CompilationUnit`]: crate::parser::unit::CompilationUnit
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
