//! klang command line front end
//!
//! Run with: `klang <FILE> [--expand] [--tokens] [--ast] [--inspect]`

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    style::Stylize,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use klang::parser::lexer::TokenKind;
use klang::parser::outline;
use klang::parser::unit::{CompilationUnit, Diagnostic};
use klang::ui::App;

#[derive(Parser)]
#[command(name = "klang")]
#[command(about = "Preprocess, tokenize and parse klang source")]
#[command(version)]
struct Cli {
    /// Source file to parse
    file: PathBuf,

    /// Print the source after `replace` directives are applied
    #[arg(long)]
    expand: bool,

    /// Print the token stream
    #[arg(long)]
    tokens: bool,

    /// Print an outline of the syntax tree
    #[arg(long)]
    ast: bool,

    /// Open the interactive inspector
    #[arg(long)]
    inspect: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let source = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let unit = CompilationUnit::new(cli.file.display().to_string(), source);
    info!(unit = %unit.name, bytes = unit.source.len(), "loaded source");

    if cli.inspect {
        run_inspector(&unit)?;
        return Ok(ExitCode::SUCCESS);
    }

    if cli.expand {
        match unit.preprocess() {
            Ok(preprocessed) => print!("{}", preprocessed.rewritten_source()),
            Err(diagnostic) => return Ok(report(&[diagnostic])),
        }
    }

    if cli.tokens {
        let tokens = match unit.tokens() {
            Ok(tokens) => tokens,
            Err(diagnostic) => return Ok(report(&[diagnostic])),
        };
        for token in tokens.iter().filter(|t| t.kind != TokenKind::Eof) {
            println!("{:>7}  {:<14} {}", token.location.to_string(), format!("{:?}", token.kind), token);
        }
    }

    let program = match unit.parse() {
        Ok(program) => program,
        Err(diagnostics) => return Ok(report(&diagnostics)),
    };

    if cli.ast {
        print!("{}", outline::render(&program));
    } else if !cli.expand && !cli.tokens {
        println!(
            "{} {}: {} declaration(s)",
            "ok".green().bold(),
            unit.name,
            program.declarations.len()
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Print diagnostics to stderr; the process then exits with status 1.
fn report(diagnostics: &[Diagnostic]) -> ExitCode {
    for diagnostic in diagnostics {
        eprintln!("{}: {}", "error".red().bold(), diagnostic);
    }
    let summary = format!("{} error(s) found", diagnostics.len());
    eprintln!("{}", summary.as_str().red());
    ExitCode::FAILURE
}

fn run_inspector(unit: &CompilationUnit) -> Result<()> {
    let mut app = App::new(unit);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.context("inspector failed")
}
