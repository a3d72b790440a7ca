//! The Twine compiler CLI.
//!
//! Subcommands:
//!
//! - `twinec check <file>` - Tokenize, parse, and type-check a Twine file,
//!   reporting diagnostics (`--json` for machine-readable output)
//! - `twinec tokens <file>` - Dump the token stream as JSON
//!
//! `--indent-mode` selects how the file-wide indentation character is
//! chosen: `detect` (first indented line decides) or `directive` (tabs
//! unless a `"use spaces"` line appears).

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use twine_check::Compilation;
use twine_common::render::render_diagnostic_colored;
use twine_lexer::IndentMode;

#[derive(Parser)]
#[command(name = "twinec", version, about = "The Twine compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum IndentModeArg {
    /// The first indented line fixes the indentation character.
    Detect,
    /// Tabs, unless a leading `"use spaces"` directive appears.
    Directive,
}

impl From<IndentModeArg> for IndentMode {
    fn from(arg: IndentModeArg) -> IndentMode {
        match arg {
            IndentModeArg::Detect => IndentMode::Detect,
            IndentModeArg::Directive => IndentMode::Directive,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Type-check a Twine source file
    Check {
        /// Path to the source file
        file: PathBuf,

        /// Emit diagnostics as JSON instead of rendered reports
        #[arg(long)]
        json: bool,

        /// Indentation mode
        #[arg(long = "indent-mode", value_enum, default_value = "detect")]
        indent_mode: IndentModeArg,
    },
    /// Dump the token stream of a Twine source file as JSON
    Tokens {
        /// Path to the source file
        file: PathBuf,

        /// Indentation mode
        #[arg(long = "indent-mode", value_enum, default_value = "detect")]
        indent_mode: IndentModeArg,
    },
}

fn main() {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Check { file, json, indent_mode } => check(&file, json, indent_mode.into()),
        Commands::Tokens { file, indent_mode } => tokens(&file, indent_mode.into()),
    };
    if let Err(message) = outcome {
        eprintln!("error: {message}");
        process::exit(1);
    }
}

fn read_source(file: &Path) -> Result<String, String> {
    std::fs::read_to_string(file)
        .map_err(|e| format!("failed to read '{}': {e}", file.display()))
}

/// Run the pipeline and report diagnostics. Errors fail the command.
fn check(file: &Path, json: bool, mode: IndentMode) -> Result<(), String> {
    let source = read_source(file)?;
    let compilation = twine_check::compile(&source, mode);

    if json {
        let rendered = serde_json::to_string_pretty(compilation.diags.all())
            .map_err(|e| format!("failed to serialize diagnostics: {e}"))?;
        println!("{rendered}");
    } else {
        report_diagnostics(&source, &compilation);
    }

    if compilation.succeeded() {
        if !json {
            eprintln!(
                "  Checked: {} ({} instructions)",
                file.display(),
                compilation.result.insts.count()
            );
        }
        Ok(())
    } else {
        Err(format!(
            "{} error(s) in '{}'",
            compilation.diags.error_count(),
            file.display()
        ))
    }
}

/// Dump the token stream as JSON.
fn tokens(file: &Path, mode: IndentMode) -> Result<(), String> {
    let source = read_source(file)?;
    let compilation = twine_check::compile(&source, mode);
    let rendered = serde_json::to_string_pretty(compilation.tokens.as_slice())
        .map_err(|e| format!("failed to serialize tokens: {e}"))?;
    println!("{rendered}");
    Ok(())
}

/// Render every diagnostic with ariadne.
fn report_diagnostics(source: &str, compilation: &Compilation) {
    for diag in compilation.diags.all() {
        let rendered = render_diagnostic_colored(
            diag,
            source,
            Some(&compilation.tokens),
            &compilation.interner,
        );
        eprint!("{rendered}");
    }
}
