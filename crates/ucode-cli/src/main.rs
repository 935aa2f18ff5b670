// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! ucode checker command-line interface.
//!
//! This is the main entry point for the `ucode` command.

use std::io::IsTerminal;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{ArgAction, Parser, Subcommand};
use miette::Result;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod diagnostic;
mod suppression;

use commands::check::OutputFormat;
use config::{Config, Overrides};

/// Static analysis for ucode scripts
#[derive(Debug, Parser)]
#[command(name = "ucode")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of searching for `.ucode-lsp.toml`
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Args)]
struct AnalysisFlags {
    /// Do not report unused variables
    #[arg(long)]
    no_unused: bool,

    /// Do not report shadowed declarations
    #[arg(long)]
    no_shadowing: bool,

    /// Skip operator, call and builtin argument checks
    #[arg(long)]
    no_type_checking: bool,

    /// Treat NAME as a predefined global (repeatable)
    #[arg(long = "global", value_name = "NAME")]
    globals: Vec<String>,
}

impl AnalysisFlags {
    fn overrides(&self) -> Overrides {
        Overrides {
            no_type_checking: self.no_type_checking,
            no_unused: self.no_unused,
            no_shadowing: self.no_shadowing,
            globals: self.globals.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check source files and directories for errors
    Check {
        /// Source files or directories to check
        #[arg(default_value = ".")]
        paths: Vec<Utf8PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[command(flatten)]
        flags: AnalysisFlags,
    },

    /// Print the token stream of a file
    Tokens {
        file: Utf8PathBuf,
    },

    /// Print the syntax tree of a file
    Ast {
        file: Utf8PathBuf,
    },

    /// List the declarations of a file with their inferred types
    Symbols {
        file: Utf8PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[command(flatten)]
        flags: AnalysisFlags,
    },
}

fn main() -> Result<()> {
    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Command::Check {
            paths,
            format,
            flags,
        } => {
            let config = load_config(cli.config.as_deref(), paths.first().map(Utf8PathBuf::as_path))?;
            let options = config.analysis_options(&flags.overrides());
            commands::check::run_check(paths, *format, &options)
        }
        Command::Tokens { file } => commands::inspect::run_tokens(file),
        Command::Ast { file } => commands::inspect::run_ast(file),
        Command::Symbols {
            file,
            format,
            flags,
        } => {
            let config = load_config(cli.config.as_deref(), Some(file.as_path()))?;
            let options = config.analysis_options(&flags.overrides());
            commands::inspect::run_symbols(file, *format, &options)
        }
    };

    // Exit with appropriate code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(verbose))),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "ucode_cli=info,ucode_core=warn",
        1 => "ucode_cli=debug,ucode_core=debug",
        _ => "ucode_cli=trace,ucode_core=trace",
    }
}

/// The explicit `--config` file, or the nearest `.ucode-lsp.toml` above the
/// first checked path.
fn load_config(explicit: Option<&Utf8Path>, near: Option<&Utf8Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return config::parse_config(path);
    }
    let start = match near {
        Some(path) if path.is_dir() => path.to_path_buf(),
        Some(path) => path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .map_or_else(|| Utf8PathBuf::from("."), Utf8Path::to_path_buf),
        None => Utf8PathBuf::from("."),
    };
    let start = start.canonicalize_utf8().unwrap_or(start);
    Ok(config::find_config(&start)?.unwrap_or_default())
}
