// javacheck: syntax validator for a Java subset

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use javacheck::parser::{grammar, lexer};
use javacheck::render::{render_human, render_json, render_listing};
use javacheck::{Validator, ValidatorConfig};

#[derive(Debug, Parser)]
#[command(name = "javacheck", version, about = "Syntax validator for a Java subset")]
struct Cli {
    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a source file
    Check {
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,

        /// Extra type name to accept (repeatable)
        #[arg(long = "type", value_name = "NAME")]
        types: Vec<String>,

        /// JSON configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        #[arg(long, value_name = "N")]
        max_input_bytes: Option<usize>,

        /// Treat a missing `;` before `}` as an error
        #[arg(long)]
        strict: bool,

        #[arg(long)]
        no_color: bool,
    },
    /// Print the token stream of a source file
    Tokens {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },
    /// Print the construct grammar as EBNF
    Grammar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Listing,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbose))),
        )
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command) {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::from(2)
        }
    }
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "javacheck=info",
        1 => "javacheck=debug",
        _ => "javacheck=trace",
    }
}

fn run(command: Command) -> miette::Result<ExitCode> {
    match command {
        Command::Check {
            file,
            format,
            types,
            config,
            max_input_bytes,
            strict,
            no_color,
        } => {
            let mut settings = match config {
                Some(path) => ValidatorConfig::load(path)?,
                None => ValidatorConfig::default(),
            };
            for name in types {
                settings = settings.with_type(name);
            }
            if let Some(limit) = max_input_bytes {
                settings = settings.with_max_input_bytes(limit);
            }
            if strict {
                settings = settings.with_lenient_block_semicolons(false);
            }

            let source = read_source(&file)?;
            let report = Validator::new(settings).validate(&source)?;
            debug!(file = %file.display(), valid = report.is_valid(), "checked");

            let color = use_color(no_color);
            let name = file.display().to_string();
            let output = match format {
                Format::Human => render_human(&report, &name, &source, color),
                Format::Listing => render_listing(&report, color),
                Format::Json => render_json(&report).into_diagnostic()?,
            };
            print!("{output}");
            if format == Format::Json {
                println!();
            }

            Ok(if report.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Command::Tokens { file, json } => {
            let source = read_source(&file)?;
            let tokens: Vec<lexer::Token> = lexer::tokenize(&source).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&tokens).into_diagnostic()?);
            } else {
                for token in &tokens {
                    println!(
                        "{:>8}  {:<14}  {}",
                        token.location.to_string(),
                        format!("{:?}", token.category()),
                        token
                    );
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Grammar => {
            print!("{}", grammar::ebnf());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_source(path: &Path) -> miette::Result<String> {
    fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot read {}", path.display()))
}

fn use_color(no_color: bool) -> bool {
    !no_color && std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_directive_for_verbosity() {
        assert_eq!(directive_for_verbosity(0), "javacheck=info");
        assert_eq!(directive_for_verbosity(1), "javacheck=debug");
        assert_eq!(directive_for_verbosity(2), "javacheck=trace");
        assert_eq!(directive_for_verbosity(9), "javacheck=trace");
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_arguments() {
        let cli = Cli::parse_from([
            "javacheck", "-vv", "check", "Main.java", "--format", "listing", "--type", "Point",
            "--type", "Node", "--strict",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Check {
                file,
                format,
                types,
                strict,
                no_color,
                ..
            } => {
                assert_eq!(file, PathBuf::from("Main.java"));
                assert_eq!(format, Format::Listing);
                assert_eq!(types, vec!["Point".to_string(), "Node".to_string()]);
                assert!(strict);
                assert!(!no_color);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
