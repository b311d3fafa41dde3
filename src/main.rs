//! C.SHORT Compiler Front End
//!
//! Lexical, syntactic and semantic analysis of a small C-like language.
//! The output is a verdict plus the populated symbol table.

mod feedback;
mod frontend;
mod types;
mod utils;

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{ArgAction, Parser};
use log::LevelFilter;

use feedback::AnalysisReport;
use frontend::lexer::Lexer;
use frontend::parser::Parser as CShortParser;

/// C.SHORT front end
#[derive(Parser, Debug)]
#[command(name = "cshortc")]
#[command(version = "0.1.0")]
#[command(about = "C.SHORT front end - lexical, syntactic and semantic analysis")]
struct Cli {
    /// Input source file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,

    /// Do not print the symbol table after a successful run
    #[arg(long)]
    no_symbols: bool,

    /// Show recognized constructs (-v), symbol events (-vv), tokens (-vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("[ERROR] {:#}", e);
            process::exit(1);
        }
    }
}

/// Progress goes to stdout; RUST_LOG overrides the -v flags
fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .format_timestamp(None)
        .init();
}

/// Analyze one file. `Ok(false)` means the program was rejected.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("cannot open source file '{}'", cli.input.display()))?;

    let mut parser = CShortParser::new(Lexer::new(&source));
    let result = parser.parse_program();

    if cli.json {
        let report = AnalysisReport::new(&cli.input.display().to_string(), &result, parser.symbols());
        println!("{}", report.to_json()?);
        return Ok(result.is_ok());
    }

    match result {
        Ok(()) => {
            println!("[OK] Syntactic analysis completed successfully.");
            println!("[OK] Semantic analysis completed successfully.");
            if !cli.no_symbols {
                print!("{}", parser.symbols().dump());
            }
            Ok(true)
        }
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            Ok(false)
        }
    }
}
