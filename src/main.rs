//! tracklang: run a DAW editing script and print the resulting actions.
//!
//! Reads DSL from a file or stdin, optionally against a JSON session
//! snapshot, and prints the action list as JSON. On failure the structured
//! error (with any partial actions) is printed instead and the exit code is
//! non-zero.

use std::error::Error;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::{debug, Level};

use tracklang::config::{self, Config};
use tracklang::dsl::grammar::GRAMMAR;
use tracklang::interpreter::Interpreter;
use tracklang::session::Session;

#[derive(Parser)]
#[command(name = "tracklang")]
#[command(about = "Turn DAW editing scripts into action records", long_about = None)]
struct Cli {
    /// DSL script file (reads stdin when omitted)
    script: Option<PathBuf>,

    /// JSON session snapshot to resolve tracks, clips and fx against
    #[arg(short, long)]
    session: Option<PathBuf>,

    /// Config file (default: ~/.tracklang/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the DSL grammar and exit
    #[arg(long)]
    grammar: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.grammar {
        print!("{GRAMMAR}");
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("tracklang: {e}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::load_default_config()?,
    };
    init_logging(&config, cli.verbose);

    let source = match &cli.script {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let session = match &cli.session {
        Some(path) => Session::from_json_str(&std::fs::read_to_string(path)?)?,
        None => Session::empty(),
    };
    let interpreter = Interpreter::new(session).with_clip_defaults(config.clip_defaults);
    debug!(tracks = interpreter.session().track_count(), "session ready");
    let pretty = cli.pretty || config.pretty;

    match interpreter.run(&source) {
        Ok(actions) => {
            print_json(&actions, pretty)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            print_json(&failure, pretty)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_logging(config: &Config, verbose: u8) {
    let level = match verbose {
        0 => config.log_level.parse().unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), Box<dyn Error>> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{out}")?;
    Ok(())
}
