use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand};
use tidyblocks::cli::{self, CheckOptions, CliError, RunOptions};
use tidyblocks::program::error_chain;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(ClapParser)]
#[command(name = "tidyblocks")]
#[command(about = "TidyBlocks - run block-built data analysis programs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a saved program and print its results and log
    Run {
        /// Program JSON file (reads from stdin if not provided)
        program: Option<PathBuf>,

        /// Load a dataset for `data` steps, as NAME=FILE
        #[arg(short, long = "data", value_name = "NAME=FILE")]
        data: Vec<String>,

        /// Seed every random value so the run is reproducible
        #[arg(short, long)]
        seed: Option<u64>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Load a saved program and check it without running
    Check {
        /// Program JSON file (reads from stdin if not provided)
        program: Option<PathBuf>,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category name (use 'tidyblocks docs' to list categories)
        category: String,
    },
}

fn main() -> ExitCode {
    // RUST_LOG controls diagnostics; they go to stderr so stdout stays JSON.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            program,
            data,
            seed,
            pretty,
        } => run(program, data, seed, pretty),
        Commands::Check { program } => check(program),
        Commands::Docs => {
            print!("{}", cli::get_docs_overview());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Doc { category } => cli::get_doc_category(&category).map(|content| {
            print!("{}", content);
            ExitCode::SUCCESS
        }),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", error_chain(&e));
            ExitCode::FAILURE
        }
    }
}

fn read_program(path: Option<PathBuf>) -> Result<Option<String>, CliError> {
    match path {
        Some(path) => Ok(Some(fs::read_to_string(path)?)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn run(
    program: Option<PathBuf>,
    data: Vec<String>,
    seed: Option<u64>,
    pretty: bool,
) -> Result<ExitCode, CliError> {
    let mut datasets = Vec::with_capacity(data.len());
    for arg in &data {
        let (name, path) = cli::parse_data_arg(arg)?;
        datasets.push((name, fs::read_to_string(path)?));
    }

    let options = RunOptions {
        program: read_program(program)?,
        datasets,
        seed,
        pretty,
    };

    let outcome = cli::execute_run(&options)?;
    println!("{}", outcome.report);
    if outcome.failed {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn check(program: Option<PathBuf>) -> Result<ExitCode, CliError> {
    let options = CheckOptions {
        program: read_program(program)?,
    };
    println!("{}", cli::execute_check(&options)?);
    Ok(ExitCode::SUCCESS)
}
