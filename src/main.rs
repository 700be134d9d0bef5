use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use quill::ast_printer::AstPrinter;
use quill::error::QuillError;
use quill::interpreter::Interpreter;
use quill::parser::parse_source;
use quill::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Quill language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a source file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses a source file and prints its AST
    Parse {
        filename: PathBuf,

        /// Print the AST as JSON instead of an S-expression
        #[arg(long)]
        json: bool,
    },

    /// Runs a source file as a Quill program
    Run {
        filename: PathBuf,

        /// Print the program's resulting value
        #[arg(long)]
        print: bool,
    },
}

/// Maps a source file into memory. Empty files cannot be mapped and read as
/// `None`.
fn map_file(filename: &Path) -> Result<Option<Mmap>> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let length = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    if length == 0 {
        return Ok(None);
    }

    // SAFETY: the map is read-only and dropped before the process exits;
    // concurrent truncation of the source file by another process is not
    // supported.
    let map = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    info!("Mapped {} bytes from {:?}", length, filename);

    Ok(Some(map))
}

fn with_source<T>(filename: &Path, f: impl FnOnce(&str) -> T) -> Result<T> {
    let map = map_file(filename)?;
    let bytes: &[u8] = map.as_deref().unwrap_or_default();

    let source = std::str::from_utf8(bytes).map_err(QuillError::from);

    match source {
        Ok(source) => Ok(f(source)),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(65);
        }
    }
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'quill::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("quill::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Exit code for a failed run: 65 for malformed input, 70 for evaluation.
fn exit_code(error: &QuillError) -> i32 {
    match error {
        QuillError::Lex { .. } | QuillError::Syntax { .. } | QuillError::Utf8(_) => 65,
        _ => 70,
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename } => {
            info!("Running Tokenize subcommand");

            let tokenized = with_source(&filename, |source| {
                let mut tokenized = true;

                for token in Scanner::new(source) {
                    match token {
                        Ok(token) => {
                            debug!("Scanned token: {}", token);
                            println!("{}", token);
                        }
                        Err(e) => {
                            tokenized = false;
                            debug!("Tokenization debug: {}", e);
                            eprintln!("{}", e);
                        }
                    }
                }

                tokenized
            })?;

            if !tokenized {
                debug!("Tokenization failed, exiting with code 65");
                std::process::exit(65);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename, json } => {
            info!("Running Parse subcommand");

            let output = with_source(&filename, |source| {
                parse_source(source).map(|program| {
                    if json {
                        serde_json::to_string_pretty(&program)
                    } else {
                        Ok(AstPrinter::print(&program))
                    }
                })
            })?;

            match output {
                Ok(rendered) => {
                    let rendered = rendered.context("Failed to serialize the AST")?;
                    println!("{}", rendered);
                }
                Err(e) => {
                    debug!("Parse debug: {}", e);
                    eprintln!("{}", e);
                    std::process::exit(exit_code(&e));
                }
            }

            info!("Parse subcommand completed");
        }

        Commands::Run { filename, print } => {
            info!("Running Run subcommand");

            let result = with_source(&filename, |source| {
                let program = parse_source(source)?;
                info!("Program parsed successfully");

                Interpreter::new().interpret(&program)
            })?;

            match result {
                Ok(value) => {
                    info!("Program executed successfully");

                    if print {
                        println!("{}", value);
                    }
                }
                Err(e) => {
                    debug!("Runtime debug: {}", e);
                    eprintln!("{}", e);
                    std::process::exit(exit_code(&e));
                }
            }
        }
    }

    Ok(())
}
