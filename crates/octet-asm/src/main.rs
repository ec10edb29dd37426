//! CLI entry point for the Octet assembler binary.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use octet_asm::assembler::{assemble_unlinked, AssembledProgram};
use octet_core::codec::{long_form, short_form};
use octet_core::MachineImage;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
#[cfg(test)]
use assert_cmd as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;

/// Assemble Octet source into a program loadable at address 0.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Source file; standard input when omitted
    input: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = Emit::Array)]
    emit: Emit,
    /// Program name stored in `state` and `url` output; defaults to the
    /// input file stem
    #[arg(long)]
    name: Option<String>,
    /// Write to a file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Log the listing to standard error
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Byte array, e.g. `[1, 0, 0]`
    Array,
    /// Long-form machine state file
    State,
    /// Short-form URL query string
    Url,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if let Err(err) = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("warning: logging unavailable: {err}");
    }
}

fn read_source(input: Option<&Path>) -> io::Result<String> {
    match input {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}

fn format_array(bytes: &[u8]) -> String {
    let items: Vec<String> = bytes.iter().map(u8::to_string).collect();
    format!("[{}]", items.join(", "))
}

fn render(emit: Emit, bytes: &[u8], name: Option<String>) -> String {
    let image = MachineImage {
        filename: name,
        ..MachineImage::from_program(bytes)
    };
    match emit {
        Emit::Array => format!("{}\n", format_array(bytes)),
        Emit::State => long_form::encode(&image),
        Emit::Url => format!("{}\n", short_form::encode(&image)),
    }
}

fn log_listing(program: &AssembledProgram, source: &str) {
    let lines: Vec<&str> = source.lines().collect();
    for chunk in &program.chunks {
        let hex: Vec<String> = chunk.bytes.iter().map(|b| format!("{b:02X}")).collect();
        let text = lines.get(chunk.line - 1).map_or("", |line| line.trim());
        log::debug!("{:02X}: {:<11} {text}", chunk.offset, hex.join(" "));
    }
    for (name, symbol) in program.symbols.sorted() {
        log::debug!(":{name} = 0x{:02X}", symbol.offset);
    }
}

fn run(args: Args) -> Result<(), i32> {
    let source = read_source(args.input.as_deref()).map_err(|err| {
        eprintln!("error: failed to read input: {err}");
        1
    })?;

    let bytes = assemble_unlinked(&source)
        .and_then(|program| {
            if args.verbose {
                log_listing(&program, &source);
            }
            program.link()
        })
        .map_err(|err| {
            eprintln!("{err}");
            1
        })?;

    let name = args.name.or_else(|| {
        args.input
            .as_deref()
            .and_then(Path::file_stem)
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
    });
    let rendered = render(args.emit, &bytes, name);

    match &args.output {
        Some(path) => fs::write(path, rendered).map_err(|err| {
            eprintln!("error: failed to write output: {err}");
            1
        })?,
        None => print!("{rendered}"),
    }
    log::info!("assembled {} bytes", bytes.len());
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    let exit_code = match run(args) {
        Ok(()) => 0,
        Err(code) => code,
    };
    std::process::exit(exit_code);
}
