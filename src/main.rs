//! rpnsheet - evaluate a grid of postfix arithmetic cells

mod config;
mod error;

use anyhow::{Context, Result};
use rpnsheet_core::storage::{render_table, write_table};
use rpnsheet_core::{CycleMarking, Sheet, SheetOptions};
use std::env;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;

fn print_usage() {
    eprintln!("Usage: rpnsheet [OPTIONS] <FILE>...");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <FILE>...                 Comma-separated input files ('-' reads stdin)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --output <FILE>       Write the table to a file instead of stdout");
    eprintln!("  -d, --delimiter <CHAR>    Field delimiter (default: ',')");
    eprintln!("  --cycle-marking <MODE>    Cells marked on a cycle: members | active-path");
    eprintln!("  --config <FILE>           Load settings from a TOML file");
    eprintln!("  --no-config               Ignore the per-user config file");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default)]
struct Args {
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    delimiter: Option<char>,
    cycle_marking: Option<CycleMarking>,
    config_file: Option<PathBuf>,
    no_config: bool,
}

fn usage_error(message: String) -> ! {
    eprintln!("Error: {}", message);
    print_usage();
    std::process::exit(1);
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> String {
    *i += 1;
    match args.get(*i) {
        Some(v) => v.clone(),
        None => usage_error(format!("{} requires a value", flag)),
    }
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            "-o" | "--output" => {
                parsed.output = Some(PathBuf::from(take_value(&args, &mut i, "--output")));
            }
            "-d" | "--delimiter" => {
                let raw = take_value(&args, &mut i, "--delimiter");
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => parsed.delimiter = Some(c),
                    _ => usage_error(format!("--delimiter expects one character, got '{}'", raw)),
                }
            }
            "--cycle-marking" => {
                let raw = take_value(&args, &mut i, "--cycle-marking");
                match raw.parse::<CycleMarking>() {
                    Ok(mode) => parsed.cycle_marking = Some(mode),
                    Err(e) => usage_error(e),
                }
            }
            "--config" => {
                parsed.config_file = Some(PathBuf::from(take_value(&args, &mut i, "--config")));
            }
            "--no-config" => parsed.no_config = true,
            "-" => parsed.inputs.push(PathBuf::from("-")),
            arg if arg.starts_with('-') => usage_error(format!("Unknown option: {}", arg)),
            arg => parsed.inputs.push(PathBuf::from(arg)),
        }
        i += 1;
    }

    if parsed.inputs.is_empty() {
        usage_error("no input files".to_string());
    }
    parsed
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing to stderr.
///
/// Enabled by `RUST_LOG`, or by `log_filter` in the config when `RUST_LOG`
/// is unset.
fn init_tracing(config_filter: Option<&str>) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = if env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if let Some(directives) = config_filter {
            EnvFilter::new(directives)
        } else {
            return;
        };
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .init();
    });
}

fn load_sheet(input: &Path, options: SheetOptions) -> Result<Sheet> {
    if input.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read stdin")?;
        return Ok(Sheet::load_str(&content, options)?);
    }
    Sheet::load_file(input, options).with_context(|| format!("Failed to load {}", input.display()))
}

/// Render every sheet; with several inputs each table gets a banner line.
fn render_all(sheets: &[(&Path, Sheet)]) -> String {
    if let [(_, sheet)] = sheets {
        return render_table(sheet);
    }
    let mut rendered = String::new();
    for (idx, (input, sheet)) in sheets.iter().enumerate() {
        if idx > 0 {
            rendered.push('\n');
        }
        rendered.push_str(&format!("==> {} <==\n", input.display()));
        rendered.push_str(&render_table(sheet));
    }
    rendered
}

fn run(args: Args) -> Result<()> {
    let (config, warnings) = if args.no_config && args.config_file.is_none() {
        (config::Config::default(), Vec::new())
    } else {
        config::load_config(args.config_file.as_deref())?
    };
    init_tracing(config.log_filter.as_deref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let mut options = config.sheet_options();
    if let Some(mode) = args.cycle_marking {
        options.cycle_marking = mode;
    }
    if let Some(delimiter) = args.delimiter {
        options.delimiter = delimiter;
    }
    tracing::debug!(?options, inputs = args.inputs.len(), "starting");

    // Each input gets a fresh session.
    let mut sheets = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let sheet = load_sheet(input, options)?;
        for (cell, err) in sheet.diagnostics() {
            tracing::info!(input = %input.display(), cell = %cell, "{}", err);
        }
        sheets.push((input.as_path(), sheet));
    }

    match (&args.output, sheets.as_slice()) {
        (Some(path), [(_, sheet)]) => write_table(path, sheet)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        (Some(path), _) => std::fs::write(path, render_all(&sheets))
            .with_context(|| format!("Failed to write {}", path.display()))?,
        (None, _) => {
            let rendered = render_all(&sheets);
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn main() {
    let args = parse_args();
    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
