use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use openapi2code::{generate_rust, write_modules, Document, GeneratorConfig};

/// Generate Rust models and handlers from an OpenAPI document
#[derive(Parser, Debug)]
#[command(name = "openapi2code", version, about)]
struct Args {
    /// OpenAPI document (JSON or YAML)
    input: PathBuf,

    /// Directory the generated modules are written to
    output_dir: PathBuf,

    /// Generator configuration (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the files that would be written instead of writing them
    #[arg(long)]
    dry_run: bool,

    /// More output per occurrence (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &args.config {
        Some(path) => GeneratorConfig::from_path(path)?,
        None => GeneratorConfig::default(),
    };
    let document = Document::from_path(&args.input)?;
    info!(
        "Loaded {} paths and {} schemas from {}",
        document.paths.len(),
        document.schemas().len(),
        args.input.display()
    );

    let files = generate_rust(&document, &config)
        .with_context(|| format!("Failed to generate code from {}", args.input.display()))?;

    if args.dry_run {
        for file in &files {
            println!("// {}", args.output_dir.join(&file.file_name).display());
            println!("{}", file.content);
        }
        return Ok(());
    }

    let paths = write_modules(&files, &args.output_dir)
        .with_context(|| format!("Failed to write to {}", args.output_dir.display()))?;
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}
