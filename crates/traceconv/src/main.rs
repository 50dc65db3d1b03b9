use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use traceconv::batch::{self, InputFormat, Mode};
use traceconv::config::{Config, ConfigArgs};

/// Convert concurrency traces between raw, canonical and binary formats.
#[derive(Debug, Parser)]
#[command(name = "traceconv", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert raw traces to canonical text.
    Canonicalize {
        /// A raw trace file, or a directory of them.
        input: PathBuf,
        output_dir: PathBuf,
    },

    /// Convert traces to the binary format.
    Encode {
        /// A trace file, or a directory of them.
        input: PathBuf,
        output_dir: PathBuf,

        /// Format of the input traces.
        #[arg(long, value_enum, default_value_t = InputFormat::Canonical)]
        from: InputFormat,
    },

    /// Print the events of a binary trace.
    Print { file: PathBuf },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let (input, output_dir, mode) = match cli.command {
        Command::Canonicalize { input, output_dir } => (input, output_dir, Mode::Canonicalize),
        Command::Encode {
            input,
            output_dir,
            from,
        } => (input, output_dir, Mode::Encode(from)),
        Command::Print { file } => {
            let stdout = io::stdout();
            batch::print_binary(&file, &mut stdout.lock())?;
            return Ok(());
        }
    };

    let summary = batch::run(&input, &output_dir, mode, &config)?;
    for path in &summary.converted {
        println!("Converted {}", path.display());
    }
    for (path, _) in &summary.failed {
        println!("Error converting {}", path.display());
    }

    if !summary.is_success() {
        anyhow::bail!(
            "{} of {} files failed to convert",
            summary.failed.len(),
            summary.failed.len() + summary.converted.len()
        );
    }
    Ok(())
}
