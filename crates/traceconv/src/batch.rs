use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracecodec::{canonical_to_binary, describe_binary, RandomValues, TraceConverter};
use walkdir::WalkDir;

use crate::config::Config;

/// The format of trace files given to `encode`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    Raw,
    #[default]
    Canonical,
}

/// What to produce from each input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Raw trace to canonical text.
    Canonicalize,
    /// Raw or canonical trace to binary.
    Encode(InputFormat),
}

impl Mode {
    fn input_extension(self, config: &Config) -> &str {
        match self {
            Mode::Canonicalize | Mode::Encode(InputFormat::Raw) => &config.raw_extension,
            Mode::Encode(InputFormat::Canonical) => &config.canonical_extension,
        }
    }

    fn output_extension(self, config: &Config) -> &str {
        match self {
            Mode::Canonicalize => &config.canonical_extension,
            Mode::Encode(_) => &config.binary_extension,
        }
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct Summary {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Convert `input` (a file, or a directory of files with the mode's input
/// extension) into `output_dir`.
///
/// A file that fails to convert is reported and skipped; the rest of the
/// batch still runs.
pub fn run(input: &Path, output_dir: &Path, mode: Mode, config: &Config) -> Result<Summary> {
    let inputs = collect_inputs(input, mode.input_extension(config), config.recursive)?;
    if inputs.is_empty() {
        log::warn!("no input files found in {}", input.display());
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let mut summary = Summary::default();
    for path in inputs {
        match convert_file(input, &path, output_dir, mode, config) {
            Ok(out) => {
                log::info!("converted {} -> {}", path.display(), out.display());
                summary.converted.push(path);
            }
            Err(err) => {
                log::error!("error converting {}: {:#}", path.display(), err);
                summary.failed.push((path, err));
            }
        }
    }
    Ok(summary)
}

/// Files to convert. A file input is taken as is; a directory is walked for
/// files with extension `ext`, sorted by path.
pub fn collect_inputs(input: &Path, ext: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut walker = WalkDir::new(input).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_entry(|e| !ignored(e)) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(OsStr::to_str) == Some(ext) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Hidden files and directories below the input root.
fn ignored(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

/// Convert a single file found under `root`. The output keeps the file's
/// path relative to `root` and is only written if the whole file converted
/// successfully.
pub fn convert_file(
    root: &Path,
    input: &Path,
    output_dir: &Path,
    mode: Mode,
    config: &Config,
) -> Result<PathBuf> {
    let contents =
        fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;

    let output: Vec<u8> = match mode {
        Mode::Canonicalize => converter(config).to_canonical(&contents)?.into_bytes(),
        Mode::Encode(InputFormat::Raw) => converter(config).to_binary(&contents)?,
        Mode::Encode(InputFormat::Canonical) => canonical_to_binary(&contents)?,
    };

    let out_path = output_path(root, input, output_dir, mode.output_extension(config))?;
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    fs::write(&out_path, output).with_context(|| format!("writing {}", out_path.display()))?;
    Ok(out_path)
}

/// A converter with fresh per-file state.
fn converter(config: &Config) -> TraceConverter<RandomValues> {
    let values = match config.seed {
        Some(seed) => RandomValues::seeded(seed),
        None => RandomValues::from_entropy(),
    };
    TraceConverter::with_source(config.lock_ids.into(), config.values.into(), values)
}

/// Where the conversion of `input` goes: its path relative to `root`, under
/// `output_dir`, with the last extension replaced by `ext`. A file given
/// directly as the root lands at the top of `output_dir`.
fn output_path(root: &Path, input: &Path, output_dir: &Path, ext: &str) -> Result<PathBuf> {
    let rel = match input.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel,
        _ => input
            .file_name()
            .map(Path::new)
            .with_context(|| format!("no file name in {}", input.display()))?,
    };
    let stem = rel
        .file_stem()
        .with_context(|| format!("no file name in {}", input.display()))?;
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(ext);
    Ok(output_dir.join(rel.with_file_name(name)))
}

/// Write a decoded listing of the binary trace at `path` to `out`.
///
/// Words with unknown kinds are listed and counted. A truncated or
/// unreadable stream is an error, reported after everything decoded before
/// it has been written.
pub fn print_binary(path: &Path, out: &mut impl Write) -> Result<usize> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let listing = describe_binary(BufReader::new(file));
    out.write_all(listing.text.as_bytes())?;

    if listing.unknown > 0 {
        log::warn!(
            "{} of {} words in {} have an unknown event kind",
            listing.unknown,
            listing.words,
            path.display()
        );
    }
    match listing.error {
        Some(err) => Err(anyhow::Error::new(err).context(format!("decoding {}", path.display()))),
        None => Ok(listing.words),
    }
}
