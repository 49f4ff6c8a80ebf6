//! The three operations: list, flat extraction and structured extraction.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::fs;

use crate::cli::{Invocation, Operation};
use crate::encoding::{self, Codec};
use crate::error::Error;
use crate::io::{LocalFileReader, ReadAt};
use crate::zip::{ZipExtractor, ZipFileEntry};

/// Turns stored entry names into text.
#[derive(Debug, Clone, Copy)]
pub struct NameDecoder {
    codec: Codec,
    lossy: bool,
}

impl NameDecoder {
    /// With `lossy` set, a name the codec rejects falls back to its code page
    /// 437 reading instead of failing.
    pub fn new(codec: Codec, lossy: bool) -> Self {
        Self { codec, lossy }
    }

    pub fn decode(&self, entry: &ZipFileEntry) -> crate::error::Result<String> {
        // Bit 11 means the writer already stored UTF-8.
        let codec = if entry.has_utf8_name() {
            Codec::Standard(encoding_rs::UTF_8)
        } else {
            self.codec
        };

        match codec.decode(&entry.file_name_raw) {
            Err(err) if self.lossy => {
                log::warn!("{}; using the cp437 name", err);
                Ok(encoding::decode_cp437(&entry.file_name_raw))
            }
            result => result,
        }
    }
}

/// How stored paths map onto the output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Keep only the last path segment
    Flat,
    /// Recreate the stored directories
    Structured,
}

/// What to do with one entry
#[derive(Debug, PartialEq, Eq)]
pub enum Target {
    File(PathBuf),
    Directory(PathBuf),
    Skip,
}

/// Split a decoded name into path segments, refusing anything that could
/// land outside the output directory.
fn segments(name: &str) -> crate::error::Result<Vec<&str>> {
    let unsafe_path = || Error::UnsafePath(name.to_string());

    if name.starts_with(['/', '\\']) {
        return Err(unsafe_path());
    }

    let mut parts = Vec::new();
    for (i, part) in name.split(['/', '\\']).enumerate() {
        match part {
            "" | "." => continue,
            ".." => return Err(unsafe_path()),
            // Drive prefix such as "C:"
            _ if i == 0 && part.len() == 2 && part.ends_with(':') => return Err(unsafe_path()),
            _ => parts.push(part),
        }
    }
    Ok(parts)
}

/// Work out where an entry goes under `output_dir`.
///
/// `stored_directory` is what the central directory said; a decoded name
/// ending in either separator is a directory as well.
pub fn target(
    output_dir: &Path,
    name: &str,
    stored_directory: bool,
    layout: Layout,
) -> crate::error::Result<Target> {
    let parts = segments(name)?;
    let is_directory = stored_directory || name.ends_with(['/', '\\']);

    match layout {
        Layout::Flat if is_directory => Ok(Target::Skip),
        Layout::Flat => match parts.last() {
            Some(last) => Ok(Target::File(output_dir.join(last))),
            None => Err(Error::UnsafePath(name.to_string())),
        },
        Layout::Structured => {
            let path = parts
                .iter()
                .fold(output_dir.to_path_buf(), |path, part| path.join(part));
            if is_directory {
                Ok(Target::Directory(path))
            } else if parts.is_empty() {
                Err(Error::UnsafePath(name.to_string()))
            } else {
                Ok(Target::File(path))
            }
        }
    }
}

/// Cumulative share of the archive's file bytes handled so far
#[derive(Debug)]
pub struct Progress {
    total: u64,
    done: u64,
}

impl Progress {
    pub fn new(entries: &[ZipFileEntry]) -> Self {
        let total = entries
            .iter()
            .filter(|e| !e.is_directory)
            .map(|e| e.uncompressed_size)
            .sum();
        Self { total, done: 0 }
    }

    /// Count `entry` and return the new percentage
    pub fn advance(&mut self, entry: &ZipFileEntry) -> f64 {
        if !entry.is_directory {
            self.done += entry.uncompressed_size;
        }
        if self.total == 0 {
            100.0
        } else {
            self.done as f64 * 100.0 / self.total as f64
        }
    }
}

pub fn format_percent(percent: f64) -> String {
    format!("{:>6.2} %", percent)
}

/// Counts reported after an extraction
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub directories: usize,
}

/// Print every entry name in archive order.
///
/// `verbose` switches to a table with sizes, compression ratio and timestamps.
pub async fn list<R: ReadAt + 'static, W: Write>(
    extractor: &ZipExtractor<R>,
    names: &NameDecoder,
    verbose: bool,
    out: &mut W,
) -> Result<()> {
    let entries = extractor.list_files().await?;

    if verbose {
        writeln!(
            out,
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Cmpr", "Date", "Time"
        )?;
        writeln!(out, "{}", "-".repeat(70))?;
    }

    // Track totals for summary line
    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        let name = names.decode(entry)?;

        if !verbose {
            writeln!(out, "{}", name)?;
            continue;
        }

        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        writeln!(
            out,
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            name
        )?;

        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    if verbose {
        writeln!(out, "{}", "-".repeat(70))?;
        writeln!(
            out,
            "{:>10}  {:>10}  {}  {:>21}  {} files",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        )?;
    }

    Ok(())
}

/// Percentage saved by compression
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

/// Extract every entry under `output_dir`, creating it if needed.
///
/// Entries are handled in archive order; with [`Layout::Flat`] a later entry
/// replaces an earlier one with the same final name. The first failure stops
/// the extraction.
pub async fn extract<R: ReadAt + 'static, W: Write>(
    extractor: &ZipExtractor<R>,
    names: &NameDecoder,
    layout: Layout,
    output_dir: &Path,
    password: Option<&[u8]>,
    quiet: bool,
    out: &mut W,
) -> Result<ExtractSummary> {
    let entries = extractor.list_files().await?;

    fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Cannot create output directory {}", output_dir.display()))?;

    let mut progress = Progress::new(&entries);
    let mut summary = ExtractSummary::default();

    for entry in &entries {
        let name = names.decode(entry)?;
        let target = target(output_dir, &name, entry.is_directory, layout)?;
        let percent = progress.advance(entry);

        log::debug!(
            "{}: method {}, encrypted {}, {} -> {} bytes",
            name,
            entry.compression_method.as_u16(),
            entry.is_encrypted(),
            entry.compressed_size,
            entry.uncompressed_size
        );

        match target {
            Target::Skip => {
                if !quiet {
                    writeln!(out, "{} {}", format_percent(percent), output_dir.display())?;
                }
            }
            Target::Directory(path) => {
                if !quiet {
                    writeln!(out, "{} {}", format_percent(percent), path.display())?;
                }
                fs::create_dir_all(&path)
                    .await
                    .with_context(|| format!("Cannot create directory {}", path.display()))?;
                summary.directories += 1;
            }
            Target::File(path) => {
                if !quiet {
                    writeln!(out, "{} {}", format_percent(percent), path.display())?;
                }
                extractor
                    .extract_to_file(entry, &name, password, &path)
                    .await?;
                summary.files += 1;
            }
        }
    }

    log::debug!(
        "extracted {} files and {} directories into {}",
        summary.files,
        summary.directories,
        output_dir.display()
    );
    Ok(summary)
}

/// Open the archive named by `invocation` and run its operation, writing
/// listings and progress to stdout.
pub async fn run(invocation: &Invocation) -> Result<()> {
    let reader = Arc::new(LocalFileReader::new(&invocation.archive)?);
    let extractor = ZipExtractor::new(reader);
    let names = NameDecoder::new(invocation.codec, invocation.ignore_encoding_errors);
    let mut stdout = std::io::stdout();

    let layout = match invocation.operation {
        Operation::List => {
            return list(&extractor, &names, invocation.verbose, &mut stdout)
                .await
                .with_context(|| format!("Cannot list {}", invocation.archive.display()));
        }
        Operation::ExtractFlat => Layout::Flat,
        Operation::ExtractStructured => Layout::Structured,
    };

    let Some(output_dir) = invocation.output_dir.as_deref() else {
        return Err(Error::Usage("OUTPUTDIR is required for operations 'e' and 'x'".to_string()).into());
    };

    extract(
        &extractor,
        &names,
        layout,
        output_dir,
        invocation.password.as_deref(),
        invocation.quiet,
        &mut stdout,
    )
    .await
    .with_context(|| format!("Cannot extract {}", invocation.archive.display()))?;

    Ok(())
}
