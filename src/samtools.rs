//! External samtools integration.
//!
//! The validator prefers samtools for producing the `.fai` index and
//! `.dict` dictionary so its inputs match what downstream pipelines will
//! see. [`SamtoolsRunner`] wraps the executable; the [`FastaIndexer`]
//! trait is the seam that lets the orchestration swap in other index
//! producers.

use crate::gzip::is_gzipped;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// Errors from locating or running the external indexer.
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("Unable to find input file at {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Unable to find expected Samtools executable at {}", .0.display())]
    SamtoolsMissing(PathBuf),

    #[error("Samtools {command} returned a non-zero exit status")]
    NonZeroExit { command: String },
}

pub type Result<T> = std::result::Result<T, IndexerError>;

/// Produces the byte-offset index and sequence dictionary for a FASTA
/// file, writing both next to the file itself.
pub trait FastaIndexer {
    /// Write `<fasta>.fai` and return its path.
    fn index_fasta(&self, fasta: &Path, force_reindex: bool) -> Result<PathBuf>;

    /// Write `<fasta>.dict` and return its path.
    fn make_dictionary(&self, fasta: &Path, force_reindex: bool) -> Result<PathBuf>;
}

const COMMON_SAMTOOLS_PATHS: [&str; 2] = ["/usr/bin/samtools", "/opt/conda/bin/samtools"];

/// Runs a local samtools executable. Gzipped FASTA input is inflated in
/// process and streamed over stdin, so samtools only ever sees plain
/// text.
#[derive(Debug)]
pub struct SamtoolsRunner {
    path: PathBuf,
}

impl SamtoolsRunner {
    /// Use the executable at an explicit path.
    pub fn at_path(path: impl Into<PathBuf>) -> Result<SamtoolsRunner> {
        let path = path.into();
        if !path.is_file() {
            return Err(IndexerError::SamtoolsMissing(path));
        }
        Ok(SamtoolsRunner { path })
    }

    /// Search `which samtools` and then the usual install locations.
    pub fn locate() -> Option<SamtoolsRunner> {
        if let Ok(output) = Command::new("which").arg("samtools").output() {
            if output.status.success() {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !found.is_empty() && Path::new(&found).is_file() {
                    return Some(SamtoolsRunner {
                        path: PathBuf::from(found),
                    });
                }
            }
        }
        COMMON_SAMTOOLS_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.is_file())
            .map(|path| SamtoolsRunner { path })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn run(&self, mut command: Command, label: &str, gzipped_input: Option<&Path>) -> Result<()> {
        let status = match gzipped_input {
            None => command.status()?,
            Some(input) => {
                let file = File::open(input)?;
                command.stdin(Stdio::piped());
                let mut child = command.spawn()?;
                let streamed = match child.stdin.take() {
                    Some(mut stdin) => {
                        let mut decoder = MultiGzDecoder::new(file);
                        io::copy(&mut decoder, &mut stdin).map(|_| ())
                    }
                    None => Ok(()),
                };
                let status = child.wait()?;
                if status.success() {
                    // Only surface stream errors when samtools itself
                    // succeeded; a failed child closes the pipe early.
                    streamed?;
                }
                status
            }
        };
        if !status.success() {
            return Err(IndexerError::NonZeroExit {
                command: label.to_string(),
            });
        }
        Ok(())
    }
}

impl FastaIndexer for SamtoolsRunner {
    fn index_fasta(&self, fasta: &Path, force_reindex: bool) -> Result<PathBuf> {
        if !fasta.is_file() {
            return Err(IndexerError::InputNotFound(fasta.to_path_buf()));
        }
        let output = sibling_output(fasta, ".fai")?;
        if reusable(&output, force_reindex)? {
            tracing::info!(
                "FASTA index already exists at {}. Not set to reindex, so using existing file.",
                output.display()
            );
            return Ok(output);
        }

        let gzipped = is_gzipped(fasta)?;
        let mut command = Command::new(&self.path);
        if gzipped {
            command.arg("faidx").arg("--fai-idx").arg(&output).arg("-");
        } else {
            command.arg("faidx").arg("-o").arg(&output).arg(fasta);
        }
        tracing::info!("Running Fasta Index: {:?}", command);
        self.run(command, "fasta index", gzipped.then_some(fasta))?;
        Ok(output)
    }

    fn make_dictionary(&self, fasta: &Path, force_reindex: bool) -> Result<PathBuf> {
        if !fasta.is_file() {
            return Err(IndexerError::InputNotFound(fasta.to_path_buf()));
        }
        let output = sibling_output(fasta, ".dict")?;
        if reusable(&output, force_reindex)? {
            tracing::info!(
                "FASTA dictionary already exists at {}. Not set to reindex, so using existing file.",
                output.display()
            );
            return Ok(output);
        }

        let gzipped = is_gzipped(fasta)?;
        let mut command = Command::new(&self.path);
        command.arg("dict").arg("-o").arg(&output);
        if gzipped {
            command.arg("-");
        } else {
            command.arg(fasta);
        }
        tracing::info!("Running Fasta Dictionary: {:?}", command);
        self.run(command, "fasta dict", gzipped.then_some(fasta))?;
        Ok(output)
    }
}

/// Absolute path of `fasta` with `extension` appended to the full file
/// name, `ref.fa` becoming `ref.fa.fai`.
fn sibling_output(fasta: &Path, extension: &str) -> io::Result<PathBuf> {
    let mut absolute = std::path::absolute(fasta)?.into_os_string();
    absolute.push(extension);
    Ok(PathBuf::from(absolute))
}

/// An existing, non-empty output can be reused unless a reindex was
/// requested.
fn reusable(output: &Path, force_reindex: bool) -> io::Result<bool> {
    if force_reindex || !output.is_file() {
        return Ok(false);
    }
    Ok(std::fs::metadata(output)?.len() > 0)
}
