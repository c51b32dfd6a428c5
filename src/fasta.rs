//! Streaming FASTA analyzer.
//!
//! A single forward pass reconstructs, per contig, the same byte-offset
//! index record an external indexer would emit plus a dictionary record
//! carrying the MD5 of the stripped sequence. This is the fallback path
//! used when no indexing tool is installed.

use crate::dict::DictRecord;
use crate::faidx::FaidxRecord;
use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Errors raised while analyzing a FASTA file.
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unable to find file {}", .0.display())]
    NotFound(PathBuf),

    #[error("First FASTA line should start with a '>' character. First line: {line}")]
    NotFasta { line: String },

    #[error("FASTA contained no contig headers")]
    NoContigs,

    #[error("Unable to extract contig name from FASTA header line: {line}")]
    EmptyContigName { line: String },

    #[error("Found inconsistent line lengths in contig {contig}")]
    InconsistentLineLengths { contig: String },
}

pub type Result<T> = std::result::Result<T, FastaError>;

/// Per-contig running state. Widths are fixed by the first sequence line;
/// a later line with different widths is tolerated once, since only the
/// final line of a contig may be short.
struct ContigAccumulator {
    contig: String,
    start_byte: u64,
    base_length: u64,
    byte_length: u64,
    line_bases: u64,
    line_bytes: u64,
    widths_established: bool,
    inconsistent: bool,
    hasher: Md5,
}

impl ContigAccumulator {
    fn new(contig: String, start_byte: u64) -> Self {
        Self {
            contig,
            start_byte,
            base_length: 0,
            byte_length: 0,
            line_bases: 0,
            line_bytes: 0,
            widths_established: false,
            inconsistent: false,
            hasher: Md5::new(),
        }
    }

    fn add_sequence_line(&mut self, stripped: &str, raw_bytes: u64) -> Result<()> {
        if self.inconsistent {
            // a previous line already deviated and was not the last
            return Err(FastaError::InconsistentLineLengths {
                contig: self.contig.clone(),
            });
        }
        let bases = stripped.len() as u64;
        if !self.widths_established {
            self.line_bases = bases;
            self.line_bytes = raw_bytes;
            self.widths_established = true;
        } else if bases != self.line_bases || raw_bytes != self.line_bytes {
            self.inconsistent = true;
        }
        self.base_length += bases;
        self.byte_length += raw_bytes;
        self.hasher.update(stripped.as_bytes());
        Ok(())
    }

    fn finish(self, uri: &str) -> (FaidxRecord, DictRecord) {
        let index = FaidxRecord {
            contig: self.contig.clone(),
            base_length: self.base_length,
            start_byte: self.start_byte,
            line_bases: self.line_bases,
            line_bytes: self.line_bytes,
        };
        let dict = DictRecord {
            contig: self.contig,
            byte_length: self.byte_length,
            md5: format!("{:x}", self.hasher.finalize()),
            uri: uri.to_string(),
        };
        (index, dict)
    }
}

fn contig_from_header(line: &str) -> Result<String> {
    let name = line[1..].split_whitespace().next().unwrap_or("");
    if name.is_empty() {
        return Err(FastaError::EmptyContigName {
            line: line.to_string(),
        });
    }
    Ok(name.to_string())
}

/// Analyze FASTA text from any buffered reader. `uri` is recorded verbatim
/// on every dictionary record.
pub fn analyze_reader<R: BufRead>(
    mut reader: R,
    uri: &str,
) -> Result<(Vec<FaidxRecord>, Vec<DictRecord>)> {
    let mut index_records = Vec::new();
    let mut dict_records = Vec::new();
    let mut current: Option<ContigAccumulator> = None;
    let mut position: u64 = 0;
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            break;
        }
        position += bytes_read as u64;

        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }

        if stripped.starts_with('>') {
            if let Some(done) = current.take() {
                let (index, dict) = done.finish(uri);
                index_records.push(index);
                dict_records.push(dict);
            }
            let contig = contig_from_header(stripped)?;
            // sequence starts at the byte after the header line
            current = Some(ContigAccumulator::new(contig, position));
            continue;
        }

        match current.as_mut() {
            Some(accumulator) => accumulator.add_sequence_line(stripped, bytes_read as u64)?,
            None => {
                return Err(FastaError::NotFasta {
                    line: stripped.to_string(),
                })
            }
        }
    }

    match current {
        Some(done) => {
            let (index, dict) = done.finish(uri);
            index_records.push(index);
            dict_records.push(dict);
        }
        None => return Err(FastaError::NoContigs),
    }

    Ok((index_records, dict_records))
}

/// Analyze a FASTA file, producing one index record and one dictionary
/// record per contig in first-appearance order.
pub fn analyze_fasta<P: AsRef<Path>>(path: P) -> Result<(Vec<FaidxRecord>, Vec<DictRecord>)> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(FastaError::NotFound(path.to_path_buf()));
    }
    let uri = file_uri(path)?;
    let file = File::open(path)?;
    analyze_reader(BufReader::new(file), &uri)
}

/// `file://` URI for the absolute form of a path.
fn file_uri(path: &Path) -> io::Result<String> {
    let absolute = std::path::absolute(path)?;
    Ok(match Url::from_file_path(&absolute) {
        Ok(url) => url.to_string(),
        Err(()) => String::new(),
    })
}
