//! Parser for byte-offset FASTA index records (`.fai` format).
//!
//! Five tab-separated columns per contig: name, total bases, byte offset of
//! the first sequence byte, bases per line, bytes per line.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading a byte-offset index.
#[derive(Error, Debug)]
pub enum FaidxError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unable to find file {}", .0.display())]
    NotFound(PathBuf),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, FaidxError>;

/// One byte-offset index record.
///
/// `line_bytes` counts the line terminator, `line_bases` does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaidxRecord {
    pub contig: String,
    pub base_length: u64,
    pub start_byte: u64,
    pub line_bases: u64,
    pub line_bytes: u64,
}

impl FaidxRecord {
    /// Parse one index line. `line_number` is 1-based and only used for
    /// diagnostics.
    pub fn from_line(line: &str, line_number: usize) -> Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 5 {
            return Err(FaidxError::Parse {
                line: line_number,
                message: format!("Expected 5 tab-separated fields, got {}", fields.len()),
            });
        }
        Ok(Self {
            contig: fields[0].to_string(),
            base_length: parse_field(fields[1], "total base count", line_number)?,
            start_byte: parse_field(fields[2], "start byte offset", line_number)?,
            line_bases: parse_field(fields[3], "bases per line", line_number)?,
            line_bytes: parse_field(fields[4], "bytes per line", line_number)?,
        })
    }

    /// Bytes spanned by the contig's sequence: all full lines plus the
    /// remainder of the last line without its terminator.
    pub fn byte_length(&self) -> u64 {
        if self.line_bases == 0 {
            return 0;
        }
        let full_lines = self.base_length / self.line_bases;
        let last_line_bases = self.base_length % self.line_bases;
        full_lines * self.line_bytes + last_line_bases
    }
}

fn parse_field(value: &str, field: &str, line: usize) -> Result<u64> {
    value.parse().map_err(|_| FaidxError::Parse {
        line,
        message: format!("Invalid {}: {}", field, value),
    })
}

/// Parse every index record from a readable source, skipping blank lines.
pub fn parse_faidx<R: Read>(reader: R) -> Result<Vec<FaidxRecord>> {
    let reader = BufReader::new(reader);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        records.push(FaidxRecord::from_line(line, line_num + 1)?);
    }

    Ok(records)
}

/// Read all index records from a file.
pub fn read_faidx_file<P: AsRef<Path>>(path: P) -> Result<Vec<FaidxRecord>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(FaidxError::NotFound(path.to_path_buf()));
    }
    parse_faidx(File::open(path)?)
}
