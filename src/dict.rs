//! Parser for sequence dictionary records (`.dict` format).
//!
//! A dictionary is a SAM-style header file; only `@SQ` lines carry contig
//! records. Fields are tab-separated `tag:value` pairs in a fixed order
//! (SN, LN, M5, optional UR) and the three-character tag prefix is stripped
//! positionally.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

const RECORD_MARKER: &str = "@SQ";

/// Errors that can occur while reading a sequence dictionary.
#[derive(Error, Debug)]
pub enum DictError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unable to find file {}", .0.display())]
    NotFound(PathBuf),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, DictError>;

/// One sequence dictionary record: a contig paired with its length, the MD5
/// of its whitespace-stripped sequence, and a source locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictRecord {
    pub contig: String,
    pub byte_length: u64,
    pub md5: String,
    pub uri: String,
}

impl DictRecord {
    /// Parse one `@SQ` line. `line_number` is 1-based and only used for
    /// diagnostics.
    pub fn from_line(line: &str, line_number: usize) -> Result<Self> {
        let values: Vec<&str> = line
            .split('\t')
            .skip(1) // the @SQ marker itself
            .map(strip_tag_prefix)
            .collect();

        let (contig, length, md5, uri) = match values.as_slice() {
            [contig, length, md5] => (*contig, *length, *md5, ""),
            [contig, length, md5, uri] => (*contig, *length, *md5, *uri),
            _ => {
                return Err(DictError::Parse {
                    line: line_number,
                    message: format!(
                        "Expected 3 or 4 tag:value fields after {}, got {}",
                        RECORD_MARKER,
                        values.len()
                    ),
                })
            }
        };

        let byte_length = length.parse().map_err(|_| DictError::Parse {
            line: line_number,
            message: format!("Invalid contig length: {}", length),
        })?;

        Ok(Self {
            contig: contig.to_string(),
            byte_length,
            md5: md5.to_string(),
            uri: uri.to_string(),
        })
    }
}

/// Drop the fixed three-character `tag:` prefix from one field.
fn strip_tag_prefix(field: &str) -> &str {
    field.get(3..).unwrap_or("")
}

/// Parse every `@SQ` record from a readable source. Other header lines
/// (`@HD`, `@PG`, ...) and blank lines are skipped.
pub fn parse_dict<R: Read>(reader: R) -> Result<Vec<DictRecord>> {
    let reader = BufReader::new(reader);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let line = line.trim();
        if line.is_empty() || !line.starts_with(RECORD_MARKER) {
            continue;
        }
        records.push(DictRecord::from_line(line, line_num + 1)?);
    }

    Ok(records)
}

/// Read all dictionary records from a file.
pub fn read_dict_file<P: AsRef<Path>>(path: P) -> Result<Vec<DictRecord>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(DictError::NotFound(path.to_path_buf()));
    }
    parse_dict(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_sq_line_without_uri() {
        let records = parse_dict("@SQ\tSN:chr1\tLN:100\tM5:abc123\n".as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].contig, "chr1");
        assert_eq!(records[0].byte_length, 100);
        assert_eq!(records[0].md5, "abc123");
        assert_eq!(records[0].uri, "");
    }

    #[test]
    fn test_parse_sq_line_with_uri() {
        let content = "@SQ\tSN:chrM\tLN:16569\tM5:c68f52674c9fb33aef52dcf399755519\tUR:file:///data/ref.fa\n";
        let records = parse_dict(content.as_bytes()).unwrap();

        assert_eq!(records[0].contig, "chrM");
        assert_eq!(records[0].uri, "file:///data/ref.fa");
    }

    #[test]
    fn test_non_sq_lines_are_skipped() {
        let content = "@HD\tVN:1.6\tSO:unsorted\n@SQ\tSN:chr1\tLN:50\tM5:aa\n@PG\tID:samtools\n";
        let records = parse_dict(content.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].contig, "chr1");
    }

    #[test]
    fn test_wrong_field_count() {
        let error = parse_dict("@SQ\tSN:chr1\tLN:50\n".as_bytes()).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("Expected 3 or 4 tag:value fields"), "{}", message);
    }

    #[test]
    fn test_non_numeric_length() {
        let error = parse_dict("@SQ\tSN:chr1\tLN:long\tM5:aa\n".as_bytes()).unwrap_err();
        assert!(error.to_string().contains("Invalid contig length: long"));
    }

    #[test]
    fn test_read_dict_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "@HD\tVN:1.6").unwrap();
        writeln!(file, "@SQ\tSN:chr1\tLN:248956422\tM5:2648ae1bacce4ec4b6cf337dcae37816").unwrap();
        file.flush().unwrap();

        let records = read_dict_file(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].byte_length, 248956422);
    }

    #[test]
    fn test_read_dict_file_not_found() {
        let result = read_dict_file("/no/such/ref.dict");
        assert!(matches!(result, Err(DictError::NotFound(_))));
    }
}
