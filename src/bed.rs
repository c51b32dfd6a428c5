//! Streaming BED file parser.
//!
//! The column count of the first data line fixes the file's format; every
//! later line must match it exactly. Lines are validated as they are read,
//! either failing fast or accumulating violations per record depending on
//! the [`ValidationMode`] the reader was built with.

use crate::interval::{Interval, IntervalError, Strand, ValidationMode};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during BED parsing.
#[derive(Error, Debug)]
pub enum BedError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unable to find file {}", .0.display())]
    NotFound(PathBuf),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid BED format: {0}")]
    InvalidFormat(String),

    #[error("Attempted to process BED data, but got no BED lines")]
    Empty,
}

pub type Result<T> = std::result::Result<T, BedError>;

/// Field-level failures raised while building a single [`BedLine`].
#[derive(Error, Debug, PartialEq)]
pub enum BedLineError {
    #[error(transparent)]
    Interval(#[from] IntervalError),

    #[error("Score value of {value} does not appear to be a number.")]
    ScoreNotNumeric { value: String },

    #[error("Score value was {score}, but should be between 0 and 1000")]
    ScoreOutOfRange { score: f64 },

    #[error("Block count value of {value} does not appear to be an integer.")]
    BlockCountNotInteger { value: String },

    #[error("Block count value of {count} is less than zero.")]
    NegativeBlockCount { count: i64 },
}

/// The BED column-count variants this tool accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BedFormat {
    Bed3,
    Bed4,
    Bed6,
    Bed12,
}

impl BedFormat {
    pub const VALID_COLUMN_COUNTS: [usize; 4] = [3, 4, 6, 12];

    pub fn from_column_count(count: usize) -> Option<Self> {
        match count {
            3 => Some(BedFormat::Bed3),
            4 => Some(BedFormat::Bed4),
            6 => Some(BedFormat::Bed6),
            12 => Some(BedFormat::Bed12),
            _ => None,
        }
    }

    #[inline]
    pub fn column_count(self) -> usize {
        match self {
            BedFormat::Bed3 => 3,
            BedFormat::Bed4 => 4,
            BedFormat::Bed6 => 6,
            BedFormat::Bed12 => 12,
        }
    }

    /// True when the format carries a name column.
    #[inline]
    pub fn has_name(self) -> bool {
        self.column_count() > 3
    }
}

/// One BED record: the mandatory interval plus whichever optional columns
/// the file's format carries.
#[derive(Debug, Clone)]
pub struct BedLine {
    format: BedFormat,
    interval: Interval,
    name: String,
    score: Option<f64>,
    thick: Option<Interval>,
    rgb: String,
    block_count: Option<i64>,
    block_sizes: String,
    block_starts: String,
    errors: Vec<String>,
}

impl BedLine {
    /// Build a record from the split fields of one data line. The slice
    /// length must already match the format's column count.
    pub fn from_fields(
        format: BedFormat,
        fields: &[&str],
        mode: ValidationMode,
    ) -> std::result::Result<Self, BedLineError> {
        let strand_text = if format.column_count() >= 6 {
            fields[5]
        } else {
            "."
        };
        let interval = Interval::from_text(fields[0], fields[1], fields[2], strand_text, mode)?;
        let mut line = Self {
            format,
            interval,
            name: String::new(),
            score: None,
            thick: None,
            rgb: String::new(),
            block_count: None,
            block_sizes: String::new(),
            block_starts: String::new(),
            errors: Vec::new(),
        };
        if format.has_name() {
            line.name = fields[3].to_string();
        }
        if format.column_count() >= 6 {
            line.process_score(fields[4])?;
        }
        if format == BedFormat::Bed12 {
            line.process_thick(fields[6], fields[7], mode)?;
            line.rgb = fields[8].to_string();
            line.process_block_count(fields[9])?;
            line.block_sizes = fields[10].to_string();
            line.block_starts = fields[11].to_string();
        }
        Ok(line)
    }

    fn record(&mut self, error: BedLineError) -> std::result::Result<(), BedLineError> {
        match self.interval.mode() {
            ValidationMode::Strict => Err(error),
            ValidationMode::Accumulate => {
                self.errors.push(error.to_string());
                Ok(())
            }
        }
    }

    fn process_score(&mut self, text: &str) -> std::result::Result<(), BedLineError> {
        let text = if text == "." { "0" } else { text };
        match text.parse::<f64>() {
            Ok(score) => {
                if !(0.0..=1000.0).contains(&score) {
                    self.record(BedLineError::ScoreOutOfRange { score })?;
                }
                self.score = Some(score);
            }
            Err(_) => self.record(BedLineError::ScoreNotNumeric {
                value: text.to_string(),
            })?,
        }
        Ok(())
    }

    fn process_thick(
        &mut self,
        start: &str,
        end: &str,
        mode: ValidationMode,
    ) -> std::result::Result<(), BedLineError> {
        let contig = self.interval.contig().to_string();
        let strand = self.interval.strand().to_string();
        self.thick = Some(Interval::from_text(&contig, start, end, &strand, mode)?);
        Ok(())
    }

    fn process_block_count(&mut self, text: &str) -> std::result::Result<(), BedLineError> {
        match text.trim().parse::<i64>() {
            Ok(count) => {
                if count < 0 {
                    self.record(BedLineError::NegativeBlockCount { count })?;
                }
                self.block_count = Some(count);
            }
            Err(_) => self.record(BedLineError::BlockCountNotInteger {
                value: text.to_string(),
            })?,
        }
        Ok(())
    }

    #[inline]
    pub fn format(&self) -> BedFormat {
        self.format
    }

    #[inline]
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    #[inline]
    pub fn contig(&self) -> &str {
        self.interval.contig()
    }

    #[inline]
    pub fn start(&self) -> i64 {
        self.interval.start()
    }

    #[inline]
    pub fn end(&self) -> i64 {
        self.interval.end()
    }

    #[inline]
    pub fn strand(&self) -> Strand {
        self.interval.strand()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    #[inline]
    pub fn thick(&self) -> Option<&Interval> {
        self.thick.as_ref()
    }

    #[inline]
    pub fn rgb(&self) -> &str {
        &self.rgb
    }

    #[inline]
    pub fn block_count(&self) -> Option<i64> {
        self.block_count
    }

    #[inline]
    pub fn block_sizes(&self) -> &str {
        &self.block_sizes
    }

    #[inline]
    pub fn block_starts(&self) -> &str {
        &self.block_starts
    }

    /// The name column when the format has one, else a synthesized
    /// `contig_start_end` identifier.
    pub fn effective_name(&self) -> String {
        if self.format.has_name() {
            self.name.clone()
        } else {
            format!("{}_{}_{}", self.contig(), self.start(), self.end())
        }
    }

    /// Every violation recorded on this record: its own field errors, then
    /// the interval's, then the thick interval's with a marker prefix.
    pub fn errors(&self) -> Vec<String> {
        let mut list = self.errors.clone();
        list.extend(self.interval.errors().iter().cloned());
        if let Some(thick) = &self.thick {
            list.extend(
                thick
                    .errors()
                    .iter()
                    .map(|error| format!("ThickInterval: {}", error)),
            );
        }
        list
    }

    fn sort_key(&self) -> (&Interval, &str) {
        (&self.interval, &self.name)
    }
}

impl PartialEq for BedLine {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for BedLine {}

impl Ord for BedLine {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for BedLine {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn should_skip(line: &str) -> bool {
    if line.is_empty() || line.starts_with('#') {
        return true;
    }
    let browser = line
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("browser"));
    let track = line
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("track"));
    browser || track
}

/// A streaming BED file reader.
pub struct BedReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
    mode: ValidationMode,
    format: Option<BedFormat>,
}

impl BedReader<File> {
    /// Open a BED file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P, mode: ValidationMode) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file, mode))
    }
}

impl<R: Read> BedReader<R> {
    /// Create a new BED reader from any readable source.
    pub fn new(reader: R, mode: ValidationMode) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::with_capacity(1024),
            mode,
            format: None,
        }
    }

    /// The format fixed by the first data line, once one has been read.
    #[inline]
    pub fn format(&self) -> Option<BedFormat> {
        self.format
    }

    /// Read the next BED record, skipping blank lines, `#` comments, and
    /// `browser`/`track` headers (the latter two case-insensitively).
    pub fn read_record(&mut self) -> Result<Option<BedLine>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = self.buffer.trim();
            if should_skip(trimmed) {
                continue;
            }

            // Space-delimited BED shows up in the wild. Every literal
            // space becomes a tab before splitting.
            let line = trimmed.replace(' ', "\t");
            return self.parse_line(&line).map(Some);
        }
    }

    fn parse_line(&mut self, line: &str) -> Result<BedLine> {
        let fields: Vec<&str> = line.split('\t').collect();
        let count = fields.len();

        let format = match self.format {
            Some(format) => format,
            None => {
                let format = BedFormat::from_column_count(count).ok_or_else(|| {
                    BedError::InvalidFormat(format!(
                        "This file appears to be a BED with {} elements per line, but the only valid numbers of elements per line are {:?}",
                        count,
                        BedFormat::VALID_COLUMN_COUNTS
                    ))
                })?;
                self.format = Some(format);
                format
            }
        };

        if count != format.column_count() {
            return Err(BedError::InvalidFormat(format!(
                "This BED file appears to be a BED{} format, but length {} was seen on line {}",
                format.column_count(),
                count,
                line
            )));
        }

        BedLine::from_fields(format, &fields, self.mode).map_err(|error| BedError::Parse {
            line: self.line_number,
            message: format!("{} in line: {}", error, line),
        })
    }

    /// Get an iterator over all records.
    pub fn records(self) -> BedLineIter<R> {
        BedLineIter { reader: self }
    }
}

/// Iterator over BED records.
pub struct BedLineIter<R: Read> {
    reader: BedReader<R>,
}

impl<R: Read> Iterator for BedLineIter<R> {
    type Item = Result<BedLine>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Parse every record from a readable source. A stream that yields no
/// records at all is an error: the input contained no usable intervals.
pub fn parse_bed<R: Read>(reader: R, mode: ValidationMode) -> Result<Vec<BedLine>> {
    let lines = BedReader::new(reader, mode)
        .records()
        .collect::<Result<Vec<_>>>()?;
    if lines.is_empty() {
        return Err(BedError::Empty);
    }
    Ok(lines)
}

/// Read all BED records from a file.
pub fn read_bed_file<P: AsRef<Path>>(path: P, mode: ValidationMode) -> Result<Vec<BedLine>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(BedError::NotFound(path.to_path_buf()));
    }
    parse_bed(File::open(path)?, mode)
}
