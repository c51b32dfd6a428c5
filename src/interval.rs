//! Core interval types for genomic region validation.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// Validation discipline applied at construction and mutation time.
///
/// `Strict` fails on the first invariant violation. `Accumulate` records
/// every violation on the value itself and keeps going, so one pass over a
/// file can surface all of its defects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    #[default]
    Strict,
    Accumulate,
}

/// Errors raised by interval construction and mutation in strict mode.
#[derive(Error, Debug, PartialEq)]
pub enum IntervalError {
    #[error("{value} was given where an integer belongs")]
    NotInteger { value: String },

    #[error("Valid strand values include +, -, and . only. {value} is not a valid strand value.")]
    InvalidStrand { value: String },

    #[error("Start value of {start} is less than zero")]
    NegativeStart { start: i64 },

    #[error("Given start value for interval of {start} that was AFTER end value of {end}")]
    StartAfterEnd { start: i64, end: i64 },

    #[error("Start and end values of {start} are equal, specifying an interval of no length.")]
    ZeroLength { start: i64 },
}

pub type Result<T> = std::result::Result<T, IntervalError>;

/// Strand orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Strand {
    Plus,
    Minus,
    #[default]
    Unknown,
}

impl Strand {
    /// Parse a strand column value. The literal `+/-` found in older BED
    /// files normalizes to `.`; anything outside `+`, `-`, `.` is invalid.
    pub fn parse(text: &str) -> Option<Strand> {
        match text {
            "+" => Some(Strand::Plus),
            "-" => Some(Strand::Minus),
            "." | "+/-" => Some(Strand::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
            Strand::Unknown => write!(f, "."),
        }
    }
}

/// A genomic interval in 0-based, half-open coordinates (BED convention):
/// start is included, end is not.
///
/// Coordinates are signed so that accumulate-mode values can retain the
/// out-of-range numbers they were built from; the recorded errors describe
/// what was wrong with them.
#[derive(Debug, Clone)]
pub struct Interval {
    contig: String,
    start: i64,
    end: i64,
    strand: Strand,
    errors: Vec<String>,
    mode: ValidationMode,
}

impl Interval {
    /// Build an interval from typed coordinates.
    pub fn new(
        contig: impl Into<String>,
        start: i64,
        end: i64,
        strand: Strand,
        mode: ValidationMode,
    ) -> Result<Self> {
        let mut interval = Self {
            contig: contig.into(),
            start,
            end,
            strand,
            errors: Vec::new(),
            mode,
        };
        interval.check_start_base(start)?;
        interval.check_relative_positions(start, end)?;
        Ok(interval)
    }

    /// Build an interval from raw text fields, the entry point parsers use.
    /// Field text is validated here: non-integer coordinates and unknown
    /// strand values are violations in their own right.
    pub fn from_text(
        contig: &str,
        start: &str,
        end: &str,
        strand: &str,
        mode: ValidationMode,
    ) -> Result<Self> {
        let mut interval = Self {
            contig: contig.to_string(),
            start: 0,
            end: 0,
            strand: Strand::Unknown,
            errors: Vec::new(),
            mode,
        };
        interval.start = interval.check_int(start)?;
        interval.end = interval.check_int(end)?;
        match Strand::parse(strand) {
            Some(parsed) => interval.strand = parsed,
            None => interval.record(IntervalError::InvalidStrand {
                value: strand.to_string(),
            })?,
        }
        interval.check_start_base(interval.start)?;
        interval.check_relative_positions(interval.start, interval.end)?;
        Ok(interval)
    }

    /// Route one violation according to the validation mode: strict mode
    /// returns it, accumulate mode records its message and carries on.
    fn record(&mut self, error: IntervalError) -> Result<()> {
        match self.mode {
            ValidationMode::Strict => Err(error),
            ValidationMode::Accumulate => {
                self.errors.push(error.to_string());
                Ok(())
            }
        }
    }

    fn check_int(&mut self, text: &str) -> Result<i64> {
        match text.trim().parse::<i64>() {
            Ok(value) => Ok(value),
            Err(_) => {
                self.record(IntervalError::NotInteger {
                    value: text.to_string(),
                })?;
                Ok(0)
            }
        }
    }

    fn check_start_base(&mut self, start: i64) -> Result<()> {
        if start < 0 {
            self.record(IntervalError::NegativeStart { start })?;
        }
        Ok(())
    }

    fn check_relative_positions(&mut self, start: i64, end: i64) -> Result<()> {
        if end < start {
            self.record(IntervalError::StartAfterEnd { start, end })?;
        }
        if start == end {
            self.record(IntervalError::ZeroLength { start })?;
        }
        Ok(())
    }

    #[inline]
    pub fn contig(&self) -> &str {
        &self.contig
    }

    #[inline]
    pub fn start(&self) -> i64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> i64 {
        self.end
    }

    #[inline]
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Violations recorded under accumulate mode, in the order found.
    #[inline]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    #[inline]
    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Replace the start, re-validating it against the current end.
    pub fn set_start(&mut self, start: i64) -> Result<()> {
        self.check_relative_positions(start, self.end)?;
        self.check_start_base(start)?;
        self.start = start;
        Ok(())
    }

    /// Replace the end, re-validating it against the current start.
    pub fn set_end(&mut self, end: i64) -> Result<()> {
        self.check_relative_positions(self.start, end)?;
        self.end = end;
        Ok(())
    }

    /// Replace the strand from its text form. An unknown value is a
    /// violation and leaves the current strand in place.
    pub fn set_strand(&mut self, strand: &str) -> Result<()> {
        match Strand::parse(strand) {
            Some(parsed) => {
                self.strand = parsed;
                Ok(())
            }
            None => self.record(IntervalError::InvalidStrand {
                value: strand.to_string(),
            }),
        }
    }

    /// The last base the interval covers: `end - 1`, since end is exclusive.
    #[inline]
    pub fn last_included_base(&self) -> i64 {
        self.end - 1
    }

    /// Number of bases covered.
    #[inline]
    pub fn length(&self) -> i64 {
        self.end - self.start
    }

    /// True when both intervals sit on the same contig and their closed
    /// base ranges share at least one base.
    #[inline]
    pub fn overlaps(&self, other: &Interval) -> bool {
        if self.contig != other.contig {
            return false;
        }
        if other.last_included_base() < self.start {
            return false;
        }
        if self.last_included_base() < other.start {
            return false;
        }
        true
    }

    /// True when this interval fully encloses the other on the same contig.
    #[inline]
    pub fn contains(&self, other: &Interval) -> bool {
        self.contig == other.contig
            && self.start <= other.start
            && self.last_included_base() >= other.last_included_base()
    }

    /// True when the other interval fully encloses this one.
    #[inline]
    pub fn contained_by(&self, other: &Interval) -> bool {
        other.contains(self)
    }

    fn sort_key(&self) -> (&str, i64, i64, Strand) {
        (&self.contig, self.start, self.end, self.strand)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)?;
        match self.strand {
            Strand::Plus | Strand::Minus => write!(f, "{}", self.strand),
            Strand::Unknown => Ok(()),
        }
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for Interval {}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
