//! FABRIC: FASTA and BED Reference Integrity Checker
//!
//! This library cross-validates genomic reference FASTA files against the
//! BED interval files that target them.
//!
//! # Features
//!
//! - **Accumulating validation**: Records parse per line and keep every
//!   violation instead of stopping at the first one
//! - **Samtools integration**: Index and dictionary generation through a
//!   local samtools, with a built-in streaming analyzer as the fallback
//! - **Cross checks**: Every BED interval is checked against the contigs
//!   and lengths the FASTA actually provides
//!
//! # Example
//!
//! ```rust,no_run
//! use fabric_genomics::Validator;
//! use std::path::{Path, PathBuf};
//!
//! let validator = Validator::new();
//! let report = validator.run(Path::new("ref.fa"), &[PathBuf::from("targets.bed")]);
//! println!("{}", report);
//! ```

pub mod bed;
pub mod checks;
pub mod dict;
pub mod faidx;
pub mod fasta;
pub mod gzip;
pub mod interval;
pub mod report;
pub mod samtools;
pub mod validate;

// Re-export commonly used types
pub use bed::{read_bed_file, BedFormat, BedLine, BedReader};
pub use interval::{Interval, Strand, ValidationMode};
pub use report::ValidationReport;
pub use validate::Validator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bed::{parse_bed, read_bed_file, BedFormat, BedLine, BedReader};
    pub use crate::dict::{read_dict_file, DictRecord};
    pub use crate::faidx::{read_faidx_file, FaidxRecord};
    pub use crate::fasta::analyze_fasta;
    pub use crate::interval::{Interval, Strand, ValidationMode};
    pub use crate::report::ValidationReport;
    pub use crate::samtools::{FastaIndexer, SamtoolsRunner};
    pub use crate::validate::{Validator, TEST_NAME};
}
