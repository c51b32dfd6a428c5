//! End-to-end FASTA and BED cross validation.
//!
//! [`Validator::run`] drives the whole pipeline: confirm the input files
//! exist, obtain the FASTA's byte-offset index and sequence dictionary
//! (through samtools when available, with the built-in analyzer as the
//! fallback), read every BED in accumulating mode, then record all
//! findings in a single [`ValidationReport`]. Missing or corrupt inputs
//! become criticals that stop the run; content problems in readable
//! inputs become errors and the run continues.

use crate::bed;
use crate::checks;
use crate::dict::{self, DictRecord};
use crate::faidx::{self, FaidxRecord};
use crate::fasta;
use crate::interval::ValidationMode;
use crate::report::ValidationReport;
use crate::samtools::{FastaIndexer, SamtoolsRunner};
use std::path::{Path, PathBuf};

/// Name under which findings are reported.
pub const TEST_NAME: &str = "FASTA and BED Validation";

/// Drives a full validation run.
pub struct Validator {
    indexer: Option<Box<dyn FastaIndexer>>,
    force_reindex: bool,
}

impl Validator {
    /// Use a locally discovered samtools when present, the built-in
    /// analyzer otherwise.
    pub fn new() -> Validator {
        let indexer =
            SamtoolsRunner::locate().map(|runner| Box::new(runner) as Box<dyn FastaIndexer>);
        Validator {
            indexer,
            force_reindex: false,
        }
    }

    /// Analyze the FASTA in process without consulting samtools.
    pub fn without_indexer() -> Validator {
        Validator {
            indexer: None,
            force_reindex: false,
        }
    }

    /// Use a specific external indexer.
    pub fn with_indexer(indexer: Box<dyn FastaIndexer>) -> Validator {
        Validator {
            indexer: Some(indexer),
            force_reindex: false,
        }
    }

    /// Regenerate index files even when usable ones already exist.
    pub fn force_reindex(mut self, force: bool) -> Validator {
        self.force_reindex = force;
        self
    }

    /// Validate one FASTA against any number of BED files.
    pub fn run(&self, fasta_path: &Path, bed_paths: &[PathBuf]) -> ValidationReport {
        let mut report = ValidationReport::new(TEST_NAME);
        tracing::info!("FASTA and BED cross validator | Version: {}", crate::VERSION);

        report.add_input("FASTA", fasta_path.display().to_string());
        for bed_path in bed_paths {
            report.add_input("BED", bed_path.display().to_string());
        }

        if !fasta_path.is_file() {
            report.add_critical(format!(
                "Unable to find FASTA file at {}",
                fasta_path.display()
            ));
        }
        for bed_path in bed_paths {
            if !bed_path.is_file() {
                report.add_critical(format!("Unable to find BED file at {}", bed_path.display()));
            }
        }
        if !report.passed() {
            report
                .add_critical("Stopping before further analysis due to the absence of expected files");
            return report;
        }

        let (faidx_records, dict_records) = match &self.indexer {
            Some(indexer) => {
                match self.index_and_read(indexer.as_ref(), fasta_path, &mut report) {
                    Some(records) => records,
                    None => return report,
                }
            }
            None => {
                tracing::info!(
                    "Unable to find local Samtools installation. Analyzing FASTA with local packages."
                );
                match fasta::analyze_fasta(fasta_path) {
                    Ok(records) => records,
                    Err(error) => {
                        tracing::error!("Error analyzing FASTA file at {}", fasta_path.display());
                        tracing::error!("{}", error);
                        report.add_critical(format!(
                            "Stopping before further analysis due to a corrupt or unanalyzable FASTA file at {}",
                            fasta_path.display()
                        ));
                        return report;
                    }
                }
            }
        };

        let mut bed_files = Vec::new();
        for bed_path in bed_paths {
            match bed::read_bed_file(bed_path, ValidationMode::Accumulate) {
                Ok(lines) => bed_files.push((bed_path, lines)),
                Err(error) => {
                    report.add_critical(format!(
                        "{} reading failed: {}",
                        bed_path.display(),
                        error
                    ));
                }
            }
        }

        let fasta_source = fasta_path.display().to_string();
        let fasta_errors = checks::validate_fasta(&faidx_records, &dict_records);
        report.add_errors(checks::prefix_with_source(&fasta_source, fasta_errors));

        for (bed_path, lines) in &bed_files {
            let source = bed_path.display().to_string();
            let bed_errors = checks::validate_bed(lines);
            let crosscheck_errors = checks::crosscheck_intervals(lines, &faidx_records);
            report.add_errors(checks::prefix_with_source(&source, bed_errors));
            report.add_errors(checks::prefix_with_source(&source, crosscheck_errors));
        }
        report
    }

    /// Produce index and dictionary through the external indexer and
    /// parse both. Any failure records its critical, then the stopping
    /// critical, and aborts the run.
    fn index_and_read(
        &self,
        indexer: &dyn FastaIndexer,
        fasta_path: &Path,
        report: &mut ValidationReport,
    ) -> Option<(Vec<FaidxRecord>, Vec<DictRecord>)> {
        let faidx_path = match indexer.index_fasta(fasta_path, self.force_reindex) {
            Ok(path) => Some(path),
            Err(error) => {
                tracing::error!("{}", error);
                report.add_critical(format!(
                    "Unable to index FASTA file at {}",
                    fasta_path.display()
                ));
                None
            }
        };
        let dict_path = match indexer.make_dictionary(fasta_path, self.force_reindex) {
            Ok(path) => Some(path),
            Err(error) => {
                tracing::error!("{}", error);
                report.add_critical(format!(
                    "Unable to make a dictionary from FASTA file at {}",
                    fasta_path.display()
                ));
                None
            }
        };
        let (Some(faidx_path), Some(dict_path)) = (faidx_path, dict_path) else {
            report.add_critical(stopping_unreadable(fasta_path));
            return None;
        };

        tracing::info!("Initial processing of FASTA file was successful. Starting validations.");

        let faidx_records = match faidx::read_faidx_file(&faidx_path) {
            Ok(records) => records,
            Err(error) => {
                tracing::error!("{}", error);
                report.add_critical(stopping_unreadable(fasta_path));
                return None;
            }
        };
        let dict_records = match dict::read_dict_file(&dict_path) {
            Ok(records) => records,
            Err(error) => {
                tracing::error!("{}", error);
                report.add_critical(stopping_unreadable(fasta_path));
                return None;
            }
        };
        Some((faidx_records, dict_records))
    }
}

impl Default for Validator {
    fn default() -> Validator {
        Validator::new()
    }
}

fn stopping_unreadable(fasta_path: &Path) -> String {
    format!(
        "Stopping before further analysis due to a corrupt or unreadable FASTA file at {}",
        fasta_path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_inputs_stop_the_run() {
        let dir = TempDir::new().unwrap();
        let fasta = dir.path().join("absent.fa");
        let bed = dir.path().join("absent.bed");

        let report = Validator::without_indexer().run(&fasta, &[bed.clone()]);

        assert!(!report.passed());
        let criticals = report.criticals();
        assert_eq!(criticals.len(), 3);
        assert_eq!(
            criticals[0],
            format!("Unable to find FASTA file at {}", fasta.display())
        );
        assert_eq!(
            criticals[1],
            format!("Unable to find BED file at {}", bed.display())
        );
        assert_eq!(
            criticals[2],
            "Stopping before further analysis due to the absence of expected files"
        );
        assert!(report.errors().is_empty());
    }

    #[test]
    fn test_clean_inputs_pass() {
        let dir = TempDir::new().unwrap();
        let fasta = write_file(&dir, "ref.fa", ">chr1\nACGTACGTAC\nACGTACGTAC\n>chr2\nTTTT\n");
        let bed = write_file(&dir, "targets.bed", "chr1\t0\t10\tcap1\nchr2\t1\t4\tcap2\n");

        let report = Validator::without_indexer().run(&fasta, &[bed]);

        assert!(report.passed(), "{:?}", report.errors());
        assert_eq!(report.inputs()["FASTA"].len(), 1);
        assert_eq!(report.inputs()["BED"].len(), 1);
    }

    #[test]
    fn test_unanalyzable_fasta_is_critical() {
        let dir = TempDir::new().unwrap();
        let fasta = write_file(&dir, "broken.fa", "ACGT\n>chr1\nACGT\n");
        let bed = write_file(&dir, "targets.bed", "chr1\t0\t2\n");

        let report = Validator::without_indexer().run(&fasta, &[bed]);

        assert_eq!(report.criticals().len(), 1);
        assert_eq!(
            report.criticals()[0],
            format!(
                "Stopping before further analysis due to a corrupt or unanalyzable FASTA file at {}",
                fasta.display()
            )
        );
    }

    #[test]
    fn test_unreadable_bed_is_critical_but_run_continues() {
        let dir = TempDir::new().unwrap();
        let fasta = write_file(&dir, "ref.fa", ">chr1\nACGT\n");
        let empty = write_file(&dir, "empty.bed", "# nothing here\n");
        let good = write_file(&dir, "good.bed", "chr1\t0\t4\tcap\n");

        let report = Validator::without_indexer().run(&fasta, &[empty.clone(), good]);

        assert_eq!(report.criticals().len(), 1);
        assert_eq!(
            report.criticals()[0],
            format!(
                "{} reading failed: Attempted to process BED data, but got no BED lines",
                empty.display()
            )
        );
        // The readable BED was still validated and found clean.
        assert!(report.errors().is_empty());
    }

    #[test]
    fn test_findings_carry_the_source_file() {
        let dir = TempDir::new().unwrap();
        let fasta = write_file(&dir, "ref.fa", ">chr1\nACGT\n");
        let bed = write_file(&dir, "targets.bed", "chrX\t0\t4\tfloating\n");

        let report = Validator::without_indexer().run(&fasta, &[bed.clone()]);

        assert!(!report.passed());
        assert_eq!(report.errors().len(), 1);
        assert_eq!(
            report.errors()[0],
            format!(
                "{}: BED line floating tried to reference contig chrX which does not exist in the FASTA file.",
                bed.display()
            )
        );
    }
}
