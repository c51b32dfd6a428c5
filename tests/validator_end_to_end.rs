//! End-to-end validation runs over real files on disk.
//!
//! These tests drive [`Validator::run`] the way the CLI does: inputs in a
//! temporary directory, findings collected from the returned report. The
//! external-indexer path is exercised through stub [`FastaIndexer`]
//! implementations so no samtools installation is required.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use fabric_genomics::samtools::{self, FastaIndexer, IndexerError};
use fabric_genomics::{ValidationReport, Validator};
use tempfile::TempDir;

/// Helper to drop a file into the fixture directory.
fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Helper to flatten criticals and errors into one list, in report order.
fn report_messages(report: &ValidationReport) -> Vec<String> {
    let mut all = report.criticals().to_vec();
    all.extend(report.errors().iter().cloned());
    all
}

/// Indexer stub that writes canned `.fai` and `.dict` content next to the
/// FASTA, standing in for a samtools run.
struct FileDroppingIndexer {
    fai: String,
    dict: String,
    saw_force: Rc<Cell<bool>>,
}

impl FileDroppingIndexer {
    fn new(fai: &str, dict: &str) -> FileDroppingIndexer {
        FileDroppingIndexer {
            fai: fai.to_string(),
            dict: dict.to_string(),
            saw_force: Rc::new(Cell::new(false)),
        }
    }
}

impl FastaIndexer for FileDroppingIndexer {
    fn index_fasta(&self, fasta: &Path, force_reindex: bool) -> samtools::Result<PathBuf> {
        self.saw_force.set(force_reindex);
        let path = PathBuf::from(format!("{}.fai", fasta.display()));
        fs::write(&path, &self.fai)?;
        Ok(path)
    }

    fn make_dictionary(&self, fasta: &Path, _force_reindex: bool) -> samtools::Result<PathBuf> {
        let path = PathBuf::from(format!("{}.dict", fasta.display()));
        fs::write(&path, &self.dict)?;
        Ok(path)
    }
}

/// Indexer stub that always fails like a crashed samtools.
struct FailingIndexer;

impl FastaIndexer for FailingIndexer {
    fn index_fasta(&self, _fasta: &Path, _force_reindex: bool) -> samtools::Result<PathBuf> {
        Err(IndexerError::NonZeroExit {
            command: "fasta index".to_string(),
        })
    }

    fn make_dictionary(&self, _fasta: &Path, _force_reindex: bool) -> samtools::Result<PathBuf> {
        Err(IndexerError::NonZeroExit {
            command: "fasta dict".to_string(),
        })
    }
}

// =============================================================================
// Clean inputs
// =============================================================================

#[test]
fn test_clean_inputs_produce_a_passing_report() {
    let dir = TempDir::new().unwrap();
    let fasta = write_file(
        &dir,
        "ref.fa",
        ">chr1\nACGTACGTACGTACGTACGT\n>chr2\nTTTTGGGGCCAA\n",
    );
    let capture = write_file(&dir, "capture.bed", "chr1\t0\t20\tpanel1\nchr2\t2\t12\tpanel2\n");
    let backbone = write_file(&dir, "backbone.bed", "chr1\t5\t10\n");

    let report = Validator::without_indexer().run(&fasta, &[capture, backbone]);

    assert!(report.passed(), "{:?}", report.errors());
    assert_eq!(report.error_count(), 0);
    assert_eq!(report.warning_count(), 0);
    assert_eq!(report.inputs()["FASTA"].len(), 1);
    assert_eq!(report.inputs()["BED"].len(), 2);
}

#[test]
fn test_passing_report_serializes_with_the_test_name_key() {
    let dir = TempDir::new().unwrap();
    let fasta = write_file(&dir, "ref.fa", ">chr1\nACGT\n");
    let bed = write_file(&dir, "targets.bed", "chr1\t0\t4\tall\n");

    let report = Validator::without_indexer().run(&fasta, &[bed]);
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    let body = &json["FASTA and BED Validation"];
    assert_eq!(body["Passed"], serde_json::Value::Bool(true));
    assert_eq!(body["Error Count"], serde_json::Value::from(0));
}

// =============================================================================
// Findings in readable inputs
// =============================================================================

#[test]
fn test_every_finding_class_is_reported_in_order() {
    let dir = TempDir::new().unwrap();
    let fasta = write_file(
        &dir,
        "ref.fa",
        ">chr1 primary assembly\nACGTACGTACGTACGTACGT\n>CHR1\nACGTACGTACGTACGTACGT\n",
    );
    let messy = write_file(
        &dir,
        "messy.bed",
        "chr1\t0\t10\tcapture1\n\
         chr1\t5\t15\tcapture1\n\
         chr1\t30\t25\treversed\n\
         chrX\t0\t5\tfloating\n\
         chr1\t0\t10\textra\n",
    );
    let clean = write_file(&dir, "clean.bed", "chr1\t0\t20\tokay\n");

    let report = Validator::without_indexer().run(&fasta, &[messy.clone(), clean]);

    assert!(!report.passed());
    assert!(report.criticals().is_empty());
    assert_eq!(report.warning_count(), 0);

    let fasta_name = fasta.display();
    let messy_name = messy.display();
    let expected = vec![
        format!("{}: Detected 2 contigs with names similar to chr1", fasta_name),
        format!(
            "{}: Found 2 contigs that likely have identical sequence: [\"chr1\", \"CHR1\"]",
            fasta_name
        ),
        format!(
            "{}: Line 3: Given start value for interval of 30 that was AFTER end value of 25",
            messy_name
        ),
        format!("{}: Detected 2 BED intervals with the name capture1", messy_name),
        format!(
            "{}: Detected 2 BED intervals with names similar to capture1",
            messy_name
        ),
        format!(
            "{}: Detected the interval chr1:0-10 used 2 times in the BED file.",
            messy_name
        ),
        format!(
            "{}: BED line reversed is trying to read interval chr1:30-25 which is out of its contig's bounds",
            messy_name
        ),
        format!(
            "{}: BED line floating tried to reference contig chrX which does not exist in the FASTA file.",
            messy_name
        ),
    ];
    assert_eq!(report.errors(), expected.as_slice());
}

// =============================================================================
// External indexer path
// =============================================================================

#[test]
fn test_stub_indexer_products_are_parsed_and_crosschecked() {
    let dir = TempDir::new().unwrap();
    let fasta = write_file(&dir, "ref.fa", ">chr1\nACGTACGT\n");
    let bed = write_file(&dir, "targets.bed", "chr1\t0\t8\tall\n");

    let indexer = FileDroppingIndexer::new(
        "chr1\t8\t6\t8\t9\n",
        "@HD\tVN:1.5\tSO:unsorted\n@SQ\tSN:chr1\tLN:8\tM5:cc0af3a4fedb18378b4b57b98068e69f\tUR:file:///ref.fa\n",
    );
    let report = Validator::with_indexer(Box::new(indexer)).run(&fasta, &[bed]);

    assert!(report.passed(), "{:?}", report.criticals());
    assert!(dir.path().join("ref.fa.fai").is_file());
    assert!(dir.path().join("ref.fa.dict").is_file());
}

#[test]
fn test_force_reindex_reaches_the_indexer() {
    let dir = TempDir::new().unwrap();
    let fasta = write_file(&dir, "ref.fa", ">chr1\nACGT\n");
    let bed = write_file(&dir, "targets.bed", "chr1\t0\t4\n");

    let indexer = FileDroppingIndexer::new(
        "chr1\t4\t6\t4\t5\n",
        "@SQ\tSN:chr1\tLN:4\tM5:f1f8f4bf413b16ad135722aa4591043e\n",
    );
    let saw_force = Rc::clone(&indexer.saw_force);

    let report = Validator::with_indexer(Box::new(indexer))
        .force_reindex(true)
        .run(&fasta, &[bed]);

    assert!(report.passed(), "{:?}", report.criticals());
    assert!(saw_force.get());
}

#[test]
fn test_failing_indexer_stops_the_run_with_criticals() {
    let dir = TempDir::new().unwrap();
    let fasta = write_file(&dir, "ref.fa", ">chr1\nACGT\n");
    let bed = write_file(&dir, "targets.bed", "chr1\t0\t4\n");

    let report = Validator::with_indexer(Box::new(FailingIndexer)).run(&fasta, &[bed]);

    let expected = vec![
        format!("Unable to index FASTA file at {}", fasta.display()),
        format!("Unable to make a dictionary from FASTA file at {}", fasta.display()),
        format!(
            "Stopping before further analysis due to a corrupt or unreadable FASTA file at {}",
            fasta.display()
        ),
    ];
    assert_eq!(report.criticals(), expected.as_slice());
    assert!(report.errors().is_empty());
}

#[test]
fn test_corrupt_indexer_output_stops_the_run() {
    let dir = TempDir::new().unwrap();
    let fasta = write_file(&dir, "ref.fa", ">chr1\nACGT\n");
    let bed = write_file(&dir, "targets.bed", "chr1\t0\t4\n");

    // Index content with the wrong column count cannot be parsed back.
    let indexer = FileDroppingIndexer::new("chr1\t4\n", "@SQ\tSN:chr1\tLN:4\tM5:abc\n");
    let report = Validator::with_indexer(Box::new(indexer)).run(&fasta, &[bed]);

    assert_eq!(report.criticals().len(), 1);
    assert_eq!(
        report.criticals()[0],
        format!(
            "Stopping before further analysis due to a corrupt or unreadable FASTA file at {}",
            fasta.display()
        )
    );
}

// =============================================================================
// Unusable FASTA input
// =============================================================================

#[test]
fn test_gzipped_fasta_without_an_indexer_is_critical() {
    let dir = TempDir::new().unwrap();

    let mut encoder =
        flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    std::io::Write::write_all(&mut encoder, b">chr1\nACGT\n").unwrap();
    let compressed = encoder.finish().unwrap();
    let fasta = dir.path().join("ref.fa.gz");
    fs::write(&fasta, compressed).unwrap();

    let bed = write_file(&dir, "targets.bed", "chr1\t0\t4\n");
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
fn test_unreadable_bed_is_critical_while_others_still_validate() {
    let dir = TempDir::new().unwrap();
    let fasta = write_file(&dir, "ref.fa", ">chr1\nACGTACGT\n");
    let empty = write_file(&dir, "empty.bed", "track name=empty\n# only comments\n");
    let spilling = write_file(&dir, "spilling.bed", "chr1\t0\t20\twide\n");

    let report = Validator::without_indexer().run(&fasta, &[empty.clone(), spilling.clone()]);

    let messages = report_messages(&report);
    assert_eq!(messages.len(), 2);
    assert_eq!(
        messages[0],
        format!(
            "{} reading failed: Attempted to process BED data, but got no BED lines",
            empty.display()
        )
    );
    assert_eq!(
        messages[1],
        format!(
            "{}: BED line wide is trying to read interval chr1:0-20 which is out of its contig's bounds",
            spilling.display()
        )
    );
}
