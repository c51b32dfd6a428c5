//! Validation checks over parsed records.
//!
//! Everything here is a pure function from record slices to lists of error
//! messages; no I/O happens at this layer. The orchestration in
//! [`crate::validate`] decides which checks run and where their findings
//! land in the report.

use crate::bed::BedLine;
use crate::dict::DictRecord;
use crate::faidx::FaidxRecord;
use std::collections::HashMap;
use std::hash::Hash;

/// Count occurrences and return the items seen more than once, with their
/// counts, in first-appearance order.
pub fn detect_collisions<T, I>(items: I) -> Vec<(T, usize)>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut counts: HashMap<T, usize> = HashMap::new();
    let mut order: Vec<T> = Vec::new();

    for item in items {
        let count = counts.entry(item.clone()).or_insert(0);
        if *count == 0 {
            order.push(item);
        }
        *count += 1;
    }

    let mut collisions = Vec::new();
    for item in order {
        if let Some(&count) = counts.get(&item) {
            if count > 1 {
                collisions.push((item, count));
            }
        }
    }
    collisions
}

/// Collapse a name for near-duplicate detection: lower-cased with all
/// whitespace removed, so `Chr 1` and `chr1` collide.
pub fn simplify_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Contig-name collisions in the byte-offset index, checked on raw names
/// and again on simplified names.
pub fn check_contig_names(faidx: &[FaidxRecord]) -> Vec<String> {
    let mut errors = Vec::new();
    let raw = faidx.iter().map(|record| record.contig.clone());
    let simplified = faidx.iter().map(|record| simplify_name(&record.contig));

    for (name, count) in detect_collisions(raw) {
        errors.push(format!("Detected {} contigs with the name {}", count, name));
    }
    for (name, count) in detect_collisions(simplified) {
        errors.push(format!(
            "Detected {} contigs with names similar to {}",
            count, name
        ));
    }
    errors
}

/// Contigs whose sequence content hashes identically: almost certainly the
/// same sequence under two names.
pub fn check_for_duplicate_contigs(dict: &[DictRecord]) -> Vec<String> {
    let mut by_hash: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for record in dict {
        let group = by_hash.entry(&record.md5).or_default();
        if group.is_empty() {
            order.push(&record.md5);
        }
        group.push(&record.contig);
    }

    let mut errors = Vec::new();
    for hash in order {
        if let Some(contigs) = by_hash.get(hash) {
            if contigs.len() >= 2 {
                errors.push(format!(
                    "Found {} contigs that likely have identical sequence: {:?}",
                    contigs.len(),
                    contigs
                ));
            }
        }
    }
    errors
}

/// Interval-name collisions in a BED file, on raw and simplified effective
/// names.
pub fn check_bed_names(lines: &[BedLine]) -> Vec<String> {
    let mut errors = Vec::new();
    let raw = lines.iter().map(|line| line.effective_name());
    let simplified = lines.iter().map(|line| simplify_name(&line.effective_name()));

    for (name, count) in detect_collisions(raw) {
        errors.push(format!(
            "Detected {} BED intervals with the name {}",
            count, name
        ));
    }
    for (name, count) in detect_collisions(simplified) {
        errors.push(format!(
            "Detected {} BED intervals with names similar to {}",
            count, name
        ));
    }
    errors
}

/// Identical `(contig, start, end)` triples used by more than one BED line.
pub fn check_for_duplicate_intervals(lines: &[BedLine]) -> Vec<String> {
    let triples = lines
        .iter()
        .map(|line| (line.contig().to_string(), line.start(), line.end()));

    detect_collisions(triples)
        .into_iter()
        .map(|((contig, start, end), count)| {
            format!(
                "Detected the interval {}:{}-{} used {} times in the BED file.",
                contig, start, end, count
            )
        })
        .collect()
}

/// Check every BED line against the contig lengths the FASTA index
/// reports: the contig must exist and the line's last included base must
/// not exceed the contig's length.
pub fn crosscheck_intervals(lines: &[BedLine], faidx: &[FaidxRecord]) -> Vec<String> {
    let mut lengths: HashMap<&str, u64> = HashMap::new();
    for record in faidx {
        lengths.insert(&record.contig, record.base_length);
    }

    let mut errors = Vec::new();
    for line in lines {
        match lengths.get(line.contig()) {
            None => {
                errors.push(format!(
                    "BED line {} tried to reference contig {} which does not exist in the FASTA file.",
                    line.effective_name(),
                    line.contig()
                ));
            }
            Some(&length) => {
                if line.interval().last_included_base() > length as i64 {
                    errors.push(format!(
                        "BED line {} is trying to read interval {} which is out of its contig's bounds",
                        line.effective_name(),
                        line.interval()
                    ));
                }
            }
        }
    }
    errors
}

/// All FASTA-only findings: contig naming collisions plus duplicate
/// sequence content.
pub fn validate_fasta(faidx: &[FaidxRecord], dict: &[DictRecord]) -> Vec<String> {
    let mut errors = check_contig_names(faidx);
    errors.extend(check_for_duplicate_contigs(dict));
    errors
}

/// All single-file BED findings: each record's own accumulated violations
/// (tagged with its 1-based position), name collisions, and duplicated
/// intervals.
pub fn validate_bed(lines: &[BedLine]) -> Vec<String> {
    let mut errors = Vec::new();
    for (number, line) in lines.iter().enumerate() {
        for error in line.errors() {
            errors.push(format!("Line {}: {}", number + 1, error));
        }
    }
    errors.extend(check_bed_names(lines));
    errors.extend(check_for_duplicate_intervals(lines));
    errors
}

/// Tag each error with the file it came from so merged findings stay
/// traceable.
pub fn prefix_with_source(source: &str, errors: Vec<String>) -> Vec<String> {
    errors
        .into_iter()
        .map(|error| format!("{}: {}", source, error))
        .collect()
}
