//! Validation report accumulation and rendering.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Findings from one validation run, split by severity.
///
/// Criticals are failures that stopped the run early (missing or corrupt
/// inputs), errors are content problems in inputs that could be fully
/// analyzed, and warnings are advisory. A report with findings at any
/// severity has not passed.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    test_name: String,
    criticals: Vec<String>,
    errors: Vec<String>,
    warnings: Vec<String>,
    inputs: BTreeMap<String, Vec<String>>,
}

#[derive(Serialize)]
struct JsonBody<'a> {
    #[serde(rename = "Passed")]
    passed: bool,
    #[serde(rename = "Warning Count")]
    warning_count: usize,
    #[serde(rename = "Error Count")]
    error_count: usize,
    #[serde(rename = "Inputs")]
    inputs: &'a BTreeMap<String, Vec<String>>,
    #[serde(rename = "Warnings")]
    warnings: &'a [String],
    #[serde(rename = "Errors")]
    errors: &'a [String],
    #[serde(rename = "Critical Errors")]
    criticals: &'a [String],
}

impl ValidationReport {
    pub fn new(test_name: impl Into<String>) -> Self {
        ValidationReport {
            test_name: test_name.into(),
            criticals: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            inputs: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// True when no errors or criticals have been recorded. Warnings do
    /// not count against this.
    #[inline]
    pub fn no_errors(&self) -> bool {
        self.errors.is_empty() && self.criticals.is_empty()
    }

    #[inline]
    pub fn no_warnings(&self) -> bool {
        self.warnings.is_empty()
    }

    #[inline]
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Errors and criticals together.
    #[inline]
    pub fn error_count(&self) -> usize {
        self.errors.len() + self.criticals.len()
    }

    /// True only when nothing at any severity has been recorded.
    #[inline]
    pub fn passed(&self) -> bool {
        self.no_warnings() && self.no_errors()
    }

    /// Record an input file under a category such as `FASTA` or `BED`.
    pub fn add_input(&mut self, name: &str, value: impl Into<String>) {
        self.inputs
            .entry(name.to_string())
            .or_default()
            .push(value.into());
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn add_critical(&mut self, critical: impl Into<String>) {
        self.criticals.push(critical.into());
    }

    pub fn add_warnings(&mut self, warnings: impl IntoIterator<Item = String>) {
        self.warnings.extend(warnings);
    }

    pub fn add_errors(&mut self, errors: impl IntoIterator<Item = String>) {
        self.errors.extend(errors);
    }

    pub fn add_criticals(&mut self, criticals: impl IntoIterator<Item = String>) {
        self.criticals.extend(criticals);
    }

    #[inline]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    #[inline]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    #[inline]
    pub fn criticals(&self) -> &[String] {
        &self.criticals
    }

    #[inline]
    pub fn inputs(&self) -> &BTreeMap<String, Vec<String>> {
        &self.inputs
    }

    /// Render the report as a pretty-printed JSON document keyed by the
    /// test name.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let body = JsonBody {
            passed: self.passed(),
            warning_count: self.warning_count(),
            error_count: self.error_count(),
            inputs: &self.inputs,
            warnings: &self.warnings,
            errors: &self.errors,
            criticals: &self.criticals,
        };
        let mut document = BTreeMap::new();
        document.insert(self.test_name.as_str(), body);
        serde_json::to_string_pretty(&document)
    }

    /// Emit the full report through the logging layer, one finding per
    /// line.
    pub fn log_summary(&self) {
        tracing::info!("Dumping results for test {}", self.test_name);
        for (input_type, files) in &self.inputs {
            for file in files {
                tracing::info!("Analyzed {} {}", input_type, file);
            }
        }
        tracing::info!("RESULT: {}", self);
        for critical in &self.criticals {
            tracing::error!("{}", critical);
        }
        for error in &self.errors {
            tracing::error!("{}", error);
        }
        for warning in &self.warnings {
            tracing::warn!("{}", warning);
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.passed() { "PASSED" } else { "FAILED" };
        write!(
            f,
            "{}: {} | Errors: {} | Warnings: {}",
            self.test_name,
            outcome,
            self.error_count(),
            self.warning_count()
        )?;
        if !self.criticals.is_empty() {
            write!(f, " | CRITICAL ERRORS REPORTED!")?;
        }
        Ok(())
    }
}
