//! Transcript validator - exact comparison of normalized output with a golden transcript.

use std::fmt;

use similar::TextDiff;

use crate::suite::Expected;

/// Outcome of validating one transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// The case is run-only; nothing was compared.
    Unchecked,
    Fail(Mismatch),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// A golden mismatch with the context needed to diagnose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// 1-based case index
    pub case_index: usize,
    pub input: Vec<String>,
    pub actual: String,
    pub expected: String,
}

impl Mismatch {
    /// The input script as it was typed, one line per scripted line.
    pub fn input_script(&self) -> String {
        self.input.iter().map(|l| format!("{l}\n")).collect()
    }

    /// Line diff from expected to actual.
    pub fn unified_diff(&self) -> String {
        TextDiff::from_lines(&self.expected, &self.actual)
            .unified_diff()
            .context_radius(3)
            .header("expected", "actual")
            .to_string()
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Test {} failed:\nInput data: {}\nResult: {}\nExpected: {}",
            self.case_index,
            self.input_script(),
            self.actual,
            self.expected
        )
    }
}

/// Compare `normalized` with the expected value of case `case_index`.
///
/// Equality is exact: whitespace, ordering and case all count.
pub fn validate(case_index: usize, input: &[String], normalized: &str, expected: &Expected) -> Verdict {
    match expected {
        Expected::RunOnly => Verdict::Unchecked,
        Expected::Transcript(golden) if golden == normalized => Verdict::Pass,
        Expected::Transcript(golden) => Verdict::Fail(Mismatch {
            case_index,
            input: input.to_vec(),
            actual: normalized.to_string(),
            expected: golden.clone(),
        }),
    }
}
