//! Define transcript normalization (policy + pure helpers).
//!
//! Captured output embeds values that differ between machines and runs. Before golden comparison the
//! harness rewrites them to fixed placeholders:
//!
//! 1. every occurrence of the harness root directory (absolute path) becomes [`PATH_PLACEHOLDER`];
//! 2. every `<digits><any char><digits> seconds` becomes `"<TIME_PLACEHOLDER> seconds"`.
//!
//! ## Notes
//! - The separator in rule 2 is any single character (not only `.`), so locale-specific
//!   decimal commas collapse too.
//! - The two rules match disjoint text; they are applied path first, then timings.
//! - Normalization is idempotent only for roots that share no text with a placeholder edge, as
//!   reported by [`overlaps_placeholder`]. Any root ending in `_` breaks it: with the root `/x/__`,
//!   `/x/1.5 seconds` becomes `/x/__NUM__ seconds`, and a second pass turns that into
//!   `__PATH__NUM__ seconds`.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Placeholder substituted for the harness root directory.
pub const PATH_PLACEHOLDER: &str = "__PATH__";
/// Placeholder substituted for the numeric part of an elapsed-time figure.
pub const TIME_PLACEHOLDER: &str = "__NUM__";

static TIMING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+.\d+ seconds").expect("INVARIANT: timing pattern is a valid regex"));

/// Whether `root` can combine with placeholder text into a new root occurrence.
///
/// True when the root and a placeholder overlap: one contains the other, the root ends with a
/// prefix of a placeholder, or it starts with a suffix of one. For any other root, normalizing twice
/// gives the same result as normalizing once.
pub fn overlaps_placeholder(root: &str) -> bool {
    if root.is_empty() {
        return false;
    }
    [PATH_PLACEHOLDER, TIME_PLACEHOLDER].iter().any(|placeholder| {
        root.contains(placeholder)
            || placeholder.contains(root)
            || (1..placeholder.len())
                .any(|k| root.ends_with(&placeholder[..k]) || root.starts_with(&placeholder[k..]))
    })
}

/// Rewrites volatile substrings of captured output.
///
/// A `Normalizer` is bound to a single root path, so repeated calls for the same run agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    root: String,
}

impl Normalizer {
    /// Create a normalizer that hides `root` (usually the canonical harness root directory).
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    /// The path this normalizer replaces.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Normalize one captured transcript.
    ///
    /// ## Parameters
    /// - `raw`: raw standard output of a session.
    ///
    /// ## Returns
    /// - `String`: the text with paths and timing figures replaced by placeholders.
    pub fn normalize(&self, raw: &str) -> String {
        normalize_transcript(raw, &self.root)
    }
}

/// Normalize `raw` against `root` without constructing a [`Normalizer`].
///
/// An empty `root` disables the path rule; replacing the empty string would interleave the placeholder
/// between every character.
pub fn normalize_transcript(raw: &str, root: &str) -> String {
    let without_paths: Cow<'_, str> = if root.is_empty() {
        Cow::Borrowed(raw)
    } else {
        Cow::Owned(raw.replace(root, PATH_PLACEHOLDER))
    };
    collapse_timings(&without_paths).into_owned()
}

/// Apply only the timing rule.
pub fn collapse_timings(text: &str) -> Cow<'_, str> {
    TIMING.replace_all(text, format!("{TIME_PLACEHOLDER} seconds").as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_every_root_occurrence() {
        let n = Normalizer::new("/home/ci/project");
        let raw = "/home/ci/project$ cd build\n/home/ci/project/build$ exit\n";
        assert_eq!(n.normalize(raw), "__PATH__$ cd build\n__PATH__/build$ exit\n");
    }

    #[test]
    fn test_collapses_timing_figures() {
        let out = normalize_transcript("Execution time: 0.125 seconds\n", "/x");
        assert_eq!(out, "Execution time: __NUM__ seconds\n");
    }

    #[test]
    fn test_any_single_separator_is_accepted() {
        assert_eq!(normalize_transcript("3,50 seconds", ""), "__NUM__ seconds");
        assert_eq!(normalize_transcript("12x7 seconds", ""), "__NUM__ seconds");
    }

    #[test]
    fn test_integers_and_other_units_untouched() {
        let raw = "took 3 seconds, 1.5 minutes, 2.0 secs";
        assert_eq!(normalize_transcript(raw, ""), raw);
    }

    #[test]
    fn test_separator_does_not_cross_lines() {
        let raw = "1\n2 seconds";
        assert_eq!(normalize_transcript(raw, ""), raw);
    }

    #[test]
    fn test_empty_root_disables_path_rule() {
        assert_eq!(normalize_transcript("abc", ""), "abc");
    }

    #[test]
    fn test_idempotent_on_mixed_output() {
        let n = Normalizer::new("/srv/run");
        let once = n.normalize("/srv/run$ ./a\nExecution time: 10.001 seconds\n/srv/run$ ");
        assert_eq!(n.normalize(&once), once);
    }

    #[test]
    fn test_root_ending_in_placeholder_prefix_is_not_idempotent() {
        let n = Normalizer::new("/x/__");
        let once = n.normalize("/x/1.5 seconds");
        assert_eq!(once, "/x/__NUM__ seconds");
        assert_eq!(n.normalize(&once), "__PATH__NUM__ seconds");
        assert!(overlaps_placeholder("/x/__"));
        assert!(overlaps_placeholder("/x/_"));
        assert!(overlaps_placeholder("/a/__PATH__/b"));
        assert!(overlaps_placeholder("NUM__/x"));
        assert!(overlaps_placeholder("AT"));
        assert!(!overlaps_placeholder(""));
    }

    #[test]
    fn test_underscore_inside_root_is_idempotent() {
        let root = "/srv/my_app/run_1";
        assert!(!overlaps_placeholder(root));
        let n = Normalizer::new(root);
        let once = n.normalize("/srv/my_app/run_1$ go\nExecution time: 2.5 seconds\n/srv/my_app/run_1/x");
        assert_eq!(once, "__PATH__$ go\nExecution time: __NUM__ seconds\n__PATH__/x");
        assert_eq!(n.normalize(&once), once);
    }
}
