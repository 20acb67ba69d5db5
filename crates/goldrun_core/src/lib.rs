//! Provide shared, pure helpers for the goldrun harness.
//!
//! This crate is intentionally small and dependency-light. It contains deterministic helpers that the
//! harness uses to turn captured process output and binary artifacts into comparable values:
//! - transcript normalization (absolute paths and timing figures collapse to placeholders),
//! - the little-endian `i32` artifact codec,
//! - the non-decreasing order invariant.
//!
//! ## Notes
//!
//! - This is a “semantic core” crate: **no IO**, no global state, and no harness-specific types.
//! - Everything here must stay a pure function of its inputs; golden comparison depends on it.

pub mod artifact;
pub mod invariant;
pub mod normalize;

pub use artifact::{ArtifactError, decode_i32_le, encode_i32_le};
pub use invariant::{OrderViolation, first_order_violation, is_sorted};
pub use normalize::{Normalizer, PATH_PLACEHOLDER, TIME_PLACEHOLDER, normalize_transcript, overlaps_placeholder};
