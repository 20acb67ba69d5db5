//! Non-decreasing order invariant for decoded artifacts.

/// The first adjacent pair that breaks non-decreasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderViolation {
    /// Index of the later element of the pair (always `>= 1`).
    pub index: usize,
    pub previous: i32,
    pub current: i32,
}

/// Find the first `i >= 1` with `values[i - 1] > values[i]`.
pub fn first_order_violation(values: &[i32]) -> Option<OrderViolation> {
    values
        .windows(2)
        .position(|pair| pair[0] > pair[1])
        .map(|pos| OrderViolation {
            index: pos + 1,
            previous: values[pos],
            current: values[pos + 1],
        })
}

/// `true` iff every adjacent pair is in non-decreasing order. Empty and single-element sequences are sorted.
pub fn is_sorted(values: &[i32]) -> bool {
    first_order_violation(values).is_none()
}
