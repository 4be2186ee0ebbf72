//! Field color allocation.
//!
//! Fields get colors from a fixed ordered palette, assigned in creation
//! order per farm. Once all 10 entries are in use the allocator cycles
//! from the start — beyond 10 fields, visual distinctness degrades
//! gracefully instead of erroring, a known limitation.

/// Fixed display palette, ordered by assignment priority.
pub const PALETTE: [&str; 10] = [
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6",
    "#bcf60c", "#fabebe",
];

/// Returns the next color for a new field given the colors already in use
/// on the farm.
///
/// Picks the first palette entry not present in `used`; when every entry
/// is taken, cycles with `PALETTE[used.len() % PALETTE.len()]`.
#[must_use]
pub fn next_color<S: AsRef<str>>(used: &[S]) -> &'static str {
    PALETTE
        .iter()
        .find(|candidate| !used.iter().any(|u| u.as_ref() == **candidate))
        .copied()
        .unwrap_or(PALETTE[used.len() % PALETTE.len()])
}
