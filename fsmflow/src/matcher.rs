//! Cyclic pattern matcher.
//!
//! A free-running FSM repeats its output pattern with a period equal to the cycle length, but the
//! capture starts at an unknown phase and its first sample is unreliable (reset and arm
//! transients). A capture `C` matches a reference `R` of period `P` at offset `d` when every sample
//! but the first satisfies `C[i] == R[(i + d) % P]`, i.e. `C` is `R` rotated left by `d` and tiled.

use log::debug;

/// Returns `pattern` rotated left by `offset`.
pub fn rotate<T: Clone>(pattern: &[T], offset: usize) -> Vec<T> {
    if pattern.is_empty() {
        return vec![];
    }
    let offset = offset % pattern.len();
    pattern[offset..].iter().chain(pattern[..offset].iter()).cloned().collect()
}

/// Repeats `pattern` and truncates it to `len` samples.
pub fn tile<T: Clone>(pattern: &[T], len: usize) -> Vec<T> { pattern.iter().cycle().take(len).cloned().collect() }

/// Returns whether `capture` matches `reference` rotated left by `offset`, ignoring sample 0.
///
/// A capture shorter than one period is compared on the available prefix only.
pub fn matches_at<T: PartialEq>(reference: &[T], capture: &[T], offset: usize) -> bool {
    if reference.is_empty() {
        return false;
    }
    let period = reference.len();
    capture.iter().enumerate().skip(1).all(|(i, sample)| reference[(i + offset) % period] == *sample)
}

/// Searches the smallest offset in `0..reference.len()` at which `capture` matches.
pub fn find_offset<T: PartialEq>(reference: &[T], capture: &[T]) -> Option<usize> {
    let offset = (0..reference.len()).find(|&offset| matches_at(reference, capture, offset));
    debug!("period {} over {} samples: offset {:?}", reference.len(), capture.len(), offset);
    offset
}

/// One signal lane to verify: its captured samples and expected reference pattern.
#[derive(Debug, Clone, Copy)]
pub struct Lane<'a, T> {
    /// Signal name.
    pub name: &'a str,
    /// Expected pattern over one period.
    pub reference: &'a [T],
    /// Captured samples.
    pub capture: &'a [T],
}

impl<'a, T> Lane<'a, T> {
    /// Creates a lane.
    pub fn new(name: &'a str, reference: &'a [T], capture: &'a [T]) -> Self { Self { name, reference, capture } }
}

/// Lane that does not follow the primary lane's phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneFailure {
    /// Signal name.
    pub name: String,
    /// Offset at which the lane would match on its own, if any.
    pub independent: Option<usize>,
}

/// Outcome of a joint lane check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every lane matches at the same offset.
    Matched {
        /// Rotation offset of the capture.
        offset: usize,
    },
    /// The primary lane matches at no offset.
    NoMatch {
        /// Name of the primary lane.
        lane: String,
    },
    /// The primary lane matches, but some lanes do not at the same offset.
    Unsynchronized {
        /// Offset found on the primary lane.
        offset: usize,
        /// Lanes out of step with the primary lane.
        lanes: Vec<LaneFailure>,
    },
}

impl Verdict {
    /// Returns whether all lanes matched.
    pub fn is_match(&self) -> bool { matches!(self, Self::Matched { .. }) }

    /// Returns the common offset, if all lanes matched.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Matched { offset } => Some(*offset),
            _ => None,
        }
    }
}

/// Checks lanes jointly: the offset found on the first lane is imposed on every other lane.
///
/// Lanes driven by the same FSM must agree on the phase, not merely each be periodic.
pub fn match_lanes<T: PartialEq>(lanes: &[Lane<'_, T>]) -> Verdict {
    let (primary, others) = match lanes.split_first() {
        Some(split) => split,
        None => return Verdict::NoMatch { lane: String::new() },
    };

    let offset = match find_offset(primary.reference, primary.capture) {
        Some(offset) => offset,
        None => return Verdict::NoMatch { lane: primary.name.to_string() },
    };

    let failures = others
        .iter()
        .filter(|lane| !matches_at(lane.reference, lane.capture, offset))
        .map(|lane| LaneFailure {
            name: lane.name.to_string(),
            independent: find_offset(lane.reference, lane.capture),
        })
        .collect::<Vec<_>>();

    if failures.is_empty() {
        Verdict::Matched { offset }
    } else {
        debug!("{} lanes out of step with {} at offset {}", failures.len(), primary.name, offset);
        Verdict::Unsynchronized { offset, lanes: failures }
    }
}
