//! Parsed transition patterns.

use std::fmt;

use arrayvec::ArrayVec;
use itertools::Itertools;
use thiserror::Error;

use crate::codec;
use crate::utils::msb_bit;

/// Widest input or output pattern the compiler can represent.
pub const MAX_PATTERN_BITS: usize = 32;

/// Wildcard for `from_state`.
pub const ANY_STATE: &str = "*";

/// Pattern parse errors.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("expected {expected} bits, found {found}")]
    Width { expected: usize, found: usize },

    #[error("invalid symbol {symbol:?} at position {position}")]
    Symbol { symbol: char, position: usize },
}

/// One input bit of a transition rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ternary {
    /// Input must be low.
    Zero,
    /// Input must be high.
    One,
    /// Don't care.
    Any,
}

impl Ternary {
    /// Parses `0`, `1` or `-`.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '0' => Some(Self::Zero),
            '1' => Some(Self::One),
            '-' => Some(Self::Any),
            _ => None,
        }
    }

    /// Returns whether the bit value satisfies this constraint.
    pub fn matches(self, bit: bool) -> bool {
        match self {
            Self::Zero => !bit,
            Self::One => bit,
            Self::Any => true,
        }
    }

    /// Returns whether some bit value satisfies both constraints.
    pub fn overlaps(self, other: Self) -> bool {
        !matches!((self, other), (Self::Zero, Self::One) | (Self::One, Self::Zero))
    }

    fn symbol(self) -> char {
        match self {
            Self::Zero => '0',
            Self::One => '1',
            Self::Any => '-',
        }
    }
}

/// Input pattern, most significant bit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPattern(ArrayVec<Ternary, MAX_PATTERN_BITS>);

impl InputPattern {
    /// Parses an input pattern of exactly `width` bits.
    pub fn parse(pattern: &str, width: usize) -> Result<Self, PatternError> {
        let found = pattern.chars().count();
        if found != width || width > MAX_PATTERN_BITS {
            return Err(PatternError::Width { expected: width, found });
        }

        pattern
            .chars()
            .enumerate()
            .map(|(position, symbol)| Ternary::from_symbol(symbol).ok_or(PatternError::Symbol { symbol, position }))
            .collect::<Result<ArrayVec<_, MAX_PATTERN_BITS>, _>>()
            .map(Self)
    }

    /// Number of bits.
    pub fn width(&self) -> usize { self.0.len() }

    /// Returns whether the input combination `value` satisfies the pattern.
    pub fn matches(&self, value: u64) -> bool {
        let width = self.width();
        self.0.iter().enumerate().all(|(i, bit)| bit.matches(msb_bit(value, width, i)))
    }

    /// Returns whether some input combination satisfies both patterns.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.width() == other.width() && self.0.iter().zip(other.0.iter()).all(|(lhs, rhs)| lhs.overlaps(*rhs))
    }
}

impl fmt::Display for InputPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().map(|bit| bit.symbol()).join(""))
    }
}

/// Current-state selector of a transition rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateRef {
    /// Any state not matched by an explicit rule.
    Any,
    /// The named state.
    Named(String),
}

impl StateRef {
    /// Parses a `from_state` field.
    pub fn parse(name: &str) -> Self {
        if name == ANY_STATE {
            Self::Any
        } else {
            Self::Named(name.to_string())
        }
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(ANY_STATE),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Output action of a transition rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputPattern {
    /// Keep the outputs unchanged.
    Hold,
    /// Drive the outputs with the given big-endian bits.
    Drive(u32),
}

impl OutputPattern {
    /// Parses an output pattern of exactly `width` bits, or the empty pattern.
    pub fn parse(pattern: &str, width: usize) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Ok(Self::Hold);
        }

        let found = pattern.chars().count();
        if found != width || width > MAX_PATTERN_BITS {
            return Err(PatternError::Width { expected: width, found });
        }

        match codec::bits_to_int(pattern) {
            Ok(bits) => Ok(Self::Drive(bits as u32)),
            Err(codec::CodecError::Symbol { symbol, position }) => Err(PatternError::Symbol { symbol, position }),
            Err(_) => Err(PatternError::Width { expected: width, found }),
        }
    }
}
