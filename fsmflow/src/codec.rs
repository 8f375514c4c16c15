//! Bit and waveform codec.
//!
//! A waveform string holds one symbol per sample tick. Level symbols are `0`/`1` (or `l`/`h`,
//! `L`/`H`), and the repeat marker `.` stands for "same as the previous sample", so a run of
//! identical samples is written as one level symbol followed by dots.

use std::fmt;

use thiserror::Error;

use crate::some_or;

/// Repeat marker in a waveform string.
pub const REPEAT: char = '.';

/// Codec errors.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid symbol {symbol:?} at position {position}")]
    Symbol { symbol: char, position: usize },

    #[error("repeat marker at position 0 has no previous sample")]
    LeadingRepeat,

    #[error("sample value {value} at position {position} does not fit in one bit")]
    SampleRange { value: u8, position: usize },

    #[error("empty bit string")]
    Empty,

    #[error("bit string of width {width} does not fit in 64 bits")]
    Overflow { width: usize },
}

/// Logic level of a single-bit signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Driven low (GND).
    Low,
    /// Driven high (VCC).
    High,
}

impl Level {
    /// Parses a waveform level symbol.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '0' | 'l' | 'L' => Some(Self::Low),
            '1' | 'h' | 'H' => Some(Self::High),
            _ => None,
        }
    }

    /// Returns the level of a sample value.
    pub fn from_sample(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Low),
            1 => Some(Self::High),
            _ => None,
        }
    }

    /// Sample value of the level.
    pub fn sample(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }

    /// Symbol used by the waveform encoder.
    pub fn wave_symbol(self) -> char {
        match self {
            Self::Low => 'l',
            Self::High => 'h',
        }
    }
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        if value {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "GND"),
            Self::High => write!(f, "VCC"),
        }
    }
}

/// Interprets a string over `{0,1}` as a big-endian unsigned binary number.
pub fn bits_to_int(bits: &str) -> Result<u64, CodecError> {
    if bits.is_empty() {
        return Err(CodecError::Empty);
    }

    let width = bits.chars().count();
    if width > 64 {
        return Err(CodecError::Overflow { width });
    }

    bits.chars().enumerate().try_fold(0u64, |acc, (position, symbol)| match symbol {
        '0' => Ok(acc << 1),
        '1' => Ok((acc << 1) | 1),
        _ => Err(CodecError::Symbol { symbol, position }),
    })
}

/// Converts a string over `{0,1}` into one sample per character.
pub fn bits_to_samples(bits: &str) -> Result<Vec<u8>, CodecError> {
    bits.chars()
        .enumerate()
        .map(|(position, symbol)| match symbol {
            '0' => Ok(0),
            '1' => Ok(1),
            _ => Err(CodecError::Symbol { symbol, position }),
        })
        .collect()
}

/// Converts samples into a string over `{0,1}`.
pub fn samples_to_bits(samples: &[u8]) -> Result<String, CodecError> {
    samples
        .iter()
        .enumerate()
        .map(|(position, &value)| {
            Level::from_sample(value)
                .map(|level| if level == Level::High { '1' } else { '0' })
                .ok_or(CodecError::SampleRange { value, position })
        })
        .collect()
}

/// Expands a waveform string into one sample per tick.
pub fn decode_waveform(wave: &str) -> Result<Vec<u8>, CodecError> {
    let mut samples = Vec::with_capacity(wave.len());
    let mut previous = None;

    for (position, symbol) in wave.chars().enumerate() {
        let level = if symbol == REPEAT {
            some_or!(previous, return Err(CodecError::LeadingRepeat))
        } else {
            some_or!(Level::from_symbol(symbol), return Err(CodecError::Symbol { symbol, position }))
        };
        samples.push(level.sample());
        previous = Some(level);
    }

    Ok(samples)
}

/// Compresses samples into a waveform string; runs of identical samples become dots.
pub fn encode_waveform(samples: &[u8]) -> Result<String, CodecError> {
    let mut wave = String::with_capacity(samples.len());
    let mut previous = None;

    for (position, &value) in samples.iter().enumerate() {
        let level = some_or!(Level::from_sample(value), return Err(CodecError::SampleRange { value, position }));
        wave.push(if previous == Some(level) { REPEAT } else { level.wave_symbol() });
        previous = Some(level);
    }

    Ok(wave)
}

/// Expands a waveform string into a string over `{0,1}`.
pub fn wave_to_bitstring(wave: &str) -> Result<String, CodecError> { samples_to_bits(&decode_waveform(wave)?) }

/// Compresses a string over `{0,1}` into a waveform string.
pub fn bitstring_to_wave(bits: &str) -> Result<String, CodecError> { encode_waveform(&bits_to_samples(bits)?) }
