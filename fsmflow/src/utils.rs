//! Utilities.

/// Returns ceiling log2.
pub const fn clog2(value: usize) -> usize {
    if value == 0 {
        0
    } else {
        (::std::mem::size_of::<usize>() * 8) - (value - 1).leading_zeros() as usize
    }
}

/// Returns the number of bits needed to index `count` distinct values, never less than `min`.
///
/// ### Example
/// ```ignore
/// assert_eq!(index_bits(4, 1), 2);
/// assert_eq!(index_bits(1, 1), 1);
/// ```
pub const fn index_bits(count: usize, min: usize) -> usize {
    let bits = clog2(count);
    if bits < min {
        min
    } else {
        bits
    }
}

/// Returns bit `index` of a `width`-bit big-endian word, i.e. index 0 is the most significant bit.
pub const fn msb_bit(word: u64, width: usize, index: usize) -> bool { (word >> (width - 1 - index)) & 1 == 1 }

/// Returns the `width`-bit big-endian bit string of `value`.
pub fn u64_to_bitstring(width: usize, value: u64) -> String {
    (0..width).map(|i| if msb_bit(value, width, i) { '1' } else { '0' }).collect()
}

/// Indents every line in the string.
pub fn indent(str: String, indent: usize) -> String {
    str.lines().map(|l| format!("{}{}", " ".repeat(indent), l)).collect::<Vec<_>>().join("\n")
}

/// Some or executing the given expression.
#[macro_export]
macro_rules! some_or {
    ($e:expr, $err:expr) => {{
        match $e {
            Some(r) => r,
            None => $err,
        }
    }};
}
