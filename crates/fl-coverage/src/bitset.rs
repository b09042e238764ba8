//! Growable bitset of not-yet-covered edges.
//!
//! One bit per indexed edge, packed into `u64` words (bit `i` lives in word
//! `i / 64` at position `i % 64`).  There is no upper bound on the number of
//! edges.
//!
//! # Hex encoding
//!
//! Policy artifacts store a bitset as one big hexadecimal integer whose bit
//! `i` is edge `i`: most significant digit first, lowercase, no leading
//! zeros, `"0"` for the empty set.  An optional `0x` prefix is accepted when
//! parsing.  Because leading zeros are dropped, two sets that differ only in
//! length but not in set bits encode identically; lookups therefore compare
//! [`trimmed_words`](EdgeBitset::trimmed_words).

use std::fmt::Write;

use crate::{CoverageError, CoverageResult};

const WORD_BITS: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdgeBitset {
    words: Vec<u64>,
    len:   usize,
}

impl EdgeBitset {
    /// A set of `len` bits, all set.
    pub fn full(len: usize) -> Self {
        let mut words = vec![u64::MAX; len.div_ceil(WORD_BITS)];
        let tail = len % WORD_BITS;
        if tail != 0 {
            if let Some(last) = words.last_mut() {
                *last = (1u64 << tail) - 1;
            }
        }
        Self { words, len }
    }

    /// A set of `len` bits, all clear.
    pub fn empty(len: usize) -> Self {
        Self { words: vec![0; len.div_ceil(WORD_BITS)], len }
    }

    /// Number of addressable bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, i: usize) -> bool {
        i < self.len && self.words[i / WORD_BITS] & (1u64 << (i % WORD_BITS)) != 0
    }

    /// Clear bit `i`.  Returns `true` if it was set.  Out-of-range indices
    /// are ignored.
    #[inline]
    pub fn clear(&mut self, i: usize) -> bool {
        if i >= self.len {
            return false;
        }
        let mask = 1u64 << (i % WORD_BITS);
        let word = &mut self.words[i / WORD_BITS];
        let was_set = *word & mask != 0;
        *word &= !mask;
        was_set
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// `true` when no bit is set (everything covered).
    pub fn none(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Words with trailing all-zero words removed: the canonical form used
    /// as a policy lookup key.
    pub fn trimmed_words(&self) -> &[u64] {
        let end = self.words.iter().rposition(|&w| w != 0).map_or(0, |i| i + 1);
        &self.words[..end]
    }

    /// Encode as a big hexadecimal integer (see module docs).
    pub fn to_hex(&self) -> String {
        words_to_hex(self.trimmed_words())
    }

    /// Decode a hex integer into a set of `len` bits.
    ///
    /// Fails if the value has a bit at or beyond `len`.
    pub fn from_hex(hex: &str, len: usize) -> CoverageResult<Self> {
        let parsed = hex_to_words(hex)?;
        let mut set = Self::empty(len);
        for (i, w) in parsed.into_iter().enumerate() {
            if i >= set.words.len() {
                return Err(CoverageError::PolicyFormat(format!(
                    "bitset {hex:?} does not fit in {len} bits"
                )));
            }
            set.words[i] = w;
        }
        let tail = len % WORD_BITS;
        if tail != 0 {
            if let Some(&last) = set.words.last() {
                if last >> tail != 0 {
                    return Err(CoverageError::PolicyFormat(format!(
                        "bitset {hex:?} does not fit in {len} bits"
                    )));
                }
            }
        }
        Ok(set)
    }
}

/// Format trimmed words as a big hex integer.
pub(crate) fn words_to_hex(words: &[u64]) -> String {
    let Some((top, rest)) = words.split_last() else {
        return "0".to_owned();
    };
    let mut out = String::with_capacity(words.len() * 16);
    let _ = write!(out, "{top:x}");
    for w in rest.iter().rev() {
        let _ = write!(out, "{w:016x}");
    }
    out
}

/// Parse a big hex integer into trimmed little-endian words.
pub(crate) fn hex_to_words(hex: &str) -> CoverageResult<Vec<u64>> {
    let digits = hex.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    if digits.is_empty() {
        return Err(CoverageError::PolicyFormat("empty bitset literal".into()));
    }

    let bytes = digits.as_bytes();
    let mut words = Vec::with_capacity(bytes.len().div_ceil(16));
    let mut end = bytes.len();
    while end > 0 {
        let start = end.saturating_sub(16);
        // Slicing on byte offsets is safe once every byte is an ASCII hex digit.
        if !bytes[start..end].iter().all(u8::is_ascii_hexdigit) {
            return Err(CoverageError::PolicyFormat(format!("invalid hex bitset {hex:?}")));
        }
        let chunk = &digits[start..end];
        let word = u64::from_str_radix(chunk, 16)
            .map_err(|e| CoverageError::PolicyFormat(format!("invalid hex bitset {hex:?}: {e}")))?;
        words.push(word);
        end = start;
    }

    while words.last() == Some(&0) {
        words.pop();
    }
    Ok(words)
}
