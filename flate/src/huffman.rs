//! Canonical Huffman alphabets (RFC 1951 §3.2.2).
//!
//! An alphabet is built from a vector of code lengths alone; the codes are then fully determined
//! by assigning sequentially increasing values to symbols ordered by `(length, symbol index)`.

use std::collections::HashMap;

use wirekit_common::bitio::{BitReader, BitWriter};
use wirekit_common::{ensure_attach, Result};

use crate::bits::BitResultExt;
use crate::error::FlateError;

/// The longest code length a DEFLATE alphabet may use.
pub const MAX_CODE_LENGTH: u32 = 15;

/// Symbol count of the literal/length alphabet, including the two reserved symbols 286 and 287.
pub const LITERAL_SYMBOLS: usize = 288;

/// Symbol count of the distance alphabet, including the two reserved symbols 30 and 31.
pub const DISTANCE_SYMBOLS: usize = 32;

/// A single symbol's code: a bit length (0 marks an unused symbol) and the assigned code value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Code {
    pub length: u32,
    pub bits: u32,
}

/// A canonical Huffman alphabet with its decode table.
#[derive(Clone, Debug)]
pub struct Alphabet {
    codes: Vec<Code>,
    table: HashMap<(u32, u32), u16>,
    min_length: u32,
    max_length: u32,
}

impl Alphabet {
    /// Builds the canonical alphabet for the given code lengths.
    ///
    /// Lengths of 0 mark unused symbols. An all-zero vector yields an empty alphabet, which is
    /// valid to construct but decodes no symbol.
    pub fn from_lengths(lengths: &[u32]) -> Result<Self, FlateError> {
        let mut bl_count = [0u32; MAX_CODE_LENGTH as usize + 1];
        for &length in lengths {
            ensure_attach!(length <= MAX_CODE_LENGTH, FlateError::CodeLengthTooLong);
            if length > 0 {
                bl_count[length as usize] += 1;
            }
        }

        let mut next_code = [0u32; MAX_CODE_LENGTH as usize + 1];
        let mut code = 0u32;
        for bits in 1..=MAX_CODE_LENGTH as usize {
            code = (code + bl_count[bits - 1]) << 1;
            next_code[bits] = code;
        }

        let mut codes = vec![Code::default(); lengths.len()];
        let mut table = HashMap::new();
        let mut min_length = 0;
        let mut max_length = 0;
        for (symbol, &length) in lengths.iter().enumerate() {
            if length == 0 {
                continue;
            }
            let bits = next_code[length as usize];
            next_code[length as usize] += 1;
            ensure_attach!(bits >> length == 0, FlateError::OversubscribedCode);
            codes[symbol] = Code { length, bits };
            table.insert((length, bits), symbol as u16);
            min_length = if min_length == 0 { length } else { min_length.min(length) };
            max_length = max_length.max(length);
        }

        Ok(Self { codes, table, min_length, max_length })
    }

    /// The fixed literal/length alphabet of RFC 1951 §3.2.6.
    pub fn fixed_literal() -> Self {
        let mut lengths = [0u32; LITERAL_SYMBOLS];
        lengths[0..144].fill(8);
        lengths[144..256].fill(9);
        lengths[256..280].fill(7);
        lengths[280..288].fill(8);
        Self::from_lengths(&lengths).unwrap_or_else(|_| unreachable!())
    }

    /// The fixed distance alphabet: 32 symbols, all 5 bits.
    pub fn fixed_distance() -> Self {
        Self::from_lengths(&[5; DISTANCE_SYMBOLS]).unwrap_or_else(|_| unreachable!())
    }

    /// The code assigned to `symbol`, if the symbol is in range and used.
    pub fn code(&self, symbol: u16) -> Option<Code> {
        self.codes.get(symbol as usize).copied().filter(|code| code.length > 0)
    }

    /// Decodes one symbol from `reader`.
    ///
    /// Reads `min_length` bits most-significant-bit first into an accumulator, then extends one
    /// bit at a time until the accumulated `(length, bits)` names a symbol, failing past
    /// `max_length`.
    pub fn decode_symbol(&self, reader: &mut BitReader<'_>) -> Result<u16, FlateError> {
        let mut length = self.min_length;
        let mut bits = 0u32;
        for _ in 0..self.min_length {
            bits = (bits << 1) | reader.read_bit().or_truncated()?;
        }
        loop {
            if let Some(&symbol) = self.table.get(&(length, bits)) {
                return Ok(symbol);
            }
            ensure_attach!(length < self.max_length, FlateError::InvalidCode);
            bits = (bits << 1) | reader.read_bit().or_truncated()?;
            length += 1;
        }
    }

    /// Emits `symbol`'s code into `writer`, most-significant-bit first.
    ///
    /// This is the sole place where bit order differs from the writer's LSB-first default. The
    /// caller must pass a symbol the alphabet assigns a code.
    pub fn write_symbol(&self, writer: &mut BitWriter, symbol: u16) {
        let code = self.codes[symbol as usize];
        debug_assert!(code.length > 0);
        for shift in (0..code.length).rev() {
            writer.write_bit(code.bits >> shift);
        }
    }
}
