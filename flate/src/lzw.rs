//! The LZW `.Z` codec as produced by compress(1) and ncompress.
//!
//! Codes are written least-significant-bit first at a growing width, starting at 9 bits. In
//! block mode code 256 is reserved as CLEAR; a decoder hitting it resets its dictionary and
//! realigns the input to the current-width times eight bit boundary, matching the historical
//! implementation.

use std::collections::HashMap;

use wirekit_common::bitio::{BitReader, BitWriter};
use wirekit_common::{ensure_attach, Result};

use crate::bits::BitResultExt;
use crate::error::LzwError;

//
// constants
//

const MAGIC: [u8; 2] = [0x1F, 0x9D];
const BLOCK_MODE_FLAG: u8 = 0x80;
const WIDTH_MASK: u8 = 0x7F;

const MIN_WIDTH: u32 = 9;
const MAX_WIDTH: u32 = 16;
const CLEAR_CODE: u32 = 256;

//
// public functions
//

/// Compresses `input` into a `.Z` stream.
///
/// `max_width` is clamped to 9..=16; `block_mode` reserves code 256 as CLEAR (the encoder never
/// emits it, but the flag changes the code space and must match the decoder's).
pub fn encode(input: &[u8], max_width: u32, block_mode: bool) -> Vec<u8> {
    let max_width = max_width.clamp(MIN_WIDTH, MAX_WIDTH);
    let max_code = (1u32 << max_width) - 1;

    let mut writer = BitWriter::new();
    writer.write_bits(u32::from(MAGIC[0]), 8);
    writer.write_bits(u32::from(MAGIC[1]), 8);
    let mut flags = max_width as u8;
    if block_mode {
        flags |= BLOCK_MODE_FLAG;
    }
    writer.write_bits(u32::from(flags), 8);

    let mut codes: HashMap<Vec<u8>, u32> =
        (0..256u32).map(|code| (vec![code as u8], code)).collect();
    let mut next_code = if block_mode { CLEAR_CODE + 1 } else { CLEAR_CODE };
    let mut width = MIN_WIDTH;
    let mut current = Vec::new();

    for &byte in input {
        current.push(byte);
        if (1u32 << width) < next_code && width < max_width {
            width += 1;
        }
        if !codes.contains_key(&current) {
            if next_code <= max_code {
                codes.insert(current.clone(), next_code);
                next_code += 1;
            }
            current.pop();
            let code = codes[&current];
            writer.write_bits(code, width);
            current.clear();
            current.push(byte);
        }
    }
    if !current.is_empty() {
        writer.write_bits(codes[&current], width);
    }
    writer.into_bytes()
}

/// Decompresses a `.Z` stream.
pub fn decode(input: &[u8]) -> Result<Vec<u8>, LzwError> {
    let mut reader = BitReader::new(input);
    let magic0 = reader.read_bits(8).or_lzw_truncated()? as u8;
    let magic1 = reader.read_bits(8).or_lzw_truncated()? as u8;
    ensure_attach!([magic0, magic1] == MAGIC, LzwError::BadMagic);
    let flags = reader.read_bits(8).or_lzw_truncated()? as u8;
    let block_mode = flags & BLOCK_MODE_FLAG != 0;
    let max_width = u32::from(flags & WIDTH_MASK);
    ensure_attach!(
        (MIN_WIDTH..=MAX_WIDTH).contains(&max_width),
        LzwError::UnsupportedWidth(flags & WIDTH_MASK)
    );
    let max_code = (1u32 << max_width) - 1;

    let mut strings: HashMap<u32, Vec<u8>> =
        (0..256u32).map(|code| (code, vec![code as u8])).collect();
    let mut previous: Vec<u8> = Vec::new();
    let mut width = MIN_WIDTH;
    let mut next_code = if block_mode { CLEAR_CODE + 1 } else { CLEAR_CODE };
    let mut output = Vec::new();
    let mut read_bits = 0u64;

    while reader.remaining() >= u64::from(width) {
        let code = reader.read_bits(width).or_lzw_truncated()? as u32;
        read_bits += u64::from(width);
        if block_mode && code == CLEAR_CODE {
            // ncompress pads the code stream to a block of width * 8 bits around a reset.
            let block_bits = u64::from(width) * 8;
            let partial = read_bits % block_bits;
            if partial != 0 {
                let skip = (block_bits - partial).min(reader.remaining());
                reader.advance_bits(skip).or_lzw_truncated()?;
                read_bits = 0;
            }
            strings = (0..256u32).map(|code| (code, vec![code as u8])).collect();
            previous.clear();
            width = MIN_WIDTH;
            next_code = CLEAR_CODE + 1;
            continue;
        }

        let string = match strings.get(&code) {
            Some(string) if code < next_code => string.clone(),
            _ => {
                // The KwKwK case: the code being defined by this very step.
                ensure_attach!(!previous.is_empty(), LzwError::CorruptStream);
                let mut string = previous.clone();
                string.push(previous[0]);
                string
            }
        };
        output.extend_from_slice(&string);

        if !previous.is_empty() && next_code <= max_code {
            let mut entry = previous.clone();
            entry.push(string[0]);
            strings.insert(next_code, entry);
            next_code += 1;
            // Growth caps at the stream's own width: the decoder sits one dictionary entry
            // behind the encoder, so an uncapped check would widen one code too early when the
            // table fills.
            if (1u32 << width) - 1 < next_code && width < max_width {
                width += 1;
            }
        }
        previous = string;
    }
    Ok(output)
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    fn round_trip(input: &[u8]) {
        let encoded = encode(input, MAX_WIDTH, true);
        assert_eq!(decode(&encoded).unwrap(), input, "input of {} bytes", input.len());
    }

    #[test]
    fn round_trip_empty() {
        round_trip(b"");
    }

    #[test]
    fn round_trip_text() {
        round_trip(b"TOBEORNOTTOBEORTOBEORNOT");
        round_trip(b"the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn round_trip_repetitive() {
        round_trip(&vec![b'a'; 5000]);
    }

    #[test]
    fn round_trip_binary() {
        let input: Vec<u8> = (0..=255u8).cycle().take(2048).collect();
        round_trip(&input);
    }

    #[test]
    fn round_trip_narrow_width() {
        // A 9-bit-only dictionary forces the encoder to stop adding entries early.
        let input: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let encoded = encode(&input, 9, true);
        assert_eq!(decode(&encoded).unwrap(), input);
    }

    #[test]
    fn round_trip_without_block_mode() {
        let input = b"abababababababab";
        let encoded = encode(input, 12, false);
        assert_eq!(decode(&encoded).unwrap(), input);
    }

    #[test]
    fn kwkwk_sequence() {
        // `aaa...` produces the code-defined-by-this-step case immediately.
        round_trip(b"aaaaaaaa");
    }

    #[test]
    fn bad_magic_rejected() {
        assert_matches!(
            decode(&[0x1F, 0x8B, 0x90]),
            Err(err) if *err.get_ref() == LzwError::BadMagic
        );
    }

    #[test]
    fn unsupported_width_rejected() {
        assert_matches!(
            decode(&[0x1F, 0x9D, 0x80 | 17]),
            Err(err) if *err.get_ref() == LzwError::UnsupportedWidth(17)
        );
    }
}
