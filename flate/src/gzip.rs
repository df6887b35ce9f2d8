//! The gzip container (RFC 1952): a thin wrapper over DEFLATE plus CRC-32 and trailer checks.

use bytes::Buf;
use log::debug;
use wirekit_common::{ensure_attach, Result};

use crate::deflate::deflate;
use crate::error::GzipError;
use crate::inflate::inflate;

//
// constants
//

const MAGIC: [u8; 2] = [0x1F, 0x8B];
const CM_DEFLATE: u8 = 8;

const FLG_FHCRC: u8 = 1 << 1;
const FLG_FEXTRA: u8 = 1 << 2;
const FLG_FNAME: u8 = 1 << 3;
const FLG_FCOMMENT: u8 = 1 << 4;
const FLG_RESERVED: u8 = 0xE0;

const OS_UNKNOWN: u8 = 255;
const TRAILER_LEN: usize = 8;

//
// public functions
//

/// Wraps `input` in a gzip member: header, DEFLATE body, CRC-32 and ISIZE trailer.
pub fn encode(input: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len() / 2 + 18);
    output.extend_from_slice(&MAGIC);
    output.push(CM_DEFLATE);
    output.push(0); // FLG
    output.extend_from_slice(&[0; 4]); // MTIME
    output.push(0); // XFL
    output.push(OS_UNKNOWN);
    output.extend_from_slice(&deflate(input));
    output.extend_from_slice(&crc32(input).to_le_bytes());
    output.extend_from_slice(&(input.len() as u32).to_le_bytes());
    output
}

/// Unwraps a gzip member, verifying the header and both trailer checks.
pub fn decode(input: &[u8]) -> Result<Vec<u8>, GzipError> {
    let mut buf = input;

    let id = read_array::<2>(&mut buf)?;
    ensure_attach!(id == MAGIC, GzipError::BadMagic);
    let cm = read_u8(&mut buf)?;
    ensure_attach!(cm == CM_DEFLATE, GzipError::UnsupportedMethod(cm));
    let flg = read_u8(&mut buf)?;
    ensure_attach!(flg & FLG_RESERVED == 0, GzipError::ReservedFlags);
    let _mtime = read_array::<4>(&mut buf)?;
    let _xfl = read_u8(&mut buf)?;
    let _os = read_u8(&mut buf)?;

    if flg & FLG_FEXTRA != 0 {
        let xlen = u16::from_le_bytes(read_array::<2>(&mut buf)?) as usize;
        ensure_attach!(buf.remaining() >= xlen, GzipError::TruncatedStream);
        buf.advance(xlen);
    }
    if flg & FLG_FNAME != 0 {
        let name = read_zero_terminated(&mut buf)?;
        debug!("member file name: {}", String::from_utf8_lossy(&name));
    }
    if flg & FLG_FCOMMENT != 0 {
        read_zero_terminated(&mut buf)?;
    }
    if flg & FLG_FHCRC != 0 {
        let header_len = input.len() - buf.remaining();
        let crc16 = u16::from_le_bytes(read_array::<2>(&mut buf)?);
        ensure_attach!(
            crc32(&input[..header_len]) as u16 == crc16,
            GzipError::HeaderChecksumMismatch
        );
    }

    ensure_attach!(buf.remaining() >= TRAILER_LEN, GzipError::TruncatedStream);
    let body_len = buf.remaining() - TRAILER_LEN;
    let output = inflate(&buf[..body_len]).map_err(|err| GzipError::Deflate(err.into_inner()))?;
    buf.advance(body_len);

    let crc = u32::from_le_bytes(read_array::<4>(&mut buf)?);
    ensure_attach!(crc32(&output) == crc, GzipError::DataChecksumMismatch);
    let isize = u32::from_le_bytes(read_array::<4>(&mut buf)?);
    ensure_attach!(output.len() as u32 == isize, GzipError::SizeMismatch);
    Ok(output)
}

/// The CRC-32 of `bytes` (reflected, polynomial 0xEDB88320, as used by gzip).
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in bytes {
        crc = CRC_TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8);
    }
    !crc
}

//
// private functions
//

const CRC_TABLE: [u32; 256] = crc_table();

const fn crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

fn read_u8(buf: &mut &[u8]) -> Result<u8, GzipError> {
    ensure_attach!(buf.remaining() >= 1, GzipError::TruncatedStream);
    Ok(buf.get_u8())
}

fn read_array<const N: usize>(buf: &mut &[u8]) -> Result<[u8; N], GzipError> {
    ensure_attach!(buf.remaining() >= N, GzipError::TruncatedStream);
    let mut array = [0; N];
    buf.copy_to_slice(&mut array);
    Ok(array)
}

fn read_zero_terminated(buf: &mut &[u8]) -> Result<Vec<u8>, GzipError> {
    let mut data = Vec::new();
    loop {
        match read_u8(buf)? {
            0 => return Ok(data),
            byte => data.push(byte),
        }
    }
}
