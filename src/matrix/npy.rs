// src/matrix/npy.rs

//! Minimal `.npy` (format 1.0) codec for square `int8` matrices.

use std::io::Write;

use crate::error::{Error, Result};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const PREFIX_LEN: usize = 10;
const ALIGNMENT: usize = 64;

/// Header dictionary for an `n x n` C-order `int8` array, padded so that
/// prefix plus header is a multiple of 64 bytes and ends in `\n`.
pub fn header_for(n: usize) -> Vec<u8> {
    let dict = format!("{{'descr': '|i1', 'fortran_order': False, 'shape': ({}, {}), }}", n, n);
    let unpadded = PREFIX_LEN + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;

    let mut header = dict.into_bytes();
    header.resize(header.len() + padding, b' ');
    header.push(b'\n');
    header
}

/// Cell count of an `n x n` matrix, or an error if it does not fit in `usize`.
pub fn square_len(n: usize) -> Result<usize> {
    n.checked_mul(n)
        .ok_or_else(|| Error::matrix(format!("a {}x{} matrix is too large to address", n, n)))
}

pub fn write_square_i8<W: Write>(mut writer: W, n: usize, data: &[i8]) -> Result<()> {
    if data.len() != square_len(n)? {
        return Err(Error::matrix(format!("{} cells do not form a {}x{} matrix", data.len(), n, n)));
    }
    let header = header_for(n);
    let header_len = u16::try_from(header.len())
        .map_err(|_| Error::matrix(format!("header of {} bytes is too long", header.len())))?;

    writer.write_all(MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_all(&header_len.to_le_bytes())?;
    writer.write_all(&header)?;
    // i8 and u8 share a layout.
    let bytes: Vec<u8> = data.iter().map(|&d| d as u8).collect();
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Parses a square `int8` array, returning its side length and cells.
pub fn read_square_i8(bytes: &[u8]) -> Result<(usize, Vec<i8>)> {
    if bytes.len() < PREFIX_LEN || &bytes[..6] != MAGIC {
        return Err(Error::matrix("missing .npy magic"));
    }
    let (major, minor) = (bytes[6], bytes[7]);
    if (major, minor) != (1, 0) {
        return Err(Error::matrix(format!("unsupported .npy version {}.{}", major, minor)));
    }
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let data_start = PREFIX_LEN + header_len;
    if bytes.len() < data_start {
        return Err(Error::matrix("truncated .npy header"));
    }
    let header = std::str::from_utf8(&bytes[PREFIX_LEN..data_start])
        .map_err(|_| Error::matrix("header is not ASCII"))?;

    let descr = dict_value(header, "descr")?;
    if !matches!(descr, "'|i1'" | "'i1'" | "'<i1'" | "'>i1'") {
        return Err(Error::matrix(format!("expected int8 data, found descr {}", descr)));
    }
    if dict_value(header, "fortran_order")? != "False" {
        return Err(Error::matrix("Fortran-ordered arrays are not supported"));
    }
    let n = parse_square_shape(dict_value(header, "shape")?)?;

    let cells = square_len(n)?;
    let data = &bytes[data_start..];
    if data.len() != cells {
        return Err(Error::matrix(format!(
            "expected {} data bytes for a {}x{} matrix, found {}", cells, n, n, data.len()
        )));
    }
    Ok((n, data.iter().map(|&b| b as i8).collect()))
}

/// Raw text of the value stored under `key` in the header dictionary.
fn dict_value<'a>(header: &'a str, key: &str) -> Result<&'a str> {
    let needle = format!("'{}':", key);
    let start = header
        .find(&needle)
        .map(|pos| pos + needle.len())
        .ok_or_else(|| Error::matrix(format!("header has no {:?} entry", key)))?;
    let rest = header[start..].trim_start();

    let end = if rest.starts_with('(') {
        rest.find(')').map(|p| p + 1)
    } else {
        rest.find(|c| c == ',' || c == '}')
    }
    .ok_or_else(|| Error::matrix(format!("unterminated {:?} entry", key)))?;

    Ok(rest[..end].trim())
}

fn parse_square_shape(shape: &str) -> Result<usize> {
    let inner = shape
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| Error::matrix(format!("malformed shape {}", shape)))?;
    let dims = inner
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| d.parse::<usize>().map_err(|_| Error::matrix(format!("malformed shape {}", shape))))
        .collect::<Result<Vec<_>>>()?;

    match dims.as_slice() {
        [rows, cols] if rows == cols => Ok(*rows),
        _ => Err(Error::matrix(format!("expected a square 2-d shape, found {}", shape))),
    }
}
