//! Minimal BER-TLV support for secure messaging data objects.
//!
//! Secure messaging only uses single-byte tags. Lengths may use the short form
//! or the `81`/`82` long forms.

use crate::error::{SmartcardError, SmartcardResult};

pub const TAG_CRYPTOGRAM: u8 = 0x87;
pub const TAG_EXPECTED_LENGTH: u8 = 0x97;
pub const TAG_STATUS_WORD: u8 = 0x99;
pub const TAG_CRYPTOGRAPHIC_CHECKSUM: u8 = 0x8E;

/// One data object borrowed from a larger buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataObject<'a> {
    pub tag: u8,
    pub value: &'a [u8],
    /// Complete encoding (tag, length and value)
    pub raw: &'a [u8],
}

/// Encode one data object. Values longer than `0xFFFF` bytes have no length
/// encoding here and are refused.
pub fn encode(tag: u8, value: &[u8]) -> SmartcardResult<Vec<u8>> {
    let mut out = Vec::with_capacity(value.len() + 4);
    out.push(tag);
    match value.len() {
        len @ 0..=0x7F => out.push(len as u8),
        len @ 0x80..=0xFF => out.extend_from_slice(&[0x81, len as u8]),
        len => {
            let len = u16::try_from(len)
                .map_err(|_| SmartcardError::ApduTooLong { length: value.len() })?;
            out.push(0x82);
            out.extend_from_slice(&len.to_be_bytes());
        }
    }
    out.extend_from_slice(value);
    Ok(out)
}

/// Split `data` into consecutive data objects.
pub fn parse(data: &[u8]) -> SmartcardResult<Vec<DataObject<'_>>> {
    let mut objects = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let start = offset;
        let tag = data[offset];
        offset += 1;

        let (length, length_size) = read_length(&data[offset..])?;
        offset += length_size;

        let end = offset
            .checked_add(length)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| {
                SmartcardError::MalformedResponse(format!(
                    "data object {:02X} overruns buffer ({} bytes declared)",
                    tag, length
                ))
            })?;

        objects.push(DataObject {
            tag,
            value: &data[offset..end],
            raw: &data[start..end],
        });
        offset = end;
    }

    Ok(objects)
}

fn read_length(data: &[u8]) -> SmartcardResult<(usize, usize)> {
    match data {
        [len, ..] if *len < 0x80 => Ok((usize::from(*len), 1)),
        [0x81, len, ..] => Ok((usize::from(*len), 2)),
        [0x82, hi, lo, ..] => Ok((usize::from(u16::from_be_bytes([*hi, *lo])), 3)),
        _ => Err(SmartcardError::MalformedResponse(
            "unsupported or truncated TLV length".to_string(),
        )),
    }
}

/// First data object with `tag`, if any.
pub fn find<'a>(objects: &[DataObject<'a>], tag: u8) -> Option<DataObject<'a>> {
    objects.iter().find(|o| o.tag == tag).copied()
}
