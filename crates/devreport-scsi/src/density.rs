//! REPORT DENSITY SUPPORT responses.
//!
//! Both walks advance by the descriptor's own length when it gives one and
//! by the standard size otherwise, since several drives misreport it.

use crate::{DecodeError, ascii_field, be16, be24, be32, ensure_len};

pub const DENSITY_DESCRIPTOR_LEN: usize = 52;
pub const MEDIUM_TYPE_DESCRIPTOR_LEN: usize = 56;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityDescriptor {
    pub primary_code: u8,
    pub secondary_code: u8,
    pub writable: bool,
    pub duplicate: bool,
    pub default_density: bool,
    pub bits_per_mm: u32,
    /// Tenths of a millimetre.
    pub media_width: u16,
    pub tracks: u16,
    /// Megabytes.
    pub capacity: u32,
    pub organization: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediumTypeDescriptor {
    pub medium_type: u8,
    pub density_codes: Vec<u8>,
    /// Tenths of a millimetre.
    pub media_width: u16,
    /// Metres.
    pub medium_length: u16,
    pub organization: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Descriptor area of a response: from byte 4 up to the declared length.
fn descriptor_area(buf: &[u8]) -> Result<&[u8], DecodeError> {
    ensure_len("density support header", buf, 4)?;
    let end = (be16(buf, 0) as usize + 2).min(buf.len());
    Ok(buf.get(4..end).unwrap_or(&[]))
}

/// Decode the density code form of the response.
pub fn decode_densities(buf: &[u8]) -> Result<Vec<DensityDescriptor>, DecodeError> {
    let area = descriptor_area(buf)?;
    let mut out = Vec::new();
    let mut offset = 0;
    while offset + DENSITY_DESCRIPTOR_LEN <= area.len() {
        let d = &area[offset..offset + DENSITY_DESCRIPTOR_LEN];
        let length_valid = d[2] & 0x01 != 0;
        out.push(DensityDescriptor {
            primary_code: d[0],
            secondary_code: d[1],
            writable: d[2] & 0x80 != 0,
            duplicate: d[2] & 0x40 != 0,
            default_density: d[2] & 0x20 != 0,
            bits_per_mm: be24(d, 5),
            media_width: be16(d, 8),
            tracks: be16(d, 10),
            capacity: be32(d, 12),
            organization: ascii_field(&d[16..24]),
            name: ascii_field(&d[24..32]),
            description: ascii_field(&d[32..52]),
        });
        offset += if length_valid {
            be16(d, 3) as usize + 5
        } else {
            DENSITY_DESCRIPTOR_LEN
        };
    }
    Ok(out)
}

/// Decode the medium type form of the response.
pub fn decode_medium_types(buf: &[u8]) -> Result<Vec<MediumTypeDescriptor>, DecodeError> {
    let area = descriptor_area(buf)?;
    let mut out = Vec::new();
    let mut offset = 0;
    while offset + MEDIUM_TYPE_DESCRIPTOR_LEN <= area.len() {
        let d = &area[offset..offset + MEDIUM_TYPE_DESCRIPTOR_LEN];
        let count = (d[4] as usize).min(9);
        out.push(MediumTypeDescriptor {
            medium_type: d[0],
            density_codes: d[5..5 + count].to_vec(),
            media_width: be16(d, 14),
            medium_length: be16(d, 16),
            organization: ascii_field(&d[20..28]),
            name: ascii_field(&d[28..36]),
            description: ascii_field(&d[36..56]),
        });
        let declared = be16(d, 2) as usize;
        offset += if declared != 0 {
            declared + 4
        } else {
            MEDIUM_TYPE_DESCRIPTOR_LEN
        };
    }
    Ok(out)
}
