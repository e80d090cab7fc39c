//! MODE SENSE (6) and (10) parameter lists: header, block descriptors and a
//! sparse page table keyed by (page, subpage).

pub mod page_2a;

use std::collections::BTreeMap;

use crate::{
    DecodeError, be16, be24, be32, be64, commands::inquiry::PeripheralDeviceType, ensure_len,
};

pub use page_2a::ModePage2A;

/// One entry of the block descriptor list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// Density code; zero in long LBA descriptors.
    pub density: u8,
    pub blocks: u64,
    pub block_length: u32,
}

/// Mode parameter header, common to both command variants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModeHeader {
    pub medium_type: u8,
    /// Direct-access, MMC and optical devices.
    pub write_protected: bool,
    /// Direct-access, MMC and optical devices.
    pub dpo_fua: bool,
    /// Sequential and printer devices.
    pub buffered_mode: Option<u8>,
    /// Sequential devices.
    pub speed: Option<u8>,
    pub long_lba: bool,
    pub block_descriptors: Vec<BlockDescriptor>,
}

/// A decoded MODE SENSE response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModeSenseData {
    pub header: ModeHeader,
    /// Page bytes including their own header. Subpage 0 means no subpage.
    pub pages: BTreeMap<(u8, u8), Vec<u8>>,
}

impl ModeSenseData {
    /// Decode a MODE SENSE (6) response.
    pub fn decode6(buf: &[u8], device_type: PeripheralDeviceType) -> Result<Self, DecodeError> {
        ensure_len("MODE SENSE (6) header", buf, 4)?;
        let total = (buf[0] as usize + 1).min(buf.len());
        let descriptors_len = buf[3] as usize;
        Self::decode(
            buf,
            device_type,
            Layout {
                header_len: 4,
                total,
                medium_type: buf[1],
                device_specific: buf[2],
                long_lba: false,
                descriptors_len,
            },
        )
    }

    /// Decode a MODE SENSE (10) response.
    pub fn decode10(buf: &[u8], device_type: PeripheralDeviceType) -> Result<Self, DecodeError> {
        ensure_len("MODE SENSE (10) header", buf, 8)?;
        let total = (be16(buf, 0) as usize + 2).min(buf.len());
        Self::decode(
            buf,
            device_type,
            Layout {
                header_len: 8,
                total,
                medium_type: buf[2],
                device_specific: buf[3],
                long_lba: buf[4] & 0x01 != 0,
                descriptors_len: be16(buf, 6) as usize,
            },
        )
    }

    fn decode(
        buf: &[u8],
        device_type: PeripheralDeviceType,
        layout: Layout,
    ) -> Result<Self, DecodeError> {
        let descriptors_end = layout.header_len + layout.descriptors_len;
        ensure_len("mode block descriptors", buf, descriptors_end)?;

        let mut header = ModeHeader {
            medium_type: layout.medium_type,
            long_lba: layout.long_lba,
            ..ModeHeader::default()
        };
        let dsp = layout.device_specific;
        match device_type {
            PeripheralDeviceType::DirectAccess
            | PeripheralDeviceType::MultiMedia
            | PeripheralDeviceType::Optical => {
                header.write_protected = dsp & 0x80 != 0;
                header.dpo_fua = dsp & 0x10 != 0;
            }
            PeripheralDeviceType::SequentialAccess => {
                header.write_protected = dsp & 0x80 != 0;
                header.buffered_mode = Some((dsp >> 4) & 0x07);
                header.speed = Some(dsp & 0x0F);
            }
            PeripheralDeviceType::Printer => {
                header.buffered_mode = Some((dsp >> 4) & 0x07);
            }
            _ => {}
        }

        let stride = if layout.long_lba { 16 } else { 8 };
        let descriptors = &buf[layout.header_len..descriptors_end];
        for entry in descriptors.chunks_exact(stride) {
            header.block_descriptors.push(if layout.long_lba {
                BlockDescriptor {
                    density: 0,
                    blocks: be64(entry, 0),
                    block_length: be32(entry, 12),
                }
            } else {
                BlockDescriptor {
                    density: entry[0],
                    blocks: be24(entry, 1) as u64,
                    block_length: be24(entry, 5),
                }
            });
        }

        let pages = decode_pages(buf, descriptors_end, layout.total);
        Ok(Self { header, pages })
    }

    pub fn page(&self, page: u8, subpage: u8) -> Option<&[u8]> {
        self.pages.get(&(page, subpage)).map(Vec::as_slice)
    }
}

struct Layout {
    header_len: usize,
    total: usize,
    medium_type: u8,
    device_specific: u8,
    long_lba: bool,
    descriptors_len: usize,
}

/// Walk the page list from `start` up to `total`.
fn decode_pages(buf: &[u8], start: usize, total: usize) -> BTreeMap<(u8, u8), Vec<u8>> {
    let mut pages = BTreeMap::new();
    let mut offset = start;
    while offset + 2 <= total {
        let code = buf[offset] & 0x3F;
        if code == 0 {
            pages.insert((0, 0), buf[offset..total].to_vec());
            break;
        }

        let (subpage, len) = if buf[offset] & 0x40 != 0 {
            if offset + 4 > total {
                break;
            }
            (buf[offset + 1], be16(buf, offset + 2) as usize + 4)
        } else {
            (0, buf[offset + 1] as usize + 2)
        };

        if offset + len > total {
            log::debug!(
                "mode page {code:#04x}/{subpage:#04x} overruns the parameter list ({} > {total})",
                offset + len
            );
            break;
        }
        pages.insert((code, subpage), buf[offset..offset + len].to_vec());
        offset += len;
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_plain_page() {
        let mut buf = vec![0u8; 8];
        buf.extend_from_slice(&[0x05, 0x03, 0xAA, 0xBB, 0xCC]);
        buf[1] = (buf.len() - 2) as u8;
        let data = ModeSenseData::decode10(&buf, PeripheralDeviceType::DirectAccess).unwrap();
        assert_eq!(data.pages.len(), 1);
        assert_eq!(data.page(5, 0), Some(&[0x05, 0x03, 0xAA, 0xBB, 0xCC][..]));
    }

    #[test]
    fn subpage_uses_two_byte_length() {
        let mut buf = vec![0u8; 4];
        buf.extend_from_slice(&[0x5C, 0x01, 0x00, 0x02, 0x11, 0x22]);
        buf.extend_from_slice(&[0x01, 0x01, 0x33]);
        buf[0] = (buf.len() - 1) as u8;
        let data = ModeSenseData::decode6(&buf, PeripheralDeviceType::DirectAccess).unwrap();
        assert_eq!(data.page(0x1C, 0x01), Some(&[0x5C, 0x01, 0x00, 0x02, 0x11, 0x22][..]));
        assert_eq!(data.page(0x01, 0), Some(&[0x01, 0x01, 0x33][..]));
    }

    #[test]
    fn stops_at_declared_length() {
        let mut buf = vec![0u8; 4];
        buf.extend_from_slice(&[0x01, 0x02, 0xAA, 0xBB, 0x08, 0x0A, 0, 0]);
        buf[0] = 7 + 3;
        let data = ModeSenseData::decode6(&buf, PeripheralDeviceType::DirectAccess).unwrap();
        assert_eq!(data.pages.keys().collect::<Vec<_>>(), vec![&(1, 0)]);
    }

    #[test]
    fn page_zero_takes_the_rest() {
        let mut buf = vec![0u8; 4];
        buf.extend_from_slice(&[0x00, 0x01, 0x02, 0x03]);
        buf[0] = (buf.len() - 1) as u8;
        let data = ModeSenseData::decode6(&buf, PeripheralDeviceType::DirectAccess).unwrap();
        assert_eq!(data.page(0, 0), Some(&[0x00, 0x01, 0x02, 0x03][..]));
    }

    #[test]
    fn header_and_descriptors() {
        let mut buf = vec![0x00, 0x00, 0x00, 0x90, 0x00, 0x00, 0x00, 0x08];
        buf.extend_from_slice(&[0x44, 0x00, 0x10, 0x00, 0x00, 0x00, 0x02, 0x00]);
        buf[1] = (buf.len() - 2) as u8;
        let data = ModeSenseData::decode10(&buf, PeripheralDeviceType::SequentialAccess).unwrap();
        assert!(data.header.write_protected);
        assert_eq!(data.header.buffered_mode, Some(1));
        assert_eq!(data.header.speed, Some(0));
        assert_eq!(
            data.header.block_descriptors,
            vec![BlockDescriptor {
                density: 0x44,
                blocks: 0x1000,
                block_length: 512
            }]
        );
        assert!(data.pages.is_empty());
    }

    #[test]
    fn long_lba_descriptors() {
        let mut buf = vec![0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x10];
        buf.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x10, 0]);
        buf[1] = (buf.len() - 2) as u8;
        let data = ModeSenseData::decode10(&buf, PeripheralDeviceType::DirectAccess).unwrap();
        assert!(data.header.long_lba);
        assert_eq!(data.header.block_descriptors[0].blocks, 1 << 32);
        assert_eq!(data.header.block_descriptors[0].block_length, 4096);
    }

    #[test]
    fn truncated_descriptor_list() {
        let buf = [0x0B, 0x00, 0x00, 0x08, 0, 0, 0];
        assert!(matches!(
            ModeSenseData::decode6(&buf, PeripheralDeviceType::DirectAccess),
            Err(DecodeError::TruncatedResponse { needed: 12, .. })
        ));
    }
}
