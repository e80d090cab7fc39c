//! IDENTIFY DEVICE / IDENTIFY PACKET DEVICE data.
//!
//! 256 little-endian words. Accessors are grouped by word number; bit
//! ranges follow ACS. Strings are stored with each byte pair swapped.

use static_assertions::assert_eq_size;
use zerocopy::{FromBytes, little_endian::U16};

use crate::{DecodeError, ensure_len};

pub const IDENTIFY_LEN: usize = 512;

type RawWords = [U16; 256];
assert_eq_size!(RawWords, [u8; IDENTIFY_LEN]);

/// Decode an ATA string: swap each byte pair, then drop trailing spaces and NULs.
///
/// Returns `None` when nothing is left, which callers treat as "not present".
pub fn decode_ata_string(field: &[u8]) -> Option<String> {
    let mut bytes = Vec::with_capacity(field.len());
    for pair in field.chunks(2) {
        match pair {
            [a, b] => bytes.extend_from_slice(&[*b, *a]),
            [a] => bytes.push(*a),
            _ => {}
        }
    }
    while let Some(&last) = bytes.last() {
        if last == b' ' || last == 0 {
            bytes.pop();
        } else {
            break;
        }
    }
    if bytes.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[derive(Clone)]
pub struct IdentifyDevice {
    words: [u16; 256],
    raw: [u8; IDENTIFY_LEN],
}

impl std::fmt::Debug for IdentifyDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifyDevice")
            .field("model", &self.model())
            .field("serial", &self.serial_number())
            .field("firmware", &self.firmware_revision())
            .finish()
    }
}

impl IdentifyDevice {
    pub fn parse(buf: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("IDENTIFY data", buf, IDENTIFY_LEN)?;
        let wire = RawWords::read_from_bytes(&buf[..IDENTIFY_LEN]).map_err(|_| {
            DecodeError::TruncatedResponse {
                structure: "IDENTIFY data",
                needed: IDENTIFY_LEN,
                actual: buf.len(),
            }
        })?;
        let mut raw = [0u8; IDENTIFY_LEN];
        raw.copy_from_slice(&buf[..IDENTIFY_LEN]);
        Ok(Self {
            words: wire.map(|w| w.get()),
            raw,
        })
    }

    /// The 512 bytes exactly as the device sent them.
    pub fn raw(&self) -> &[u8; IDENTIFY_LEN] {
        &self.raw
    }

    pub fn word(&self, index: usize) -> u16 {
        self.words[index]
    }

    fn dword(&self, index: usize) -> u32 {
        self.words[index] as u32 | (self.words[index + 1] as u32) << 16
    }

    fn qword(&self, index: usize) -> u64 {
        (0..4).fold(0u64, |acc, i| acc | (self.words[index + i] as u64) << (16 * i))
    }

    fn string(&self, first: usize, last: usize) -> Option<String> {
        decode_ata_string(&self.raw[first * 2..(last + 1) * 2])
    }

    // Word 0
    pub fn general_configuration(&self) -> u16 {
        self.words[0]
    }

    /// Word 0 bit 15 clear: an ATA device rather than ATAPI.
    pub fn is_ata(&self) -> bool {
        self.words[0] & 0x8000 == 0
    }

    /// Word 0 bit 7: removable media device.
    pub fn is_removable(&self) -> bool {
        self.words[0] & 0x0080 != 0
    }

    /// CompactFlash signature in word 0.
    pub fn is_compact_flash(&self) -> bool {
        self.words[0] == 0x848A
    }

    // Words 1, 3, 6: default geometry.
    pub fn cylinders(&self) -> u16 {
        self.words[1]
    }

    pub fn specific_configuration(&self) -> u16 {
        self.words[2]
    }

    pub fn heads(&self) -> u16 {
        self.words[3]
    }

    pub fn unformatted_bytes_per_track(&self) -> u16 {
        self.words[4]
    }

    pub fn unformatted_bytes_per_sector(&self) -> u16 {
        self.words[5]
    }

    pub fn sectors_per_track(&self) -> u16 {
        self.words[6]
    }

    /// Words 7-8, CompactFlash sectors per card.
    pub fn sectors_per_card(&self) -> u32 {
        (self.words[7] as u32) << 16 | self.words[8] as u32
    }

    pub fn serial_number(&self) -> Option<String> {
        self.string(10, 19)
    }

    pub fn buffer_type(&self) -> u16 {
        self.words[20]
    }

    /// Word 21, buffer size in 512-byte units.
    pub fn buffer_size(&self) -> u16 {
        self.words[21]
    }

    /// Word 22, ECC bytes appended by READ LONG.
    pub fn ecc_bytes(&self) -> u16 {
        self.words[22]
    }

    pub fn firmware_revision(&self) -> Option<String> {
        self.string(23, 26)
    }

    pub fn model(&self) -> Option<String> {
        self.string(27, 46)
    }

    /// Word 47 bits 7..0.
    pub fn multiple_max_sectors(&self) -> u8 {
        self.words[47] as u8
    }

    pub fn trusted_computing(&self) -> u16 {
        self.words[48]
    }

    pub fn capabilities(&self) -> u16 {
        self.words[49]
    }

    /// Word 49 bit 9.
    pub fn supports_lba(&self) -> bool {
        self.words[49] & 0x0200 != 0
    }

    pub fn capabilities2(&self) -> u16 {
        self.words[50]
    }

    /// Word 51 bits 15..8.
    pub fn pio_transfer_timing_mode(&self) -> u8 {
        (self.words[51] >> 8) as u8
    }

    /// Word 52 bits 15..8.
    pub fn dma_transfer_timing_mode(&self) -> u8 {
        (self.words[52] >> 8) as u8
    }

    pub fn extended_identify(&self) -> u16 {
        self.words[53]
    }

    pub fn current_cylinders(&self) -> u16 {
        self.words[54]
    }

    pub fn current_heads(&self) -> u16 {
        self.words[55]
    }

    pub fn current_sectors_per_track(&self) -> u16 {
        self.words[56]
    }

    pub fn current_capacity(&self) -> u32 {
        self.dword(57)
    }

    /// Word 59 bits 7..0, valid when bit 8 is set.
    pub fn multiple_sector_setting(&self) -> Option<u8> {
        (self.words[59] & 0x0100 != 0).then_some(self.words[59] as u8)
    }

    /// Word 59 bits 15..8.
    pub fn capabilities3(&self) -> u8 {
        (self.words[59] >> 8) as u8
    }

    /// Words 60-61.
    pub fn lba_sectors(&self) -> u32 {
        self.dword(60)
    }

    pub fn dma_single_word(&self) -> u16 {
        self.words[62]
    }

    pub fn dma_multi_word(&self) -> u16 {
        self.words[63]
    }

    pub fn advanced_pio_modes(&self) -> u16 {
        self.words[64]
    }

    pub fn min_mdma_cycle_time(&self) -> u16 {
        self.words[65]
    }

    pub fn recommended_mdma_cycle_time(&self) -> u16 {
        self.words[66]
    }

    pub fn min_pio_cycle_time_no_flow(&self) -> u16 {
        self.words[67]
    }

    pub fn min_pio_cycle_time_flow(&self) -> u16 {
        self.words[68]
    }

    pub fn command_set5(&self) -> u16 {
        self.words[69]
    }

    pub fn packet_bus_release(&self) -> u16 {
        self.words[71]
    }

    pub fn service_busy_clear(&self) -> u16 {
        self.words[72]
    }

    pub fn atapi_byte_count(&self) -> u16 {
        self.words[73]
    }

    /// Word 75 bits 4..0 plus one.
    pub fn max_queue_depth(&self) -> u8 {
        (self.words[75] & 0x1F) as u8 + 1
    }

    pub fn sata_capabilities(&self) -> u16 {
        self.words[76]
    }

    pub fn sata_capabilities2(&self) -> u16 {
        self.words[77]
    }

    pub fn sata_features(&self) -> u16 {
        self.words[78]
    }

    pub fn enabled_sata_features(&self) -> u16 {
        self.words[79]
    }

    pub fn major_version(&self) -> u16 {
        self.words[80]
    }

    pub fn minor_version(&self) -> u16 {
        self.words[81]
    }

    pub fn command_set(&self) -> u16 {
        self.words[82]
    }

    pub fn command_set2(&self) -> u16 {
        self.words[83]
    }

    /// Word 83 bit 10.
    pub fn supports_lba48(&self) -> bool {
        self.words[83] & 0x0400 != 0
    }

    pub fn command_set3(&self) -> u16 {
        self.words[84]
    }

    pub fn enabled_command_set(&self) -> u16 {
        self.words[85]
    }

    pub fn enabled_command_set2(&self) -> u16 {
        self.words[86]
    }

    pub fn enabled_command_set3(&self) -> u16 {
        self.words[87]
    }

    pub fn udma(&self) -> u16 {
        self.words[88]
    }

    pub fn security_erase_time(&self) -> u16 {
        self.words[89]
    }

    pub fn enhanced_security_erase_time(&self) -> u16 {
        self.words[90]
    }

    pub fn current_apm(&self) -> u16 {
        self.words[91]
    }

    pub fn master_password_revision(&self) -> u16 {
        self.words[92]
    }

    pub fn hardware_reset_result(&self) -> u16 {
        self.words[93]
    }

    pub fn current_aam(&self) -> u8 {
        self.words[94] as u8
    }

    pub fn recommended_aam(&self) -> u8 {
        (self.words[94] >> 8) as u8
    }

    pub fn stream_min_request_size(&self) -> u16 {
        self.words[95]
    }

    pub fn stream_transfer_time_dma(&self) -> u16 {
        self.words[96]
    }

    pub fn stream_access_latency(&self) -> u16 {
        self.words[97]
    }

    pub fn stream_performance_granularity(&self) -> u32 {
        self.dword(98)
    }

    /// Words 100-103.
    pub fn lba48_sectors(&self) -> u64 {
        self.qword(100)
    }

    pub fn stream_transfer_time_pio(&self) -> u16 {
        self.words[104]
    }

    pub fn data_set_management_size(&self) -> u16 {
        self.words[105]
    }

    pub fn physical_logical_sector_size(&self) -> u16 {
        self.words[106]
    }

    pub fn inter_seek_delay(&self) -> u16 {
        self.words[107]
    }

    /// Words 108-111, most significant word first.
    pub fn world_wide_name(&self) -> u64 {
        (108..112).fold(0u64, |acc, i| acc << 16 | self.words[i] as u64)
    }

    /// Words 117-118, logical sector size in words.
    pub fn logical_sector_words(&self) -> u32 {
        self.dword(117)
    }

    pub fn command_set4(&self) -> u16 {
        self.words[119]
    }

    pub fn enabled_command_set4(&self) -> u16 {
        self.words[120]
    }

    pub fn security_status(&self) -> u16 {
        self.words[128]
    }

    pub fn cfa_power_mode(&self) -> u16 {
        self.words[160]
    }

    pub fn form_factor(&self) -> u16 {
        self.words[168]
    }

    pub fn data_set_management(&self) -> u16 {
        self.words[169]
    }

    /// Words 170-173.
    pub fn additional_product_id(&self) -> Option<String> {
        self.string(170, 173)
    }

    pub fn current_media_serial(&self) -> Option<String> {
        self.string(176, 195)
    }

    pub fn current_media_manufacturer(&self) -> Option<String> {
        self.string(196, 205)
    }

    pub fn sct_command_transport(&self) -> u16 {
        self.words[206]
    }

    /// Word 209 bits 13..0, valid when bits 15..14 are 01b.
    pub fn logical_alignment(&self) -> Option<u16> {
        let w = self.words[209];
        (w & 0xC000 == 0x4000).then_some(w & 0x3FFF)
    }

    pub fn write_read_verify_sectors_mode3(&self) -> u32 {
        self.dword(210)
    }

    pub fn write_read_verify_sectors_mode2(&self) -> u32 {
        self.dword(212)
    }

    pub fn nv_cache_capabilities(&self) -> u16 {
        self.words[214]
    }

    pub fn nv_cache_size(&self) -> u32 {
        self.dword(215)
    }

    /// Word 217: 0 not reported, 1 solid state, else RPM.
    pub fn nominal_rotation_rate(&self) -> u16 {
        self.words[217]
    }

    pub fn nv_cache_options(&self) -> u16 {
        self.words[219]
    }

    pub fn write_read_verify_mode(&self) -> u8 {
        self.words[220] as u8
    }

    pub fn transport_major_version(&self) -> u16 {
        self.words[222]
    }

    pub fn transport_minor_version(&self) -> u16 {
        self.words[223]
    }

    pub fn extended_user_sectors(&self) -> u64 {
        self.qword(230)
    }

    pub fn min_download_microcode(&self) -> u16 {
        self.words[234]
    }

    pub fn max_download_microcode(&self) -> u16 {
        self.words[235]
    }

    /// Word 255: checksum signature 0xA5 in the low byte.
    pub fn integrity_word(&self) -> u16 {
        self.words[255]
    }

    /// Whole buffer sums to zero when the integrity signature is present.
    pub fn checksum_valid(&self) -> Option<bool> {
        if self.words[255] & 0xFF != 0xA5 {
            return None;
        }
        Some(self.raw.iter().fold(0u8, |acc, b| acc.wrapping_add(*b)) == 0)
    }

    fn sector_size_word(&self) -> Option<u16> {
        let w = self.words[106];
        (w & 0xC000 == 0x4000).then_some(w)
    }

    /// Logical sector size in bytes.
    pub fn logical_sector_size(&self) -> u32 {
        match self.sector_size_word() {
            Some(w) if w & 0x1000 != 0 && self.logical_sector_words() != 0 => {
                self.logical_sector_words() * 2
            }
            _ => 512,
        }
    }

    /// Physical sector size in bytes.
    pub fn physical_sector_size(&self) -> u32 {
        let logical = self.logical_sector_size();
        match self.sector_size_word() {
            Some(w) if w & 0x2000 != 0 => logical << (w & 0x000F),
            _ => logical,
        }
    }

    /// Size of a sector as returned by READ LONG.
    pub fn long_block_size(&self) -> u32 {
        let logical = self.logical_sector_size();
        let mut long = logical;
        let ecc = self.ecc_bytes();
        if ecc != 0 && ecc != 0xFFFF {
            long = logical + ecc as u32;
        }
        let unformatted = self.unformatted_bytes_per_sector() as u32;
        if unformatted > logical && (long == logical || unformatted == 516) {
            long = unformatted;
        }
        long
    }

    /// Default geometry, or the current one when all of its fields are set.
    pub fn geometry(&self) -> (u16, u16, u16) {
        if self.current_cylinders() != 0
            && self.current_heads() != 0
            && self.current_sectors_per_track() != 0
        {
            (
                self.current_cylinders(),
                self.current_heads(),
                self.current_sectors_per_track(),
            )
        } else {
            (self.cylinders(), self.heads(), self.sectors_per_track())
        }
    }

    /// Total addressable blocks: 48-bit count, then 28-bit count, then CHS product.
    pub fn blocks(&self) -> u64 {
        if self.supports_lba48() {
            return self.lba48_sectors();
        }
        if self.supports_lba() {
            return self.lba_sectors() as u64;
        }
        let (c, h, s) = self.geometry();
        c as u64 * h as u64 * s as u64
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an IDENTIFY image from (word, value) pairs and ATA strings.
    pub(crate) fn image(words: &[(usize, u16)], strings: &[(usize, usize, &str)]) -> [u8; 512] {
        let mut buf = [0u8; 512];
        for &(index, value) in words {
            buf[index * 2..index * 2 + 2].copy_from_slice(&value.to_le_bytes());
        }
        for &(first, last, text) in strings {
            let field = &mut buf[first * 2..(last + 1) * 2];
            field.fill(b' ');
            field[..text.len()].copy_from_slice(text.as_bytes());
            for pair in field.chunks_mut(2) {
                pair.swap(0, 1);
            }
        }
        buf
    }

    #[test]
    fn strings_are_swapped_and_trimmed() {
        assert_eq!(
            decode_ata_string(b"ASPMELD SI K\0\0\0\0").as_deref(),
            Some("SAMPLE DISK")
        );
        assert_eq!(decode_ata_string(&[0u8; 8]), None);
        assert_eq!(decode_ata_string(b"        "), None);
    }

    #[test]
    fn trim_stops_at_first_kept_byte() {
        assert_eq!(decode_ata_string(b"A   B ").as_deref(), Some(" A   B"));
    }

    #[test]
    fn re_encoding_reproduces_input() {
        for input in [&b"1.00    "[..], b"XDSIK  ", b"ab\0\0"] {
            let even = &input[..input.len() & !1];
            let Some(decoded) = decode_ata_string(even) else {
                continue;
            };
            let mut encoded = decoded.into_bytes();
            encoded.resize(even.len(), b' ');
            for pair in encoded.chunks_mut(2) {
                pair.swap(0, 1);
            }
            let pad = |b: &u8| if *b == 0 { b' ' } else { *b };
            assert_eq!(
                encoded.iter().map(pad).collect::<Vec<_>>(),
                even.iter().map(pad).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn sector_sizes_default_to_512() {
        let id = IdentifyDevice::parse(&image(&[(106, 0x4000)], &[])).unwrap();
        assert_eq!(id.logical_sector_size(), 512);
        assert_eq!(id.physical_sector_size(), 512);

        let id = IdentifyDevice::parse(&image(&[(106, 0x6003)], &[])).unwrap();
        assert_eq!(id.physical_sector_size(), 4096);

        let id = IdentifyDevice::parse(&image(&[(106, 0x5000), (117, 2048)], &[])).unwrap();
        assert_eq!(id.logical_sector_size(), 4096);

        // bit 15 set invalidates the word
        let id = IdentifyDevice::parse(&image(&[(106, 0xE003)], &[])).unwrap();
        assert_eq!(id.physical_sector_size(), 512);
    }

    #[test]
    fn block_count_priority() {
        let lba28 = image(&[(49, 0x0200), (60, 0x0000), (61, 0x0010)], &[]);
        let id = IdentifyDevice::parse(&lba28).unwrap();
        assert_eq!(id.blocks(), 0x0010_0000);

        let lba48 = image(
            &[
                (49, 0x0200),
                (60, 0xFFFF),
                (61, 0x0FFF),
                (83, 0x0400),
                (100, 0x5000),
                (101, 0x0001),
                (102, 0x0001),
            ],
            &[],
        );
        assert_eq!(IdentifyDevice::parse(&lba48).unwrap().blocks(), 0x0001_0001_5000);

        let chs = image(&[(1, 100), (3, 16), (6, 63)], &[]);
        assert_eq!(IdentifyDevice::parse(&chs).unwrap().blocks(), 100_800);

        let current = image(&[(1, 100), (3, 16), (6, 63), (54, 50), (55, 16), (56, 63)], &[]);
        assert_eq!(IdentifyDevice::parse(&current).unwrap().blocks(), 50_400);
    }

    #[test]
    fn long_block_size() {
        let id = IdentifyDevice::parse(&image(&[(22, 4)], &[])).unwrap();
        assert_eq!(id.long_block_size(), 516);
        let id = IdentifyDevice::parse(&image(&[(22, 0xFFFF), (5, 600)], &[])).unwrap();
        assert_eq!(id.long_block_size(), 600);
        let id = IdentifyDevice::parse(&image(&[(22, 40), (5, 516)], &[])).unwrap();
        assert_eq!(id.long_block_size(), 516);
        let id = IdentifyDevice::parse(&image(&[(22, 40), (5, 600)], &[])).unwrap();
        assert_eq!(id.long_block_size(), 552);
    }

    #[test]
    fn identity_strings() {
        let buf = image(
            &[(0, 0x0040)],
            &[(10, 19, "SN123"), (23, 26, "1.00"), (27, 46, "SAMPLE DISK"), (170, 173, "")],
        );
        let id = IdentifyDevice::parse(&buf).unwrap();
        assert_eq!(id.model().as_deref(), Some("SAMPLE DISK"));
        assert_eq!(id.serial_number().as_deref(), Some("SN123"));
        assert_eq!(id.firmware_revision().as_deref(), Some("1.00"));
        assert_eq!(id.additional_product_id(), None);
        assert!(id.is_ata());
        assert!(!id.is_removable());
    }

    #[test]
    fn truncated() {
        assert_eq!(
            IdentifyDevice::parse(&[0u8; 100]).unwrap_err(),
            DecodeError::TruncatedResponse {
                structure: "IDENTIFY data",
                needed: 512,
                actual: 100
            }
        );
    }

    #[test]
    fn checksum() {
        let mut buf = image(&[(255, 0x00A5)], &[]);
        assert_eq!(IdentifyDevice::parse(&buf).unwrap().checksum_valid(), Some(false));
        buf[511] = 0u8.wrapping_sub(0xA5);
        assert_eq!(IdentifyDevice::parse(&buf).unwrap().checksum_valid(), Some(true));
    }
}
