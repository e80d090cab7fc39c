//! Mode page 2Ah, CD/DVD capabilities and mechanical status.

use crate::{DecodeError, be16, ensure_len};

pub const PAGE_CODE: u8 = 0x2A;

/// One write speed performance descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSpeedDescriptor {
    pub rotation_control: u8,
    /// kB/s.
    pub write_speed: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModePage2A {
    pub read_cd_r: bool,
    pub read_cd_rw: bool,
    pub method2: bool,
    pub read_dvd_rom: bool,
    pub read_dvd_r: bool,
    pub read_dvd_ram: bool,

    pub write_cd_r: bool,
    pub write_cd_rw: bool,
    pub test_write: bool,
    pub write_dvd_r: bool,
    pub write_dvd_ram: bool,

    pub audio_play: bool,
    pub composite: bool,
    pub digital_port1: bool,
    pub digital_port2: bool,
    pub mode2_form1: bool,
    pub mode2_form2: bool,
    pub multi_session: bool,
    pub buffer_underrun_free: bool,

    pub cdda_command: bool,
    pub accurate_cdda: bool,
    pub subchannel: bool,
    pub deinterleave_subchannel: bool,
    pub c2_pointer: bool,
    pub isrc: bool,
    pub upc: bool,
    pub read_barcode: bool,

    pub lock: bool,
    pub lock_state: bool,
    pub prevent_jumper: bool,
    pub eject: bool,
    pub loading_mechanism: u8,

    pub separate_volume: bool,
    pub separate_channel_mute: bool,
    pub disc_present_reporting: bool,
    pub software_slot_selection: bool,
    pub side_change: bool,
    pub lead_in_pw: bool,

    /// kB/s; obsolete since MMC-3.
    pub max_read_speed: u16,
    pub volume_levels: u16,
    /// KiB.
    pub buffer_size: u16,
    /// kB/s; obsolete since MMC-3.
    pub current_read_speed: u16,

    pub bit_clock: Option<bool>,
    pub rck: Option<bool>,
    pub lsbf: Option<bool>,
    pub length: Option<u8>,
    pub max_write_speed: Option<u16>,
    pub current_write_speed: Option<u16>,
    pub copy_management_revision: Option<u16>,
    pub rotation_control_selected: Option<u8>,
    pub current_write_speed_selected: Option<u16>,
    pub write_speeds: Vec<WriteSpeedDescriptor>,
}

impl ModePage2A {
    /// Decode the page starting at its page code byte.
    pub fn decode(page: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("mode page 2Ah", page, 16)?;
        let end = (page[1] as usize + 2).min(page.len());
        let bit = |byte: usize, mask: u8| page[byte] & mask != 0;

        let mut decoded = Self {
            read_cd_r: bit(2, 0x01),
            read_cd_rw: bit(2, 0x02),
            method2: bit(2, 0x04),
            read_dvd_rom: bit(2, 0x08),
            read_dvd_r: bit(2, 0x10),
            read_dvd_ram: bit(2, 0x20),

            write_cd_r: bit(3, 0x01),
            write_cd_rw: bit(3, 0x02),
            test_write: bit(3, 0x04),
            write_dvd_r: bit(3, 0x10),
            write_dvd_ram: bit(3, 0x20),

            audio_play: bit(4, 0x01),
            composite: bit(4, 0x02),
            digital_port1: bit(4, 0x04),
            digital_port2: bit(4, 0x08),
            mode2_form1: bit(4, 0x10),
            mode2_form2: bit(4, 0x20),
            multi_session: bit(4, 0x40),
            buffer_underrun_free: bit(4, 0x80),

            cdda_command: bit(5, 0x01),
            accurate_cdda: bit(5, 0x02),
            subchannel: bit(5, 0x04),
            deinterleave_subchannel: bit(5, 0x08),
            c2_pointer: bit(5, 0x10),
            isrc: bit(5, 0x20),
            upc: bit(5, 0x40),
            read_barcode: bit(5, 0x80),

            lock: bit(6, 0x01),
            lock_state: bit(6, 0x02),
            prevent_jumper: bit(6, 0x04),
            eject: bit(6, 0x08),
            loading_mechanism: page[6] >> 5,

            separate_volume: bit(7, 0x01),
            separate_channel_mute: bit(7, 0x02),
            disc_present_reporting: bit(7, 0x04),
            software_slot_selection: bit(7, 0x08),
            side_change: bit(7, 0x10),
            lead_in_pw: bit(7, 0x20),

            max_read_speed: be16(page, 8),
            volume_levels: be16(page, 10),
            buffer_size: be16(page, 12),
            current_read_speed: be16(page, 14),
            ..Self::default()
        };

        if end >= 20 {
            decoded.bit_clock = Some(bit(17, 0x02));
            decoded.rck = Some(bit(17, 0x04));
            decoded.lsbf = Some(bit(17, 0x08));
            decoded.length = Some((page[17] >> 4) & 0x03);
            decoded.max_write_speed = Some(be16(page, 18));
        }
        if end >= 22 {
            decoded.current_write_speed = Some(be16(page, 20));
        }
        if end >= 24 {
            decoded.copy_management_revision = Some(be16(page, 22));
        }
        if end >= 32 {
            decoded.rotation_control_selected = Some(page[27] & 0x03);
            decoded.current_write_speed_selected = Some(be16(page, 28));
            let count = be16(page, 30) as usize;
            decoded.write_speeds = page[32..end]
                .chunks_exact(4)
                .take(count)
                .map(|d| WriteSpeedDescriptor {
                    rotation_control: d[1] & 0x03,
                    write_speed: be16(d, 2),
                })
                .collect();
        }

        Ok(decoded)
    }

    /// Any DVD read or write capability.
    pub fn handles_dvd(&self) -> bool {
        self.read_dvd_rom || self.read_dvd_r || self.read_dvd_ram || self.write_dvd_r || self.write_dvd_ram
    }
}
