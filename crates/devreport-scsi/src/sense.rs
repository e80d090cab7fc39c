//! Sense data, in both the fixed (0x70/0x71) and descriptor (0x72/0x73) formats.

use std::fmt;

/// Sense bytes returned by every transport call.
pub type SenseBuffer = [u8; 32];

/// Sense keys, byte 2 bits 3..0 of fixed sense, byte 1 of descriptor sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenseKey {
    NoSense,
    RecoveredError,
    NotReady,
    MediumError,
    HardwareError,
    IllegalRequest,
    UnitAttention,
    DataProtect,
    BlankCheck,
    VendorSpecific,
    CopyAborted,
    AbortedCommand,
    VolumeOverflow,
    Miscompare,
    Completed,
    Reserved,
}

impl From<u8> for SenseKey {
    fn from(value: u8) -> Self {
        match value & 0x0F {
            0x0 => Self::NoSense,
            0x1 => Self::RecoveredError,
            0x2 => Self::NotReady,
            0x3 => Self::MediumError,
            0x4 => Self::HardwareError,
            0x5 => Self::IllegalRequest,
            0x6 => Self::UnitAttention,
            0x7 => Self::DataProtect,
            0x8 => Self::BlankCheck,
            0x9 => Self::VendorSpecific,
            0xA => Self::CopyAborted,
            0xB => Self::AbortedCommand,
            0xD => Self::VolumeOverflow,
            0xE => Self::Miscompare,
            0xF => Self::Completed,
            _ => Self::Reserved,
        }
    }
}

/// Decoded sense data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenseInfo {
    pub response_code: u8,
    pub key: SenseKey,
    pub asc: u8,
    pub ascq: u8,
    /// The information field holds a defined value.
    pub valid: bool,
    /// Incorrect length indicator.
    pub ili: bool,
    pub filemark: bool,
    pub end_of_medium: bool,
    pub information: u64,
}

impl SenseInfo {
    /// Decode a sense buffer. `None` when the response code is neither fixed nor descriptor format.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let response_code = *buf.first()? & 0x7F;
        match response_code {
            0x70 | 0x71 => Self::decode_fixed(buf),
            0x72 | 0x73 => Self::decode_descriptor(buf),
            _ => None,
        }
    }

    fn decode_fixed(buf: &[u8]) -> Option<Self> {
        if buf.len() < 14 {
            return None;
        }
        Some(Self {
            response_code: buf[0] & 0x7F,
            key: SenseKey::from(buf[2]),
            asc: buf[12],
            ascq: buf[13],
            valid: buf[0] & 0x80 != 0,
            ili: buf[2] & 0x20 != 0,
            filemark: buf[2] & 0x80 != 0,
            end_of_medium: buf[2] & 0x40 != 0,
            information: u32::from_be_bytes([buf[3], buf[4], buf[5], buf[6]]) as u64,
        })
    }

    fn decode_descriptor(buf: &[u8]) -> Option<Self> {
        if buf.len() < 8 {
            return None;
        }
        let mut info = Self {
            response_code: buf[0] & 0x7F,
            key: SenseKey::from(buf[1]),
            asc: buf[2],
            ascq: buf[3],
            valid: false,
            ili: false,
            filemark: false,
            end_of_medium: false,
            information: 0,
        };

        let end = (8 + buf[7] as usize).min(buf.len());
        let mut offset = 8;
        while offset + 2 <= end {
            let kind = buf[offset];
            let len = buf[offset + 1] as usize;
            let body = &buf[offset..(offset + 2 + len).min(end)];
            match kind {
                0x00 if body.len() >= 12 => {
                    info.valid = body[2] & 0x80 != 0;
                    let mut bytes = [0u8; 8];
                    bytes.copy_from_slice(&body[4..12]);
                    info.information = u64::from_be_bytes(bytes);
                }
                0x04 if body.len() >= 4 => {
                    info.filemark = body[3] & 0x80 != 0;
                    info.end_of_medium = body[3] & 0x40 != 0;
                    info.ili = body[3] & 0x20 != 0;
                }
                _ => {}
            }
            offset += 2 + len;
        }

        Some(info)
    }

    /// MEDIUM NOT PRESENT.
    pub fn medium_not_present(&self) -> bool {
        self.asc == 0x3A
    }

    /// NOT READY TO READY CHANGE, MEDIUM MAY HAVE CHANGED.
    pub fn medium_changed(&self) -> bool {
        self.asc == 0x28
    }

    /// LOGICAL UNIT IS IN PROCESS OF BECOMING READY.
    pub fn becoming_ready(&self) -> bool {
        self.asc == 0x04 && self.ascq == 0x01
    }

    /// Any of the conditions worth waiting out after a medium is inserted.
    pub fn worth_waiting(&self) -> bool {
        self.medium_not_present() || self.medium_changed() || self.becoming_ready()
    }

    /// INVALID FIELD IN CDB.
    pub fn invalid_field_in_cdb(&self) -> bool {
        self.key == SenseKey::IllegalRequest && self.asc == 0x24 && self.ascq == 0x00
    }
}

impl fmt::Display for SenseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} (ASC {:02X}h ASCQ {:02X}h)",
            self.key, self.asc, self.ascq
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(key: u8, asc: u8, ascq: u8) -> SenseBuffer {
        let mut buf = [0u8; 32];
        buf[0] = 0x70;
        buf[2] = key;
        buf[7] = 10;
        buf[12] = asc;
        buf[13] = ascq;
        buf
    }

    #[test]
    fn fixed_format() {
        let mut buf = fixed(0x05, 0x24, 0x00);
        buf[0] |= 0x80;
        buf[2] |= 0x20;
        buf[3..7].copy_from_slice(&[0, 0, 0xF7, 0xD7]);
        let sense = SenseInfo::decode(&buf).unwrap();
        assert_eq!(sense.key, SenseKey::IllegalRequest);
        assert!(sense.valid && sense.ili);
        assert!(sense.invalid_field_in_cdb());
        assert_eq!(sense.information, 0xF7D7);
    }

    #[test]
    fn descriptor_format_with_information() {
        let mut buf = [0u8; 32];
        buf[0] = 0x72;
        buf[1] = 0x02;
        buf[2] = 0x04;
        buf[3] = 0x01;
        buf[7] = 18;
        buf[8..20].copy_from_slice(&[0x00, 0x0A, 0x80, 0, 0, 0, 0, 0, 0, 0, 0x01, 0x02]);
        buf[20..24].copy_from_slice(&[0x04, 0x02, 0x00, 0x20]);
        let sense = SenseInfo::decode(&buf).unwrap();
        assert_eq!(sense.key, SenseKey::NotReady);
        assert!(sense.becoming_ready());
        assert!(sense.worth_waiting());
        assert!(sense.valid);
        assert!(sense.ili);
        assert_eq!(sense.information, 0x0102);
    }

    #[test]
    fn ready_conditions() {
        assert!(SenseInfo::decode(&fixed(2, 0x3A, 0)).unwrap().worth_waiting());
        assert!(SenseInfo::decode(&fixed(6, 0x28, 0)).unwrap().worth_waiting());
        assert!(!SenseInfo::decode(&fixed(2, 0x04, 0x02)).unwrap().worth_waiting());
    }

    #[test]
    fn unknown_response_code() {
        assert!(SenseInfo::decode(&[0u8; 32]).is_none());
        assert!(SenseInfo::decode(&[]).is_none());
    }
}
