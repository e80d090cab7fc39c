pub mod inquiry;
pub mod mmc;
pub mod mode_sense;
pub mod read;
pub mod read_capacity;
pub mod read_long;
pub mod ssc;
pub mod unit;
pub mod vendor;

/// Direction of the data phase of a command, as seen from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// No data is transferred.
    None,
    /// Device to host.
    In,
    /// Host to device.
    Out,
    /// Either way. Only used for pass-through protocols without a fixed direction.
    Bidirectional,
}

pub trait CommandBlock {
    /// Return the command bytes (CDB), zero padded to 16 bytes.
    fn to_bytes(&self) -> [u8; 16];

    /// Return the effective length of the command.
    fn len(&self) -> u8;

    /// Return the direction of the data phase.
    fn direction(&self) -> Direction {
        Direction::In
    }

    /// Operation code, byte 0 of the CDB.
    fn opcode(&self) -> u8 {
        self.to_bytes()[0]
    }
}

/// Write `value` big-endian into `cdb[offset..offset + width]`, keeping the low `width` bytes.
pub(crate) fn put_be(cdb: &mut [u8], offset: usize, width: usize, value: u64) {
    let bytes = value.to_be_bytes();
    cdb[offset..offset + width].copy_from_slice(&bytes[8 - width..]);
}

/// Convert an absolute MSF address (`0x00MMSSFF`) into its three CDB bytes.
pub(crate) fn msf_bytes(msf: u32) -> [u8; 3] {
    [(msf >> 16) as u8, (msf >> 8) as u8, msf as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_be_truncates_to_width() {
        let mut cdb = [0u8; 8];
        put_be(&mut cdb, 1, 3, 0x1122_3344);
        assert_eq!(cdb, [0, 0x22, 0x33, 0x44, 0, 0, 0, 0]);
    }

    #[test]
    fn msf_split() {
        assert_eq!(msf_bytes(0x0002_1004), [0x02, 0x10, 0x04]);
    }
}
