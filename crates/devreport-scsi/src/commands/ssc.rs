//! Stream (tape) command blocks and the small fixed responses that go with them.

use crate::{DecodeError, be16, be24, be32, commands::{CommandBlock, put_be}, ensure_len};

/// REPORT DENSITY SUPPORT.
#[derive(Debug, Clone, Copy)]
pub struct ReportDensitySupportCommand {
    /// Report medium types instead of density codes.
    pub medium_type: bool,
    /// Restrict the report to the loaded medium.
    pub current_media: bool,
    pub alloc_len: u16,
}

impl ReportDensitySupportCommand {
    pub fn new(medium_type: bool, current_media: bool, alloc_len: u16) -> Self {
        Self {
            medium_type,
            current_media,
            alloc_len,
        }
    }
}

impl CommandBlock for ReportDensitySupportCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x44;
        if self.medium_type {
            cdb[1] |= 0x02;
        }
        if self.current_media {
            cdb[1] |= 0x01;
        }
        put_be(&mut cdb, 7, 2, self.alloc_len as u64);
        cdb
    }

    fn len(&self) -> u8 {
        10
    }
}

/// READ BLOCK LIMITS.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadBlockLimitsCommand;

impl CommandBlock for ReadBlockLimitsCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x05;
        cdb
    }

    fn len(&self) -> u8 {
        6
    }
}

/// Response of READ BLOCK LIMITS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLimits {
    /// Byte 0 bits 4..0.
    pub granularity: u8,
    pub max_block_length: u32,
    pub min_block_length: u16,
}

impl BlockLimits {
    pub fn parse(buf: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("READ BLOCK LIMITS data", buf, 6)?;
        Ok(Self {
            granularity: buf[0] & 0x1F,
            max_block_length: be24(buf, 1),
            min_block_length: be16(buf, 4),
        })
    }
}

/// READ MEDIA SERIAL NUMBER, SERVICE ACTION IN (12) with service action 0x01.
#[derive(Debug, Clone, Copy)]
pub struct ReadMediaSerialNumberCommand {
    pub alloc_len: u32,
}

impl CommandBlock for ReadMediaSerialNumberCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0xAB;
        cdb[1] = 0x01;
        put_be(&mut cdb, 6, 4, self.alloc_len as u64);
        cdb
    }

    fn len(&self) -> u8 {
        12
    }
}

/// Bytes a READ MEDIA SERIAL NUMBER response declares, header included.
pub fn media_serial_len(buf: &[u8]) -> Result<usize, DecodeError> {
    ensure_len("media serial number header", buf, 4)?;
    Ok(be32(buf, 0) as usize + 4)
}

/// READ (6) in its stream form: 24-bit length counted in blocks or bytes.
#[derive(Debug, Clone, Copy)]
pub struct StreamRead6Command {
    /// Suppress incorrect length indicator.
    pub sili: bool,
    /// Length is a block count of the fixed block size.
    pub fixed: bool,
    pub transfer_length: u32,
}

impl CommandBlock for StreamRead6Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x08;
        if self.sili {
            cdb[1] |= 0x02;
        }
        if self.fixed {
            cdb[1] |= 0x01;
        }
        put_be(&mut cdb, 2, 3, self.transfer_length as u64);
        cdb
    }

    fn len(&self) -> u8 {
        6
    }
}

/// READ (16) in its stream form.
#[derive(Debug, Clone, Copy)]
pub struct StreamRead16Command {
    pub sili: bool,
    pub fixed: bool,
    pub partition: u8,
    pub object_id: u64,
    pub transfer_length: u32,
}

impl CommandBlock for StreamRead16Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x88;
        if self.sili {
            cdb[1] |= 0x02;
        }
        if self.fixed {
            cdb[1] |= 0x01;
        }
        cdb[3] = self.partition;
        put_be(&mut cdb, 4, 8, self.object_id);
        put_be(&mut cdb, 12, 3, self.transfer_length as u64);
        cdb
    }

    fn len(&self) -> u8 {
        16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_support_cdb() {
        let cdb = ReportDensitySupportCommand::new(true, true, 0xFFFF).to_bytes();
        assert_eq!(&cdb[..10], &[0x44, 0x03, 0, 0, 0, 0, 0, 0xFF, 0xFF, 0]);
    }

    #[test]
    fn block_limits() {
        let limits = BlockLimits::parse(&[0x02, 0x04, 0x00, 0x00, 0x00, 0x01]).unwrap();
        assert_eq!(limits.granularity, 2);
        assert_eq!(limits.max_block_length, 0x40000);
        assert_eq!(limits.min_block_length, 1);
        assert!(BlockLimits::parse(&[0; 5]).is_err());
    }

    #[test]
    fn media_serial() {
        let cdb = ReadMediaSerialNumberCommand { alloc_len: 0x104 }.to_bytes();
        assert_eq!(&cdb[..12], &[0xAB, 0x01, 0, 0, 0, 0, 0, 0, 0x01, 0x04, 0, 0]);
        assert_eq!(media_serial_len(&[0, 0, 0, 12]).unwrap(), 16);
    }

    #[test]
    fn stream_reads() {
        let cdb = StreamRead6Command {
            sili: true,
            fixed: false,
            transfer_length: 0x010000,
        }
        .to_bytes();
        assert_eq!(&cdb[..6], &[0x08, 0x02, 0x01, 0x00, 0x00, 0]);

        let cdb = StreamRead16Command {
            sili: false,
            fixed: true,
            partition: 1,
            object_id: 5,
            transfer_length: 1,
        }
        .to_bytes();
        assert_eq!(cdb[1], 0x01);
        assert_eq!(cdb[3], 1);
        assert_eq!(cdb[11], 5);
        assert_eq!(&cdb[12..15], &[0, 0, 1]);
    }
}
