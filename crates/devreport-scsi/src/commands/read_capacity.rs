use crate::{DecodeError, be32, be64, commands::{CommandBlock, put_be}, ensure_len};

/// READ CAPACITY (10) command: returns 8 bytes of capacity data
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadCapacity10Command {
    pub rel_addr: bool,
    pub logical_block_address: u32,
    /// Partial medium indicator.
    pub pmi: bool,
}

impl ReadCapacity10Command {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommandBlock for ReadCapacity10Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x25; // READ CAPACITY (10) opcode
        if self.rel_addr {
            cdb[1] = 0x01;
        }
        put_be(&mut cdb, 2, 4, self.logical_block_address as u64);
        if self.pmi {
            cdb[8] = 0x01;
        }
        cdb
    }

    fn len(&self) -> u8 {
        10 // READ CAPACITY (10) uses a 10-byte CDB
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadCapacity10Data {
    pub last_logical_block_address: u32,
    pub block_length_bytes: u32,
}

impl ReadCapacity10Data {
    pub fn parse(buf: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("READ CAPACITY (10) data", buf, 8)?;

        Ok(Self {
            last_logical_block_address: be32(buf, 0),
            block_length_bytes: be32(buf, 4),
        })
    }

    /// Number of addressable blocks.
    pub fn blocks(&self) -> u64 {
        self.last_logical_block_address as u64 + 1
    }

    pub fn total_capacity_bytes(&self) -> u64 {
        self.blocks() * self.block_length_bytes as u64
    }
}

/// READ CAPACITY (16), SERVICE ACTION IN (16) with service action 0x10.
#[derive(Debug, Clone, Copy)]
pub struct ReadCapacity16Command {
    pub logical_block_address: u64,
    pub alloc_len: u32,
    pub pmi: bool,
}

impl ReadCapacity16Command {
    pub fn new(alloc_len: u32) -> Self {
        Self {
            logical_block_address: 0,
            alloc_len,
            pmi: false,
        }
    }
}

impl CommandBlock for ReadCapacity16Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x9E; // SERVICE ACTION IN (16)
        cdb[1] = 0x10; // READ CAPACITY (16)
        put_be(&mut cdb, 2, 8, self.logical_block_address);
        put_be(&mut cdb, 10, 4, self.alloc_len as u64);
        if self.pmi {
            cdb[14] = 0x01;
        }
        cdb
    }

    fn len(&self) -> u8 {
        16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadCapacity16Data {
    pub last_logical_block_address: u64,
    pub block_length_bytes: u32,
    /// Logical blocks per physical block exponent, byte 13 bits 3..0.
    pub physical_exponent: u8,
    /// Lowest aligned logical block address, bytes 14..15 bits 13..0.
    pub lowest_aligned_lba: u16,
}

impl ReadCapacity16Data {
    pub fn parse(buf: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("READ CAPACITY (16) data", buf, 16)?;

        Ok(Self {
            last_logical_block_address: be64(buf, 0),
            block_length_bytes: be32(buf, 8),
            physical_exponent: buf[13] & 0x0F,
            lowest_aligned_lba: u16::from_be_bytes([buf[14] & 0x3F, buf[15]]),
        })
    }

    pub fn blocks(&self) -> u64 {
        self.last_logical_block_address.saturating_add(1)
    }

    pub fn physical_block_length(&self) -> u64 {
        (self.block_length_bytes as u64) << self.physical_exponent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity10() {
        let data = ReadCapacity10Data::parse(&[0, 0, 0x01, 0x89, 0, 0, 0x08, 0]).unwrap();
        assert_eq!(data.blocks(), 0x18A);
        assert_eq!(data.block_length_bytes, 2048);
        assert_eq!(data.total_capacity_bytes(), 0x18A * 2048);
    }

    #[test]
    fn capacity16() {
        let mut buf = [0u8; 32];
        buf[0..8].copy_from_slice(&0x1_0000_0000u64.to_be_bytes());
        buf[8..12].copy_from_slice(&512u32.to_be_bytes());
        buf[13] = 0x03;
        buf[14] = 0xC0;
        buf[15] = 0x07;
        let data = ReadCapacity16Data::parse(&buf).unwrap();
        assert_eq!(data.blocks(), 0x1_0000_0001);
        assert_eq!(data.physical_block_length(), 4096);
        assert_eq!(data.lowest_aligned_lba, 7);
    }

    #[test]
    fn capacity16_cdb() {
        let cdb = ReadCapacity16Command::new(32).to_bytes();
        assert_eq!(cdb[0], 0x9E);
        assert_eq!(cdb[1], 0x10);
        assert_eq!(&cdb[10..14], &[0, 0, 0, 32]);
    }
}
