use crate::commands::{CommandBlock, put_be};

/// Flag bits shared by READ (10), READ (12) and READ (16), byte 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadFlags {
    /// Read protect, bits 7..5.
    pub rdprotect: u8,
    /// Disable page out.
    pub dpo: bool,
    /// Force unit access.
    pub fua: bool,
    /// Force unit access to non-volatile cache.
    pub fua_nv: bool,
    /// Relative addressing (obsolete, not valid for READ (16)).
    pub rel_addr: bool,
}

impl ReadFlags {
    fn byte(&self) -> u8 {
        let mut flags = (self.rdprotect & 0x07) << 5;
        if self.dpo {
            flags |= 0x10;
        }
        if self.fua {
            flags |= 0x08;
        }
        if self.fua_nv {
            flags |= 0x02;
        }
        if self.rel_addr {
            flags |= 0x01;
        }
        flags
    }
}

/// READ (6) command. 21-bit LBA, 8-bit transfer length where 0 means 256 blocks.
#[derive(Debug, Clone, Copy)]
pub struct Read6Command {
    pub logical_block_address: u32,
    pub transfer_length: u8,
}

impl Read6Command {
    pub fn new(logical_block_address: u32, transfer_length: u8) -> Self {
        Self {
            logical_block_address,
            transfer_length,
        }
    }
}

impl CommandBlock for Read6Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x08; // READ(6) opcode
        cdb[1] = ((self.logical_block_address >> 16) & 0x1F) as u8;
        cdb[2] = (self.logical_block_address >> 8) as u8;
        cdb[3] = self.logical_block_address as u8;
        cdb[4] = self.transfer_length;
        cdb
    }

    fn len(&self) -> u8 {
        6
    }
}

/// READ(10) command: read contiguous blocks starting from an LBA.
#[derive(Debug, Clone, Copy)]
pub struct Read10Command {
    pub logical_block_address: u32,
    pub transfer_length: u16,
    pub group_number: u8,
    pub flags: ReadFlags,
}

impl Read10Command {
    pub fn new(logical_block_address: u32, transfer_length: u16) -> Self {
        Self {
            logical_block_address,
            transfer_length,
            group_number: 0,
            flags: ReadFlags::default(),
        }
    }
}

impl CommandBlock for Read10Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x28; // READ(10) opcode
        cdb[1] = self.flags.byte();

        // Logical Block Address (big-endian: MSB first)
        put_be(&mut cdb, 2, 4, self.logical_block_address as u64);
        cdb[6] = self.group_number & 0x1F;

        // Transfer Length (number of blocks, big-endian)
        put_be(&mut cdb, 7, 2, self.transfer_length as u64);
        cdb
    }

    fn len(&self) -> u8 {
        10 // READ(10) CDB is always 10 bytes
    }
}

/// READ (12) command.
#[derive(Debug, Clone, Copy)]
pub struct Read12Command {
    pub logical_block_address: u32,
    pub transfer_length: u32,
    pub group_number: u8,
    pub streaming: bool,
    pub flags: ReadFlags,
}

impl Read12Command {
    pub fn new(logical_block_address: u32, transfer_length: u32) -> Self {
        Self {
            logical_block_address,
            transfer_length,
            group_number: 0,
            streaming: false,
            flags: ReadFlags::default(),
        }
    }
}

impl CommandBlock for Read12Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0xA8; // READ(12) opcode
        cdb[1] = self.flags.byte();
        put_be(&mut cdb, 2, 4, self.logical_block_address as u64);
        put_be(&mut cdb, 6, 4, self.transfer_length as u64);
        cdb[10] = (self.group_number & 0x1F) | if self.streaming { 0x80 } else { 0x00 };
        cdb
    }

    fn len(&self) -> u8 {
        12
    }
}

/// READ (16) command.
#[derive(Debug, Clone, Copy)]
pub struct Read16Command {
    pub logical_block_address: u64,
    pub transfer_length: u32,
    pub group_number: u8,
    pub streaming: bool,
    pub flags: ReadFlags,
}

impl Read16Command {
    pub fn new(logical_block_address: u64, transfer_length: u32) -> Self {
        Self {
            logical_block_address,
            transfer_length,
            group_number: 0,
            streaming: false,
            flags: ReadFlags::default(),
        }
    }
}

impl CommandBlock for Read16Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x88; // READ(16) opcode
        cdb[1] = self.flags.byte() & 0xFE;
        put_be(&mut cdb, 2, 8, self.logical_block_address);
        put_be(&mut cdb, 10, 4, self.transfer_length as u64);
        cdb[14] = (self.group_number & 0x1F) | if self.streaming { 0x80 } else { 0x00 };
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
    fn read6_masks_lba() {
        let cdb = Read6Command::new(0xFF_1234, 1).to_bytes();
        assert_eq!(&cdb[..6], &[0x08, 0x1F, 0x12, 0x34, 0x01, 0x00]);
    }

    #[test]
    fn read10_layout() {
        let mut cmd = Read10Command::new(0x0102_0304, 0x0506);
        cmd.flags.fua = true;
        cmd.flags.dpo = true;
        let cdb = cmd.to_bytes();
        assert_eq!(
            &cdb[..10],
            &[0x28, 0x18, 0x01, 0x02, 0x03, 0x04, 0x00, 0x05, 0x06, 0x00]
        );
    }

    #[test]
    fn read12_streaming() {
        let mut cmd = Read12Command::new(16, 2);
        cmd.streaming = true;
        let cdb = cmd.to_bytes();
        assert_eq!(&cdb[..12], &[0xA8, 0, 0, 0, 0, 16, 0, 0, 0, 2, 0x80, 0]);
    }

    #[test]
    fn read16_never_sets_rel_addr() {
        let mut cmd = Read16Command::new(0x0000_0001_0000_0000, 1);
        cmd.flags.rel_addr = true;
        let cdb = cmd.to_bytes();
        assert_eq!(cdb[0], 0x88);
        assert_eq!(cdb[1], 0x00);
        assert_eq!(&cdb[2..10], &[0, 0, 0, 1, 0, 0, 0, 0]);
        assert_eq!(&cdb[10..14], &[0, 0, 0, 1]);
    }
}
