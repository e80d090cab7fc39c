use crate::commands::{CommandBlock, put_be};

/// READ LONG (10). Returns a block together with its ECC/EDC bytes.
#[derive(Debug, Clone, Copy)]
pub struct ReadLong10Command {
    pub logical_block_address: u32,
    /// Byte transfer length, the size of one long block.
    pub transfer_bytes: u16,
    pub correct: bool,
    pub rel_addr: bool,
}

impl ReadLong10Command {
    pub fn new(logical_block_address: u32, transfer_bytes: u16) -> Self {
        Self {
            logical_block_address,
            transfer_bytes,
            correct: false,
            rel_addr: false,
        }
    }
}

impl CommandBlock for ReadLong10Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x3E;
        if self.correct {
            cdb[1] |= 0x02;
        }
        if self.rel_addr {
            cdb[1] |= 0x01;
        }
        put_be(&mut cdb, 2, 4, self.logical_block_address as u64);
        put_be(&mut cdb, 7, 2, self.transfer_bytes as u64);
        cdb
    }

    fn len(&self) -> u8 {
        10
    }
}

/// READ LONG (16), SERVICE ACTION IN (16) with service action 0x11.
#[derive(Debug, Clone, Copy)]
pub struct ReadLong16Command {
    pub logical_block_address: u64,
    pub transfer_bytes: u16,
    pub correct: bool,
}

impl ReadLong16Command {
    pub fn new(logical_block_address: u64, transfer_bytes: u16) -> Self {
        Self {
            logical_block_address,
            transfer_bytes,
            correct: false,
        }
    }
}

impl CommandBlock for ReadLong16Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x9E;
        cdb[1] = 0x11;
        put_be(&mut cdb, 2, 8, self.logical_block_address);
        put_be(&mut cdb, 12, 2, self.transfer_bytes as u64);
        if self.correct {
            cdb[14] = 0x01;
        }
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
    fn read_long10() {
        let cdb = ReadLong10Command::new(0, 0xFFFF).to_bytes();
        assert_eq!(&cdb[..10], &[0x3E, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF, 0]);
    }

    #[test]
    fn read_long16() {
        let mut cmd = ReadLong16Command::new(2, 528);
        cmd.correct = true;
        let cdb = cmd.to_bytes();
        assert_eq!(cdb[1], 0x11);
        assert_eq!(cdb[9], 2);
        assert_eq!(&cdb[12..15], &[0x02, 0x10, 0x01]);
    }
}
