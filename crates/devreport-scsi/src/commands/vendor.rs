//! Vendor read commands that return raw CD or DVD sectors on drives that
//! predate, or go beyond, READ CD.

use crate::commands::{CommandBlock, msf_bytes, put_be};

/// Plextor READ CD-DA.
#[derive(Debug, Clone, Copy)]
pub struct PlextorReadCdDaCommand {
    pub logical_block_address: u32,
    pub transfer_length: u32,
    /// 0 = audio only (2352), 1 = Q (2368), 2 = P-W (2448), 3 = P-W only (96).
    pub subchannel: u8,
}

impl CommandBlock for PlextorReadCdDaCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0xD8;
        put_be(&mut cdb, 2, 4, self.logical_block_address as u64);
        put_be(&mut cdb, 6, 4, self.transfer_length as u64);
        cdb[10] = self.subchannel;
        cdb
    }

    fn len(&self) -> u8 {
        12
    }
}

/// Pioneer READ CD-DA.
#[derive(Debug, Clone, Copy)]
pub struct PioneerReadCdDaCommand {
    pub logical_block_address: u32,
    pub transfer_length: u32,
    pub subchannel: u8,
}

impl CommandBlock for PioneerReadCdDaCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0xD8;
        put_be(&mut cdb, 2, 4, self.logical_block_address as u64);
        put_be(&mut cdb, 7, 3, self.transfer_length as u64);
        cdb[10] = self.subchannel;
        cdb
    }

    fn len(&self) -> u8 {
        12
    }
}

/// Pioneer READ CD-DA MSF.
#[derive(Debug, Clone, Copy)]
pub struct PioneerReadCdDaMsfCommand {
    pub start: u32,
    pub end: u32,
    pub subchannel: u8,
}

impl CommandBlock for PioneerReadCdDaMsfCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0xD9;
        cdb[3..6].copy_from_slice(&msf_bytes(self.start));
        cdb[7..10].copy_from_slice(&msf_bytes(self.end));
        cdb[10] = self.subchannel;
        cdb
    }

    fn len(&self) -> u8 {
        12
    }
}

/// NEC READ CD-DA.
#[derive(Debug, Clone, Copy)]
pub struct NecReadCdDaCommand {
    pub logical_block_address: u32,
    pub transfer_length: u16,
}

impl CommandBlock for NecReadCdDaCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0xD4;
        put_be(&mut cdb, 2, 4, self.logical_block_address as u64);
        put_be(&mut cdb, 7, 2, self.transfer_length as u64);
        cdb
    }

    fn len(&self) -> u8 {
        10
    }
}

/// HL-DT-ST raw DVD sector read, 2064 bytes per sector.
#[derive(Debug, Clone, Copy)]
pub struct HlDtStReadRawDvdCommand {
    pub logical_block_address: u32,
    pub transfer_length: u16,
}

impl CommandBlock for HlDtStReadRawDvdCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0xE7;
        cdb[1] = 0x48; // 'H'
        cdb[2] = 0x49; // 'I'
        cdb[3] = 0x54; // 'T'
        cdb[4] = 0x01;
        put_be(&mut cdb, 6, 4, self.logical_block_address as u64);
        put_be(&mut cdb, 10, 2, self.transfer_length as u64);
        cdb
    }

    fn len(&self) -> u8 {
        12
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plextor_and_pioneer_share_opcode_but_not_layout() {
        let plextor = PlextorReadCdDaCommand {
            logical_block_address: 1,
            transfer_length: 1,
            subchannel: 2,
        }
        .to_bytes();
        let pioneer = PioneerReadCdDaCommand {
            logical_block_address: 1,
            transfer_length: 1,
            subchannel: 2,
        }
        .to_bytes();
        assert_eq!(plextor[0], pioneer[0]);
        assert_eq!(&plextor[6..10], &[0, 0, 0, 1]);
        assert_eq!(&pioneer[7..10], &[0, 0, 1]);
        assert_eq!(plextor[10], 2);
        assert_eq!(pioneer[10], 2);
    }

    #[test]
    fn pioneer_msf() {
        let cdb = PioneerReadCdDaMsfCommand {
            start: 0x0000_0200,
            end: 0x0000_0201,
            subchannel: 0,
        }
        .to_bytes();
        assert_eq!(&cdb[..10], &[0xD9, 0, 0, 0, 2, 0, 0, 0, 2, 1]);
    }

    #[test]
    fn hldtst_signature() {
        let cdb = HlDtStReadRawDvdCommand {
            logical_block_address: 0x10,
            transfer_length: 1,
        }
        .to_bytes();
        assert_eq!(&cdb[..12], &[0xE7, b'H', b'I', b'T', 1, 0, 0, 0, 0, 0x10, 0, 1]);
    }

    #[test]
    fn nec() {
        let cdb = NecReadCdDaCommand {
            logical_block_address: 0,
            transfer_length: 1,
        }
        .to_bytes();
        assert_eq!(&cdb[..10], &[0xD4, 0, 0, 0, 0, 0, 0, 0, 1, 0]);
    }
}
