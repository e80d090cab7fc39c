//! MMC command blocks for CD, DVD, HD DVD and BD drives.

use crate::commands::{CommandBlock, msf_bytes, put_be};

/// GET CONFIGURATION request type, byte 1 bits 1..0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedFeatures {
    /// All features supported by the drive.
    All = 0,
    /// Only features whose current bit is set.
    Current = 1,
    /// Exactly one feature, the starting one.
    One = 2,
}

/// GET CONFIGURATION.
#[derive(Debug, Clone, Copy)]
pub struct GetConfigurationCommand {
    pub requested: RequestedFeatures,
    pub starting_feature: u16,
    pub alloc_len: u16,
}

impl GetConfigurationCommand {
    pub fn new(alloc_len: u16) -> Self {
        Self {
            requested: RequestedFeatures::All,
            starting_feature: 0,
            alloc_len,
        }
    }
}

impl CommandBlock for GetConfigurationCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x46;
        cdb[1] = (self.requested as u8) & 0x03;
        put_be(&mut cdb, 2, 2, self.starting_feature as u64);
        put_be(&mut cdb, 7, 2, self.alloc_len as u64);
        cdb
    }

    fn len(&self) -> u8 {
        10
    }
}

/// Response formats of READ TOC/PMA/ATIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TocFormat {
    Toc = 0,
    SessionInfo = 1,
    FullToc = 2,
    Pma = 3,
    Atip = 4,
    CdText = 5,
}

/// READ TOC/PMA/ATIP.
#[derive(Debug, Clone, Copy)]
pub struct ReadTocCommand {
    pub msf: bool,
    pub format: TocFormat,
    pub track_session: u8,
    pub alloc_len: u16,
}

impl ReadTocCommand {
    pub fn new(format: TocFormat, alloc_len: u16) -> Self {
        Self {
            msf: matches!(format, TocFormat::FullToc),
            format,
            track_session: if matches!(format, TocFormat::FullToc) { 1 } else { 0 },
            alloc_len,
        }
    }
}

impl CommandBlock for ReadTocCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x43;
        if self.msf {
            cdb[1] = 0x02;
        }
        cdb[2] = (self.format as u8) & 0x0F;
        cdb[6] = self.track_session;
        put_be(&mut cdb, 7, 2, self.alloc_len as u64);
        cdb
    }

    fn len(&self) -> u8 {
        10
    }
}

/// Media type field of READ DISC STRUCTURE, byte 1 bits 3..0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscStructureMedia {
    /// DVD and HD DVD.
    Dvd = 0,
    /// Blu-ray.
    Bd = 1,
}

/// READ DISC STRUCTURE.
#[derive(Debug, Clone, Copy)]
pub struct ReadDiscStructureCommand {
    pub media: DiscStructureMedia,
    pub address: u32,
    pub layer: u8,
    pub format: u8,
    pub alloc_len: u16,
    pub agid: u8,
}

impl ReadDiscStructureCommand {
    pub fn new(media: DiscStructureMedia, format: u8, alloc_len: u16) -> Self {
        Self {
            media,
            address: 0,
            layer: 0,
            format,
            alloc_len,
            agid: 0,
        }
    }
}

impl CommandBlock for ReadDiscStructureCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0xAD;
        cdb[1] = (self.media as u8) & 0x0F;
        put_be(&mut cdb, 2, 4, self.address as u64);
        cdb[6] = self.layer;
        cdb[7] = self.format;
        put_be(&mut cdb, 8, 2, self.alloc_len as u64);
        cdb[10] = (self.agid & 0x03) << 6;
        cdb
    }

    fn len(&self) -> u8 {
        12
    }
}

/// Expected sector type of READ CD, byte 1 bits 4..2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorType {
    All = 0,
    Cdda = 1,
    Mode1 = 2,
    Mode2 = 3,
    Mode2Form1 = 4,
    Mode2Form2 = 5,
}

/// Header codes of READ CD, byte 9 bits 6..5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderCodes {
    None = 0,
    HeaderOnly = 1,
    SubHeaderOnly = 2,
    AllHeaders = 3,
}

/// C2 error information of READ CD, byte 9 bits 2..1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C2Error {
    None = 0,
    ErrorBits = 1,
    ErrorBlockData = 2,
}

/// Sub-channel selection of READ CD, byte 10 bits 2..0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subchannel {
    None = 0,
    Raw = 1,
    Q16 = 2,
    Rw = 4,
}

/// Which parts of each sector READ CD / READ CD MSF return, bytes 9..10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorSelection {
    pub sync: bool,
    pub headers: HeaderCodes,
    pub user_data: bool,
    pub edc_ecc: bool,
    pub c2: C2Error,
    pub subchannel: Subchannel,
}

impl SectorSelection {
    /// User data only, 2048 bytes on mode 1 sectors.
    pub const COOKED: Self = Self {
        sync: false,
        headers: HeaderCodes::None,
        user_data: true,
        edc_ecc: false,
        c2: C2Error::None,
        subchannel: Subchannel::None,
    };

    /// Whole 2352-byte sector.
    pub const RAW: Self = Self {
        sync: true,
        headers: HeaderCodes::AllHeaders,
        user_data: true,
        edc_ecc: true,
        c2: C2Error::None,
        subchannel: Subchannel::None,
    };

    pub fn with_c2(self, c2: C2Error) -> Self {
        Self { c2, ..self }
    }

    pub fn with_subchannel(self, subchannel: Subchannel) -> Self {
        Self { subchannel, ..self }
    }

    fn write(&self, cdb: &mut [u8; 16]) {
        let mut byte9 = (self.headers as u8) << 5 | (self.c2 as u8) << 1;
        if self.sync {
            byte9 |= 0x80;
        }
        if self.user_data {
            byte9 |= 0x10;
        }
        if self.edc_ecc {
            byte9 |= 0x08;
        }
        cdb[9] = byte9;
        cdb[10] = (self.subchannel as u8) & 0x07;
    }
}

/// READ CD.
#[derive(Debug, Clone, Copy)]
pub struct ReadCdCommand {
    pub sector_type: SectorType,
    pub dap: bool,
    pub rel_addr: bool,
    /// Signed so lead-in sectors (negative LBA) can be addressed.
    pub logical_block_address: i32,
    /// 24-bit sector count.
    pub transfer_length: u32,
    pub selection: SectorSelection,
}

impl ReadCdCommand {
    pub fn new(logical_block_address: i32, transfer_length: u32, selection: SectorSelection) -> Self {
        Self {
            sector_type: SectorType::All,
            dap: false,
            rel_addr: false,
            logical_block_address,
            transfer_length,
            selection,
        }
    }
}

impl CommandBlock for ReadCdCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0xBE;
        cdb[1] = (self.sector_type as u8) << 2;
        if self.dap {
            cdb[1] |= 0x02;
        }
        if self.rel_addr {
            cdb[1] |= 0x01;
        }
        cdb[2..6].copy_from_slice(&self.logical_block_address.to_be_bytes());
        put_be(&mut cdb, 6, 3, self.transfer_length as u64);
        self.selection.write(&mut cdb);
        cdb
    }

    fn len(&self) -> u8 {
        12
    }
}

/// READ CD MSF. Start and end are absolute `0x00MMSSFF` addresses, end exclusive.
#[derive(Debug, Clone, Copy)]
pub struct ReadCdMsfCommand {
    pub sector_type: SectorType,
    pub dap: bool,
    pub start: u32,
    pub end: u32,
    pub selection: SectorSelection,
}

impl ReadCdMsfCommand {
    pub fn new(start: u32, end: u32, selection: SectorSelection) -> Self {
        Self {
            sector_type: SectorType::All,
            dap: false,
            start,
            end,
            selection,
        }
    }
}

impl CommandBlock for ReadCdMsfCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0xB9;
        cdb[1] = (self.sector_type as u8) << 2;
        if self.dap {
            cdb[1] |= 0x02;
        }
        cdb[3..6].copy_from_slice(&msf_bytes(self.start));
        cdb[6..9].copy_from_slice(&msf_bytes(self.end));
        self.selection.write(&mut cdb);
        cdb
    }

    fn len(&self) -> u8 {
        12
    }
}

/// Total bytes a TOC/PMA/ATIP or disc structure response declares, header included.
pub fn declared_response_len(buf: &[u8]) -> Option<usize> {
    (buf.len() >= 2).then(|| u16::from_be_bytes([buf[0], buf[1]]) as usize + 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_configuration() {
        let cdb = GetConfigurationCommand::new(0xFFFF).to_bytes();
        assert_eq!(&cdb[..10], &[0x46, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF, 0]);
    }

    #[test]
    fn full_toc_uses_msf_and_session_one() {
        let cdb = ReadTocCommand::new(TocFormat::FullToc, 1024).to_bytes();
        assert_eq!(&cdb[..10], &[0x43, 0x02, 0x02, 0, 0, 0, 1, 0x04, 0x00, 0]);
    }

    #[test]
    fn disc_structure() {
        let mut cmd = ReadDiscStructureCommand::new(DiscStructureMedia::Bd, 0x30, 4100);
        cmd.agid = 1;
        let cdb = cmd.to_bytes();
        assert_eq!(&cdb[..12], &[0xAD, 0x01, 0, 0, 0, 0, 0, 0x30, 0x10, 0x04, 0x40, 0]);
    }

    #[test]
    fn read_cd_raw_with_c2() {
        let cmd = ReadCdCommand::new(16, 1, SectorSelection::RAW.with_c2(C2Error::ErrorBits));
        let cdb = cmd.to_bytes();
        assert_eq!(&cdb[..12], &[0xBE, 0, 0, 0, 0, 16, 0, 0, 1, 0xFA, 0, 0]);
    }

    #[test]
    fn read_cd_lead_in_lba_is_twos_complement() {
        let cdb = ReadCdCommand::new(-150, 1, SectorSelection::COOKED).to_bytes();
        assert_eq!(&cdb[2..6], &[0xFF, 0xFF, 0xFF, 0x6A]);
        assert_eq!(cdb[9], 0x10);
    }

    #[test]
    fn read_cd_msf_with_subchannel() {
        let selection = SectorSelection::RAW.with_subchannel(Subchannel::Q16);
        let cdb = ReadCdMsfCommand::new(0x0000_0200, 0x0000_0201, selection).to_bytes();
        assert_eq!(&cdb[..12], &[0xB9, 0, 0, 0, 0x02, 0x00, 0, 0x02, 0x01, 0xF8, 0x02, 0]);
    }

    #[test]
    fn toc_length() {
        assert_eq!(declared_response_len(&[0x00, 0x12, 0x01, 0x01]), Some(20));
        assert_eq!(declared_response_len(&[0x00]), None);
    }
}
