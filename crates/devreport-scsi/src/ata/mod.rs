//! ATA commands tunnelled through ATA PASS-THROUGH (16).
//!
//! The command block carries a full task file; the device answers with its
//! output registers packed into the ATA Return descriptor of the sense data.

pub mod identify;

use crate::{
    commands::{CommandBlock, Direction},
    sense::SenseBuffer,
};

/// Operation code of ATA PASS-THROUGH (16).
pub const ATA_PASS_THROUGH_16: u8 = 0x85;

/// ATA command opcodes issued by the reporter.
pub mod opcode {
    pub const IDENTIFY_DEVICE: u8 = 0xEC;
    pub const IDENTIFY_PACKET_DEVICE: u8 = 0xA1;
    pub const READ_SECTORS_RETRY: u8 = 0x20;
    pub const READ_SECTORS: u8 = 0x21;
    pub const READ_LONG_RETRY: u8 = 0x22;
    pub const READ_LONG: u8 = 0x23;
    pub const READ_SECTORS_EXT: u8 = 0x24;
    pub const READ_DMA_EXT: u8 = 0x25;
    pub const SEEK: u8 = 0x70;
    pub const READ_DMA_RETRY: u8 = 0xC8;
    pub const READ_DMA: u8 = 0xC9;
}

/// Pass-through protocol, byte 1 bits 4..1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtaProtocol {
    HardReset = 0,
    SoftReset = 1,
    NoData = 3,
    PioIn = 4,
    PioOut = 5,
    Dma = 6,
    DmaQueued = 7,
    DeviceDiagnostics = 8,
    DeviceReset = 9,
    UdmaIn = 10,
    UdmaOut = 11,
    Fpdma = 12,
    ReturnResponse = 15,
}

impl AtaProtocol {
    /// Data direction implied by the protocol alone.
    pub fn direction(self) -> Direction {
        match self {
            Self::DeviceDiagnostics
            | Self::DeviceReset
            | Self::HardReset
            | Self::NoData
            | Self::SoftReset
            | Self::ReturnResponse => Direction::None,
            Self::PioIn | Self::UdmaIn => Direction::In,
            Self::PioOut | Self::UdmaOut => Direction::Out,
            _ => Direction::Bidirectional,
        }
    }

    fn reads_from_device(self) -> bool {
        matches!(self, Self::PioIn | Self::UdmaIn)
    }
}

/// Which register holds the transfer length, byte 2 bits 1..0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferRegister {
    None = 0,
    Feature = 1,
    SectorCount = 2,
    /// Length is in the STPSIU field of the pass-through command.
    Sptsiu = 3,
}

/// Task file in cylinder/head/sector form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AtaRegistersChs {
    pub feature: u8,
    pub sector_count: u8,
    pub sector: u8,
    pub cylinder_low: u8,
    pub cylinder_high: u8,
    pub device_head: u8,
    pub command: u8,
}

impl AtaRegistersChs {
    pub fn new(command: u8) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }

    /// Address a sector. `head` keeps its low nibble only.
    pub fn with_address(self, cylinder: u16, head: u8, sector: u8) -> Self {
        Self {
            sector,
            cylinder_low: cylinder as u8,
            cylinder_high: (cylinder >> 8) as u8,
            device_head: head & 0x0F,
            ..self
        }
    }
}

/// Task file for 28-bit addressing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AtaRegistersLba28 {
    pub feature: u8,
    pub sector_count: u8,
    pub lba_low: u8,
    pub lba_mid: u8,
    pub lba_high: u8,
    pub device_head: u8,
    pub command: u8,
}

impl AtaRegistersLba28 {
    pub fn new(command: u8) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }

    /// Address `lba`, wrapping at 28 bits, with the LBA bit set in device/head.
    pub fn with_lba(self, lba: u32) -> Self {
        Self {
            lba_low: lba as u8,
            lba_mid: (lba >> 8) as u8,
            lba_high: (lba >> 16) as u8,
            device_head: 0x40 | ((lba >> 24) & 0x0F) as u8,
            ..self
        }
    }
}

/// Task file for 48-bit addressing. Each field holds the current value in
/// its low byte and the previous (HOB) value in its high byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AtaRegistersLba48 {
    pub feature: u16,
    pub sector_count: u16,
    pub lba_low: u16,
    pub lba_mid: u16,
    pub lba_high: u16,
    pub device_head: u8,
    pub command: u8,
}

impl AtaRegistersLba48 {
    pub fn new(command: u8) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }

    pub fn with_lba(self, lba: u64) -> Self {
        let byte = |n: u32| ((lba >> (n * 8)) & 0xFF) as u16;
        Self {
            lba_low: byte(3) << 8 | byte(0),
            lba_mid: byte(4) << 8 | byte(1),
            lba_high: byte(5) << 8 | byte(2),
            device_head: 0x40,
            ..self
        }
    }
}

/// Task file in one of the three addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFile {
    Chs(AtaRegistersChs),
    Lba28(AtaRegistersLba28),
    Lba48(AtaRegistersLba48),
}

impl TaskFile {
    pub fn command(&self) -> u8 {
        match self {
            Self::Chs(regs) => regs.command,
            Self::Lba28(regs) => regs.command,
            Self::Lba48(regs) => regs.command,
        }
    }

    pub fn is_extended(&self) -> bool {
        matches!(self, Self::Lba48(_))
    }
}

/// ATA PASS-THROUGH (16).
#[derive(Debug, Clone, Copy)]
pub struct AtaPassThrough16Command {
    pub task_file: TaskFile,
    pub protocol: AtaProtocol,
    pub transfer_register: TransferRegister,
    /// Transfer length counts blocks rather than bytes.
    pub transfer_blocks: bool,
}

impl AtaPassThrough16Command {
    pub fn new(
        task_file: TaskFile,
        protocol: AtaProtocol,
        transfer_register: TransferRegister,
        transfer_blocks: bool,
    ) -> Self {
        Self {
            task_file,
            protocol,
            transfer_register,
            transfer_blocks,
        }
    }
}

impl CommandBlock for AtaPassThrough16Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = ATA_PASS_THROUGH_16;
        cdb[1] = ((self.protocol as u8) << 1) & 0x1E;
        if self.protocol.reads_from_device() {
            cdb[2] |= 0x08;
        }
        if self.transfer_blocks {
            cdb[2] |= 0x04;
        }
        cdb[2] |= (self.transfer_register as u8) & 0x03;

        match self.task_file {
            TaskFile::Chs(regs) => {
                cdb[4] = regs.feature;
                cdb[6] = regs.sector_count;
                cdb[8] = regs.sector;
                cdb[10] = regs.cylinder_low;
                cdb[12] = regs.cylinder_high;
                cdb[13] = regs.device_head;
                cdb[14] = regs.command;
            }
            TaskFile::Lba28(regs) => {
                cdb[2] |= 0x20;
                cdb[4] = regs.feature;
                cdb[6] = regs.sector_count;
                cdb[8] = regs.lba_low;
                cdb[10] = regs.lba_mid;
                cdb[12] = regs.lba_high;
                cdb[13] = regs.device_head;
                cdb[14] = regs.command;
            }
            TaskFile::Lba48(regs) => {
                cdb[1] |= 0x01;
                cdb[2] |= 0x20;
                for (i, word) in [
                    regs.feature,
                    regs.sector_count,
                    regs.lba_low,
                    regs.lba_mid,
                    regs.lba_high,
                ]
                .into_iter()
                .enumerate()
                {
                    cdb[3 + i * 2..5 + i * 2].copy_from_slice(&word.to_be_bytes());
                }
                cdb[13] = regs.device_head;
                cdb[14] = regs.command;
            }
        }
        cdb
    }

    fn len(&self) -> u8 {
        16
    }

    fn direction(&self) -> Direction {
        self.protocol.direction()
    }
}

const STATUS_BSY: u8 = 0x80;
const STATUS_ERR: u8 = 0x01;

/// Output task file echoed back in the sense data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AtaErrorRegisters {
    pub status: u8,
    pub error: u8,
    /// Low byte holds the current value; for 48-bit commands the high byte holds the HOB value.
    pub sector_count: u16,
    pub lba_low: u16,
    pub lba_mid: u16,
    pub lba_high: u16,
    pub device_head: u8,
}

impl AtaErrorRegisters {
    /// Read the ATA Return descriptor at its fixed place in descriptor sense.
    pub fn from_sense(sense: &SenseBuffer, extended: bool) -> Self {
        let pair = |hi: usize| {
            if extended {
                u16::from_be_bytes([sense[hi], sense[hi + 1]])
            } else {
                sense[hi + 1] as u16
            }
        };
        Self {
            error: sense[11],
            sector_count: pair(12),
            lba_low: pair(14),
            lba_mid: pair(16),
            lba_high: pair(18),
            device_head: sense[20],
            status: sense[21],
        }
    }

    /// Status BSY or ERR bit set, or a nonzero error register.
    pub fn failed(&self) -> bool {
        self.status & (STATUS_BSY | STATUS_ERR) != 0 || self.error != 0
    }

    /// Names of the bits set in the error register.
    pub fn error_names(&self) -> Vec<&'static str> {
        const NAMES: [(u8, &str); 8] = [
            (0x80, "ICRC"),
            (0x40, "UNC"),
            (0x20, "MC"),
            (0x10, "IDNF"),
            (0x08, "MCR"),
            (0x04, "ABRT"),
            (0x02, "TK0NF"),
            (0x01, "AMNF"),
        ];
        NAMES
            .iter()
            .filter(|(bit, _)| self.error & bit != 0)
            .map(|(_, name)| *name)
            .collect()
    }
}

/// Transport code plus the registers it carried back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtaResponse {
    pub code: i32,
    pub registers: AtaErrorRegisters,
}

impl AtaResponse {
    /// The transport accepted the command and the device raised no error.
    pub fn succeeded(&self) -> bool {
        self.code == 0 && !self.registers.failed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_pio_in() -> Vec<AtaPassThrough16Command> {
        let files = [
            TaskFile::Chs(AtaRegistersChs::new(opcode::READ_SECTORS)),
            TaskFile::Lba28(AtaRegistersLba28::new(opcode::READ_SECTORS)),
            TaskFile::Lba48(AtaRegistersLba48::new(opcode::READ_SECTORS_EXT)),
        ];
        let registers = [
            TransferRegister::None,
            TransferRegister::Feature,
            TransferRegister::SectorCount,
            TransferRegister::Sptsiu,
        ];
        let mut commands = Vec::new();
        for file in files {
            for register in registers {
                for blocks in [false, true] {
                    commands.push(AtaPassThrough16Command::new(
                        file,
                        AtaProtocol::PioIn,
                        register,
                        blocks,
                    ));
                }
            }
        }
        commands
    }

    #[test]
    fn pio_in_sets_t_dir_and_tracks_block_flag() {
        for cmd in all_pio_in() {
            let cdb = cmd.to_bytes();
            assert_eq!(cdb[0], ATA_PASS_THROUGH_16);
            assert_eq!(cdb[2] & 0x08, 0x08);
            assert_eq!(cdb[2] & 0x04 != 0, cmd.transfer_blocks);
            assert_eq!(cdb[2] & 0x03, cmd.transfer_register as u8);
            assert_eq!(cmd.direction(), Direction::In);
        }
    }

    #[test]
    fn chs_layout() {
        let regs = AtaRegistersChs {
            sector_count: 1,
            ..AtaRegistersChs::new(opcode::READ_SECTORS_RETRY)
        }
        .with_address(0x0123, 0x15, 7);
        let cmd = AtaPassThrough16Command::new(
            TaskFile::Chs(regs),
            AtaProtocol::PioIn,
            TransferRegister::SectorCount,
            true,
        );
        assert_eq!(
            cmd.to_bytes(),
            [0x85, 0x08, 0x0E, 0, 0, 0, 1, 0, 7, 0, 0x23, 0, 0x01, 0x05, 0x20, 0]
        );
    }

    #[test]
    fn lba28_wraps_address_into_device_head() {
        let regs = AtaRegistersLba28::new(opcode::READ_SECTORS).with_lba(0x0ABC_DEF1);
        let cdb = AtaPassThrough16Command::new(
            TaskFile::Lba28(regs),
            AtaProtocol::PioIn,
            TransferRegister::SectorCount,
            true,
        )
        .to_bytes();
        assert_eq!(cdb[1], 0x08);
        assert_eq!(cdb[2], 0x2E);
        assert_eq!(&cdb[8..15], &[0xF1, 0, 0xDE, 0, 0xBC, 0x4A, 0x21]);
    }

    #[test]
    fn lba48_puts_high_byte_first() {
        let regs = AtaRegistersLba48 {
            sector_count: 0x0102,
            ..AtaRegistersLba48::new(opcode::READ_SECTORS_EXT)
        }
        .with_lba(0x0000_6655_4433_2211);
        let cmd = AtaPassThrough16Command::new(
            TaskFile::Lba48(regs),
            AtaProtocol::PioIn,
            TransferRegister::SectorCount,
            true,
        );
        assert_eq!(
            cmd.to_bytes(),
            [
                0x85, 0x09, 0x2E, 0, 0, 0x01, 0x02, 0x44, 0x11, 0x55, 0x22, 0x66, 0x33, 0x40,
                0x24, 0
            ]
        );
    }

    #[test]
    fn protocol_directions() {
        assert_eq!(AtaProtocol::NoData.direction(), Direction::None);
        assert_eq!(AtaProtocol::ReturnResponse.direction(), Direction::None);
        assert_eq!(AtaProtocol::UdmaIn.direction(), Direction::In);
        assert_eq!(AtaProtocol::PioOut.direction(), Direction::Out);
        assert_eq!(AtaProtocol::Dma.direction(), Direction::Bidirectional);
        assert_eq!(AtaProtocol::Fpdma.direction(), Direction::Bidirectional);
    }

    #[test]
    fn registers_from_sense() {
        let mut sense = [0u8; 32];
        sense[11] = 0x04;
        sense[12] = 0xAA;
        sense[13] = 0x01;
        sense[15] = 0x10;
        sense[20] = 0x40;
        sense[21] = 0x51;

        let short = AtaErrorRegisters::from_sense(&sense, false);
        assert_eq!(short.sector_count, 0x01);
        assert_eq!(short.lba_low, 0x10);
        assert!(short.failed());
        assert_eq!(short.error_names(), vec!["ABRT"]);

        let long = AtaErrorRegisters::from_sense(&sense, true);
        assert_eq!(long.sector_count, 0xAA01);
        assert_eq!(long.status, 0x51);
        assert_eq!(long.device_head, 0x40);
    }

    #[test]
    fn response_success_needs_clean_registers() {
        let clean = AtaResponse {
            code: 0,
            registers: AtaErrorRegisters {
                status: 0x50,
                ..Default::default()
            },
        };
        assert!(clean.succeeded());
        assert!(!AtaResponse { code: 1, ..clean }.succeeded());
        let mut err = clean;
        err.registers.error = 0x04;
        assert!(!err.succeeded());
    }

    #[test]
    fn busy_or_err_status_is_a_failure() {
        let with_status = |status| AtaResponse {
            code: 0,
            registers: AtaErrorRegisters {
                status,
                ..Default::default()
            },
        };
        assert!(with_status(0x00).succeeded());
        assert!(with_status(0x50).succeeded());
        assert!(!with_status(0x80).succeeded());
        assert!(!with_status(0x01).succeeded());
        assert!(!with_status(0xD0).succeeded());
        assert!(!with_status(0x51).succeeded());
    }

    #[test]
    fn transport_failure_with_clean_registers_is_a_failure() {
        let response = AtaResponse {
            code: -5,
            registers: AtaErrorRegisters::default(),
        };
        assert!(!response.registers.failed());
        assert!(!response.succeeded());
    }

    #[test]
    fn error_register_alone_is_a_failure() {
        let response = AtaResponse {
            code: 0,
            registers: AtaErrorRegisters {
                status: 0x50,
                error: 0x10,
                ..Default::default()
            },
        };
        assert!(!response.succeeded());
        assert_eq!(response.registers.error_names(), vec!["IDNF"]);
    }
}
