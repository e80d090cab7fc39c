use thiserror::Error;

use crate::{
    ata::{
        AtaErrorRegisters, AtaPassThrough16Command, AtaProtocol, AtaRegistersChs,
        AtaRegistersLba28, AtaRegistersLba48, AtaResponse, TaskFile, TransferRegister,
        identify::IDENTIFY_LEN, opcode,
    },
    commands::{
        CommandBlock,
        inquiry::InquiryCommand,
        mmc::{
            DiscStructureMedia, GetConfigurationCommand, ReadCdCommand, ReadCdMsfCommand,
            ReadDiscStructureCommand, ReadTocCommand, SectorSelection, TocFormat,
            declared_response_len,
        },
        mode_sense::{ModeSense6Command, ModeSense10Command, PageControl},
        read::{Read6Command, Read10Command, Read12Command, Read16Command},
        read_capacity::{ReadCapacity10Command, ReadCapacity16Command},
        read_long::{ReadLong10Command, ReadLong16Command},
        ssc::{
            ReadBlockLimitsCommand, ReadMediaSerialNumberCommand, ReportDensitySupportCommand,
            media_serial_len,
        },
        unit::{
            LoadUnloadCommand, PreventAllowMediumRemovalCommand, Seek6Command, Seek10Command,
            StartStopUnitCommand, TestUnitReadyCommand,
        },
        vendor::{
            HlDtStReadRawDvdCommand, NecReadCdDaCommand, PioneerReadCdDaCommand,
            PioneerReadCdDaMsfCommand, PlextorReadCdDaCommand,
        },
    },
    sense::{SenseBuffer, SenseInfo},
    transport::Transport,
};

/// A SCSI command the transport reported as failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("command {opcode:#04x} failed with code {code}")]
pub struct CommandFailed {
    pub opcode: u8,
    pub code: i32,
    pub sense: SenseBuffer,
}

impl CommandFailed {
    pub fn sense_info(&self) -> Option<SenseInfo> {
        SenseInfo::decode(&self.sense)
    }
}

/// Address forms accepted by the ATA read and seek helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtaAddress {
    Chs { cylinder: u16, head: u8, sector: u8 },
    Lba28(u32),
    Lba48(u64),
}

impl AtaAddress {
    fn task_file(self, command: u8, command_ext: u8, count: u16) -> TaskFile {
        match self {
            Self::Chs {
                cylinder,
                head,
                sector,
            } => TaskFile::Chs(
                AtaRegistersChs {
                    sector_count: count as u8,
                    ..AtaRegistersChs::new(command)
                }
                .with_address(cylinder, head, sector),
            ),
            Self::Lba28(lba) => TaskFile::Lba28(
                AtaRegistersLba28 {
                    sector_count: count as u8,
                    ..AtaRegistersLba28::new(command)
                }
                .with_lba(lba),
            ),
            Self::Lba48(lba) => TaskFile::Lba48(
                AtaRegistersLba48 {
                    sector_count: count,
                    ..AtaRegistersLba48::new(command_ext)
                }
                .with_lba(lba),
            ),
        }
    }
}

/// Issues typed commands over a [`Transport`].
pub struct ScsiDevice<T> {
    transport: T,
}

impl<T: Transport> ScsiDevice<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Send `cmd`, filling or draining `buf` per its direction.
    pub fn execute<C: CommandBlock>(&mut self, cmd: &C, buf: &mut [u8]) -> Result<(), CommandFailed> {
        let cdb = cmd.to_bytes();
        let cdb = &cdb[..cmd.len() as usize];
        log::trace!("CDB {cdb:02X?} with {} byte buffer", buf.len());
        let completion = self.transport.send(cdb, buf, cmd.direction());
        if completion.is_ok() {
            return Ok(());
        }
        let failure = CommandFailed {
            opcode: cdb[0],
            code: completion.code,
            sense: completion.sense,
        };
        match failure.sense_info() {
            Some(sense) => log::debug!("opcode {:#04x} failed: {sense}", failure.opcode),
            None => log::debug!("opcode {:#04x} failed with code {}", failure.opcode, failure.code),
        }
        Err(failure)
    }

    fn read_into<C: CommandBlock>(&mut self, cmd: &C, len: usize) -> Result<Vec<u8>, CommandFailed> {
        let mut buf = vec![0u8; len];
        self.execute(cmd, &mut buf)?;
        Ok(buf)
    }

    /// Issue a command twice: once to learn the declared length, then for the whole response.
    fn read_declared<C, F>(
        &mut self,
        build: F,
        header_len: u16,
        declared: fn(&[u8]) -> Option<usize>,
    ) -> Result<Vec<u8>, CommandFailed>
    where
        C: CommandBlock,
        F: Fn(u16) -> C,
    {
        let header = self.read_into(&build(header_len), header_len as usize)?;
        let full = declared(&header)
            .unwrap_or(header_len as usize)
            .clamp(header_len as usize, u16::MAX as usize);
        if full == header_len as usize {
            return Ok(header);
        }
        let mut buf = self.read_into(&build(full as u16), full)?;
        buf.truncate(full);
        Ok(buf)
    }

    pub fn inquiry(&mut self) -> Result<Vec<u8>, CommandFailed> {
        let mut buf = self.read_into(&InquiryCommand::new(36), 36)?;
        let full = buf[4] as usize + 5;
        if full > 36 {
            buf = self.read_into(&InquiryCommand::new(full as u16), full)?;
        }
        Ok(buf)
    }

    pub fn inquiry_vpd(&mut self, page: u8) -> Result<Vec<u8>, CommandFailed> {
        self.read_declared(
            |len| InquiryCommand::vpd(page, len),
            4,
            |h| (h.len() >= 4).then(|| u16::from_be_bytes([h[2], h[3]]) as usize + 4),
        )
    }

    pub fn mode_sense6(
        &mut self,
        page: u8,
        subpage: u8,
        page_control: PageControl,
    ) -> Result<Vec<u8>, CommandFailed> {
        let mut cmd = ModeSense6Command::new(page, subpage, 255);
        cmd.page_control = page_control;
        let mut buf = self.read_into(&cmd, 255)?;
        buf.truncate(buf[0] as usize + 1);
        Ok(buf)
    }

    pub fn mode_sense10(
        &mut self,
        page: u8,
        subpage: u8,
        page_control: PageControl,
        llbaa: bool,
    ) -> Result<Vec<u8>, CommandFailed> {
        self.read_declared(
            |len| {
                let mut cmd = ModeSense10Command::new(page, subpage, len);
                cmd.page_control = page_control;
                cmd.llbaa = llbaa;
                cmd
            },
            8,
            |h| (h.len() >= 2).then(|| u16::from_be_bytes([h[0], h[1]]) as usize + 2),
        )
    }

    pub fn read_capacity10(&mut self) -> Result<Vec<u8>, CommandFailed> {
        self.read_into(&ReadCapacity10Command::new(), 8)
    }

    pub fn read_capacity16(&mut self) -> Result<Vec<u8>, CommandFailed> {
        self.read_into(&ReadCapacity16Command::new(32), 32)
    }

    pub fn read6(&mut self, lba: u32, blocks: u8, block_size: u32) -> Result<Vec<u8>, CommandFailed> {
        let len = blocks.max(1) as usize * block_size as usize;
        self.read_into(&Read6Command::new(lba, blocks), len)
    }

    pub fn read10(&mut self, lba: u32, blocks: u16, block_size: u32) -> Result<Vec<u8>, CommandFailed> {
        self.read_into(&Read10Command::new(lba, blocks), blocks as usize * block_size as usize)
    }

    pub fn read12(&mut self, lba: u32, blocks: u32, block_size: u32) -> Result<Vec<u8>, CommandFailed> {
        self.read_into(&Read12Command::new(lba, blocks), blocks as usize * block_size as usize)
    }

    pub fn read16(&mut self, lba: u64, blocks: u32, block_size: u32) -> Result<Vec<u8>, CommandFailed> {
        self.read_into(&Read16Command::new(lba, blocks), blocks as usize * block_size as usize)
    }

    pub fn read_long10(&mut self, lba: u32, transfer_bytes: u16) -> Result<Vec<u8>, CommandFailed> {
        self.read_into(&ReadLong10Command::new(lba, transfer_bytes), transfer_bytes as usize)
    }

    pub fn read_long16(&mut self, lba: u64, transfer_bytes: u16) -> Result<Vec<u8>, CommandFailed> {
        self.read_into(&ReadLong16Command::new(lba, transfer_bytes), transfer_bytes as usize)
    }

    pub fn test_unit_ready(&mut self) -> Result<(), CommandFailed> {
        self.execute(&TestUnitReadyCommand, &mut [])
    }

    pub fn seek6(&mut self, lba: u32) -> Result<(), CommandFailed> {
        self.execute(
            &Seek6Command {
                logical_block_address: lba,
            },
            &mut [],
        )
    }

    pub fn seek10(&mut self, lba: u32) -> Result<(), CommandFailed> {
        self.execute(
            &Seek10Command {
                logical_block_address: lba,
            },
            &mut [],
        )
    }

    pub fn allow_medium_removal(&mut self) -> Result<(), CommandFailed> {
        self.execute(&PreventAllowMediumRemovalCommand::allow(), &mut [])
    }

    pub fn eject(&mut self) -> Result<(), CommandFailed> {
        self.allow_medium_removal()?;
        self.execute(&StartStopUnitCommand::eject(), &mut [])
    }

    pub fn load(&mut self) -> Result<(), CommandFailed> {
        self.execute(&StartStopUnitCommand::load(), &mut [])
    }

    pub fn unload_tape(&mut self) -> Result<(), CommandFailed> {
        self.allow_medium_removal()?;
        self.execute(&LoadUnloadCommand::unload(), &mut [])
    }

    pub fn get_configuration(&mut self) -> Result<Vec<u8>, CommandFailed> {
        self.read_declared(
            GetConfigurationCommand::new,
            8,
            |h| {
                (h.len() >= 4)
                    .then(|| u32::from_be_bytes([h[0], h[1], h[2], h[3]]) as usize + 4)
            },
        )
    }

    pub fn read_toc(&mut self, format: TocFormat) -> Result<Vec<u8>, CommandFailed> {
        self.read_declared(|len| ReadTocCommand::new(format, len), 4, declared_response_len)
    }

    pub fn read_disc_structure(
        &mut self,
        media: DiscStructureMedia,
        format: u8,
    ) -> Result<Vec<u8>, CommandFailed> {
        self.read_declared(
            |len| ReadDiscStructureCommand::new(media, format, len),
            4,
            declared_response_len,
        )
    }

    pub fn read_cd(
        &mut self,
        lba: i32,
        sectors: u32,
        selection: SectorSelection,
        sector_size: u32,
    ) -> Result<Vec<u8>, CommandFailed> {
        self.read_into(
            &ReadCdCommand::new(lba, sectors, selection),
            sectors as usize * sector_size as usize,
        )
    }

    pub fn read_cd_msf(
        &mut self,
        start: u32,
        end: u32,
        selection: SectorSelection,
        sector_size: u32,
    ) -> Result<Vec<u8>, CommandFailed> {
        let sectors = msf_to_lba(end).saturating_sub(msf_to_lba(start)) as usize;
        self.read_into(
            &ReadCdMsfCommand::new(start, end, selection),
            sectors * sector_size as usize,
        )
    }

    pub fn plextor_read_cdda(
        &mut self,
        lba: u32,
        sectors: u32,
        subchannel: u8,
        sector_size: u32,
    ) -> Result<Vec<u8>, CommandFailed> {
        self.read_into(
            &PlextorReadCdDaCommand {
                logical_block_address: lba,
                transfer_length: sectors,
                subchannel,
            },
            sectors as usize * sector_size as usize,
        )
    }

    pub fn pioneer_read_cdda(
        &mut self,
        lba: u32,
        sectors: u32,
        subchannel: u8,
        sector_size: u32,
    ) -> Result<Vec<u8>, CommandFailed> {
        self.read_into(
            &PioneerReadCdDaCommand {
                logical_block_address: lba,
                transfer_length: sectors,
                subchannel,
            },
            sectors as usize * sector_size as usize,
        )
    }

    pub fn pioneer_read_cdda_msf(
        &mut self,
        start: u32,
        end: u32,
        subchannel: u8,
        sector_size: u32,
    ) -> Result<Vec<u8>, CommandFailed> {
        let sectors = msf_to_lba(end).saturating_sub(msf_to_lba(start)) as usize;
        self.read_into(
            &PioneerReadCdDaMsfCommand {
                start,
                end,
                subchannel,
            },
            sectors * sector_size as usize,
        )
    }

    pub fn nec_read_cdda(&mut self, lba: u32, sectors: u16) -> Result<Vec<u8>, CommandFailed> {
        self.read_into(
            &NecReadCdDaCommand {
                logical_block_address: lba,
                transfer_length: sectors,
            },
            sectors as usize * 2352,
        )
    }

    pub fn hldtst_read_raw_dvd(&mut self, lba: u32, sectors: u16) -> Result<Vec<u8>, CommandFailed> {
        self.read_into(
            &HlDtStReadRawDvdCommand {
                logical_block_address: lba,
                transfer_length: sectors,
            },
            sectors as usize * 2064,
        )
    }

    pub fn report_density_support(
        &mut self,
        medium_type: bool,
        current_media: bool,
    ) -> Result<Vec<u8>, CommandFailed> {
        self.read_declared(
            |len| ReportDensitySupportCommand::new(medium_type, current_media, len),
            4,
            declared_response_len,
        )
    }

    pub fn read_block_limits(&mut self) -> Result<Vec<u8>, CommandFailed> {
        self.read_into(&ReadBlockLimitsCommand, 6)
    }

    pub fn read_media_serial_number(&mut self) -> Result<Vec<u8>, CommandFailed> {
        let header = self.read_into(&ReadMediaSerialNumberCommand { alloc_len: 4 }, 4)?;
        let full = media_serial_len(&header).unwrap_or(4);
        if full <= 4 {
            return Ok(header);
        }
        self.read_into(
            &ReadMediaSerialNumberCommand {
                alloc_len: full as u32,
            },
            full,
        )
    }

    /// Send an ATA PASS-THROUGH (16) command and collect the output registers.
    pub fn execute_ata(&mut self, cmd: &AtaPassThrough16Command, buf: &mut [u8]) -> AtaResponse {
        let cdb = cmd.to_bytes();
        log::trace!(
            "ATA command {:#04x} via {:02X?} with {} byte buffer",
            cmd.task_file.command(),
            cdb,
            buf.len()
        );
        let completion = self.transport.send(&cdb, buf, cmd.direction());
        let registers = AtaErrorRegisters::from_sense(&completion.sense, cmd.task_file.is_extended());
        let response = AtaResponse {
            code: completion.code,
            registers,
        };
        if !response.succeeded() {
            log::debug!(
                "ATA command {:#04x}: code {} status {:#04x} error {:?}",
                cmd.task_file.command(),
                response.code,
                registers.status,
                registers.error_names()
            );
        }
        response
    }

    fn ata_identify_with(&mut self, command: u8, buf: &mut [u8; IDENTIFY_LEN]) -> AtaResponse {
        let regs = AtaRegistersChs {
            sector_count: 1,
            ..AtaRegistersChs::new(command)
        };
        self.execute_ata(
            &AtaPassThrough16Command::new(
                TaskFile::Chs(regs),
                AtaProtocol::PioIn,
                TransferRegister::SectorCount,
                true,
            ),
            buf,
        )
    }

    pub fn ata_identify(&mut self, buf: &mut [u8; IDENTIFY_LEN]) -> AtaResponse {
        self.ata_identify_with(opcode::IDENTIFY_DEVICE, buf)
    }

    pub fn ata_identify_packet(&mut self, buf: &mut [u8; IDENTIFY_LEN]) -> AtaResponse {
        self.ata_identify_with(opcode::IDENTIFY_PACKET_DEVICE, buf)
    }

    /// READ SECTORS; 48-bit addresses use READ SECTORS EXT, which has no retry form.
    pub fn ata_read_sectors(
        &mut self,
        retry: bool,
        address: AtaAddress,
        count: u16,
        buf: &mut [u8],
    ) -> AtaResponse {
        let command = if retry {
            opcode::READ_SECTORS_RETRY
        } else {
            opcode::READ_SECTORS
        };
        let task_file = address.task_file(command, opcode::READ_SECTORS_EXT, count);
        self.execute_ata(
            &AtaPassThrough16Command::new(
                task_file,
                AtaProtocol::PioIn,
                TransferRegister::SectorCount,
                true,
            ),
            buf,
        )
    }

    /// READ DMA; 48-bit addresses use READ DMA EXT.
    pub fn ata_read_dma(
        &mut self,
        retry: bool,
        address: AtaAddress,
        count: u16,
        buf: &mut [u8],
    ) -> AtaResponse {
        let command = if retry {
            opcode::READ_DMA_RETRY
        } else {
            opcode::READ_DMA
        };
        let task_file = address.task_file(command, opcode::READ_DMA_EXT, count);
        self.execute_ata(
            &AtaPassThrough16Command::new(
                task_file,
                AtaProtocol::Dma,
                TransferRegister::SectorCount,
                true,
            ),
            buf,
        )
    }

    /// READ LONG of one sector. There is no 48-bit form; such addresses are sent as 28-bit.
    pub fn ata_read_long(&mut self, retry: bool, address: AtaAddress, buf: &mut [u8]) -> AtaResponse {
        let command = if retry {
            opcode::READ_LONG_RETRY
        } else {
            opcode::READ_LONG
        };
        let address = match address {
            AtaAddress::Lba48(lba) => AtaAddress::Lba28(lba as u32),
            other => other,
        };
        self.execute_ata(
            &AtaPassThrough16Command::new(
                address.task_file(command, command, 1),
                AtaProtocol::PioIn,
                TransferRegister::SectorCount,
                true,
            ),
            buf,
        )
    }

    pub fn ata_seek(&mut self, address: AtaAddress) -> AtaResponse {
        let address = match address {
            AtaAddress::Lba48(lba) => AtaAddress::Lba28(lba as u32),
            other => other,
        };
        self.execute_ata(
            &AtaPassThrough16Command::new(
                address.task_file(opcode::SEEK, opcode::SEEK, 0),
                AtaProtocol::NoData,
                TransferRegister::None,
                false,
            ),
            &mut [],
        )
    }
}

/// Absolute `0x00MMSSFF` address to a frame count.
fn msf_to_lba(msf: u32) -> u32 {
    let (m, s, f) = ((msf >> 16) & 0xFF, (msf >> 8) & 0xFF, msf & 0xFF);
    (m * 60 + s) * 75 + f
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::{commands::Direction, transport::Completion};

    /// Replays canned completions and records every CDB it was given.
    #[derive(Default)]
    struct Replay {
        responses: VecDeque<(Completion, Vec<u8>)>,
        sent: Vec<(Vec<u8>, usize, Direction)>,
    }

    impl Transport for Replay {
        fn send(&mut self, cdb: &[u8], buffer: &mut [u8], direction: Direction) -> Completion {
            self.sent.push((cdb.to_vec(), buffer.len(), direction));
            let (completion, data) = self
                .responses
                .pop_front()
                .unwrap_or((Completion::failed(1, [0; 32]), Vec::new()));
            let n = data.len().min(buffer.len());
            buffer[..n].copy_from_slice(&data[..n]);
            completion
        }
    }

    #[test]
    fn inquiry_rereads_with_full_length() {
        let mut short = vec![0u8; 36];
        short[4] = 59;
        let mut replay = Replay::default();
        replay.responses.push_back((Completion::ok(), short.clone()));
        replay.responses.push_back((Completion::ok(), vec![0x05; 64]));
        let mut device = ScsiDevice::new(replay);
        let data = device.inquiry().unwrap();
        assert_eq!(data.len(), 64);
        let sent = &device.transport_mut().sent;
        assert_eq!(sent[0].0, vec![0x12, 0, 0, 0, 36, 0]);
        assert_eq!(sent[1].0, vec![0x12, 0, 0, 0, 64, 0]);
    }

    #[test]
    fn failure_carries_sense() {
        let mut sense = [0u8; 32];
        sense[0] = 0x70;
        sense[2] = 0x02;
        sense[12] = 0x3A;
        let mut replay = Replay::default();
        replay.responses.push_back((Completion::failed(1, sense), Vec::new()));
        let mut device = ScsiDevice::new(replay);
        let err = device.test_unit_ready().unwrap_err();
        assert_eq!(err.opcode, 0x00);
        assert!(err.sense_info().unwrap().medium_not_present());
        assert_eq!(device.transport_mut().sent[0].2, Direction::None);
    }

    #[test]
    fn declared_length_second_pass() {
        let mut replay = Replay::default();
        replay.responses.push_back((Completion::ok(), vec![0x00, 0x0A, 0x01, 0x01]));
        replay.responses.push_back((Completion::ok(), vec![0xEE; 12]));
        let mut device = ScsiDevice::new(replay);
        let toc = device.read_toc(TocFormat::Toc).unwrap();
        assert_eq!(toc.len(), 12);
        assert_eq!(device.transport_mut().sent[1].1, 12);
    }

    #[test]
    fn ata_identify_reads_registers_even_on_success() {
        let mut sense = [0u8; 32];
        sense[21] = 0x51;
        sense[11] = 0x04;
        let mut replay = Replay::default();
        replay.responses.push_back((Completion::ok(), vec![0x40; 512]));
        replay.responses.push_back((Completion::failed(0, sense), Vec::new()));
        let mut device = ScsiDevice::new(replay);

        let mut buf = [0u8; IDENTIFY_LEN];
        let ok = device.ata_identify(&mut buf);
        assert!(ok.succeeded());
        assert_eq!(buf[0], 0x40);

        let aborted = device.ata_identify_packet(&mut buf);
        assert_eq!(aborted.code, 0);
        assert!(!aborted.succeeded());
        assert_eq!(aborted.registers.error_names(), vec!["ABRT"]);

        let sent = &device.transport_mut().sent;
        assert_eq!(sent[0].0[14], 0xEC);
        assert_eq!(sent[1].0[14], 0xA1);
        assert_eq!(sent[0].2, Direction::In);
    }

    #[test]
    fn ata_read_address_forms() {
        let mut device = ScsiDevice::new(Replay::default());
        let mut buf = [0u8; 512];
        device.ata_read_sectors(false, AtaAddress::Lba48(0x1_0000_0000), 1, &mut buf);
        device.ata_read_dma(true, AtaAddress::Chs { cylinder: 0, head: 0, sector: 1 }, 1, &mut buf);
        device.ata_seek(AtaAddress::Lba28(1));
        let sent = &device.transport_mut().sent;
        assert_eq!(sent[0].0[14], 0x24);
        assert_eq!(sent[0].0[1] & 0x01, 0x01);
        assert_eq!(sent[1].0[14], 0xC8);
        assert_eq!(sent[1].2, Direction::Bidirectional);
        assert_eq!(sent[2].0[14], 0x70);
        assert_eq!(sent[2].2, Direction::None);
    }

    #[test]
    fn msf_frames() {
        assert_eq!(msf_to_lba(0x0000_0200), 150);
        assert_eq!(msf_to_lba(0x0001_0000), 4500);
    }
}
