use devreport_scsi::{
    Transport,
    ata::identify::{IDENTIFY_LEN, IdentifyDevice},
    device::AtaAddress,
};

use super::{INSERT_MEDIA, MORE_MEDIA, Session, write_number, write_text};
use crate::{ReportError, detect::Detected, translate::ata as tr, xml::ReportSink};

const FIRST_CHS_SECTOR: AtaAddress = AtaAddress::Chs {
    cylinder: 0,
    head: 0,
    sector: 1,
};

fn write_modes(sink: &mut dyn ReportSink, supported: &str, active: &str, modes: (Option<String>, Option<String>)) {
    write_text(sink, supported, modes.0.as_deref());
    write_text(sink, active, modes.1.as_deref());
}

/// Decoded IDENTIFY (PACKET) DEVICE fields.
fn write_identify(sink: &mut dyn ReportSink, id: &IdentifyDevice, atapi: bool) {
    sink.write_data("Identify", id.raw());

    let general = if atapi {
        tr::atapi_general_configuration(id.general_configuration())
    } else {
        tr::general_configuration(id.general_configuration())
    };
    write_text(sink, "GeneralConfiguration", general.as_deref());
    write_text(
        sink,
        "SpecificConfiguration",
        tr::specific_configuration(id.specific_configuration()),
    );

    write_text(sink, "Model", id.model().as_deref());
    write_text(sink, "FirmwareRevision", id.firmware_revision().as_deref());
    write_text(sink, "AdditionalPID", id.additional_product_id().as_deref());
    write_text(sink, "MediaManufacturer", id.current_media_manufacturer().as_deref());

    if !atapi {
        write_number(sink, "BufferType", id.buffer_type().into());
        write_number(sink, "BufferSize", id.buffer_size().into());
        write_number(sink, "EccBytes", id.ecc_bytes().into());
        write_number(sink, "MultipleMaxSectors", id.multiple_max_sectors().into());
        if let Some(count) = id.multiple_sector_setting() {
            write_number(sink, "MultipleSectorNumber", count.into());
        }
    }

    write_text(sink, "Capabilities", tr::capabilities(id.capabilities()).as_deref());
    write_text(sink, "Capabilities2", tr::capabilities2(id.capabilities2()).as_deref());
    write_text(sink, "Capabilities3", tr::capabilities3(id.capabilities3()).as_deref());

    write_number(sink, "PIOTransferTimingMode", id.pio_transfer_timing_mode().into());
    write_number(sink, "DMATransferTimingMode", id.dma_transfer_timing_mode().into());
    write_text(sink, "APIOSupported", tr::advanced_pio_modes(id.advanced_pio_modes()).as_deref());
    write_modes(sink, "DMASupported", "DMAActive", tr::transfer_modes("DMA", id.dma_single_word()));
    write_modes(sink, "MDMASupported", "MDMAActive", tr::transfer_modes("MDMA", id.dma_multi_word()));
    write_modes(sink, "UDMASupported", "UDMAActive", tr::transfer_modes("UDMA", id.udma()));
    write_number(sink, "MinMDMACycleTime", id.min_mdma_cycle_time().into());
    write_number(sink, "RecMDMACycleTime", id.recommended_mdma_cycle_time().into());
    write_number(sink, "MinPIOCycleTimeNoFlow", id.min_pio_cycle_time_no_flow().into());
    write_number(sink, "MinPIOCycleTimeFlow", id.min_pio_cycle_time_flow().into());

    write_text(sink, "MajorVersion", tr::major_version(id.major_version()).as_deref());
    write_number(sink, "MinorVersion", id.minor_version().into());
    write_text(
        sink,
        "TransportMajorVersion",
        tr::transport_major_version(id.transport_major_version()).as_deref(),
    );
    write_number(sink, "TransportMinorVersion", id.transport_minor_version().into());

    write_text(sink, "CommandSet", tr::command_set(id.command_set()).as_deref());
    write_text(sink, "CommandSet2", tr::command_set2(id.command_set2()).as_deref());
    write_text(sink, "CommandSet3", tr::command_set3(id.command_set3()).as_deref());
    write_text(sink, "CommandSet4", tr::command_set4(id.command_set4()).as_deref());
    write_text(sink, "CommandSet5", tr::command_set5(id.command_set5()).as_deref());
    write_text(sink, "EnabledCommandSet", tr::command_set(id.enabled_command_set()).as_deref());
    write_text(sink, "EnabledCommandSet2", tr::command_set2(id.enabled_command_set2()).as_deref());
    write_text(sink, "EnabledCommandSet3", tr::command_set3(id.enabled_command_set3()).as_deref());
    write_text(sink, "EnabledCommandSet4", tr::command_set4(id.enabled_command_set4()).as_deref());

    write_text(sink, "SATACapabilities", tr::sata_capabilities(id.sata_capabilities()).as_deref());
    write_text(sink, "SATAFeatures", tr::sata_features(id.sata_features()).as_deref());
    write_text(sink, "EnabledSATAFeatures", tr::sata_features(id.enabled_sata_features()).as_deref());
    write_text(sink, "SecurityStatus", tr::security_status(id.security_status()).as_deref());
    write_text(sink, "TrustedComputing", tr::trusted_computing(id.trusted_computing()).as_deref());
    write_text(sink, "DataSetManagement", tr::data_set_management(id.data_set_management()).as_deref());
    write_number(sink, "DataSetManagementSize", id.data_set_management_size().into());
    write_number(sink, "SecurityEraseTime", id.security_erase_time().into());
    write_number(sink, "EnhancedSecurityEraseTime", id.enhanced_security_erase_time().into());
    write_number(sink, "MasterPasswordRevisionCode", id.master_password_revision().into());
    write_number(sink, "CurrentAPM", id.current_apm().into());
    write_number(sink, "CurrentAAM", id.current_aam().into());
    write_number(sink, "RecommendedAAM", id.recommended_aam().into());
    write_number(sink, "MaxQueueDepth", id.max_queue_depth().into());
    write_number(sink, "NVCacheSize", id.nv_cache_size().into());

    if atapi {
        write_number(sink, "PacketBusRelease", id.packet_bus_release().into());
        write_number(sink, "ServiceBusyClear", id.service_busy_clear().into());
        write_number(sink, "ATAPIByteCount", id.atapi_byte_count().into());
    }

    write_text(sink, "FormFactor", tr::form_factor(id.form_factor()));
    write_text(
        sink,
        "NominalRotationRate",
        tr::nominal_rotation_rate(id.nominal_rotation_rate()).as_deref(),
    );
    let wwn = id.world_wide_name();
    if wwn != 0 {
        sink.write_formatted("WWN", format_args!("{wwn:016X}"));
    }
    if let Some(valid) = id.checksum_valid() {
        sink.write_bool("IdentifyChecksumValid", valid);
    }
}

/// Geometry and block counts of the current medium.
fn write_blocks(sink: &mut dyn ReportSink, id: &IdentifyDevice) {
    let logical = id.logical_sector_size();
    sink.write_formatted("BlockSize", format_args!("{logical}"));
    if id.physical_sector_size() != logical {
        sink.write_formatted("PhysicalBlockSize", format_args!("{}", id.physical_sector_size()));
    }
    if id.long_block_size() != logical {
        sink.write_formatted("LongBlockSize", format_args!("{}", id.long_block_size()));
    }
    if let Some(alignment) = id.logical_alignment() {
        sink.write_formatted("LogicalAlignment", format_args!("{alignment}"));
    }
    sink.write_formatted("Blocks", format_args!("{}", id.blocks()));

    if id.cylinders() != 0 && id.heads() != 0 && id.sectors_per_track() != 0 {
        sink.start_element("CHS");
        sink.write_formatted("Cylinders", format_args!("{}", id.cylinders()));
        sink.write_formatted("Heads", format_args!("{}", id.heads()));
        sink.write_formatted("Sectors", format_args!("{}", id.sectors_per_track()));
        sink.end_element();
    }
    if id.current_cylinders() != 0 && id.current_heads() != 0 && id.current_sectors_per_track() != 0 {
        sink.start_element("CurrentCHS");
        sink.write_formatted("Cylinders", format_args!("{}", id.current_cylinders()));
        sink.write_formatted("Heads", format_args!("{}", id.current_heads()));
        sink.write_formatted("Sectors", format_args!("{}", id.current_sectors_per_track()));
        sink.end_element();
    }
    if id.supports_lba() {
        sink.write_formatted("LBASectors", format_args!("{}", id.lba_sectors()));
    }
    if id.supports_lba48() {
        sink.write_formatted("LBA48Sectors", format_args!("{}", id.lba48_sectors()));
    }
}

impl<T: Transport> Session<'_, T> {
    pub(crate) fn ata_report(&mut self, detected: &Detected) -> Result<(), ReportError> {
        let id = detected
            .identify
            .as_ref()
            .ok_or(ReportError::IdentificationFailed {
                command: "IDENTIFY DEVICE",
            })?;

        self.sink.start_element("ATA");
        write_identify(self.sink, id, false);

        let removable = (id.is_removable() || id.is_compact_flash())
            && self.console.confirm(
                "Is the media removable from the reading/writing elements (flash memories ARE NOT removable)?",
            );

        if removable {
            self.sink.start_element("RemovableMedias");
            while self.console.confirm(MORE_MEDIA) {
                self.console.wait_for_enter(INSERT_MEDIA);
                self.sink.start_element("TestedMedia");
                self.describe(&[
                    (
                        "MediumTypeName",
                        "Please write a description of the media type and press enter: ",
                    ),
                    ("Model", "Please write the media model and press enter: "),
                ]);

                log::info!("Querying ATA IDENTIFY...");
                let mut buf = [0u8; IDENTIFY_LEN];
                let response = self.device.ata_identify(&mut buf);
                let media = if response.succeeded() && buf.iter().any(|b| *b != 0) {
                    IdentifyDevice::parse(&buf).ok()
                } else {
                    None
                };
                self.sink.write_bool("MediaIsRecognized", media.is_some());
                if let Some(media) = media {
                    write_blocks(self.sink, &media);
                    self.ata_read_tests(&media);
                }
                self.sink.end_element();
            }
            self.sink.end_element();
        } else {
            self.sink.start_element("ReadCapabilities");
            write_blocks(self.sink, id);
            self.ata_read_tests(id);
            self.sink.end_element();
        }

        self.sink.end_element();
        Ok(())
    }

    pub(crate) fn atapi_report(&mut self, detected: &Detected) -> Result<(), ReportError> {
        let id = detected
            .identify
            .as_ref()
            .ok_or(ReportError::IdentificationFailed {
                command: "IDENTIFY PACKET DEVICE",
            })?;
        self.sink.start_element("ATAPI");
        write_identify(self.sink, id, true);
        self.sink.end_element();
        Ok(())
    }

    /// READ SECTORS, READ DMA and SEEK with and without retry at one address form.
    fn ata_address_tests(&mut self, address: AtaAddress, suffix: &str, sector_size: usize) {
        let mut buf = vec![0u8; sector_size];
        for retry in [false, true] {
            let retry_name = if retry { "Retry" } else { "" };
            log::info!("Trying ATA READ SECTORS{suffix} {retry_name}...");
            let response = self.device.ata_read_sectors(retry, address, 1, &mut buf);
            self.sink.write_bool(
                &format!("SupportsRead{retry_name}{suffix}"),
                response.succeeded(),
            );
        }
        for retry in [false, true] {
            let retry_name = if retry { "Retry" } else { "" };
            log::info!("Trying ATA READ DMA{suffix} {retry_name}...");
            let response = self.device.ata_read_dma(retry, address, 1, &mut buf);
            self.sink.write_bool(
                &format!("SupportsReadDma{retry_name}{suffix}"),
                response.succeeded(),
            );
        }
        log::info!("Trying ATA SEEK{suffix}...");
        let response = self.device.ata_seek(address);
        self.sink
            .write_bool(&format!("SupportsSeek{suffix}"), response.succeeded());
    }

    fn ata_read_tests(&mut self, id: &IdentifyDevice) {
        let sector_size = id.logical_sector_size() as usize;

        self.ata_address_tests(FIRST_CHS_SECTOR, "", sector_size);
        if id.supports_lba() {
            self.ata_address_tests(AtaAddress::Lba28(0), "Lba", sector_size);
        }
        if id.supports_lba48() {
            let mut buf = vec![0u8; sector_size];
            log::info!("Trying ATA READ SECTORS EXT...");
            let response = self
                .device
                .ata_read_sectors(false, AtaAddress::Lba48(0), 1, &mut buf);
            self.sink
                .write_bool("SupportsReadLba48", response.succeeded());
            log::info!("Trying ATA READ DMA EXT...");
            let response = self
                .device
                .ata_read_dma(false, AtaAddress::Lba48(0), 1, &mut buf);
            self.sink
                .write_bool("SupportsReadDmaLba48", response.succeeded());
        }

        let mut long = vec![0u8; id.long_block_size() as usize];
        let mut addresses = vec![(FIRST_CHS_SECTOR, "")];
        if id.supports_lba() {
            addresses.push((AtaAddress::Lba28(0), "Lba"));
        }
        for (address, suffix) in addresses {
            for retry in [false, true] {
                let retry_name = if retry { "Retry" } else { "" };
                log::info!("Trying ATA READ LONG{suffix} {retry_name}...");
                let response = self.device.ata_read_long(retry, address, &mut long);
                self.sink.write_bool(
                    &format!("SupportsReadLong{retry_name}{suffix}"),
                    response.succeeded(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use devreport_scsi::ScsiDevice;

    use crate::{
        NoProgress, ReportOptions,
        detect::detect,
        testing::{Reply, ScriptedConsole, ScriptedTransport, put_word},
        write_report,
        xml::XmlWriter,
    };

    const IDENTIFY: &[u8; 512] = include_bytes!("../../tests/fixtures/identify.bin");

    fn run(transport: ScriptedTransport, console: &mut ScriptedConsole) -> String {
        let mut device = ScsiDevice::new(transport);
        let detected = detect(&mut device).unwrap();
        let mut xml = XmlWriter::new();
        let options = ReportOptions {
            ready_attempts: 1,
            ready_interval: Duration::ZERO,
        };
        write_report(&mut device, &detected, &mut xml, console, &mut NoProgress, &options).unwrap();
        xml.finish()
    }

    #[test]
    fn fixed_disk_report() {
        let transport = ScriptedTransport::new(|cdb, _| match (cdb[0], cdb[14]) {
            (0x85, 0xEC) => Reply::data(IDENTIFY),
            // READ DMA is refused, everything else reads zeros.
            (0x85, 0xC8 | 0xC9) => Reply::failed(1),
            (0x85, _) => Reply::ok(),
            _ => Reply::check(0x05, 0x20, 0x00),
        });
        let mut console = ScriptedConsole::default();
        let xml = run(transport, &mut console);

        assert!(xml.contains("<ATA>"));
        assert!(xml.contains("<Model>SAMPLE DISK</Model>"));
        assert!(xml.contains("<FirmwareRevision>1.00</FirmwareRevision>"));
        assert!(xml.contains("<ReadCapabilities>"));
        assert!(xml.contains("<BlockSize>512</BlockSize>"));
        assert!(xml.contains("<Blocks>100800</Blocks>"));
        assert!(xml.contains("<LBASectors>100800</LBASectors>"));
        assert!(xml.contains("<SupportsRead>true</SupportsRead>"));
        assert!(xml.contains("<SupportsReadRetryLba>true</SupportsReadRetryLba>"));
        assert!(xml.contains("<SupportsReadDma>false</SupportsReadDma>"));
        assert!(xml.contains("<SupportsSeekLba>true</SupportsSeekLba>"));
        assert!(!xml.contains("SupportsReadLba48"));
        assert!(console.questions.is_empty());
    }

    #[test]
    fn removable_media_loop() {
        let mut image = IDENTIFY.to_vec();
        put_word(&mut image, 0, 0x0080);
        let transport = ScriptedTransport::new(move |cdb, _| match (cdb[0], cdb[14]) {
            (0x85, 0xEC) => Reply::data(&image),
            (0x85, _) => Reply::ok(),
            _ => Reply::check(0x05, 0x20, 0x00),
        });
        let mut console = ScriptedConsole::new(&[true, true, false], &["Zip 100", "ZIP-100"]);
        let xml = run(transport, &mut console);

        assert!(xml.contains("<RemovableMedias>"));
        assert!(xml.contains("<MediumTypeName>Zip 100</MediumTypeName>"));
        assert!(xml.contains("<Model>ZIP-100</Model>"));
        assert!(xml.contains("<MediaIsRecognized>true</MediaIsRecognized>"));
        assert!(!xml.contains("<ReadCapabilities>"));
        assert_eq!(console.questions.len(), 5);
    }

    #[test]
    fn busy_status_marks_the_read_unsupported() {
        let transport = ScriptedTransport::new(|cdb, _| match (cdb[0], cdb[14]) {
            (0x85, 0xEC) => Reply::data(IDENTIFY),
            // READ DMA completes at the transport but the device stays busy.
            (0x85, 0xC8 | 0xC9) => {
                let mut reply = Reply::ok();
                reply.sense[21] = 0x80;
                reply
            }
            (0x85, _) => Reply::ok(),
            _ => Reply::check(0x05, 0x20, 0x00),
        });
        let mut console = ScriptedConsole::default();
        let xml = run(transport, &mut console);

        assert!(xml.contains("<SupportsRead>true</SupportsRead>"));
        assert!(xml.contains("<SupportsReadDma>false</SupportsReadDma>"));
        assert!(xml.contains("<SupportsReadDmaRetryLba>false</SupportsReadDmaRetryLba>"));
    }
}
