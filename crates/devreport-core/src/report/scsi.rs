use devreport_scsi::{
    Transport,
    commands::{
        inquiry::{InquiryData, PeripheralDeviceType, parse_supported_vpd_pages},
        read_capacity::{ReadCapacity10Data, ReadCapacity16Data},
    },
};

use super::{INSERT_MEDIA, MORE_MEDIA, Session, write_text};
use crate::{ReportError, detect::Detected, translate::scsi as tr, xml::ReportSink};

/// Write a code as its label, or as the bare number when it has none.
fn write_code(sink: &mut dyn ReportSink, name: &str, code: u8, label: Option<&str>) {
    match label {
        Some(label) => sink.write_element(name, label),
        None => sink.write_formatted(name, format_args!("{code}")),
    }
}

fn write_inquiry(sink: &mut dyn ReportSink, inquiry: &InquiryData) {
    sink.start_element("InquiryData");
    write_code(
        sink,
        "PeripheralQualifier",
        inquiry.peripheral_qualifier,
        tr::peripheral_qualifier(inquiry.peripheral_qualifier),
    );
    write_code(
        sink,
        "PeripheralDeviceType",
        inquiry.peripheral_device_type,
        tr::peripheral_device_type(inquiry.peripheral_device_type),
    );
    sink.write_bool("Removable", inquiry.is_removable);
    if inquiry.device_type_modifier != 0 {
        sink.write_formatted(
            "DeviceTypeModifier",
            format_args!("{}", inquiry.device_type_modifier),
        );
    }
    write_code(sink, "ISOVersion", inquiry.iso_version, tr::iso_version(inquiry.iso_version));
    write_code(sink, "ECMAVersion", inquiry.ecma_version, tr::ecma_version(inquiry.ecma_version));
    write_code(sink, "ANSIVersion", inquiry.ansi_version, tr::ansi_version(inquiry.ansi_version));
    sink.write_formatted(
        "ResponseDataFormat",
        format_args!("{}", inquiry.response_data_format),
    );

    let flags = [
        ("AsynchronousEventReporting", inquiry.async_event_reporting),
        ("TerminateTask", inquiry.terminate_task),
        ("NormalACA", inquiry.normal_aca),
        ("HierarchicalLUN", inquiry.hierarchical_lun),
        ("StorageArrayController", inquiry.storage_array_controller),
        ("AccessControlCoordinator", inquiry.access_control_coordinator),
        ("ThirdPartyCopy", inquiry.third_party_copy),
        ("Protection", inquiry.protection),
        ("BasicQueueing", inquiry.basic_queueing),
        ("EnclosureServices", inquiry.enclosure_services),
        ("MultiPortDevice", inquiry.multi_port),
        ("MediumChanger", inquiry.medium_changer),
        ("ACKRequests", inquiry.ack_requests),
        ("Address32", inquiry.address32),
        ("Address16", inquiry.address16),
        ("RelativeAddressing", inquiry.relative_addressing),
        ("WideBus32", inquiry.wide_bus32),
        ("WideBus16", inquiry.wide_bus16),
        ("SyncTransfer", inquiry.sync_transfer),
        ("LinkedCommands", inquiry.linked_commands),
        ("TransferDisable", inquiry.transfer_disable),
        ("CommandQueue", inquiry.command_queue),
        ("QuickArbitration", inquiry.quick_arbitration),
        ("InformationUnitSupport", inquiry.information_unit_support),
    ];
    for (name, value) in flags {
        sink.write_bool(name, value);
    }
    write_code(sink, "TPGS", inquiry.tpgs, tr::tpgs(inquiry.tpgs));
    if let Some(clocking) = inquiry.spi_clocking {
        write_code(sink, "SPIClocking", clocking, tr::spi_clocking(clocking));
    }

    write_text(sink, "VendorIdentification", Some(inquiry.vendor().as_str()));
    write_text(sink, "ProductIdentification", Some(inquiry.product().as_str()));
    write_text(sink, "ProductRevisionLevel", Some(inquiry.revision().as_str()));

    for &descriptor in &inquiry.version_descriptors {
        match tr::version_descriptor(descriptor) {
            Some(name) => sink.write_formatted(
                "VersionDescriptor",
                format_args!("{name} ({descriptor:04X}h)"),
            ),
            None => sink.write_formatted("VersionDescriptor", format_args!("{descriptor:04X}h")),
        }
    }
    sink.end_element();
}

impl<T: Transport> Session<'_, T> {
    pub(crate) fn scsi_report(&mut self, detected: &Detected) -> Result<(), ReportError> {
        let inquiry = detected
            .inquiry
            .as_ref()
            .ok_or(ReportError::IdentificationFailed { command: "INQUIRY" })?;
        let device_type = inquiry.device_type();

        self.sink.start_element("SCSI");
        self.sink.write_data("Inquiry", &inquiry.raw);
        write_inquiry(self.sink, inquiry);
        self.evpd_pages();

        let removable = inquiry.is_removable
            && self
                .console
                .confirm("Is the media removable from the reading/writing elements?");
        if removable {
            let message = match device_type {
                PeripheralDeviceType::SequentialAccess => {
                    "Please remove any tape from the drive and press any key when it is out."
                }
                _ => "Please remove any media from the device and press any key when it is out.",
            };
            self.console.wait_for_enter(message);
        }

        let mode = self.mode_sense(device_type);

        match device_type {
            PeripheralDeviceType::MultiMedia => self.mmc_report(inquiry, mode.as_ref()),
            PeripheralDeviceType::SequentialAccess => self.ssc_report(),
            _ if removable => self.sbc_media_loop(device_type),
            _ => {
                self.sink.start_element("ReadCapabilities");
                if !self.wait_until_ready() {
                    log::warn!("The device did not report ready, probing anyway");
                }
                self.sbc_tests(device_type);
                self.sink.end_element();
            }
        }

        self.sink.end_element();
        Ok(())
    }

    /// Archive every VPD page the device lists.
    fn evpd_pages(&mut self) {
        log::info!("Querying list of SCSI EVPDs...");
        let pages = match self.device.inquiry_vpd(0x00) {
            Ok(buf) => parse_supported_vpd_pages(&buf).unwrap_or_default(),
            Err(err) => {
                log::debug!("EVPD page 0x00 unavailable: {err}");
                return;
            }
        };
        let pages: Vec<u8> = pages.into_iter().filter(|page| *page != 0x00).collect();
        if pages.is_empty() {
            return;
        }

        self.sink.start_element("EVPDPages");
        for page in pages {
            log::info!("Requesting EVPD page {page:#04x}...");
            match self.device.inquiry_vpd(page) {
                Ok(buf) => {
                    self.sink.start_element("EVPD");
                    self.sink.write_attribute("page", &format!("0x{page:02X}"));
                    self.sink.write_base64(&buf);
                    self.sink.end_element();
                }
                Err(err) => log::debug!("EVPD page {page:#04x} failed: {err}"),
            }
        }
        self.sink.end_element();
    }

    fn sbc_media_loop(&mut self, device_type: PeripheralDeviceType) {
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
            let ready = self.wait_until_ready();
            self.sink.write_bool("MediaIsRecognized", ready);
            if ready {
                self.sbc_tests(device_type);
            }
            self.sink.end_element();

            if let Err(err) = self.device.eject() {
                log::debug!("Could not eject the media: {err}");
            }
        }
        self.sink.end_element();
    }

    /// Capacity, mode pages and the READ family against the current medium.
    /// Returns the block size in use.
    pub(crate) fn capacity_tests(&mut self, default_block_size: u32) -> u32 {
        log::info!("Querying SCSI READ CAPACITY...");
        let ten = self.device.read_capacity10();
        let ten = self.probe("SupportsReadCapacity", None, ten);
        log::info!("Querying SCSI READ CAPACITY (16)...");
        let sixteen = self.device.read_capacity16();
        let sixteen = self.probe("SupportsReadCapacity16", None, sixteen);

        let mut capacity = None;
        if let Some(data) = ten.and_then(|buf| ReadCapacity10Data::parse(&buf).ok()) {
            capacity = Some((data.blocks(), data.block_length_bytes));
        }
        if let Some(data) = sixteen.and_then(|buf| ReadCapacity16Data::parse(&buf).ok()) {
            capacity = Some((data.blocks(), data.block_length_bytes));
        }

        match capacity {
            Some((blocks, block_size)) if block_size != 0 => {
                self.sink.write_formatted("Blocks", format_args!("{blocks}"));
                self.sink
                    .write_formatted("BlockSize", format_args!("{block_size}"));
                block_size
            }
            _ => default_block_size,
        }
    }

    pub(crate) fn read_family_tests(&mut self, block_size: u32) {
        log::info!("Trying SCSI READ (6)...");
        let result = self.device.read6(0, 1, block_size);
        self.probe("SupportsRead6", None, result);
        log::info!("Trying SCSI READ (10)...");
        let result = self.device.read10(0, 1, block_size);
        self.probe("SupportsRead10", None, result);
        log::info!("Trying SCSI READ (12)...");
        let result = self.device.read12(0, 1, block_size);
        self.probe("SupportsRead12", None, result);
        log::info!("Trying SCSI READ (16)...");
        let result = self.device.read16(0, 1, block_size);
        self.probe("SupportsRead16", None, result);
    }

    fn sbc_tests(&mut self, device_type: PeripheralDeviceType) {
        let block_size = self.capacity_tests(512);
        self.mode_sense(device_type);
        self.read_family_tests(block_size);
        self.read_long_tests(block_size);
    }
}
