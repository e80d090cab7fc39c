use crate::{DecodeError, commands::CommandBlock, ensure_len};

/// SCSI INQUIRY command (CDB).
///
/// Requests basic device identification (vendor, product, revision,
/// and type), or one vital product data page when `evpd` is set.
/// Typically the first command issued to discover what kind of device
/// is attached.
pub struct InquiryCommand {
    /// Request a vital product data page instead of standard data.
    pub evpd: bool,
    /// VPD page code, only meaningful with `evpd`.
    pub page_code: u8,
    /// Allocation length: how many bytes the host expects back.
    pub alloc_len: u16,
}

impl InquiryCommand {
    /// Construct a standard `INQUIRY` command with the given expected response size.
    pub fn new(alloc_len: u16) -> Self {
        Self {
            evpd: false,
            page_code: 0,
            alloc_len,
        }
    }

    /// Construct an `INQUIRY` command for vital product data page `page_code`.
    pub fn vpd(page_code: u8, alloc_len: u16) -> Self {
        Self {
            evpd: true,
            page_code,
            alloc_len,
        }
    }
}

impl CommandBlock for InquiryCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x12; // INQUIRY opcode
        cdb[1] = if self.evpd { 0x01 } else { 0x00 };
        cdb[2] = if self.evpd { self.page_code } else { 0x00 };
        cdb[3..5].copy_from_slice(&self.alloc_len.to_be_bytes());
        cdb[5] = 0x00; // control
        cdb
    }

    fn len(&self) -> u8 {
        6 // INQUIRY always 6-byte CDB
    }
}

/// SCSI Peripheral Device Type field (from byte 0 of INQUIRY data).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralDeviceType {
    /// Direct-access block device (e.g., disk).
    DirectAccess, // 0x00
    /// Sequential-access device (tape).
    SequentialAccess, // 0x01
    Printer,    // 0x02
    Processor,  // 0x03
    WriteOnce,  // 0x04
    /// CD/DVD/BD device.
    MultiMedia, // 0x05
    Scanner,    // 0x06
    /// Optical memory (e.g., MO disk).
    Optical, // 0x07
    MediumChanger,          // 0x08
    Communications,         // 0x09
    ArrayController,        // 0x0C
    EnclosureServices,      // 0x0D
    SimplifiedDirectAccess, // 0x0E
    OpticalCardReader,      // 0x0F
    BridgingExpander,       // 0x10
    ObjectStorage,          // 0x11
    AutomationDrive,        // 0x12
    SecurityManager,        // 0x13
    ZonedBlock,             // 0x14
    WellKnown,              // 0x1E
    Unknown,                // 0x1F
    /// Reserved or obsolete value.
    Other(u8),
}

impl From<u8> for PeripheralDeviceType {
    fn from(value: u8) -> Self {
        match value & 0x1F {
            0x00 => PeripheralDeviceType::DirectAccess,
            0x01 => PeripheralDeviceType::SequentialAccess,
            0x02 => PeripheralDeviceType::Printer,
            0x03 => PeripheralDeviceType::Processor,
            0x04 => PeripheralDeviceType::WriteOnce,
            0x05 => PeripheralDeviceType::MultiMedia,
            0x06 => PeripheralDeviceType::Scanner,
            0x07 => PeripheralDeviceType::Optical,
            0x08 => PeripheralDeviceType::MediumChanger,
            0x09 => PeripheralDeviceType::Communications,
            0x0C => PeripheralDeviceType::ArrayController,
            0x0D => PeripheralDeviceType::EnclosureServices,
            0x0E => PeripheralDeviceType::SimplifiedDirectAccess,
            0x0F => PeripheralDeviceType::OpticalCardReader,
            0x10 => PeripheralDeviceType::BridgingExpander,
            0x11 => PeripheralDeviceType::ObjectStorage,
            0x12 => PeripheralDeviceType::AutomationDrive,
            0x13 => PeripheralDeviceType::SecurityManager,
            0x14 => PeripheralDeviceType::ZonedBlock,
            0x1E => PeripheralDeviceType::WellKnown,
            0x1F => PeripheralDeviceType::Unknown,
            other => PeripheralDeviceType::Other(other),
        }
    }
}

/// Minimum size of standard INQUIRY data.
pub const INQUIRY_MIN_LEN: usize = 36;

/// Parsed standard INQUIRY response data.
///
/// Flag fields follow SPC-4 byte/bit positions; fields from older SCSI-2
/// layouts (device type modifier, ISO/ECMA versions) are kept because
/// plenty of drives still fill them.
#[derive(Clone, PartialEq, Eq)]
pub struct InquiryData {
    /// Byte 0, bits 7..5.
    pub peripheral_qualifier: u8,
    /// Byte 0, bits 4..0, raw.
    pub peripheral_device_type: u8,
    /// Byte 1, bit 7.
    pub is_removable: bool,
    /// Byte 1, bits 6..0 (SCSI-2).
    pub device_type_modifier: u8,
    /// Byte 2, bits 7..6.
    pub iso_version: u8,
    /// Byte 2, bits 5..3.
    pub ecma_version: u8,
    /// Byte 2, bits 2..0.
    pub ansi_version: u8,
    /// Byte 2 as a whole (SPC version).
    pub version: u8,
    pub async_event_reporting: bool,
    pub terminate_task: bool,
    pub normal_aca: bool,
    pub hierarchical_lun: bool,
    pub response_data_format: u8,
    /// Additional Length field (byte 4).
    /// Indicates the number of bytes following byte 4 in the standard INQUIRY data.
    pub additional_length: u8,
    pub storage_array_controller: bool,
    pub access_control_coordinator: bool,
    /// Target port group support, byte 5 bits 5..4.
    pub tpgs: u8,
    pub third_party_copy: bool,
    pub protection: bool,
    pub basic_queueing: bool,
    pub enclosure_services: bool,
    pub multi_port: bool,
    pub medium_changer: bool,
    pub ack_requests: bool,
    pub address32: bool,
    pub address16: bool,
    pub relative_addressing: bool,
    pub wide_bus32: bool,
    pub wide_bus16: bool,
    pub sync_transfer: bool,
    pub linked_commands: bool,
    pub transfer_disable: bool,
    pub command_queue: bool,
    /// ASCII vendor ID (8 bytes, space padded).
    pub vendor_identification: [u8; 8],
    /// ASCII product ID (16 bytes, space padded).
    pub product_identification: [u8; 16],
    /// ASCII product revision (4 bytes, space padded).
    pub product_revision_level: [u8; 4],
    /// Byte 56 bits 3..2, only when the response reaches byte 56.
    pub spi_clocking: Option<u8>,
    pub quick_arbitration: bool,
    pub information_unit_support: bool,
    /// Bytes 58..74, zero entries skipped.
    pub version_descriptors: Vec<u16>,
    /// The response as returned, cut to the declared length.
    pub raw: Vec<u8>,
}

impl std::fmt::Debug for InquiryData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InquiryData")
            .field("peripheral_device_type", &self.device_type())
            .field("is_removable", &self.is_removable)
            .field("additional_length", &self.additional_length)
            .field("vendor", &self.vendor())
            .field("product", &self.product())
            .field("revision", &self.revision())
            .finish()
    }
}

impl InquiryData {
    /// Parse a standard INQUIRY response.
    ///
    /// The usable length is `additional_length + 5`, bounded by the buffer.
    pub fn parse(buf: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("INQUIRY data", buf, INQUIRY_MIN_LEN)?;

        let declared = buf[4] as usize + 5;
        let buf = &buf[..declared.clamp(INQUIRY_MIN_LEN, buf.len())];

        let mut vendor_identification = [0u8; 8];
        vendor_identification.copy_from_slice(&buf[8..16]);

        let mut product_identification = [0u8; 16];
        product_identification.copy_from_slice(&buf[16..32]);

        let mut product_revision_level = [0u8; 4];
        product_revision_level.copy_from_slice(&buf[32..36]);

        let spi_clocking = buf.get(56).map(|b| (b & 0x0C) >> 2);
        let byte56 = buf.get(56).copied().unwrap_or(0);

        let version_descriptors = buf
            .get(58..buf.len().min(74))
            .unwrap_or(&[])
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .filter(|descriptor| *descriptor != 0)
            .collect();

        Ok(Self {
            peripheral_qualifier: (buf[0] & 0xE0) >> 5,
            peripheral_device_type: buf[0] & 0x1F,
            is_removable: buf[1] & 0x80 != 0,
            device_type_modifier: buf[1] & 0x7F,
            iso_version: (buf[2] & 0xC0) >> 6,
            ecma_version: (buf[2] & 0x38) >> 3,
            ansi_version: buf[2] & 0x07,
            version: buf[2],
            async_event_reporting: buf[3] & 0x80 != 0,
            terminate_task: buf[3] & 0x40 != 0,
            normal_aca: buf[3] & 0x20 != 0,
            hierarchical_lun: buf[3] & 0x10 != 0,
            response_data_format: buf[3] & 0x0F,
            additional_length: buf[4],
            storage_array_controller: buf[5] & 0x80 != 0,
            access_control_coordinator: buf[5] & 0x40 != 0,
            tpgs: (buf[5] & 0x30) >> 4,
            third_party_copy: buf[5] & 0x08 != 0,
            protection: buf[5] & 0x01 != 0,
            basic_queueing: buf[6] & 0x80 != 0,
            enclosure_services: buf[6] & 0x40 != 0,
            multi_port: buf[6] & 0x10 != 0,
            medium_changer: buf[6] & 0x08 != 0,
            ack_requests: buf[6] & 0x04 != 0,
            address32: buf[6] & 0x02 != 0,
            address16: buf[6] & 0x01 != 0,
            relative_addressing: buf[7] & 0x80 != 0,
            wide_bus32: buf[7] & 0x40 != 0,
            wide_bus16: buf[7] & 0x20 != 0,
            sync_transfer: buf[7] & 0x10 != 0,
            linked_commands: buf[7] & 0x08 != 0,
            transfer_disable: buf[7] & 0x04 != 0,
            command_queue: buf[7] & 0x02 != 0,
            vendor_identification,
            product_identification,
            product_revision_level,
            spi_clocking,
            quick_arbitration: byte56 & 0x02 != 0,
            information_unit_support: byte56 & 0x01 != 0,
            version_descriptors,
            raw: buf.to_vec(),
        })
    }

    pub fn device_type(&self) -> PeripheralDeviceType {
        PeripheralDeviceType::from(self.peripheral_device_type)
    }

    /// Vendor ID string (trimmed ASCII).
    pub fn vendor(&self) -> String {
        trimmed(&self.vendor_identification)
    }

    /// Product ID string (trimmed ASCII).
    pub fn product(&self) -> String {
        trimmed(&self.product_identification)
    }

    /// Revision string (trimmed ASCII).
    pub fn revision(&self) -> String {
        trimmed(&self.product_revision_level)
    }
}

fn trimmed(field: &[u8]) -> String {
    String::from_utf8_lossy(field)
        .trim_end_matches([' ', '\0'])
        .to_string()
}

/// Parse the "supported VPD pages" page (page 0x00) into its page list.
pub fn parse_supported_vpd_pages(buf: &[u8]) -> Result<Vec<u8>, DecodeError> {
    ensure_len("supported VPD pages", buf, 4)?;
    let length = u16::from_be_bytes([buf[2], buf[3]]) as usize;
    let end = (4 + length).min(buf.len());
    Ok(buf[4..end].to_vec())
}

/// Bytes a VPD page occupies according to its own header.
pub fn vpd_page_len(buf: &[u8]) -> Result<usize, DecodeError> {
    ensure_len("VPD page header", buf, 4)?;
    Ok(u16::from_be_bytes([buf[2], buf[3]]) as usize + 4)
}
