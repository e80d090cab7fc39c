//! INQUIRY, MMC and SSC code values.

pub fn peripheral_device_type(code: u8) -> Option<&'static str> {
    Some(match code {
        0x00 => "Direct-access device",
        0x01 => "Sequential-access device",
        0x02 => "Printer device",
        0x03 => "Processor device",
        0x04 => "Write-once device",
        0x05 => "CD-ROM/DVD/etc device",
        0x06 => "Scanner device",
        0x07 => "Optical memory device",
        0x08 => "Medium change device",
        0x09 => "Communications device",
        0x0A | 0x0B => "Graphics arts pre-press device",
        0x0C => "Array controller device",
        0x0D => "Enclosure services device",
        0x0E => "Simplified direct-access device",
        0x0F => "Optical card reader/writer device",
        0x10 => "Bridging expander",
        0x11 => "Object-based storage device",
        0x12 => "Automation/drive interface",
        0x13 => "Security manager device",
        0x14 => "Host managed zoned block device",
        0x1E => "Well known logical unit",
        0x1F => "Unknown or no device type",
        _ => return None,
    })
}

pub fn peripheral_qualifier(code: u8) -> Option<&'static str> {
    match code {
        0 => Some("Supported"),
        1 => Some("Unconnected"),
        3 => Some("Unsupported"),
        _ => None,
    }
}

/// Target port group support, INQUIRY byte 5 bits 5..4.
pub fn tpgs(code: u8) -> Option<&'static str> {
    match code {
        0 => Some("NotSupported"),
        1 => Some("OnlyImplicit"),
        2 => Some("OnlyExplicit"),
        3 => Some("Both"),
        _ => None,
    }
}

/// SPI clocking, INQUIRY byte 56 bits 3..2.
pub fn spi_clocking(code: u8) -> Option<&'static str> {
    match code {
        0 => Some("ST"),
        1 => Some("DT"),
        3 => Some("STandDT"),
        _ => None,
    }
}

pub fn ansi_version(version: u8) -> Option<&'static str> {
    match version {
        0 => Some("No standard"),
        1 => Some("SCSI-1"),
        2 => Some("SCSI-2"),
        3 => Some("SPC"),
        4 => Some("SPC-2"),
        5 => Some("SPC-3"),
        6 => Some("SPC-4"),
        7 => Some("SPC-5"),
        _ => None,
    }
}

pub fn ecma_version(version: u8) -> Option<&'static str> {
    match version {
        1 => Some("ECMA-111"),
        _ => None,
    }
}

pub fn iso_version(version: u8) -> Option<&'static str> {
    match version {
        1 => Some("ISO/IEC 9316"),
        _ => None,
    }
}

/// Standard named by a version descriptor. The low five bits select a revision.
pub fn version_descriptor(descriptor: u16) -> Option<&'static str> {
    Some(match descriptor & !0x1F {
        0x0020 => "SAM",
        0x0040 => "SAM-2",
        0x0060 => "SAM-3",
        0x0080 => "SAM-4",
        0x00A0 => "SAM-5",
        0x00C0 => "SAM-6",
        0x0120 => "SPC",
        0x0140 => "MMC",
        0x0160 => "SCC",
        0x0180 => "SBC",
        0x01A0 => "SMC",
        0x01C0 => "SES",
        0x01E0 => "SCC-2",
        0x0200 => "SSC",
        0x0220 => "RBC",
        0x0240 => "MMC-2",
        0x0260 => "SPC-2",
        0x0280 => "OCRW",
        0x02A0 => "MMC-3",
        0x02C0 => "RMC",
        0x02E0 => "SMC-2",
        0x0300 => "SPC-3",
        0x0320 => "SBC-2",
        0x0340 => "OSD",
        0x0360 => "SSC-2",
        0x0380 => "BCC",
        0x03A0 => "MMC-4",
        0x03C0 => "ADC",
        0x03E0 => "SES-2",
        0x0400 => "SSC-3",
        0x0420 => "MMC-5",
        0x0440 => "OSD-2",
        0x0460 => "SPC-4",
        0x0480 => "SMC-3",
        0x04A0 => "ADC-2",
        0x04C0 => "SBC-3",
        0x04E0 => "MMC-6",
        0x0500 => "ADC-3",
        0x0520 => "SSC-4",
        0x0560 => "OSD-3",
        0x0580 => "SES-3",
        0x05A0 => "SSC-5",
        0x05C0 => "SPC-5",
        0x0600 => "SBC-4",
        0x0620 => "ZBC",
        _ => return None,
    })
}

/// Core feature physical interface standard.
pub fn physical_interface(code: u32) -> Option<&'static str> {
    Some(match code {
        0 => "Unspecified",
        1 => "SCSI",
        2 => "ATAPI",
        3 => "IEEE 1394-1995",
        4 => "IEEE 1394A",
        5 => "Fibre Channel",
        6 => "IEEE 1394B",
        7 => "Serial ATAPI",
        8 => "USB",
        0xFFFF => "Vendor unique",
        _ => return None,
    })
}

/// Loading mechanism of mode page 2Ah and the Removable Medium feature.
pub fn loading_mechanism(code: u8) -> Option<&'static str> {
    match code {
        0 => Some("Caddy"),
        1 => Some("Tray"),
        2 => Some("Pop-up"),
        4 => Some("Changer with individually changeable discs"),
        5 => Some("Changer using a magazine"),
        _ => None,
    }
}

/// MMC profile names.
pub fn profile(code: u16) -> Option<&'static str> {
    Some(match code {
        0x0001 => "Non-removable disk",
        0x0002 => "Removable disk",
        0x0003 => "MO erasable",
        0x0004 => "Optical write once",
        0x0005 => "AS-MO",
        0x0008 => "CD-ROM",
        0x0009 => "CD-R",
        0x000A => "CD-RW",
        0x0010 => "DVD-ROM",
        0x0011 => "DVD-R sequential recording",
        0x0012 => "DVD-RAM",
        0x0013 => "DVD-RW restricted overwrite",
        0x0014 => "DVD-RW sequential recording",
        0x0015 => "DVD-R DL sequential recording",
        0x0016 => "DVD-R DL jump recording",
        0x0017 => "DVD-RW DL",
        0x0018 => "DVD-Download disc recording",
        0x001A => "DVD+RW",
        0x001B => "DVD+R",
        0x0020 => "DDCD-ROM",
        0x0021 => "DDCD-R",
        0x0022 => "DDCD-RW",
        0x002A => "DVD+RW DL",
        0x002B => "DVD+R DL",
        0x0040 => "BD-ROM",
        0x0041 => "BD-R SRM",
        0x0042 => "BD-R RRM",
        0x0043 => "BD-RE",
        0x0050 => "HD DVD-ROM",
        0x0051 => "HD DVD-R",
        0x0052 => "HD DVD-RAM",
        0x0053 => "HD DVD-RW",
        0x0058 => "HD DVD-R DL",
        0x005A => "HD DVD-RW DL",
        0xFFFF => "Nonstandard",
        _ => return None,
    })
}

/// Medium type byte of a direct-access MODE SENSE header.
pub fn medium_type(code: u8) -> Option<&'static str> {
    match code {
        0x00 => Some("Default"),
        0x01 => Some("Flexible disk, single-sided"),
        0x02 => Some("Flexible disk, double-sided"),
        0x05 => Some("Flexible disk 8\", single-sided, single density"),
        0x0A => Some("Flexible disk 5.25\", double-sided, double density"),
        0x1E => Some("Flexible disk 3.5\", 135 tpi, double density"),
        0x93 => Some("Flexible disk 3.5\", 135 tpi, high density"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_types() {
        assert_eq!(peripheral_device_type(0x05), Some("CD-ROM/DVD/etc device"));
        assert_eq!(peripheral_device_type(0x15), None);
    }

    #[test]
    fn version_descriptor_families() {
        assert_eq!(version_descriptor(0x0460), Some("SPC-4"));
        assert_eq!(version_descriptor(0x047C), Some("SPC-4"));
        assert_eq!(version_descriptor(0x04E0), Some("MMC-6"));
        assert_eq!(version_descriptor(0x1000), None);
    }

    #[test]
    fn closed_enumerations() {
        assert_eq!(tpgs(3), Some("Both"));
        assert_eq!(spi_clocking(2), None);
        assert_eq!(peripheral_qualifier(2), None);
        assert_eq!(profile(0x0043), Some("BD-RE"));
        assert_eq!(profile(0x0044), None);
        assert_eq!(physical_interface(7), Some("Serial ATAPI"));
        assert_eq!(loading_mechanism(3), None);
    }
}
