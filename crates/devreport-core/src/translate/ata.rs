//! IDENTIFY DEVICE and IDENTIFY PACKET DEVICE words.

use super::{BitNames, flag_names, scsi};

/// Word 0 of an ATA device.
pub const GENERAL_CONFIGURATION: BitNames<16> = [
    "",
    "HardSector",
    "IncompleteResponse",
    "NotMFM",
    "HeadSwitch15us",
    "SpindleControl",
    "Fixed",
    "Removable",
    "TransferRate5Mbit",
    "TransferRate10Mbit",
    "TransferRateFaster",
    "RotationalSpeedTolerance",
    "DataStrobeOffset",
    "TrackOffset",
    "FormatGapReq",
    "NonMagnetic",
];

/// Word 49.
pub const CAPABILITIES: BitNames<16> = [
    "PhysicalAlignment0",
    "PhysicalAlignment1",
    "",
    "",
    "",
    "",
    "",
    "",
    "DMASupport",
    "LBASupport",
    "IORDYDisable",
    "IORDY",
    "",
    "StandbyTimer",
    "",
    "",
];

/// Word 50.
pub const CAPABILITIES2: BitNames<16> = [
    "SpecificStandbyTimer",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "MustBeSet",
    "MustBeClear",
];

/// Word 59 bits 15..8.
pub const CAPABILITIES3: BitNames<8> = [
    "MultipleValid",
    "",
    "SanitizeAntifreeze",
    "SanitizeCommands",
    "Sanitize",
    "CryptoScramble",
    "Overwrite",
    "BlockErase",
];

/// Words 82 and 85.
pub const COMMAND_SET: BitNames<16> = [
    "SMART",
    "SecurityMode",
    "RemovableMedia",
    "PowerManagement",
    "Packet",
    "WriteCache",
    "LookAhead",
    "Release",
    "Service",
    "DeviceReset",
    "HPA",
    "",
    "WriteBuffer",
    "ReadBuffer",
    "Nop",
    "",
];

/// Words 83 and 86.
pub const COMMAND_SET2: BitNames<16> = [
    "DownloadMicrocode",
    "RWQueuedDMA",
    "CompactFlash",
    "APM",
    "RemovableNotification",
    "PowerUpInStandby",
    "SetFeaturesRequired",
    "AddressOffsetReservedAreaBoot",
    "SetMax",
    "AAM",
    "LBA48",
    "DCO",
    "FlushCache",
    "FlushCacheExt",
    "MustBeSet",
    "MustBeClear",
];

/// Words 84 and 87.
pub const COMMAND_SET3: BitNames<16> = [
    "SMARTLog",
    "SMARTSelfTest",
    "MediaSerial",
    "MCPT",
    "Streaming",
    "GPL",
    "FUAWrite",
    "FUAWriteQ",
    "WWN",
    "URGReadStream",
    "URGWriteStream",
    "",
    "",
    "IdleImmediate",
    "MustBeSet",
    "MustBeClear",
];

/// Words 119 and 120.
pub const COMMAND_SET4: BitNames<16> = [
    "",
    "WRV",
    "WriteUnc",
    "RWDMAExtGpl",
    "SegmentedDownloadMicrocode",
    "FreeFallControl",
    "ExtStatusReporting",
    "ExtPowerCond",
    "AMAC",
    "DSN",
    "",
    "",
    "",
    "",
    "MustBeSet",
    "MustBeClear",
];

/// Word 69.
pub const COMMAND_SET5: BitNames<16> = [
    "ZonedBit0",
    "ZonedBit1",
    "AllCacheNV",
    "ExtSectors",
    "Encrypted",
    "ReadZeroTrim",
    "Optional28Bit",
    "IEEE1667",
    "DownloadMicroCodeDMA",
    "SetMaxDMA",
    "WriteBufferDMA",
    "ReadBufferDMA",
    "DeviceConfDMA",
    "LongPhysSectorAlignmentError",
    "DeterministicTrim",
    "CFast",
];

/// Word 76.
pub const SATA_CAPABILITIES: BitNames<16> = [
    "Clear",
    "Gen1Speed",
    "Gen2Speed",
    "Gen3Speed",
    "",
    "",
    "",
    "",
    "NCQ",
    "PowerReceipt",
    "PHYEventCounter",
    "UnloadNCQ",
    "NCQPriority",
    "HostSlumbTrans",
    "DevSlumbTrans",
    "ReadLogDMAExt",
];

/// Words 78 and 79.
pub const SATA_FEATURES: BitNames<16> = [
    "Clear",
    "NonZeroBufferOffset",
    "DMASetup",
    "InitPowerMgmt",
    "InOrderData",
    "HardwareFeatureControl",
    "SSP",
    "NCQAutoSense",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
];

/// Word 128.
pub const SECURITY_STATUS: BitNames<16> = [
    "Supported",
    "Enabled",
    "Locked",
    "Frozen",
    "Expired",
    "Enhanced",
    "",
    "",
    "Maximum",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
];

/// Word 48.
pub const TRUSTED_COMPUTING: BitNames<16> = [
    "TrustedComputing",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "Set",
    "Clear",
];

/// Word 169.
pub const DATA_SET_MANAGEMENT: BitNames<16> = [
    "Trim", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "",
];

/// Word 80 bits 14..1.
const MAJOR_VERSIONS: BitNames<15> = [
    "",
    "ATA-1",
    "ATA-2",
    "ATA-3",
    "ATA/ATAPI-4",
    "ATA/ATAPI-5",
    "ATA/ATAPI-6",
    "ATA/ATAPI-7",
    "ATA8-ACS",
    "ACS-2",
    "ACS-3",
    "ACS-4",
    "",
    "",
    "",
];

pub fn general_configuration(word: u16) -> Option<String> {
    flag_names(word as u32, &GENERAL_CONFIGURATION)
}

/// Word 0 of an ATAPI device: device type, removability, DRQ timing and packet size.
pub fn atapi_general_configuration(word: u16) -> Option<String> {
    if word & 0xC000 != 0x8000 {
        return None;
    }
    let mut parts = vec!["ATAPI"];
    if let Some(device) = scsi::peripheral_device_type(((word >> 8) & 0x1F) as u8) {
        parts.push(device);
    }
    if word & 0x0080 != 0 {
        parts.push("Removable");
    }
    match (word >> 5) & 0x03 {
        0 => parts.push("DRQ3ms"),
        1 => parts.push("InterruptDRQ"),
        2 => parts.push("DRQ50us"),
        _ => {}
    }
    match word & 0x03 {
        0 => parts.push("Packet12"),
        1 => parts.push("Packet16"),
        _ => {}
    }
    Some(parts.join(" "))
}

/// Word 2.
pub fn specific_configuration(word: u16) -> Option<&'static str> {
    match word {
        0x37C8 => Some("RequiresSetIncompleteResponse"),
        0x738C => Some("RequiresSetCompleteResponse"),
        0x8C73 => Some("NotRequiresSetIncompleteResponse"),
        0xC837 => Some("NotRequiresSetCompleteResponse"),
        _ => None,
    }
}

pub fn capabilities(word: u16) -> Option<String> {
    flag_names(word as u32, &CAPABILITIES)
}

pub fn capabilities2(word: u16) -> Option<String> {
    flag_names(word as u32, &CAPABILITIES2)
}

pub fn capabilities3(byte: u8) -> Option<String> {
    flag_names(byte as u32, &CAPABILITIES3)
}

pub fn command_set(word: u16) -> Option<String> {
    flag_names(word as u32, &COMMAND_SET)
}

pub fn command_set2(word: u16) -> Option<String> {
    flag_names(word as u32, &COMMAND_SET2)
}

pub fn command_set3(word: u16) -> Option<String> {
    flag_names(word as u32, &COMMAND_SET3)
}

pub fn command_set4(word: u16) -> Option<String> {
    flag_names(word as u32, &COMMAND_SET4)
}

pub fn command_set5(word: u16) -> Option<String> {
    flag_names(word as u32, &COMMAND_SET5)
}

pub fn sata_capabilities(word: u16) -> Option<String> {
    flag_names(word as u32, &SATA_CAPABILITIES)
}

pub fn sata_features(word: u16) -> Option<String> {
    flag_names(word as u32, &SATA_FEATURES)
}

pub fn security_status(word: u16) -> Option<String> {
    flag_names(word as u32, &SECURITY_STATUS)
}

pub fn trusted_computing(word: u16) -> Option<String> {
    flag_names(word as u32, &TRUSTED_COMPUTING)
}

pub fn data_set_management(word: u16) -> Option<String> {
    flag_names(word as u32, &DATA_SET_MANAGEMENT)
}

/// Words 80. `0x0000` and `0xFFFF` mean not reported.
pub fn major_version(word: u16) -> Option<String> {
    if word == 0xFFFF {
        return None;
    }
    flag_names(word as u32, &MAJOR_VERSIONS)
}

/// Word 222.
pub fn transport_major_version(word: u16) -> Option<String> {
    if word == 0x0000 || word == 0xFFFF {
        return None;
    }
    let names: &BitNames<12> = match word >> 12 {
        0 => &[
            "ATA/ATAPI-7",
            "ATA8-APT",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
        ],
        1 => &[
            "ATA8-AST",
            "SATA 1.0a",
            "SATA II Extensions",
            "SATA 2.5",
            "SATA 2.6",
            "SATA 3.0",
            "SATA 3.1",
            "",
            "",
            "",
            "",
            "",
        ],
        _ => return None,
    };
    let versions = flag_names((word & 0x0FFF) as u32, names)?;
    let kind = if word >> 12 == 0 { "Parallel" } else { "Serial" };
    Some(format!("{kind} {versions}"))
}

/// Supported and active modes of a DMA mode word (62, 63 or 88).
/// Low byte holds the supported modes, high byte the active one.
pub fn transfer_modes(prefix: &str, word: u16) -> (Option<String>, Option<String>) {
    let modes = |bits: u8| {
        let names: Vec<String> = (0..8)
            .rev()
            .filter(|&bit| bits & (1 << bit) != 0)
            .map(|bit| format!("{prefix}{bit}"))
            .collect();
        (!names.is_empty()).then(|| names.join(" "))
    };
    (modes(word as u8), modes((word >> 8) as u8))
}

/// Word 64: advanced PIO modes beyond mode 2.
pub fn advanced_pio_modes(word: u16) -> Option<String> {
    let names: Vec<String> = (0..8)
        .rev()
        .filter(|&bit| word & (1 << bit) != 0)
        .map(|bit| format!("PIO{}", bit + 3))
        .collect();
    (!names.is_empty()).then(|| names.join(" "))
}

/// Word 168 bits 3..0.
pub fn form_factor(word: u16) -> Option<&'static str> {
    match word & 0x000F {
        1 => Some("5.25\""),
        2 => Some("3.5\""),
        3 => Some("2.5\""),
        4 => Some("1.8\""),
        5 => Some("Less than 1.8\""),
        _ => None,
    }
}

/// Word 217.
pub fn nominal_rotation_rate(word: u16) -> Option<String> {
    match word {
        0x0001 => Some("Non-rotating media".to_string()),
        0x0401..=0xFFFE => Some(format!("{word} rpm")),
        _ => None,
    }
}
