//! Optical media a multimedia drive can be asked to test.

use devreport_scsi::{
    commands::mmc::DiscStructureMedia, features::FeatureSet, mode::ModePage2A,
};

/// Physical family of a medium; decides which command groups apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    Cd,
    Ddcd,
    Dvd,
    HdDvd,
    Bd,
}

/// One READ DISC STRUCTURE format worth archiving for a medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscStructure {
    pub media: DiscStructureMedia,
    pub format: u8,
    /// Report element name.
    pub name: &'static str,
}

const fn dvd(format: u8, name: &'static str) -> DiscStructure {
    DiscStructure {
        media: DiscStructureMedia::Dvd,
        format,
        name,
    }
}

const fn bd(format: u8, name: &'static str) -> DiscStructure {
    DiscStructure {
        media: DiscStructureMedia::Bd,
        format,
        name,
    }
}

const DVD_COMMON: &[DiscStructure] = &[dvd(0x00, "PFI"), dvd(0x01, "CMI"), dvd(0x04, "DMI")];
const DVD_RAM: &[DiscStructure] = &[
    dvd(0x00, "PFI"),
    dvd(0x01, "CMI"),
    dvd(0x08, "DVDRAM_DDS"),
    dvd(0x09, "DVDRAM_MediumStatus"),
    dvd(0x0A, "DVDRAM_SpareArea"),
];
const DVD_DASH: &[DiscStructure] = &[
    dvd(0x00, "PFI"),
    dvd(0x01, "CMI"),
    dvd(0x04, "DMI"),
    dvd(0x0C, "RMD"),
    dvd(0x0E, "PRI"),
];
const DVD_PLUS: &[DiscStructure] = &[
    dvd(0x00, "PFI"),
    dvd(0x11, "ADIP"),
    dvd(0x30, "DCB"),
];
const DVD_LAYERED: &[DiscStructure] = &[
    dvd(0x00, "PFI"),
    dvd(0x01, "CMI"),
    dvd(0x04, "DMI"),
    dvd(0x20, "LayerCapacity"),
];
const HD_DVD: &[DiscStructure] = &[dvd(0x00, "PFI"), dvd(0x01, "CMI")];
const BD_ROM: &[DiscStructure] = &[bd(0x00, "DI"), bd(0x30, "DCB")];
const BD_RECORDABLE: &[DiscStructure] = &[
    bd(0x00, "DI"),
    bd(0x08, "BD_DDS"),
    bd(0x0A, "BD_SpareArea"),
    bd(0x30, "DCB"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaType {
    CdRom,
    AudioCd,
    CdR,
    CdRw,
    DdcdRom,
    DdcdR,
    DdcdRw,
    DvdRom,
    DvdR,
    DvdRw,
    DvdRDl,
    DvdPlusR,
    DvdPlusRw,
    DvdPlusRDl,
    DvdPlusRwDl,
    DvdRam,
    HdDvdRom,
    HdDvdR,
    HdDvdRam,
    HdDvdRw,
    BdRom,
    BdR,
    BdRe,
}

impl MediaType {
    pub const ALL: [MediaType; 23] = [
        Self::CdRom,
        Self::AudioCd,
        Self::CdR,
        Self::CdRw,
        Self::DdcdRom,
        Self::DdcdR,
        Self::DdcdRw,
        Self::DvdRom,
        Self::DvdR,
        Self::DvdRw,
        Self::DvdRDl,
        Self::DvdPlusR,
        Self::DvdPlusRw,
        Self::DvdPlusRDl,
        Self::DvdPlusRwDl,
        Self::DvdRam,
        Self::HdDvdRom,
        Self::HdDvdR,
        Self::HdDvdRam,
        Self::HdDvdRw,
        Self::BdRom,
        Self::BdR,
        Self::BdRe,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::CdRom => "CD-ROM",
            Self::AudioCd => "Audio CD",
            Self::CdR => "CD-R",
            Self::CdRw => "CD-RW",
            Self::DdcdRom => "DDCD-ROM",
            Self::DdcdR => "DDCD-R",
            Self::DdcdRw => "DDCD-RW",
            Self::DvdRom => "DVD-ROM",
            Self::DvdR => "DVD-R",
            Self::DvdRw => "DVD-RW",
            Self::DvdRDl => "DVD-R DL",
            Self::DvdPlusR => "DVD+R",
            Self::DvdPlusRw => "DVD+RW",
            Self::DvdPlusRDl => "DVD+R DL",
            Self::DvdPlusRwDl => "DVD+RW DL",
            Self::DvdRam => "DVD-RAM",
            Self::HdDvdRom => "HD DVD-ROM",
            Self::HdDvdR => "HD DVD-R",
            Self::HdDvdRam => "HD DVD-RAM",
            Self::HdDvdRw => "HD DVD-RW",
            Self::BdRom => "BD-ROM",
            Self::BdR => "BD-R",
            Self::BdRe => "BD-RE",
        }
    }

    /// Profiles under which a drive reports it can handle the medium.
    pub fn profiles(self) -> &'static [u16] {
        match self {
            Self::CdRom | Self::AudioCd => &[0x0008],
            Self::CdR => &[0x0009],
            Self::CdRw => &[0x000A],
            Self::DdcdRom => &[0x0020],
            Self::DdcdR => &[0x0021],
            Self::DdcdRw => &[0x0022],
            Self::DvdRom => &[0x0010],
            Self::DvdR => &[0x0011],
            Self::DvdRw => &[0x0013, 0x0014],
            Self::DvdRDl => &[0x0015, 0x0016],
            Self::DvdPlusR => &[0x001B],
            Self::DvdPlusRw => &[0x001A],
            Self::DvdPlusRDl => &[0x002B],
            Self::DvdPlusRwDl => &[0x002A],
            Self::DvdRam => &[0x0012],
            Self::HdDvdRom => &[0x0050],
            Self::HdDvdR => &[0x0051, 0x0058],
            Self::HdDvdRam => &[0x0052],
            Self::HdDvdRw => &[0x0053, 0x005A],
            Self::BdRom => &[0x0040],
            Self::BdR => &[0x0041, 0x0042],
            Self::BdRe => &[0x0043],
        }
    }

    pub fn class(self) -> MediaClass {
        match self {
            Self::CdRom | Self::AudioCd | Self::CdR | Self::CdRw => MediaClass::Cd,
            Self::DdcdRom | Self::DdcdR | Self::DdcdRw => MediaClass::Ddcd,
            Self::HdDvdRom | Self::HdDvdR | Self::HdDvdRam | Self::HdDvdRw => MediaClass::HdDvd,
            Self::BdRom | Self::BdR | Self::BdRe => MediaClass::Bd,
            _ => MediaClass::Dvd,
        }
    }

    pub fn disc_structures(self) -> &'static [DiscStructure] {
        match self {
            Self::DvdRom => DVD_COMMON,
            Self::DvdR | Self::DvdRw => DVD_DASH,
            Self::DvdRDl | Self::DvdPlusRDl | Self::DvdPlusRwDl => DVD_LAYERED,
            Self::DvdPlusR | Self::DvdPlusRw => DVD_PLUS,
            Self::DvdRam => DVD_RAM,
            Self::HdDvdRom | Self::HdDvdR | Self::HdDvdRam | Self::HdDvdRw => HD_DVD,
            Self::BdRom => BD_ROM,
            Self::BdR | Self::BdRe => BD_RECORDABLE,
            _ => &[],
        }
    }

    /// Whether mode page 2Ah claims the drive reads this medium.
    fn readable_by(self, page: &ModePage2A) -> bool {
        match self {
            Self::CdRom | Self::AudioCd => true,
            Self::CdR => page.read_cd_r,
            Self::CdRw => page.read_cd_rw,
            Self::DvdRom => page.read_dvd_rom,
            Self::DvdR | Self::DvdRw | Self::DvdRDl => page.read_dvd_r,
            Self::DvdRam => page.read_dvd_ram,
            _ => false,
        }
    }
}

/// Media worth offering for testing, in table order.
///
/// The profile list wins when the drive has one; otherwise page 2Ah's read
/// bits decide; with neither, only CD media are offered.
pub fn candidate_media(features: Option<&FeatureSet>, page_2a: Option<&ModePage2A>) -> Vec<MediaType> {
    if let Some(features) = features.filter(|f| !f.profiles.is_empty()) {
        return MediaType::ALL
            .into_iter()
            .filter(|media| media.profiles().iter().any(|p| features.has_profile(*p)))
            .collect();
    }
    if let Some(page) = page_2a {
        return MediaType::ALL
            .into_iter()
            .filter(|media| media.readable_by(page))
            .collect();
    }
    vec![MediaType::CdRom, MediaType::AudioCd]
}

#[cfg(test)]
mod tests {
    use devreport_scsi::features::ProfileEntry;

    use super::*;

    fn with_profiles(codes: &[u16]) -> FeatureSet {
        FeatureSet {
            profiles: codes
                .iter()
                .map(|code| ProfileEntry {
                    code: *code,
                    current: false,
                })
                .collect(),
            ..FeatureSet::default()
        }
    }

    #[test]
    fn profiles_select_media() {
        let features = with_profiles(&[0x0008, 0x0010, 0x0014, 0x0043]);
        assert_eq!(
            candidate_media(Some(&features), None),
            vec![
                MediaType::CdRom,
                MediaType::AudioCd,
                MediaType::DvdRom,
                MediaType::DvdRw,
                MediaType::BdRe
            ]
        );
    }

    #[test]
    fn page_2a_fallback() {
        let page = ModePage2A {
            read_cd_r: true,
            read_dvd_rom: true,
            ..ModePage2A::default()
        };
        assert_eq!(
            candidate_media(Some(&FeatureSet::default()), Some(&page)),
            vec![
                MediaType::CdRom,
                MediaType::AudioCd,
                MediaType::CdR,
                MediaType::DvdRom
            ]
        );
    }

    #[test]
    fn every_medium_is_described() {
        for media in MediaType::ALL {
            assert!(!media.profiles().is_empty(), "{}", media.name());
            if media.class() == MediaClass::Cd {
                assert!(media.disc_structures().is_empty());
            }
        }
        assert_eq!(MediaType::BdR.disc_structures()[1].name, "BD_DDS");
    }
}
