//! GET CONFIGURATION responses: feature descriptors and the profile list.

use std::collections::BTreeMap;

use crate::{DecodeError, ascii_field, be16, be32, ensure_len};

pub const PROFILE_LIST: u16 = 0x0000;
pub const CORE: u16 = 0x0001;
pub const REMOVABLE_MEDIUM: u16 = 0x0003;
pub const RANDOM_READABLE: u16 = 0x0010;
pub const MULTI_READ: u16 = 0x001D;
pub const CD_READ: u16 = 0x001E;
pub const DVD_READ: u16 = 0x001F;
pub const POWER_MANAGEMENT: u16 = 0x0100;
pub const CD_EXTERNAL_AUDIO_PLAY: u16 = 0x0103;
pub const DVD_CSS: u16 = 0x0106;
pub const REAL_TIME_STREAMING: u16 = 0x0107;
pub const DRIVE_SERIAL_NUMBER: u16 = 0x0108;
pub const CPRM: u16 = 0x010B;
pub const FIRMWARE_INFORMATION: u16 = 0x010C;
pub const AACS: u16 = 0x010D;

/// An entry of the profile list feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileEntry {
    pub code: u16,
    pub current: bool,
}

/// A feature code seen in the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureEntry {
    /// Full descriptor bytes, header included. `None` when the code was only
    /// listed as a profile.
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureSet {
    pub data_length: u32,
    pub current_profile: u16,
    pub entries: BTreeMap<u16, FeatureEntry>,
    pub profiles: Vec<ProfileEntry>,
}

impl FeatureSet {
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("feature header", buf, 8)?;
        let data_length = be32(buf, 0);
        let end = (data_length as usize + 4).min(buf.len());

        let mut set = Self {
            data_length,
            current_profile: be16(buf, 6),
            ..Self::default()
        };

        let mut offset = 8;
        while offset + 4 <= end {
            let code = be16(buf, offset);
            let next = offset + buf[offset + 3] as usize + 4;
            if next > end {
                log::debug!("feature {code:#06x} overruns the response ({next} > {end})");
                break;
            }
            set.entries.insert(
                code,
                FeatureEntry {
                    data: Some(buf[offset..next].to_vec()),
                },
            );
            offset = next;
        }

        if let Some(list) = set.descriptor(PROFILE_LIST).map(<[u8]>::to_vec) {
            for profile in list[4..].chunks_exact(4) {
                let code = be16(profile, 0);
                set.profiles.push(ProfileEntry {
                    code,
                    current: profile[2] & 0x01 != 0,
                });
                set.entries
                    .entry(code)
                    .or_insert(FeatureEntry { data: None });
            }
        }

        Ok(set)
    }

    /// Descriptor bytes for `code`, when the drive reported detailed data.
    pub fn descriptor(&self, code: u16) -> Option<&[u8]> {
        self.entries.get(&code)?.data.as_deref()
    }

    pub fn is_present(&self, code: u16) -> bool {
        self.entries.contains_key(&code)
    }

    pub fn has_profile(&self, code: u16) -> bool {
        self.profiles.iter().any(|p| p.code == code)
    }
}

/// Fields shared by every descriptor header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorHeader {
    pub code: u16,
    pub version: u8,
    pub persistent: bool,
    pub current: bool,
}

impl DescriptorHeader {
    pub fn decode(desc: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("feature descriptor", desc, 4)?;
        Ok(Self {
            code: be16(desc, 0),
            version: (desc[2] >> 2) & 0x0F,
            persistent: desc[2] & 0x02 != 0,
            current: desc[2] & 0x01 != 0,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreFeature {
    pub physical_interface: u32,
    pub device_busy_event: bool,
    pub inquiry2: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovableMediumFeature {
    pub loading_mechanism: u8,
    pub load: bool,
    pub eject: bool,
    pub prevent_jumper: bool,
    pub lock: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomReadableFeature {
    pub logical_block_size: u32,
    pub blocking: u16,
    pub page_present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdReadFeature {
    pub dap: bool,
    pub c2: bool,
    pub cd_text: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DvdReadFeature {
    pub multi110: bool,
    pub dual_r: bool,
    pub dual_rw: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdAudioFeature {
    pub scan: bool,
    pub separate_channel_mute: bool,
    pub separate_volume: bool,
    pub volume_levels: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealTimeStreamingFeature {
    pub read_buffer_capacity_block: bool,
    pub set_cd_speed: bool,
    pub mode_page_2a: bool,
    pub write_speed_performance: bool,
    pub stream_writing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AacsFeature {
    pub binding_nonce_generation: bool,
    pub binding_nonce_blocks: u8,
    pub agids: u8,
    pub aacs_version: u8,
}

/// Decoded form of the features the report knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feature {
    Core(CoreFeature),
    RemovableMedium(RemovableMediumFeature),
    RandomReadable(RandomReadableFeature),
    MultiRead,
    CdRead(CdReadFeature),
    DvdRead(DvdReadFeature),
    PowerManagement,
    CdExternalAudioPlay(CdAudioFeature),
    DvdCss { css_version: u8 },
    RealTimeStreaming(RealTimeStreamingFeature),
    DriveSerialNumber(Option<String>),
    Cprm { cprm_version: u8 },
    /// `YYYYMMDDhhmmss` as reported.
    FirmwareInformation(Option<String>),
    Aacs(AacsFeature),
}

impl Feature {
    /// Decode a descriptor. `Ok(None)` for codes without a typed form.
    pub fn decode(desc: &[u8]) -> Result<Option<Self>, DecodeError> {
        let header = DescriptorHeader::decode(desc)?;
        let need = |n: usize| ensure_len("feature descriptor", desc, n);
        let bit = |byte: usize, mask: u8| desc.get(byte).is_some_and(|b| b & mask != 0);

        let feature = match header.code {
            CORE => {
                need(8)?;
                Self::Core(CoreFeature {
                    physical_interface: be32(desc, 4),
                    device_busy_event: bit(8, 0x01),
                    inquiry2: bit(8, 0x02),
                })
            }
            REMOVABLE_MEDIUM => {
                need(5)?;
                Self::RemovableMedium(RemovableMediumFeature {
                    loading_mechanism: desc[4] >> 5,
                    load: bit(4, 0x10),
                    eject: bit(4, 0x08),
                    prevent_jumper: bit(4, 0x04),
                    lock: bit(4, 0x01),
                })
            }
            RANDOM_READABLE => {
                need(10)?;
                Self::RandomReadable(RandomReadableFeature {
                    logical_block_size: be32(desc, 4),
                    blocking: be16(desc, 8),
                    page_present: bit(10, 0x01),
                })
            }
            MULTI_READ => Self::MultiRead,
            CD_READ => Self::CdRead(CdReadFeature {
                dap: bit(4, 0x80),
                c2: bit(4, 0x02),
                cd_text: bit(4, 0x01),
            }),
            DVD_READ => Self::DvdRead(DvdReadFeature {
                multi110: bit(4, 0x01),
                dual_r: bit(6, 0x01),
                dual_rw: bit(6, 0x02),
            }),
            POWER_MANAGEMENT => Self::PowerManagement,
            CD_EXTERNAL_AUDIO_PLAY => {
                need(8)?;
                Self::CdExternalAudioPlay(CdAudioFeature {
                    scan: bit(4, 0x04),
                    separate_channel_mute: bit(4, 0x02),
                    separate_volume: bit(4, 0x01),
                    volume_levels: be16(desc, 6),
                })
            }
            DVD_CSS => {
                need(8)?;
                Self::DvdCss {
                    css_version: desc[7],
                }
            }
            REAL_TIME_STREAMING => Self::RealTimeStreaming(RealTimeStreamingFeature {
                read_buffer_capacity_block: bit(4, 0x10),
                set_cd_speed: bit(4, 0x08),
                mode_page_2a: bit(4, 0x04),
                write_speed_performance: bit(4, 0x02),
                stream_writing: bit(4, 0x01),
            }),
            DRIVE_SERIAL_NUMBER => Self::DriveSerialNumber(ascii_field(&desc[4..])),
            CPRM => {
                need(8)?;
                Self::Cprm {
                    cprm_version: desc[7],
                }
            }
            FIRMWARE_INFORMATION => {
                need(18)?;
                Self::FirmwareInformation(ascii_field(&desc[4..18]))
            }
            AACS => {
                need(8)?;
                Self::Aacs(AacsFeature {
                    binding_nonce_generation: bit(4, 0x01),
                    binding_nonce_blocks: desc[5],
                    agids: desc[6] & 0x0F,
                    aacs_version: desc[7],
                })
            }
            _ => return Ok(None),
        };
        Ok(Some(feature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(descriptors: &[&[u8]], current_profile: u16) -> Vec<u8> {
        let mut buf = vec![0u8; 8];
        for d in descriptors {
            buf.extend_from_slice(d);
        }
        let len = (buf.len() - 4) as u32;
        buf[0..4].copy_from_slice(&len.to_be_bytes());
        buf[6..8].copy_from_slice(&current_profile.to_be_bytes());
        buf
    }

    #[test]
    fn adjacent_descriptors_are_sliced_exactly() {
        let random = [0x00, 0x10, 0x01, 0x08, 0, 0, 0x08, 0, 0, 0x10, 0x01, 0];
        let cd_read = [0x00, 0x1E, 0x09, 0x04, 0x83, 0, 0, 0];
        let buf = response(&[&random, &cd_read], 0x0008);
        let set = FeatureSet::decode(&buf).unwrap();
        assert_eq!(set.current_profile, 0x0008);
        assert_eq!(set.descriptor(RANDOM_READABLE), Some(&random[..]));
        assert_eq!(set.descriptor(CD_READ), Some(&cd_read[..]));
        assert_eq!(set.entries.len(), 2);
    }

    #[test]
    fn profiles_are_marked_present_without_data() {
        let profiles = [
            0x00, 0x00, 0x03, 0x08, 0x00, 0x10, 0x00, 0x00, 0x00, 0x08, 0x01, 0x00,
        ];
        let core = [0x00, 0x01, 0x0B, 0x04, 0, 0, 0, 0x02];
        let buf = response(&[&profiles, &core], 0x0008);
        let set = FeatureSet::decode(&buf).unwrap();
        assert_eq!(
            set.profiles,
            vec![
                ProfileEntry {
                    code: 0x0010,
                    current: false
                },
                ProfileEntry {
                    code: 0x0008,
                    current: true
                },
            ]
        );
        assert!(set.is_present(0x0010));
        assert_eq!(set.descriptor(0x0010), None);
        assert!(set.descriptor(CORE).is_some());
        assert!(set.has_profile(0x0008));
    }

    #[test]
    fn overrun_stops_walk() {
        let mut buf = response(&[&[0x00, 0x1E, 0x01, 0x04, 0, 0, 0, 0]], 0);
        buf.extend_from_slice(&[0x00, 0x1F, 0x01, 0x40]);
        let len = (buf.len() - 4) as u32;
        buf[0..4].copy_from_slice(&len.to_be_bytes());
        let set = FeatureSet::decode(&buf).unwrap();
        assert!(set.is_present(CD_READ));
        assert!(!set.is_present(DVD_READ));
    }

    #[test]
    fn typed_features() {
        let random = [0x00, 0x10, 0x01, 0x08, 0, 0, 0x08, 0, 0, 0x10, 0x01, 0];
        assert_eq!(
            Feature::decode(&random).unwrap(),
            Some(Feature::RandomReadable(RandomReadableFeature {
                logical_block_size: 2048,
                blocking: 16,
                page_present: true
            }))
        );
        let cd_read = [0x00, 0x1E, 0x09, 0x04, 0x83, 0, 0, 0];
        assert_eq!(
            Feature::decode(&cd_read).unwrap(),
            Some(Feature::CdRead(CdReadFeature {
                dap: true,
                c2: true,
                cd_text: true
            }))
        );
        let mut firmware = vec![0x01, 0x0C, 0x01, 0x10];
        firmware.extend_from_slice(b"20240131120000\0\0");
        assert_eq!(
            Feature::decode(&firmware).unwrap(),
            Some(Feature::FirmwareInformation(Some("20240131120000".into())))
        );
        assert_eq!(Feature::decode(&[0x00, 0x2F, 0x01, 0x00]).unwrap(), None);
        assert!(Feature::decode(&[0x00, 0x01, 0x01, 0x00]).is_err());
    }
}
