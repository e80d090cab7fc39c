use devreport_scsi::{
    Transport,
    commands::{
        inquiry::{InquiryData, PeripheralDeviceType},
        mmc::{C2Error, SectorSelection, Subchannel, TocFormat},
        mode_sense::PageControl,
    },
    features::{Feature, FeatureSet},
    mode::{ModePage2A, ModeSenseData, page_2a::PAGE_CODE},
};

use super::{INSERT_MEDIA, Session, write_number, write_text};
use crate::{
    media::{MediaClass, MediaType, candidate_media},
    translate::scsi as tr,
    xml::ReportSink,
};

/// Raw CD sector, sync to EDC/ECC.
const RAW_SECTOR: u32 = 2352;
/// Start and end of the first readable second, as 0x00MMSSFF.
const MSF_START: u32 = 0x0000_0200;
const MSF_END: u32 = 0x0000_0201;

/// Which vendor command sets the operator allowed.
#[derive(Debug, Clone, Copy, Default)]
struct VendorReads {
    plextor: bool,
    pioneer: bool,
    nec: bool,
    hldtst: bool,
}

fn write_page_2a(sink: &mut dyn ReportSink, page: &ModePage2A) {
    sink.start_element("ModeSense2A");
    let flags = [
        ("ReadCDR", page.read_cd_r),
        ("ReadCDRW", page.read_cd_rw),
        ("Method2", page.method2),
        ("ReadDVDROM", page.read_dvd_rom),
        ("ReadDVDR", page.read_dvd_r),
        ("ReadDVDRAM", page.read_dvd_ram),
        ("WriteCDR", page.write_cd_r),
        ("WriteCDRW", page.write_cd_rw),
        ("TestWrite", page.test_write),
        ("WriteDVDR", page.write_dvd_r),
        ("WriteDVDRAM", page.write_dvd_ram),
        ("AudioPlay", page.audio_play),
        ("Composite", page.composite),
        ("DigitalPort1", page.digital_port1),
        ("DigitalPort2", page.digital_port2),
        ("Mode2Form1", page.mode2_form1),
        ("Mode2Form2", page.mode2_form2),
        ("MultiSession", page.multi_session),
        ("BUF", page.buffer_underrun_free),
        ("CDDACommand", page.cdda_command),
        ("AccurateCDDA", page.accurate_cdda),
        ("Subchannel", page.subchannel),
        ("DeinterlaveSubchannel", page.deinterleave_subchannel),
        ("C2Pointer", page.c2_pointer),
        ("ISRC", page.isrc),
        ("UPC", page.upc),
        ("ReadBarcode", page.read_barcode),
        ("Lock", page.lock),
        ("LockState", page.lock_state),
        ("PreventJumper", page.prevent_jumper),
        ("Eject", page.eject),
        ("SeparateChannelVolume", page.separate_volume),
        ("SeparateChannelMute", page.separate_channel_mute),
        ("SDP", page.disc_present_reporting),
        ("SSS", page.software_slot_selection),
        ("SCC", page.side_change),
        ("LeadInPW", page.lead_in_pw),
    ];
    for (name, value) in flags {
        sink.write_bool(name, value);
    }
    match tr::loading_mechanism(page.loading_mechanism) {
        Some(name) => sink.write_element("LoadingMechanismType", name),
        None => sink.write_formatted("LoadingMechanismType", format_args!("{}", page.loading_mechanism)),
    }
    write_number(sink, "MaximumSpeed", page.max_read_speed.into());
    write_number(sink, "SupportedVolumeLevels", page.volume_levels.into());
    write_number(sink, "BufferSize", page.buffer_size.into());
    write_number(sink, "CurrentSpeed", page.current_read_speed.into());
    if let Some(speed) = page.max_write_speed {
        write_number(sink, "MaximumWriteSpeed", speed.into());
    }
    if let Some(speed) = page.current_write_speed {
        write_number(sink, "CurrentWriteSpeed", speed.into());
    }
    if let Some(revision) = page.copy_management_revision {
        write_number(sink, "CMRSupported", revision.into());
    }
    if let Some(speed) = page.current_write_speed_selected {
        write_number(sink, "CurrentWriteSpeedSelected", speed.into());
    }
    for descriptor in &page.write_speeds {
        sink.start_element("WriteSpeedPerformanceDescriptor");
        sink.write_formatted("RotationControl", format_args!("{}", descriptor.rotation_control));
        sink.write_formatted("WriteSpeed", format_args!("{}", descriptor.write_speed));
        sink.end_element();
    }
    sink.end_element();
}

fn write_feature(sink: &mut dyn ReportSink, feature: &Feature) {
    match feature {
        Feature::Core(core) => {
            sink.start_element("Core");
            match tr::physical_interface(core.physical_interface) {
                Some(name) => sink.write_element("PhysicalInterfaceStandard", name),
                None => sink.write_formatted(
                    "PhysicalInterfaceStandard",
                    format_args!("{}", core.physical_interface),
                ),
            }
            sink.write_bool("DeviceBusyEvent", core.device_busy_event);
            sink.write_bool("INQUIRY2", core.inquiry2);
            sink.end_element();
        }
        Feature::RemovableMedium(removable) => {
            sink.start_element("RemovableMedium");
            write_text(
                sink,
                "LoadingMechanismType",
                tr::loading_mechanism(removable.loading_mechanism),
            );
            sink.write_bool("CanLoad", removable.load);
            sink.write_bool("CanEject", removable.eject);
            sink.write_bool("PreventJumper", removable.prevent_jumper);
            sink.write_bool("Locked", removable.lock);
            sink.end_element();
        }
        Feature::RandomReadable(random) => {
            sink.start_element("RandomReadable");
            sink.write_formatted("LogicalBlockSize", format_args!("{}", random.logical_block_size));
            sink.write_formatted("BlocksPerReadableUnit", format_args!("{}", random.blocking));
            sink.write_bool("ErrorRecoveryPage", random.page_present);
            sink.end_element();
        }
        Feature::MultiRead => sink.write_bool("MultiRead", true),
        Feature::CdRead(cd) => {
            sink.start_element("CDRead");
            sink.write_bool("DAP", cd.dap);
            sink.write_bool("C2", cd.c2);
            sink.write_bool("CDText", cd.cd_text);
            sink.end_element();
        }
        Feature::DvdRead(dvd) => {
            sink.start_element("DVDRead");
            sink.write_bool("MULTI110", dvd.multi110);
            sink.write_bool("DualR", dvd.dual_r);
            sink.write_bool("DualRW", dvd.dual_rw);
            sink.end_element();
        }
        Feature::PowerManagement => sink.write_bool("PowerManagement", true),
        Feature::CdExternalAudioPlay(audio) => {
            sink.start_element("CDExternalAudioPlay");
            sink.write_bool("Scan", audio.scan);
            sink.write_bool("SeparateChannelMute", audio.separate_channel_mute);
            sink.write_bool("SeparateChannelVolume", audio.separate_volume);
            sink.write_formatted("VolumeLevels", format_args!("{}", audio.volume_levels));
            sink.end_element();
        }
        Feature::DvdCss { css_version } => {
            sink.write_formatted("CSSVersion", format_args!("{css_version}"));
        }
        Feature::RealTimeStreaming(streaming) => {
            sink.start_element("RealTimeStreaming");
            sink.write_bool("ReadBufferCapacityBlock", streaming.read_buffer_capacity_block);
            sink.write_bool("SetCDSpeed", streaming.set_cd_speed);
            sink.write_bool("ModePage2A", streaming.mode_page_2a);
            sink.write_bool("WriteSpeedPerformance", streaming.write_speed_performance);
            sink.write_bool("StreamWriting", streaming.stream_writing);
            sink.end_element();
        }
        Feature::DriveSerialNumber(_) => sink.write_bool("DriveSerialNumber", true),
        Feature::Cprm { cprm_version } => {
            sink.write_formatted("CPRMVersion", format_args!("{cprm_version}"));
        }
        Feature::FirmwareInformation(date) => {
            write_text(sink, "FirmwareDate", date.as_deref());
        }
        Feature::Aacs(aacs) => {
            sink.start_element("AACS");
            sink.write_bool("BindingNonceGeneration", aacs.binding_nonce_generation);
            sink.write_formatted("BindingNonceBlocks", format_args!("{}", aacs.binding_nonce_blocks));
            sink.write_formatted("AGIDs", format_args!("{}", aacs.agids));
            sink.write_formatted("AACSVersion", format_args!("{}", aacs.aacs_version));
            sink.end_element();
        }
    }
}

fn write_features(sink: &mut dyn ReportSink, features: &FeatureSet) {
    sink.start_element("Features");
    match tr::profile(features.current_profile) {
        Some(name) => sink.write_element("CurrentProfile", name),
        None => sink.write_formatted("CurrentProfile", format_args!("{:04X}h", features.current_profile)),
    }
    for profile in &features.profiles {
        match tr::profile(profile.code) {
            Some(name) => sink.write_element("Profile", name),
            None => sink.write_formatted("Profile", format_args!("{:04X}h", profile.code)),
        }
    }
    for (code, entry) in &features.entries {
        let Some(descriptor) = &entry.data else {
            continue;
        };
        match Feature::decode(descriptor) {
            Ok(Some(feature)) => write_feature(sink, &feature),
            Ok(None) => log::debug!("Feature {code:#06x} has no decoder"),
            Err(err) => log::debug!("Feature {code:#06x}: {err}"),
        }
    }
    sink.end_element();
}

impl<T: Transport> Session<'_, T> {
    pub(crate) fn mmc_report(&mut self, inquiry: &InquiryData, mode: Option<&ModeSenseData>) {
        self.sink.start_element("MultiMediaDevice");

        let page_bytes = match mode.and_then(|m| m.page(PAGE_CODE, 0)) {
            Some(page) => Some(page.to_vec()),
            None => self.fetch_page_2a(),
        };
        let page_2a = page_bytes.and_then(|bytes| {
            self.sink.write_data("ModeSense2AData", &bytes);
            ModePage2A::decode(&bytes)
                .inspect_err(|err| log::warn!("Mode page 2Ah could not be decoded: {err}"))
                .ok()
        });
        if let Some(page) = &page_2a {
            write_page_2a(self.sink, page);
        }

        log::info!("Querying MMC GET CONFIGURATION...");
        let configuration = self.device.get_configuration();
        let features = self
            .probe("SupportsGetConfiguration", Some("GetConfigurationData"), configuration)
            .and_then(|buf| {
                FeatureSet::decode(&buf)
                    .inspect_err(|err| log::warn!("Feature list could not be decoded: {err}"))
                    .ok()
            });
        if let Some(features) = &features {
            write_features(self.sink, features);
        }

        let vendor = self.vendor_reads(&inquiry.vendor());

        self.sink.start_element("TestedMedias");
        for media in candidate_media(features.as_ref(), page_2a.as_ref()) {
            let question = format!(
                "Do you have a {} disc that you can insert in the drive?",
                media.name()
            );
            if !self.console.confirm(&question) {
                continue;
            }
            if let Err(err) = self.device.eject() {
                log::debug!("Could not open the tray: {err}");
            }
            self.console.wait_for_enter(INSERT_MEDIA);

            self.sink.start_element("TestedMedia");
            self.sink.write_element("MediumTypeName", media.name());
            let ready = self.wait_until_ready();
            self.sink.write_bool("MediaIsRecognized", ready);
            if ready {
                self.mmc_media_tests(media, vendor);
            }
            self.sink.end_element();
        }
        self.sink.end_element();

        if let Err(err) = self.device.eject() {
            log::debug!("Could not eject the disc: {err}");
        }
        self.sink.end_element();
    }

    fn fetch_page_2a(&mut self) -> Option<Vec<u8>> {
        log::info!("Querying CD/DVD capabilities page using SCSI MODE SENSE...");
        let decoded = match self
            .device
            .mode_sense10(PAGE_CODE, 0, PageControl::Current, false)
        {
            Ok(buf) => ModeSenseData::decode10(&buf, PeripheralDeviceType::MultiMedia).ok(),
            Err(_) => self
                .device
                .mode_sense6(PAGE_CODE, 0, PageControl::Current)
                .ok()
                .and_then(|buf| {
                    ModeSenseData::decode6(&buf, PeripheralDeviceType::MultiMedia).ok()
                }),
        };
        decoded?.page(PAGE_CODE, 0).map(<[u8]>::to_vec)
    }

    /// Vendors recognised by INQUIRY are enabled outright; the rest only on request.
    fn vendor_reads(&mut self, vendor: &str) -> VendorReads {
        let vendor = vendor.to_ascii_uppercase();
        let mut allowed = |name: &str, known: &str| {
            vendor.starts_with(known)
                || self.console.confirm(&format!(
                    "Do you want to try {name} vendor commands? THIS IS DANGEROUS AND CAN IRREVERSIBLY DESTROY YOUR DRIVE (IF IN DOUBT PRESS 'N')"
                ))
        };
        VendorReads {
            plextor: allowed("Plextor", "PLEXTOR"),
            pioneer: allowed("Pioneer", "PIONEER"),
            nec: allowed("NEC", "NEC"),
            hldtst: allowed("HL-DT-ST", "HL-DT-ST"),
        }
    }

    fn mmc_media_tests(&mut self, media: MediaType, vendor: VendorReads) {
        let block_size = self.capacity_tests(2048);
        self.mode_sense(PeripheralDeviceType::MultiMedia);
        self.read_family_tests(block_size);

        match media.class() {
            MediaClass::Cd | MediaClass::Ddcd => self.cd_tests(media, vendor),
            MediaClass::Dvd | MediaClass::HdDvd | MediaClass::Bd => {
                self.disc_structure_tests(media, vendor)
            }
        }

        self.read_long_tests(block_size);
    }

    fn cd_tests(&mut self, media: MediaType, vendor: VendorReads) {
        log::info!("Querying CD TOC...");
        let result = self.device.read_toc(TocFormat::Toc);
        self.probe("SupportsReadToc", Some("TOC"), result);
        log::info!("Querying CD Full TOC...");
        let result = self.device.read_toc(TocFormat::FullToc);
        self.probe("SupportsReadFullToc", Some("FullTOC"), result);
        log::info!("Querying CD session information...");
        let result = self.device.read_toc(TocFormat::SessionInfo);
        self.probe("SupportsReadSessionInfo", Some("SessionInfo"), result);

        if matches!(
            media,
            MediaType::CdR | MediaType::CdRw | MediaType::DdcdR | MediaType::DdcdRw
        ) {
            log::info!("Querying CD PMA...");
            let result = self.device.read_toc(TocFormat::Pma);
            self.probe("SupportsReadPma", Some("PMA"), result);
            log::info!("Querying CD ATIP...");
            let result = self.device.read_toc(TocFormat::Atip);
            self.probe("SupportsReadAtip", Some("ATIP"), result);
        }
        let audio = media == MediaType::AudioCd;
        if audio {
            log::info!("Querying CD-Text...");
            let result = self.device.read_toc(TocFormat::CdText);
            self.probe("SupportsReadCdText", Some("CDText"), result);
        }

        let cooked = if audio { RAW_SECTOR } else { 2048 };
        log::info!("Trying SCSI READ CD...");
        let result = self.device.read_cd(0, 1, SectorSelection::COOKED, cooked);
        self.probe("SupportsReadCd", None, result);
        log::info!("Trying SCSI READ CD MSF...");
        let result = self
            .device
            .read_cd_msf(MSF_START, MSF_END, SectorSelection::COOKED, cooked);
        self.probe("SupportsReadCdMsf", None, result);
        log::info!("Trying SCSI READ CD full sector...");
        let result = self.device.read_cd(0, 1, SectorSelection::RAW, RAW_SECTOR);
        self.probe("SupportsReadCdRaw", None, result);
        let result = self
            .device
            .read_cd_msf(MSF_START, MSF_END, SectorSelection::RAW, RAW_SECTOR);
        self.probe("SupportsReadCdMsfRaw", None, result);

        log::info!("Trying SCSI READ CD with C2 pointers...");
        let result = self.device.read_cd(
            0,
            1,
            SectorSelection::RAW.with_c2(C2Error::ErrorBits),
            RAW_SECTOR + 294,
        );
        self.probe("SupportsC2", None, result);
        log::info!("Trying SCSI READ CD with Q subchannel...");
        let result = self.device.read_cd(
            0,
            1,
            SectorSelection::RAW.with_subchannel(Subchannel::Q16),
            RAW_SECTOR + 16,
        );
        self.probe("SupportsPQSubchannel", None, result);
        log::info!("Trying SCSI READ CD with R-W subchannel...");
        let result = self.device.read_cd(
            0,
            1,
            SectorSelection::RAW.with_subchannel(Subchannel::Rw),
            RAW_SECTOR + 96,
        );
        self.probe("SupportsRWSubchannel", None, result);
        let result = self.device.read_cd(
            0,
            1,
            SectorSelection::RAW.with_subchannel(Subchannel::Raw),
            RAW_SECTOR + 96,
        );
        self.probe("SupportsRawSubchannel", None, result);

        if vendor.plextor {
            log::info!("Trying Plextor READ CD-DA...");
            let result = self.device.plextor_read_cdda(0, 1, 0, RAW_SECTOR);
            self.probe("SupportsPlextorReadCDDA", None, result);
        }
        if vendor.pioneer {
            log::info!("Trying Pioneer READ CD-DA...");
            let result = self.device.pioneer_read_cdda(0, 1, 0, RAW_SECTOR);
            self.probe("SupportsPioneerReadCDDA", None, result);
            log::info!("Trying Pioneer READ CD-DA MSF...");
            let result = self
                .device
                .pioneer_read_cdda_msf(MSF_START, MSF_END, 0, RAW_SECTOR);
            self.probe("SupportsPioneerReadCDDAMSF", None, result);
        }
        if vendor.nec {
            log::info!("Trying NEC READ CD-DA...");
            let result = self.device.nec_read_cdda(0, 1);
            self.probe("SupportsNECReadCDDA", None, result);
        }
    }

    fn disc_structure_tests(&mut self, media: MediaType, vendor: VendorReads) {
        for structure in media.disc_structures() {
            log::info!("Querying disc structure {}...", structure.name);
            match self
                .device
                .read_disc_structure(structure.media, structure.format)
            {
                Ok(buf) => self.sink.write_data(structure.name, &buf),
                Err(err) => log::debug!("Disc structure {} unavailable: {err}", structure.name),
            }
        }

        if vendor.hldtst && media.class() == MediaClass::Dvd {
            log::info!("Trying HL-DT-ST raw DVD reading...");
            let result = self.device.hldtst_read_raw_dvd(0, 1);
            self.probe("SupportsHLDTSTReadRawDVD", None, result);
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
        testing::{Reply, ScriptedConsole, ScriptedTransport, inquiry_data},
        write_report,
        xml::XmlWriter,
    };

    /// Profile list naming CD-ROM as the only, current, profile.
    const CONFIGURATION: [u8; 16] = [
        0x00, 0x00, 0x00, 0x0C, 0x00, 0x00, 0x00, 0x08, // header
        0x00, 0x00, 0x03, 0x04, // profile list feature
        0x00, 0x08, 0x01, 0x00, // CD-ROM, current
    ];

    fn drive() -> ScriptedTransport {
        let mut inquiry = inquiry_data(0x05, "HL-DT-ST", "DVDRAM GH24NSB0", "LW00");
        inquiry[1] = 0x80;
        ScriptedTransport::new(move |cdb, _| match cdb[0] {
            0x12 if cdb[1] & 0x01 == 0 => Reply::data(&inquiry),
            0x00 | 0x1B => Reply::ok(),
            0x46 => Reply::data(&CONFIGURATION),
            0x43 => Reply::data(&[0x00, 0x0A, 0x01, 0x01, 0, 0x14, 0x01, 0, 0, 0, 0, 0]),
            0x25 => Reply::data(&[0x00, 0x00, 0x7F, 0xFF, 0x00, 0x00, 0x08, 0x00]),
            0x28 | 0xBE => Reply::ok(),
            _ => Reply::check(0x05, 0x20, 0x00),
        })
    }

    #[test]
    fn cd_rom_media_test() {
        // Removable, three vendor prompts, CD-ROM yes, Audio CD no.
        let mut console = ScriptedConsole::new(&[true, false, false, false, true, false], &[]);
        let mut device = ScsiDevice::new(drive());
        let detected = detect(&mut device).unwrap();
        let mut xml = XmlWriter::new();
        let options = ReportOptions {
            ready_attempts: 1,
            ready_interval: Duration::ZERO,
        };
        write_report(&mut device, &detected, &mut xml, &mut console, &mut NoProgress, &options).unwrap();
        let xml = xml.finish();

        assert!(xml.contains("<MultiMediaDevice>"));
        assert!(xml.contains("<SupportsGetConfiguration>true</SupportsGetConfiguration>"));
        assert!(xml.contains("<CurrentProfile>CD-ROM</CurrentProfile>"));
        assert!(xml.contains("<MediumTypeName>CD-ROM</MediumTypeName>"));
        assert!(xml.contains("<SupportsReadToc>true</SupportsReadToc>"));
        assert!(xml.contains("<SupportsReadCd>true</SupportsReadCd>"));
        assert!(xml.contains("<SupportsRead6>false</SupportsRead6>"));
        assert!(xml.contains("<BlockSize>2048</BlockSize>"));
        assert!(!xml.contains("MediumTypeName>Audio CD"));
        assert!(!xml.contains("SupportsPlextorReadCDDA"));
        assert!(!console.questions.iter().any(|q| q.contains("HL-DT-ST")));
        assert!(console.questions.iter().any(|q| q.contains("NEC")));
    }
}
