use devreport_scsi::{
    Transport,
    commands::{
        inquiry::PeripheralDeviceType,
        ssc::{BlockLimits, StreamRead6Command, StreamRead16Command},
    },
    density::{DensityDescriptor, MediumTypeDescriptor, decode_densities, decode_medium_types},
};

use super::{INSERT_MEDIA, MORE_MEDIA, Session, write_text};
use crate::xml::ReportSink;

/// Variable block length the stream read probes ask for.
const STREAM_READ_LEN: u32 = 0x1_0000;

fn write_densities(sink: &mut dyn ReportSink, name: &str, densities: &[DensityDescriptor]) {
    sink.start_element(name);
    for density in densities {
        sink.start_element("Density");
        sink.write_formatted("PrimaryCode", format_args!("{}", density.primary_code));
        sink.write_formatted("SecondaryCode", format_args!("{}", density.secondary_code));
        sink.write_bool("Writable", density.writable);
        sink.write_bool("Duplicate", density.duplicate);
        sink.write_bool("DefaultDensity", density.default_density);
        sink.write_formatted("BitsPerMm", format_args!("{}", density.bits_per_mm));
        sink.write_formatted("Width", format_args!("{}", density.media_width));
        sink.write_formatted("Tracks", format_args!("{}", density.tracks));
        sink.write_formatted("Capacity", format_args!("{}", density.capacity));
        write_text(sink, "Organization", density.organization.as_deref());
        write_text(sink, "Name", density.name.as_deref());
        write_text(sink, "Description", density.description.as_deref());
        sink.end_element();
    }
    sink.end_element();
}

fn write_medium_types(sink: &mut dyn ReportSink, name: &str, types: &[MediumTypeDescriptor]) {
    sink.start_element(name);
    for medium in types {
        sink.start_element("MediumType");
        sink.write_formatted("MediumType", format_args!("{}", medium.medium_type));
        for code in &medium.density_codes {
            sink.write_formatted("DensityCode", format_args!("{code}"));
        }
        sink.write_formatted("Width", format_args!("{}", medium.media_width));
        sink.write_formatted("Length", format_args!("{}", medium.medium_length));
        write_text(sink, "Organization", medium.organization.as_deref());
        write_text(sink, "Name", medium.name.as_deref());
        write_text(sink, "Description", medium.description.as_deref());
        sink.end_element();
    }
    sink.end_element();
}

impl<T: Transport> Session<'_, T> {
    pub(crate) fn ssc_report(&mut self) {
        self.sink.start_element("SequentialDevice");

        log::info!("Querying SCSI READ BLOCK LIMITS...");
        let limits = self.device.read_block_limits();
        if let Some(limits) = self
            .probe("SupportsReadBlockLimits", None, limits)
            .and_then(|buf| BlockLimits::parse(&buf).ok())
        {
            self.sink
                .write_formatted("BlockSizeGranularity", format_args!("{}", limits.granularity));
            self.sink
                .write_formatted("MaxBlockLength", format_args!("{}", limits.max_block_length));
            self.sink
                .write_formatted("MinBlockLength", format_args!("{}", limits.min_block_length));
        }

        self.density_support(false, "SupportedDensities", "SupportedMediaTypes");

        self.sink.start_element("TestedMedias");
        while self.console.confirm(MORE_MEDIA) {
            self.console.wait_for_enter(INSERT_MEDIA);
            self.sink.start_element("TestedMedia");
            self.describe(&[
                (
                    "MediumTypeName",
                    "Please write a description of the media type and press enter: ",
                ),
                (
                    "Manufacturer",
                    "Please write the media manufacturer and press enter: ",
                ),
                ("Model", "Please write the media model and press enter: "),
            ]);
            let ready = self.wait_until_ready();
            self.sink.write_bool("MediaIsRecognized", ready);
            if ready {
                self.ssc_media_tests();
            }
            self.sink.end_element();

            if let Err(err) = self.device.unload_tape() {
                log::debug!("Could not unload the tape: {err}");
            }
        }
        self.sink.end_element();

        self.sink.end_element();
    }

    /// REPORT DENSITY SUPPORT in both its density and medium type forms.
    fn density_support(&mut self, current: bool, densities: &str, media: &str) {
        log::info!("Querying SCSI REPORT DENSITY SUPPORT...");
        match self.device.report_density_support(false, current) {
            Ok(buf) => match decode_densities(&buf) {
                Ok(list) => write_densities(self.sink, densities, &list),
                Err(err) => log::warn!("Density support data could not be decoded: {err}"),
            },
            Err(err) => log::debug!("REPORT DENSITY SUPPORT failed: {err}"),
        }
        log::info!("Querying SCSI REPORT DENSITY SUPPORT for medium types...");
        match self.device.report_density_support(true, current) {
            Ok(buf) => match decode_medium_types(&buf) {
                Ok(list) => write_medium_types(self.sink, media, &list),
                Err(err) => log::warn!("Medium type support data could not be decoded: {err}"),
            },
            Err(err) => log::debug!("REPORT DENSITY SUPPORT (medium types) failed: {err}"),
        }
    }

    fn ssc_media_tests(&mut self) {
        self.mode_sense(PeripheralDeviceType::SequentialAccess);
        self.density_support(true, "CurrentDensities", "CurrentMediaTypes");

        log::info!("Querying SCSI READ MEDIA SERIAL NUMBER...");
        let serial = self.device.read_media_serial_number();
        self.probe("SupportsReadMediaSerial", None, serial);

        let mut buf = vec![0u8; STREAM_READ_LEN as usize];
        log::info!("Trying SCSI READ (6)...");
        let result = self.device.execute(
            &StreamRead6Command {
                sili: true,
                fixed: false,
                transfer_length: STREAM_READ_LEN,
            },
            &mut buf,
        );
        self.probe("SupportsRead6", None, result.map(|()| Vec::new()));
        log::info!("Trying SCSI READ (16)...");
        let result = self.device.execute(
            &StreamRead16Command {
                sili: true,
                fixed: false,
                partition: 0,
                object_id: 0,
                transfer_length: STREAM_READ_LEN,
            },
            &mut buf,
        );
        self.probe("SupportsRead16", None, result.map(|()| Vec::new()));
    }
}
