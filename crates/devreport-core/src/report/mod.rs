//! Probe sequences per device class.

use std::thread;

use devreport_scsi::{
    CommandFailed, ScsiDevice, Transport,
    commands::{
        inquiry::PeripheralDeviceType,
        mode_sense::{ALL_PAGES, ALL_SUBPAGES, PageControl},
    },
    mode::ModeSenseData,
};

use crate::{ProgressReporter, ReportOptions, console::Console, translate, xml::ReportSink};

mod ata;
mod mmc;
mod scsi;
mod ssc;

/// Long sector sizes seen in the field, per logical block size.
const KNOWN_LONG_SIZES: &[(u32, &[u16])] = &[
    (512, &[514, 516, 520, 524, 528, 536, 540, 560, 576, 600, 620, 624, 640]),
    (1024, &[1028, 1032, 1040, 1056, 1072, 1080, 1120, 1152]),
    (2048, &[2052, 2056, 2064, 2068, 2176, 2336, 2352, 2380, 2448]),
    (4096, &[4112, 4160, 4224, 4760]),
];

pub(crate) const INSERT_MEDIA: &str =
    "Please insert it in the drive and press any key when it is ready.";
pub(crate) const MORE_MEDIA: &str = "Do you have media that you can insert in the drive?";

/// State shared by every probe of one report.
pub(crate) struct Session<'a, T> {
    pub(crate) device: &'a mut ScsiDevice<T>,
    pub(crate) sink: &'a mut dyn ReportSink,
    pub(crate) console: &'a mut dyn Console,
    pub(crate) progress: &'a mut dyn ProgressReporter,
    pub(crate) options: &'a ReportOptions,
}

/// Outcome of the READ LONG size resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ReadLong {
    pub supported: bool,
    pub long_block_size: Option<u32>,
}

/// Write `value` unless it is zero or the "not reported" pattern.
pub(crate) fn write_number(sink: &mut dyn ReportSink, name: &str, value: u64) {
    if value != 0 && value != 0xFFFF {
        sink.write_formatted(name, format_args!("{value}"));
    }
}

pub(crate) fn write_text(sink: &mut dyn ReportSink, name: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        sink.write_element(name, value);
    }
}

impl<T: Transport> Session<'_, T> {
    /// Poll TEST UNIT READY while the sense data says the medium is settling.
    pub(crate) fn wait_until_ready(&mut self) -> bool {
        let attempts = self.options.ready_attempts.max(1);
        for attempt in 1..=attempts {
            match self.device.test_unit_ready() {
                Ok(()) => return true,
                Err(failed) => {
                    let sense = failed.sense_info();
                    if !sense.is_some_and(|s| s.worth_waiting()) {
                        log::debug!("TEST UNIT READY failed: {failed}");
                        return false;
                    }
                    log::info!("Waiting for the medium to become ready ({attempt}/{attempts})...");
                    if attempt < attempts {
                        thread::sleep(self.options.ready_interval);
                    }
                }
            }
        }
        false
    }

    /// Record whether a command succeeded, archiving its data under `data` when given.
    pub(crate) fn probe(
        &mut self,
        supports: &str,
        data: Option<&str>,
        result: Result<Vec<u8>, CommandFailed>,
    ) -> Option<Vec<u8>> {
        match result {
            Ok(buf) => {
                log::debug!("{supports}: yes");
                self.sink.write_bool(supports, true);
                if let Some(name) = data {
                    self.sink.write_data(name, &buf);
                }
                Some(buf)
            }
            Err(failed) => {
                match failed.sense_info() {
                    Some(sense) => log::debug!("{supports}: no, {sense}"),
                    None => log::debug!("{supports}: no, {failed}"),
                }
                self.sink.write_bool(supports, false);
                None
            }
        }
    }

    /// Operator supplied description fields.
    pub(crate) fn describe(&mut self, fields: &[(&str, &str)]) {
        for (element, question) in fields {
            let answer = self.console.prompt_line(question);
            write_text(self.sink, element, Some(answer.trim()));
        }
    }

    /// Issue MODE SENSE (10) and (6) for every page, archive both and decode one.
    pub(crate) fn mode_sense(&mut self, device_type: PeripheralDeviceType) -> Option<ModeSenseData> {
        log::info!("Querying all mode pages and subpages using SCSI MODE SENSE (10)...");
        let ten = self
            .device
            .mode_sense10(ALL_PAGES, ALL_SUBPAGES, PageControl::Current, false)
            .or_else(|_| {
                self.device
                    .mode_sense10(ALL_PAGES, 0, PageControl::Current, false)
            });
        log::info!("Querying all mode pages and subpages using SCSI MODE SENSE (6)...");
        let six = self
            .device
            .mode_sense6(ALL_PAGES, ALL_SUBPAGES, PageControl::Current)
            .or_else(|_| self.device.mode_sense6(ALL_PAGES, 0, PageControl::Current));

        let ten = self.probe("SupportsModeSense10", Some("ModeSense10Data"), ten);
        let six = self.probe("SupportsModeSense6", Some("ModeSense6Data"), six);

        let decoded = match (ten, six) {
            (Some(buf), _) => ModeSenseData::decode10(&buf, device_type),
            (None, Some(buf)) => ModeSenseData::decode6(&buf, device_type),
            (None, None) => return None,
        };
        match decoded {
            Ok(data) => {
                write_mode_sense(self.sink, &data, device_type);
                Some(data)
            }
            Err(err) => {
                log::warn!("Mode sense data could not be decoded: {err}");
                None
            }
        }
    }

    fn read_long_at(&mut self, sixteen: bool, transfer: u16) -> Result<Vec<u8>, CommandFailed> {
        if sixteen {
            self.device.read_long16(0, transfer)
        } else {
            self.device.read_long10(0, transfer)
        }
    }

    /// Find out whether READ LONG works and how long a long block is.
    pub(crate) fn probe_read_long(&mut self, sixteen: bool, block_size: u32) -> ReadLong {
        let name = if sixteen { "READ LONG (16)" } else { "READ LONG (10)" };
        log::info!("Trying SCSI {name}...");

        let mut outcome = ReadLong::default();
        match self.read_long_at(sixteen, u16::MAX) {
            Ok(_) => outcome.supported = true,
            Err(failed) => {
                if let Some(sense) = failed.sense_info().filter(|s| s.invalid_field_in_cdb()) {
                    outcome.supported = true;
                    if sense.valid && sense.ili {
                        let size = 0xFFFF - (sense.information & 0xFFFF) as u32;
                        outcome.long_block_size = Some(size);
                    }
                }
            }
        }
        if !outcome.supported {
            return outcome;
        }
        if outcome
            .long_block_size
            .is_some_and(|size| size != block_size)
        {
            return outcome;
        }
        outcome.long_block_size = None;

        let known = KNOWN_LONG_SIZES
            .iter()
            .find(|(size, _)| *size == block_size)
            .map(|(_, long)| *long)
            .unwrap_or(&[]);
        for &size in known {
            if self.read_long_at(sixteen, size).is_ok() {
                outcome.long_block_size = Some(size as u32);
                return outcome;
            }
        }

        let first = u16::try_from(block_size.saturating_add(1)).unwrap_or(u16::MAX);
        if first == u16::MAX
            || !self.console.confirm(&format!(
                "Drive supports SCSI {name} but I cannot find the correct size. Do you want me to try? (This can take hours)"
            ))
        {
            return outcome;
        }

        self.progress.start((u16::MAX - first) as usize + 1);
        for size in first..=u16::MAX {
            self.progress.advance(1);
            if self.read_long_at(sixteen, size).is_ok() {
                outcome.long_block_size = Some(size as u32);
                break;
            }
        }
        self.progress.finish();
        outcome
    }

    /// Probe both READ LONG forms and record them.
    pub(crate) fn read_long_tests(&mut self, block_size: u32) {
        let ten = self.probe_read_long(false, block_size);
        self.sink.write_bool("SupportsReadLong", ten.supported);
        let sixteen = self.probe_read_long(true, block_size);
        self.sink.write_bool("SupportsReadLong16", sixteen.supported);
        if let Some(size) = ten.long_block_size.or(sixteen.long_block_size) {
            self.sink
                .write_formatted("LongBlockSize", format_args!("{size}"));
        }
    }
}

fn write_mode_sense(sink: &mut dyn ReportSink, data: &ModeSenseData, device_type: PeripheralDeviceType) {
    let header = &data.header;
    sink.start_element("ModeSense");
    sink.write_formatted("MediumType", format_args!("{}", header.medium_type));
    if device_type == PeripheralDeviceType::DirectAccess {
        write_text(
            sink,
            "MediumTypeName",
            translate::scsi::medium_type(header.medium_type),
        );
    }
    sink.write_bool("WriteProtected", header.write_protected);
    sink.write_bool("DPOandFUA", header.dpo_fua);
    if let Some(mode) = header.buffered_mode {
        sink.write_formatted("BufferedMode", format_args!("{mode}"));
    }
    if let Some(speed) = header.speed {
        sink.write_formatted("Speed", format_args!("{speed}"));
    }
    for descriptor in &header.block_descriptors {
        sink.start_element("BlockDescriptor");
        sink.write_formatted("Density", format_args!("{}", descriptor.density));
        sink.write_formatted("Blocks", format_args!("{}", descriptor.blocks));
        sink.write_formatted("BlockLength", format_args!("{}", descriptor.block_length));
        sink.end_element();
    }
    for ((page, subpage), bytes) in &data.pages {
        sink.start_element("ModePage");
        sink.write_attribute("page", &format!("0x{page:02X}"));
        sink.write_attribute("subpage", &format!("0x{subpage:02X}"));
        sink.write_base64(bytes);
        sink.end_element();
    }
    sink.end_element();
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use devreport_scsi::ScsiDevice;

    use super::*;
    use crate::{
        NoProgress,
        testing::{Reply, ScriptedConsole, ScriptedTransport},
        xml::XmlWriter,
    };

    fn options() -> ReportOptions {
        ReportOptions {
            ready_attempts: 3,
            ready_interval: Duration::ZERO,
        }
    }

    fn with_session<R>(
        transport: ScriptedTransport,
        console: &mut ScriptedConsole,
        run: impl FnOnce(&mut Session<'_, ScriptedTransport>) -> R,
    ) -> (R, String) {
        let mut device = ScsiDevice::new(transport);
        let mut xml = XmlWriter::new();
        let options = options();
        let mut progress = NoProgress;
        let result = {
            let mut session = Session {
                device: &mut device,
                sink: &mut xml,
                console,
                progress: &mut progress,
                options: &options,
            };
            run(&mut session)
        };
        (result, xml.finish())
    }

    #[test]
    fn ready_wait_gives_up_after_the_attempts() {
        let mut console = ScriptedConsole::default();
        let transport = ScriptedTransport::new(|_, _| Reply::check(0x02, 0x3A, 0x00));
        let (ready, _) = with_session(transport, &mut console, |s| {
            let ready = s.wait_until_ready();
            (ready, s.device.transport_mut().sent.len())
        });
        assert_eq!(ready, (false, 3));
    }

    #[test]
    fn ready_wait_stops_on_unrelated_sense() {
        let mut console = ScriptedConsole::default();
        let transport = ScriptedTransport::new(|_, _| Reply::check(0x04, 0x44, 0x00));
        let (ready, _) = with_session(transport, &mut console, |s| {
            let ready = s.wait_until_ready();
            (ready, s.device.transport_mut().sent.len())
        });
        assert_eq!(ready, (false, 1));
    }

    #[test]
    fn read_long_size_from_information_field() {
        let mut console = ScriptedConsole::default();
        let transport =
            ScriptedTransport::new(|_, _| Reply::check_ili(0x05, 0x24, 0x00, 0xFFFF - 520));
        let (outcome, _) = with_session(transport, &mut console, |s| s.probe_read_long(false, 512));
        assert_eq!(
            outcome,
            ReadLong {
                supported: true,
                long_block_size: Some(520)
            }
        );
    }

    #[test]
    fn read_long_falls_back_to_known_sizes() {
        let mut console = ScriptedConsole::default();
        let transport = ScriptedTransport::new(|cdb, _| {
            let transfer = u16::from_be_bytes([cdb[7], cdb[8]]);
            if transfer == 2352 {
                Reply::ok()
            } else {
                Reply::check(0x05, 0x24, 0x00)
            }
        });
        let (outcome, _) = with_session(transport, &mut console, |s| s.probe_read_long(false, 2048));
        assert_eq!(outcome.long_block_size, Some(2352));
        assert!(console.questions.is_empty());
    }

    #[test]
    fn linear_search_needs_consent() {
        let mut console = ScriptedConsole::new(&[false], &[]);
        let transport = ScriptedTransport::new(|_, _| Reply::check(0x05, 0x24, 0x00));
        let (outcome, _) = with_session(transport, &mut console, |s| s.probe_read_long(false, 512));
        assert!(outcome.supported);
        assert_eq!(outcome.long_block_size, None);
        assert!(console.questions[0].contains("This can take hours"));
    }

    #[test]
    fn linear_search_finds_the_size() {
        let mut console = ScriptedConsole::new(&[true], &[]);
        let transport = ScriptedTransport::new(|cdb, _| {
            let transfer = u16::from_be_bytes([cdb[7], cdb[8]]);
            if transfer == 700 {
                Reply::ok()
            } else {
                Reply::check(0x05, 0x24, 0x00)
            }
        });
        let (outcome, _) = with_session(transport, &mut console, |s| s.probe_read_long(false, 512));
        assert_eq!(outcome.long_block_size, Some(700));
    }

    #[test]
    fn unsupported_read_long_is_not_searched() {
        let mut console = ScriptedConsole::default();
        let transport = ScriptedTransport::new(|_, _| Reply::check(0x05, 0x20, 0x00));
        let (outcome, _) = with_session(transport, &mut console, |s| s.probe_read_long(true, 512));
        assert_eq!(outcome, ReadLong::default());
        assert!(console.questions.is_empty());
    }

    #[test]
    fn mode_sense_archives_and_decodes() {
        let mut console = ScriptedConsole::default();
        let transport = ScriptedTransport::new(|cdb, _| match cdb[0] {
            0x5A => Reply::data(&[0x00, 0x0E, 0x00, 0x00, 0, 0, 0, 0, 0x08, 0x06, 0x04, 0, 0, 0, 0, 0]),
            _ => Reply::check(0x05, 0x20, 0x00),
        });
        let (decoded, xml) = with_session(transport, &mut console, |s| {
            s.mode_sense(PeripheralDeviceType::DirectAccess)
        });
        let decoded = decoded.unwrap();
        assert!(decoded.page(0x08, 0).is_some());
        assert!(xml.contains("<SupportsModeSense10>true</SupportsModeSense10>"));
        assert!(xml.contains("<SupportsModeSense6>false</SupportsModeSense6>"));
        assert!(xml.contains(r#"<ModePage page="0x08" subpage="0x00">"#));
    }
}
