use std::time::Duration;

use devreport_scsi::{ScsiDevice, Transport};
use thiserror::Error;

use crate::{
    console::Console,
    detect::{DeviceClass, Detected},
    report::Session,
    xml::ReportSink,
};

pub mod console;
pub mod detect;
pub mod media;
mod report;
pub mod translate;
pub mod xml;

#[cfg(test)]
pub(crate) mod testing;

pub trait ProgressReporter {
    fn start(&mut self, total: usize);
    fn advance(&mut self, steps: usize);
    fn finish(&mut self);
}

pub struct NoProgress;
impl ProgressReporter for NoProgress {
    fn start(&mut self, _total: usize) {}
    fn advance(&mut self, _steps: usize) {}
    fn finish(&mut self) {}
}

/// Tunables of the probe sequences.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// TEST UNIT READY attempts while a medium settles.
    pub ready_attempts: u32,
    /// Pause between those attempts.
    pub ready_interval: Duration,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            ready_attempts: 20,
            ready_interval: Duration::from_secs(2),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("the device answered neither INQUIRY nor IDENTIFY")]
    UnknownDeviceClass,
    #[error("mandatory {command} failed")]
    IdentificationFailed { command: &'static str },
}

/// Probe a detected device and write its report into `sink`.
///
/// Only a failure of the mandatory identification command is returned as an
/// error; every other probe records its outcome in the report.
///
/// # Examples
///
/// ```no_run
/// # #[cfg(target_os = "linux")]
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::time::Duration;
/// use devreport_core::{NoProgress, ReportOptions, console::Console, detect, write_report, xml::XmlWriter};
/// use devreport_scsi::{ScsiDevice, transport::SgTransport};
///
/// struct Decline;
/// impl Console for Decline {
///     fn confirm(&mut self, _question: &str) -> bool { false }
///     fn prompt_line(&mut self, _question: &str) -> String { String::new() }
///     fn wait_for_enter(&mut self, _message: &str) {}
/// }
///
/// let mut device = ScsiDevice::new(SgTransport::open("/dev/sg0", Duration::from_secs(10))?);
/// let detected = detect::detect(&mut device)?;
/// let mut xml = XmlWriter::new();
/// write_report(&mut device, &detected, &mut xml, &mut Decline, &mut NoProgress, &ReportOptions::default())?;
/// std::fs::write(detect::report_file_name(&detected), xml.finish())?;
/// # Ok(())
/// # }
/// # #[cfg(not(target_os = "linux"))]
/// # fn main() {}
/// ```
pub fn write_report<T: Transport>(
    device: &mut ScsiDevice<T>,
    detected: &Detected,
    sink: &mut dyn ReportSink,
    console: &mut dyn Console,
    progress: &mut dyn ProgressReporter,
    options: &ReportOptions,
) -> Result<(), ReportError> {
    let mut session = Session {
        device,
        sink,
        console,
        progress,
        options,
    };

    session.sink.write_comment(&format!(
        "Report created with devreport {}",
        env!("CARGO_PKG_VERSION")
    ));
    session.sink.start_element("DeviceReport");

    let result = match detected.class {
        DeviceClass::Ata => session.ata_report(detected),
        DeviceClass::Atapi => session
            .atapi_report(detected)
            .and_then(|()| session.scsi_report(detected)),
        DeviceClass::Scsi => session.scsi_report(detected),
    };

    session.sink.end_element();
    result
}

#[cfg(test)]
mod tests {
    use devreport_scsi::ScsiDevice;

    use super::*;
    use crate::{
        testing::{Reply, ScriptedConsole, ScriptedTransport},
        xml::XmlWriter,
    };

    fn report(class: DeviceClass) -> Result<(), ReportError> {
        let detected = Detected {
            class,
            inquiry: None,
            identify: None,
        };
        let mut device = ScsiDevice::new(ScriptedTransport::new(|_, _| Reply::failed(1)));
        write_report(
            &mut device,
            &detected,
            &mut XmlWriter::new(),
            &mut ScriptedConsole::default(),
            &mut NoProgress,
            &ReportOptions::default(),
        )
    }

    #[test]
    fn missing_identification_aborts_the_report() {
        assert!(matches!(
            report(DeviceClass::Ata),
            Err(ReportError::IdentificationFailed { command: "IDENTIFY DEVICE" })
        ));
        assert!(matches!(
            report(DeviceClass::Atapi),
            Err(ReportError::IdentificationFailed { command: "IDENTIFY PACKET DEVICE" })
        ));
        assert!(matches!(
            report(DeviceClass::Scsi),
            Err(ReportError::IdentificationFailed { command: "INQUIRY" })
        ));
    }
}
