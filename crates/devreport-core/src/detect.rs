//! Device class detection and report naming.

use devreport_scsi::{
    ScsiDevice, Transport,
    ata::identify::{IDENTIFY_LEN, IdentifyDevice},
    commands::inquiry::InquiryData,
};

use crate::ReportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Ata,
    Atapi,
    Scsi,
}

/// What identification returned.
#[derive(Debug, Clone)]
pub struct Detected {
    pub class: DeviceClass,
    pub inquiry: Option<InquiryData>,
    /// IDENTIFY DEVICE for ATA, IDENTIFY PACKET DEVICE for ATAPI.
    pub identify: Option<IdentifyDevice>,
}

impl Detected {
    pub fn vendor(&self) -> String {
        match (&self.inquiry, &self.identify) {
            (Some(inquiry), _) if self.class != DeviceClass::Ata => inquiry.vendor(),
            (_, Some(identify)) => identify
                .model()
                .and_then(|model| {
                    model
                        .split_once(' ')
                        .map(|(vendor, _)| vendor.to_string())
                })
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    pub fn product(&self) -> String {
        match (&self.inquiry, &self.identify) {
            (Some(inquiry), _) if self.class != DeviceClass::Ata => inquiry.product(),
            (_, Some(identify)) => identify.model().unwrap_or_default(),
            _ => String::new(),
        }
    }

    pub fn revision(&self) -> String {
        match (&self.inquiry, &self.identify) {
            (Some(inquiry), _) if self.class != DeviceClass::Ata => inquiry.revision(),
            (_, Some(identify)) => identify.firmware_revision().unwrap_or_default(),
            _ => String::new(),
        }
    }
}

fn identify_with<T: Transport>(device: &mut ScsiDevice<T>, packet: bool) -> Option<IdentifyDevice> {
    let mut buf = [0u8; IDENTIFY_LEN];
    let response = if packet {
        device.ata_identify_packet(&mut buf)
    } else {
        device.ata_identify(&mut buf)
    };
    if !response.succeeded() || buf.iter().all(|b| *b == 0) {
        return None;
    }
    IdentifyDevice::parse(&buf).ok()
}

/// Work out which report applies: ATA when IDENTIFY DEVICE answers, ATAPI when
/// INQUIRY and IDENTIFY PACKET DEVICE both do, SCSI on INQUIRY alone.
pub fn detect<T: Transport>(device: &mut ScsiDevice<T>) -> Result<Detected, ReportError> {
    log::info!("Querying SCSI INQUIRY...");
    let inquiry = match device.inquiry() {
        Ok(buf) => match InquiryData::parse(&buf) {
            Ok(inquiry) => Some(inquiry),
            Err(err) => {
                log::debug!("INQUIRY data unusable: {err}");
                None
            }
        },
        Err(err) => {
            log::debug!("INQUIRY failed: {err}");
            None
        }
    };

    log::info!("Querying ATA IDENTIFY...");
    if let Some(identify) = identify_with(device, false) {
        return Ok(Detected {
            class: DeviceClass::Ata,
            inquiry,
            identify: Some(identify),
        });
    }

    let Some(inquiry) = inquiry else {
        return Err(ReportError::UnknownDeviceClass);
    };

    log::info!("Querying ATAPI IDENTIFY PACKET...");
    let identify = identify_with(device, true);
    let class = if identify.is_some() {
        DeviceClass::Atapi
    } else {
        DeviceClass::Scsi
    };
    Ok(Detected {
        class,
        inquiry: Some(inquiry),
        identify,
    })
}

fn sanitize(part: &str) -> String {
    part.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `<vendor>_<product>_<revision>.xml`, leaving out empty parts.
pub fn report_file_name(detected: &Detected) -> String {
    let parts: Vec<String> = [detected.vendor(), detected.product(), detected.revision()]
        .iter()
        .map(|part| sanitize(part))
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        return "device.xml".to_string();
    }
    format!("{}.xml", parts.join("_"))
}
