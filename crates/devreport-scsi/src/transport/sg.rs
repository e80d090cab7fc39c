//! Linux SCSI generic pass-through (`SG_IO`).

use std::{
    ffi::c_void,
    fs::{File, OpenOptions},
    os::{fd::AsRawFd, unix::fs::OpenOptionsExt},
    path::Path,
    ptr,
    time::Duration,
};

use nix::{fcntl::OFlag, ioctl_readwrite_bad};

use crate::{
    commands::Direction,
    transport::{Completion, Transport, TransportError},
};

const SG_DXFER_NONE: i32 = -1;
const SG_DXFER_TO_DEV: i32 = -2;
const SG_DXFER_FROM_DEV: i32 = -3;
const SG_DXFER_TO_FROM_DEV: i32 = -4;

const SG_INFO_OK_MASK: u32 = 0x1;
const SG_INFO_OK: u32 = 0x0;

/// `struct sg_io_hdr` from `<scsi/sg.h>`.
#[repr(C)]
struct SgIoHdr {
    interface_id: i32,
    dxfer_direction: i32,
    cmd_len: u8,
    mx_sb_len: u8,
    iovec_count: u16,
    dxfer_len: u32,
    dxferp: *mut c_void,
    cmdp: *mut u8,
    sbp: *mut u8,
    timeout: u32,
    flags: u32,
    pack_id: i32,
    usr_ptr: *mut c_void,
    status: u8,
    masked_status: u8,
    msg_status: u8,
    sb_len_wr: u8,
    host_status: u16,
    driver_status: u16,
    resid: i32,
    duration: u32,
    info: u32,
}

// #define SG_IO 0x2285
ioctl_readwrite_bad!(sg_io_ioctl, 0x2285, SgIoHdr);

/// A device node opened for `SG_IO`.
#[derive(Debug)]
pub struct SgTransport {
    file: File,
    pub timeout_duration: Duration,
}

impl SgTransport {
    pub fn open(path: impl AsRef<Path>, timeout_duration: Duration) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let open = |write: bool| {
            OpenOptions::new()
                .read(true)
                .write(write)
                .custom_flags(OFlag::O_NONBLOCK.bits())
                .open(path)
        };
        let file = open(true)
            .or_else(|err| {
                log::debug!("read-write open of {} failed ({err}), retrying read-only", path.display());
                open(false)
            })
            .map_err(|source| TransportError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        log::debug!("opened {} for SG_IO", path.display());
        Ok(Self {
            file,
            timeout_duration,
        })
    }
}

impl Transport for SgTransport {
    fn send(&mut self, cdb: &[u8], buffer: &mut [u8], direction: Direction) -> Completion {
        let mut command = [0u8; 16];
        let cmd_len = cdb.len().min(command.len());
        command[..cmd_len].copy_from_slice(&cdb[..cmd_len]);
        let mut sense = [0u8; 32];

        let (dxferp, dxfer_len) = if buffer.is_empty() {
            (ptr::null_mut(), 0)
        } else {
            (buffer.as_mut_ptr() as *mut c_void, buffer.len() as u32)
        };

        let mut hdr = SgIoHdr {
            interface_id: 'S' as i32,
            dxfer_direction: if dxfer_len == 0 {
                SG_DXFER_NONE
            } else {
                match direction {
                    Direction::None => SG_DXFER_NONE,
                    Direction::In => SG_DXFER_FROM_DEV,
                    Direction::Out => SG_DXFER_TO_DEV,
                    Direction::Bidirectional => SG_DXFER_TO_FROM_DEV,
                }
            },
            cmd_len: cmd_len as u8,
            mx_sb_len: sense.len() as u8,
            iovec_count: 0,
            dxfer_len,
            dxferp,
            cmdp: command.as_mut_ptr(),
            sbp: sense.as_mut_ptr(),
            timeout: self.timeout_duration.as_millis().min(u32::MAX as u128) as u32,
            flags: 0,
            pack_id: 0,
            usr_ptr: ptr::null_mut(),
            status: 0,
            masked_status: 0,
            msg_status: 0,
            sb_len_wr: 0,
            host_status: 0,
            driver_status: 0,
            resid: 0,
            duration: 0,
            info: 0,
        };

        // SAFETY: every pointer in `hdr` refers to a buffer that outlives the call and
        // whose length matches the corresponding length field.
        let result = unsafe { sg_io_ioctl(self.file.as_raw_fd(), &mut hdr) };
        let code = match result {
            Err(errno) => {
                log::debug!("SG_IO ioctl failed: {errno}");
                -(errno as i32)
            }
            Ok(_) if hdr.info & SG_INFO_OK_MASK != SG_INFO_OK => {
                log::trace!(
                    "SG_IO status {:#04x} host {:#06x} driver {:#06x}",
                    hdr.status,
                    hdr.host_status,
                    hdr.driver_status
                );
                1
            }
            Ok(_) => 0,
        };

        Completion { code, sense }
    }
}
