use std::{io, path::PathBuf};

use thiserror::Error;

use crate::{commands::Direction, sense::SenseBuffer};

#[cfg(target_os = "linux")]
pub mod sg;

#[cfg(target_os = "linux")]
pub use sg::SgTransport;

/// Outcome of one command as the transport saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Zero on success. Negative values are OS errors, positive ones host, driver or device status.
    pub code: i32,
    /// Always populated, even when `code` is zero.
    pub sense: SenseBuffer,
}

impl Completion {
    pub fn ok() -> Self {
        Self {
            code: 0,
            sense: [0u8; 32],
        }
    }

    pub fn failed(code: i32, sense: SenseBuffer) -> Self {
        Self { code, sense }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Sends a command block and an optional data buffer to a device.
///
/// Implementations never fail outright: every problem is folded into the
/// returned [`Completion`] so callers can still inspect the sense bytes.
pub trait Transport {
    fn send(&mut self, cdb: &[u8], buffer: &mut [u8], direction: Direction) -> Completion;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, cdb: &[u8], buffer: &mut [u8], direction: Direction) -> Completion {
        (**self).send(cdb, buffer, direction)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, cdb: &[u8], buffer: &mut [u8], direction: Direction) -> Completion {
        (**self).send(cdb, buffer, direction)
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no pass-through transport is available on this platform")]
    Unsupported,
}
