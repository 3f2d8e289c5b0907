#![forbid(unsafe_code)]

//! Input device handles.
//!
//! The loop consumes already-opened, readable device handles. It never
//! configures hardware; it only asks "is there data?" and reads whole
//! fixed-size packets. [`FdDevice`] implements this over any file descriptor
//! (a character device node in production, a socket in tests).

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::Path;

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use wsrv_core::keyboard_decoder::KEYBOARD_PACKET_SIZE;
use wsrv_core::pointer_decoder::POINTER_PACKET_SIZE;

use crate::error::DeviceError;

/// Which input device a handle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Keyboard: one packet per key transition.
    Keyboard,
    /// Pointer: PS/2 motion and button packets.
    Pointer,
}

impl DeviceKind {
    /// Fixed packet size for this device.
    #[must_use]
    pub const fn packet_size(self) -> usize {
        match self {
            Self::Keyboard => KEYBOARD_PACKET_SIZE,
            Self::Pointer => POINTER_PACKET_SIZE,
        }
    }

    /// Lowercase name, used in logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Keyboard => "keyboard",
            Self::Pointer => "pointer",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A readable device handle the loop can poll and drain.
///
/// Only the loop thread touches a device.
pub trait InputDevice: AsFd {
    /// Which device this is.
    fn kind(&self) -> DeviceKind;

    /// Check, without blocking, whether at least one packet can be read.
    fn has_data_available(&mut self) -> Result<bool, DeviceError>;

    /// Read exactly one packet into `buf`, whose length is the device's
    /// packet size. Anything shorter is [`DeviceError::ShortRead`].
    fn read_packet(&mut self, buf: &mut [u8]) -> Result<(), DeviceError>;
}

/// [`InputDevice`] over a file descriptor.
#[derive(Debug)]
pub struct FdDevice {
    kind: DeviceKind,
    file: File,
}

impl FdDevice {
    /// Open a device node read-only.
    pub fn open(path: impl AsRef<Path>, kind: DeviceKind) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).open(path)?;
        tracing::debug!(device = %kind, path = %path.display(), "opened input device");
        Ok(Self { kind, file })
    }

    /// Wrap an already-open descriptor.
    #[must_use]
    pub fn from_fd(fd: OwnedFd, kind: DeviceKind) -> Self {
        Self {
            kind,
            file: File::from(fd),
        }
    }

    fn io_error(&self, source: io::Error) -> DeviceError {
        DeviceError::Io {
            device: self.kind,
            source,
        }
    }
}

impl AsFd for FdDevice {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl InputDevice for FdDevice {
    fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn has_data_available(&mut self) -> Result<bool, DeviceError> {
        let revents = loop {
            let mut fds = [PollFd::new(self.file.as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, PollTimeout::ZERO) {
                Ok(0) => return Ok(false),
                Ok(_) => break fds[0].revents().unwrap_or(PollFlags::empty()),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(self.io_error(io::Error::from(e))),
            }
        };
        if revents.contains(PollFlags::POLLIN) {
            return Ok(true);
        }
        if revents.intersects(PollFlags::POLLHUP | PollFlags::POLLERR | PollFlags::POLLNVAL) {
            return Err(DeviceError::Disconnected { device: self.kind });
        }
        Ok(false)
    }

    fn read_packet(&mut self, buf: &mut [u8]) -> Result<(), DeviceError> {
        debug_assert_eq!(buf.len(), self.kind.packet_size());
        let got = loop {
            match self.file.read(buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.io_error(e)),
            }
        };
        if got != buf.len() {
            return Err(DeviceError::ShortRead {
                device: self.kind,
                expected: buf.len(),
                got,
            });
        }
        Ok(())
    }
}
