#![forbid(unsafe_code)]

//! Error types for device reads and the message loop.
//!
//! Every [`LoopError`] is fatal: [`crate::EventLoop::run_forever`] logs it and
//! aborts the process. [`crate::EventLoop::run_once`] returns it so callers
//! and tests can observe the failure instead.

use std::fmt;
use std::io;

use wsrv_core::event::MessageKind;

use crate::device::DeviceKind;
use crate::receiver::ReceiverId;

/// Failure reading from an input device.
#[derive(Debug)]
pub enum DeviceError {
    /// The underlying read or readiness check failed.
    Io {
        /// Device that failed.
        device: DeviceKind,
        /// OS error.
        source: io::Error,
    },
    /// Fewer bytes than one packet were available. The stream is out of
    /// frame and is not resynchronised.
    ShortRead {
        /// Device that failed.
        device: DeviceKind,
        /// Packet size for the device.
        expected: usize,
        /// Bytes actually read.
        got: usize,
    },
    /// The device reported hang-up or an error condition with no data.
    Disconnected {
        /// Device that failed.
        device: DeviceKind,
    },
}

impl DeviceError {
    /// Device the error originated from.
    #[must_use]
    pub fn device(&self) -> DeviceKind {
        match self {
            Self::Io { device, .. }
            | Self::ShortRead { device, .. }
            | Self::Disconnected { device } => *device,
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { device, source } => write!(f, "{device} device I/O error: {source}"),
            Self::ShortRead {
                device,
                expected,
                got,
            } => write!(
                f,
                "short read on {device} device: expected {expected} bytes, got {got}"
            ),
            Self::Disconnected { device } => write!(f, "{device} device disconnected"),
        }
    }
}

impl std::error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::ShortRead { .. } | Self::Disconnected { .. } => None,
        }
    }
}

/// Unrecoverable failure of one loop cycle.
#[derive(Debug)]
pub enum LoopError {
    /// The readiness wait failed.
    Wait(io::Error),
    /// A device could not be drained.
    Device(DeviceError),
    /// A queued message targets a receiver that was never registered.
    MissingReceiver {
        /// The unresolvable target.
        receiver: ReceiverId,
        /// Kind of the undeliverable message.
        kind: MessageKind,
    },
    /// The loop was driven from a thread other than the one that first ran it.
    ForeignThread,
}

impl fmt::Display for LoopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wait(e) => write!(f, "readiness wait failed: {e}"),
            Self::Device(e) => write!(f, "device drain failed: {e}"),
            Self::MissingReceiver { receiver, kind } => write!(
                f,
                "{} message has no receiver (target {receiver})",
                kind.name()
            ),
            Self::ForeignThread => {
                f.write_str("message loop driven from a thread other than its own")
            }
        }
    }
}

impl std::error::Error for LoopError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wait(e) => Some(e),
            Self::Device(e) => Some(e),
            Self::MissingReceiver { .. } | Self::ForeignThread => None,
        }
    }
}

impl From<DeviceError> for LoopError {
    fn from(err: DeviceError) -> Self {
        Self::Device(err)
    }
}
