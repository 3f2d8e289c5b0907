#![forbid(unsafe_code)]

//! Interruptible readiness wait.
//!
//! The loop thread sleeps in `poll(2)` on the device descriptors. Producer
//! threads need a way to cut that sleep short when they queue work, so the
//! poll set always includes the read end of a self-pipe: writing one byte to
//! the other end makes the wait return.
//!
//! The pipe is a non-blocking Unix socket pair. A full pipe means a wake is
//! already pending, so [`WakePipe::notify`] never blocks.

use std::io::{self, Read, Write};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::net::UnixStream;

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};

/// Maximum number of handles a single wait can watch.
pub const MAX_WAIT_HANDLES: usize = 64;

/// How long [`WakePipe::wait`] may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTimeout {
    /// Check readiness and return at once.
    Immediate,
    /// Block until a handle is ready or a wake arrives.
    Forever,
}

impl From<WaitTimeout> for PollTimeout {
    fn from(timeout: WaitTimeout) -> Self {
        match timeout {
            WaitTimeout::Immediate => PollTimeout::ZERO,
            WaitTimeout::Forever => PollTimeout::NONE,
        }
    }
}

/// Result of one wait: which handles are ready and whether a wake arrived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    ready: u64,
    woken: bool,
}

impl Readiness {
    /// Check whether the handle at `index` (as passed to `wait`) is ready.
    #[must_use]
    pub const fn is_ready(&self, index: usize) -> bool {
        index < MAX_WAIT_HANDLES && self.ready & (1 << index) != 0
    }

    /// Check whether any handle is ready.
    #[must_use]
    pub const fn any_ready(&self) -> bool {
        self.ready != 0
    }

    /// Check whether the wait ended because of a wake request.
    #[must_use]
    pub const fn woken(&self) -> bool {
        self.woken
    }
}

/// Self-pipe used to interrupt a blocked wait.
#[derive(Debug)]
pub struct WakePipe {
    reader: UnixStream,
    writer: UnixStream,
}

impl WakePipe {
    /// Create the pipe.
    pub fn new() -> io::Result<Self> {
        let (reader, writer) = UnixStream::pair()?;
        reader.set_nonblocking(true)?;
        writer.set_nonblocking(true)?;
        Ok(Self { reader, writer })
    }

    /// Make a concurrent or future [`WakePipe::wait`] return.
    pub fn notify(&self) -> io::Result<()> {
        loop {
            match (&self.writer).write(&[1]) {
                Ok(_) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Block until one of `handles` is readable, a wake arrives, or the
    /// timeout elapses.
    ///
    /// A signal interrupting the wait is reported as nothing ready. Any other
    /// poll failure is returned. Pending wakes are consumed before returning.
    pub fn wait(&self, handles: &[BorrowedFd<'_>], timeout: WaitTimeout) -> io::Result<Readiness> {
        if handles.len() > MAX_WAIT_HANDLES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot wait on more than {MAX_WAIT_HANDLES} handles"),
            ));
        }

        let mut poll_fds: Vec<PollFd<'_>> = handles
            .iter()
            .map(|fd| PollFd::new(*fd, PollFlags::POLLIN))
            .collect();
        poll_fds.push(PollFd::new(self.reader.as_fd(), PollFlags::POLLIN));

        match poll(&mut poll_fds, timeout) {
            Ok(_) => {}
            Err(Errno::EINTR) => return Ok(Readiness::default()),
            Err(e) => return Err(io::Error::from(e)),
        }

        let signalled = |fd: &PollFd<'_>| {
            fd.revents().is_some_and(|r| {
                r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR)
            })
        };
        let mut readiness = Readiness::default();
        for (index, fd) in poll_fds.iter().enumerate() {
            if !signalled(fd) {
                continue;
            }
            // The wake pipe sits after the caller's handles.
            if index == handles.len() {
                readiness.woken = true;
            } else {
                readiness.ready |= 1 << index;
            }
        }
        drop(poll_fds);

        if readiness.woken {
            self.clear()?;
        }
        Ok(readiness)
    }

    /// Consume every pending wake byte.
    fn clear(&self) -> io::Result<()> {
        let mut buf = [0u8; 64];
        loop {
            match (&self.reader).read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn immediate_wait_with_nothing_ready() {
        let pipe = WakePipe::new().unwrap();
        let (a, _b) = UnixStream::pair().unwrap();
        let readiness = pipe.wait(&[a.as_fd()], WaitTimeout::Immediate).unwrap();
        assert!(!readiness.any_ready());
        assert!(!readiness.woken());
    }

    #[test]
    fn readable_handle_reported_by_index() {
        let pipe = WakePipe::new().unwrap();
        let (a, _a_peer) = UnixStream::pair().unwrap();
        let (b, mut b_peer) = UnixStream::pair().unwrap();
        b_peer.write_all(b"x").unwrap();
        let readiness = pipe
            .wait(&[a.as_fd(), b.as_fd()], WaitTimeout::Forever)
            .unwrap();
        assert!(!readiness.is_ready(0));
        assert!(readiness.is_ready(1));
        assert!(!readiness.woken());
    }

    #[test]
    fn notify_before_wait_is_not_lost() {
        let pipe = WakePipe::new().unwrap();
        pipe.notify().unwrap();
        pipe.notify().unwrap();
        let readiness = pipe.wait(&[], WaitTimeout::Forever).unwrap();
        assert!(readiness.woken());
        // Both bytes were consumed.
        let readiness = pipe.wait(&[], WaitTimeout::Immediate).unwrap();
        assert!(!readiness.woken());
    }

    #[test]
    fn notify_from_other_thread_unblocks_wait() {
        let pipe = Arc::new(WakePipe::new().unwrap());
        let (device, _peer) = UnixStream::pair().unwrap();
        let waker = Arc::clone(&pipe);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            waker.notify().unwrap();
        });
        let start = Instant::now();
        let readiness = pipe.wait(&[device.as_fd()], WaitTimeout::Forever).unwrap();
        assert!(readiness.woken());
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn notify_on_full_pipe_succeeds() {
        let pipe = WakePipe::new().unwrap();
        for _ in 0..100_000 {
            pipe.notify().unwrap();
        }
        assert!(pipe.wait(&[], WaitTimeout::Immediate).unwrap().woken());
    }

    #[test]
    fn too_many_handles_rejected() {
        let pipe = WakePipe::new().unwrap();
        let (a, _b) = UnixStream::pair().unwrap();
        let handles = vec![a.as_fd(); MAX_WAIT_HANDLES + 1];
        let err = pipe.wait(&handles, WaitTimeout::Immediate).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
