#![forbid(unsafe_code)]

//! The message loop driver.
//!
//! [`EventLoop`] owns the two input devices and runs a fixed cycle on one
//! thread:
//!
//! ```text
//!   Idle ──wait──▶ Draining ──▶ Dispatching ──▶ Idle
//! ```
//!
//! - **Idle**: block in [`LoopContext::wait`] on both devices and the wake
//!   pipe. The wait returns at once when messages are already pending.
//! - **Draining**: read every packet currently available from the keyboard,
//!   then from the pointer, decode, and queue the results for the input
//!   receiver.
//! - **Dispatching**: detach the whole pending queue and deliver each entry,
//!   in order, to its receiver.
//!
//! Messages posted while dispatching (by receivers or by other threads) stay
//! in the queue for the next cycle.
//!
//! # Failure
//!
//! [`EventLoop::run_once`] reports a fatal condition as a [`LoopError`] and
//! leaves the loop in whatever phase failed. [`EventLoop::run_forever`] logs
//! the error and aborts the process; a window server with a broken input
//! stream or a dangling receiver id cannot continue.

use std::io;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, debug_span, error, info_span, trace};
use wsrv_core::event::Message;
use wsrv_core::keyboard_decoder::{KEYBOARD_PACKET_SIZE, decode_key_packet};
use wsrv_core::pointer_decoder::{POINTER_PACKET_SIZE, PointerDecoder};

use crate::config::LoopConfig;
use crate::context::LoopContext;
use crate::device::{DeviceKind, FdDevice, InputDevice};
use crate::error::LoopError;
use crate::message_queue::QueuedMessage;
use crate::receiver::{ReceiverId, Resolution};

const KEYBOARD_SLOT: usize = 0;
const POINTER_SLOT: usize = 1;

/// Where the loop is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopPhase {
    /// Waiting for input or a wake.
    #[default]
    Idle,
    /// Reading and decoding device packets.
    Draining,
    /// Delivering queued messages.
    Dispatching,
}

/// What one [`EventLoop::run_once`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Messages produced by the device decoders.
    pub decoded: usize,
    /// Messages delivered to a live receiver.
    pub dispatched: usize,
    /// Messages dropped because their receiver was retired.
    pub skipped: usize,
    /// Whether the wait ended because of a wake request.
    pub woken: bool,
}

/// Single-threaded driver for one [`LoopContext`].
pub struct EventLoop<K: InputDevice = FdDevice, P: InputDevice = FdDevice> {
    context: Arc<LoopContext>,
    keyboard: K,
    pointer: P,
    pointer_decoder: PointerDecoder,
    input_receiver: ReceiverId,
    phase: LoopPhase,
}

impl EventLoop {
    /// Open the configured device nodes and build a loop around them.
    ///
    /// Decoded input is posted to `input_receiver`.
    pub fn open(
        config: &LoopConfig,
        context: Arc<LoopContext>,
        input_receiver: ReceiverId,
    ) -> io::Result<Self> {
        let keyboard = FdDevice::open(&config.keyboard_device, DeviceKind::Keyboard)?;
        let pointer = FdDevice::open(&config.pointer_device, DeviceKind::Pointer)?;
        Ok(Self::new(context, keyboard, pointer, input_receiver))
    }
}

impl<K: InputDevice, P: InputDevice> EventLoop<K, P> {
    /// Build a loop around already-open devices.
    pub fn new(
        context: Arc<LoopContext>,
        keyboard: K,
        pointer: P,
        input_receiver: ReceiverId,
    ) -> Self {
        debug_assert_eq!(keyboard.kind(), DeviceKind::Keyboard);
        debug_assert_eq!(pointer.kind(), DeviceKind::Pointer);
        Self {
            context,
            keyboard,
            pointer,
            pointer_decoder: PointerDecoder::new(),
            input_receiver,
            phase: LoopPhase::Idle,
        }
    }

    /// The shared context this loop drives.
    #[must_use]
    pub fn context(&self) -> &Arc<LoopContext> {
        &self.context
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Receiver that decoded keyboard and pointer messages are posted to.
    #[must_use]
    pub fn input_receiver(&self) -> ReceiverId {
        self.input_receiver
    }

    /// Redirect decoded input to another receiver.
    pub fn set_input_receiver(&mut self, receiver: ReceiverId) {
        debug!(receiver = %receiver, "input receiver changed");
        self.input_receiver = receiver;
    }

    /// Run one wait, drain and dispatch cycle.
    pub fn run_once(&mut self) -> Result<CycleReport, LoopError> {
        if !self.context.enter_loop() {
            return Err(LoopError::ForeignThread);
        }

        self.phase = LoopPhase::Idle;
        let readiness = {
            let handles = [self.keyboard.as_fd(), self.pointer.as_fd()];
            self.context.wait(&handles).map_err(LoopError::Wait)?
        };

        let _span = debug_span!(
            "wsrv.loop.cycle",
            woken = readiness.woken(),
            duration_us = tracing::field::Empty
        )
        .entered();
        let start = Instant::now();

        self.phase = LoopPhase::Draining;
        let mut decoded = 0;
        if readiness.is_ready(KEYBOARD_SLOT) {
            decoded += self.drain_keyboard()?;
        }
        if readiness.is_ready(POINTER_SLOT) {
            decoded += self.drain_pointer()?;
        }

        self.phase = LoopPhase::Dispatching;
        let (dispatched, skipped) = self.dispatch()?;

        self.phase = LoopPhase::Idle;
        self.context.record_cycle(dispatched, skipped);
        tracing::Span::current().record("duration_us", start.elapsed().as_micros() as u64);

        Ok(CycleReport {
            decoded,
            dispatched,
            skipped,
            woken: readiness.woken(),
        })
    }

    /// Run cycles until a fatal error, then log it and abort.
    pub fn run_forever(mut self) -> ! {
        let _span = info_span!("wsrv.loop", input_receiver = %self.input_receiver).entered();
        loop {
            if let Err(err) = self.run_once() {
                error!(error = %err, phase = ?self.phase, "message loop failed");
                std::process::abort();
            }
        }
    }

    fn drain_keyboard(&mut self) -> Result<usize, LoopError> {
        let mut count = 0;
        let mut buf = [0u8; KEYBOARD_PACKET_SIZE];
        while self.keyboard.has_data_available()? {
            self.keyboard.read_packet(&mut buf)?;
            let event = decode_key_packet(buf);
            trace!(key = event.key, press = event.is_press(), "key packet");
            self.context.post(self.input_receiver, Message::Key(event));
            count += 1;
        }
        Ok(count)
    }

    fn drain_pointer(&mut self) -> Result<usize, LoopError> {
        let mut count = 0;
        let mut buf = [0u8; POINTER_PACKET_SIZE];
        let mut more = self.pointer.has_data_available()?;
        while more {
            self.pointer.read_packet(&mut buf)?;
            more = self.pointer.has_data_available()?;
            let (context, receiver) = (&self.context, self.input_receiver);
            self.pointer_decoder.feed_raw(buf, more, |motion| {
                trace!(dx = motion.dx, dy = motion.dy, buttons = ?motion.buttons, "pointer motion");
                context.post(receiver, Message::MouseMove(motion));
                count += 1;
            });
        }
        Ok(count)
    }

    fn dispatch(&mut self) -> Result<(usize, usize), LoopError> {
        let batch = self.context.take_batch();
        if batch.is_empty() {
            return Ok((0, 0));
        }

        let _span = debug_span!(
            "wsrv.loop.dispatch",
            batch = batch.len(),
            duration_us = tracing::field::Empty
        )
        .entered();
        let start = Instant::now();

        let (mut dispatched, mut skipped) = (0, 0);
        for QueuedMessage { receiver, message } in batch {
            match self.context.resolve(receiver) {
                Resolution::Live(target) => {
                    trace!(receiver = %receiver, kind = message.name(), "dispatch");
                    target.handle(message);
                    dispatched += 1;
                }
                Resolution::Retired => {
                    debug!(receiver = %receiver, kind = message.name(), "receiver retired, message dropped");
                    skipped += 1;
                }
                Resolution::Unknown => {
                    return Err(LoopError::MissingReceiver {
                        receiver,
                        kind: message.kind(),
                    });
                }
            }
        }

        tracing::Span::current().record("duration_us", start.elapsed().as_micros() as u64);
        Ok((dispatched, skipped))
    }
}
