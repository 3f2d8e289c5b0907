#![forbid(unsafe_code)]

//! wsrv Runtime
//!
//! The window server's central message loop: a single loop thread that
//! waits on the keyboard and pointer devices, decodes what they deliver,
//! and dispatches queued messages to registered receivers.
//!
//! # Key Components
//!
//! - [`LoopContext`] - Shared queue, receiver registry and wake pipe
//! - [`EventLoop`] - Wait, drain and dispatch cycle over two devices
//! - [`Receiver`] - Trait for message targets
//! - [`MessageQueue`] - Pending messages with region coalescing
//! - [`WakePipe`] - Self-pipe that interrupts a blocked wait
//! - [`LoopConfig`] - Device paths with environment overrides
//!
//! # How it fits in the system
//! `wsrv-core` defines messages and packet decoders. This crate owns every
//! blocking call and every lock. Producers on any thread hold an
//! `Arc<LoopContext>` and call [`LoopContext::post`]; exactly one thread
//! runs [`EventLoop::run_forever`].

pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod event_loop;
pub mod message_queue;
pub mod receiver;
pub mod wake;

pub use config::LoopConfig;
pub use context::{LoopContext, LoopStats};
pub use device::{DeviceKind, FdDevice, InputDevice};
pub use error::{DeviceError, LoopError};
pub use event_loop::{CycleReport, EventLoop, LoopPhase};
pub use message_queue::{Enqueued, MessageQueue, QueuedMessage};
pub use receiver::{Receiver, ReceiverId, ReceiverRegistry, Resolution};
pub use wake::{Readiness, WaitTimeout, WakePipe};

pub use wsrv_core::event::{
    KeyEvent, KeyEventKind, Message, MessageKind, Modifiers, MouseButtons, MouseMove,
};
pub use wsrv_core::geometry::Rect;
