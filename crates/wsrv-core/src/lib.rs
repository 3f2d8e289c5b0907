#![forbid(unsafe_code)]

//! Core: message model, regions, and input-device packet decoding.
//!
//! Nothing in this crate performs I/O. The runtime crate reads device
//! packets and feeds them through the decoders defined here.

pub mod event;
pub mod geometry;
pub mod keyboard_decoder;
pub mod pointer_decoder;
