#![forbid(unsafe_code)]

//! Keyboard packet decoding.
//!
//! The keyboard device delivers one fixed 3-byte packet per key transition:
//! `[key, character, flags]`. Every packet is significant on its own, so
//! there is no accumulation here, unlike [`crate::pointer_decoder`].

use crate::event::{KeyEvent, KeyEventKind, Modifiers};

/// Size of one keyboard packet in bytes.
pub const KEYBOARD_PACKET_SIZE: usize = 3;

/// Flag bits of the third packet byte.
pub mod flags {
    /// Alt held.
    pub const ALT: u8 = 0x01;
    /// Ctrl held.
    pub const CTRL: u8 = 0x02;
    /// Shift held.
    pub const SHIFT: u8 = 0x04;
    /// Set on press, clear on release.
    pub const PRESS: u8 = 0x80;
}

/// Decode a raw keyboard packet into a [`KeyEvent`].
///
/// A zero character byte means the key produces no character (modifiers,
/// function keys, arrows).
#[must_use]
pub fn decode_key_packet(raw: [u8; KEYBOARD_PACKET_SIZE]) -> KeyEvent {
    let [key, character, bits] = raw;

    let mut modifiers = Modifiers::NONE;
    modifiers.set(Modifiers::ALT, bits & flags::ALT != 0);
    modifiers.set(Modifiers::CTRL, bits & flags::CTRL != 0);
    modifiers.set(Modifiers::SHIFT, bits & flags::SHIFT != 0);

    KeyEvent {
        key,
        character: (character != 0).then(|| char::from(character)),
        modifiers,
        kind: if bits & flags::PRESS != 0 {
            KeyEventKind::Press
        } else {
            KeyEventKind::Release
        },
    }
}
