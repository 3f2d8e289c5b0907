#![forbid(unsafe_code)]

//! Canonical message types.
//!
//! Every unit of work the loop delivers is a [`Message`]. Decoders produce
//! [`Message::Key`] and [`Message::MouseMove`]; the window manager and other
//! in-process posters produce [`Message::Invalidate`] and [`Message::Paint`].
//!
//! # Design Notes
//!
//! - Regions use [`Rect`]; an empty rect means "the whole surface"
//! - `Modifiers` and `MouseButtons` use bitflags for easy combination
//! - Messages are moved, never shared: the queue owns an entry until dispatch

use bitflags::bitflags;

use crate::geometry::Rect;

/// A message addressed to a receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Part of a surface became stale and must be recomputed.
    Invalidate(Rect),

    /// Part of a surface must be repainted.
    Paint(Rect),

    /// A key transition from the keyboard device.
    Key(KeyEvent),

    /// Accumulated pointer motion with the button state at flush time.
    MouseMove(MouseMove),
}

impl Message {
    /// The payload-free discriminant of this message.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Invalidate(_) => MessageKind::Invalidate,
            Self::Paint(_) => MessageKind::Paint,
            Self::Key(_) => MessageKind::Key,
            Self::MouseMove(_) => MessageKind::MouseMove,
        }
    }

    /// Short stable name, used in log fields.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// The region of an `Invalidate` or `Paint` message.
    #[must_use]
    pub const fn region(&self) -> Option<Rect> {
        match self {
            Self::Invalidate(rect) | Self::Paint(rect) => Some(*rect),
            Self::Key(_) | Self::MouseMove(_) => None,
        }
    }
}

/// Message discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// See [`Message::Invalidate`].
    Invalidate,
    /// See [`Message::Paint`].
    Paint,
    /// See [`Message::Key`].
    Key,
    /// See [`Message::MouseMove`].
    MouseMove,
}

impl MessageKind {
    /// Short stable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Invalidate => "Invalidate",
            Self::Paint => "Paint",
            Self::Key => "Key",
            Self::MouseMove => "MouseMove",
        }
    }

    /// Whether pending messages of this kind can swallow later ones.
    #[must_use]
    pub const fn is_region_coalescable(self) -> bool {
        matches!(self, Self::Invalidate | Self::Paint)
    }
}

impl From<KeyEvent> for Message {
    fn from(event: KeyEvent) -> Self {
        Self::Key(event)
    }
}

impl From<MouseMove> for Message {
    fn from(motion: MouseMove) -> Self {
        Self::MouseMove(motion)
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Device key code.
    pub key: u8,

    /// Character produced by the key under the current layout, if any.
    pub character: Option<char>,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// Press or release.
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a key press with no character and no modifiers.
    #[must_use]
    pub const fn new(key: u8) -> Self {
        Self {
            key,
            character: None,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Attach the produced character.
    #[must_use]
    pub const fn with_character(mut self, character: char) -> Self {
        self.character = Some(character);
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a press.
    #[must_use]
    pub const fn is_press(&self) -> bool {
        matches!(self.kind, KeyEventKind::Press)
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Alt modifier is held.
    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed.
    #[default]
    Press,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Alt key.
        const ALT   = 0b0001;
        /// Control key.
        const CTRL  = 0b0010;
        /// Shift key.
        const SHIFT = 0b0100;
    }
}

bitflags! {
    /// Pointer buttons held down.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MouseButtons: u8 {
        /// Left button.
        const LEFT   = 0b0001;
        /// Right button.
        const RIGHT  = 0b0010;
        /// Middle button.
        const MIDDLE = 0b0100;
    }
}

/// Relative pointer motion.
///
/// `dy` grows downward (screen convention), which is the inverse of the
/// device's own sign convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseMove {
    /// Horizontal delta.
    pub dx: i32,
    /// Vertical delta, positive = down.
    pub dy: i32,
    /// Buttons held at the end of the accumulated motion.
    pub buttons: MouseButtons,
}

impl MouseMove {
    /// Create a motion message.
    #[must_use]
    pub const fn new(dx: i32, dy: i32, buttons: MouseButtons) -> Self {
        Self { dx, dy, buttons }
    }

    /// Check if the left button is held.
    #[must_use]
    pub const fn left(&self) -> bool {
        self.buttons.contains(MouseButtons::LEFT)
    }

    /// Check if the right button is held.
    #[must_use]
    pub const fn right(&self) -> bool {
        self.buttons.contains(MouseButtons::RIGHT)
    }
}
