#![forbid(unsafe_code)]

//! Input receiver that logs what the loop delivers.
//!
//! Stands in for the window manager: it tracks a cursor position from the
//! accumulated pointer motion and reports every key and button transition.

use std::sync::Mutex;

use tracing::{debug, info, trace};
use wsrv_runtime::{KeyEvent, Message, MouseButtons, MouseMove, Receiver};

/// Cursor position and button state derived from pointer messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorState {
    /// Horizontal position, unclamped.
    pub x: i64,
    /// Vertical position, unclamped; grows downward.
    pub y: i64,
    /// Buttons held as of the last motion message.
    pub buttons: MouseButtons,
}

/// Logs delivered messages and tracks the cursor.
#[derive(Debug, Default)]
pub struct InputLog {
    cursor: Mutex<CursorState>,
}

impl InputLog {
    /// Current cursor state.
    #[cfg(test)]
    pub fn cursor(&self) -> CursorState {
        *self.cursor.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn on_key(&self, key: KeyEvent) {
        info!(
            key = key.key,
            character = ?key.character,
            ctrl = key.ctrl(),
            alt = key.alt(),
            shift = key.shift(),
            press = key.is_press(),
            "key"
        );
    }

    fn on_motion(&self, motion: MouseMove) {
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        cursor.x += i64::from(motion.dx);
        cursor.y += i64::from(motion.dy);
        if motion.buttons != cursor.buttons {
            info!(
                left = motion.left(),
                right = motion.right(),
                buttons = ?motion.buttons,
                x = cursor.x,
                y = cursor.y,
                "pointer buttons"
            );
        }
        cursor.buttons = motion.buttons;
        debug!(dx = motion.dx, dy = motion.dy, x = cursor.x, y = cursor.y, "pointer motion");
    }
}

impl Receiver for InputLog {
    fn handle(&self, message: Message) {
        match message {
            Message::Key(key) => self.on_key(key),
            Message::MouseMove(motion) => self.on_motion(motion),
            Message::Invalidate(region) | Message::Paint(region) => {
                trace!(kind = message.name(), ?region, "surface message");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_follows_motion() {
        let log = InputLog::default();
        log.handle(Message::MouseMove(MouseMove::new(4, -1, MouseButtons::empty())));
        log.handle(Message::MouseMove(MouseMove::new(-10, 3, MouseButtons::LEFT)));
        assert_eq!(
            log.cursor(),
            CursorState {
                x: -6,
                y: 2,
                buttons: MouseButtons::LEFT,
            }
        );
    }

    #[test]
    fn keys_do_not_move_cursor() {
        let log = InputLog::default();
        log.handle(Message::Key(KeyEvent::new(0x1e).with_character('a')));
        assert_eq!(log.cursor(), CursorState::default());
    }
}
