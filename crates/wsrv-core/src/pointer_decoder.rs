#![forbid(unsafe_code)]

//! PS/2 pointer packet decoding with motion accumulation.
//!
//! A pointer device delivers fixed 3-byte packets:
//!
//! | Byte | Contents |
//! |------|----------|
//! | 0    | status: bit 0 left, bit 1 right, bit 2 middle, bit 3 always set, bit 4 x sign, bit 5 y sign |
//! | 1    | x movement, low 8 bits |
//! | 2    | y movement, low 8 bits |
//!
//! The sign bits are the ninth bit of a 9-bit two's complement delta. The
//! device reports y growing upward; decoded `dy` grows downward.
//!
//! During fast motion the device produces hundreds of packets per second.
//! [`PointerDecoder`] folds consecutive packets with unchanged buttons into
//! one [`MouseMove`]. A drain produces at most one message per run of equal
//! button state rather than one per packet.

use crate::event::{MouseButtons, MouseMove};

/// Size of one pointer packet in bytes.
pub const POINTER_PACKET_SIZE: usize = 3;

const STATUS_LEFT: u8 = 0x01;
const STATUS_RIGHT: u8 = 0x02;
const STATUS_MIDDLE: u8 = 0x04;

/// One decoded packet: button state plus signed motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerPacket {
    /// Buttons held.
    pub buttons: MouseButtons,
    /// Horizontal delta.
    pub dx: i32,
    /// Vertical delta, positive = down.
    pub dy: i32,
}

/// Decode a raw packet.
///
/// Bit 4 of the status byte extends the sign of `dx`, bit 5 the sign of the
/// device's y. A zero movement byte decodes to zero regardless of its sign
/// bit.
#[must_use]
pub fn decode_packet(raw: [u8; POINTER_PACKET_SIZE]) -> PointerPacket {
    let [status, x, y] = raw;
    let status = i32::from(status);

    let dx = if x != 0 {
        i32::from(x) - ((status << 4) & 0x100)
    } else {
        0
    };
    let dy = if y != 0 {
        ((status << 3) & 0x100) - i32::from(y)
    } else {
        0
    };

    PointerPacket {
        buttons: buttons_from_status(raw[0]),
        dx,
        dy,
    }
}

fn buttons_from_status(status: u8) -> MouseButtons {
    let mut buttons = MouseButtons::empty();
    buttons.set(MouseButtons::LEFT, status & STATUS_LEFT != 0);
    buttons.set(MouseButtons::RIGHT, status & STATUS_RIGHT != 0);
    buttons.set(MouseButtons::MIDDLE, status & STATUS_MIDDLE != 0);
    buttons
}

/// Stateful accumulator turning a packet stream into [`MouseMove`] messages.
///
/// The decoder remembers the last reported button state across drains, so a
/// transition is detected even when the packets straddle two loop cycles.
#[derive(Debug, Clone, Default)]
pub struct PointerDecoder {
    buttons: MouseButtons,
    pending: Option<Accumulated>,
}

#[derive(Debug, Clone, Copy)]
struct Accumulated {
    dx: i32,
    dy: i32,
    packets: u32,
}

impl PointerDecoder {
    /// Create a decoder with all buttons released.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Button state after the most recent packet.
    #[must_use]
    pub const fn buttons(&self) -> MouseButtons {
        self.buttons
    }

    /// Number of packets folded into the pending motion.
    #[must_use]
    pub fn pending_packets(&self) -> u32 {
        self.pending.map_or(0, |acc| acc.packets)
    }

    /// Feed one decoded packet.
    ///
    /// `more_available` is whether the device has further data queued right
    /// now. Emits zero, one or two messages:
    ///
    /// - On a button transition, motion accumulated under the old state is
    ///   emitted first, and the transition packet starts a new accumulation
    ///   that keeps absorbing packets with the same buttons.
    /// - The accumulation is emitted once the device has nothing more to read.
    pub fn feed(
        &mut self,
        packet: PointerPacket,
        more_available: bool,
        mut emit: impl FnMut(MouseMove),
    ) {
        let changed = packet.buttons != self.buttons;
        if changed {
            self.flush(&mut emit);
        }

        let acc = self.pending.get_or_insert(Accumulated {
            dx: 0,
            dy: 0,
            packets: 0,
        });
        acc.dx = acc.dx.saturating_add(packet.dx);
        acc.dy = acc.dy.saturating_add(packet.dy);
        acc.packets += 1;
        self.buttons = packet.buttons;

        if !more_available {
            self.flush(&mut emit);
        }
    }

    /// Decode and feed a raw packet. See [`PointerDecoder::feed`].
    pub fn feed_raw(
        &mut self,
        raw: [u8; POINTER_PACKET_SIZE],
        more_available: bool,
        emit: impl FnMut(MouseMove),
    ) {
        self.feed(decode_packet(raw), more_available, emit);
    }

    /// Emit any pending accumulated motion with the current button state.
    pub fn flush(&mut self, mut emit: impl FnMut(MouseMove)) {
        if let Some(acc) = self.pending.take() {
            emit(MouseMove::new(acc.dx, acc.dy, self.buttons));
        }
    }
}
