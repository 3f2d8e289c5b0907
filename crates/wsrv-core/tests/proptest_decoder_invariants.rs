//! Property-based invariant tests for regions and device decoders.
//!
//! 1. Containment is reflexive.
//! 2. Containment is transitive.
//! 3. An empty rect (whole surface) contains every rect and is contained
//!    only by another empty rect.
//! 4. Pointer accumulation conserves total motion.
//! 5. Pointer accumulation emits at most one message per button transition
//!    plus the final flush.
//! 6. N keyboard packets decode to N key events.

use proptest::prelude::*;
use wsrv_core::event::{KeyEventKind, MouseButtons, MouseMove};
use wsrv_core::geometry::Rect;
use wsrv_core::keyboard_decoder::{decode_key_packet, flags};
use wsrv_core::pointer_decoder::{PointerDecoder, PointerPacket, decode_packet};

// ── Helpers ─────────────────────────────────────────────────────────────

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (-500i32..=500, -500i32..=500, 0i32..=500, 0i32..=500)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn packet_strategy() -> impl Strategy<Value = [u8; 3]> {
    (0u8..4, any::<u8>(), any::<u8>(), any::<bool>(), any::<bool>()).prop_map(
        |(buttons, x, y, x_sign, y_sign)| {
            let mut status = 0x08 | buttons;
            if x_sign {
                status |= 0x10;
            }
            if y_sign {
                status |= 0x20;
            }
            [status, x, y]
        },
    )
}

// ═════════════════════════════════════════════════════════════════════════
// 1–3. Containment
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn containment_reflexive(a in rect_strategy()) {
        prop_assert!(a.contains_rect(&a), "{:?} should contain itself", a);
    }

    #[test]
    fn containment_transitive(a in rect_strategy(), b in rect_strategy(), c in rect_strategy()) {
        if a.contains_rect(&b) && b.contains_rect(&c) {
            prop_assert!(a.contains_rect(&c), "a={:?} b={:?} c={:?}", a, b, c);
        }
    }

    #[test]
    fn whole_surface_contained_only_by_empty(a in rect_strategy(), x in -10i32..10, y in -10i32..10) {
        let surface = Rect::new(x, y, 0, 0);
        prop_assert_eq!(a.contains_rect(&surface), a.is_empty(), "{:?}", a);
        prop_assert!(surface.contains_rect(&a));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4–5. Pointer accumulation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn accumulation_conserves_motion(packets in prop::collection::vec(packet_strategy(), 1..64)) {
        let decoded: Vec<PointerPacket> = packets.iter().copied().map(decode_packet).collect();
        let mut decoder = PointerDecoder::new();
        let mut out: Vec<MouseMove> = Vec::new();
        let last = packets.len() - 1;
        for (i, raw) in packets.iter().enumerate() {
            decoder.feed_raw(*raw, i != last, |m| out.push(m));
        }

        let want_dx: i32 = decoded.iter().map(|p| p.dx).sum();
        let want_dy: i32 = decoded.iter().map(|p| p.dy).sum();
        prop_assert_eq!(out.iter().map(|m| m.dx).sum::<i32>(), want_dx);
        prop_assert_eq!(out.iter().map(|m| m.dy).sum::<i32>(), want_dy);
        prop_assert_eq!(decoder.pending_packets(), 0);
    }

    #[test]
    fn accumulation_bounded_by_transitions(packets in prop::collection::vec(packet_strategy(), 1..64)) {
        let mut decoder = PointerDecoder::new();
        let mut out: Vec<MouseMove> = Vec::new();
        let mut transitions = 0usize;
        let mut prev = MouseButtons::empty();
        let last = packets.len() - 1;
        for (i, raw) in packets.iter().enumerate() {
            let buttons = decode_packet(*raw).buttons;
            if buttons != prev {
                transitions += 1;
                prev = buttons;
            }
            decoder.feed_raw(*raw, i != last, |m| out.push(m));
        }
        prop_assert!(
            out.len() <= transitions + 1,
            "{} messages for {} transitions",
            out.len(),
            transitions
        );
        prop_assert_eq!(out.last().map(|m| m.buttons), Some(prev));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Keyboard packets are never accumulated
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn key_packets_decode_one_to_one(packets in prop::collection::vec(any::<[u8; 3]>(), 0..128)) {
        let events: Vec<_> = packets.iter().copied().map(decode_key_packet).collect();
        prop_assert_eq!(events.len(), packets.len());
        for (raw, event) in packets.iter().zip(&events) {
            prop_assert_eq!(event.key, raw[0]);
            let pressed = raw[2] & flags::PRESS != 0;
            prop_assert_eq!(event.kind == KeyEventKind::Press, pressed);
        }
    }
}
