//! Pointer Event Translation
//!
//! Translates the level-triggered VNC pointer state (absolute position
//! plus a 7-bit button mask resent on every event) into the session
//! engine's edge-triggered press/release/move/wheel events.

use crate::engine::{Result, SessionInput};
use crate::framebuffer::Point;
use bitflags::bitflags;
use tracing::trace;

bitflags! {
    /// The 7-bit VNC button mask. Bits are level-triggered: set while the
    /// button is held, set for exactly one event per wheel click.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ButtonMask: u8 {
        /// Left button
        const LEFT = 1 << 0;
        /// Middle button
        const MIDDLE = 1 << 1;
        /// Right button
        const RIGHT = 1 << 2;
        /// Wheel up
        const WHEEL_UP = 1 << 3;
        /// Wheel down
        const WHEEL_DOWN = 1 << 4;
        /// Wheel left
        const WHEEL_LEFT = 1 << 5;
        /// Wheel right
        const WHEEL_RIGHT = 1 << 6;
    }
}

bitflags! {
    /// RDP pointer event flag word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PointerFlags: u16 {
        /// Wheel rotation is negative
        const WHEEL_NEGATIVE = 0x0100;
        /// Vertical wheel event; low bits carry the rotation
        const WHEEL = 0x0200;
        /// Horizontal wheel event; low bits carry the rotation
        const HWHEEL = 0x0400;
        /// Motion event
        const MOVE = 0x0800;
        /// Button transition is a press
        const DOWN = 0x8000;
        /// Button 1 (left)
        const BUTTON1 = 0x1000;
        /// Button 2 (right)
        const BUTTON2 = 0x2000;
        /// Button 3 (middle)
        const BUTTON3 = 0x4000;
    }
}

/// Mask of the wheel rotation magnitude within the flag word.
pub const WHEEL_ROTATION_MASK: u16 = 0x01ff;

/// Default wheel rotation unit per click.
pub const DEFAULT_WHEEL_ROTATION: u16 = 127;

/// Derives edge-triggered session pointer events from the level-triggered
/// client mask. One instance per session; the previous mask is stored
/// unconditionally after every call.
#[derive(Debug)]
pub struct PointerTranslator {
    last_mask: ButtonMask,
    wheel_rotation: u16,
}

impl PointerTranslator {
    /// Create a translator with the default wheel rotation unit.
    pub fn new() -> Self {
        Self::with_wheel_rotation(DEFAULT_WHEEL_ROTATION)
    }

    /// Create a translator with a specific wheel rotation unit per click.
    pub fn with_wheel_rotation(wheel_rotation: u16) -> Self {
        Self {
            last_mask: ButtonMask::empty(),
            wheel_rotation: wheel_rotation & WHEEL_ROTATION_MASK,
        }
    }

    /// Translate one client pointer event.
    ///
    /// Presses ride on a single move event (plain move when no button
    /// changed), releases follow in a second event, and each wheel
    /// direction that newly appears in the mask produces one wheel event.
    pub fn pointer_event(
        &mut self,
        input: &mut dyn SessionInput,
        pos: Point,
        mask: ButtonMask,
    ) -> Result<()> {
        let pressed = mask - self.last_mask;
        let released = self.last_mask - mask;
        trace!(?pos, ?pressed, ?released, "pointer event");

        // Presses and motion share one event
        let mut flags = PointerFlags::empty();
        if pressed.contains(ButtonMask::LEFT) {
            flags |= PointerFlags::DOWN | PointerFlags::BUTTON1;
        }
        if pressed.contains(ButtonMask::RIGHT) {
            flags |= PointerFlags::DOWN | PointerFlags::BUTTON2;
        }
        if pressed.contains(ButtonMask::MIDDLE) {
            flags |= PointerFlags::DOWN | PointerFlags::BUTTON3;
        }
        if flags.is_empty() {
            flags = PointerFlags::MOVE;
        }
        input.send_mouse(flags, pos)?;

        // Releases
        let mut flags = PointerFlags::empty();
        if released.contains(ButtonMask::LEFT) {
            flags |= PointerFlags::BUTTON1;
        }
        if released.contains(ButtonMask::RIGHT) {
            flags |= PointerFlags::BUTTON2;
        }
        if released.contains(ButtonMask::MIDDLE) {
            flags |= PointerFlags::BUTTON3;
        }
        if !flags.is_empty() {
            input.send_mouse(flags, pos)?;
        }

        // Wheels are momentary: edge-triggered per direction, no release
        if pressed.contains(ButtonMask::WHEEL_UP) {
            input.send_mouse(self.wheel_flags(PointerFlags::WHEEL, false), Point::default())?;
        }
        if pressed.contains(ButtonMask::WHEEL_DOWN) {
            input.send_mouse(self.wheel_flags(PointerFlags::WHEEL, true), Point::default())?;
        }
        if pressed.contains(ButtonMask::WHEEL_LEFT) {
            input.send_mouse(self.wheel_flags(PointerFlags::HWHEEL, false), Point::default())?;
        }
        if pressed.contains(ButtonMask::WHEEL_RIGHT) {
            input.send_mouse(self.wheel_flags(PointerFlags::HWHEEL, true), Point::default())?;
        }

        self.last_mask = mask;
        Ok(())
    }

    /// Forget held buttons, e.g. when the driving client goes away.
    pub fn reset(&mut self) {
        self.last_mask = ButtonMask::empty();
    }

    fn wheel_flags(&self, axis: PointerFlags, negative: bool) -> PointerFlags {
        let rotation = if negative {
            self.wheel_rotation.wrapping_neg() & WHEEL_ROTATION_MASK
        } else {
            self.wheel_rotation & WHEEL_ROTATION_MASK
        };
        let mut flags = axis | PointerFlags::from_bits_retain(rotation);
        if negative {
            flags |= PointerFlags::WHEEL_NEGATIVE;
        }
        flags
    }
}

impl Default for PointerTranslator {
    fn default() -> Self {
        Self::new()
    }
}
