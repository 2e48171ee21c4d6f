//! Keyboard Event Translation
//!
//! Maps symbolic key identifiers (X11 keysyms), optionally paired with a
//! hardware code, to session-engine scancode or Unicode input events.
//!
//! Two paths exist:
//!
//! - **Direct**: the client supplied a hardware code. The code is
//!   forwarded as-is, after running CapsLock inference: the remote lock
//!   state cannot be queried, so it is derived from the case of letter
//!   keysyms versus the observed Shift state. The first inferred change
//!   is synchronized with a direct state set; later changes are replayed
//!   as a virtual CapsLock press-pause-release, because the direct set is
//!   only reliable once.
//! - **Advanced**: no hardware code. A static keysym table is consulted
//!   first; uppercase letters held together with Ctrl or Alt are remapped
//!   to their lowercase scancode and remembered so the matching release
//!   uses the same remapping; everything else falls back to a Unicode
//!   character event. Unmapped keys never error.

use crate::engine::{Result, SessionInput};
use crate::input::keymap::{self, keysym, ScanCode, SCANCODE_CAPSLOCK};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Per-session keyboard state: pressed keys, combined-modifier remaps,
/// and the inferred CapsLock state.
#[derive(Debug, Default)]
pub struct KeyboardTranslator {
    pressed: HashSet<u32>,
    combined: HashSet<u32>,
    caps_locked: bool,
    caps_synced: bool,
}

impl KeyboardTranslator {
    /// Create a translator with no keys pressed and CapsLock assumed off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one key event and inject the result into the session.
    ///
    /// `scancode` is the hardware code if the client supplied one
    /// (direct path); `None` selects the advanced path.
    pub fn key_event(
        &mut self,
        input: &mut dyn SessionInput,
        keysym: u32,
        scancode: Option<ScanCode>,
        down: bool,
    ) -> Result<()> {
        if down {
            self.pressed.insert(keysym);
        } else {
            self.pressed.remove(&keysym);
        }

        match scancode {
            Some(code) => self.direct(input, keysym, code, down),
            None => self.advanced(input, keysym, down),
        }
    }

    /// True while either Shift key is held.
    fn shift_held(&self) -> bool {
        self.pressed.contains(&keysym::XK_SHIFT_L) || self.pressed.contains(&keysym::XK_SHIFT_R)
    }

    fn direct(
        &mut self,
        input: &mut dyn SessionInput,
        keysym: u32,
        code: ScanCode,
        down: bool,
    ) -> Result<()> {
        self.infer_caps_lock(input, keysym)?;
        trace!(keysym, ?code, down, "direct key event");
        input.send_scancode(code, down)
    }

    /// CapsLock inference: an uppercase letter without Shift, or a
    /// lowercase letter with Shift, means the lock is on; the
    /// complementary pairs mean it is off. Non-letter keysyms leave the
    /// state untouched.
    fn infer_caps_lock(&mut self, input: &mut dyn SessionInput, keysym: u32) -> Result<()> {
        let shift = self.shift_held();
        let uppercase = (0x41..=0x5a).contains(&keysym);
        let lowercase = (0x61..=0x7a).contains(&keysym);

        let new_state = if (uppercase && !shift) || (lowercase && shift) {
            true
        } else if (uppercase && shift) || (lowercase && !shift) {
            false
        } else {
            self.caps_locked
        };

        if new_state != self.caps_locked {
            if !self.caps_synced {
                // The direct lock-state set is only reliable the first
                // time; afterwards the remote side owns the toggle.
                debug!(caps = new_state, "synchronizing CapsLock state");
                input.send_synchronize(new_state)?;
                self.caps_synced = true;
            } else {
                debug!(caps = new_state, "toggling CapsLock with virtual key");
                input.send_scancode(SCANCODE_CAPSLOCK, true)?;
                input.send_pause()?;
                input.send_scancode(SCANCODE_CAPSLOCK, false)?;
            }
        }
        self.caps_locked = new_state;
        Ok(())
    }

    fn advanced(&mut self, input: &mut dyn SessionInput, keysym: u32, down: bool) -> Result<()> {
        if let Some(code) = keymap::scancode_for_keysym(keysym) {
            trace!(keysym, ?code, down, "advanced key event (table)");
            return input.send_scancode(code, down);
        }

        let uppercase = (0x41..=0x5a).contains(&keysym);

        // Shifted letter shortcuts: Ctrl/Alt+Shift+letter arrives as an
        // uppercase keysym with no table entry. Remap to the lowercase
        // scancode and remember the remap so the release matches even if
        // the modifier was dropped first.
        if down && uppercase && self.modifier_combo_held() {
            self.combined.insert(keysym);
            if let Some(code) = keymap::scancode_for_keysym(keysym - 0x41 + 0x61) {
                trace!(keysym, ?code, "combined-modifier press remap");
                return input.send_scancode(code, true);
            }
            return Ok(());
        }
        if !down && uppercase && self.combined.remove(&keysym) {
            if let Some(code) = keymap::scancode_for_keysym(keysym - 0x41 + 0x61) {
                trace!(keysym, ?code, "combined-modifier release remap");
                return input.send_scancode(code, false);
            }
            return Ok(());
        }

        // Unmapped keys fall back to Unicode input; keys carrying no
        // character are dropped silently.
        match keymap::keysym_to_char(keysym) {
            Some(ch) => {
                trace!(keysym, %ch, down, "unicode key event");
                input.send_unicode(ch, down)
            }
            None => Ok(()),
        }
    }

    fn modifier_combo_held(&self) -> bool {
        self.pressed.contains(&keysym::XK_CONTROL_L)
            || self.pressed.contains(&keysym::XK_CONTROL_R)
            || self.pressed.contains(&keysym::XK_ALT_L)
            || self.pressed.contains(&keysym::XK_ALT_R)
    }
}
