use crate::interrupts::{Interrupt, InterruptController};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    /// (is_dpad, bit in the low nibble of P1)
    fn line(self) -> (bool, u8) {
        match self {
            Button::Right => (true, 0x01),
            Button::Left => (true, 0x02),
            Button::Up => (true, 0x04),
            Button::Down => (true, 0x08),
            Button::A => (false, 0x01),
            Button::B => (false, 0x02),
            Button::Select => (false, 0x04),
            Button::Start => (false, 0x08),
        }
    }
}

/// P1/JOYP (0xFF00). Pressed buttons are stored as 1 bits and inverted on
/// read, since the hardware lines are active low.
#[derive(Debug, Clone)]
pub struct Joypad {
    select: u8,
    dpad: u8,
    buttons: u8,
}

impl Joypad {
    pub fn new() -> Self {
        Self {
            select: 0x30,
            dpad: 0,
            buttons: 0,
        }
    }

    pub fn read(&self) -> u8 {
        // Bits 7-6 always read as 1.
        let mut low = 0x0F;
        if self.select & 0x10 == 0 {
            low &= !self.dpad & 0x0F;
        }
        if self.select & 0x20 == 0 {
            low &= !self.buttons & 0x0F;
        }
        0xC0 | self.select | low
    }

    pub fn write(&mut self, val: u8) {
        // Only the two select lines are writable.
        self.select = val & 0x30;
    }

    /// Update a button from the host. A press requests the joypad interrupt.
    pub fn set_button(
        &mut self,
        button: Button,
        pressed: bool,
        interrupts: &mut InterruptController,
    ) {
        let (dpad, bit) = button.line();
        let group = if dpad {
            &mut self.dpad
        } else {
            &mut self.buttons
        };
        let was_pressed = *group & bit != 0;
        if pressed {
            *group |= bit;
        } else {
            *group &= !bit;
        }
        if pressed && !was_pressed {
            interrupts.request(Interrupt::Joypad);
        }
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_group_reads_active_low() {
        let mut ic = InterruptController::new();
        let mut pad = Joypad::new();
        pad.set_button(Button::Start, true, &mut ic);
        pad.set_button(Button::Left, true, &mut ic);
        assert!(ic.is_requested(Interrupt::Joypad));

        pad.write(0x10);
        assert_eq!(pad.read(), 0xD7);
        pad.write(0x20);
        assert_eq!(pad.read(), 0xED);
        pad.write(0x30);
        assert_eq!(pad.read(), 0xFF);
    }
}
