use crate::interrupts::{Interrupt, InterruptController};

/// Base cycles per shifted bit at 8192 Hz.
const BIT_CYCLES: u16 = 128;
/// CGB high-speed serial clock (262144 Hz).
const FAST_BIT_CYCLES: u16 = 4;

/// SB/SC registers with no cable attached: an internally clocked transfer
/// shifts out SB, shifts in 1s (the line idles high), and raises the serial
/// interrupt after eight bits. Sent bytes are captured for the host.
pub struct Serial {
    sb: u8,
    sc: u8,
    cgb: bool,
    transfer: Option<Transfer>,
    out_buf: Vec<u8>,
}

struct Transfer {
    outgoing: u8,
    remaining_bits: u8,
    bit_cycles: u16,
    countdown: u16,
}

impl Serial {
    pub fn new(cgb: bool) -> Self {
        Self {
            sb: 0,
            sc: if cgb { 0x7F } else { 0x7E },
            cgb,
            transfer: None,
            out_buf: Vec::new(),
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF01 => self.sb,
            0xFF02 => {
                if self.cgb {
                    self.sc | 0x7C
                } else {
                    self.sc | 0x7E
                }
            }
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF01 => self.sb = val,
            0xFF02 => {
                self.sc = val;
                let start = val & 0x81 == 0x81;
                if !start {
                    // External clock with no partner never completes.
                    self.transfer = None;
                    return;
                }
                let fast = self.cgb && val & 0x02 != 0;
                let bit_cycles = if fast { FAST_BIT_CYCLES } else { BIT_CYCLES };
                self.transfer = Some(Transfer {
                    outgoing: self.sb,
                    remaining_bits: 8,
                    bit_cycles,
                    countdown: bit_cycles,
                });
            }
            _ => {}
        }
    }

    /// Advance one base machine cycle.
    pub fn step(&mut self, interrupts: &mut InterruptController) {
        let Some(transfer) = self.transfer.as_mut() else {
            return;
        };
        transfer.countdown -= 1;
        if transfer.countdown > 0 {
            return;
        }
        self.sb = (self.sb << 1) | 0x01;
        transfer.remaining_bits -= 1;
        transfer.countdown = transfer.bit_cycles;
        if transfer.remaining_bits == 0 {
            self.out_buf.push(transfer.outgoing);
            self.transfer = None;
            self.sc &= 0x7F;
            interrupts.request(Interrupt::Serial);
        }
    }

    /// Drain the bytes sent since the last call.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out_buf)
    }

    pub fn peek_output(&self) -> &[u8] {
        &self.out_buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_transfer_takes_1024_cycles() {
        let mut ic = InterruptController::new();
        let mut serial = Serial::new(false);
        serial.write(0xFF01, b'A');
        serial.write(0xFF02, 0x81);
        for _ in 0..1023 {
            serial.step(&mut ic);
        }
        assert!(!ic.is_requested(Interrupt::Serial));
        serial.step(&mut ic);
        assert!(ic.is_requested(Interrupt::Serial));
        assert_eq!(serial.read(0xFF01), 0xFF);
        assert_eq!(serial.read(0xFF02) & 0x80, 0);
        assert_eq!(serial.take_output(), b"A");
        assert!(serial.peek_output().is_empty());
    }

    #[test]
    fn external_clock_never_completes() {
        let mut ic = InterruptController::new();
        let mut serial = Serial::new(false);
        serial.write(0xFF02, 0x80);
        for _ in 0..4096 {
            serial.step(&mut ic);
        }
        assert!(!ic.is_requested(Interrupt::Serial));
    }
}
