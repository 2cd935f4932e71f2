//! Register file: PC, A, X, Y, S and the packed status byte.
//!
//! Every status write goes through [`Registers::set_status`] or
//! [`Registers::set_flag`], both of which keep [`FLAG_UNUSED`] set.

use crate::cpu::flags::{FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE, FLAG_UNUSED, FLAG_ZERO};

/// Base address of the hardware stack page ($0100-$01FF).
pub const STACK_PAGE: u16 = 0x0100;

/// Stack pointer value after the reset sequence.
pub const RESET_STACK_POINTER: u8 = 0xFD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    status: u8,
}

impl Default for Registers {
    fn default() -> Self {
        Self::power_on(0)
    }
}

impl Registers {
    /// State after the reset sequence: PC from the vector, S = $FD, P = I | unused.
    pub fn power_on(pc: u16) -> Self {
        Self {
            pc,
            a: 0,
            x: 0,
            y: 0,
            sp: RESET_STACK_POINTER,
            status: FLAG_INTERRUPT_DISABLE | FLAG_UNUSED,
        }
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    /// Replace P wholesale. The unused bit is forced on.
    pub fn set_status(&mut self, value: u8) {
        self.status = value | FLAG_UNUSED;
    }

    pub fn flag(&self, flag: u8) -> bool {
        self.status & flag != 0
    }

    pub fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
        self.status |= FLAG_UNUSED;
    }

    /// Carry as the 0/1 value ADC and the rotates shift in.
    pub fn carry_bit(&self) -> u8 {
        self.status & 1
    }

    pub fn update_zero_and_negative_flags(&mut self, value: u8) {
        self.set_flag(FLAG_ZERO, value == 0);
        self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
    }

    /// Absolute address the stack pointer currently refers to.
    pub fn stack_address(&self) -> u16 {
        STACK_PAGE | self.sp as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::flags::{FLAG_BREAK, FLAG_CARRY};

    #[test]
    fn power_on_state() {
        let regs = Registers::power_on(0xC000);
        assert_eq!(regs.pc, 0xC000);
        assert_eq!(regs.sp, 0xFD);
        assert_eq!(regs.status(), 0x24);
        assert_eq!((regs.a, regs.x, regs.y), (0, 0, 0));
    }

    #[test]
    fn unused_bit_survives_every_write() {
        let mut regs = Registers::default();
        regs.set_status(0x00);
        assert_eq!(regs.status(), FLAG_UNUSED);

        regs.set_flag(FLAG_UNUSED, false);
        assert!(regs.flag(FLAG_UNUSED));

        regs.set_flag(FLAG_CARRY, true);
        regs.set_flag(FLAG_BREAK, true);
        assert_eq!(regs.status(), FLAG_UNUSED | FLAG_CARRY | FLAG_BREAK);
    }

    #[test]
    fn zero_and_negative_follow_value() {
        let mut regs = Registers::default();
        regs.update_zero_and_negative_flags(0x00);
        assert!(regs.flag(FLAG_ZERO));
        assert!(!regs.flag(FLAG_NEGATIVE));

        regs.update_zero_and_negative_flags(0x80);
        assert!(!regs.flag(FLAG_ZERO));
        assert!(regs.flag(FLAG_NEGATIVE));
    }

    #[test]
    fn stack_address_is_on_page_one() {
        let regs = Registers::default();
        assert_eq!(regs.stack_address(), 0x01FD);
    }
}
