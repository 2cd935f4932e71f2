//! Reset, [NMI](https://www.nesdev.org/wiki/NMI) and IRQ entry.
//!
//! BRK shares the IRQ vector but is an instruction; see `execute.rs`.

use crate::{
    bus::Bus,
    cpu::{
        addressing::read_vector,
        cpu::{CPU, Step},
        flags::{FLAG_BREAK, FLAG_INTERRUPT_DISABLE, FLAG_UNUSED},
        registers::Registers,
        scheduler::Scheduler,
    },
};

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Cycles charged for the reset sequence and for any interrupt entry.
pub const INTERRUPT_CYCLES: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Nmi,
    Irq,
}

impl Interrupt {
    pub fn vector(self) -> u16 {
        match self {
            Interrupt::Nmi => NMI_VECTOR,
            Interrupt::Irq => IRQ_VECTOR,
        }
    }
}

impl<B: Bus> CPU<B> {
    /// Power-on / reset: PC from $FFFC, S = $FD, I and unused set, 7 cycles elapsed.
    pub fn reset(&mut self) {
        self.regs = Registers::power_on(read_vector(&mut self.bus, RESET_VECTOR));
        self.scheduler = Scheduler::new(INTERRUPT_CYCLES as u64);

        log::debug!("reset: PC=${:04X}", self.regs.pc);
    }

    /// Hardware interrupt entry. The caller has already checked the I flag for IRQ.
    pub(crate) fn interrupt(&mut self, kind: Interrupt) -> Step {
        self.push_word(self.regs.pc);
        let status = (self.regs.status() & !FLAG_BREAK) | FLAG_UNUSED;
        self.push(status);
        self.regs.set_flag(FLAG_INTERRUPT_DISABLE, true);
        self.regs.pc = read_vector(&mut self.bus, kind.vector());

        log::debug!("{kind:?} -> ${:04X}", self.regs.pc);

        Step::Interrupt {
            kind,
            cycles: INTERRUPT_CYCLES,
        }
    }
}
