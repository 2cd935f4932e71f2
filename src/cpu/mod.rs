//! 6502 CPU emulation for the NES.
//!
//! Documented instruction set, table-driven decode, nestest-compatible cycle counts.
//! Bus trait used for memory and the interrupt request lines.

pub mod addressing;
pub mod cpu;
mod execute;
pub mod flags;
pub mod interrupts;
pub mod opcodes;
pub mod registers;
pub mod scheduler;
pub mod trace;
