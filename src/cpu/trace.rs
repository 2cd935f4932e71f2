//! Structured per-instruction trace record.
//!
//! Captured after decode and before execution, so registers and the memory
//! operand show the state the instruction starts from (nestest convention).

use crate::cpu::opcodes::{AddressingMode, Instruction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub pc: u16,
    pub opcode: u8,
    pub operand: [u8; 2],
    /// Number of meaningful bytes in `operand` (0-2).
    pub operand_len: u8,
    pub instruction: Instruction,
    pub mode: AddressingMode,
    pub address: Option<u16>,
    /// Byte at `address` before execution, for instructions that touch memory.
    pub memory: Option<u8>,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub sp: u8,
    pub cycles: u64,
}

impl TraceRecord {
    pub fn operand_bytes(&self) -> &[u8] {
        &self.operand[..self.operand_len as usize]
    }

    /// Branch destination for relative-mode records.
    pub fn branch_target(&self) -> u16 {
        let offset = self.operand[0] as i8;
        self.pc.wrapping_add(2).wrapping_add(offset as u16)
    }
}
