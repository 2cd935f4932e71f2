//! nestest-style rendering of [`TraceRecord`]s.
//!
//! ```text
//! C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD CYC:7
//! ```

use std::fmt;
use std::io::Write;

use crate::cpu::opcodes::AddressingMode;
use crate::cpu::trace::TraceRecord;
use crate::diagnostics::DiagnosticSink;

impl TraceRecord {
    /// Mnemonic plus operand, e.g. `LDA ($80),Y = 0200 @ 0205 = 5A`.
    pub fn disassembly(&self) -> String {
        use AddressingMode::*;

        let addr = self.address.unwrap_or_default();
        let op8 = self.operand[0];
        let op16 = u16::from_le_bytes(self.operand);
        let mut text = match self.mode {
            Implicit | Illegal => String::new(),
            Accumulator => "A".to_string(),
            Immediate => format!("#${op8:02X}"),
            Relative => format!("${:04X}", self.branch_target()),
            ZeroPage => format!("${op8:02X}"),
            Absolute => format!("${op16:04X}"),
            Indirect => format!("(${op16:04X}) = {addr:04X}"),
            ZeroPageX => format!("${op8:02X},X @ {addr:02X}"),
            ZeroPageY => format!("${op8:02X},Y @ {addr:02X}"),
            AbsoluteX => format!("${op16:04X},X @ {addr:04X}"),
            AbsoluteY => format!("${op16:04X},Y @ {addr:04X}"),
            IndexedIndirect => format!(
                "(${op8:02X},X) @ {:02X} = {addr:04X}",
                op8.wrapping_add(self.x)
            ),
            IndirectIndexed => format!(
                "(${op8:02X}),Y = {:04X} @ {addr:04X}",
                addr.wrapping_sub(self.y as u16)
            ),
        };
        if let Some(value) = self.memory {
            text.push_str(&format!(" = {value:02X}"));
        }

        if text.is_empty() {
            self.instruction.to_string()
        } else {
            format!("{} {text}", self.instruction)
        }
    }
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes: Vec<String> = std::iter::once(self.opcode)
            .chain(self.operand_bytes().iter().copied())
            .map(|b| format!("{b:02X}"))
            .collect();

        write!(
            f,
            "{:04X}  {:<8}  {:<32}A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            self.pc,
            bytes.join(" "),
            self.disassembly(),
            self.a,
            self.x,
            self.y,
            self.p,
            self.sp,
            self.cycles
        )
    }
}

/// Writes one rendered line per trace record; warnings go to `log`.
pub struct TraceWriter<W: Write> {
    out: W,
}

impl<W: Write> TraceWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DiagnosticSink for TraceWriter<W> {
    fn warn(&mut self, message: fmt::Arguments<'_>) {
        log::warn!("{message}");
    }

    fn trace(&mut self, record: &TraceRecord) {
        if let Err(e) = writeln!(self.out, "{record}") {
            log::error!("trace output failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::opcodes::{Instruction, decode};

    fn record(opcode: u8, operand: &[u8]) -> TraceRecord {
        let (instruction, mode) = decode(opcode);
        let mut bytes = [0; 2];
        bytes[..operand.len()].copy_from_slice(operand);
        TraceRecord {
            pc: 0xC000,
            opcode,
            operand: bytes,
            operand_len: operand.len() as u8,
            instruction,
            mode,
            address: None,
            memory: None,
            a: 0,
            x: 0,
            y: 0,
            p: 0x24,
            sp: 0xFD,
            cycles: 7,
        }
    }

    #[test]
    fn renders_nestest_first_line() {
        let mut rec = record(0x4C, &[0xF5, 0xC5]);
        rec.address = Some(0xC5F5);
        assert_eq!(
            rec.to_string(),
            "C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD CYC:7"
        );
    }

    #[test]
    fn renders_memory_operand() {
        let mut rec = record(0x86, &[0x00]);
        rec.address = Some(0x0000);
        rec.memory = Some(0x00);
        assert_eq!(rec.disassembly(), "STX $00 = 00");
    }

    #[test]
    fn renders_indirect_indexed() {
        let mut rec = record(0xB1, &[0x89]);
        rec.y = 0x34;
        rec.address = Some(0x0334);
        rec.memory = Some(0xA3);
        assert_eq!(rec.disassembly(), "LDA ($89),Y = 0300 @ 0334 = A3");
    }

    #[test]
    fn renders_branch_target_and_implied() {
        let rec = record(0xD0, &[0xFD]);
        assert_eq!(rec.disassembly(), "BNE $BFFF");

        let rec = record(0xEA, &[]);
        assert_eq!(rec.instruction, Instruction::NOP);
        assert_eq!(rec.disassembly(), "NOP");
    }

    #[test]
    fn writer_emits_one_line_per_record() {
        let mut writer = TraceWriter::new(Vec::new());
        writer.trace(&record(0xEA, &[]));
        writer.trace(&record(0xEA, &[]));
        let out = String::from_utf8(writer.into_inner()).expect("utf8");
        assert_eq!(out.lines().count(), 2);
        assert!(out.starts_with("C000  EA        NOP"));
    }
}
