//! Instruction semantics.
//!
//! Each operation mutates registers and memory and returns the conditional
//! cycles it adds on top of the table cost: page-crossing reads, read-modify-
//! write write-back, indexed stores, taken branches.

use crate::{
    bus::Bus,
    cpu::{
        addressing::{Operand, page_crossed, read_vector},
        cpu::CPU,
        flags::{
            FLAG_BREAK, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE,
            FLAG_OVERFLOW, FLAG_UNUSED, FLAG_ZERO,
        },
        interrupts::IRQ_VECTOR,
        opcodes::{AddressingMode, Instruction},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Executed {
    pub extra_cycles: u8,
    /// The instruction set PC itself; the caller must not advance it.
    pub pc_written: bool,
}

impl Executed {
    fn next(extra_cycles: u8) -> Self {
        Self {
            extra_cycles,
            pc_written: false,
        }
    }

    fn jump(extra_cycles: u8) -> Self {
        Self {
            extra_cycles,
            pc_written: true,
        }
    }

    fn branch(extra_cycles: u8) -> Self {
        // Only a taken branch costs extra, and only a taken branch moves PC
        Self {
            extra_cycles,
            pc_written: extra_cycles > 0,
        }
    }
}

/// +1 when an indexed read carried into the next page.
fn read_penalty(operand: &Operand) -> u8 {
    operand.page_crossed as u8
}

/// Write-back cost of a read-modify-write on memory.
fn rmw_penalty(mode: AddressingMode) -> u8 {
    match mode {
        AddressingMode::Accumulator => 0,
        AddressingMode::AbsoluteX => 3,
        _ => 2,
    }
}

/// Indexed stores always pay the fix-up cycle, crossed or not.
fn store_penalty(mode: AddressingMode) -> u8 {
    matches!(
        mode,
        AddressingMode::AbsoluteX | AddressingMode::AbsoluteY | AddressingMode::IndirectIndexed
    ) as u8
}

impl<B: Bus> CPU<B> {
    /// Execute a decoded instruction whose operand has already been resolved.
    /// `Illegal` never gets here; the dispatcher rejects it first.
    pub(crate) fn execute(
        &mut self,
        instruction: Instruction,
        mode: AddressingMode,
        operand: &Operand,
    ) -> Executed {
        use Instruction::*;

        let addr = operand.address.unwrap_or_default();

        match instruction {
            ADC => Executed::next(self.adc(addr, operand)),
            SBC => Executed::next(self.sbc(addr, operand)),
            AND => Executed::next(self.and(addr, operand)),
            ORA => Executed::next(self.ora(addr, operand)),
            EOR => Executed::next(self.eor(addr, operand)),
            BIT => Executed::next(self.bit(addr)),

            ASL => Executed::next(self.asl(mode, addr)),
            LSR => Executed::next(self.lsr(mode, addr)),
            ROL => Executed::next(self.rol(mode, addr)),
            ROR => Executed::next(self.ror(mode, addr)),

            CMP => Executed::next(self.compare(self.regs.a, addr, operand)),
            CPX => Executed::next(self.compare(self.regs.x, addr, operand)),
            CPY => Executed::next(self.compare(self.regs.y, addr, operand)),

            INC => Executed::next(self.inc(mode, addr)),
            DEC => Executed::next(self.dec(mode, addr)),
            INX => Executed::next(self.inx()),
            INY => Executed::next(self.iny()),
            DEX => Executed::next(self.dex()),
            DEY => Executed::next(self.dey()),

            BCC => Executed::branch(self.branch(!self.regs.flag(FLAG_CARRY), addr)),
            BCS => Executed::branch(self.branch(self.regs.flag(FLAG_CARRY), addr)),
            BEQ => Executed::branch(self.branch(self.regs.flag(FLAG_ZERO), addr)),
            BNE => Executed::branch(self.branch(!self.regs.flag(FLAG_ZERO), addr)),
            BMI => Executed::branch(self.branch(self.regs.flag(FLAG_NEGATIVE), addr)),
            BPL => Executed::branch(self.branch(!self.regs.flag(FLAG_NEGATIVE), addr)),
            BVS => Executed::branch(self.branch(self.regs.flag(FLAG_OVERFLOW), addr)),
            BVC => Executed::branch(self.branch(!self.regs.flag(FLAG_OVERFLOW), addr)),

            BRK => Executed::jump(self.brk()),
            JMP => Executed::jump(self.jmp(addr)),
            JSR => Executed::jump(self.jsr(addr, operand)),
            RTS => Executed::jump(self.rts()),
            RTI => Executed::jump(self.rti()),

            PHA => Executed::next(self.pha()),
            PHP => Executed::next(self.php()),
            PLA => Executed::next(self.pla()),
            PLP => Executed::next(self.plp()),

            LDA => Executed::next(self.lda(addr, operand)),
            LDX => Executed::next(self.ldx(addr, operand)),
            LDY => Executed::next(self.ldy(addr, operand)),
            STA => Executed::next(self.store(self.regs.a, mode, addr)),
            STX => Executed::next(self.store(self.regs.x, mode, addr)),
            STY => Executed::next(self.store(self.regs.y, mode, addr)),

            TAX => Executed::next(self.tax()),
            TAY => Executed::next(self.tay()),
            TSX => Executed::next(self.tsx()),
            TXA => Executed::next(self.txa()),
            TXS => Executed::next(self.txs()),
            TYA => Executed::next(self.tya()),

            CLC => Executed::next(self.set_flag_op(FLAG_CARRY, false)),
            CLD => Executed::next(self.set_flag_op(FLAG_DECIMAL, false)),
            CLI => Executed::next(self.set_flag_op(FLAG_INTERRUPT_DISABLE, false)),
            CLV => Executed::next(self.set_flag_op(FLAG_OVERFLOW, false)),
            SEC => Executed::next(self.set_flag_op(FLAG_CARRY, true)),
            SED => Executed::next(self.set_flag_op(FLAG_DECIMAL, true)),
            SEI => Executed::next(self.set_flag_op(FLAG_INTERRUPT_DISABLE, true)),

            NOP | Illegal => Executed::next(0),
        }
    }

    /// A + M + C. Decimal mode is ignored (the 2A03 has no BCD adder).
    fn add_with_carry(&mut self, value: u8) {
        let a = self.regs.a;
        let sum = a as u16 + value as u16 + self.regs.carry_bit() as u16;
        let result = sum as u8;

        self.regs.set_flag(FLAG_CARRY, sum > 0xFF);
        self.regs
            .set_flag(FLAG_OVERFLOW, (!(a ^ value) & (a ^ result) & 0x80) != 0);
        self.regs.a = result;
        self.regs.update_zero_and_negative_flags(result);
    }

    fn adc(&mut self, addr: u16, operand: &Operand) -> u8 {
        let value = self.bus.read(addr);
        self.add_with_carry(value);
        read_penalty(operand)
    }

    fn sbc(&mut self, addr: u16, operand: &Operand) -> u8 {
        // A - M - !C == A + !M + C
        let value = self.bus.read(addr);
        self.add_with_carry(!value);
        read_penalty(operand)
    }

    fn and(&mut self, addr: u16, operand: &Operand) -> u8 {
        self.regs.a &= self.bus.read(addr);
        self.regs.update_zero_and_negative_flags(self.regs.a);
        read_penalty(operand)
    }

    fn ora(&mut self, addr: u16, operand: &Operand) -> u8 {
        self.regs.a |= self.bus.read(addr);
        self.regs.update_zero_and_negative_flags(self.regs.a);
        read_penalty(operand)
    }

    fn eor(&mut self, addr: u16, operand: &Operand) -> u8 {
        self.regs.a ^= self.bus.read(addr);
        self.regs.update_zero_and_negative_flags(self.regs.a);
        read_penalty(operand)
    }

    fn bit(&mut self, addr: u16) -> u8 {
        let value = self.bus.read(addr);
        self.regs.set_flag(FLAG_ZERO, self.regs.a & value == 0);
        self.regs.set_flag(FLAG_OVERFLOW, value & 0x40 != 0);
        self.regs.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
        0
    }

    /// Shared read-modify-write plumbing for the shifts and rotates.
    fn modify(
        &mut self,
        mode: AddressingMode,
        addr: u16,
        op: impl FnOnce(u8, bool) -> (u8, bool),
    ) -> u8 {
        let value = if mode == AddressingMode::Accumulator {
            self.regs.a
        } else {
            self.bus.read(addr)
        };

        let (result, carry) = op(value, self.regs.flag(FLAG_CARRY));
        self.regs.set_flag(FLAG_CARRY, carry);
        self.regs.update_zero_and_negative_flags(result);

        if mode == AddressingMode::Accumulator {
            self.regs.a = result;
        } else {
            self.bus.write(addr, result);
        }
        rmw_penalty(mode)
    }

    fn asl(&mut self, mode: AddressingMode, addr: u16) -> u8 {
        self.modify(mode, addr, |v, _| (v << 1, v & 0x80 != 0))
    }

    fn lsr(&mut self, mode: AddressingMode, addr: u16) -> u8 {
        self.modify(mode, addr, |v, _| (v >> 1, v & 0x01 != 0))
    }

    fn rol(&mut self, mode: AddressingMode, addr: u16) -> u8 {
        self.modify(mode, addr, |v, c| ((v << 1) | c as u8, v & 0x80 != 0))
    }

    fn ror(&mut self, mode: AddressingMode, addr: u16) -> u8 {
        self.modify(mode, addr, |v, c| ((v >> 1) | ((c as u8) << 7), v & 0x01 != 0))
    }

    /// CMP/CPX/CPY: carry is the unsigned >=, Z/N come from the wrapped difference.
    fn compare(&mut self, register: u8, addr: u16, operand: &Operand) -> u8 {
        let value = self.bus.read(addr);
        self.regs.set_flag(FLAG_CARRY, register >= value);
        self.regs
            .update_zero_and_negative_flags(register.wrapping_sub(value));
        read_penalty(operand)
    }

    fn inc(&mut self, mode: AddressingMode, addr: u16) -> u8 {
        let value = self.bus.read(addr).wrapping_add(1);
        self.regs.update_zero_and_negative_flags(value);
        self.bus.write(addr, value);
        (mode == AddressingMode::AbsoluteX) as u8
    }

    fn dec(&mut self, mode: AddressingMode, addr: u16) -> u8 {
        let value = self.bus.read(addr).wrapping_sub(1);
        self.regs.update_zero_and_negative_flags(value);
        self.bus.write(addr, value);
        (mode == AddressingMode::AbsoluteX) as u8
    }

    fn inx(&mut self) -> u8 {
        self.regs.x = self.regs.x.wrapping_add(1);
        self.regs.update_zero_and_negative_flags(self.regs.x);
        0
    }

    fn iny(&mut self) -> u8 {
        self.regs.y = self.regs.y.wrapping_add(1);
        self.regs.update_zero_and_negative_flags(self.regs.y);
        0
    }

    fn dex(&mut self) -> u8 {
        self.regs.x = self.regs.x.wrapping_sub(1);
        self.regs.update_zero_and_negative_flags(self.regs.x);
        0
    }

    fn dey(&mut self) -> u8 {
        self.regs.y = self.regs.y.wrapping_sub(1);
        self.regs.update_zero_and_negative_flags(self.regs.y);
        0
    }

    /// Taken: PC = PC + 2 + offset, +1 cycle, +1 more if the target is on
    /// another page than the branch itself. Not taken: 0.
    fn branch(&mut self, condition: bool, addr: u16) -> u8 {
        if !condition {
            return 0;
        }

        let offset = self.bus.read(addr) as i8;
        let origin = self.regs.pc;
        self.regs.pc = origin.wrapping_add(2).wrapping_add(offset as u16);

        1 + page_crossed(origin, self.regs.pc) as u8
    }

    fn brk(&mut self) -> u8 {
        // Return address skips the padding byte after the opcode
        self.push_word(self.regs.pc.wrapping_add(2));

        let status = self.regs.status() | FLAG_BREAK | FLAG_UNUSED;
        self.push(status);

        self.regs.set_flag(FLAG_BREAK, true);
        self.regs.set_flag(FLAG_INTERRUPT_DISABLE, true);
        self.regs.pc = read_vector(&mut self.bus, IRQ_VECTOR);
        0
    }

    fn jmp(&mut self, addr: u16) -> u8 {
        self.regs.pc = addr;
        0
    }

    fn jsr(&mut self, addr: u16, operand: &Operand) -> u8 {
        // Pushes the address of the JSR's last byte; RTS adds the 1 back
        self.push_word(self.regs.pc.wrapping_add(operand.len - 1));
        self.regs.pc = addr;
        0
    }

    fn rts(&mut self) -> u8 {
        self.regs.pc = self.pop_word().wrapping_add(1);
        0
    }

    fn rti(&mut self) -> u8 {
        let status = self.pop();
        self.regs.set_status(status);
        self.regs.pc = self.pop_word();
        0
    }

    fn pha(&mut self) -> u8 {
        self.push(self.regs.a);
        0
    }

    fn php(&mut self) -> u8 {
        let status = self.regs.status() | FLAG_BREAK | FLAG_UNUSED;
        self.push(status);
        0
    }

    fn pla(&mut self) -> u8 {
        self.regs.a = self.pop();
        self.regs.update_zero_and_negative_flags(self.regs.a);
        0
    }

    fn plp(&mut self) -> u8 {
        // B has no storage; keep whatever the live register had
        let break_flag = self.regs.flag(FLAG_BREAK);
        let value = self.pop();
        self.regs.set_status(value);
        self.regs.set_flag(FLAG_BREAK, break_flag);
        0
    }

    fn lda(&mut self, addr: u16, operand: &Operand) -> u8 {
        self.regs.a = self.bus.read(addr);
        self.regs.update_zero_and_negative_flags(self.regs.a);
        read_penalty(operand)
    }

    fn ldx(&mut self, addr: u16, operand: &Operand) -> u8 {
        self.regs.x = self.bus.read(addr);
        self.regs.update_zero_and_negative_flags(self.regs.x);
        read_penalty(operand)
    }

    fn ldy(&mut self, addr: u16, operand: &Operand) -> u8 {
        self.regs.y = self.bus.read(addr);
        self.regs.update_zero_and_negative_flags(self.regs.y);
        read_penalty(operand)
    }

    fn store(&mut self, value: u8, mode: AddressingMode, addr: u16) -> u8 {
        self.bus.write(addr, value);
        store_penalty(mode)
    }

    fn tax(&mut self) -> u8 {
        self.regs.x = self.regs.a;
        self.regs.update_zero_and_negative_flags(self.regs.x);
        0
    }

    fn tay(&mut self) -> u8 {
        self.regs.y = self.regs.a;
        self.regs.update_zero_and_negative_flags(self.regs.y);
        0
    }

    fn tsx(&mut self) -> u8 {
        self.regs.x = self.regs.sp;
        self.regs.update_zero_and_negative_flags(self.regs.x);
        0
    }

    fn txa(&mut self) -> u8 {
        self.regs.a = self.regs.x;
        self.regs.update_zero_and_negative_flags(self.regs.a);
        0
    }

    fn txs(&mut self) -> u8 {
        self.regs.sp = self.regs.x;
        0
    }

    fn tya(&mut self) -> u8 {
        self.regs.a = self.regs.y;
        self.regs.update_zero_and_negative_flags(self.regs.a);
        0
    }

    fn set_flag_op(&mut self, flag: u8, on: bool) -> u8 {
        self.regs.set_flag(flag, on);
        0
    }
}
