use std::fmt;

use crate::{
    bus::Bus,
    cpu::{
        addressing::{self, Operand},
        flags::FLAG_INTERRUPT_DISABLE,
        interrupts::Interrupt,
        opcodes::{AddressingMode, Instruction, base_cycles, decode},
        registers::Registers,
        scheduler::Scheduler,
        trace::TraceRecord,
    },
    diagnostics::{DiagnosticSink, LogSink},
};

/// Decode failures. Either one leaves the CPU parked on the offending opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    IllegalOpcode { opcode: u8, pc: u16 },
    IllegalAddressingMode { opcode: u8, pc: u16 },
}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuError::IllegalOpcode { opcode, pc } => {
                write!(f, "unknown instruction with opcode ${opcode:02X} at ${pc:04X}")
            }
            CpuError::IllegalAddressingMode { opcode, pc } => {
                write!(f, "opcode ${opcode:02X} at ${pc:04X} has no addressing mode")
            }
        }
    }
}

impl std::error::Error for CpuError {}

/// What one scheduler step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Instruction { record: TraceRecord, cycles: u8 },
    Interrupt { kind: Interrupt, cycles: u8 },
}

impl Step {
    pub fn cycles(&self) -> u8 {
        match self {
            Step::Instruction { cycles, .. } | Step::Interrupt { cycles, .. } => *cycles,
        }
    }

    pub fn record(&self) -> Option<&TraceRecord> {
        match self {
            Step::Instruction { record, .. } => Some(record),
            Step::Interrupt { .. } => None,
        }
    }
}

pub struct CPU<B: Bus> {
    pub regs: Registers,
    pub bus: B,
    pub scheduler: Scheduler,
    /// Hand a [`TraceRecord`] to the sink before every instruction.
    pub trace: bool,
    pub(crate) sink: Box<dyn DiagnosticSink>,
}

impl<B: Bus> CPU<B> {
    pub fn new(bus: B) -> Self {
        Self::with_sink(bus, Box::new(LogSink))
    }

    pub fn with_sink(bus: B, sink: Box<dyn DiagnosticSink>) -> Self {
        Self {
            regs: Registers::default(),
            bus,
            scheduler: Scheduler::default(),
            trace: false,
            sink,
        }
    }

    /// Elapsed clock ticks since power-on (the reset sequence counts 7).
    pub fn cycles(&self) -> u64 {
        self.scheduler.elapsed()
    }

    /// Run one whole step (interrupt entry or instruction) and account its cycles.
    pub fn step(&mut self) -> Result<Step, CpuError> {
        self.scheduler.settle();
        let step = self.dispatch()?;
        self.scheduler.charge(step.cycles());
        self.scheduler.settle();
        Ok(step)
    }

    /// One external clock tick. Returns the step that started on this tick, if any.
    pub fn tick(&mut self) -> Result<Option<Step>, CpuError> {
        let step = if self.scheduler.ready() {
            let step = self.dispatch()?;
            self.scheduler.charge(step.cycles());
            Some(step)
        } else {
            None
        };
        self.scheduler.burn();
        Ok(step)
    }

    fn dispatch(&mut self) -> Result<Step, CpuError> {
        if self.bus.poll_nmi() {
            return Ok(self.interrupt(Interrupt::Nmi));
        }
        if self.bus.irq_asserted() && !self.regs.flag(FLAG_INTERRUPT_DISABLE) {
            return Ok(self.interrupt(Interrupt::Irq));
        }

        let pc = self.regs.pc;
        let opcode = self.bus.read(pc);
        let (instruction, mode) = decode(opcode);
        if instruction == Instruction::Illegal {
            return Err(CpuError::IllegalOpcode { opcode, pc });
        }
        let operand = addressing::resolve(&mut self.bus, &self.regs, mode)
            .ok_or(CpuError::IllegalAddressingMode { opcode, pc })?;

        let record = self.record(opcode, instruction, mode, &operand);
        if self.trace {
            self.sink.trace(&record);
        }

        let executed = self.execute(instruction, mode, &operand);
        if !executed.pc_written {
            self.regs.pc = pc.wrapping_add(operand.len);
        }

        Ok(Step::Instruction {
            record,
            cycles: base_cycles(instruction, mode) + executed.extra_cycles,
        })
    }

    fn record(
        &mut self,
        opcode: u8,
        instruction: Instruction,
        mode: AddressingMode,
        operand: &Operand,
    ) -> TraceRecord {
        let touches_memory = !matches!(
            mode,
            AddressingMode::Immediate | AddressingMode::Relative | AddressingMode::Indirect
        ) && !matches!(instruction, Instruction::JMP | Instruction::JSR);
        let memory = match operand.address {
            Some(addr) if touches_memory => Some(self.bus.peek(addr)),
            _ => None,
        };

        TraceRecord {
            pc: self.regs.pc,
            opcode,
            operand: operand.bytes,
            operand_len: operand.raw_bytes().len() as u8,
            instruction,
            mode,
            address: operand.address,
            memory,
            a: self.regs.a,
            x: self.regs.x,
            y: self.regs.y,
            p: self.regs.status(),
            sp: self.regs.sp,
            cycles: self.scheduler.elapsed(),
        }
    }

    pub(crate) fn push(&mut self, value: u8) {
        let addr = self.regs.stack_address();
        self.bus.write(addr, value);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
    }

    pub(crate) fn pop(&mut self) -> u8 {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let addr = self.regs.stack_address();
        self.bus.read(addr)
    }

    pub(crate) fn push_word(&mut self, value: u16) {
        self.push((value >> 8) as u8);
        self.push(value as u8);
    }

    pub(crate) fn pop_word(&mut self) -> u16 {
        let lo = self.pop() as u16;
        let hi = self.pop() as u16;
        (hi << 8) | lo
    }
}
