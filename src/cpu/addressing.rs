//! Addressing-mode resolution.
//!
//! Given the registers (PC pointing at an opcode) and the opcode's mode,
//! [`resolve`] fetches the operand bytes and computes the effective address.
//! Zero-page arithmetic wraps at 256; 16-bit arithmetic wraps at 65536.

use crate::bus::Bus;
use crate::cpu::opcodes::AddressingMode;
use crate::cpu::registers::Registers;

/// Everything the executor and the tracer need to know about an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    /// Effective address; `None` for implicit and accumulator modes.
    pub address: Option<u16>,
    /// Raw operand bytes following the opcode (only `len - 1` are meaningful).
    pub bytes: [u8; 2],
    /// Instruction length in bytes, opcode included.
    pub len: u16,
    /// Indexing carried into the high byte (AbsoluteX/Y and (zp),Y only).
    pub page_crossed: bool,
}

impl Operand {
    pub fn raw_bytes(&self) -> &[u8] {
        &self.bytes[..(self.len as usize).saturating_sub(1)]
    }
}

/// Bytes occupied by an instruction using `mode`, opcode included.
pub const fn instruction_length(mode: AddressingMode) -> u16 {
    use AddressingMode::*;

    match mode {
        Implicit | Accumulator => 1,
        Immediate | Relative | ZeroPage | ZeroPageX | ZeroPageY | IndexedIndirect
        | IndirectIndexed => 2,
        Absolute | AbsoluteX | AbsoluteY | Indirect => 3,
        // Never executed; counts the opcode byte only
        Illegal => 1,
    }
}

/// True when `base` and `effective` sit on different 256-byte pages.
pub const fn page_crossed(base: u16, effective: u16) -> bool {
    base & 0xFF00 != effective & 0xFF00
}

fn read_word<B: Bus>(bus: &mut B, addr: u16) -> u16 {
    let lo = bus.read(addr) as u16;
    let hi = bus.read(addr.wrapping_add(1)) as u16;
    (hi << 8) | lo
}

/// Read a pointer stored in zero page; the high byte wraps to $00 after $FF.
fn read_zero_page_word<B: Bus>(bus: &mut B, ptr: u8) -> u16 {
    let lo = bus.read(ptr as u16) as u16;
    let hi = bus.read(ptr.wrapping_add(1) as u16) as u16;
    (hi << 8) | lo
}

/// Resolve the operand of the instruction at `regs.pc`.
///
/// Returns `None` only for [`AddressingMode::Illegal`].
pub fn resolve<B: Bus>(bus: &mut B, regs: &Registers, mode: AddressingMode) -> Option<Operand> {
    use AddressingMode::*;

    let len = instruction_length(mode);
    let mut bytes = [0u8; 2];
    for (i, byte) in bytes.iter_mut().enumerate().take(len as usize - 1) {
        *byte = bus.read(regs.pc.wrapping_add(1 + i as u16));
    }
    let zp = bytes[0];
    let abs = u16::from_le_bytes(bytes);

    let mut crossed = false;
    let address = match mode {
        Implicit | Accumulator => None,
        Immediate | Relative => Some(regs.pc.wrapping_add(1)),
        ZeroPage => Some(zp as u16),
        Absolute => Some(abs),
        Indirect => {
            // 6502 bug: the high byte is fetched from the start of the same page
            let lo = bus.read(abs) as u16;
            let hi = bus.read((abs & 0xFF00) | (abs.wrapping_add(1) & 0x00FF)) as u16;
            Some((hi << 8) | lo)
        }
        ZeroPageX => Some(zp.wrapping_add(regs.x) as u16),
        ZeroPageY => Some(zp.wrapping_add(regs.y) as u16),
        AbsoluteX => {
            let effective = abs.wrapping_add(regs.x as u16);
            crossed = page_crossed(abs, effective);
            Some(effective)
        }
        AbsoluteY => {
            let effective = abs.wrapping_add(regs.y as u16);
            crossed = page_crossed(abs, effective);
            Some(effective)
        }
        IndexedIndirect => Some(read_zero_page_word(bus, zp.wrapping_add(regs.x))),
        IndirectIndexed => {
            let base = read_zero_page_word(bus, zp);
            let effective = base.wrapping_add(regs.y as u16);
            crossed = page_crossed(base, effective);
            Some(effective)
        }
        Illegal => return None,
    };

    Some(Operand {
        address,
        bytes,
        len,
        page_crossed: crossed,
    })
}

/// Little-endian word at `addr`, used for vectors.
pub fn read_vector<B: Bus>(bus: &mut B, addr: u16) -> u16 {
    read_word(bus, addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatBus {
        mem: Vec<u8>,
    }

    impl FlatBus {
        fn new() -> Self {
            Self { mem: vec![0; 0x10000] }
        }
    }

    impl Bus for FlatBus {
        fn read(&mut self, addr: u16) -> u8 {
            self.mem[addr as usize]
        }

        fn write(&mut self, addr: u16, data: u8) {
            self.mem[addr as usize] = data;
        }
    }

    fn regs_at(pc: u16) -> Registers {
        Registers::power_on(pc)
    }

    #[test]
    fn lengths() {
        assert_eq!(instruction_length(AddressingMode::Implicit), 1);
        assert_eq!(instruction_length(AddressingMode::Accumulator), 1);
        assert_eq!(instruction_length(AddressingMode::IndirectIndexed), 2);
        assert_eq!(instruction_length(AddressingMode::Relative), 2);
        assert_eq!(instruction_length(AddressingMode::Indirect), 3);
        assert_eq!(instruction_length(AddressingMode::AbsoluteY), 3);
    }

    #[test]
    fn implicit_has_no_address() {
        let mut bus = FlatBus::new();
        let op = resolve(&mut bus, &regs_at(0x8000), AddressingMode::Implicit).unwrap();
        assert_eq!(op.address, None);
        assert!(op.raw_bytes().is_empty());
    }

    #[test]
    fn immediate_points_after_opcode() {
        let mut bus = FlatBus::new();
        bus.mem[0x8001] = 0x42;
        let op = resolve(&mut bus, &regs_at(0x8000), AddressingMode::Immediate).unwrap();
        assert_eq!(op.address, Some(0x8001));
        assert_eq!(op.raw_bytes(), &[0x42]);
    }

    #[test]
    fn zero_page_x_wraps() {
        let mut bus = FlatBus::new();
        bus.mem[0x8001] = 0xF0;
        let mut regs = regs_at(0x8000);
        regs.x = 0x20;
        let op = resolve(&mut bus, &regs, AddressingMode::ZeroPageX).unwrap();
        assert_eq!(op.address, Some(0x0010));
    }

    #[test]
    fn absolute_x_reports_page_cross() {
        let mut bus = FlatBus::new();
        bus.mem[0x8001] = 0xFF;
        bus.mem[0x8002] = 0x02;
        let mut regs = regs_at(0x8000);
        regs.x = 0x01;
        let op = resolve(&mut bus, &regs, AddressingMode::AbsoluteX).unwrap();
        assert_eq!(op.address, Some(0x0300));
        assert!(op.page_crossed);

        regs.x = 0x00;
        let op = resolve(&mut bus, &regs, AddressingMode::AbsoluteX).unwrap();
        assert!(!op.page_crossed);
    }

    #[test]
    fn indirect_wraps_within_page() {
        let mut bus = FlatBus::new();
        bus.mem[0x8001] = 0xFF;
        bus.mem[0x8002] = 0x02;
        bus.mem[0x02FF] = 0x34;
        bus.mem[0x0200] = 0x12;
        bus.mem[0x0300] = 0x99;
        let op = resolve(&mut bus, &regs_at(0x8000), AddressingMode::Indirect).unwrap();
        assert_eq!(op.address, Some(0x1234));
    }

    #[test]
    fn indexed_indirect_wraps_pointer_fetch() {
        let mut bus = FlatBus::new();
        bus.mem[0x8001] = 0xFE;
        let mut regs = regs_at(0x8000);
        regs.x = 0x01; // pointer at $FF, high byte from $00
        bus.mem[0x00FF] = 0x78;
        bus.mem[0x0000] = 0x56;
        bus.mem[0x0100] = 0xAA;
        let op = resolve(&mut bus, &regs, AddressingMode::IndexedIndirect).unwrap();
        assert_eq!(op.address, Some(0x5678));

        regs.x = 0x04; // $FE + 4 wraps to $02
        bus.mem[0x0002] = 0x00;
        bus.mem[0x0003] = 0x03;
        let op = resolve(&mut bus, &regs, AddressingMode::IndexedIndirect).unwrap();
        assert_eq!(op.address, Some(0x0300));
    }

    #[test]
    fn indirect_indexed_adds_y_after_fetch() {
        let mut bus = FlatBus::new();
        bus.mem[0x8001] = 0x10;
        bus.mem[0x0010] = 0xF0;
        bus.mem[0x0011] = 0x12;
        let mut regs = regs_at(0x8000);
        regs.y = 0x20;
        let op = resolve(&mut bus, &regs, AddressingMode::IndirectIndexed).unwrap();
        assert_eq!(op.address, Some(0x1310));
        assert!(op.page_crossed);
    }

    #[test]
    fn illegal_mode_does_not_resolve() {
        let mut bus = FlatBus::new();
        assert!(resolve(&mut bus, &regs_at(0x8000), AddressingMode::Illegal).is_none());
    }
}
