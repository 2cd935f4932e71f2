//! Memory bus and address decoding for the NES CPU.
//!
//! Only the parts of the [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map)
//! the core needs are decoded: 2 KiB internal RAM mirrored through $1FFF and
//! cartridge PRG at $8000-$FFFF. Everything in between is unmapped; reads
//! return 0 and writes are dropped, each with a warning.

use crate::cartridge::cartridge::Cartridge;
use crate::diagnostics::{DiagnosticSink, LogSink};

pub const RAM_SIZE: usize = 2048;

/// Trait for memory-mapped I/O and bus access used by the CPU.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    /// Read without side effects, for trace output. Defaults to `read`.
    fn peek(&mut self, addr: u16) -> u8 {
        self.read(addr)
    }

    /// Consume a pending NMI edge.
    fn poll_nmi(&mut self) -> bool {
        false
    }

    /// Level of the IRQ line. The CPU decides whether to honour it.
    fn irq_asserted(&self) -> bool {
        false
    }
}

/// Main NES bus: internal RAM, cartridge, and the interrupt request lines.
pub struct NesBus {
    pub ram: [u8; RAM_SIZE],
    pub cart: Cartridge,
    nmi_pending: bool,
    irq_line: bool,
    sink: Box<dyn DiagnosticSink>,
}

impl NesBus {
    /// Create a new bus with the given cartridge, logging through `log`.
    pub fn new(cart: Cartridge) -> Self {
        Self::with_sink(cart, Box::new(LogSink))
    }

    pub fn with_sink(cart: Cartridge, sink: Box<dyn DiagnosticSink>) -> Self {
        Self {
            ram: [0; RAM_SIZE],
            cart,
            nmi_pending: false,
            irq_line: false,
            sink,
        }
    }

    /// Latch an NMI; the CPU takes it before its next fetch.
    pub fn request_nmi(&mut self) {
        self.nmi_pending = true;
    }

    pub fn set_irq(&mut self, asserted: bool) {
        self.irq_line = asserted;
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            // Internal RAM (mirrored 4x in 0x0000-0x1FFF)
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            // Cartridge PRG ROM
            0x8000..=0xFFFF => self.cart.read(addr),
            _ => {
                self.sink
                    .warn(format_args!("read from unmapped address ${addr:04X}"));
                0
            }
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            // NROM has no registers; the byte lands in the PRG image itself
            0x8000..=0xFFFF => self.cart.write(addr, data),
            _ => self.sink.warn(format_args!(
                "write of ${data:02X} to unmapped address ${addr:04X} dropped"
            )),
        }
    }

    fn peek(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x8000..=0xFFFF => self.cart.read(addr),
            _ => 0,
        }
    }

    fn poll_nmi(&mut self) -> bool {
        // Edge: one request, one interrupt
        std::mem::take(&mut self.nmi_pending)
    }

    fn irq_asserted(&self) -> bool {
        self.irq_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::cartridge::tests::nrom_image;
    use crate::diagnostics::Recorder;

    fn bus_with_recorder(prg_banks: u8) -> (NesBus, Recorder) {
        let cart = Cartridge::from_bytes(&nrom_image(prg_banks, &[])).expect("valid image");
        let recorder = Recorder::new();
        let bus = NesBus::with_sink(cart, Box::new(recorder.clone()));
        (bus, recorder)
    }

    #[test]
    fn ram_is_mirrored_every_2k() {
        let (mut bus, _) = bus_with_recorder(1);
        bus.write(0x0010, 0xAB);
        assert_eq!(bus.read(0x0810), 0xAB);
        assert_eq!(bus.read(0x1010), 0xAB);
        assert_eq!(bus.read(0x1810), 0xAB);
    }

    #[test]
    fn single_bank_prg_is_mirrored() {
        let (mut bus, _) = bus_with_recorder(1);
        bus.write(0x8123, 0x5A);
        assert_eq!(bus.read(0xC123), 0x5A);
    }

    #[test]
    fn two_bank_prg_is_not_mirrored() {
        let (mut bus, _) = bus_with_recorder(2);
        bus.write(0x8123, 0x5A);
        assert_eq!(bus.read(0x8123), 0x5A);
        assert_eq!(bus.read(0xC123), 0x00);
    }

    #[test]
    fn unmapped_read_returns_zero_and_warns() {
        let (mut bus, recorder) = bus_with_recorder(1);
        assert_eq!(bus.read(0x4000), 0);
        assert_eq!(recorder.warnings(), vec!["read from unmapped address $4000"]);
    }

    #[test]
    fn unmapped_write_is_dropped_with_warning() {
        let (mut bus, recorder) = bus_with_recorder(1);
        bus.write(0x6000, 0x42);
        assert_eq!(bus.peek(0x6000), 0);
        assert_eq!(recorder.warnings().len(), 1);
    }

    #[test]
    fn peek_is_silent() {
        let (mut bus, recorder) = bus_with_recorder(1);
        assert_eq!(bus.peek(0x2002), 0);
        assert!(recorder.warnings().is_empty());
    }

    #[test]
    fn nmi_request_is_consumed_once() {
        let (mut bus, _) = bus_with_recorder(1);
        assert!(!bus.poll_nmi());
        bus.request_nmi();
        assert!(bus.poll_nmi());
        assert!(!bus.poll_nmi());
    }

    #[test]
    fn irq_line_is_level() {
        let (mut bus, _) = bus_with_recorder(1);
        bus.set_irq(true);
        assert!(bus.irq_asserted());
        assert!(bus.irq_asserted());
        bus.set_irq(false);
        assert!(!bus.irq_asserted());
    }
}
