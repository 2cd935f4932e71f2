//! Mapper 0 (NROM): no bank switching, 16/32KB PRG.

use crate::cartridge::mapper::mapper::Mapper;

/// NROM mapper: fixed PRG, mirrored when only one 16KB bank is present.
pub struct Mapper0 {
    prg_rom: Vec<u8>,
}

impl Mapper0 {
    /// Create Mapper0 over a non-empty PRG image.
    pub fn new(prg_rom: Vec<u8>) -> Self {
        debug_assert!(!prg_rom.is_empty());
        Self { prg_rom }
    }

    fn offset(&self, addr: u16) -> usize {
        // 16KB images repeat at $C000; 32KB images fill the window exactly
        (addr.wrapping_sub(0x8000) as usize) % self.prg_rom.len()
    }
}

impl Mapper for Mapper0 {
    fn read(&self, addr: u16) -> u8 {
        self.prg_rom[self.offset(addr)]
    }

    fn write(&mut self, addr: u16, data: u8) {
        // Real NROM ignores this. Programs that poke their own ROM expect it to stick.
        let offset = self.offset(addr);
        self.prg_rom[offset] = data;
    }

    fn id(&self) -> u8 {
        0
    }
}
