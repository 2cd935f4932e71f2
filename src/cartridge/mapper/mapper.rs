//! Mapper trait: CPU-side PRG access.

/// Trait for NES cartridge mappers. The CPU bus routes $8000-$FFFF here.
pub trait Mapper {
    /// Read from PRG ($8000–$FFFF).
    fn read(&self, addr: u16) -> u8;
    /// Write to PRG space: mapper registers, or the image itself on NROM.
    fn write(&mut self, addr: u16, data: u8);
    /// iNES mapper number.
    fn id(&self) -> u8;
}
