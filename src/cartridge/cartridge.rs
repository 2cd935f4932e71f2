//! NES cartridge loading from iNES format (.nes files).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7 for mapper, etc.), an optional
//! 512-byte trainer, then PRG ROM, then CHR ROM. [NES 2.0](https://www.nesdev.org/wiki/NES_2.0)
//! images are recognised and rejected.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::cartridge::mapper::mapper::Mapper;
use crate::cartridge::mapper::mapper0::Mapper0;

pub const HEADER_SIZE: usize = 16;
pub const TRAINER_SIZE: usize = 512;
pub const PRG_BANK_SIZE: usize = 16 * 1024;
pub const CHR_BANK_SIZE: usize = 8 * 1024;
pub const MAGIC: [u8; 4] = *b"NES\x1A";

const FLAG6_TRAINER: u8 = 1 << 3;

#[derive(Debug)]
pub enum CartridgeError {
    Io(io::Error),
    TooShort(usize),
    BadMagic([u8; 4]),
    Nes2Unsupported,
    UnsupportedMapper(u8),
    NoPrgRom,
    Truncated { expected: usize, actual: usize },
}

impl fmt::Display for CartridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartridgeError::Io(e) => write!(f, "failed to read ROM: {e}"),
            CartridgeError::TooShort(len) => {
                write!(f, "file is {len} bytes, too short for an iNES header")
            }
            CartridgeError::BadMagic(magic) => write!(f, "bad iNES magic {magic:02X?}"),
            CartridgeError::Nes2Unsupported => f.write_str("iNES 2.0 is not supported"),
            CartridgeError::UnsupportedMapper(id) => write!(f, "unsupported mapper {id}"),
            CartridgeError::NoPrgRom => f.write_str("header declares no PRG ROM"),
            CartridgeError::Truncated { expected, actual } => {
                write!(f, "image truncated: expected {expected} bytes, found {actual}")
            }
        }
    }
}

impl std::error::Error for CartridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CartridgeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CartridgeError {
    fn from(e: io::Error) -> Self {
        CartridgeError::Io(e)
    }
}

/// The 16-byte iNES header, as stored in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    /// PRG ROM size in 16 KiB units.
    pub prg_size: u8,
    /// CHR ROM size in 8 KiB units.
    pub chr_size: u8,
    pub flags_6: u8,
    pub flags_7: u8,
    pub padding: [u8; 8],
}

impl Header {
    pub fn parse(data: &[u8]) -> Result<Self, CartridgeError> {
        let bytes: &[u8; HEADER_SIZE] = data
            .get(..HEADER_SIZE)
            .and_then(|h| h.try_into().ok())
            .ok_or(CartridgeError::TooShort(data.len()))?;

        let mut magic = [0; 4];
        magic.copy_from_slice(&bytes[0..4]);
        if magic != MAGIC {
            return Err(CartridgeError::BadMagic(magic));
        }
        // Byte 7 bits 2-3 == 0b10 marks NES 2.0
        if bytes[7] & 0x0C == 0x08 {
            return Err(CartridgeError::Nes2Unsupported);
        }

        let mut padding = [0; 8];
        padding.copy_from_slice(&bytes[8..16]);

        Ok(Self {
            magic,
            prg_size: bytes[4],
            chr_size: bytes[5],
            flags_6: bytes[6],
            flags_7: bytes[7],
            padding,
        })
    }

    pub fn has_trainer(&self) -> bool {
        self.flags_6 & FLAG6_TRAINER != 0
    }

    /// Mapper number: high nibble from flags 7, low nibble from flags 6.
    pub fn mapper_id(&self) -> u8 {
        (self.flags_7 & 0xF0) | (self.flags_6 >> 4)
    }

    pub fn prg_len(&self) -> usize {
        self.prg_size as usize * PRG_BANK_SIZE
    }

    pub fn chr_len(&self) -> usize {
        self.chr_size as usize * CHR_BANK_SIZE
    }

    /// File offset of the first PRG byte.
    pub fn prg_offset(&self) -> usize {
        HEADER_SIZE + if self.has_trainer() { TRAINER_SIZE } else { 0 }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = self.magic[..3].iter().map(|&b| b as char).collect();
        writeln!(f, "Magic: {text} 0x{:02X}", self.magic[3])?;
        writeln!(f, "PRG ROM size: {} * 16KiB", self.prg_size)?;
        writeln!(f, "CHR ROM size: {} *  8KiB", self.chr_size)?;
        writeln!(f, "Flags (6): 0x{:02X}", self.flags_6)?;
        writeln!(f, "Flags (7): 0x{:02X}", self.flags_7)?;
        write!(f, "Mapper: 0x{:02X}", self.mapper_id())
    }
}

/// Cartridge: the parsed header, CHR data, and the mapper that owns PRG.
/// CPU reads PRG via bus at $8000–$FFFF.
pub struct Cartridge {
    pub header: Header,
    chr_rom: Vec<u8>,
    mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Load cartridge from an iNES file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CartridgeError> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Parse an in-memory iNES image.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        let header = Header::parse(data)?;

        let prg_start = header.prg_offset();
        let prg_end = prg_start + header.prg_len();
        let chr_end = prg_end + header.chr_len();
        if data.len() < chr_end {
            return Err(CartridgeError::Truncated {
                expected: chr_end,
                actual: data.len(),
            });
        }
        if header.prg_len() == 0 {
            return Err(CartridgeError::NoPrgRom);
        }

        let prg_rom = data[prg_start..prg_end].to_vec();
        let chr_rom = data[prg_end..chr_end].to_vec();

        let mapper: Box<dyn Mapper> = match header.mapper_id() {
            0 => Box::new(Mapper0::new(prg_rom)),
            id => return Err(CartridgeError::UnsupportedMapper(id)),
        };

        log::debug!(
            "loaded cartridge: {} KiB PRG, {} KiB CHR, mapper {}, trainer {}",
            header.prg_len() / 1024,
            header.chr_len() / 1024,
            mapper.id(),
            header.has_trainer()
        );

        Ok(Self {
            header,
            chr_rom,
            mapper,
        })
    }

    pub fn chr_rom(&self) -> &[u8] {
        &self.chr_rom
    }

    pub fn mapper_id(&self) -> u8 {
        self.mapper.id()
    }

    /// Read: PRG space ($8000–$FFFF). Mapper dispatches.
    pub fn read(&self, addr: u16) -> u8 {
        self.mapper.read(addr)
    }

    /// Write: PRG space. On NROM this overwrites the image.
    pub fn write(&mut self, addr: u16, data: u8) {
        self.mapper.write(addr, data);
    }
}
