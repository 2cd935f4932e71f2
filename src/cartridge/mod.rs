//! NES cartridge loading and mapper support.
//!
//! - **cartridge**: Loads iNES (.nes) files, holds PRG/CHR and the mapper.
//! - **mapper**: NROM (0); fixed PRG mapping.

pub mod cartridge;
pub mod mapper;
