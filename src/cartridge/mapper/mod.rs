//! NES mappers for PRG memory mapping.
//!
//! Only Mapper0 (NROM) is implemented: fixed PRG, no bank switching.

pub mod mapper;

pub mod mapper0;
