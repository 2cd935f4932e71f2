//! Elaris6502: a cycle-counting NES 6502 CPU emulator written in Rust.
//!
//! Implements the Ricoh 2A03 CPU core as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide), wired to
//! 2 KiB of work RAM and an NROM cartridge. There is no PPU, APU or controller.
//!
//! ## Modules (NESdev references)
//!
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map): RAM mirrors and
//!   cartridge PRG; everything else is reported and ignored
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading;
//!   [NROM](https://www.nesdev.org/wiki/NROM) (mapper 0)
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU): documented opcodes, cycle counts,
//!   [NMI](https://www.nesdev.org/wiki/NMI) and IRQ entry
//! - **diagnostics** – sinks for bus warnings and per-instruction trace records
//! - **logger** – coloured terminal backend for `log`
//! - **nes** – machine context, run configuration and the presentation loop
//! - **tracer** – [nestest](https://www.nesdev.org/wiki/Emulator_tests) log formatting

pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod diagnostics;
pub mod logger;
pub mod nes;
pub mod tracer;
