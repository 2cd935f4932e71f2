//! Machine context and run loop.
//!
//! [`Nes`] owns the whole machine: the CPU, which owns the bus, which owns
//! RAM and the cartridge. The run loop ticks the CPU clock and, every
//! `present_every` ticks, hands control to a [`Presenter`]. Nothing here
//! requires a presenter to exist; [`Headless`] does nothing.

use crate::bus::NesBus;
use crate::cartridge::cartridge::Cartridge;
use crate::cpu::cpu::{CPU, CpuError, Step};
use crate::diagnostics::{DiagnosticSink, LogSink};

/// NTSC CPU cycles per video frame (1_789_773 Hz / 60.0988 Hz).
pub const CYCLES_PER_FRAME: u64 = 29_781;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Ticks between presentation calls. 0 disables presentation.
    pub present_every: u64,
    /// Emit a trace record for every instruction.
    pub trace: bool,
    /// Start here instead of at the reset vector (nestest automation starts at $C000).
    pub entry_point: Option<u16>,
    /// Stop once this many cycles have elapsed.
    pub max_cycles: Option<u64>,
    /// Pulse NMI at every presentation boundary, standing in for vblank.
    pub nmi_per_frame: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            present_every: CYCLES_PER_FRAME,
            trace: false,
            entry_point: None,
            max_cycles: None,
            nmi_per_frame: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Periodic presentation collaborator (a window, a test harness, ...).
pub trait Presenter {
    fn present(&mut self, bus: &NesBus, cycles: u64) -> Flow;
}

/// No rendering at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl Presenter for Headless {
    fn present(&mut self, _bus: &NesBus, _cycles: u64) -> Flow {
        Flow::Continue
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The presenter asked to stop (window closed).
    Presenter,
    CycleLimit,
}

pub struct Nes {
    pub cpu: CPU<NesBus>,
    config: RunConfig,
    ticks: u64,
}

impl Nes {
    pub fn new(cart: Cartridge, config: RunConfig) -> Self {
        Self::with_sinks(cart, config, Box::new(LogSink), Box::new(LogSink))
    }

    /// `bus_sink` receives unmapped-access warnings, `cpu_sink` trace records.
    pub fn with_sinks(
        cart: Cartridge,
        config: RunConfig,
        bus_sink: Box<dyn DiagnosticSink>,
        cpu_sink: Box<dyn DiagnosticSink>,
    ) -> Self {
        let bus = NesBus::with_sink(cart, bus_sink);
        let mut cpu = CPU::with_sink(bus, cpu_sink);
        cpu.trace = config.trace;
        Self {
            cpu,
            config,
            ticks: 0,
        }
    }

    /// Reset the CPU and apply the configured entry point.
    pub fn power_on(&mut self) {
        self.cpu.reset();
        if let Some(entry) = self.config.entry_point {
            log::info!("starting at ${entry:04X} instead of the reset vector");
            self.cpu.regs.pc = entry;
        }
        self.ticks = 0;
    }

    /// One clock tick.
    pub fn tick(&mut self) -> Result<Option<Step>, CpuError> {
        let step = self.cpu.tick()?;
        self.ticks += 1;
        Ok(step)
    }

    /// Tick until the presenter stops us, the cycle limit is hit, or decode fails.
    pub fn run(&mut self, presenter: &mut dyn Presenter) -> Result<StopReason, CpuError> {
        loop {
            self.tick()?;

            if let Some(limit) = self.config.max_cycles
                && self.cpu.cycles() >= limit
            {
                return Ok(StopReason::CycleLimit);
            }

            let every = self.config.present_every;
            if every != 0 && self.ticks % every == 0 {
                if self.config.nmi_per_frame {
                    self.cpu.bus.request_nmi();
                }
                if presenter.present(&self.cpu.bus, self.cpu.cycles()) == Flow::Stop {
                    return Ok(StopReason::Presenter);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::cartridge::tests::nrom_image;
    use crate::diagnostics::{NullSink, Recorder};

    struct CountingPresenter {
        calls: u32,
        stop_after: u32,
    }

    impl Presenter for CountingPresenter {
        fn present(&mut self, _bus: &NesBus, _cycles: u64) -> Flow {
            self.calls += 1;
            if self.calls >= self.stop_after {
                Flow::Stop
            } else {
                Flow::Continue
            }
        }
    }

    // JMP $8000
    const SPIN: [u8; 3] = [0x4C, 0x00, 0x80];

    fn machine(config: RunConfig) -> Nes {
        let cart = Cartridge::from_bytes(&nrom_image(1, &SPIN)).expect("valid image");
        let mut nes = Nes::new(cart, config);
        nes.power_on();
        nes
    }

    #[test]
    fn runs_headless_to_cycle_limit() {
        let cart = Cartridge::from_bytes(&nrom_image(1, &SPIN)).expect("valid image");
        let config = RunConfig {
            max_cycles: Some(1_000),
            trace: true,
            ..RunConfig::default()
        };
        let mut nes = Nes::with_sinks(cart, config, Box::new(NullSink), Box::new(NullSink));
        nes.power_on();

        assert_eq!(nes.run(&mut Headless), Ok(StopReason::CycleLimit));
        assert_eq!(nes.cpu.cycles(), 1_000);
        assert_eq!(nes.cpu.regs.pc, 0x8000);
    }

    #[test]
    fn presenter_cadence_and_stop() {
        let mut nes = machine(RunConfig {
            present_every: 100,
            ..RunConfig::default()
        });
        let mut presenter = CountingPresenter {
            calls: 0,
            stop_after: 3,
        };
        assert_eq!(nes.run(&mut presenter), Ok(StopReason::Presenter));
        assert_eq!(presenter.calls, 3);
        assert_eq!(nes.cpu.cycles(), 7 + 300);
    }

    #[test]
    fn entry_point_overrides_reset_vector() {
        let nes = machine(RunConfig {
            entry_point: Some(0xC000),
            ..RunConfig::default()
        });
        assert_eq!(nes.cpu.regs.pc, 0xC000);
        assert_eq!(nes.cpu.cycles(), 7);
    }

    #[test]
    fn nmi_per_frame_enters_handler() {
        // Vectors all point at $8000, so the NMI lands back on the spin loop
        let mut nes = machine(RunConfig {
            present_every: 30,
            nmi_per_frame: true,
            max_cycles: Some(60),
            ..RunConfig::default()
        });
        let sp = nes.cpu.regs.sp;
        nes.run(&mut Headless).expect("runs");
        assert_eq!(nes.cpu.regs.sp, sp.wrapping_sub(3));
    }

    #[test]
    fn illegal_opcode_stops_run() {
        let cart = Cartridge::from_bytes(&nrom_image(1, &[0x02])).expect("valid image");
        let recorder = Recorder::new();
        let mut nes = Nes::with_sinks(
            cart,
            RunConfig::default(),
            Box::new(recorder.clone()),
            Box::new(recorder.clone()),
        );
        nes.power_on();
        assert_eq!(
            nes.run(&mut Headless),
            Err(CpuError::IllegalOpcode {
                opcode: 0x02,
                pc: 0x8000
            })
        );
    }
}
