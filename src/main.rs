//! NES CPU emulator entry point.
//!
//! Loads a cartridge and runs the CPU, showing work RAM in a window.
//! Usage: elaris6502 [OPTIONS] <ROM>

use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::LevelFilter;
use minifb::{Key, Scale, Window, WindowOptions};

use elaris6502::{
    bus::{NesBus, RAM_SIZE},
    cartridge::cartridge::{Cartridge, Header},
    diagnostics::{DiagnosticSink, LogSink},
    logger,
    nes::{CYCLES_PER_FRAME, Flow, Headless, Nes, Presenter, RunConfig},
    tracer::TraceWriter,
};

/// RAM viewer: one pixel per byte, 64 bytes per row.
const VIEW_WIDTH: usize = 64;
const VIEW_HEIGHT: usize = RAM_SIZE / VIEW_WIDTH;

/// Cycle-counting NES 6502 emulator
#[derive(Parser, Debug)]
#[command(name = "elaris6502", version)]
#[command(about = "Runs an NROM cartridge on an emulated NES CPU", long_about = None)]
struct Args {
    /// Path to the iNES ROM file
    rom: PathBuf,

    /// Print a nestest-style line for every instruction to stdout
    #[arg(short, long)]
    trace: bool,

    /// Print the iNES header and exit
    #[arg(long)]
    header: bool,

    /// Start at this address instead of the reset vector (e.g. C000)
    #[arg(short, long, value_parser = parse_address)]
    entry: Option<u16>,

    /// Stop after this many CPU cycles
    #[arg(short = 'c', long)]
    max_cycles: Option<u64>,

    /// CPU cycles between window refreshes
    #[arg(long, default_value_t = CYCLES_PER_FRAME)]
    present_every: u64,

    /// Raise NMI at every refresh, standing in for vblank
    #[arg(long)]
    nmi_per_frame: bool,

    /// Run without a window
    #[arg(long)]
    headless: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_address(s: &str) -> Result<u16, String> {
    let digits = s
        .trim_start_matches('$')
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|e| format!("`{s}` is not a 16-bit hex address: {e}"))
}

fn level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Shows internal RAM as a grey-scale grid until the window closes or Escape is hit.
struct RamView {
    window: Window,
    buffer: Vec<u32>,
}

impl RamView {
    fn open() -> Result<Self> {
        let mut window = Window::new(
            "Elaris6502",
            VIEW_WIDTH,
            VIEW_HEIGHT,
            WindowOptions {
                resize: true,
                scale: Scale::X8,
                scale_mode: minifb::ScaleMode::AspectRatioStretch,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| anyhow!("failed to create window: {e}"))?;

        window.set_target_fps(60);

        Ok(Self {
            window,
            buffer: vec![0; VIEW_WIDTH * VIEW_HEIGHT],
        })
    }
}

impl Presenter for RamView {
    fn present(&mut self, bus: &NesBus, _cycles: u64) -> Flow {
        if !self.window.is_open() || self.window.is_key_down(Key::Escape) {
            return Flow::Stop;
        }

        for (pixel, &byte) in self.buffer.iter_mut().zip(bus.ram.iter()) {
            let v = byte as u32;
            *pixel = (v << 16) | (v << 8) | v;
        }

        match self
            .window
            .update_with_buffer(&self.buffer, VIEW_WIDTH, VIEW_HEIGHT)
        {
            Ok(()) => Flow::Continue,
            Err(e) => {
                log::error!("window update failed: {e}");
                Flow::Stop
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(level(args.verbose)).context("failed to install logger")?;

    let data = std::fs::read(&args.rom)
        .with_context(|| format!("failed to read {}", args.rom.display()))?;

    if args.header {
        let header = Header::parse(&data)
            .with_context(|| format!("{} is not an iNES image", args.rom.display()))?;
        print!("{header}");
        return Ok(());
    }

    let cart = Cartridge::from_bytes(&data)
        .with_context(|| format!("failed to load {}", args.rom.display()))?;
    log::info!(
        "loaded {}: {} KiB PRG, {} KiB CHR, mapper {}",
        args.rom.display(),
        cart.header.prg_len() / 1024,
        cart.header.chr_len() / 1024,
        cart.mapper_id()
    );

    let config = RunConfig {
        present_every: args.present_every,
        trace: args.trace,
        entry_point: args.entry,
        max_cycles: args.max_cycles,
        nmi_per_frame: args.nmi_per_frame,
    };

    let cpu_sink: Box<dyn DiagnosticSink> = if args.trace {
        Box::new(TraceWriter::new(BufWriter::new(io::stdout())))
    } else {
        Box::new(LogSink)
    };
    let mut nes = Nes::with_sinks(cart, config, Box::new(LogSink), cpu_sink);
    nes.power_on();

    let outcome = if args.headless {
        nes.run(&mut Headless)
    } else {
        let mut view = RamView::open()?;
        nes.run(&mut view)
    };

    match outcome {
        Ok(reason) => {
            log::info!("stopped after {} cycles ({reason:?})", nes.cpu.cycles());
            Ok(())
        }
        Err(e) => {
            log::error!("{e}");
            Err(e).context(format!("CPU halted after {} cycles", nes.cpu.cycles()))
        }
    }
}
