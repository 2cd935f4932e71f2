use elaris6502::{
    cartridge::cartridge::{Cartridge, CartridgeError},
    diagnostics::Recorder,
    nes::{Headless, Nes, RunConfig, StopReason},
};

// LDA $4000; LDA #$05; STA $10; JMP $8007
const PROGRAM: [u8; 10] = [0xAD, 0x00, 0x40, 0xA9, 0x05, 0x85, 0x10, 0x4C, 0x07, 0x80];

fn ines(program: &[u8]) -> Vec<u8> {
    let mut image = b"NES\x1A".to_vec();
    image.extend_from_slice(&[1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

    let mut prg = vec![0u8; 16 * 1024];
    prg[..program.len()].copy_from_slice(program);
    prg[0x3FFC] = 0x00;
    prg[0x3FFD] = 0x80;
    image.extend_from_slice(&prg);
    image.extend_from_slice(&[0u8; 8 * 1024]);
    image
}

fn machine(config: RunConfig) -> (Nes, Recorder) {
    let cart = Cartridge::from_bytes(&ines(&PROGRAM)).expect("valid image");
    let recorder = Recorder::new();
    let mut nes = Nes::with_sinks(
        cart,
        config,
        Box::new(recorder.clone()),
        Box::new(recorder.clone()),
    );
    nes.power_on();
    (nes, recorder)
}

#[test]
fn runs_program_from_reset_vector() {
    let (mut nes, recorder) = machine(RunConfig {
        max_cycles: Some(200),
        ..RunConfig::default()
    });

    assert_eq!(nes.run(&mut Headless), Ok(StopReason::CycleLimit));
    assert_eq!(nes.cpu.regs.a, 0x05);
    assert_eq!(nes.cpu.bus.ram[0x10], 0x05);
    assert_eq!(nes.cpu.regs.pc, 0x8007);
    assert_eq!(nes.cpu.cycles(), 200);

    // The stray read reported once and execution carried on
    assert_eq!(recorder.warnings(), vec!["read from unmapped address $4000"]);
}

#[test]
fn trace_matches_nestest_layout() {
    let (mut nes, recorder) = machine(RunConfig {
        trace: true,
        max_cycles: Some(20),
        ..RunConfig::default()
    });
    nes.run(&mut Headless).expect("runs");

    let lines: Vec<String> = recorder.traces().iter().map(|r| r.to_string()).collect();
    assert_eq!(
        lines[0],
        "8000  AD 00 40  LDA $4000 = 00                  A:00 X:00 Y:00 P:24 SP:FD CYC:7"
    );
    assert_eq!(
        lines[1],
        "8003  A9 05     LDA #$05                        A:00 X:00 Y:00 P:26 SP:FD CYC:11"
    );
    assert_eq!(
        lines[2],
        "8005  85 10     STA $10 = 00                    A:05 X:00 Y:00 P:24 SP:FD CYC:13"
    );
    assert_eq!(
        lines[3],
        "8007  4C 07 80  JMP $8007                       A:05 X:00 Y:00 P:24 SP:FD CYC:16"
    );
}

#[test]
fn loads_from_disk() {
    let path = std::env::temp_dir().join(format!("elaris6502-{}.nes", std::process::id()));
    std::fs::write(&path, ines(&PROGRAM)).expect("write image");

    let cart = Cartridge::load(&path).expect("valid image");
    assert_eq!(cart.read(0x8000), 0xAD);
    assert_eq!(cart.read(0xFFFD), 0x80);

    std::fs::remove_file(&path).expect("remove image");
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        Cartridge::load("/nonexistent/elaris6502.nes"),
        Err(CartridgeError::Io(_))
    ));
}
