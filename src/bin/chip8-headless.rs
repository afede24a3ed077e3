use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use clap_num::maybe_hex;
use log::info;

use chip8_core::{
    Chip8, Chip8Builder, Chip8Runner, Chip8RunnerResult, DISPLAY_X, DISPLAY_Y, Quirks, TIMER_HZ,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    /// Every quirk off
    Modern,
    /// Original COSMAC VIP behaviour
    Vip,
    /// Fx1E sets VF on overflow
    Amiga,
}

/// Headless CHIP-8 runner.
///
/// Runs a ROM on a virtual clock with no window, sound or keyboard, then
/// prints the framebuffer and registers. Set RUST_LOG=trace to see every
/// executed instruction.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Path to the CHIP-8 ROM file
    rom_path: PathBuf,

    /// Number of 60Hz frames to run
    #[arg(short, long, default_value_t = 600)]
    frames: u32,

    /// Instructions per second
    #[arg(long, default_value_t = chip8_core::DEFAULT_CPU_HZ, value_parser = parse_cpu_hz)]
    cpu_hz: f32,

    /// Stop once the program counter reaches this address
    #[arg(long, value_parser = maybe_hex::<u16>)]
    stop_at: Option<u16>,

    /// Seed for the Cxnn random number generator
    #[arg(long, value_parser = maybe_hex::<u64>)]
    seed: Option<u64>,

    /// Base quirk set; individual flags below are applied on top
    #[arg(long, value_enum, default_value_t = Preset::Modern)]
    quirks: Preset,

    /// 8xy6/8xyE shift VY into VX
    #[arg(long)]
    shift_uses_vy: bool,

    /// Fx0A waits for the key to be released
    #[arg(long)]
    wait_for_release: bool,

    /// Fx1E sets VF when I passes 0xFFF
    #[arg(long)]
    index_add_sets_flag: bool,

    /// 8xy1/8xy2/8xy3 reset VF
    #[arg(long)]
    logic_resets_flag: bool,

    /// Fx55/Fx65 advance I
    #[arg(long)]
    load_store_increments_index: bool,
}

fn parse_cpu_hz(s: &str) -> Result<f32, String> {
    let hz: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if hz.is_finite() && hz > 0.0 {
        Ok(hz)
    } else {
        Err(format!("{hz} is not a positive rate"))
    }
}

impl Args {
    fn quirks(&self) -> Quirks {
        let mut quirks = match self.quirks {
            Preset::Modern => Quirks::default(),
            Preset::Vip => Quirks::cosmac_vip(),
            Preset::Amiga => Quirks::amiga(),
        };
        quirks.shift_uses_vy |= self.shift_uses_vy;
        quirks.wait_for_release |= self.wait_for_release;
        quirks.index_add_sets_flag |= self.index_add_sets_flag;
        quirks.logic_resets_flag |= self.logic_resets_flag;
        quirks.load_store_increments_index |= self.load_store_increments_index;
        quirks
    }
}

fn render(chip8: &Chip8) -> String {
    let mut out = String::with_capacity((DISPLAY_X + 1) * DISPLAY_Y);
    for row in chip8.display() {
        out.extend(row.iter().map(|&on| if on { '#' } else { '.' }));
        out.push('\n');
    }
    out
}

fn summary(chip8: &Chip8) -> String {
    let regs: Vec<String> = chip8
        .v()
        .iter()
        .enumerate()
        .map(|(i, v)| format!("V{i:X}={v:02X}"))
        .collect();
    format!(
        "PC={:04X} I={:04X} SP={} DT={:02X} ST={:02X}\n{}",
        chip8.pc(),
        chip8.index(),
        chip8.stack_pointer(),
        chip8.delay_timer(),
        chip8.sound_timer(),
        regs.join(" ")
    )
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rom = std::fs::read(&args.rom_path)
        .with_context(|| format!("Failed to read ROM file {}", args.rom_path.display()))?;

    let mut builder = Chip8Builder::new().quirks(args.quirks());
    if let Some(seed) = args.seed {
        builder = builder.rng_seed(seed);
    }
    let chip8 = builder
        .load(&rom)
        .context("Failed to load ROM into CHIP-8 memory")?;

    let mut runner =
        Chip8Runner::with_cpu_hz(chip8, args.cpu_hz).context("Invalid CPU rate")?;
    runner.stop_at(args.stop_at);

    let dt = 1.0 / TIMER_HZ;
    for frame in 0..args.frames {
        let result = runner
            .update(dt)
            .with_context(|| format!("Chip8 execution error in frame {frame}"))?;

        if result == Chip8RunnerResult::Stopped {
            info!("Reached {:#05X} in frame {frame}", runner.chip8_ref().pc());
            break;
        }
    }

    print!("{}", render(runner.chip8_ref()));
    println!("{}", summary(runner.chip8_ref()));

    Ok(())
}
