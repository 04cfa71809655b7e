//! ym-deltat command line
//!
//! Renders ADPCM-B samples from a ROM image to WAV through the emulated
//! Delta-T unit.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flexi_logger::Logger;
use std::path::PathBuf;

use ym_deltat::{render, write_wav, ChipVariant, RenderSettings};

#[derive(Parser)]
#[command(version, about = "Yamaha ADPCM-B (Delta-T) sample renderer")]
struct Cli {
    #[arg(help = "Enable debug logging", long, short, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Render a ROM sample window to a WAV file")]
    Render(RenderArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    #[arg(help = "ADPCM-B ROM image", long)]
    rom: PathBuf,

    #[arg(help = "Output WAV file", long, short)]
    output: PathBuf,

    #[arg(help = "Start address register ($02/$03), hex", long, value_parser = parse_hex_u16)]
    start: u16,

    #[arg(help = "Stop address register ($04/$05), hex", long, value_parser = parse_hex_u16)]
    end: u16,

    #[arg(help = "Delta-N rate register ($09/$0A), hex", long, value_parser = parse_hex_u16, default_value = "8000")]
    delta_n: u16,

    #[arg(help = "Chip variant: ym2608, ym2610, y8950", long, default_value = "ym2610")]
    variant: ChipVariant,

    #[arg(help = "Master clock in Hz (defaults to the chip's usual clock)", long)]
    clock: Option<u32>,

    #[arg(help = "Output sample rate in Hz", long, default_value_t = 44_100)]
    rate: u32,

    #[arg(help = "Output level register ($0B)", long, default_value_t = 0xFF)]
    volume: u8,

    #[arg(help = "Loop at the stop address", long, default_value_t = false)]
    repeat: bool,

    #[arg(help = "Maximum length in seconds", long, default_value_t = 60.0)]
    max_seconds: f32,

    #[arg(help = "Write stereo (duplicated) output", long, default_value_t = false)]
    stereo: bool,

    #[arg(help = "Write the final unit state as JSON", long)]
    state_out: Option<PathBuf>,
}

fn parse_hex_u16(s: &str) -> std::result::Result<u16, String> {
    let digits = s
        .trim_start_matches("0x")
        .trim_start_matches("0X")
        .trim_start_matches('$');
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value '{s}': {e}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let spec = if cli.verbose { "debug" } else { "warn" };
    let _logger = Logger::try_with_env_or_str(spec)
        .context("invalid log specification")?
        .start()
        .context("failed to start logger")?;

    match cli.command {
        Commands::Render(args) => run_render(args),
    }
}

fn run_render(args: RenderArgs) -> Result<()> {
    let rom = std::fs::read(&args.rom)
        .with_context(|| format!("failed to read ROM {}", args.rom.display()))?;

    let mut settings = RenderSettings::new(args.variant);
    if let Some(clock) = args.clock {
        settings.master_clock = clock;
    }
    settings.sample_rate = args.rate;
    settings.start = args.start;
    settings.end = args.end;
    settings.delta_n = args.delta_n;
    settings.volume = args.volume;
    settings.repeat = args.repeat;
    settings.max_samples = (args.max_seconds.max(0.0) * args.rate as f32) as usize;

    log::info!(
        "rendering {} window {:#06x}..={:#06x} at delta-N {:#06x}",
        settings.variant,
        settings.start,
        settings.end,
        settings.delta_n
    );

    let out = render(rom, &settings).context("render failed")?;

    let channels = if args.stereo { 2 } else { 1 };
    write_wav(&args.output, &out.samples, settings.sample_rate, channels)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    if let Some(path) = &args.state_out {
        let json = out.snapshot.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    println!(
        "Wrote {} samples ({:.2}s) to {}{}",
        out.samples.len(),
        out.samples.len() as f32 / settings.sample_rate as f32,
        args.output.display(),
        if out.reached_end { "" } else { " (stopped at length cap)" }
    );
    Ok(())
}
