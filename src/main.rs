mod visualizer;

use anyhow::{Context, Result};
use clap::Parser;
use corn64::config::Config;
use corn64::emulator::ascii_display;
use corn64::emulator::engine::StepEngine;
use corn64::rom::RomImage;
use corn64::session::Session;
use log::{info, warn};
use std::path::PathBuf;

/// Experimental console emulator front-end.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// ROM image to load at startup (.z64, .n64 or .v64)
    rom: Option<PathBuf>,

    /// TOML file overriding the built-in settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Window scale factor
    #[arg(long)]
    scale: Option<u32>,

    /// Run this many steps without a window and print the last frame
    #[arg(long, value_name = "STEPS")]
    headless: Option<u64>,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(scale) = args.scale {
        config.scale = scale;
    }
    config.validate()?;
    Ok(config)
}

fn run_headless(config: &Config, rom: Option<&PathBuf>, steps: u64) -> Result<()> {
    let mut engine = StepEngine::with_test_pattern(config);
    if let Some(path) = rom {
        let rom = RomImage::read(path).with_context(|| format!("reading {}", path.display()))?;
        engine.load_image(&rom.bytes)?;
    }
    for _ in 0..steps {
        engine.step()?;
    }
    let frame = engine.snapshot_framebuffer();
    print!("{}", ascii_display::render_frame(&frame, 8));
    println!(
        "frame {}, pc {:#010x}",
        frame.frame_number(),
        engine.program_counter().0
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = load_config(&args)?;

    if let Some(steps) = args.headless {
        return run_headless(&config, args.rom.as_ref(), steps);
    }

    let mut session = Session::from_config(&config);
    if let Some(path) = &args.rom {
        session.load_file(path);
    }
    info!("{}", session.status());

    visualizer::main(&config, &mut session, args.rom.clone());

    if !session.shutdown(config.shutdown_timeout()) {
        warn!("Exiting with the worker thread still running");
    }
    Ok(())
}
