use clap::Parser;
use edgeboy::error::EdgeError;
use edgeboy::gameboy::{System, SystemConfig};
use edgeboy::rom::load_rom;
use edgeboy::video::palette::ScreenStyle;
use log::{error, info, LevelFilter};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(version, about = "Cycle stepped DMG emulator")]
struct Args {
    /// Path to a .gb ROM or a .zip containing one
    rom: PathBuf,

    /// Path to the 256 byte DMG boot ROM, skipped when absent
    #[arg(long)]
    boot_rom: Option<PathBuf>,

    /// Directory for battery RAM, save states and screenshots
    #[arg(long, default_value = "states")]
    state_dir: PathBuf,

    /// Number of frames to run, forever when neither this nor --cycles is given
    #[arg(long, conflicts_with = "cycles")]
    frames: Option<u64>,

    /// Number of CPU cycles to run
    #[arg(long)]
    cycles: Option<usize>,

    /// Save slot to load before running
    #[arg(long)]
    load_slot: Option<usize>,

    #[arg(long, default_value_t = ScreenStyle::White)]
    screen_style: ScreenStyle,

    /// Write a screenshot every n frames, 0 disables
    #[arg(long, default_value_t = 0)]
    screenshot_every: u64,

    /// Periodically save the main slot
    #[arg(long)]
    autosave: bool,

    /// Log every executed instruction (needs --log-level trace)
    #[arg(long)]
    trace: bool,

    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,

    /// Also append log output to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn setup_logger(level: LevelFilter, log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message)))
        .level(level)
        .chain(std::io::stdout());

    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}

fn run(args: &Args) -> Result<(), EdgeError> {
    let rom = load_rom(&args.rom)?;
    let boot_rom = match &args.boot_rom {
        Some(path) => Some(load_rom(path)?),
        None => None,
    };

    let config = SystemConfig {
        boot_rom,
        state_dir: Some(args.state_dir.clone()),
        screen_style: args.screen_style,
        autosave: args.autosave,
        debug_print: args.trace,
    };
    let mut system = System::new(rom, config)?;
    info!("Running {}", system.title());

    if let Some(slot) = args.load_slot {
        system.load_state(slot)?;
    }

    if let Some(cycles) = args.cycles {
        let spent = system.run_cycles(cycles);
        info!("Ran {} cycles, {} frames", spent, system.frame_count());
        return Ok(());
    }

    let screenshot_dir = system
        .states()
        .map(|states| states.game_dir().join("screenshots"))
        .unwrap_or_else(|| PathBuf::from("screenshots"));

    loop {
        let frame = system.run_frame()?;

        if args.screenshot_every > 0 && frame % args.screenshot_every == 0 {
            std::fs::create_dir_all(&screenshot_dir).ok();
            system.take_screenshot(&screenshot_dir.join(format!("frame_{:06}.png", frame)))?;
        }

        if args.frames.map_or(false, |frames| frame >= frames) {
            info!("Ran {} frames", frame);
            return Ok(());
        }
    }
}

fn main() {
    let args = Args::parse();

    if let Err(e) = setup_logger(args.log_level, args.log_file.as_deref()) {
        eprintln!("Failed to set up logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
