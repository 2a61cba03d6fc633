use clap::Parser;
use log::{warn, LevelFilter};
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use chip8::config::{
    Config, DEFAULT_FRAME_RATE, DEFAULT_INSTRUCTIONS_PER_FRAME, DEFAULT_KEY_HOLD_FRAMES,
};
use chip8::display::MonoTermDisplay;
use chip8::emulator::Emulator;
use chip8::error::Chip8Error;
use chip8::input::{Keymap, TermInput};
use chip8::interpreter::{Chip8Interpreter, Termination};
use chip8::screen::{SCREEN_HEIGHT, SCREEN_WIDTH};
use chip8::sound::{Mute, SimpleBeep, Sound};

/// Run a CHIP-8 program in the terminal. Esc quits.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// program image to run, loaded at 0x200
    rom: PathBuf,

    /// instructions executed per frame
    #[arg(long, default_value_t = DEFAULT_INSTRUCTIONS_PER_FRAME)]
    ipf: u32,

    /// frames (and timer ticks) per second
    #[arg(long, default_value_t = DEFAULT_FRAME_RATE)]
    fps: u32,

    /// seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,

    /// which keyboard keys stand in for the hex keypad
    #[arg(long, value_enum, default_value_t = Keymap::Conventional)]
    keymap: Keymap,

    /// frames a key stays down after it's pressed
    #[arg(long, default_value_t = DEFAULT_KEY_HOLD_FRAMES)]
    hold: u32,

    /// no beeping
    #[arg(long)]
    mute: bool,

    /// stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// more logging on stderr; -vv traces every instruction
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut builder = colog::basic_builder();
    builder.filter_level(match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });
    builder.init();

    if args.rom.extension().map_or(true, |ext| ext != "ch8") {
        warn!(
            "{} doesn't have the usual .ch8 extension, it may not be a CHIP-8 program",
            args.rom.display()
        );
    }

    let config = Config {
        instructions_per_frame: args.ipf,
        frame_rate: args.fps,
        key_hold_frames: args.hold,
        seed: args.seed,
    };
    let mut interpreter = Chip8Interpreter::new(config);
    let mut f = File::open(&args.rom)?;
    interpreter.load_program(&mut f)?;

    let title = args
        .rom
        .file_name()
        .map_or_else(|| "CHIP-8".to_string(), |n| n.to_string_lossy().into_owned());

    // the terminal is only put back once the devices are dropped, so finish
    // with them before reporting anything
    let outcome = {
        let mut display = MonoTermDisplay::new(SCREEN_WIDTH, SCREEN_HEIGHT, &title)?;
        let mut input = TermInput::new(args.keymap, args.hold)?;
        let mut sound: Box<dyn Sound> = if args.mute {
            Box::new(Mute::new())
        } else {
            Box::new(SimpleBeep::new())
        };
        let mut emulator = Emulator::new(interpreter, &mut display, &mut input, sound.as_mut());
        emulator.main_loop(args.frames)
    };

    match summary(&title, outcome)? {
        Ok(message) => println!("{}", message),
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
    }
    Ok(())
}

/// What to tell the user once the terminal is back: `Ok` for a clean finish,
/// `Err` for a fault. Other errors are passed on.
fn summary(
    title: &str,
    outcome: Result<Termination, Chip8Error>,
) -> Result<Result<String, String>, Chip8Error> {
    match outcome {
        Ok(Termination::Exhausted) => Ok(Ok(format!("-- end of program {} --", title))),
        Ok(Termination::Stopped) => Ok(Ok(format!("-- emulation of {} stopped --", title))),
        Ok(Termination::Faulted(e)) | Err(Chip8Error::Fatal(e)) => {
            Ok(Err(format!("{}: {}", title, e)))
        }
        Err(e) => Err(e),
    }
}
