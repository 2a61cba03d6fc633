//! # chip8
//!
//! An interpreter for the CHIP-8 virtual machine: sixteen 8-bit registers, a
//! 4K address space, a 16-deep call stack, delay and sound timers, a 64x32
//! monochrome screen and a 16-key hex keypad.
//!
//! ## Design
//!
//! * bit-exact instruction semantics; the 35 instructions are classified by an
//!   ordered list of (mask, value) rules, since the masks overlap
//! * frame driven: each frame runs a fixed budget of instructions then ticks
//!   the timers once, at 60 frames a second by default
//! * nothing blocks; FX0A (wait for key) is a state the driver sits in until
//!   the input device reports a press
//! * every fault (bad opcode, stack under/overflow, memory out of range) ends
//!   the run with the PC and instruction it happened at
//! * display, input and sound sit behind traits, so the core can run headless
//!
//! ## Model
//!
//! ```text
//! Emulator                                   (emulator)
//!  |-- display, input, sound                 (display, input, sound)
//!  `-- Chip8Interpreter, the frame driver    (interpreter, config)
//!       |-- Machine: registers, stack, timers, keypad, memory
//!       |                                    (machine, memory)
//!       |-- Screen                           (screen)
//!       `-- fetch -> classify -> execute     (opcode, executor)
//! ```
//!
//! Running a program without any devices:
//!
//! ```
//! use chip8::{Chip8Interpreter, Config, DriverState, KeyboardState, Termination};
//! use std::sync::atomic::AtomicBool;
//!
//! let mut interpreter = Chip8Interpreter::new(Config::default());
//! interpreter.load_bytes(&[0x60, 0x05, 0x70, 0x03]).unwrap();
//! let stop = AtomicBool::new(false);
//! let report = interpreter.run_frame(&KeyboardState::default(), &stop).unwrap();
//! assert_eq!(report.state, DriverState::Terminated(Termination::Exhausted));
//! assert_eq!(interpreter.machine().registers()[0], 8);
//! ```
pub mod config;
pub mod display;
pub mod emulator;
pub mod error;
pub mod executor;
pub mod input;
pub mod interpreter;
pub mod machine;
pub mod memory;
pub mod opcode;
pub mod screen;
pub mod sound;

pub use config::Config;
pub use emulator::Emulator;
pub use error::{Chip8Error, FatalError, Fault, LoadError};
pub use input::{KeyboardState, Keymap};
pub use interpreter::{Chip8Interpreter, DriverState, FrameReport, Termination};
pub use machine::{Machine, Reg};
pub use opcode::{classify, Instruction, Opcode};
pub use screen::Screen;
