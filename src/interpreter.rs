/// # interpreter
///
/// Drives the machine one frame at a time. A frame is:
///
///  1. take the keyboard state from the input device
///  2. if the program is waiting on FX0A, hand it the first key pressed
///  3. run up to `instructions_per_frame` instructions
///  4. tick both timers once
///
/// after which the caller presents the screen and plays (or stops) the tone.
/// Nothing here blocks: waiting for a key is just a state that frames pass
/// through until a press turns up, so a stop request is always noticed.
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::Config;
use crate::error::{FatalError, Fault, LoadError};
use crate::executor::{execute, Effect};
use crate::input::KeyboardState;
use crate::machine::{Machine, Reg};
use crate::memory::CHIP8_RAM_SIZE_BYTES;
use crate::opcode::Instruction;
use crate::screen::Screen;

/// why a run came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// PC ran off the end of memory, or only zeroes are left ahead of it
    Exhausted,
    /// asked to stop from outside
    Stopped,
    /// the program did something impossible
    Faulted(FatalError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    /// FX0A is waiting for a key to store in `register`
    WaitingForInput { register: Reg },
    Terminated(Termination),
}

/// what happened during one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub state: DriverState,
    /// instructions actually run
    pub executed: u32,
    /// the screen needs presenting
    pub screen_changed: bool,
    /// the tone should be playing
    pub sound_active: bool,
}

pub struct Chip8Interpreter<R: Rng = StdRng> {
    machine: Machine,
    screen: Screen,
    rng: R,
    config: Config,
    state: DriverState,
}

impl Chip8Interpreter<StdRng> {
    /// seeded from `config.seed` when there is one, otherwise from the OS
    pub fn new(config: Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Chip8Interpreter<R> {
    pub fn with_rng(config: Config, rng: R) -> Self {
        Chip8Interpreter {
            machine: Machine::new(),
            screen: Screen::new(),
            rng,
            config,
            state: DriverState::Running,
        }
    }

    /// load a chip8 program
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, LoadError> {
        let len = self.machine.memory.load_program(reader)?;
        info!("loaded {} byte program", len);
        Ok(len)
    }

    pub fn load_bytes(&mut self, program: &[u8]) -> Result<(), LoadError> {
        self.machine.memory.load_bytes(program)
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// external stop request; a run that has already ended keeps its reason
    pub fn stop(&mut self) {
        if !matches!(self.state, DriverState::Terminated(_)) {
            info!("stopped at pc {:#05X}", self.machine.pc());
            self.state = DriverState::Terminated(Termination::Stopped);
        }
    }

    /// Nothing left to run: PC can't fetch a whole word any more, or every
    /// byte from PC onwards is zero.
    pub fn is_exhausted(&self) -> bool {
        let pc = self.machine.pc() as usize;
        pc + 1 >= CHIP8_RAM_SIZE_BYTES || !self.machine.memory.has_instructions_from(pc)
    }

    /// Run a single instruction, if the interpreter is running. Ends the run
    /// on exhaustion or a fault.
    pub fn step(&mut self) -> Result<Effect, FatalError> {
        if self.state != DriverState::Running {
            return Ok(Effect::None);
        }
        if self.is_exhausted() {
            info!("end of program at pc {:#05X}", self.machine.pc());
            self.state = DriverState::Terminated(Termination::Exhausted);
            return Ok(Effect::None);
        }
        match self.fetch_and_execute() {
            Ok(Effect::WaitForKey(register)) => {
                debug!("waiting for a key to store in {}", register);
                self.state = DriverState::WaitingForInput { register };
                Ok(Effect::WaitForKey(register))
            }
            Ok(effect) => Ok(effect),
            Err(e) => {
                self.state = DriverState::Terminated(Termination::Faulted(e));
                Err(e)
            }
        }
    }

    fn fetch_and_execute(&mut self) -> Result<Effect, FatalError> {
        let pc = self.machine.pc();
        let word = self.machine.fetch().map_err(|f| f.at(pc, 0))?;
        let inst = Instruction::decode(word)
            .ok_or_else(|| Fault::UnknownOpcode { word }.at(pc, word))?;
        execute(&inst, &mut self.machine, &mut self.screen, &mut self.rng)
            .map_err(|f| f.at(pc, word))
    }

    /// Run one frame against `input`. `stop` is checked before the frame and
    /// before every instruction in it. A fault ends the run and is returned.
    pub fn run_frame(
        &mut self,
        input: &KeyboardState,
        stop: &AtomicBool,
    ) -> Result<FrameReport, FatalError> {
        let mut report = FrameReport {
            state: self.state,
            executed: 0,
            screen_changed: false,
            sound_active: false,
        };
        if stop.load(Ordering::Relaxed) {
            self.stop();
        }
        if let DriverState::Terminated(_) = self.state {
            report.state = self.state;
            return Ok(report);
        }

        self.machine.keypad = input.keys;
        if let DriverState::WaitingForInput { register } = self.state {
            if let Some(&key) = input.presses.iter().find(|k| (**k as usize) < 16) {
                debug!("key {:X} pressed, stored in {}", key, register);
                self.machine.set_v(register, key);
                self.machine.keypad.set(key, true);
                self.state = DriverState::Running;
            }
        }

        let budget = self.config.instructions_per_frame;
        while self.state == DriverState::Running && report.executed < budget {
            if stop.load(Ordering::Relaxed) {
                self.stop();
                break;
            }
            let effect = self.step()?;
            if let DriverState::Terminated(_) = self.state {
                break;
            }
            report.executed += 1;
            if effect == Effect::ScreenChanged {
                report.screen_changed = true;
            }
        }

        if !matches!(self.state, DriverState::Terminated(_)) {
            self.machine.tick_timers();
            report.sound_active = self.machine.sound_active();
        }
        report.state = self.state;
        Ok(report)
    }
}
