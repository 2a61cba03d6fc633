/// # environment
///
/// Sets everything up and runs the main loop. The interpreter knows nothing
/// about terminals or speakers; this is where its frames meet the display,
/// input and sound devices, and where wall clock timing comes in.
///
///  main loop
///   |-- keys = input.poll()            // Esc raises the stop flag
///   |-- report = interpreter.run_frame(keys, stop)
///   |-- display.draw(screen)           // only when it changed
///   |-- sound.set_active(..)           // only when it changed
///   `-- sleep until the next frame is due
use log::info;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::display::Display;
use crate::error::{Chip8Error, LoadError, Result};
use crate::input::Input;
use crate::interpreter::{Chip8Interpreter, DriverState, Termination};
use crate::sound::Sound;

pub struct Emulator<'a> {
    interpreter: Chip8Interpreter,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    stop: AtomicBool,
    beeping: bool,
}

impl<'a> Emulator<'a> {
    pub fn new(
        interpreter: Chip8Interpreter,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
    ) -> Self {
        Emulator {
            interpreter,
            display,
            input,
            sound,
            stop: AtomicBool::new(false),
            beeping: false,
        }
    }

    /// load a chip8 program
    pub fn load_program(
        &mut self,
        reader: &mut impl io::Read,
    ) -> std::result::Result<usize, LoadError> {
        self.interpreter.load_program(reader)
    }

    pub fn interpreter(&self) -> &Chip8Interpreter {
        &self.interpreter
    }

    /// ask the main loop to finish at the next instruction boundary
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// push the current screen out to the display
    pub fn redraw(&mut self) -> std::result::Result<(), io::Error> {
        let frame = self.interpreter.screen().packed();
        if frame.len() != self.display.frame_size_bytes() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "display takes {} byte frames, screen packs to {}",
                    self.display.frame_size_bytes(),
                    frame.len()
                ),
            ));
        }
        self.display.draw(&frame)
    }

    fn set_sound(&mut self, active: bool) -> Result<()> {
        if active != self.beeping {
            self.sound
                .set_active(active)
                .map_err(|e| Chip8Error::Sound(e.to_string()))?;
            self.beeping = active;
        }
        Ok(())
    }

    /// Run frames in real time until the program ends, the user quits, or
    /// `max_frames` have gone by. A fault comes back as an error.
    pub fn main_loop(&mut self, max_frames: Option<u64>) -> Result<Termination> {
        let config = self.interpreter.config();
        let frame_time = config.frame_duration();
        info!(
            "running {} instructions a second at {} fps",
            config.frequency(),
            config.frame_rate
        );
        let mut deadline = Instant::now();
        let mut frames = 0u64;
        self.redraw()?;

        loop {
            if max_frames.map_or(false, |max| frames >= max) {
                self.request_stop();
            }
            let keys = self.input.poll()?;
            if keys.quit {
                self.request_stop();
            }

            let report = match self.interpreter.run_frame(&keys, &self.stop) {
                Ok(report) => report,
                Err(e) => {
                    self.set_sound(false)?;
                    return Err(e.into());
                }
            };
            if report.screen_changed {
                self.redraw()?;
            }
            self.set_sound(report.sound_active)?;

            if let DriverState::Terminated(reason) = report.state {
                info!("emulation ended after {} frames: {:?}", frames, reason);
                return Ok(reason);
            }
            frames += 1;

            deadline += frame_time;
            let now = Instant::now();
            if deadline > now {
                spin_sleep::sleep(deadline - now);
            } else {
                // running behind; don't try to catch up
                deadline = now;
            }
        }
    }
}
