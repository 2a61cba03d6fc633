use beep::beep;
use std::error::Error;

/// the buzzer; on while the sound timer is nonzero
pub trait Sound {
    fn start(&mut self) -> Result<(), Box<dyn Error>>;
    fn stop(&mut self) -> Result<(), Box<dyn Error>>;

    fn set_active(&mut self, active: bool) -> Result<(), Box<dyn Error>> {
        if active {
            self.start()
        } else {
            self.stop()
        }
    }
}

/// C7
pub const BUZZER_PITCH_HZ: u16 = 2093;

/// the PC speaker, through the beep crate
pub struct SimpleBeep {
    pitch: u16,
    playing: bool,
}

impl SimpleBeep {
    pub fn new() -> Self {
        SimpleBeep::with_pitch(BUZZER_PITCH_HZ)
    }

    pub fn with_pitch(pitch: u16) -> Self {
        SimpleBeep {
            pitch,
            playing: false,
        }
    }
}

impl Default for SimpleBeep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sound for SimpleBeep {
    fn start(&mut self) -> Result<(), Box<dyn Error>> {
        if !self.playing {
            beep(self.pitch)?;
            self.playing = true;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        if self.playing {
            // a pitch of 0 silences the speaker
            beep(0)?;
            self.playing = false;
        }
        Ok(())
    }
}

/// no output; counts the calls it gets
#[derive(Debug, Default)]
pub struct Mute {
    pub starts: usize,
    pub stops: usize,
}

impl Mute {
    pub fn new() -> Self {
        Mute::default()
    }
}

impl Sound for Mute {
    fn start(&mut self) -> Result<(), Box<dyn Error>> {
        self.starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        self.stops += 1;
        Ok(())
    }
}
