use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use log::warn;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::Duration;

use crate::machine::{Keypad, CHIP8_KEY_COUNT};

/// map of characters typed on the keyboard to what the chip8 might expect
/// where '1' => 0x01 and 'a' => 0x0a
const CHIP8_LITERAL_KEYMAP: [(char, u8); 16] = [
    ('0', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('4', 0x04),
    ('5', 0x05),
    ('6', 0x06),
    ('7', 0x07),
    ('8', 0x08),
    ('9', 0x09),
    ('a', 0x0a),
    ('b', 0x0b),
    ('c', 0x0c),
    ('d', 0x0d),
    ('e', 0x0e),
    ('f', 0x0f),
];

/// ditto using left-hand side of qwerty keyboard, laid out like the COSMAC
/// keypad:
///   1 2 3 4      1 2 3 C
///   q w e r  =>  4 5 6 D
///   a s d f      7 8 9 E
///   z x c v      A 0 B F
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// ditto for azerty keyboards
const CHIP8_AZERTY_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('a', 0x04),
    ('z', 0x05),
    ('e', 0x06),
    ('q', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('w', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// which physical keys stand in for the sixteen chip8 keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Keymap {
    #[default]
    Conventional,
    Azerty,
    Literal,
}

impl Keymap {
    pub fn table(self) -> HashMap<char, u8> {
        match self {
            Keymap::Conventional => HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            Keymap::Azerty => HashMap::from(CHIP8_AZERTY_KEYMAP),
            Keymap::Literal => HashMap::from(CHIP8_LITERAL_KEYMAP),
        }
    }
}

/// what the keyboard did since the last poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardState {
    /// which keys count as held down right now
    pub keys: Keypad,
    /// keys that went down since the last poll, oldest first
    pub presses: Vec<u8>,
    /// the user asked to leave
    pub quit: bool,
}

impl KeyboardState {
    /// `keys` pressed this frame and still held
    pub fn pressing(keys: &[u8]) -> Self {
        let mut state = KeyboardState::default();
        for k in keys {
            state.keys.set(*k, true);
            state.presses.push(*k);
        }
        state
    }

    pub fn quitting() -> Self {
        KeyboardState {
            quit: true,
            ..KeyboardState::default()
        }
    }
}

/// reads keypresses
pub trait Input {
    /// collect everything that's happened since the last call; never blocks
    fn poll(&mut self) -> Result<KeyboardState, io::Error>;
}

/// Input from the terminal, via crossterm in raw mode. Terminals only report
/// key presses (and auto-repeat), so a key counts as held for a few frames
/// after each press.
pub struct TermInput {
    keymap: HashMap<char, u8>,
    hold_frames: u32,
    held: [u32; CHIP8_KEY_COUNT],
}

impl TermInput {
    pub fn new(keymap: Keymap, hold_frames: u32) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            keymap: keymap.table(),
            hold_frames,
            held: [0; CHIP8_KEY_COUNT],
        })
    }

    fn read_events(&mut self, state: &mut KeyboardState) -> Result<(), io::Error> {
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                match evt.code {
                    KeyCode::Esc => state.quit = true,
                    KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                        state.quit = true
                    }
                    KeyCode::Char(c) => match self.keymap.get(&c.to_ascii_lowercase()) {
                        Some(&key) => {
                            self.held[key as usize] = self.hold_frames.max(1);
                            state.presses.push(key);
                        }
                        None => warn!("can't map {:?} to a COSMAC key", c),
                    },
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TermInput {
    fn poll(&mut self) -> Result<KeyboardState, io::Error> {
        for frames in self.held.iter_mut() {
            *frames = frames.saturating_sub(1);
        }
        let mut state = KeyboardState::default();
        self.read_events(&mut state)?;
        for (key, frames) in self.held.iter().enumerate() {
            state.keys.set(key as u8, *frames > 0);
        }
        Ok(state)
    }
}

/// dummy Input implementation for testing; plays back one state per poll,
/// then reports nothing
pub struct DummyInput {
    script: VecDeque<KeyboardState>,
}

impl DummyInput {
    pub fn scripted(frames: Vec<KeyboardState>) -> Self {
        DummyInput {
            script: frames.into(),
        }
    }
}

impl Input for DummyInput {
    fn poll(&mut self) -> Result<KeyboardState, io::Error> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}
