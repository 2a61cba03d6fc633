//! # machine state
//!
//! Everything a running CHIP-8 program can observe apart from the screen:
//!
//!  * V0-VF   sixteen 8-bit registers; VF doubles as the carry/borrow/collision flag
//!  * I       16-bit address register
//!  * PC      16-bit program counter, starting at 0x200
//!  * stack   return addresses, at most 16 deep
//!  * timers  delay and sound, counting down at 60Hz
//!  * keypad  16 keys, 0x0-0xF
//!  * memory  4K, see `memory`
use std::convert::TryFrom;
use std::fmt;

use crate::error::Fault;
use crate::memory::{Chip8MemoryMap, MemoryMap, CHIP8_PROGRAM_ADDR};

/// how deep subroutine calls can nest
pub const CHIP8_STACK_DEPTH: usize = 16;

/// number of general purpose registers, and of keys
pub const CHIP8_REGISTER_COUNT: usize = 16;
pub const CHIP8_KEY_COUNT: usize = 16;

/// index of a general purpose register; can only hold 0x0-0xF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reg(u8);

impl Reg {
    /// the flags register
    pub const VF: Reg = Reg(0xf);
    pub const V0: Reg = Reg(0x0);

    /// take the low nibble, as found in an instruction word
    pub fn from_nibble(n: u8) -> Self {
        Reg(n & 0x0f)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// V0 up to and including `self`
    pub fn through(self) -> impl Iterator<Item = Reg> {
        (0..=self.0).map(Reg)
    }
}

impl TryFrom<u8> for Reg {
    type Error = Fault;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        if (index as usize) < CHIP8_REGISTER_COUNT {
            Ok(Reg(index))
        } else {
            Err(Fault::InvalidRegister { index })
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{:X}", self.0)
    }
}

/// the sixteen pressable keys, as seen by the program
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keypad {
    pressed: [bool; CHIP8_KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// a key value from a register; only 0x0-0xF are keys
    pub fn is_pressed(&self, key: u8) -> Result<bool, Fault> {
        self.pressed
            .get(key as usize)
            .copied()
            .ok_or(Fault::InvalidKey { value: key })
    }

    /// keys outside 0x0-0xF are ignored
    pub fn set(&mut self, key: u8, pressed: bool) {
        if let Some(k) = self.pressed.get_mut(key as usize) {
            *k = pressed;
        }
    }

    /// keys currently held, lowest first
    pub fn held(&self) -> impl Iterator<Item = u8> + '_ {
        (0..CHIP8_KEY_COUNT as u8).filter(move |k| self.pressed[*k as usize])
    }
}

/// the state of one emulation run
pub struct Machine {
    pub memory: Chip8MemoryMap,
    v: [u8; CHIP8_REGISTER_COUNT],
    i: u16,
    pc: u16,
    stack: Vec<u16>,
    delay_timer: u8,
    sound_timer: u8,
    pub keypad: Keypad,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            memory: Chip8MemoryMap::new(),
            v: [0; CHIP8_REGISTER_COUNT],
            i: 0x0000,
            pc: CHIP8_PROGRAM_ADDR,
            stack: Vec::with_capacity(CHIP8_STACK_DEPTH),
            delay_timer: 0x00,
            sound_timer: 0x00,
            keypad: Keypad::new(),
        }
    }

    pub fn v(&self, r: Reg) -> u8 {
        self.v[r.index()]
    }

    pub fn set_v(&mut self, r: Reg, value: u8) {
        self.v[r.index()] = value;
    }

    /// the whole register file, V0 first
    pub fn registers(&self) -> &[u8; CHIP8_REGISTER_COUNT] {
        &self.v
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn set_i(&mut self, value: u16) {
        self.i = value;
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    /// move on one instruction
    pub fn advance(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// set PC so the advance that ends every instruction lands on `target`
    pub fn jump(&mut self, target: u16) {
        self.pc = target.wrapping_sub(2);
    }

    /// step over the next instruction when `cond` holds
    pub fn skip_if(&mut self, cond: bool) {
        if cond {
            self.advance();
        }
    }

    /// write a result to `r`, then its flag to VF
    pub fn set_with_flag(&mut self, r: Reg, (value, flag): (u8, u8)) {
        self.set_v(r, value);
        self.set_v(Reg::VF, flag);
    }

    pub fn push(&mut self, addr: u16) -> Result<(), Fault> {
        if self.stack.len() >= CHIP8_STACK_DEPTH {
            return Err(Fault::StackOverflow {
                depth: CHIP8_STACK_DEPTH,
            });
        }
        self.stack.push(addr);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, Fault> {
        self.stack.pop().ok_or(Fault::StackUnderflow)
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.delay_timer = value;
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn set_sound_timer(&mut self, value: u8) {
        self.sound_timer = value;
    }

    /// one 60Hz tick; both timers stop at zero
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn read(&self, addr: usize) -> Result<u8, Fault> {
        self.memory.read_byte(addr)
    }

    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), Fault> {
        self.memory.write_byte(addr, value)
    }

    /// the instruction word at PC
    pub fn fetch(&self) -> Result<u16, Fault> {
        self.memory.get_word(self.pc as usize)
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PC={:04X} I={:04X} V=", self.pc, self.i)?;
        for v in self.v.iter() {
            write!(f, "{:02X} ", v)?;
        }
        write!(
            f,
            "DT={:02X} ST={:02X} SP={}",
            self.delay_timer,
            self.sound_timer,
            self.stack.len()
        )
    }
}
