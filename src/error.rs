use std::io;
use thiserror::Error;

use crate::memory::CHIP8_PROGRAM_MAX_LEN;

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// reasons a program image never makes it into memory
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("can't read program: {0}")]
    Io(#[from] io::Error),
}

impl LoadError {
    pub(crate) fn too_large(size: usize) -> Self {
        LoadError::TooLarge {
            size,
            max: CHIP8_PROGRAM_MAX_LEN,
        }
    }
}

/// something went wrong inside the machine; none of these are recoverable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("unknown opcode {word:#06X}")]
    UnknownOpcode { word: u16 },

    #[error("stack underflow: return with an empty call stack")]
    StackUnderflow,

    #[error("stack overflow: more than {depth} nested calls")]
    StackOverflow { depth: usize },

    #[error("memory access out of bounds at address {address:#06X}")]
    MemoryOutOfRange { address: usize },

    #[error("register V{index:X} doesn't exist")]
    InvalidRegister { index: u8 },

    #[error("key {value:#04X} doesn't exist on the keypad")]
    InvalidKey { value: u8 },
}

/// a fault pinned to where it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{fault} at pc {pc:#05X} (instruction {word:#06X})")]
pub struct FatalError {
    pub fault: Fault,
    pub pc: u16,
    pub word: u16,
}

impl Fault {
    pub fn at(self, pc: u16, word: u16) -> FatalError {
        FatalError {
            fault: self,
            pc,
            word,
        }
    }
}

/// everything the environment can fail with
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("emulation aborted: {0}")]
    Fatal(#[from] FatalError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("sound error: {0}")]
    Sound(String),
}
