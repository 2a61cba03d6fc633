use std::io::{self, Read};

use crate::error::{Fault, LoadError};

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// largest program image that fits between the program address and the top of RAM
pub const CHIP8_PROGRAM_MAX_LEN: usize = CHIP8_RAM_SIZE_BYTES - CHIP8_PROGRAM_ADDR as usize;

/// where the font lives, and how many bytes each glyph takes
pub const CHIP8_FONT_ADDR: u16 = 0x000;
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;

/// Represents the byte-addressable memory of the machine. Reads and writes
/// past the end are faults rather than panics, since a running program can
/// point I anywhere it likes.
pub trait MemoryMap {
    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: usize, len: usize) -> Result<&[u8], Fault>;

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: usize, len: usize) -> Result<&mut [u8], Fault>;

    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: usize) -> Result<(), Fault> {
        self.get_rw_slice(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    fn read_byte(&self, addr: usize) -> Result<u8, Fault> {
        Ok(self.get_ro_slice(addr, 1)?[0])
    }

    fn write_byte(&mut self, addr: usize, value: u8) -> Result<(), Fault> {
        self.get_rw_slice(addr, 1)?[0] = value;
        Ok(())
    }

    /// get a big-endian two-byte word (instructions)
    fn get_word(&self, addr: usize) -> Result<u16, Fault> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }
}

/// Defines the CHIP-8 memory map
///   0x0000-0x004f  font, 16 glyphs of 5 bytes
///   0x0050-0x01ff  unused (the interpreter lived here on real hardware)
///   0x0200-0x0fff  program
///
/// stack, timers and display are kept outside of addressable memory
pub struct Chip8MemoryMap {
    bytes: Box<[u8; CHIP8_RAM_SIZE_BYTES]>,
}

impl MemoryMap for Chip8MemoryMap {
    fn get_ro_slice(&self, addr: usize, len: usize) -> Result<&[u8], Fault> {
        let end = checked_end(addr, len)?;
        Ok(&self.bytes[addr..end])
    }

    fn get_rw_slice(&mut self, addr: usize, len: usize) -> Result<&mut [u8], Fault> {
        let end = checked_end(addr, len)?;
        Ok(&mut self.bytes[addr..end])
    }
}

/// reports the first address that falls off the end
fn checked_end(addr: usize, len: usize) -> Result<usize, Fault> {
    let end = addr.saturating_add(len);
    if end > CHIP8_RAM_SIZE_BYTES {
        Err(Fault::MemoryOutOfRange {
            address: addr.max(CHIP8_RAM_SIZE_BYTES),
        })
    } else {
        Ok(end)
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip8MemoryMap {
    /// zeroed RAM with the font baked in
    pub fn new() -> Self {
        let mut bytes = Box::new([0u8; CHIP8_RAM_SIZE_BYTES]);
        let font = CHIP8_FONT_ADDR as usize;
        bytes[font..font + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
        Chip8MemoryMap { bytes }
    }

    /// load a CHIP-8 program at 0x200, refusing anything that won't fit
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, LoadError> {
        // read one byte past the limit so an oversized image is spotted without
        // slurping an arbitrarily large file
        let mut buf = Vec::with_capacity(CHIP8_PROGRAM_MAX_LEN);
        let len = reader
            .by_ref()
            .take(CHIP8_PROGRAM_MAX_LEN as u64 + 1)
            .read_to_end(&mut buf)?;
        if len > CHIP8_PROGRAM_MAX_LEN {
            let rest = io::copy(reader, &mut io::sink())?;
            return Err(LoadError::too_large(len + rest as usize));
        }
        self.load_bytes(&buf)?;
        Ok(len)
    }

    /// as `load_program`, for an image already in memory
    pub fn load_bytes(&mut self, program: &[u8]) -> Result<(), LoadError> {
        if program.len() > CHIP8_PROGRAM_MAX_LEN {
            return Err(LoadError::too_large(program.len()));
        }
        let start = CHIP8_PROGRAM_ADDR as usize;
        self.bytes[start..].fill(0);
        self.bytes[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// whether any nonzero byte sits at or after `addr`; unused RAM is
    /// zeroed, so once this is false there's nothing left to run
    pub fn has_instructions_from(&self, addr: usize) -> bool {
        self.bytes
            .get(addr..)
            .map_or(false, |rest| rest.iter().any(|b| *b != 0))
    }

    /// address of the font glyph for hex digit `digit`
    pub fn font_addr(digit: u8) -> u16 {
        CHIP8_FONT_ADDR + CHIP8_FONT_GLYPH_BYTES * digit as u16
    }
}

const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
