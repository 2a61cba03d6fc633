//! # instruction set
//!
//! Every CHIP-8 instruction is a big-endian 16-bit word. The top nibble picks
//! a family and, for some families, the bottom nibble or byte picks a member.
//! Operand fields use the usual names:
//!
//!  * `X`, `Y`  register nibbles at bits 8-11 and 4-7
//!  * `N`       4-bit immediate at bits 0-3
//!  * `NN`      8-bit immediate at bits 0-7
//!  * `NNN`     12-bit address at bits 0-11
use std::fmt;

use crate::machine::Reg;

/// the 35 instruction kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// call a machine routine at NNN (ignored by modern interpreters)
    Sys,
    /// clear the screen
    Cls,
    /// return from subroutine
    Ret,
    /// jump to NNN
    Jump,
    /// call subroutine at NNN
    Call,
    /// skip next if VX == NN
    SkipEqImm,
    /// skip next if VX != NN
    SkipNeImm,
    /// skip next if VX == VY
    SkipEqReg,
    /// VX = NN
    LoadImm,
    /// VX += NN, no carry
    AddImm,
    /// VX = VY
    Move,
    /// VX |= VY
    Or,
    /// VX &= VY
    And,
    /// VX ^= VY
    Xor,
    /// VX += VY, VF = carry
    Add,
    /// VX -= VY, VF = no borrow
    Sub,
    /// VX >>= 1, VF = old lsb
    ShiftRight,
    /// VX = VY - VX, VF = no borrow
    SubReverse,
    /// VX <<= 1, VF = old msb
    ShiftLeft,
    /// skip next if VX != VY
    SkipNeReg,
    /// I = NNN
    LoadI,
    /// jump to V0 + NNN
    JumpV0,
    /// VX = random in 0..=NN
    Random,
    /// draw an 8xN sprite from I at (VX, VY), VF = collision
    Draw,
    /// skip next if key VX is pressed
    SkipKey,
    /// skip next if key VX isn't pressed
    SkipNotKey,
    /// VX = delay timer
    LoadDelay,
    /// wait for a key press, store it in VX
    WaitKey,
    /// delay timer = VX
    SetDelay,
    /// sound timer = VX
    SetSound,
    /// I += VX, VF = I overflowed 0xFFF
    AddI,
    /// I = address of font glyph VX
    LoadFont,
    /// BCD of VX at I, I+1, I+2
    StoreBcd,
    /// store V0..=VX at I
    StoreRegs,
    /// load V0..=VX from I
    LoadRegs,
}

/// a (mask, expected value) pair and the instruction it picks out
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub mask: u16,
    pub expected: u16,
    pub opcode: Opcode,
}

const fn rule(mask: u16, expected: u16, opcode: Opcode) -> Rule {
    Rule {
        mask,
        expected,
        opcode,
    }
}

impl Rule {
    pub fn matches(&self, word: u16) -> bool {
        word & self.mask == self.expected
    }
}

/// The classification table, in priority order. The masks overlap: `0NNN`
/// also matches `00E0` and `00EE`, so it's only accepted once the word has
/// been checked against those two (see `classify`).
#[rustfmt::skip]
pub const RULES: [Rule; 35] = [
    rule(0xF000, 0x0000, Opcode::Sys),
    rule(0xFFFF, 0x00E0, Opcode::Cls),
    rule(0xFFFF, 0x00EE, Opcode::Ret),
    rule(0xF000, 0x1000, Opcode::Jump),
    rule(0xF000, 0x2000, Opcode::Call),
    rule(0xF000, 0x3000, Opcode::SkipEqImm),
    rule(0xF000, 0x4000, Opcode::SkipNeImm),
    rule(0xF00F, 0x5000, Opcode::SkipEqReg),
    rule(0xF000, 0x6000, Opcode::LoadImm),
    rule(0xF000, 0x7000, Opcode::AddImm),
    rule(0xF00F, 0x8000, Opcode::Move),
    rule(0xF00F, 0x8001, Opcode::Or),
    rule(0xF00F, 0x8002, Opcode::And),
    rule(0xF00F, 0x8003, Opcode::Xor),
    rule(0xF00F, 0x8004, Opcode::Add),
    rule(0xF00F, 0x8005, Opcode::Sub),
    rule(0xF00F, 0x8006, Opcode::ShiftRight),
    rule(0xF00F, 0x8007, Opcode::SubReverse),
    rule(0xF00F, 0x800E, Opcode::ShiftLeft),
    rule(0xF00F, 0x9000, Opcode::SkipNeReg),
    rule(0xF000, 0xA000, Opcode::LoadI),
    rule(0xF000, 0xB000, Opcode::JumpV0),
    rule(0xF000, 0xC000, Opcode::Random),
    rule(0xF000, 0xD000, Opcode::Draw),
    rule(0xF0FF, 0xE09E, Opcode::SkipKey),
    rule(0xF0FF, 0xE0A1, Opcode::SkipNotKey),
    rule(0xF0FF, 0xF007, Opcode::LoadDelay),
    rule(0xF0FF, 0xF00A, Opcode::WaitKey),
    rule(0xF0FF, 0xF015, Opcode::SetDelay),
    rule(0xF0FF, 0xF018, Opcode::SetSound),
    rule(0xF0FF, 0xF01E, Opcode::AddI),
    rule(0xF0FF, 0xF029, Opcode::LoadFont),
    rule(0xF0FF, 0xF033, Opcode::StoreBcd),
    rule(0xF0FF, 0xF055, Opcode::StoreRegs),
    rule(0xF0FF, 0xF065, Opcode::LoadRegs),
];

/// Find the instruction kind for `word`, trying `RULES` in order. The legacy
/// call rule is the broadest of the top-nibble-zero rules, so it only wins when
/// neither clear screen nor return matches.
pub fn classify(word: u16) -> Option<Opcode> {
    RULES.iter().find_map(|r| {
        if !r.matches(word) {
            return None;
        }
        if r.opcode == Opcode::Sys && (RULES[1].matches(word) || RULES[2].matches(word)) {
            return None;
        }
        Some(r.opcode)
    })
}

/// a classified word with its operand fields pulled out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub word: u16,
}

impl Instruction {
    /// `None` when no rule matches
    pub fn decode(word: u16) -> Option<Self> {
        classify(word).map(|opcode| Instruction { opcode, word })
    }

    pub fn x(&self) -> Reg {
        Reg::from_nibble((self.word >> 8) as u8)
    }

    pub fn y(&self) -> Reg {
        Reg::from_nibble((self.word >> 4) as u8)
    }

    pub fn n(&self) -> u8 {
        (self.word & 0x000f) as u8
    }

    pub fn nn(&self) -> u8 {
        (self.word & 0x00ff) as u8
    }

    pub fn nnn(&self) -> u16 {
        self.word & 0x0fff
    }
}

impl fmt::Display for Instruction {
    /// assembler-ish mnemonic, used in traces
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, n, nn, nnn) = (self.x(), self.y(), self.n(), self.nn(), self.nnn());
        match self.opcode {
            Opcode::Sys => write!(f, "SYS  {:03X}", nnn),
            Opcode::Cls => write!(f, "CLS"),
            Opcode::Ret => write!(f, "RET"),
            Opcode::Jump => write!(f, "JP   {:03X}", nnn),
            Opcode::Call => write!(f, "CALL {:03X}", nnn),
            Opcode::SkipEqImm => write!(f, "SE   {}, {:02X}", x, nn),
            Opcode::SkipNeImm => write!(f, "SNE  {}, {:02X}", x, nn),
            Opcode::SkipEqReg => write!(f, "SE   {}, {}", x, y),
            Opcode::LoadImm => write!(f, "LD   {}, {:02X}", x, nn),
            Opcode::AddImm => write!(f, "ADD  {}, {:02X}", x, nn),
            Opcode::Move => write!(f, "LD   {}, {}", x, y),
            Opcode::Or => write!(f, "OR   {}, {}", x, y),
            Opcode::And => write!(f, "AND  {}, {}", x, y),
            Opcode::Xor => write!(f, "XOR  {}, {}", x, y),
            Opcode::Add => write!(f, "ADD  {}, {}", x, y),
            Opcode::Sub => write!(f, "SUB  {}, {}", x, y),
            Opcode::ShiftRight => write!(f, "SHR  {}", x),
            Opcode::SubReverse => write!(f, "SUBN {}, {}", x, y),
            Opcode::ShiftLeft => write!(f, "SHL  {}", x),
            Opcode::SkipNeReg => write!(f, "SNE  {}, {}", x, y),
            Opcode::LoadI => write!(f, "LD   I, {:03X}", nnn),
            Opcode::JumpV0 => write!(f, "JP   V0, {:03X}", nnn),
            Opcode::Random => write!(f, "RND  {}, {:02X}", x, nn),
            Opcode::Draw => write!(f, "DRW  {}, {}, {:X}", x, y, n),
            Opcode::SkipKey => write!(f, "SKP  {}", x),
            Opcode::SkipNotKey => write!(f, "SKNP {}", x),
            Opcode::LoadDelay => write!(f, "LD   {}, DT", x),
            Opcode::WaitKey => write!(f, "LD   {}, K", x),
            Opcode::SetDelay => write!(f, "LD   DT, {}", x),
            Opcode::SetSound => write!(f, "LD   ST, {}", x),
            Opcode::AddI => write!(f, "ADD  I, {}", x),
            Opcode::LoadFont => write!(f, "LD   F, {}", x),
            Opcode::StoreBcd => write!(f, "LD   B, {}", x),
            Opcode::StoreRegs => write!(f, "LD   [I], {}", x),
            Opcode::LoadRegs => write!(f, "LD   {}, [I]", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_nibble_zero_disambiguation() {
        assert_eq!(classify(0x00E0), Some(Opcode::Cls));
        assert_eq!(classify(0x00EE), Some(Opcode::Ret));
        assert_eq!(classify(0x0123), Some(Opcode::Sys));
        assert_eq!(classify(0x0000), Some(Opcode::Sys));
        assert_eq!(classify(0x00E1), Some(Opcode::Sys));
    }

    #[test]
    fn test_every_family() {
        let cases = [
            (0x1ABC, Opcode::Jump),
            (0x2ABC, Opcode::Call),
            (0x3A12, Opcode::SkipEqImm),
            (0x4A12, Opcode::SkipNeImm),
            (0x5AB0, Opcode::SkipEqReg),
            (0x6A12, Opcode::LoadImm),
            (0x7A12, Opcode::AddImm),
            (0x8AB0, Opcode::Move),
            (0x8AB1, Opcode::Or),
            (0x8AB2, Opcode::And),
            (0x8AB3, Opcode::Xor),
            (0x8AB4, Opcode::Add),
            (0x8AB5, Opcode::Sub),
            (0x8AB6, Opcode::ShiftRight),
            (0x8AB7, Opcode::SubReverse),
            (0x8ABE, Opcode::ShiftLeft),
            (0x9AB0, Opcode::SkipNeReg),
            (0xAABC, Opcode::LoadI),
            (0xBABC, Opcode::JumpV0),
            (0xCA12, Opcode::Random),
            (0xDAB5, Opcode::Draw),
            (0xEA9E, Opcode::SkipKey),
            (0xEAA1, Opcode::SkipNotKey),
            (0xFA07, Opcode::LoadDelay),
            (0xFA0A, Opcode::WaitKey),
            (0xFA15, Opcode::SetDelay),
            (0xFA18, Opcode::SetSound),
            (0xFA1E, Opcode::AddI),
            (0xFA29, Opcode::LoadFont),
            (0xFA33, Opcode::StoreBcd),
            (0xFA55, Opcode::StoreRegs),
            (0xFA65, Opcode::LoadRegs),
        ];
        for (word, opcode) in cases {
            assert_eq!(classify(word), Some(opcode), "word {:04X}", word);
        }
    }

    #[test]
    fn test_invalid_words() {
        for word in [0x5AB1, 0x8AB8, 0x8ABF, 0x9AB1, 0xEA00, 0xFA00, 0xFFFF] {
            assert_eq!(classify(word), None, "word {:04X}", word);
        }
    }

    #[test]
    fn test_table_covers_every_kind_once() {
        let mut seen = Vec::new();
        for r in RULES.iter() {
            assert!(!seen.contains(&r.opcode));
            seen.push(r.opcode);
        }
        assert_eq!(seen.len(), 35);
    }

    #[test]
    fn test_operands() {
        let i = Instruction::decode(0xD12F).unwrap();
        assert_eq!(i.opcode, Opcode::Draw);
        assert_eq!(i.x().index(), 1);
        assert_eq!(i.y().index(), 2);
        assert_eq!(i.n(), 0xf);
        assert_eq!(i.nn(), 0x2f);
        assert_eq!(i.nnn(), 0x12f);
    }

    #[test]
    fn test_mnemonics() {
        let show = |w| Instruction::decode(w).unwrap().to_string();
        assert_eq!(show(0xA22A), "LD   I, 22A");
        assert_eq!(show(0x8AB4), "ADD  VA, VB");
        assert_eq!(show(0xF065), "LD   V0, [I]");
        assert_eq!(show(0x00E0), "CLS");
    }
}
