//! # executor
//!
//! Applies one decoded instruction to the machine and screen. Every
//! instruction finishes with the same `PC += 2`; anything that sets PC (jump,
//! call, return) stores its target minus 2 so that uniform step lands on it.
//! Register arithmetic is 8-bit and address arithmetic 16-bit, both wrapping.
//! Where an instruction writes a flag, the result goes into VX first and the
//! flag into VF second, so VF wins when X is F.
use log::trace;
use rand::Rng;

use crate::error::Fault;
use crate::machine::{Machine, Reg};
use crate::memory::{Chip8MemoryMap, MemoryMap};
use crate::opcode::{Instruction, Opcode};
use crate::screen::Screen;

/// what the frame driver needs to know after an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// nothing the outside world cares about
    None,
    /// the screen was cleared or drawn on
    ScreenChanged,
    /// stop running until a key is pressed, then store it in the register
    WaitForKey(Reg),
}

/// Run `inst`, which was fetched from the current PC.
pub fn execute<R: Rng>(
    inst: &Instruction,
    m: &mut Machine,
    screen: &mut Screen,
    rng: &mut R,
) -> Result<Effect, Fault> {
    let pc = m.pc();
    let (x, y) = (inst.x(), inst.y());
    let mut effect = Effect::None;

    match inst.opcode {
        Opcode::Sys => {}
        Opcode::Cls => {
            screen.clear();
            effect = Effect::ScreenChanged;
        }
        Opcode::Ret => {
            let addr = m.pop()?;
            m.set_pc(addr);
        }
        Opcode::Jump => {
            if inst.nnn() == pc {
                trace!("{:03X}: jump to self, program is idling", pc);
            }
            m.jump(inst.nnn());
        }
        Opcode::Call => {
            m.push(pc)?;
            m.jump(inst.nnn());
        }
        Opcode::SkipEqImm => m.skip_if(m.v(x) == inst.nn()),
        Opcode::SkipNeImm => m.skip_if(m.v(x) != inst.nn()),
        Opcode::SkipEqReg => m.skip_if(m.v(x) == m.v(y)),
        Opcode::SkipNeReg => m.skip_if(m.v(x) != m.v(y)),
        Opcode::LoadImm => m.set_v(x, inst.nn()),
        Opcode::AddImm => m.set_v(x, m.v(x).wrapping_add(inst.nn())),
        Opcode::Move => m.set_v(x, m.v(y)),
        Opcode::Or => m.set_v(x, m.v(x) | m.v(y)),
        Opcode::And => m.set_v(x, m.v(x) & m.v(y)),
        Opcode::Xor => m.set_v(x, m.v(x) ^ m.v(y)),
        Opcode::Add => m.set_with_flag(x, add(m.v(x), m.v(y))),
        Opcode::Sub => m.set_with_flag(x, sub(m.v(x), m.v(y))),
        Opcode::SubReverse => m.set_with_flag(x, sub(m.v(y), m.v(x))),
        Opcode::ShiftRight => m.set_with_flag(x, shr(m.v(x))),
        Opcode::ShiftLeft => m.set_with_flag(x, shl(m.v(x))),
        Opcode::LoadI => m.set_i(inst.nnn()),
        Opcode::JumpV0 => m.jump(inst.nnn().wrapping_add(m.v(Reg::V0) as u16)),
        Opcode::Random => m.set_v(x, rng.gen_range(0..=inst.nn())),
        Opcode::Draw => {
            let collision = draw(m, screen, m.v(x), m.v(y), inst.n())?;
            m.set_v(Reg::VF, collision as u8);
            effect = Effect::ScreenChanged;
        }
        Opcode::SkipKey => m.skip_if(m.keypad.is_pressed(m.v(x))?),
        Opcode::SkipNotKey => m.skip_if(!m.keypad.is_pressed(m.v(x))?),
        Opcode::LoadDelay => m.set_v(x, m.delay_timer()),
        Opcode::WaitKey => effect = Effect::WaitForKey(x),
        Opcode::SetDelay => m.set_delay_timer(m.v(x)),
        Opcode::SetSound => m.set_sound_timer(m.v(x)),
        Opcode::AddI => {
            let vx = m.v(x) as u16;
            let overflow = m.i() as u32 + vx as u32 > 0x0fff;
            m.set_i(m.i().wrapping_add(vx));
            m.set_v(Reg::VF, overflow as u8);
        }
        Opcode::LoadFont => m.set_i(Chip8MemoryMap::font_addr(m.v(x))),
        Opcode::StoreBcd => {
            let vx = m.v(x);
            let digits = [vx / 100, (vx % 100) / 10, vx % 10];
            let i = m.i() as usize;
            m.memory.write(&digits, i)?;
        }
        Opcode::StoreRegs => {
            let (regs, i) = (*m.registers(), m.i() as usize);
            m.memory.write(&regs[..=x.index()], i)?;
        }
        Opcode::LoadRegs => {
            let mut buf = [0u8; 16];
            let len = x.index() + 1;
            buf[..len].copy_from_slice(m.memory.get_ro_slice(m.i() as usize, len)?);
            for r in x.through() {
                m.set_v(r, buf[r.index()]);
            }
        }
    }

    m.advance();
    trace!("{:03X}: {:04X}  {:<16} {:?}", pc, inst.word, inst.to_string(), m);
    Ok(effect)
}

/// sum and carry
pub fn add(a: u8, b: u8) -> (u8, u8) {
    let (sum, carry) = a.overflowing_add(b);
    (sum, carry as u8)
}

/// difference and "no borrow": the flag is 1 when a >= b
pub fn sub(a: u8, b: u8) -> (u8, u8) {
    (a.wrapping_sub(b), (a >= b) as u8)
}

/// shifted value and the bit that fell off
pub fn shr(a: u8) -> (u8, u8) {
    (a >> 1, a & 0x01)
}

pub fn shl(a: u8) -> (u8, u8) {
    (a << 1, a >> 7)
}

/// XOR an 8 pixel wide, `rows` tall sprite from I onto the screen with its top
/// left corner at (x, y). Pixels that land off the screen are dropped rather
/// than wrapped. Returns whether any lit pixel was turned off.
fn draw(m: &Machine, screen: &mut Screen, x: u8, y: u8, rows: u8) -> Result<bool, Fault> {
    let sprite = m.memory.get_ro_slice(m.i() as usize, rows as usize)?;
    let mut collision = false;
    for (dy, &bits) in sprite.iter().enumerate() {
        for dx in 0..8usize {
            if bits & (0x80u8 >> dx) == 0 {
                continue;
            }
            if let Some(index) = Screen::coords_to_index(x as usize + dx, y as usize + dy) {
                collision |= screen.is_set(index);
                screen.flip(index);
            }
        }
    }
    Ok(collision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::convert::TryFrom;

    fn reg(n: u8) -> Reg {
        Reg::try_from(n).unwrap()
    }

    /// run one word against `m`
    fn run(m: &mut Machine, screen: &mut Screen, word: u16) -> Result<Effect, Fault> {
        let mut rng = StdRng::seed_from_u64(8);
        let inst = Instruction::decode(word).ok_or(Fault::UnknownOpcode { word })?;
        execute(&inst, m, screen, &mut rng)
    }

    fn run_ok(m: &mut Machine, word: u16) -> Effect {
        let mut s = Screen::new();
        run(m, &mut s, word).unwrap()
    }

    #[test]
    fn test_load_i() {
        let mut m = Machine::new();
        assert_eq!(run_ok(&mut m, 0xA22A), Effect::None);
        assert_eq!(m.i(), 0x22A);
        assert_eq!(m.pc(), 0x202);
        assert_eq!(m.registers(), &[0; 16]);
    }

    #[test]
    fn test_add_imm_wraps_without_flag() {
        let mut m = Machine::new();
        m.set_v(reg(1), 0xff);
        run_ok(&mut m, 0x7102);
        assert_eq!(m.v(reg(1)), 0x01);
        assert_eq!(m.v(Reg::VF), 0);
    }

    #[test]
    fn test_jump_and_call_return() {
        let mut m = Machine::new();
        run_ok(&mut m, 0x1300);
        assert_eq!(m.pc(), 0x300);
        run_ok(&mut m, 0x2456);
        assert_eq!(m.pc(), 0x456);
        assert_eq!(m.stack_depth(), 1);
        run_ok(&mut m, 0x00EE);
        assert_eq!(m.pc(), 0x302);
        assert_eq!(m.stack_depth(), 0);
    }

    #[test]
    fn test_jump_v0() {
        let mut m = Machine::new();
        m.set_v(Reg::V0, 0x10);
        run_ok(&mut m, 0xB300);
        assert_eq!(m.pc(), 0x310);
    }

    #[test]
    fn test_return_on_empty_stack_faults() {
        let mut m = Machine::new();
        let mut s = Screen::new();
        assert_eq!(run(&mut m, &mut s, 0x00EE), Err(Fault::StackUnderflow));
    }

    #[test]
    fn test_skips() {
        let mut m = Machine::new();
        m.set_v(reg(3), 0x42);
        m.set_v(reg(4), 0x42);
        run_ok(&mut m, 0x3342);
        assert_eq!(m.pc(), 0x204);
        run_ok(&mut m, 0x4342);
        assert_eq!(m.pc(), 0x206);
        run_ok(&mut m, 0x5340);
        assert_eq!(m.pc(), 0x20a);
        run_ok(&mut m, 0x9340);
        assert_eq!(m.pc(), 0x20c);
    }

    #[test]
    fn test_logic() {
        let mut m = Machine::new();
        m.set_v(reg(0), 0b1100);
        m.set_v(reg(1), 0b1010);
        run_ok(&mut m, 0x8011);
        assert_eq!(m.v(reg(0)), 0b1110);
        run_ok(&mut m, 0x8012);
        assert_eq!(m.v(reg(0)), 0b1010);
        run_ok(&mut m, 0x8013);
        assert_eq!(m.v(reg(0)), 0);
        run_ok(&mut m, 0x8010);
        assert_eq!(m.v(reg(0)), 0b1010);
    }

    #[test]
    fn test_add_carry() {
        let mut m = Machine::new();
        m.set_v(reg(0), 200);
        m.set_v(reg(1), 100);
        run_ok(&mut m, 0x8014);
        assert_eq!(m.v(reg(0)), 44);
        assert_eq!(m.v(Reg::VF), 1);
        run_ok(&mut m, 0x8014);
        assert_eq!(m.v(reg(0)), 144);
        assert_eq!(m.v(Reg::VF), 0);
    }

    #[test]
    fn test_sub_flags() {
        let mut m = Machine::new();
        m.set_v(reg(0), 5);
        m.set_v(reg(1), 5);
        run_ok(&mut m, 0x8015);
        assert_eq!((m.v(reg(0)), m.v(Reg::VF)), (0, 1));
        run_ok(&mut m, 0x8015);
        assert_eq!((m.v(reg(0)), m.v(Reg::VF)), (251, 0));
        m.set_v(reg(0), 3);
        run_ok(&mut m, 0x8017);
        assert_eq!((m.v(reg(0)), m.v(Reg::VF)), (2, 1));
    }

    #[test]
    fn test_shifts() {
        let mut m = Machine::new();
        m.set_v(reg(2), 0b1000_0001);
        run_ok(&mut m, 0x8206);
        assert_eq!((m.v(reg(2)), m.v(Reg::VF)), (0b0100_0000, 1));
        run_ok(&mut m, 0x820E);
        assert_eq!((m.v(reg(2)), m.v(Reg::VF)), (0b1000_0000, 0));
        run_ok(&mut m, 0x820E);
        assert_eq!((m.v(reg(2)), m.v(Reg::VF)), (0, 1));
    }

    #[test]
    fn test_flag_wins_over_result_in_vf() {
        let mut m = Machine::new();
        m.set_v(Reg::VF, 0xff);
        m.set_v(reg(1), 0x01);
        run_ok(&mut m, 0x8F14);
        assert_eq!(m.v(Reg::VF), 1);
    }

    #[test]
    fn test_random_stays_in_range() {
        let mut m = Machine::new();
        let mut s = Screen::new();
        let mut rng = StdRng::seed_from_u64(1);
        let inst = Instruction::decode(0xC507).unwrap();
        for _ in 0..200 {
            execute(&inst, &mut m, &mut s, &mut rng).unwrap();
            assert!(m.v(reg(5)) <= 7);
        }
        let zero = Instruction::decode(0xC500).unwrap();
        execute(&zero, &mut m, &mut s, &mut rng).unwrap();
        assert_eq!(m.v(reg(5)), 0);
    }

    #[test]
    fn test_draw_font_glyph() -> Result<(), Fault> {
        let mut m = Machine::new();
        let mut s = Screen::new();
        m.set_v(reg(0), 0);
        run(&mut m, &mut s, 0xF029)?;
        assert_eq!(m.i(), 0);
        assert_eq!(run(&mut m, &mut s, 0xD005)?, Effect::ScreenChanged);
        // "0" is 4 pixels wide: 4 + 2 + 2 + 2 + 4
        assert_eq!(s.lit_count(), 14);
        assert!(s.is_set(0));
        assert!(!s.is_set(65));
        assert_eq!(m.v(Reg::VF), 0);
        Ok(())
    }

    #[test]
    fn test_draw_collision_and_erase() -> Result<(), Fault> {
        let mut m = Machine::new();
        let mut s = Screen::new();
        m.write(0x300, 0xff)?;
        m.set_i(0x300);
        m.set_v(reg(1), 10);
        m.set_v(reg(2), 5);
        run(&mut m, &mut s, 0xD121)?;
        assert_eq!(m.v(Reg::VF), 0);
        run(&mut m, &mut s, 0xD121)?;
        assert_eq!(m.v(Reg::VF), 1);
        assert_eq!(s.lit_count(), 0);
        Ok(())
    }

    #[test]
    fn test_collision_flag_survives_later_rows() -> Result<(), Fault> {
        let mut m = Machine::new();
        let mut s = Screen::new();
        m.write(0x300, 0x80)?;
        m.write(0x301, 0x80)?;
        m.set_i(0x300);
        // light (0, 0), then draw two rows over it: the first collides, the
        // second lands on a blank cell
        run(&mut m, &mut s, 0xD011)?;
        run(&mut m, &mut s, 0xD012)?;
        assert_eq!(m.v(Reg::VF), 1);
        assert_eq!(s.lit_count(), 1);
        assert!(s.is_set(Screen::coords_to_index(0, 1).unwrap()));
        Ok(())
    }

    #[test]
    fn test_draw_clips_instead_of_wrapping() -> Result<(), Fault> {
        let mut m = Machine::new();
        let mut s = Screen::new();
        m.write(0x300, 0xff)?;
        m.write(0x301, 0xff)?;
        m.set_i(0x300);
        m.set_v(reg(1), 60);
        m.set_v(reg(2), 31);
        run(&mut m, &mut s, 0xD122)?;
        // 4 columns on the last row survive, the second row is off the bottom
        assert_eq!(s.lit_count(), 4);
        assert!(s.is_set(Screen::coords_to_index(63, 31).unwrap()));
        assert!(!s.is_set(Screen::coords_to_index(0, 31).unwrap()));
        assert!(!s.is_set(Screen::coords_to_index(0, 0).unwrap()));
        Ok(())
    }

    #[test]
    fn test_draw_reads_coordinates_before_flag() -> Result<(), Fault> {
        let mut m = Machine::new();
        let mut s = Screen::new();
        m.write(0x300, 0x80)?;
        m.set_i(0x300);
        m.set_v(Reg::VF, 3);
        m.set_v(reg(0), 2);
        run(&mut m, &mut s, 0xDF01)?;
        assert!(s.is_set(Screen::coords_to_index(3, 2).unwrap()));
        Ok(())
    }

    #[test]
    fn test_draw_past_memory_faults() {
        let mut m = Machine::new();
        let mut s = Screen::new();
        m.set_i(0xffe);
        assert_eq!(
            run(&mut m, &mut s, 0xD005),
            Err(Fault::MemoryOutOfRange { address: 0x1000 })
        );
        assert_eq!(s.lit_count(), 0);
    }

    #[test]
    fn test_keys() {
        let mut m = Machine::new();
        let mut s = Screen::new();
        m.set_v(reg(1), 0xa);
        run_ok(&mut m, 0xE19E);
        assert_eq!(m.pc(), 0x202);
        m.keypad.set(0xa, true);
        run_ok(&mut m, 0xE19E);
        assert_eq!(m.pc(), 0x206);
        run_ok(&mut m, 0xE1A1);
        assert_eq!(m.pc(), 0x208);
        m.set_v(reg(1), 0x10);
        assert_eq!(
            run(&mut m, &mut s, 0xE19E),
            Err(Fault::InvalidKey { value: 0x10 })
        );
    }

    #[test]
    fn test_wait_key_effect() {
        let mut m = Machine::new();
        assert_eq!(run_ok(&mut m, 0xF30A), Effect::WaitForKey(reg(3)));
        assert_eq!(m.pc(), 0x202);
    }

    #[test]
    fn test_timers() {
        let mut m = Machine::new();
        m.set_v(reg(4), 30);
        run_ok(&mut m, 0xF415);
        run_ok(&mut m, 0xF418);
        assert_eq!(m.delay_timer(), 30);
        assert_eq!(m.sound_timer(), 30);
        m.tick_timers();
        run_ok(&mut m, 0xF507);
        assert_eq!(m.v(reg(5)), 29);
    }

    #[test]
    fn test_add_i_overflow_flag() {
        let mut m = Machine::new();
        m.set_i(0xffe);
        m.set_v(reg(1), 1);
        run_ok(&mut m, 0xF11E);
        assert_eq!((m.i(), m.v(Reg::VF)), (0xfff, 0));
        run_ok(&mut m, 0xF11E);
        assert_eq!((m.i(), m.v(Reg::VF)), (0x1000, 1));
    }

    #[test]
    fn test_bcd() -> Result<(), Fault> {
        let mut m = Machine::new();
        m.set_v(reg(7), 254);
        m.set_i(0x400);
        run_ok(&mut m, 0xF733);
        assert_eq!(m.memory.get_ro_slice(0x400, 3)?, &[2, 5, 4]);
        assert_eq!(m.i(), 0x400);
        Ok(())
    }

    #[test]
    fn test_store_and_load_registers() -> Result<(), Fault> {
        let mut m = Machine::new();
        for r in reg(3).through() {
            m.set_v(r, r.index() as u8 + 1);
        }
        m.set_v(reg(4), 0x99);
        m.set_i(0x500);
        run_ok(&mut m, 0xF355);
        assert_eq!(m.memory.get_ro_slice(0x500, 5)?, &[1, 2, 3, 4, 0]);
        assert_eq!(m.i(), 0x500);

        m.write(0x500, 0x77)?;
        run_ok(&mut m, 0xF265);
        assert_eq!(&m.registers()[..5], &[0x77, 2, 3, 4, 0x99]);
        assert_eq!(m.i(), 0x500);
        Ok(())
    }

    #[test]
    fn test_clear_screen() {
        let mut m = Machine::new();
        let mut s = Screen::new();
        s.flip(12);
        assert_eq!(run(&mut m, &mut s, 0x00E0), Ok(Effect::ScreenChanged));
        assert_eq!(s.lit_count(), 0);
    }
}
