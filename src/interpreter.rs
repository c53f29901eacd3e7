// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The execution engine: fetch, unpack, dispatch, execute, count cycles.
//!
//! Sixteen family handlers cover the opcode space, one per value of the top
//! nibble. Each handler receives the unpacked sub-fields, consumes whatever
//! extension words the instruction needs, performs the operation and
//! returns the cycle count. Unknown encodings inside a family report a
//! warning and cost [`UTIME`].

use crate::addressing::{CtrlCycles, Size};
use crate::alu;
use crate::bus::Bus;
use crate::exception::vector;
use crate::opcode_table::{self, Unpacked};
use crate::status_register::{StatusRegister, CCR_MASK};
use crate::{Cpu, Reporter, UTIME};

const LEA_TIME: CtrlCycles =
    CtrlCycles { ind: 4, d16: 8, idx: 12, abs_w: 8, abs_l: 12, pc16: 8, pc_idx: 12 };
const PEA_TIME: CtrlCycles =
    CtrlCycles { ind: 12, d16: 16, idx: 20, abs_w: 16, abs_l: 20, pc16: 16, pc_idx: 20 };
const JMP_TIME: CtrlCycles =
    CtrlCycles { ind: 8, d16: 10, idx: 14, abs_w: 10, abs_l: 12, pc16: 10, pc_idx: 14 };
const JSR_TIME: CtrlCycles =
    CtrlCycles { ind: 16, d16: 18, idx: 22, abs_w: 18, abs_l: 20, pc16: 18, pc_idx: 22 };
const MOVEM_LOAD_TIME: CtrlCycles =
    CtrlCycles { ind: 12, d16: 16, idx: 18, abs_w: 16, abs_l: 20, pc16: 16, pc_idx: 18 };
const MOVEM_STORE_TIME: CtrlCycles =
    CtrlCycles { ind: 8, d16: 12, idx: 14, abs_w: 12, abs_l: 16, pc16: 0, pc_idx: 0 };

/// Memory-destination operands: everything writable through an effective
/// address, i.e. modes 2..=6 plus the two absolute forms.
const fn alterable_mem(mode: u8, reg: u8) -> bool {
    matches!(mode, 2..=6) || mode == 7 && reg <= 1
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BitOp {
    Tst,
    Chg,
    Clr,
    Set,
}

impl BitOp {
    const fn name(self) -> &'static str {
        match self {
            BitOp::Tst => "BTST",
            BitOp::Chg => "BCHG",
            BitOp::Clr => "BCLR",
            BitOp::Set => "BSET",
        }
    }

    const fn apply8(self, value: u8, mask: u8) -> u8 {
        match self {
            BitOp::Tst => value,
            BitOp::Chg => value ^ mask,
            BitOp::Clr => value & !mask,
            BitOp::Set => value | mask,
        }
    }

    const fn apply32(self, value: u32, mask: u32) -> u32 {
        match self {
            BitOp::Tst => value,
            BitOp::Chg => value ^ mask,
            BitOp::Clr => value & !mask,
            BitOp::Set => value | mask,
        }
    }
}

impl<R: Reporter> Cpu<R> {
    /// Executes exactly one instruction, or services one pending event, and
    /// returns the clock cycles it consumed.
    ///
    /// A pending RESET is always taken. Otherwise the highest pending IRQ
    /// is serviced when unmasked; a stopped core burns a 4-cycle idle tick;
    /// and in the normal case one opcode is fetched at PC and dispatched.
    pub fn run<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u32 {
        if self.regs.sr.t {
            log::trace!("trace bit set at {:#010X}", self.regs.pc);
        }
        if self.ints != 0 {
            let cycles = self.service_interrupts(bus);
            if cycles != 0 {
                return cycles;
            }
        }
        if self.stop {
            return 4;
        }

        let opcode = self.fetch_word(bus);
        let u = opcode_table::unpack(opcode);
        match u.op {
            0x0 => self.family_bit_movep_imm(bus, u),
            0x1 => self.move8(bus, u),
            0x2 => self.move32(bus, u),
            0x3 => self.move16(bus, u),
            0x4 => self.family_misc(bus, u),
            0x5 => self.family_addq_subq(bus, u),
            0x6 => self.family_branch(bus, opcode),
            0x7 => self.family_moveq(opcode, u),
            0x8 => self.family_or_div_sbcd(bus, u),
            0x9 => self.family_sub(bus, u),
            0xB => self.family_cmp_eor(bus, u),
            0xC => self.family_and_mul_abcd_exg(bus, u),
            0xD => self.family_add(bus, u),
            0xE => self.family_shift_rot(bus, u),
            _ => self.unknown(u),
        }
    }

    fn unknown(&mut self, u: Unpacked) -> u32 {
        let opcode = (u.op as u16) << 12
            | (u.v3 as u16) << 9
            | (u.v2 as u16) << 6
            | (u.v1 as u16) << 3
            | u.v0 as u16;
        self.warn(format_args!("unknown opcode {opcode:#06X}"));
        UTIME
    }

    fn bad_mode(&mut self, name: &str, mode: u8, reg: u8) -> u32 {
        self.warn(format_args!("{name} does not accept mode {mode}:{reg}"));
        UTIME
    }

    fn push_long<B: Bus + ?Sized>(&mut self, bus: &mut B, value: u32) {
        self.regs.a[7] = self.regs.a[7].wrapping_sub(4);
        bus.write_long(self.regs.a[7], value);
    }

    // ------------------------------------------------------------------
    // Family 0x0: bit manipulation, MOVEP, immediate ALU
    // ------------------------------------------------------------------

    fn family_bit_movep_imm<B: Bus + ?Sized>(&mut self, bus: &mut B, u: Unpacked) -> u32 {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        match v2 {
            0 => match v3 {
                0 if v1 == 7 && v0 == 4 => self.imm_to_ccr(bus, |c, i| c | i),
                0 => self.imm_alu8(bus, v1, v0, "ORI.B", |sr, s, d| alu::logic(sr, s | d)),
                1 if v1 == 7 && v0 == 4 => self.imm_to_ccr(bus, |c, i| c & i),
                1 => self.imm_alu8(bus, v1, v0, "ANDI.B", |sr, s, d| alu::logic(sr, s & d)),
                2 => self.imm_alu8(bus, v1, v0, "SUBI.B", alu::sub),
                3 => self.imm_alu8(bus, v1, v0, "ADDI.B", alu::add),
                4 => self.bit_op_imm(bus, v1, v0, BitOp::Tst),
                5 if v1 == 7 && v0 == 4 => self.imm_to_ccr(bus, |c, i| c ^ i),
                5 => self.imm_alu8(bus, v1, v0, "EORI.B", |sr, s, d| alu::logic(sr, s ^ d)),
                6 => self.cmpi8(bus, v1, v0),
                _ => self.unknown(u),
            },
            1 => match v3 {
                0 if v1 == 7 && v0 == 4 => self.imm_to_sr(bus, |s, i| s | i),
                0 => self.imm_alu16(bus, v1, v0, "ORI.W", |sr, s, d| alu::logic(sr, s | d)),
                1 if v1 == 7 && v0 == 4 => self.imm_to_sr(bus, |s, i| s & i),
                1 => self.imm_alu16(bus, v1, v0, "ANDI.W", |sr, s, d| alu::logic(sr, s & d)),
                2 => self.imm_alu16(bus, v1, v0, "SUBI.W", alu::sub),
                3 => self.imm_alu16(bus, v1, v0, "ADDI.W", alu::add),
                4 => self.bit_op_imm(bus, v1, v0, BitOp::Chg),
                5 if v1 == 7 && v0 == 4 => self.imm_to_sr(bus, |s, i| s ^ i),
                5 => self.imm_alu16(bus, v1, v0, "EORI.W", |sr, s, d| alu::logic(sr, s ^ d)),
                6 => self.cmpi16(bus, v1, v0),
                _ => self.unknown(u),
            },
            2 => match v3 {
                0 => self.imm_alu32(bus, v1, v0, "ORI.L", |sr, s, d| alu::logic(sr, s | d)),
                1 => self.imm_alu32(bus, v1, v0, "ANDI.L", |sr, s, d| alu::logic(sr, s & d)),
                2 => self.imm_alu32(bus, v1, v0, "SUBI.L", alu::sub),
                3 => self.imm_alu32(bus, v1, v0, "ADDI.L", alu::add),
                4 => self.bit_op_imm(bus, v1, v0, BitOp::Clr),
                5 => self.imm_alu32(bus, v1, v0, "EORI.L", |sr, s, d| alu::logic(sr, s ^ d)),
                6 => self.cmpi32(bus, v1, v0),
                _ => self.unknown(u),
            },
            3 => match v3 {
                4 => self.bit_op_imm(bus, v1, v0, BitOp::Set),
                _ => self.unknown(u),
            },
            4 if v1 == 1 => self.movep_load16(bus, v3, v0),
            4 => self.bit_op_reg(bus, v3, v1, v0, BitOp::Tst),
            5 if v1 == 1 => self.movep_load32(bus, v3, v0),
            5 => self.bit_op_reg(bus, v3, v1, v0, BitOp::Chg),
            6 if v1 == 1 => self.movep_store16(bus, v3, v0),
            6 => self.bit_op_reg(bus, v3, v1, v0, BitOp::Clr),
            7 if v1 == 1 => self.movep_store32(bus, v3, v0),
            7 => self.bit_op_reg(bus, v3, v1, v0, BitOp::Set),
            _ => self.unknown(u),
        }
    }

    fn imm_to_ccr<B: Bus + ?Sized>(&mut self, bus: &mut B, op: fn(u8, u8) -> u8) -> u32 {
        let imm = self.fetch_word(bus) as u8;
        let ccr = op(self.regs.sr.ccr(), imm) & CCR_MASK as u8;
        self.regs.sr.set_ccr(ccr);
        20
    }

    fn imm_to_sr<B: Bus + ?Sized>(&mut self, bus: &mut B, op: fn(u16, u16) -> u16) -> u32 {
        if !self.regs.sr.s {
            return self.trap(bus, vector::PRIVILEGE_VIOLATION);
        }
        let imm = self.fetch_word(bus);
        let sr = op(self.regs.sr.to_word(), imm);
        self.regs.sr.set_word(sr);
        self.sync_stack_with_s(true);
        20
    }

    fn imm_alu8<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: u8,
        reg: u8,
        name: &str,
        op: fn(&mut StatusRegister, u8, u8) -> u8,
    ) -> u32 {
        let imm = self.fetch_word(bus) as u8;
        if mode == 0 {
            let dst = self.regs.d_byte(reg);
            let res = op(&mut self.regs.sr, imm, dst);
            self.regs.set_d_byte(reg, res);
            return 8;
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode(name, mode, reg);
        }
        let mut cycles = 12;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Byte, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let dst = self.load8(bus, place);
        let res = op(&mut self.regs.sr, imm, dst);
        self.store8(bus, place, res);
        cycles
    }

    fn imm_alu16<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: u8,
        reg: u8,
        name: &str,
        op: fn(&mut StatusRegister, u16, u16) -> u16,
    ) -> u32 {
        let imm = self.fetch_word(bus);
        if mode == 0 {
            let dst = self.regs.d_word(reg);
            let res = op(&mut self.regs.sr, imm, dst);
            self.regs.set_d_word(reg, res);
            return 8;
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode(name, mode, reg);
        }
        let mut cycles = 12;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let dst = self.load16(bus, place);
        let res = op(&mut self.regs.sr, imm, dst);
        self.store16(bus, place, res);
        cycles
    }

    fn imm_alu32<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: u8,
        reg: u8,
        name: &str,
        op: fn(&mut StatusRegister, u32, u32) -> u32,
    ) -> u32 {
        let imm = self.fetch_long(bus);
        if mode == 0 {
            self.regs.d[reg as usize] = op(&mut self.regs.sr, imm, self.regs.d[reg as usize]);
            return 16;
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode(name, mode, reg);
        }
        let mut cycles = 20;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Long, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let dst = self.load32(bus, place);
        let res = op(&mut self.regs.sr, imm, dst);
        self.store32(bus, place, res);
        cycles
    }

    fn cmpi8<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        let imm = self.fetch_word(bus) as u8;
        if mode == 0 {
            let dst = self.regs.d_byte(reg);
            alu::cmp(&mut self.regs.sr, imm, dst);
            return 8;
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode("CMPI.B", mode, reg);
        }
        let mut cycles = 8;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Byte, &mut cycles) else {
            return self.bad_mode("CMPI.B", mode, reg);
        };
        let dst = self.load8(bus, place);
        alu::cmp(&mut self.regs.sr, imm, dst);
        cycles
    }

    fn cmpi16<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        let imm = self.fetch_word(bus);
        if mode == 0 {
            let dst = self.regs.d_word(reg);
            alu::cmp(&mut self.regs.sr, imm, dst);
            return 8;
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode("CMPI.W", mode, reg);
        }
        let mut cycles = 8;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            return self.bad_mode("CMPI.W", mode, reg);
        };
        let dst = self.load16(bus, place);
        alu::cmp(&mut self.regs.sr, imm, dst);
        cycles
    }

    fn cmpi32<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        let imm = self.fetch_long(bus);
        if mode == 0 {
            alu::cmp(&mut self.regs.sr, imm, self.regs.d[reg as usize]);
            return 14;
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode("CMPI.L", mode, reg);
        }
        let mut cycles = 12;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Long, &mut cycles) else {
            return self.bad_mode("CMPI.L", mode, reg);
        };
        let dst = self.load32(bus, place);
        alu::cmp(&mut self.regs.sr, imm, dst);
        cycles
    }

    /// BTST/BCHG/BCLR/BSET with the bit number in a data register.
    fn bit_op_reg<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        dn: u8,
        mode: u8,
        reg: u8,
        op: BitOp,
    ) -> u32 {
        if mode == 0 {
            let mask = 1u32 << (self.regs.d[dn as usize] & 0x1F);
            let value = self.regs.d[reg as usize];
            self.regs.sr.z = value & mask == 0;
            self.regs.d[reg as usize] = op.apply32(value, mask);
            return if op == BitOp::Tst { 10 } else { 12 };
        }
        if op == BitOp::Tst && mode == 7 && reg == 4 {
            // BTST Dn, #imm tests a bit of the immediate byte itself.
            let imm = self.fetch_word(bus) as u8;
            let mask = 1u8 << (self.regs.d[dn as usize] & 7);
            self.regs.sr.z = imm & mask == 0;
            return 10;
        }
        let source_ok = op == BitOp::Tst && mode == 7 && (reg == 2 || reg == 3);
        if !alterable_mem(mode, reg) && !source_ok {
            return self.bad_mode(op.name(), mode, reg);
        }
        let mut cycles = if op == BitOp::Tst { 6 } else { 8 };
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Byte, &mut cycles) else {
            return self.bad_mode(op.name(), mode, reg);
        };
        let mask = 1u8 << (self.regs.d[dn as usize] & 7);
        let value = self.load8(bus, place);
        self.regs.sr.z = value & mask == 0;
        if op != BitOp::Tst {
            self.store8(bus, place, op.apply8(value, mask));
        }
        cycles
    }

    /// BTST/BCHG/BCLR/BSET with an immediate bit number.
    fn bit_op_imm<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8, op: BitOp) -> u32 {
        let imm = self.fetch_word(bus) as u8;
        if mode == 0 {
            let mask = 1u32 << (imm & 0x1F);
            let value = self.regs.d[reg as usize];
            self.regs.sr.z = value & mask == 0;
            self.regs.d[reg as usize] = op.apply32(value, mask);
            return if op == BitOp::Tst { 10 } else { 12 };
        }
        let source_ok = op == BitOp::Tst && mode == 7 && (reg == 2 || reg == 3);
        if !alterable_mem(mode, reg) && !source_ok {
            return self.bad_mode(op.name(), mode, reg);
        }
        let mut cycles = if op == BitOp::Tst { 6 } else { 8 };
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Byte, &mut cycles) else {
            return self.bad_mode(op.name(), mode, reg);
        };
        let mask = 1u8 << (imm & 7);
        let value = self.load8(bus, place);
        self.regs.sr.z = value & mask == 0;
        if op != BitOp::Tst {
            self.store8(bus, place, op.apply8(value, mask));
        }
        cycles
    }

    fn movep_load16<B: Bus + ?Sized>(&mut self, bus: &mut B, dreg: u8, areg: u8) -> u32 {
        let disp = self.fetch_word(bus) as i16 as u32;
        let addr = self.regs.a[areg as usize].wrapping_add(disp);
        let high = bus.read_byte(addr) as u16;
        let low = bus.read_byte(addr.wrapping_add(2)) as u16;
        self.regs.set_d_word(dreg, high << 8 | low);
        16
    }

    fn movep_load32<B: Bus + ?Sized>(&mut self, bus: &mut B, dreg: u8, areg: u8) -> u32 {
        let disp = self.fetch_word(bus) as i16 as u32;
        let addr = self.regs.a[areg as usize].wrapping_add(disp);
        let mut value = 0u32;
        for i in 0..4 {
            value = value << 8 | bus.read_byte(addr.wrapping_add(i * 2)) as u32;
        }
        self.regs.d[dreg as usize] = value;
        24
    }

    fn movep_store16<B: Bus + ?Sized>(&mut self, bus: &mut B, dreg: u8, areg: u8) -> u32 {
        let disp = self.fetch_word(bus) as i16 as u32;
        let addr = self.regs.a[areg as usize].wrapping_add(disp);
        let value = self.regs.d_word(dreg);
        bus.write_byte(addr, (value >> 8) as u8);
        bus.write_byte(addr.wrapping_add(2), value as u8);
        16
    }

    fn movep_store32<B: Bus + ?Sized>(&mut self, bus: &mut B, dreg: u8, areg: u8) -> u32 {
        let disp = self.fetch_word(bus) as i16 as u32;
        let addr = self.regs.a[areg as usize].wrapping_add(disp);
        let value = self.regs.d[dreg as usize];
        for i in 0..4 {
            bus.write_byte(addr.wrapping_add(i * 2), (value >> (24 - i * 8)) as u8);
        }
        24
    }

    // ------------------------------------------------------------------
    // Families 0x1/0x2/0x3: MOVE / MOVEA
    // ------------------------------------------------------------------

    fn move8<B: Bus + ?Sized>(&mut self, bus: &mut B, u: Unpacked) -> u32 {
        let (dreg, dmode, smode, sreg) = (u.v3, u.v2, u.v1, u.v0);
        if smode == 1 {
            return self.bad_mode("MOVE.B source", smode, sreg);
        }
        let mut cycles = 4;
        let Some(src) = self.resolve_ea(bus, smode, sreg, Size::Byte, &mut cycles) else {
            return self.bad_mode("MOVE.B source", smode, sreg);
        };
        let value = self.load8(bus, src);

        if dmode == 1 || dmode == 7 && dreg > 1 {
            return self.bad_mode("MOVE.B destination", dmode, dreg);
        }
        let Some(dst) = self.resolve_ea(bus, dmode, dreg, Size::Byte, &mut cycles) else {
            return self.bad_mode("MOVE.B destination", dmode, dreg);
        };
        if dmode == 4 {
            cycles -= 2; // a pre-decrement destination costs like post-increment
        }
        self.store8(bus, dst, value);

        alu::logic_flags(&mut self.regs.sr, value);
        cycles
    }

    fn move16<B: Bus + ?Sized>(&mut self, bus: &mut B, u: Unpacked) -> u32 {
        let (dreg, dmode, smode, sreg) = (u.v3, u.v2, u.v1, u.v0);
        let mut cycles = 4;
        let Some(src) = self.resolve_ea(bus, smode, sreg, Size::Word, &mut cycles) else {
            return self.bad_mode("MOVE.W source", smode, sreg);
        };
        let value = self.load16(bus, src);

        if dmode == 1 {
            // MOVEA.W: sign-extend, no flag update.
            self.regs.a[dreg as usize] = value as i16 as u32;
            return cycles;
        }
        if dmode == 7 && dreg > 1 {
            return self.bad_mode("MOVE.W destination", dmode, dreg);
        }
        let Some(dst) = self.resolve_ea(bus, dmode, dreg, Size::Word, &mut cycles) else {
            return self.bad_mode("MOVE.W destination", dmode, dreg);
        };
        if dmode == 4 {
            cycles -= 2;
        }
        self.store16(bus, dst, value);

        alu::logic_flags(&mut self.regs.sr, value);
        cycles
    }

    fn move32<B: Bus + ?Sized>(&mut self, bus: &mut B, u: Unpacked) -> u32 {
        let (dreg, dmode, smode, sreg) = (u.v3, u.v2, u.v1, u.v0);
        let mut cycles = 4;
        let Some(src) = self.resolve_ea(bus, smode, sreg, Size::Long, &mut cycles) else {
            return self.bad_mode("MOVE.L source", smode, sreg);
        };
        let value = self.load32(bus, src);

        if dmode == 1 {
            self.regs.a[dreg as usize] = value;
            return cycles;
        }
        if dmode == 7 && dreg > 1 {
            return self.bad_mode("MOVE.L destination", dmode, dreg);
        }
        let Some(dst) = self.resolve_ea(bus, dmode, dreg, Size::Long, &mut cycles) else {
            return self.bad_mode("MOVE.L destination", dmode, dreg);
        };
        self.store32(bus, dst, value);

        alu::logic_flags(&mut self.regs.sr, value);
        cycles
    }

    // ------------------------------------------------------------------
    // Family 0x4: miscellaneous
    // ------------------------------------------------------------------

    fn family_misc<B: Bus + ?Sized>(&mut self, bus: &mut B, u: Unpacked) -> u32 {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        match v2 {
            0 => match v3 {
                0 => self.rmw8(bus, v1, v0, 4, 8, "NEGX.B", |sr, v| alu::subx(sr, v, 0)),
                1 => self.clr8(bus, v1, v0),
                2 => self.rmw8(bus, v1, v0, 4, 8, "NEG.B", |sr, v| alu::sub(sr, v, 0)),
                3 => self.rmw8(bus, v1, v0, 4, 8, "NOT.B", |sr, v| alu::logic(sr, !v)),
                4 => self.rmw8(bus, v1, v0, 6, 8, "NBCD", |sr, v| alu::sbcd(sr, v, 0)),
                5 => self.tst8(bus, v1, v0),
                _ => self.unknown(u),
            },
            1 => match v3 {
                0 => self.rmw16(bus, v1, v0, 4, 8, "NEGX.W", |sr, v| alu::subx(sr, v, 0)),
                1 => self.clr16(bus, v1, v0),
                2 => self.rmw16(bus, v1, v0, 4, 8, "NEG.W", |sr, v| alu::sub(sr, v, 0)),
                3 => self.rmw16(bus, v1, v0, 4, 8, "NOT.W", |sr, v| alu::logic(sr, !v)),
                4 if v1 == 0 => self.swap(v0),
                4 => self.pea(bus, v1, v0),
                5 => self.tst16(bus, v1, v0),
                7 => match v1 {
                    0 => self.trap(bus, vector::trap(v0)),
                    1 => self.trap(bus, vector::trap(v0 | 8)),
                    2 => self.link(bus, v0),
                    3 => self.unlk(bus, v0),
                    4 => self.move_to_usp(bus, v0),
                    5 => self.move_from_usp(bus, v0),
                    6 => match v0 {
                        0 => self.reset_instruction(bus),
                        1 => 4, // NOP
                        2 => self.stop_instruction(bus),
                        3 => self.rte(bus),
                        5 => self.rts(bus),
                        7 => self.rtr(bus),
                        _ => self.unknown(u),
                    },
                    _ => self.unknown(u),
                },
                _ => self.unknown(u),
            },
            2 => match v3 {
                0 => self.rmw32(bus, v1, v0, 6, 12, "NEGX.L", |sr, v| alu::subx(sr, v, 0)),
                1 => self.clr32(bus, v1, v0),
                2 => self.rmw32(bus, v1, v0, 6, 12, "NEG.L", |sr, v| alu::sub(sr, v, 0)),
                3 => self.rmw32(bus, v1, v0, 6, 12, "NOT.L", |sr, v| alu::logic(sr, !v)),
                4 if v1 == 0 => self.ext16(v0),
                4 => self.movem_store16(bus, v1, v0),
                5 => self.tst32(bus, v1, v0),
                6 => self.movem_load16(bus, v1, v0),
                7 => self.jsr(bus, v1, v0),
                _ => self.unknown(u),
            },
            3 => match v3 {
                0 => self.move_from_sr(bus, v1, v0),
                2 => self.move_to_ccr(bus, v1, v0),
                3 => self.move_to_sr(bus, v1, v0),
                4 if v1 == 0 => self.ext32(v0),
                4 => self.movem_store32(bus, v1, v0),
                5 if v1 == 7 && v0 == 4 => self.trap(bus, vector::ILLEGAL_INSTRUCTION),
                6 => self.movem_load32(bus, v1, v0),
                7 => self.jmp(bus, v1, v0),
                _ => self.unknown(u),
            },
            6 => self.chk(bus, v3, v1, v0),
            7 => self.lea(bus, v3, v1, v0),
            _ => self.unknown(u),
        }
    }

    fn rmw8<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: u8,
        reg: u8,
        reg_time: u32,
        mem_base: u32,
        name: &str,
        op: fn(&mut StatusRegister, u8) -> u8,
    ) -> u32 {
        if mode == 0 {
            let value = self.regs.d_byte(reg);
            let res = op(&mut self.regs.sr, value);
            self.regs.set_d_byte(reg, res);
            return reg_time;
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode(name, mode, reg);
        }
        let mut cycles = mem_base;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Byte, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let value = self.load8(bus, place);
        let res = op(&mut self.regs.sr, value);
        self.store8(bus, place, res);
        cycles
    }

    fn rmw16<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: u8,
        reg: u8,
        reg_time: u32,
        mem_base: u32,
        name: &str,
        op: fn(&mut StatusRegister, u16) -> u16,
    ) -> u32 {
        if mode == 0 {
            let value = self.regs.d_word(reg);
            let res = op(&mut self.regs.sr, value);
            self.regs.set_d_word(reg, res);
            return reg_time;
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode(name, mode, reg);
        }
        let mut cycles = mem_base;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let value = self.load16(bus, place);
        let res = op(&mut self.regs.sr, value);
        self.store16(bus, place, res);
        cycles
    }

    fn rmw32<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: u8,
        reg: u8,
        reg_time: u32,
        mem_base: u32,
        name: &str,
        op: fn(&mut StatusRegister, u32) -> u32,
    ) -> u32 {
        if mode == 0 {
            let res = op(&mut self.regs.sr, self.regs.d[reg as usize]);
            self.regs.d[reg as usize] = res;
            return reg_time;
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode(name, mode, reg);
        }
        let mut cycles = mem_base;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Long, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let value = self.load32(bus, place);
        let res = op(&mut self.regs.sr, value);
        self.store32(bus, place, res);
        cycles
    }

    fn clr_flags(&mut self) {
        self.regs.sr.n = false;
        self.regs.sr.z = true;
        self.regs.sr.v = false;
        self.regs.sr.c = false;
    }

    fn clr8<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        self.clr_flags();
        if mode == 0 {
            self.regs.set_d_byte(reg, 0);
            return 4;
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode("CLR.B", mode, reg);
        }
        let mut cycles = 8;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Byte, &mut cycles) else {
            return self.bad_mode("CLR.B", mode, reg);
        };
        self.store8(bus, place, 0);
        cycles
    }

    fn clr16<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        self.clr_flags();
        if mode == 0 {
            self.regs.set_d_word(reg, 0);
            return 4;
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode("CLR.W", mode, reg);
        }
        let mut cycles = 8;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            return self.bad_mode("CLR.W", mode, reg);
        };
        self.store16(bus, place, 0);
        cycles
    }

    fn clr32<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        self.clr_flags();
        if mode == 0 {
            self.regs.d[reg as usize] = 0;
            return 6;
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode("CLR.L", mode, reg);
        }
        let mut cycles = 12;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Long, &mut cycles) else {
            return self.bad_mode("CLR.L", mode, reg);
        };
        self.store32(bus, place, 0);
        cycles
    }

    fn tst8<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        if mode != 0 && !alterable_mem(mode, reg) {
            return self.bad_mode("TST.B", mode, reg);
        }
        let mut cycles = 4;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Byte, &mut cycles) else {
            return self.bad_mode("TST.B", mode, reg);
        };
        let value = self.load8(bus, place);
        alu::logic_flags(&mut self.regs.sr, value);
        cycles
    }

    fn tst16<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        if mode > 1 && !alterable_mem(mode, reg) {
            return self.bad_mode("TST.W", mode, reg);
        }
        let mut cycles = 4;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            return self.bad_mode("TST.W", mode, reg);
        };
        let value = self.load16(bus, place);
        alu::logic_flags(&mut self.regs.sr, value);
        cycles
    }

    fn tst32<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        if mode > 1 && !alterable_mem(mode, reg) {
            return self.bad_mode("TST.L", mode, reg);
        }
        let mut cycles = if mode <= 1 { 8 } else { 4 };
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Long, &mut cycles) else {
            return self.bad_mode("TST.L", mode, reg);
        };
        let value = self.load32(bus, place);
        alu::logic_flags(&mut self.regs.sr, value);
        cycles
    }

    fn swap(&mut self, reg: u8) -> u32 {
        let d = self.regs.d[reg as usize];
        let res = d.rotate_left(16);
        self.regs.d[reg as usize] = res;
        alu::logic_flags(&mut self.regs.sr, res);
        4
    }

    fn ext16(&mut self, reg: u8) -> u32 {
        let res = self.regs.d_byte(reg) as i8 as u16;
        self.regs.set_d_word(reg, res);
        alu::logic_flags(&mut self.regs.sr, res);
        4
    }

    fn ext32(&mut self, reg: u8) -> u32 {
        let res = self.regs.d_word(reg) as i16 as u32;
        self.regs.d[reg as usize] = res;
        alu::logic_flags(&mut self.regs.sr, res);
        4
    }

    fn pea<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        let mut cycles = 0;
        let Some(addr) = self.resolve_ctrl(bus, mode, reg, &PEA_TIME, true, &mut cycles) else {
            return self.bad_mode("PEA", mode, reg);
        };
        self.push_long(bus, addr);
        cycles
    }

    fn lea<B: Bus + ?Sized>(&mut self, bus: &mut B, an: u8, mode: u8, reg: u8) -> u32 {
        let mut cycles = 0;
        let Some(addr) = self.resolve_ctrl(bus, mode, reg, &LEA_TIME, true, &mut cycles) else {
            return self.bad_mode("LEA", mode, reg);
        };
        self.regs.a[an as usize] = addr;
        cycles
    }

    fn jmp<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        let mut cycles = 0;
        let Some(addr) = self.resolve_ctrl(bus, mode, reg, &JMP_TIME, true, &mut cycles) else {
            return self.bad_mode("JMP", mode, reg);
        };
        self.regs.pc = addr;
        cycles
    }

    fn jsr<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        let mut cycles = 0;
        let Some(addr) = self.resolve_ctrl(bus, mode, reg, &JSR_TIME, true, &mut cycles) else {
            return self.bad_mode("JSR", mode, reg);
        };
        self.push_long(bus, self.regs.pc);
        self.regs.pc = addr;
        cycles
    }

    fn link<B: Bus + ?Sized>(&mut self, bus: &mut B, reg: u8) -> u32 {
        // LINK A7 pushes the already-decremented stack pointer.
        self.regs.a[7] = self.regs.a[7].wrapping_sub(4);
        bus.write_long(self.regs.a[7], self.regs.a[reg as usize]);
        self.regs.a[reg as usize] = self.regs.a[7];
        let disp = self.fetch_word(bus) as i16 as u32;
        self.regs.a[7] = self.regs.a[7].wrapping_add(disp);
        18
    }

    fn unlk<B: Bus + ?Sized>(&mut self, bus: &mut B, reg: u8) -> u32 {
        self.regs.a[7] = self.regs.a[reg as usize];
        self.regs.a[reg as usize] = bus.read_long(self.regs.a[7]);
        self.regs.a[7] = self.regs.a[7].wrapping_add(4);
        12
    }

    fn move_to_usp<B: Bus + ?Sized>(&mut self, bus: &mut B, reg: u8) -> u32 {
        if !self.regs.sr.s {
            return self.trap(bus, vector::PRIVILEGE_VIOLATION);
        }
        self.regs.alt_sp = self.regs.a[reg as usize];
        4
    }

    fn move_from_usp<B: Bus + ?Sized>(&mut self, bus: &mut B, reg: u8) -> u32 {
        if !self.regs.sr.s {
            return self.trap(bus, vector::PRIVILEGE_VIOLATION);
        }
        self.regs.a[reg as usize] = self.regs.alt_sp;
        4
    }

    fn reset_instruction<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u32 {
        if !self.regs.sr.s {
            return self.trap(bus, vector::PRIVILEGE_VIOLATION);
        }
        bus.reset_signal();
        132
    }

    fn stop_instruction<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u32 {
        if !self.regs.sr.s {
            return self.trap(bus, vector::PRIVILEGE_VIOLATION);
        }
        let imm = self.fetch_word(bus);
        self.regs.sr.set_word(imm);
        self.sync_stack_with_s(true);
        self.stop = true;
        4
    }

    fn rte<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u32 {
        if !self.regs.sr.s {
            return self.trap(bus, vector::PRIVILEGE_VIOLATION);
        }
        let sr = bus.read_word(self.regs.a[7]);
        self.regs.a[7] = self.regs.a[7].wrapping_add(2);
        self.regs.pc = bus.read_long(self.regs.a[7]);
        self.regs.a[7] = self.regs.a[7].wrapping_add(4);
        self.regs.sr.set_word(sr);
        self.sync_stack_with_s(true);
        20
    }

    fn rts<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u32 {
        self.regs.pc = bus.read_long(self.regs.a[7]);
        self.regs.a[7] = self.regs.a[7].wrapping_add(4);
        16
    }

    fn rtr<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u32 {
        let ccr = bus.read_word(self.regs.a[7]) as u8 & CCR_MASK as u8;
        self.regs.sr.set_ccr(ccr);
        self.regs.a[7] = self.regs.a[7].wrapping_add(2);
        self.regs.pc = bus.read_long(self.regs.a[7]);
        self.regs.a[7] = self.regs.a[7].wrapping_add(4);
        20
    }

    fn move_from_sr<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        let sr = self.regs.sr.to_word();
        if mode == 0 {
            self.regs.set_d_word(reg, sr);
            return 6;
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode("MOVE from SR", mode, reg);
        }
        let mut cycles = 8;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            return self.bad_mode("MOVE from SR", mode, reg);
        };
        self.store16(bus, place, sr);
        cycles
    }

    fn move_to_ccr<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        if mode == 1 {
            return self.bad_mode("MOVE to CCR", mode, reg);
        }
        let mut cycles = 12;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            return self.bad_mode("MOVE to CCR", mode, reg);
        };
        let value = self.load16(bus, place) as u8 & CCR_MASK as u8;
        self.regs.sr.set_ccr(value);
        cycles
    }

    fn move_to_sr<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        if !self.regs.sr.s {
            return self.trap(bus, vector::PRIVILEGE_VIOLATION);
        }
        if mode == 1 {
            return self.bad_mode("MOVE to SR", mode, reg);
        }
        let mut cycles = 12;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            return self.bad_mode("MOVE to SR", mode, reg);
        };
        let value = self.load16(bus, place);
        self.regs.sr.set_word(value);
        self.sync_stack_with_s(true);
        cycles
    }

    fn chk<B: Bus + ?Sized>(&mut self, bus: &mut B, dn: u8, mode: u8, reg: u8) -> u32 {
        if (self.regs.d_word(dn) as i16) < 0 {
            self.regs.sr.n = true;
            return self.trap(bus, vector::CHK_INSTRUCTION);
        }
        if mode == 1 {
            return self.bad_mode("CHK", mode, reg);
        }
        let mut cycles = 8;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            return self.bad_mode("CHK", mode, reg);
        };
        let bound = self.load16(bus, place) as i16;
        if self.regs.d_word(dn) as i16 > bound {
            self.trap(bus, vector::CHK_INSTRUCTION);
            return 40;
        }
        cycles
    }

    fn movem_store16<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        let mask = self.fetch_word(bus);
        if mode == 4 {
            // The mask is reversed: bit 0 selects A7, descending stores.
            let mut addr = self.regs.a[reg as usize].wrapping_sub(2);
            let mut cycles = 8;
            for i in 0..16 {
                if mask & 1 << i == 0 {
                    continue;
                }
                let value = if i < 8 { self.regs.a[7 - i] } else { self.regs.d[15 - i] };
                bus.write_word(addr, value as u16);
                addr = addr.wrapping_sub(2);
                cycles += 5;
            }
            self.regs.a[reg as usize] = addr.wrapping_add(2);
            return cycles;
        }
        let mut cycles = 0;
        let Some(mut addr) =
            self.resolve_ctrl(bus, mode, reg, &MOVEM_STORE_TIME, false, &mut cycles)
        else {
            return self.bad_mode("MOVEM.W to memory", mode, reg);
        };
        for i in 0..16 {
            if mask & 1 << i == 0 {
                continue;
            }
            let value = if i < 8 { self.regs.d[i] } else { self.regs.a[i - 8] };
            bus.write_word(addr, value as u16);
            addr = addr.wrapping_add(2);
            cycles += 5;
        }
        cycles
    }

    fn movem_load16<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        let mask = self.fetch_word(bus);
        let (mut addr, mut cycles, writeback) = if mode == 3 {
            (self.regs.a[reg as usize], 12, true)
        } else {
            let mut cycles = 0;
            let Some(addr) =
                self.resolve_ctrl(bus, mode, reg, &MOVEM_LOAD_TIME, true, &mut cycles)
            else {
                return self.bad_mode("MOVEM.W from memory", mode, reg);
            };
            (addr, cycles, false)
        };
        for i in 0..16 {
            if mask & 1 << i == 0 {
                continue;
            }
            // Word loads sign-extend into the full register, address
            // registers included.
            let value = bus.read_word(addr) as i16 as u32;
            if i < 8 {
                self.regs.d[i] = value;
            } else {
                self.regs.a[i - 8] = value;
            }
            addr = addr.wrapping_add(2);
            cycles += 4;
        }
        if writeback {
            self.regs.a[reg as usize] = addr;
        }
        cycles
    }

    fn movem_store32<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        let mask = self.fetch_word(bus);
        if mode == 4 {
            let mut addr = self.regs.a[reg as usize].wrapping_sub(4);
            let mut cycles = 8;
            for i in 0..16 {
                if mask & 1 << i == 0 {
                    continue;
                }
                let value = if i < 8 { self.regs.a[7 - i] } else { self.regs.d[15 - i] };
                bus.write_long(addr, value);
                addr = addr.wrapping_sub(4);
                cycles += 10;
            }
            self.regs.a[reg as usize] = addr.wrapping_add(4);
            return cycles;
        }
        let mut cycles = 0;
        let Some(mut addr) =
            self.resolve_ctrl(bus, mode, reg, &MOVEM_STORE_TIME, false, &mut cycles)
        else {
            return self.bad_mode("MOVEM.L to memory", mode, reg);
        };
        for i in 0..16 {
            if mask & 1 << i == 0 {
                continue;
            }
            let value = if i < 8 { self.regs.d[i] } else { self.regs.a[i - 8] };
            bus.write_long(addr, value);
            addr = addr.wrapping_add(4);
            cycles += 10;
        }
        cycles
    }

    fn movem_load32<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: u8, reg: u8) -> u32 {
        let mask = self.fetch_word(bus);
        let (mut addr, mut cycles, writeback) = if mode == 3 {
            (self.regs.a[reg as usize], 12, true)
        } else {
            let mut cycles = 0;
            let Some(addr) =
                self.resolve_ctrl(bus, mode, reg, &MOVEM_LOAD_TIME, true, &mut cycles)
            else {
                return self.bad_mode("MOVEM.L from memory", mode, reg);
            };
            (addr, cycles, false)
        };
        for i in 0..16 {
            if mask & 1 << i == 0 {
                continue;
            }
            let value = bus.read_long(addr);
            if i < 8 {
                self.regs.d[i] = value;
            } else {
                self.regs.a[i - 8] = value;
            }
            addr = addr.wrapping_add(4);
            cycles += 8;
        }
        if writeback {
            self.regs.a[reg as usize] = addr;
        }
        cycles
    }

    // ------------------------------------------------------------------
    // Family 0x5: ADDQ/SUBQ/Scc/DBcc
    // ------------------------------------------------------------------

    fn family_addq_subq<B: Bus + ?Sized>(&mut self, bus: &mut B, u: Unpacked) -> u32 {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        let data = if v3 == 0 { 8 } else { v3 };
        match v2 {
            0 => self.quick_alu8(bus, data, v1, v0, "ADDQ.B", alu::add),
            1 => self.quick_alu16(bus, data, v1, v0, "ADDQ.W", alu::add, u32::wrapping_add),
            2 => self.quick_alu32(bus, data, v1, v0, "ADDQ.L", alu::add, u32::wrapping_add),
            3 if v1 == 1 => self.dbcc(bus, v3 << 1, v0),
            3 => self.scc(bus, v3 << 1, v1, v0),
            4 => self.quick_alu8(bus, data, v1, v0, "SUBQ.B", alu::sub),
            5 => self.quick_alu16(bus, data, v1, v0, "SUBQ.W", alu::sub, u32::wrapping_sub),
            6 => self.quick_alu32(bus, data, v1, v0, "SUBQ.L", alu::sub, u32::wrapping_sub),
            7 if v1 == 1 => self.dbcc(bus, v3 << 1 | 1, v0),
            7 => self.scc(bus, v3 << 1 | 1, v1, v0),
            _ => self.unknown(u),
        }
    }

    fn quick_alu8<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        data: u8,
        mode: u8,
        reg: u8,
        name: &str,
        op: fn(&mut StatusRegister, u8, u8) -> u8,
    ) -> u32 {
        if mode == 0 {
            let dst = self.regs.d_byte(reg);
            let res = op(&mut self.regs.sr, data, dst);
            self.regs.set_d_byte(reg, res);
            return 4;
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode(name, mode, reg);
        }
        let mut cycles = 8;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Byte, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let dst = self.load8(bus, place);
        let res = op(&mut self.regs.sr, data, dst);
        self.store8(bus, place, res);
        cycles
    }

    fn quick_alu16<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        data: u8,
        mode: u8,
        reg: u8,
        name: &str,
        op: fn(&mut StatusRegister, u16, u16) -> u16,
        aop: fn(u32, u32) -> u32,
    ) -> u32 {
        match mode {
            0 => {
                let dst = self.regs.d_word(reg);
                let res = op(&mut self.regs.sr, data as u16, dst);
                self.regs.set_d_word(reg, res);
                4
            }
            // Address-register forms touch the whole register, no flags.
            1 => {
                self.regs.a[reg as usize] = aop(self.regs.a[reg as usize], data as u32);
                8
            }
            _ => {
                if !alterable_mem(mode, reg) {
                    return self.bad_mode(name, mode, reg);
                }
                let mut cycles = 8;
                let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
                    return self.bad_mode(name, mode, reg);
                };
                let dst = self.load16(bus, place);
                let res = op(&mut self.regs.sr, data as u16, dst);
                self.store16(bus, place, res);
                cycles
            }
        }
    }

    fn quick_alu32<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        data: u8,
        mode: u8,
        reg: u8,
        name: &str,
        op: fn(&mut StatusRegister, u32, u32) -> u32,
        aop: fn(u32, u32) -> u32,
    ) -> u32 {
        match mode {
            0 => {
                self.regs.d[reg as usize] =
                    op(&mut self.regs.sr, data as u32, self.regs.d[reg as usize]);
                8
            }
            1 => {
                self.regs.a[reg as usize] = aop(self.regs.a[reg as usize], data as u32);
                8
            }
            _ => {
                if !alterable_mem(mode, reg) {
                    return self.bad_mode(name, mode, reg);
                }
                let mut cycles = 12;
                let Some(place) = self.resolve_ea(bus, mode, reg, Size::Long, &mut cycles) else {
                    return self.bad_mode(name, mode, reg);
                };
                let dst = self.load32(bus, place);
                let res = op(&mut self.regs.sr, data as u32, dst);
                self.store32(bus, place, res);
                cycles
            }
        }
    }

    fn scc<B: Bus + ?Sized>(&mut self, bus: &mut B, cond: u8, mode: u8, reg: u8) -> u32 {
        let test = self.regs.sr.condition(cond);
        let value = if test { 0xFF } else { 0x00 };
        if mode == 0 {
            self.regs.set_d_byte(reg, value);
            return if test { 6 } else { 4 };
        }
        if !alterable_mem(mode, reg) {
            return self.bad_mode("Scc", mode, reg);
        }
        let mut cycles = 8;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Byte, &mut cycles) else {
            return self.bad_mode("Scc", mode, reg);
        };
        self.store8(bus, place, value);
        cycles
    }

    fn dbcc<B: Bus + ?Sized>(&mut self, bus: &mut B, cond: u8, reg: u8) -> u32 {
        let base = self.regs.pc;
        let disp = self.fetch_word(bus) as i16 as u32;
        if self.regs.sr.condition(cond) {
            return 10;
        }
        let counter = self.regs.d_word(reg).wrapping_sub(1);
        self.regs.set_d_word(reg, counter);
        if counter != 0xFFFF {
            self.regs.pc = base.wrapping_add(disp);
            14
        } else {
            12
        }
    }

    // ------------------------------------------------------------------
    // Family 0x6: Bcc/BSR/BRA
    // ------------------------------------------------------------------

    fn family_branch<B: Bus + ?Sized>(&mut self, bus: &mut B, opcode: u16) -> u32 {
        let cond = (opcode >> 8) as u8 & 0xF;
        let disp8 = opcode as u8;
        match cond {
            0 => {
                // BRA
                if disp8 == 0 {
                    let base = self.regs.pc;
                    let disp = self.fetch_word(bus) as i16 as u32;
                    self.regs.pc = base.wrapping_add(disp);
                } else {
                    self.regs.pc = self.regs.pc.wrapping_add(disp8 as i8 as u32);
                }
                10
            }
            1 => {
                // BSR
                let target = if disp8 == 0 {
                    let base = self.regs.pc;
                    let disp = self.fetch_word(bus) as i16 as u32;
                    base.wrapping_add(disp)
                } else {
                    self.regs.pc.wrapping_add(disp8 as i8 as u32)
                };
                self.push_long(bus, self.regs.pc);
                self.regs.pc = target;
                18
            }
            _ => {
                let word_form = disp8 == 0;
                let target = if word_form {
                    let base = self.regs.pc;
                    let disp = self.fetch_word(bus) as i16 as u32;
                    base.wrapping_add(disp)
                } else {
                    self.regs.pc.wrapping_add(disp8 as i8 as u32)
                };
                if self.regs.sr.condition(cond) {
                    self.regs.pc = target;
                    10
                } else if word_form {
                    12
                } else {
                    8
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Family 0x7: MOVEQ
    // ------------------------------------------------------------------

    fn family_moveq(&mut self, opcode: u16, u: Unpacked) -> u32 {
        if opcode & 0x0100 != 0 {
            return self.unknown(u);
        }
        let value = opcode as u8 as i8 as u32;
        self.regs.d[u.v3 as usize] = value;
        alu::logic_flags(&mut self.regs.sr, value);
        4
    }

    // ------------------------------------------------------------------
    // Families 0x8/0xC: OR/AND with DIV/MUL, SBCD/ABCD, EXG
    // ------------------------------------------------------------------

    fn family_or_div_sbcd<B: Bus + ?Sized>(&mut self, bus: &mut B, u: Unpacked) -> u32 {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        match v2 {
            0 if v1 != 1 => self.src_alu8(bus, v3, v1, v0, "OR.B", |sr, s, d| alu::logic(sr, s | d)),
            1 if v1 != 1 => {
                self.src_alu16(bus, v3, v1, v0, "OR.W", |sr, s, d| alu::logic(sr, s | d))
            }
            2 if v1 != 1 => {
                self.src_alu32(bus, v3, v1, v0, "OR.L", |sr, s, d| alu::logic(sr, s | d))
            }
            3 => self.divu(bus, v3, v1, v0),
            4 => match v1 {
                0 => {
                    let (src, dst) = (self.regs.d_byte(v0), self.regs.d_byte(v3));
                    let res = alu::sbcd(&mut self.regs.sr, src, dst);
                    self.regs.set_d_byte(v3, res);
                    6
                }
                1 => self.x_mem8(bus, v3, v0, alu::sbcd),
                _ => self.dst_alu8(bus, v3, v1, v0, "OR.B", |sr, s, d| alu::logic(sr, s | d)),
            },
            5 => self.dst_alu16(bus, v3, v1, v0, "OR.W", |sr, s, d| alu::logic(sr, s | d)),
            6 => self.dst_alu32(bus, v3, v1, v0, "OR.L", |sr, s, d| alu::logic(sr, s | d)),
            7 => self.divs(bus, v3, v1, v0),
            _ => self.unknown(u),
        }
    }

    fn family_and_mul_abcd_exg<B: Bus + ?Sized>(&mut self, bus: &mut B, u: Unpacked) -> u32 {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        match v2 {
            0 if v1 != 1 => {
                self.src_alu8(bus, v3, v1, v0, "AND.B", |sr, s, d| alu::logic(sr, s & d))
            }
            1 if v1 != 1 => {
                self.src_alu16(bus, v3, v1, v0, "AND.W", |sr, s, d| alu::logic(sr, s & d))
            }
            2 if v1 != 1 => {
                self.src_alu32(bus, v3, v1, v0, "AND.L", |sr, s, d| alu::logic(sr, s & d))
            }
            3 => self.mulu(bus, v3, v1, v0),
            4 => match v1 {
                0 => {
                    let (src, dst) = (self.regs.d_byte(v0), self.regs.d_byte(v3));
                    let res = alu::abcd(&mut self.regs.sr, src, dst);
                    self.regs.set_d_byte(v3, res);
                    6
                }
                1 => self.x_mem8(bus, v3, v0, alu::abcd),
                _ => self.dst_alu8(bus, v3, v1, v0, "AND.B", |sr, s, d| alu::logic(sr, s & d)),
            },
            5 => match v1 {
                0 => {
                    self.regs.d.swap(v3 as usize, v0 as usize);
                    6
                }
                1 => {
                    self.regs.a.swap(v3 as usize, v0 as usize);
                    6
                }
                _ => self.dst_alu16(bus, v3, v1, v0, "AND.W", |sr, s, d| alu::logic(sr, s & d)),
            },
            6 => match v1 {
                1 => {
                    std::mem::swap(&mut self.regs.d[v3 as usize], &mut self.regs.a[v0 as usize]);
                    6
                }
                _ => self.dst_alu32(bus, v3, v1, v0, "AND.L", |sr, s, d| alu::logic(sr, s & d)),
            },
            7 => self.muls(bus, v3, v1, v0),
            _ => self.unknown(u),
        }
    }

    /// Word source operand of DIVU/DIVS/MULU/MULS; register direct adds no
    /// time, the rest the standard table. Address register direct is not a
    /// legal source here.
    fn mul_div_operand<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: u8,
        reg: u8,
        name: &str,
    ) -> Option<(u16, u32)> {
        if mode == 1 {
            self.bad_mode(name, mode, reg);
            return None;
        }
        let mut cycles = 0;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            self.bad_mode(name, mode, reg);
            return None;
        };
        Some((self.load16(bus, place), cycles))
    }

    fn divu<B: Bus + ?Sized>(&mut self, bus: &mut B, dn: u8, mode: u8, reg: u8) -> u32 {
        let Some((divisor, ea_time)) = self.mul_div_operand(bus, mode, reg, "DIVU") else {
            return UTIME;
        };
        self.regs.sr.n = false;
        self.regs.sr.z = false;
        self.regs.sr.v = false;
        self.regs.sr.c = false;
        if divisor == 0 {
            return self.trap(bus, vector::ZERO_DIVIDE) + ea_time;
        }
        let dividend = self.regs.d[dn as usize];
        let quotient = dividend / divisor as u32;
        if quotient <= 0xFFFF {
            self.regs.sr.n = quotient & 0x8000 != 0;
            self.regs.sr.z = quotient == 0;
            let remainder = dividend % divisor as u32;
            self.regs.d[dn as usize] = remainder << 16 | quotient;
        } else {
            self.regs.sr.v = true;
        }
        140 + ea_time
    }

    fn divs<B: Bus + ?Sized>(&mut self, bus: &mut B, dn: u8, mode: u8, reg: u8) -> u32 {
        let Some((divisor, ea_time)) = self.mul_div_operand(bus, mode, reg, "DIVS") else {
            return UTIME;
        };
        self.regs.sr.n = false;
        self.regs.sr.z = false;
        self.regs.sr.v = false;
        self.regs.sr.c = false;
        if divisor == 0 {
            return self.trap(bus, vector::ZERO_DIVIDE) + ea_time;
        }
        // Widen so INT_MIN / -1 stays representable.
        let dividend = self.regs.d[dn as usize] as i32 as i64;
        let quotient = dividend / divisor as i16 as i64;
        if (-32768..=32767).contains(&quotient) {
            self.regs.sr.n = quotient < 0;
            self.regs.sr.z = quotient == 0;
            let remainder = dividend % divisor as i16 as i64;
            self.regs.d[dn as usize] = (remainder as u32) << 16 | quotient as u16 as u32;
        } else {
            self.regs.sr.v = true;
        }
        158 + ea_time
    }

    fn mulu<B: Bus + ?Sized>(&mut self, bus: &mut B, dn: u8, mode: u8, reg: u8) -> u32 {
        let Some((factor, ea_time)) = self.mul_div_operand(bus, mode, reg, "MULU") else {
            return UTIME;
        };
        let res = self.regs.d_word(dn) as u32 * factor as u32;
        self.regs.d[dn as usize] = res;
        alu::logic_flags(&mut self.regs.sr, res);
        70 + ea_time
    }

    fn muls<B: Bus + ?Sized>(&mut self, bus: &mut B, dn: u8, mode: u8, reg: u8) -> u32 {
        let Some((factor, ea_time)) = self.mul_div_operand(bus, mode, reg, "MULS") else {
            return UTIME;
        };
        let res = (self.regs.d_word(dn) as i16 as i32 * factor as i16 as i32) as u32;
        self.regs.d[dn as usize] = res;
        alu::logic_flags(&mut self.regs.sr, res);
        70 + ea_time
    }

    /// `-(Ay), -(Ax)` byte forms of ADDX/SUBX/ABCD/SBCD. Both registers
    /// pre-decrement before either operand is read.
    fn x_mem8<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        rx: u8,
        ry: u8,
        op: fn(&mut StatusRegister, u8, u8) -> u8,
    ) -> u32 {
        self.predec(rx, Size::Byte);
        self.predec(ry, Size::Byte);
        let src = bus.read_byte(self.regs.a[ry as usize]);
        let dst = bus.read_byte(self.regs.a[rx as usize]);
        let res = op(&mut self.regs.sr, src, dst);
        bus.write_byte(self.regs.a[rx as usize], res);
        18
    }

    fn x_mem16<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        rx: u8,
        ry: u8,
        op: fn(&mut StatusRegister, u16, u16) -> u16,
    ) -> u32 {
        self.predec(rx, Size::Word);
        self.predec(ry, Size::Word);
        let src = bus.read_word(self.regs.a[ry as usize]);
        let dst = bus.read_word(self.regs.a[rx as usize]);
        let res = op(&mut self.regs.sr, src, dst);
        bus.write_word(self.regs.a[rx as usize], res);
        18
    }

    fn x_mem32<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        rx: u8,
        ry: u8,
        op: fn(&mut StatusRegister, u32, u32) -> u32,
    ) -> u32 {
        self.predec(rx, Size::Long);
        self.predec(ry, Size::Long);
        let src = bus.read_long(self.regs.a[ry as usize]);
        let dst = bus.read_long(self.regs.a[rx as usize]);
        let res = op(&mut self.regs.sr, src, dst);
        bus.write_long(self.regs.a[rx as usize], res);
        30
    }

    // ------------------------------------------------------------------
    // Families 0x9/0xD: SUB/SUBX/SUBA and ADD/ADDX/ADDA
    // ------------------------------------------------------------------

    fn family_sub<B: Bus + ?Sized>(&mut self, bus: &mut B, u: Unpacked) -> u32 {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        match v2 {
            0 => self.src_alu8(bus, v3, v1, v0, "SUB.B", alu::sub),
            1 => self.src_alu16(bus, v3, v1, v0, "SUB.W", alu::sub),
            2 => self.src_alu32(bus, v3, v1, v0, "SUB.L", alu::sub),
            3 => self.addr_alu16(bus, v3, v1, v0, "SUBA.W", u32::wrapping_sub),
            4 => match v1 {
                0 => {
                    let (src, dst) = (self.regs.d_byte(v0), self.regs.d_byte(v3));
                    let res = alu::subx(&mut self.regs.sr, src, dst);
                    self.regs.set_d_byte(v3, res);
                    4
                }
                1 => self.x_mem8(bus, v3, v0, alu::subx),
                _ => self.dst_alu8(bus, v3, v1, v0, "SUB.B", alu::sub),
            },
            5 => match v1 {
                0 => {
                    let (src, dst) = (self.regs.d_word(v0), self.regs.d_word(v3));
                    let res = alu::subx(&mut self.regs.sr, src, dst);
                    self.regs.set_d_word(v3, res);
                    4
                }
                1 => self.x_mem16(bus, v3, v0, alu::subx),
                _ => self.dst_alu16(bus, v3, v1, v0, "SUB.W", alu::sub),
            },
            6 => match v1 {
                0 => {
                    let res = alu::subx(
                        &mut self.regs.sr,
                        self.regs.d[v0 as usize],
                        self.regs.d[v3 as usize],
                    );
                    self.regs.d[v3 as usize] = res;
                    8
                }
                1 => self.x_mem32(bus, v3, v0, alu::subx),
                _ => self.dst_alu32(bus, v3, v1, v0, "SUB.L", alu::sub),
            },
            7 => self.addr_alu32(bus, v3, v1, v0, "SUBA.L", u32::wrapping_sub),
            _ => self.unknown(u),
        }
    }

    fn family_add<B: Bus + ?Sized>(&mut self, bus: &mut B, u: Unpacked) -> u32 {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        match v2 {
            0 => self.src_alu8(bus, v3, v1, v0, "ADD.B", alu::add),
            1 => self.src_alu16(bus, v3, v1, v0, "ADD.W", alu::add),
            2 => self.src_alu32(bus, v3, v1, v0, "ADD.L", alu::add),
            3 => self.addr_alu16(bus, v3, v1, v0, "ADDA.W", u32::wrapping_add),
            4 => match v1 {
                0 => {
                    let (src, dst) = (self.regs.d_byte(v0), self.regs.d_byte(v3));
                    let res = alu::addx(&mut self.regs.sr, src, dst);
                    self.regs.set_d_byte(v3, res);
                    4
                }
                1 => self.x_mem8(bus, v3, v0, alu::addx),
                _ => self.dst_alu8(bus, v3, v1, v0, "ADD.B", alu::add),
            },
            5 => match v1 {
                0 => {
                    let (src, dst) = (self.regs.d_word(v0), self.regs.d_word(v3));
                    let res = alu::addx(&mut self.regs.sr, src, dst);
                    self.regs.set_d_word(v3, res);
                    4
                }
                1 => self.x_mem16(bus, v3, v0, alu::addx),
                _ => self.dst_alu16(bus, v3, v1, v0, "ADD.W", alu::add),
            },
            6 => match v1 {
                0 => {
                    let res = alu::addx(
                        &mut self.regs.sr,
                        self.regs.d[v0 as usize],
                        self.regs.d[v3 as usize],
                    );
                    self.regs.d[v3 as usize] = res;
                    8
                }
                1 => self.x_mem32(bus, v3, v0, alu::addx),
                _ => self.dst_alu32(bus, v3, v1, v0, "ADD.L", alu::add),
            },
            7 => self.addr_alu32(bus, v3, v1, v0, "ADDA.L", u32::wrapping_add),
            _ => self.unknown(u),
        }
    }

    fn src_alu8<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        dn: u8,
        mode: u8,
        reg: u8,
        name: &str,
        op: fn(&mut StatusRegister, u8, u8) -> u8,
    ) -> u32 {
        if mode == 1 {
            return self.bad_mode(name, mode, reg);
        }
        let mut cycles = 4;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Byte, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let src = self.load8(bus, place);
        let dst = self.regs.d_byte(dn);
        let res = op(&mut self.regs.sr, src, dst);
        self.regs.set_d_byte(dn, res);
        cycles
    }

    fn src_alu16<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        dn: u8,
        mode: u8,
        reg: u8,
        name: &str,
        op: fn(&mut StatusRegister, u16, u16) -> u16,
    ) -> u32 {
        let mut cycles = 4;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let src = self.load16(bus, place);
        let dst = self.regs.d_word(dn);
        let res = op(&mut self.regs.sr, src, dst);
        self.regs.set_d_word(dn, res);
        cycles
    }

    fn src_alu32<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        dn: u8,
        mode: u8,
        reg: u8,
        name: &str,
        op: fn(&mut StatusRegister, u32, u32) -> u32,
    ) -> u32 {
        let mut cycles = if mode <= 1 { 8 } else { 6 };
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Long, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let src = self.load32(bus, place);
        let res = op(&mut self.regs.sr, src, self.regs.d[dn as usize]);
        self.regs.d[dn as usize] = res;
        cycles
    }

    fn dst_alu8<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        dn: u8,
        mode: u8,
        reg: u8,
        name: &str,
        op: fn(&mut StatusRegister, u8, u8) -> u8,
    ) -> u32 {
        if !alterable_mem(mode, reg) {
            return self.bad_mode(name, mode, reg);
        }
        let mut cycles = 8;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Byte, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let dst = self.load8(bus, place);
        let src = self.regs.d_byte(dn);
        let res = op(&mut self.regs.sr, src, dst);
        self.store8(bus, place, res);
        cycles
    }

    fn dst_alu16<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        dn: u8,
        mode: u8,
        reg: u8,
        name: &str,
        op: fn(&mut StatusRegister, u16, u16) -> u16,
    ) -> u32 {
        if !alterable_mem(mode, reg) {
            return self.bad_mode(name, mode, reg);
        }
        let mut cycles = 8;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let dst = self.load16(bus, place);
        let src = self.regs.d_word(dn);
        let res = op(&mut self.regs.sr, src, dst);
        self.store16(bus, place, res);
        cycles
    }

    fn dst_alu32<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        dn: u8,
        mode: u8,
        reg: u8,
        name: &str,
        op: fn(&mut StatusRegister, u32, u32) -> u32,
    ) -> u32 {
        if !alterable_mem(mode, reg) {
            return self.bad_mode(name, mode, reg);
        }
        let mut cycles = 12;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Long, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let dst = self.load32(bus, place);
        let res = op(&mut self.regs.sr, self.regs.d[dn as usize], dst);
        self.store32(bus, place, res);
        cycles
    }

    /// ADDA.W / SUBA.W: word source sign-extended, whole register updated,
    /// no flags.
    fn addr_alu16<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        an: u8,
        mode: u8,
        reg: u8,
        name: &str,
        aop: fn(u32, u32) -> u32,
    ) -> u32 {
        let mut cycles = 8;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let src = self.load16(bus, place) as i16 as u32;
        self.regs.a[an as usize] = aop(self.regs.a[an as usize], src);
        cycles
    }

    fn addr_alu32<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        an: u8,
        mode: u8,
        reg: u8,
        name: &str,
        aop: fn(u32, u32) -> u32,
    ) -> u32 {
        let mut cycles = if mode <= 1 { 8 } else { 6 };
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Long, &mut cycles) else {
            return self.bad_mode(name, mode, reg);
        };
        let src = self.load32(bus, place);
        self.regs.a[an as usize] = aop(self.regs.a[an as usize], src);
        cycles
    }

    // ------------------------------------------------------------------
    // Family 0xB: CMP/CMPM/CMPA/EOR
    // ------------------------------------------------------------------

    fn family_cmp_eor<B: Bus + ?Sized>(&mut self, bus: &mut B, u: Unpacked) -> u32 {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        match v2 {
            0 => self.cmp8(bus, v3, v1, v0),
            1 => self.cmp16(bus, v3, v1, v0),
            2 => self.cmp32(bus, v3, v1, v0),
            3 => self.cmpa16(bus, v3, v1, v0),
            4 if v1 == 1 => self.cmpm8(bus, v3, v0),
            4 => self.eor8(bus, v3, v1, v0),
            5 if v1 == 1 => self.cmpm16(bus, v3, v0),
            5 => self.eor16(bus, v3, v1, v0),
            6 if v1 == 1 => self.cmpm32(bus, v3, v0),
            6 => self.eor32(bus, v3, v1, v0),
            7 => self.cmpa32(bus, v3, v1, v0),
            _ => self.unknown(u),
        }
    }

    fn cmp8<B: Bus + ?Sized>(&mut self, bus: &mut B, dn: u8, mode: u8, reg: u8) -> u32 {
        if mode == 1 {
            return self.bad_mode("CMP.B", mode, reg);
        }
        let mut cycles = 4;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Byte, &mut cycles) else {
            return self.bad_mode("CMP.B", mode, reg);
        };
        let src = self.load8(bus, place);
        let dst = self.regs.d_byte(dn);
        alu::cmp(&mut self.regs.sr, src, dst);
        cycles
    }

    fn cmp16<B: Bus + ?Sized>(&mut self, bus: &mut B, dn: u8, mode: u8, reg: u8) -> u32 {
        let mut cycles = 4;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            return self.bad_mode("CMP.W", mode, reg);
        };
        let src = self.load16(bus, place);
        let dst = self.regs.d_word(dn);
        alu::cmp(&mut self.regs.sr, src, dst);
        cycles
    }

    fn cmp32<B: Bus + ?Sized>(&mut self, bus: &mut B, dn: u8, mode: u8, reg: u8) -> u32 {
        let mut cycles = 6;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Long, &mut cycles) else {
            return self.bad_mode("CMP.L", mode, reg);
        };
        let src = self.load32(bus, place);
        alu::cmp(&mut self.regs.sr, src, self.regs.d[dn as usize]);
        cycles
    }

    fn cmpa16<B: Bus + ?Sized>(&mut self, bus: &mut B, an: u8, mode: u8, reg: u8) -> u32 {
        let mut cycles = 6;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Word, &mut cycles) else {
            return self.bad_mode("CMPA.W", mode, reg);
        };
        let src = self.load16(bus, place) as i16 as u32;
        alu::cmp(&mut self.regs.sr, src, self.regs.a[an as usize]);
        cycles
    }

    fn cmpa32<B: Bus + ?Sized>(&mut self, bus: &mut B, an: u8, mode: u8, reg: u8) -> u32 {
        let mut cycles = 6;
        let Some(place) = self.resolve_ea(bus, mode, reg, Size::Long, &mut cycles) else {
            return self.bad_mode("CMPA.L", mode, reg);
        };
        let src = self.load32(bus, place);
        alu::cmp(&mut self.regs.sr, src, self.regs.a[an as usize]);
        cycles
    }

    fn cmpm8<B: Bus + ?Sized>(&mut self, bus: &mut B, rx: u8, ry: u8) -> u32 {
        let src = bus.read_byte(self.regs.a[ry as usize]);
        let dst = bus.read_byte(self.regs.a[rx as usize]);
        alu::cmp(&mut self.regs.sr, src, dst);
        self.postinc(rx, Size::Byte);
        self.postinc(ry, Size::Byte);
        12
    }

    fn cmpm16<B: Bus + ?Sized>(&mut self, bus: &mut B, rx: u8, ry: u8) -> u32 {
        let src = bus.read_word(self.regs.a[ry as usize]);
        let dst = bus.read_word(self.regs.a[rx as usize]);
        alu::cmp(&mut self.regs.sr, src, dst);
        self.postinc(rx, Size::Word);
        self.postinc(ry, Size::Word);
        12
    }

    fn cmpm32<B: Bus + ?Sized>(&mut self, bus: &mut B, rx: u8, ry: u8) -> u32 {
        let src = bus.read_long(self.regs.a[ry as usize]);
        let dst = bus.read_long(self.regs.a[rx as usize]);
        alu::cmp(&mut self.regs.sr, src, dst);
        self.postinc(rx, Size::Long);
        self.postinc(ry, Size::Long);
        20
    }

    fn eor8<B: Bus + ?Sized>(&mut self, bus: &mut B, dn: u8, mode: u8, reg: u8) -> u32 {
        if mode == 0 {
            let value = self.regs.d_byte(dn) ^ self.regs.d_byte(reg);
            let res = alu::logic(&mut self.regs.sr, value);
            self.regs.set_d_byte(reg, res);
            return 8;
        }
        self.dst_alu8(bus, dn, mode, reg, "EOR.B", |sr, s, d| alu::logic(sr, s ^ d))
    }

    fn eor16<B: Bus + ?Sized>(&mut self, bus: &mut B, dn: u8, mode: u8, reg: u8) -> u32 {
        if mode == 0 {
            let value = self.regs.d_word(dn) ^ self.regs.d_word(reg);
            let res = alu::logic(&mut self.regs.sr, value);
            self.regs.set_d_word(reg, res);
            return 8;
        }
        self.dst_alu16(bus, dn, mode, reg, "EOR.W", |sr, s, d| alu::logic(sr, s ^ d))
    }

    fn eor32<B: Bus + ?Sized>(&mut self, bus: &mut B, dn: u8, mode: u8, reg: u8) -> u32 {
        if mode == 0 {
            let res =
                alu::logic(&mut self.regs.sr, self.regs.d[dn as usize] ^ self.regs.d[reg as usize]);
            self.regs.d[reg as usize] = res;
            return 12;
        }
        self.dst_alu32(bus, dn, mode, reg, "EOR.L", |sr, s, d| alu::logic(sr, s ^ d))
    }

    // ------------------------------------------------------------------
    // Family 0xE: shifts and rotates
    // ------------------------------------------------------------------

    fn family_shift_rot<B: Bus + ?Sized>(&mut self, bus: &mut B, u: Unpacked) -> u32 {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        const OPS8: [fn(&mut StatusRegister, u8, u32) -> u8; 8] = [
            alu::asr::<u8>,
            alu::lsr::<u8>,
            alu::roxr::<u8>,
            alu::ror::<u8>,
            alu::asl::<u8>,
            alu::lsl::<u8>,
            alu::roxl::<u8>,
            alu::rol::<u8>,
        ];
        const OPS16: [fn(&mut StatusRegister, u16, u32) -> u16; 8] = [
            alu::asr::<u16>,
            alu::lsr::<u16>,
            alu::roxr::<u16>,
            alu::ror::<u16>,
            alu::asl::<u16>,
            alu::lsl::<u16>,
            alu::roxl::<u16>,
            alu::rol::<u16>,
        ];
        const OPS32: [fn(&mut StatusRegister, u32, u32) -> u32; 8] = [
            alu::asr::<u32>,
            alu::lsr::<u32>,
            alu::roxr::<u32>,
            alu::ror::<u32>,
            alu::asl::<u32>,
            alu::lsl::<u32>,
            alu::roxl::<u32>,
            alu::rol::<u32>,
        ];

        // v2: 0..=2 right shifts by size, 3 memory right, 4..=6 left
        // shifts, 7 memory left. v1 selects the operation and the
        // immediate/register count form.
        match v2 {
            0 | 1 | 2 | 4 | 5 | 6 => {
                let left = v2 >= 4;
                let kind = (v1 & 3) + if left { 4 } else { 0 };
                let count = if v1 >= 4 {
                    self.regs.d[v3 as usize] & 0x3F
                } else if v3 == 0 {
                    8
                } else {
                    v3 as u32
                };
                match v2 & 3 {
                    0 => {
                        let value = self.regs.d_byte(v0);
                        let res = OPS8[kind as usize](&mut self.regs.sr, value, count);
                        self.regs.set_d_byte(v0, res);
                        6 + 2 * count
                    }
                    1 => {
                        let value = self.regs.d_word(v0);
                        let res = OPS16[kind as usize](&mut self.regs.sr, value, count);
                        self.regs.set_d_word(v0, res);
                        6 + 2 * count
                    }
                    _ => {
                        let res = OPS32[kind as usize](
                            &mut self.regs.sr,
                            self.regs.d[v0 as usize],
                            count,
                        );
                        self.regs.d[v0 as usize] = res;
                        8 + 2 * count
                    }
                }
            }
            3 | 7 => {
                if v3 > 3 {
                    return self.unknown(u);
                }
                let kind = v3 + if v2 == 7 { 4 } else { 0 };
                if !alterable_mem(v1, v0) {
                    return self.bad_mode("shift/rotate memory form", v1, v0);
                }
                let mut cycles = 10;
                let Some(place) = self.resolve_ea(bus, v1, v0, Size::Word, &mut cycles) else {
                    return self.bad_mode("shift/rotate memory form", v1, v0);
                };
                let value = self.load16(bus, place);
                let res = OPS16[kind as usize](&mut self.regs.sr, value, 1);
                self.store16(bus, place, res);
                cycles
            }
            _ => self.unknown(u),
        }
    }
}
