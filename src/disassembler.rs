// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The disassembler.
//!
//! A mirror of the executor that fills a structured [`Instruction`] record
//! instead of touching the register file. It walks the same dispatch tree
//! and consumes exactly the extension words the executor would, so the
//! reported instruction length always matches the executor's PC
//! advancement. Only instruction words are read; the register file and
//! data memory are never examined.

use crate::addressing::Size;
use crate::bus::Bus;
use crate::opcode_table::{unpack, Unpacked};

use std::fmt;

/// Instruction mnemonics, size-suffixed where the instruction has sized
/// forms. MOVEA, ADDA, SUBA and CMPA disassemble as the base mnemonic with
/// an address-register operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Mnemonic {
    Unknown,
    Abcd,
    AddB, AddW, AddL,
    AddiB, AddiW, AddiL,
    AddqB, AddqW, AddqL,
    AddxB, AddxW, AddxL,
    AndB, AndW, AndL,
    AndiB, AndiW, AndiL,
    AslB, AslW, AslL,
    AsrB, AsrW, AsrL,
    Bhi, Bls, Bcc, Bcs, Bne, Beq, Bvc, Bvs, Bpl, Bmi, Bge, Blt, Bgt, Ble,
    Bra, Bsr,
    Bchg, Bclr, Bset, Btst,
    Chk,
    ClrB, ClrW, ClrL,
    CmpB, CmpW, CmpL,
    CmpiB, CmpiW, CmpiL,
    CmpmB, CmpmW, CmpmL,
    DbT, DbF, DbHi, DbLs, DbCc, DbCs, DbNe, DbEq, DbVc, DbVs, DbPl, DbMi, DbGe, DbLt, DbGt, DbLe,
    Divs, Divu,
    EorB, EorW, EorL,
    EoriB, EoriW, EoriL,
    Exg,
    ExtW, ExtL,
    Illegal,
    Jmp, Jsr,
    Lea, Link,
    LslB, LslW, LslL,
    LsrB, LsrW, LsrL,
    MoveB, MoveW, MoveL,
    MovemW, MovemL,
    MovepW, MovepL,
    Moveq,
    Muls, Mulu,
    Nbcd,
    NegB, NegW, NegL,
    NegxB, NegxW, NegxL,
    Nop,
    NotB, NotW, NotL,
    OrB, OrW, OrL,
    OriB, OriW, OriL,
    Pea,
    Reset,
    RolB, RolW, RolL,
    RorB, RorW, RorL,
    RoxlB, RoxlW, RoxlL,
    RoxrB, RoxrW, RoxrL,
    Rte, Rtr, Rts,
    Sbcd,
    St, Sf, Shi, Sls, Scc, Scs, Sne, Seq, Svc, Svs, Spl, Smi, Sge, Slt, Sgt, Sle,
    Stop,
    SubB, SubW, SubL,
    SubiB, SubiW, SubiL,
    SubqB, SubqW, SubqL,
    SubxB, SubxW, SubxL,
    Swap,
    Trap,
    TstB, TstW, TstL,
    Unlk,
}

impl Mnemonic {
    /// Assembly spelling of the mnemonic.
    pub const fn as_str(self) -> &'static str {
        use Mnemonic::*;
        match self {
            Unknown => "???",
            Abcd => "ABCD",
            AddB => "ADD.B", AddW => "ADD.W", AddL => "ADD.L",
            AddiB => "ADDI.B", AddiW => "ADDI.W", AddiL => "ADDI.L",
            AddqB => "ADDQ.B", AddqW => "ADDQ.W", AddqL => "ADDQ.L",
            AddxB => "ADDX.B", AddxW => "ADDX.W", AddxL => "ADDX.L",
            AndB => "AND.B", AndW => "AND.W", AndL => "AND.L",
            AndiB => "ANDI.B", AndiW => "ANDI.W", AndiL => "ANDI.L",
            AslB => "ASL.B", AslW => "ASL.W", AslL => "ASL.L",
            AsrB => "ASR.B", AsrW => "ASR.W", AsrL => "ASR.L",
            Bhi => "BHI", Bls => "BLS", Bcc => "BCC", Bcs => "BCS",
            Bne => "BNE", Beq => "BEQ", Bvc => "BVC", Bvs => "BVS",
            Bpl => "BPL", Bmi => "BMI", Bge => "BGE", Blt => "BLT",
            Bgt => "BGT", Ble => "BLE",
            Bra => "BRA", Bsr => "BSR",
            Bchg => "BCHG", Bclr => "BCLR", Bset => "BSET", Btst => "BTST",
            Chk => "CHK",
            ClrB => "CLR.B", ClrW => "CLR.W", ClrL => "CLR.L",
            CmpB => "CMP.B", CmpW => "CMP.W", CmpL => "CMP.L",
            CmpiB => "CMPI.B", CmpiW => "CMPI.W", CmpiL => "CMPI.L",
            CmpmB => "CMPM.B", CmpmW => "CMPM.W", CmpmL => "CMPM.L",
            DbT => "DBT", DbF => "DBF", DbHi => "DBHI", DbLs => "DBLS",
            DbCc => "DBCC", DbCs => "DBCS", DbNe => "DBNE", DbEq => "DBEQ",
            DbVc => "DBVC", DbVs => "DBVS", DbPl => "DBPL", DbMi => "DBMI",
            DbGe => "DBGE", DbLt => "DBLT", DbGt => "DBGT", DbLe => "DBLE",
            Divs => "DIVS", Divu => "DIVU",
            EorB => "EOR.B", EorW => "EOR.W", EorL => "EOR.L",
            EoriB => "EORI.B", EoriW => "EORI.W", EoriL => "EORI.L",
            Exg => "EXG",
            ExtW => "EXT.W", ExtL => "EXT.L",
            Illegal => "ILLEGAL",
            Jmp => "JMP", Jsr => "JSR",
            Lea => "LEA", Link => "LINK",
            LslB => "LSL.B", LslW => "LSL.W", LslL => "LSL.L",
            LsrB => "LSR.B", LsrW => "LSR.W", LsrL => "LSR.L",
            MoveB => "MOVE.B", MoveW => "MOVE.W", MoveL => "MOVE.L",
            MovemW => "MOVEM.W", MovemL => "MOVEM.L",
            MovepW => "MOVEP.W", MovepL => "MOVEP.L",
            Moveq => "MOVEQ",
            Muls => "MULS", Mulu => "MULU",
            Nbcd => "NBCD",
            NegB => "NEG.B", NegW => "NEG.W", NegL => "NEG.L",
            NegxB => "NEGX.B", NegxW => "NEGX.W", NegxL => "NEGX.L",
            Nop => "NOP",
            NotB => "NOT.B", NotW => "NOT.W", NotL => "NOT.L",
            OrB => "OR.B", OrW => "OR.W", OrL => "OR.L",
            OriB => "ORI.B", OriW => "ORI.W", OriL => "ORI.L",
            Pea => "PEA",
            Reset => "RESET",
            RolB => "ROL.B", RolW => "ROL.W", RolL => "ROL.L",
            RorB => "ROR.B", RorW => "ROR.W", RorL => "ROR.L",
            RoxlB => "ROXL.B", RoxlW => "ROXL.W", RoxlL => "ROXL.L",
            RoxrB => "ROXR.B", RoxrW => "ROXR.W", RoxrL => "ROXR.L",
            Rte => "RTE", Rtr => "RTR", Rts => "RTS",
            Sbcd => "SBCD",
            St => "ST", Sf => "SF", Shi => "SHI", Sls => "SLS",
            Scc => "SCC", Scs => "SCS", Sne => "SNE", Seq => "SEQ",
            Svc => "SVC", Svs => "SVS", Spl => "SPL", Smi => "SMI",
            Sge => "SGE", Slt => "SLT", Sgt => "SGT", Sle => "SLE",
            Stop => "STOP",
            SubB => "SUB.B", SubW => "SUB.W", SubL => "SUB.L",
            SubiB => "SUBI.B", SubiW => "SUBI.W", SubiL => "SUBI.L",
            SubqB => "SUBQ.B", SubqW => "SUBQ.W", SubqL => "SUBQ.L",
            SubxB => "SUBX.B", SubxW => "SUBX.W", SubxL => "SUBX.L",
            Swap => "SWAP",
            Trap => "TRAP",
            TstB => "TST.B", TstW => "TST.W", TstL => "TST.L",
            Unlk => "UNLK",
        }
    }

    const fn sized(base: [Mnemonic; 3], size: Size) -> Mnemonic {
        match size {
            Size::Byte => base[0],
            Size::Word => base[1],
            Size::Long => base[2],
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The index register of a brief extension word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexReg {
    /// True for An, false for Dn.
    pub addr: bool,
    /// Register number.
    pub reg: u8,
    /// True for the .L form, false for .W.
    pub long: bool,
}

impl fmt::Display for IndexReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}.{}",
            if self.addr { 'A' } else { 'D' },
            self.reg,
            if self.long { 'L' } else { 'W' }
        )
    }
}

/// One operand of a disassembled instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    None,
    /// `Dn`
    DataReg(u8),
    /// `An`
    AddrReg(u8),
    /// `(An)`
    AddrInd(u8),
    /// `(An)+`
    AddrIndPostInc(u8),
    /// `-(An)`
    AddrIndPreDec(u8),
    /// `(d16, An)`
    AddrIndDisp { reg: u8, disp: i16 },
    /// `(d8, An, Xn)`
    AddrIndIndex { reg: u8, index: IndexReg, disp: i8 },
    /// `(xxx).W`
    AbsShort(u16),
    /// `(xxx).L`
    AbsLong(u32),
    /// `(d16, PC)`
    PcDisp(i16),
    /// `(d8, PC, Xn)`
    PcIndex { index: IndexReg, disp: i8 },
    /// `#imm` at byte width.
    ImmByte(u8),
    /// `#imm` at word width.
    ImmWord(u16),
    /// `#imm` at long width.
    ImmLong(u32),
    /// The status register.
    Sr,
    /// The condition code register.
    Ccr,
    /// The user stack pointer.
    Usp,
    /// TRAP vector number.
    Vector(u8),
    /// MOVEM register list, bit 0 = D0 .. bit 15 = A7 in source order (the
    /// pre-decrement store form is reversed at decode time).
    RegList(u16),
    /// Branch target with its encoded displacement.
    Label { disp: i16, target: u32 },
    /// LINK frame displacement.
    Disp16(i16),
    /// Shift/rotate immediate count.
    Count(u8),
}

fn fmt_reg_list(mask: u16, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = |i: usize| {
        if i < 8 {
            (b'D', i as u8)
        } else {
            (b'A', i as u8 - 8)
        }
    };
    let mut first = true;
    let mut i = 0;
    while i < 16 {
        if mask & 1 << i == 0 {
            i += 1;
            continue;
        }
        // Extend runs within the same register bank only.
        let mut j = i;
        while j + 1 < 16 && (j + 1) / 8 == i / 8 && mask & 1 << (j + 1) != 0 {
            j += 1;
        }
        if !first {
            f.write_str("/")?;
        }
        first = false;
        let (bank, n) = name(i);
        write!(f, "{}{}", bank as char, n)?;
        if j > i {
            let (bank, n) = name(j);
            write!(f, "-{}{}", bank as char, n)?;
        }
        i = j + 1;
    }
    if first {
        f.write_str("(none)")?;
    }
    Ok(())
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Operand::None => Ok(()),
            Operand::DataReg(r) => write!(f, "D{r}"),
            Operand::AddrReg(r) => write!(f, "A{r}"),
            Operand::AddrInd(r) => write!(f, "(A{r})"),
            Operand::AddrIndPostInc(r) => write!(f, "(A{r})+"),
            Operand::AddrIndPreDec(r) => write!(f, "-(A{r})"),
            Operand::AddrIndDisp { reg, disp } => write!(f, "({disp}, A{reg})"),
            Operand::AddrIndIndex { reg, index, disp } => write!(f, "({disp}, A{reg}, {index})"),
            Operand::AbsShort(addr) => write!(f, "({addr:#X}).W"),
            Operand::AbsLong(addr) => write!(f, "({addr:#X}).L"),
            Operand::PcDisp(disp) => write!(f, "({disp}, PC)"),
            Operand::PcIndex { index, disp } => write!(f, "({disp}, PC, {index})"),
            Operand::ImmByte(imm) => write!(f, "#{imm:#X}"),
            Operand::ImmWord(imm) => write!(f, "#{imm:#X}"),
            Operand::ImmLong(imm) => write!(f, "#{imm:#X}"),
            Operand::Sr => f.write_str("SR"),
            Operand::Ccr => f.write_str("CCR"),
            Operand::Usp => f.write_str("USP"),
            Operand::Vector(v) => write!(f, "#{v}"),
            Operand::RegList(mask) => fmt_reg_list(mask, f),
            Operand::Label { target, .. } => write!(f, "{target:#X}"),
            Operand::Disp16(disp) => write!(f, "#{disp}"),
            Operand::Count(c) => write!(f, "#{c}"),
        }
    }
}

/// A disassembled instruction: mnemonic, up to two operands and the raw
/// bytes consumed (at most ten).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Address the instruction was decoded from.
    pub address: u32,
    pub mnemonic: Mnemonic,
    pub op1: Operand,
    pub op2: Operand,
    bytes: [u8; 10],
    nbytes: u8,
}

impl Instruction {
    /// The raw bytes of the instruction, opcode included.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.nbytes as usize]
    }

    /// Address of the next instruction.
    pub fn next_addr(&self) -> u32 {
        self.address.wrapping_add(self.nbytes as u32)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic)?;
        if self.op1 != Operand::None {
            write!(f, " {}", self.op1)?;
        }
        if self.op2 != Operand::None {
            write!(f, ", {}", self.op2)?;
        }
        Ok(())
    }
}

/// Which (mode, reg) pairs an instruction's effective-address field admits.
#[derive(Clone, Copy)]
struct Allow {
    data: bool,
    addr: bool,
    postinc: bool,
    predec: bool,
    pc: bool,
    imm: Option<Size>,
}

/// Data-alterable destinations: Dn and writable memory.
const DATA_ALT: Allow =
    Allow { data: true, addr: false, postinc: true, predec: true, pc: false, imm: None };
/// Alterable including address registers (quick-form word/long).
const ALT_ANY: Allow =
    Allow { data: true, addr: true, postinc: true, predec: true, pc: false, imm: None };
/// Writable memory only.
const MEM_ALT: Allow =
    Allow { data: false, addr: false, postinc: true, predec: true, pc: false, imm: None };
/// Control addressing (LEA/PEA/JMP/JSR).
const CONTROL: Allow =
    Allow { data: false, addr: false, postinc: false, predec: false, pc: true, imm: None };

/// Any source of the given width; byte sources exclude An.
const fn any_src(size: Size) -> Allow {
    Allow {
        data: true,
        addr: !matches!(size, Size::Byte),
        postinc: true,
        predec: true,
        pc: true,
        imm: Some(size),
    }
}

/// Readable memory plus PC-relative forms, no registers or immediates
/// (BTST destinations).
const READ_MEM: Allow =
    Allow { data: false, addr: false, postinc: true, predec: true, pc: true, imm: None };

struct Dec<'a, B: Bus + ?Sized> {
    bus: &'a mut B,
    addr: u32,
    inst: Instruction,
}

impl<'a, B: Bus + ?Sized> Dec<'a, B> {
    fn new(bus: &'a mut B, addr: u32) -> Self {
        Self {
            bus,
            addr,
            inst: Instruction {
                address: addr,
                mnemonic: Mnemonic::Unknown,
                op1: Operand::None,
                op2: Operand::None,
                bytes: [0; 10],
                nbytes: 0,
            },
        }
    }

    /// Reads the next instruction word, capturing its bytes.
    fn word(&mut self) -> u16 {
        let word = self.bus.read_word(self.addr);
        let n = self.inst.nbytes as usize;
        if n + 2 <= self.inst.bytes.len() {
            self.inst.bytes[n] = (word >> 8) as u8;
            self.inst.bytes[n + 1] = word as u8;
            self.inst.nbytes += 2;
        }
        self.addr = self.addr.wrapping_add(2);
        word
    }

    fn long(&mut self) -> u32 {
        let high = self.word() as u32;
        let low = self.word() as u32;
        high << 16 | low
    }

    fn index_operand(&mut self) -> (IndexReg, i8) {
        let ext = self.word();
        let index = IndexReg {
            addr: ext & 0x8000 != 0,
            reg: (ext >> 12) as u8 & 7,
            long: ext & 0x0800 != 0,
        };
        (index, ext as u8 as i8)
    }

    /// Decodes an effective-address operand, consuming its extension words.
    /// `None` marks an encoding the instruction does not admit; the caller
    /// abandons the record as unknown.
    fn ea(&mut self, mode: u8, reg: u8, allow: Allow) -> Option<Operand> {
        match mode {
            0 if allow.data => Some(Operand::DataReg(reg)),
            1 if allow.addr => Some(Operand::AddrReg(reg)),
            2 => Some(Operand::AddrInd(reg)),
            3 if allow.postinc => Some(Operand::AddrIndPostInc(reg)),
            4 if allow.predec => Some(Operand::AddrIndPreDec(reg)),
            5 => {
                let disp = self.word() as i16;
                Some(Operand::AddrIndDisp { reg, disp })
            }
            6 => {
                let (index, disp) = self.index_operand();
                Some(Operand::AddrIndIndex { reg, index, disp })
            }
            7 => match reg {
                0 => Some(Operand::AbsShort(self.word())),
                1 => Some(Operand::AbsLong(self.long())),
                2 if allow.pc => Some(Operand::PcDisp(self.word() as i16)),
                3 if allow.pc => {
                    let (index, disp) = self.index_operand();
                    Some(Operand::PcIndex { index, disp })
                }
                4 => match allow.imm? {
                    Size::Byte => Some(Operand::ImmByte(self.word() as u8)),
                    Size::Word => Some(Operand::ImmWord(self.word())),
                    Size::Long => Some(Operand::ImmLong(self.long())),
                },
                _ => None,
            },
            _ => None,
        }
    }

    fn set(&mut self, mnemonic: Mnemonic, op1: Operand, op2: Operand) {
        self.inst.mnemonic = mnemonic;
        self.inst.op1 = op1;
        self.inst.op2 = op2;
    }

    fn unknown(&mut self) {
        self.inst.mnemonic = Mnemonic::Unknown;
        self.inst.op1 = Operand::None;
        self.inst.op2 = Operand::None;
    }

    fn imm_operand(&mut self, size: Size) -> Operand {
        match size {
            Size::Byte => Operand::ImmByte(self.word() as u8),
            Size::Word => Operand::ImmWord(self.word()),
            Size::Long => Operand::ImmLong(self.long()),
        }
    }

    // ------------------------------------------------------------------
    // Families
    // ------------------------------------------------------------------

    fn bit_movep_imm(&mut self, u: Unpacked) {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        match v2 {
            0 | 1 | 2 => {
                let size = [Size::Byte, Size::Word, Size::Long][v2 as usize];
                const ORI: [Mnemonic; 3] = [Mnemonic::OriB, Mnemonic::OriW, Mnemonic::OriL];
                const ANDI: [Mnemonic; 3] = [Mnemonic::AndiB, Mnemonic::AndiW, Mnemonic::AndiL];
                const SUBI: [Mnemonic; 3] = [Mnemonic::SubiB, Mnemonic::SubiW, Mnemonic::SubiL];
                const ADDI: [Mnemonic; 3] = [Mnemonic::AddiB, Mnemonic::AddiW, Mnemonic::AddiL];
                const EORI: [Mnemonic; 3] = [Mnemonic::EoriB, Mnemonic::EoriW, Mnemonic::EoriL];
                const CMPI: [Mnemonic; 3] = [Mnemonic::CmpiB, Mnemonic::CmpiW, Mnemonic::CmpiL];
                const BITOP: [Mnemonic; 3] = [Mnemonic::Btst, Mnemonic::Bchg, Mnemonic::Bclr];
                match v3 {
                    0 | 1 | 5 if v1 == 7 && v0 == 4 && !size.is_long() => {
                        // Immediate to CCR (byte) / SR (word).
                        let table = match v3 {
                            0 => ORI,
                            1 => ANDI,
                            _ => EORI,
                        };
                        let imm = self.imm_operand(size);
                        let target =
                            if size == Size::Byte { Operand::Ccr } else { Operand::Sr };
                        self.set(Mnemonic::sized(table, size), imm, target);
                    }
                    0 | 1 | 2 | 3 | 5 => {
                        let table = match v3 {
                            0 => ORI,
                            1 => ANDI,
                            2 => SUBI,
                            3 => ADDI,
                            _ => EORI,
                        };
                        let imm = self.imm_operand(size);
                        match self.ea(v1, v0, DATA_ALT) {
                            Some(ea) => self.set(Mnemonic::sized(table, size), imm, ea),
                            None => self.unknown(),
                        }
                    }
                    4 => self.bit_op_imm(BITOP[v2 as usize], v1, v0),
                    6 => {
                        let imm = self.imm_operand(size);
                        match self.ea(v1, v0, DATA_ALT) {
                            Some(ea) => self.set(Mnemonic::sized(CMPI, size), imm, ea),
                            None => self.unknown(),
                        }
                    }
                    _ => self.unknown(),
                }
            }
            3 => match v3 {
                4 => self.bit_op_imm(Mnemonic::Bset, v1, v0),
                _ => self.unknown(),
            },
            4 if v1 == 1 => self.movep(Mnemonic::MovepW, false, v3, v0),
            4 => self.bit_op_reg(Mnemonic::Btst, v3, v1, v0),
            5 if v1 == 1 => self.movep(Mnemonic::MovepL, false, v3, v0),
            5 => self.bit_op_reg(Mnemonic::Bchg, v3, v1, v0),
            6 if v1 == 1 => self.movep(Mnemonic::MovepW, true, v3, v0),
            6 => self.bit_op_reg(Mnemonic::Bclr, v3, v1, v0),
            7 if v1 == 1 => self.movep(Mnemonic::MovepL, true, v3, v0),
            7 => self.bit_op_reg(Mnemonic::Bset, v3, v1, v0),
            _ => self.unknown(),
        }
    }

    fn bit_op_imm(&mut self, mnemonic: Mnemonic, mode: u8, reg: u8) {
        let bit = Operand::ImmByte(self.word() as u8);
        let allow = if mnemonic == Mnemonic::Btst {
            Allow { data: true, ..READ_MEM }
        } else {
            DATA_ALT
        };
        match self.ea(mode, reg, allow) {
            Some(ea) => self.set(mnemonic, bit, ea),
            None => self.unknown(),
        }
    }

    fn bit_op_reg(&mut self, mnemonic: Mnemonic, dn: u8, mode: u8, reg: u8) {
        let allow = if mnemonic == Mnemonic::Btst {
            // BTST Dn additionally admits an immediate byte operand.
            Allow { data: true, imm: Some(Size::Byte), ..READ_MEM }
        } else {
            DATA_ALT
        };
        match self.ea(mode, reg, allow) {
            Some(ea) => self.set(mnemonic, Operand::DataReg(dn), ea),
            None => self.unknown(),
        }
    }

    fn movep(&mut self, mnemonic: Mnemonic, to_mem: bool, dreg: u8, areg: u8) {
        let disp = self.word() as i16;
        let mem = Operand::AddrIndDisp { reg: areg, disp };
        if to_mem {
            self.set(mnemonic, Operand::DataReg(dreg), mem);
        } else {
            self.set(mnemonic, mem, Operand::DataReg(dreg));
        }
    }

    fn mv(&mut self, size: Size, u: Unpacked) {
        const MOVE: [Mnemonic; 3] = [Mnemonic::MoveB, Mnemonic::MoveW, Mnemonic::MoveL];
        let (dreg, dmode, smode, sreg) = (u.v3, u.v2, u.v1, u.v0);
        let Some(src) = self.ea(smode, sreg, any_src(size)) else {
            return self.unknown();
        };
        let dst_allow = if size.is_long() || size == Size::Word { ALT_ANY } else { DATA_ALT };
        match self.ea(dmode, dreg, dst_allow) {
            Some(dst) => self.set(Mnemonic::sized(MOVE, size), src, dst),
            None => self.unknown(),
        }
    }

    fn misc(&mut self, u: Unpacked) {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        const NEGX: [Mnemonic; 3] = [Mnemonic::NegxB, Mnemonic::NegxW, Mnemonic::NegxL];
        const CLR: [Mnemonic; 3] = [Mnemonic::ClrB, Mnemonic::ClrW, Mnemonic::ClrL];
        const NEG: [Mnemonic; 3] = [Mnemonic::NegB, Mnemonic::NegW, Mnemonic::NegL];
        const NOT: [Mnemonic; 3] = [Mnemonic::NotB, Mnemonic::NotW, Mnemonic::NotL];
        const TST: [Mnemonic; 3] = [Mnemonic::TstB, Mnemonic::TstW, Mnemonic::TstL];
        match v2 {
            0 | 1 | 2 if v3 <= 3 => {
                let size = [Size::Byte, Size::Word, Size::Long][v2 as usize];
                match v3 {
                    0 => self.unary(Mnemonic::sized(NEGX, size), v1, v0),
                    1 => self.unary(Mnemonic::sized(CLR, size), v1, v0),
                    2 => self.unary(Mnemonic::sized(NEG, size), v1, v0),
                    _ => self.unary(Mnemonic::sized(NOT, size), v1, v0),
                }
            }
            0 => match v3 {
                4 => self.unary(Mnemonic::Nbcd, v1, v0),
                5 => self.unary(Mnemonic::sized(TST, Size::Byte), v1, v0),
                _ => self.unknown(),
            },
            1 => match v3 {
                4 if v1 == 0 => self.set(Mnemonic::Swap, Operand::DataReg(v0), Operand::None),
                4 => match self.ea(v1, v0, CONTROL) {
                    Some(ea) => self.set(Mnemonic::Pea, ea, Operand::None),
                    None => self.unknown(),
                },
                5 => self.tst(Mnemonic::TstW, v1, v0),
                7 => match v1 {
                    0 => self.set(Mnemonic::Trap, Operand::Vector(v0), Operand::None),
                    1 => self.set(Mnemonic::Trap, Operand::Vector(v0 | 8), Operand::None),
                    2 => {
                        let disp = Operand::Disp16(self.word() as i16);
                        self.set(Mnemonic::Link, Operand::AddrReg(v0), disp);
                    }
                    3 => self.set(Mnemonic::Unlk, Operand::AddrReg(v0), Operand::None),
                    4 => self.set(Mnemonic::MoveL, Operand::AddrReg(v0), Operand::Usp),
                    5 => self.set(Mnemonic::MoveL, Operand::Usp, Operand::AddrReg(v0)),
                    6 => match v0 {
                        0 => self.set(Mnemonic::Reset, Operand::None, Operand::None),
                        1 => self.set(Mnemonic::Nop, Operand::None, Operand::None),
                        2 => {
                            let imm = Operand::ImmWord(self.word());
                            self.set(Mnemonic::Stop, imm, Operand::None);
                        }
                        3 => self.set(Mnemonic::Rte, Operand::None, Operand::None),
                        5 => self.set(Mnemonic::Rts, Operand::None, Operand::None),
                        7 => self.set(Mnemonic::Rtr, Operand::None, Operand::None),
                        _ => self.unknown(),
                    },
                    _ => self.unknown(),
                },
                _ => self.unknown(),
            },
            2 => match v3 {
                4 if v1 == 0 => self.set(Mnemonic::ExtW, Operand::DataReg(v0), Operand::None),
                4 => self.movem(Mnemonic::MovemW, true, v1, v0),
                5 => self.tst(Mnemonic::TstL, v1, v0),
                6 => self.movem(Mnemonic::MovemW, false, v1, v0),
                7 => match self.ea(v1, v0, CONTROL) {
                    Some(ea) => self.set(Mnemonic::Jsr, ea, Operand::None),
                    None => self.unknown(),
                },
                _ => self.unknown(),
            },
            3 => match v3 {
                0 => match self.ea(v1, v0, DATA_ALT) {
                    Some(ea) => self.set(Mnemonic::MoveW, Operand::Sr, ea),
                    None => self.unknown(),
                },
                2 => match self.ea(v1, v0, any_src(Size::Word)) {
                    Some(ea) => self.set(Mnemonic::MoveW, ea, Operand::Ccr),
                    None => self.unknown(),
                },
                3 => {
                    let allow = Allow { addr: false, ..any_src(Size::Word) };
                    match self.ea(v1, v0, allow) {
                        Some(ea) => self.set(Mnemonic::MoveW, ea, Operand::Sr),
                        None => self.unknown(),
                    }
                }
                4 if v1 == 0 => self.set(Mnemonic::ExtL, Operand::DataReg(v0), Operand::None),
                4 => self.movem(Mnemonic::MovemL, true, v1, v0),
                5 if v1 == 7 && v0 == 4 => {
                    self.set(Mnemonic::Illegal, Operand::None, Operand::None);
                }
                6 => self.movem(Mnemonic::MovemL, false, v1, v0),
                7 => match self.ea(v1, v0, CONTROL) {
                    Some(ea) => self.set(Mnemonic::Jmp, ea, Operand::None),
                    None => self.unknown(),
                },
                _ => self.unknown(),
            },
            6 => {
                let allow = Allow { addr: false, ..any_src(Size::Word) };
                match self.ea(v1, v0, allow) {
                    Some(ea) => self.set(Mnemonic::Chk, ea, Operand::DataReg(v3)),
                    None => self.unknown(),
                }
            }
            7 => match self.ea(v1, v0, CONTROL) {
                Some(ea) => self.set(Mnemonic::Lea, ea, Operand::AddrReg(v3)),
                None => self.unknown(),
            },
            _ => self.unknown(),
        }
    }

    fn unary(&mut self, mnemonic: Mnemonic, mode: u8, reg: u8) {
        match self.ea(mode, reg, DATA_ALT) {
            Some(ea) => self.set(mnemonic, ea, Operand::None),
            None => self.unknown(),
        }
    }

    fn tst(&mut self, mnemonic: Mnemonic, mode: u8, reg: u8) {
        match self.ea(mode, reg, ALT_ANY) {
            Some(ea) => self.set(mnemonic, ea, Operand::None),
            None => self.unknown(),
        }
    }

    fn movem(&mut self, mnemonic: Mnemonic, to_mem: bool, mode: u8, reg: u8) {
        let mut mask = self.word();
        if to_mem {
            if mode == 4 {
                mask = mask.reverse_bits();
            }
            let allow = Allow { postinc: false, ..MEM_ALT };
            match self.ea(mode, reg, allow) {
                Some(ea) => self.set(mnemonic, Operand::RegList(mask), ea),
                None => self.unknown(),
            }
        } else {
            let allow = Allow { predec: false, pc: true, ..MEM_ALT };
            match self.ea(mode, reg, allow) {
                Some(ea) => self.set(mnemonic, ea, Operand::RegList(mask)),
                None => self.unknown(),
            }
        }
    }

    fn addq_subq(&mut self, u: Unpacked) {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        const ADDQ: [Mnemonic; 3] = [Mnemonic::AddqB, Mnemonic::AddqW, Mnemonic::AddqL];
        const SUBQ: [Mnemonic; 3] = [Mnemonic::SubqB, Mnemonic::SubqW, Mnemonic::SubqL];
        const SCC: [Mnemonic; 16] = [
            Mnemonic::St, Mnemonic::Sf, Mnemonic::Shi, Mnemonic::Sls,
            Mnemonic::Scc, Mnemonic::Scs, Mnemonic::Sne, Mnemonic::Seq,
            Mnemonic::Svc, Mnemonic::Svs, Mnemonic::Spl, Mnemonic::Smi,
            Mnemonic::Sge, Mnemonic::Slt, Mnemonic::Sgt, Mnemonic::Sle,
        ];
        const DBCC: [Mnemonic; 16] = [
            Mnemonic::DbT, Mnemonic::DbF, Mnemonic::DbHi, Mnemonic::DbLs,
            Mnemonic::DbCc, Mnemonic::DbCs, Mnemonic::DbNe, Mnemonic::DbEq,
            Mnemonic::DbVc, Mnemonic::DbVs, Mnemonic::DbPl, Mnemonic::DbMi,
            Mnemonic::DbGe, Mnemonic::DbLt, Mnemonic::DbGt, Mnemonic::DbLe,
        ];
        match v2 {
            0 | 1 | 2 | 4 | 5 | 6 => {
                let size = [Size::Byte, Size::Word, Size::Long][(v2 & 3) as usize];
                let table = if v2 < 4 { ADDQ } else { SUBQ };
                let data = if v3 == 0 { 8 } else { v3 };
                let allow = if size == Size::Byte { DATA_ALT } else { ALT_ANY };
                match self.ea(v1, v0, allow) {
                    Some(ea) => {
                        self.set(Mnemonic::sized(table, size), Operand::ImmByte(data), ea);
                    }
                    None => self.unknown(),
                }
            }
            3 | 7 => {
                let cond = (v3 << 1 | (v2 >> 2)) as usize;
                if v1 == 1 {
                    let base = self.addr;
                    let disp = self.word() as i16;
                    let label = Operand::Label { disp, target: base.wrapping_add(disp as u32) };
                    self.set(DBCC[cond], Operand::DataReg(v0), label);
                } else {
                    match self.ea(v1, v0, DATA_ALT) {
                        Some(ea) => self.set(SCC[cond], ea, Operand::None),
                        None => self.unknown(),
                    }
                }
            }
            _ => self.unknown(),
        }
    }

    fn branch(&mut self, opcode: u16) {
        const BCC: [Mnemonic; 16] = [
            Mnemonic::Bra, Mnemonic::Bsr, Mnemonic::Bhi, Mnemonic::Bls,
            Mnemonic::Bcc, Mnemonic::Bcs, Mnemonic::Bne, Mnemonic::Beq,
            Mnemonic::Bvc, Mnemonic::Bvs, Mnemonic::Bpl, Mnemonic::Bmi,
            Mnemonic::Bge, Mnemonic::Blt, Mnemonic::Bgt, Mnemonic::Ble,
        ];
        let cond = (opcode >> 8) as usize & 0xF;
        let disp8 = opcode as u8;
        let label = if disp8 == 0 {
            let base = self.addr;
            let disp = self.word() as i16;
            Operand::Label { disp, target: base.wrapping_add(disp as u32) }
        } else {
            let disp = disp8 as i8 as i16;
            Operand::Label { disp, target: self.addr.wrapping_add(disp as u32) }
        };
        self.set(BCC[cond], label, Operand::None);
    }

    fn moveq(&mut self, opcode: u16, u: Unpacked) {
        if opcode & 0x0100 != 0 {
            return self.unknown();
        }
        let value = opcode as u8 as i8 as u32;
        self.set(Mnemonic::Moveq, Operand::ImmLong(value), Operand::DataReg(u.v3));
    }

    /// OR/AND/ADD/SUB share their layout; `mul_div`, `bcd` and the v1=0/1
    /// rows of the upper half are the per-family specials.
    #[allow(clippy::too_many_arguments)]
    fn dyadic(
        &mut self,
        u: Unpacked,
        table: [Mnemonic; 3],
        with_adda: Option<[Mnemonic; 3]>,
        xtable: Option<[Mnemonic; 3]>,
        bcd: Option<Mnemonic>,
        mul_div: Option<(Mnemonic, Mnemonic)>,
        exg: bool,
    ) {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        match v2 {
            0 | 1 | 2 => {
                let size = [Size::Byte, Size::Word, Size::Long][v2 as usize];
                // OR and AND reject address-register sources outright; ADD
                // and SUB admit them at word and long.
                let addr_ok = with_adda.is_some() && !matches!(size, Size::Byte);
                let allow = Allow { addr: addr_ok, ..any_src(size) };
                match self.ea(v1, v0, allow) {
                    Some(ea) => self.set(Mnemonic::sized(table, size), ea, Operand::DataReg(v3)),
                    None => self.unknown(),
                }
            }
            3 => match with_adda {
                Some(t) => match self.ea(v1, v0, any_src(Size::Word)) {
                    Some(ea) => self.set(t[1], ea, Operand::AddrReg(v3)),
                    None => self.unknown(),
                },
                None => match mul_div {
                    Some((_, unsigned)) => self.mul_div_op(unsigned, v1, v0, v3),
                    None => self.unknown(),
                },
            },
            4 | 5 | 6 => {
                let size = [Size::Byte, Size::Word, Size::Long][(v2 & 3) as usize];
                match v1 {
                    0 if v2 == 4 && bcd.is_some() => {
                        let m = bcd.unwrap_or(Mnemonic::Unknown);
                        self.set(m, Operand::DataReg(v0), Operand::DataReg(v3));
                    }
                    1 if v2 == 4 && bcd.is_some() => {
                        let m = bcd.unwrap_or(Mnemonic::Unknown);
                        self.set(m, Operand::AddrIndPreDec(v0), Operand::AddrIndPreDec(v3));
                    }
                    0 if exg && v2 == 5 => {
                        self.set(Mnemonic::Exg, Operand::DataReg(v3), Operand::DataReg(v0));
                    }
                    1 if exg && v2 == 5 => {
                        self.set(Mnemonic::Exg, Operand::AddrReg(v3), Operand::AddrReg(v0));
                    }
                    1 if exg && v2 == 6 => {
                        self.set(Mnemonic::Exg, Operand::DataReg(v3), Operand::AddrReg(v0));
                    }
                    0 if xtable.is_some() => {
                        let m = Mnemonic::sized(xtable.unwrap_or([Mnemonic::Unknown; 3]), size);
                        self.set(m, Operand::DataReg(v0), Operand::DataReg(v3));
                    }
                    1 if xtable.is_some() => {
                        let m = Mnemonic::sized(xtable.unwrap_or([Mnemonic::Unknown; 3]), size);
                        self.set(m, Operand::AddrIndPreDec(v0), Operand::AddrIndPreDec(v3));
                    }
                    _ => match self.ea(v1, v0, MEM_ALT) {
                        Some(ea) => {
                            self.set(Mnemonic::sized(table, size), Operand::DataReg(v3), ea);
                        }
                        None => self.unknown(),
                    },
                }
            }
            7 => match with_adda {
                Some(t) => match self.ea(v1, v0, any_src(Size::Long)) {
                    Some(ea) => self.set(t[2], ea, Operand::AddrReg(v3)),
                    None => self.unknown(),
                },
                None => match mul_div {
                    Some((signed, _)) => self.mul_div_op(signed, v1, v0, v3),
                    None => self.unknown(),
                },
            },
            _ => self.unknown(),
        }
    }

    fn mul_div_op(&mut self, mnemonic: Mnemonic, mode: u8, reg: u8, dn: u8) {
        let allow = Allow { addr: false, ..any_src(Size::Word) };
        match self.ea(mode, reg, allow) {
            Some(ea) => self.set(mnemonic, ea, Operand::DataReg(dn)),
            None => self.unknown(),
        }
    }

    fn cmp_eor(&mut self, u: Unpacked) {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        const CMP: [Mnemonic; 3] = [Mnemonic::CmpB, Mnemonic::CmpW, Mnemonic::CmpL];
        const CMPM: [Mnemonic; 3] = [Mnemonic::CmpmB, Mnemonic::CmpmW, Mnemonic::CmpmL];
        const EOR: [Mnemonic; 3] = [Mnemonic::EorB, Mnemonic::EorW, Mnemonic::EorL];
        match v2 {
            0 | 1 | 2 => {
                let size = [Size::Byte, Size::Word, Size::Long][v2 as usize];
                match self.ea(v1, v0, any_src(size)) {
                    Some(ea) => self.set(Mnemonic::sized(CMP, size), ea, Operand::DataReg(v3)),
                    None => self.unknown(),
                }
            }
            3 => match self.ea(v1, v0, any_src(Size::Word)) {
                Some(ea) => self.set(Mnemonic::CmpW, ea, Operand::AddrReg(v3)),
                None => self.unknown(),
            },
            4 | 5 | 6 => {
                let size = [Size::Byte, Size::Word, Size::Long][(v2 & 3) as usize];
                if v1 == 1 {
                    self.set(
                        Mnemonic::sized(CMPM, size),
                        Operand::AddrIndPostInc(v0),
                        Operand::AddrIndPostInc(v3),
                    );
                } else {
                    match self.ea(v1, v0, DATA_ALT) {
                        Some(ea) => {
                            self.set(Mnemonic::sized(EOR, size), Operand::DataReg(v3), ea);
                        }
                        None => self.unknown(),
                    }
                }
            }
            7 => match self.ea(v1, v0, any_src(Size::Long)) {
                Some(ea) => self.set(Mnemonic::CmpL, ea, Operand::AddrReg(v3)),
                None => self.unknown(),
            },
            _ => self.unknown(),
        }
    }

    fn shift_rot(&mut self, u: Unpacked) {
        let Unpacked { v3, v2, v1, v0, .. } = u;
        // Indexed right then left: AS, LS, ROX, RO at each size.
        const TABLES: [[Mnemonic; 3]; 8] = [
            [Mnemonic::AsrB, Mnemonic::AsrW, Mnemonic::AsrL],
            [Mnemonic::LsrB, Mnemonic::LsrW, Mnemonic::LsrL],
            [Mnemonic::RoxrB, Mnemonic::RoxrW, Mnemonic::RoxrL],
            [Mnemonic::RorB, Mnemonic::RorW, Mnemonic::RorL],
            [Mnemonic::AslB, Mnemonic::AslW, Mnemonic::AslL],
            [Mnemonic::LslB, Mnemonic::LslW, Mnemonic::LslL],
            [Mnemonic::RoxlB, Mnemonic::RoxlW, Mnemonic::RoxlL],
            [Mnemonic::RolB, Mnemonic::RolW, Mnemonic::RolL],
        ];
        match v2 {
            0 | 1 | 2 | 4 | 5 | 6 => {
                let size = [Size::Byte, Size::Word, Size::Long][(v2 & 3) as usize];
                let kind = ((v1 & 3) + if v2 >= 4 { 4 } else { 0 }) as usize;
                let mnemonic = Mnemonic::sized(TABLES[kind], size);
                let count = if v1 >= 4 {
                    Operand::DataReg(v3)
                } else {
                    Operand::Count(if v3 == 0 { 8 } else { v3 })
                };
                self.set(mnemonic, count, Operand::DataReg(v0));
            }
            3 | 7 => {
                if v3 > 3 {
                    return self.unknown();
                }
                let kind = (v3 + if v2 == 7 { 4 } else { 0 }) as usize;
                let mnemonic = Mnemonic::sized(TABLES[kind], Size::Word);
                match self.ea(v1, v0, MEM_ALT) {
                    Some(ea) => self.set(mnemonic, ea, Operand::None),
                    None => self.unknown(),
                }
            }
            _ => self.unknown(),
        }
    }
}

/// Disassembles the instruction at `addr`. Architectural state is never
/// touched: only the instruction words are read through the bus.
pub fn decode<B: Bus + ?Sized>(bus: &mut B, addr: u32) -> Instruction {
    let mut dec = Dec::new(bus, addr);
    let opcode = dec.word();
    let u = unpack(opcode);
    const ADD: [Mnemonic; 3] = [Mnemonic::AddB, Mnemonic::AddW, Mnemonic::AddL];
    const ADDX: [Mnemonic; 3] = [Mnemonic::AddxB, Mnemonic::AddxW, Mnemonic::AddxL];
    const SUB: [Mnemonic; 3] = [Mnemonic::SubB, Mnemonic::SubW, Mnemonic::SubL];
    const SUBX: [Mnemonic; 3] = [Mnemonic::SubxB, Mnemonic::SubxW, Mnemonic::SubxL];
    const OR: [Mnemonic; 3] = [Mnemonic::OrB, Mnemonic::OrW, Mnemonic::OrL];
    const AND: [Mnemonic; 3] = [Mnemonic::AndB, Mnemonic::AndW, Mnemonic::AndL];
    match u.op {
        0x0 => dec.bit_movep_imm(u),
        0x1 => dec.mv(Size::Byte, u),
        0x2 => dec.mv(Size::Long, u),
        0x3 => dec.mv(Size::Word, u),
        0x4 => dec.misc(u),
        0x5 => dec.addq_subq(u),
        0x6 => dec.branch(opcode),
        0x7 => dec.moveq(opcode, u),
        0x8 => dec.dyadic(
            u,
            OR,
            None,
            None,
            Some(Mnemonic::Sbcd),
            Some((Mnemonic::Divs, Mnemonic::Divu)),
            false,
        ),
        0x9 => dec.dyadic(u, SUB, Some(SUB), Some(SUBX), None, None, false),
        0xB => dec.cmp_eor(u),
        0xC => dec.dyadic(
            u,
            AND,
            None,
            None,
            Some(Mnemonic::Abcd),
            Some((Mnemonic::Muls, Mnemonic::Mulu)),
            true,
        ),
        0xD => dec.dyadic(u, ADD, Some(ADD), Some(ADDX), None, None, false),
        0xE => dec.shift_rot(u),
        _ => dec.unknown(),
    }
    dec.inst
}
