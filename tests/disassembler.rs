// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Disassembler tests: structured records, rendering, and agreement with
//! the executor on how many bytes each instruction occupies.

use md68k::{decode, Bus, Cpu, Mnemonic, Operand};

fn image(words: &[u16]) -> Vec<u8> {
    let mut ram = vec![0u8; 0x1_0000];
    for (i, w) in words.iter().enumerate() {
        ram[0x500 + i * 2] = (w >> 8) as u8;
        ram[0x500 + i * 2 + 1] = *w as u8;
    }
    ram
}

#[test]
fn move_immediate_word() {
    let mut ram = image(&[0x303C, 0x1234]);
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::MoveW);
    assert_eq!(inst.op1, Operand::ImmWord(0x1234));
    assert_eq!(inst.op2, Operand::DataReg(0));
    assert_eq!(inst.next_addr(), 0x504);
    assert_eq!(inst.bytes(), [0x30, 0x3C, 0x12, 0x34]);
    assert_eq!(inst.to_string(), "MOVE.W #0x1234, D0");
}

#[test]
fn movea_renders_address_register() {
    let mut ram = image(&[0x2E41]); // MOVE.L D1, A7
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::MoveL);
    assert_eq!(inst.op2, Operand::AddrReg(7));
}

#[test]
fn addressing_mode_operands() {
    // ADD.W (-4, A2), D3
    let mut ram = image(&[0xD66A, 0xFFFC]);
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::AddW);
    assert_eq!(inst.op1, Operand::AddrIndDisp { reg: 2, disp: -4 });
    assert_eq!(inst.op2, Operand::DataReg(3));
    assert_eq!(inst.to_string(), "ADD.W (-4, A2), D3");

    // MOVE.B (A0)+, -(A1)
    let mut ram = image(&[0x1318]);
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.op1, Operand::AddrIndPostInc(0));
    assert_eq!(inst.op2, Operand::AddrIndPreDec(1));

    // LEA (0x1234).W, A5
    let mut ram = image(&[0x4BF8, 0x1234]);
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::Lea);
    assert_eq!(inst.op1, Operand::AbsShort(0x1234));
    assert_eq!(inst.op2, Operand::AddrReg(5));
}

#[test]
fn indexed_mode_decodes_the_extension_word() {
    // MOVE.B (5, A1, D2.W), D0 — extension word 0x2005.
    let mut ram = image(&[0x1031, 0x2005]);
    let inst = decode(&mut ram[..], 0x500);
    match inst.op1 {
        Operand::AddrIndIndex { reg: 1, index, disp: 5 } => {
            assert!(!index.addr && index.reg == 2 && !index.long);
        }
        other => panic!("wrong operand {other:?}"),
    }
    assert_eq!(inst.to_string(), "MOVE.B (5, A1, D2.W), D0");
}

#[test]
fn branch_labels() {
    let mut ram = image(&[0x60FE]); // BRA.S *-0
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::Bra);
    assert_eq!(inst.op1, Operand::Label { disp: -2, target: 0x500 });

    let mut ram = image(&[0x6600, 0x0010]); // BNE.W +0x10
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::Bne);
    assert_eq!(inst.op1, Operand::Label { disp: 0x10, target: 0x512 });
    assert_eq!(inst.next_addr(), 0x504);
}

#[test]
fn dbcc_carries_register_and_label() {
    let mut ram = image(&[0x51C8, 0xFFFC]); // DBF D0, *-2
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::DbF);
    assert_eq!(inst.op1, Operand::DataReg(0));
    assert_eq!(inst.op2, Operand::Label { disp: -4, target: 0x4FE });
}

#[test]
fn movem_register_lists() {
    // MOVEM.W D0-D2/A6, -(A7): predecrement mask is bit-reversed back into
    // source order.
    let mut ram = image(&[0x48A7, 0xE002]);
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::MovemW);
    assert_eq!(inst.op1, Operand::RegList(0x4007));
    assert_eq!(inst.op2, Operand::AddrIndPreDec(7));
    assert_eq!(inst.to_string(), "MOVEM.W D0-D2/A6, -(A7)");

    // MOVEM.L (A0)+, D0/A0-A1
    let mut ram = image(&[0x4CD8, 0x0301]);
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::MovemL);
    assert_eq!(inst.op1, Operand::AddrIndPostInc(0));
    assert_eq!(inst.op2, Operand::RegList(0x0301));
    assert_eq!(inst.to_string(), "MOVEM.L (A0)+, D0/A0-A1");
}

#[test]
fn system_operands() {
    let mut ram = image(&[0x46FC, 0x2700]); // MOVE #0x2700, SR
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::MoveW);
    assert_eq!(inst.op1, Operand::ImmWord(0x2700));
    assert_eq!(inst.op2, Operand::Sr);

    let mut ram = image(&[0x44C0]); // MOVE D0, CCR
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.op2, Operand::Ccr);

    let mut ram = image(&[0x4E60]); // MOVE A0, USP
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::MoveL);
    assert_eq!((inst.op1, inst.op2), (Operand::AddrReg(0), Operand::Usp));

    let mut ram = image(&[0x4E45]); // TRAP #5
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::Trap);
    assert_eq!(inst.op1, Operand::Vector(5));

    let mut ram = image(&[0x4AFC]);
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::Illegal);
}

#[test]
fn shift_forms() {
    let mut ram = image(&[0xE240]); // ASR.W #1, D0
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::AsrW);
    assert_eq!(inst.op1, Operand::Count(1));
    assert_eq!(inst.op2, Operand::DataReg(0));

    let mut ram = image(&[0xE078]); // ROR.W D0, D0? count register form
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::RorW);
    assert_eq!(inst.op1, Operand::DataReg(0));

    let mut ram = image(&[0xE1D0]); // ASL.W (A0), memory form
    let inst = decode(&mut ram[..], 0x500);
    assert_eq!(inst.mnemonic, Mnemonic::AslW);
    assert_eq!(inst.op1, Operand::AddrInd(0));
    assert_eq!(inst.op2, Operand::None);
}

#[test]
fn unknown_opcodes_stay_two_bytes() {
    for opcode in [0xA000u16, 0xF123, 0x4AC0 /* TAS */, 0x4E76 /* TRAPV */] {
        let mut ram = image(&[opcode]);
        let inst = decode(&mut ram[..], 0x500);
        assert_eq!(inst.mnemonic, Mnemonic::Unknown, "{opcode:#06X}");
        assert_eq!(inst.next_addr(), 0x502, "{opcode:#06X}");
    }
}

/// The decoder must consume exactly the words the executor consumes. Runs
/// straight-line instructions through both and compares the byte counts.
#[test]
fn decoder_matches_executor_lengths() {
    let programs: &[&[u16]] = &[
        &[0x7001],                 // MOVEQ
        &[0x303C, 0x1234],         // MOVE.W #, D0
        &[0x23C1, 0x0001, 0x2345], // MOVE.L D1, (xxx).L
        &[0x0680, 0x0000, 0x0001], // ADDI.L
        &[0x0240, 0x00FF],         // ANDI.W #, D0
        &[0x023C, 0x001F],         // ANDI #, CCR
        &[0x0801, 0x0007],         // BTST #7, D1
        &[0x08D0, 0x0003],         // BSET #3, (A0)
        &[0x0141],                 // BCHG D0, D1
        &[0x4241],                 // CLR.W D1
        &[0x4268, 0x0004],         // CLR.W (4, A0)
        &[0x4840],                 // SWAP D0
        &[0x4E71],                 // NOP
        &[0x48A7, 0xC000],         // MOVEM.W D0-D1, -(A7)
        &[0x4CDF, 0x0003],         // MOVEM.L (A7)+, D0-D1
        &[0x41FA, 0x0010],         // LEA (16, PC), A0
        &[0x4850],                 // PEA (A0)
        &[0x0189, 0x0004],         // MOVEP.W D0, (4, A1)
        &[0xD278, 0x2000],         // ADD.W (0x2000).W, D1
        &[0x9012],                 // SUB.B (A2), D0
        &[0xB43C, 0x0042],         // CMP.B #0x42, D2
        &[0xB501],                 // CMPM.B (A1)+, (A2)+
        &[0x5248],                 // ADDQ.W #1, A0
        &[0x57C0],                 // SEQ D0
        &[0xE248],                 // LSR.W #1, D0
        &[0xE1D1],                 // ASL.W (A1)
        &[0xC141],                 // EXG D0, D1
        &[0x80C1],                 // DIVU D1, D0
        &[0xC1C2],                 // MULS D2, D0
        &[0x4181],                 // CHK D1, D0
        &[0x4E56, 0x0000],         // LINK A6, #0
        &[0x4E5E],                 // UNLK A6
    ];

    for program in programs {
        let mut bus = vec![0u8; 0x1_0000];
        bus[0x003] = 0x80; // SSP
        bus[0x006] = 0x10;
        bus[0x007] = 0x00; // PC = 0x1000
        for (i, w) in program.iter().enumerate() {
            bus[0x1000 + i * 2] = (w >> 8) as u8;
            bus[0x1000 + i * 2 + 1] = *w as u8;
        }

        let inst = decode(&mut bus[..], 0x1000);

        let mut cpu = Cpu::new();
        cpu.init_state(&mut bus[..]);
        cpu.regs.a.iter_mut().for_each(|a| *a = 0x8000);
        cpu.regs.d.iter_mut().for_each(|d| *d = 0x11);
        cpu.run(&mut bus[..]);

        assert_eq!(
            inst.next_addr(),
            cpu.regs.pc,
            "length mismatch for {:04X?} ({})",
            program,
            inst
        );
    }
}

#[test]
fn decode_does_not_touch_state() {
    let mut ram = image(&[0x303C, 0x1234]);
    let before = ram.clone();
    decode(&mut ram[..], 0x500);
    assert_eq!(ram, before);
}

struct CountingBus {
    ram: Vec<u8>,
    data_reads: u32,
}

impl Bus for CountingBus {
    fn read_word(&mut self, addr: u32) -> u16 {
        (self.read_byte(addr) as u16) << 8 | self.read_byte(addr + 1) as u16
    }

    fn read_byte(&mut self, addr: u32) -> u8 {
        if addr >= 0x8000 {
            self.data_reads += 1;
        }
        self.ram[addr as usize & 0xFFFF]
    }

    fn write_word(&mut self, _addr: u32, _value: u16) {}
    fn write_byte(&mut self, _addr: u32, _value: u8) {}
    fn ack_interrupt(&mut self, _priority: u8) {}
    fn reset_signal(&mut self) {}
}

#[test]
fn decode_reads_only_the_instruction_stream() {
    // MOVE.W (0x9000).W, D0 — the disassembler must not read 0x9000.
    let mut bus = CountingBus { ram: image(&[0x3038, 0x9000]), data_reads: 0 };
    let inst = decode(&mut bus, 0x500);
    assert_eq!(inst.op1, Operand::AbsShort(0x9000));
    assert_eq!(bus.data_reads, 0);
}
