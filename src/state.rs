// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Save-state persistence.
//!
//! The record is a little-endian dump of the register file followed by the
//! pending-event mask and the STOP latch: D0..D7, A0..A7, the inactive
//! stack pointer, PC (all `u32`), SR (`u16`), `ints` (`u32`), `stop` (one
//! byte). Memory is not part of the record; it belongs to the bus owner.

use crate::{Cpu, Reporter};

use std::io::{Read, Write};

use thiserror::Error;

/// Errors surfaced by [`Cpu::save_state`] and [`Cpu::load_state`].
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// The restored pending-event mask had bits outside the low byte.
    #[error("state record carries an invalid pending-interrupt mask {0:#X}")]
    InvalidInts(u32),
}

impl<R: Reporter> Cpu<R> {
    /// Writes the register file, the pending-event mask and the STOP latch.
    pub fn save_state<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), StateError> {
        let mut record = Vec::with_capacity(4 * 18 + 2 + 4 + 1);
        for d in self.regs.d {
            record.extend_from_slice(&d.to_le_bytes());
        }
        for a in self.regs.a {
            record.extend_from_slice(&a.to_le_bytes());
        }
        record.extend_from_slice(&self.regs.alt_sp.to_le_bytes());
        record.extend_from_slice(&self.regs.pc.to_le_bytes());
        record.extend_from_slice(&self.regs.sr.to_word().to_le_bytes());
        record.extend_from_slice(&(self.ints as u32).to_le_bytes());
        record.push(self.stop as u8);
        writer.write_all(&record)?;
        Ok(())
    }

    /// Restores a record written by [`Cpu::save_state`].
    pub fn load_state<Rd: Read + ?Sized>(&mut self, reader: &mut Rd) -> Result<(), StateError> {
        fn take_u32(record: &[u8], at: &mut usize) -> u32 {
            let v = u32::from_le_bytes([record[*at], record[*at + 1], record[*at + 2], record[*at + 3]]);
            *at += 4;
            v
        }

        let mut record = [0u8; 4 * 18 + 2 + 4 + 1];
        reader.read_exact(&mut record)?;

        let mut at = 0usize;
        let mut d = [0u32; 8];
        let mut a = [0u32; 8];
        for r in &mut d {
            *r = take_u32(&record, &mut at);
        }
        for r in &mut a {
            *r = take_u32(&record, &mut at);
        }
        let alt_sp = take_u32(&record, &mut at);
        let pc = take_u32(&record, &mut at);
        let sr = u16::from_le_bytes([record[at], record[at + 1]]);
        at += 2;
        let ints = take_u32(&record, &mut at);
        if ints > 0xFF {
            return Err(StateError::InvalidInts(ints));
        }
        let stop = record[at];

        self.regs.d = d;
        self.regs.a = a;
        self.regs.alt_sp = alt_sp;
        self.regs.pc = pc;
        self.regs.sr.set_word(sr);
        self.ints = ints as u8;
        self.stop = stop != 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Cpu;

    #[test]
    fn save_load_round_trip() {
        let mut cpu = Cpu::new();
        cpu.regs.d = [1, 2, 3, 4, 5, 6, 7, 8];
        cpu.regs.a = [9, 10, 11, 12, 13, 14, 15, 0x00FF_0000];
        cpu.regs.alt_sp = 0x00E0_0000;
        cpu.regs.pc = 0x0000_0400;
        cpu.regs.sr.set_word(0x2715);
        cpu.set_auto_vector_int(6);
        cpu.set_reset();

        let mut record = Vec::new();
        cpu.save_state(&mut record).unwrap();

        let mut restored = Cpu::new();
        restored.load_state(&mut record.as_slice()).unwrap();
        assert_eq!(restored.regs, cpu.regs);
        assert_eq!(restored.decode_next_step(&mut [0u8; 8][..]), cpu.decode_next_step(&mut [0u8; 8][..]));
    }

    #[test]
    fn truncated_record_is_an_error() {
        let mut cpu = Cpu::new();
        assert!(cpu.load_state(&mut [0u8; 10].as_slice()).is_err());
    }
}
