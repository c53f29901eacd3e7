// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The memory and device bus the core runs against.

/// Access to the console's memory map and to the two device signals the CPU
/// core raises.
///
/// The bus is word-granular and big-endian; long accesses are composed from
/// two word accesses, high word first. Accesses are infallible — the Mega
/// Drive glue decodes every address, so bus errors are not modelled. Word
/// accesses are expected at even addresses but the core does not enforce it.
pub trait Bus {
    /// Big-endian 16-bit fetch.
    fn read_word(&mut self, addr: u32) -> u16;

    /// 8-bit fetch.
    fn read_byte(&mut self, addr: u32) -> u8;

    /// Big-endian 16-bit store.
    fn write_word(&mut self, addr: u32, value: u16);

    /// 8-bit store.
    fn write_byte(&mut self, addr: u32, value: u8);

    /// Big-endian 32-bit fetch: word at `addr`, then word at `addr + 2`.
    fn read_long(&mut self, addr: u32) -> u32 {
        (self.read_word(addr) as u32) << 16 | self.read_word(addr.wrapping_add(2)) as u32
    }

    /// Big-endian 32-bit store: high word at `addr`, low word at `addr + 2`.
    fn write_long(&mut self, addr: u32, value: u32) {
        self.write_word(addr, (value >> 16) as u16);
        self.write_word(addr.wrapping_add(2), value as u16);
    }

    /// Interrupt acknowledge, called after an auto-vectored IRQ at
    /// `priority` has been serviced so the VDP can drop the line.
    fn ack_interrupt(&mut self, priority: u8);

    /// Raised by the RESET instruction to reset external devices. The CPU
    /// itself is not affected.
    fn reset_signal(&mut self);
}

/// Big-endian byte buffer. Out-of-range reads return zero and out-of-range
/// writes are dropped, which is convenient for tests and tools.
impl Bus for [u8] {
    fn read_word(&mut self, addr: u32) -> u16 {
        (self.read_byte(addr) as u16) << 8 | self.read_byte(addr.wrapping_add(1)) as u16
    }

    fn read_byte(&mut self, addr: u32) -> u8 {
        self.get(addr as usize).copied().unwrap_or(0)
    }

    fn write_word(&mut self, addr: u32, value: u16) {
        self.write_byte(addr, (value >> 8) as u8);
        self.write_byte(addr.wrapping_add(1), value as u8);
    }

    fn write_byte(&mut self, addr: u32, value: u8) {
        if let Some(b) = self.get_mut(addr as usize) {
            *b = value;
        }
    }

    fn ack_interrupt(&mut self, _priority: u8) {}

    fn reset_signal(&mut self) {}
}
