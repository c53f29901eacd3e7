// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use md68k::StatusRegister;

#[test]
fn word_conversions_mask_unimplemented_bits() {
    assert_eq!(StatusRegister::default().to_word(), 0);
    assert_eq!(StatusRegister::from(0xFFFF).to_word(), 0xA71F);

    let sr = StatusRegister::from(0x2715);
    assert!(sr.s && !sr.t);
    assert_eq!(sr.interrupt_mask, 7);
    assert!(sr.x && sr.z && sr.c && !sr.n && !sr.v);
    assert_eq!(sr.to_word(), 0x2715);
}

#[test]
fn ccr_accessors_leave_the_system_byte() {
    let mut sr = StatusRegister::from(0x2700);
    sr.set_ccr(0x1F);
    assert_eq!(sr.to_word(), 0x271F);
    assert_eq!(sr.ccr(), 0x1F);
    sr.set_ccr(0);
    assert_eq!(sr.to_word(), 0x2700);
}

#[test]
fn conditions() {
    for bits in 0..0x20u8 {
        let mut sr = StatusRegister::default();
        sr.set_ccr(bits);
        let (n, z, v, c) = (sr.n, sr.z, sr.v, sr.c);

        assert!(sr.condition(0), "T");
        assert!(!sr.condition(1), "F");
        assert_eq!(sr.condition(2), !c && !z, "HI with ccr {bits:#04X}");
        assert_eq!(sr.condition(3), c || z, "LS");
        assert_eq!(sr.condition(4), !c, "CC");
        assert_eq!(sr.condition(5), c, "CS");
        assert_eq!(sr.condition(6), !z, "NE");
        assert_eq!(sr.condition(7), z, "EQ");
        assert_eq!(sr.condition(8), !v, "VC");
        assert_eq!(sr.condition(9), v, "VS");
        assert_eq!(sr.condition(10), !n, "PL");
        assert_eq!(sr.condition(11), n, "MI");
        assert_eq!(sr.condition(12), n == v, "GE");
        assert_eq!(sr.condition(13), n != v, "LT");
        assert_eq!(sr.condition(14), n == v && !z, "GT");
        assert_eq!(sr.condition(15), z || n != v, "LE");
    }
}
