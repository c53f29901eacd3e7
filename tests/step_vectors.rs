// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data-driven single-step tests: each vector describes the initial
//! register file, the instruction words at PC, and the expected registers,
//! condition codes and cycle count after one step.

use md68k::Cpu;

use serde::Deserialize;

#[derive(Deserialize)]
struct StepVector {
    name: String,
    code: Vec<u16>,
    #[serde(default)]
    d: Vec<u32>,
    #[serde(default)]
    a: Vec<u32>,
    #[serde(default)]
    ccr: u8,
    expect: Expect,
}

#[derive(Deserialize)]
struct Expect {
    #[serde(default)]
    d: Vec<u32>,
    #[serde(default)]
    a: Vec<u32>,
    ccr: u8,
    cycles: u32,
}

const VECTORS: &str = r#"[
    {
        "name": "addi.b carry and overflow",
        "code": [1536, 128],
        "d": [128],
        "expect": { "d": [0], "ccr": 23, "cycles": 8 }
    },
    {
        "name": "sub.w borrow",
        "code": [36929],
        "d": [5, 7],
        "expect": { "d": [65534, 7], "ccr": 25, "cycles": 4 }
    },
    {
        "name": "mulu word by word",
        "code": [49345],
        "d": [3, 65535],
        "expect": { "d": [196605, 65535], "ccr": 0, "cycles": 70 }
    },
    {
        "name": "divs negative quotient",
        "code": [33217],
        "d": [4294967196, 10],
        "expect": { "d": [65526, 10], "ccr": 8, "cycles": 158 }
    },
    {
        "name": "ext.w sign extends the byte",
        "code": [18560],
        "d": [128],
        "expect": { "d": [65408], "ccr": 8, "cycles": 4 }
    },
    {
        "name": "rol.b wraps the sign bit into carry",
        "code": [58136],
        "d": [129],
        "expect": { "d": [3], "ccr": 1, "cycles": 8 }
    },
    {
        "name": "adda.w does not touch the flags",
        "code": [53440],
        "d": [65535],
        "a": [10],
        "ccr": 31,
        "expect": { "d": [65535], "a": [9], "ccr": 31, "cycles": 8 }
    },
    {
        "name": "cmp.l signed compare",
        "code": [45185],
        "d": [1, 2],
        "expect": { "d": [1, 2], "ccr": 9, "cycles": 6 }
    }
]"#;

#[test]
fn step_vectors() {
    let vectors: Vec<StepVector> = serde_json::from_str(VECTORS).expect("vector json");

    for v in vectors {
        let mut bus = vec![0u8; 0x1_0000];
        bus[0x006] = 0x10; // reset PC = 0x1000
        for (i, w) in v.code.iter().enumerate() {
            bus[0x1000 + i * 2] = (w >> 8) as u8;
            bus[0x1000 + i * 2 + 1] = *w as u8;
        }

        let mut cpu = Cpu::new();
        cpu.init_state(&mut bus[..]);
        for (i, d) in v.d.iter().enumerate() {
            cpu.regs.d[i] = *d;
        }
        for (i, a) in v.a.iter().enumerate() {
            cpu.regs.a[i] = *a;
        }
        cpu.regs.sr.set_ccr(v.ccr);

        let cycles = cpu.run(&mut bus[..]);

        assert_eq!(cycles, v.expect.cycles, "{}: cycles", v.name);
        assert_eq!(cpu.regs.sr.ccr(), v.expect.ccr, "{}: ccr", v.name);
        for (i, d) in v.expect.d.iter().enumerate() {
            assert_eq!(cpu.regs.d[i], *d, "{}: D{i}", v.name);
        }
        for (i, a) in v.expect.a.iter().enumerate() {
            assert_eq!(cpu.regs.a[i], *a, "{}: A{i}", v.name);
        }
    }
}
