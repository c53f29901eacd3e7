//! Benchmark for the interpreter loop.
//!
//! Make sure the result of the benchmarked function is used,
//! whether by sending it to black_box, or to return it from the closure.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use md68k::Cpu;

pub fn criterion_benchmark(c: &mut Criterion) {
    let code: [u16; 5] = [
        0x0000, 0x1000, // Initial SSP
        0x0000, 0x0008, // Initial PC
        0x60FE, // BRA.S *-0
    ];
    // Flatten to the byte bus the core expects.
    let mut ram = [0u8; 0x2000];
    for (i, w) in code.iter().enumerate() {
        ram[i * 2] = (*w >> 8) as u8;
        ram[i * 2 + 1] = *w as u8;
    }

    let mut cpu = Cpu::new();
    cpu.init_state(&mut ram[..]);
    // The benchmark executes the same instruction forever so no input
    // management is needed.

    c.bench_function("interpreter", |b| {
        b.iter(|| black_box(cpu.run(black_box(&mut ram[..]))))
    });

    c.bench_function("decoder", |b| {
        b.iter(|| black_box(md68k::decode(black_box(&mut ram[..]), 8)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
