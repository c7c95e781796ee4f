//! Performance benchmarks for the nescore emulation core.
//!
//! Measures CPU single-cycle throughput, PPU frame rendering, and full
//! `Console::do_frame` cost end-to-end.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use nescore_core::Console;
use std::time::Duration;

/// Build a minimal valid NROM ROM: a `JMP $8000` infinite loop, enough to
/// keep the CPU fetching and the PPU rendering for a whole frame.
fn create_minimal_rom() -> Vec<u8> {
    let mut rom = vec![0u8; 16 + 32768 + 8192];
    rom[0..4].copy_from_slice(b"NES\x1A");
    rom[4] = 2; // 32 KiB PRG-ROM
    rom[5] = 1; // 8 KiB CHR-ROM
    rom[6] = 0x01; // mapper 0, vertical mirroring

    rom[16 + 0x7FFC] = 0x00;
    rom[16 + 0x7FFD] = 0x80; // reset vector -> $8000

    rom[16] = 0x4C; // JMP absolute
    rom[17] = 0x00;
    rom[18] = 0x80;

    rom
}

fn bench_single_clock(c: &mut Criterion) {
    let mut console = Console::new();
    console.load_rom(&create_minimal_rom()).unwrap();

    let mut group = c.benchmark_group("clock");
    group.throughput(Throughput::Elements(1));
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("single_master_cycle", |b| {
        b.iter(|| {
            black_box(console.clock());
        });
    });

    group.finish();
}

fn bench_do_frame(c: &mut Criterion) {
    let mut console = Console::new();
    console.load_rom(&create_minimal_rom()).unwrap();

    let mut group = c.benchmark_group("console");
    group.throughput(Throughput::Elements(1));
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("do_frame", |b| {
        b.iter(|| {
            console.do_frame().unwrap();
            black_box(console.framebuffer());
        });
    });

    group.bench_function("60_frames", |b| {
        b.iter(|| {
            for _ in 0..60 {
                console.do_frame().unwrap();
            }
            black_box(console.framebuffer());
        });
    });

    group.finish();
}

fn bench_initialization(c: &mut Criterion) {
    let rom_data = create_minimal_rom();

    let mut group = c.benchmark_group("initialization");
    group.throughput(Throughput::Elements(1));
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("load_rom", |b| {
        b.iter(|| {
            let mut console = Console::new();
            console.load_rom(black_box(&rom_data)).unwrap();
            black_box(console);
        });
    });

    group.bench_function("reset", |b| {
        let mut console = Console::new();
        console.load_rom(&rom_data).unwrap();
        b.iter(|| {
            console.reset();
            black_box(console.system_clock_counter());
        });
    });

    group.finish();
}

fn bench_memory_access(c: &mut Criterion) {
    let mut console = Console::new();
    console.load_rom(&create_minimal_rom()).unwrap();

    let mut group = c.benchmark_group("memory");
    group.throughput(Throughput::Bytes(1));
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("peek_ram", |b| {
        b.iter(|| {
            black_box(console.peek(black_box(0x0000)));
        });
    });

    group.bench_function("peek_prg", |b| {
        b.iter(|| {
            black_box(console.peek(black_box(0x8000)));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_clock,
    bench_do_frame,
    bench_initialization,
    bench_memory_access,
);
criterion_main!(benches);
