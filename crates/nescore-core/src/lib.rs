//! Integration layer for the nescore NES emulation core.
//!
//! This crate wires the CPU, PPU, and cartridge/mapper crates together
//! behind a single [`Console`] type and drives their shared master clock.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                         Console                            │
//! │  ┌───────────────────────────────────────────────────────┐ │
//! │  │                      NesBus                            │ │
//! │  │  ┌──────┐  ┌─────┐  ┌─────┐  ┌───────────┐  ┌────────┐│ │
//! │  │  │ RAM  │  │ PPU │  │ APU │  │ Cartridge │  │ Input  ││ │
//! │  │  │ 2KiB │  │     │  │     │  │  + Mapper │  │        ││ │
//! │  │  └──────┘  └─────┘  └─────┘  └───────────┘  └────────┘│ │
//! │  └───────────────────────────────────────────────────────┘ │
//! │                          ▲                                  │
//! │                          │                                  │
//! │                     ┌────┴────┐                             │
//! │                     │   CPU   │                             │
//! │                     │  6502   │                             │
//! │                     └─────────┘                             │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The PPU runs 3 dots per CPU cycle; [`Console::clock`] advances exactly
//! one master cycle and interleaves the two (and, when active, the OAM DMA
//! state machine) in that ratio.
//!
//! # Usage
//!
//! ```no_run
//! use nescore_core::{Buttons, Console};
//!
//! let rom_data = std::fs::read("game.nes").expect("failed to read ROM");
//! let mut console = Console::new();
//! console.load_rom(&rom_data).expect("failed to load cartridge");
//!
//! loop {
//!     console.write_controller(0, Buttons::A | Buttons::START);
//!     console.do_frame().expect("cartridge was ejected");
//!
//!     let _frame = console.framebuffer(); // 256x240 NES palette indices
//! }
//! ```

mod bus;
mod console;

pub use bus::{Apu, Buttons, NullSink, SampleSink};
pub use console::{timing, Console, ConsoleConfig, ConsoleError};

pub use nescore_cpu::Cpu;
pub use nescore_mappers::{Cartridge, CartridgeError, Mirroring};
pub use nescore_ppu::Ppu;

/// NES screen dimensions and framebuffer layout.
pub mod screen {
    /// Screen width in pixels.
    pub const WIDTH: u32 = 256;
    /// Screen height in pixels.
    pub const HEIGHT: u32 = 240;
    /// Total pixels per frame.
    pub const PIXELS: u32 = WIDTH * HEIGHT;
    /// Bytes per frame: one NES palette index (0-63) per pixel.
    pub const FRAMEBUFFER_SIZE: usize = (PIXELS) as usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_constants() {
        assert_eq!(screen::WIDTH, 256);
        assert_eq!(screen::HEIGHT, 240);
        assert_eq!(screen::PIXELS, 61440);
        assert_eq!(screen::FRAMEBUFFER_SIZE, 61440);
    }

    #[test]
    fn test_timing_constants() {
        assert_eq!(timing::MASTER_CLOCK_NTSC, 21_477_272);
        assert_eq!(timing::CPU_CLOCK_NTSC, 1_789_772);
        assert_eq!(timing::PPU_CLOCK_NTSC, 5_369_318);
        assert_eq!(timing::CPU_CYCLES_PER_FRAME, 29_780);
    }

    #[test]
    fn test_buttons_bits_match_host_facing_contract() {
        assert_eq!(Buttons::A.bits(), 0x80);
        assert_eq!(Buttons::B.bits(), 0x40);
        assert_eq!(Buttons::SELECT.bits(), 0x20);
        assert_eq!(Buttons::START.bits(), 0x10);
        assert_eq!(Buttons::UP.bits(), 0x08);
        assert_eq!(Buttons::DOWN.bits(), 0x04);
        assert_eq!(Buttons::LEFT.bits(), 0x02);
        assert_eq!(Buttons::RIGHT.bits(), 0x01);
    }
}
