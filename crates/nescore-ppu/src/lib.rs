//! NES 2C02 PPU (Picture Processing Unit) emulation.
//!
//! This crate provides a dot-accurate implementation of the NES PPU,
//! responsible for all graphics rendering.
//!
//! # Overview
//!
//! The PPU operates at 3x the CPU clock rate and generates a 256x240 pixel
//! image. It consists of several subsystems:
//!
//! - **Registers**: Control, Mask, Status, OAM Address, Scroll, Address, Data
//! - **Background rendering**: Nametables, pattern tables, attribute tables
//! - **Sprite rendering**: OAM, sprite evaluation, sprite 0 hit detection
//! - **Palette**: 32-byte palette RAM with mirroring
//!
//! # Timing
//!
//! NTSC timing (the primary target):
//! - Master clock: 21.477272 MHz
//! - PPU clock: 5.369318 MHz (master / 4)
//! - 341 dots per scanline
//! - 262 scanlines per frame
//! - 89,341-89,342 dots per frame (odd frame skip)
//!
//! # Usage
//!
//! ```no_run
//! use nescore_mappers::Cartridge;
//! use nescore_ppu::Ppu;
//!
//! # fn load(_: &[u8]) -> Cartridge { unimplemented!() }
//! let rom_bytes: &[u8] = &[];
//! let mut cart = load(rom_bytes);
//! let mut ppu = Ppu::new();
//! ppu.connect_cartridge(&cart);
//!
//! // Step the PPU (call 3 times per CPU cycle for NTSC)
//! let frame_done = ppu.clock(&cart);
//! if frame_done {
//!     let _frame = ppu.frame_buffer();
//! }
//!
//! // Access registers from CPU
//! ppu.cpu_write(&mut cart, 0x2000, 0x80); // enable NMI
//! let _status = ppu.cpu_read(&cart, 0x2002);
//! ```

mod background;
mod oam;
mod ppu;
mod registers;
mod scroll;
mod timing;
mod vram;

pub use oam::{
    EvalResult, Oam, SecondaryOam, Sprite, SpriteAttributes, SpriteRenderer, MAX_SPRITES_PER_LINE,
    OAM_SIZE,
};
pub use ppu::{
    Ppu, DOTS_PER_SCANLINE, FRAME_HEIGHT, FRAME_SIZE, FRAME_WIDTH, PRE_RENDER_SCANLINE,
    SCANLINES_PER_FRAME, VBLANK_START_SCANLINE,
};
pub use registers::{PpuCtrl, PpuMask, PpuStatus};
pub use scroll::Scroll;
pub use timing::Timing;
pub use vram::Vram;
