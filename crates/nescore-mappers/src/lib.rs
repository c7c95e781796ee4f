//! iNES cartridge parsing and mapper dispatch for the nescore NES emulator.
//!
//! This crate owns everything that depends on *which cartridge* is plugged
//! in: iNES header parsing, PRG/CHR storage, nametable mirroring, and
//! mapper-specific address translation. It knows nothing about the CPU, PPU,
//! or clocking — those live in `nescore-cpu`, `nescore-ppu`, and
//! `nescore-core`.
//!
//! # Supported mappers
//!
//! | id | name | description |
//! |----|------|-------------|
//! | 0  | NROM | no bank switching |
//!
//! Additional mappers are added as new [`Mapper`] variants plus one match
//! arm per operation in [`mapper`]; there is no trait-object hierarchy to
//! extend.

pub mod cartridge;
pub mod mapper;
pub mod mirroring;
pub mod rom;

pub use cartridge::{Cartridge, CartridgeError};
pub use mapper::{Mapper, NromState};
pub use mirroring::Mirroring;
pub use rom::{Rom, RomError, RomHeader};
