//! Cartridge construction and memory access.
//!
//! A [`Cartridge`] owns the PRG/CHR byte arrays parsed from an iNES image and
//! a single [`Mapper`] instance selected by the header's mapper id. All four
//! memory operations consult the mapper first; a mapper miss means the
//! address isn't this cartridge's concern and the caller (the system bus)
//! falls through to its own decoding.

use crate::mapper::Mapper;
use crate::mirroring::Mirroring;
use crate::rom::{Rom, RomError};

/// Errors that can occur while turning raw bytes into a usable cartridge.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CartridgeError {
    /// The byte stream failed iNES parsing.
    #[error(transparent)]
    Rom(#[from] RomError),

    /// The header named a mapper id this core doesn't implement.
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u8),
}

/// A loaded NES cartridge: PRG/CHR memory plus the mapper that banks it.
#[derive(Debug, Clone)]
pub struct Cartridge {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    mirroring: Mirroring,
    mapper: Mapper,
}

impl Cartridge {
    /// Parse an iNES image and construct the cartridge it describes.
    ///
    /// # Errors
    ///
    /// Returns [`CartridgeError::Rom`] for a malformed iNES image and
    /// [`CartridgeError::UnsupportedMapper`] if the header names a mapper id
    /// this core does not implement.
    pub fn load(data: &[u8]) -> Result<Self, CartridgeError> {
        let rom = Rom::load(data)?;
        Self::from_rom(rom)
    }

    /// Construct a cartridge from an already-parsed [`Rom`].
    ///
    /// # Errors
    ///
    /// Returns [`CartridgeError::UnsupportedMapper`] if the header names a
    /// mapper id this core does not implement.
    pub fn from_rom(rom: Rom) -> Result<Self, CartridgeError> {
        let mapper_id = rom.header.mapper_id;
        let mapper = Mapper::from_id(mapper_id, rom.prg_rom.len())
            .ok_or(CartridgeError::UnsupportedMapper(mapper_id))?;
        let mirroring = mapper.header_mirroring_override().unwrap_or(rom.header.mirroring);

        Ok(Self {
            prg_rom: rom.prg_rom,
            chr: rom.chr,
            chr_is_ram: rom.chr_is_ram,
            mirroring,
            mapper,
        })
    }

    /// Current nametable mirroring mode.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Read a byte through the mapper from CPU address space. `None` means
    /// this address is not owned by the cartridge.
    #[must_use]
    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        self.mapper
            .cpu_map_read(addr)
            .map(|offset| self.prg_rom[offset as usize])
    }

    /// Attempt a CPU write through the mapper. On mapper-0 this always
    /// misses the backing PRG array (ROM is read-only); the mapper miss
    /// tells the caller there is nothing to write.
    pub fn cpu_write(&mut self, addr: u16, data: u8) {
        if let Some(offset) = self.mapper.cpu_map_write(addr, data) {
            let _ = offset; // PRG-ROM is not writable; reserved for PRG-RAM mappers.
        }
    }

    /// Read a byte through the mapper from PPU address space (pattern tables).
    #[must_use]
    pub fn ppu_read(&self, addr: u16) -> Option<u8> {
        self.mapper
            .ppu_map_read(addr)
            .map(|offset| self.chr[offset as usize])
    }

    /// Write a byte through the mapper into PPU address space. Only takes
    /// effect when the cartridge has CHR-RAM.
    pub fn ppu_write(&mut self, addr: u16, data: u8) {
        if !self.chr_is_ram {
            return;
        }
        if let Some(offset) = self.mapper.ppu_map_write(addr) {
            self.chr[offset as usize] = data;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ines(prg_chunks: u8, chr_chunks: u8, flags6: u8) -> Vec<u8> {
        let mut data = vec![0x4E, 0x45, 0x53, 0x1A, prg_chunks, chr_chunks, flags6, 0];
        data.extend_from_slice(&[0; 8]);
        data.extend(std::iter::repeat(0xAB).take(prg_chunks as usize * 16 * 1024));
        if chr_chunks > 0 {
            data.extend(std::iter::repeat(0xCD).take(chr_chunks as usize * 8 * 1024));
        }
        data
    }

    #[test]
    fn loads_nrom_256_and_reads_prg() {
        let cart = Cartridge::load(&ines(2, 1, 0)).unwrap();
        assert_eq!(cart.cpu_read(0x8000), Some(0xAB));
        assert_eq!(cart.cpu_read(0xFFFF), Some(0xAB));
        assert_eq!(cart.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn chr_ram_is_writable() {
        let mut cart = Cartridge::load(&ines(1, 0, 0)).unwrap();
        cart.ppu_write(0x0010, 0x42);
        assert_eq!(cart.ppu_read(0x0010), Some(0x42));
    }

    #[test]
    fn chr_rom_write_is_ignored() {
        let mut cart = Cartridge::load(&ines(1, 1, 0)).unwrap();
        cart.ppu_write(0x0000, 0x99);
        assert_eq!(cart.ppu_read(0x0000), Some(0xCD));
    }

    #[test]
    fn unsupported_mapper_is_rejected() {
        let err = Cartridge::load(&ines(1, 1, 0x10)).unwrap_err();
        assert_eq!(err, CartridgeError::UnsupportedMapper(1));
    }

    #[test]
    fn cpu_miss_outside_prg_window() {
        let cart = Cartridge::load(&ines(1, 1, 0)).unwrap();
        assert_eq!(cart.cpu_read(0x0000), None);
    }

    #[test]
    fn ines_roundtrip_2prg_1chr_vertical_mapper0() {
        let cart = Cartridge::load(&ines(2, 1, 0x01)).unwrap();
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
        assert_eq!(cart.cpu_read(0x8000), Some(0xAB));
        assert_eq!(cart.cpu_read(0xBFFF), Some(0xAB));
        assert_eq!(cart.cpu_read(0xC000), Some(0xAB));
        assert_eq!(cart.cpu_read(0xFFFF), Some(0xAB));
        assert_eq!(cart.ppu_read(0x0000), Some(0xCD));
        assert_eq!(cart.ppu_read(0x1FFF), Some(0xCD));
    }
}
