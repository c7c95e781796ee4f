//! Cartridge mapper dispatch.
//!
//! A mapper is modeled as a closed tagged-variant enum rather than a trait
//! object: adding a new mapper means adding a new [`Mapper`] variant and one
//! match arm per operation, not a new type implementing a trait. Every
//! operation returns an offset into the cartridge's PRG/CHR byte arrays
//! rather than the byte itself, so the caller (the [`crate::Cartridge`]) owns
//! the actual memory and the mapper only decides where in it an address
//! lands.

use crate::Mirroring;

/// State for mapper 0 (NROM): no bank switching, PRG mirrored when the
/// cartridge ships only 16 KiB.
#[derive(Debug, Clone, Copy)]
pub struct NromState {
    /// True when the cartridge has only a single 16 KiB PRG bank, which is
    /// mirrored across both halves of the CPU's `$8000-$FFFF` window.
    pub prg_is_16k: bool,
}

/// A cartridge mapper. Closed over the mapper ids this core implements.
#[derive(Debug, Clone, Copy)]
pub enum Mapper {
    /// iNES mapper 0.
    Nrom(NromState),
}

impl Mapper {
    /// Construct the mapper named by an iNES mapper id, given the PRG size
    /// in bytes needed to configure it.
    ///
    /// Returns `None` for unrecognized mapper ids; the caller turns that
    /// into a typed `unsupported mapper` error.
    #[must_use]
    pub fn from_id(mapper_id: u8, prg_len: usize) -> Option<Self> {
        match mapper_id {
            0 => Some(Mapper::Nrom(NromState {
                prg_is_16k: prg_len <= 16 * 1024,
            })),
            _ => None,
        }
    }

    /// Map a CPU read address (`$8000-$FFFF`) to a PRG-ROM byte offset.
    #[must_use]
    pub fn cpu_map_read(&self, addr: u16) -> Option<u32> {
        match self {
            Mapper::Nrom(state) => {
                if addr < 0x8000 {
                    return None;
                }
                let mask = if state.prg_is_16k { 0x3FFF } else { 0x7FFF };
                Some(u32::from(addr) & mask)
            }
        }
    }

    /// Map a CPU write address. NROM has no mapper registers, so writes land
    /// at the same offset as reads but the caller (a ROM array) should treat
    /// them as a no-op.
    #[must_use]
    pub fn cpu_map_write(&self, addr: u16, _data: u8) -> Option<u32> {
        self.cpu_map_read(addr)
    }

    /// Map a PPU address (`$0000-$1FFF`) to a CHR byte offset.
    #[must_use]
    pub fn ppu_map_read(&self, addr: u16) -> Option<u32> {
        match self {
            Mapper::Nrom(_) => {
                if addr <= 0x1FFF {
                    Some(u32::from(addr))
                } else {
                    None
                }
            }
        }
    }

    /// Map a PPU write address to a CHR byte offset. Only meaningful when
    /// the cartridge has CHR-RAM; the caller checks that separately.
    #[must_use]
    pub fn ppu_map_write(&self, addr: u16) -> Option<u32> {
        self.ppu_map_read(addr)
    }

    /// The nametable mirroring this mapper's cartridge is wired for.
    ///
    /// NROM has no mirroring control of its own; the mirroring mode comes
    /// straight from the iNES header and is tracked by the `Cartridge`, not
    /// the mapper. Kept here so future bank-switching mappers (which *do*
    /// control mirroring, e.g. MMC1) have an obvious seam.
    #[must_use]
    pub fn header_mirroring_override(&self) -> Option<Mirroring> {
        match self {
            Mapper::Nrom(_) => None,
        }
    }
}
