//! PPU VRAM (Video RAM) and palette RAM implementation
//!
//! The PPU has access to:
//! - 2KB internal VRAM for nametables (mirrored to 4KB address space)
//! - 32 bytes of palette RAM
//! - External CHR ROM/RAM (accessed via the cartridge's mapper)
//!
//! # Address Space ($0000-$3FFF)
//!
//! ```text
//! $0000-$0FFF: Pattern Table 0 (CHR ROM/RAM, via mapper)
//! $1000-$1FFF: Pattern Table 1 (CHR ROM/RAM, via mapper)
//! $2000-$23FF: Nametable 0
//! $2400-$27FF: Nametable 1
//! $2800-$2BFF: Nametable 2
//! $2C00-$2FFF: Nametable 3
//! $3000-$3EFF: Mirror of $2000-$2EFF
//! $3F00-$3F1F: Palette RAM (32 bytes)
//! $3F20-$3FFF: Mirror of $3F00-$3F1F
//! ```
//!
//! Nametable address translation is delegated to the cartridge's
//! [`Mirroring`] mode, since the mirroring wiring lives on the cartridge
//! edge connector, not the PPU itself.

use nescore_mappers::Mirroring;

/// PPU VRAM manager.
///
/// Handles internal 2KB nametable RAM and 32-byte palette RAM. Pattern
/// table access is delegated to the cartridge's mapper.
pub struct Vram {
    /// Internal nametable RAM (2KB).
    nametables: Vec<u8>,
    /// Palette RAM (32 bytes).
    palette: Vec<u8>,
    /// Current mirroring mode, as reported by the cartridge.
    mirroring: Mirroring,
}

impl Vram {
    /// Create new VRAM with the given mirroring mode.
    pub fn new(mirroring: Mirroring) -> Self {
        Self {
            nametables: vec![0; 2048],
            palette: vec![0; 32],
            mirroring,
        }
    }

    /// Set nametable mirroring mode.
    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.mirroring = mirroring;
    }

    /// Get current mirroring mode.
    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Read from VRAM address space.
    ///
    /// Pattern table reads (`$0000-$1FFF`) are routed through the
    /// cartridge's mapper by the caller and never reach this method in
    /// normal operation.
    pub fn read(&self, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;

        match addr {
            0x0000..=0x1FFF => {
                log::warn!("VRAM read from pattern table ${addr:04X} - should use mapper");
                0
            }
            0x2000..=0x2FFF => self.nametables[self.mirroring.map_address(addr) as usize],
            0x3000..=0x3EFF => self.nametables[self.mirroring.map_address(addr - 0x1000) as usize],
            0x3F00..=0x3FFF => self.palette[self.mirror_palette_addr(addr)],
            _ => unreachable!(),
        }
    }

    /// Write to VRAM address space.
    pub fn write(&mut self, addr: u16, value: u8) {
        let addr = addr & 0x3FFF;

        match addr {
            0x0000..=0x1FFF => {
                log::warn!("VRAM write to pattern table ${addr:04X} - should use mapper");
            }
            0x2000..=0x2FFF => {
                let mirrored = self.mirroring.map_address(addr) as usize;
                self.nametables[mirrored] = value;
            }
            0x3000..=0x3EFF => {
                let mirrored = self.mirroring.map_address(addr - 0x1000) as usize;
                self.nametables[mirrored] = value;
            }
            0x3F00..=0x3FFF => {
                let palette_addr = self.mirror_palette_addr(addr);
                self.palette[palette_addr] = value;
            }
            _ => unreachable!(),
        }
    }

    /// Mirror palette address according to palette mirroring rules.
    ///
    /// Palette RAM has special mirroring:
    /// - $3F10, $3F14, $3F18, $3F1C mirror $3F00, $3F04, $3F08, $3F0C
    /// - All addresses mirror every 32 bytes
    fn mirror_palette_addr(&self, addr: u16) -> usize {
        let mut addr = (addr & 0x1F) as usize;

        if addr >= 0x10 && addr % 4 == 0 {
            addr -= 0x10;
        }

        addr
    }

    /// Read palette entry directly (for rendering).
    #[inline]
    pub fn read_palette(&self, addr: u8) -> u8 {
        let addr = self.mirror_palette_addr(0x3F00 | u16::from(addr));
        self.palette[addr]
    }

    /// Reset VRAM to power-up state.
    pub fn reset(&mut self) {
        self.nametables.fill(0);
        self.palette.fill(0);
    }
}

impl Default for Vram {
    fn default() -> Self {
        Self::new(Mirroring::Horizontal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_mirroring() {
        let vram = Vram::new(Mirroring::Horizontal);

        assert_eq!(vram.mirroring.map_address(0x2000), 0x0000);
        assert_eq!(vram.mirroring.map_address(0x2400), 0x0000);
        assert_eq!(vram.mirroring.map_address(0x2800), 0x0400);
        assert_eq!(vram.mirroring.map_address(0x2C00), 0x0400);
    }

    #[test]
    fn test_vertical_mirroring() {
        let vram = Vram::new(Mirroring::Vertical);

        assert_eq!(vram.mirroring.map_address(0x2000), 0x0000);
        assert_eq!(vram.mirroring.map_address(0x2800), 0x0000);
        assert_eq!(vram.mirroring.map_address(0x2400), 0x0400);
        assert_eq!(vram.mirroring.map_address(0x2C00), 0x0400);
    }

    #[test]
    fn test_single_screen_low() {
        let vram = Vram::new(Mirroring::SingleScreenLow);

        assert_eq!(vram.mirroring.map_address(0x2000), 0x0000);
        assert_eq!(vram.mirroring.map_address(0x2400), 0x0000);
        assert_eq!(vram.mirroring.map_address(0x2800), 0x0000);
        assert_eq!(vram.mirroring.map_address(0x2C00), 0x0000);
    }

    #[test]
    fn test_palette_mirroring() {
        let vram = Vram::new(Mirroring::Horizontal);

        assert_eq!(vram.mirror_palette_addr(0x3F00), 0x00);
        assert_eq!(vram.mirror_palette_addr(0x3F0F), 0x0F);
        assert_eq!(vram.mirror_palette_addr(0x3F10), 0x00);
        assert_eq!(vram.mirror_palette_addr(0x3F14), 0x04);
        assert_eq!(vram.mirror_palette_addr(0x3F18), 0x08);
        assert_eq!(vram.mirror_palette_addr(0x3F1C), 0x0C);
        assert_eq!(vram.mirror_palette_addr(0x3F11), 0x11);
        assert_eq!(vram.mirror_palette_addr(0x3F1F), 0x1F);
    }

    #[test]
    fn test_palette_read_write() {
        let mut vram = Vram::new(Mirroring::Horizontal);

        vram.write(0x3F00, 0x0F);
        vram.write(0x3F01, 0x30);

        assert_eq!(vram.read(0x3F00), 0x0F);
        assert_eq!(vram.read(0x3F01), 0x30);

        vram.write(0x3F10, 0x20);
        assert_eq!(vram.read(0x3F00), 0x20);
    }

    #[test]
    fn test_nametable_read_write() {
        let mut vram = Vram::new(Mirroring::Horizontal);

        vram.write(0x2000, 0x42);
        assert_eq!(vram.read(0x2000), 0x42);
        assert_eq!(vram.read(0x2400), 0x42);
    }

    #[test]
    fn test_nametable_mirror_region() {
        let mut vram = Vram::new(Mirroring::Horizontal);

        vram.write(0x2000, 0x55);
        assert_eq!(vram.read(0x3000), 0x55);

        vram.write(0x3100, 0xAA);
        assert_eq!(vram.read(0x2100), 0xAA);
    }

    #[test]
    fn test_palette_32_byte_mirror() {
        let mut vram = Vram::new(Mirroring::Horizontal);

        vram.write(0x3F00, 0x11);

        assert_eq!(vram.read(0x3F20), 0x11);
        assert_eq!(vram.read(0x3F40), 0x11);
        assert_eq!(vram.read(0x3FE0), 0x11);
    }

    #[test]
    fn test_change_mirroring() {
        let mut vram = Vram::new(Mirroring::Horizontal);

        vram.write(0x2000, 0x42);
        vram.write(0x2400, 0x55);
        assert_eq!(vram.read(0x2000), 0x55);

        vram.set_mirroring(Mirroring::Vertical);

        vram.write(0x2000, 0xAA);
        assert_eq!(vram.read(0x2000), 0xAA);
        assert_eq!(vram.read(0x2400), 0x00);
    }

    #[test]
    fn test_reset() {
        let mut vram = Vram::new(Mirroring::Horizontal);

        vram.write(0x2000, 0x42);
        vram.write(0x3F00, 0x0F);

        vram.reset();

        assert_eq!(vram.read(0x2000), 0x00);
        assert_eq!(vram.read(0x3F00), 0x00);
    }
}
