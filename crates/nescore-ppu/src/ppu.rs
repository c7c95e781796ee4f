//! Ricoh 2C02 PPU core: registers, rendering pipeline, and frame output.
//!
//! [`Ppu::clock`] advances the PPU by exactly one dot (pixel clock), the
//! same per-dot granularity the hardware runs at. The surrounding
//! [`Bus`](nescore_cpu::Bus)/console layer is responsible for calling it
//! three times per CPU cycle.

use crate::background::Background;
use crate::oam::{evaluate_sprites, Oam, SecondaryOam, SpriteRenderer};
use crate::registers::{PpuCtrl, PpuMask, PpuStatus};
use crate::scroll::Scroll;
use crate::timing::Timing;
use crate::vram::Vram;
use nescore_mappers::{Cartridge, Mirroring};

/// Visible frame width in pixels.
pub const FRAME_WIDTH: usize = 256;
/// Visible frame height in pixels.
pub const FRAME_HEIGHT: usize = 240;
/// Visible frame size in pixels.
pub const FRAME_SIZE: usize = FRAME_WIDTH * FRAME_HEIGHT;

/// Number of dots per scanline.
pub const DOTS_PER_SCANLINE: u16 = 341;
/// Number of scanlines per frame.
pub const SCANLINES_PER_FRAME: u16 = 262;
/// Scanline on which VBlank begins.
pub const VBLANK_START_SCANLINE: i16 = 241;
/// The pre-render scanline.
pub const PRE_RENDER_SCANLINE: i16 = -1;

/// How many PPU clock cycles the open-bus decay latch holds its value
/// before fading to zero, approximating ~600ms on real hardware.
const OPEN_BUS_DECAY_CYCLES: u32 = 3_000_000;

/// The Ricoh 2C02 Picture Processing Unit.
///
/// Owns all PPU-internal state (registers, VRAM, OAM, rendering shift
/// registers, and dot/scanline timing) but never owns the cartridge: CHR
/// and mirroring access is always mediated through a `&Cartridge`/`&mut
/// Cartridge` parameter, mirroring how [`Bus`](nescore_cpu::Bus) keeps the
/// CPU core decoupled from memory ownership.
pub struct Ppu {
    ctrl: PpuCtrl,
    mask: PpuMask,
    status: PpuStatus,
    scroll: Scroll,
    vram: Vram,
    oam: Oam,
    secondary_oam: SecondaryOam,
    background: Background,
    sprite_renderer: SpriteRenderer,
    sprite_zero_in_range: bool,
    timing: Timing,
    frame_buffer: Vec<u8>,
    vram_read_buffer: u8,
    open_bus_latch: u8,
    decay_counter: u32,
    nmi_pending: bool,
    frame_complete: bool,
}

impl Ppu {
    /// Create a new PPU in its power-up state.
    pub fn new() -> Self {
        Self {
            ctrl: PpuCtrl::empty(),
            mask: PpuMask::empty(),
            status: PpuStatus::empty(),
            scroll: Scroll::new(),
            vram: Vram::new(Mirroring::Horizontal),
            oam: Oam::new(),
            secondary_oam: SecondaryOam::new(),
            background: Background::new(),
            sprite_renderer: SpriteRenderer::new(),
            sprite_zero_in_range: false,
            timing: Timing::new(),
            frame_buffer: vec![0; FRAME_SIZE],
            vram_read_buffer: 0,
            open_bus_latch: 0,
            decay_counter: 0,
            nmi_pending: false,
            frame_complete: false,
        }
    }

    /// Wire up a newly inserted cartridge's nametable mirroring.
    pub fn connect_cartridge(&mut self, cart: &Cartridge) {
        self.vram.set_mirroring(cart.mirroring());
    }

    fn refresh_open_bus(&mut self) {
        self.decay_counter = OPEN_BUS_DECAY_CYCLES;
    }

    /// Read from the PPU's own $0000-$3FFF address space: pattern tables
    /// are routed to the cartridge, everything else to internal VRAM.
    pub fn ppu_read(&self, cart: &Cartridge, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        if addr < 0x2000 {
            cart.ppu_read(addr).unwrap_or(0)
        } else {
            self.vram.read(addr)
        }
    }

    /// Write to the PPU's own $0000-$3FFF address space.
    pub fn ppu_write(&mut self, cart: &mut Cartridge, addr: u16, value: u8) {
        let addr = addr & 0x3FFF;
        if addr < 0x2000 {
            cart.ppu_write(addr, value);
        } else {
            self.vram.write(addr, value);
        }
    }

    /// Read a CPU-visible PPU register ($2000-$2007, mirrored every 8 bytes
    /// through $3FFF).
    pub fn cpu_read(&mut self, cart: &Cartridge, addr: u16) -> u8 {
        match addr & 0x07 {
            0 | 1 | 3 | 5 | 6 => self.open_bus_latch,

            2 => {
                self.refresh_open_bus();
                let status = self.status.bits();
                let result = (status & 0xE0) | (self.open_bus_latch & 0x1F);

                self.status.clear_vblank();
                self.scroll.reset_latch();
                self.nmi_pending = false;
                self.open_bus_latch = result;
                result
            }

            4 => {
                self.refresh_open_bus();
                let data = self.oam.read();
                self.open_bus_latch = data;
                data
            }

            7 => {
                self.refresh_open_bus();
                let addr = self.scroll.vram_addr();
                let data = self.ppu_read(cart, addr);

                let result = if addr >= 0x3F00 {
                    let pal_data = (data & 0x3F) | (self.open_bus_latch & 0xC0);
                    self.vram_read_buffer = self.ppu_read(cart, addr.wrapping_sub(0x1000));
                    pal_data
                } else {
                    let buffered = self.vram_read_buffer;
                    self.vram_read_buffer = data;
                    buffered
                };

                self.scroll.increment_vram(self.ctrl.vram_increment());
                self.open_bus_latch = result;
                result
            }

            _ => unreachable!(),
        }
    }

    /// Write a CPU-visible PPU register ($2000-$2007, mirrored every 8 bytes
    /// through $3FFF).
    pub fn cpu_write(&mut self, cart: &mut Cartridge, addr: u16, value: u8) {
        self.open_bus_latch = value;
        self.refresh_open_bus();

        match addr & 0x07 {
            0 => {
                self.ctrl = PpuCtrl::from_bits_truncate(value);
                self.scroll.write_ctrl(value);
                if self.ctrl.nmi_enabled() && self.status.in_vblank() {
                    self.nmi_pending = true;
                }
            }
            1 => self.mask = PpuMask::from_bits_truncate(value),
            2 => {}
            3 => self.oam.set_addr(value),
            4 => self.oam.write(value),
            5 => self.scroll.write_scroll(value),
            6 => self.scroll.write_addr(value),
            7 => {
                let addr = self.scroll.vram_addr();
                self.ppu_write(cart, addr, value);
                self.scroll.increment_vram(self.ctrl.vram_increment());
            }
            _ => unreachable!(),
        }
    }

    /// Copy 256 bytes from CPU memory into primary OAM (triggered by a
    /// write to `$4014` on the CPU side).
    pub fn oam_dma(&mut self, data: &[u8; 256]) {
        self.oam.dma_write(data);
    }

    /// Advance the PPU by one dot, fetching from `cart` as needed.
    ///
    /// Returns `true` exactly once per frame, on the dot that completes it.
    #[allow(clippy::too_many_lines)]
    pub fn clock(&mut self, cart: &Cartridge) -> bool {
        if self.decay_counter > 0 {
            self.decay_counter -= 1;
            if self.decay_counter == 0 {
                self.open_bus_latch = 0;
            }
        }

        let rendering_enabled = self.mask.rendering_enabled();
        self.frame_complete = self.timing.tick(rendering_enabled);
        let scanline = self.timing.scanline();
        let dot = self.timing.dot();

        if self.timing.is_vblank_set_dot() {
            self.status.set_vblank();
            log::trace!("ppu: entering vblank (frame {})", self.timing.frame());
            if self.ctrl.nmi_enabled() {
                self.nmi_pending = true;
            }
        }

        if self.timing.is_vblank_clear_dot() {
            self.status.clear_vblank();
            self.status.clear_sprite_flags();
        }

        if rendering_enabled && self.timing.is_rendering_scanline() {
            if self.timing.is_visible_dot() || self.timing.is_prefetch_dot() {
                self.background.shift_registers();
                self.tick_background_fetch(cart, dot);

                if dot == 256 {
                    self.scroll.increment_y();
                }
            }

            if self.timing.is_visible_dot() {
                self.sprite_renderer.tick();
            }

            if self.timing.is_hori_copy_dot() {
                self.scroll.copy_horizontal();
            }

            if self.timing.is_vert_copy_range() {
                self.scroll.copy_vertical();
            }

            if self.timing.is_sprite_eval_start() {
                let next_scanline = (scanline + 1) as u16;
                let result = evaluate_sprites(
                    &self.oam,
                    next_scanline,
                    self.ctrl.sprite_height(),
                    &mut self.secondary_oam,
                );
                self.sprite_zero_in_range = result.sprite_zero_in_range;
                if result.overflow {
                    self.status.set_sprite_overflow();
                    log::trace!("ppu: sprite overflow on scanline {scanline}");
                }
            }

            if self.timing.is_sprite_fetch_start() {
                self.sprite_renderer
                    .start_scanline(self.secondary_oam.count(), self.sprite_zero_in_range);
            }

            if self.timing.is_sprite_fetch_range() {
                self.tick_sprite_fetch(cart, dot);
            }

            if self.timing.is_visible_scanline() && self.timing.is_visible_dot() {
                let x = (dot - 1) as usize;
                let y = scanline.max(0) as usize;
                self.render_pixel(x, y);
            }
        }

        if self.frame_complete {
            log::debug!("ppu: frame {} complete", self.timing.frame());
        }

        self.frame_complete
    }

    fn tick_background_fetch(&mut self, cart: &Cartridge, dot: u16) {
        match dot % 8 {
            1 => {
                let tile_index = self.ppu_read(cart, self.scroll.nametable_addr());
                self.background.set_nametable_byte(tile_index);
            }
            3 => {
                let attr_byte = self.ppu_read(cart, self.scroll.attribute_addr());
                self.background
                    .set_attribute_byte(attr_byte, self.scroll.coarse_x(), self.scroll.coarse_y());
            }
            5 => {
                let addr = self
                    .scroll
                    .pattern_addr(self.background.nametable_byte(), self.ctrl.bg_table_addr());
                self.background.set_pattern_low(self.ppu_read(cart, addr));
            }
            7 => {
                let addr = self
                    .scroll
                    .pattern_addr(self.background.nametable_byte(), self.ctrl.bg_table_addr())
                    + 8;
                self.background.set_pattern_high(self.ppu_read(cart, addr));
            }
            0 => {
                self.background.load_shift_registers();
                self.scroll.increment_x();
            }
            _ => {}
        }
    }

    fn tick_sprite_fetch(&mut self, cart: &Cartridge, dot: u16) {
        let fetch_cycle = dot - 257;
        let sprite_index = (fetch_cycle / 8) as u8;
        let fetch_step = fetch_cycle % 8;

        if fetch_step != 7 {
            return;
        }
        let Some(sprite) = self.secondary_oam.get_sprite(sprite_index) else {
            return;
        };

        let height = self.ctrl.sprite_height();
        let next_scanline = (self.timing.scanline() + 1) as u16;
        let row = sprite.row_in_sprite(next_scanline, height);
        let base_addr = sprite.pattern_fetch_addr(row, height, self.ctrl.sprite_table_addr());

        let mut pattern_low = self.ppu_read(cart, base_addr);
        let mut pattern_high = self.ppu_read(cart, base_addr + 8);

        if sprite.attributes.flip_horizontal() {
            pattern_low = pattern_low.reverse_bits();
            pattern_high = pattern_high.reverse_bits();
        }

        self.sprite_renderer
            .load_sprite(sprite_index, sprite.x, sprite.attributes, pattern_low, pattern_high);
    }

    fn render_pixel(&mut self, x: usize, y: usize) {
        let (mut bg_pixel, mut bg_palette) = (0u8, 0u8);
        if self.mask.show_background() && (x >= 8 || self.mask.show_bg_left()) {
            let (pixel, palette) = self.background.get_pixel(self.scroll.fine_x());
            bg_pixel = pixel;
            bg_palette = palette;
        }

        let (mut sprite_pixel, mut sprite_palette, mut sprite_priority, mut sprite_zero) =
            (0u8, 0u8, false, false);
        if self.mask.show_sprites() && (x >= 8 || self.mask.show_sprites_left()) {
            if let Some((pixel, palette, priority, is_zero)) = self.sprite_renderer.get_pixel() {
                sprite_pixel = pixel;
                sprite_palette = palette;
                sprite_priority = priority;
                sprite_zero = is_zero;
            }
        }

        if sprite_zero && bg_pixel != 0 && sprite_pixel != 0 && x != 255 {
            self.status.set_sprite_zero_hit();
        }

        let (final_pixel, final_palette) = if bg_pixel == 0 && sprite_pixel == 0 {
            (0, 0)
        } else if bg_pixel == 0 {
            (sprite_pixel, sprite_palette)
        } else if sprite_pixel == 0 {
            (bg_pixel, bg_palette)
        } else if sprite_priority {
            (bg_pixel, bg_palette)
        } else {
            (sprite_pixel, sprite_palette)
        };

        let palette_addr = (final_palette << 2) | final_pixel;
        let mask = if self.mask.greyscale() { 0x30 } else { 0x3F };
        let color_index = self.vram.read_palette(palette_addr) & mask;
        self.frame_buffer[y * FRAME_WIDTH + x] = color_index;
    }

    /// The completed frame as NES palette indices (0-63), row-major,
    /// `FRAME_WIDTH` x `FRAME_HEIGHT`.
    #[inline]
    pub fn frame_buffer(&self) -> &[u8] {
        &self.frame_buffer
    }

    /// Take the pending NMI flag, if set, clearing it.
    #[inline]
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    /// True on the single dot that just completed a frame.
    #[inline]
    pub fn frame_complete(&self) -> bool {
        self.frame_complete
    }

    /// Reset to power-up state.
    pub fn reset(&mut self) {
        self.ctrl = PpuCtrl::empty();
        self.mask = PpuMask::empty();
        self.status = PpuStatus::empty();
        self.scroll = Scroll::new();
        self.vram.reset();
        self.oam.reset();
        self.background.reset();
        self.sprite_renderer.reset();
        self.timing.reset();
        self.frame_buffer.fill(0);
        self.vram_read_buffer = 0;
        self.open_bus_latch = 0;
        self.decay_counter = 0;
        self.nmi_pending = false;
        self.frame_complete = false;
    }

    /// Current scanline (-1..=260).
    pub fn scanline(&self) -> i16 {
        self.timing.scanline()
    }

    /// Current dot within the scanline (0-340).
    pub fn dot(&self) -> u16 {
        self.timing.dot()
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}
