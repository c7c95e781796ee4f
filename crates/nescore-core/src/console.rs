//! The NES console: owns the CPU, the bus, and the master clock that
//! interleaves them.
//!
//! [`Console`] is the crate's single public entry point. Everything else
//! (the bus's address decoding, the PPU's per-dot pipeline, the cartridge's
//! mapper dispatch) is plumbing `Console::clock` drives one master cycle at
//! a time.

use nescore_cpu::trace::CpuTracer;
use nescore_cpu::Cpu;
use nescore_mappers::{Cartridge, CartridgeError};
use nescore_ppu::Ppu;

use crate::bus::{Buttons, NesBus, NullSink, SampleSink};

/// NES emulation timing constants.
pub mod timing {
    /// Master clock frequency (NTSC), in Hz.
    pub const MASTER_CLOCK_NTSC: u32 = 21_477_272;
    /// CPU clock frequency (NTSC), in Hz. Exactly 1/12 of the master clock.
    pub const CPU_CLOCK_NTSC: u32 = MASTER_CLOCK_NTSC / 12;
    /// PPU clock frequency (NTSC), in Hz. Exactly 1/4 of the master clock.
    pub const PPU_CLOCK_NTSC: u32 = MASTER_CLOCK_NTSC / 4;
    /// CPU cycles in one NTSC frame (29,780.5, rounded down).
    pub const CPU_CYCLES_PER_FRAME: u32 = 29_780;
    /// Target frame rate (NTSC), in Hz.
    pub const FRAME_RATE_NTSC: f64 = 60.0988;
}

/// Errors a host can hit operating a [`Console`].
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Loading the cartridge image failed.
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),

    /// The requested operation needs a cartridge, but none is inserted.
    #[error("no cartridge loaded")]
    NoCartridge,
}

/// Construction-time choices that don't belong in the hot clock loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleConfig {
    /// Record a nestest-log-compatible execution trace as instructions
    /// retire. Costs an allocation and a format call per instruction, so it
    /// defaults to off.
    pub trace_cpu: bool,
}

/// A complete NES console: CPU, PPU, mapper, and the bus wiring them
/// together.
pub struct Console {
    cpu: Cpu,
    bus: NesBus,
    sink: Box<dyn SampleSink>,
    tracer: Option<CpuTracer>,
}

impl Console {
    /// Create a console with no cartridge inserted.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ConsoleConfig::default())
    }

    /// Create a console with the given configuration and no cartridge
    /// inserted.
    #[must_use]
    pub fn with_config(config: ConsoleConfig) -> Self {
        Self {
            cpu: Cpu::new(),
            bus: NesBus::new(),
            sink: Box::new(NullSink),
            tracer: config.trace_cpu.then(CpuTracer::new),
        }
    }

    /// Parse an iNES image and insert it as the active cartridge, powering
    /// on the CPU against it.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Cartridge`] if the image fails iNES parsing or
    /// names an unsupported mapper.
    pub fn load_rom(&mut self, rom_data: &[u8]) -> Result<(), ConsoleError> {
        let cart = Cartridge::load(rom_data)?;
        self.insert_cartridge(cart);
        Ok(())
    }

    /// Insert an already-parsed cartridge, replacing any cartridge already
    /// present, and power on the CPU against it.
    pub fn insert_cartridge(&mut self, cart: Cartridge) {
        self.bus.insert_cartridge(cart);
        self.reset();
    }

    /// Remove the active cartridge, if any.
    pub fn eject_cartridge(&mut self) -> Option<Cartridge> {
        self.bus.eject_cartridge()
    }

    /// True if a cartridge is currently inserted.
    #[must_use]
    pub fn has_cartridge(&self) -> bool {
        self.bus.has_cartridge()
    }

    /// Reset the CPU, PPU, and DMA/clock state. Equivalent to pressing the
    /// console's reset button.
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
        self.bus.ppu.reset();
        self.bus.apu.reset();
        self.bus.dma_transfer = false;
        self.bus.dma_dummy = true;
        self.bus.clock_counter = 0;
        if let Some(tracer) = &mut self.tracer {
            *tracer = CpuTracer::new();
        }
    }

    /// Advance the system by exactly one master clock cycle.
    ///
    /// Ordering within a cycle matches real hardware: the PPU advances
    /// first, then either the OAM DMA state machine or the CPU runs (every
    /// third master cycle, since the CPU clocks at 1/3 the PPU rate), then a
    /// pending NMI is delivered to the CPU, then the counter advances.
    ///
    /// Returns `true` if this cycle completed a PPU frame.
    pub fn clock(&mut self) -> bool {
        let frame_complete = match self.bus.cart.as_ref() {
            Some(cart) => self.bus.ppu.clock(cart),
            None => false,
        };

        if self.bus.clock_counter % 3 == 0 {
            if self.bus.dma_transfer {
                self.tick_dma();
            } else {
                if let Some(tracer) = &mut self.tracer {
                    if self.cpu.instruction_complete() {
                        tracer.trace(&self.cpu, &mut self.bus);
                    }
                }
                self.cpu.clock(&mut self.bus);
                self.bus.apu.clock(self.sink.as_mut());
            }
        }

        if self.bus.ppu.take_nmi() {
            self.cpu.nmi(&mut self.bus);
        }

        self.bus.clock_counter += 1;
        frame_complete
    }

    /// One step of the cycle-accurate OAM DMA state machine: a dummy cycle
    /// to align to an even CPU cycle, then 256 alternating read/write pairs
    /// copying `page << 8 .. page << 8 + 256` into PPU OAM via `$2004`.
    fn tick_dma(&mut self) {
        if self.bus.dma_dummy {
            if self.bus.clock_counter % 2 == 1 {
                self.bus.dma_dummy = false;
            }
            return;
        }

        if self.bus.clock_counter % 2 == 0 {
            let addr = (u16::from(self.bus.dma_page) << 8) | u16::from(self.bus.dma_addr);
            self.bus.dma_data = nescore_cpu::Bus::read(&mut self.bus, addr);
        } else {
            let data = self.bus.dma_data;
            if let Some(cart) = self.bus.cart.as_mut() {
                self.bus.ppu.cpu_write(cart, 0x2004, data);
            }
            self.bus.dma_addr = self.bus.dma_addr.wrapping_add(1);
            if self.bus.dma_addr == 0 {
                self.bus.dma_transfer = false;
                self.bus.dma_dummy = true;
            }
        }
    }

    /// Run until the PPU completes a frame, then finish whatever CPU
    /// instruction was mid-flight so the console never stops between
    /// master cycles belonging to the same instruction.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::NoCartridge`] if no cartridge is inserted.
    pub fn do_frame(&mut self) -> Result<(), ConsoleError> {
        if !self.bus.has_cartridge() {
            return Err(ConsoleError::NoCartridge);
        }

        while !self.clock() {}
        while !self.cpu.instruction_complete() {
            self.clock();
        }

        Ok(())
    }

    /// The current frame, one NES palette index (0-63) per pixel, row-major,
    /// 256x240.
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        self.bus.ppu.frame_buffer()
    }

    /// Total master clock cycles elapsed since the last reset.
    #[must_use]
    pub fn system_clock_counter(&self) -> u64 {
        self.bus.clock_counter
    }

    /// Replace controller `index`'s (0 or 1) held-button mask.
    pub fn write_controller(&mut self, index: usize, buttons: Buttons) {
        self.bus.set_controller(index, buttons);
    }

    /// Clear controller `index`'s (0 or 1) held-button mask.
    pub fn clear_controller(&mut self, index: usize) {
        self.bus.clear_controller(index);
    }

    /// Read controller `index`'s (0 or 1) current held-button mask.
    #[must_use]
    pub fn get_controller(&self, index: usize) -> Buttons {
        self.bus.controller(index)
    }

    /// Replace the audio sample sink. Defaults to [`NullSink`].
    pub fn set_sample_sink(&mut self, sink: Box<dyn SampleSink>) {
        self.sink = sink;
    }

    /// Drain the nestest-log-compatible execution trace, if tracing was
    /// enabled via [`ConsoleConfig::trace_cpu`].
    pub fn take_trace_log(&mut self) -> Option<String> {
        self.tracer.as_mut().map(|tracer| {
            let log = tracer.get_log();
            *tracer = CpuTracer::new();
            log
        })
    }

    /// Read a byte without side effects, for debuggers/disassemblers. PPU
    /// registers and controller ports are not peekable and read as open bus.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        nescore_cpu::Bus::peek(&self.bus, addr)
    }

    /// The CPU, for debugging.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// The PPU, for debugging.
    #[must_use]
    pub fn ppu(&self) -> &Ppu {
        &self.bus.ppu
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
