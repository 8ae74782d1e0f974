//! Top-level NABU system and its scanline scheduler.
//!
//! The machine runs one scanline at a time. The CPU executes whole
//! instructions until its cycle counter reaches the next 228 T-state
//! boundary; then every peripheral gets its once-per-scanline service in
//! a fixed order:
//!
//! 1. floppy index-pulse tick
//! 2. modem receive-ready line
//! 3. keyboard data-ready line
//! 4. host events (keys, joystick, reset, quit, disk swaps)
//! 5. keyboard watchdog
//! 6. scanline advance: render lines 0–239, and after line 261 wrap,
//!    present the frame and raise the VDP frame interrupt
//! 7. wall-clock pacing
//!
//! The boundary is the only place host state enters the machine.

use std::fs::File;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use emu_core::{Clock, Cpu, Observable, Presenter, SystemClock, Tickable, Value};

use crate::audio::SharedPsg;
use crate::bus::NabuBus;
use crate::config::NabuConfig;
use crate::error::Result;
use crate::fdc::{DiskImage, DiskKind, FdcMode};
use crate::input::{HostEvent, InputSource, NoInput};
use crate::interrupts::InterruptLine;
use crate::keyboard_map::{Joystick, NabuKey, joystick_report};
use crate::memory::Rom;
use crate::modem::{Modem, NullModem, TcpModem};
use crate::video::{Display, FRAME_HEIGHT, FRAME_WIDTH};

/// CPU T-states per scanline (3.58 MHz / 15.7 kHz, rounded).
pub const CYCLES_PER_SCANLINE: u64 = 228;

/// Scanlines per NTSC frame.
pub const SCANLINES_PER_FRAME: u16 = 262;

/// Scanlines that produce picture.
pub const VISIBLE_SCANLINES: u16 = FRAME_HEIGHT as u16;

/// Real time per scanline: 1 / 15 750 Hz.
pub const SCANLINE_DURATION: Duration = Duration::from_nanos(63_492);

/// Presenter used when the host shows nothing.
struct Headless;

impl Presenter for Headless {
    fn present(&mut self, _frame: &[u32], _width: usize, _height: usize) {}
}

/// NABU Personal Computer.
pub struct Nabu<C: Cpu> {
    cpu: C,
    bus: NabuBus,
    display: Display,

    /// Current scanline, 0–261.
    scanline: u16,
    /// Cycle count at which the current scanline ends.
    next_boundary: u64,
    frame_count: u64,

    clock: Box<dyn Clock>,
    presenter: Box<dyn Presenter>,
    input: Box<dyn InputSource>,
    throttle: bool,
    /// Clock reading at the previous boundary.
    last_boundary: Duration,
    quit: Arc<AtomicBool>,
}

impl<C: Cpu> Nabu<C> {
    /// Build a machine around `cpu`, loading the ROM named in `config`.
    pub fn from_config(cpu: C, config: &NabuConfig) -> Result<Self> {
        let rom = Rom::load(&config.rom)?;
        Self::new(cpu, rom, config)
    }

    /// Build a machine around `cpu` with an already-loaded ROM.
    ///
    /// Disk images named in `config` must mount; a modem or printer that
    /// cannot be opened is logged and left disconnected.
    pub fn new(cpu: C, rom: Rom, config: &NabuConfig) -> Result<Self> {
        let psg = SharedPsg::new(config.sample_rate);
        let mut bus = NabuBus::new(rom, psg, config.watchdog_scanlines, config.violations);

        for (drive, path) in [&config.drives.a, &config.drives.b].into_iter().enumerate() {
            if let Some(path) = path {
                bus.fdc.insert(drive, path)?;
            }
        }

        if let Some(modem) = &config.modem {
            bus.modem = connect_modem(&modem.address());
        }

        if let Some(path) = &config.printer {
            match File::create(path) {
                Ok(file) => bus.parallel.set_sink(Some(Box::new(file))),
                Err(e) => tracing::warn!("printer output {} unavailable: {e}", path.display()),
            }
        }

        bus.power_up();

        let clock: Box<dyn Clock> = Box::new(SystemClock::new());
        let last_boundary = clock.now();
        let next_boundary = cpu.cycles() + CYCLES_PER_SCANLINE;

        Ok(Self {
            cpu,
            bus,
            display: Display::new(),
            scanline: 0,
            next_boundary,
            frame_count: 0,
            clock,
            presenter: Box::new(Headless),
            input: Box::new(NoInput),
            throttle: config.throttle,
            last_boundary,
            quit: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Replace the wall clock used for pacing.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.last_boundary = clock.now();
        self.clock = Box::new(clock);
        self
    }

    /// Send completed frames to `presenter`.
    #[must_use]
    pub fn with_presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    /// Poll `input` for host events once per scanline.
    #[must_use]
    pub fn with_input(mut self, input: impl InputSource + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    // -----------------------------------------------------------------------
    // Scheduler
    // -----------------------------------------------------------------------

    /// Run until the quit flag is raised.
    pub fn run(&mut self) -> Result<()> {
        while !self.quit_requested() {
            self.run_scanline()?;
        }
        tracing::info!("stopped after {} frames", self.frame_count);
        Ok(())
    }

    /// Run until the current frame completes (the scanline counter wraps)
    /// or quit is requested.
    pub fn run_frame(&mut self) -> Result<()> {
        let frame = self.frame_count;
        while self.frame_count == frame && !self.quit_requested() {
            self.run_scanline()?;
        }
        Ok(())
    }

    /// Execute one scanline's worth of CPU time, then service the
    /// peripherals.
    ///
    /// Fails if the guest did something undefined while the violation
    /// policy is fatal.
    pub fn run_scanline(&mut self) -> Result<()> {
        while self.cpu.cycles() < self.next_boundary {
            self.cpu.set_interrupt(self.bus.interrupts.request());
            self.cpu.step(&mut self.bus);
            if let Some(violation) = self.bus.take_violation() {
                return Err(violation.into_error(self.cpu.pc()));
            }
        }
        self.next_boundary += CYCLES_PER_SCANLINE;

        self.bus.fdc.tick();
        self.poll_modem();
        self.poll_keyboard();
        self.poll_input();
        self.bus.keyboard.tick_watchdog();
        self.advance_scanline();
        self.pace();
        Ok(())
    }

    fn poll_modem(&mut self) {
        if self.bus.modem.bytes_available() > 0
            && !self.bus.interrupts.line(InterruptLine::SerialReceive)
        {
            self.bus.set_line(InterruptLine::SerialReceive, true);
        }
    }

    fn poll_keyboard(&mut self) {
        if !self.bus.keyboard.is_empty() && !self.bus.interrupts.line(InterruptLine::Keyboard) {
            self.bus.set_line(InterruptLine::Keyboard, true);
        }
    }

    fn poll_input(&mut self) {
        while let Some(event) = self.input.poll() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Key(key) => self.press_key(key),
            HostEvent::KeyRelease(key) => self.release_key(key),
            HostEvent::Joystick { port, state } => self.set_joystick(port, state),
            HostEvent::Reset => self.reset(),
            HostEvent::Quit => self.quit(),
            HostEvent::Insert { drive, path } => {
                if let Err(e) = self.bus.fdc.insert(drive, &path) {
                    tracing::warn!("insert {} failed: {e}", path.display());
                }
            }
            HostEvent::Eject { drive } => {
                self.bus.fdc.eject(drive);
            }
        }
    }

    fn advance_scanline(&mut self) {
        self.scanline += 1;
        if self.scanline < VISIBLE_SCANLINES {
            let video_enabled = self.bus.control.video_enabled();
            self.display
                .render_line(usize::from(self.scanline), &mut self.bus.vdp, video_enabled);
        }
        if self.scanline >= SCANLINES_PER_FRAME {
            self.scanline = 0;
            self.end_frame();
        }
    }

    fn end_frame(&mut self) {
        self.bus.vdp.vblank();
        self.presenter
            .present(self.display.pixels(), FRAME_WIDTH, FRAME_HEIGHT);
        self.frame_count += 1;

        if self.bus.vdp.frame_interrupt_enabled()
            && !self.bus.interrupts.line(InterruptLine::Video)
        {
            self.bus.set_line(InterruptLine::Video, true);
        }
    }

    fn pace(&mut self) {
        if !self.throttle {
            return;
        }
        let elapsed = self.clock.now().saturating_sub(self.last_boundary);
        if let Some(remaining) = SCANLINE_DURATION.checked_sub(elapsed) {
            self.clock.sleep(remaining);
        }
        self.last_boundary = self.clock.now();
    }

    // -----------------------------------------------------------------------
    // Process-level controls
    // -----------------------------------------------------------------------

    /// Press the reset button. RAM, ROM and mounted disks survive.
    pub fn reset(&mut self) {
        tracing::info!("reset at pc={:#06X}", self.cpu.pc());
        self.cpu.reset();
        self.bus.psg.lock().reset();
        self.bus.sync_interrupt_mask();
        self.bus.clear_control();
        self.bus.power_up();
        self.next_boundary = self.cpu.cycles() + CYCLES_PER_SCANLINE;
        self.scanline = 0;
    }

    /// Ask the scheduler to stop at the next scanline boundary.
    pub fn quit(&self) {
        self.quit.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::Relaxed)
    }

    /// Shared quit flag, for signal handlers and window threads.
    #[must_use]
    pub fn quit_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.quit)
    }

    pub fn press_key(&mut self, key: NabuKey) {
        self.bus.keyboard.put(key.make_code());
    }

    pub fn release_key(&mut self, key: NabuKey) {
        if let Some(code) = key.break_code() {
            self.bus.keyboard.put(code);
        }
    }

    /// Report a new joystick state for `port` (0 or 1).
    pub fn set_joystick(&mut self, port: u8, state: Joystick) {
        for byte in joystick_report(port, state) {
            self.bus.keyboard.put(byte);
        }
    }

    pub fn insert_disk(&mut self, drive: usize, path: impl AsRef<std::path::Path>) -> Result<DiskKind> {
        self.bus.fdc.insert(drive, path)
    }

    pub fn mount_disk(&mut self, drive: usize, image: DiskImage) -> Result<DiskKind> {
        self.bus.fdc.mount(drive, image)
    }

    pub fn eject_disk(&mut self, drive: usize) -> Option<DiskImage> {
        self.bus.fdc.eject(drive)
    }

    /// Replace the modem link.
    pub fn set_modem(&mut self, modem: Box<dyn Modem>) {
        self.bus.modem = modem;
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &NabuBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut NabuBus {
        &mut self.bus
    }

    #[must_use]
    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The frame being drawn, 320×240 ARGB.
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        self.display.pixels()
    }

    /// PSG handle for the audio callback.
    #[must_use]
    pub fn psg(&self) -> SharedPsg {
        self.bus.psg.clone()
    }
}

fn connect_modem(addr: &str) -> Box<dyn Modem> {
    match TcpModem::connect(addr) {
        Ok(modem) => Box::new(modem),
        Err(e) => {
            tracing::warn!("{e}; modem left disconnected");
            Box::new(NullModem)
        }
    }
}

// ---------------------------------------------------------------------------
// Observable
// ---------------------------------------------------------------------------

impl<C: Cpu> Observable for Nabu<C> {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("interrupts.") {
            let irq = &self.bus.interrupts;
            match rest {
                "lines" => Some(irq.lines().into()),
                "mask" => Some(irq.mask().into()),
                "status" => Some(irq.status().into()),
                "request" => Some(irq.request().map_or(Value::Bool(false), Value::U8)),
                "raised" => Some(irq.raised_count().into()),
                "asserted" => Some(Value::Array(
                    InterruptLine::ALL
                        .iter()
                        .map(|&line| Value::Bool(irq.line(line)))
                        .collect(),
                )),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("fdc.") {
            let fdc = &self.bus.fdc;
            match rest {
                "track" => Some(fdc.track().into()),
                "sector" => Some(fdc.sector().into()),
                "status" => Some(fdc.status().bits().into()),
                "drive" => Some((fdc.selected_drive() as u8).into()),
                "transfer" => Some((fdc.mode() == FdcMode::TransferActive).into()),
                "remaining" => Some((fdc.remaining() as u32).into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("vdp.") {
            match rest {
                "status" => Some(self.bus.vdp.peek_status().into()),
                "address" => Some(self.bus.vdp.address().into()),
                _ => {
                    let reg: usize = rest.strip_prefix('r')?.parse().ok()?;
                    (reg < 8).then(|| self.bus.vdp.register(reg).into())
                }
            }
        } else if let Some(rest) = path.strip_prefix("psg.r") {
            let reg: u8 = rest.parse().ok()?;
            (reg < 0x20).then(|| self.bus.psg.lock().read_register(reg).into())
        } else if let Some(rest) = path.strip_prefix("memory.") {
            let addr = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
                u16::from_str_radix(hex, 16).ok()
            } else if let Some(hex) = rest.strip_prefix('$') {
                u16::from_str_radix(hex, 16).ok()
            } else {
                rest.parse().ok()
            };
            addr.map(|a| Value::U8(self.bus.memory.read(a)))
        } else {
            match path {
                "scanline" => Some(self.scanline.into()),
                "frame" => Some(self.frame_count.into()),
                "cycles" => Some(self.cpu.cycles().into()),
                "pc" => Some(self.cpu.pc().into()),
                "control" => Some(self.bus.control.bits().into()),
                "control.leds" => {
                    let (green, red, yellow) = self.bus.control.leds();
                    Some(Value::Array(vec![
                        Value::Bool(green),
                        Value::Bool(red),
                        Value::Bool(yellow),
                    ]))
                }
                "rom_enabled" => Some(self.bus.memory.rom_enabled().into()),
                "keyboard.pending" => Some(self.bus.keyboard.len().into()),
                "modem.connected" => Some(self.bus.modem.is_connected().into()),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "scanline",
            "frame",
            "cycles",
            "pc",
            "control",
            "control.leds",
            "rom_enabled",
            "keyboard.pending",
            "modem.connected",
            "interrupts.lines",
            "interrupts.mask",
            "interrupts.status",
            "interrupts.request",
            "interrupts.raised",
            "interrupts.asserted",
            "fdc.track",
            "fdc.sector",
            "fdc.status",
            "fdc.drive",
            "fdc.transfer",
            "fdc.remaining",
            "vdp.status",
            "vdp.address",
            "vdp.r<0-7>",
            "psg.r<0-31>",
            "memory.<address>",
        ]
    }
}
