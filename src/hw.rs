//! Hardware timer driver contract.
//!
//! Playback needs two peripherals: a sample-rate timer that delivers one
//! interrupt per sample period, and a PWM timer that runs continuously at
//! its own fixed high frequency, holding the output pin high for
//! `duty / 256` of each cycle. Both are opaque to the playback core, which
//! only talks to them through the traits in this module.
//!
//! [`SoftSampleTimer`] and [`SoftPwm`] are register-level software
//! stand-ins. They back the deterministic test harness (where the tick
//! cadence is simulated by direct repeated calls) and the host-side
//! streaming/export paths, where the audio callback takes over the role of
//! both timers.

/// Platform master clock in Hz, used to derive sample-timer periods.
///
/// The sequencer programs the sample timer with
/// `PLATFORM_CLOCK_HZ / sample_rate` clock cycles per tick.
pub const PLATFORM_CLOCK_HZ: u32 = 16_000_000;

/// Periodic sample-rate timer.
///
/// Fires the tick interrupt once per sample period while enabled. The
/// playback core configures it once at `start*`; it is never reprogrammed
/// mid-session.
pub trait SampleTimer: Send {
    /// Program the tick period in platform clock cycles and start counting.
    fn configure(&mut self, period: u32);

    /// Enable or disable the per-tick interrupt.
    ///
    /// Disabling the interrupt does not clear the counter; re-enabling
    /// resumes ticking at the configured period.
    fn set_interrupt_enabled(&mut self, enabled: bool);
}

/// Fixed-frequency PWM output stage.
///
/// The duty register is written once per sample tick; the stage itself
/// free-runs far above the sample rate so each written value holds for a
/// whole sample period.
pub trait PwmTimer: Send {
    /// Enable the output stage and drive the pin with `initial_duty`.
    fn enable_output(&mut self, initial_duty: u8);

    /// Write the duty-cycle compare register.
    fn set_duty(&mut self, value: u8);

    /// Read back the duty-cycle compare register.
    fn duty(&self) -> u8;

    /// Whether the output stage is currently driving the pin.
    fn is_output_enabled(&self) -> bool;

    /// Disable the output stage and leave the pin deasserted (low).
    fn disable_output(&mut self);
}

/// Software sample timer: records its configuration instead of ticking.
///
/// The cadence itself comes from whoever owns the tick handle, so this
/// type only has to remember what the sequencer programmed into it.
#[derive(Debug, Clone, Default)]
pub struct SoftSampleTimer {
    period: u32,
    interrupt_enabled: bool,
    configure_calls: u32,
}

impl SoftSampleTimer {
    /// Create an unconfigured timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last programmed period in platform clock cycles (0 if never set).
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Whether the tick interrupt is currently enabled.
    pub fn interrupt_enabled(&self) -> bool {
        self.interrupt_enabled
    }

    /// How many times `configure` has been called.
    pub fn configure_calls(&self) -> u32 {
        self.configure_calls
    }
}

impl SampleTimer for SoftSampleTimer {
    fn configure(&mut self, period: u32) {
        self.period = period;
        self.configure_calls += 1;
    }

    fn set_interrupt_enabled(&mut self, enabled: bool) {
        self.interrupt_enabled = enabled;
    }
}

/// Software PWM stage: a duty register plus an output-enable flag.
///
/// Constructed with [`SoftPwm::recording`], it additionally keeps a log of
/// every per-tick duty write so tests can assert on the exact output
/// sequence (the initial duty from `enable_output` is not logged; the
/// first tick rewrites it).
#[derive(Debug, Clone, Default)]
pub struct SoftPwm {
    duty: u8,
    output_enabled: bool,
    recording: bool,
    writes: Vec<u8>,
}

impl SoftPwm {
    /// Create a plain duty register.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a duty register that logs every `set_duty` call.
    pub fn recording() -> Self {
        SoftPwm {
            recording: true,
            ..Self::default()
        }
    }

    /// All duty values written since construction, in order.
    ///
    /// Empty unless constructed with [`SoftPwm::recording`].
    pub fn writes(&self) -> &[u8] {
        &self.writes
    }
}

impl PwmTimer for SoftPwm {
    fn enable_output(&mut self, initial_duty: u8) {
        self.duty = initial_duty;
        self.output_enabled = true;
    }

    fn set_duty(&mut self, value: u8) {
        self.duty = value;
        if self.recording {
            self.writes.push(value);
        }
    }

    fn duty(&self) -> u8 {
        self.duty
    }

    fn is_output_enabled(&self) -> bool {
        self.output_enabled
    }

    fn disable_output(&mut self) {
        self.output_enabled = false;
        self.duty = 0;
    }
}
