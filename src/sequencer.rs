//! Control-context playback operations.
//!
//! The [`Sequencer`] owns the shared playback state and the two timer
//! peripherals, and exposes the host-facing operations: start a single
//! buffer, start a chained playlist, request a click-free stop, reset
//! playlist bookkeeping and query the busy flag.
//!
//! On the bare-metal target every multi-field update was bracketed by
//! disabling the sample-tick interrupt. Here the bracket is a
//! `parking_lot::Mutex`: the tick handler locks the same mutex, so it can
//! never observe a torn combination of fields. The busy flag is mirrored
//! into an `AtomicBool` so [`Sequencer::is_playing`] stays non-blocking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::buffer::{Playlist, SampleBuffer};
use crate::hw::{PwmTimer, SampleTimer, PLATFORM_CLOCK_HZ};
use crate::playback::{PlaybackState, PlaybackStatus};
use crate::{Pcm8Error, Result};

/// Capability for driving the sample-tick state machine.
///
/// Cloned off a [`Sequencer`] and handed to whatever cadence source
/// stands in for the sample-rate timer: the streaming audio callback, a
/// hardware interrupt shim, or a plain loop in a test. Each call to
/// [`TickHandle::tick`] is one sample period.
pub struct TickHandle<P: PwmTimer> {
    state: Arc<Mutex<PlaybackState>>,
    pwm: Arc<Mutex<P>>,
    busy: Arc<AtomicBool>,
}

impl<P: PwmTimer> Clone for TickHandle<P> {
    fn clone(&self) -> Self {
        TickHandle {
            state: Arc::clone(&self.state),
            pwm: Arc::clone(&self.pwm),
            busy: Arc::clone(&self.busy),
        }
    }
}

impl<P: PwmTimer> TickHandle<P> {
    /// Run one sample tick.
    ///
    /// Bounded constant-time work; a no-op while no session is active.
    pub fn tick(&self) {
        let mut state = self.state.lock();
        let mut pwm = self.pwm.lock();
        state.tick(&mut *pwm);
        if !state.playing {
            self.busy.store(false, Ordering::Relaxed);
        }
    }

    /// Current output level: the duty register while the output stage is
    /// live, `None` while the pin is parked low.
    pub fn output_level(&self) -> Option<u8> {
        let pwm = self.pwm.lock();
        if pwm.is_output_enabled() {
            Some(pwm.duty())
        } else {
            None
        }
    }

    /// Lock-free busy check; see [`Sequencer::is_playing`].
    pub fn is_playing(&self) -> bool {
        self.busy.load(Ordering::Relaxed)
    }
}

/// Playback sequencer: the control-context half of the driver.
///
/// Only one session plays at a time; starting a new one while another is
/// active silently preempts it; no queueing, no rejection.
///
/// # Example
///
/// ```
/// use pcm8::{SampleBuffer, Sequencer, SoftPwm, SoftSampleTimer};
///
/// static BLIP: &[u8] = &[64, 128, 64];
///
/// let mut seq = Sequencer::new(SoftSampleTimer::new(), SoftPwm::new());
/// seq.start(SampleBuffer::new(BLIP), 8_000).unwrap();
///
/// let ticks = seq.tick_handle();
/// while seq.is_playing() {
///     ticks.tick();
/// }
/// ```
pub struct Sequencer<S: SampleTimer, P: PwmTimer> {
    state: Arc<Mutex<PlaybackState>>,
    busy: Arc<AtomicBool>,
    sample_timer: S,
    pwm: Arc<Mutex<P>>,
}

impl<S: SampleTimer, P: PwmTimer> Sequencer<S, P> {
    /// Wire a sequencer to its two timer peripherals.
    pub fn new(sample_timer: S, pwm: P) -> Self {
        Sequencer {
            state: Arc::new(Mutex::new(PlaybackState::default())),
            busy: Arc::new(AtomicBool::new(false)),
            sample_timer,
            pwm: Arc::new(Mutex::new(pwm)),
        }
    }

    /// Clone out the tick capability for the cadence source.
    pub fn tick_handle(&self) -> TickHandle<P> {
        TickHandle {
            state: Arc::clone(&self.state),
            pwm: Arc::clone(&self.pwm),
            busy: Arc::clone(&self.busy),
        }
    }

    /// Begin playing a single buffer at `sample_rate` Hz.
    ///
    /// Returns immediately; completion is asynchronous. An empty buffer is
    /// an inert no-op. Fails only on an unusable sample rate.
    pub fn start(&mut self, buffer: SampleBuffer, sample_rate: u32) -> Result<()> {
        if buffer.is_empty() {
            debug!("start: empty buffer, nothing to play");
            return Ok(());
        }
        self.begin(Playlist::new(), buffer, sample_rate)
    }

    /// Begin playing `segments` back-to-back as one logical sound.
    ///
    /// An empty slice is a no-op: no state change, no timer configuration.
    pub fn start_playlist(&mut self, segments: &[SampleBuffer], sample_rate: u32) -> Result<()> {
        let Some(first) = segments.first().copied() else {
            debug!("start_playlist: empty playlist, nothing to play");
            return Ok(());
        };
        self.begin(Playlist::from_segments(segments), first, sample_rate)
    }

    fn begin(&mut self, playlist: Playlist, first: SampleBuffer, sample_rate: u32) -> Result<()> {
        let period = sample_period(sample_rate)?;
        debug!(
            "starting playback: {} segment(s), {} Hz (timer period {})",
            playlist.len().max(1),
            sample_rate,
            period
        );

        {
            // Critical section: the handler must never see a torn update.
            let mut state = self.state.lock();
            state.playlist = playlist;
            state.playlist_pos = 0;
            state.buffer = first;
            state.offset = 0;
            state.last_sample = first.last_sample();
            state.playing = true;
        }
        self.busy.store(true, Ordering::Relaxed);

        // Prime the PWM stage with the opening sample, then let the
        // sample-rate timer start delivering ticks.
        self.pwm.lock().enable_output(first.sample(0));
        self.sample_timer.configure(period);
        self.sample_timer.set_interrupt_enabled(true);
        Ok(())
    }

    /// Request an immediate but click-free stop.
    ///
    /// Drops the playlist linkage and parks the offset at the end of the
    /// active buffer, so the next tick enters the ramp-down branch instead
    /// of emitting more program audio. The timers keep running; the
    /// handler rides the ramp to the terminal transition on its own.
    /// Silence arrives after at most 255 further ticks.
    pub fn stop(&self) {
        trace!("stop requested");
        let mut state = self.state.lock();
        state.clear_playlist();
        state.offset = state.buffer.len();
    }

    /// Reset playlist bookkeeping.
    ///
    /// The handler performs the same reset at the terminal transition;
    /// calling it from control context is an idempotent cleanup. During an
    /// active playlist it unhooks the remaining segments, so the current
    /// buffer plays out and ramps down as if it were the last one.
    pub fn finish(&self) {
        let mut state = self.state.lock();
        state.clear_playlist();
    }

    /// Whether the audio subsystem is busy.
    ///
    /// Stays true through the whole ramp-down, so a poller cannot tell
    /// program audio from the fade to silence. Use [`Sequencer::status`]
    /// when the distinction matters.
    pub fn is_playing(&self) -> bool {
        self.busy.load(Ordering::Relaxed)
    }

    /// Fine-grained status: idle, streaming or ramping down.
    pub fn status(&self) -> PlaybackStatus {
        self.state.lock().status()
    }

    /// Hard stop: disable the tick interrupt and the PWM output stage and
    /// reset all state.
    ///
    /// Unlike [`Sequencer::stop`] this skips the ramp-down, so it can
    /// click; it exists for teardown paths where the output must die now.
    pub fn shutdown(&mut self) {
        debug!("shutdown: silencing output");
        self.sample_timer.set_interrupt_enabled(false);
        {
            let mut state = self.state.lock();
            state.playing = false;
            state.offset = 0;
            state.clear_playlist();
        }
        self.busy.store(false, Ordering::Relaxed);
        self.pwm.lock().disable_output();
    }

    /// The sample timer peripheral, for wiring and diagnostics.
    pub fn sample_timer(&self) -> &S {
        &self.sample_timer
    }

    /// Shared handle to the PWM peripheral.
    pub fn pwm(&self) -> Arc<Mutex<P>> {
        Arc::clone(&self.pwm)
    }
}

impl<S: SampleTimer, P: PwmTimer> Drop for Sequencer<S, P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn sample_period(sample_rate: u32) -> Result<u32> {
    if sample_rate == 0 || sample_rate > PLATFORM_CLOCK_HZ {
        return Err(Pcm8Error::Config(format!(
            "unsupported sample rate: {sample_rate} Hz"
        )));
    }
    Ok(PLATFORM_CLOCK_HZ / sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::{SoftPwm, SoftSampleTimer};

    static TONE: &[u8] = &[50, 60, 70, 80];

    fn sequencer() -> Sequencer<SoftSampleTimer, SoftPwm> {
        Sequencer::new(SoftSampleTimer::new(), SoftPwm::recording())
    }

    #[test]
    fn test_start_configures_both_timers() {
        let mut seq = sequencer();
        seq.start(SampleBuffer::new(TONE), 8_000).unwrap();

        assert!(seq.is_playing());
        assert_eq!(seq.sample_timer().period(), PLATFORM_CLOCK_HZ / 8_000);
        assert!(seq.sample_timer().interrupt_enabled());

        let pwm = seq.pwm();
        let pwm = pwm.lock();
        assert!(pwm.is_output_enabled());
        assert_eq!(pwm.duty(), 50, "PWM primed with the opening sample");
    }

    #[test]
    fn test_unusable_sample_rates_are_config_errors() {
        let mut seq = sequencer();
        let buffer = SampleBuffer::new(TONE);

        assert!(matches!(seq.start(buffer, 0), Err(Pcm8Error::Config(_))));
        assert!(matches!(
            seq.start(buffer, PLATFORM_CLOCK_HZ + 1),
            Err(Pcm8Error::Config(_))
        ));
        assert!(!seq.is_playing());
    }

    #[test]
    fn test_empty_starts_are_inert() {
        let mut seq = sequencer();
        seq.start(SampleBuffer::default(), 8_000).unwrap();
        seq.start_playlist(&[], 8_000).unwrap();

        assert!(!seq.is_playing());
        assert_eq!(seq.status(), PlaybackStatus::Idle);
        assert_eq!(seq.sample_timer().configure_calls(), 0);
        assert!(!seq.pwm().lock().is_output_enabled());
    }

    #[test]
    fn test_stop_diverts_next_tick_into_ramp() {
        let mut seq = sequencer();
        seq.start(SampleBuffer::new(TONE), 8_000).unwrap();
        let ticks = seq.tick_handle();

        ticks.tick();
        ticks.tick(); // last emitted sample is 60
        seq.stop();

        ticks.tick();
        assert_eq!(
            ticks.output_level(),
            Some(59),
            "first post-stop tick must start the ramp below the last sample"
        );
        assert_eq!(seq.status(), PlaybackStatus::RampingDown);
    }

    #[test]
    fn test_shutdown_silences_immediately() {
        let mut seq = sequencer();
        seq.start(SampleBuffer::new(TONE), 8_000).unwrap();
        let ticks = seq.tick_handle();
        ticks.tick();

        seq.shutdown();
        assert!(!seq.is_playing());
        assert_eq!(seq.status(), PlaybackStatus::Idle);
        assert!(!seq.sample_timer().interrupt_enabled());
        assert_eq!(ticks.output_level(), None, "output stage must be off");

        // Further ticks are no-ops.
        let writes_before = seq.pwm().lock().writes().len();
        ticks.tick();
        assert_eq!(seq.pwm().lock().writes().len(), writes_before);
    }

    #[test]
    fn test_tick_handle_reports_busy_flag() {
        let mut seq = sequencer();
        seq.start(SampleBuffer::new(&[1]), 8_000).unwrap();
        let ticks = seq.tick_handle();
        assert!(ticks.is_playing());

        ticks.tick(); // the lone sample
        ticks.tick(); // ramp tick (last sample 1 -> one tick at zero)
        ticks.tick(); // terminal
        assert!(!ticks.is_playing());
        assert!(!seq.is_playing());
    }
}
