//! Playback state and the per-tick state machine.
//!
//! [`PlaybackState`] is the one record shared between control-context
//! operations and the tick handler. [`PlaybackState::tick`] is the handler
//! itself: called once per sample period from whatever cadence source
//! drives playback, it emits the next duty value, hands off between
//! playlist segments, runs the terminal ramp-down and finally goes idle.
//!
//! The tick path does bounded constant-time work: no allocation, no
//! blocking, no I/O beyond one duty-register write. At 8 kHz it has 125 µs
//! per invocation and uses a vanishing fraction of that.

use crate::buffer::{Playlist, SampleBuffer};
use crate::hw::PwmTimer;

/// Fine-grained playback status.
///
/// `is_playing` deliberately reports "busy" through the whole ramp-down,
/// so a caller polling it cannot tell program audio from the fade to
/// silence. This enum is the finer query for callers that care; the
/// coarse flag keeps its historical meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// No session active.
    #[default]
    Idle,
    /// Emitting samples from the active buffer or a successor segment.
    Streaming,
    /// Past the last segment, fading the duty cycle to zero.
    RampingDown,
}

/// Shared playback state.
///
/// Mutated exclusively by the tick handler once a session runs, except
/// for the multi-field resets the sequencer performs inside its critical
/// section and the `offset = length` write that implements `stop`.
#[derive(Debug, Default)]
pub(crate) struct PlaybackState {
    /// True while the handler still has work to do, ramp-down included.
    pub(crate) playing: bool,
    /// The buffer currently being read.
    pub(crate) buffer: SampleBuffer,
    /// Index of the next sample to emit; keeps climbing past the buffer
    /// length while the ramp-down runs.
    pub(crate) offset: usize,
    /// Amplitude of the last real sample that went out. Seeds the ramp.
    pub(crate) last_sample: u8,
    /// Remaining chain of segments; position 0 is the buffer that the
    /// session started with.
    pub(crate) playlist: Playlist,
    pub(crate) playlist_pos: usize,
}

impl PlaybackState {
    /// Advance playback by one sample period.
    pub(crate) fn tick<P: PwmTimer>(&mut self, pwm: &mut P) {
        if !self.playing {
            return;
        }

        // Streaming: emit the next byte of the active buffer.
        if self.offset < self.buffer.len() {
            let sample = self.buffer.sample(self.offset);
            pwm.set_duty(sample);
            self.last_sample = sample;
            self.offset += 1;
            return;
        }

        // End of the active buffer. Seamless hand-off comes first: the
        // next segment's opening sample goes out on this very tick.
        if let Some(next) = self.playlist.get(self.playlist_pos + 1) {
            self.playlist_pos += 1;
            self.buffer = next;
            let sample = next.sample(0);
            pwm.set_duty(sample);
            self.last_sample = sample;
            self.offset = 1;
            return;
        }

        let ramp_end = self.buffer.len() + usize::from(self.last_sample);
        if self.offset >= ramp_end {
            // Ramp complete. Going idle here is what ultimately quiets the
            // tick interrupt; the playlist linkage is dropped so a later
            // session starts from a clean slate.
            self.playing = false;
            self.clear_playlist();
            return;
        }

        // Ramp-down: one step closer to zero per tick. `playing` stays set
        // so the interrupt keeps delivering the remaining ramp ticks.
        self.offset += 1;
        pwm.set_duty((ramp_end - self.offset) as u8);
    }

    /// Drop the playlist linkage and reset its bookkeeping.
    ///
    /// Runs at the terminal transition and on an external `finish`; safe
    /// to call any number of times.
    pub(crate) fn clear_playlist(&mut self) {
        self.playlist.clear();
        self.playlist_pos = 0;
    }

    pub(crate) fn status(&self) -> PlaybackStatus {
        if !self.playing {
            PlaybackStatus::Idle
        } else if self.offset >= self.buffer.len()
            && self.playlist.get(self.playlist_pos + 1).is_none()
        {
            PlaybackStatus::RampingDown
        } else {
            PlaybackStatus::Streaming
        }
    }
}
