//! Audio device integration using rodio
//!
//! Plays the PWM output in real time by driving the tick state machine
//! from the playback stream itself.

use crate::hw::PwmTimer;
use crate::sequencer::TickHandle;
use crate::{Pcm8Error, Result};
use rodio::{OutputStream, Sink, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Audio source that acts as the sample-rate tick source.
///
/// Each pulled frame fires one tick and converts the resulting duty value
/// to a centered float: duty 0 maps to -1.0 (pin low), duty 255 to just
/// under +1.0. While the output stage is disabled the pin sits low, so
/// the source keeps emitting -1.0 rather than ending the stream; that
/// keeps the sink alive across consecutive playback sessions.
pub struct PcmSource<P: PwmTimer> {
    ticks: TickHandle<P>,
    sample_rate: u32,
    finished: Arc<AtomicBool>,
}

impl<P: PwmTimer> PcmSource<P> {
    /// Create a source that drives `ticks` at `sample_rate` Hz.
    ///
    /// `sample_rate` must match the rate passed to the sequencer's
    /// `start*` call, because one pulled frame equals one tick.
    pub fn new(ticks: TickHandle<P>, sample_rate: u32, finished: Arc<AtomicBool>) -> Self {
        PcmSource {
            ticks,
            sample_rate,
            finished,
        }
    }
}

impl<P: PwmTimer> Iterator for PcmSource<P> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.finished.load(Ordering::Relaxed) {
            return None;
        }

        self.ticks.tick();
        Some(match self.ticks.output_level() {
            Some(duty) => (duty as f32 / 255.0) * 2.0 - 1.0,
            None => -1.0,
        })
    }
}

impl<P: PwmTimer> Source for PcmSource<P> {
    fn current_frame_len(&self) -> Option<usize> {
        // Mono at a fixed rate: the stream parameters never change.
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Audio playback device using rodio
pub struct AudioDevice {
    _stream: OutputStream,
    sink: Sink,
    running: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl AudioDevice {
    /// Create a new audio device and start pulling ticks.
    ///
    /// # Arguments
    /// * `sample_rate` - Playback rate in Hz; must match the sequencer's
    ///   `start*` rate
    /// * `ticks` - Tick capability cloned off the sequencer
    pub fn new<P: PwmTimer + 'static>(sample_rate: u32, ticks: TickHandle<P>) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| Pcm8Error::AudioDevice(format!("failed to create audio stream: {e}")))?;

        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| Pcm8Error::AudioDevice(format!("failed to create audio sink: {e}")))?;

        let finished = Arc::new(AtomicBool::new(false));
        let source = PcmSource::new(ticks, sample_rate, Arc::clone(&finished));
        sink.append(source);

        Ok(AudioDevice {
            _stream: stream,
            sink,
            running: Arc::new(AtomicBool::new(true)),
            finished,
        })
    }

    /// Pause the output stream.
    pub fn pause(&self) {
        self.sink.pause();
    }

    /// Resume the output stream.
    pub fn play(&self) {
        self.sink.play();
    }

    /// Check if the device is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Signal that no further sessions will be played.
    ///
    /// The source terminates at the next pulled frame instead of feeding
    /// silence forever; pair with [`AudioDevice::wait_for_finish`].
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }

    /// Block until the sink has drained.
    pub fn wait_for_finish(&self) {
        self.sink.sleep_until_end();
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.pause();
        self.running.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SampleBuffer;
    use crate::hw::{SoftPwm, SoftSampleTimer};
    use crate::sequencer::Sequencer;
    use approx::assert_relative_eq;

    static RISER: &[u8] = &[0, 128, 255];

    fn try_audio_device(sample_rate: u32) -> Option<(AudioDevice, Sequencer<SoftSampleTimer, SoftPwm>)> {
        let seq = Sequencer::new(SoftSampleTimer::new(), SoftPwm::new());
        match AudioDevice::new(sample_rate, seq.tick_handle()) {
            Ok(device) => Some((device, seq)),
            Err(err) => {
                eprintln!(
                    "Skipping streaming::audio_device test (audio backend unavailable): {}",
                    err
                );
                None
            }
        }
    }

    #[test]
    fn test_source_centers_duty_values() {
        let mut seq = Sequencer::new(SoftSampleTimer::new(), SoftPwm::new());
        seq.start(SampleBuffer::new(RISER), 8_000).unwrap();

        let finished = Arc::new(AtomicBool::new(false));
        let mut source = PcmSource::new(seq.tick_handle(), 8_000, Arc::clone(&finished));

        assert_relative_eq!(source.next().unwrap(), -1.0);
        assert_relative_eq!(source.next().unwrap(), 128.0 / 255.0 * 2.0 - 1.0);
        assert_relative_eq!(source.next().unwrap(), 1.0);
    }

    #[test]
    fn test_source_reports_stream_parameters() {
        let seq = Sequencer::new(SoftSampleTimer::new(), SoftPwm::new());
        let finished = Arc::new(AtomicBool::new(false));
        let source = PcmSource::new(seq.tick_handle(), 11_025, finished);

        assert_eq!(source.channels(), 1);
        assert_eq!(source.sample_rate(), 11_025);
        assert_eq!(source.current_frame_len(), None);
        assert_eq!(source.total_duration(), None);
    }

    #[test]
    fn test_source_emits_pin_low_while_idle() {
        let seq = Sequencer::new(SoftSampleTimer::new(), SoftPwm::new());
        let finished = Arc::new(AtomicBool::new(false));
        let mut source = PcmSource::new(seq.tick_handle(), 8_000, finished);

        // Nothing started: the output stage is off and the pin sits low.
        for _ in 0..4 {
            assert_relative_eq!(source.next().unwrap(), -1.0);
        }
    }

    #[test]
    fn test_finished_signal_ends_the_stream() {
        let seq = Sequencer::new(SoftSampleTimer::new(), SoftPwm::new());
        let finished = Arc::new(AtomicBool::new(false));
        let mut source = PcmSource::new(seq.tick_handle(), 8_000, Arc::clone(&finished));

        assert!(source.next().is_some());
        finished.store(true, Ordering::Relaxed);
        assert_eq!(source.next(), None, "source must end after finish()");
    }

    #[test]
    fn test_audio_device_creation() {
        let Some((device, _seq)) = try_audio_device(8_000) else {
            return;
        };
        assert!(device.is_running());
    }

    #[test]
    fn test_audio_device_finish_signal() {
        let Some((device, _seq)) = try_audio_device(8_000) else {
            return;
        };
        device.finish();
        device.wait_for_finish();
    }
}
