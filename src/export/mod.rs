//! Offline rendering (feature `export-wav`).
//!
//! Renders a playback session tick-by-tick through the software timers,
//! ramp-down included, so the exact duty sequence a real pin would see
//! can be inspected or written out as a WAV file.

mod wav;

pub use wav::export_to_wav;

use crate::buffer::SampleBuffer;
use crate::hw::{SoftPwm, SoftSampleTimer};
use crate::sequencer::Sequencer;
use crate::Result;

/// Render `segments` to the duty sequence a playback session produces.
///
/// Returns one byte per emitting tick: every program sample in order,
/// followed by the terminal ramp counting down to zero. The render is
/// bounded by construction (total program samples plus at most 255 ramp
/// ticks), so this always terminates.
///
/// # Example
///
/// ```
/// use pcm8::{render_samples, SampleBuffer};
///
/// static CHIRP: &[u8] = &[10, 20, 30];
///
/// let rendered = render_samples(&[SampleBuffer::new(CHIRP)], 8_000).unwrap();
/// assert_eq!(rendered.len(), 3 + 30);
/// assert_eq!(&rendered[..3], CHIRP);
/// assert_eq!(*rendered.last().unwrap(), 0);
/// ```
pub fn render_samples(segments: &[SampleBuffer], sample_rate: u32) -> Result<Vec<u8>> {
    let total: usize = segments.iter().map(|s| s.len()).sum();
    let mut rendered = Vec::with_capacity(total + usize::from(u8::MAX));

    let mut seq = Sequencer::new(SoftSampleTimer::new(), SoftPwm::new());
    seq.start_playlist(segments, sample_rate)?;

    let ticks = seq.tick_handle();
    while seq.is_playing() {
        ticks.tick();
        if !seq.is_playing() {
            // Terminal transition: this tick emitted nothing.
            break;
        }
        if let Some(duty) = ticks.output_level() {
            rendered.push(duty);
        }
    }
    Ok(rendered)
}
