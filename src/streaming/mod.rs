//! Real-time audio output (feature `streaming`).
//!
//! On real hardware two timer peripherals drive playback. On a host the
//! OS audio callback stands in for both of them: every frame the sink
//! pulls from [`PcmSource`] fires exactly one sample tick and then
//! samples the PWM duty register, so the configured sink rate *is* the
//! sample rate. The PWM stage collapses to its register value; the
//! high-frequency carrier is what a real pin needs, not a sound card.

mod audio_device;

pub use audio_device::{AudioDevice, PcmSource};

/// Default output sample rate for host playback, matching the historical
/// 8 kHz material this driver was built around.
pub const DEFAULT_SAMPLE_RATE: u32 = 8_000;
