//! Interrupt-driven 8-bit PCM playback over PWM
//!
//! Sample-accurate playback of unsigned 8-bit PCM audio driven by two
//! timers: a sample-rate timer that advances through flash-resident
//! sample buffers, and a PWM timer that turns each byte into a duty-cycle
//! output. The heart of the crate is the per-tick state machine that
//! decides what to emit, when to hand off between playlist segments, and
//! when to run the click-free amplitude ramp-down that ends every
//! session.
//!
//! # Features
//! - Single-buffer and chained-playlist playback with gapless hand-off
//! - Linear ramp-down to zero at every stop, sized by the last emitted
//!   amplitude, so output never cuts off mid-swing
//! - Cooperative `stop()` plus an immediate `shutdown()` teardown
//! - Hardware timers behind a small trait contract, with software
//!   stand-ins for deterministic, tick-by-tick testing
//! - Real-time host playback and offline WAV rendering as opt-in extras
//!
//! # Crate feature flags
//! - `streaming` (opt-in): real-time audio output via rodio
//! - `export-wav` (opt-in): offline WAV rendering via hound
//!
//! # Quick start
//! ```
//! use pcm8::{SampleBuffer, Sequencer, SoftPwm, SoftSampleTimer};
//!
//! static CHIRP: &[u8] = &[10, 20, 30];
//!
//! let mut seq = Sequencer::new(SoftSampleTimer::new(), SoftPwm::new());
//! seq.start(SampleBuffer::new(CHIRP), 8_000).unwrap();
//!
//! // A real cadence source fires this once per sample period; tests and
//! // offline renderers just call it in a loop.
//! let ticks = seq.tick_handle();
//! while seq.is_playing() {
//!     ticks.tick();
//! }
//! ```
//!
//! ## Real-time playback
//! ```no_run
//! # #[cfg(feature = "streaming")]
//! # {
//! use pcm8::{AudioDevice, SampleBuffer, Sequencer, SoftPwm, SoftSampleTimer};
//!
//! static CHIRP: &[u8] = &[10, 20, 30];
//!
//! let mut seq = Sequencer::new(SoftSampleTimer::new(), SoftPwm::new());
//! let device = AudioDevice::new(8_000, seq.tick_handle()).unwrap();
//! seq.start(SampleBuffer::new(CHIRP), 8_000).unwrap();
//! while seq.is_playing() {
//!     std::thread::sleep(std::time::Duration::from_millis(10));
//! }
//! device.finish();
//! # }
//! ```

#![warn(missing_docs)]

pub mod buffer;
pub mod hw;
mod playback;
pub mod sequencer;

#[cfg(feature = "streaming")]
pub mod streaming; // Real-time audio output

#[cfg(feature = "export-wav")]
pub mod export; // Offline WAV rendering

/// Error types for playback driver operations
///
/// The tick path itself is infallible by design; errors only arise from
/// control-context configuration and from host-side audio/file I/O.
#[derive(thiserror::Error, Debug)]
pub enum Pcm8Error {
    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Pcm8Error {
    /// Converts a String into `Pcm8Error::Other`.
    ///
    /// Convenience for generic string errors; prefer the specific variant
    /// constructors (`Config`, `AudioDevice`) where the category is known.
    fn from(msg: String) -> Self {
        Pcm8Error::Other(msg)
    }
}

impl From<&str> for Pcm8Error {
    /// Converts a string slice into `Pcm8Error::Other`.
    fn from(msg: &str) -> Self {
        Pcm8Error::Other(msg.to_string())
    }
}

/// Result type for playback driver operations
pub type Result<T> = std::result::Result<T, Pcm8Error>;

// Public API exports
pub use buffer::{Playlist, SampleBuffer};
pub use hw::{PwmTimer, SampleTimer, SoftPwm, SoftSampleTimer, PLATFORM_CLOCK_HZ};
pub use playback::PlaybackStatus;
pub use sequencer::{Sequencer, TickHandle};

#[cfg(feature = "streaming")]
pub use streaming::{AudioDevice, PcmSource};

#[cfg(feature = "export-wav")]
pub use export::{export_to_wav, render_samples};
