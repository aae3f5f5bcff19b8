//! WAV file export functionality

use std::path::Path;

use crate::buffer::SampleBuffer;
use crate::Result;

use super::render_samples;

/// Export a playback session to a WAV file.
///
/// Renders `segments` (terminal ramp included) and writes the result as
/// mono 16-bit PCM at `sample_rate`.
///
/// # Examples
///
/// ```no_run
/// use pcm8::{export_to_wav, SampleBuffer};
///
/// static CHIRP: &[u8] = &[10, 20, 30];
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// export_to_wav(&[SampleBuffer::new(CHIRP)], 8_000, "chirp.wav")?;
/// # Ok(())
/// # }
/// ```
pub fn export_to_wav<P: AsRef<Path>>(
    segments: &[SampleBuffer],
    sample_rate: u32,
    output_path: P,
) -> Result<()> {
    let rendered = render_samples(segments, sample_rate)?;
    write_wav_file(output_path.as_ref(), &rendered, sample_rate)
}

/// Write duty samples to a WAV file
fn write_wav_file(path: &Path, samples: &[u8], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| format!("Failed to create WAV file: {}", e))?;

    // Centre the unsigned duty value around zero at full 16-bit scale.
    for &duty in samples {
        let sample_i16 = ((duty as i16) - 128) << 8;
        writer
            .write_sample(sample_i16)
            .map_err(|e| format!("Failed to write sample: {}", e))?;
    }

    writer
        .finalize()
        .map_err(|e| format!("Failed to finalize WAV file: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_writes_expected_frames() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("blip.wav");

        let segments = [SampleBuffer::new(&[10, 20, 30])];
        export_to_wav(&segments, 8_000, &path).expect("export WAV");

        let reader = hound::WavReader::open(&path).expect("reopen WAV");
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 8_000);
        assert_eq!(spec.bits_per_sample, 16);

        let frames: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(frames.len(), 3 + 30, "program samples plus ramp ticks");
        assert_eq!(frames[0], (10i16 - 128) << 8);
        assert_eq!(
            *frames.last().unwrap(),
            (0i16 - 128) << 8,
            "ramp must land on duty zero"
        );
    }
}
