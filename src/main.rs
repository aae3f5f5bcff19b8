#[cfg(not(feature = "streaming"))]
fn main() {
    eprintln!(
        "The pcm8 CLI requires the \"streaming\" feature. Rebuild with `--features streaming` to enable playback."
    );
}

#[cfg(feature = "streaming")]
fn main() -> anyhow::Result<()> {
    cli::run()
}

#[cfg(feature = "streaming")]
mod cli {
    use std::env;
    use std::fs;
    use std::path::Path;
    use std::thread;
    use std::time::Duration;

    use anyhow::{bail, Context};
    use serde::Deserialize;

    use pcm8::streaming::DEFAULT_SAMPLE_RATE;
    use pcm8::{AudioDevice, Playlist, SampleBuffer, Sequencer, SoftPwm, SoftSampleTimer};

    const POLL_INTERVAL_MS: u64 = 20;

    /// Playlist manifest: raw PCM segment files played back-to-back.
    #[derive(Deserialize)]
    struct Manifest {
        sample_rate: u32,
        segments: Vec<String>,
    }

    fn usage() {
        eprintln!("Usage: pcm8 <sound.raw>... [--rate HZ]");
        eprintln!("       pcm8 --manifest <playlist.json>");
        eprintln!();
        eprintln!("Plays headerless unsigned 8-bit PCM files back-to-back as one sound.");
        eprintln!("Default rate is {} Hz.", DEFAULT_SAMPLE_RATE);
    }

    /// Load a raw sample file into permanent storage.
    ///
    /// The driver's buffer descriptors point into storage that is never
    /// freed (flash, on the embedded target); a one-shot CLI gets the
    /// same guarantee by leaking the allocation.
    fn load_segment(path: &Path) -> anyhow::Result<SampleBuffer> {
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        if data.is_empty() {
            bail!("{} contains no samples", path.display());
        }
        Ok(SampleBuffer::new(Box::leak(data.into_boxed_slice())))
    }

    fn parse_args(args: &[String]) -> anyhow::Result<(Vec<SampleBuffer>, u32)> {
        if let [flag, manifest_path] = args {
            if flag == "--manifest" {
                let text = fs::read_to_string(manifest_path)
                    .with_context(|| format!("reading {manifest_path}"))?;
                let manifest: Manifest =
                    serde_json::from_str(&text).with_context(|| format!("parsing {manifest_path}"))?;
                let segments = manifest
                    .segments
                    .iter()
                    .map(|p| load_segment(Path::new(p)))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                return Ok((segments, manifest.sample_rate));
            }
        }

        let mut rate = DEFAULT_SAMPLE_RATE;
        let mut segments = Vec::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if arg == "--rate" {
                let value = iter.next().context("--rate needs a value")?;
                rate = value
                    .parse()
                    .with_context(|| format!("invalid sample rate {value:?}"))?;
            } else if arg.starts_with("--") {
                bail!("unknown option {arg}");
            } else {
                segments.push(load_segment(Path::new(arg))?);
            }
        }
        Ok((segments, rate))
    }

    pub fn run() -> anyhow::Result<()> {
        let args: Vec<String> = env::args().skip(1).collect();
        if args.is_empty() {
            usage();
            return Ok(());
        }

        let (segments, sample_rate) = parse_args(&args)?;
        if segments.is_empty() {
            bail!("no sample files given");
        }

        let playlist = Playlist::from_segments(&segments);
        println!(
            "Playing {} segment(s), {} samples at {} Hz",
            playlist.len(),
            playlist.total_samples(),
            sample_rate
        );

        let mut seq = Sequencer::new(SoftSampleTimer::new(), SoftPwm::new());
        let device = AudioDevice::new(sample_rate, seq.tick_handle())?;
        seq.start_playlist(&segments, sample_rate)?;

        while seq.is_playing() {
            thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
        }

        device.finish();
        device.wait_for_finish();
        println!("Done.");
        Ok(())
    }
}
