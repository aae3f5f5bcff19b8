//! Sample buffer descriptors and playlists.
//!
//! A [`SampleBuffer`] describes one contiguous block of unsigned 8-bit
//! amplitude values living in immutable storage, and a [`Playlist`] chains
//! several of those blocks so that they play back-to-back as one logical
//! sound. Chaining exists because the historical target platform could not
//! address a single block larger than ~32 KiB; the per-segment ceiling is
//! gone here, the seamless concatenation semantics remain.

/// Descriptor for one contiguous block of unsigned 8-bit samples.
///
/// The descriptor is a base-plus-length view of sample data that lives in
/// permanent read-only storage and is never freed; the `&'static` lifetime
/// encodes that invariant. Typical sources are `include_bytes!` data baked
/// into the binary, or a leaked allocation for data loaded at runtime.
///
/// Copying a `SampleBuffer` copies the view, never the samples.
///
/// # Example
///
/// ```
/// use pcm8::SampleBuffer;
///
/// static CHIRP: &[u8] = &[10, 20, 30];
///
/// let buffer = SampleBuffer::new(CHIRP);
/// assert_eq!(buffer.len(), 3);
/// assert_eq!(buffer.last_sample(), 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleBuffer {
    data: &'static [u8],
}

impl SampleBuffer {
    /// Wrap a block of samples in a descriptor.
    pub const fn new(data: &'static [u8]) -> Self {
        SampleBuffer { data }
    }

    /// Number of samples in the block.
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` for a zero-length block.
    ///
    /// Empty buffers are never played; starting one is an inert no-op.
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `index`, or 0 when `index` is out of range.
    ///
    /// The tick handler runs where nothing can unwind, so out-of-range
    /// reads degrade to silence instead of panicking.
    pub fn sample(&self, index: usize) -> u8 {
        self.data.get(index).copied().unwrap_or(0)
    }

    /// Final sample of the block, or 0 when the block is empty.
    ///
    /// This value seeds the ramp-down amplitude when playback stops before
    /// the first tick has emitted anything.
    pub fn last_sample(&self) -> u8 {
        self.data.last().copied().unwrap_or(0)
    }

    /// The underlying sample bytes.
    pub const fn as_bytes(&self) -> &'static [u8] {
        self.data
    }
}

/// Ordered sequence of sample buffers played to completion, in order, as
/// one logical sound.
///
/// Only the final segment is followed by a ramp-down; segment boundaries
/// inside the playlist hand off without a gap.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    segments: Vec<SampleBuffer>,
}

impl Playlist {
    /// Create an empty playlist.
    pub const fn new() -> Self {
        Playlist {
            segments: Vec::new(),
        }
    }

    /// Build a playlist from a slice of segment descriptors.
    pub fn from_segments(segments: &[SampleBuffer]) -> Self {
        Playlist {
            segments: segments.to_vec(),
        }
    }

    /// Append a segment.
    pub fn push(&mut self, segment: SampleBuffer) {
        self.segments.push(segment);
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` when the playlist has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment at `index`, if any.
    pub fn get(&self, index: usize) -> Option<SampleBuffer> {
        self.segments.get(index).copied()
    }

    /// Drop all segments.
    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Total sample count across all segments (excluding any ramp-down).
    pub fn total_samples(&self) -> usize {
        self.segments.iter().map(|s| s.len()).sum()
    }

    /// Iterate over the segments.
    pub fn iter(&self) -> impl Iterator<Item = &SampleBuffer> {
        self.segments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SAMPLES: &[u8] = &[1, 2, 3, 250];

    #[test]
    fn test_buffer_accessors() {
        let buffer = SampleBuffer::new(SAMPLES);
        assert_eq!(buffer.len(), 4);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.sample(0), 1);
        assert_eq!(buffer.sample(3), 250);
        assert_eq!(buffer.last_sample(), 250);
        assert_eq!(buffer.as_bytes(), SAMPLES);
    }

    #[test]
    fn test_out_of_range_reads_are_silent() {
        let buffer = SampleBuffer::new(SAMPLES);
        assert_eq!(buffer.sample(4), 0, "past-the-end read should yield 0");

        let empty = SampleBuffer::default();
        assert!(empty.is_empty());
        assert_eq!(empty.sample(0), 0);
        assert_eq!(empty.last_sample(), 0);
    }

    #[test]
    fn test_playlist_ordering_and_totals() {
        let mut playlist = Playlist::new();
        assert!(playlist.is_empty());
        assert_eq!(playlist.total_samples(), 0);

        playlist.push(SampleBuffer::new(&[5, 5]));
        playlist.push(SampleBuffer::new(&[9]));
        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist.total_samples(), 3);
        assert_eq!(playlist.get(1).unwrap().sample(0), 9);
        assert!(playlist.get(2).is_none());

        playlist.clear();
        assert!(playlist.is_empty());
    }

    #[test]
    fn test_from_segments_copies_descriptors() {
        let segments = [SampleBuffer::new(&[1]), SampleBuffer::new(&[2, 3])];
        let playlist = Playlist::from_segments(&segments);
        assert_eq!(playlist.len(), 2);
        let lengths: Vec<usize> = playlist.iter().map(|s| s.len()).collect();
        assert_eq!(lengths, vec![1, 2]);
    }
}
