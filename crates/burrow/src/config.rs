//! Codec configuration.

/// Default capacity of the per-channel output buffer (64 KB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Default number of items moved per step when a writer replays prior data.
pub const DEFAULT_REPLAY_CHUNK: usize = 4096;

/// Channel layout for variable-length values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarLenLayout {
    /// Length prefix and payload interleaved on one channel (default).
    #[default]
    Inline,
    /// Length prefixes on channel 0, payload bytes on channel 1.
    ///
    /// Prefixes compress better on their own, but a partially written page
    /// leaves two channels that must be recovered together.
    Split,
}

impl VarLenLayout {
    /// Number of channels a variable-length codec needs in this layout.
    pub fn channel_count(self) -> usize {
        match self {
            Self::Inline => 1,
            Self::Split => 2,
        }
    }
}

/// Configuration shared by all column codecs.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Capacity of the buffer between a writer and each of its channels.
    pub buffer_capacity: usize,
    /// Items decoded and re-encoded per step during a replay resume.
    pub replay_chunk: usize,
    /// Channel layout for variable-length values.
    pub varlen_layout: VarLenLayout,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            replay_chunk: DEFAULT_REPLAY_CHUNK,
            varlen_layout: VarLenLayout::default(),
        }
    }
}

impl CodecConfig {
    /// Creates a new codec configuration with custom settings.
    pub fn new(buffer_capacity: usize, replay_chunk: usize, varlen_layout: VarLenLayout) -> Self {
        Self {
            buffer_capacity,
            replay_chunk,
            varlen_layout,
        }
    }

    /// Returns a copy of this configuration with a different output buffer capacity.
    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity.max(1);
        self
    }

    /// Returns a copy of this configuration with a different replay chunk size.
    pub fn with_replay_chunk(mut self, replay_chunk: usize) -> Self {
        self.replay_chunk = replay_chunk.max(1);
        self
    }

    /// Returns a copy of this configuration with a different variable-length layout.
    pub fn with_varlen_layout(mut self, varlen_layout: VarLenLayout) -> Self {
        self.varlen_layout = varlen_layout;
        self
    }
}
