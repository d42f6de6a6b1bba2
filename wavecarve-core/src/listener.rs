//! Listener for observing the transcoding pipeline.
//!
//! Emits lightweight events at each stage, enough for progress bars and
//! debugging without copying sample or pixel buffers.

/// Which half of the transcoder an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encode,
    Decode,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Encode => write!(f, "encode"),
            Direction::Decode => write!(f, "decode"),
        }
    }
}

/// Events emitted while encoding, resizing and decoding.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A pass over `total_frames` frames is about to start.
    Started {
        direction: Direction,
        total_frames: usize,
    },

    /// One frame/column finished. Frames may complete out of order when
    /// processed in parallel.
    FrameDone { direction: Direction },

    /// The pass finished; the metadata header has been written or read.
    Finished {
        direction: Direction,
        sample_count: usize,
    },

    /// Width resize is about to start.
    ResizeStarted { from_width: u32, to_width: u32 },

    /// A single seam was removed or inserted by the seam carver.
    SeamDone { index: usize, total: usize },

    /// Width resize finished.
    ResizeFinished { width: u32 },
}

/// Trait for observing the pipeline. Implement this for progress UI, debugging, etc.
///
/// `Sync` because frame workers report concurrently.
pub trait PipelineListener: Sync {
    fn on_event(&self, event: PipelineEvent);
}

impl<T: PipelineListener + ?Sized> PipelineListener for &T {
    fn on_event(&self, event: PipelineEvent) {
        (**self).on_event(event)
    }
}

/// No-op listener, compiles to nothing when monomorphized.
pub struct NoOpListener;

impl PipelineListener for NoOpListener {
    #[inline(always)]
    fn on_event(&self, _event: PipelineEvent) {}
}

/// Debug listener, forwards stage boundaries to `tracing` at debug level.
///
/// Per-frame and per-seam events are traced at `trace` level.
pub struct DebugListener;

impl PipelineListener for DebugListener {
    fn on_event(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::Started {
                direction,
                total_frames,
            } => {
                tracing::debug!(%direction, total_frames, "pass started");
            }
            PipelineEvent::FrameDone { direction } => {
                tracing::trace!(%direction, "frame done");
            }
            PipelineEvent::Finished {
                direction,
                sample_count,
            } => {
                tracing::debug!(%direction, sample_count, "pass finished");
            }
            PipelineEvent::ResizeStarted {
                from_width,
                to_width,
            } => {
                tracing::debug!(from_width, to_width, "resize started");
            }
            PipelineEvent::SeamDone { index, total } => {
                tracing::trace!("seam {}/{}", index + 1, total);
            }
            PipelineEvent::ResizeFinished { width } => {
                tracing::debug!(width, "resize finished");
            }
        }
    }
}
