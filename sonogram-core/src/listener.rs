/// Listener for observing the block loop.
///
/// Emits lightweight events as blocks are consumed, enough for progress
/// indicators and debugging without copying any magnitude rows.

/// Events emitted while the spectrogram is being accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockEvent {
    /// Matrix allocated and transform planned; no block read yet.
    Started {
        rows: usize,
        columns: usize,
        block_length: usize,
    },

    /// A row was written.
    BlockDone { row: usize, rows: usize, frames: usize },

    /// The reader returned fewer frames than requested; this is the last block.
    ShortBlock { frames: usize, full_blocks: usize },

    /// The stream is exhausted.
    Finished { rows_written: usize },
}

/// Trait for observing the block loop. Implement this for UI, debugging, etc.
pub trait BlockListener {
    /// Called at each checkpoint. The event describes what just happened.
    fn on_event(&mut self, event: BlockEvent);
}

impl<L: BlockListener + ?Sized> BlockListener for &mut L {
    fn on_event(&mut self, event: BlockEvent) {
        (**self).on_event(event)
    }
}

/// No-op listener.
pub struct NoOpListener;

impl BlockListener for NoOpListener {
    #[inline(always)]
    fn on_event(&mut self, _event: BlockEvent) {}
}

/// Debug listener: logs every event through `log`.
pub struct DebugListener;

impl BlockListener for DebugListener {
    fn on_event(&mut self, event: BlockEvent) {
        match event {
            BlockEvent::Started {
                rows,
                columns,
                block_length,
            } => {
                log::debug!("[block] start  {rows} rows x {columns} bins, {block_length}-frame blocks");
            }
            BlockEvent::BlockDone { row, rows, frames } => {
                log::debug!("[block] row {}/{rows}  {frames} frames", row + 1);
            }
            BlockEvent::ShortBlock { frames, full_blocks } => {
                log::debug!("[block] short read of {frames} frames after {full_blocks} full blocks");
            }
            BlockEvent::Finished { rows_written } => {
                log::debug!("[block] done  {rows_written} rows written");
            }
        }
    }
}

/// Listener that records every event; handy in tests.
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub events: Vec<BlockEvent>,
}

impl BlockListener for RecordingListener {
    fn on_event(&mut self, event: BlockEvent) {
        self.events.push(event);
    }
}
