use indicatif::{ProgressBar, ProgressStyle};
use sonogram_core::listener::{BlockEvent, BlockListener};

/// CLI progress bar, one tick per spectrogram row.
pub struct ProgressListener {
    pb: ProgressBar,
}

impl ProgressListener {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} Running FFTs [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        Self { pb }
    }
}

impl BlockListener for ProgressListener {
    fn on_event(&mut self, event: BlockEvent) {
        match event {
            BlockEvent::Started { rows, .. } => self.pb.set_length(rows as u64),
            BlockEvent::BlockDone { .. } => self.pb.inc(1),
            BlockEvent::ShortBlock { .. } => {}
            BlockEvent::Finished { .. } => self.pb.finish_and_clear(),
        }
    }
}

impl Default for ProgressListener {
    fn default() -> Self {
        Self::new()
    }
}
