use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use wavecarve_core::{PipelineEvent, PipelineListener};

/// CLI progress bar for encode, decode and seam-carving passes.
///
/// A fresh bar is started for each pass, so one listener can follow a whole
/// pipeline run.
pub struct CliListener {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliListener {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn start(&self, label: &str, len: u64) {
        let pb = ProgressBar::new(len);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {msg:<9} [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message(label.to_string());
        if let Ok(mut bar) = self.bar.lock() {
            *bar = Some(pb);
        }
    }

    fn inc(&self) {
        if let Ok(bar) = self.bar.lock() {
            if let Some(pb) = bar.as_ref() {
                pb.inc(1);
            }
        }
    }

    fn finish(&self) {
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(pb) = bar.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl PipelineListener for CliListener {
    fn on_event(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::Started {
                direction,
                total_frames,
            } => self.start(&direction.to_string(), total_frames as u64),
            PipelineEvent::ResizeStarted {
                from_width,
                to_width,
            } => self.start("carve", from_width.abs_diff(to_width) as u64),
            PipelineEvent::FrameDone { .. } | PipelineEvent::SeamDone { .. } => self.inc(),
            PipelineEvent::Finished { .. } | PipelineEvent::ResizeFinished { .. } => {
                self.finish()
            }
        }
    }
}
