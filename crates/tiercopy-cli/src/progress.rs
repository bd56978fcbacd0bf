//! Terminal progress rendering for a running job

use indicatif::{ProgressBar, ProgressStyle};
use tiercopy_types::{format_bytes, ProgressSnapshot};

/// Renders [`ProgressSnapshot`]s onto an indicatif bar
pub struct ProgressRenderer {
    progress_bar: ProgressBar,
    show_current_file: bool,
}

impl ProgressRenderer {
    /// Create a renderer; a hidden one draws nothing
    pub fn new(hidden: bool, show_current_file: bool) -> Self {
        let progress_bar = if hidden {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(1000);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{wide_bar:.cyan/blue}] {percent:>3}% {msg}")
            {
                pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
            }
            pb
        };

        Self {
            progress_bar,
            show_current_file,
        }
    }

    /// Draw one sample
    pub fn update(&self, snapshot: &ProgressSnapshot) {
        self.progress_bar
            .set_position((snapshot.percent() * 10.0).round() as u64);
        self.progress_bar
            .set_message(status_line(snapshot, self.show_current_file));
    }

    /// Leave the final state on screen
    pub fn finish(&self, snapshot: &ProgressSnapshot) {
        self.update(snapshot);
        self.progress_bar.abandon();
    }
}

/// One-line summary of a sample: rate, ETA, file counts and status
pub fn status_line(snapshot: &ProgressSnapshot, show_current_file: bool) -> String {
    let mut line = format!(
        "{:.2} MB/s  ETA {}  {}/{} files  {}/{}  {}",
        snapshot.throughput_mib_per_sec(),
        snapshot.eta_display(),
        snapshot.files_completed,
        snapshot.files_total,
        format_bytes(snapshot.copied_bytes),
        format_bytes(snapshot.total_bytes),
        snapshot.status_text
    );
    if show_current_file {
        if let Some(current) = &snapshot.current_file {
            line.push_str("  [");
            line.push_str(current);
            line.push(']');
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tiercopy_types::JobStatus;

    fn snapshot(current_file: Option<&str>) -> ProgressSnapshot {
        ProgressSnapshot {
            copied_bytes: 1024 * 1024,
            total_bytes: 4 * 1024 * 1024,
            files_completed: 1,
            files_total: 4,
            elapsed: Duration::from_secs(1),
            current_file: current_file.map(str::to_string),
            status: JobStatus::Running,
            status_text: "Copying 4 files...".to_string(),
        }
    }

    #[test]
    fn test_status_line() {
        let line = status_line(&snapshot(Some("b.bin")), true);
        assert!(line.starts_with("1.00 MB/s  ETA 3s  1/4 files"));
        assert!(line.contains("Copying 4 files..."));
        assert!(line.ends_with("[b.bin]"));
    }

    #[test]
    fn test_status_line_hides_current_file() {
        let line = status_line(&snapshot(Some("b.bin")), false);
        assert!(!line.contains("b.bin"));
    }

    #[test]
    fn test_hidden_renderer_accepts_updates() {
        let renderer = ProgressRenderer::new(true, true);
        renderer.update(&snapshot(None));
        renderer.finish(&snapshot(None));
    }
}
