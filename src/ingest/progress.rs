// file: src/ingest/progress.rs
// description: progress tracking and statistics reporting for corpus ingestion
// reference: uses indicatif for progress bars and tracks processing metrics

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub files_found: usize,
    pub files_indexed: usize,
    pub files_unchanged: usize,
    pub files_failed: usize,
    pub total_bytes_processed: u64,
    pub duration_secs: f64,
}

impl IngestStats {
    pub fn files_per_second(&self) -> f64 {
        if self.duration_secs <= 0.0 {
            return 0.0;
        }
        self.files_indexed as f64 / self.duration_secs
    }

    pub fn success_rate(&self) -> f64 {
        let attempted = self.files_indexed + self.files_failed;
        if attempted == 0 {
            return 0.0;
        }
        (self.files_indexed as f64 / attempted as f64) * 100.0
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    files_found: usize,
    files_indexed: AtomicUsize,
    files_unchanged: AtomicUsize,
    files_failed: AtomicUsize,
    bytes_processed: AtomicU64,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_files: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();
        Self::build(&multi_progress, total_files, colored)
    }

    /// Tracker that counts without drawing.
    pub fn hidden(total_files: usize) -> Self {
        let multi_progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        Self::build(&multi_progress, total_files, false)
    }

    fn build(multi_progress: &MultiProgress, total_files: usize, colored: bool) -> Self {
        Self {
            main_bar: create_progress_bar(multi_progress, total_files as u64, colored),
            detail_bar: create_detail_bar(multi_progress),
            files_found: total_files,
            files_indexed: AtomicUsize::new(0),
            files_unchanged: AtomicUsize::new(0),
            files_failed: AtomicUsize::new(0),
            bytes_processed: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn inc_indexed(&self, bytes: u64) {
        self.files_indexed.fetch_add(1, Ordering::SeqCst);
        self.bytes_processed.fetch_add(bytes, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_unchanged(&self) {
        self.files_unchanged.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    /// Moves counts from indexed to failed when a batch write fails.
    pub fn mark_failed(&self, files: usize) {
        self.files_indexed.fetch_sub(files, Ordering::SeqCst);
        self.files_failed.fetch_add(files, Ordering::SeqCst);
        self.update_detail_bar();
    }

    pub fn set_message(&self, message: String) {
        self.detail_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Ingestion complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> IngestStats {
        IngestStats {
            files_found: self.files_found,
            files_indexed: self.files_indexed.load(Ordering::SeqCst),
            files_unchanged: self.files_unchanged.load(Ordering::SeqCst),
            files_failed: self.files_failed.load(Ordering::SeqCst),
            total_bytes_processed: self.bytes_processed.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs_f64(),
        }
    }

    fn update_detail_bar(&self) {
        self.detail_bar.set_message(format!(
            "Indexed: {} | Unchanged: {} | Failed: {}",
            self.files_indexed.load(Ordering::SeqCst),
            self.files_unchanged.load(Ordering::SeqCst),
            self.files_failed.load(Ordering::SeqCst)
        ));
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let (template, chars) = if colored {
        (
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            "█▓▒░",
        )
    } else {
        (
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}",
            "=>-",
        )
    };

    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        bar.set_style(style.progress_chars(chars));
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    if let Ok(style) = ProgressStyle::default_bar().template("{msg}") {
        bar.set_style(style);
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_calculations() {
        let stats = IngestStats {
            files_found: 12,
            files_indexed: 9,
            files_unchanged: 2,
            files_failed: 1,
            total_bytes_processed: 1000,
            duration_secs: 3.0,
        };

        assert_eq!(stats.files_per_second(), 3.0);
        assert!((stats.success_rate() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration() {
        let stats = IngestStats::default();
        assert_eq!(stats.files_per_second(), 0.0);
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn test_tracker_counts() {
        let tracker = ProgressTracker::hidden(4);

        tracker.inc_indexed(100);
        tracker.inc_indexed(50);
        tracker.inc_unchanged();
        tracker.inc_failed();
        tracker.mark_failed(1);

        let stats = tracker.get_stats();
        assert_eq!(stats.files_found, 4);
        assert_eq!(stats.files_indexed, 1);
        assert_eq!(stats.files_unchanged, 1);
        assert_eq!(stats.files_failed, 2);
        assert_eq!(stats.total_bytes_processed, 150);
    }
}
