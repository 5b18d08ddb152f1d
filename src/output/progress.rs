//! Progress line for the hashing phase.

use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

/// A progress line that updates in place on TTY terminals.
///
/// Workers call [`Progress::tick`] concurrently; the line is redrawn only
/// when the whole-percent value changes:
/// "Hashing files: 42% (420/1000)"
pub struct Progress {
    /// Title displayed before the counter
    title: String,
    /// Total number of items to process
    total: usize,
    /// Items processed so far
    current: AtomicUsize,
    /// Last displayed percentage (to avoid redundant redraws)
    last_percent: AtomicU8,
    /// Whether drawing is enabled (stderr is a TTY and display was requested)
    visible: bool,
    /// Whether the final line was printed
    finished: AtomicBool,
}

impl Progress {
    /// Creates a progress line; it draws only when `show` is set and
    /// stderr is a terminal.
    #[must_use]
    pub fn new(title: &str, total: usize, show: bool) -> Self {
        let progress = Self {
            title: title.to_string(),
            total,
            current: AtomicUsize::new(0),
            last_percent: AtomicU8::new(0),
            visible: show && total > 0 && io::stderr().is_terminal(),
            finished: AtomicBool::new(false),
        };
        progress.display(0, 0);
        progress
    }

    /// Records one more finished item.
    pub fn tick(&self) {
        let current = (self.current.fetch_add(1, Ordering::Relaxed) + 1).min(self.total);
        let percent = Self::percent(current, self.total);

        let last = self.last_percent.load(Ordering::Relaxed);
        if percent != last
            && self
                .last_percent
                .compare_exchange(last, percent, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
        {
            self.display(current, percent);
        }
    }

    /// Number of items recorded so far.
    #[must_use]
    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed).min(self.total)
    }

    /// Prints the final "done" line.
    pub fn finish(&self) {
        if self.visible && !self.finished.swap(true, Ordering::Relaxed) {
            eprintln!(
                "\r{}: 100% ({}/{}), done.",
                self.title.dimmed(),
                self.total,
                self.total
            );
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn percent(current: usize, total: usize) -> u8 {
        if total == 0 {
            return 0;
        }
        ((current as f64 / total as f64) * 100.0) as u8
    }

    fn display(&self, current: usize, percent: u8) {
        if !self.visible {
            return;
        }
        eprint!(
            "\r{}: {}% ({}/{})",
            self.title.dimmed(),
            percent.to_string().dimmed(),
            current,
            self.total
        );
        let _ = io::stderr().flush();
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        if self.visible && !self.finished.load(Ordering::Relaxed) {
            eprintln!();
        }
    }
}
