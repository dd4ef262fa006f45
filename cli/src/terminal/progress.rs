use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// The bar currently drawn, if any. Log lines are routed above it.
static ACTIVE: Mutex<Option<ProgressBar>> = Mutex::new(None);

pub struct ScanProgress {
    bar: ProgressBar,
}

impl ScanProgress {
    pub fn start(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::with_template(
            "{spinner:.blue} [{bar:32.green/bright_black}] {pos}/{len} hosts {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▆▁")
        .tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ]);

        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        *lock_active() = Some(bar.clone());

        Self { bar }
    }

    pub fn set_position(&self, scanned: usize) {
        self.bar.set_position(scanned as u64);
    }

    pub fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    pub fn finish(self) {
        lock_active().take();
        self.bar.finish_and_clear();
    }
}

fn lock_active() -> std::sync::MutexGuard<'static, Option<ProgressBar>> {
    ACTIVE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `io::Write` sink for the tracing subscriber that keeps log lines from
/// tearing the progress bar.
pub struct ProgressWriter;

impl std::io::Write for ProgressWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let msg = String::from_utf8_lossy(buf);
        let msg = msg.trim_end();
        match lock_active().as_ref() {
            Some(bar) => bar.println(msg),
            None => println!("{msg}"),
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
