// Progress reporting for long-running commands
use indicatif::{ProgressBar as IndicatifProgressBar, ProgressDrawTarget, ProgressStyle};
use zimbridge::format::format_bytes;

/// indicatif wrapper with a running byte total in the message
pub struct ProgressBar {
    pb: IndicatifProgressBar,
    bytes: u64,
}

impl ProgressBar {
    /// Counts units of work and shows the bytes processed so far
    pub fn with_bytes(total: usize, quiet: bool) -> Self {
        let pb = IndicatifProgressBar::new(total as u64);
        if quiet {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} | {msg} | ETA: {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ ");
        pb.set_style(style);

        Self { pb, bytes: 0 }
    }

    /// Advance by one unit of work that processed `bytes`
    pub fn inc(&mut self, bytes: u64) {
        self.pb.inc(1);
        self.bytes += bytes;
        self.pb.set_message(format_bytes(self.bytes));
    }

    /// Print a line above the bar without tearing it
    pub fn println<S: AsRef<str>>(&self, line: S) {
        self.pb.println(line);
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}
