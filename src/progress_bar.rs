pub use crate::traits::Progress;

impl Progress for indicatif::ProgressBar {
    fn inc(&self, i: u64) {
        indicatif::ProgressBar::inc(self, i)
    }

    fn finish(&self) {
        indicatif::ProgressBar::finish(self)
    }
}

impl Progress for logbar::ProgressBar {
    fn inc(&self, i: u64) {
        logbar::ProgressBar::inc(self, i as usize)
    }

    fn finish(&self) {
        logbar::ProgressBar::finish(self)
    }
}

/// Dummy progress indicator
pub struct NoProgress {}
impl Progress for NoProgress {
    fn inc(&self, _i: u64) {}

    fn finish(&self) {}
}

/// Don't show any progress indicator
pub const NO_PROGRESS: NoProgress = NoProgress {};

/// Progress over the input files of a merge
///
/// Shown only at log level `info`, as a terminal progress bar when
/// stderr is attended and as a plain text bar otherwise. While the bar
/// is shown, only warnings and errors are logged. The previous log level
/// is restored by [Progress::finish].
pub struct ProgressBar {
    bar: Box<dyn Progress>,
    suspended_log_level: Option<log::LevelFilter>,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self { bar: Box::new(NO_PROGRESS), suspended_log_level: None }
    }
}

impl Progress for ProgressBar {
    fn inc(&self, i: u64) {
        self.bar.inc(i);
    }

    fn finish(&self) {
        self.bar.finish();
        if let Some(level) = self.suspended_log_level {
            log::set_max_level(level);
        }
    }
}

impl ProgressBar {
    /// A new progress bar for `nfiles` input files
    pub fn new(nfiles: u64, message: &str) -> Self {
        let level = log::max_level();
        if level.to_level() != Some(log::Level::Info) || nfiles < 2 {
            return ProgressBar::default();
        }
        let bar: Box<dyn Progress> = if console::Term::stderr().features().is_attended() {
            let bar = indicatif::ProgressBar::new(nfiles);
            bar.set_style(
                indicatif::ProgressStyle::default_bar()
                    .template("{bar:60.cyan/cyan} {msg} {pos}/{len} [{elapsed}]")
                    .unwrap(),
            );
            bar.set_message(message.to_owned());
            Box::new(bar)
        } else {
            let style = logbar::Style::new().indicator('█');
            eprintln!("{message}");
            Box::new(logbar::ProgressBar::with_style(nfiles as usize, style))
        };
        log::set_max_level(log::LevelFilter::Warn);
        ProgressBar { bar, suspended_log_level: Some(level) }
    }
}

impl Drop for ProgressBar {
    fn drop(&mut self) {
        // merges can bail out before finishing
        if let Some(level) = self.suspended_log_level {
            log::set_max_level(level);
        }
    }
}
