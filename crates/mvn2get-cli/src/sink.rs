//! Terminal event sink with a progress spinner.

use console::Style;
use indicatif::ProgressBar;

use mvn2get_core::events::EventSink;
use mvn2get_core::problem::Problem;
use mvn2get_util::progress;

/// Sink that drives a spinner and prints above it, used when
/// `show_progress` is on.
pub struct ConsoleSink {
    spinner: ProgressBar,
}

impl ConsoleSink {
    pub fn new(glyphs: &str) -> Self {
        Self {
            spinner: progress::spinner("starting", glyphs),
        }
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl EventSink for ConsoleSink {
    fn info(&self, message: &str) {
        self.spinner.println(message.to_string());
    }

    fn warn(&self, message: &str) {
        let yellow = Style::new().yellow();
        self.spinner
            .println(format!("{}", yellow.apply_to(message)));
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn trace(&self, message: &str) {
        tracing::trace!("{message}");
    }

    fn problem(&self, problem: &Problem) {
        let red = Style::new().red();
        self.spinner.println(format!(
            "{} {}",
            red.apply_to(problem.kind.as_str()),
            problem.message
        ));
    }

    fn progress(&self, message: &str) {
        self.spinner.set_message(message.to_string());
    }
}
