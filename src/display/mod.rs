//! Console presentation of checker progress

mod console;
mod status;

pub use console::{print_banner, print_summary, ConsoleReporter};
pub use status::{title_for, NoopSink, RunStats, StatusSink, TitleUpdater};
