//! Console reporter printing newly validated proxies as they appear

use crate::display::status::{RunStats, StatusSink};
use crate::proxy::{Report, Reporter, RunSummary};
use chrono::Local;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::Stylize,
    terminal::{Clear, ClearType},
};
use std::collections::HashSet;
use std::io::{self, Write};
use tracing::warn;

const LOGO: &str = r"
      _  _  _  _  _  _  _____
     ( \( )( \/ )( \/ )(  _  )
      )  (  \  /  )  (  )(_)(
     (_)\_) (__) (_/\_)(_____)
";

/// Prints each valid proxy once, the first time a report contains it,
/// and forwards the counters to a [`StatusSink`].
pub struct ConsoleReporter<W: Write, S: StatusSink> {
    out: W,
    sink: S,
    /// Proxies already printed
    seen: HashSet<String>,
    colored: bool,
}

impl<S: StatusSink> ConsoleReporter<io::Stdout, S> {
    pub fn stdout(sink: S) -> Self {
        Self::new(io::stdout(), sink, true)
    }
}

impl<W: Write, S: StatusSink> ConsoleReporter<W, S> {
    pub fn new(out: W, sink: S, colored: bool) -> Self {
        Self {
            out,
            sink,
            seen: HashSet::new(),
            colored,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (W, S) {
        (self.out, self.sink)
    }

    fn format_line(&self, proxy: &str, response_secs: f64) -> String {
        let clock = Local::now().format("%H:%M").to_string();
        let timing = format!("{:.3}s", response_secs);
        if self.colored {
            format!("    [{}] {} [{}]", clock.blue(), proxy, timing.blue())
        } else {
            format!("    [{}] {} [{}]", clock, proxy, timing)
        }
    }

    fn print_new(&mut self, report: &Report<'_>) -> io::Result<()> {
        let mut fresh: Vec<_> = report
            .valid
            .iter()
            .filter(|entry| !self.seen.contains(&entry.proxy))
            .collect();
        fresh.sort_by(|a, b| a.proxy.cmp(&b.proxy));

        for entry in fresh {
            if !self.seen.insert(entry.proxy.clone()) {
                continue;
            }
            let line = self.format_line(&entry.proxy, entry.response_time.as_secs_f64());
            writeln!(self.out, "{}", line)?;
        }
        self.out.flush()
    }
}

impl<W: Write, S: StatusSink> Reporter for ConsoleReporter<W, S> {
    fn report(&mut self, report: &Report<'_>) {
        self.sink.update(RunStats {
            valid: report.valid.len(),
            invalid: report.invalid.len(),
            rate: report.rate,
            elapsed: report.elapsed,
        });

        if let Err(e) = self.print_new(report) {
            warn!(error = %e, "failed to print results");
        }
    }
}

/// Clear the screen and print the logo and worker count
pub fn print_banner<W: Write>(out: &mut W, workers: usize) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    writeln!(out, "{}", LOGO.blue())?;
    writeln!(out, "{}\n", format!("  ↪ Threads: {}", workers).magenta())?;
    writeln!(out, "{}", "Starting proxy checks...".magenta())?;
    out.flush()
}

/// Print the totals of a finished run
pub fn print_summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
    writeln!(
        out,
        "\nChecked {} proxies in {:.3}s | Valid: {} | Invalid: {} | RPS: {:.2}",
        summary.total(),
        summary.elapsed.as_secs_f64(),
        summary.valid.len(),
        summary.invalid.len(),
        summary.rate
    )?;
    out.flush()
}
