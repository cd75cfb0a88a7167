//! Terminal output for `convoy`: a progress spinner and colored results.
//!
//! Uses `indicatif` for the spinner and `console` for styling. The
//! [`BatchProgress`] tracks submissions and running workflows while the
//! scheduler works through the queue.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::ConvoyError;
use crate::remote::{CreateJobResponse, CreateJobStatus};
use crate::scheduler::JobPhase;
use crate::workflow::JobReport;

pub struct BatchProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl BatchProgress {
    pub fn start() -> Self {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message("submitting jobs");
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    #[cfg(test)]
    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
            green: Style::new(),
            red: Style::new(),
            yellow: Style::new(),
        }
    }

    /// Show the outcome of one job request.
    pub fn submission(&self, product_id: &str, result: &Result<CreateJobResponse, ConvoyError>) {
        let line = match result {
            Ok(resp) if resp.status == CreateJobStatus::Accept => format!(
                "  {} {product_id}: accepted as {}",
                self.green.apply_to("✓"),
                resp.job_id.as_deref().unwrap_or("?")
            ),
            Ok(_) => format!("  {} {product_id}: rejected by carrier", self.yellow.apply_to("–")),
            Err(e) => format!("  {} {product_id}: {e}", self.red.apply_to("✗")),
        };
        self.pb.println(line);
    }

    pub fn update(&self, in_flight: usize, queued: usize) {
        self.pb
            .set_message(format!("{in_flight} job(s) in flight, {queued} queued"));
    }

    pub fn interrupted(&self) {
        self.pb.println(format!(
            "  {} interrupted, no further jobs will be admitted (interrupt again to quit)",
            self.yellow.apply_to("!")
        ));
    }

    pub fn print_unfinished(&self, job_id: &str, phase: JobPhase) {
        println!("{} {job_id} {}", self.yellow.apply_to("…"), self.yellow.apply_to(phase));
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    /// Print a finished job's report with its JSON body.
    pub fn print_report(&self, report: &JobReport) {
        let (style, mark) = if report.succeeded() {
            (&self.green, "✓")
        } else {
            (&self.red, "✗")
        };
        println!();
        println!(
            "{} {} {} ({} ms)",
            style.apply_to(mark),
            report.job_id,
            style.apply_to(report.state),
            report.duration_ms
        );
        println!(
            "{}",
            serde_json::to_string_pretty(report).unwrap_or_default()
        );
    }
}
