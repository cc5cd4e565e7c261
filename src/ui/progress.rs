use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::agent::{Complexity, PhaseKind, Verdict};
use crate::orchestrator::FinalStatus;
use crate::ui::icons::{
    BLUEPRINT, BOOK, CHECK, CROSS, FILE_NEW, FOLDER, HAMMER, QUESTION, REVIEW, SPARKLE, WARN,
};

/// Terminal UI for a build, rendered via `indicatif`.
///
/// One spinner runs while a phase is waiting on the generator; it is
/// finished before the clarification gate so prompts are not overdrawn.
pub struct BuildUI {
    multi: MultiProgress,
    spinner: Mutex<Option<ProgressBar>>,
    verbose: bool,
}

fn phase_icon(phase: PhaseKind) -> &'static console::Emoji<'static, 'static> {
    match phase {
        PhaseKind::Clarify => &QUESTION,
        PhaseKind::Plan => &BLUEPRINT,
        PhaseKind::Implement => &HAMMER,
        PhaseKind::Validate => &REVIEW,
        PhaseKind::Guide => &BOOK,
    }
}

impl BuildUI {
    pub fn new(verbose: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            spinner: Mutex::new(None),
            verbose,
        }
    }

    /// Print a line via `MultiProgress`, falling back to `eprintln!`.
    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    fn take_spinner(&self) -> Option<ProgressBar> {
        self.spinner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    pub fn print_separator(&self) {
        self.print_line(format!("{}", style("═".repeat(70)).cyan()));
    }

    pub fn print_banner(&self, prompt: &str) {
        self.print_line("");
        self.print_separator();
        self.print_line(format!("{} {}", SPARKLE, style("gamesmith").bold()));
        self.print_separator();
        for line in textwrap::wrap(prompt.trim(), 68) {
            self.print_line(format!("  {}", style(line).italic()));
        }
        self.print_line("");
    }

    /// Start the spinner for a phase.
    pub fn start_phase(&self, phase: PhaseKind, detail: &str) {
        let spinner_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg} {elapsed:.dim}")
            .expect("progress bar template is a valid static string");

        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix(format!("{}{}", phase_icon(phase), phase.role()));
        bar.set_message(detail.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        if let Some(previous) = self
            .spinner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(bar)
        {
            previous.finish_and_clear();
        }
    }

    /// Update the running spinner's message.
    pub fn log_step(&self, msg: &str) {
        if let Some(bar) = self
            .spinner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
        {
            bar.set_message(msg.to_string());
        }
        if self.verbose {
            self.print_line(format!("    {} {}", style("→").dim(), style(msg).dim()));
        }
    }

    pub fn phase_done(&self, phase: PhaseKind, summary: &str) {
        if let Some(bar) = self.take_spinner() {
            bar.finish_and_clear();
        }
        self.print_line(format!(
            "{}{} {}",
            CHECK,
            style(phase.role()).green().bold(),
            summary
        ));
    }

    pub fn phase_failed(&self, phase: PhaseKind, reason: &str) {
        if let Some(bar) = self.take_spinner() {
            bar.finish_and_clear();
        }
        self.print_line(format!(
            "{}{} failed: {}",
            CROSS,
            style(phase.role()).red().bold(),
            reason
        ));
    }

    pub fn show_questions(&self, game_type: &str, complexity: Complexity, total: usize) {
        self.print_line(format!(
            "\n  Detected {} ({} complexity). {} questions to answer:",
            style(game_type).cyan().bold(),
            style(complexity).yellow(),
            total
        ));
        self.print_line(format!(
            "  {}",
            style("Press Enter to skip a question; Ctrl-D to stop.").dim()
        ));
    }

    pub fn show_answer(&self, index: usize, total: usize, question: &str, answer: &str) {
        if self.verbose {
            self.print_line(format!(
                "    {} [{}/{}] {} {}",
                style("→").dim(),
                index + 1,
                total,
                style(question).dim(),
                style(answer).green()
            ));
        }
    }

    pub fn show_verdict(&self, verdict: Verdict, iteration: u32, max: u32, feedback: &[String]) {
        if let Some(bar) = self.take_spinner() {
            bar.finish_and_clear();
        }
        let label = match verdict {
            Verdict::Pass => style(verdict.to_string()).green().bold(),
            Verdict::Fail => style(verdict.to_string()).red().bold(),
        };
        self.print_line(format!(
            "{}{} iteration {}/{}: {}",
            phase_icon(PhaseKind::Validate),
            style(PhaseKind::Validate.role()).bold(),
            iteration,
            max,
            label
        ));
        for item in feedback {
            self.print_line(format!("    {} {}", style("•").dim(), item));
        }
    }

    pub fn warn(&self, msg: &str) {
        self.print_line(format!("{}{}", WARN, style(msg).yellow()));
    }

    /// Final summary after the artifacts have been handed off.
    pub fn print_result(
        &self,
        status: FinalStatus,
        iterations: u32,
        output_dir: Option<&Path>,
        file_names: &[String],
    ) {
        self.print_line("");
        self.print_separator();
        let headline = match status {
            FinalStatus::Success => format!("{}{}", SPARKLE, style("Build succeeded").green().bold()),
            FinalStatus::SuccessWithWarning => format!(
                "{}{}",
                WARN,
                style("Build finished with unresolved validation feedback").yellow().bold()
            ),
            FinalStatus::Failed => format!("{}{}", CROSS, style("Build failed").red().bold()),
        };
        self.print_line(format!("{} ({} iteration(s))", headline, iterations));
        if let Some(dir) = output_dir {
            self.print_line(format!("{}{}", FOLDER, style(dir.display()).cyan()));
        }
        for name in file_names {
            self.print_line(format!("  {}{}", FILE_NEW, name));
        }
        self.print_separator();
    }
}
