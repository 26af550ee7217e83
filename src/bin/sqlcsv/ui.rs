use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};
use sqlcsv::export::{Progress, RunStats};
use std::fmt::Display;
use std::io::IsTerminal;
use std::time::{Duration, Instant};

/// When to paint output with ANSI colors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// Human-facing output. Quiet mode drops everything but warnings.
pub struct Ui {
    styles: Option<Styles>,
    quiet: bool,
}

struct Styles {
    heading: Style,
    key: Style,
    success: Style,
    warn: Style,
}

impl Ui {
    pub fn new(color: ColorChoice, quiet: bool) -> Self {
        let paint = !quiet
            && match color {
                ColorChoice::Always => true,
                ColorChoice::Never => false,
                ColorChoice::Auto => std::io::stdout().is_terminal(),
            };

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        let styles = paint.then(|| Styles {
            heading: Style::new().fg(Color::Purple).bold(),
            key: Style::new().fg(Color::LightBlue),
            success: Style::new().fg(Color::LightGreen).bold(),
            warn: Style::new().fg(Color::Yellow).bold(),
        });
        Self { styles, quiet }
    }

    /// Prints a titled block of right-aligned `key: value` lines.
    pub fn section<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        if self.quiet {
            return;
        }
        let rows: Vec<(&str, String)> = rows
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

        match &self.styles {
            Some(styles) => println!("{}", styles.heading.paint(title)),
            None => println!("{title}"),
        }
        for (key, value) in rows {
            let key = format!("{key:>width$}:");
            match &self.styles {
                Some(styles) => println!("  {} {value}", styles.key.paint(key)),
                None => println!("  {key} {value}"),
            }
        }
    }

    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        match &self.styles {
            Some(styles) => println!("{} {message}", styles.success.paint("✔")),
            None => println!("✔ {message}"),
        }
    }

    /// Warnings go to stderr and survive quiet mode.
    pub fn warn(&self, message: &str) {
        match &self.styles {
            Some(styles) => eprintln!("{} {message}", styles.warn.paint("warning:")),
            None => eprintln!("warning: {message}"),
        }
    }

    /// Starts a stderr spinner that shows the running row count.
    pub fn task(&self, label: impl Into<String>) -> TaskGuard<'_> {
        let label = label.into();
        let pb = (!self.quiet).then(|| {
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            let pb = ProgressBar::new_spinner().with_style(style);
            pb.set_message(label.clone());
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });
        TaskGuard {
            ui: self,
            label,
            start: Instant::now(),
            pb,
        }
    }
}

/// Spinner handle; dropping it without [`TaskGuard::finish`] reports an
/// interrupted export.
pub struct TaskGuard<'a> {
    ui: &'a Ui,
    label: String,
    start: Instant,
    pb: Option<ProgressBar>,
}

impl TaskGuard<'_> {
    pub fn finish(mut self) -> Duration {
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
        // Disarms the interruption report in `drop`.
        self.label.clear();
        self.start.elapsed()
    }
}

impl Progress for TaskGuard<'_> {
    fn rows_written(&mut self, stats: &RunStats) {
        if let Some(pb) = &self.pb {
            pb.set_message(format!("{}: {} rows", self.label, stats.rows));
        }
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        if self.label.is_empty() {
            return;
        }
        let message = format!(
            "{} interrupted after {}",
            self.label,
            format_duration(self.start.elapsed())
        );
        match self.pb.take() {
            Some(pb) => pb.abandon_with_message(message),
            None => self.ui.warn(&message),
        }
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs >= 1.0 {
        format!("{secs:.2}s")
    } else {
        format!("{:.0}ms", secs * 1_000.0)
    }
}
