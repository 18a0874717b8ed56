//! Terminal rendering for result tables, traversal counters and progress.

use epitrace::storage::MetricsSnapshot;
use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};
use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Theme {
    Auto,
    Light,
    Dark,
    Plain,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Align {
    Left,
    Right,
}

/// One result table. `empty` is shown instead when no rows were pushed.
pub struct Table {
    title: &'static str,
    empty: &'static str,
    columns: Vec<(&'static str, Align)>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(title: &'static str, empty: &'static str) -> Self {
        Self {
            title,
            empty,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn column(mut self, name: &'static str, align: Align) -> Self {
        self.columns.push((name, align));
        self
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.columns.iter().map(|(name, _)| name.len()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }

    fn line<'a>(&self, cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
        cells
            .zip(widths)
            .zip(&self.columns)
            .map(|((cell, &width), (_, align))| match align {
                Align::Left => format!("{cell:<width$}"),
                Align::Right => format!("{cell:>width$}"),
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    }
}

pub struct Ui {
    palette: Palette,
    paint: bool,
    quiet: bool,
    spinner: ProgressStyle,
}

impl Ui {
    pub fn new(theme: Theme, quiet: bool) -> Self {
        let paint = theme != Theme::Plain && !quiet && std::io::stdout().is_terminal();

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        let palette = match theme {
            Theme::Plain => Palette::default(),
            Theme::Light => Palette::light(),
            Theme::Dark | Theme::Auto => Palette::dark(),
        };
        let spinner = ProgressStyle::with_template("{spinner} {msg} {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        Self {
            palette,
            paint,
            quiet,
            spinner,
        }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.paint {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Prints a result table on stdout. Quiet mode drops the title line.
    pub fn render(&self, table: &Table) {
        if table.rows.is_empty() {
            self.note(table.empty);
            return;
        }
        if !self.quiet {
            let rows = match table.rows.len() {
                1 => "1 row".to_string(),
                n => format!("{n} rows"),
            };
            println!(
                "{} {}",
                self.paint(self.palette.title, table.title),
                self.paint(self.palette.muted, &format!("({rows})"))
            );
        }
        let widths = table.widths();
        let header = table.line(table.columns.iter().map(|(name, _)| *name), &widths);
        println!("{}", self.paint(self.palette.header, &header));
        for row in &table.rows {
            println!("{}", table.line(row.iter().map(String::as_str), &widths));
        }
    }

    /// Counters split by traversal direction.
    pub fn stats(&self, snapshot: &MetricsSnapshot) {
        let mut table = Table::new("Traversal stats", "no traversal ran")
            .column("counter", Align::Left)
            .column("ingoing", Align::Right)
            .column("outgoing", Align::Right)
            .column("total", Align::Right);
        let split = [
            ("nodes expanded", snapshot.nodes_expanded_in, snapshot.nodes_expanded_out),
            ("contacts scanned", snapshot.contacts_scanned_in, snapshot.contacts_scanned_out),
        ];
        for (name, ingoing, outgoing) in split {
            table.push(vec![
                name.to_string(),
                ingoing.to_string(),
                outgoing.to_string(),
                (ingoing + outgoing).to_string(),
            ]);
        }
        for (name, total) in [
            ("events indexed", snapshot.events_indexed),
            ("contacts emitted", snapshot.contacts_emitted),
        ] {
            table.push(vec![name.to_string(), "-".into(), "-".into(), total.to_string()]);
        }
        if !self.quiet {
            println!();
        }
        self.render(&table);
    }

    /// Prints the config as TOML, preceded by its location as a comment.
    pub fn config(&self, path: Option<&Path>, toml: &str) {
        if !self.quiet {
            let location = path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "no config path".into());
            println!("{}", self.paint(self.palette.muted, &format!("# {location}")));
        }
        print!("{toml}");
    }

    /// Status line on stderr so stdout stays reserved for results.
    pub fn wrote(&self, what: &str, path: &Path) {
        eprintln!("{what} written to {}", path.display());
    }

    pub fn note(&self, message: &str) {
        if !self.quiet {
            println!("{}", self.paint(self.palette.muted, message));
        }
    }

    /// Starts a timed stage; a spinner is drawn only on an interactive stderr.
    pub fn stage(&self, label: impl Into<String>) -> Stage<'_> {
        let label = label.into();
        let spinner = (!self.quiet && std::io::stderr().is_terminal()).then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(self.spinner.clone());
            pb.set_message(label.clone());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        Stage {
            ui: self,
            label,
            start: Instant::now(),
            spinner,
            done: false,
        }
    }
}

/// Stage started by [`Ui::stage`]. Dropping it without [`Stage::finish`]
/// reports the stage as failed.
pub struct Stage<'a> {
    ui: &'a Ui,
    label: String,
    start: Instant,
    spinner: Option<ProgressBar>,
    done: bool,
}

impl Stage<'_> {
    pub fn finish(mut self) -> Duration {
        self.done = true;
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
        self.start.elapsed()
    }
}

impl Drop for Stage<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
        let message = format!(
            "{} failed after {}",
            self.label,
            format_duration(self.start.elapsed())
        );
        eprintln!("{}", self.ui.paint(self.ui.palette.alert, &message));
    }
}

pub fn format_duration(duration: Duration) -> String {
    match duration.as_micros() {
        0..=999 => format!("{}µs", duration.as_micros()),
        1_000..=999_999 => format!("{}ms", duration.as_millis()),
        _ => format!("{:.2}s", duration.as_secs_f64()),
    }
}

#[derive(Default)]
struct Palette {
    title: Style,
    header: Style,
    muted: Style,
    alert: Style,
}

impl Palette {
    fn dark() -> Self {
        Self {
            title: Style::new().fg(Color::LightCyan).bold(),
            header: Style::new().fg(Color::LightBlue).underline(),
            muted: Style::new().fg(Color::DarkGray),
            alert: Style::new().fg(Color::Yellow).bold(),
        }
    }

    fn light() -> Self {
        Self {
            title: Style::new().fg(Color::Blue).bold(),
            header: Style::new().fg(Color::Black).underline(),
            muted: Style::new().fg(Color::DarkGray),
            alert: Style::new().fg(Color::Red).bold(),
        }
    }
}
