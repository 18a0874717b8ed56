//! Binary entry point for the epitrace contact tracing CLI.
#![forbid(unsafe_code)]

#[path = "cli/config.rs"]
mod config;
#[path = "cli/ui.rs"]
mod ui;

use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use epitrace::{
    cli::import_export::{
        load_contacts, load_roots, parse_timestamp, write_paths_csv, write_summary_csv,
        write_trace_csv, CliError, ContactImportConfig, ContactSet,
    },
    query::{network_summary_with, shortest_paths_with, trace_contacts_with},
    storage::{CounterMetrics, IndexOptions},
    RootQueries, TimeWindow,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{CliConfig, ColumnsUpdate};
use ui::{format_duration, Align, Table, Theme, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "epitrace",
    version,
    about = "Contact tracing over time-stamped contact networks",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "EPITRACE_CONFIG",
        value_name = "FILE",
        help = "Path to the CLI config file"
    )]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, help = "Output format for results")]
    format: Option<OutputFormat>,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "Write json/csv results to a file instead of stdout"
    )]
    output: Option<PathBuf>,

    #[arg(long, global = true, value_enum, help = "Color theme for text output")]
    theme: Option<ThemeArg>,

    #[arg(short, long, global = true, help = "Suppress decorations and progress")]
    quiet: bool,

    #[arg(long, global = true, help = "Print traversal counters after the run")]
    stats: bool,

    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "Increase log verbosity (-v debug, -vv trace)"
    )]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct InputArgs {
    #[arg(long, value_name = "FILE", help = "CSV file of contacts")]
    contacts: PathBuf,

    #[arg(
        long,
        value_name = "FILE",
        conflicts_with = "root",
        help = "CSV file of roots with their time windows"
    )]
    roots: Option<PathBuf>,

    #[arg(
        long,
        value_name = "ID",
        action = ArgAction::Append,
        help = "Root identifier (repeatable, all share the same windows)"
    )]
    root: Vec<String>,

    #[arg(long, value_name = "TIME", allow_hyphen_values = true, help = "Window start for both directions")]
    t_begin: Option<String>,

    #[arg(long, value_name = "TIME", allow_hyphen_values = true, help = "Window end for both directions")]
    t_end: Option<String>,

    #[arg(long, value_name = "TIME", allow_hyphen_values = true, help = "Ingoing window start")]
    in_begin: Option<String>,

    #[arg(long, value_name = "TIME", allow_hyphen_values = true, help = "Ingoing window end")]
    in_end: Option<String>,

    #[arg(long, value_name = "TIME", allow_hyphen_values = true, help = "Outgoing window start")]
    out_begin: Option<String>,

    #[arg(long, value_name = "TIME", allow_hyphen_values = true, help = "Outgoing window end")]
    out_end: Option<String>,

    #[arg(long, help = "Source column name (overrides config)")]
    source_column: Option<String>,

    #[arg(long, help = "Destination column name (overrides config)")]
    destination_column: Option<String>,

    #[arg(long, help = "Time column name (overrides config)")]
    time_column: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Degree and contact chain size per root")]
    Summary(InputArgs),

    #[command(about = "Shortest time-respecting distance to every reachable node")]
    Paths(InputArgs),

    #[command(about = "Every contact on a time-respecting path from each root")]
    Trace {
        #[command(flatten)]
        input: InputArgs,

        #[arg(
            long,
            value_name = "N",
            default_value_t = 0,
            help = "Maximum distance to trace (0 = unbounded)"
        )]
        max_distance: u32,
    },

    #[command(about = "Inspect or update the CLI config")]
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCmd {
    #[command(about = "Print the effective config")]
    Show,

    #[command(about = "Persist default CSV column names")]
    SetColumns {
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        destination: Option<String>,
        #[arg(long)]
        time: Option<String>,
    },

    #[command(about = "Persist default output format and theme")]
    SetOutput {
        #[arg(long = "default-format", value_enum)]
        default_format: Option<OutputFormat>,
        #[arg(long = "default-theme", value_enum)]
        default_theme: Option<ThemeArg>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum ThemeArg {
    Auto,
    Light,
    Dark,
    Plain,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Auto => Theme::Auto,
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Plain => Theme::Plain,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "epitrace=info",
        1 => "epitrace=debug",
        _ => "epitrace=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

/// Loaded inputs plus the counters shared with the index.
struct Job {
    set: ContactSet,
    roots: RootQueries,
    metrics: Arc<CounterMetrics>,
    opts: IndexOptions,
}

struct Session {
    ui: Ui,
    format: OutputFormat,
    output: Option<PathBuf>,
    stats: bool,
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = CliConfig::load(cli.config.clone())?;
    let format = cli.format.or(config.format()).unwrap_or(OutputFormat::Text);
    let theme = cli.theme.or(config.theme()).unwrap_or(ThemeArg::Auto);
    let session = Session {
        ui: Ui::new(theme.into(), cli.quiet),
        format,
        output: cli.output,
        stats: cli.stats,
    };
    if session.output.is_some() && format == OutputFormat::Text {
        return Err("--output requires --format json or --format csv".into());
    }

    match cli.command {
        Command::Summary(input) => {
            let job = load_job(&input, &config, &session.ui)?;
            let stage = session.ui.stage("computing network summary");
            let summary = network_summary_with(&job.set.table, &job.roots, &job.opts)?;
            let elapsed = stage.finish();
            info!(roots = job.roots.len(), elapsed = %format_duration(elapsed), "summary complete");
            session.emit(
                &summary,
                |out| write_summary_csv(out, &job.set, &job.roots, &summary),
                || {
                    let mut table = Table::new("Network summary", "no roots queried")
                        .column("root", Align::Left)
                        .column("in_degree", Align::Right)
                        .column("out_degree", Align::Right)
                        .column("in_chain", Align::Right)
                        .column("out_chain", Align::Right);
                    for (i, root) in job.roots.root.iter().enumerate() {
                        table.push(vec![
                            job.set.label(*root),
                            summary.in_degree[i].to_string(),
                            summary.out_degree[i].to_string(),
                            summary.ingoing_contact_chain[i].to_string(),
                            summary.outgoing_contact_chain[i].to_string(),
                        ]);
                    }
                    table
                },
            )?;
            session.report_stats(&job)?;
        }
        Command::Paths(input) => {
            let job = load_job(&input, &config, &session.ui)?;
            let stage = session.ui.stage("computing shortest paths");
            let paths = shortest_paths_with(&job.set.table, &job.roots, &job.opts)?;
            let elapsed = stage.finish();
            info!(
                ingoing = paths.in_node.len(),
                outgoing = paths.out_node.len(),
                elapsed = %format_duration(elapsed),
                "shortest paths complete"
            );
            session.emit(
                &paths,
                |out| write_paths_csv(out, &job.set, &job.roots, &paths),
                || {
                    let mut table = Table::new("Shortest paths", "no reachable nodes")
                        .column("direction", Align::Left)
                        .column("root", Align::Left)
                        .column("node", Align::Left)
                        .column("distance", Align::Right)
                        .column("rowid", Align::Right);
                    let sides = [
                        ("in", &paths.in_index, &paths.in_node, &paths.in_distance, &paths.in_rowid),
                        ("out", &paths.out_index, &paths.out_node, &paths.out_distance, &paths.out_rowid),
                    ];
                    for (direction, index, node, distance, rowid) in sides {
                        for i in 0..index.len() {
                            table.push(vec![
                                direction.to_string(),
                                job.set.label(job.roots.root[index[i] as usize - 1]),
                                job.set.label(node[i]),
                                distance[i].to_string(),
                                rowid[i].to_string(),
                            ]);
                        }
                    }
                    table
                },
            )?;
            session.report_stats(&job)?;
        }
        Command::Trace {
            input,
            max_distance,
        } => {
            let job = load_job(&input, &config, &session.ui)?;
            let stage = session.ui.stage("tracing contacts");
            let trace = trace_contacts_with(&job.set.table, &job.roots, max_distance, &job.opts)?;
            let elapsed = stage.finish();
            info!(
                roots = trace.groups.len(),
                max_distance,
                elapsed = %format_duration(elapsed),
                "contact trace complete"
            );
            session.emit(
                &trace,
                |out| write_trace_csv(out, &job.set, &job.roots, &trace),
                || {
                    let contacts = &job.set.table;
                    let mut table = Table::new("Contact trace", "no contacts traced")
                        .column("direction", Align::Left)
                        .column("root", Align::Left)
                        .column("rowid", Align::Right)
                        .column("distance", Align::Right)
                        .column("source", Align::Left)
                        .column("destination", Align::Left)
                        .column("t", Align::Right);
                    for (group, root) in trace.groups.iter().zip(&job.roots.root) {
                        let sides = [
                            ("in", &group.in_rowid, &group.in_distance),
                            ("out", &group.out_rowid, &group.out_distance),
                        ];
                        for (direction, rowids, distances) in sides {
                            for (rowid, distance) in rowids.iter().zip(distances) {
                                let row = *rowid as usize - 1;
                                table.push(vec![
                                    direction.to_string(),
                                    job.set.label(*root),
                                    rowid.to_string(),
                                    distance.to_string(),
                                    job.set.label(contacts.source[row]),
                                    job.set.label(contacts.destination[row]),
                                    contacts.t[row].to_string(),
                                ]);
                            }
                        }
                    }
                    table
                },
            )?;
            session.report_stats(&job)?;
        }
        Command::Config { action } => run_config(action, config, &session.ui)?,
    }

    Ok(())
}

impl Session {
    fn emit<T, C, P>(&self, value: &T, csv: C, text: P) -> Result<(), Box<dyn Error>>
    where
        T: Serialize,
        C: FnOnce(&mut dyn Write) -> Result<(), CliError>,
        P: FnOnce() -> Table,
    {
        match self.format {
            OutputFormat::Text => {
                self.ui.render(&text());
                return Ok(());
            }
            OutputFormat::Json => {
                let mut sink = self.sink()?;
                serde_json::to_writer_pretty(&mut sink, value)?;
                writeln!(sink)?;
                sink.flush()?;
            }
            OutputFormat::Csv => {
                let mut sink = self.sink()?;
                csv(&mut sink)?;
                sink.flush()?;
            }
        }
        if let Some(path) = &self.output {
            self.ui.wrote("results", path);
        }
        Ok(())
    }

    fn sink(&self) -> Result<Box<dyn Write>, Box<dyn Error>> {
        Ok(match &self.output {
            Some(path) => Box::new(BufWriter::new(create_output(path)?)),
            None => Box::new(std::io::stdout().lock()),
        })
    }

    fn report_stats(&self, job: &Job) -> Result<(), Box<dyn Error>> {
        if !self.stats {
            return Ok(());
        }
        let snapshot = job.metrics.snapshot();
        if self.format == OutputFormat::Text {
            self.ui.stats(&snapshot);
        } else {
            // Keep stdout parseable.
            eprintln!("{}", serde_json::to_string(&snapshot)?);
        }
        Ok(())
    }
}

fn create_output(path: &Path) -> Result<File, CliError> {
    File::create(path)
        .map_err(|err| CliError::Message(format!("cannot create {}: {err}", path.display())))
}

fn load_job(input: &InputArgs, config: &CliConfig, ui: &Ui) -> Result<Job, Box<dyn Error>> {
    let column = |explicit: &Option<String>, fallback: &str| {
        explicit.clone().unwrap_or_else(|| fallback.to_string())
    };
    let import = ContactImportConfig {
        path: input.contacts.clone(),
        source_column: column(&input.source_column, config.source_column()),
        destination_column: column(&input.destination_column, config.destination_column()),
        time_column: column(&input.time_column, config.time_column()),
    };

    let stage = ui.stage(format!("loading {}", input.contacts.display()));
    let mut set = load_contacts(&import)?;
    let roots = match &input.roots {
        Some(path) => load_roots(path, &mut set)?,
        None => roots_from_args(input, &mut set)?,
    };
    let elapsed = stage.finish();
    info!(
        contacts = set.table.len(),
        identifiers = set.identifier_count(),
        roots = roots.len(),
        elapsed = %format_duration(elapsed),
        "inputs loaded"
    );

    let metrics = Arc::new(CounterMetrics::default());
    let opts = IndexOptions::new().metrics(metrics.clone());
    Ok(Job {
        set,
        roots,
        metrics,
        opts,
    })
}

fn roots_from_args(input: &InputArgs, set: &mut ContactSet) -> Result<RootQueries, CliError> {
    if input.root.is_empty() {
        return Err("either --roots or --root is required".into());
    }
    let bound = |specific: &Option<String>, shared: &Option<String>, name: &str| {
        let raw = specific.as_ref().or(shared.as_ref()).ok_or_else(|| {
            CliError::Message(format!("--{name} (or its --t-* shorthand) is required"))
        })?;
        parse_timestamp(raw)
    };
    let ingoing = TimeWindow::new(
        bound(&input.in_begin, &input.t_begin, "in-begin")?,
        bound(&input.in_end, &input.t_end, "in-end")?,
    );
    let outgoing = TimeWindow::new(
        bound(&input.out_begin, &input.t_begin, "out-begin")?,
        bound(&input.out_end, &input.t_end, "out-end")?,
    );
    let mut roots = RootQueries::new();
    for name in &input.root {
        let id = set.intern(name);
        roots.push(id, ingoing, outgoing);
    }
    Ok(roots)
}

fn run_config(action: ConfigCmd, mut config: CliConfig, ui: &Ui) -> Result<(), Box<dyn Error>> {
    match action {
        ConfigCmd::Show => {
            ui.config(config.path(), &config.to_toml()?);
        }
        ConfigCmd::SetColumns {
            source,
            destination,
            time,
        } => {
            config.set_columns(ColumnsUpdate {
                source,
                destination,
                time,
            });
            let path = config.persist()?;
            ui.wrote("columns", &path);
        }
        ConfigCmd::SetOutput {
            default_format,
            default_theme,
        } => {
            config.set_output(default_format, default_theme);
            let path = config.persist()?;
            ui.wrote("output defaults", &path);
        }
    }
    Ok(())
}
