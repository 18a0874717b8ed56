use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};
use thiserror::Error;
use time::macros::format_description;
use time::Date;
use tracing::debug;

use crate::query::{ContactTable, ContactTrace, NetworkSummary, RootQueries, ShortestPaths};
use crate::types::{TimeWindow, Timestamp, TraceError};

/// Julian day number of 1970-01-01.
const UNIX_EPOCH_JULIAN_DAY: i64 = 2_440_588;

type ExtIdMap = HashMap<String, u32>;

/// Configuration for importing contacts from a CSV file.
#[derive(Debug, Clone)]
pub struct ContactImportConfig {
    /// Path to the CSV file containing contact rows.
    pub path: PathBuf,
    /// Name of the column holding source identifiers.
    pub source_column: String,
    /// Name of the column holding destination identifiers.
    pub destination_column: String,
    /// Name of the column holding timestamps (integers or `YYYY-MM-DD` dates).
    pub time_column: String,
}

impl ContactImportConfig {
    /// Creates a config with the default column names `source`, `destination` and `t`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source_column: "source".into(),
            destination_column: "destination".into(),
            time_column: "t".into(),
        }
    }
}

/// Error type for CLI import/export operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// IO error from file operations.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// CSV parsing or writing error.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Engine error.
    #[error(transparent)]
    Trace(#[from] TraceError),
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        CliError::Message(value.to_string())
    }
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        CliError::Message(value)
    }
}

/// Contact table plus the mapping between external identifiers and one-based ids.
#[derive(Debug, Clone, Default)]
pub struct ContactSet {
    /// Contact rows with one-based ids.
    pub table: ContactTable,
    names: Vec<String>,
    ids: ExtIdMap,
}

impl ContactSet {
    /// Returns the one-based id of `name`, assigning the next free id when unseen.
    ///
    /// New identifiers widen the table's identifier range.
    pub fn intern(&mut self, name: &str) -> u32 {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        self.names.push(name.to_string());
        let id = self.names.len() as u32;
        self.ids.insert(name.to_string(), id);
        self.table.number_of_identifiers = self.names.len();
        id
    }

    /// Appends a contact between two named nodes.
    pub fn push(&mut self, source: &str, destination: &str, t: Timestamp) {
        let src = self.intern(source);
        let dst = self.intern(destination);
        self.table.push(src, dst, t);
    }

    /// One-based id of `name`, if known.
    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    /// External name of one-based `id`.
    pub fn name_of(&self, id: u32) -> Option<&str> {
        let idx = (id as usize).checked_sub(1)?;
        self.names.get(idx).map(String::as_str)
    }

    /// Number of distinct identifiers.
    pub fn identifier_count(&self) -> usize {
        self.names.len()
    }

    /// External name of `id`, or the number itself when unnamed.
    pub fn label(&self, id: u32) -> String {
        self.name_of(id)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string())
    }
}

/// Loads contacts from the CSV file named in `cfg`.
pub fn load_contacts(cfg: &ContactImportConfig) -> Result<ContactSet, CliError> {
    let file = File::open(&cfg.path).map_err(|err| {
        CliError::Message(format!("cannot open {}: {err}", cfg.path.display()))
    })?;
    let set = read_contacts(file, cfg)?;
    debug!(
        path = %cfg.path.display(),
        rows = set.table.len(),
        identifiers = set.identifier_count(),
        "contacts loaded"
    );
    Ok(set)
}

/// Reads contacts from any CSV source using the column names in `cfg`.
///
/// Identifiers receive one-based ids in first-seen order, source before
/// destination within a row.
pub fn read_contacts<R: Read>(source: R, cfg: &ContactImportConfig) -> Result<ContactSet, CliError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(source);
    let headers = reader.headers()?.clone();
    let src_index = find_column(&headers, &cfg.source_column)?;
    let dst_index = find_column(&headers, &cfg.destination_column)?;
    let t_index = find_column(&headers, &cfg.time_column)?;

    let mut set = ContactSet::default();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let src = get_required(&record, src_index, &cfg.source_column, row)?;
        let dst = get_required(&record, dst_index, &cfg.destination_column, row)?;
        let raw_t = get_required(&record, t_index, &cfg.time_column, row)?;
        let t = parse_timestamp(raw_t)
            .map_err(|err| CliError::Message(format!("row {}: {err}", row + 1)))?;
        set.push(src, dst, t);
    }
    Ok(set)
}

/// Loads root queries from a CSV file, interning root names into `set`.
pub fn load_roots(path: &Path, set: &mut ContactSet) -> Result<RootQueries, CliError> {
    let file = File::open(path)
        .map_err(|err| CliError::Message(format!("cannot open {}: {err}", path.display())))?;
    read_roots(file, set)
}

/// Reads root queries from CSV.
///
/// Required column `root`; windows come from `in_begin`, `in_end`,
/// `out_begin`, `out_end`, or from `t_begin`/`t_end` applied to both
/// directions. Per-direction columns win over the shorthand. Roots not
/// present in the contacts are added as isolated identifiers.
pub fn read_roots<R: Read>(source: R, set: &mut ContactSet) -> Result<RootQueries, CliError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(source);
    let headers = reader.headers()?.clone();
    let root_index = find_column(&headers, "root")?;
    let shared_begin = find_optional(&headers, "t_begin");
    let shared_end = find_optional(&headers, "t_end");
    let column = |name: &str, fallback: Option<usize>| -> Result<usize, CliError> {
        find_optional(&headers, name)
            .or(fallback)
            .ok_or_else(|| CliError::Message(format!("column '{name}' not found")))
    };
    let in_begin = column("in_begin", shared_begin)?;
    let in_end = column("in_end", shared_end)?;
    let out_begin = column("out_begin", shared_begin)?;
    let out_end = column("out_end", shared_end)?;

    let mut roots = RootQueries::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let name = get_required(&record, root_index, "root", row)?;
        let time_at = |idx: usize, label: &str| -> Result<Timestamp, CliError> {
            let raw = get_required(&record, idx, label, row)?;
            parse_timestamp(raw).map_err(|err| CliError::Message(format!("row {}: {err}", row + 1)))
        };
        let ingoing = TimeWindow::new(time_at(in_begin, "in_begin")?, time_at(in_end, "in_end")?);
        let outgoing =
            TimeWindow::new(time_at(out_begin, "out_begin")?, time_at(out_end, "out_end")?);
        let id = set.intern(name);
        roots.push(id, ingoing, outgoing);
    }
    Ok(roots)
}

/// Parses an integer timestamp or an ISO `YYYY-MM-DD` date as days since 1970-01-01.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, CliError> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(value);
    }
    let date = Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|err| CliError::Message(format!("invalid timestamp '{raw}': {err}")))?;
    Ok(i64::from(date.to_julian_day()) - UNIX_EPOCH_JULIAN_DAY)
}

/// Writes a network summary as CSV, one line per root.
pub fn write_summary_csv<W: Write>(
    out: W,
    set: &ContactSet,
    roots: &RootQueries,
    summary: &NetworkSummary,
) -> Result<(), CliError> {
    let mut writer = csv_writer(out);
    writer.write_record([
        "root",
        "in_degree",
        "out_degree",
        "ingoing_contact_chain",
        "outgoing_contact_chain",
    ])?;
    for (i, root) in roots.root.iter().enumerate() {
        writer.write_record([
            set.label(*root),
            summary.in_degree[i].to_string(),
            summary.out_degree[i].to_string(),
            summary.ingoing_contact_chain[i].to_string(),
            summary.outgoing_contact_chain[i].to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes shortest paths as CSV, ingoing rows first.
pub fn write_paths_csv<W: Write>(
    out: W,
    set: &ContactSet,
    roots: &RootQueries,
    paths: &ShortestPaths,
) -> Result<(), CliError> {
    let mut writer = csv_writer(out);
    writer.write_record(["direction", "root", "node", "distance", "rowid"])?;
    let sides = [
        ("in", &paths.in_index, &paths.in_node, &paths.in_distance, &paths.in_rowid),
        ("out", &paths.out_index, &paths.out_node, &paths.out_distance, &paths.out_rowid),
    ];
    for (direction, index, node, distance, rowid) in sides {
        for i in 0..index.len() {
            let root = roots.root[index[i] as usize - 1];
            writer.write_record([
                direction.to_string(),
                set.label(root),
                set.label(node[i]),
                distance[i].to_string(),
                rowid[i].to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Writes traced contacts as CSV with the original contact endpoints and time.
pub fn write_trace_csv<W: Write>(
    out: W,
    set: &ContactSet,
    roots: &RootQueries,
    trace: &ContactTrace,
) -> Result<(), CliError> {
    let mut writer = csv_writer(out);
    writer.write_record([
        "direction",
        "root",
        "rowid",
        "distance",
        "source",
        "destination",
        "t",
    ])?;
    for (group, root) in trace.groups.iter().zip(&roots.root) {
        let sides = [
            ("in", &group.in_rowid, &group.in_distance),
            ("out", &group.out_rowid, &group.out_distance),
        ];
        for (direction, rowids, distances) in sides {
            for (rowid, distance) in rowids.iter().zip(distances) {
                let row = *rowid as usize - 1;
                writer.write_record([
                    direction.to_string(),
                    set.label(*root),
                    rowid.to_string(),
                    distance.to_string(),
                    set.label(set.table.source[row]),
                    set.label(set.table.destination[row]),
                    set.table.t[row].to_string(),
                ])?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

fn csv_writer<W: Write>(out: W) -> Writer<W> {
    WriterBuilder::new().from_writer(out)
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize, CliError> {
    find_optional(headers, name)
        .ok_or_else(|| CliError::Message(format!("column '{}' not found", name)))
}

fn find_optional(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn get_required<'a>(
    record: &'a StringRecord,
    idx: usize,
    name: &str,
    row: usize,
) -> Result<&'a str, CliError> {
    record
        .get(idx)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            CliError::Message(format!(
                "missing value for column '{}' in row {}",
                name,
                row + 1
            ))
        })
}
