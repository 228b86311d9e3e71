//! Result-table ingest and column-role resolution.
//!
//! This module is responsible for turning a harness test-run folder into:
//! - a fully materialized `Table` (header + trimmed rows)
//! - a `ColumnRoles` mapping telling the slicer where each tracked variable,
//!   the runtime and the protocol live
//! - the maximum input size advertised by the run summary
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level tolerance** (skip unreadable records, but report what happened)
//! - **Deterministic behavior** (directory scans are sorted by file name)

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::domain::{ProtocolMetrics, TrackedVariable};
use crate::error::AppError;

const RUNTIME_COLUMNS: [&str; 2] = ["runtime_external(s)", "runtime(s)"];
const PROTOCOL_COLUMN: &str = "protocol";
const COMM_ROUNDS_COLUMN: &str = "P0commRounds";
const P0_DATA_SENT_COLUMN: &str = "P0dataSent(MB)";
const ALL_DATA_SENT_COLUMN: &str = "ALLdataSent(MB)";

/// One record of the result table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    fields: Vec<String>,
}

impl Row {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Field at `idx`, or `""` when the record is shorter than the header.
    pub fn get(&self, idx: usize) -> &str {
        self.fields.get(idx).map(String::as_str).unwrap_or("")
    }
}

/// The whole result table, loaded up front.
#[derive(Debug, Clone)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Distinct non-blank protocol names, in order of first appearance.
    pub fn protocols(&self, protocol_idx: usize) -> Vec<String> {
        let mut seen = Vec::new();
        for row in &self.rows {
            let p = row.get(protocol_idx);
            if !p.is_empty() && !seen.iter().any(|s: &String| s == p) {
                seen.push(p.to_string());
            }
        }
        seen
    }
}

/// Resolved column positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoles {
    pub runtime: usize,
    pub protocol: usize,
    pub sort_key: Option<usize>,
    pub comm_rounds: Option<usize>,
    pub data_sent: Option<usize>,
    variables: [Option<usize>; TrackedVariable::COUNT],
}

impl ColumnRoles {
    /// Resolve roles from the header row.
    ///
    /// The first column to claim a role keeps it; unmatched columns are ignored.
    /// Only the runtime and protocol columns are mandatory.
    pub fn resolve(header: &[String], sort_column: Option<&str>) -> Result<Self, AppError> {
        let mut variables = [None; TrackedVariable::COUNT];
        let mut runtime = None;
        let mut protocol = None;
        let mut comm_rounds = None;
        let mut p0_data_sent = None;
        let mut data_sent = None;

        for (idx, raw) in header.iter().enumerate() {
            let name = normalize_header_name(raw);
            if let Some(var) = TrackedVariable::from_column(name) {
                variables[var.index()].get_or_insert(idx);
            } else if RUNTIME_COLUMNS.contains(&name) {
                runtime.get_or_insert(idx);
            } else if name == PROTOCOL_COLUMN {
                protocol.get_or_insert(idx);
            } else if name == COMM_ROUNDS_COLUMN {
                comm_rounds.get_or_insert(idx);
            } else if name == P0_DATA_SENT_COLUMN {
                p0_data_sent.get_or_insert(idx);
            } else if name == ALL_DATA_SENT_COLUMN {
                data_sent.get_or_insert(idx);
            }
        }

        let sort_key = sort_column.and_then(|wanted| {
            header
                .iter()
                .position(|h| normalize_header_name(h) == wanted.trim())
        });
        if let (Some(wanted), None) = (sort_column, sort_key) {
            warn!(column = wanted, "sort column not found in table header; keeping file order");
        }

        let runtime = runtime.ok_or_else(|| {
            AppError::input(format!(
                "Missing required runtime column: expected one of `{}`",
                RUNTIME_COLUMNS.join("`, `")
            ))
        })?;
        let protocol = protocol
            .ok_or_else(|| AppError::input(format!("Missing required column: `{PROTOCOL_COLUMN}`")))?;

        Ok(Self {
            runtime,
            protocol,
            sort_key,
            // Older harness tables carry no rounds column; they historically
            // fed P0's data volume into the latency rescale instead.
            comm_rounds: comm_rounds.or(p0_data_sent),
            data_sent,
            variables,
        })
    }

    /// Column of `var`, or `None` if the table does not track it.
    pub fn variable(&self, var: TrackedVariable) -> Option<usize> {
        self.variables[var.index()]
    }

    /// Tracked variables present in the table, in registry order.
    pub fn present_variables(&self) -> impl Iterator<Item = (TrackedVariable, usize)> + '_ {
        TrackedVariable::ALL
            .into_iter()
            .filter_map(|v| self.variable(v).map(|idx| (v, idx)))
    }
}

/// Locate the results table inside `<data_dir>/data/`.
///
/// The harness names it `*full*.csv` or `*short*.csv`; the first match in
/// file-name order wins.
pub fn find_results_table(data_dir: &Path) -> Result<PathBuf, AppError> {
    let dir = data_dir.join("data");
    let names = sorted_file_names(&dir)?;
    names
        .into_iter()
        .find(|name| name.ends_with(".csv") && (name.contains("full") || name.contains("short")))
        .map(|name| {
            info!(table = %name, "found results table");
            dir.join(name)
        })
        .ok_or_else(|| {
            AppError::input(format!(
                "Could not find a csv file with 'full' or 'short' in the name in '{}'.",
                dir.display()
            ))
        })
}

/// Load a `;`-delimited result table from disk.
pub fn load_table(path: &Path) -> Result<Table, AppError> {
    let file = File::open(path).map_err(|e| AppError::io("open results table", path, e))?;
    parse_table(file)
}

/// Parse a `;`-delimited result table from any reader.
pub fn parse_table<R: Read>(reader: R) -> Result<Table, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read table header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (idx, result) in reader.records().enumerate() {
        match result {
            Ok(record) => rows.push(Row::new(record.iter().map(str::to_string).collect())),
            Err(e) => {
                // +2: records start after the header and lines are 1-based.
                warn!(line = idx + 2, error = %e, "skipping unreadable table record");
                skipped += 1;
            }
        }
    }

    debug!(columns = header.len(), rows = rows.len(), skipped, "table loaded");
    Ok(Table { header, rows })
}

/// Locate the run summary `E*-run-summary.dat` directly inside `data_dir`.
pub fn find_summary_file(data_dir: &Path) -> Result<Option<PathBuf>, AppError> {
    let names = sorted_file_names(data_dir)?;
    Ok(names
        .into_iter()
        .find(|name| name.starts_with('E') && name.ends_with("-run-summary.dat"))
        .map(|name| data_dir.join(name)))
}

/// Read the largest input size from a run summary.
///
/// The value is the last whitespace-separated token of the first line
/// containing `Inputs`. Returns `None` if no such line exists.
pub fn read_max_input(path: &Path) -> Result<Option<String>, AppError> {
    let file = File::open(path).map_err(|e| AppError::io("open run summary", path, e))?;
    parse_max_input(BufReader::new(file))
}

pub fn parse_max_input<R: BufRead>(reader: R) -> Result<Option<String>, AppError> {
    let re = Regex::new(r"Inputs.*")
        .map_err(|e| AppError::new(crate::error::EXIT_NUMERIC, format!("Invalid summary pattern: {e}")))?;
    for line in reader.lines() {
        let line = line.map_err(|e| AppError::input(format!("Failed to read run summary: {e}")))?;
        if let Some(m) = re.find(&line) {
            return Ok(m.as_str().split_whitespace().last().map(str::to_string));
        }
    }
    Ok(None)
}

/// Communication metrics per protocol, taken from the first row of each protocol.
pub fn collect_protocol_metrics(table: &Table, roles: &ColumnRoles) -> HashMap<String, ProtocolMetrics> {
    let mut out = HashMap::new();
    for row in &table.rows {
        let protocol = row.get(roles.protocol);
        if protocol.is_empty() || out.contains_key(protocol) {
            continue;
        }
        let metrics = ProtocolMetrics {
            comm_rounds: roles.comm_rounds.and_then(|idx| parse_comm_rounds(row.get(idx))),
            data_sent: roles
                .data_sent
                .map(|idx| row.get(idx).to_string())
                .filter(|s| !s.is_empty()),
        };
        out.insert(protocol.to_string(), metrics);
    }
    out
}

/// Parse a rounds cell: `~` marks an estimate and is dropped, `NA` means unknown.
pub fn parse_comm_rounds(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let s = s.strip_prefix('~').unwrap_or(s).trim();
    if s.is_empty() || s.eq_ignore_ascii_case("NA") {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn normalize_header_name(name: &str) -> &str {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    name.trim().trim_start_matches('\u{feff}')
}

fn sorted_file_names(dir: &Path) -> Result<Vec<String>, AppError> {
    let entries = fs::read_dir(dir).map_err(|e| AppError::io("list directory", dir, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AppError::io("list directory", dir, e))?;
        if entry.path().is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
