//! The parse pipeline shared by the CLI and the tests.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! table -> column roles -> classification -> 2D/3D slices -> fits -> winners -> reports
//!
//! The CLI can then focus on argument handling and exit codes.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::domain::{ParseConfig, SecurityClass, TrackedVariable, VARIABLE_PAIRS};
use crate::error::AppError;
use crate::fit::fit_slice;
use crate::io::export::{
    OutputLayout, add_grid_separators, append_text, read_slice_file, write_groups, write_report_json,
};
use crate::io::ingest::{
    ColumnRoles, Table, collect_protocol_metrics, find_results_table, find_summary_file, load_table,
    read_max_input,
};
use crate::report::{RunReport, SliceReport, WinnerTable, format_protocol_infos, format_runtimes};
use crate::slice::{SliceGroup, partition_2d, partition_3d, sort_within_protocols};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub layout: OutputLayout,
    pub report: RunReport,
    pub winners: WinnerTable,
}

/// A 2D slice file produced in this run.
struct SliceFile {
    variable: TrackedVariable,
    protocol: String,
    file_name: String,
    path: PathBuf,
}

/// Execute the full parse pipeline for one test-run folder.
pub fn run_parse(config: &ParseConfig) -> Result<RunOutput, AppError> {
    // 1) Load the table and resolve column roles.
    let table_path = find_results_table(&config.data_dir)?;
    let mut table = load_table(&table_path)?;
    let roles = ColumnRoles::resolve(&table.header, config.sort_column.as_deref())?;
    if let Some(sort_idx) = roles.sort_key {
        sort_within_protocols(&mut table, sort_idx, roles.protocol);
        debug!(column = %table.header[sort_idx], "rows sorted within protocols");
    }

    // 2) Classify every protocol before anything is written.
    let classes = classify_protocols(&table, &roles)?;
    let max_input = resolve_max_input(config, &roles)?;
    let metrics = collect_protocol_metrics(&table, &roles);

    let layout = OutputLayout::prepare(&config.data_dir, config.output_mode)?;

    // 3) 2D slices: one file per (variable, protocol).
    let mut slice_files = Vec::new();
    for (variable, _) in roles.present_variables() {
        let groups = partition_2d(&table, &roles, variable, max_input.as_deref());
        write_groups(&layout.dir_2d, &groups)?;
        for (protocol, file_name) in distinct_files(&groups) {
            slice_files.push(SliceFile {
                variable,
                path: layout.dir_2d.join(&file_name),
                protocol,
                file_name,
            });
        }
    }
    info!(files = slice_files.len(), "2D slices written");

    // 4) 3D slices: one file per (variable pair, protocol), grid-separated.
    let mut files_3d = Vec::new();
    for pair in VARIABLE_PAIRS {
        let groups = partition_3d(&table, &roles, pair);
        if groups.is_empty() {
            continue;
        }
        for path in write_groups(&layout.dir_3d, &groups)? {
            add_grid_separators(&path)?;
            files_3d.push(path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
        }
    }
    info!(files = files_3d.len(), "3D slices written");

    // 5) Fit every 2D slice and fold successful fits into the winner table.
    let mut winners = WinnerTable::new();
    let mut slices = Vec::with_capacity(slice_files.len());
    for file in slice_files {
        let points = read_slice_file(&file.path)?;
        let comm_rounds = metrics.get(&file.protocol).and_then(|m| m.comm_rounds);
        let outcome = fit_slice(file.variable, &points, comm_rounds);

        if let Some(fit) = outcome.fitted() {
            // Every table protocol was classified in step 2.
            if let Some(&class) = classes.get(&file.protocol) {
                winners.offer(class, file.variable, &file.protocol, fit.leading);
            }
        }
        debug!(file = %file.file_name, points = points.len(), ?outcome, "slice processed");

        slices.push(SliceReport {
            variable: file.variable,
            protocol: file.protocol,
            file_name: file.file_name,
            outcome,
        });
    }

    // 6) Summaries.
    append_text(&layout.runtimes_path(), &format_runtimes(&slices, &winners))?;
    append_text(&layout.protocol_infos_path(), &format_protocol_infos(&slices))?;

    let report = RunReport {
        table: table_path.display().to_string(),
        metrics: metrics.into_iter().collect(),
        slices,
        files_3d,
        winners: winners.entries(),
    };
    if let Some(path) = &config.export_json {
        write_report_json(path, &report)?;
        info!(path = %path.display(), "JSON report exported");
    }

    info!(
        slices = report.slices.len(),
        fitted = report.slices.iter().filter(|s| s.outcome.fitted().is_some()).count(),
        winners = report.winners.len(),
        "run complete"
    );

    Ok(RunOutput {
        layout,
        report,
        winners,
    })
}

fn classify_protocols(table: &Table, roles: &ColumnRoles) -> Result<HashMap<String, SecurityClass>, AppError> {
    let mut classes = HashMap::new();
    for protocol in table.protocols(roles.protocol) {
        let class = SecurityClass::classify(&protocol)?;
        debug!(protocol = %protocol, class = class.display_name(), "protocol classified");
        classes.insert(protocol, class);
    }
    Ok(classes)
}

/// Max input size from the run summary; only required when input size is tracked.
fn resolve_max_input(config: &ParseConfig, roles: &ColumnRoles) -> Result<Option<String>, AppError> {
    if roles.variable(TrackedVariable::InputSize).is_none() {
        return Ok(None);
    }
    let summary = find_summary_file(&config.data_dir)?.ok_or_else(|| {
        AppError::input(format!(
            "Could not find a run summary (E*-run-summary.dat) in '{}'; it is needed to pin the input size.",
            config.data_dir.display()
        ))
    })?;
    let max_input = read_max_input(&summary)?.ok_or_else(|| {
        AppError::input(format!("Run summary '{}' has no `Inputs` line.", summary.display()))
    })?;
    info!(max_input = %max_input, "input size pinned to largest input");
    Ok(Some(max_input))
}

/// Distinct `(protocol, file name)` pairs in first-appearance order.
fn distinct_files(groups: &[SliceGroup]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    for group in groups {
        let file_name = group.file_name();
        if !out.iter().any(|(_, f)| *f == file_name) {
            out.push((group.protocol.clone(), file_name));
        }
    }
    out
}
