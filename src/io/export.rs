//! Output files: slice data for plotting tools plus the summary reports.
//!
//! Layout under the output root:
//!
//! ```text
//! 2D/<Tag><protocol>.txt          x \t y
//! 3D/<Tag1><Tag2><protocol>.txt   x \t y \t z   (blank line between x blocks)
//! runtimes2D.txt
//! protocol_infos.txt
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::domain::OutputMode;
use crate::error::AppError;
use crate::report::RunReport;
use crate::slice::SliceGroup;

pub const RUNTIMES_FILE: &str = "runtimes2D.txt";
pub const PROTOCOL_INFOS_FILE: &str = "protocol_infos.txt";

/// Resolved output directories for one run.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub dir_2d: PathBuf,
    pub dir_3d: PathBuf,
}

impl OutputLayout {
    /// Create (or reuse) the output directories according to `mode`.
    pub fn prepare(data_dir: &Path, mode: OutputMode) -> Result<Self, AppError> {
        let root = match mode {
            OutputMode::Overwrite | OutputMode::Append => data_dir.join("parsed"),
            OutputMode::Versioned => fresh_versioned_root(data_dir),
        };
        let layout = Self {
            dir_2d: root.join("2D"),
            dir_3d: root.join("3D"),
            root,
        };

        for dir in [&layout.root, &layout.dir_2d, &layout.dir_3d] {
            fs::create_dir_all(dir).map_err(|e| AppError::io("create output directory", dir, e))?;
        }

        if mode == OutputMode::Overwrite {
            layout.clear_previous_run()?;
        }

        info!(root = %layout.root.display(), ?mode, "output directory ready");
        Ok(layout)
    }

    pub fn runtimes_path(&self) -> PathBuf {
        self.root.join(RUNTIMES_FILE)
    }

    pub fn protocol_infos_path(&self) -> PathBuf {
        self.root.join(PROTOCOL_INFOS_FILE)
    }

    fn clear_previous_run(&self) -> Result<(), AppError> {
        let mut removed = 0usize;
        for dir in [&self.dir_2d, &self.dir_3d] {
            let entries = fs::read_dir(dir).map_err(|e| AppError::io("list directory", dir, e))?;
            for entry in entries {
                let path = entry.map_err(|e| AppError::io("list directory", dir, e))?.path();
                if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
                    fs::remove_file(&path).map_err(|e| AppError::io("remove stale slice file", &path, e))?;
                    removed += 1;
                }
            }
        }
        for path in [self.runtimes_path(), self.protocol_infos_path()] {
            if path.is_file() {
                fs::remove_file(&path).map_err(|e| AppError::io("remove stale report", &path, e))?;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "cleared files from previous run");
        }
        Ok(())
    }
}

fn fresh_versioned_root(data_dir: &Path) -> PathBuf {
    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let base = data_dir.join(format!("parsed-{ts}"));
    if !base.exists() {
        return base;
    }
    (1..)
        .map(|n| data_dir.join(format!("parsed-{ts}-{n}")))
        .find(|p| !p.exists())
        .unwrap_or(base)
}

/// Append every group's lines to its slice file in `dir`.
///
/// Each group holds its file open only while its own lines are written.
/// Returns the distinct files touched, in first-write order.
pub fn write_groups(dir: &Path, groups: &[SliceGroup]) -> Result<Vec<PathBuf>, AppError> {
    let mut touched: Vec<PathBuf> = Vec::new();
    for group in groups {
        let path = dir.join(group.file_name());
        let file = open_append(&path)?;
        let mut out = BufWriter::new(file);
        for line in &group.lines {
            writeln!(out, "{}", line.join("\t")).map_err(|e| AppError::io("write slice file", &path, e))?;
        }
        out.flush().map_err(|e| AppError::io("write slice file", &path, e))?;

        if !touched.contains(&path) {
            touched.push(path);
        }
    }
    Ok(touched)
}

/// Insert a blank line wherever the first column changes between lines.
///
/// Gnuplot-style 3D tools read each blank-separated block as one grid row.
/// Existing blank lines are kept, so running this twice changes nothing.
pub fn add_grid_separators(path: &Path) -> Result<(), AppError> {
    let text = fs::read_to_string(path).map_err(|e| AppError::io("read 3D slice file", path, e))?;
    let separated = separate_blocks(&text);
    if separated != text {
        fs::write(path, separated).map_err(|e| AppError::io("rewrite 3D slice file", path, e))?;
    }
    Ok(())
}

fn separate_blocks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_x: Option<&str> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            out.push('\n');
            previous_x = None;
            continue;
        }
        let x = line.split('\t').next().unwrap_or("");
        if previous_x.is_some_and(|prev| prev != x) {
            out.push('\n');
        }
        out.push_str(line);
        out.push('\n');
        previous_x = Some(x);
    }
    out
}

/// Read the `(x, y)` points of a 2D slice file.
///
/// Blank lines are ignored; lines that do not hold two numbers are skipped
/// with a warning.
pub fn read_slice_file(path: &Path) -> Result<Vec<(f64, f64)>, AppError> {
    let file = File::open(path).map_err(|e| AppError::io("open 2D slice file", path, e))?;
    let mut points = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| AppError::io("read 2D slice file", path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_point(&line) {
            Some(p) => points.push(p),
            None => warn!(file = %path.display(), line = idx + 1, content = %line, "skipping unparsable datapoint"),
        }
    }
    Ok(points)
}

fn parse_point(line: &str) -> Option<(f64, f64)> {
    let mut parts = line.split('\t');
    let x = parts.next()?.trim().parse::<f64>().ok()?;
    let y = parts.next()?.trim().parse::<f64>().ok()?;
    (x.is_finite() && y.is_finite()).then_some((x, y))
}

/// Append rendered report text to `path`.
pub fn append_text(path: &Path, text: &str) -> Result<(), AppError> {
    let mut file = open_append(path)?;
    file.write_all(text.as_bytes())
        .map_err(|e| AppError::io("write report", path, e))
}

/// Write the run report as pretty JSON.
pub fn write_report_json(path: &Path, report: &RunReport) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| AppError::io("create JSON export", path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, report)
        .map_err(|e| AppError::input(format!("Failed to write JSON export '{}': {e}", path.display())))?;
    out.flush().map_err(|e| AppError::io("write JSON export", path, e))
}

fn open_append(path: &Path) -> Result<File, AppError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::io("open", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(stem: &str, lines: &[&[&str]]) -> SliceGroup {
        SliceGroup {
            stem: stem.to_string(),
            protocol: "p".to_string(),
            lines: lines
                .iter()
                .map(|l| l.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn separators_mark_each_change_of_x() {
        let text = "1\t10\t0.1\n1\t20\t0.2\n2\t10\t0.3\n2\t20\t0.4\n3\t10\t0.5\n";
        let out = separate_blocks(text);
        assert_eq!(
            out,
            "1\t10\t0.1\n1\t20\t0.2\n\n2\t10\t0.3\n2\t20\t0.4\n\n3\t10\t0.5\n"
        );
        assert_eq!(separate_blocks(&out), out);
    }

    #[test]
    fn groups_of_same_stem_share_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let groups = vec![
            group("Lat_mascot", &[&["1", "0.5"], &["2", "0.7"]]),
            group("Lat_shamir", &[&["1", "0.1"]]),
            group("Lat_mascot", &[&["3", "0.9"]]),
        ];
        let touched = write_groups(dir.path(), &groups).unwrap();
        assert_eq!(touched.len(), 2);

        let text = fs::read_to_string(dir.path().join("Lat_mascot.txt")).unwrap();
        assert_eq!(text, "1\t0.5\n2\t0.7\n3\t0.9\n");

        let points = read_slice_file(&touched[0]).unwrap();
        assert_eq!(points, vec![(1.0, 0.5), (2.0, 0.7), (3.0, 0.9)]);
    }

    #[test]
    fn read_slice_skips_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bwd_x.txt");
        fs::write(&path, "10\t1.5\n\nNA\t2.0\n20\t0.75\n30\n").unwrap();
        assert_eq!(read_slice_file(&path).unwrap(), vec![(10.0, 1.5), (20.0, 0.75)]);
    }

    #[test]
    fn overwrite_mode_clears_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let first = OutputLayout::prepare(dir.path(), OutputMode::Overwrite).unwrap();
        fs::write(first.dir_2d.join("Lat_old.txt"), "1\t1\n").unwrap();
        fs::write(first.dir_2d.join("keep.dat"), "x").unwrap();
        append_text(&first.runtimes_path(), "old\n").unwrap();

        let second = OutputLayout::prepare(dir.path(), OutputMode::Overwrite).unwrap();
        assert!(!second.dir_2d.join("Lat_old.txt").exists());
        assert!(second.dir_2d.join("keep.dat").exists());
        assert!(!second.runtimes_path().exists());
    }

    #[test]
    fn append_mode_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let first = OutputLayout::prepare(dir.path(), OutputMode::Append).unwrap();
        append_text(&first.runtimes_path(), "old\n").unwrap();

        let second = OutputLayout::prepare(dir.path(), OutputMode::Append).unwrap();
        append_text(&second.runtimes_path(), "new\n").unwrap();
        assert_eq!(fs::read_to_string(second.runtimes_path()).unwrap(), "old\nnew\n");
    }

    #[test]
    fn versioned_mode_never_reuses_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let a = OutputLayout::prepare(dir.path(), OutputMode::Versioned).unwrap();
        let b = OutputLayout::prepare(dir.path(), OutputMode::Versioned).unwrap();
        assert_ne!(a.root, b.root);
        assert!(a.dir_3d.is_dir() && b.dir_3d.is_dir());
    }
}
