//! Shared domain types.
//!
//! The tracked-variable registry is a fixed, ordered enum: every per-variable
//! property (table column, file tag, model family) hangs off the variant instead
//! of living in parallel arrays indexed by position.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// An experiment parameter varied across benchmark runs.
///
/// The declaration order is significant: it is the slicing order, the report
/// order, and `InputSize` being last is what the max-input adaptation keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedVariable {
    Latency,
    Bandwidth,
    PacketDrop,
    Frequency,
    Quota,
    CpuCount,
    InputSize,
}

impl TrackedVariable {
    pub const ALL: [TrackedVariable; 7] = [
        TrackedVariable::Latency,
        TrackedVariable::Bandwidth,
        TrackedVariable::PacketDrop,
        TrackedVariable::Frequency,
        TrackedVariable::Quota,
        TrackedVariable::CpuCount,
        TrackedVariable::InputSize,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Header name of the column holding this variable in the result table.
    pub fn column_name(self) -> &'static str {
        match self {
            TrackedVariable::Latency => "latencies(ms)",
            TrackedVariable::Bandwidth => "bandwidths(Mbs)",
            TrackedVariable::PacketDrop => "packetdrops(%)",
            TrackedVariable::Frequency => "freqs(GHz)",
            TrackedVariable::Quota => "quotas(%)",
            TrackedVariable::CpuCount => "cpus",
            TrackedVariable::InputSize => "input_size",
        }
    }

    /// Short prefix used in output file names and in the winner report.
    pub fn tag(self) -> &'static str {
        match self {
            TrackedVariable::Latency => "Lat_",
            TrackedVariable::Bandwidth => "Bwd_",
            TrackedVariable::PacketDrop => "Pdr_",
            TrackedVariable::Frequency => "Frq_",
            TrackedVariable::Quota => "Quo_",
            TrackedVariable::CpuCount => "Cpu_",
            TrackedVariable::InputSize => "Inp_",
        }
    }

    pub fn model_family(self) -> ModelFamily {
        match self {
            TrackedVariable::Latency => ModelFamily::Linear,
            TrackedVariable::Bandwidth => ModelFamily::Inverse,
            TrackedVariable::PacketDrop => ModelFamily::Exponential,
            TrackedVariable::Frequency
            | TrackedVariable::Quota
            | TrackedVariable::CpuCount
            | TrackedVariable::InputSize => ModelFamily::Quadratic,
        }
    }

    /// Stable index into per-variable tables (`[_; TrackedVariable::COUNT]`).
    pub fn index(self) -> usize {
        match self {
            TrackedVariable::Latency => 0,
            TrackedVariable::Bandwidth => 1,
            TrackedVariable::PacketDrop => 2,
            TrackedVariable::Frequency => 3,
            TrackedVariable::Quota => 4,
            TrackedVariable::CpuCount => 5,
            TrackedVariable::InputSize => 6,
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.column_name() == name)
    }
}

/// Variable combinations sliced for 3D views, in output order.
pub const VARIABLE_PAIRS: [(TrackedVariable, TrackedVariable); 7] = [
    (TrackedVariable::InputSize, TrackedVariable::Latency),
    (TrackedVariable::InputSize, TrackedVariable::Bandwidth),
    (TrackedVariable::Latency, TrackedVariable::Frequency),
    (TrackedVariable::Bandwidth, TrackedVariable::Frequency),
    (TrackedVariable::Latency, TrackedVariable::Bandwidth),
    (TrackedVariable::Latency, TrackedVariable::PacketDrop),
    (TrackedVariable::Bandwidth, TrackedVariable::PacketDrop),
];

/// Analytic curve family fitted to a 2D slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// `y = a*x + b`
    Linear,
    /// `y = a*x^2 + b*x + c`
    Quadratic,
    /// `y = a*e^(b*x) + c`
    Exponential,
    /// `y = a/x + b`
    Inverse,
}

impl ModelFamily {
    /// Number of fitted coefficients.
    pub fn param_count(self) -> usize {
        match self {
            ModelFamily::Linear | ModelFamily::Inverse => 2,
            ModelFamily::Quadratic | ModelFamily::Exponential => 3,
        }
    }
}

/// How a run treats output files left behind by earlier runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Remove previous slice files and truncate the summaries.
    Overwrite,
    /// Append to whatever is already there (slice files accumulate rows).
    Append,
    /// Write into a fresh, timestamped output directory.
    Versioned,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// Test-run folder produced by the benchmark harness.
    pub data_dir: PathBuf,
    /// Optional column to sort rows by (inside each protocol) before slicing.
    pub sort_column: Option<String>,
    pub output_mode: OutputMode,
    /// Optional JSON dump of slice outcomes and winners.
    pub export_json: Option<PathBuf>,
}

impl ParseConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            sort_column: None,
            output_mode: OutputMode::Overwrite,
            export_json: None,
        }
    }
}

/// Communication metrics recorded for a protocol (first row it appears in).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolMetrics {
    /// Communication rounds, `None` when the column is absent or reads `NA`.
    pub comm_rounds: Option<f64>,
    /// Raw value of the total data-sent column.
    pub data_sent: Option<String>,
}

/// Successful fit of one 2D slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceFit {
    pub family: ModelFamily,
    /// Coefficients in reporting order (`a, b[, c]`).
    pub coefficients: Vec<f64>,
    /// Coefficient used to rank protocols; lower is better.
    pub leading: f64,
    pub n_points: usize,
}

/// Result of fitting one 2D slice.
///
/// Only `Fitted` takes part in winner selection; every other variant is a
/// recorded non-fit that leaves the rest of the run untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FitOutcome {
    Fitted(SliceFit),
    /// Fewer than two points.
    NoData,
    /// Fewer than the minimum number of points for a reliable fit.
    Insufficient { n_points: usize },
    /// Fit converged but the parameters are not physically meaningful.
    Rejected { reason: String },
    /// Solver could not produce finite parameters.
    Failed { reason: String },
}

impl FitOutcome {
    pub fn fitted(&self) -> Option<&SliceFit> {
        match self {
            FitOutcome::Fitted(fit) => Some(fit),
            _ => None,
        }
    }
}
