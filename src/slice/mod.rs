//! Partitioning of the result table into controlled-variable slices.
//!
//! Rows arrive grouped by protocol. Whenever the protocol changes we open a new
//! group and snapshot the values of every tracked variable that is *not* free;
//! from then on a row is kept only if it agrees with that snapshot. The result
//! is a sequence of `SliceGroup`s, one per protocol visit, ready to be written.
//!
//! Partitioning is pure: file handling lives in `io::export`.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::domain::TrackedVariable;
use crate::io::ingest::{ColumnRoles, Row, Table};

/// Per-variable fixed value for the current group; `None` means "don't care".
type FixedValues = [Option<String>; TrackedVariable::COUNT];

/// Lines collected for one protocol visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceGroup {
    /// Output file stem (`<Tag>[<Tag>]<protocol>`).
    pub stem: String,
    pub protocol: String,
    /// Output lines; each line is written tab-joined.
    pub lines: Vec<Vec<String>>,
}

impl SliceGroup {
    pub fn file_name(&self) -> String {
        format!("{}.txt", self.stem)
    }
}

enum GroupState {
    NoGroup,
    InGroup { protocol: String, fixed: FixedValues },
}

/// Slice the table with `free` as the only varying variable.
///
/// When `InputSize` is held fixed and `max_input` is known, it is pinned to the
/// largest input instead of the first value seen for the protocol.
pub fn partition_2d(
    table: &Table,
    roles: &ColumnRoles,
    free: TrackedVariable,
    max_input: Option<&str>,
) -> Vec<SliceGroup> {
    let Some(free_idx) = roles.variable(free) else {
        return Vec::new();
    };
    let runtime = roles.runtime;
    partition(table, roles, &[free], free.tag(), max_input, |row| {
        vec![row.get(free_idx).to_string(), row.get(runtime).to_string()]
    })
}

/// Slice the table with both variables of `pair` varying.
pub fn partition_3d(
    table: &Table,
    roles: &ColumnRoles,
    pair: (TrackedVariable, TrackedVariable),
) -> Vec<SliceGroup> {
    let (first, second) = pair;
    let (Some(first_idx), Some(second_idx)) = (roles.variable(first), roles.variable(second)) else {
        return Vec::new();
    };
    let runtime = roles.runtime;
    let prefix = format!("{}{}", first.tag(), second.tag());
    partition(table, roles, &[first, second], &prefix, None, |row| {
        vec![
            row.get(first_idx).to_string(),
            row.get(second_idx).to_string(),
            row.get(runtime).to_string(),
        ]
    })
}

fn partition<F>(
    table: &Table,
    roles: &ColumnRoles,
    free: &[TrackedVariable],
    prefix: &str,
    max_input: Option<&str>,
    emit: F,
) -> Vec<SliceGroup>
where
    F: Fn(&Row) -> Vec<String>,
{
    let mut groups: Vec<SliceGroup> = Vec::new();
    let mut state = GroupState::NoGroup;

    for row in &table.rows {
        let protocol = row.get(roles.protocol);
        // Trailing separator rows carry no protocol.
        if protocol.is_empty() {
            continue;
        }

        let entering = match &state {
            GroupState::NoGroup => true,
            GroupState::InGroup { protocol: current, .. } => current != protocol,
        };
        if entering {
            let fixed = snapshot(row, roles, free, max_input);
            debug!(protocol, prefix, fixed = ?fixed, "entering protocol group");
            groups.push(SliceGroup {
                stem: format!("{prefix}{protocol}"),
                protocol: protocol.to_string(),
                lines: Vec::new(),
            });
            state = GroupState::InGroup {
                protocol: protocol.to_string(),
                fixed,
            };
        }

        let GroupState::InGroup { fixed, .. } = &state else {
            continue;
        };
        if row_matches(row, roles, fixed) {
            if let Some(group) = groups.last_mut() {
                group.lines.push(emit(row));
            }
        }
    }

    groups
}

fn snapshot(
    row: &Row,
    roles: &ColumnRoles,
    free: &[TrackedVariable],
    max_input: Option<&str>,
) -> FixedValues {
    let mut fixed: FixedValues = Default::default();
    for (var, idx) in roles.present_variables() {
        if free.contains(&var) {
            continue;
        }
        fixed[var.index()] = match (var, max_input) {
            (TrackedVariable::InputSize, Some(max)) => Some(max.to_string()),
            _ => Some(row.get(idx).to_string()),
        };
    }
    fixed
}

fn row_matches(row: &Row, roles: &ColumnRoles, fixed: &FixedValues) -> bool {
    roles.present_variables().all(|(var, idx)| match &fixed[var.index()] {
        None => true,
        Some(value) => values_equal(value, row.get(idx)),
    })
}

/// Cell equality: identical text, or the same number written differently.
pub fn values_equal(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    if a == b {
        return true;
    }
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

/// Stable-sort rows by `sort_idx` inside each protocol.
///
/// Protocols keep their first-appearance order so protocol groups stay
/// contiguous; rows without a protocol move to the end.
pub fn sort_within_protocols(table: &mut Table, sort_idx: usize, protocol_idx: usize) {
    let rank: HashMap<String, usize> = table
        .protocols(protocol_idx)
        .into_iter()
        .enumerate()
        .map(|(i, p)| (p, i))
        .collect();

    table.rows.sort_by(|a, b| {
        let ra = rank.get(a.get(protocol_idx)).copied().unwrap_or(usize::MAX);
        let rb = rank.get(b.get(protocol_idx)).copied().unwrap_or(usize::MAX);
        ra.cmp(&rb)
            .then_with(|| compare_cells(a.get(sort_idx), b.get(sort_idx)))
    });
}

fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::parse_table;

    fn table(text: &str) -> (Table, ColumnRoles) {
        let table = parse_table(text.as_bytes()).unwrap();
        let roles = ColumnRoles::resolve(&table.header, None).unwrap();
        (table, roles)
    }

    const TWO_VARS: &str = "protocol;latencies(ms);bandwidths(Mbs);runtime(s)\n\
        mascot;1;100;1.0\n\
        mascot;2;100;2.0\n\
        mascot;1;200;0.5\n\
        mascot;3;100;3.0\n\
        shamir;1;50;0.1\n\
        shamir;2;50;0.2\n\
        ;;;\n";

    #[test]
    fn fixes_other_variables_at_first_value_per_protocol() {
        let (table, roles) = table(TWO_VARS);
        let groups = partition_2d(&table, &roles, TrackedVariable::Latency, None);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].stem, "Lat_mascot");
        let xs: Vec<&str> = groups[0].lines.iter().map(|l| l[0].as_str()).collect();
        assert_eq!(xs, ["1", "2", "3"]);
        assert_eq!(groups[0].lines[2], vec!["3".to_string(), "3.0".to_string()]);

        assert_eq!(groups[1].file_name(), "Lat_shamir.txt");
        assert_eq!(groups[1].lines.len(), 2);
    }

    #[test]
    fn absent_variable_yields_no_groups() {
        let (table, roles) = table(TWO_VARS);
        assert!(partition_2d(&table, &roles, TrackedVariable::PacketDrop, None).is_empty());
        assert!(
            partition_3d(&table, &roles, (TrackedVariable::Latency, TrackedVariable::PacketDrop))
                .is_empty()
        );
    }

    #[test]
    fn input_size_is_pinned_to_max_input() {
        let text = "protocol;latencies(ms);input_size;runtime(s)\n\
            mascot;1;10;1.0\n\
            mascot;2;10;2.0\n\
            mascot;1;1000;5.0\n\
            mascot;2;1000;6.0\n";
        let (table, roles) = table(text);

        let pinned = partition_2d(&table, &roles, TrackedVariable::Latency, Some("1000"));
        let ys: Vec<&str> = pinned[0].lines.iter().map(|l| l[1].as_str()).collect();
        assert_eq!(ys, ["5.0", "6.0"]);

        let unpinned = partition_2d(&table, &roles, TrackedVariable::Latency, None);
        let ys: Vec<&str> = unpinned[0].lines.iter().map(|l| l[1].as_str()).collect();
        assert_eq!(ys, ["1.0", "2.0"]);

        // The input-size slice itself ignores the pin.
        let inp = partition_2d(&table, &roles, TrackedVariable::InputSize, Some("1000"));
        assert_eq!(inp[0].stem, "Inp_mascot");
        assert_eq!(inp[0].lines.len(), 2);
    }

    #[test]
    fn reentered_protocol_starts_a_new_group() {
        let text = "protocol;latencies(ms);bandwidths(Mbs);runtime(s)\n\
            mascot;1;100;1.0\n\
            shamir;1;10;0.1\n\
            mascot;2;200;2.0\n\
            mascot;3;200;3.0\n";
        let (table, roles) = table(text);
        let groups = partition_2d(&table, &roles, TrackedVariable::Latency, None);
        let stems: Vec<&str> = groups.iter().map(|g| g.stem.as_str()).collect();
        assert_eq!(stems, ["Lat_mascot", "Lat_shamir", "Lat_mascot"]);
        // Second visit snapshots bandwidth=200.
        assert_eq!(groups[2].lines.len(), 2);
    }

    #[test]
    fn three_d_keeps_both_pair_variables_free() {
        let text = "protocol;latencies(ms);bandwidths(Mbs);cpus;runtime(s)\n\
            mascot;1;100;4;1.0\n\
            mascot;1;200;4;0.8\n\
            mascot;2;100;4;2.0\n\
            mascot;2;200;8;1.1\n";
        let (table, roles) = table(text);
        let groups = partition_3d(&table, &roles, (TrackedVariable::Latency, TrackedVariable::Bandwidth));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].stem, "Lat_Bwd_mascot");
        assert_eq!(groups[0].lines.len(), 3);
        assert_eq!(groups[0].lines[1], vec!["1", "200", "0.8"]);
    }

    #[test]
    fn numeric_equality_tolerates_formatting() {
        assert!(values_equal("10", "10.0"));
        assert!(values_equal(" a ", "a"));
        assert!(!values_equal("10", "11"));
        assert!(!values_equal("NA", "10"));
    }

    #[test]
    fn sort_keeps_protocol_blocks_contiguous() {
        let text = "protocol;latencies(ms);runtime(s)\n\
            shamir;20;2\n\
            mascot;10;1\n\
            shamir;5;1\n\
            mascot;2;1\n";
        let (mut table, roles) = table(text);
        sort_within_protocols(&mut table, 1, roles.protocol);
        let order: Vec<(&str, &str)> = table.rows.iter().map(|r| (r.get(0), r.get(1))).collect();
        assert_eq!(
            order,
            [("shamir", "5"), ("shamir", "20"), ("mascot", "2"), ("mascot", "10")]
        );
    }
}
