//! Text rendering of `runtimes2D.txt` and `protocol_infos.txt`.
//!
//! The winner listing at the end of `runtimes2D.txt` is parsed by the plotting
//! scripts: each variable line holds one comma-terminated slot per security
//! class, in class order, and a class without a winner leaves its slot empty.

use crate::domain::{FitOutcome, ModelFamily, SecurityClass, SliceFit, TrackedVariable};
use crate::report::{SliceReport, WinnerTable};

/// Render `runtimes2D.txt`: one line per slice, then the winner tables.
pub fn format_runtimes(slices: &[SliceReport], winners: &WinnerTable) -> String {
    let mut out = String::new();

    for slice in slices {
        out.push_str(&format!("{} -> {}\n", slice.file_name, describe_outcome(&slice.outcome)));
    }

    out.push_str("\n\n\nProtocol Winners:\n\n");
    for class in SecurityClass::ALL {
        out.push_str(&format!("{} protocols:\n", class.display_name()));
        for variable in TrackedVariable::ALL {
            if let Some(w) = winners.get(class, variable) {
                out.push_str(&format!(
                    "- {} was best for {} with a coefficient of: {}\n",
                    w.protocol,
                    variable.tag(),
                    w.coefficient
                ));
            }
        }
    }

    out.push_str("\nWinners:\n");
    for variable in TrackedVariable::ALL {
        let slots: Vec<Option<&str>> = SecurityClass::ALL
            .into_iter()
            .map(|class| winners.get(class, variable).map(|w| w.protocol.as_str()))
            .collect();
        if slots.iter().all(Option::is_none) {
            continue;
        }
        out.push_str(variable.tag());
        out.push(':');
        for slot in slots {
            out.push_str(slot.unwrap_or(""));
            out.push(',');
        }
        out.push('\n');
    }

    out
}

/// Render `protocol_infos.txt`: rounds-normalized latency slope per latency slice.
pub fn format_protocol_infos(slices: &[SliceReport]) -> String {
    let mut out = String::new();
    for slice in slices.iter().filter(|s| s.variable == TrackedVariable::Latency) {
        match slice.outcome.fitted() {
            Some(fit) => out.push_str(&format!("{} -> {}\n", slice.file_name, fit.leading)),
            None => out.push_str(&format!("{} -> NA\n", slice.file_name)),
        }
    }
    out
}

/// Human-readable equation or non-fit notice.
pub fn describe_outcome(outcome: &FitOutcome) -> String {
    match outcome {
        FitOutcome::Fitted(fit) => format_equation(fit),
        FitOutcome::NoData => "no datapoints.".to_string(),
        FitOutcome::Insufficient { .. } => "not enough datapoints.".to_string(),
        FitOutcome::Rejected { reason } | FitOutcome::Failed { reason } => format!("error: {reason}"),
    }
}

fn format_equation(fit: &SliceFit) -> String {
    let c = &fit.coefficients;
    match fit.family {
        ModelFamily::Linear => format!("f(x) = {}*x + {}", c[0], c[1]),
        ModelFamily::Quadratic => format!("f(x) = {}*x**2 + {}*x**1 + {}", c[0], c[1], c[2]),
        ModelFamily::Exponential => format!("f(x) = {}*e^({}*x) + {}", c[0], c[1], c[2]),
        ModelFamily::Inverse => format!("f(x) = {}/x + {}", c[0], c[1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::PREPROCESSING_REASON;

    fn slice(variable: TrackedVariable, protocol: &str, outcome: FitOutcome) -> SliceReport {
        SliceReport {
            variable,
            protocol: protocol.to_string(),
            file_name: format!("{}{protocol}.txt", variable.tag()),
            outcome,
        }
    }

    fn fitted(family: ModelFamily, coefficients: Vec<f64>, leading: f64) -> FitOutcome {
        FitOutcome::Fitted(SliceFit {
            family,
            coefficients,
            leading,
            n_points: 6,
        })
    }

    #[test]
    fn equations_per_family() {
        assert_eq!(
            describe_outcome(&fitted(ModelFamily::Linear, vec![0.5, 2.0], 0.25)),
            "f(x) = 0.5*x + 2"
        );
        assert_eq!(
            describe_outcome(&fitted(ModelFamily::Quadratic, vec![1.0, -0.5, 3.0], 1.0)),
            "f(x) = 1*x**2 + -0.5*x**1 + 3"
        );
        assert_eq!(
            describe_outcome(&fitted(ModelFamily::Exponential, vec![2.0, 0.3, 1.0], 2.0)),
            "f(x) = 2*e^(0.3*x) + 1"
        );
        assert_eq!(
            describe_outcome(&fitted(ModelFamily::Inverse, vec![80.0, 2.5], 80.0)),
            "f(x) = 80/x + 2.5"
        );
    }

    #[test]
    fn non_fits_are_never_equations() {
        assert_eq!(describe_outcome(&FitOutcome::NoData), "no datapoints.");
        assert_eq!(
            describe_outcome(&FitOutcome::Insufficient { n_points: 3 }),
            "not enough datapoints."
        );
        assert_eq!(
            describe_outcome(&FitOutcome::Rejected {
                reason: PREPROCESSING_REASON.to_string()
            }),
            "error: preprocessing phase"
        );
        assert_eq!(
            describe_outcome(&FitOutcome::Failed {
                reason: "zero bandwidth in slice".to_string()
            }),
            "error: zero bandwidth in slice"
        );
    }

    #[test]
    fn runtimes_layout() {
        let slices = vec![
            slice(TrackedVariable::Latency, "mascot", fitted(ModelFamily::Linear, vec![0.5, 2.0], 0.25)),
            slice(TrackedVariable::Latency, "shamir", FitOutcome::Insufficient { n_points: 4 }),
        ];
        let mut winners = WinnerTable::new();
        winners.offer(
            SecurityClass::MaliciousDishonestMajority,
            TrackedVariable::Latency,
            "mascot",
            0.25,
        );
        winners.offer(
            SecurityClass::SemiHonestHonestMajority,
            TrackedVariable::Latency,
            "atlas",
            0.125,
        );

        let text = format_runtimes(&slices, &winners);
        let expected = "Lat_mascot.txt -> f(x) = 0.5*x + 2\n\
            Lat_shamir.txt -> not enough datapoints.\n\
            \n\n\nProtocol Winners:\n\n\
            Malicious, Dishonest Majority protocols:\n\
            - mascot was best for Lat_ with a coefficient of: 0.25\n\
            Malicious, Honest Majority protocols:\n\
            Semi-Honest, Dishonest Majority protocols:\n\
            Semi-Honest, Honest Majority protocols:\n\
            - atlas was best for Lat_ with a coefficient of: 0.125\n\
            \nWinners:\n\
            Lat_:mascot,,,atlas,\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn winner_list_keeps_one_slot_per_class() {
        let mut winners = WinnerTable::new();
        winners.offer(
            SecurityClass::MaliciousDishonestMajority,
            TrackedVariable::Latency,
            "mascot",
            0.5,
        );
        winners.offer(
            SecurityClass::SemiHonestHonestMajority,
            TrackedVariable::Latency,
            "shamir",
            0.1,
        );
        winners.offer(
            SecurityClass::MaliciousHonestMajority,
            TrackedVariable::Bandwidth,
            "semi",
            4.0,
        );

        let text = format_runtimes(&[], &winners);
        let list = text.split("\nWinners:\n").nth(1).unwrap();
        assert_eq!(list, "Lat_:mascot,,,shamir,\nBwd_:,semi,,,\n");
    }

    #[test]
    fn protocol_infos_cover_latency_slices_only() {
        let slices = vec![
            slice(TrackedVariable::Latency, "mascot", fitted(ModelFamily::Linear, vec![0.5, 2.0], 0.25)),
            slice(TrackedVariable::Latency, "shamir", FitOutcome::NoData),
            slice(TrackedVariable::Bandwidth, "mascot", fitted(ModelFamily::Inverse, vec![8.0, 1.0], 8.0)),
        ];
        assert_eq!(
            format_protocol_infos(&slices),
            "Lat_mascot.txt -> 0.25\nLat_shamir.txt -> NA\n"
        );
    }
}
