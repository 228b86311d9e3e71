//! Security classification of MPC protocols.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const MALICIOUS_DISHONEST: &[&str] = &[
    "mascot", "lowgear", "highgear", "chaigear", "cowgear", "spdz2k", "tinier", "real-bmr",
];

const MALICIOUS_HONEST: &[&str] = &["hemi", "semi", "temi", "soho", "semi2k", "semi-bmr", "semi-bin"];

const SEMI_HONEST_DISHONEST: &[&str] = &[
    "sy-shamir",
    "malicious-shamir",
    "malicious-rep-field",
    "ps-rep-field",
    "sy-rep-field",
    "brain",
    "malicious-rep-ring",
    "yao",
    "yaoO",
    "ps-rep-ring",
    "sy-rep-ring",
    "malicious-rep-bin",
    "malicious-ccd",
    "ps-rep-bin",
    "mal-shamir-bmr",
    "mal-rep-bmr",
];

const SEMI_HONEST_HONEST: &[&str] = &[
    "atlas",
    "shamir",
    "replicated-field",
    "replicated-ring",
    "shamir-bmr",
    "rep-bmr",
    "replicated-bin",
    "ccd",
];

/// Adversary model combined with the majority assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityClass {
    MaliciousDishonestMajority,
    MaliciousHonestMajority,
    SemiHonestDishonestMajority,
    SemiHonestHonestMajority,
}

impl SecurityClass {
    pub const ALL: [SecurityClass; 4] = [
        SecurityClass::MaliciousDishonestMajority,
        SecurityClass::MaliciousHonestMajority,
        SecurityClass::SemiHonestDishonestMajority,
        SecurityClass::SemiHonestHonestMajority,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            SecurityClass::MaliciousDishonestMajority => "Malicious, Dishonest Majority",
            SecurityClass::MaliciousHonestMajority => "Malicious, Honest Majority",
            SecurityClass::SemiHonestDishonestMajority => "Semi-Honest, Dishonest Majority",
            SecurityClass::SemiHonestHonestMajority => "Semi-Honest, Honest Majority",
        }
    }

    pub fn index(self) -> usize {
        match self {
            SecurityClass::MaliciousDishonestMajority => 0,
            SecurityClass::MaliciousHonestMajority => 1,
            SecurityClass::SemiHonestDishonestMajority => 2,
            SecurityClass::SemiHonestHonestMajority => 3,
        }
    }

    fn members(self) -> &'static [&'static str] {
        match self {
            SecurityClass::MaliciousDishonestMajority => MALICIOUS_DISHONEST,
            SecurityClass::MaliciousHonestMajority => MALICIOUS_HONEST,
            SecurityClass::SemiHonestDishonestMajority => SEMI_HONEST_DISHONEST,
            SecurityClass::SemiHonestHonestMajority => SEMI_HONEST_HONEST,
        }
    }

    /// Look up the class of `protocol`.
    ///
    /// An unknown name is fatal: a protocol that cannot be bucketed would
    /// otherwise be ranked against the wrong peers.
    pub fn classify(protocol: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|class| class.members().contains(&protocol))
            .ok_or_else(|| {
                AppError::input(format!(
                    "Protocol '{protocol}' is not recognized; cannot assign a security class."
                ))
            })
    }
}
