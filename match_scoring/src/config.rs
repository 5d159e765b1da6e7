// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The identity of something that can be scored against a voter.
///
/// Candidates and parties are scored the same way. The variant is only kept
/// so that callers know where a result came from.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub enum EntityId {
    Candidate(String),
    Party(String),
}

impl EntityId {
    /// Builds an identity out of the two optional columns of an assessment row.
    ///
    /// Exactly one of the two must be present. Empty strings count as absent.
    pub fn from_parts(
        candidate_id: Option<&str>,
        party_id: Option<&str>,
        policy_option_id: &str,
    ) -> Result<EntityId, ScoringErrors> {
        let candidate_id = candidate_id.filter(|s| !s.is_empty());
        let party_id = party_id.filter(|s| !s.is_empty());
        match (candidate_id, party_id) {
            (Some(cid), None) => Ok(EntityId::Candidate(cid.to_string())),
            (None, Some(pid)) => Ok(EntityId::Party(pid.to_string())),
            (None, None) => Err(ScoringErrors::MissingEntityIdentity {
                policy_option_id: policy_option_id.to_string(),
            }),
            (Some(cid), Some(pid)) => Err(ScoringErrors::ConflictingEntityIdentity {
                candidate_id: cid.to_string(),
                party_id: pid.to_string(),
                policy_option_id: policy_option_id.to_string(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            EntityId::Candidate(s) => s.as_str(),
            EntityId::Party(s) => s.as_str(),
        }
    }

    pub fn is_candidate(&self) -> bool {
        matches!(self, EntityId::Candidate(_))
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityId::Candidate(s) => write!(f, "candidate:{}", s),
            EntityId::Party(s) => write!(f, "party:{}", s),
        }
    }
}

/// The decision of a voter on one policy option.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct UserSelection {
    pub policy_option_id: String,
    /// true: "I want this", false: "I don't".
    pub selected: bool,
}

/// An expert score of how much an entity agrees with a policy option.
///
/// The canonical scores are 0, 1, 1.5 and 2. Other values are accepted and
/// only compared against [SUPPORT_THRESHOLD]. Negative values are treated as
/// if the assessment did not exist.
#[derive(PartialEq, Debug, Clone)]
pub struct Assessment {
    pub entity: EntityId,
    pub policy_option_id: String,
    pub agreement_score: f64,
}

/// Display metadata of a policy option.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct PolicyOptionInfo {
    pub id: String,
    pub option_text: String,
    pub category_name: String,
}

/// Scores at or above this value mean that the entity supports the option.
pub const SUPPORT_THRESHOLD: f64 = 1.5;

/// The scores an assessor is expected to pick from.
pub const CANONICAL_SCORES: [f64; 4] = [0.0, 1.0, 1.5, 2.0];

pub fn is_canonical_score(score: f64) -> bool {
    CANONICAL_SCORES.iter().any(|s| *s == score)
}

/// Human readable label of a canonical score.
pub fn agreement_label(score: f64) -> Option<&'static str> {
    if score == 0.0 {
        Some("Strongly disagrees")
    } else if score == 1.0 {
        Some("Partially agrees")
    } else if score == 1.5 {
        Some("Mostly agrees")
    } else if score == 2.0 {
        Some("Strongly agrees")
    } else {
        None
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum MatchColor {
    Green,
    Orange,
    Red,
    /// Not enough data to compute a percentage.
    Grey,
}

impl MatchColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchColor::Green => "green",
            MatchColor::Orange => "orange",
            MatchColor::Red => "red",
            MatchColor::Grey => "grey",
        }
    }
}

impl Display for MatchColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The contribution of one voter selection to the score of one entity.
#[derive(PartialEq, Debug, Clone)]
pub struct BreakdownEntry {
    pub policy_option_id: String,
    /// Empty if the option is not in the catalog.
    pub option_text: String,
    /// Empty if the option is not in the catalog.
    pub category_name: String,
    pub user_selected: bool,
    /// None when the entity has no usable assessment for this option.
    pub agreement_score: Option<f64>,
    pub matched: bool,
    pub points: u32,
    pub max_points: u32,
}

/// Value of `match_percentage` when no selected option was assessed.
pub const UNGRADED_PERCENTAGE: i32 = -1;

#[derive(PartialEq, Debug, Clone)]
pub struct MatchResult {
    pub entity: EntityId,
    /// 0 to 100, or [UNGRADED_PERCENTAGE].
    pub match_percentage: i32,
    pub match_points: u32,
    /// The number of options that had an assessment.
    pub total_points: u32,
    pub color: MatchColor,
    /// One entry per voter selection, in selection order.
    pub breakdown: Vec<BreakdownEntry>,
}

impl MatchResult {
    pub fn is_graded(&self) -> bool {
        self.match_percentage >= 0
    }

    /// The percentage, if there was anything to compute it from.
    pub fn percentage(&self) -> Option<u8> {
        u8::try_from(self.match_percentage).ok()
    }

    /// "NN%" or "N/A".
    pub fn display_percentage(&self) -> String {
        match self.percentage() {
            Some(p) => format!("{}%", p),
            None => "N/A".to_string(),
        }
    }
}

/// Per-category rollup of a breakdown.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CategorySummary {
    pub name: String,
    pub matched: u32,
    pub scored: u32,
    pub option_ids: Vec<String>,
}

/// Errors that prevent the scoring inputs from being built.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ScoringErrors {
    MissingEntityIdentity {
        policy_option_id: String,
    },
    ConflictingEntityIdentity {
        candidate_id: String,
        party_id: String,
        policy_option_id: String,
    },
    ThresholdOutOfRange {
        name: &'static str,
        value: u32,
    },
}

impl Error for ScoringErrors {}

impl Display for ScoringErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringErrors::MissingEntityIdentity { policy_option_id } => write!(
                f,
                "assessment for option {} has neither a candidate nor a party",
                policy_option_id
            ),
            ScoringErrors::ConflictingEntityIdentity {
                candidate_id,
                party_id,
                policy_option_id,
            } => write!(
                f,
                "assessment for option {} has both candidate {} and party {}",
                policy_option_id, candidate_id, party_id
            ),
            ScoringErrors::ThresholdOutOfRange { name, value } => {
                write!(f, "{} must be between 0 and 100, got {}", name, value)
            }
        }
    }
}

// ********* Configuration **********

/// The color banding thresholds.
///
/// `orange_threshold <= green_threshold` is expected but not checked. If it
/// does not hold, the banding rule still runs as written.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct MatchRules {
    pub green_threshold: u8,
    pub orange_threshold: u8,
}

impl MatchRules {
    pub const DEFAULT_GREEN_THRESHOLD: u8 = 70;
    pub const DEFAULT_ORANGE_THRESHOLD: u8 = 40;

    pub const DEFAULT_RULES: MatchRules = MatchRules {
        green_threshold: MatchRules::DEFAULT_GREEN_THRESHOLD,
        orange_threshold: MatchRules::DEFAULT_ORANGE_THRESHOLD,
    };

    pub fn new(green_threshold: u32, orange_threshold: u32) -> Result<MatchRules, ScoringErrors> {
        Ok(MatchRules {
            green_threshold: check_threshold("green_threshold", green_threshold)?,
            orange_threshold: check_threshold("orange_threshold", orange_threshold)?,
        })
    }
}

impl Default for MatchRules {
    fn default() -> Self {
        MatchRules::DEFAULT_RULES
    }
}

fn check_threshold(name: &'static str, value: u32) -> Result<u8, ScoringErrors> {
    if value > 100 {
        return Err(ScoringErrors::ThresholdOutOfRange { name, value });
    }
    Ok(value as u8)
}
