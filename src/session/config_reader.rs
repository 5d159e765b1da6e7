use crate::session::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

pub const DEFAULT_GREEN_COLOR: &str = "#22c55e";
pub const DEFAULT_ORANGE_COLOR: &str = "#f97316";
pub const DEFAULT_RED_COLOR: &str = "#ef4444";
pub const DEFAULT_GREY_COLOR: &str = "#9ca3af";
pub const DEFAULT_SITE_NAME: &str = "Build a Ballot";

// ********* Site settings ***********

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(rename = "siteName")]
    pub site_name: Option<String>,
    // Numbers or strings: the admin forms store them as text.
    #[serde(rename = "greenThreshold")]
    _green_threshold: Option<JSValue>,
    #[serde(rename = "orangeThreshold")]
    _orange_threshold: Option<JSValue>,
    #[serde(rename = "matchGreenColor")]
    pub match_green_color: Option<String>,
    #[serde(rename = "matchOrangeColor")]
    pub match_orange_color: Option<String>,
    #[serde(rename = "matchRedColor")]
    pub match_red_color: Option<String>,
    #[serde(rename = "matchGreyColor")]
    pub match_grey_color: Option<String>,
}

impl SiteSettings {
    pub fn green_threshold(&self) -> SessionResult<Option<u32>> {
        read_js_int(&self._green_threshold, "greenThreshold")
    }

    pub fn orange_threshold(&self) -> SessionResult<Option<u32>> {
        read_js_int(&self._orange_threshold, "orangeThreshold")
    }

    /// The banding thresholds. Command line values win over the settings,
    /// and the defaults fill in what is left.
    pub fn match_rules(
        &self,
        green_override: Option<u32>,
        orange_override: Option<u32>,
    ) -> SessionResult<MatchRules> {
        let green = match green_override {
            Some(x) => x,
            None => self
                .green_threshold()?
                .unwrap_or(MatchRules::DEFAULT_GREEN_THRESHOLD as u32),
        };
        let orange = match orange_override {
            Some(x) => x,
            None => self
                .orange_threshold()?
                .unwrap_or(MatchRules::DEFAULT_ORANGE_THRESHOLD as u32),
        };
        if orange > green {
            warn!(
                "orange threshold {} is above green threshold {}, no result will be orange",
                orange, green
            );
        }
        MatchRules::new(green, orange).context(ScoringSnafu {})
    }

    pub fn palette(&self) -> ColorPalette {
        let pick = |c: &Option<String>, default: &str| match c {
            Some(x) if !x.is_empty() => x.clone(),
            _ => default.to_string(),
        };
        ColorPalette {
            green: pick(&self.match_green_color, DEFAULT_GREEN_COLOR),
            orange: pick(&self.match_orange_color, DEFAULT_ORANGE_COLOR),
            red: pick(&self.match_red_color, DEFAULT_RED_COLOR),
            grey: pick(&self.match_grey_color, DEFAULT_GREY_COLOR),
        }
    }

    pub fn site_name(&self) -> String {
        match &self.site_name {
            Some(x) if !x.is_empty() => x.clone(),
            _ => DEFAULT_SITE_NAME.to_string(),
        }
    }
}

/// The colors used to render each band.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColorPalette {
    pub green: String,
    pub orange: String,
    pub red: String,
    pub grey: String,
}

impl ColorPalette {
    pub fn hex(&self, color: MatchColor) -> &str {
        match color {
            MatchColor::Green => self.green.as_str(),
            MatchColor::Orange => self.orange.as_str(),
            MatchColor::Red => self.red.as_str(),
            MatchColor::Grey => self.grey.as_str(),
        }
    }
}

// ********* Session file ***********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRecord {
    #[serde(rename = "policyOptionId")]
    pub policy_option_id: String,
    pub selected: bool,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub category: CategoryRecord,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PolicyOptionRecord {
    pub id: String,
    #[serde(rename = "optionText")]
    pub option_text: String,
    pub question: QuestionRecord,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PartyRefRecord {
    pub id: String,
    pub name: String,
    pub abbreviation: Option<String>,
    pub color: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: String,
    pub name: String,
    pub party: Option<PartyRefRecord>,
    pub photo: Option<String>,
    pub website: Option<String>,
    #[serde(rename = "votingRecordUrl")]
    pub voting_record_url: Option<String>,
    #[serde(rename = "isIncumbent")]
    pub is_incumbent: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PartyRecord {
    pub id: String,
    pub name: String,
    pub abbreviation: Option<String>,
    pub color: Option<String>,
    pub website: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRecord {
    #[serde(rename = "policyOptionId")]
    pub policy_option_id: String,
    #[serde(rename = "agreementScore")]
    pub agreement_score: f64,
    #[serde(rename = "candidateId")]
    pub candidate_id: Option<String>,
    #[serde(rename = "partyId")]
    pub party_id: Option<String>,
}

impl AssessmentRecord {
    pub fn to_assessment(&self) -> SessionResult<Assessment> {
        let entity = EntityId::from_parts(
            self.candidate_id.as_deref(),
            self.party_id.as_deref(),
            &self.policy_option_id,
        )
        .context(ScoringSnafu {})?;
        if !is_canonical_score(self.agreement_score) {
            warn!(
                "{}: score {} for option {} is not one of {:?}",
                entity, self.agreement_score, self.policy_option_id, CANONICAL_SCORES
            );
        }
        Ok(Assessment {
            entity,
            policy_option_id: self.policy_option_id.clone(),
            agreement_score: self.agreement_score,
        })
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub selections: Vec<SelectionRecord>,
    #[serde(rename = "policyOptions", default)]
    pub policy_options: Vec<PolicyOptionRecord>,
    #[serde(default)]
    pub candidates: Vec<CandidateRecord>,
    #[serde(default)]
    pub parties: Vec<PartyRecord>,
    #[serde(default)]
    pub assessments: Vec<AssessmentRecord>,
}

impl SessionFile {
    pub fn selections(&self) -> Vec<UserSelection> {
        self.selections
            .iter()
            .map(|s| UserSelection {
                policy_option_id: s.policy_option_id.clone(),
                selected: s.selected,
            })
            .collect()
    }

    pub fn policy_options(&self) -> Vec<PolicyOptionInfo> {
        self.policy_options
            .iter()
            .map(|o| PolicyOptionInfo {
                id: o.id.clone(),
                option_text: o.option_text.clone(),
                category_name: o.question.category.name.clone(),
            })
            .collect()
    }

    pub fn assessments(&self) -> SessionResult<Vec<Assessment>> {
        self.assessments.iter().map(|a| a.to_assessment()).collect()
    }
}

pub fn read_session(path: &str) -> SessionResult<SessionFile> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let session: SessionFile =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!(
        "read_session: {:?} selections, {:?} candidates, {:?} parties, {:?} assessments",
        session.selections.len(),
        session.candidates.len(),
        session.parties.len(),
        session.assessments.len()
    );
    Ok(session)
}

pub fn read_settings(path: &str) -> SessionResult<SiteSettings> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let settings: SiteSettings =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_settings: {:?}", settings);
    Ok(settings)
}

pub fn read_summary(path: &str) -> SessionResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>, field: &'static str) -> SessionResult<Option<u32>> {
    match x {
        None | Some(JSValue::Null) => Ok(None),
        Some(JSValue::Number(n)) => n
            .as_u64()
            .and_then(|x| u32::try_from(x).ok())
            .map(Some)
            .context(ParsingJsonNumberSnafu { field }),
        Some(JSValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<u32>()
            .ok()
            .map(Some)
            .context(ParsingJsonNumberSnafu { field }),
        _ => None.context(ParsingJsonNumberSnafu { field }),
    }
}
