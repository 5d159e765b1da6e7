pub use crate::config::*;

use std::collections::BTreeMap;

/// A builder for collecting the inputs of a scoring call.
///
/// ```
/// pub use match_scoring::builder::Builder;
/// pub use match_scoring::{EntityId, MatchColor, MatchRules};
/// # use match_scoring::ScoringErrors;
///
/// let anna = EntityId::Candidate("anna".to_string());
/// let mut builder = Builder::new(&MatchRules::DEFAULT_RULES).roster(&[anna.clone()]);
///
/// builder.add_selection("transit", true);
/// builder.add_selection("toll-roads", false);
/// builder.add_assessment_parts(Some("anna"), None, "transit", 2.0)?;
/// builder.add_assessment_parts(Some("anna"), None, "toll-roads", 0.0)?;
///
/// let results = builder.compute();
/// assert_eq!(results[0].match_percentage, 100);
/// assert_eq!(results[0].color, MatchColor::Green);
///
/// # Ok::<(), ScoringErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: MatchRules,
    pub(crate) _roster: Option<Vec<EntityId>>,
    pub(crate) _selections: Vec<UserSelection>,
    pub(crate) _assessments: Vec<Assessment>,
    pub(crate) _options: Vec<PolicyOptionInfo>,
}

impl Builder {
    pub fn new(rules: &MatchRules) -> Builder {
        Builder {
            _rules: *rules,
            _roster: None,
            _selections: Vec::new(),
            _assessments: Vec::new(),
            _options: Vec::new(),
        }
    }

    /// Restricts the output to these entities, in this order.
    ///
    /// Every entity of the roster gets a result, even without assessments.
    pub fn roster(self, entities: &[EntityId]) -> Builder {
        Builder {
            _roster: Some(entities.to_vec()),
            ..self
        }
    }

    pub fn add_selection(&mut self, policy_option_id: &str, selected: bool) {
        self._selections.push(UserSelection {
            policy_option_id: policy_option_id.to_string(),
            selected,
        });
    }

    /// Adds the answers of a questionnaire, submitted as a map from option id
    /// to decision. The selections are added in key order.
    pub fn add_selections(&mut self, answers: &BTreeMap<String, bool>) {
        for (option_id, selected) in answers.iter() {
            self.add_selection(option_id, *selected);
        }
    }

    pub fn add_option(&mut self, id: &str, option_text: &str, category_name: &str) {
        self._options.push(PolicyOptionInfo {
            id: id.to_string(),
            option_text: option_text.to_string(),
            category_name: category_name.to_string(),
        });
    }

    pub fn add_assessment(&mut self, assessment: &Assessment) {
        self._assessments.push(assessment.clone());
    }

    /// Adds an assessment given in the row format, with one optional column
    /// for the candidate and one for the party.
    ///
    /// Fails if both or none of the columns are filled.
    pub fn add_assessment_parts(
        &mut self,
        candidate_id: Option<&str>,
        party_id: Option<&str>,
        policy_option_id: &str,
        agreement_score: f64,
    ) -> Result<(), ScoringErrors> {
        let entity = EntityId::from_parts(candidate_id, party_id, policy_option_id)?;
        self._assessments.push(Assessment {
            entity,
            policy_option_id: policy_option_id.to_string(),
            agreement_score,
        });
        Ok(())
    }

    /// Runs the scoring.
    ///
    /// With a roster, the results follow the roster order. Without one, every
    /// assessed entity is returned, candidates first and then by id.
    pub fn compute(&self) -> Vec<MatchResult> {
        match self._roster.as_deref() {
            Some(roster) => crate::compute_roster_matches(
                &self._selections,
                &self._assessments,
                &self._options,
                roster,
                &self._rules,
            ),
            None => crate::compute_matches(
                &self._selections,
                &self._assessments,
                &self._options,
                &self._rules,
            )
            .into_values()
            .collect(),
        }
    }
}
