mod config;
pub mod builder;
pub mod manual;

use log::{debug, info, warn};

use std::collections::{BTreeMap, HashMap, HashSet};

pub use crate::config::*;

// **** Private structures ****

// The assessments of one entity, keyed by policy option.
// Only the first assessment seen for an option is kept.
#[derive(Debug, Clone, Default)]
struct EntityAssessments<'a> {
    scores: HashMap<&'a str, f64>,
}

impl<'a> EntityAssessments<'a> {
    fn insert(&mut self, entity: &EntityId, assessment: &'a Assessment) {
        let option_id = assessment.policy_option_id.as_str();
        if let Some(previous) = self.scores.get(option_id) {
            warn!(
                "{}: duplicate assessment for option {}, keeping score {} and ignoring {}",
                entity, option_id, previous, assessment.agreement_score
            );
            return;
        }
        self.scores.insert(option_id, assessment.agreement_score);
    }

    // None if there is no assessment or if it cannot be used for scoring.
    fn usable_score(&self, option_id: &str) -> Option<f64> {
        self.scores
            .get(option_id)
            .cloned()
            .filter(|score| is_usable_score(*score))
    }
}

struct OptionCatalog<'a> {
    by_id: HashMap<&'a str, &'a PolicyOptionInfo>,
}

impl<'a> OptionCatalog<'a> {
    fn new(options: &'a [PolicyOptionInfo], selections: &[UserSelection]) -> OptionCatalog<'a> {
        let by_id: HashMap<&str, &PolicyOptionInfo> =
            options.iter().map(|o| (o.id.as_str(), o)).collect();
        for sel in selections.iter() {
            if !by_id.contains_key(sel.policy_option_id.as_str()) {
                warn!(
                    "Selection for option {} has no catalog entry, its text and category will be empty",
                    sel.policy_option_id
                );
            }
        }
        OptionCatalog { by_id }
    }

    fn option_text(&self, option_id: &str) -> String {
        self.by_id
            .get(option_id)
            .map(|o| o.option_text.clone())
            .unwrap_or_default()
    }

    fn category_name(&self, option_id: &str) -> String {
        self.by_id
            .get(option_id)
            .map(|o| o.category_name.clone())
            .unwrap_or_default()
    }
}

// Negative scores are the marker for "not assessed". NaN fails this test as well.
fn is_usable_score(score: f64) -> bool {
    score >= 0.0
}

/// Computes the match of every entity that has at least one assessment.
///
/// Arguments:
/// * `selections` the decisions of the voter, in questionnaire order
/// * `assessments` the assessments of all the entities to score, in any order
/// * `options` the catalog used to label the breakdown
/// * `rules` the color banding thresholds
///
/// Entities that do not appear in `assessments` have no entry in the output.
/// Use [compute_roster_matches] to get an entry for every entity of interest.
pub fn compute_matches(
    selections: &[UserSelection],
    assessments: &[Assessment],
    options: &[PolicyOptionInfo],
    rules: &MatchRules,
) -> BTreeMap<EntityId, MatchResult> {
    info!(
        "compute_matches: {:?} selections, {:?} assessments, {:?} catalog options, rules: {:?}",
        selections.len(),
        assessments.len(),
        options.len(),
        rules
    );
    let catalog = OptionCatalog::new(options, selections);
    let partitions = partition_assessments(assessments);

    let mut res: BTreeMap<EntityId, MatchResult> = BTreeMap::new();
    for (entity, entity_assessments) in partitions.iter() {
        let mr = score_entity(entity, selections, Some(entity_assessments), &catalog, rules);
        res.insert((*entity).clone(), mr);
    }
    info!("compute_matches: scored {:?} entities", res.len());
    res
}

/// Computes the match of every entity in the roster, in roster order.
///
/// Roster members without any assessment still get a result, with the
/// ungraded percentage and a breakdown made only of unassessed entries.
/// Assessments of entities that are not in the roster are ignored.
/// An entity listed several times in the roster is only scored once.
pub fn compute_roster_matches(
    selections: &[UserSelection],
    assessments: &[Assessment],
    options: &[PolicyOptionInfo],
    roster: &[EntityId],
    rules: &MatchRules,
) -> Vec<MatchResult> {
    info!(
        "compute_roster_matches: {:?} selections, {:?} assessments, {:?} roster entries, rules: {:?}",
        selections.len(),
        assessments.len(),
        roster.len(),
        rules
    );
    let catalog = OptionCatalog::new(options, selections);
    let partitions = partition_assessments(assessments);

    let roster_set: HashSet<&EntityId> = roster.iter().collect();
    for entity in partitions.keys() {
        if !roster_set.contains(entity) {
            debug!(
                "compute_roster_matches: {} is not in the roster, ignoring its assessments",
                entity
            );
        }
    }

    let mut seen: HashSet<&EntityId> = HashSet::new();
    let mut res: Vec<MatchResult> = Vec::new();
    for entity in roster.iter() {
        if !seen.insert(entity) {
            debug!("compute_roster_matches: {} listed twice in the roster", entity);
            continue;
        }
        let mr = score_entity(entity, selections, partitions.get(entity), &catalog, rules);
        res.push(mr);
    }
    res
}

fn partition_assessments(assessments: &[Assessment]) -> BTreeMap<&EntityId, EntityAssessments> {
    let mut partitions: BTreeMap<&EntityId, EntityAssessments> = BTreeMap::new();
    for a in assessments.iter() {
        partitions.entry(&a.entity).or_default().insert(&a.entity, a);
    }
    debug!(
        "partition_assessments: {:?} assessments over {:?} entities",
        assessments.len(),
        partitions.len()
    );
    partitions
}

fn score_entity(
    entity: &EntityId,
    selections: &[UserSelection],
    entity_assessments: Option<&EntityAssessments>,
    catalog: &OptionCatalog,
    rules: &MatchRules,
) -> MatchResult {
    let mut match_points: u32 = 0;
    let mut total_points: u32 = 0;
    let mut breakdown: Vec<BreakdownEntry> = Vec::with_capacity(selections.len());

    for sel in selections.iter() {
        let option_id = sel.policy_option_id.as_str();
        let score = entity_assessments.and_then(|ea| ea.usable_score(option_id));
        let (matched, max_points) = match score {
            // Not assessed: neither in the numerator nor in the denominator.
            None => (false, 0),
            Some(s) => {
                total_points += 1;
                let entity_supports = s >= SUPPORT_THRESHOLD;
                let matched = sel.selected == entity_supports;
                if matched {
                    match_points += 1;
                }
                (matched, 1)
            }
        };
        breakdown.push(BreakdownEntry {
            policy_option_id: sel.policy_option_id.clone(),
            option_text: catalog.option_text(option_id),
            category_name: catalog.category_name(option_id),
            user_selected: sel.selected,
            agreement_score: score,
            matched,
            points: if matched { 1 } else { 0 },
            max_points,
        });
    }

    let match_percentage = match_percentage(match_points, total_points);
    let color = match_color(match_percentage, rules);
    debug!(
        "score_entity: {}: {}/{} -> {} ({})",
        entity, match_points, total_points, match_percentage, color
    );
    MatchResult {
        entity: entity.clone(),
        match_percentage,
        match_points,
        total_points,
        color,
        breakdown,
    }
}

/// The rounded percentage of matched options, or [UNGRADED_PERCENTAGE] when
/// nothing was scored.
///
/// Halves are rounded up.
pub fn match_percentage(match_points: u32, total_points: u32) -> i32 {
    if total_points == 0 {
        return UNGRADED_PERCENTAGE;
    }
    // round(100 * p / t) == floor((200 * p + t) / (2 * t)), without floats.
    let p = match_points as u64;
    let t = total_points as u64;
    ((200 * p + t) / (2 * t)) as i32
}

pub fn match_color(match_percentage: i32, rules: &MatchRules) -> MatchColor {
    if match_percentage < 0 {
        MatchColor::Grey
    } else if match_percentage >= rules.green_threshold as i32 {
        MatchColor::Green
    } else if match_percentage >= rules.orange_threshold as i32 {
        MatchColor::Orange
    } else {
        MatchColor::Red
    }
}

/// Sorts the results by decreasing percentage.
///
/// The sort is stable: ties keep their input order. Ungraded results end up last.
pub fn rank_results(results: &mut [MatchResult]) {
    results.sort_by(|a, b| b.match_percentage.cmp(&a.match_percentage));
}

/// Groups a breakdown by category, in the order in which categories first appear.
pub fn group_breakdown_by_category(breakdown: &[BreakdownEntry]) -> Vec<CategorySummary> {
    let mut res: Vec<CategorySummary> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for entry in breakdown.iter() {
        let idx = *positions
            .entry(entry.category_name.as_str())
            .or_insert_with(|| {
                res.push(CategorySummary {
                    name: entry.category_name.clone(),
                    matched: 0,
                    scored: 0,
                    option_ids: Vec::new(),
                });
                res.len() - 1
            });
        let summary = &mut res[idx];
        summary.matched += entry.points;
        summary.scored += entry.max_points;
        summary.option_ids.push(entry.policy_option_id.clone());
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn sel(id: &str, selected: bool) -> UserSelection {
        UserSelection {
            policy_option_id: id.to_string(),
            selected,
        }
    }

    fn cand(id: &str) -> EntityId {
        EntityId::Candidate(id.to_string())
    }

    fn party(id: &str) -> EntityId {
        EntityId::Party(id.to_string())
    }

    fn assess(entity: &EntityId, option: &str, score: f64) -> Assessment {
        Assessment {
            entity: entity.clone(),
            policy_option_id: option.to_string(),
            agreement_score: score,
        }
    }

    fn option(id: &str, category: &str) -> PolicyOptionInfo {
        PolicyOptionInfo {
            id: id.to_string(),
            option_text: format!("Option {}", id),
            category_name: category.to_string(),
        }
    }

    fn catalog() -> Vec<PolicyOptionInfo> {
        vec![
            option("A", "Health"),
            option("B", "Health"),
            option("C", "Housing"),
        ]
    }

    fn single(selected: bool, score: f64) -> MatchResult {
        let x = cand("x");
        let res = compute_matches(
            &[sel("A", selected)],
            &[assess(&x, "A", score)],
            &catalog(),
            &MatchRules::DEFAULT_RULES,
        );
        res.get(&x).unwrap().clone()
    }

    #[test]
    fn symmetric_match_rule() {
        init();
        assert!(single(true, 2.0).breakdown[0].matched);
        assert!(!single(false, 2.0).breakdown[0].matched);
        assert!(single(false, 1.0).breakdown[0].matched);
        assert!(!single(true, 1.0).breakdown[0].matched);
        // The threshold itself counts as support.
        assert!(single(true, 1.5).breakdown[0].matched);
        assert!(single(false, 0.0).breakdown[0].matched);
    }

    #[test]
    fn percentage_rounding() {
        assert_eq!(match_percentage(1, 3), 33);
        assert_eq!(match_percentage(2, 3), 67);
        assert_eq!(match_percentage(1, 8), 13);
        assert_eq!(match_percentage(0, 5), 0);
        assert_eq!(match_percentage(5, 5), 100);
        assert_eq!(match_percentage(0, 0), UNGRADED_PERCENTAGE);
    }

    #[test]
    fn threshold_banding() {
        let rules = MatchRules::DEFAULT_RULES;
        assert_eq!(match_color(100, &rules), MatchColor::Green);
        assert_eq!(match_color(70, &rules), MatchColor::Green);
        assert_eq!(match_color(69, &rules), MatchColor::Orange);
        assert_eq!(match_color(40, &rules), MatchColor::Orange);
        assert_eq!(match_color(39, &rules), MatchColor::Red);
        assert_eq!(match_color(0, &rules), MatchColor::Red);
        assert_eq!(match_color(-1, &rules), MatchColor::Grey);
    }

    #[test]
    fn inverted_thresholds_are_applied_literally() {
        let rules = MatchRules::new(40, 70).unwrap();
        assert_eq!(match_color(50, &rules), MatchColor::Green);
        assert_eq!(match_color(39, &rules), MatchColor::Red);
    }

    #[test]
    fn thresholds_above_100_are_rejected() {
        assert_eq!(
            MatchRules::new(101, 40),
            Err(ScoringErrors::ThresholdOutOfRange {
                name: "green_threshold",
                value: 101
            })
        );
        assert!(MatchRules::new(100, 0).is_ok());
    }

    #[test]
    fn full_agreement_is_green() {
        init();
        let x = cand("x");
        let res = compute_matches(
            &[sel("A", true), sel("B", false)],
            &[assess(&x, "A", 2.0), assess(&x, "B", 0.0)],
            &catalog(),
            &MatchRules::DEFAULT_RULES,
        );
        let mr = res.get(&x).unwrap();
        assert_eq!(mr.match_points, 2);
        assert_eq!(mr.total_points, 2);
        assert_eq!(mr.match_percentage, 100);
        assert_eq!(mr.color, MatchColor::Green);
    }

    #[test]
    fn partial_data_only_counts_assessed_options() {
        init();
        let y = cand("y");
        let res = compute_matches(
            &[sel("A", true), sel("B", true), sel("C", false)],
            &[assess(&y, "A", 0.0)],
            &catalog(),
            &MatchRules::DEFAULT_RULES,
        );
        let mr = res.get(&y).unwrap();
        assert_eq!(mr.total_points, 1);
        assert_eq!(mr.match_points, 0);
        assert_eq!(mr.match_percentage, 0);
        assert_eq!(mr.color, MatchColor::Red);
        assert_eq!(mr.breakdown.len(), 3);
        let unscored: Vec<&BreakdownEntry> = mr
            .breakdown
            .iter()
            .filter(|b| b.agreement_score.is_none())
            .collect();
        assert_eq!(unscored.len(), 2);
        for b in unscored {
            assert!(!b.matched);
            assert_eq!(b.points, 0);
            assert_eq!(b.max_points, 0);
        }
        assert_eq!(mr.breakdown[0].agreement_score, Some(0.0));
        assert_eq!(mr.breakdown[0].max_points, 1);
    }

    #[test]
    fn no_assessed_selection_is_grey() {
        let z = party("z");
        let res = compute_matches(
            &[sel("A", true), sel("B", false)],
            &[assess(&z, "C", 2.0)],
            &catalog(),
            &MatchRules::DEFAULT_RULES,
        );
        let mr = res.get(&z).unwrap();
        assert_eq!(mr.match_percentage, -1);
        assert_eq!(mr.color, MatchColor::Grey);
        assert_eq!(mr.match_points, 0);
        assert_eq!(mr.total_points, 0);
        assert!(!mr.is_graded());
        assert_eq!(mr.display_percentage(), "N/A");
    }

    #[test]
    fn negative_scores_count_as_unassessed() {
        let x = cand("x");
        let res = compute_matches(
            &[sel("A", true), sel("B", false)],
            &[assess(&x, "A", -1.0), assess(&x, "B", 0.0)],
            &catalog(),
            &MatchRules::DEFAULT_RULES,
        );
        let mr = res.get(&x).unwrap();
        assert_eq!(mr.total_points, 1);
        assert_eq!(mr.match_percentage, 100);
        assert_eq!(mr.breakdown[0].agreement_score, None);
    }

    #[test]
    fn first_duplicate_assessment_wins() {
        init();
        let x = cand("x");
        let res = compute_matches(
            &[sel("A", true)],
            &[assess(&x, "A", 2.0), assess(&x, "A", 0.0)],
            &catalog(),
            &MatchRules::DEFAULT_RULES,
        );
        let mr = res.get(&x).unwrap();
        assert_eq!(mr.breakdown[0].agreement_score, Some(2.0));
        assert_eq!(mr.match_percentage, 100);
    }

    #[test]
    fn breakdown_follows_selection_order() {
        let x = cand("x");
        let selections = vec![sel("C", true), sel("A", false), sel("Q", true), sel("B", true)];
        let res = compute_matches(
            &selections,
            &[assess(&x, "B", 1.5)],
            &catalog(),
            &MatchRules::DEFAULT_RULES,
        );
        let mr = res.get(&x).unwrap();
        let ids: Vec<&str> = mr
            .breakdown
            .iter()
            .map(|b| b.policy_option_id.as_str())
            .collect();
        assert_eq!(ids, vec!["C", "A", "Q", "B"]);
        // Q is not in the catalog.
        assert_eq!(mr.breakdown[2].option_text, "");
        assert_eq!(mr.breakdown[2].category_name, "");
        assert_eq!(mr.breakdown[0].option_text, "Option C");
        assert_eq!(mr.breakdown[0].category_name, "Housing");
    }

    #[test]
    fn scoring_is_deterministic() {
        let x = cand("x");
        let p = party("p");
        let selections = vec![sel("A", true), sel("B", false), sel("C", true)];
        let assessments = vec![
            assess(&p, "C", 1.0),
            assess(&x, "A", 1.5),
            assess(&p, "A", 2.0),
            assess(&x, "C", 0.0),
        ];
        let first = compute_matches(&selections, &assessments, &catalog(), &MatchRules::DEFAULT_RULES);
        for _ in 0..10 {
            let again =
                compute_matches(&selections, &assessments, &catalog(), &MatchRules::DEFAULT_RULES);
            assert_eq!(first, again);
        }
        let keys: Vec<&EntityId> = first.keys().collect();
        assert_eq!(keys, vec![&x, &p]);
    }

    #[test]
    fn entities_without_assessments_are_absent_from_the_map() {
        let res = compute_matches(&[sel("A", true)], &[], &catalog(), &MatchRules::DEFAULT_RULES);
        assert!(res.is_empty());
    }

    #[test]
    fn candidate_and_party_sharing_an_id_stay_separate() {
        init();
        let c = cand("x");
        let p = party("x");
        let res = compute_matches(
            &[sel("A", true), sel("B", false)],
            &[
                assess(&p, "A", 0.0),
                assess(&c, "A", 2.0),
                assess(&c, "B", 0.0),
                assess(&p, "B", 2.0),
            ],
            &catalog(),
            &MatchRules::DEFAULT_RULES,
        );
        assert_eq!(res.len(), 2);
        let keys: Vec<&EntityId> = res.keys().collect();
        assert_eq!(keys, vec![&c, &p]);

        let cr = res.get(&c).unwrap();
        assert_eq!(cr.match_points, 2);
        assert_eq!(cr.total_points, 2);
        assert_eq!(cr.match_percentage, 100);
        let pr = res.get(&p).unwrap();
        assert_eq!(pr.match_points, 0);
        assert_eq!(pr.total_points, 2);
        assert_eq!(pr.match_percentage, 0);
        assert_eq!(pr.color, MatchColor::Red);
    }

    #[test]
    fn percentage_outside_the_byte_range_is_not_displayed() {
        let mut mr = single(true, 2.0);
        assert_eq!(mr.percentage(), Some(100));
        mr.match_percentage = 0;
        assert_eq!(mr.percentage(), Some(0));
        mr.match_percentage = 300;
        assert_eq!(mr.percentage(), None);
        assert_eq!(mr.display_percentage(), "N/A");
        mr.match_percentage = UNGRADED_PERCENTAGE;
        assert_eq!(mr.percentage(), None);
    }

    #[test]
    fn roster_gets_one_result_per_member() {
        init();
        let x = cand("x");
        let y = cand("y");
        let outsider = cand("outsider");
        let selections = vec![sel("A", true), sel("B", false)];
        let res = compute_roster_matches(
            &selections,
            &[assess(&x, "A", 2.0), assess(&outsider, "A", 2.0)],
            &catalog(),
            &[y.clone(), x.clone(), y.clone()],
            &MatchRules::DEFAULT_RULES,
        );
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].entity, y);
        assert_eq!(res[0].match_percentage, UNGRADED_PERCENTAGE);
        assert_eq!(res[0].color, MatchColor::Grey);
        assert_eq!(res[0].breakdown.len(), 2);
        assert!(res[0].breakdown.iter().all(|b| b.agreement_score.is_none()));
        assert_eq!(res[1].entity, x);
        assert_eq!(res[1].match_percentage, 100);
    }

    #[test]
    fn ranking_is_stable_and_puts_ungraded_last() {
        let rules = MatchRules::DEFAULT_RULES;
        let mk = |id: &str, pct: i32| MatchResult {
            entity: cand(id),
            match_percentage: pct,
            match_points: 0,
            total_points: 0,
            color: match_color(pct, &rules),
            breakdown: vec![],
        };
        let mut results = vec![mk("a", -1), mk("b", 50), mk("c", 80), mk("d", 50), mk("e", 0)];
        rank_results(&mut results);
        let ids: Vec<&str> = results.iter().map(|r| r.entity.id()).collect();
        assert_eq!(ids, vec!["c", "b", "d", "e", "a"]);
    }

    #[test]
    fn breakdown_grouped_by_first_seen_category() {
        let x = cand("x");
        let res = compute_matches(
            &[sel("A", true), sel("C", true), sel("B", false)],
            &[assess(&x, "A", 2.0), assess(&x, "B", 2.0)],
            &catalog(),
            &MatchRules::DEFAULT_RULES,
        );
        let groups = group_breakdown_by_category(&res.get(&x).unwrap().breakdown);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Health");
        assert_eq!(groups[0].matched, 1);
        assert_eq!(groups[0].scored, 2);
        assert_eq!(groups[0].option_ids, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(groups[1].name, "Housing");
        assert_eq!(groups[1].scored, 0);
    }

    #[test]
    fn identity_from_parts() {
        assert_eq!(EntityId::from_parts(Some("c1"), None, "A"), Ok(cand("c1")));
        assert_eq!(EntityId::from_parts(Some(""), Some("p1"), "A"), Ok(party("p1")));
        assert_eq!(
            EntityId::from_parts(None, Some(""), "A"),
            Err(ScoringErrors::MissingEntityIdentity {
                policy_option_id: "A".to_string()
            })
        );
        assert!(matches!(
            EntityId::from_parts(Some("c1"), Some("p1"), "A"),
            Err(ScoringErrors::ConflictingEntityIdentity { .. })
        ));
    }

    #[test]
    fn canonical_scores_and_labels() {
        assert!(is_canonical_score(1.5));
        assert!(!is_canonical_score(0.5));
        assert_eq!(agreement_label(2.0), Some("Strongly agrees"));
        assert_eq!(agreement_label(0.0), Some("Strongly disagrees"));
        assert_eq!(agreement_label(0.7), None);
    }
}
