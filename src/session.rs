use log::{debug, info, warn};

use match_scoring::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::fs;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::session::config_reader::*;

pub mod config_reader;

#[derive(Debug, Snafu)]
pub enum SessionError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Expected a non-negative integer for {field}"))]
    ParsingJsonNumber { field: String },
    #[snafu(display("Invalid scoring input"))]
    Scoring { source: ScoringErrors },
    #[snafu(display("Error formatting the results"))]
    FormattingJson { source: serde_json::Error },
    #[snafu(display("Error writing the results to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the computed results and the reference {path}"))]
    ReferenceMismatch { path: String },
}

pub type SessionResult<T> = Result<T, SessionError>;

fn breakdown_to_json(breakdown: &[BreakdownEntry]) -> Vec<JSValue> {
    breakdown
        .iter()
        .map(|b| {
            json!({
                "policyOptionId": b.policy_option_id,
                "optionText": b.option_text,
                "categoryName": b.category_name,
                "userSelected": b.user_selected,
                "agreementScore": b.agreement_score,
                "agreementLabel": b.agreement_score.and_then(agreement_label),
                "matched": b.matched,
                "points": b.points,
                "maxPoints": b.max_points
            })
        })
        .collect()
}

fn categories_to_json(breakdown: &[BreakdownEntry]) -> Vec<JSValue> {
    group_breakdown_by_category(breakdown)
        .iter()
        .map(|c| json!({"name": c.name, "matched": c.matched, "scored": c.scored}))
        .collect()
}

fn candidate_result_to_json(
    c: &CandidateRecord,
    mr: &MatchResult,
    palette: &ColorPalette,
) -> JSValue {
    json!({
        "id": c.id,
        "name": c.name,
        "party": c.party,
        "photo": c.photo,
        "website": c.website,
        "votingRecordUrl": c.voting_record_url,
        "isIncumbent": c.is_incumbent.unwrap_or(false),
        "matchPercentage": mr.match_percentage,
        "displayPercentage": mr.display_percentage(),
        "matchPoints": mr.match_points,
        "totalPoints": mr.total_points,
        "color": mr.color.as_str(),
        "colorHex": palette.hex(mr.color),
        "breakdown": breakdown_to_json(&mr.breakdown),
        "categories": categories_to_json(&mr.breakdown)
    })
}

// Parties already have a "color" (their brand color), the band goes to "matchColor".
fn party_result_to_json(p: &PartyRecord, mr: &MatchResult, palette: &ColorPalette) -> JSValue {
    json!({
        "id": p.id,
        "name": p.name,
        "abbreviation": p.abbreviation,
        "color": p.color,
        "website": p.website,
        "matchPercentage": mr.match_percentage,
        "displayPercentage": mr.display_percentage(),
        "matchPoints": mr.match_points,
        "totalPoints": mr.total_points,
        "matchColor": mr.color.as_str(),
        "colorHex": palette.hex(mr.color),
        "breakdown": breakdown_to_json(&mr.breakdown),
        "categories": categories_to_json(&mr.breakdown)
    })
}

fn settings_to_json(settings: &SiteSettings, rules: &MatchRules, palette: &ColorPalette) -> JSValue {
    json!({
        "siteName": settings.site_name(),
        "greenThreshold": rules.green_threshold,
        "orangeThreshold": rules.orange_threshold,
        "matchGreenColor": palette.green,
        "matchOrangeColor": palette.orange,
        "matchRedColor": palette.red,
        "matchGreyColor": palette.grey
    })
}

/// Scores one questionnaire session and assembles the results document.
///
/// Candidates and parties are scored separately, each against its own roster,
/// and each list is ranked by decreasing match.
pub fn build_results_js(
    session: &SessionFile,
    settings: &SiteSettings,
    rules: &MatchRules,
) -> SessionResult<JSValue> {
    let selections = session.selections();
    let options = session.policy_options();
    let assessments = session.assessments()?;
    let palette = settings.palette();

    let (candidate_assessments, party_assessments): (Vec<Assessment>, Vec<Assessment>) =
        assessments.into_iter().partition(|a| a.entity.is_candidate());
    debug!(
        "build_results_js: {:?} candidate assessments, {:?} party assessments",
        candidate_assessments.len(),
        party_assessments.len()
    );

    let candidate_roster: Vec<EntityId> = session
        .candidates
        .iter()
        .map(|c| EntityId::Candidate(c.id.clone()))
        .collect();
    let mut candidate_scores = compute_roster_matches(
        &selections,
        &candidate_assessments,
        &options,
        &candidate_roster,
        rules,
    );
    rank_results(&mut candidate_scores);

    let party_roster: Vec<EntityId> = session
        .parties
        .iter()
        .map(|p| EntityId::Party(p.id.clone()))
        .collect();
    let mut party_scores = compute_roster_matches(
        &selections,
        &party_assessments,
        &options,
        &party_roster,
        rules,
    );
    rank_results(&mut party_scores);

    let candidates_by_id: HashMap<&str, &CandidateRecord> = session
        .candidates
        .iter()
        .map(|c| (c.id.as_str(), c))
        .collect();
    let parties_by_id: HashMap<&str, &PartyRecord> =
        session.parties.iter().map(|p| (p.id.as_str(), p)).collect();

    let candidate_results: Vec<JSValue> = candidate_scores
        .iter()
        .filter_map(|mr| {
            candidates_by_id
                .get(mr.entity.id())
                .map(|c| candidate_result_to_json(c, mr, &palette))
        })
        .collect();
    let party_results: Vec<JSValue> = party_scores
        .iter()
        .filter_map(|mr| {
            parties_by_id
                .get(mr.entity.id())
                .map(|p| party_result_to_json(p, mr, &palette))
        })
        .collect();

    for mr in candidate_scores.iter().chain(party_scores.iter()) {
        info!(
            "{}: {} ({}/{}, {})",
            mr.entity,
            mr.display_percentage(),
            mr.match_points,
            mr.total_points,
            mr.color
        );
    }

    Ok(json!({
        "candidates": candidate_results,
        "parties": party_results,
        "settings": settings_to_json(settings, rules, &palette)
    }))
}

fn write_output(out: &Option<String>, contents: &str) -> SessionResult<()> {
    match out.as_deref() {
        None | Some("") | Some("stdout") => {
            println!("{}", contents);
            Ok(())
        }
        Some(path) => {
            info!("Writing results to {:?}", path);
            fs::write(path, contents).context(WritingOutputSnafu { path })
        }
    }
}

pub fn run_session(args: &Args) -> SessionResult<()> {
    let session = read_session(&args.input)?;
    let settings = match &args.config {
        Some(path) => read_settings(path)?,
        None => SiteSettings::default(),
    };
    let rules = settings.match_rules(args.green_threshold, args.orange_threshold)?;
    info!("rules: {:?}", rules);

    let result_js = build_results_js(&session, &settings, &rules)?;
    let pretty_js_results =
        serde_json::to_string_pretty(&result_js).context(FormattingJsonSnafu {})?;
    write_output(&args.out, &pretty_js_results)?;

    // The reference results, if provided for comparison
    if let Some(reference_p) = &args.reference {
        let reference = read_summary(reference_p)?;
        let pretty_js_reference =
            serde_json::to_string_pretty(&reference).context(FormattingJsonSnafu {})?;
        if pretty_js_reference != pretty_js_results {
            warn!("Found differences with the reference results");
            print_diff(
                pretty_js_reference.as_str(),
                pretty_js_results.as_str(),
                "\n",
            );
            return ReferenceMismatchSnafu {
                path: reference_p.clone(),
            }
            .fail();
        }
        info!("Results match the reference {:?}", reference_p);
    }

    Ok(())
}
