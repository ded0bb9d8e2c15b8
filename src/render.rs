use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Config;
use crate::models::{SearchParams, TrialRecord};

pub const NO_RESULTS_MESSAGE: &str = "No clinical trials found matching your query.";
pub const LOADING_MESSAGE: &str = "Searching...";
const MISSING: &str = "N/A";

/// One line of the result list, already formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    /// 1-based position after sorting
    pub number: usize,
    pub trial_id: String,
    pub title: String,
    /// Outbound link to the public registry entry
    pub link: String,
    pub status: String,
    pub condition: String,
    pub type_phase: String,
    pub eligibility: String,
    pub start_date: String,
    pub sponsor: String,
    pub purpose: Option<String>,
    pub active: bool,
}

/// Output of a render pass over one result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderedResults {
    pub rows: Vec<ResultRow>,
    /// Summary sentence; `None` means the banner is hidden.
    pub banner: Option<String>,
    /// Replaces the list when set (no results, loading).
    pub message: Option<String>,
}

/// Sort descending by rank. Ties keep the order the backend returned.
pub fn sort_by_rank(trials: &mut [TrialRecord]) {
    trials.sort_by(|a, b| b.rank.total_cmp(&a.rank));
}

/// Sort `trials` in place and build the list rows plus summary banner.
pub fn render_results(trials: &mut [TrialRecord], config: &Config) -> RenderedResults {
    if trials.is_empty() {
        return RenderedResults {
            rows: Vec::new(),
            banner: None,
            message: Some(NO_RESULTS_MESSAGE.to_string()),
        };
    }

    sort_by_rank(trials);

    let rows = trials
        .iter()
        .enumerate()
        .map(|(i, t)| build_row(i + 1, t, config))
        .collect();

    // Every record echoes the same parameters, the first one is representative.
    let banner = summary_sentence(trials.first().and_then(|t| t.search_params.as_ref()));

    RenderedResults {
        rows,
        banner,
        message: None,
    }
}

pub fn build_row(number: usize, trial: &TrialRecord, config: &Config) -> ResultRow {
    ResultRow {
        number,
        trial_id: trial.id.clone(),
        title: trial.title.clone().unwrap_or_else(|| trial.id.clone()),
        link: config.trial_link(&trial.id),
        status: or_missing(trial.status.as_deref()),
        condition: if trial.conditions.is_empty() {
            MISSING.to_string()
        } else {
            trial.conditions.join(", ")
        },
        type_phase: type_phase(trial),
        eligibility: eligibility(trial),
        start_date: trial
            .start_date
            .as_deref()
            .map(format_start_date)
            .unwrap_or_else(|| MISSING.to_string()),
        sponsor: or_missing(trial.sponsor.as_deref()),
        purpose: trial.purpose.clone(),
        active: false,
    }
}

fn or_missing(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(MISSING)
        .to_string()
}

fn type_phase(trial: &TrialRecord) -> String {
    let phase = trial.phase.as_deref().map(|p| {
        if p.chars().all(|c| c.is_ascii_digit() || c == '/') {
            format!("Phase {p}")
        } else {
            p.to_string()
        }
    });
    let parts: Vec<String> = [trial.trial_type.clone(), phase]
        .into_iter()
        .flatten()
        .collect();
    if parts.is_empty() {
        MISSING.to_string()
    } else {
        parts.join(" / ")
    }
}

fn eligibility(trial: &TrialRecord) -> String {
    let ages = match (trial.min_age.as_deref(), trial.max_age.as_deref()) {
        (Some(min), Some(max)) => Some(format!("{min} to {max}")),
        (Some(min), None) => Some(format!("{min} and older")),
        (None, Some(max)) => Some(format!("up to {max}")),
        (None, None) => None,
    };
    let parts: Vec<String> = [trial.sex.clone(), ages].into_iter().flatten().collect();
    if parts.is_empty() {
        MISSING.to_string()
    } else {
        parts.join(", ")
    }
}

/// `2020-02-21` -> `February 21, 2020`, `2020-02` -> `February 2020`.
pub fn format_start_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%B %-d, %Y").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
        return date.format("%B %Y").to_string();
    }
    raw.to_string()
}

fn is_wildcard(value: &str) -> bool {
    value.eq_ignore_ascii_case("all")
}

fn format_miles(miles: f64) -> String {
    if miles.fract() == 0.0 && miles.abs() < 1e15 {
        format!("{}", miles as i64)
    } else {
        format!("{miles:.1}")
    }
}

/// Human-readable description of the active filters, or `None` when there
/// are no filters to describe.
pub fn summary_sentence(params: Option<&SearchParams>) -> Option<String> {
    let params = params.filter(|p| p.has_facets())?;

    let mut sentence = match params.trial_type.as_deref().filter(|t| !is_wildcard(t)) {
        Some(kind) => format!("Showing {} trials", kind.to_lowercase()),
        None => "Showing trials".to_string(),
    };

    if let Some(phrase) = params.semantic_phrase.as_deref() {
        sentence.push_str(&format!(" for {phrase}"));
    }

    let sex = params.sex.as_deref().filter(|s| !is_wildcard(s));
    let mut filters = Vec::new();
    if let Some(sex) = sex {
        filters.push(format!("{} participants", sex.to_lowercase()));
    }
    if let Some(age) = params.age.as_deref() {
        if sex.is_some() {
            filters.push(format!("those aged {age}"));
        } else {
            filters.push(format!("participants aged {age}"));
        }
    }
    if !filters.is_empty() {
        sentence.push_str(&format!(" open to {}", filters.join(" and ")));
    }

    match (params.radius_search(), params.location.as_deref()) {
        (Some((location, miles)), _) => {
            sentence.push_str(&format!(" within {} miles of {location}", format_miles(miles)));
        }
        (None, Some(location)) => sentence.push_str(&format!(" near {location}")),
        (None, None) => {}
    }

    sentence.push('.');
    Some(sentence)
}
