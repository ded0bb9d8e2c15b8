use serde::{Deserialize, Deserializer, Serialize};

/// A single clinical trial as returned by the search backend.
///
/// Upstream payloads are loosely typed, so every field except `id` is
/// optional and numbers/strings are accepted interchangeably where the
/// backend has been seen to vary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrialRecord {
    pub id: String,
    /// Relevance score, only used for client-side ordering
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rank: f64,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub sponsor: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_opt_string")]
    pub trial_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub phase: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub purpose: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub conditions: Vec<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub sex: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub min_age: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub max_age: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub start_date: Option<String>,
    /// Raw coordinate string, see [`crate::coords`]
    #[serde(default, alias = "coordinates", deserialize_with = "raw_locations")]
    pub locations: Option<String>,
    #[serde(default)]
    pub search_params: Option<SearchParams>,
}

/// Normalized query facets echoed back alongside each result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub query: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_opt_string")]
    pub trial_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub semantic_phrase: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub sex: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub location: Option<String>,
    #[serde(default, alias = "radius", deserialize_with = "lenient_opt_f64")]
    pub radius_miles: Option<f64>,
}

impl SearchParams {
    /// True when at least one filter facet (beyond the raw query) is set.
    pub fn has_facets(&self) -> bool {
        self.trial_type.is_some()
            || self.semantic_phrase.is_some()
            || self.age.is_some()
            || self.sex.is_some()
            || self.location.is_some()
            || self.radius_miles.is_some()
    }

    /// Location and a positive radius, when both are present.
    pub fn radius_search(&self) -> Option<(&str, f64)> {
        match (self.location.as_deref(), self.radius_miles) {
            (Some(loc), Some(r)) if r > 0.0 => Some((loc, r)),
            _ => None,
        }
    }
}

/// Body of `POST /search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Str(String),
    Num(f64),
    Bool(bool),
    List(Vec<serde_json::Value>),
    Other(serde_json::Value),
}

fn clean(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Loose>::deserialize(d)? {
        Some(Loose::Str(s)) => clean(s),
        Some(Loose::Num(n)) => Some(format_number(n)),
        Some(Loose::Bool(b)) => Some(b.to_string()),
        Some(Loose::List(_)) | Some(Loose::Other(_)) | None => None,
    })
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Loose>::deserialize(d)? {
        Some(Loose::Num(n)) if n.is_finite() => Some(n),
        Some(Loose::Str(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(lenient_opt_f64(d)?.unwrap_or(0.0))
}

fn string_or_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<Loose>::deserialize(d)? {
        Some(Loose::Str(s)) => clean(s).into_iter().collect(),
        Some(Loose::List(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => clean(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Locations arrive either as the legacy string encoding or as a real JSON
/// array; both are kept as text and handed to the coordinate parser.
fn raw_locations<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(d)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
