//! Computed fields
//!
//! Helpers are pure functions over an entity's raw attributes. The resource
//! table refers to them by name; [`lookup_helper`] turns a name into the
//! function pointer stored on the definition.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Computed accessor over raw attributes
pub type Helper = fn(&Map<String, Value>) -> Option<Value>;

/// Estimate used when a task title carries no duration
pub const DEFAULT_TASK_HOURS: f64 = 3.0;

/// Matches "(2h)", "(30m)", "(1.5 hrs)", "(45 mins)", "(4)"
static DURATION_RE: OnceLock<Regex> = OnceLock::new();

fn duration_re() -> &'static Regex {
    DURATION_RE.get_or_init(|| {
        Regex::new(r"\((\d+(?:\.\d+)?)\s*([A-Za-z]?)[^()]*\)")
            .unwrap_or_else(|e| panic!("Invalid duration pattern: {}", e))
    })
}

/// All helpers the resource table may name
const HELPERS: &[(&str, Helper)] = &[
    ("hours_from_title", hours_from_title),
    ("name_as_id", name_as_id),
];

/// Find a helper by its table name
pub fn lookup_helper(name: &str) -> Option<Helper> {
    HELPERS.iter().find(|(key, _)| *key == name).map(|(_, f)| *f)
}

/// Parse an hour estimate out of a task title.
///
/// The last parenthetical starting with a number wins. A unit beginning with
/// `m`/`M` means minutes; `h`/`H`, any other letter, or no unit means hours.
pub fn parse_hours(title: &str) -> f64 {
    let Some(caps) = duration_re().captures_iter(title).last() else {
        return DEFAULT_TASK_HOURS;
    };

    let Ok(amount) = caps[1].parse::<f64>() else {
        return DEFAULT_TASK_HOURS;
    };

    match caps.get(2).map(|m| m.as_str()) {
        Some("m") | Some("M") => amount / 60.0,
        _ => amount,
    }
}

/// `time` helper for tasks
fn hours_from_title(attributes: &Map<String, Value>) -> Option<Value> {
    let title = attributes
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    serde_json::Number::from_f64(parse_hours(title)).map(Value::Number)
}

/// `id` helper for scrumers, which are addressed by name
fn name_as_id(attributes: &Map<String, Value>) -> Option<Value> {
    attributes.get("name").cloned()
}
