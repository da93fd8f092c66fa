//! Query Text Extraction
//!
//! Pulls site coordinates and turbine counts out of free text so that
//! "Analyze terrain at 35.067482, -101.395466" carries its location without
//! the caller filling in structured fields.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use windsite_core::context::keys;
use windsite_core::{ExplicitContext, Location};

/// Decimal coordinate pair, optional hemisphere letters.
fn coordinate_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"(?:^|[^\d.])(?P<lat>[-+]?\d{1,2}\.\d+)\s*°?\s*(?P<ns>[NnSs])?\s*,\s*(?P<lon>[-+]?\d{1,3}\.\d+)\s*°?\s*(?P<ew>[EeWw])?",
            )
            .ok()
        })
        .as_ref()
}

fn turbine_count_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)\b(?P<count>\d{1,4})\s+(?:wind\s+)?turbines?\b").ok())
        .as_ref()
}

/// First in-range coordinate pair in `text`.
pub fn extract_location(text: &str) -> Option<Location> {
    let pattern = coordinate_pattern()?;
    pattern.captures_iter(text).find_map(|caps| {
        let mut lat: f64 = caps.name("lat")?.as_str().parse().ok()?;
        let mut lon: f64 = caps.name("lon")?.as_str().parse().ok()?;
        if caps.name("ns").is_some_and(|m| m.as_str().eq_ignore_ascii_case("s")) {
            lat = -lat.abs();
        }
        if caps.name("ew").is_some_and(|m| m.as_str().eq_ignore_ascii_case("w")) {
            lon = -lon.abs();
        }
        Location::new(lat, lon).ok()
    })
}

pub fn extract_turbine_count(text: &str) -> Option<u64> {
    let caps = turbine_count_pattern()?.captures(text)?;
    caps.name("count")?.as_str().parse().ok()
}

/// Fill context fields from the query text. Fields the caller already set
/// are never overwritten. Returns the keys that were added.
pub fn enrich_from_text(text: &str, context: &mut ExplicitContext) -> Vec<&'static str> {
    let mut added = Vec::new();

    if let Some(location) = extract_location(text) {
        if !context.contains(keys::LATITUDE) && !context.contains(keys::LONGITUDE) {
            context.insert(keys::LATITUDE, Value::from(location.lat));
            context.insert(keys::LONGITUDE, Value::from(location.lon));
            added.push(keys::LATITUDE);
            added.push(keys::LONGITUDE);
        }
    }

    if let Some(count) = extract_turbine_count(text) {
        if context.insert_if_absent(keys::TURBINE_COUNT, Value::from(count)) {
            added.push(keys::TURBINE_COUNT);
        }
    }

    added
}
