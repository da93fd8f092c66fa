//! Explicit Request Context
//!
//! Structured fields supplied alongside the free-text query (from action
//! buttons, forms, or API callers). `ExplicitContext` wraps the raw JSON map
//! and exposes typed accessors so downstream code never probes the map by
//! hand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::intent::WorkflowIntent;
use crate::project::Location;

/// Well-known context keys.
pub mod keys {
    pub const PROJECT_ID: &str = "projectId";
    pub const INTENT: &str = "intent";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const RADIUS_KM: &str = "radiusKm";
    pub const SETBACK_M: &str = "setbackM";
    pub const TURBINE_COUNT: &str = "turbineCount";
    pub const TURBINE_MODEL: &str = "turbineModel";
    pub const ROTOR_SPACING: &str = "rotorSpacing";
    pub const WAKE_MODEL: &str = "wakeModel";
    pub const WIND_SPEED: &str = "windSpeed";
    pub const REPORT_FORMAT: &str = "reportFormat";
    pub const SECTIONS: &str = "sections";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExplicitContext(Map<String, Value>);

impl ExplicitContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert a value only when the key is absent.
    pub fn insert_if_absent(&mut self, key: &str, value: Value) -> bool {
        if self.contains(key) {
            return false;
        }
        self.0.insert(key.to_string(), value);
        true
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Numeric value, accepting numeric strings.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn project_id(&self) -> Option<&str> {
        self.get_str(keys::PROJECT_ID)
    }

    /// Intent pinned by the caller. Only actionable intents are honoured;
    /// `unknown` is treated as absent.
    pub fn intent(&self) -> Option<WorkflowIntent> {
        self.get_str(keys::INTENT)
            .and_then(|s| s.parse::<WorkflowIntent>().ok())
            .filter(|i| !i.is_unknown())
    }

    /// Site location, when both coordinates are present and in range.
    pub fn location(&self) -> Option<Location> {
        let lat = self.get_f64(keys::LATITUDE)?;
        let lon = self.get_f64(keys::LONGITUDE)?;
        Location::new(lat, lon).ok()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ExplicitContext {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
