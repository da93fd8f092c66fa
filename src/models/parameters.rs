//! Intent Parameters
//!
//! One tagged union of per-intent parameter schemas. Field names serialize to
//! the same camelCase keys used in the explicit context and the project
//! snapshot, so a value written back after a run is picked up by the next.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use windsite_core::WorkflowIntent;

/// Where a validated field's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterSource {
    /// Supplied with this request (context or query text)
    Explicit,
    /// Carried over from the project's parameter snapshot
    SessionDefault,
    /// Built-in default for an optional field
    GlobalDefault,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainParameters {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub setback_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutParameters {
    pub latitude: f64,
    pub longitude: f64,
    pub turbine_count: u32,
    pub turbine_model: String,
    /// Minimum spacing between turbines, in rotor diameters
    pub rotor_spacing: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WakeParameters {
    pub latitude: f64,
    pub longitude: f64,
    pub turbine_count: u32,
    pub wake_model: String,
    /// Mean hub-height wind speed, m/s
    pub wind_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportParameters {
    pub report_format: String,
    pub sections: Vec<String>,
}

/// Validated parameters for exactly one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum IntentParameters {
    TerrainAnalysis(TerrainParameters),
    LayoutOptimization(LayoutParameters),
    WakeSimulation(WakeParameters),
    ReportGeneration(ReportParameters),
    ProjectQuery,
}

impl IntentParameters {
    pub fn intent(&self) -> WorkflowIntent {
        match self {
            Self::TerrainAnalysis(_) => WorkflowIntent::TerrainAnalysis,
            Self::LayoutOptimization(_) => WorkflowIntent::LayoutOptimization,
            Self::WakeSimulation(_) => WorkflowIntent::WakeSimulation,
            Self::ReportGeneration(_) => WorkflowIntent::ReportGeneration,
            Self::ProjectQuery => WorkflowIntent::ProjectQuery,
        }
    }
}

/// Fully validated parameters; never partially populated.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedParameters {
    pub project_id: String,
    pub params: IntentParameters,
    pub sources: BTreeMap<String, ParameterSource>,
}

impl ValidatedParameters {
    pub fn intent(&self) -> WorkflowIntent {
        self.params.intent()
    }

    /// Opaque payload handed to the tool service.
    pub fn to_payload(&self) -> Value {
        let mut payload = serde_json::to_value(&self.params).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut payload {
            map.insert("projectId".to_string(), Value::String(self.project_id.clone()));
        }
        payload
    }

    /// Field values to merge into the project snapshot after a successful run.
    pub fn snapshot_entries(&self) -> Map<String, Value> {
        match serde_json::to_value(&self.params) {
            Ok(Value::Object(mut map)) => {
                map.remove("intent");
                map
            }
            _ => Map::new(),
        }
    }

    /// Compact `field=source` listing for diagnostics.
    pub fn describe_sources(&self) -> String {
        self.sources
            .iter()
            .map(|(field, source)| {
                let tag = match source {
                    ParameterSource::Explicit => "explicit",
                    ParameterSource::SessionDefault => "session",
                    ParameterSource::GlobalDefault => "default",
                };
                format!("{}={}", field, tag)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldErrorKind {
    Missing,
    InvalidType { expected: String },
    OutOfRange { min: f64, max: f64 },
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    #[serde(flatten)]
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn missing(field: &str, hint: &str) -> Self {
        Self {
            field: field.to_string(),
            kind: FieldErrorKind::Missing,
            message: format!("{} is required. {}", field, hint),
        }
    }

    pub fn invalid_type(field: &str, expected: &str) -> Self {
        Self {
            field: field.to_string(),
            kind: FieldErrorKind::InvalidType {
                expected: expected.to_string(),
            },
            message: format!("{} must be {}", field, expected),
        }
    }

    pub fn out_of_range(field: &str, min: f64, max: f64) -> Self {
        Self {
            field: field.to_string(),
            kind: FieldErrorKind::OutOfRange { min, max },
            message: format!("{} must be between {} and {}", field, min, max),
        }
    }
}
