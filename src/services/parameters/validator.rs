//! Parameter Validator
//!
//! Checks workflow prerequisites, then builds the intent's parameter record
//! from three layers: the request's explicit context, the project's location
//! and parameter snapshot, and built-in defaults for optional fields only.
//! Every field is evaluated so the caller sees all problems at once; the
//! result is either complete parameters or the full error list.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde_json::Value;
use thiserror::Error;
use windsite_core::context::keys;
use windsite_core::{ExplicitContext, Project, WorkflowIntent, WorkflowStep};

use crate::models::parameters::{
    FieldError, IntentParameters, LayoutParameters, ParameterSource, ReportParameters, TerrainParameters,
    ValidatedParameters, WakeParameters,
};

const REPORT_FORMATS: [&str; 3] = ["pdf", "html", "markdown"];

const COORDINATE_HINT: &str = "Include site coordinates in the request, e.g. \"at 35.07, -101.40\".";
const TURBINE_COUNT_HINT: &str = "Say how many turbines to place, e.g. \"layout with 10 turbines\".";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Cannot run {intent} before the {missing} step is complete")]
    Prerequisite {
        intent: WorkflowIntent,
        missing: WorkflowStep,
        suggestion: WorkflowIntent,
    },

    #[error("Invalid parameters: {}", join_messages(.0))]
    Invalid(Vec<FieldError>),

    #[error("No workflow intent to validate parameters for")]
    Unclassified,
}

impl ParameterError {
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Invalid(errors) => errors,
            _ => &[],
        }
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Built-in values for optional fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDefaults {
    pub radius_km: f64,
    pub setback_m: f64,
    pub turbine_model: String,
    pub rotor_spacing: f64,
    pub wake_model: String,
    pub wind_speed: f64,
    pub report_format: String,
    pub sections: Vec<String>,
}

impl Default for ParameterDefaults {
    fn default() -> Self {
        Self {
            radius_km: 5.0,
            setback_m: 200.0,
            turbine_model: "generic-3mw".to_string(),
            rotor_spacing: 5.0,
            wake_model: "jensen".to_string(),
            wind_speed: 8.5,
            report_format: "pdf".to_string(),
            sections: ["summary", "terrain", "layout", "energy_yield"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParameterValidator {
    defaults: ParameterDefaults,
}

impl ParameterValidator {
    pub fn new(defaults: ParameterDefaults) -> Self {
        Self { defaults }
    }

    pub fn validate(
        &self,
        intent: WorkflowIntent,
        context: &ExplicitContext,
        project: &Project,
    ) -> Result<ValidatedParameters, ParameterError> {
        if intent.is_unknown() {
            return Err(ParameterError::Unclassified);
        }
        check_prerequisite(intent, project)?;

        let mut fields = FieldResolver::new(context, project);
        let d = &self.defaults;

        let params = match intent {
            WorkflowIntent::TerrainAnalysis => {
                let latitude = fields.required_f64(keys::LATITUDE, -90.0..=90.0, COORDINATE_HINT);
                let longitude = fields.required_f64(keys::LONGITUDE, -180.0..=180.0, COORDINATE_HINT);
                let radius_km = fields.optional_f64(keys::RADIUS_KM, d.radius_km, 0.5..=50.0);
                let setback_m = fields.optional_f64(keys::SETBACK_M, d.setback_m, 0.0..=5000.0);
                (|| {
                    Some(IntentParameters::TerrainAnalysis(TerrainParameters {
                        latitude: latitude?,
                        longitude: longitude?,
                        radius_km: radius_km?,
                        setback_m: setback_m?,
                    }))
                })()
            }
            WorkflowIntent::LayoutOptimization => {
                let latitude = fields.required_f64(keys::LATITUDE, -90.0..=90.0, COORDINATE_HINT);
                let longitude = fields.required_f64(keys::LONGITUDE, -180.0..=180.0, COORDINATE_HINT);
                let turbine_count = fields.required_count(keys::TURBINE_COUNT, 1..=500, TURBINE_COUNT_HINT);
                let turbine_model = fields.optional_string(keys::TURBINE_MODEL, &d.turbine_model);
                let rotor_spacing = fields.optional_f64(keys::ROTOR_SPACING, d.rotor_spacing, 2.0..=15.0);
                (|| {
                    Some(IntentParameters::LayoutOptimization(LayoutParameters {
                        latitude: latitude?,
                        longitude: longitude?,
                        turbine_count: turbine_count?,
                        turbine_model: turbine_model?,
                        rotor_spacing: rotor_spacing?,
                    }))
                })()
            }
            WorkflowIntent::WakeSimulation => {
                let latitude = fields.required_f64(keys::LATITUDE, -90.0..=90.0, COORDINATE_HINT);
                let longitude = fields.required_f64(keys::LONGITUDE, -180.0..=180.0, COORDINATE_HINT);
                let turbine_count = fields.required_count(keys::TURBINE_COUNT, 1..=500, TURBINE_COUNT_HINT);
                let wake_model = fields.optional_string(keys::WAKE_MODEL, &d.wake_model);
                let wind_speed = fields.optional_f64(keys::WIND_SPEED, d.wind_speed, 0.5..=40.0);
                (|| {
                    Some(IntentParameters::WakeSimulation(WakeParameters {
                        latitude: latitude?,
                        longitude: longitude?,
                        turbine_count: turbine_count?,
                        wake_model: wake_model?,
                        wind_speed: wind_speed?,
                    }))
                })()
            }
            WorkflowIntent::ReportGeneration => {
                let report_format = fields.optional_choice(keys::REPORT_FORMAT, &d.report_format, &REPORT_FORMATS);
                let sections = fields.optional_list(keys::SECTIONS, &d.sections);
                (|| {
                    Some(IntentParameters::ReportGeneration(ReportParameters {
                        report_format: report_format?,
                        sections: sections?,
                    }))
                })()
            }
            WorkflowIntent::ProjectQuery => Some(IntentParameters::ProjectQuery),
            WorkflowIntent::Unknown => None,
        };

        fields.finish(&project.id, params)
    }
}

/// Fail fast when the step this intent depends on is not complete.
pub fn check_prerequisite(intent: WorkflowIntent, project: &Project) -> Result<(), ParameterError> {
    let Some(required) = intent.step().and_then(|step| step.prerequisite()) else {
        return Ok(());
    };
    if project.step_status.is_complete(required) {
        return Ok(());
    }
    Err(ParameterError::Prerequisite {
        intent,
        missing: required,
        suggestion: required.intent(),
    })
}

// ============================================================================
// Field Resolution
// ============================================================================

/// Looks up fields across the three layers, recording each field's source
/// and collecting every error.
struct FieldResolver<'a> {
    context: &'a ExplicitContext,
    project: &'a Project,
    sources: BTreeMap<String, ParameterSource>,
    errors: Vec<FieldError>,
}

impl<'a> FieldResolver<'a> {
    fn new(context: &'a ExplicitContext, project: &'a Project) -> Self {
        Self {
            context,
            project,
            sources: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    fn lookup(&self, key: &str) -> Option<(Value, ParameterSource)> {
        if let Some(value) = self.context.get(key) {
            return Some((value.clone(), ParameterSource::Explicit));
        }
        let from_location = self.project.location.and_then(|loc| match key {
            keys::LATITUDE => Some(Value::from(loc.lat)),
            keys::LONGITUDE => Some(Value::from(loc.lon)),
            _ => None,
        });
        from_location
            .or_else(|| self.project.snapshot_value(key).filter(|v| !v.is_null()).cloned())
            .map(|value| (value, ParameterSource::SessionDefault))
    }

    fn accept<T>(&mut self, key: &str, source: ParameterSource, value: T) -> Option<T> {
        self.sources.insert(key.to_string(), source);
        Some(value)
    }

    fn reject<T>(&mut self, error: FieldError) -> Option<T> {
        self.errors.push(error);
        None
    }

    fn number(&mut self, key: &str, value: &Value, range: &RangeInclusive<f64>) -> Option<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if !n.is_finite() => self.reject(FieldError::invalid_type(key, "a finite number")),
            Some(n) if !range.contains(&n) => self.reject(FieldError::out_of_range(key, *range.start(), *range.end())),
            Some(n) => Some(n),
            None => self.reject(FieldError::invalid_type(key, "a number")),
        }
    }

    fn required_f64(&mut self, key: &str, range: RangeInclusive<f64>, hint: &str) -> Option<f64> {
        let Some((value, source)) = self.lookup(key) else {
            return self.reject(FieldError::missing(key, hint));
        };
        let n = self.number(key, &value, &range)?;
        self.accept(key, source, n)
    }

    fn optional_f64(&mut self, key: &str, default: f64, range: RangeInclusive<f64>) -> Option<f64> {
        let Some((value, source)) = self.lookup(key) else {
            return self.accept(key, ParameterSource::GlobalDefault, default);
        };
        let n = self.number(key, &value, &range)?;
        self.accept(key, source, n)
    }

    fn required_count(&mut self, key: &str, range: RangeInclusive<u32>, hint: &str) -> Option<u32> {
        let Some((value, source)) = self.lookup(key) else {
            return self.reject(FieldError::missing(key, hint));
        };
        let bounds = f64::from(*range.start())..=f64::from(*range.end());
        let n = self.number(key, &value, &bounds)?;
        if n.fract() != 0.0 {
            return self.reject(FieldError::invalid_type(key, "a whole number"));
        }
        self.accept(key, source, n as u32)
    }

    fn optional_string(&mut self, key: &str, default: &str) -> Option<String> {
        match self.lookup(key) {
            None => self.accept(key, ParameterSource::GlobalDefault, default.to_string()),
            Some((Value::String(s), source)) if !s.trim().is_empty() => {
                self.accept(key, source, s.trim().to_string())
            }
            Some(_) => self.reject(FieldError::invalid_type(key, "a non-empty string")),
        }
    }

    fn optional_choice(&mut self, key: &str, default: &str, allowed: &[&str]) -> Option<String> {
        let value = self.optional_string(key, default)?.to_lowercase();
        if allowed.contains(&value.as_str()) {
            Some(value)
        } else {
            self.sources.remove(key);
            self.reject(FieldError::invalid_type(key, &format!("one of {}", allowed.join(", "))))
        }
    }

    /// List of strings, accepting an array or a comma-separated string.
    fn optional_list(&mut self, key: &str, default: &[String]) -> Option<Vec<String>> {
        let Some((value, source)) = self.lookup(key) else {
            return self.accept(key, ParameterSource::GlobalDefault, default.to_vec());
        };
        let items: Option<Vec<String>> = match &value {
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(|s| s.trim().to_string()))
                .collect(),
            Value::String(s) => Some(s.split(',').map(|part| part.trim().to_string()).collect()),
            _ => None,
        };
        match items.map(|list| list.into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>()) {
            Some(list) if !list.is_empty() => self.accept(key, source, list),
            _ => self.reject(FieldError::invalid_type(key, "a non-empty list of section names")),
        }
    }

    fn finish(self, project_id: &str, params: Option<IntentParameters>) -> Result<ValidatedParameters, ParameterError> {
        match params {
            Some(params) if self.errors.is_empty() => Ok(ValidatedParameters {
                project_id: project_id.to_string(),
                params,
                sources: self.sources,
            }),
            _ => Err(ParameterError::Invalid(self.errors)),
        }
    }
}
