//! Workflow Intents
//!
//! The closed set of things a request can ask the orchestrator to do, and the
//! pipeline steps that back them. The prerequisite graph lives here so every
//! layer agrees on it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Classified intent of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowIntent {
    TerrainAnalysis,
    LayoutOptimization,
    WakeSimulation,
    ReportGeneration,
    ProjectQuery,
    Unknown,
}

impl WorkflowIntent {
    /// Intents that map onto a pipeline step, in pipeline order.
    pub const WORKFLOW: [WorkflowIntent; 4] = [
        WorkflowIntent::TerrainAnalysis,
        WorkflowIntent::LayoutOptimization,
        WorkflowIntent::WakeSimulation,
        WorkflowIntent::ReportGeneration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TerrainAnalysis => "terrain_analysis",
            Self::LayoutOptimization => "layout_optimization",
            Self::WakeSimulation => "wake_simulation",
            Self::ReportGeneration => "report_generation",
            Self::ProjectQuery => "project_query",
            Self::Unknown => "unknown",
        }
    }

    /// Human-facing label used in buttons and messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TerrainAnalysis => "Analyze terrain",
            Self::LayoutOptimization => "Optimize layout",
            Self::WakeSimulation => "Run wake simulation",
            Self::ReportGeneration => "Generate report",
            Self::ProjectQuery => "Show project status",
            Self::Unknown => "Unknown",
        }
    }

    /// The pipeline step this intent executes, if any.
    pub fn step(&self) -> Option<WorkflowStep> {
        match self {
            Self::TerrainAnalysis => Some(WorkflowStep::Terrain),
            Self::LayoutOptimization => Some(WorkflowStep::Layout),
            Self::WakeSimulation => Some(WorkflowStep::Simulation),
            Self::ReportGeneration => Some(WorkflowStep::Report),
            Self::ProjectQuery | Self::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for WorkflowIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowIntent {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "terrain_analysis" | "terrain" => Ok(Self::TerrainAnalysis),
            "layout_optimization" | "layout" => Ok(Self::LayoutOptimization),
            "wake_simulation" | "simulation" | "wake" => Ok(Self::WakeSimulation),
            "report_generation" | "report" => Ok(Self::ReportGeneration),
            "project_query" | "project_status" => Ok(Self::ProjectQuery),
            "unknown" => Ok(Self::Unknown),
            other => Err(CoreError::parse(format!("unrecognized intent '{}'", other))),
        }
    }
}

/// A step of the site workflow whose completion is tracked on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Terrain,
    Layout,
    Simulation,
    Report,
}

impl WorkflowStep {
    pub const ALL: [WorkflowStep; 4] = [
        WorkflowStep::Terrain,
        WorkflowStep::Layout,
        WorkflowStep::Simulation,
        WorkflowStep::Report,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Terrain => "terrain",
            Self::Layout => "layout",
            Self::Simulation => "simulation",
            Self::Report => "report",
        }
    }

    pub fn intent(&self) -> WorkflowIntent {
        match self {
            Self::Terrain => WorkflowIntent::TerrainAnalysis,
            Self::Layout => WorkflowIntent::LayoutOptimization,
            Self::Simulation => WorkflowIntent::WakeSimulation,
            Self::Report => WorkflowIntent::ReportGeneration,
        }
    }

    /// The step that must be complete before this one may run.
    ///
    /// Layout deliberately has no prerequisite: a layout can be designed
    /// without a prior terrain pass.
    pub fn prerequisite(&self) -> Option<WorkflowStep> {
        match self {
            Self::Terrain | Self::Layout => None,
            Self::Simulation => Some(Self::Layout),
            Self::Report => Some(Self::Simulation),
        }
    }

    /// The step that follows this one in pipeline order.
    pub fn following(&self) -> Option<WorkflowStep> {
        match self {
            Self::Terrain => Some(Self::Layout),
            Self::Layout => Some(Self::Simulation),
            Self::Simulation => Some(Self::Report),
            Self::Report => None,
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
