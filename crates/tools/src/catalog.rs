//! Tool Catalog
//!
//! Maps each workflow intent onto exactly one external tool service and holds
//! the per-tool call timeouts.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use windsite_core::{WorkflowIntent, WorkflowStep};

/// Identity of an external tool service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolIdentity {
    TerrainAnalysis,
    LayoutOptimization,
    WakeSimulation,
    ReportGeneration,
}

impl ToolIdentity {
    pub fn for_intent(intent: WorkflowIntent) -> Option<Self> {
        intent.step().map(Self::for_step)
    }

    pub fn for_step(step: WorkflowStep) -> Self {
        match step {
            WorkflowStep::Terrain => Self::TerrainAnalysis,
            WorkflowStep::Layout => Self::LayoutOptimization,
            WorkflowStep::Simulation => Self::WakeSimulation,
            WorkflowStep::Report => Self::ReportGeneration,
        }
    }

    /// Name used on the wire when invoking the tool.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TerrainAnalysis => "terrain_analysis",
            Self::LayoutOptimization => "layout_optimization",
            Self::WakeSimulation => "wake_simulation",
            Self::ReportGeneration => "report_generation",
        }
    }

    pub fn step(&self) -> WorkflowStep {
        match self {
            Self::TerrainAnalysis => WorkflowStep::Terrain,
            Self::LayoutOptimization => WorkflowStep::Layout,
            Self::WakeSimulation => WorkflowStep::Simulation,
            Self::ReportGeneration => WorkflowStep::Report,
        }
    }

    /// Artifact type emitted for this tool's results.
    pub fn artifact_type(&self) -> &'static str {
        self.name()
    }

    /// Default artifact title when the tool does not provide one.
    pub fn title(&self) -> &'static str {
        match self {
            Self::TerrainAnalysis => "Terrain Analysis",
            Self::LayoutOptimization => "Turbine Layout",
            Self::WakeSimulation => "Wake Simulation",
            Self::ReportGeneration => "Project Report",
        }
    }
}

impl std::fmt::Display for ToolIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-tool call timeouts, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolTimeouts {
    #[serde(default = "default_terrain_secs")]
    pub terrain_secs: u64,
    #[serde(default = "default_layout_secs")]
    pub layout_secs: u64,
    #[serde(default = "default_simulation_secs")]
    pub simulation_secs: u64,
    #[serde(default = "default_report_secs")]
    pub report_secs: u64,
}

fn default_terrain_secs() -> u64 {
    60
}

fn default_layout_secs() -> u64 {
    90
}

fn default_simulation_secs() -> u64 {
    120
}

fn default_report_secs() -> u64 {
    60
}

impl Default for ToolTimeouts {
    fn default() -> Self {
        Self {
            terrain_secs: default_terrain_secs(),
            layout_secs: default_layout_secs(),
            simulation_secs: default_simulation_secs(),
            report_secs: default_report_secs(),
        }
    }
}

impl ToolTimeouts {
    pub fn for_tool(&self, tool: ToolIdentity) -> Duration {
        let secs = match tool {
            ToolIdentity::TerrainAnalysis => self.terrain_secs,
            ToolIdentity::LayoutOptimization => self.layout_secs,
            ToolIdentity::WakeSimulation => self.simulation_secs,
            ToolIdentity::ReportGeneration => self.report_secs,
        };
        Duration::from_secs(secs)
    }

    /// Every timeout must be positive.
    pub fn validate(&self) -> Result<(), String> {
        let all = [
            ("terrainSecs", self.terrain_secs),
            ("layoutSecs", self.layout_secs),
            ("simulationSecs", self.simulation_secs),
            ("reportSecs", self.report_secs),
        ];
        match all.iter().find(|(_, secs)| *secs == 0) {
            Some((name, _)) => Err(format!("tool timeout {} must be greater than 0", name)),
            None => Ok(()),
        }
    }
}
