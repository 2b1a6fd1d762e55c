//! Read-only view of the host's scenario state at dispatch time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where the run is when a notification is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStage {
    /// Tasks are about to run
    Started,
    /// Tasks have completed (successfully or not)
    #[default]
    Finished,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSnapshot {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub passed_tasks: Vec<String>,
    #[serde(default)]
    pub failed_tasks: Vec<String>,
    /// Aggregate exit status; 0 means success
    #[serde(default)]
    pub overall_status: i32,
    #[serde(default)]
    pub stage: RunStage,
    /// Scenario-scoped variables exposed to message templates
    #[serde(default)]
    pub scenario_graph: Map<String, Value>,
}

impl ScenarioSnapshot {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.scenario_graph.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.overall_status == 0
    }

    /// Short status word used in default messages and template contexts.
    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        match self.stage {
            RunStage::Started => "started",
            RunStage::Finished if self.overall_status == 0 => "passed",
            RunStage::Finished => "failed",
        }
    }
}
