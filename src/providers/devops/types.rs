use serde::{Deserialize, Serialize};

use crate::sequencer::StageNode;

/// A DevOps project on the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    /// Unique identifier for the project
    pub id: String,
    /// Project display name
    pub display_name: String,
    /// Compartment the project lives in
    pub compartment_id: String,
}

/// Reference from a stage to another stage it depends on.
///
/// The remote service also lists the stage's own id and the owning pipeline's
/// id here; those entries are containment artifacts, not dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRef {
    pub id: String,
}

/// A build pipeline within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPipelineSummary {
    pub id: String,
    pub display_name: String,
}

/// A stage of a build pipeline, with its predecessor references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStageSummary {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub predecessors: Vec<StageRef>,
}

/// A deployment pipeline within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployPipelineSummary {
    pub id: String,
    pub display_name: String,
}

/// A stage of a deployment pipeline, with its predecessor references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployStageSummary {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub predecessors: Vec<StageRef>,
}

impl StageNode for BuildStageSummary {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn predecessor_ids(&self) -> Vec<&str> {
        self.predecessors.iter().map(|p| p.id.as_str()).collect()
    }
}

impl StageNode for DeployStageSummary {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn predecessor_ids(&self) -> Vec<&str> {
        self.predecessors.iter().map(|p| p.id.as_str()).collect()
    }
}

/// A deploy artifact registered with a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployArtifactSummary {
    pub id: String,
    pub display_name: String,
}

/// A container image repository in a compartment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRepositorySummary {
    pub id: String,
    pub display_name: String,
}

/// A generic artifact repository in a compartment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRepositorySummary {
    pub id: String,
    pub display_name: String,
}

/// A hosted code repository within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeRepositorySummary {
    pub id: String,
    pub display_name: String,
}

/// A deployment target environment registered with a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployEnvironmentSummary {
    pub id: String,
    pub display_name: String,
}

/// A dependency-audit knowledge base associated with a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseSummary {
    pub id: String,
    pub display_name: String,
}

/// A vulnerability audit stored under a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityAuditSummary {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

/// A log attached to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSummary {
    pub id: String,
    pub display_name: String,
}

/// Current state of an asynchronous delete operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkRequestStatus {
    Accepted,
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

impl WorkRequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// Handle to an asynchronous delete operation on the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRequest {
    pub id: String,
    pub status: WorkRequestStatus,
}
