use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kinds of remote resources a teardown run can delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    BuildPipeline,
    BuildStage,
    DeployPipeline,
    DeployStage,
    Artifact,
    ContainerRepository,
    ArtifactRepository,
    CodeRepository,
    Environment,
    KnowledgeBase,
    VulnerabilityAudit,
    Log,
    Project,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::BuildPipeline => "build pipeline",
            Self::BuildStage => "build stage",
            Self::DeployPipeline => "deploy pipeline",
            Self::DeployStage => "deploy stage",
            Self::Artifact => "artifact",
            Self::ContainerRepository => "container repository",
            Self::ArtifactRepository => "artifact repository",
            Self::CodeRepository => "code repository",
            Self::Environment => "environment",
            Self::KnowledgeBase => "knowledge base",
            Self::VulnerabilityAudit => "vulnerability audit",
            Self::Log => "log",
            Self::Project => "project",
        };
        f.write_str(label)
    }
}

/// A resource that was deleted during a teardown run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedResource {
    pub kind: ResourceKind,
    pub id: String,
    pub display_name: String,
}

/// A resource whose deletion failed. The run continues past these and
/// surfaces them all at the end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeardownFailure {
    pub kind: ResourceKind,
    pub id: String,
    pub display_name: String,
    pub message: String,
}

/// Outcome of a teardown run for one project.
#[derive(Debug, Serialize, Deserialize)]
pub struct TeardownReport {
    pub provider: String,
    pub project: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub deleted: Vec<DeletedResource>,
    pub failures: Vec<TeardownFailure>,
}

impl TeardownReport {
    pub fn record_deleted(&mut self, kind: ResourceKind, id: &str, display_name: &str) {
        self.deleted.push(DeletedResource {
            kind,
            id: id.to_string(),
            display_name: display_name.to_string(),
        });
    }

    pub fn record_failure(
        &mut self,
        kind: ResourceKind,
        id: &str,
        display_name: &str,
        message: impl std::fmt::Display,
    ) {
        self.failures.push(TeardownFailure {
            kind,
            id: id.to_string(),
            display_name: display_name.to_string(),
            message: message.to_string(),
        });
    }
}

/// A single deletion the planner scheduled, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedDeletion {
    pub kind: ResourceKind,
    pub id: String,
    pub display_name: String,
}

/// Dry-run output: every deletion a teardown would perform, in the order it
/// would perform them.
#[derive(Debug, Serialize, Deserialize)]
pub struct TeardownPlan {
    pub provider: String,
    pub project: String,
    pub collected_at: DateTime<Utc>,
    pub planned: Vec<PlannedDeletion>,
}

impl TeardownPlan {
    pub fn record(&mut self, kind: ResourceKind, id: &str, display_name: &str) {
        self.planned.push(PlannedDeletion {
            kind,
            id: id.to_string(),
            display_name: display_name.to_string(),
        });
    }
}
