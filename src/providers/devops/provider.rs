use chrono::Utc;
use log::{info, warn};

use crate::auth::Token;
use crate::error::Result;
use crate::output::PhaseProgress;
use crate::report::{ResourceKind, TeardownPlan, TeardownReport};
use crate::sequencer::{deletion_order, StageNode};

use super::client::DevOpsClient;
use super::types::{BuildPipelineSummary, DeployPipelineSummary};

/// Teardown session for one DevOps project.
///
/// Owns the API client and the project/compartment ids; all state is local to
/// the value so independent projects (and tests) never share anything.
pub struct DevOpsTeardown {
    client: DevOpsClient,
    project_id: String,
    compartment_id: String,
}

impl DevOpsTeardown {
    /// Creates a teardown session for the specified project.
    ///
    /// # Arguments
    ///
    /// * `base_url` - DevOps service base URL
    /// * `project_id` - Project to tear down
    /// * `compartment_id` - Compartment holding the project's container and
    ///   artifact repositories
    /// * `token` - Optional authentication token
    ///
    /// # Errors
    ///
    /// Returns an error if the API endpoint URL cannot be constructed.
    pub fn new(
        base_url: &str,
        project_id: String,
        compartment_id: String,
        token: Option<Token>,
    ) -> Result<Self> {
        let client = DevOpsClient::new(base_url, token)?;

        Ok(Self {
            client,
            project_id,
            compartment_id,
        })
    }

    /// Computes the full deletion plan without deleting anything.
    ///
    /// Resources are fetched just-in-time and pipeline stages are ordered
    /// through the sequencer, so the plan lists every deletion a
    /// [`teardown`](Self::teardown) run would perform, in execution order.
    ///
    /// # Errors
    ///
    /// Fails on the first listing error or on a structurally inconsistent
    /// stage graph; a plan with missing entries would be misleading.
    pub async fn plan(&self) -> Result<TeardownPlan> {
        let project = self.client.get_project(&self.project_id).await?;
        info!("Planning teardown of project {}", project.display_name);

        let mut plan = TeardownPlan {
            provider: "DevOps".to_string(),
            project: project.display_name.clone(),
            collected_at: Utc::now(),
            planned: Vec::new(),
        };

        for pipe in self.client.list_build_pipelines(&self.project_id).await? {
            let stages = self.client.list_build_stages(&pipe.id).await?;
            for stage in deletion_order(&stages, Some(pipe.id.as_str()))? {
                plan.record(ResourceKind::BuildStage, stage.id(), stage.display_name());
            }
            plan.record(ResourceKind::BuildPipeline, &pipe.id, &pipe.display_name);
        }

        for pipe in self.client.list_deploy_pipelines(&self.project_id).await? {
            let stages = self.client.list_deploy_stages(&pipe.id).await?;
            for stage in deletion_order(&stages, Some(pipe.id.as_str()))? {
                plan.record(ResourceKind::DeployStage, stage.id(), stage.display_name());
            }
            plan.record(ResourceKind::DeployPipeline, &pipe.id, &pipe.display_name);
        }

        for a in self.client.list_artifacts(&self.project_id).await? {
            plan.record(ResourceKind::Artifact, &a.id, &a.display_name);
        }
        for r in self
            .client
            .list_container_repositories(&self.compartment_id)
            .await?
        {
            plan.record(ResourceKind::ContainerRepository, &r.id, &r.display_name);
        }
        for r in self
            .client
            .list_artifact_repositories(&self.compartment_id)
            .await?
        {
            plan.record(ResourceKind::ArtifactRepository, &r.id, &r.display_name);
        }
        for r in self.client.list_code_repositories(&self.project_id).await? {
            plan.record(ResourceKind::CodeRepository, &r.id, &r.display_name);
        }
        for e in self.client.list_environments(&self.project_id).await? {
            plan.record(ResourceKind::Environment, &e.id, &e.display_name);
        }
        for kb in self.client.list_knowledge_bases(&self.compartment_id).await? {
            for audit in self.client.list_vulnerability_audits(&kb.id).await? {
                plan.record(ResourceKind::VulnerabilityAudit, &audit.id, &audit.display_name);
            }
            plan.record(ResourceKind::KnowledgeBase, &kb.id, &kb.display_name);
        }

        for log in self.client.list_logs(&self.project_id).await? {
            plan.record(ResourceKind::Log, &log.id, &log.display_name);
        }

        plan.record(ResourceKind::Project, &project.id, &project.display_name);

        Ok(plan)
    }

    /// Deletes every resource of the project, pipelines first.
    ///
    /// Stage deletions within one pipeline are strictly sequential in the
    /// order computed by the sequencer; a failure inside one pipeline aborts
    /// that pipeline only. All other resource classes are deleted
    /// best-effort, with every failure recorded in the report instead of
    /// aborting the run. Project logs are the one concurrently deleted
    /// batch.
    ///
    /// # Errors
    ///
    /// Only resolving the project or listing its pipelines is fatal;
    /// everything downstream lands in [`TeardownReport::failures`].
    pub async fn teardown(&self, keep_project: bool) -> Result<TeardownReport> {
        let project = self.client.get_project(&self.project_id).await?;
        info!("Tearing down project {}", project.display_name);

        let mut report = TeardownReport {
            provider: "DevOps".to_string(),
            project: project.display_name.clone(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            deleted: Vec::new(),
            failures: Vec::new(),
        };

        // Phase 1: listing pipelines
        let progress = PhaseProgress::start_phase_1(&project.display_name);

        let build_pipelines = self.client.list_build_pipelines(&self.project_id).await?;
        let deploy_pipelines = self.client.list_deploy_pipelines(&self.project_id).await?;

        // Phase 2: deleting pipelines
        let progress =
            progress.finish_phase_1_start_phase_2(build_pipelines.len() + deploy_pipelines.len());

        // Pipelines are independent in theory, but the remote service
        // serializes delete operations against the owning project, so they
        // are processed one at a time.
        for pipe in &build_pipelines {
            if let Err(err) = self.teardown_build_pipeline(pipe, &mut report).await {
                warn!(
                    "Failed to delete build pipeline {}: {err}",
                    pipe.display_name
                );
                report.record_failure(
                    ResourceKind::BuildPipeline,
                    &pipe.id,
                    &pipe.display_name,
                    err,
                );
            }
        }

        for pipe in &deploy_pipelines {
            if let Err(err) = self.teardown_deploy_pipeline(pipe, &mut report).await {
                warn!(
                    "Failed to delete deploy pipeline {}: {err}",
                    pipe.display_name
                );
                report.record_failure(
                    ResourceKind::DeployPipeline,
                    &pipe.id,
                    &pipe.display_name,
                    err,
                );
            }
        }

        // Phase 3: deleting shared resources
        let progress = progress.finish_phase_2_start_phase_3();

        let shared = self.collect_shared_resources(&mut report).await;
        for (kind, id, name) in shared {
            match self.delete_by_kind(kind, &id).await {
                Ok(()) => {
                    info!("Deleted {kind} {name}");
                    report.record_deleted(kind, &id, &name);
                }
                Err(err) => {
                    warn!("Failed to delete {kind} {name}: {err}");
                    report.record_failure(kind, &id, &name, err);
                }
            }
        }

        self.teardown_logs(&mut report).await;

        if keep_project {
            info!("Keeping project {} as requested", project.display_name);
        } else {
            match self.client.delete_project(&project.id).await {
                Ok(()) => {
                    info!("Deleted project {}", project.display_name);
                    report.record_deleted(ResourceKind::Project, &project.id, &project.display_name);
                }
                Err(err) => {
                    warn!("Failed to delete project {}: {err}", project.display_name);
                    report.record_failure(
                        ResourceKind::Project,
                        &project.id,
                        &project.display_name,
                        err,
                    );
                }
            }
        }

        report.finished_at = Utc::now();
        progress.finish_phase_3(report.deleted.len(), report.failures.len());

        Ok(report)
    }

    async fn teardown_build_pipeline(
        &self,
        pipe: &BuildPipelineSummary,
        report: &mut TeardownReport,
    ) -> Result<()> {
        info!("Listing stages of build pipeline {}", pipe.display_name);
        let stages = self.client.list_build_stages(&pipe.id).await?;

        let ordered = deletion_order(&stages, Some(pipe.id.as_str()))?;
        for stage in ordered {
            info!(
                "Deleting stage {} of build pipeline {}",
                stage.display_name(),
                pipe.display_name
            );
            self.client.delete_build_stage(stage.id()).await?;
            report.record_deleted(ResourceKind::BuildStage, stage.id(), stage.display_name());
        }

        info!("Deleting build pipeline {}", pipe.display_name);
        self.client.delete_build_pipeline(&pipe.id).await?;
        report.record_deleted(ResourceKind::BuildPipeline, &pipe.id, &pipe.display_name);

        Ok(())
    }

    async fn teardown_deploy_pipeline(
        &self,
        pipe: &DeployPipelineSummary,
        report: &mut TeardownReport,
    ) -> Result<()> {
        info!("Listing stages of deploy pipeline {}", pipe.display_name);
        let stages = self.client.list_deploy_stages(&pipe.id).await?;

        let ordered = deletion_order(&stages, Some(pipe.id.as_str()))?;
        for stage in ordered {
            info!(
                "Deleting stage {} of deploy pipeline {}",
                stage.display_name(),
                pipe.display_name
            );
            self.client.delete_deploy_stage(stage.id()).await?;
            report.record_deleted(ResourceKind::DeployStage, stage.id(), stage.display_name());
        }

        info!("Deleting deploy pipeline {}", pipe.display_name);
        self.client.delete_deploy_pipeline(&pipe.id).await?;
        report.record_deleted(ResourceKind::DeployPipeline, &pipe.id, &pipe.display_name);

        Ok(())
    }

    /// Collects the resource classes with no inter-dependencies, in deletion
    /// order: artifacts, container and artifact repositories, code
    /// repositories, environments, then vulnerability audits before their
    /// knowledge base. Listing failures are recorded and the class skipped.
    async fn collect_shared_resources(
        &self,
        report: &mut TeardownReport,
    ) -> Vec<(ResourceKind, String, String)> {
        let mut batch: Vec<(ResourceKind, String, String)> = Vec::new();

        match self.client.list_artifacts(&self.project_id).await {
            Ok(artifacts) => {
                for a in artifacts {
                    batch.push((ResourceKind::Artifact, a.id, a.display_name));
                }
            }
            Err(err) => self.record_listing_failure(report, ResourceKind::Artifact, err),
        }

        match self
            .client
            .list_container_repositories(&self.compartment_id)
            .await
        {
            Ok(repositories) => {
                for r in repositories {
                    batch.push((ResourceKind::ContainerRepository, r.id, r.display_name));
                }
            }
            Err(err) => {
                self.record_listing_failure(report, ResourceKind::ContainerRepository, err);
            }
        }

        match self
            .client
            .list_artifact_repositories(&self.compartment_id)
            .await
        {
            Ok(repositories) => {
                for r in repositories {
                    batch.push((ResourceKind::ArtifactRepository, r.id, r.display_name));
                }
            }
            Err(err) => {
                self.record_listing_failure(report, ResourceKind::ArtifactRepository, err);
            }
        }

        match self.client.list_code_repositories(&self.project_id).await {
            Ok(repositories) => {
                for r in repositories {
                    batch.push((ResourceKind::CodeRepository, r.id, r.display_name));
                }
            }
            Err(err) => self.record_listing_failure(report, ResourceKind::CodeRepository, err),
        }

        match self.client.list_environments(&self.project_id).await {
            Ok(environments) => {
                for e in environments {
                    batch.push((ResourceKind::Environment, e.id, e.display_name));
                }
            }
            Err(err) => self.record_listing_failure(report, ResourceKind::Environment, err),
        }

        match self.client.list_knowledge_bases(&self.compartment_id).await {
            Ok(knowledge_bases) => {
                for kb in knowledge_bases {
                    match self.client.list_vulnerability_audits(&kb.id).await {
                        Ok(audits) => {
                            for audit in audits {
                                batch.push((
                                    ResourceKind::VulnerabilityAudit,
                                    audit.id,
                                    audit.display_name,
                                ));
                            }
                            batch.push((ResourceKind::KnowledgeBase, kb.id, kb.display_name));
                        }
                        Err(err) => {
                            // Audits block the base; skip the base too.
                            report.record_failure(
                                ResourceKind::KnowledgeBase,
                                &kb.id,
                                &kb.display_name,
                                err,
                            );
                        }
                    }
                }
            }
            Err(err) => self.record_listing_failure(report, ResourceKind::KnowledgeBase, err),
        }

        batch
    }

    fn record_listing_failure(
        &self,
        report: &mut TeardownReport,
        kind: ResourceKind,
        err: crate::error::DevSweepError,
    ) {
        warn!("Failed to list {kind}s: {err}");
        report.record_failure(kind, &self.project_id, "", err);
    }

    /// Logs have no dependents, so they are the one resource class deleted
    /// via a concurrent fan-out joined before moving on.
    async fn teardown_logs(&self, report: &mut TeardownReport) {
        let logs = match self.client.list_logs(&self.project_id).await {
            Ok(logs) => logs,
            Err(err) => {
                self.record_listing_failure(report, ResourceKind::Log, err);
                return;
            }
        };

        info!("Deleting {} project logs", logs.len());
        let deletions = logs
            .iter()
            .map(|log| async move { (log, self.client.delete_log(&log.id).await) });

        for (log, result) in futures::future::join_all(deletions).await {
            match result {
                Ok(()) => report.record_deleted(ResourceKind::Log, &log.id, &log.display_name),
                Err(err) => {
                    warn!("Failed to delete log {}: {err}", log.display_name);
                    report.record_failure(ResourceKind::Log, &log.id, &log.display_name, err);
                }
            }
        }
    }

    async fn delete_by_kind(&self, kind: ResourceKind, id: &str) -> Result<()> {
        match kind {
            ResourceKind::BuildStage => self.client.delete_build_stage(id).await,
            ResourceKind::BuildPipeline => self.client.delete_build_pipeline(id).await,
            ResourceKind::DeployStage => self.client.delete_deploy_stage(id).await,
            ResourceKind::DeployPipeline => self.client.delete_deploy_pipeline(id).await,
            ResourceKind::Artifact => self.client.delete_artifact(id).await,
            ResourceKind::ContainerRepository => self.client.delete_container_repository(id).await,
            ResourceKind::ArtifactRepository => self.client.delete_artifact_repository(id).await,
            ResourceKind::CodeRepository => self.client.delete_code_repository(id).await,
            ResourceKind::Environment => self.client.delete_environment(id).await,
            ResourceKind::VulnerabilityAudit => self.client.delete_vulnerability_audit(id).await,
            ResourceKind::KnowledgeBase => self.client.delete_knowledge_base(id).await,
            ResourceKind::Log => self.client.delete_log(id).await,
            ResourceKind::Project => self.client.delete_project(id).await,
        }
    }
}
