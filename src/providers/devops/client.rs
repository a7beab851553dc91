use log::warn;
use reqwest::{Client, Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

use crate::auth::Token;
use crate::error::{DevSweepError, Result};

use super::types::{
    ArtifactRepositorySummary, BuildPipelineSummary, BuildStageSummary, CodeRepositorySummary,
    ContainerRepositorySummary, DeployArtifactSummary, DeployEnvironmentSummary,
    DeployPipelineSummary, DeployStageSummary, KnowledgeBaseSummary, LogSummary, ProjectSummary,
    VulnerabilityAuditSummary, WorkRequest,
};

const MAX_RETRIES: u32 = 30;
const RETRY_DELAY_SECONDS: u64 = 10;
const MAX_CONCURRENT_REQUESTS: usize = 16;
const WORK_REQUEST_POLL_SECONDS: u64 = 2;

/// REST client for the DevOps service.
///
/// Mutating calls against the same parent resource are serialized by the
/// remote service; the client only provides the per-request plumbing (auth,
/// retries, work-request polling) and leaves ordering to the caller.
pub struct DevOpsClient {
    client: Client,
    base_url: Url,
    token: Option<Token>,
    semaphore: Arc<Semaphore>,
}

impl DevOpsClient {
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("devsweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DevSweepError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut base_url = Url::parse(base_url)
            .map_err(|e| DevSweepError::Config(format!("Invalid base URL: {e}")))?;

        // Url::join treats a base without a trailing slash as a file path.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self {
            client,
            base_url,
            token,
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DevSweepError::Config(format!("Invalid endpoint {path}: {e}")))
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Send a request with automatic retry on transient network errors, rate
    /// limits and server errors. Returns the response once the status is
    /// anything other than 429/5xx.
    async fn send_with_retry(&self, method: Method, url: Url) -> Result<reqwest::Response> {
        // One permit per logical request, polling included.
        let _permit = self.semaphore.acquire().await.unwrap();

        let mut retry_count = 0;
        loop {
            let request = self.auth_request(self.client.request(method.clone(), url.clone()));

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                    if retry_count >= MAX_RETRIES {
                        return Err(e.into());
                    }
                    warn!(
                        "Network error ({}), retrying in {}s ({}/{})...",
                        e,
                        RETRY_DELAY_SECONDS,
                        retry_count + 1,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECONDS)).await;
                    retry_count += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if retry_count >= MAX_RETRIES {
                    return Err(DevSweepError::ApiAfterRetries {
                        status: status.as_u16(),
                        retries: MAX_RETRIES,
                    });
                }

                warn!(
                    "DevOps API error (status {status}). Waiting {RETRY_DELAY_SECONDS} seconds before retry {}/{}...",
                    retry_count + 1,
                    MAX_RETRIES
                );

                tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECONDS)).await;
                retry_count += 1;
                continue;
            }

            return Ok(response);
        }
    }

    async fn get_json<T>(&self, path: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self.send_with_retry(Method::GET, url).await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(DevSweepError::ApiStatus {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Delete a resource and wait for the operation to reach a terminal
    /// state. Synchronous deletes answer 200/204; asynchronous ones answer
    /// 202 with a work request that is polled until it completes.
    async fn delete_resource(&self, path: &str) -> Result<()> {
        let url = self.endpoint(path)?;
        let response = self.send_with_retry(Method::DELETE, url).await?;

        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::ACCEPTED => {
                let work_request: WorkRequest = response.json().await?;
                self.wait_for_work_request(work_request).await
            }
            _ => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error response".to_string());
                Err(DevSweepError::ApiStatus {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn wait_for_work_request(&self, mut work_request: WorkRequest) -> Result<()> {
        while !work_request.status.is_terminal() {
            tokio::time::sleep(Duration::from_secs(WORK_REQUEST_POLL_SECONDS)).await;
            work_request = self
                .get_json(&format!("workRequests/{}", work_request.id))
                .await?;
        }

        match work_request.status {
            super::types::WorkRequestStatus::Succeeded => Ok(()),
            _ => Err(DevSweepError::WorkRequestFailed(work_request.id)),
        }
    }

    pub async fn get_project(&self, project_id: &str) -> Result<ProjectSummary> {
        self.get_json(&format!("projects/{project_id}")).await
    }

    pub async fn list_code_repositories(
        &self,
        project_id: &str,
    ) -> Result<Vec<CodeRepositorySummary>> {
        self.get_json(&format!("projects/{project_id}/repositories"))
            .await
    }

    pub async fn list_build_pipelines(
        &self,
        project_id: &str,
    ) -> Result<Vec<BuildPipelineSummary>> {
        self.get_json(&format!("projects/{project_id}/buildPipelines"))
            .await
    }

    pub async fn list_build_stages(&self, pipeline_id: &str) -> Result<Vec<BuildStageSummary>> {
        self.get_json(&format!("buildPipelines/{pipeline_id}/stages"))
            .await
    }

    pub async fn list_deploy_pipelines(
        &self,
        project_id: &str,
    ) -> Result<Vec<DeployPipelineSummary>> {
        self.get_json(&format!("projects/{project_id}/deployPipelines"))
            .await
    }

    pub async fn list_deploy_stages(&self, pipeline_id: &str) -> Result<Vec<DeployStageSummary>> {
        self.get_json(&format!("deployPipelines/{pipeline_id}/stages"))
            .await
    }

    pub async fn list_artifacts(&self, project_id: &str) -> Result<Vec<DeployArtifactSummary>> {
        self.get_json(&format!("projects/{project_id}/artifacts"))
            .await
    }

    pub async fn list_container_repositories(
        &self,
        compartment_id: &str,
    ) -> Result<Vec<ContainerRepositorySummary>> {
        self.get_json(&format!(
            "compartments/{compartment_id}/containerRepositories"
        ))
        .await
    }

    pub async fn list_artifact_repositories(
        &self,
        compartment_id: &str,
    ) -> Result<Vec<ArtifactRepositorySummary>> {
        self.get_json(&format!(
            "compartments/{compartment_id}/artifactRepositories"
        ))
        .await
    }

    pub async fn list_environments(
        &self,
        project_id: &str,
    ) -> Result<Vec<DeployEnvironmentSummary>> {
        self.get_json(&format!("projects/{project_id}/environments"))
            .await
    }

    pub async fn list_knowledge_bases(
        &self,
        compartment_id: &str,
    ) -> Result<Vec<KnowledgeBaseSummary>> {
        self.get_json(&format!("compartments/{compartment_id}/knowledgeBases"))
            .await
    }

    pub async fn list_vulnerability_audits(
        &self,
        knowledge_base_id: &str,
    ) -> Result<Vec<VulnerabilityAuditSummary>> {
        self.get_json(&format!("knowledgeBases/{knowledge_base_id}/audits"))
            .await
    }

    pub async fn list_logs(&self, project_id: &str) -> Result<Vec<LogSummary>> {
        self.get_json(&format!("projects/{project_id}/logs")).await
    }

    pub async fn delete_build_stage(&self, stage_id: &str) -> Result<()> {
        self.delete_resource(&format!("buildPipelineStages/{stage_id}"))
            .await
    }

    pub async fn delete_build_pipeline(&self, pipeline_id: &str) -> Result<()> {
        self.delete_resource(&format!("buildPipelines/{pipeline_id}"))
            .await
    }

    pub async fn delete_deploy_stage(&self, stage_id: &str) -> Result<()> {
        self.delete_resource(&format!("deployStages/{stage_id}"))
            .await
    }

    pub async fn delete_deploy_pipeline(&self, pipeline_id: &str) -> Result<()> {
        self.delete_resource(&format!("deployPipelines/{pipeline_id}"))
            .await
    }

    pub async fn delete_artifact(&self, artifact_id: &str) -> Result<()> {
        self.delete_resource(&format!("artifacts/{artifact_id}"))
            .await
    }

    pub async fn delete_container_repository(&self, repository_id: &str) -> Result<()> {
        self.delete_resource(&format!("containerRepositories/{repository_id}"))
            .await
    }

    pub async fn delete_artifact_repository(&self, repository_id: &str) -> Result<()> {
        self.delete_resource(&format!("artifactRepositories/{repository_id}"))
            .await
    }

    pub async fn delete_code_repository(&self, repository_id: &str) -> Result<()> {
        self.delete_resource(&format!("repositories/{repository_id}"))
            .await
    }

    pub async fn delete_environment(&self, environment_id: &str) -> Result<()> {
        self.delete_resource(&format!("environments/{environment_id}"))
            .await
    }

    pub async fn delete_vulnerability_audit(&self, audit_id: &str) -> Result<()> {
        self.delete_resource(&format!("audits/{audit_id}")).await
    }

    pub async fn delete_knowledge_base(&self, knowledge_base_id: &str) -> Result<()> {
        self.delete_resource(&format!("knowledgeBases/{knowledge_base_id}"))
            .await
    }

    pub async fn delete_log(&self, log_id: &str) -> Result<()> {
        self.delete_resource(&format!("logs/{log_id}")).await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        self.delete_resource(&format!("projects/{project_id}"))
            .await
    }
}
