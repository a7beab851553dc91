use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{error, info};
use serde::Serialize;
use std::path::PathBuf;

use crate::auth::Token;
use crate::config::{Config, OutputFormat};
use crate::output;
use crate::providers::DevOpsTeardown;

#[derive(Parser)]
#[command(name = "devsweep")]
#[command(author, version, about = "DevOps Project Teardown Tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete every resource of the given projects, dependents first
    Teardown {
        #[arg(short, long, env = "DEVSWEEP_TOKEN")]
        token: Option<String>,

        #[arg(short, long)]
        url: Option<String>,

        #[arg(short = 'P', long = "project", required = true)]
        projects: Vec<String>,

        #[arg(short = 'C', long)]
        compartment: Option<String>,

        #[arg(long, default_value_t = false)]
        keep_project: bool,
    },

    /// Print the ordered deletion plan without deleting anything
    Plan {
        #[arg(short, long, env = "DEVSWEEP_TOKEN")]
        token: Option<String>,

        #[arg(short, long)]
        url: Option<String>,

        #[arg(short = 'P', long)]
        project: String,

        #[arg(short = 'C', long)]
        compartment: Option<String>,
    },
}

struct ServiceArgs {
    base_url: String,
    compartment: String,
    token: Option<Token>,
}

impl Cli {
    fn resolve_service_args(
        &self,
        config: &Config,
        token: &Option<String>,
        url: &Option<String>,
        compartment: &Option<String>,
    ) -> Result<ServiceArgs> {
        let token = token
            .clone()
            .or_else(|| config.devops.token.clone())
            .map(Token::from);

        let base_url = url.clone().unwrap_or_else(|| config.devops.base_url.clone());

        let compartment = compartment
            .clone()
            .or_else(|| config.devops.compartment.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("No compartment specified (use --compartment or the config file)")
            })?;

        Ok(ServiceArgs {
            base_url,
            compartment,
            token,
        })
    }

    fn emit<T: Serialize>(&self, config: &Config, value: &T, rendered: String) -> Result<()> {
        let json_output = if self.pretty || config.output.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Report written to: {}", output_path.display());
        } else if config.output.format == OutputFormat::Json {
            println!("{}", json_output);
        } else {
            println!("{}", rendered);
        }

        Ok(())
    }

    async fn execute_teardown(
        &self,
        config: &Config,
        token: &Option<String>,
        url: &Option<String>,
        projects: &[String],
        compartment: &Option<String>,
        keep_project: bool,
    ) -> Result<()> {
        let args = self.resolve_service_args(config, token, url, compartment)?;
        let keep_project = keep_project || config.devops.keep_project;

        let mut reports = Vec::new();
        for project in projects {
            info!("Tearing down project: {project}");

            let provider = DevOpsTeardown::new(
                &args.base_url,
                project.clone(),
                args.compartment.clone(),
                args.token.clone(),
            )?;

            match provider.teardown(keep_project).await {
                Ok(report) => reports.push(report),
                Err(err) => {
                    // Failures are isolated per project; the remaining
                    // projects still get their teardown attempt.
                    error!("Failed to tear down project {project}: {err}");
                }
            }
        }

        let rendered = reports
            .iter()
            .map(output::render_summary)
            .collect::<Vec<_>>()
            .join("\n");

        self.emit(config, &reports, rendered)
    }

    async fn execute_plan(
        &self,
        config: &Config,
        token: &Option<String>,
        url: &Option<String>,
        project: &str,
        compartment: &Option<String>,
    ) -> Result<()> {
        let args = self.resolve_service_args(config, token, url, compartment)?;

        info!("Planning teardown of project: {project}");

        let provider = DevOpsTeardown::new(
            &args.base_url,
            project.to_string(),
            args.compartment.clone(),
            args.token.clone(),
        )?;

        let plan = provider.plan().await?;

        self.emit(config, &plan, output::render_plan(&plan))
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Teardown {
                token,
                url,
                projects,
                compartment,
                keep_project,
            } => {
                self.execute_teardown(&config, token, url, projects, compartment, *keep_project)
                    .await
            }
            Commands::Plan {
                token,
                url,
                project,
                compartment,
            } => {
                self.execute_plan(&config, token, url, project, compartment)
                    .await
            }
        }
    }
}
