//! Supportflow command-line runner.
//!
//! `supportflow run` pushes one request through a workflow and prints the
//! final state as JSON. `supportflow validate` loads a workflow and prints a
//! stage summary.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use supportflow::abilities::BUILTIN_ABILITIES;
use supportflow::errors::{ValidationError, WorkflowLoadError};
use supportflow::observability::{init_logging, LogFormat};
use supportflow::prelude::*;
use tracing::{error, info};

/// Customer-support stage orchestration engine
#[derive(Debug, Parser)]
#[command(name = "supportflow")]
#[command(about = "Run customer-support requests through a stage workflow")]
#[command(version)]
struct Cli {
    /// Log output format (json, pretty, compact)
    #[arg(long, global = true, env = "SUPPORTFLOW_LOG_FORMAT", default_value = "compact")]
    log_format: LogFormat,

    /// Log level or filter directive
    #[arg(long, global = true, env = "SUPPORTFLOW_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one request and print the final state
    Run(RunArgs),
    /// Load a workflow and print its stages
    Validate {
        /// Workflow file (YAML or JSON)
        #[arg(short, long, env = "SUPPORTFLOW_WORKFLOW", value_name = "FILE")]
        workflow: PathBuf,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Workflow file (YAML or JSON)
    #[arg(short, long, env = "SUPPORTFLOW_WORKFLOW", value_name = "FILE")]
    workflow: PathBuf,

    /// Request payload as a JSON file
    #[arg(
        short,
        long,
        value_name = "FILE",
        conflicts_with_all = ["customer_name", "email", "query"]
    )]
    input: Option<PathBuf>,

    /// Customer display name
    #[arg(long)]
    customer_name: Option<String>,

    /// Customer contact address
    #[arg(long)]
    email: Option<String>,

    /// Support query text
    #[arg(long)]
    query: Option<String>,

    /// Request priority
    #[arg(long)]
    priority: Option<String>,

    /// Ticket identifier
    #[arg(long)]
    ticket_id: Option<String>,

    /// FAQ entries as a JSON array of {question, answer, source}
    #[arg(long, env = "SUPPORTFLOW_FAQ", value_name = "FILE")]
    faq: Option<PathBuf>,

    /// Engine configuration file (YAML)
    #[arg(short, long, env = "SUPPORTFLOW_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ability timeout in seconds, overriding the configuration file
    #[arg(long, env = "SUPPORTFLOW_ABILITY_TIMEOUT")]
    ability_timeout: Option<f64>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.log_format, &cli.log_level) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Validate { workflow } => validate(&workflow),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Maps a failure onto a process exit code.
fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ValidationError>().is_some() {
        2
    } else if err.downcast_ref::<WorkflowLoadError>().is_some() {
        3
    } else {
        1
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.ability_timeout)?;

    let knowledge_base: Arc<dyn KnowledgeBase> = match &args.faq {
        Some(path) => Arc::new(
            InMemoryKnowledgeBase::from_json_file(path)
                .with_context(|| format!("failed to load FAQ from {}", path.display()))?,
        ),
        None => Arc::new(InMemoryKnowledgeBase::sample()),
    };

    let workflow = load_workflow(&args.workflow)?;
    info!(workflow = %workflow.name, stages = workflow.stage_count(), "Workflow loaded");

    let agent = PipelineAgent::with_builtins(workflow, knowledge_base, config)
        .with_event_sink(Arc::new(LoggingEventSink::debug()));

    let state = match &args.input {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read request from {}", path.display()))?;
            let payload: Value = serde_json::from_str(&raw).map_err(|err| {
                ValidationError::invalid(format!("Malformed request payload: {err}"))
            })?;
            agent.run_json(payload).await?
        }
        None => agent.run(request_from_args(&args)).await?,
    };

    let output = if args.pretty {
        serde_json::to_string_pretty(&state)?
    } else {
        serde_json::to_string(&state)?
    };
    println!("{output}");
    Ok(())
}

fn load_config(path: Option<&Path>, ability_timeout: Option<f64>) -> Result<SupportflowConfig> {
    let mut config = match path {
        Some(path) => SupportflowConfig::from_yaml_file(path)?,
        None => SupportflowConfig::default(),
    };
    if let Some(seconds) = ability_timeout {
        config = config.with_ability_timeout(seconds);
    }
    config.validate()?;
    Ok(config)
}

fn request_from_args(args: &RunArgs) -> InboundRequest {
    InboundRequest {
        customer_name: args.customer_name.clone(),
        email: args.email.clone(),
        query: args.query.clone(),
        priority: args.priority.clone(),
        ticket_id: args.ticket_id.clone(),
        ..InboundRequest::default()
    }
}

fn validate(path: &Path) -> Result<()> {
    let workflow = load_workflow(path)?;
    print!("{}", stage_summary(&workflow));
    Ok(())
}

fn stage_summary(workflow: &WorkflowDefinition) -> String {
    let mut out = match workflow.version {
        Some(version) => format!(
            "{} v{version}: {} stage(s)\n",
            workflow.name,
            workflow.stage_count()
        ),
        None => format!("{}: {} stage(s)\n", workflow.name, workflow.stage_count()),
    };

    for (index, stage) in workflow.stages.iter().enumerate() {
        let gate = stage
            .condition
            .as_deref()
            .map(|c| format!(" if '{c}'"))
            .unwrap_or_default();
        out.push_str(&format!("{:>3}. {} [{}]{gate}\n", index + 1, stage.name, stage.mode));

        for ability in &stage.abilities {
            let marker = if BUILTIN_ABILITIES.contains(&ability.name.as_str()) {
                ""
            } else {
                " (simulated)"
            };
            out.push_str(&format!("       - {}@{}{marker}\n", ability.name, ability.backend));
        }
    }
    out
}
