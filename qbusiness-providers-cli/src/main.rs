//! Command-line front end for the Amazon Q Business resource providers.

mod output;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, LevelFilter};
use qbusiness_providers_core::handlers::{PermissionHandler, PermissionModel, ResourceHandlerRequest};
use qbusiness_providers_core::{
    diff, find_permission, load_service_configuration, parse_permissions, reconcile,
    should_update, AwsQBusinessClient, MergePrecedence, TagSources,
};

#[derive(Parser, Debug)]
#[command(name = "qbusiness-providers", version, about, long_about = None)]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// AWS region for live commands
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the tag changes between two tag source files
    DiffTags {
        /// JSON file with the previous ModelTags/SystemTags/ResourceTags
        #[arg(long)]
        previous: PathBuf,
        /// JSON file with the desired ModelTags/SystemTags/ResourceTags
        #[arg(long)]
        desired: PathBuf,
    },

    /// Parse an application policy document into permission records
    ParsePolicy {
        /// Application the policy belongs to
        #[arg(long)]
        application_id: String,
        /// Only print the statement with this Sid
        #[arg(long)]
        statement_id: Option<String>,
        /// Policy file; stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the supported resource types
    ResourceTypes,

    /// Apply the tag changes between two tag source files to a resource
    ReconcileTags {
        /// ARN of the resource to tag
        #[arg(long)]
        resource_arn: String,
        /// JSON file with the previous tag sources
        #[arg(long)]
        previous: PathBuf,
        /// JSON file with the desired tag sources
        #[arg(long)]
        desired: PathBuf,
    },

    /// Read the permissions of an application from its live policy
    GetPermissions {
        /// Application to read
        #[arg(long)]
        application_id: String,
        /// Only read the statement with this Sid
        #[arg(long)]
        statement_id: Option<String>,
    },
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn read_tag_sources(path: &Path) -> Result<TagSources> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tag sources from {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid tag sources JSON in {}", path.display()))
}

fn read_policy(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy from {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read policy from stdin")?;
            Ok(text)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::DiffTags { previous, desired } => {
            let previous = read_tag_sources(&previous)?.merged(MergePrecedence::Previous);
            let desired = read_tag_sources(&desired)?.merged(MergePrecedence::Desired);
            let changes = diff(&previous, &desired);
            output::output_tag_diff(&changes, should_update(&previous, &desired), cli.pretty)
        }
        Commands::ParsePolicy {
            application_id,
            statement_id,
            file,
        } => {
            let policy = read_policy(file.as_deref())?;
            match statement_id {
                Some(statement_id) => {
                    let Some(record) =
                        find_permission(&application_id, &policy, Some(&statement_id))?
                    else {
                        bail!("No statement with Sid '{}' in the policy", statement_id);
                    };
                    output::output_json(&record, cli.pretty)
                }
                None => {
                    let records = parse_permissions(&application_id, Some(&policy))?;
                    debug!("Parsed {} permission(s)", records.len());
                    output::output_json(&records, cli.pretty)
                }
            }
        }
        Commands::ResourceTypes => {
            let config = load_service_configuration()?;
            output::output_json(config.as_ref(), cli.pretty)
        }
        Commands::ReconcileTags {
            resource_arn,
            previous,
            desired,
        } => {
            let previous = read_tag_sources(&previous)?;
            let desired = read_tag_sources(&desired)?;
            let client = AwsQBusinessClient::from_env(cli.region).await;
            let outcome = reconcile(&client, &resource_arn, &previous, &desired)
                .await
                .context("Failed to reconcile tags")?;
            output::output_reconcile(&resource_arn, &outcome, cli.pretty)
        }
        Commands::GetPermissions {
            application_id,
            statement_id,
        } => {
            let client = AwsQBusinessClient::from_env(cli.region).await;
            let handler = PermissionHandler::new(&client);
            let request = ResourceHandlerRequest {
                desired_resource_state: Some(PermissionModel {
                    application_id: Some(application_id),
                    statement_id: statement_id.clone(),
                    ..PermissionModel::default()
                }),
                ..ResourceHandlerRequest::default()
            };
            let event = if statement_id.is_some() {
                handler.read(&request).await
            } else {
                handler.list(&request).await
            };
            output::output_json(&event, cli.pretty)?;
            if !event.is_success() {
                bail!(
                    "{}",
                    event.message.unwrap_or_else(|| "Permission read failed".to_string())
                );
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    run(cli).await
}
