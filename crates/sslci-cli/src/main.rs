//! OpenSSL CI tooling entrypoint.

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod handlers;
mod validate;
mod workflows;

#[cfg(test)]
mod cli_tests;

use commands::{ArtifactoryCommands, Commands, ConfigCommands, MetricsCommands};
use config::CliConfig;
use sslci_artifactory::{BuildReportRequest, WorkflowMetrics};

#[derive(Parser)]
#[command(name = "sslci")]
#[command(author, version, about = "OpenSSL CI build matrix, package and metrics tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr so matrix documents on stdout stay parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load().unwrap_or_default();

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("{} {}", style("✗").red(), e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Matrix(args) => handlers::matrix(config, args)?,
        Commands::Artifactory {
            connection,
            command,
        } => {
            let client = handlers::artifactory_client(config, connection)?;
            match command {
                ArtifactoryCommands::Report {
                    package_name,
                    version,
                    platform,
                    profile,
                    build_time,
                    cache_hits,
                    output_file,
                } => handlers::build_report(
                    &client,
                    BuildReportRequest {
                        package_name,
                        version,
                        platform,
                        profile,
                        build_time,
                        cache_hits,
                    },
                    output_file,
                )?,
                ArtifactoryCommands::Upload {
                    package_name,
                    version,
                    path,
                } => handlers::upload_package(&client, &package_name, &version, path).await?,
                ArtifactoryCommands::Cleanup { retention_days } => {
                    handlers::cleanup(&client, retention_days).await?
                }
                ArtifactoryCommands::CacheStats => handlers::cache_stats(&client).await?,
                ArtifactoryCommands::UpdateMetrics {
                    workflow_run_id,
                    build_scope,
                    status,
                    timestamp,
                    metrics_dir,
                } => {
                    let metrics = WorkflowMetrics {
                        workflow_run_id,
                        build_scope,
                        status,
                        timestamp: timestamp.unwrap_or_default(),
                        artifactory_url: String::new(),
                    };
                    handlers::update_metrics(&client, metrics, &metrics_dir).await?
                }
                ArtifactoryCommands::ApplyRetention { environment } => {
                    handlers::apply_retention(&client, &environment).await?
                }
                ArtifactoryCommands::Sbom {
                    package_name,
                    version,
                    output_file,
                } => handlers::sbom(&client, &package_name, &version, output_file)?,
            }
        }
        Commands::Metrics { command } => match command {
            MetricsCommands::Collect(args) => handlers::collect_metrics(args).await?,
            MetricsCommands::Analyze { file, baseline } => {
                handlers::analyze_metrics(&file, baseline.as_deref())?
            }
        },
        Commands::Validate { root } => handlers::validate(&root)?,
        Commands::FixWorkflows { dir } => handlers::fix_workflows(&dir)?,
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(config)?,
            ConfigCommands::Set { key, value } => handlers::set_config(&key, &value)?,
        },
    }

    Ok(())
}
