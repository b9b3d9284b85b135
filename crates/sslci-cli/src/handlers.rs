//! Command handlers.

use crate::commands::{ArtifactoryArgs, CollectArgs, MatrixArgs};
use crate::config::{CliConfig, OutputFormat};
use crate::validate;
use crate::workflows;
use console::style;
use sslci_artifactory::{
    ArtifactoryClient, ArtifactoryConfig, BuildReportRequest, Environment, WorkflowMetrics,
};
use sslci_core::{BuildTables, ChangeCounts, MatrixRequest};
use sslci_matrix::MatrixGenerator;
use sslci_metrics::{
    BuildIdentity, BuildMetrics, BuildStatus, MetricsAnalyzer, MetricsCollector, SysinfoProbe,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

type HandlerResult = Result<(), Box<dyn std::error::Error>>;

/// Generate the build matrix.
pub fn matrix(config: &CliConfig, args: MatrixArgs) -> HandlerResult {
    let tables = match args.tables.as_ref().or(config.tables_path.as_ref()) {
        Some(path) => BuildTables::from_yaml_file(path)?,
        None => BuildTables::default(),
    };

    let changes = ChangeCounts::parse(
        &args.core_changes,
        &args.config_changes,
        &args.test_changes,
        &args.provider_changes,
    )?;
    info!(
        core = changes.core,
        config = changes.config,
        test = changes.test,
        provider = changes.provider,
        "Change analysis"
    );

    let request = MatrixRequest::new(args.source_repo, args.source_sha, args.build_scope, changes)?;
    let matrix = MatrixGenerator::new(tables).generate_with_cache(&request);

    let body = match args.output_format.unwrap_or(config.output_format) {
        OutputFormat::Json => matrix.to_json()?,
        OutputFormat::Yaml => matrix.to_yaml()?,
    };

    match args.output_file {
        Some(path) => {
            std::fs::write(&path, body)?;
            info!(
                path = %path.display(),
                total_jobs = matrix.total_jobs,
                optimization_applied = matrix.optimization_applied,
                "Build matrix saved"
            );
            println!("{} Build matrix saved to {}", style("✓").green(), path.display());
            println!("  Total jobs: {}", matrix.total_jobs);
            println!("  Optimization applied: {}", matrix.optimization_applied);
        }
        None => println!("{}", body),
    }

    Ok(())
}

/// Build a client from flags, environment and config, in that order.
pub fn artifactory_client(
    config: &CliConfig,
    args: ArtifactoryArgs,
) -> Result<ArtifactoryClient, Box<dyn std::error::Error>> {
    let url = args
        .url
        .or_else(|| config.artifactory_url.clone())
        .ok_or("Artifactory URL not set (use --url, ARTIFACTORY_URL or `sslci config set artifactory_url`)")?;
    let username = args
        .username
        .or_else(|| config.artifactory_username.clone())
        .ok_or("Artifactory username not set (use --username or ARTIFACTORY_USERNAME)")?;
    let password = args
        .password
        .or_else(|| config.artifactory_password.clone())
        .ok_or("Artifactory password not set (use --password or ARTIFACTORY_PASSWORD)")?;

    let mut connection = ArtifactoryConfig::new(url, username, password);
    if let Some(repository) = args.repository.or_else(|| config.artifactory_repository.clone()) {
        connection = connection.with_repository(repository);
    }
    Ok(ArtifactoryClient::new(connection))
}

pub fn build_report(
    client: &ArtifactoryClient,
    request: BuildReportRequest,
    output_file: Option<PathBuf>,
) -> HandlerResult {
    let report = client.generate_report(&request);
    write_json(&serde_json::to_string_pretty(&report)?, output_file.as_deref(), "Report")
}

pub async fn upload_package(
    client: &ArtifactoryClient,
    package_name: &str,
    version: &str,
    path: Option<PathBuf>,
) -> HandlerResult {
    let dir = path.unwrap_or_else(|| Path::new("packages").join(package_name).join(version));
    println!(
        "{} Uploading {}/{} from {}",
        style("▶").cyan(),
        style(package_name).bold(),
        version,
        dir.display()
    );

    let summary = client.upload_package(&dir, package_name, version).await?;
    println!(
        "{} Uploaded {} files ({} bytes)",
        style("✓").green(),
        summary.files,
        summary.bytes
    );
    Ok(())
}

pub async fn cleanup(client: &ArtifactoryClient, retention_days: u32) -> HandlerResult {
    let deleted = client.cleanup_old_packages(retention_days).await?;
    println!("{} Cleaned up {} old packages", style("✓").green(), deleted);
    Ok(())
}

pub async fn cache_stats(client: &ArtifactoryClient) -> HandlerResult {
    let metrics = client.cache_metrics().await?;
    println!("Repository: {}", style(&metrics.repository).bold());
    println!("  Packages: {}", metrics.total_packages);
    println!("  Retrieved: {}", metrics.last_updated.to_rfc3339());
    Ok(())
}

pub async fn update_metrics(
    client: &ArtifactoryClient,
    mut metrics: WorkflowMetrics,
    metrics_dir: &Path,
) -> HandlerResult {
    if metrics.timestamp.is_empty() {
        metrics.timestamp = chrono::Utc::now().to_rfc3339();
    }
    let path = client.record_workflow_metrics(&metrics, metrics_dir).await?;
    println!(
        "{} Metrics updated for workflow {} ({})",
        style("✓").green(),
        metrics.workflow_run_id,
        path.display()
    );
    Ok(())
}

pub async fn apply_retention(client: &ArtifactoryClient, environment: &str) -> HandlerResult {
    let environment = Environment::parse_or_default(environment);
    let policy = environment.retention_policy();
    println!(
        "{} Applying {} policy: {} days, {} versions, {} cleanup",
        style("▶").cyan(),
        style(environment).bold(),
        policy.retention_days,
        policy.max_versions,
        policy.cleanup_schedule
    );

    let deleted = client.apply_retention_policy(environment).await?;
    println!("{} Removed {} packages", style("✓").green(), deleted);
    Ok(())
}

pub fn sbom(
    client: &ArtifactoryClient,
    package_name: &str,
    version: &str,
    output_file: Option<PathBuf>,
) -> HandlerResult {
    let sbom = client.generate_sbom(package_name, version);
    write_json(&serde_json::to_string_pretty(&sbom)?, output_file.as_deref(), "SBOM")
}

/// Run a build command under the metrics collector.
pub async fn collect_metrics(args: CollectArgs) -> HandlerResult {
    let (program, program_args) = args
        .command
        .split_first()
        .ok_or("No build command given")?;

    let mut collector = MetricsCollector::new(BuildIdentity {
        build_id: args.build_id,
        source_repo: args.source_repo,
        source_sha: args.source_sha,
        platform: args.platform,
        profile: args.profile,
        build_scope: args.build_scope,
    });

    collector.start_phase(&args.phase);
    let mut child = tokio::process::Command::new(program)
        .args(program_args)
        .spawn()
        .map_err(|e| format!("Failed to spawn {}: {}", program, e))?;
    if let Some(pid) = child.id() {
        collector.start_monitoring(
            SysinfoProbe::for_pid(pid),
            Duration::from_millis(args.interval_ms.max(1)),
        );
    }

    let status = child.wait().await?;
    collector.end_phase(&args.phase);

    collector.record_build_status(if status.success() {
        BuildStatus::Success
    } else {
        BuildStatus::Failure
    });
    if let Some(hit_rate) = args.cache_hit_rate {
        collector.record_cache_metrics(hit_rate, args.cache_misses, args.cache_size_mb);
    }
    collector.record_artifacts(&args.artifacts);
    collector.record_quality_metrics(args.warnings, args.errors);

    collector.finalize().await;
    collector.save(&args.output)?;

    println!("{}", collector.summary_report());
    println!("{} Metrics saved to {}", style("✓").green(), args.output.display());

    if status.success() {
        Ok(())
    } else {
        Err(format!("Build command failed: {}", status).into())
    }
}

pub fn analyze_metrics(file: &Path, baseline: Option<&Path>) -> HandlerResult {
    let metrics = BuildMetrics::from_file(file)?;
    let analysis = MetricsAnalyzer::analyze(&metrics);

    println!(
        "Performance score for {}: {}",
        style(&metrics.build_id).bold(),
        style(analysis.performance_score).cyan()
    );
    for (bottleneck, recommendation) in analysis.bottlenecks.iter().zip(&analysis.recommendations) {
        println!("  {} {} ({})", style("!").yellow(), bottleneck, style(recommendation).dim());
    }

    if let Some(baseline) = baseline {
        let baseline = BuildMetrics::from_file(baseline)?;
        let comparison = MetricsAnalyzer::compare(&metrics, &baseline);

        println!(
            "\nAgainst {}: build time {:+.2}s ({:+.1}%)",
            style(&baseline.build_id).bold(),
            comparison.build_time.absolute,
            comparison.build_time.percent
        );
        for improvement in &comparison.improvements {
            println!("  {} {}", style("✓").green(), improvement);
        }
        for regression in &comparison.regressions {
            println!("  {} {}", style("✗").red(), regression);
        }
    }

    Ok(())
}

/// Validate a repository; any failed check is an error.
pub fn validate(root: &Path) -> HandlerResult {
    let report = validate::validate_repository(root);

    for check in &report.checks {
        if check.passed {
            println!("{} {}", style("✓").green(), check.name);
        } else {
            println!("{} {}", style("✗").red(), check.name);
            for failure in &check.failures {
                println!("    {}", failure);
            }
        }
    }

    println!(
        "\nOverall: {}/{} validations passed ({:.1}%)",
        report.passed(),
        report.total(),
        report.success_rate()
    );

    if report.all_passed() {
        Ok(())
    } else {
        Err(format!("{} validation(s) failed", report.total() - report.passed()).into())
    }
}

pub fn fix_workflows(dir: &Path) -> HandlerResult {
    match workflows::fix_workflows(dir)? {
        Some(summary) => println!(
            "{} Fixed {}/{} workflow files",
            style("✓").green(),
            summary.fixed,
            summary.total
        ),
        None => println!("{} No {} directory found", style("!").yellow(), dir.display()),
    }
    Ok(())
}

/// Show configuration.
pub fn show_config(config: &CliConfig) -> HandlerResult {
    println!("Current configuration:");
    println!(
        "  artifactory_url: {}",
        config.artifactory_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  artifactory_username: {}",
        config.artifactory_username.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  artifactory_password: {}",
        if config.artifactory_password.is_some() {
            "***"
        } else {
            "(not set)"
        }
    );
    println!(
        "  artifactory_repository: {}",
        config.artifactory_repository.as_deref().unwrap_or("conan")
    );
    println!(
        "  tables_path: {}",
        config
            .tables_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(built-in)".to_string())
    );
    println!("  output_format: {:?}", config.output_format);

    if let Ok(path) = CliConfig::config_path() {
        println!("\nConfig file: {}", path.display());
    }

    Ok(())
}

/// Set configuration.
pub fn set_config(key: &str, value: &str) -> HandlerResult {
    let mut config = CliConfig::load().unwrap_or_default();
    config.set(key, value)?;
    config.save()?;

    println!("{} Set {} = {}", style("✓").green(), key, value);
    Ok(())
}

fn write_json(body: &str, output_file: Option<&Path>, what: &str) -> HandlerResult {
    match output_file {
        Some(path) => {
            std::fs::write(path, body)?;
            println!("{} {} saved to {}", style("✓").green(), what, path.display());
        }
        None => println!("{}", body),
    }
    Ok(())
}
