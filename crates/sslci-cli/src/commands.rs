//! CLI command definitions.

use crate::config::OutputFormat;
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the build matrix for a source revision
    Matrix(MatrixArgs),

    /// Manage OpenSSL packages in Artifactory
    Artifactory {
        #[command(flatten)]
        connection: ArtifactoryArgs,

        #[command(subcommand)]
        command: ArtifactoryCommands,
    },

    /// Collect and analyze build metrics
    Metrics {
        #[command(subcommand)]
        command: MetricsCommands,
    },

    /// Validate an OpenSSL source repository
    Validate {
        /// Repository root
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Repair common syntax errors in workflow files
    FixWorkflows {
        /// Workflow directory
        #[arg(long, default_value = ".github/workflows")]
        dir: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args)]
pub struct MatrixArgs {
    /// Source repository, e.g. openssl/openssl
    #[arg(long)]
    pub source_repo: String,

    /// Source revision
    #[arg(long)]
    pub source_sha: String,

    /// Build scope (full, test, provider, minimal)
    #[arg(long)]
    pub build_scope: String,

    /// Changed files in core library code (raw workflow output, blank means zero)
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub core_changes: String,

    /// Changed files in build configuration
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub config_changes: String,

    /// Changed files in tests
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub test_changes: String,

    /// Changed files in providers
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub provider_changes: String,

    /// Output format [default: config value, then json]
    #[arg(long, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Write the matrix to a file instead of stdout
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Build tables YAML file
    #[arg(long)]
    pub tables: Option<PathBuf>,
}

#[derive(Args)]
pub struct ArtifactoryArgs {
    /// Artifactory server URL
    #[arg(long, env = "ARTIFACTORY_URL", global = true)]
    pub url: Option<String>,

    #[arg(long, env = "ARTIFACTORY_USERNAME", global = true)]
    pub username: Option<String>,

    #[arg(long, env = "ARTIFACTORY_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Package repository key
    #[arg(long, global = true)]
    pub repository: Option<String>,
}

#[derive(Subcommand)]
pub enum ArtifactoryCommands {
    /// Generate a build report
    Report {
        #[arg(long)]
        package_name: String,

        #[arg(long)]
        version: String,

        #[arg(long)]
        platform: String,

        #[arg(long)]
        profile: String,

        /// Build time in seconds
        #[arg(long)]
        build_time: f64,

        #[arg(long)]
        cache_hits: u32,

        #[arg(long)]
        output_file: Option<PathBuf>,
    },

    /// Upload a package directory
    Upload {
        #[arg(long)]
        package_name: String,

        #[arg(long)]
        version: String,

        /// Package directory [default: packages/<name>/<version>]
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Delete packages older than the retention period
    Cleanup {
        #[arg(long, default_value_t = 30)]
        retention_days: u32,
    },

    /// Show repository storage statistics
    CacheStats,

    /// Record workflow run metrics
    UpdateMetrics {
        #[arg(long)]
        workflow_run_id: String,

        #[arg(long)]
        build_scope: String,

        #[arg(long)]
        status: String,

        /// RFC 3339 timestamp [default: now]
        #[arg(long)]
        timestamp: Option<String>,

        #[arg(long, default_value = "metrics")]
        metrics_dir: PathBuf,
    },

    /// Apply an environment's retention policy
    ApplyRetention {
        /// development, staging or production
        #[arg(long, default_value = "development")]
        environment: String,
    },

    /// Generate a CycloneDX SBOM
    Sbom {
        #[arg(long)]
        package_name: String,

        #[arg(long)]
        version: String,

        #[arg(long)]
        output_file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum MetricsCommands {
    /// Run a build command and record its metrics
    Collect(CollectArgs),

    /// Analyze saved metrics
    Analyze {
        /// Metrics file
        file: PathBuf,

        /// Baseline metrics to compare against
        #[arg(long)]
        baseline: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct CollectArgs {
    #[arg(long)]
    pub build_id: String,

    #[arg(long)]
    pub source_repo: String,

    #[arg(long)]
    pub source_sha: String,

    #[arg(long)]
    pub platform: String,

    #[arg(long)]
    pub profile: String,

    #[arg(long)]
    pub build_scope: String,

    /// Metrics output file
    #[arg(long)]
    pub output: PathBuf,

    /// Phase the command is timed as
    #[arg(long, default_value = "compile")]
    pub phase: String,

    /// Sampling interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// Artifact produced by the build (repeatable)
    #[arg(long = "artifact")]
    pub artifacts: Vec<PathBuf>,

    #[arg(long)]
    pub cache_hit_rate: Option<f64>,

    #[arg(long, default_value_t = 0)]
    pub cache_misses: u64,

    #[arg(long, default_value_t = 0.0)]
    pub cache_size_mb: f64,

    #[arg(long, default_value_t = 0)]
    pub warnings: u64,

    #[arg(long, default_value_t = 0)]
    pub errors: u64,

    /// Build command and its arguments
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Key
        key: String,

        /// Value
        value: String,
    },
}
