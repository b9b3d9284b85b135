//! Artifactory integration for OpenSSL packages.
//!
//! Uploads package trees, prunes old packages according to per-environment
//! retention policies, and produces build reports and CycloneDX SBOMs.

pub mod client;
pub mod error;
pub mod report;
pub mod retention;
pub mod sbom;

pub use client::{ArtifactoryClient, ArtifactoryConfig, CacheMetrics, UploadSummary, WorkflowMetrics};
pub use error::{ArtifactoryError, Result};
pub use report::{BuildReport, BuildReportRequest, CacheEfficiency};
pub use retention::{Environment, RetentionPolicy};
pub use sbom::Sbom;
