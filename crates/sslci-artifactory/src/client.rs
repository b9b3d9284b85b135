//! Artifactory REST client.

use crate::error::{ArtifactoryError, Result};
use crate::report::{BuildReport, BuildReportRequest};
use crate::retention::Environment;
use crate::sbom::Sbom;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Connection settings.
#[derive(Debug, Clone)]
pub struct ArtifactoryConfig {
    /// Server root, e.g. `https://artifacts.example.com`.
    pub url: String,
    pub username: String,
    pub password: String,
    /// Repository key holding the packages.
    pub repository: String,
}

impl ArtifactoryConfig {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            repository: "conan".to_string(),
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }
}

/// Files and bytes sent by an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub files: usize,
    pub bytes: u64,
}

/// Repository contents as reported by the storage API.
///
/// Each top-level folder of a Conan repository is one package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetrics {
    pub repository: String,
    pub total_packages: usize,
    pub last_updated: DateTime<Utc>,
}

/// Outcome of one workflow run, persisted for later analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowMetrics {
    pub workflow_run_id: String,
    pub build_scope: String,
    pub status: String,
    pub timestamp: String,
    #[serde(default)]
    pub artifactory_url: String,
}

#[derive(Debug, Deserialize)]
struct StorageListing {
    #[serde(default)]
    children: Vec<StorageChild>,
}

#[derive(Debug, Deserialize)]
struct StorageChild {
    #[serde(default)]
    folder: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    uri: Option<String>,
}

pub struct ArtifactoryClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    repository: String,
}

impl ArtifactoryClient {
    pub fn new(config: ArtifactoryConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username,
            password: config.password,
            repository: config.repository,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    fn url(&self, path: &str) -> String {
        format!("{}/artifactory{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
    }

    /// Browsable location of the repository's packages.
    pub fn package_root(&self) -> String {
        self.url(&format!("/{}", self.repository))
    }

    /// Report for a finished build. Performs no request.
    pub fn generate_report(&self, request: &BuildReportRequest) -> BuildReport {
        BuildReport::new(&self.package_root(), request)
    }

    pub fn generate_sbom(&self, package_name: &str, version: &str) -> Sbom {
        Sbom::for_package(package_name, version)
    }

    /// Upload every file below `package_dir` under `name/version`.
    pub async fn upload_package(
        &self,
        package_dir: &Path,
        package_name: &str,
        version: &str,
    ) -> Result<UploadSummary> {
        if !package_dir.is_dir() {
            return Err(ArtifactoryError::InvalidPackage(format!(
                "{} is not a directory",
                package_dir.display()
            )));
        }

        let upload_root = self.url(&format!(
            "/api/conan/{}/{}/{}",
            self.repository, package_name, version
        ));
        let files = collect_files(package_dir)?;
        let mut summary = UploadSummary::default();

        for file in files {
            let relative = relative_url_path(package_dir, &file)?;
            let file_url = format!("{}/{}", upload_root, relative);
            let body = tokio::fs::read(&file).await?;
            let size = body.len() as u64;

            debug!(url = %file_url, bytes = size, "Uploading file");
            let response = self.request(Method::PUT, &file_url).body(body).send().await?;
            if !response.status().is_success() {
                return Err(ArtifactoryError::Status {
                    status: response.status().as_u16(),
                    url: file_url,
                });
            }

            summary.files += 1;
            summary.bytes += size;
        }

        info!(
            package = %package_name,
            version = %version,
            files = summary.files,
            bytes = summary.bytes,
            "Package uploaded"
        );
        Ok(summary)
    }

    /// Storage summary of the package repository.
    pub async fn cache_metrics(&self) -> Result<CacheMetrics> {
        let url = self.url(&format!("/api/storage/{}", self.repository));
        let response = self.request(Method::GET, &url).send().await?;
        if !response.status().is_success() {
            return Err(ArtifactoryError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let listing: StorageListing = response.json().await?;
        Ok(CacheMetrics {
            repository: self.repository.clone(),
            total_packages: listing.children.iter().filter(|c| c.folder).count(),
            last_updated: Utc::now(),
        })
    }

    /// Delete packages created more than `retention_days` ago.
    ///
    /// Returns the number of deletions the server acknowledged. Individual
    /// delete failures are logged and skipped.
    pub async fn cleanup_old_packages(&self, retention_days: u32) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(i64::from(retention_days));
        let url = self.url(&format!(
            "/api/search/creation?from=0&to={}&repos={}",
            cutoff.timestamp_millis(),
            self.repository
        ));

        let response = self.request(Method::GET, &url).send().await?;
        if !response.status().is_success() {
            return Err(ArtifactoryError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let search: SearchResults = response.json().await?;
        let mut deleted = 0;

        for uri in search.results.into_iter().filter_map(|r| r.uri) {
            match self.request(Method::DELETE, &uri).send().await {
                Ok(res) if res.status() == StatusCode::NO_CONTENT || res.status() == StatusCode::OK => {
                    deleted += 1;
                }
                Ok(res) => warn!(uri = %uri, status = %res.status(), "Delete rejected"),
                Err(e) => warn!(uri = %uri, error = %e, "Delete failed"),
            }
        }

        info!(deleted, retention_days, "Cleaned up old packages");
        Ok(deleted)
    }

    /// Apply the retention policy of `environment`.
    pub async fn apply_retention_policy(&self, environment: Environment) -> Result<usize> {
        let policy = environment.retention_policy();
        info!(
            environment = %environment,
            retention_days = policy.retention_days,
            max_versions = policy.max_versions,
            "Applying retention policy"
        );
        self.cleanup_old_packages(policy.retention_days).await
    }

    /// Persist workflow metrics as `<dir>/<run id>.json`.
    pub async fn record_workflow_metrics(
        &self,
        metrics: &WorkflowMetrics,
        dir: &Path,
    ) -> Result<PathBuf> {
        let mut record = metrics.clone();
        record.artifactory_url = self.base_url.clone();

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}.json", record.workflow_run_id));
        tokio::fs::write(&path, serde_json::to_vec_pretty(&record)?).await?;

        info!(run_id = %record.workflow_run_id, path = %path.display(), "Workflow metrics recorded");
        Ok(path)
    }
}

/// Regular files below `root`, sorted for a stable upload order.
fn collect_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            // Symlinked directories are not followed.
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn relative_url_path(root: &Path, file: &Path) -> Result<String> {
    let relative = file
        .strip_prefix(root)
        .map_err(|_| ArtifactoryError::InvalidPackage(format!("{} escapes package root", file.display())))?;

    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_trimmed() {
        let client = ArtifactoryClient::new(ArtifactoryConfig::new(
            "https://artifacts.example.com/",
            "ci",
            "secret",
        ));
        assert_eq!(client.base_url(), "https://artifacts.example.com");
        assert_eq!(
            client.package_root(),
            "https://artifacts.example.com/artifactory/conan"
        );
    }

    #[test]
    fn test_custom_repository() {
        let client = ArtifactoryClient::new(
            ArtifactoryConfig::new("http://localhost:8081", "ci", "secret").with_repository("conan-dev"),
        );
        assert_eq!(client.repository(), "conan-dev");
    }

    #[test]
    fn test_collect_files_recurses() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("conanmanifest.txt"), "m").unwrap();
        std::fs::write(dir.path().join("lib/libssl.so"), "ssl").unwrap();

        let files = collect_files(dir.path()).unwrap();
        let relative: Vec<String> = files
            .iter()
            .map(|f| relative_url_path(dir.path(), f).unwrap())
            .collect();
        assert_eq!(relative, vec!["conanmanifest.txt", "lib/libssl.so"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_files_skips_directory_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("lib/libssl.so"), "ssl").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("lib/cycle")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("lib/libssl.so"), dir.path().join("libssl.so.3"))
            .unwrap();

        let files = collect_files(dir.path()).unwrap();
        let relative: Vec<String> = files
            .iter()
            .map(|f| relative_url_path(dir.path(), f).unwrap())
            .collect();
        assert_eq!(relative, vec!["lib/libssl.so", "libssl.so.3"]);
    }
}
