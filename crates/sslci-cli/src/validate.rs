//! OpenSSL repository validation.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Files every OpenSSL source repository must carry.
pub const REQUIRED_PATHS: [&str; 6] = [
    "conanfile.py",
    "VERSION.dat",
    "Configure",
    "config",
    ".github/workflows/trigger-tools.yml",
    ".github/workflows/basic-validation.yml",
];

const VERSION_FIELDS: [&str; 3] = ["MAJOR=", "MINOR=", "PATCH="];
const SKIPPED_DIRS: [&str; 2] = [".git", "target"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub failures: Vec<String>,
}

impl CheckResult {
    fn from_failures(name: &'static str, failures: Vec<String>) -> Self {
        Self {
            name,
            passed: failures.is_empty(),
            failures,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub checks: Vec<CheckResult>,
}

impl ValidationReport {
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn total(&self) -> usize {
        self.checks.len()
    }

    pub fn success_rate(&self) -> f64 {
        if self.checks.is_empty() {
            return 0.0;
        }
        self.passed() as f64 / self.total() as f64 * 100.0
    }

    pub fn all_passed(&self) -> bool {
        self.passed() == self.total()
    }
}

/// Run every check against the repository at `root`.
pub fn validate_repository(root: &Path) -> ValidationReport {
    ValidationReport {
        checks: vec![
            check_version_dat(root),
            check_yaml_files(root),
            check_recipe(root),
            check_structure(root),
        ],
    }
}

pub fn check_version_dat(root: &Path) -> CheckResult {
    let path = root.join("VERSION.dat");
    let failures = match std::fs::read_to_string(&path) {
        Ok(content) => VERSION_FIELDS
            .iter()
            .filter(|field| !content.contains(*field))
            .map(|field| format!("VERSION.dat missing {}", field))
            .collect(),
        Err(e) => vec![format!("VERSION.dat unreadable: {}", e)],
    };
    CheckResult::from_failures("VERSION.dat", failures)
}

pub fn check_yaml_files(root: &Path) -> CheckResult {
    let mut failures = Vec::new();

    match yaml_files(root) {
        Ok(files) => {
            for file in files {
                debug!(path = %file.display(), "Parsing YAML");
                if let Err(e) = parse_yaml(&file) {
                    let shown = file.strip_prefix(root).unwrap_or(file.as_path());
                    failures.push(format!("{}: {}", shown.display(), e));
                }
            }
        }
        Err(e) => failures.push(format!("Could not walk {}: {}", root.display(), e)),
    }

    CheckResult::from_failures("YAML files", failures)
}

pub fn check_recipe(root: &Path) -> CheckResult {
    let failures = if root.join("conanfile.py").is_file() {
        Vec::new()
    } else {
        vec!["conanfile.py not found".to_string()]
    };
    CheckResult::from_failures("Conan recipe", failures)
}

pub fn check_structure(root: &Path) -> CheckResult {
    let failures = REQUIRED_PATHS
        .iter()
        .filter(|p| !root.join(p).exists())
        .map(|p| format!("Missing: {}", p))
        .collect();
    CheckResult::from_failures("Repository structure", failures)
}

fn parse_yaml(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    for document in serde_yaml::Deserializer::from_str(&content) {
        serde_yaml::Value::deserialize(document)?;
    }
    Ok(())
}

/// `*.yml` and `*.yaml` files below `root`, sorted.
fn yaml_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                let skipped = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| SKIPPED_DIRS.contains(&n));
                if !skipped {
                    pending.push(path);
                }
            } else if path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e == "yml" || e == "yaml")
            {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn valid_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "conanfile.py", "from conan import ConanFile\n");
        write(root, "VERSION.dat", "MAJOR=3\nMINOR=4\nPATCH=0\n");
        write(root, "Configure", "#!/usr/bin/env perl\n");
        std::fs::create_dir_all(root.join("config")).unwrap();
        write(root, ".github/workflows/trigger-tools.yml", "on: push\njobs: {}\n");
        write(root, ".github/workflows/basic-validation.yml", "name: basic\n");
        dir
    }

    #[test]
    fn test_valid_repository_passes() {
        let repo = valid_repo();
        let report = validate_repository(repo.path());

        assert!(report.all_passed(), "{:?}", report.checks);
        assert_eq!(report.passed(), 4);
        assert_eq!(report.success_rate(), 100.0);
    }

    #[test]
    fn test_version_dat_missing_field() {
        let repo = valid_repo();
        write(repo.path(), "VERSION.dat", "MAJOR=3\nMINOR=4\n");

        let check = check_version_dat(repo.path());
        assert!(!check.passed);
        assert_eq!(check.failures, vec!["VERSION.dat missing PATCH=".to_string()]);
    }

    #[test]
    fn test_broken_yaml_reported() {
        let repo = valid_repo();
        write(repo.path(), "ci/broken.yaml", "key: [unclosed\n");

        let check = check_yaml_files(repo.path());
        assert!(!check.passed);
        assert!(check.failures[0].starts_with("ci/broken.yaml"));
    }

    #[test]
    fn test_yaml_walk_skips_git_and_target() {
        let repo = valid_repo();
        write(repo.path(), ".git/bad.yml", "a: [\n");
        write(repo.path(), "target/bad.yml", "a: [\n");
        write(repo.path(), "multi.yml", "a: 1\n---\nb: 2\n");

        assert!(check_yaml_files(repo.path()).passed);
    }

    #[test]
    fn test_missing_structure() {
        let repo = valid_repo();
        std::fs::remove_file(repo.path().join("Configure")).unwrap();
        std::fs::remove_file(repo.path().join("conanfile.py")).unwrap();

        let report = validate_repository(repo.path());
        assert_eq!(report.passed(), 2);
        assert_eq!(report.success_rate(), 50.0);

        let structure = &report.checks[3];
        assert_eq!(
            structure.failures,
            vec!["Missing: conanfile.py".to_string(), "Missing: Configure".to_string()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_yaml_walk_does_not_follow_directory_symlinks() {
        let repo = valid_repo();
        std::os::unix::fs::symlink(repo.path(), repo.path().join("config/loop")).unwrap();

        let files = yaml_files(repo.path()).unwrap();
        assert_eq!(files.len(), 2);
    }
}
