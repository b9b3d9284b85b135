//! Repairs for common GitHub workflow syntax damage.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{info, warn};

static TRUNCATED_PYTHON_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"python-version: '3\.\n").expect("valid regex"));
static ESCAPED_PIP_CACHE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"cache: \\'pip\\'1\n").expect("valid regex"));
static DUPLICATE_PIP_CACHE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"cache: 'pip'\n\s*cache: 'pip'\n").expect("valid regex"));
static BARE_PIP_INSTALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)-[ \t]*run: pip install").expect("valid regex")
});

/// Files rewritten out of files seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixSummary {
    pub fixed: usize,
    pub total: usize,
}

/// Apply every repair to one workflow document.
pub fn fix_workflow_content(content: &str) -> String {
    let content = TRUNCATED_PYTHON_VERSION.replace_all(content, "python-version: '3.12'\n");
    let content = ESCAPED_PIP_CACHE.replace_all(&content, "cache: 'pip'\n");
    let content = DUPLICATE_PIP_CACHE.replace_all(&content, "cache: 'pip'\n");
    let content = BARE_PIP_INSTALL.replace_all(
        &content,
        "${1}- name: Install Conan\n${1}  run: pip install",
    );
    content.into_owned()
}

/// Repair every `*.yml` file directly under `dir`.
///
/// A missing directory yields `None`. Files that cannot be read or written
/// are logged and counted as not fixed.
pub fn fix_workflows(dir: &Path) -> std::io::Result<Option<FixSummary>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut files: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "yml"))
        .collect();
    files.sort();

    let mut summary = FixSummary {
        fixed: 0,
        total: files.len(),
    };

    for file in &files {
        match fix_file(file) {
            Ok(true) => {
                info!(path = %file.display(), "Workflow fixed");
                summary.fixed += 1;
            }
            Ok(false) => {}
            Err(e) => warn!(path = %file.display(), error = %e, "Could not fix workflow"),
        }
    }

    Ok(Some(summary))
}

fn fix_file(path: &Path) -> std::io::Result<bool> {
    let original = std::fs::read_to_string(path)?;
    let fixed = fix_workflow_content(&original);
    if fixed == original {
        return Ok(false);
    }
    std::fs::write(path, fixed)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truncated_python_version() {
        let fixed = fix_workflow_content("        python-version: '3.\n");
        assert_eq!(fixed, "        python-version: '3.12'\n");
    }

    #[test]
    fn test_escaped_and_duplicate_cache() {
        let input = "        cache: \\'pip\\'1\n        cache: 'pip'\n";
        assert_eq!(fix_workflow_content(input), "        cache: 'pip'\n");
    }

    #[test]
    fn test_bare_run_step_gets_name() {
        let input = "    steps:\n      - run: pip install conan\n";
        let expected = "    steps:\n      - name: Install Conan\n        run: pip install conan\n";
        assert_eq!(fix_workflow_content(input), expected);
    }

    #[test]
    fn test_fix_is_idempotent() {
        let input = "      - run: pip install conan\n        python-version: '3.\n";
        let once = fix_workflow_content(input);
        assert_eq!(fix_workflow_content(&once), once);
    }

    #[test]
    fn test_fix_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.yml"), "python-version: '3.\n").unwrap();
        std::fs::write(dir.path().join("clean.yml"), "name: ok\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "python-version: '3.\n").unwrap();

        let summary = fix_workflows(dir.path()).unwrap().unwrap();
        assert_eq!(summary, FixSummary { fixed: 1, total: 2 });
        assert_eq!(
            std::fs::read_to_string(dir.path().join("broken.yml")).unwrap(),
            "python-version: '3.12'\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
            "python-version: '3.\n"
        );
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(fix_workflows(&dir.path().join("absent")).unwrap(), None);
    }
}
