//! End-to-end matrix generation scenarios.

use pretty_assertions::assert_eq;
use sslci_core::{BuildMatrix, BuildTables, ChangeCounts, MatrixRequest};
use sslci_matrix::{derive_cache_key, MatrixGenerator};

const SHA: &str = "abcdef1234567890";

fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,sslci_matrix=debug")),
        )
        .with_test_writer()
        .try_init();
}

fn generate(scope: &str, changes: ChangeCounts) -> BuildMatrix {
    let request = MatrixRequest::new("openssl/openssl", SHA, scope, changes).expect("valid request");
    MatrixGenerator::default().generate_with_cache(&request)
}

fn change_grid() -> Vec<ChangeCounts> {
    let mut grid = Vec::new();
    for core in [0, 3] {
        for config in [0, 2] {
            for test in [0, 5] {
                for provider in [0, 1] {
                    grid.push(ChangeCounts::new(core, config, test, provider));
                }
            }
        }
    }
    grid
}

#[test]
fn test_minimal_scope_without_changes() {
    let matrix = generate("minimal", ChangeCounts::default());

    assert_eq!(matrix.total_jobs, 1);
    assert_eq!(matrix.build_scope, "minimal");
    assert!(!matrix.optimization_applied);

    let entry = &matrix.include[0];
    assert_eq!(entry.platform, "ubuntu-22.04");
    assert_eq!(entry.profile, "linux-gcc-release");
    assert_eq!(entry.compiler.as_deref(), Some("gcc-11"));
    assert!(!entry.test_enabled);
    assert!(!entry.has_option("enable_unit_test=True"));
    assert_eq!(entry.effective_option("enable_unit_test"), Some("False"));
}

#[test]
fn test_full_scope_test_only_changes_keep_debug_profiles() {
    let matrix = generate("full", ChangeCounts::new(0, 0, 5, 0));

    assert!(matrix.optimization_applied);
    assert!(!matrix.include.is_empty());
    assert!(matrix.include.iter().all(|e| e.profile.contains("debug")));
    // ubuntu-22.04 x 3 compilers + ubuntu-20.04 x 2 compilers
    assert_eq!(matrix.total_jobs, 5);
}

#[test]
fn test_full_scope_core_changes_keep_everything() {
    let unfiltered = generate("full", ChangeCounts::default());
    let matrix = generate("full", ChangeCounts::new(3, 0, 0, 0));

    assert!(!matrix.optimization_applied);
    assert_eq!(matrix.total_jobs, unfiltered.total_jobs);

    let fips: Vec<_> = matrix.include.iter().filter(|e| e.profile == "linux-fips").collect();
    assert_eq!(fips.len(), 3);
    for entry in fips {
        assert!(entry.has_option("fips=True"));
        assert!(entry.has_option("enable_unit_test=True"));
    }

    // Release entries are re-enabled by the change rule, last write wins.
    let release = matrix
        .include
        .iter()
        .find(|e| e.profile == "linux-gcc-release")
        .unwrap();
    assert_eq!(
        release.options,
        vec!["enable_unit_test=False", "enable_demos=False", "enable_unit_test=True"]
    );
    assert_eq!(release.effective_option("enable_unit_test"), Some("True"));
}

#[test]
fn test_windows_cache_key() {
    let request = MatrixRequest::new(
        "openssl/openssl",
        "abcdef1234",
        "provider",
        ChangeCounts::default(),
    )
    .unwrap();
    let matrix = MatrixGenerator::default().generate(&request);

    let windows = matrix
        .include
        .iter()
        .find(|e| e.platform == "windows-2022")
        .unwrap();
    assert_eq!(windows.compiler, None);
    assert_eq!(derive_cache_key(windows), "windows-2022-windows-msvc-abcdef12");
}

#[test]
fn test_unknown_scope_behaves_like_minimal() {
    init_test_logging();
    let bogus = generate("bogus", ChangeCounts::default());
    let minimal = generate("minimal", ChangeCounts::default());
    assert_eq!(bogus, minimal);
}

#[test]
fn test_unknown_scope_uses_short_retention() {
    let matrix = generate("bogus", ChangeCounts::default());
    let strategy = matrix.cache_strategy.unwrap();
    assert_eq!(strategy.retention_policies["production"], "30d");
}

#[test]
fn test_full_scope_uses_long_retention() {
    let matrix = generate("full", ChangeCounts::new(1, 0, 0, 0));
    let strategy = matrix.cache_strategy.unwrap();
    assert_eq!(strategy.retention_policies["development"], "7d");
    assert_eq!(strategy.retention_policies["staging"], "30d");
    assert_eq!(strategy.retention_policies["production"], "365d");
    assert_eq!(strategy.cache_keys.len(), matrix.total_jobs);
}

#[test]
fn test_entries_respect_scope_and_platform_tables() {
    let tables = BuildTables::default();
    for scope_id in ["full", "test", "provider", "minimal", "bogus"] {
        for changes in change_grid() {
            let matrix = generate(scope_id, changes);
            let scope = tables.scope(&matrix.build_scope).unwrap();
            for entry in &matrix.include {
                let platform = tables.platform(&entry.platform).unwrap();
                assert!(scope.covers_platform(&entry.platform), "{:?}", entry);
                assert!(scope.covers_profile(&entry.profile), "{:?}", entry);
                assert!(platform.supports_profile(&entry.profile), "{:?}", entry);
            }
        }
    }
}

#[test]
fn test_generation_is_idempotent() {
    for scope_id in ["full", "test", "provider", "minimal"] {
        for changes in change_grid() {
            assert_eq!(generate(scope_id, changes), generate(scope_id, changes));
        }
    }
}

#[test]
fn test_filter_never_grows_the_matrix() {
    for scope_id in ["full", "test", "provider", "minimal"] {
        let unfiltered = generate(scope_id, ChangeCounts::default()).total_jobs;
        for changes in change_grid() {
            let matrix = generate(scope_id, changes);
            assert_eq!(matrix.total_jobs, matrix.include.len());
            assert!(matrix.total_jobs <= unfiltered);
            assert_eq!(matrix.optimization_applied, matrix.total_jobs < unfiltered);
        }
    }
}

#[test]
fn test_output_document_shape() {
    let matrix = generate("provider", ChangeCounts::new(0, 0, 0, 2));
    let json = serde_json::to_value(&matrix).unwrap();

    for key in ["include", "total_jobs", "build_scope", "optimization_applied", "cache_strategy"] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
    let strategy = &json["cache_strategy"];
    assert_eq!(strategy["warming_strategies"][0]["profile"], "linux-gcc-release");
    assert_eq!(strategy["warming_strategies"][0]["priority"], "high");
    assert_eq!(strategy["warming_strategies"][1]["frequency"], "weekly");
    assert_eq!(json["include"][0]["source_sha"], SHA);
}

#[test]
fn test_custom_tables_without_provider_list_keep_provider_jobs() {
    let tables = BuildTables::from_yaml_str(
        r#"
platforms:
  - id: ubuntu-22.04
    profiles: [linux-gcc-release]
    compilers: [gcc-11]
  - id: windows-2022
    profiles: [windows-msvc]
    compilers: [msvc-2022]
scopes:
  - id: minimal
    platforms: [ubuntu-22.04, windows-2022]
    profiles: [linux-gcc-release, windows-msvc]
"#,
    )
    .expect("valid tables");

    let request = MatrixRequest::new("openssl/openssl", SHA, "minimal", ChangeCounts::new(0, 0, 0, 3))
        .expect("valid request");
    let matrix = MatrixGenerator::new(tables).generate(&request);

    assert!(matrix.optimization_applied);
    assert_eq!(matrix.total_jobs, 2);
    let platforms: Vec<&str> = matrix.include.iter().map(|e| e.platform.as_str()).collect();
    assert_eq!(platforms, vec!["ubuntu-22.04", "windows-2022"]);
}
