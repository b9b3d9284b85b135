//! Cache key derivation and cache strategy generation.

use sslci_core::{BuildMatrix, BuildTables, CacheStrategy, MatrixEntry};

/// Characters of the source revision kept in a cache key.
pub const REVISION_PREFIX_LEN: usize = 8;

/// Cache key for a matrix entry: `platform-profile-rev8[-compiler]`.
///
/// Two revisions sharing their first eight characters map to the same key.
pub fn derive_cache_key(entry: &MatrixEntry) -> String {
    let revision: String = entry.source_sha.chars().take(REVISION_PREFIX_LEN).collect();

    let mut parts = vec![entry.platform.as_str(), entry.profile.as_str(), revision.as_str()];
    if let Some(compiler) = entry.compiler.as_deref() {
        parts.push(compiler);
    }

    parts.join("-")
}

/// Derive the cache strategy for a generated matrix.
///
/// Keys follow entry order. Retention depends only on the matrix scope and
/// the warming directives are the static ones from `tables`.
pub fn generate_cache_strategy(tables: &BuildTables, matrix: &BuildMatrix) -> CacheStrategy {
    CacheStrategy {
        cache_keys: matrix.include.iter().map(derive_cache_key).collect(),
        retention_policies: tables.retention.for_scope(&matrix.build_scope).clone(),
        warming_strategies: tables.warming_strategies.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(platform: &str, profile: &str, sha: &str, compiler: Option<&str>) -> MatrixEntry {
        MatrixEntry {
            platform: platform.to_string(),
            profile: profile.to_string(),
            compiler: compiler.map(str::to_string),
            options: vec![],
            matrix_key: String::new(),
            source_repo: "openssl/openssl".to_string(),
            source_sha: sha.to_string(),
            build_scope: "full".to_string(),
            test_enabled: true,
        }
    }

    #[test]
    fn test_key_without_compiler() {
        let e = entry("windows-2022", "windows-msvc", "abcdef1234", None);
        assert_eq!(derive_cache_key(&e), "windows-2022-windows-msvc-abcdef12");
    }

    #[test]
    fn test_key_with_compiler() {
        let e = entry("ubuntu-22.04", "linux-fips", "0123456789abcdef", Some("clang-15"));
        assert_eq!(derive_cache_key(&e), "ubuntu-22.04-linux-fips-01234567-clang-15");
    }

    #[test]
    fn test_short_revision_used_whole() {
        let e = entry("macos-12", "macos-clang", "abc", None);
        assert_eq!(derive_cache_key(&e), "macos-12-macos-clang-abc");
    }

    #[test]
    fn test_strategy_for_empty_matrix() {
        let tables = BuildTables::default();
        let strategy = generate_cache_strategy(&tables, &BuildMatrix::empty("test"));
        assert!(strategy.cache_keys.is_empty());
        assert_eq!(strategy.retention_policies["development"], "3d");
        assert_eq!(strategy.warming_strategies.len(), 2);
    }
}
