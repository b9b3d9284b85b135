//! Matrix generation from build scope and change counts.

use crate::cache::generate_cache_strategy;
use crate::options::resolve_options;
use crate::rules::RuleSet;
use sslci_core::{
    BuildMatrix, BuildTables, CacheStrategy, CompilerSelection, MatrixEntry, MatrixRequest,
    PlatformSpec, ScopeSpec, MINIMAL_SCOPE,
};
use tracing::{debug, info, warn};

/// Generator for OpenSSL build matrices.
///
/// Holds no mutable state; one instance can serve concurrent callers.
#[derive(Debug)]
pub struct MatrixGenerator {
    tables: BuildTables,
    rules: RuleSet,
}

impl MatrixGenerator {
    /// Create a generator with the standard rule set for `tables`.
    pub fn new(tables: BuildTables) -> Self {
        let rules = RuleSet::standard(tables.provider_platforms.clone());
        Self { tables, rules }
    }

    /// Replace the optimization rules.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Generate the optimized matrix for a request.
    pub fn generate(&self, request: &MatrixRequest) -> BuildMatrix {
        let changes = &request.changes;
        info!(
            scope = %request.build_scope,
            core = changes.core,
            config = changes.config,
            test = changes.test,
            provider = changes.provider,
            "Generating build matrix"
        );

        let Some(scope) = self.resolve_scope(&request.build_scope) else {
            warn!(
                scope = %request.build_scope,
                "No fallback scope in build tables, emitting empty matrix"
            );
            return BuildMatrix::empty(request.build_scope.clone());
        };

        let entries = self.expand(scope, request);
        let unfiltered = entries.len();

        let (include, applied) = self.rules.apply(changes, entries);
        match applied {
            Some(rule) => info!(
                rule,
                before = unfiltered,
                after = include.len(),
                "Applied matrix optimization"
            ),
            None => debug!(jobs = unfiltered, "No optimization rule matched"),
        }

        BuildMatrix {
            total_jobs: include.len(),
            optimization_applied: include.len() < unfiltered,
            build_scope: scope.id.clone(),
            include,
            cache_strategy: None,
        }
    }

    /// Generate the matrix and attach its cache strategy.
    pub fn generate_with_cache(&self, request: &MatrixRequest) -> BuildMatrix {
        let matrix = self.generate(request);
        let strategy = self.generate_cache_strategy(&matrix);
        matrix.with_cache_strategy(strategy)
    }

    pub fn generate_cache_strategy(&self, matrix: &BuildMatrix) -> CacheStrategy {
        generate_cache_strategy(&self.tables, matrix)
    }

    fn resolve_scope(&self, id: &str) -> Option<&ScopeSpec> {
        if let Some(scope) = self.tables.scope(id) {
            return Some(scope);
        }
        warn!(
            scope = %id,
            known = ?self.tables.scope_ids().collect::<Vec<_>>(),
            fallback = MINIMAL_SCOPE,
            "Unknown build scope"
        );
        self.tables.scope(MINIMAL_SCOPE)
    }

    /// Unfiltered entries for a scope, in table order.
    fn expand(&self, scope: &ScopeSpec, request: &MatrixRequest) -> Vec<MatrixEntry> {
        let mut entries = Vec::new();

        for platform_id in &scope.platforms {
            let Some(platform) = self.tables.platform(platform_id) else {
                warn!(platform = %platform_id, scope = %scope.id, "Skipping unknown platform");
                continue;
            };

            for profile in &scope.profiles {
                if !platform.supports_profile(profile) {
                    continue;
                }

                let options = resolve_options(&self.tables, scope, profile, &request.changes);
                let compilers = compilers_for(platform, scope.compilers);

                if compilers.is_empty() {
                    entries.push(self.entry(scope, platform, profile, None, options, request));
                } else {
                    for compiler in compilers {
                        entries.push(self.entry(
                            scope,
                            platform,
                            profile,
                            Some(compiler),
                            options.clone(),
                            request,
                        ));
                    }
                }
            }
        }

        entries
    }

    fn entry(
        &self,
        scope: &ScopeSpec,
        platform: &PlatformSpec,
        profile: &str,
        compiler: Option<&str>,
        options: Vec<String>,
        request: &MatrixRequest,
    ) -> MatrixEntry {
        let matrix_key = match compiler {
            Some(compiler) => format!("{}-{}-{}", platform.id, profile, compiler),
            None => format!("{}-{}", platform.id, profile),
        };

        MatrixEntry {
            platform: platform.id.clone(),
            profile: profile.to_string(),
            compiler: compiler.map(str::to_string),
            options,
            matrix_key,
            source_repo: request.source_repo.clone(),
            source_sha: request.source_sha.clone(),
            build_scope: scope.id.clone(),
            test_enabled: scope.test_enabled,
        }
    }
}

impl Default for MatrixGenerator {
    fn default() -> Self {
        Self::new(BuildTables::default())
    }
}

/// Compilers a platform fans out into; empty means a single entry.
fn compilers_for(platform: &PlatformSpec, selection: CompilerSelection) -> Vec<&str> {
    if !platform.fans_out_compilers() {
        return vec![];
    }
    match selection {
        CompilerSelection::All => platform.compilers.iter().map(String::as_str).collect(),
        CompilerSelection::Default => platform
            .compilers
            .first()
            .map(String::as_str)
            .into_iter()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sslci_core::ChangeCounts;

    fn request(scope: &str, changes: ChangeCounts) -> MatrixRequest {
        MatrixRequest::new("openssl/openssl", "abcdef1234567890", scope, changes).unwrap()
    }

    #[test]
    fn test_full_scope_expansion() {
        let generator = MatrixGenerator::default();
        let matrix = generator.generate(&request("full", ChangeCounts::default()));

        // ubuntu-22.04: 3 profiles x 3 compilers, ubuntu-20.04: 2 x 2,
        // windows: 1, macos: 1
        assert_eq!(matrix.total_jobs, 15);
        assert!(!matrix.optimization_applied);
        assert_eq!(matrix.build_scope, "full");
    }

    #[test]
    fn test_non_linux_platforms_do_not_fan_out() {
        let generator = MatrixGenerator::default();
        let matrix = generator.generate(&request("full", ChangeCounts::default()));

        let macos: Vec<_> = matrix.include.iter().filter(|e| e.platform == "macos-12").collect();
        assert_eq!(macos.len(), 1);
        assert_eq!(macos[0].compiler, None);
        assert_eq!(macos[0].matrix_key, "macos-12-macos-clang");
    }

    #[test]
    fn test_linux_fan_out_keys() {
        let generator = MatrixGenerator::default();
        let matrix = generator.generate(&request("test", ChangeCounts::default()));

        let keys: Vec<&str> = matrix.include.iter().map(|e| e.matrix_key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "ubuntu-22.04-linux-gcc-debug-gcc-11",
                "ubuntu-22.04-linux-gcc-debug-gcc-12",
                "ubuntu-22.04-linux-gcc-debug-clang-15",
            ]
        );
    }

    #[test]
    fn test_missing_fallback_scope_yields_empty_matrix() {
        let mut tables = BuildTables::default();
        tables.scopes.retain(|s| s.id != MINIMAL_SCOPE);
        let generator = MatrixGenerator::new(tables);

        let matrix = generator.generate(&request("bogus", ChangeCounts::new(1, 0, 0, 0)));
        assert!(matrix.include.is_empty());
        assert_eq!(matrix.total_jobs, 0);
        assert!(!matrix.optimization_applied);
    }

    #[test]
    fn test_unknown_platform_in_scope_is_skipped() {
        let mut tables = BuildTables::default();
        tables.scopes[0].platforms.insert(0, "solaris-11".to_string());
        let generator = MatrixGenerator::new(tables);

        let matrix = generator.generate(&request("full", ChangeCounts::default()));
        assert_eq!(matrix.total_jobs, 15);
    }

    #[test]
    fn test_generate_with_cache_attaches_strategy() {
        let generator = MatrixGenerator::default();
        let matrix = generator.generate_with_cache(&request("provider", ChangeCounts::default()));

        let strategy = matrix.cache_strategy.as_ref().unwrap();
        assert_eq!(strategy.cache_keys.len(), matrix.total_jobs);
        assert_eq!(strategy.cache_keys[0], "ubuntu-22.04-linux-gcc-release-abcdef12-gcc-11");
    }
}
