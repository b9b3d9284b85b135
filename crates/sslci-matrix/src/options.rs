//! Package option resolution.

use sslci_core::{BuildTables, ChangeCounts, ScopeSpec};

/// Option forced on when core or config code changed.
pub const FORCE_UNIT_TESTS: &str = "enable_unit_test=True";

/// Resolve the option list for one profile.
///
/// Order is scope defaults, then the profile's fixed options, then the
/// change-driven unit test switch. Repeated keys are kept; the consumer
/// treats the last occurrence as authoritative.
pub fn resolve_options(
    tables: &BuildTables,
    scope: &ScopeSpec,
    profile: &str,
    changes: &ChangeCounts,
) -> Vec<String> {
    let mut options = scope.options.clone();
    options.extend_from_slice(tables.profile_options(profile));

    if changes.requires_validation() {
        options.push(FORCE_UNIT_TESTS.to_string());
    }

    options
}
