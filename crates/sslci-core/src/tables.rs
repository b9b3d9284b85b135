//! Platform, scope and profile tables.
//!
//! The tables drive matrix generation. `BuildTables::default()` carries the
//! built-in OpenSSL CI layout; alternative layouts are loaded from YAML.

use crate::error::{Error, Result};
use crate::matrix::{WarmingDirective, WarmingFrequency, WarmingPriority};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Scope every unknown scope id falls back to.
pub const MINIMAL_SCOPE: &str = "minimal";

/// Scope id that selects the long retention table.
pub const FULL_SCOPE: &str = "full";

/// Operating-system family of a runner image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    Linux,
    Windows,
    Macos,
    Other,
}

impl PlatformFamily {
    /// Infer the family from a runner id such as `ubuntu-22.04`.
    pub fn infer(runner_id: &str) -> Self {
        let id = runner_id.to_ascii_lowercase();
        if ["ubuntu", "debian", "fedora", "centos", "rocky", "alpine", "linux"]
            .iter()
            .any(|prefix| id.starts_with(prefix))
        {
            PlatformFamily::Linux
        } else if id.starts_with("windows") {
            PlatformFamily::Windows
        } else if id.starts_with("macos") {
            PlatformFamily::Macos
        } else {
            PlatformFamily::Other
        }
    }
}

/// A runner image and what it can build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSpec {
    pub id: String,
    /// Explicit family; inferred from `id` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<PlatformFamily>,
    pub profiles: Vec<String>,
    #[serde(default)]
    pub compilers: Vec<String>,
}

impl PlatformSpec {
    pub fn new(id: impl Into<String>, profiles: &[&str], compilers: &[&str]) -> Self {
        Self {
            id: id.into(),
            family: None,
            profiles: profiles.iter().map(|p| p.to_string()).collect(),
            compilers: compilers.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn family(&self) -> PlatformFamily {
        self.family.unwrap_or_else(|| PlatformFamily::infer(&self.id))
    }

    pub fn supports_profile(&self, profile: &str) -> bool {
        self.profiles.iter().any(|p| p == profile)
    }

    /// Linux runners fan out into one job per compiler.
    pub fn fans_out_compilers(&self) -> bool {
        self.family() == PlatformFamily::Linux && !self.compilers.is_empty()
    }
}

/// How many compilers of a Linux platform a scope builds with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerSelection {
    /// Every compiler the platform lists.
    #[default]
    All,
    /// Only the platform's first (default) compiler.
    Default,
}

/// A named coverage level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSpec {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub platforms: Vec<String>,
    pub profiles: Vec<String>,
    #[serde(default)]
    pub test_enabled: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub compilers: CompilerSelection,
}

impl ScopeSpec {
    pub fn covers_platform(&self, platform: &str) -> bool {
        self.platforms.iter().any(|p| p == platform)
    }

    pub fn covers_profile(&self, profile: &str) -> bool {
        self.profiles.iter().any(|p| p == profile)
    }
}

/// Retention durations per environment, split by scope breadth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionTables {
    /// Used when the build scope is `full`.
    pub full: BTreeMap<String, String>,
    /// Used for every other scope.
    pub default: BTreeMap<String, String>,
}

impl Default for RetentionTables {
    fn default() -> Self {
        Self {
            full: durations(&[
                ("development", "7d"),
                ("staging", "30d"),
                ("production", "365d"),
            ]),
            default: durations(&[
                ("development", "3d"),
                ("staging", "7d"),
                ("production", "30d"),
            ]),
        }
    }
}

impl RetentionTables {
    pub fn for_scope(&self, scope: &str) -> &BTreeMap<String, String> {
        if scope == FULL_SCOPE {
            &self.full
        } else {
            &self.default
        }
    }
}

fn durations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(env, duration)| (env.to_string(), duration.to_string()))
        .collect()
}

/// All lookup data the matrix generator needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTables {
    pub platforms: Vec<PlatformSpec>,
    pub scopes: Vec<ScopeSpec>,
    /// Fixed options appended for a profile.
    #[serde(default)]
    pub profile_options: BTreeMap<String, Vec<String>>,
    /// Platforms kept when only provider code changed.
    #[serde(default = "default_provider_platforms")]
    pub provider_platforms: Vec<String>,
    #[serde(default)]
    pub retention: RetentionTables,
    #[serde(default = "default_warming")]
    pub warming_strategies: Vec<WarmingDirective>,
}

fn default_provider_platforms() -> Vec<String> {
    strings(&["ubuntu-22.04", "windows-2022"])
}

fn default_warming() -> Vec<WarmingDirective> {
    vec![
        WarmingDirective {
            profile: "linux-gcc-release".to_string(),
            priority: WarmingPriority::High,
            frequency: WarmingFrequency::Daily,
        },
        WarmingDirective {
            profile: "linux-fips".to_string(),
            priority: WarmingPriority::Medium,
            frequency: WarmingFrequency::Weekly,
        },
    ]
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for BuildTables {
    fn default() -> Self {
        let platforms = vec![
            PlatformSpec::new(
                "ubuntu-22.04",
                &["linux-gcc-release", "linux-gcc-debug", "linux-fips"],
                &["gcc-11", "gcc-12", "clang-15"],
            ),
            PlatformSpec::new(
                "ubuntu-20.04",
                &["linux-gcc-release", "linux-gcc-debug"],
                &["gcc-9", "gcc-10"],
            ),
            PlatformSpec::new("windows-2022", &["windows-msvc"], &["msvc-2022"]),
            PlatformSpec::new("macos-12", &["macos-clang"], &["clang-14", "clang-15"]),
        ];

        let scopes = vec![
            ScopeSpec {
                id: "full".to_string(),
                description: "Full build - all platforms and configurations".to_string(),
                platforms: strings(&["ubuntu-22.04", "ubuntu-20.04", "windows-2022", "macos-12"]),
                profiles: strings(&[
                    "linux-gcc-release",
                    "linux-gcc-debug",
                    "linux-fips",
                    "windows-msvc",
                    "macos-clang",
                ]),
                test_enabled: true,
                options: vec![],
                compilers: CompilerSelection::All,
            },
            ScopeSpec {
                id: "test".to_string(),
                description: "Test-focused build - validation and testing only".to_string(),
                platforms: strings(&["ubuntu-22.04"]),
                profiles: strings(&["linux-gcc-debug"]),
                test_enabled: true,
                options: strings(&["enable_unit_test=True", "enable_demos=True"]),
                compilers: CompilerSelection::All,
            },
            ScopeSpec {
                id: "provider".to_string(),
                description: "Provider build - provider-specific components".to_string(),
                platforms: strings(&["ubuntu-22.04", "windows-2022"]),
                profiles: strings(&["linux-gcc-release", "windows-msvc"]),
                test_enabled: false,
                options: strings(&["enable_demos=False"]),
                compilers: CompilerSelection::All,
            },
            ScopeSpec {
                id: MINIMAL_SCOPE.to_string(),
                description: "Minimal build - essential checks only".to_string(),
                platforms: strings(&["ubuntu-22.04"]),
                profiles: strings(&["linux-gcc-release"]),
                test_enabled: false,
                options: strings(&["enable_unit_test=False", "enable_demos=False"]),
                compilers: CompilerSelection::Default,
            },
        ];

        let mut profile_options = BTreeMap::new();
        profile_options.insert(
            "linux-fips".to_string(),
            strings(&["fips=True", "enable_unit_test=True"]),
        );
        profile_options.insert(
            "linux-gcc-debug".to_string(),
            strings(&["enable_unit_test=True", "enable_demos=True", "enable_trace=True"]),
        );
        profile_options.insert(
            "linux-gcc-release".to_string(),
            strings(&["enable_unit_test=False", "enable_demos=False"]),
        );

        Self {
            platforms,
            scopes,
            profile_options,
            provider_platforms: default_provider_platforms(),
            retention: RetentionTables::default(),
            warming_strategies: default_warming(),
        }
    }
}

impl BuildTables {
    /// Load and validate tables from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate tables from YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let tables: BuildTables = serde_yaml::from_str(contents)?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn platform(&self, id: &str) -> Option<&PlatformSpec> {
        self.platforms.iter().find(|p| p.id == id)
    }

    pub fn scope(&self, id: &str) -> Option<&ScopeSpec> {
        self.scopes.iter().find(|s| s.id == id)
    }

    /// Fixed options for a profile; empty for profiles without an entry.
    pub fn profile_options(&self, profile: &str) -> &[String] {
        self.profile_options
            .get(profile)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn scope_ids(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(|s| s.id.as_str())
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        let mut platform_ids = HashSet::new();
        for platform in &self.platforms {
            if platform.id.trim().is_empty() {
                return Err(Error::InvalidTables("platform with empty id".to_string()));
            }
            if !platform_ids.insert(platform.id.as_str()) {
                return Err(Error::InvalidTables(format!(
                    "duplicate platform id: {}",
                    platform.id
                )));
            }
        }

        let mut scope_ids = HashSet::new();
        for scope in &self.scopes {
            if !scope_ids.insert(scope.id.as_str()) {
                return Err(Error::InvalidTables(format!("duplicate scope id: {}", scope.id)));
            }
            if let Some(unknown) = scope
                .platforms
                .iter()
                .find(|p| !platform_ids.contains(p.as_str()))
            {
                return Err(Error::InvalidTables(format!(
                    "scope {} references unknown platform {}",
                    scope.id, unknown
                )));
            }
        }

        if !scope_ids.contains(MINIMAL_SCOPE) {
            return Err(Error::InvalidTables(format!(
                "missing fallback scope: {}",
                MINIMAL_SCOPE
            )));
        }

        // Provider-only changes must keep at least one platform.
        if self.provider_platforms.is_empty() {
            return Err(Error::InvalidTables(
                "provider allow-list is empty".to_string(),
            ));
        }

        if let Some(unknown) = self
            .provider_platforms
            .iter()
            .find(|p| !platform_ids.contains(p.as_str()))
        {
            return Err(Error::InvalidTables(format!(
                "provider allow-list references unknown platform {}",
                unknown
            )));
        }

        Ok(())
    }
}
