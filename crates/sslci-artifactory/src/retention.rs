//! Package retention policies per deployment environment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse an environment name, falling back to development.
    pub fn parse_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!(environment = %name, "Unknown environment, using development policy");
            Environment::Development
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        match self {
            Environment::Development => RetentionPolicy {
                retention_days: 7,
                max_versions: 3,
                cleanup_schedule: "daily".to_string(),
            },
            Environment::Staging => RetentionPolicy {
                retention_days: 30,
                max_versions: 10,
                cleanup_schedule: "weekly".to_string(),
            },
            Environment::Production => RetentionPolicy {
                retention_days: 365,
                max_versions: 20,
                cleanup_schedule: "monthly".to_string(),
            },
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("Unknown environment: {}", other)),
        }
    }
}

/// How long packages live in an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub retention_days: u32,
    pub max_versions: u32,
    pub cleanup_schedule: String,
}
