//! Change classification counts.
//!
//! A diff-analysis step outside this workspace sorts changed files into four
//! buckets. Counts reach the generator only through the constructors here,
//! which reject negative and non-numeric values.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Number of changed files per category for one build request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub core: u64,
    pub config: u64,
    pub test: u64,
    pub provider: u64,
}

impl ChangeCounts {
    pub fn new(core: u64, config: u64, test: u64, provider: u64) -> Self {
        Self {
            core,
            config,
            test,
            provider,
        }
    }

    /// Parse counts from their textual form (e.g. workflow outputs).
    ///
    /// Empty strings count as zero, matching unset workflow outputs.
    pub fn parse(core: &str, config: &str, test: &str, provider: &str) -> Result<Self> {
        Ok(Self {
            core: parse_one("core", core)?,
            config: parse_one("config", config)?,
            test: parse_one("test", test)?,
            provider: parse_one("provider", provider)?,
        })
    }

    /// Core or config changes force unit tests on every entry.
    pub fn requires_validation(&self) -> bool {
        self.core > 0 || self.config > 0
    }

    pub fn is_empty(&self) -> bool {
        self.core == 0 && self.config == 0 && self.test == 0 && self.provider == 0
    }

    pub fn total(&self) -> u64 {
        self.core
            .saturating_add(self.config)
            .saturating_add(self.test)
            .saturating_add(self.provider)
    }
}

fn parse_one(category: &'static str, raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidChangeCount {
            category,
            value: raw.to_string(),
        });
    }
    digits.parse().map_err(|_| Error::ChangeCountOutOfRange {
        category,
        value: trimmed.to_string(),
    })
}
