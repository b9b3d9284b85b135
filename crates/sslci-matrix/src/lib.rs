//! Build matrix generation for the OpenSSL CI tooling.
//!
//! Turns a build scope and a change classification into an ordered list of
//! platform × profile × compiler jobs, then derives cache keys and
//! retention for the runner.

pub mod cache;
pub mod generator;
pub mod options;
pub mod rules;

pub use cache::{derive_cache_key, generate_cache_strategy};
pub use generator::MatrixGenerator;
pub use options::resolve_options;
pub use rules::{OptimizationRule, RuleSet};
