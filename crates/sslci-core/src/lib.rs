//! OpenSSL CI Core
//!
//! Domain types, build tables, and error handling shared by the matrix
//! generator, the Artifactory manager, the metrics collector and the CLI.
//! This crate performs no I/O beyond loading table files.

pub mod changes;
pub mod error;
pub mod matrix;
pub mod tables;

pub use changes::ChangeCounts;
pub use error::{Error, Result};
pub use matrix::{BuildMatrix, CacheStrategy, MatrixEntry, MatrixRequest, WarmingDirective};
pub use tables::{
    BuildTables, CompilerSelection, PlatformFamily, PlatformSpec, RetentionTables, ScopeSpec,
    MINIMAL_SCOPE,
};
