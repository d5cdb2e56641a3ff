//! Infrastructure adapters for odf.
//!
//! This crate implements the ports defined in `odf_core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod filesystem;
pub mod runtime;
pub mod schema;

// Re-export commonly used adapters
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use runtime::DockerComposeRuntime;
pub use schema::CsvSchemaReader;
