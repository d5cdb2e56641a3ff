//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `odf-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File operations
//!   - `SchemaReader`: First record of a tabular source
//!   - `ContainerRuntime`: Compose invocations
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{ContainerRuntime, CopyFilter, Filesystem, SchemaReader};

#[cfg(test)]
pub use output::{MockContainerRuntime, MockFilesystem, MockSchemaReader};
