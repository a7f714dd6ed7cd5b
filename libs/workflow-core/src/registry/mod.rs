//! Tool Registry (C1): versioned tool storage, dependency resolution, and
//! schema-validated dispatch (spec §4.1).

mod handler;
mod metadata;
mod registry;
mod schema;
mod version;

pub use handler::ToolHandler;
#[cfg(test)]
pub use handler::MockToolHandler;
pub use metadata::{
    RegistrySnapshot, RiskLevel, SecurityDescriptor, ToolDependency, ToolMetadata,
};
pub use registry::{RegisterOutcome, RegistryError, ToolRegistry};
pub use schema::{SchemaCache, SchemaError};
pub use version::{parse_range, parse_strict, satisfies, VersionError};
