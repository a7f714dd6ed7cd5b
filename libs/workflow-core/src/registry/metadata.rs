//! Tool metadata types (spec §3 "ToolMetadata").

/// One entry in a tool's dependency list.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDependency {
    pub target: String,
    /// A semver range (`^1.2.3`, `~1.2.3`, `>=1.0.0 <2.0.0`, exact) per
    /// spec §6.2.
    pub range: String,
    pub optional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityDescriptor {
    pub idempotent: bool,
    pub risk_level: RiskLevel,
    pub requires_approval: bool,
}

/// Declarative description of a tool version (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct ToolMetadata {
    pub name: String,
    /// Strict `MAJOR.MINOR.PATCH`.
    pub version: String,
    pub category: String,
    pub description: String,
    pub enabled: bool,
    pub deprecated: bool,
    pub deprecation_message: Option<String>,
    pub dependencies: Vec<ToolDependency>,
    pub input_schema: serde_json::Value,
    pub output_schema: serde_json::Value,
    pub security: SecurityDescriptor,
    pub tags: Vec<String>,
}

/// Aggregate counts exported by the registry (spec §4.1 "Export a
/// snapshot").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrySnapshot {
    pub total_tools: usize,
    pub total_versions: usize,
    pub by_category: std::collections::HashMap<String, usize>,
    pub by_risk_level: std::collections::HashMap<String, usize>,
    pub deprecated_count: usize,
}
