//! The outcome of executing a parallel group (spec §3 "ParallelExecutionResult").

use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ParallelExecutionResult {
    pub group_id: String,
    pub completed_steps: Vec<String>,
    pub failed_steps: Vec<String>,
    pub skipped_steps: Vec<String>,
    pub duration: Duration,
    pub success: bool,
    pub results: HashMap<String, serde_json::Value>,
    pub errors: HashMap<String, serde_json::Value>,
}
