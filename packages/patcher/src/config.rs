use crate::path::ChildPath;
use serde::{Deserialize, Serialize};

/// Patcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatcherConfig {
    /// Logical point before any remote edit has applied
    pub initial_logical_point: ChildPath,

    /// Keep protocol violations for `take_violations` (they are always logged)
    pub report_violations: bool,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self {
            initial_logical_point: ChildPath::from([0]),
            report_violations: true,
        }
    }
}
